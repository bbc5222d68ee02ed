//! Fixed-length byte vectors with XOR, the key material of the symmetric-key
//! PACL variant.
use std::convert::AsRef;
use std::iter::FromIterator;
use std::ops;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Default, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot(Vec<u8>);

impl Slot {
    pub fn zero(len: usize) -> Slot {
        vec![0; len].into()
    }

    pub fn random(len: usize) -> Slot {
        let mut buf = vec![0; len];
        thread_rng().fill_bytes(&mut buf);
        Slot(buf)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|byte| *byte == 0)
    }
}

impl AsRef<[u8]> for Slot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Slot {
    fn from(other: Vec<u8>) -> Self {
        Slot(other)
    }
}

impl From<Slot> for Vec<u8> {
    fn from(value: Slot) -> Vec<u8> {
        value.0
    }
}

impl FromIterator<u8> for Slot {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        iter.into_iter().collect::<Vec<u8>>().into()
    }
}

// XOR is over the shorter operand; any tail bytes are untouched.
impl ops::BitXorAssign<&Slot> for Slot {
    fn bitxor_assign(&mut self, rhs: &Slot) {
        self.0
            .iter_mut()
            .zip(rhs.0.iter())
            .for_each(|(x, y)| *x ^= y);
    }
}

impl ops::BitXorAssign<Slot> for Slot {
    fn bitxor_assign(&mut self, rhs: Slot) {
        *self ^= &rhs;
    }
}

impl ops::BitXor<&Slot> for Slot {
    type Output = Slot;

    fn bitxor(mut self, rhs: &Slot) -> Slot {
        self ^= rhs;
        self
    }
}

impl ops::BitXor<Slot> for Slot {
    type Output = Slot;

    fn bitxor(self, rhs: Slot) -> Slot {
        self ^ &rhs
    }
}
