//! AES-based pseudorandom generator used to expand DPF tree seeds.
use std::convert::TryFrom;
use std::ops;

use derivative::Derivative;
use openssl::symm::{encrypt, Cipher};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

pub const SEED_SIZE: usize = 16; // in bytes

/// Seed for the AES-based PRG; also the per-node state of a DPF tree.
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct Seed([u8; SEED_SIZE]);

impl Seed {
    pub fn random() -> Seed {
        let mut bytes = [0; SEED_SIZE];
        thread_rng().fill_bytes(&mut bytes);
        Seed(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SEED_SIZE] {
        &self.0
    }
}

impl From<[u8; SEED_SIZE]> for Seed {
    fn from(bytes: [u8; SEED_SIZE]) -> Seed {
        Seed(bytes)
    }
}

impl TryFrom<&[u8]> for Seed {
    type Error = ();

    fn try_from(other: &[u8]) -> Result<Self, ()> {
        if other.len() != SEED_SIZE {
            return Err(());
        }
        let mut bytes = [0; SEED_SIZE];
        bytes.copy_from_slice(other);
        Ok(Seed(bytes))
    }
}

impl ops::BitXor for Seed {
    type Output = Seed;

    fn bitxor(mut self, rhs: Seed) -> Seed {
        self ^= rhs;
        self
    }
}

impl ops::BitXorAssign for Seed {
    fn bitxor_assign(&mut self, rhs: Seed) {
        self.0
            .iter_mut()
            .zip(rhs.0.iter())
            .for_each(|(x, y)| *x ^= y);
    }
}

/// PRG using AES-128-CTR to expand a seed to the desired length.
///
/// The cipher key is the PRF key shared between prover and verifiers; the
/// seed is the counter nonce, so evaluation is deterministic per
/// `(key, seed)` pair.
#[derive(Clone, Serialize, Deserialize, Derivative)]
#[derivative(Debug)]
pub struct AesPrg {
    key: [u8; SEED_SIZE],
    output_size: usize,
    #[serde(skip, default = "Cipher::aes_128_ctr")]
    #[derivative(Debug = "ignore")]
    cipher: Cipher,
}

impl AesPrg {
    pub fn new(key: [u8; SEED_SIZE], output_size: usize) -> AesPrg {
        AesPrg {
            key,
            output_size,
            cipher: Cipher::aes_128_ctr(),
        }
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Expands the seed to `output_size` pseudorandom bytes.
    pub fn eval(&self, seed: &Seed) -> Vec<u8> {
        // what AES "encrypts" is all-zero: the output is pure keystream
        let data = vec![0; self.output_size];

        let mut ciphertext =
            encrypt(self.cipher, &self.key, Some(seed.as_bytes()), &data).unwrap();

        ciphertext.truncate(self.output_size);
        ciphertext
    }
}
