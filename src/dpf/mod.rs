//! Distributed point functions.
//!
//! Two keys evaluate, per index, to single-bit shares that XOR to 1 exactly
//! at the programmed point. The verifiable flavor additionally produces a
//! proof that is bit-identical on both verifiers iff the keys were honestly
//! generated for a single point.
use rand::prelude::*;
use serde::{Deserialize, Serialize};

pub mod tree;

pub use tree::Key;

pub type TreeDpf = tree::Construction;

/// Key for the PRF underlying DPF seed expansion. Chosen by the prover and
/// carried (in the clear) in every proof share.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct PrfKey([u8; 16]);

impl PrfKey {
    pub fn random() -> PrfKey {
        let mut bytes = [0; 16];
        thread_rng().fill_bytes(&mut bytes);
        PrfKey(bytes)
    }

    pub fn bytes(&self) -> [u8; 16] {
        self.0
    }
}

/// Key for the verification hashes of a verifiable DPF. Chosen by the
/// verifiers, not the prover.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct HashKey([u8; 16]);

impl HashKey {
    pub fn random() -> HashKey {
        let mut bytes = [0; 16];
        thread_rng().fill_bytes(&mut bytes);
        HashKey(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

/// Two-key distributed point function over the domain `[0, 2^domain)`.
pub trait Dpf {
    type Key;

    /// Generate a key pair whose evaluations XOR to `1` at `alpha` and to `0`
    /// everywhere else.
    fn gen(&self, alpha: u64, domain: u32) -> (Self::Key, Self::Key);

    /// Evaluate one key at one index. The low bit of the output byte is the
    /// share.
    fn eval(&self, key: &Self::Key, index: u64) -> u8;

    /// Evaluate at every index of the domain, in order.
    fn full_domain_eval(&self, key: &Self::Key) -> Vec<u8>;

    /// Evaluate at a caller-supplied index list.
    fn batch_eval(&self, key: &Self::Key, indices: &[u64]) -> Vec<u8> {
        indices.iter().map(|&index| self.eval(key, index)).collect()
    }
}

/// DPF whose evaluation can be audited: honest key pairs make both verifiers
/// compute the same proof bytes.
pub trait VerifiableDpf: Dpf {
    fn gen_verifiable(&self, alpha: u64, domain: u32) -> (Self::Key, Self::Key);

    fn full_domain_ver_eval(&self, key: &Self::Key) -> (Vec<u8>, Vec<u8>);

    fn batch_ver_eval(&self, key: &Self::Key, indices: &[u64]) -> (Vec<u8>, Vec<u8>);
}
