//! Public key lists and the audits that bind DPF outputs to them.
//!
//! All three variants share the same shape: the prover's DPF selects one
//! list position on each verifier, the verifier folds the selected entries
//! into an accumulator, mixes in the prover's masking share, and the two
//! resulting audit shares satisfy the variant's predicate only for an honest
//! proof. The variants differ in the algebraic domain of that fold.
use itertools::Itertools;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

pub mod pk;
pub mod sk;
pub mod sposs;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateType {
    /// One key per list slot.
    Equality,
    /// Each identity occupies `num_subkeys` consecutive slots; knowing any
    /// one of them suffices (one-of-a-set group credentials).
    Inclusion,
}

/// Parameters shared by every key-list variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyListParams {
    pub full_domain: bool,
    pub num_keys: u64,
    pub fss_domain: u32,
    pub key_indices: Vec<u64>,
    pub predicate: PredicateType,
}

impl KeyListParams {
    /// `num_subkeys` only matters for the inclusion predicate, which widens
    /// the DPF domain so its single point resolves one sub-leaf, and inflates
    /// the list accordingly.
    pub fn new(
        num_keys: u64,
        fss_domain: u32,
        predicate: PredicateType,
        num_subkeys: u64,
    ) -> KeyListParams {
        assert!(num_keys > 0, "list size is set to zero; something is wrong");
        let (num_keys, fss_domain) = match predicate {
            PredicateType::Equality => (num_keys, fss_domain),
            PredicateType::Inclusion => {
                assert!(num_subkeys > 0, "inclusion predicate needs at least one subkey");
                (num_keys * num_subkeys, fss_domain + ceil_log2(num_subkeys))
            }
        };

        // only possible when domain = #keys: enables the optimized expansion
        let full_domain = fss_domain < 64 && 1u64 << fss_domain == num_keys;

        let mut rng = thread_rng();
        let key_indices = if full_domain {
            (0..num_keys).collect()
        } else {
            (0..num_keys)
                .map(|_| {
                    if fss_domain >= 64 {
                        rng.gen()
                    } else {
                        rng.gen_range(0..1u64 << fss_domain)
                    }
                })
                .collect()
        };

        KeyListParams {
            full_domain,
            num_keys,
            fss_domain,
            key_indices,
            predicate,
        }
    }

    /// The DPF point registered for a list position.
    ///
    /// Panics when the list is empty or the position is out of range: both
    /// are prover-side invariant violations that abort the query.
    pub fn point_for(&self, idx: u64) -> u64 {
        assert!(self.num_keys > 0, "list size is set to zero; something is wrong");
        assert!(idx < self.num_keys, "provided key index is too large");
        self.key_indices[idx as usize]
    }
}

/// One audit's running selection, in the algebraic domain of a key-list
/// variant: XOR over byte vectors, point addition on a curve, or field
/// addition over group-element values.
pub trait AuditAccumulator {
    type Entry;

    /// Fold one selected list entry into the accumulator.
    fn add_selected(&mut self, entry: &Self::Entry);

    /// Accumulate every entry whose DPF output bit (the byte's LSB) is set.
    ///
    /// Panics when the bit-vector and the list disagree on length.
    fn select(mut self, bits: &[u8], entries: &[Self::Entry]) -> Self
    where
        Self: Sized,
    {
        for (bit, entry) in bits.iter().zip_eq(entries) {
            if bit & 1 == 1 {
                self.add_selected(entry);
            }
        }
        self
    }
}

fn ceil_log2(n: u64) -> u32 {
    n.next_power_of_two().trailing_zeros()
}
