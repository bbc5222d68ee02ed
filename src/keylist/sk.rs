//! Symmetric-key PACL: the list holds random byte-string keys and the audit
//! accumulator is XOR. Cheapest variant; soundness is statistical in the key
//! length.
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AuditAccumulator, KeyListParams, PredicateType};
use crate::dpf::{Dpf, Key, PrfKey, TreeDpf};
use crate::slot::Slot;

/// Statistical security of the audit, in bits; keys are this long.
pub const STAT_SECURITY: usize = 128;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyList {
    pub params: KeyListParams,
    keys: Vec<Slot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofShare {
    pub share_number: u8,
    pub prf_key: PrfKey,
    pub dpf_key: Key,
    pub predicate: PredicateType,
    pub key_share: Slot,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditShare {
    share: Slot,
}

impl AuditAccumulator for Slot {
    type Entry = Slot;

    fn add_selected(&mut self, entry: &Slot) {
        *self ^= entry;
    }
}

impl KeyList {
    pub fn new(params: KeyListParams, keys: Vec<Slot>) -> KeyList {
        assert_eq!(keys.len() as u64, params.num_keys);
        KeyList { params, keys }
    }

    /// List with the same random key at every slot. Generating a full random
    /// list is time consuming; one key is enough to exercise the protocol.
    /// Returns the list, the key, and a position registered for it.
    pub fn generate_testing_key_list(
        num_keys: u64,
        fss_domain: u32,
        predicate: PredicateType,
        num_subkeys: u64,
    ) -> (KeyList, Slot, u64) {
        let params = KeyListParams::new(num_keys, fss_domain, predicate, num_subkeys);
        let key = Slot::random(STAT_SECURITY / 8);
        let keys = vec![key.clone(); params.num_keys as usize];
        let idx = thread_rng().gen_range(0..params.num_keys);
        (KeyList { params, keys }, key, idx)
    }

    /// Two proof shares for knowledge of the key at list position `idx`.
    pub fn new_proof(&self, idx: u64, x: &Slot) -> (ProofShare, ProofShare) {
        let alpha = self.params.point_for(idx);

        let dpf = TreeDpf::new(PrfKey::random());
        let (dpf_key_a, dpf_key_b) = dpf.gen(alpha, self.params.fss_domain);

        // XOR-share the secret key
        let mask_a = Slot::random(x.len());
        let mask_b = mask_a.clone() ^ x;

        (
            ProofShare {
                share_number: 0,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_a,
                predicate: self.params.predicate,
                key_share: mask_a,
            },
            ProofShare {
                share_number: 1,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_b,
                predicate: self.params.predicate,
                key_share: mask_b,
            },
        )
    }

    pub fn expand_dpf(&self, proof: &ProofShare) -> Vec<u8> {
        let dpf = TreeDpf::new(proof.prf_key);
        if self.params.full_domain {
            // run the optimized full-domain evaluation strategy
            dpf.full_domain_eval(&proof.dpf_key)
        } else {
            dpf.batch_eval(&proof.dpf_key, &self.params.key_indices)
        }
    }

    /// Selects keys with the expanded DPF bits and folds in the prover's
    /// masking share.
    pub fn audit(&self, proof: &ProofShare) -> AuditShare {
        let bits = self.expand_dpf(proof);
        let mut accumulator = Slot::zero(STAT_SECURITY / 8).select(&bits, &self.keys);
        accumulator ^= &proof.key_share;
        AuditShare { share: accumulator }
    }

    pub fn check_audit(&self, audit_share_a: &AuditShare, audit_share_b: &AuditShare) -> bool {
        (audit_share_a.share.clone() ^ &audit_share_b.share).is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_NUM_KEYS: u64 = 512;
    const TEST_FSS_DOMAIN: u32 = 32;
    const NUM_QUERIES: usize = 100;

    #[test]
    fn test_prove_audit_verify() {
        for _ in 0..NUM_QUERIES {
            let (kl, key, idx) = KeyList::generate_testing_key_list(
                TEST_NUM_KEYS,
                TEST_FSS_DOMAIN,
                PredicateType::Equality,
                1,
            );
            let (share_a, share_b) = kl.new_proof(idx, &key);

            let audit_a = kl.audit(&share_a);
            let audit_b = kl.audit(&share_b);

            assert!(kl.check_audit(&audit_a, &audit_b));
        }
    }

    #[test]
    fn test_prove_audit_verify_full_domain() {
        let (kl, key, idx) =
            KeyList::generate_testing_key_list(512, 9, PredicateType::Equality, 1);
        assert!(kl.params.full_domain);
        for _ in 0..NUM_QUERIES {
            let (share_a, share_b) = kl.new_proof(idx, &key);
            assert!(kl.check_audit(&kl.audit(&share_a), &kl.audit(&share_b)));
        }
    }

    #[test]
    fn test_wrong_key_rejected() {
        let (kl, _, idx) = KeyList::generate_testing_key_list(
            TEST_NUM_KEYS,
            TEST_FSS_DOMAIN,
            PredicateType::Equality,
            1,
        );
        let wrong = Slot::random(STAT_SECURITY / 8);
        let (share_a, share_b) = kl.new_proof(idx, &wrong);
        assert!(!kl.check_audit(&kl.audit(&share_a), &kl.audit(&share_b)));
    }

    #[test]
    fn test_tampered_key_share_rejected() {
        let (kl, key, idx) = KeyList::generate_testing_key_list(
            TEST_NUM_KEYS,
            TEST_FSS_DOMAIN,
            PredicateType::Equality,
            1,
        );
        let (mut share_a, share_b) = kl.new_proof(idx, &key);
        share_a.key_share ^= &Slot::from(vec![1]);
        assert!(!kl.check_audit(&kl.audit(&share_a), &kl.audit(&share_b)));
    }

    #[test]
    #[should_panic]
    fn test_proof_index_out_of_range_panics() {
        let (kl, key, _) =
            KeyList::generate_testing_key_list(8, 10, PredicateType::Equality, 1);
        kl.new_proof(8, &key);
    }
}
