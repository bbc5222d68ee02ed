//! Verifiable public-key PACL over a safe-prime group.
//!
//! The strongest variant: a verifiable DPF guards against malformed point
//! functions, and a SPoSS argument proves knowledge of the discrete log of
//! the selected key. The audit accumulates group-element *values* in the base
//! field; one verifier's list is negated field-wise (`v -> P - v`), so the
//! honest accumulators are additive shares of `g^x` up to sign, which is
//! exactly what [`crate::sposs`] audits against.
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AuditAccumulator, KeyListParams, PredicateType};
use crate::algebra::{FieldElement, Group, GroupElement};
use crate::dpf::{Dpf, HashKey, Key, PrfKey, TreeDpf, VerifiableDpf};
use crate::sposs;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyList {
    pub params: KeyListParams,
    group: Group,
    proof_pp: sposs::PublicParams,
    // hash keys for the VDPF; chosen by the verifiers, not the prover
    hash_keys: [HashKey; 2],
    public_keys: Vec<GroupElement>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofShare {
    pub share_number: u8,
    pub prf_key: PrfKey,
    pub dpf_key: Key,
    pub predicate: PredicateType,
    pub sposs_share: sposs::ProofShare,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditShare {
    share: sposs::AuditShare,
    pi: Vec<u8>,
    key_share: FieldElement,
}

impl AuditShare {
    /// The verifier's additive share of the selected key's value.
    pub fn key_share(&self) -> &FieldElement {
        &self.key_share
    }
}

impl AuditAccumulator for FieldElement {
    type Entry = GroupElement;

    fn add_selected(&mut self, entry: &GroupElement) {
        *self += entry.value();
    }
}

impl KeyList {
    pub fn new(params: KeyListParams, group: Group, public_keys: Vec<GroupElement>) -> KeyList {
        assert_eq!(public_keys.len() as u64, params.num_keys);
        let proof_pp = sposs::PublicParams::new(group.clone());
        KeyList {
            params,
            group,
            proof_pp,
            hash_keys: [HashKey::random(), HashKey::random()],
            public_keys,
        }
    }

    /// List of independently random keys `g^alpha`.
    pub fn generate_random_key_list(
        num_keys: u64,
        fss_domain: u32,
        group: Group,
        predicate: PredicateType,
        num_subkeys: u64,
    ) -> KeyList {
        let params = KeyListParams::new(num_keys, fss_domain, predicate, num_subkeys);
        let public_keys = (0..params.num_keys)
            .map(|_| group.sample().0)
            .collect();
        KeyList::new(params, group, public_keys)
    }

    /// List with the same key at every slot. Generating the full random list
    /// is time consuming; one exponentiation is enough to exercise the
    /// protocol. Returns the list, the secret exponent, and a position
    /// registered for it.
    pub fn generate_testing_key_list(
        num_keys: u64,
        fss_domain: u32,
        group: Group,
        predicate: PredicateType,
        num_subkeys: u64,
    ) -> (KeyList, FieldElement, u64) {
        let params = KeyListParams::new(num_keys, fss_domain, predicate, num_subkeys);
        let proof_pp = sposs::PublicParams::new(group.clone());

        let key = FieldElement::sample(proof_pp.exp_field());
        let g_key = group.element_from_exponent(key.value());
        let public_keys = vec![g_key; params.num_keys as usize];

        let idx = thread_rng().gen_range(0..params.num_keys);
        let kl = KeyList {
            params,
            group,
            proof_pp,
            hash_keys: [HashKey::random(), HashKey::random()],
            public_keys,
        };
        (kl, key, idx)
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn proof_pp(&self) -> &sposs::PublicParams {
        &self.proof_pp
    }

    /// Field-wise negation `v -> P - v` of every registered key. In the full
    /// field this is `-g^x`; the inclusion protocol depends on negating the
    /// *values*, not the subgroup elements.
    pub fn flip_sign_of_keys(&mut self) {
        for key in &mut self.public_keys {
            *key = GroupElement::new(-key.value().clone());
        }
    }

    /// Two proof shares for knowledge of the exponent of the key at list
    /// position `idx`.
    pub fn new_proof(&self, idx: u64, x: &FieldElement) -> (ProofShare, ProofShare) {
        let alpha = self.params.point_for(idx);

        let dpf = TreeDpf::new_verifiable(PrfKey::random(), self.hash_keys);
        let (dpf_key_a, dpf_key_b) = dpf.gen_verifiable(alpha, self.params.fss_domain);

        // If verifier B retrieves the key it sees the negated entry, so prove
        // knowledge of x' with g^x' = -g^x instead: since -1 = g^q in the
        // order-2q group, x' = x + q mod 2q.
        let mut witness = x.clone();
        if dpf.eval(&dpf_key_b, alpha) & 1 == 1 {
            let q = self.group.field().p_minus_1() >> 1;
            witness = witness + FieldElement::new(q, self.proof_pp.exp_field().clone());
        }

        let (sposs_a, sposs_b) = self.proof_pp.gen_proof(&witness);

        (
            ProofShare {
                share_number: 0,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_a,
                predicate: self.params.predicate,
                sposs_share: sposs_a,
            },
            ProofShare {
                share_number: 1,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_b,
                predicate: self.params.predicate,
                sposs_share: sposs_b,
            },
        )
    }

    pub fn expand_vdpf(&self, proof: &ProofShare) -> (Vec<u8>, Vec<u8>) {
        let dpf = TreeDpf::new_verifiable(proof.prf_key, self.hash_keys);
        if self.params.full_domain {
            // run the optimized full-domain evaluation strategy
            dpf.full_domain_ver_eval(&proof.dpf_key)
        } else {
            dpf.batch_ver_eval(&proof.dpf_key, &self.params.key_indices)
        }
    }

    /// Selects key values with the expanded VDPF bits and audits the
    /// accumulator as this verifier's share of `g^x`.
    pub fn audit(&self, proof: &ProofShare) -> AuditShare {
        let (bits, pi) = self.expand_vdpf(proof);
        let accumulator =
            FieldElement::zero(self.group.field()).select(&bits, &self.public_keys);
        let share = self.proof_pp.audit(&accumulator, &proof.sposs_share);
        AuditShare {
            share,
            pi,
            key_share: accumulator,
        }
    }

    /// Accepts iff the VDPF proofs match (the point function is well-formed)
    /// and the SPoSS digests match (the prover knows the selected key).
    pub fn check_audit(&self, audit_share_a: &AuditShare, audit_share_b: &AuditShare) -> bool {
        let vdpf_ok = audit_share_a.pi == audit_share_b.pi;
        let sposs_ok = self
            .proof_pp
            .check_audit(&audit_share_a.share, &audit_share_b.share);
        vdpf_ok && sposs_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::default_group;

    const TEST_NUM_KEYS: u64 = 512;
    const TEST_NUM_SUBKEYS: u64 = 10; // for inclusion predicate only
    const TEST_FSS_DOMAIN: u32 = 32;

    fn flipped_clone(kl: &KeyList) -> KeyList {
        let mut flipped = kl.clone();
        flipped.flip_sign_of_keys();
        flipped
    }

    #[test]
    fn test_prove_audit_verify_inclusion() {
        let (kl, key, _) = KeyList::generate_testing_key_list(
            TEST_NUM_KEYS,
            TEST_FSS_DOMAIN,
            default_group(),
            PredicateType::Inclusion,
            TEST_NUM_SUBKEYS,
        );
        assert_eq!(kl.params.num_keys, 5120);
        assert_eq!(kl.params.fss_domain, 36);

        let kl_b = flipped_clone(&kl);
        let mut rng = thread_rng();

        for _ in 0..10 {
            // every sub-entry of the identity works
            let idx = rng.gen_range(0..kl.params.num_keys);
            let expected = kl.public_keys[idx as usize].value().clone();
            let expected_flipped = kl_b.public_keys[idx as usize].value().clone();
            let (share_a, share_b) = kl.new_proof(idx, &key);

            let audit_a = kl.audit(&share_a);
            let audit_b = kl_b.audit(&share_b);

            // the accumulators recover the selected key, up to the flip
            let recovered = audit_a.key_share().clone() + audit_b.key_share().clone();
            assert!(recovered == expected || recovered == expected_flipped);

            assert!(kl.check_audit(&audit_a, &audit_b));
        }
    }

    #[test]
    fn test_prove_audit_verify_full_domain() {
        let (kl, key, idx) = KeyList::generate_testing_key_list(
            512,
            9,
            default_group(),
            PredicateType::Equality,
            1,
        );
        assert!(kl.params.full_domain);
        let kl_b = flipped_clone(&kl);
        for _ in 0..10 {
            let (share_a, share_b) = kl.new_proof(idx, &key);
            assert!(kl.check_audit(&kl.audit(&share_a), &kl_b.audit(&share_b)));
        }
    }

    #[test]
    fn test_unflipped_list_rejected() {
        let (kl, key, idx) = KeyList::generate_testing_key_list(
            64,
            10,
            default_group(),
            PredicateType::Equality,
            1,
        );
        let (share_a, share_b) = kl.new_proof(idx, &key);
        assert!(!kl.check_audit(&kl.audit(&share_a), &kl.audit(&share_b)));
    }

    #[test]
    fn test_tampered_witness_share_rejected() {
        let (kl, key, idx) = KeyList::generate_testing_key_list(
            64,
            10,
            default_group(),
            PredicateType::Equality,
            1,
        );
        let kl_b = flipped_clone(&kl);
        let (mut share_a, share_b) = kl.new_proof(idx, &key);

        share_a.sposs_share.share_x +=
            FieldElement::one(kl.proof_pp().exp_field());

        assert!(!kl.check_audit(&kl.audit(&share_a), &kl_b.audit(&share_b)));
    }

    #[test]
    fn test_tampered_vdpf_proof_rejected() {
        let (kl, key, idx) = KeyList::generate_testing_key_list(
            64,
            10,
            default_group(),
            PredicateType::Equality,
            1,
        );
        let kl_b = flipped_clone(&kl);
        let (share_a, share_b) = kl.new_proof(idx, &key);

        let audit_a = kl.audit(&share_a);
        let mut audit_b = kl_b.audit(&share_b);
        audit_b.pi = vec![0; audit_b.pi.len()];

        // the SPoSS digests still match; the VDPF check alone must reject
        assert!(kl.proof_pp().check_audit(&audit_a.share, &audit_b.share));
        assert!(!kl.check_audit(&audit_a, &audit_b));
    }

    #[test]
    fn test_random_key_list_shape() {
        let kl = KeyList::generate_random_key_list(
            8,
            10,
            default_group(),
            PredicateType::Equality,
            1,
        );
        assert_eq!(kl.public_keys.len(), 8);
        assert_ne!(kl.public_keys[0], kl.public_keys[1]);
    }
}
