//! Public-key PACL over an elliptic curve: the list holds points `x*G` and
//! the audit accumulator is point addition. One verifier's copy of the list
//! must be sign-flipped so that the two honest contributions cancel at the
//! identity.
use elliptic_curve::CurveArithmetic;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::{AuditAccumulator, KeyListParams, PredicateType};
use crate::algebra::FieldElement;
use crate::dpf::{Dpf, Key, PrfKey, TreeDpf};
use crate::ec::{Ec, Point};

#[derive(Clone, Debug)]
pub struct KeyList<C: CurveArithmetic> {
    pub params: KeyListParams,
    curve: Ec<C>,
    public_keys: Vec<Point<C>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofShare {
    pub share_number: u8,
    pub prf_key: PrfKey,
    pub dpf_key: Key,
    pub predicate: PredicateType,
    /// Additive share of the secret key, in the curve's scalar field.
    pub key_share: FieldElement,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditShare<C: CurveArithmetic> {
    share: Point<C>,
}

struct PointSum<C: CurveArithmetic>(Point<C>);

impl<C: CurveArithmetic> AuditAccumulator for PointSum<C> {
    type Entry = Point<C>;

    fn add_selected(&mut self, entry: &Point<C>) {
        self.0 = self.0 + *entry;
    }
}

impl<C: CurveArithmetic> KeyList<C> {
    pub fn new(params: KeyListParams, curve: Ec<C>, public_keys: Vec<Point<C>>) -> KeyList<C> {
        assert_eq!(public_keys.len() as u64, params.num_keys);
        KeyList {
            params,
            curve,
            public_keys,
        }
    }

    /// List with the same random key pair at every slot; returns the list,
    /// the secret scalar, and a position registered for it.
    pub fn generate_testing_key_list(
        num_keys: u64,
        fss_domain: u32,
        predicate: PredicateType,
        num_subkeys: u64,
    ) -> (KeyList<C>, FieldElement, u64) {
        let params = KeyListParams::new(num_keys, fss_domain, predicate, num_subkeys);
        let curve = Ec::<C>::new();
        let (key, point) = curve.sample();
        let public_keys = vec![point; params.num_keys as usize];
        let idx = thread_rng().gen_range(0..params.num_keys);
        (
            KeyList {
                params,
                curve,
                public_keys,
            },
            key,
            idx,
        )
    }

    pub fn curve(&self) -> &Ec<C> {
        &self.curve
    }

    /// Replaces every registered point `P` with `-P`. Exactly one verifier's
    /// copy must be flipped at setup.
    pub fn flip_sign_of_keys(&mut self) {
        for point in &mut self.public_keys {
            *point = Ec::<C>::inverse(point);
        }
    }

    /// Two proof shares for knowledge of the discrete log of the key at list
    /// position `idx`.
    pub fn new_proof(&self, idx: u64, x: &FieldElement) -> (ProofShare, ProofShare) {
        let alpha = self.params.point_for(idx);

        let dpf = TreeDpf::new(PrfKey::random());
        let (dpf_key_a, dpf_key_b) = dpf.gen(alpha, self.params.fss_domain);

        // which verifier "retrieves" the key decides the sign of x: the
        // flipped-list side must receive the positive contribution
        let mut x = x.clone();
        if dpf.eval(&dpf_key_b, alpha) & 1 == 0 {
            x = -x;
        }

        let share_a = FieldElement::sample(self.curve.scalar_field());
        let share_b = x - share_a.clone();

        (
            ProofShare {
                share_number: 0,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_a,
                predicate: self.params.predicate,
                key_share: share_a,
            },
            ProofShare {
                share_number: 1,
                prf_key: dpf.prf_key(),
                dpf_key: dpf_key_b,
                predicate: self.params.predicate,
                key_share: share_b,
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

    /// Selects public keys with the expanded DPF bits and folds in the
    /// prover's masked scalar as `share * G`.
    pub fn audit(&self, proof: &ProofShare) -> AuditShare<C> {
        let bits = self.expand_dpf(proof);
        let accumulator = PointSum::<C>(Ec::<C>::identity())
            .select(&bits, &self.public_keys)
            .0;
        AuditShare {
            share: accumulator + self.curve.base_mul(&proof.key_share),
        }
    }

    /// Accepts iff the two audit points cancel at the identity.
    pub fn check_audit(&self, audit_share_a: &AuditShare<C>, audit_share_b: &AuditShare<C>) -> bool {
        Ec::<C>::is_identity(&(audit_share_a.share + audit_share_b.share))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p256::NistP256;

    const TEST_NUM_KEYS: u64 = 512;
    const TEST_NUM_SUBKEYS: u64 = 10; // for inclusion predicate only
    const TEST_FSS_DOMAIN: u32 = 32;

    type P256KeyList = KeyList<NistP256>;

    fn flipped_clone(kl: &P256KeyList) -> P256KeyList {
        let mut flipped = kl.clone();
        flipped.flip_sign_of_keys();
        flipped
    }

    #[test]
    fn test_prove_audit_verify_inclusion() {
        let (kl, key, _) = P256KeyList::generate_testing_key_list(
            TEST_NUM_KEYS,
            TEST_FSS_DOMAIN,
            PredicateType::Inclusion,
            TEST_NUM_SUBKEYS,
        );
        assert_eq!(kl.params.num_keys, 5120);
        assert_eq!(kl.params.fss_domain, 36);

        let kl_b = flipped_clone(&kl);
        let mut rng = thread_rng();
        for _ in 0..100 {
            // every sub-entry of the identity works
            let idx = rng.gen_range(0..kl.params.num_keys);
            let (share_a, share_b) = kl.new_proof(idx, &key);
            let audit_a = kl.audit(&share_a);
            let audit_b = kl_b.audit(&share_b);
            assert!(kl.check_audit(&audit_a, &audit_b));
        }
    }

    #[test]
    fn test_prove_audit_verify_full_domain() {
        let (kl, key, idx) = P256KeyList::generate_testing_key_list(
            512,
            9,
            PredicateType::Equality,
            1,
        );
        assert!(kl.params.full_domain);
        let kl_b = flipped_clone(&kl);
        for _ in 0..100 {
            let (share_a, share_b) = kl.new_proof(idx, &key);
            assert!(kl.check_audit(&kl.audit(&share_a), &kl_b.audit(&share_b)));
        }
    }

    #[test]
    fn test_unflipped_list_rejected() {
        let (kl, key, idx) = P256KeyList::generate_testing_key_list(
            64,
            10,
            PredicateType::Equality,
            1,
        );
        let (share_a, share_b) = kl.new_proof(idx, &key);
        // both verifiers on the same copy: contributions double up instead
        // of cancelling
        assert!(!kl.check_audit(&kl.audit(&share_a), &kl.audit(&share_b)));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let (kl, _, idx) = P256KeyList::generate_testing_key_list(
            64,
            10,
            PredicateType::Equality,
            1,
        );
        let kl_b = flipped_clone(&kl);
        let wrong = kl.curve().random_scalar();
        let (share_a, share_b) = kl.new_proof(idx, &wrong);
        assert!(!kl.check_audit(&kl.audit(&share_a), &kl_b.audit(&share_b)));
    }
}
