//! SPoSS: shared proof of secret shares.
//!
//! A Schnorr-style argument of knowledge of `x` with `g^x = y`, distributed
//! across two verifiers. The multiplication inside the Schnorr check runs on
//! a Beaver triple, and the verifier challenge comes from Fiat-Shamir over
//! the secret-shared transcript. Each verifier hashes its local view down to
//! a digest; the two digests are equal exactly when the check passes.
use std::sync::Arc;

use openssl::sha::Sha256;
use rug::Integer;
use serde::{Deserialize, Serialize};

use crate::algebra::{Field, FieldElement, Group};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicParams {
    group: Group,
    // exponents of g live mod P-1 (the order of the generating subgroup)
    exp_field: Arc<Field>,
}

/// One verifier's half of a proof.
///
/// `share_x` is an additive share of `x` in the exponent field; `share_u` is
/// one leg (`a` or `b`) of a Beaver triple and `share_c` an additive share of
/// `c = a*b`; `d`, `e`, `r` are publicly opened and identical on both halves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProofShare {
    pub server_number: u8,
    pub share_x: FieldElement,
    pub share_u: FieldElement,
    pub share_c: FieldElement,
    pub d: FieldElement,
    pub e: FieldElement,
    pub r: FieldElement,
    pub nonce: FieldElement,
}

/// The two verifiers hold subtractive shares of zero, so each hashes its side
/// down to a digest to save bandwidth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditShare {
    hashed_data: [u8; 32],
}

impl PublicParams {
    pub fn new(group: Group) -> PublicParams {
        let exp_field = Field::new(group.field().p_minus_1());
        PublicParams { group, exp_field }
    }

    pub fn group(&self) -> &Group {
        &self.group
    }

    pub fn exp_field(&self) -> &Arc<Field> {
        &self.exp_field
    }

    /// Proof shares for knowledge of `x` such that `g^x = y`. The verifiers
    /// need additive shares of `y` (in the base field) to audit.
    pub fn gen_proof(&self, x: &FieldElement) -> (ProofShare, ProofShare) {
        assert_eq!(x.field(), &self.exp_field, "witness must live in the exponent field");
        let field = self.group.field();

        // additive secret shares of x, in the exponent field
        let (x_a, x_b) = self.exp_linear_shares(x);

        // Beaver triple: a, b random; c = ab, additively shared
        let a = FieldElement::sample(field);
        let b = FieldElement::sample(field);
        let c = a.clone() * b.clone();
        let (c_a, c_b) = self.linear_shares(&c);

        // Fiat-Shamir randomness over both secret-shared transcripts
        let nonce_a = FieldElement::sample(field);
        let nonce_b = FieldElement::sample(field);
        let r_a = self.random_oracle(&nonce_a, &x_a, &a, &c_a);
        let r_b = self.random_oracle(&nonce_b, &x_b, &b, &c_b);
        let r = r_a + r_b;

        let g_x_a = self.group.element_from_exponent(x_a.value()).into_value();
        let g_x_b = self.group.element_from_exponent(x_b.value()).into_value();

        // openings of the Beaver multiplication: d = r*g^xA - a, e = g^xB - b
        let d = r.clone() * g_x_a - a.clone();
        let e = g_x_b - b.clone();

        (
            ProofShare {
                server_number: 0,
                share_x: x_a,
                share_u: a,
                share_c: c_a,
                d: d.clone(),
                e: e.clone(),
                r: r.clone(),
                nonce: nonce_a,
            },
            ProofShare {
                server_number: 1,
                share_x: x_b,
                share_u: b,
                share_c: c_b,
                d,
                e,
                r,
                nonce: nonce_b,
            },
        )
    }

    /// The pre-hash audit triple. Server 1 negates its side, turning the
    /// additive shares into subtractive shares: honest execution makes the
    /// two triples (and hence the digests) equal.
    fn audit_values(
        &self,
        y_share: &FieldElement,
        share: &ProofShare,
    ) -> (FieldElement, FieldElement, FieldElement) {
        let field = self.group.field();

        // recompute this verifier's half of the Fiat-Shamir challenge
        let r_local = self.random_oracle(&share.nonce, &share.share_x, &share.share_u, &share.share_c);

        let g_x = self
            .group
            .element_from_exponent(share.share_x.value())
            .into_value();

        let two_inv = FieldElement::new(Integer::from(2), field.clone()).invert();
        let half_de = share.d.clone() * share.e.clone() * two_inv;
        let r_y = share.r.clone() * y_share.clone();

        if share.server_number == 0 {
            let u = share.r.clone() * g_x - share.share_u.clone() - share.d.clone();
            let v = half_de + share.e.clone() * share.share_u.clone() + share.share_c.clone();
            let w = v - r_y;
            let r_rem = r_local - share.r.clone();
            (w, r_rem, u)
        } else {
            let u = g_x - share.share_u.clone() - share.e.clone();
            let v = half_de + share.d.clone() * share.share_u.clone() + share.share_c.clone();
            let w = v - r_y;
            (-w, -r_local, -u)
        }
    }

    pub fn audit(&self, y_share: &FieldElement, share: &ProofShare) -> AuditShare {
        let (w, r_rem, u) = self.audit_values(y_share, share);

        let mut hasher = Sha256::new();
        hasher.update(&w.to_bytes());
        hasher.update(&r_rem.to_bytes());
        hasher.update(&u.to_bytes());
        AuditShare {
            hashed_data: hasher.finish(),
        }
    }

    pub fn check_audit(&self, audit_share_a: &AuditShare, audit_share_b: &AuditShare) -> bool {
        audit_share_a.hashed_data == audit_share_b.hashed_data
    }

    /// Fiat-Shamir oracle over one verifier's transcript, into the base field.
    pub fn random_oracle(
        &self,
        nonce: &FieldElement,
        share_x: &FieldElement,
        share_u: &FieldElement,
        share_c: &FieldElement,
    ) -> FieldElement {
        let mut hasher = Sha256::new();
        hasher.update(&nonce.to_bytes());
        hasher.update(&share_x.to_bytes());
        hasher.update(&share_u.to_bytes());
        hasher.update(&share_c.to_bytes());
        FieldElement::from_bytes(&hasher.finish(), self.group.field().clone())
    }

    /// Additive shares of `value` in the base field.
    pub fn linear_shares(&self, value: &FieldElement) -> (FieldElement, FieldElement) {
        let share = FieldElement::sample(self.group.field());
        let remainder = value.clone() - share.clone();
        (share, remainder)
    }

    /// Additive shares of `value` in the exponent field.
    pub fn exp_linear_shares(&self, value: &FieldElement) -> (FieldElement, FieldElement) {
        let share = FieldElement::sample(&self.exp_field);
        let remainder = value.clone() - share.clone();
        (share, remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::default_group;

    fn shared_witness(pp: &PublicParams) -> (FieldElement, FieldElement, FieldElement) {
        let x = FieldElement::sample(pp.exp_field());
        let y = pp.group().element_from_exponent(x.value()).into_value();
        let (y_a, y_b) = pp.linear_shares(&y);
        (x, y_a, y_b)
    }

    #[test]
    fn test_honest_prover_accepted() {
        let pp = PublicParams::new(default_group());

        for _ in 0..10 {
            let (x, y_a, y_b) = shared_witness(&pp);
            let (proof_a, proof_b) = pp.gen_proof(&x);

            let audit_a = pp.audit(&y_a, &proof_a);
            let audit_b = pp.audit(&y_b, &proof_b);

            assert!(pp.check_audit(&audit_a, &audit_b));
        }
    }

    #[test]
    fn test_audit_triples_equal() {
        let pp = PublicParams::new(default_group());
        let (x, y_a, y_b) = shared_witness(&pp);
        let (proof_a, proof_b) = pp.gen_proof(&x);

        // the subtractive shares of zero, before hashing
        assert_eq!(
            pp.audit_values(&y_a, &proof_a),
            pp.audit_values(&y_b, &proof_b)
        );
    }

    #[test]
    fn test_tampered_witness_share_rejected() {
        let pp = PublicParams::new(default_group());
        let (x, y_a, y_b) = shared_witness(&pp);
        let (mut proof_a, proof_b) = pp.gen_proof(&x);

        proof_a.share_x += FieldElement::one(pp.exp_field());

        let audit_a = pp.audit(&y_a, &proof_a);
        let audit_b = pp.audit(&y_b, &proof_b);
        assert!(!pp.check_audit(&audit_a, &audit_b));
    }

    #[test]
    fn test_wrong_public_value_rejected() {
        let pp = PublicParams::new(default_group());
        let (x, y_a, y_b) = shared_witness(&pp);
        let (proof_a, proof_b) = pp.gen_proof(&x);

        let y_a = y_a + FieldElement::one(pp.group().field());
        let audit_a = pp.audit(&y_a, &proof_a);
        let audit_b = pp.audit(&y_b, &proof_b);
        assert!(!pp.check_audit(&audit_a, &audit_b));
    }

    #[test]
    fn test_proof_share_serialize_roundtrip() {
        let pp = PublicParams::new(default_group());
        let x = FieldElement::sample(pp.exp_field());
        let (proof_a, _) = pp.gen_proof(&x);

        let json = serde_json::to_string(&proof_a).unwrap();
        assert_eq!(serde_json::from_str::<ProofShare>(&json).unwrap(), proof_a);
    }
}
