//! Prime-field and cyclic-group arithmetic over arbitrary-precision integers.
use std::cmp::Ordering;
use std::ops;
use std::sync::Arc;

use rand::prelude::*;
use rug::integer::{IsPrime, Order};
use rug::ops::RemRounding;
use rug::Integer;
use serde::{Deserialize, Serialize};

/// Big-endian, most-significant byte first: the layout used for hashing and
/// byte conversions throughout the crate.
pub(crate) const BYTE_ORDER: Order = Order::MsfBe;

// Bitmask for the top byte of a sampled value, indexed by `bit_len % 8`.
// Masking off the excess bits keeps the rejection rate below one half.
pub(crate) const TOP_BYTE_MASK: [u8; 8] = [0xff, 0x1, 0x3, 0x7, 0xf, 0x1f, 0x3f, 0x7f];

/// Field of integers modulo `P`.
///
/// The modulus is *not* checked for primality: the SPoSS exponent field is
/// constructed over the composite modulus `P - 1`. [`default_group`] performs
/// the primality and generator-order checks required of the production group.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    modulus: Integer,
}

impl Field {
    pub fn new(modulus: Integer) -> Arc<Field> {
        assert!(modulus > 1, "modulus must be at least 2");
        Arc::new(Field { modulus })
    }

    pub fn modulus(&self) -> &Integer {
        &self.modulus
    }

    /// Modulus of the exponent field associated with a group over this field.
    pub fn p_minus_1(&self) -> Integer {
        Integer::from(&self.modulus - 1u32)
    }
}

/// Element of a [`Field`], stored canonically in `[0, P)`.
///
/// Arithmetic is via the usual operator traits; the `*Assign` forms reduce in
/// place. Operands must belong to the same field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldElement {
    value: Integer,
    field: Arc<Field>,
}

impl FieldElement {
    /// New element with value `value mod P`.
    pub fn new(value: Integer, field: Arc<Field>) -> FieldElement {
        let value = value.rem_euc(&field.modulus);
        FieldElement { value, field }
    }

    pub fn zero(field: &Arc<Field>) -> FieldElement {
        FieldElement {
            value: Integer::new(),
            field: field.clone(),
        }
    }

    pub fn one(field: &Arc<Field>) -> FieldElement {
        FieldElement {
            value: Integer::from(1),
            field: field.clone(),
        }
    }

    /// Uniform element of `[0, P)`, by masked rejection sampling from the
    /// thread CSPRNG.
    pub fn sample(field: &Arc<Field>) -> FieldElement {
        let mut rng = thread_rng();
        let bits = field.modulus.significant_bits() as usize;
        let mut buf = vec![0u8; (bits + 7) / 8];
        loop {
            rng.fill_bytes(&mut buf);
            buf[0] &= TOP_BYTE_MASK[bits % 8];
            let value = Integer::from_digits(&buf, BYTE_ORDER);
            if value < field.modulus {
                return FieldElement {
                    value,
                    field: field.clone(),
                };
            }
        }
    }

    pub fn from_bytes(bytes: &[u8], field: Arc<Field>) -> FieldElement {
        FieldElement::new(Integer::from_digits(bytes, BYTE_ORDER), field)
    }

    /// Minimal big-endian byte representation (empty for zero).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.value.to_digits::<u8>(BYTE_ORDER)
    }

    /// Multiplicative inverse mod `P`.
    ///
    /// Panics if the element is zero (or shares a factor with a composite
    /// modulus).
    pub fn invert(&self) -> FieldElement {
        let value = self
            .value
            .clone()
            .invert(&self.field.modulus)
            .expect("element has no multiplicative inverse");
        FieldElement {
            value,
            field: self.field.clone(),
        }
    }

    /// `self^exponent mod P` for a non-negative exponent.
    pub fn pow(&self, exponent: &Integer) -> FieldElement {
        let value = self
            .value
            .clone()
            .pow_mod(exponent, &self.field.modulus)
            .expect("exponent must be non-negative");
        FieldElement {
            value,
            field: self.field.clone(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value.cmp0() == Ordering::Equal
    }

    pub fn value(&self) -> &Integer {
        &self.value
    }

    pub fn into_value(self) -> Integer {
        self.value
    }

    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }
}

impl ops::Add for FieldElement {
    type Output = FieldElement;

    fn add(self, other: FieldElement) -> FieldElement {
        assert_eq!(self.field, other.field);
        FieldElement::new(self.value + other.value, other.field)
    }
}

impl ops::AddAssign for FieldElement {
    fn add_assign(&mut self, other: FieldElement) {
        assert_eq!(self.field, other.field);
        self.value += other.value;
        if self.value >= self.field.modulus {
            self.value -= &self.field.modulus;
        }
    }
}

impl ops::AddAssign<&FieldElement> for FieldElement {
    fn add_assign(&mut self, other: &FieldElement) {
        assert_eq!(self.field, other.field);
        self.value += &other.value;
        if self.value >= self.field.modulus {
            self.value -= &self.field.modulus;
        }
    }
}

impl ops::Sub for FieldElement {
    type Output = FieldElement;

    fn sub(self, other: FieldElement) -> FieldElement {
        assert_eq!(self.field, other.field);
        FieldElement::new(self.value - other.value, other.field)
    }
}

impl ops::SubAssign for FieldElement {
    fn sub_assign(&mut self, other: FieldElement) {
        assert_eq!(self.field, other.field);
        self.value -= other.value;
        if self.value.cmp0() == Ordering::Less {
            self.value += &self.field.modulus;
        }
    }
}

impl ops::Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, other: FieldElement) -> FieldElement {
        assert_eq!(self.field, other.field);
        FieldElement::new(self.value * other.value, other.field)
    }
}

impl ops::MulAssign for FieldElement {
    fn mul_assign(&mut self, other: FieldElement) {
        assert_eq!(self.field, other.field);
        self.value *= other.value;
        self.value = self.value.clone().rem_euc(&self.field.modulus);
    }
}

impl ops::Neg for FieldElement {
    type Output = FieldElement;

    fn neg(self) -> FieldElement {
        FieldElement::new(-self.value, self.field)
    }
}

/// Cyclic subgroup of `F_p*` generated by `g`.
///
/// For the default safe-prime group the generating subgroup has order
/// `2q = P - 1`, not the quadratic-residue subgroup of order `q`; the SPoSS
/// key list relies on `-1 = g^q` being reachable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    field: Arc<Field>,
    generator: FieldElement,
}

/// Element of a [`Group`], represented by its value in the backing field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupElement {
    value: FieldElement,
}

impl Group {
    pub fn new(field: Arc<Field>, generator: FieldElement) -> Group {
        assert_eq!(generator.field(), &field);
        Group { field, generator }
    }

    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }

    pub fn generator(&self) -> &FieldElement {
        &self.generator
    }

    /// `g^exponent mod P`.
    pub fn element_from_exponent(&self, exponent: &Integer) -> GroupElement {
        GroupElement {
            value: self.generator.pow(exponent),
        }
    }

    /// `g^0`.
    pub fn identity(&self) -> GroupElement {
        self.element_from_exponent(&Integer::new())
    }

    /// Random element, along with its discrete logarithm.
    pub fn sample(&self) -> (GroupElement, Integer) {
        let exponent = FieldElement::sample(&self.field).into_value();
        (self.element_from_exponent(&exponent), exponent)
    }
}

impl GroupElement {
    pub fn new(value: FieldElement) -> GroupElement {
        GroupElement { value }
    }

    pub fn value(&self) -> &FieldElement {
        &self.value
    }

    pub fn into_value(self) -> FieldElement {
        self.value
    }

    pub fn invert(&self) -> GroupElement {
        GroupElement {
            value: self.value.invert(),
        }
    }
}

impl ops::Mul for GroupElement {
    type Output = GroupElement;

    fn mul(self, other: GroupElement) -> GroupElement {
        GroupElement {
            value: self.value * other.value,
        }
    }
}

// https://datatracker.ietf.org/doc/html/rfc3526#page-4
const MODP_3072_HEX: &str = "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129024E088A67CC74020BBEA63B139B22514A08798E3404DDEF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7EDEE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F83655D23DCA3AD961C62F356208552BB9ED529077096966D670C354E4ABC9804F1746C08CA18217C32905E462E36CE3BE39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF6955817183995497CEA956AE515D2261898FA051015728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6BF12FFA06D98A0864D87602733EC86A64521F2B18177B200CBBE117577A615D6C770988C0BAD946E208E24FA074E5AB3143DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF";

// Generator with generating subgroup of order 2q (NOT the group of quadratic
// residues as commonly done).
const DEFAULT_GENERATOR: u32 = 5;

/// Safe-prime group over the RFC 3526 3072-bit MODP prime with `g = 5`.
///
/// Panics if the modulus fails a primality test or if `g` generates only the
/// order-`q` quadratic-residue subgroup. Both are configuration errors and
/// fatal at startup.
pub fn default_group() -> Group {
    let p = Integer::from_str_radix(MODP_3072_HEX, 16).expect("valid hex constant");
    if p.is_probably_prime(15) == IsPrime::No {
        panic!("default group modulus is not prime");
    }

    let field = Field::new(p);
    let generator = FieldElement::new(Integer::from(DEFAULT_GENERATOR), field.clone());

    let q = field.p_minus_1() >> 1;
    if generator.pow(&q) == FieldElement::one(&field) {
        panic!("default generator does not have order 2q");
    }

    Group::new(field, generator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // 2^61 - 1, a Mersenne prime: big enough to exercise multi-limb values.
    const TEST_PRIME: u64 = 2_305_843_009_213_693_951;

    // 1523 is a safe prime: 1522 = 2 * 761.
    const SAFE_PRIME: u32 = 1523;

    fn test_field() -> Arc<Field> {
        Field::new(Integer::from(TEST_PRIME))
    }

    /// Smallest element generating the full order-(p-1) subgroup.
    fn find_generator(field: &Arc<Field>) -> FieldElement {
        let one = FieldElement::one(field);
        let factors = [Integer::from(2), Integer::from(761)];
        let mut candidate = Integer::from(2);
        loop {
            let g = FieldElement::new(candidate.clone(), field.clone());
            let full_order = factors.iter().all(|factor| {
                let power = field.p_minus_1() / factor;
                g.pow(&power) != one
            });
            if full_order {
                return g;
            }
            candidate += 1;
        }
    }

    proptest! {
        #[test]
        fn test_add_sub_roundtrip(a: u64, b: u64) {
            let field = test_field();
            let a = FieldElement::new(Integer::from(a), field.clone());
            let b = FieldElement::new(Integer::from(b), field);
            prop_assert_eq!((a.clone() + b.clone()) - b, a);
        }

        #[test]
        fn test_mul_inverse_roundtrip(a: u64, b: u64) {
            let field = test_field();
            let a = FieldElement::new(Integer::from(a), field.clone());
            let b = FieldElement::new(Integer::from(b), field);
            prop_assume!(!b.is_zero());
            prop_assert_eq!(a.clone() * b.clone() * b.invert(), a);
        }

        #[test]
        fn test_neg_adds_to_zero(a: u64) {
            let field = test_field();
            let a = FieldElement::new(Integer::from(a), field.clone());
            prop_assert_eq!(a.clone() + (-a), FieldElement::zero(&field));
        }

        #[test]
        fn test_assign_ops_match_value_ops(a: u64, b: u64) {
            let field = test_field();
            let a = FieldElement::new(Integer::from(a), field.clone());
            let b = FieldElement::new(Integer::from(b), field);
            let mut sum = a.clone();
            sum += b.clone();
            prop_assert_eq!(sum, a.clone() + b.clone());
            let mut diff = a.clone();
            diff -= b.clone();
            prop_assert_eq!(diff, a.clone() - b.clone());
            let mut prod = a.clone();
            prod *= b.clone();
            prop_assert_eq!(prod, a * b);
        }

        #[test]
        fn test_exponent_homomorphism(alpha: u32, beta: u32) {
            let field = Field::new(Integer::from(SAFE_PRIME));
            let group = Group::new(field.clone(), find_generator(&field));
            let lhs = group.element_from_exponent(&Integer::from(alpha))
                * group.element_from_exponent(&Integer::from(beta));
            let exponent = (Integer::from(alpha) + Integer::from(beta))
                .rem_euc(&field.p_minus_1());
            prop_assert_eq!(lhs, group.element_from_exponent(&exponent));
        }

        #[test]
        fn test_group_element_inverse(alpha: u32) {
            let field = Field::new(Integer::from(SAFE_PRIME));
            let group = Group::new(field.clone(), find_generator(&field));
            let g = group.element_from_exponent(&Integer::from(alpha));
            prop_assert_eq!(g.clone() * g.invert(), group.identity());
        }
    }

    #[test]
    fn test_sample_not_deterministic() {
        let field = test_field();
        assert_ne!(
            FieldElement::sample(&field),
            FieldElement::sample(&field),
            "two random field elements should differ"
        );
    }

    #[test]
    fn test_sample_canonical() {
        let field = Field::new(Integer::from(7));
        for _ in 0..100 {
            let element = FieldElement::sample(&field);
            assert!(element.value() < field.modulus());
        }
    }

    #[test]
    #[should_panic]
    fn test_invert_zero_panics() {
        let field = test_field();
        FieldElement::zero(&field).invert();
    }

    #[test]
    fn test_default_group_generator_order() {
        let group = default_group();
        let field = group.field();
        let q = field.p_minus_1() >> 1;
        let one = FieldElement::one(field);
        assert_ne!(group.generator().pow(&q), one, "g^q must not be 1");
        assert_eq!(group.generator().pow(&field.p_minus_1()), one, "g^2q must be 1");
    }

    #[test]
    fn test_element_serialize_roundtrip() {
        let field = test_field();
        let x = FieldElement::sample(&field);
        let json = serde_json::to_string(&x).unwrap();
        assert_eq!(serde_json::from_str::<FieldElement>(&json).unwrap(), x);
    }
}
