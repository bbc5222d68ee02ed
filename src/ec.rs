//! Thin wrapper over NIST prime-curve arithmetic.
//!
//! The public-key PACL variant only needs base-point multiplication, point
//! addition, negation and the identity check; anything implementing
//! [`CurveArithmetic`] (P-256 in the tests and the embedding) will do.
//! Scalars are handed around as elements of the curve's scalar field so the
//! key-list code can share the [`crate::algebra`] API.
use std::marker::PhantomData;
use std::sync::Arc;

use elliptic_curve::bigint::ArrayEncoding;
use elliptic_curve::group::Group;
use elliptic_curve::{CurveArithmetic, FieldBytes, PrimeField};
use rand::prelude::*;
use rug::Integer;

use crate::algebra::{Field, FieldElement, BYTE_ORDER, TOP_BYTE_MASK};

pub type Point<C> = <C as CurveArithmetic>::ProjectivePoint;

#[derive(Clone, Debug)]
pub struct Ec<C: CurveArithmetic> {
    scalar_field: Arc<Field>,
    bit_len: usize,
    _curve: PhantomData<C>,
}

impl<C: CurveArithmetic> Ec<C> {
    pub fn new() -> Ec<C> {
        let order = Integer::from_digits(C::ORDER.to_be_byte_array().as_slice(), BYTE_ORDER);
        Ec {
            bit_len: order.significant_bits() as usize,
            scalar_field: Field::new(order),
            _curve: PhantomData,
        }
    }

    /// Field of integers modulo the base-point subgroup order `n`.
    pub fn scalar_field(&self) -> &Arc<Field> {
        &self.scalar_field
    }

    /// The point at infinity.
    pub fn identity() -> Point<C> {
        Point::<C>::identity()
    }

    /// The base point of the curve.
    pub fn generator() -> Point<C> {
        Point::<C>::generator()
    }

    /// `s * G`.
    pub fn base_mul(&self, scalar: &FieldElement) -> Point<C> {
        assert_eq!(scalar.field(), &self.scalar_field);
        Point::<C>::generator() * self.to_scalar(scalar)
    }

    /// `-P`, i.e. `(X, p - Y)` in affine coordinates.
    pub fn inverse(point: &Point<C>) -> Point<C> {
        -*point
    }

    pub fn is_identity(point: &Point<C>) -> bool {
        point.is_identity().into()
    }

    /// Random point along with its discrete logarithm.
    pub fn sample(&self) -> (FieldElement, Point<C>) {
        let scalar = self.random_scalar();
        let point = self.base_mul(&scalar);
        (scalar, point)
    }

    /// Uniform scalar in `[0, n)`: fill bytes from the CSPRNG, mask the top
    /// byte down to the order's bit length, reject on `>= n`.
    pub fn random_scalar(&self) -> FieldElement {
        let mut rng = thread_rng();
        let mut buf = FieldBytes::<C>::default();
        loop {
            rng.fill_bytes(buf.as_mut_slice());
            buf.as_mut_slice()[0] &= TOP_BYTE_MASK[self.bit_len % 8];
            let value = Integer::from_digits(buf.as_slice(), BYTE_ORDER);
            if value < *self.scalar_field.modulus() {
                return FieldElement::new(value, self.scalar_field.clone());
            }
        }
    }

    fn to_scalar(&self, element: &FieldElement) -> C::Scalar {
        let mut repr = FieldBytes::<C>::default();
        let digits = element.to_bytes();
        let len = repr.len();
        repr.as_mut_slice()[len - digits.len()..].copy_from_slice(&digits);
        Option::from(C::Scalar::from_repr(repr))
            .expect("canonical field element is a canonical scalar")
    }
}

impl<C: CurveArithmetic> Default for Ec<C> {
    fn default() -> Self {
        Self::new()
    }
}
