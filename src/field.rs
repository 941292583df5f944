//! Prime field wrapper over feanor-math's `zn_64` implementation.
//!
//! All modular arithmetic in the crate goes through [`PrimeField`]. Elements are
//! feanor-math `ZnEl` values; canonical integer representatives in `[0, p)` only
//! appear at I/O boundaries (matrix files, group descriptions, tests).

use crate::error::{ResolutionError, Result};
use feanor_math::divisibility::DivisibilityRingStore;
use feanor_math::homomorphism::Homomorphism;
use feanor_math::ring::*;
use feanor_math::rings::zn::zn_64::{Zn, ZnEl};
use feanor_math::rings::zn::ZnRingStore;
use std::fmt::{self, Debug, Display};

/// Element type of every [`PrimeField`].
pub type FieldElement = ZnEl;

/// The prime field `F_p` a group algebra is defined over.
///
/// # Example
/// ```ignore
/// use pgroup_resolution::PrimeField;
///
/// let field = PrimeField::new(3)?;
/// let two = field.from_u32(2);
/// assert!(field.is_one(&field.mul(two, two)));
/// ```
#[derive(Clone)]
pub struct PrimeField {
    order: u64,
    ring: Zn,
}

impl PrimeField {
    /// Create the field with `order` elements. `order` must be a prime below
    /// `2^31`.
    pub fn new(order: u64) -> Result<Self> {
        if order < 2 || order > i32::MAX as u64 || !is_prime(order) {
            return Err(ResolutionError::BadArgument(format!(
                "field order {} is not a supported prime",
                order
            )));
        }
        Ok(PrimeField {
            order,
            ring: Zn::new(order),
        })
    }

    /// The underlying feanor-math ring.
    pub fn ring(&self) -> &Zn {
        &self.ring
    }

    #[inline]
    pub fn zero(&self) -> FieldElement {
        self.ring.zero()
    }

    #[inline]
    pub fn one(&self) -> FieldElement {
        self.ring.one()
    }

    #[inline]
    pub fn minus_one(&self) -> FieldElement {
        self.ring.neg_one()
    }

    /// Map a canonical integer into the field, reducing modulo `p`.
    pub fn from_u32(&self, value: u32) -> FieldElement {
        let reduced = (value as u64 % self.order) as i32;
        self.ring.int_hom().map(reduced)
    }

    /// Map a small signed integer into the field.
    pub fn from_i32(&self, value: i32) -> FieldElement {
        self.ring.int_hom().map(value)
    }

    /// The canonical representative of `el` in `[0, p)`.
    pub fn to_u32(&self, el: &FieldElement) -> u32 {
        self.ring.smallest_positive_lift(self.ring.clone_el(el)) as u32
    }

    #[inline]
    pub fn add(&self, lhs: FieldElement, rhs: FieldElement) -> FieldElement {
        self.ring.add(lhs, rhs)
    }

    #[inline]
    pub fn sub(&self, lhs: FieldElement, rhs: FieldElement) -> FieldElement {
        self.ring.sub(lhs, rhs)
    }

    #[inline]
    pub fn mul(&self, lhs: FieldElement, rhs: FieldElement) -> FieldElement {
        self.ring.mul(lhs, rhs)
    }

    #[inline]
    pub fn negate(&self, el: FieldElement) -> FieldElement {
        self.ring.negate(el)
    }

    /// Multiplicative inverse, failing on zero.
    pub fn invert(&self, el: &FieldElement) -> Result<FieldElement> {
        self.ring.invert(el).ok_or(ResolutionError::DivisionByZero)
    }

    #[inline]
    pub fn is_zero(&self, el: &FieldElement) -> bool {
        self.ring.is_zero(el)
    }

    #[inline]
    pub fn is_one(&self, el: &FieldElement) -> bool {
        self.ring.is_one(el)
    }

    #[inline]
    pub fn eq_el(&self, lhs: &FieldElement, rhs: &FieldElement) -> bool {
        self.ring.eq_el(lhs, rhs)
    }

    /// Allocate `len` zero entries.
    pub fn zeros(&self, len: usize) -> Vec<FieldElement> {
        (0..len).map(|_| self.zero()).collect()
    }
}

/// Properties of a finite prime field that the rest of the crate relies on.
pub trait FieldProperties {
    /// The characteristic `p`.
    fn characteristic(&self) -> u64;

    /// Whether the characteristic is odd. Several completion heuristics
    /// depend on this.
    fn is_odd_characteristic(&self) -> bool {
        self.characteristic() % 2 == 1
    }

    /// Number of bits needed to store a canonical representative.
    fn element_bits(&self) -> u32 {
        64 - (self.characteristic() - 1).leading_zeros()
    }
}

impl FieldProperties for PrimeField {
    fn characteristic(&self) -> u64 {
        self.order
    }
}

impl PartialEq for PrimeField {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for PrimeField {}

impl Debug for PrimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrimeField({})", self.order)
    }
}

impl Display for PrimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GF({})", self.order)
    }
}

fn is_prime(n: u64) -> bool {
    if n < 4 {
        return n >= 2;
    }
    if n % 2 == 0 {
        return false;
    }
    let mut d = 3;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_arithmetic() {
        let field = PrimeField::new(17).unwrap();
        let a = field.from_u32(5);
        let b = field.from_u32(3);

        // 5 + 3 = 8 in F_17
        assert_eq!(field.to_u32(&field.add(a, b)), 8);
        // 3 - 5 = -2 = 15
        assert_eq!(field.to_u32(&field.sub(b, a)), 15);
        // 5 * 3 = 15
        assert_eq!(field.to_u32(&field.mul(a, b)), 15);
        // -5 = 12
        assert_eq!(field.to_u32(&field.negate(a)), 12);
    }

    #[test]
    fn test_inversion() {
        let field = PrimeField::new(7).unwrap();
        for i in 1..7 {
            let x = field.from_u32(i);
            let inv = field.invert(&x).unwrap();
            assert!(field.is_one(&field.mul(x, inv)));
        }
        assert!(matches!(
            field.invert(&field.zero()),
            Err(ResolutionError::DivisionByZero)
        ));
    }

    #[test]
    fn test_characteristic_two() {
        let field = PrimeField::new(2).unwrap();
        assert!(field.eq_el(&field.minus_one(), &field.one()));
        assert!(!field.is_odd_characteristic());
        assert_eq!(field.element_bits(), 1);
        assert_eq!(field.to_u32(&field.from_i32(-1)), 1);
    }

    #[test]
    fn test_rejects_composite_order() {
        assert!(PrimeField::new(9).is_err());
        assert!(PrimeField::new(1).is_err());
        assert!(PrimeField::new(0).is_err());
        assert!(PrimeField::new(251).is_ok());
    }

    #[test]
    fn test_reduction_modulo_order() {
        let field = PrimeField::new(5).unwrap();
        assert_eq!(field.to_u32(&field.from_u32(13)), 3);
        assert_eq!(field.to_u32(&field.from_i32(-3)), 2);
    }
}
