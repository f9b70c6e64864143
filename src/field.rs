//! Finite-field arithmetic underlying all curve computations
//!
//! A `FieldElement` is a value in GF(p) for an arbitrary prime p. Elements
//! carry their modulus with them; mixing elements from different fields is
//! rejected rather than silently coerced.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Zero};

use crate::error::{ProtocolError, Result};

/// An element of the prime field GF(p). Invariant: 0 <= value < prime.
///
/// All operations produce new elements; nothing is mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement {
    value: BigUint,
    prime: BigUint,
}

impl FieldElement {
    /// Construct an element, reducing the value modulo the prime.
    pub fn new(value: BigUint, prime: BigUint) -> Self {
        let value = value % &prime;
        FieldElement { value, prime }
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn prime(&self) -> &BigUint {
        &self.prime
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// The additive identity of this element's field.
    pub fn zero_like(&self) -> FieldElement {
        FieldElement::new(BigUint::zero(), self.prime.clone())
    }

    fn same_field(&self, other: &FieldElement, op: &str) -> Result<()> {
        if self.prime != other.prime {
            return Err(ProtocolError::IncompatibleField(format!(
                "cannot {} elements of different fields",
                op
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &FieldElement) -> Result<FieldElement> {
        self.same_field(other, "add")?;
        let value = (&self.value + &other.value) % &self.prime;
        Ok(FieldElement {
            value,
            prime: self.prime.clone(),
        })
    }

    pub fn sub(&self, other: &FieldElement) -> Result<FieldElement> {
        self.same_field(other, "subtract")?;
        // Lift above the modulus before subtracting; BigUint cannot go negative.
        let value = (&self.value + &self.prime - &other.value) % &self.prime;
        Ok(FieldElement {
            value,
            prime: self.prime.clone(),
        })
    }

    pub fn mul(&self, other: &FieldElement) -> Result<FieldElement> {
        self.same_field(other, "multiply")?;
        let value = (&self.value * &other.value) % &self.prime;
        Ok(FieldElement {
            value,
            prime: self.prime.clone(),
        })
    }

    /// Division via Fermat's little theorem: b^(p-2) is b's inverse mod p.
    pub fn div(&self, other: &FieldElement) -> Result<FieldElement> {
        self.same_field(other, "divide")?;
        if other.value.is_zero() {
            return Err(ProtocolError::DivisionByZero);
        }
        let exponent = &other.prime - BigUint::from(2u8);
        let inverse = other.value.modpow(&exponent, &other.prime);
        let value = (&self.value * inverse) % &self.prime;
        Ok(FieldElement {
            value,
            prime: self.prime.clone(),
        })
    }

    /// Modular exponentiation by square-and-multiply. Negative exponents are
    /// reduced modulo p-1, so `pow(-1)` is the multiplicative inverse.
    pub fn pow(&self, exponent: &BigInt) -> FieldElement {
        let group_order = BigInt::from(self.prime.clone()) - BigInt::one();
        let mut reduced = exponent % &group_order;
        if reduced.sign() == Sign::Minus {
            reduced += &group_order;
        }
        let (_, exp) = reduced.into_parts();
        FieldElement {
            value: self.value.modpow(&exp, &self.prime),
            prime: self.prime.clone(),
        }
    }

    /// Modular square root, valid only for p = 3 mod 4 (true for secp256k1):
    /// w = v^((p+1)/4). Fails when v is not a quadratic residue.
    pub fn sqrt(&self) -> Result<FieldElement> {
        let exponent = (&self.prime + BigUint::one()) >> 2;
        let root = self.value.modpow(&exponent, &self.prime);
        if (&root * &root) % &self.prime != self.value {
            return Err(ProtocolError::InvalidPointEncoding(
                "no square root exists for x coordinate".to_string(),
            ));
        }
        Ok(FieldElement {
            value: root,
            prime: self.prime.clone(),
        })
    }
}
