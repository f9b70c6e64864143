//! secp256k1 curve constants
//!
//! y^2 = x^3 + 7 over GF(p), p = 2^256 - 2^32 - 977, with the standard
//! generator and group order. Built lazily once; every consumer borrows the
//! same parameter set.

use std::sync::LazyLock;

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use crate::curve::{CurveParams, CurvePoint};
use crate::error::Result;
use crate::field::FieldElement;

pub static SECP256K1: LazyLock<CurveParams> = LazyLock::new(|| CurveParams {
    prime: BigUint::from_str_radix(
        "fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f",
        16,
    )
    .unwrap(),
    a: BigUint::zero(),
    b: BigUint::from(7u32),
    gx: BigUint::from_str_radix(
        "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798",
        16,
    )
    .unwrap(),
    gy: BigUint::from_str_radix(
        "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8",
        16,
    )
    .unwrap(),
    order: BigUint::from_str_radix(
        "fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141",
        16,
    )
    .unwrap(),
});

/// The secp256k1 generator point G.
pub fn generator() -> CurvePoint {
    SECP256K1
        .generator()
        .expect("secp256k1 generator satisfies the curve equation")
}

/// An element of the secp256k1 base field.
pub fn field_element(value: BigUint) -> FieldElement {
    SECP256K1.field_element(value)
}

/// A point on secp256k1 from raw affine coordinates.
pub fn point(x: BigUint, y: BigUint) -> Result<CurvePoint> {
    SECP256K1.point(x, y)
}

/// The group order n.
pub fn order() -> &'static BigUint {
    &SECP256K1.order
}
