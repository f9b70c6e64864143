//! Tests for field and curve arithmetic, small curve and secp256k1

use num_bigint::{BigInt, BigUint};
use num_traits::{Num, One, Zero};

use txcore::curve::CurveParams;
use txcore::error::ProtocolError;
use txcore::field::FieldElement;
use txcore::secp256k1::{self, SECP256K1};

fn f223(value: u32) -> FieldElement {
    FieldElement::new(BigUint::from(value), BigUint::from(223u32))
}

fn small_curve() -> CurveParams {
    CurveParams {
        prime: BigUint::from(223u32),
        a: BigUint::zero(),
        b: BigUint::from(7u32),
        gx: BigUint::from(47u32),
        gy: BigUint::from(71u32),
        order: BigUint::from(21u32),
    }
}

#[test]
fn test_field_additive_identity() {
    // a + (p - a) == 0 for every a
    for value in [1u32, 44, 111, 222] {
        let a = f223(value);
        let neg = f223(223 - value);
        assert_eq!(a.add(&neg).unwrap(), a.zero_like());
    }
}

#[test]
fn test_field_multiplicative_inverse() {
    let one = f223(1);
    for value in [2u32, 95, 144, 222] {
        let a = f223(value);
        let inv = one.div(&a).unwrap();
        assert_eq!(a.mul(&inv).unwrap(), one);
    }
}

#[test]
fn test_field_pow_matches_repeated_multiplication() {
    let a = f223(9);
    let cubed = a.mul(&a).unwrap().mul(&a).unwrap();
    assert_eq!(a.pow(&BigInt::from(3)), cubed);
}

#[test]
fn test_field_mixed_primes_rejected() {
    let a = f223(5);
    let b = FieldElement::new(BigUint::from(5u32), BigUint::from(211u32));
    for result in [a.add(&b), a.sub(&b), a.mul(&b), a.div(&b)] {
        assert!(matches!(result, Err(ProtocolError::IncompatibleField(_))));
    }
}

#[test]
fn test_curve_point_validation() {
    let curve = small_curve();
    assert!(curve.point(BigUint::from(192u32), BigUint::from(105u32)).is_ok());
    assert!(matches!(
        curve.point(BigUint::from(200u32), BigUint::from(119u32)),
        Err(ProtocolError::PointNotOnCurve(_))
    ));
}

#[test]
fn test_curve_addition_vectors() {
    let curve = small_curve();
    let add = |x1: u32, y1: u32, x2: u32, y2: u32| {
        curve
            .point(BigUint::from(x1), BigUint::from(y1))
            .unwrap()
            .add(&curve.point(BigUint::from(x2), BigUint::from(y2)).unwrap())
            .unwrap()
    };
    assert_eq!(
        add(192, 105, 17, 56),
        curve.point(BigUint::from(170u32), BigUint::from(142u32)).unwrap()
    );
    assert_eq!(
        add(143, 98, 76, 66),
        curve.point(BigUint::from(47u32), BigUint::from(71u32)).unwrap()
    );
}

#[test]
fn test_generator_order_annihilates() {
    let curve = small_curve();
    let g = curve.generator().unwrap();
    assert!(g.mul(&curve.order).unwrap().is_infinity());
    // One step short of the order is not the identity.
    let order_minus_one = &curve.order - BigUint::one();
    assert!(!g.mul(&order_minus_one).unwrap().is_infinity());
}

#[test]
fn test_secp256k1_known_double() {
    let g = secp256k1::generator();
    let two_g = g.mul(&BigUint::from(2u8)).unwrap();
    let expected = secp256k1::point(
        BigUint::from_str_radix(
            "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5",
            16,
        )
        .unwrap(),
        BigUint::from_str_radix(
            "1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a",
            16,
        )
        .unwrap(),
    )
    .unwrap();
    assert_eq!(two_g, expected);
    assert_eq!(g.add(&g).unwrap(), expected);
}

#[test]
fn test_secp256k1_group_structure() {
    let g = secp256k1::generator();
    let n = secp256k1::order();
    assert!(g.mul(n).unwrap().is_infinity());
    // (n-1)*G is the inverse of G: same x, mirrored y.
    let minus_g = g.mul(&(n - BigUint::one())).unwrap();
    assert_eq!(minus_g.x(), g.x());
    let mirrored = &SECP256K1.prime - g.y().unwrap().value();
    assert_eq!(*minus_g.y().unwrap().value(), mirrored);
}
