//! Elliptic-curve point arithmetic over a short Weierstrass curve
//!
//! Points are affine `(x, y)` pairs of field elements plus a distinguished
//! point at infinity acting as the group identity. The curve is described by
//! an explicit [`CurveParams`] value rather than implicit globals, so the
//! arithmetic can be exercised against small test curves as well as
//! secp256k1.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::error::{ProtocolError, Result};
use crate::field::FieldElement;

/// The constants defining a curve y^2 = x^3 + a*x + b and its generator
/// subgroup: field prime, coefficients, generator coordinates, group order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParams {
    pub prime: BigUint,
    pub a: BigUint,
    pub b: BigUint,
    pub gx: BigUint,
    pub gy: BigUint,
    pub order: BigUint,
}

impl CurveParams {
    /// An element of this curve's base field.
    pub fn field_element(&self, value: BigUint) -> FieldElement {
        FieldElement::new(value, self.prime.clone())
    }

    /// The generator point G.
    pub fn generator(&self) -> Result<CurvePoint> {
        self.point(self.gx.clone(), self.gy.clone())
    }

    /// A point on this curve from raw coordinates.
    pub fn point(&self, x: BigUint, y: BigUint) -> Result<CurvePoint> {
        CurvePoint::new(
            self.field_element(x),
            self.field_element(y),
            self.field_element(self.a.clone()),
            self.field_element(self.b.clone()),
        )
    }

    /// The identity element of this curve's group.
    pub fn infinity(&self) -> CurvePoint {
        CurvePoint::infinity(
            self.field_element(self.a.clone()),
            self.field_element(self.b.clone()),
        )
    }
}

/// A point on y^2 = x^3 + a*x + b, or the point at infinity (`x` and `y`
/// both absent). Immutable; every operation yields a fresh point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurvePoint {
    x: Option<FieldElement>,
    y: Option<FieldElement>,
    a: FieldElement,
    b: FieldElement,
}

impl CurvePoint {
    /// Construct a finite point, checking the curve equation.
    pub fn new(x: FieldElement, y: FieldElement, a: FieldElement, b: FieldElement) -> Result<Self> {
        let lhs = y.mul(&y)?;
        let rhs = x.mul(&x)?.mul(&x)?.add(&a.mul(&x)?)?.add(&b)?;
        if lhs != rhs {
            return Err(ProtocolError::PointNotOnCurve(format!(
                "({}, {}) does not satisfy the curve equation",
                x.value(),
                y.value()
            )));
        }
        Ok(CurvePoint {
            x: Some(x),
            y: Some(y),
            a,
            b,
        })
    }

    /// The point at infinity for the given curve coefficients.
    pub fn infinity(a: FieldElement, b: FieldElement) -> Self {
        CurvePoint {
            x: None,
            y: None,
            a,
            b,
        }
    }

    pub fn is_infinity(&self) -> bool {
        self.x.is_none()
    }

    pub fn x(&self) -> Option<&FieldElement> {
        self.x.as_ref()
    }

    pub fn y(&self) -> Option<&FieldElement> {
        self.y.as_ref()
    }

    fn same_curve(&self, other: &CurvePoint) -> Result<()> {
        if self.a != other.a || self.b != other.b {
            return Err(ProtocolError::PointNotOnCurve(
                "points are not on the same curve".to_string(),
            ));
        }
        Ok(())
    }

    /// Point addition with the full affine case analysis:
    /// identity operands, inverse points (vertical line), doubling via the
    /// tangent slope, and the general chord slope.
    pub fn add(&self, other: &CurvePoint) -> Result<CurvePoint> {
        self.same_curve(other)?;
        let (x1, y1) = match (&self.x, &self.y) {
            (Some(x), Some(y)) => (x, y),
            _ => return Ok(other.clone()),
        };
        let (x2, y2) = match (&other.x, &other.y) {
            (Some(x), Some(y)) => (x, y),
            _ => return Ok(self.clone()),
        };

        if x1 == x2 && y1 != y2 {
            // Inverse points: the line through them is vertical.
            return Ok(CurvePoint::infinity(self.a.clone(), self.b.clone()));
        }

        let slope = if self == other {
            if y1.is_zero() {
                // Tangent is vertical when doubling a point with y = 0.
                return Ok(CurvePoint::infinity(self.a.clone(), self.b.clone()));
            }
            // slope = (3*x1^2 + a) / (2*y1)
            let x1_sq = x1.mul(x1)?;
            let three_x1_sq = x1_sq.add(&x1_sq)?.add(&x1_sq)?;
            let numerator = three_x1_sq.add(&self.a)?;
            let denominator = y1.add(y1)?;
            numerator.div(&denominator)?
        } else {
            // slope = (y2 - y1) / (x2 - x1)
            y2.sub(y1)?.div(&x2.sub(x1)?)?
        };

        let x3 = slope.mul(&slope)?.sub(x1)?.sub(x2)?;
        let y3 = slope.mul(&x1.sub(&x3)?)?.sub(y1)?;
        CurvePoint::new(x3, y3, self.a.clone(), self.b.clone())
    }

    /// Scalar multiplication by binary double-and-add, least-significant bit
    /// first. Multiplying by zero yields infinity.
    ///
    /// Security caveat: this is not constant-time. The loop shape depends on
    /// the scalar's bit length and pattern, so it leaks timing information
    /// and must not be the final word for production secret-key use.
    pub fn mul(&self, coefficient: &BigUint) -> Result<CurvePoint> {
        let mut coef = coefficient.clone();
        let mut current = self.clone();
        let mut result = CurvePoint::infinity(self.a.clone(), self.b.clone());
        while !coef.is_zero() {
            if coef.bit(0) {
                result = result.add(&current)?;
            }
            current = current.add(&current)?;
            coef >>= 1u32;
        }
        Ok(result)
    }
}
