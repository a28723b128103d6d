//! Scalar fields the solver runs over.
//!
//! The field itself is a black box: everything the solver needs comes from
//! `ark_ff::PrimeField`. The only addition is a curve tag so a serialized
//! constraint system can be matched against the field it is loaded into.

use ark_ff::{PrimeField, batch_inversion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Curve whose scalar field a constraint system is defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveId {
    Bls12_381,
    Bn254,
}

impl CurveId {
    pub fn to_u8(self) -> u8 {
        match self {
            CurveId::Bls12_381 => 1,
            CurveId::Bn254 => 2,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(CurveId::Bls12_381),
            2 => Some(CurveId::Bn254),
            _ => None,
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurveId::Bls12_381 => write!(f, "bls12-381"),
            CurveId::Bn254 => write!(f, "bn254"),
        }
    }
}

/// A prime field tagged with the curve it belongs to.
pub trait CurveField: PrimeField {
    const CURVE: CurveId;
}

impl CurveField for ark_bls12_381::Fr {
    const CURVE: CurveId = CurveId::Bls12_381;
}

impl CurveField for ark_bn254::Fr {
    const CURVE: CurveId = CurveId::Bn254;
}

/// Returns `-1/c` for every entry of `coefficients`, with zero mapped to zero.
///
/// One batched inversion replaces one field inversion per constraint.
pub fn batch_invert_neg<F: PrimeField>(coefficients: &[F]) -> Vec<F> {
    let mut inverses = coefficients.to_vec();
    batch_inversion(&mut inverses);
    for c in inverses.iter_mut() {
        *c = -*c;
    }
    inverses
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::{Field, One, Zero};

    #[test]
    fn test_batch_invert_neg() {
        let coeffs = vec![Fr::zero(), Fr::one(), Fr::from(2u64), -Fr::one(), Fr::from(7u64)];
        let inv = batch_invert_neg(&coeffs);

        assert!(inv[0].is_zero());
        for (c, i) in coeffs.iter().zip(inv.iter()).skip(1) {
            assert_eq!(*c * *i, -Fr::one());
        }
        assert_eq!(inv[4], -Fr::from(7u64).inverse().unwrap());
    }

    #[test]
    fn test_curve_tag_roundtrip() {
        for id in [CurveId::Bls12_381, CurveId::Bn254] {
            assert_eq!(CurveId::from_u8(id.to_u8()), Some(id));
        }
        assert_eq!(CurveId::from_u8(0), None);
        assert_eq!(<ark_bn254::Fr as CurveField>::CURVE, CurveId::Bn254);
    }
}
