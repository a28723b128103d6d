//! Wire-level building blocks of a compiled constraint system.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

/// Coefficient id of `0` in every coefficient pool.
pub const COEFF_ID_ZERO: u32 = 0;
/// Coefficient id of `1`.
pub const COEFF_ID_ONE: u32 = 1;
/// Coefficient id of `2`.
pub const COEFF_ID_TWO: u32 = 2;
/// Coefficient id of `-1`.
pub const COEFF_ID_MINUS_ONE: u32 = 3;

/// Wire id marking a term as a bare constant (`coefficient * 1`).
pub const CONSTANT_WIRE: u32 = u32::MAX;

/// `coefficient * wire`, both stored by index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, CanonicalSerialize, CanonicalDeserialize,
)]
pub struct Term {
    /// Index into the coefficient pool
    pub cid: u32,
    /// Index into the value vector
    pub vid: u32,
}

impl Term {
    pub fn new(cid: u32, vid: u32) -> Self {
        Self { cid, vid }
    }

    /// A term that evaluates to the coefficient itself.
    pub fn constant(cid: u32) -> Self {
        Self {
            cid,
            vid: CONSTANT_WIRE,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.vid == CONSTANT_WIRE
    }

    pub fn wire_id(&self) -> usize {
        self.vid as usize
    }

    pub fn coeff_id(&self) -> u32 {
        self.cid
    }
}

/// Sum of terms.
pub type LinearExpression = Vec<Term>;

/// Rank-1 constraint `L * R == O`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct R1C {
    pub l: LinearExpression,
    pub r: LinearExpression,
    pub o: LinearExpression,
}

impl R1C {
    pub fn new(l: LinearExpression, r: LinearExpression, o: LinearExpression) -> Self {
        Self { l, r, o }
    }

    /// Every wire the constraint mentions, constants excluded.
    pub fn wires(&self) -> impl Iterator<Item = u32> + '_ {
        self.l
            .iter()
            .chain(self.r.iter())
            .chain(self.o.iter())
            .filter(|t| !t.is_constant())
            .map(|t| t.vid)
    }
}

/// Role of a sparse constraint with respect to a commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitmentConstraint {
    #[default]
    Not,
    /// Binds a committed value; never solved nor checked.
    Committed,
}

impl CommitmentConstraint {
    pub fn to_u32(self) -> u32 {
        match self {
            CommitmentConstraint::Not => 0,
            CommitmentConstraint::Committed => 1,
        }
    }

    pub fn from_u32(tag: u32) -> Self {
        if tag == 0 {
            CommitmentConstraint::Not
        } else {
            CommitmentConstraint::Committed
        }
    }
}

/// Plonk gate `qL*xA + qR*xB + qM*xA*xB + qO*xC + qC == 0`.
///
/// Wires are value-vector indices, `q*` are coefficient ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SparseR1C {
    pub xa: u32,
    pub xb: u32,
    pub xc: u32,
    pub ql: u32,
    pub qr: u32,
    pub qo: u32,
    pub qm: u32,
    pub qc: u32,
    pub commitment: CommitmentConstraint,
}

impl SparseR1C {
    /// Wires that take part in the gate, i.e. whose governing coefficient is non-zero.
    pub fn active_wires(&self) -> impl Iterator<Item = u32> {
        let a = (self.ql != COEFF_ID_ZERO || self.qm != COEFF_ID_ZERO).then_some(self.xa);
        let b = (self.qr != COEFF_ID_ZERO || self.qm != COEFF_ID_ZERO).then_some(self.xb);
        let c = (self.qo != COEFF_ID_ZERO).then_some(self.xc);
        [a, b, c].into_iter().flatten()
    }
}

/// Identifier of a hint function, derived from its name.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    CanonicalSerialize,
    CanonicalDeserialize,
)]
pub struct HintId(pub u32);

impl HintId {
    /// First four bytes (big-endian) of SHA-256 over the hint name.
    pub fn from_name(name: &str) -> Self {
        let digest = crate::digest_sha2(name.as_bytes());
        HintId(u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]))
    }
}

impl std::fmt::Display for HintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// A call to an external hint: evaluated inputs in, wire values out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HintMapping {
    pub hint_id: HintId,
    pub inputs: Vec<LinearExpression>,
    pub outputs: Vec<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_term() {
        let t = Term::constant(COEFF_ID_TWO);
        assert!(t.is_constant());
        assert!(!Term::new(COEFF_ID_ONE, 4).is_constant());
    }

    #[test]
    fn test_active_wires_skip_zero_coefficients() {
        let c = SparseR1C {
            xa: 1,
            xb: 2,
            xc: 3,
            ql: COEFF_ID_ONE,
            qo: COEFF_ID_MINUS_ONE,
            ..Default::default()
        };
        assert_eq!(c.active_wires().collect::<Vec<_>>(), vec![1, 3]);

        let m = SparseR1C {
            xa: 1,
            xb: 2,
            xc: 3,
            qm: 5,
            ..Default::default()
        };
        assert_eq!(m.active_wires().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_hint_id_is_stable() {
        assert_eq!(HintId::from_name("inv_zero"), HintId::from_name("inv_zero"));
        assert_ne!(HintId::from_name("inv_zero"), HintId::from_name("is_zero"));
    }
}
