//! Blueprints turn a compact run of call-data words into a concrete constraint
//! or hint call.
//!
//! The set of blueprints is closed: each instruction of a [`System`] names one
//! by index and owns a slice of the shared call-data buffer. Decoding is pure
//! and may run from any number of workers at once.
//!
//! [`System`]: crate::constraint::System

use ark_ff::PrimeField;

use super::term::{
    COEFF_ID_ONE, COEFF_ID_ZERO, CommitmentConstraint, HintId, HintMapping, LinearExpression,
    R1C, SparseR1C, Term,
};

/// What a blueprint decodes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlueprintKind {
    Hint,
    /// The blueprint solves its own wires through [`Blueprint::solve`].
    Solvable,
    R1C,
    SparseR1C,
}

/// Decoded form of one instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Hint(HintMapping),
    Solvable,
    R1C(R1C),
    SparseR1C(SparseR1C),
}

/// Capability handed to solvable blueprints.
pub trait WireSolver<F: PrimeField> {
    fn is_solved(&self, vid: u32) -> bool;
    /// `coefficient * value`; the wire must be solved unless the coefficient is zero.
    fn term_value(&self, t: Term) -> F;
    fn coeff(&self, cid: u32) -> F;
    /// `-1 / coefficient`.
    fn neg_inv_coeff(&self, cid: u32) -> F;
    fn set_value(&self, vid: u32, value: F);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Blueprint {
    /// `[len, hint_id, nb_inputs, (nb_terms, (cid, vid)*)*, nb_outputs, outputs*]`
    GenericHint,
    /// `[len, len_l, len_r, len_o, (cid, vid)*]`
    GenericR1C,
    /// `[xa, xb, xc, ql, qr, qo, qm, qc, commitment]`
    GenericSparseR1C,
    /// `[xa, xb, xc, qm, qo]`, solves `qM*xA*xB + qO*xC == 0` for `xC`.
    SparseR1CMul,
    /// `[xa, xb, xc, ql, qr, qo, qc]`, solves `qL*xA + qR*xB + qO*xC + qC == 0` for `xC`.
    SparseR1CAdd,
}

impl Blueprint {
    pub const ALL: [Blueprint; 5] = [
        Blueprint::GenericHint,
        Blueprint::GenericR1C,
        Blueprint::GenericSparseR1C,
        Blueprint::SparseR1CMul,
        Blueprint::SparseR1CAdd,
    ];

    pub fn to_u8(self) -> u8 {
        match self {
            Blueprint::GenericHint => 0,
            Blueprint::GenericR1C => 1,
            Blueprint::GenericSparseR1C => 2,
            Blueprint::SparseR1CMul => 3,
            Blueprint::SparseR1CAdd => 4,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.to_u8() == tag)
    }

    pub fn kind(&self) -> BlueprintKind {
        match self {
            Blueprint::GenericHint => BlueprintKind::Hint,
            Blueprint::GenericR1C => BlueprintKind::R1C,
            Blueprint::GenericSparseR1C => BlueprintKind::SparseR1C,
            Blueprint::SparseR1CMul | Blueprint::SparseR1CAdd => BlueprintKind::Solvable,
        }
    }

    /// Fixed call-data length, `None` when the length is the first call-data word.
    pub fn nb_inputs(&self) -> Option<usize> {
        match self {
            Blueprint::GenericHint | Blueprint::GenericR1C => None,
            Blueprint::GenericSparseR1C => Some(9),
            Blueprint::SparseR1CMul => Some(5),
            Blueprint::SparseR1CAdd => Some(7),
        }
    }

    /// Length of the call data starting at `from`.
    pub fn call_data_len(&self, from: &[u32]) -> usize {
        match self.nb_inputs() {
            Some(n) => n,
            None => from[0] as usize,
        }
    }

    pub fn decode(&self, calldata: &[u32]) -> Decoded {
        match self.kind() {
            BlueprintKind::Hint => Decoded::Hint(self.decompress_hint(calldata)),
            BlueprintKind::R1C => Decoded::R1C(self.decompress_r1c(calldata)),
            BlueprintKind::SparseR1C => Decoded::SparseR1C(decompress_generic_sparse(calldata)),
            BlueprintKind::Solvable => Decoded::Solvable,
        }
    }

    pub fn compress_r1c(&self, c: &R1C) -> Vec<u32> {
        debug_assert_eq!(*self, Blueprint::GenericR1C);
        let nb_terms = c.l.len() + c.r.len() + c.o.len();
        let len = 4 + 2 * nb_terms;
        let mut out = Vec::with_capacity(len);
        out.extend([len as u32, c.l.len() as u32, c.r.len() as u32, c.o.len() as u32]);
        for t in c.l.iter().chain(c.r.iter()).chain(c.o.iter()) {
            out.extend([t.cid, t.vid]);
        }
        out
    }

    pub fn decompress_r1c(&self, calldata: &[u32]) -> R1C {
        let (len_l, len_r, len_o) = (
            calldata[1] as usize,
            calldata[2] as usize,
            calldata[3] as usize,
        );
        let mut cursor = 4;
        let mut read = |n: usize| -> LinearExpression {
            let terms = calldata[cursor..cursor + 2 * n]
                .chunks_exact(2)
                .map(|p| Term::new(p[0], p[1]))
                .collect();
            cursor += 2 * n;
            terms
        };
        let l = read(len_l);
        let r = read(len_r);
        let o = read(len_o);
        R1C { l, r, o }
    }

    pub fn compress_sparse_r1c(&self, c: &SparseR1C) -> Vec<u32> {
        match self {
            Blueprint::GenericSparseR1C => vec![
                c.xa,
                c.xb,
                c.xc,
                c.ql,
                c.qr,
                c.qo,
                c.qm,
                c.qc,
                c.commitment.to_u32(),
            ],
            Blueprint::SparseR1CMul => vec![c.xa, c.xb, c.xc, c.qm, c.qo],
            Blueprint::SparseR1CAdd => vec![c.xa, c.xb, c.xc, c.ql, c.qr, c.qo, c.qc],
            _ => panic!("{self:?} does not encode a sparse constraint"),
        }
    }

    /// Sparse view of the instruction, for every blueprint that encodes a gate.
    pub fn decompress_sparse_r1c(&self, calldata: &[u32]) -> Option<SparseR1C> {
        match self {
            Blueprint::GenericSparseR1C => Some(decompress_generic_sparse(calldata)),
            Blueprint::SparseR1CMul => Some(SparseR1C {
                xa: calldata[0],
                xb: calldata[1],
                xc: calldata[2],
                qm: calldata[3],
                qo: calldata[4],
                ..Default::default()
            }),
            Blueprint::SparseR1CAdd => Some(SparseR1C {
                xa: calldata[0],
                xb: calldata[1],
                xc: calldata[2],
                ql: calldata[3],
                qr: calldata[4],
                qo: calldata[5],
                qc: calldata[6],
                ..Default::default()
            }),
            _ => None,
        }
    }

    pub fn compress_hint(&self, h: &HintMapping) -> Vec<u32> {
        debug_assert_eq!(*self, Blueprint::GenericHint);
        let mut out = vec![0, h.hint_id.0, h.inputs.len() as u32];
        for input in &h.inputs {
            out.push(input.len() as u32);
            for t in input {
                out.extend([t.cid, t.vid]);
            }
        }
        out.push(h.outputs.len() as u32);
        out.extend_from_slice(&h.outputs);
        out[0] = out.len() as u32;
        out
    }

    pub fn decompress_hint(&self, calldata: &[u32]) -> HintMapping {
        let hint_id = HintId(calldata[1]);
        let nb_inputs = calldata[2] as usize;
        let mut cursor = 3;
        let mut inputs = Vec::with_capacity(nb_inputs);
        for _ in 0..nb_inputs {
            let n = calldata[cursor] as usize;
            cursor += 1;
            inputs.push(
                calldata[cursor..cursor + 2 * n]
                    .chunks_exact(2)
                    .map(|p| Term::new(p[0], p[1]))
                    .collect(),
            );
            cursor += 2 * n;
        }
        let nb_outputs = calldata[cursor] as usize;
        cursor += 1;
        let outputs = calldata[cursor..cursor + nb_outputs].to_vec();
        HintMapping {
            hint_id,
            inputs,
            outputs,
        }
    }

    /// Solves and checks a solvable blueprint.
    ///
    /// Returns a formatted description of the failing equation when the gate
    /// does not hold.
    pub fn solve<F: PrimeField, S: WireSolver<F>>(
        &self,
        s: &S,
        calldata: &[u32],
    ) -> Result<(), String> {
        let Some(c) = self.decompress_sparse_r1c(calldata) else {
            panic!("{self:?} is not solvable");
        };
        match self {
            Blueprint::SparseR1CMul => {
                // qM*xA*xB + qO*xC == 0
                let m = s.term_value(Term::new(c.qm, c.xa))
                    * s.term_value(Term::new(COEFF_ID_ONE, c.xb));
                if c.qo != COEFF_ID_ZERO && !s.is_solved(c.xc) {
                    s.set_value(c.xc, m * s.neg_inv_coeff(c.qo));
                    return Ok(());
                }
                let o = s.term_value(Term::new(c.qo, c.xc));
                if !(m + o).is_zero() {
                    return Err(format!("qM⋅(xa×xb) + qO⋅xc != 0 → {m} + {o} != 0"));
                }
                Ok(())
            }
            Blueprint::SparseR1CAdd => {
                // qL*xA + qR*xB + qO*xC + qC == 0
                let l = s.term_value(Term::new(c.ql, c.xa));
                let r = s.term_value(Term::new(c.qr, c.xb));
                let k = s.coeff(c.qc);
                if c.qo != COEFF_ID_ZERO && !s.is_solved(c.xc) {
                    s.set_value(c.xc, (l + r + k) * s.neg_inv_coeff(c.qo));
                    return Ok(());
                }
                let o = s.term_value(Term::new(c.qo, c.xc));
                if !(l + r + o + k).is_zero() {
                    return Err(format!(
                        "qL⋅xa + qR⋅xb + qO⋅xc + qC != 0 → {l} + {r} + {o} + {k} != 0"
                    ));
                }
                Ok(())
            }
            _ => unreachable!(),
        }
    }
}

fn decompress_generic_sparse(calldata: &[u32]) -> SparseR1C {
    SparseR1C {
        xa: calldata[0],
        xb: calldata[1],
        xc: calldata[2],
        ql: calldata[3],
        qr: calldata[4],
        qo: calldata[5],
        qm: calldata[6],
        qc: calldata[7],
        commitment: CommitmentConstraint::from_u32(calldata[8]),
    }
}
