//! Plonk gates `qL⋅xA + qR⋅xB + qO⋅xC + qM⋅xA⋅xB + qC == 0`.

use super::Solver;
use crate::constraint::{COEFF_ID_ONE, COEFF_ID_ZERO, CommitmentConstraint, SparseR1C, Term};
use crate::field::CurveField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unknown {
    A,
    B,
    C,
}

impl<F: CurveField> Solver<'_, F> {
    /// Locates the wire a gate has to solve. At most one active wire may be
    /// unknown.
    fn find_unsolved(&self, c: &SparseR1C) -> Option<Unknown> {
        let unknown = if (c.ql != COEFF_ID_ZERO || c.qm != COEFF_ID_ZERO)
            && !self.is_solved(c.xa as usize)
        {
            Some((Unknown::A, c.xa))
        } else if (c.qr != COEFF_ID_ZERO || c.qm != COEFF_ID_ZERO) && !self.is_solved(c.xb as usize)
        {
            Some((Unknown::B, c.xb))
        } else if c.qo != COEFF_ID_ZERO && !self.is_solved(c.xc as usize) {
            Some((Unknown::C, c.xc))
        } else {
            None
        };

        let (which, wire) = unknown?;
        if c
            .active_wires()
            .any(|w| w != wire && !self.is_solved(w as usize))
        {
            panic!("found more than one wire to instantiate");
        }
        Some(which)
    }

    /// Value of `wire`, or zero when unsolved.
    fn value_or_zero(&self, wire: u32) -> F {
        if self.is_solved(wire as usize) {
            self.value(wire as usize)
        } else {
            F::zero()
        }
    }

    /// Assigns the unknown wire of `c`, if any. Committed gates are skipped.
    pub(crate) fn solve_sparse_r1c(&self, c: &SparseR1C) {
        if c.commitment == CommitmentConstraint::Committed {
            return;
        }
        let Some(which) = self.find_unsolved(c) else {
            return;
        };

        match which {
            Unknown::A => {
                // xA = -(qR⋅xB + qO⋅xC + qC) / (qL + qM⋅xB)
                let qm_xb = self.compute_term(Term::new(c.qm, c.xb));
                let num = self.compute_term(Term::new(c.qr, c.xb))
                    + self.compute_term(Term::new(c.qo, c.xc))
                    + self.coefficient(c.qc);
                let den = self.coefficient(c.ql) + qm_xb;
                let inv = den.inverse().unwrap_or_default();
                self.set(c.xa as usize, -num * inv);
            }
            Unknown::B => {
                // xB = -(qL⋅xA + qO⋅xC + qC) / (qR + qM⋅xA)
                let qm_xa = self.compute_term(Term::new(c.qm, c.xa));
                let num = self.compute_term(Term::new(c.ql, c.xa))
                    + self.compute_term(Term::new(c.qo, c.xc))
                    + self.coefficient(c.qc);
                let den = self.coefficient(c.qr) + qm_xa;
                let inv = den.inverse().unwrap_or_default();
                self.set(c.xb as usize, -num * inv);
            }
            Unknown::C => {
                // xC = (qM⋅xA⋅xB + qL⋅xA + qR⋅xB + qC) ⋅ (-1/qO)
                let mut v = if c.qm == COEFF_ID_ZERO {
                    F::zero()
                } else {
                    self.compute_term(Term::new(c.qm, c.xa))
                        * self.compute_term(Term::new(COEFF_ID_ONE, c.xb))
                };
                v += self.compute_term(Term::new(c.ql, c.xa))
                    + self.compute_term(Term::new(c.qr, c.xb))
                    + self.coefficient(c.qc);
                self.set(c.xc as usize, v * self.coefficients_neg_inv[c.qo as usize]);
            }
        }
    }

    /// Checks `c` against the current values. Committed gates always hold.
    pub(crate) fn check_sparse_r1c(&self, c: &SparseR1C) -> Result<(), String> {
        if c.commitment == CommitmentConstraint::Committed {
            return Ok(());
        }
        let l = self.compute_term(Term::new(c.ql, c.xa));
        let r = self.compute_term(Term::new(c.qr, c.xb));
        let o = self.compute_term(Term::new(c.qo, c.xc));
        let m0 = self.compute_term(Term::new(c.qm, c.xa));
        let m1 = if c.qm == COEFF_ID_ZERO {
            self.value_or_zero(c.xb)
        } else {
            self.value(c.xb as usize)
        };
        let k = self.coefficient(c.qc);

        if !(l + r + o + m0 * m1 + k).is_zero() {
            return Err(format!(
                "qL⋅xa + qR⋅xb + qO⋅xc + qM⋅(xaxb) + qC != 0 → {l} + {r} + {o} + ({m0} × {m1}) + {k} != 0"
            ));
        }
        Ok(())
    }
}
