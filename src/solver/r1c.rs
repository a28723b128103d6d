//! Rank-1 constraints `L * R == O`.

use super::Solver;
use super::error::SolveError;
use crate::constraint::{LinearExpression, R1C, Term};
use crate::field::CurveField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    L,
    R,
    O,
}

impl<F: CurveField> Solver<'_, F> {
    /// Solves the single unknown wire of `r`, if any, then checks it.
    pub(crate) fn solve_r1c(&self, cid: u32, r: &R1C) -> Result<(), SolveError> {
        let (mut a, mut b, mut c) = (F::zero(), F::zero(), F::zero());
        let mut unknown: Option<(Side, Term)> = None;

        let mut scan = |expr: &LinearExpression, acc: &mut F, side: Side| {
            for &t in expr {
                if t.is_constant() || self.is_solved(t.wire_id()) {
                    self.accumulate_into(t, acc);
                    continue;
                }
                if unknown.is_some() {
                    panic!("found more than one wire to instantiate");
                }
                unknown = Some((side, t));
            }
        };
        scan(&r.l, &mut a, Side::L);
        scan(&r.r, &mut b, Side::R);
        scan(&r.o, &mut c, Side::O);

        let Some((side, t)) = unknown else {
            return self.check_r1c(cid, a, b, c);
        };

        let mut wire = F::zero();
        match side {
            Side::L => {
                if b.is_zero() {
                    // any value of the unknown satisfies the constraint iff a*b == c
                    self.set(t.wire_id(), wire);
                    return self.check_r1c(cid, a, b, c);
                }
                // a + w*coeff = c/b
                wire = c / b - a;
                a += wire;
            }
            Side::R => {
                if a.is_zero() {
                    self.set(t.wire_id(), wire);
                    return self.check_r1c(cid, a, b, c);
                }
                wire = c / a - b;
                b += wire;
            }
            Side::O => {
                wire = a * b - c;
                c += wire;
            }
        }

        self.div_by_coeff(&mut wire, t);
        self.set(t.wire_id(), wire);
        self.check_r1c(cid, a, b, c)
    }

    fn check_r1c(&self, cid: u32, a: F, b: F, c: F) -> Result<(), SolveError> {
        if a * b != c {
            return Err(self.unsatisfied(cid, format!("{a} ⋅ {b} != {c}")));
        }
        Ok(())
    }
}
