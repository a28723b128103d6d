//! Backend-shaped views of a solved witness.

use ark_poly::{EvaluationDomain, GeneralEvaluationDomain};
use rayon::prelude::*;

use crate::constraint::{Decoded, LinearExpression, System, SystemType};
use crate::field::CurveField;
use crate::solver::{SolveError, SolverOptions};

/// Solved R1CS: the wire vector and, per constraint, the values of `L`, `R`
/// and `O`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R1csSolution<F> {
    pub w: Vec<F>,
    pub a: Vec<F>,
    pub b: Vec<F>,
    pub c: Vec<F>,
}

/// Solved SparseR1CS in Lagrange form: one row per public input, then one
/// per constraint, padded to a power-of-two domain with the constant row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseR1csSolution<F> {
    pub l: Vec<F>,
    pub r: Vec<F>,
    pub o: Vec<F>,
}

fn domain_size<F: CurveField>(n: usize) -> usize {
    GeneralEvaluationDomain::<F>::compute_size_of_domain(n).unwrap_or(n.next_power_of_two())
}

impl<F: CurveField> System<F> {
    /// Value of `expr` over a full wire vector.
    pub fn evaluate(&self, expr: &LinearExpression, w: &[F]) -> F {
        expr.iter().fold(F::zero(), |acc, t| {
            let c = self.coefficients[t.cid as usize];
            if t.is_constant() {
                acc + c
            } else {
                acc + c * w[t.wire_id()]
            }
        })
    }

    pub fn solve_r1cs(
        &self,
        witness: &[F],
        options: &SolverOptions,
    ) -> Result<R1csSolution<F>, SolveError> {
        assert_eq!(self.system_type, SystemType::R1CS, "not an R1CS system");
        let w = self.solve(witness, options)?;

        let rows: Vec<(F, F, F)> = self
            .instructions
            .par_iter()
            .filter_map(|inst| match self.decode(inst) {
                Decoded::R1C(r) => Some((
                    self.evaluate(&r.l, &w),
                    self.evaluate(&r.r, &w),
                    self.evaluate(&r.o, &w),
                )),
                _ => None,
            })
            .collect();

        // room for the prover to pad to its evaluation domain
        let capacity = domain_size::<F>(rows.len());
        let mut a = Vec::with_capacity(capacity);
        let mut b = Vec::with_capacity(capacity);
        let mut c = Vec::with_capacity(capacity);
        for (l, r, o) in rows {
            a.push(l);
            b.push(r);
            c.push(o);
        }
        Ok(R1csSolution { w, a, b, c })
    }

    pub fn solve_sparse(
        &self,
        witness: &[F],
        options: &SolverOptions,
    ) -> Result<SparseR1csSolution<F>, SolveError> {
        assert_eq!(
            self.system_type,
            SystemType::SparseR1CS,
            "not a SparseR1CS system"
        );
        let w = self.solve(witness, options)?;

        let nb_public = self.public.len();
        let gates = self.sparse_constraints();
        let size = domain_size::<F>(nb_public + gates.len());
        let pad = w.first().copied().unwrap_or_default();

        let mut l = vec![pad; size];
        let mut r = vec![pad; size];
        let mut o = vec![pad; size];
        l[..nb_public].copy_from_slice(&w[..nb_public]);
        for (j, g) in gates.iter().enumerate() {
            let row = nb_public + j;
            l[row] = w[g.xa as usize];
            r[row] = w[g.xb as usize];
            o[row] = w[g.xc as usize];
        }
        Ok(SparseR1csSolution { l, r, o })
    }
}
