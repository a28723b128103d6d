//! Witness solver.
//!
//! Given a compiled [`System`] and the public and secret inputs, the solver
//! computes every internal wire by walking the instructions level by level.
//! Each wire is written exactly once; instructions within a level may run on
//! different workers because none reads another's outputs.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use num_bigint::BigUint;

use crate::constraint::debug::{UNSOLVED_VARIABLE, format_entry};
use crate::constraint::{
    COEFF_ID_MINUS_ONE, COEFF_ID_ONE, COEFF_ID_TWO, COEFF_ID_ZERO, Decoded, LogEntry, System,
    SystemType, Term, WireSolver,
};
use crate::field::{CurveField, batch_invert_neg};

pub mod config;
pub mod error;
pub mod hint;
mod r1c;
pub mod scheduler;
mod sparse;

pub use config::{DEFAULT_MIN_WORK_PER_WORKER, SolverConfig, SolverOptions};
pub use error::{HintError, SolveError, UnsatisfiedConstraintError};
pub use hint::{HintFunction, HintRegistry};

/// Solving state for one witness.
pub struct Solver<'a, F: CurveField> {
    system: &'a System<F>,
    values: Vec<OnceLock<F>>,
    nb_solved: AtomicUsize,
    hints: &'a HintRegistry,
    /// `-1/c` for every coefficient, sparse systems only
    coefficients_neg_inv: Vec<F>,
    modulus: BigUint,
    debug_info: bool,
}

impl<'a, F: CurveField> Solver<'a, F> {
    /// Checks the witness and the hint set, then seeds the input wires.
    pub fn new(
        system: &'a System<F>,
        witness: &[F],
        options: &'a SolverOptions,
    ) -> Result<Self, SolveError> {
        let expected = system.expected_witness_size();
        if witness.len() != expected {
            return Err(SolveError::WitnessSize {
                got: witness.len(),
                expected,
                public: system.public.len() - system.witness_offset(),
                secret: system.secret.len(),
            });
        }

        let mut missing: Vec<String> = system
            .hint_dependencies
            .iter()
            .filter(|(id, _)| !options.hints.contains(**id))
            .map(|(_, name)| name.clone())
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(SolveError::MissingHints(missing));
        }

        let coefficients_neg_inv = match system.system_type {
            SystemType::SparseR1CS => batch_invert_neg(&system.coefficients),
            SystemType::R1CS => Vec::new(),
        };

        let solver = Self {
            system,
            values: (0..system.nb_wires()).map(|_| OnceLock::new()).collect(),
            nb_solved: AtomicUsize::new(0),
            hints: &options.hints,
            coefficients_neg_inv,
            modulus: hint::modulus::<F>(),
            debug_info: options.config.debug_info,
        };

        let offset = system.witness_offset();
        if offset == 1 {
            solver.set(0, F::one());
        }
        for (i, w) in witness.iter().enumerate() {
            solver.set(i + offset, *w);
        }
        Ok(solver)
    }

    /// Assigns a wire. Panics if it already holds a value.
    pub(crate) fn set(&self, id: usize, value: F) {
        if self.values[id].set(value).is_err() {
            panic!("solving the same wire twice should never happen");
        }
        self.nb_solved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn is_solved(&self, id: usize) -> bool {
        self.values[id].get().is_some()
    }

    pub(crate) fn value(&self, id: usize) -> F {
        match self.values[id].get() {
            Some(v) => *v,
            None => panic!("computing a term with an unsolved wire"),
        }
    }

    pub fn nb_solved(&self) -> usize {
        self.nb_solved.load(Ordering::Relaxed)
    }

    pub fn nb_wires(&self) -> usize {
        self.values.len()
    }

    pub(crate) fn coefficient(&self, cid: u32) -> F {
        self.system.coefficients[cid as usize]
    }

    /// `coefficient * value`. Constant terms evaluate to their coefficient.
    pub(crate) fn compute_term(&self, t: Term) -> F {
        if t.is_constant() {
            return self.coefficient(t.cid);
        }
        match t.cid {
            COEFF_ID_ZERO => F::zero(),
            COEFF_ID_ONE => self.value(t.wire_id()),
            COEFF_ID_TWO => self.value(t.wire_id()).double(),
            COEFF_ID_MINUS_ONE => -self.value(t.wire_id()),
            cid => self.coefficient(cid) * self.value(t.wire_id()),
        }
    }

    /// `acc += coefficient * value`.
    pub(crate) fn accumulate_into(&self, t: Term, acc: &mut F) {
        if t.is_constant() {
            *acc += self.coefficient(t.cid);
            return;
        }
        match t.cid {
            COEFF_ID_ZERO => {}
            COEFF_ID_ONE => *acc += self.value(t.wire_id()),
            COEFF_ID_TWO => *acc += self.value(t.wire_id()).double(),
            COEFF_ID_MINUS_ONE => *acc -= self.value(t.wire_id()),
            cid => *acc += self.coefficient(cid) * self.value(t.wire_id()),
        }
    }

    /// `res /= coefficient`. Panics on the zero coefficient.
    pub(crate) fn div_by_coeff(&self, res: &mut F, t: Term) {
        match t.cid {
            COEFF_ID_ONE => {}
            COEFF_ID_MINUS_ONE => *res = -*res,
            COEFF_ID_ZERO => panic!("division by 0"),
            cid => *res /= self.coefficient(cid),
        }
    }

    /// Runs one instruction.
    pub(crate) fn process_instruction(&self, idx: u32) -> Result<(), SolveError> {
        let system = self.system;
        let inst = &system.instructions[idx as usize];
        let blueprint = system.blueprints[inst.blueprint_id as usize];
        let calldata = system.call_data(inst);
        let cid = inst.constraint_offset;

        match (blueprint.decode(calldata), system.system_type) {
            (Decoded::Hint(h), _) => self.solve_with_hint(&h),
            (Decoded::Solvable, _) => blueprint
                .solve(self, calldata)
                .map_err(|reason| self.unsatisfied(cid, reason)),
            (Decoded::R1C(r), SystemType::R1CS) => self.solve_r1c(cid, &r),
            (Decoded::SparseR1C(c), SystemType::SparseR1CS) => {
                self.solve_sparse_r1c(&c);
                self.check_sparse_r1c(&c)
                    .map_err(|reason| self.unsatisfied(cid, reason))
            }
            _ => panic!("blueprint does not match the constraint system type"),
        }
    }

    /// Unsatisfied-constraint error, with the constraint's debug trace
    /// resolved against the current values when available.
    pub(crate) fn unsatisfied(&self, cid: u32, reason: String) -> SolveError {
        let debug_info = if self.debug_info {
            self.system
                .debug_index
                .get(&cid)
                .map(|&i| self.log_value(&self.system.debug_info[i as usize]))
        } else {
            None
        };
        UnsatisfiedConstraintError {
            constraint: cid as usize,
            reason,
            debug_info,
        }
        .into()
    }

    /// Renders a log entry, printing unsolved wires as [`UNSOLVED_VARIABLE`].
    pub fn log_value(&self, entry: &LogEntry) -> String {
        let args: Vec<String> = entry
            .to_resolve
            .iter()
            .map(|expr| {
                let mut v = F::zero();
                for &t in expr {
                    if !t.is_constant() && !self.is_solved(t.wire_id()) {
                        return UNSOLVED_VARIABLE.to_string();
                    }
                    self.accumulate_into(t, &mut v);
                }
                v.to_string()
            })
            .collect();
        let mut out = format_entry(&entry.format, &args);
        if !entry.stack.is_empty() {
            out.push('\n');
            out.push_str(&self.system.symbol_table.format_stack(&entry.stack));
        }
        out
    }

    /// Emits every log entry of the system at debug level.
    pub fn print_logs(&self) {
        if !tracing::enabled!(tracing::Level::DEBUG) {
            return;
        }
        for entry in &self.system.logs {
            tracing::debug!(caller = %entry.caller, "{}", self.log_value(entry));
        }
    }

    /// Final wire values; unsolved wires read as zero.
    pub fn into_values(self) -> Vec<F> {
        self.values
            .into_iter()
            .map(|v| v.into_inner().unwrap_or_default())
            .collect()
    }
}

impl<F: CurveField> WireSolver<F> for Solver<'_, F> {
    fn is_solved(&self, vid: u32) -> bool {
        Solver::is_solved(self, vid as usize)
    }

    fn term_value(&self, t: Term) -> F {
        self.compute_term(t)
    }

    fn coeff(&self, cid: u32) -> F {
        self.coefficient(cid)
    }

    fn neg_inv_coeff(&self, cid: u32) -> F {
        self.coefficients_neg_inv[cid as usize]
    }

    fn set_value(&self, vid: u32, value: F) {
        self.set(vid as usize, value)
    }
}

impl<F: CurveField> System<F> {
    /// Solves the system and returns the full wire vector.
    ///
    /// Solver events go to `options.logger` for the duration of the call.
    pub fn solve(&self, witness: &[F], options: &SolverOptions) -> Result<Vec<F>, SolveError> {
        tracing::dispatcher::with_default(&options.logger, || self.solve_with(witness, options))
    }

    fn solve_with(&self, witness: &[F], options: &SolverOptions) -> Result<Vec<F>, SolveError> {
        let span = tracing::debug_span!(
            "solve",
            curve = %F::CURVE,
            backend = %self.system_type,
            nb_constraints = self.nb_constraints,
        );
        let _guard = span.enter();

        let start = Instant::now();
        let solver = Solver::new(self, witness, options)?;
        let result = solver.run(&options.config);
        if options.config.print_logs {
            solver.print_logs();
        }

        match result {
            Ok(()) => {
                tracing::debug!(took = ?start.elapsed(), "constraint system solver done");
                Ok(solver.into_values())
            }
            Err(err) => {
                match &err {
                    SolveError::Unsatisfied(e) => {
                        tracing::error!(id = e.constraint, "unsatisfied constraint: {e}")
                    }
                    _ => tracing::error!("solver failed: {err}"),
                }
                Err(err)
            }
        }
    }

    /// Whether `witness` satisfies every constraint.
    pub fn is_solved(&self, witness: &[F], options: &SolverOptions) -> bool {
        self.solve(witness, options).is_ok()
    }
}
