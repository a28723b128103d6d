use sha2::{Digest, Sha256};

pub mod constraint;
pub mod field;
pub mod solution;
pub mod solver;

pub use constraint::{System, SystemType};
pub use field::{CurveField, CurveId};
pub use solution::{R1csSolution, SparseR1csSolution};
pub use solver::{
    HintError, HintRegistry, SolveError, SolverConfig, SolverOptions, UnsatisfiedConstraintError,
};

pub fn digest_sha2(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}
