//! Compiled constraint systems: data model, blueprints, levels and the
//! binary form.

pub mod blueprint;
pub mod debug;
pub mod level;
pub mod ser;
pub mod system;
pub mod term;

pub use blueprint::{Blueprint, BlueprintKind, Decoded, WireSolver};
pub use debug::{DebugInfo, LogEntry, SymbolTable};
pub use system::{Instruction, ONE_WIRE, System, SystemType};
pub use term::{
    COEFF_ID_MINUS_ONE, COEFF_ID_ONE, COEFF_ID_TWO, COEFF_ID_ZERO, CommitmentConstraint, HintId,
    HintMapping, LinearExpression, R1C, SparseR1C, Term,
};
