//! The compiled constraint system.
//!
//! A [`System`] is produced once by a circuit front-end through the builder
//! methods below and is read-only afterwards. Wires are laid out as
//! `[public | secret | internal]`; R1CS systems reserve public wire 0 for the
//! constant one.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::blueprint::{Blueprint, Decoded};
use super::debug::{DebugInfo, LogEntry, SymbolTable};
use super::level::LevelTracker;
use super::term::{
    COEFF_ID_MINUS_ONE, COEFF_ID_ONE, COEFF_ID_TWO, COEFF_ID_ZERO, CommitmentConstraint, HintId,
    HintMapping, LinearExpression, R1C, SparseR1C, Term,
};
use crate::field::CurveField;

/// Name of the constant-one wire of R1CS systems.
pub const ONE_WIRE: &str = "1";

/// Arithmetization a system is compiled to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemType {
    R1CS,
    SparseR1CS,
}

impl SystemType {
    pub fn to_u8(self) -> u8 {
        match self {
            SystemType::R1CS => 1,
            SystemType::SparseR1CS => 2,
        }
    }

    pub fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(SystemType::R1CS),
            2 => Some(SystemType::SparseR1CS),
            _ => None,
        }
    }
}

impl fmt::Display for SystemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SystemType::R1CS => write!(f, "r1cs"),
            SystemType::SparseR1CS => write!(f, "sparse-r1cs"),
        }
    }
}

/// One blueprint invocation over a slice of the call-data buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct Instruction {
    pub blueprint_id: u32,
    pub start_call_data: u64,
    /// Index of the constraint this instruction encodes (number of constraints
    /// emitted before it, for hints)
    pub constraint_offset: u32,
}

/// Compiled constraint system over the scalar field `F`.
#[derive(Debug, Clone)]
pub struct System<F: CurveField> {
    pub system_type: SystemType,
    pub public: Vec<String>,
    pub secret: Vec<String>,
    pub nb_internal_variables: usize,
    /// Deduplicated coefficient pool; ids 0..=3 hold 0, 1, 2, -1
    pub coefficients: Vec<F>,
    pub blueprints: Vec<Blueprint>,
    pub instructions: Vec<Instruction>,
    pub call_data: Vec<u32>,
    /// Instruction indices grouped by dependency level
    pub levels: Vec<Vec<u32>>,
    /// Hints the solver needs an implementation for
    pub hint_dependencies: BTreeMap<HintId, String>,
    pub debug_info: Vec<DebugInfo>,
    /// Constraint id -> index into `debug_info`
    pub debug_index: BTreeMap<u32, u32>,
    pub logs: Vec<LogEntry>,
    pub symbol_table: SymbolTable,
    pub nb_constraints: usize,
    pub(crate) coeff_table: HashMap<F, u32>,
    pub(crate) tracker: LevelTracker,
}

impl<F: CurveField> System<F> {
    pub fn new(system_type: SystemType) -> Self {
        let coefficients = vec![F::zero(), F::one(), F::from(2u64), -F::one()];
        let mut system = Self {
            system_type,
            public: Vec::new(),
            secret: Vec::new(),
            nb_internal_variables: 0,
            coefficients,
            blueprints: Blueprint::ALL.to_vec(),
            instructions: Vec::new(),
            call_data: Vec::new(),
            levels: Vec::new(),
            hint_dependencies: BTreeMap::new(),
            debug_info: Vec::new(),
            debug_index: BTreeMap::new(),
            logs: Vec::new(),
            symbol_table: SymbolTable::default(),
            nb_constraints: 0,
            coeff_table: HashMap::new(),
            tracker: LevelTracker::default(),
        };
        if system_type == SystemType::R1CS {
            system.add_public_variable(ONE_WIRE);
        }
        system
    }

    pub fn nb_wires(&self) -> usize {
        self.public.len() + self.secret.len() + self.nb_internal_variables
    }

    /// 1 when wire 0 is the constant one and not part of the witness.
    pub fn witness_offset(&self) -> usize {
        match self.system_type {
            SystemType::R1CS => 1,
            SystemType::SparseR1CS => 0,
        }
    }

    /// Number of public and secret values a caller provides.
    pub fn expected_witness_size(&self) -> usize {
        self.public.len() - self.witness_offset() + self.secret.len()
    }

    pub fn nb_constraints(&self) -> usize {
        self.nb_constraints
    }

    pub fn add_public_variable(&mut self, name: &str) -> u32 {
        assert!(
            self.secret.is_empty(),
            "public variables must be declared before secret ones"
        );
        self.tracker.add_input();
        self.public.push(name.to_string());
        (self.public.len() - 1) as u32
    }

    pub fn add_secret_variable(&mut self, name: &str) -> u32 {
        self.tracker.add_input();
        self.secret.push(name.to_string());
        (self.public.len() + self.secret.len() - 1) as u32
    }

    pub fn add_internal_variable(&mut self) -> u32 {
        self.tracker.add_internal();
        self.nb_internal_variables += 1;
        (self.nb_wires() - 1) as u32
    }

    /// Id of `c` in the coefficient pool, inserting it if new.
    pub fn coeff_id(&mut self, c: &F) -> u32 {
        if c.is_zero() {
            return COEFF_ID_ZERO;
        }
        if c.is_one() {
            return COEFF_ID_ONE;
        }
        if *c == F::from(2u64) {
            return COEFF_ID_TWO;
        }
        if *c == -F::one() {
            return COEFF_ID_MINUS_ONE;
        }
        if let Some(&id) = self.coeff_table.get(c) {
            return id;
        }
        let id = self.coefficients.len() as u32;
        self.coefficients.push(*c);
        self.coeff_table.insert(*c, id);
        id
    }

    pub fn make_term(&mut self, coeff: &F, wire: u32) -> Term {
        Term::new(self.coeff_id(coeff), wire)
    }

    pub fn make_constant(&mut self, c: &F) -> Term {
        Term::constant(self.coeff_id(c))
    }

    /// Call data of one instruction.
    pub fn call_data(&self, inst: &Instruction) -> &[u32] {
        let blueprint = self.blueprints[inst.blueprint_id as usize];
        let start = inst.start_call_data as usize;
        let len = blueprint.call_data_len(&self.call_data[start..]);
        &self.call_data[start..start + len]
    }

    pub fn blueprint_id(&self, blueprint: Blueprint) -> u32 {
        self.blueprints
            .iter()
            .position(|b| *b == blueprint)
            .map(|p| p as u32)
            .unwrap_or_else(|| panic!("blueprint {blueprint:?} is not registered"))
    }

    /// Appends an R1C and returns its constraint id.
    pub fn add_r1c(&mut self, r1c: R1C, debug: Option<DebugInfo>) -> usize {
        assert_eq!(self.system_type, SystemType::R1CS, "R1C in a sparse system");
        let data = Blueprint::GenericR1C.compress_r1c(&r1c);
        self.push_constraint(Blueprint::GenericR1C, data, debug)
    }

    /// Appends a sparse constraint and returns its constraint id.
    ///
    /// Gates computing a fresh `xC` from known `xA`, `xB` get one of the
    /// specialized solvable blueprints.
    pub fn add_sparse_r1c(&mut self, c: SparseR1C, debug: Option<DebugInfo>) -> usize {
        assert_eq!(
            self.system_type,
            SystemType::SparseR1CS,
            "sparse constraint in an R1CS system"
        );
        let blueprint = self.pick_sparse_blueprint(&c);
        let data = blueprint.compress_sparse_r1c(&c);
        self.push_constraint(blueprint, data, debug)
    }

    fn pick_sparse_blueprint(&self, c: &SparseR1C) -> Blueprint {
        let produces_xc = c.commitment == CommitmentConstraint::Not
            && c.qo != COEFF_ID_ZERO
            && !self.tracker.is_known(c.xc)
            && c.active_wires()
                .filter(|&w| w != c.xc)
                .all(|w| self.tracker.is_known(w));
        if !produces_xc {
            return Blueprint::GenericSparseR1C;
        }
        if c.qm != COEFF_ID_ZERO
            && c.ql == COEFF_ID_ZERO
            && c.qr == COEFF_ID_ZERO
            && c.qc == COEFF_ID_ZERO
        {
            Blueprint::SparseR1CMul
        } else if c.qm == COEFF_ID_ZERO {
            Blueprint::SparseR1CAdd
        } else {
            Blueprint::GenericSparseR1C
        }
    }

    fn push_constraint(
        &mut self,
        blueprint: Blueprint,
        data: Vec<u32>,
        debug: Option<DebugInfo>,
    ) -> usize {
        let cid = self.nb_constraints;
        self.push_instruction(blueprint, data, cid as u32);
        if let Some(info) = debug {
            self.debug_info.push(info);
            self.debug_index
                .insert(cid as u32, (self.debug_info.len() - 1) as u32);
        }
        self.nb_constraints += 1;
        cid
    }

    /// Appends a hint call; allocates and returns its `nb_outputs` output wires.
    pub fn add_hint(
        &mut self,
        name: &str,
        inputs: Vec<LinearExpression>,
        nb_outputs: usize,
    ) -> Vec<u32> {
        let hint_id = HintId::from_name(name);
        self.hint_dependencies
            .entry(hint_id)
            .or_insert_with(|| name.to_string());
        let outputs: Vec<u32> = (0..nb_outputs)
            .map(|_| self.add_internal_variable())
            .collect();
        let mapping = HintMapping {
            hint_id,
            inputs,
            outputs: outputs.clone(),
        };
        let data = Blueprint::GenericHint.compress_hint(&mapping);
        self.push_instruction(Blueprint::GenericHint, data, self.nb_constraints as u32);
        outputs
    }

    /// Records a log statement printed once the solver is done.
    pub fn add_log(&mut self, entry: LogEntry) {
        self.logs.push(entry);
    }

    /// Registers a stack frame for debug traces and returns its location id.
    pub fn add_debug_location(&mut self, function: &str, file: &str, line: u32) -> u32 {
        self.symbol_table.add_location(function, file, line)
    }

    fn push_instruction(&mut self, blueprint: Blueprint, data: Vec<u32>, constraint_offset: u32) {
        let level = self.track(blueprint, &data);
        let inst_id = self.instructions.len() as u32;
        self.instructions.push(Instruction {
            blueprint_id: self.blueprint_id(blueprint),
            start_call_data: self.call_data.len() as u64,
            constraint_offset,
        });
        self.call_data.extend(data);
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, Vec::new);
        }
        self.levels[level].push(inst_id);
    }

    fn track(&mut self, blueprint: Blueprint, calldata: &[u32]) -> usize {
        match blueprint.decode(calldata) {
            Decoded::Hint(h) => {
                let reads: Vec<u32> = h
                    .inputs
                    .iter()
                    .flatten()
                    .filter(|t| !t.is_constant())
                    .map(|t| t.vid)
                    .collect();
                self.tracker.record(reads, &h.outputs, false)
            }
            Decoded::R1C(r) => self.tracker.record(r.wires().collect::<Vec<_>>(), &[], true),
            Decoded::SparseR1C(_) | Decoded::Solvable => {
                let c = blueprint
                    .decompress_sparse_r1c(calldata)
                    .unwrap_or_default();
                let claim = c.commitment == CommitmentConstraint::Not;
                self.tracker.record(c.active_wires(), &[], claim)
            }
        }
    }

    /// Rebuilds the tables that are derived from persisted data.
    pub(crate) fn rebuild_derived_tables(&mut self) {
        self.coeff_table = self
            .coefficients
            .iter()
            .enumerate()
            .skip(4)
            .map(|(i, c)| (*c, i as u32))
            .collect();
        self.tracker = LevelTracker::new(
            self.public.len() + self.secret.len(),
            self.nb_internal_variables,
        );
        for i in 0..self.instructions.len() {
            let inst = self.instructions[i];
            let blueprint = self.blueprints[inst.blueprint_id as usize];
            let data = self.call_data(&inst).to_vec();
            self.track(blueprint, &data);
        }
    }

    /// All R1Cs in instruction order.
    pub fn r1cs_constraints(&self) -> Vec<R1C> {
        self.instructions
            .iter()
            .filter_map(|inst| match self.decode(inst) {
                Decoded::R1C(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    /// All sparse gates in instruction order, including solvable blueprints.
    pub fn sparse_constraints(&self) -> Vec<SparseR1C> {
        self.instructions
            .iter()
            .filter_map(|inst| {
                let blueprint = self.blueprints[inst.blueprint_id as usize];
                blueprint.decompress_sparse_r1c(self.call_data(inst))
            })
            .collect()
    }

    pub fn decode(&self, inst: &Instruction) -> Decoded {
        self.blueprints[inst.blueprint_id as usize].decode(self.call_data(inst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;

    #[test]
    fn test_coefficient_pool_dedup() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        assert_eq!(cs.coeff_id(&Fr::from(0u64)), COEFF_ID_ZERO);
        assert_eq!(cs.coeff_id(&Fr::from(1u64)), COEFF_ID_ONE);
        assert_eq!(cs.coeff_id(&Fr::from(2u64)), COEFF_ID_TWO);
        assert_eq!(cs.coeff_id(&-Fr::from(1u64)), COEFF_ID_MINUS_ONE);

        let seven = cs.coeff_id(&Fr::from(7u64));
        assert_eq!(seven, 4);
        assert_eq!(cs.coeff_id(&Fr::from(7u64)), seven);
        assert_eq!(cs.coefficients.len(), 5);
    }

    #[test]
    fn test_r1cs_reserves_one_wire() {
        let mut cs = System::<Fr>::new(SystemType::R1CS);
        assert_eq!(cs.public, vec![ONE_WIRE.to_string()]);
        let x = cs.add_public_variable("x");
        let y = cs.add_secret_variable("y");
        let w = cs.add_internal_variable();
        assert_eq!((x, y, w), (1, 2, 3));
        assert_eq!(cs.expected_witness_size(), 2);
        assert_eq!(cs.nb_wires(), 4);
    }

    #[test]
    fn test_levels_follow_dependencies() {
        let mut cs = System::<Fr>::new(SystemType::R1CS);
        let x = cs.add_secret_variable("x");
        let a = cs.add_internal_variable();
        let b = cs.add_internal_variable();
        let c = cs.add_internal_variable();
        let one = |w| vec![Term::new(COEFF_ID_ONE, w)];

        cs.add_r1c(R1C::new(one(x), one(x), one(a)), None);
        cs.add_r1c(R1C::new(one(x), one(x), one(b)), None);
        cs.add_r1c(R1C::new(one(a), one(b), one(c)), None);

        assert_eq!(cs.levels, vec![vec![0, 1], vec![2]]);
        assert_eq!(cs.r1cs_constraints().len(), 3);
    }

    #[test]
    fn test_sparse_blueprint_selection() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_public_variable("x");
        let y = cs.add_internal_variable();
        let z = cs.add_internal_variable();
        let committed = cs.add_internal_variable();

        // y = x * x
        cs.add_sparse_r1c(
            SparseR1C {
                xa: x,
                xb: x,
                xc: y,
                qm: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            None,
        );
        // z = x + y
        cs.add_sparse_r1c(
            SparseR1C {
                xa: x,
                xb: y,
                xc: z,
                ql: COEFF_ID_ONE,
                qr: COEFF_ID_ONE,
                qo: COEFF_ID_MINUS_ONE,
                ..Default::default()
            },
            None,
        );
        cs.add_sparse_r1c(
            SparseR1C {
                xa: committed,
                ql: COEFF_ID_ONE,
                commitment: CommitmentConstraint::Committed,
                ..Default::default()
            },
            None,
        );

        let ids: Vec<Blueprint> = cs
            .instructions
            .iter()
            .map(|i| cs.blueprints[i.blueprint_id as usize])
            .collect();
        assert_eq!(
            ids,
            vec![
                Blueprint::SparseR1CMul,
                Blueprint::SparseR1CAdd,
                Blueprint::GenericSparseR1C
            ]
        );
        assert_eq!(cs.sparse_constraints().len(), 3);
        assert!(!cs.tracker.is_known(committed));
    }

    #[test]
    fn test_hint_registers_dependency() {
        let mut cs = System::<Fr>::new(SystemType::SparseR1CS);
        let x = cs.add_secret_variable("x");
        let outs = cs.add_hint("inv_zero", vec![vec![Term::new(COEFF_ID_ONE, x)]], 1);
        assert_eq!(outs, vec![1]);
        assert_eq!(
            cs.hint_dependencies.get(&HintId::from_name("inv_zero")),
            Some(&"inv_zero".to_string())
        );
        assert_eq!(cs.nb_constraints(), 0);
        assert_eq!(cs.levels, vec![vec![0]]);
    }
}
