//! Binary form of a [`System`].
//!
//! Layout: `magic | version (u16 LE) | curve (u8) | system type (u8) | body | sha256(body)`.
//! The body is the canonical (compressed) arkworks encoding of the persisted
//! fields. Lookup tables derived from them are rebuilt on read.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

use super::blueprint::{Blueprint, BlueprintKind, Decoded};
use super::debug::{DebugInfo, LogEntry, SymbolTable};
use super::level::LevelTracker;
use super::system::{Instruction, ONE_WIRE, System, SystemType};
use super::term::{HintId, Term};
use crate::digest_sha2;
use crate::field::{CurveField, CurveId};

pub const MAGIC: &[u8; 4] = b"GSCS";
pub const VERSION: u16 = 1;
const HEADER_LEN: usize = 8;
const DIGEST_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("not a serialized constraint system")]
    BadMagic,
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u16),
    #[error("unknown curve tag {0}")]
    UnknownCurve(u8),
    #[error("unknown system type tag {0}")]
    UnknownSystemType(u8),
    #[error(
        "header mismatch: expected {expected_curve} {expected_type}, found {found_curve} {found_type}"
    )]
    HeaderMismatch {
        expected_curve: CurveId,
        expected_type: SystemType,
        found_curve: CurveId,
        found_type: SystemType,
    },
    #[error("body checksum mismatch")]
    ChecksumMismatch,
    #[error("unknown blueprint tag {0}")]
    UnknownBlueprint(u8),
    #[error("truncated input")]
    Truncated,
    /// The body decodes but references something that does not exist.
    #[error("malformed constraint system: {0}")]
    Malformed(String),
    #[error(transparent)]
    Codec(#[from] ark_serialize::SerializationError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Curve and system type recorded in a serialized header.
pub fn peek_header(bytes: &[u8]) -> Result<(CurveId, SystemType), SerializationError> {
    if bytes.len() < HEADER_LEN {
        return Err(SerializationError::Truncated);
    }
    if &bytes[..4] != MAGIC {
        return Err(SerializationError::BadMagic);
    }
    let version = u16::from_le_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(SerializationError::UnsupportedVersion(version));
    }
    let curve = CurveId::from_u8(bytes[6]).ok_or(SerializationError::UnknownCurve(bytes[6]))?;
    let system_type =
        SystemType::from_u8(bytes[7]).ok_or(SerializationError::UnknownSystemType(bytes[7]))?;
    Ok((curve, system_type))
}

impl<F: CurveField> System<F> {
    /// Writes the binary form and returns the number of bytes written.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<usize, SerializationError> {
        let body = self.encode_body()?;
        let mut header = Vec::with_capacity(HEADER_LEN);
        header.extend_from_slice(MAGIC);
        header.extend_from_slice(&VERSION.to_le_bytes());
        header.push(F::CURVE.to_u8());
        header.push(self.system_type.to_u8());

        w.write_all(&header)?;
        w.write_all(&body)?;
        w.write_all(&digest_sha2(&body))?;
        Ok(header.len() + body.len() + DIGEST_LEN)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializationError> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Reads a system previously written with [`System::write_to`].
    ///
    /// The header must name `F`'s curve and `expected` system type.
    pub fn read_from<R: Read>(mut r: R, expected: SystemType) -> Result<Self, SerializationError> {
        let mut bytes = Vec::new();
        r.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes, expected)
    }

    pub fn from_bytes(bytes: &[u8], expected: SystemType) -> Result<Self, SerializationError> {
        let (found_curve, found_type) = peek_header(bytes)?;
        if found_curve != F::CURVE || found_type != expected {
            return Err(SerializationError::HeaderMismatch {
                expected_curve: F::CURVE,
                expected_type: expected,
                found_curve,
                found_type,
            });
        }
        if bytes.len() < HEADER_LEN + DIGEST_LEN {
            return Err(SerializationError::Truncated);
        }
        let (body, digest) = bytes[HEADER_LEN..].split_at(bytes.len() - HEADER_LEN - DIGEST_LEN);
        if digest_sha2(body) != digest {
            return Err(SerializationError::ChecksumMismatch);
        }

        let mut system = Self::decode_body(body, found_type)?;
        system.validate()?;
        system.rebuild_derived_tables();
        Ok(system)
    }

    fn encode_body(&self) -> Result<Vec<u8>, SerializationError> {
        let mut body = Vec::new();
        let blueprints: Vec<u8> = self.blueprints.iter().map(|b| b.to_u8()).collect();

        self.public.serialize_compressed(&mut body)?;
        self.secret.serialize_compressed(&mut body)?;
        (self.nb_internal_variables as u64).serialize_compressed(&mut body)?;
        self.coefficients.serialize_compressed(&mut body)?;
        blueprints.serialize_compressed(&mut body)?;
        self.instructions.serialize_compressed(&mut body)?;
        self.call_data.serialize_compressed(&mut body)?;
        self.levels.serialize_compressed(&mut body)?;
        self.hint_dependencies.serialize_compressed(&mut body)?;
        self.debug_info.serialize_compressed(&mut body)?;
        self.debug_index.serialize_compressed(&mut body)?;
        self.logs.serialize_compressed(&mut body)?;
        self.symbol_table.serialize_compressed(&mut body)?;
        (self.nb_constraints as u64).serialize_compressed(&mut body)?;
        Ok(body)
    }

    fn decode_body(mut body: &[u8], system_type: SystemType) -> Result<Self, SerializationError> {
        let r = &mut body;
        let public = Vec::<String>::deserialize_compressed(&mut *r)?;
        let secret = Vec::<String>::deserialize_compressed(&mut *r)?;
        let nb_internal_variables = u64::deserialize_compressed(&mut *r)? as usize;
        let coefficients = Vec::<F>::deserialize_compressed(&mut *r)?;
        let blueprints = Vec::<u8>::deserialize_compressed(&mut *r)?
            .into_iter()
            .map(|tag| Blueprint::from_u8(tag).ok_or(SerializationError::UnknownBlueprint(tag)))
            .collect::<Result<Vec<_>, _>>()?;
        let instructions = Vec::<Instruction>::deserialize_compressed(&mut *r)?;
        let call_data = Vec::<u32>::deserialize_compressed(&mut *r)?;
        let levels = Vec::<Vec<u32>>::deserialize_compressed(&mut *r)?;
        let hint_dependencies = BTreeMap::<HintId, String>::deserialize_compressed(&mut *r)?;
        let debug_info = Vec::<DebugInfo>::deserialize_compressed(&mut *r)?;
        let debug_index = BTreeMap::<u32, u32>::deserialize_compressed(&mut *r)?;
        let logs = Vec::<LogEntry>::deserialize_compressed(&mut *r)?;
        let symbol_table = SymbolTable::deserialize_compressed(&mut *r)?;
        let nb_constraints = u64::deserialize_compressed(&mut *r)? as usize;

        Ok(Self {
            system_type,
            public,
            secret,
            nb_internal_variables,
            coefficients,
            blueprints,
            instructions,
            call_data,
            levels,
            hint_dependencies,
            debug_info,
            debug_index,
            logs,
            symbol_table,
            nb_constraints,
            coeff_table: Default::default(),
            tracker: LevelTracker::default(),
        })
    }
}

fn malformed(msg: impl Into<String>) -> SerializationError {
    SerializationError::Malformed(msg.into())
}

/// Length of the call data of `blueprint` starting at `from`, once its
/// internal layout has been checked against the buffer.
fn checked_call_data_len(blueprint: Blueprint, from: &[u32]) -> Result<usize, String> {
    let len = match blueprint.nb_inputs() {
        Some(n) => n,
        None => *from.first().ok_or("empty call data")? as usize,
    };
    if len > from.len() {
        return Err(format!("call data of length {len} overruns the buffer"));
    }
    let data = &from[..len];
    match blueprint {
        Blueprint::GenericR1C => {
            if len < 4 {
                return Err(format!("r1c call data of length {len}"));
            }
            let nb_terms = data[1] as usize + data[2] as usize + data[3] as usize;
            if 4 + 2 * nb_terms != len {
                return Err(format!("r1c with {nb_terms} terms in {len} words"));
            }
        }
        Blueprint::GenericHint => {
            if len < 4 {
                return Err(format!("hint call data of length {len}"));
            }
            let mut cursor = 3;
            for _ in 0..data[2] {
                let n = *data.get(cursor).ok_or("hint inputs overrun the call data")? as usize;
                cursor += 1 + 2 * n;
                if cursor >= len {
                    return Err("hint inputs overrun the call data".into());
                }
            }
            let nb_outputs = data[cursor] as usize;
            if cursor + 1 + nb_outputs != len {
                return Err(format!("hint with {nb_outputs} outputs in {len} words"));
            }
        }
        _ => {}
    }
    Ok(len)
}

impl<F: CurveField> System<F> {
    /// Checks every cross-reference of a freshly decoded body, so that a
    /// loaded system can only fail to solve because of its witness.
    fn validate(&self) -> Result<(), SerializationError> {
        let reserved = [F::zero(), F::one(), F::from(2u64), -F::one()];
        if self.coefficients.get(..4) != Some(&reserved[..]) {
            return Err(malformed("reserved coefficients are missing"));
        }
        if self.system_type == SystemType::R1CS
            && self.public.first().map(String::as_str) != Some(ONE_WIRE)
        {
            return Err(malformed("r1cs without the constant wire"));
        }
        let nb_wires = self
            .public
            .len()
            .checked_add(self.secret.len())
            .and_then(|n| n.checked_add(self.nb_internal_variables))
            .ok_or_else(|| malformed("wire count overflows"))?;
        let check_wire = |w: u32| {
            if (w as usize) < nb_wires {
                Ok(())
            } else {
                Err(format!("wire {w} out of {nb_wires}"))
            }
        };
        let check_terms = |terms: &[Term]| -> Result<(), String> {
            for t in terms {
                if t.cid as usize >= self.coefficients.len() {
                    return Err(format!("coefficient {} out of range", t.cid));
                }
                if !t.is_constant() {
                    check_wire(t.vid)?;
                }
            }
            Ok(())
        };

        for (i, inst) in self.instructions.iter().enumerate() {
            let at = |e: String| malformed(format!("instruction {i}: {e}"));
            let blueprint = *self
                .blueprints
                .get(inst.blueprint_id as usize)
                .ok_or_else(|| at(format!("unknown blueprint id {}", inst.blueprint_id)))?;
            let start = usize::try_from(inst.start_call_data)
                .ok()
                .filter(|&s| s <= self.call_data.len())
                .ok_or_else(|| at("call data starts past the buffer".into()))?;
            let len = checked_call_data_len(blueprint, &self.call_data[start..]).map_err(at)?;
            let data = &self.call_data[start..start + len];

            match (blueprint.kind(), self.system_type) {
                (BlueprintKind::R1C, SystemType::SparseR1CS)
                | (BlueprintKind::SparseR1C | BlueprintKind::Solvable, SystemType::R1CS) => {
                    return Err(at(format!("{blueprint:?} in a {} system", self.system_type)));
                }
                _ => {}
            }
            match blueprint.decode(data) {
                Decoded::Hint(h) => {
                    for input in &h.inputs {
                        check_terms(input).map_err(at)?;
                    }
                    for &w in &h.outputs {
                        check_wire(w).map_err(at)?;
                    }
                }
                Decoded::R1C(r) => {
                    for expr in [&r.l, &r.r, &r.o] {
                        check_terms(expr).map_err(at)?;
                    }
                }
                Decoded::SparseR1C(_) | Decoded::Solvable => {
                    let c = blueprint
                        .decompress_sparse_r1c(data)
                        .ok_or_else(|| at(format!("{blueprint:?} is not a gate")))?;
                    let wires: Vec<u32> = match blueprint.kind() {
                        BlueprintKind::Solvable => vec![c.xa, c.xb, c.xc],
                        _ => c.active_wires().collect(),
                    };
                    for w in wires {
                        check_wire(w).map_err(at)?;
                    }
                    for q in [c.ql, c.qr, c.qo, c.qm, c.qc] {
                        if q as usize >= self.coefficients.len() {
                            return Err(at(format!("coefficient {q} out of range")));
                        }
                    }
                }
            }
        }

        let mut scheduled = vec![false; self.instructions.len()];
        for level in &self.levels {
            for &i in level {
                let slot = scheduled
                    .get_mut(i as usize)
                    .ok_or_else(|| malformed(format!("level names missing instruction {i}")))?;
                if *slot {
                    return Err(malformed(format!("instruction {i} scheduled twice")));
                }
                *slot = true;
            }
        }

        for location in &self.symbol_table.locations {
            if location.function_id as usize >= self.symbol_table.functions.len() {
                return Err(malformed(format!("unknown function {}", location.function_id)));
            }
        }
        if let Some(&i) = self
            .debug_index
            .values()
            .find(|&&i| i as usize >= self.debug_info.len())
        {
            return Err(malformed(format!("debug index points to missing entry {i}")));
        }
        for entry in self.debug_info.iter().chain(&self.logs) {
            for expr in &entry.to_resolve {
                check_terms(expr).map_err(|e| malformed(format!("log {}: {e}", entry.caller)))?;
            }
            if let Some(&id) = entry
                .stack
                .iter()
                .find(|&&id| id as usize >= self.symbol_table.locations.len())
            {
                return Err(malformed(format!("log {}: unknown location {id}", entry.caller)));
            }
        }
        Ok(())
    }
}
