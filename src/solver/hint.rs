//! Hint functions: out-of-circuit computations whose outputs become wire
//! values.
//!
//! Hints see plain big integers reduced modulo the field order. Their
//! outputs are reduced back into the field before being assigned, so a hint
//! may return any non-negative integer.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use super::Solver;
use super::error::{HintError, SolveError};
use crate::constraint::{HintId, HintMapping};
use crate::field::CurveField;

/// Name of the builtin returning `1/x`, or `0` when `x == 0`.
pub const INV_ZERO: &str = "inv_zero";
/// Name of the builtin returning `1` when `x == 0`, `0` otherwise.
pub const IS_ZERO: &str = "is_zero";
/// Name of the builtin returning the little-endian bits of `x`, one per output.
pub const N_BITS: &str = "n_bits";

/// `(modulus, inputs, outputs)`; outputs arrive zeroed.
pub trait HintFunction: Send + Sync {
    fn call(
        &self,
        modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError>;
}

impl<T> HintFunction for T
where
    T: Fn(&BigUint, &[BigUint], &mut [BigUint]) -> Result<(), HintError> + Send + Sync,
{
    fn call(
        &self,
        modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        self(modulus, inputs, outputs)
    }
}

#[derive(Clone)]
pub(crate) struct RegisteredHint {
    pub(crate) name: String,
    pub(crate) function: Arc<dyn HintFunction>,
}

/// Hint implementations keyed by [`HintId`].
#[derive(Clone, Default)]
pub struct HintRegistry {
    hints: HashMap<HintId, RegisteredHint>,
}

impl fmt::Debug for HintRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl HintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`INV_ZERO`], [`IS_ZERO`] and [`N_BITS`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(INV_ZERO, builtins::inv_zero);
        registry.register(IS_ZERO, builtins::is_zero);
        registry.register(N_BITS, builtins::n_bits);
        registry
    }

    /// Registers `function` under `name`, replacing any previous entry.
    pub fn register<H>(&mut self, name: &str, function: H) -> HintId
    where
        H: Fn(&BigUint, &[BigUint], &mut [BigUint]) -> Result<(), HintError>
            + Send
            + Sync
            + 'static,
    {
        let id = HintId::from_name(name);
        self.hints.insert(
            id,
            RegisteredHint {
                name: name.to_string(),
                function: Arc::new(function),
            },
        );
        id
    }

    pub fn contains(&self, id: HintId) -> bool {
        self.hints.contains_key(&id)
    }

    pub(crate) fn get(&self, id: HintId) -> Option<&RegisteredHint> {
        self.hints.get(&id)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.hints.values().map(|h| h.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }
}

pub mod builtins {
    use super::*;

    pub fn inv_zero(
        modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        check_arity(INV_ZERO, inputs, outputs, 1, 1)?;
        // x^(p-2) is the inverse of x, and 0 for x == 0
        outputs[0] = inputs[0].modpow(&(modulus - 2u32), modulus);
        Ok(())
    }

    pub fn is_zero(
        _modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        check_arity(IS_ZERO, inputs, outputs, 1, 1)?;
        outputs[0] = if inputs[0].is_zero() {
            BigUint::one()
        } else {
            BigUint::zero()
        };
        Ok(())
    }

    pub fn n_bits(
        _modulus: &BigUint,
        inputs: &[BigUint],
        outputs: &mut [BigUint],
    ) -> Result<(), HintError> {
        if inputs.len() != 1 {
            return Err(format!("{N_BITS} expects 1 input, got {}", inputs.len()).into());
        }
        for (i, out) in outputs.iter_mut().enumerate() {
            *out = BigUint::from(inputs[0].bit(i as u64) as u8);
        }
        Ok(())
    }

    fn check_arity(
        name: &str,
        inputs: &[BigUint],
        outputs: &[BigUint],
        nb_inputs: usize,
        nb_outputs: usize,
    ) -> Result<(), HintError> {
        if inputs.len() != nb_inputs || outputs.len() != nb_outputs {
            return Err(format!(
                "{name} expects {nb_inputs} input(s) and {nb_outputs} output(s), got {} and {}",
                inputs.len(),
                outputs.len()
            )
            .into());
        }
        Ok(())
    }
}

const MAX_POOLED_BUFFERS: usize = 256;

thread_local! {
    static BUFFER_POOL: RefCell<Vec<BigUint>> = const { RefCell::new(Vec::new()) };
}

/// `n` zeroed integers, recycled from this thread's pool when possible.
fn take_buffers(n: usize) -> Vec<BigUint> {
    BUFFER_POOL.with_borrow_mut(|pool| {
        (0..n)
            .map(|_| match pool.pop() {
                Some(mut b) => {
                    b.set_zero();
                    b
                }
                None => BigUint::zero(),
            })
            .collect()
    })
}

fn recycle(buffers: Vec<BigUint>) {
    BUFFER_POOL.with_borrow_mut(|pool| {
        let room = MAX_POOLED_BUFFERS.saturating_sub(pool.len());
        pool.extend(buffers.into_iter().take(room));
    })
}

/// Loads a canonical field element into `out` limb by limb.
fn load_field<F: PrimeField>(out: &mut BigUint, value: &F) {
    out.set_zero();
    for &limb in value.into_bigint().as_ref().iter().rev() {
        *out <<= 64u32;
        *out += limb;
    }
}

fn reduce_into_field<F: PrimeField>(value: &BigUint) -> F {
    F::from_le_bytes_mod_order(&value.to_bytes_le())
}

impl<F: CurveField> Solver<'_, F> {
    /// Evaluates the hint inputs, runs the hint and assigns its outputs.
    pub(crate) fn solve_with_hint(&self, h: &HintMapping) -> Result<(), SolveError> {
        let Some(hint) = self.hints.get(h.hint_id) else {
            return Err(SolveError::MissingHintFunction(h.hint_id));
        };

        let mut inputs = take_buffers(h.inputs.len());
        let mut outputs = take_buffers(h.outputs.len());
        for (buf, expr) in inputs.iter_mut().zip(&h.inputs) {
            let mut v = F::zero();
            for &t in expr {
                self.accumulate_into(t, &mut v);
            }
            load_field(buf, &v);
        }

        let result = hint.function.call(&self.modulus, &inputs, &mut outputs);
        if let Err(source) = result {
            recycle(inputs);
            recycle(outputs);
            return Err(SolveError::HintExecution {
                id: h.hint_id,
                name: hint.name.clone(),
                source,
            });
        }

        for (out, &wire) in outputs.iter().zip(&h.outputs) {
            self.set(wire as usize, reduce_into_field(out));
        }
        recycle(inputs);
        recycle(outputs);
        Ok(())
    }
}

/// Field modulus as a big integer.
pub(crate) fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::Field;

    #[test]
    fn test_load_field_matches_bigint() {
        let v = -Fr::from(5u64);
        let mut buf = BigUint::from(99u32);
        load_field(&mut buf, &v);
        assert_eq!(buf, modulus::<Fr>() - 5u32);
        assert_eq!(reduce_into_field::<Fr>(&buf), v);
    }

    #[test]
    fn test_outputs_reduced_modulo_field() {
        let over = modulus::<Fr>() + 7u32;
        assert_eq!(reduce_into_field::<Fr>(&over), Fr::from(7u64));
    }

    #[test]
    fn test_inv_zero_builtin() {
        let p = modulus::<Fr>();
        let mut out = vec![BigUint::zero()];
        builtins::inv_zero(&p, &[BigUint::from(5u32)], &mut out).unwrap();
        let expected = Fr::from(5u64).inverse().unwrap();
        assert_eq!(reduce_into_field::<Fr>(&out[0]), expected);

        builtins::inv_zero(&p, &[BigUint::zero()], &mut out).unwrap();
        assert!(out[0].is_zero());
    }

    #[test]
    fn test_n_bits_builtin() {
        let p = modulus::<Fr>();
        let mut out = vec![BigUint::zero(); 4];
        builtins::n_bits(&p, &[BigUint::from(0b1011u32)], &mut out).unwrap();
        let bits: Vec<u32> = out.iter().map(|b| if b.is_zero() { 0 } else { 1 }).collect();
        assert_eq!(bits, vec![1, 1, 0, 1]);
    }

    #[test]
    fn test_arity_checked() {
        let p = modulus::<Fr>();
        let mut out = vec![BigUint::zero()];
        assert!(builtins::is_zero(&p, &[], &mut out).is_err());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = HintRegistry::with_builtins();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(HintId::from_name(IS_ZERO)));
        assert_eq!(registry.names(), vec![INV_ZERO, IS_ZERO, N_BITS]);
    }

    #[test]
    fn test_buffers_are_recycled_zeroed() {
        let mut bufs = take_buffers(2);
        bufs[0] = BigUint::from(42u32);
        recycle(bufs);
        assert!(take_buffers(3).iter().all(|b| b.is_zero()));
    }
}
