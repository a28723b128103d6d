//! Compile-time dependency levels.
//!
//! Every instruction lands one level above the deepest already-produced wire
//! it reads, so instructions sharing a level never consume each other's
//! outputs.

/// Tracks, for each internal wire, the level of the instruction producing it.
#[derive(Debug, Clone, Default)]
pub struct LevelTracker {
    nb_inputs: usize,
    internal: Vec<Option<usize>>,
}

impl LevelTracker {
    pub fn new(nb_inputs: usize, nb_internal: usize) -> Self {
        Self {
            nb_inputs,
            internal: vec![None; nb_internal],
        }
    }

    pub fn add_input(&mut self) {
        assert!(
            self.internal.is_empty(),
            "inputs must be declared before internal wires"
        );
        self.nb_inputs += 1;
    }

    pub fn add_internal(&mut self) {
        self.internal.push(None);
    }

    /// Whether the wire is an input or produced by an earlier instruction.
    pub fn is_known(&self, wire: u32) -> bool {
        let wire = wire as usize;
        wire < self.nb_inputs || self.internal[wire - self.nb_inputs].is_some()
    }

    /// Records one instruction and returns its level.
    ///
    /// `wires` are the wires the instruction mentions; with `claim_unknown`
    /// every one not yet produced becomes an output of this instruction.
    /// `outputs` are produced unconditionally.
    pub fn record(
        &mut self,
        wires: impl IntoIterator<Item = u32>,
        outputs: &[u32],
        claim_unknown: bool,
    ) -> usize {
        let mut level = 0;
        let mut produced: Vec<u32> = outputs.to_vec();
        for w in wires {
            let w_idx = w as usize;
            if w_idx < self.nb_inputs {
                continue;
            }
            match self.internal[w_idx - self.nb_inputs] {
                Some(l) => level = level.max(l + 1),
                None if claim_unknown && !produced.contains(&w) => produced.push(w),
                None => {}
            }
        }
        for w in produced {
            self.internal[w as usize - self.nb_inputs] = Some(level);
        }
        level
    }
}
