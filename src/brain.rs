use rand::Rng;
use tracing::{error, warn};

use crate::genome::{Genome, Specialization, OUTPUT_SIZE};

/// Controller action vector, every channel in [0, 1].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ActionVector {
    pub thrust: f32,
    pub rotation: f32,
    pub sprint: f32,
    pub mate: f32,
    pub attack: f32,
}

impl ActionVector {
    pub fn from_outputs(o: &[f32; OUTPUT_SIZE]) -> Self {
        Self {
            thrust: o[0],
            rotation: o[1],
            sprint: o[2],
            mate: o[3],
            attack: o[4],
        }
    }
}

/// Recurrent controller storage where each slot can have its own dimensions.
/// Weights are kept flattened row-major; the hidden state is the recurrent
/// memory concatenated into the next frame's input.
pub struct ControllerBank {
    capacity: usize,
    /// Flattened (input+hidden) x hidden. [slot][from * hidden + to]
    w1: Vec<Vec<f32>>,
    /// Flattened hidden x OUTPUT_SIZE. [slot][from * OUTPUT_SIZE + to]
    w2: Vec<Vec<f32>>,
    hidden: Vec<Vec<f32>>,
    spec: Vec<Option<Specialization>>,
    active: Vec<bool>,
    mismatch_logged: Vec<bool>,
}

impl ControllerBank {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            w1: vec![Vec::new(); capacity],
            w2: vec![Vec::new(); capacity],
            hidden: vec![Vec::new(); capacity],
            spec: vec![None; capacity],
            active: vec![false; capacity],
            mismatch_logged: vec![false; capacity],
        }
    }

    /// Initialize a slot from a genome. Shape-mismatched weights are
    /// discarded and replaced with fresh random ones rather than failing:
    /// stale genomes from other specializations must never crash a frame.
    pub fn init_from_genome(&mut self, slot: usize, genome: &Genome, rng: &mut impl Rng) {
        self.ensure_capacity(slot + 1);

        let source;
        let genome = if genome.shape_matches() {
            genome
        } else {
            warn!(
                genome_id = genome.id,
                specialization = ?genome.specialization,
                "controller weights do not match expected shape; reinitializing"
            );
            source = Genome::random(genome.id, genome.specialization, rng);
            &source
        };

        let profile = genome.specialization.profile();
        self.w1[slot] = flatten(&genome.w1);
        self.w2[slot] = flatten(&genome.w2);
        self.hidden[slot] = vec![0.0; profile.hidden_size];
        self.spec[slot] = Some(genome.specialization);
        self.active[slot] = true;
        self.mismatch_logged[slot] = false;
    }

    pub fn deactivate(&mut self, slot: usize) {
        if slot < self.active.len() {
            self.active[slot] = false;
        }
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active.get(slot).copied().unwrap_or(false)
    }

    pub fn hidden_state(&self, slot: usize) -> Option<&[f32]> {
        if self.is_active(slot) {
            self.hidden.get(slot).map(Vec::as_slice)
        } else {
            None
        }
    }

    /// Adopt an externally computed hidden state (accelerator path). Wrong
    /// lengths reset the state to zeros instead of corrupting the slot.
    pub fn adopt_hidden(&mut self, slot: usize, hidden: Vec<f32>) {
        if !self.is_active(slot) {
            return;
        }
        if hidden.len() == self.hidden[slot].len() && hidden.iter().all(|v| v.is_finite()) {
            self.hidden[slot] = hidden;
        } else {
            error!(slot, "malformed hidden state adopted; resetting to zeros");
            let len = self.hidden[slot].len();
            self.hidden[slot] = vec![0.0; len];
        }
    }

    /// One forward pass: `hidden = sigma(W1^T [inputs; prev_hidden])`,
    /// `action = sigma(W2^T hidden)`. Pure given (weights, inputs, hidden).
    /// Returns `None` for inactive slots.
    pub fn forward(&mut self, slot: usize, inputs: &[f32]) -> Option<ActionVector> {
        if !self.is_active(slot) {
            return None;
        }
        let spec = self.spec[slot]?;
        let input_len = spec.input_len();
        let hidden_len = spec.profile().hidden_size;

        let neutral;
        let inputs = if inputs.len() != input_len {
            if !self.mismatch_logged[slot] {
                warn!(
                    slot,
                    got = inputs.len(),
                    expected = input_len,
                    "input vector length mismatch; substituting neutral inputs"
                );
                self.mismatch_logged[slot] = true;
            }
            neutral = vec![0.0; input_len];
            &neutral[..]
        } else if inputs.iter().any(|v| !v.is_finite()) {
            error!(slot, "non-finite perception inputs; substituting neutral vector");
            self.hidden[slot] = vec![0.0; hidden_len];
            neutral = vec![0.0; input_len];
            &neutral[..]
        } else {
            inputs
        };

        let w1 = &self.w1[slot];
        let w2 = &self.w2[slot];
        let prev = &self.hidden[slot];

        let mut new_hidden = vec![0.0f32; hidden_len];
        for (i, h) in new_hidden.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (j, &x) in inputs.iter().enumerate() {
                sum += x * w1[j * hidden_len + i];
            }
            for (k, &p) in prev.iter().enumerate() {
                sum += p * w1[(input_len + k) * hidden_len + i];
            }
            *h = sigmoid(sum);
        }

        let mut out = [0.0f32; OUTPUT_SIZE];
        for (o, slot_out) in out.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for (i, &h) in new_hidden.iter().enumerate() {
                sum += h * w2[i * OUTPUT_SIZE + o];
            }
            *slot_out = sigmoid(sum);
        }

        self.hidden[slot] = new_hidden;
        Some(ActionVector::from_outputs(&out))
    }

    fn ensure_capacity(&mut self, needed: usize) {
        if needed > self.capacity {
            let new_cap = needed.max(self.capacity * 2);
            self.w1.resize(new_cap, Vec::new());
            self.w2.resize(new_cap, Vec::new());
            self.hidden.resize(new_cap, Vec::new());
            self.spec.resize(new_cap, None);
            self.active.resize(new_cap, false);
            self.mismatch_logged.resize(new_cap, false);
            self.capacity = new_cap;
        }
    }
}

fn flatten(rows: &[Vec<f32>]) -> Vec<f32> {
    rows.iter().flat_map(|r| r.iter().copied()).collect()
}

#[inline]
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
