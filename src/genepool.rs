use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::genome::{Genome, Specialization};

/// Metadata accompanying a saved genome.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GenomeMeta {
    pub generation: u32,
    pub food_eaten: u32,
    pub kills: u32,
    pub age_frames: u64,
}

/// Durable record handed to whatever storage sits behind the pool. The
/// serialized shape must stay stable per specialization to remain loadable.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolRecord {
    pub genome: Genome,
    pub fitness: f32,
    pub meta: GenomeMeta,
}

impl PoolRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// Selection oracle for seeding and breeding. The core never inspects the
/// store's internals; saves are queued so agent death never stalls a frame.
pub trait GenePoolStore {
    fn queue_save_agent(&mut self, genome: Genome, fitness: f32, meta: GenomeMeta);
    fn get_random_agent(&mut self) -> Option<Genome>;
    fn get_mating_pair(&mut self) -> Option<(Genome, Genome)>;
}

/// In-memory pool with per-genome-id capacity and top-K retention.
pub struct InMemoryGenePool {
    entries: HashMap<u64, Vec<PoolRecord>>,
    queue: Vec<PoolRecord>,
    per_id_capacity: usize,
    rng: ChaCha8Rng,
}

impl InMemoryGenePool {
    pub fn new(per_id_capacity: usize, seed: u64) -> Self {
        Self {
            entries: HashMap::new(),
            queue: Vec::new(),
            per_id_capacity: per_id_capacity.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn stored(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Apply queued saves: per genome id, keep only the top-K by fitness.
    pub fn drain_queue(&mut self) {
        for record in self.queue.drain(..) {
            let bucket = self.entries.entry(record.genome.id).or_default();
            bucket.push(record);
            bucket.sort_by(|a, b| {
                b.fitness
                    .partial_cmp(&a.fitness)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            bucket.truncate(self.per_id_capacity);
        }
    }

}

impl GenePoolStore for InMemoryGenePool {
    fn queue_save_agent(&mut self, genome: Genome, fitness: f32, meta: GenomeMeta) {
        debug!(genome_id = genome.id, fitness, "queueing genome for pool admission");
        self.queue.push(PoolRecord {
            genome,
            fitness,
            meta,
        });
    }

    fn get_random_agent(&mut self) -> Option<Genome> {
        let total: usize = self.entries.values().map(Vec::len).sum();
        if total == 0 {
            return None;
        }
        let mut pick = self.rng.gen_range(0..total);
        for bucket in self.entries.values() {
            if pick < bucket.len() {
                return Some(bucket[pick].genome.clone());
            }
            pick -= bucket.len();
        }
        None
    }

    fn get_mating_pair(&mut self) -> Option<(Genome, Genome)> {
        // Pairs must share a specialization to be weight-compatible.
        let mut by_spec: HashMap<Specialization, Vec<&PoolRecord>> = HashMap::new();
        for record in self.entries.values().flatten() {
            by_spec.entry(record.genome.specialization).or_default().push(record);
        }

        let eligible: Vec<&Vec<&PoolRecord>> =
            by_spec.values().filter(|v| v.len() >= 2).collect();
        let group = eligible.choose(&mut self.rng)?;

        let mut picks = (*group).clone();
        picks.shuffle(&mut self.rng);
        Some((picks[0].genome.clone(), picks[1].genome.clone()))
    }
}
