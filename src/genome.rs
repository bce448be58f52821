use rand::Rng;
use rand_distr::{Cauchy, Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::config::{self, MutationTuning};

/// Fixed controller output width: thrust, rotation, sprint, mate, attack.
pub const OUTPUT_SIZE: usize = 5;

/// Standard deviation for fresh weight initialization.
const INIT_SIGMA: f32 = 0.3;

/// Behavioral role. Each role has its own sensor and hidden-layer sizing, so
/// genomes of different specializations are never weight-compatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Specialization {
    Forager,
    Hunter,
    Drifter,
}

/// Architecture parameters derived from a specialization tag.
#[derive(Clone, Copy, Debug)]
pub struct SpecProfile {
    pub sensor_rays: usize,
    pub alignment_rays: usize,
    pub hidden_size: usize,
    pub max_ray_dist: f32,
}

impl Specialization {
    pub const ALL: [Specialization; 3] =
        [Specialization::Forager, Specialization::Hunter, Specialization::Drifter];

    /// The controller shape is a pure function of the tag.
    pub fn profile(&self) -> SpecProfile {
        match self {
            Specialization::Forager => SpecProfile {
                sensor_rays: 12,
                alignment_rays: 4,
                hidden_size: 18,
                max_ray_dist: 160.0,
            },
            Specialization::Hunter => SpecProfile {
                sensor_rays: 16,
                alignment_rays: 4,
                hidden_size: 22,
                max_ray_dist: 220.0,
            },
            Specialization::Drifter => SpecProfile {
                sensor_rays: 8,
                alignment_rays: 2,
                hidden_size: 14,
                max_ray_dist: 130.0,
            },
        }
    }

    /// Controller input width: 5 channels per sensor ray (distance + 4-way
    /// hit one-hot), one channel per alignment ray, plus the scalar block.
    pub fn input_len(&self) -> usize {
        let p = self.profile();
        p.sensor_rays * 5 + p.alignment_rays + config::SCALAR_INPUT_COUNT
    }

    pub fn random(rng: &mut impl Rng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Noise distribution used for a mutation pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStyle {
    Gaussian,
    Cauchy,
    Polynomial,
}

/// Controller weights plus the specialization that fixes their shapes. This
/// is the durable artifact handed to the gene-pool store; its serialized
/// shape must stay stable per specialization.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genome {
    pub id: u64,
    pub specialization: Specialization,
    /// (input + hidden) x hidden, row-major by source index.
    pub w1: Vec<Vec<f32>>,
    /// hidden x OUTPUT_SIZE.
    pub w2: Vec<Vec<f32>>,
}

impl Genome {
    pub fn random(id: u64, specialization: Specialization, rng: &mut impl Rng) -> Self {
        let profile = specialization.profile();
        let input_len = specialization.input_len();
        let normal = Normal::new(0.0_f32, INIT_SIGMA).expect("constant sigma is finite");
        let row = |rng: &mut dyn rand::RngCore, cols: usize| -> Vec<f32> {
            (0..cols).map(|_| normal.sample(rng)).collect()
        };
        let w1 = (0..input_len + profile.hidden_size)
            .map(|_| row(rng, profile.hidden_size))
            .collect();
        let w2 = (0..profile.hidden_size).map(|_| row(rng, OUTPUT_SIZE)).collect();
        Self {
            id,
            specialization,
            w1,
            w2,
        }
    }

    /// Whether both matrices match the shapes the specialization demands.
    pub fn shape_matches(&self) -> bool {
        let profile = self.specialization.profile();
        let input_len = self.specialization.input_len();
        self.w1.len() == input_len + profile.hidden_size
            && self.w1.iter().all(|r| r.len() == profile.hidden_size)
            && self.w2.len() == profile.hidden_size
            && self.w2.iter().all(|r| r.len() == OUTPUT_SIZE)
    }

    /// Mutation rate adapted from a fitness percentile (0 = worst, 1 = best),
    /// blended with the population base rate.
    pub fn adaptive_rate(tuning: &MutationTuning, percentile: f32) -> f32 {
        let p = percentile.clamp(0.0, 1.0);
        let adapted = tuning.explore_rate + (tuning.exploit_rate - tuning.explore_rate) * p;
        tuning.base_rate * (1.0 - tuning.adaptive_blend) + adapted * tuning.adaptive_blend
    }

    /// Return a mutated copy. The genome id is preserved; lineage identity
    /// survives asexual reproduction.
    pub fn mutated(
        &self,
        tuning: &MutationTuning,
        style: MutationStyle,
        rate: f32,
        rng: &mut impl Rng,
    ) -> Self {
        let mut child = self.clone();
        child.mutate_in_place(tuning, style, rate, rng);
        child
    }

    fn mutate_in_place(
        &mut self,
        tuning: &MutationTuning,
        style: MutationStyle,
        rate: f32,
        rng: &mut impl Rng,
    ) {
        let sigma = tuning.gaussian_sigma.abs().max(f32::EPSILON);
        let scale = tuning.cauchy_scale.abs().max(f32::EPSILON);
        let gaussian = Normal::new(0.0_f32, sigma).expect("sigma forced positive finite");
        let cauchy = Cauchy::new(0.0_f32, scale).expect("scale forced positive finite");
        let clamp = tuning.weight_clamp;

        let perturb = |w: &mut f32, rng: &mut dyn rand::RngCore| {
            let noise = match style {
                MutationStyle::Gaussian => gaussian.sample(rng),
                MutationStyle::Cauchy => cauchy.sample(rng),
                MutationStyle::Polynomial => {
                    polynomial_delta(rng.gen::<f32>(), tuning.polynomial_eta) * clamp
                }
            };
            *w += noise * rate;
            if rng.gen::<f32>() < tuning.macro_probability {
                *w += (rng.gen::<f32>() * 2.0 - 1.0) * tuning.macro_magnitude;
            }
            *w = w.clamp(-clamp, clamp);
        };

        for row in self.w1.iter_mut().chain(self.w2.iter_mut()) {
            for w in row.iter_mut() {
                perturb(w, rng);
            }
        }
    }

    /// Single-point row-wise recombination, independently per matrix. Returns
    /// `None` when the parents' specializations (and therefore shapes) differ.
    pub fn crossover(a: &Genome, b: &Genome, child_id: u64, rng: &mut impl Rng) -> Option<Genome> {
        if a.specialization != b.specialization || !a.shape_matches() || !b.shape_matches() {
            return None;
        }
        let w1 = cross_rows(&a.w1, &b.w1, rng);
        let w2 = cross_rows(&a.w2, &b.w2, rng);
        Some(Genome {
            id: child_id,
            specialization: a.specialization,
            w1,
            w2,
        })
    }
}

fn cross_rows(a: &[Vec<f32>], b: &[Vec<f32>], rng: &mut impl Rng) -> Vec<Vec<f32>> {
    let split = rng.gen_range(0..=a.len());
    a.iter()
        .take(split)
        .chain(b.iter().skip(split))
        .cloned()
        .collect()
}

/// Bounded polynomial perturbation in [-1, 1] from a uniform sample.
fn polynomial_delta(u: f32, eta: f32) -> f32 {
    let exponent = 1.0 / (eta + 1.0);
    if u < 0.5 {
        (2.0 * u).powf(exponent) - 1.0
    } else {
        1.0 - (2.0 * (1.0 - u)).powf(exponent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn random_genomes_match_their_declared_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for spec in Specialization::ALL {
            let g = Genome::random(1, spec, &mut rng);
            assert!(g.shape_matches(), "{spec:?}");
        }
    }

    #[test]
    fn mutation_never_escapes_weight_clamp() {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let tuning = MutationTuning::default();
        let base = Genome::random(1, Specialization::Hunter, &mut rng);

        for style in [MutationStyle::Gaussian, MutationStyle::Cauchy, MutationStyle::Polynomial] {
            let child = base.mutated(&tuning, style, 5.0, &mut rng);
            for row in child.w1.iter().chain(child.w2.iter()) {
                for &w in row {
                    assert!(w.abs() <= tuning.weight_clamp, "{style:?} produced {w}");
                }
            }
        }
    }

    #[test]
    fn mutation_preserves_genome_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let base = Genome::random(99, Specialization::Forager, &mut rng);
        let child = base.mutated(&MutationTuning::default(), MutationStyle::Gaussian, 0.1, &mut rng);
        assert_eq!(child.id, 99);
    }

    #[test]
    fn crossover_rows_come_from_one_parent_or_the_other() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = Genome::random(1, Specialization::Drifter, &mut rng);
        let b = Genome::random(2, Specialization::Drifter, &mut rng);
        let child = Genome::crossover(&a, &b, 3, &mut rng).unwrap();

        assert!(child.shape_matches());
        for (i, row) in child.w1.iter().enumerate() {
            assert!(row == &a.w1[i] || row == &b.w1[i], "w1 row {i} is a blend");
        }
        for (i, row) in child.w2.iter().enumerate() {
            assert!(row == &a.w2[i] || row == &b.w2[i], "w2 row {i} is a blend");
        }
    }

    #[test]
    fn crossover_refuses_mismatched_specializations() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let a = Genome::random(1, Specialization::Forager, &mut rng);
        let b = Genome::random(2, Specialization::Hunter, &mut rng);
        assert!(Genome::crossover(&a, &b, 3, &mut rng).is_none());
    }

    #[test]
    fn adaptive_rate_explores_at_low_percentile() {
        let tuning = MutationTuning::default();
        let low = Genome::adaptive_rate(&tuning, 0.0);
        let high = Genome::adaptive_rate(&tuning, 1.0);
        assert!(low > high);
    }

    #[test]
    fn serialized_record_shape_is_stable_per_specialization() {
        let mut rng = ChaCha8Rng::seed_from_u64(29);
        let g = Genome::random(4, Specialization::Hunter, &mut rng);
        let bytes = bincode::serialize(&g).unwrap();
        let back: Genome = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back.id, g.id);
        assert_eq!(back.specialization, g.specialization);
        assert!(back.shape_matches());
    }
}
