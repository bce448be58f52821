use glam::Vec2;
use rand::Rng;
use tracing::debug;

use crate::agent::{Agent, ReproState};
use crate::config::{self, FitnessWeights, MutationTuning, QualificationThresholds};
use crate::fitness;
use crate::genepool::{GenePoolStore, GenomeMeta};
use crate::genome::{Genome, MutationStyle};
use crate::physics::TempBand;
use crate::world::World;

/// A birth event collected during a lifecycle pass and spawned afterwards,
/// once no agent borrows are outstanding.
#[derive(Clone, Debug)]
pub struct Birth {
    pub genome: Genome,
    pub pos: Vec2,
    pub energy: f32,
    pub parent_ids: [Option<u64>; 2],
    pub generation: u32,
}

/// Attempt to start a pregnancy. Refusal for any reason is a plain `false`;
/// on success the initiator is pregnant, has paid the mating cost, and holds
/// a copy of the mate's genome for the eventual crossover.
pub fn try_mate(
    initiator: &mut Agent,
    mate: &Agent,
    mate_genome: &Genome,
    desire: f32,
    band: TempBand,
    frame: u64,
) -> bool {
    if !initiator.alive || !mate.alive {
        return false;
    }
    if initiator.specialization != mate.specialization {
        return false;
    }
    if !initiator.matured(frame) || !mate.matured(frame) {
        return false;
    }
    if initiator.is_pregnant() || mate.is_pregnant() {
        return false;
    }
    if initiator.on_cooldown(frame) || mate.on_cooldown(frame) {
        return false;
    }
    if initiator.energy < config::MATING_MIN_ENERGY || mate.energy < config::MATING_MIN_ENERGY {
        return false;
    }
    if initiator.pos.distance(mate.pos) > config::MATING_RANGE {
        return false;
    }
    // Hostile climates suppress reproduction before any pairing happens.
    if desire * band.reproduction_mult() < config::MATING_DESIRE_THRESHOLD {
        return false;
    }
    // Selectivity: the mate must carry at least half the initiator's score.
    let own_score = fitness::sanitize(initiator.fitness);
    if fitness::sanitize(mate.fitness) < own_score * 0.5 {
        return false;
    }

    initiator.energy -= config::MATING_ENERGY_COST;
    initiator.refresh_size();
    initiator.cooldown_until = frame + config::REPRODUCTION_COOLDOWN_FRAMES;
    initiator.repro_state = ReproState::Pregnant {
        since_frame: frame,
        mate_genome: Box::new(mate_genome.clone()),
    };
    debug!(
        initiator = initiator.genome_id,
        mate = mate.genome_id,
        frame,
        "pregnancy started"
    );
    true
}

/// Resolve a due pregnancy into a birth. Returns `None` while the term has
/// not elapsed (or the agent is not pregnant at all).
pub fn resolve_pregnancy(
    agent: &mut Agent,
    own_genome: &Genome,
    child_id: u64,
    tuning: &MutationTuning,
    style: MutationStyle,
    rate: f32,
    rng: &mut impl Rng,
    frame: u64,
) -> Option<Birth> {
    let due = match &agent.repro_state {
        ReproState::Pregnant { since_frame, .. } => {
            frame.saturating_sub(*since_frame) >= config::PREGNANCY_FRAMES
        }
        ReproState::Idle => false,
    };
    if !due {
        return None;
    }

    let mate_genome = match std::mem::take(&mut agent.repro_state) {
        ReproState::Pregnant { mate_genome, .. } => *mate_genome,
        ReproState::Idle => return None,
    };

    // Rarely the child re-specializes; fresh weights, since the parents'
    // matrices no longer fit the new architecture.
    let genome = if rng.gen::<f32>() < config::RESPEC_PROBABILITY {
        Genome::random(child_id, crate::genome::Specialization::random(rng), rng)
    } else {
        match Genome::crossover(own_genome, &mate_genome, child_id, rng) {
            Some(crossed) => crossed.mutated(tuning, style, rate, rng),
            // Shapes only diverge if a stored genome was corrupted; start over.
            None => Genome::random(child_id, own_genome.specialization, rng),
        }
    };

    agent.record_offspring(genome.id);
    agent.cooldown_until = frame + config::REPRODUCTION_COOLDOWN_FRAMES;

    Some(Birth {
        genome,
        pos: agent.pos,
        energy: config::INITIAL_ENERGY,
        parent_ids: [Some(own_genome.id), Some(mate_genome.id)],
        generation: agent.generation + 1,
    })
}

/// Asexual split: an energy-rich agent off cooldown halves its energy with a
/// mutated clone. The clone keeps the parent's genome id.
pub fn try_split(
    agent: &mut Agent,
    own_genome: &Genome,
    tuning: &MutationTuning,
    style: MutationStyle,
    rate: f32,
    rng: &mut impl Rng,
    frame: u64,
) -> Option<Birth> {
    if agent.is_pregnant()
        || agent.on_cooldown(frame)
        || agent.energy <= config::SPLIT_ENERGY_FRACTION * config::MAX_ENERGY
    {
        return None;
    }

    agent.energy *= 0.5;
    agent.refresh_size();
    agent.cooldown_until = frame + config::REPRODUCTION_COOLDOWN_FRAMES;

    let genome = own_genome.mutated(tuning, style, rate, rng);
    agent.record_offspring(genome.id);

    Some(Birth {
        genome,
        pos: agent.pos,
        energy: agent.energy,
        parent_ids: [Some(own_genome.id), None],
        generation: agent.generation + 1,
    })
}

/// Final accounting for an agent that has just died. Computes closing
/// fitness, checks gene-pool qualification, and queues any submission.
/// Calling this twice is a no-op the second time.
pub fn handle_death(
    agent: &mut Agent,
    genome: &Genome,
    weights: &FitnessWeights,
    thresholds: &QualificationThresholds,
    pool: &mut dyn GenePoolStore,
    world: &World,
    frame: u64,
) {
    if agent.cleaned_up {
        return;
    }
    agent.alive = false;
    agent.cleaned_up = true;

    agent.fitness = fitness::compute_fitness(agent, weights, world.width, world.height, frame);
    agent.qualifies = fitness::qualifies(agent, thresholds, world.width, world.height, frame);

    if agent.qualifies {
        pool.queue_save_agent(
            genome.clone(),
            agent.fitness,
            GenomeMeta {
                generation: agent.generation,
                food_eaten: agent.stats.food_eaten,
                kills: agent.stats.kills,
                age_frames: agent.age(frame),
            },
        );
    }
    debug!(
        genome_id = agent.genome_id,
        fitness = agent.fitness,
        qualifies = agent.qualifies,
        frame,
        "agent died"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genepool::InMemoryGenePool;
    use crate::genome::Specialization;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tuning() -> MutationTuning {
        MutationTuning::default()
    }

    fn pair(spec_a: Specialization, spec_b: Specialization) -> (Agent, Genome, Agent, Genome) {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let ga = Genome::random(1, spec_a, &mut rng);
        let gb = Genome::random(2, spec_b, &mut rng);
        let mut a = Agent::from_genome(&ga, Vec2::new(100.0, 100.0), 0);
        let mut b = Agent::from_genome(&gb, Vec2::new(110.0, 100.0), 0);
        a.energy = config::MATING_MIN_ENERGY + 20.0;
        b.energy = config::MATING_MIN_ENERGY + 20.0;
        a.fitness = 10.0;
        b.fitness = 10.0;
        (a, ga, b, gb)
    }

    #[test]
    fn cross_specialization_mating_is_refused() {
        let (mut a, _ga, b, gb) = pair(Specialization::Forager, Specialization::Hunter);
        let frame = config::MATURITY_FRAMES + 1;
        assert!(!try_mate(&mut a, &b, &gb, 1.0, TempBand::Optimal, frame));
        assert!(!a.is_pregnant());
        assert!((a.energy - (config::MATING_MIN_ENERGY + 20.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn successful_mating_costs_energy_and_sets_pregnancy() {
        let (mut a, _ga, b, gb) = pair(Specialization::Forager, Specialization::Forager);
        let frame = config::MATURITY_FRAMES + 1;
        let before = a.energy;
        assert!(try_mate(&mut a, &b, &gb, 1.0, TempBand::Optimal, frame));
        assert!(a.is_pregnant());
        assert!(a.energy < before);
        assert!(a.on_cooldown(frame + 1));
    }

    #[test]
    fn severe_cold_suppresses_mating() {
        let (mut a, _ga, b, gb) = pair(Specialization::Forager, Specialization::Forager);
        let frame = config::MATURITY_FRAMES + 1;
        assert!(!try_mate(&mut a, &b, &gb, 1.0, TempBand::ColdSevere, frame));
    }

    #[test]
    fn low_scoring_mate_is_rejected() {
        let (mut a, _ga, mut b, gb) = pair(Specialization::Forager, Specialization::Forager);
        a.fitness = 100.0;
        b.fitness = 10.0;
        let frame = config::MATURITY_FRAMES + 1;
        assert!(!try_mate(&mut a, &b, &gb, 1.0, TempBand::Optimal, frame));
        b.fitness = 60.0;
        assert!(try_mate(&mut a, &b, &gb, 1.0, TempBand::Optimal, frame));
    }

    #[test]
    fn pregnancy_resolves_only_after_term() {
        let (mut a, ga, b, gb) = pair(Specialization::Forager, Specialization::Forager);
        let start = config::MATURITY_FRAMES + 1;
        assert!(try_mate(&mut a, &b, &gb, 1.0, TempBand::Optimal, start));

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let early = resolve_pregnancy(
            &mut a, &ga, 99, &tuning(), MutationStyle::Gaussian, 0.05, &mut rng, start + 10,
        );
        assert!(early.is_none());
        assert!(a.is_pregnant());

        let due = start + config::PREGNANCY_FRAMES;
        let birth = resolve_pregnancy(
            &mut a, &ga, 99, &tuning(), MutationStyle::Gaussian, 0.05, &mut rng, due,
        )
        .unwrap();
        assert!(!a.is_pregnant());
        assert_eq!(birth.parent_ids, [Some(1), Some(2)]);
        assert_eq!(birth.generation, 1);
        assert!(a.offspring_ids.contains(&birth.genome.id));
    }

    #[test]
    fn split_halves_energy_and_keeps_genome_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let genome = Genome::random(7, Specialization::Drifter, &mut rng);
        let mut agent = Agent::from_genome(&genome, Vec2::new(50.0, 50.0), 0);
        agent.energy = config::MAX_ENERGY * 0.95;
        let before = agent.energy;

        let frame = config::MATURITY_FRAMES + 1;
        let birth = try_split(
            &mut agent, &genome, &tuning(), MutationStyle::Gaussian, 0.05, &mut rng, frame,
        )
        .unwrap();

        assert!((agent.energy - before * 0.5).abs() < 1e-4);
        assert!((birth.energy - agent.energy).abs() < 1e-4);
        assert_eq!(birth.genome.id, 7);
        assert!(try_split(
            &mut agent, &genome, &tuning(), MutationStyle::Gaussian, 0.05, &mut rng, frame,
        )
        .is_none());
    }

    #[test]
    fn split_needs_no_maturity() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let genome = Genome::random(4, Specialization::Forager, &mut rng);
        let mut agent = Agent::from_genome(&genome, Vec2::new(50.0, 50.0), 0);
        agent.energy = config::MAX_ENERGY * 0.95;

        // Well before MATURITY_FRAMES; only energy and cooldown gate splits.
        let birth = try_split(
            &mut agent, &genome, &tuning(), MutationStyle::Gaussian, 0.05, &mut rng, 1,
        );
        assert!(birth.is_some());
        assert_eq!(birth.unwrap().genome.id, 4);
    }

    #[test]
    fn death_cleanup_is_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let genome = Genome::random(3, Specialization::Forager, &mut rng);
        let mut agent = Agent::from_genome(&genome, Vec2::new(10.0, 10.0), 0);
        agent.energy = 0.0;

        let world = World::new(config::WORLD_WIDTH, config::WORLD_HEIGHT);
        let mut pool = InMemoryGenePool::new(4, 1);
        let weights = FitnessWeights::default();
        let thresholds = QualificationThresholds::default();

        handle_death(&mut agent, &genome, &weights, &thresholds, &mut pool, &world, 100);
        assert!(!agent.alive);
        assert!(agent.cleaned_up);
        let queued = pool.queued();

        handle_death(&mut agent, &genome, &weights, &thresholds, &mut pool, &world, 100);
        assert_eq!(pool.queued(), queued);
    }
}
