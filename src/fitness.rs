use crate::agent::Agent;
use crate::config::{self, FitnessWeights, QualificationThresholds};
use crate::physics::TempBand;

/// Non-finite counters must never reach the summation.
#[inline]
pub fn sanitize(x: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Multi-term fitness score, always >= 0. Recomputed periodically rather
/// than every frame; the caller owns the cadence.
pub fn compute_fitness(
    agent: &Agent,
    weights: &FitnessWeights,
    world_w: f32,
    world_h: f32,
    frame: u64,
) -> f32 {
    let age_frames = agent.age(frame).max(1) as f32;
    let age_secs = age_frames * config::FIXED_DT;
    let distance = sanitize(agent.stats.distance_travelled).max(0.0);
    let energy_spent = sanitize(agent.stats.energy_spent).max(0.0);
    let food = sanitize(agent.stats.food_eaten as f32);
    let kills = sanitize(agent.stats.kills as f32);
    let offspring = sanitize(agent.stats.offspring as f32);
    let exploration = sanitize(agent.exploration_fraction(world_w, world_h));

    let mut score = 0.0f32;

    // Moving while thermally efficient is rewarded; activity in a severe
    // band costs instead.
    let band = TempBand::for_temperature(sanitize(agent.temperature));
    let activity = sanitize(distance / (age_secs * config::MAX_SPEED)).clamp(0.0, 1.0);
    score += weights.temperature_activity * (band.movement_efficiency() - 0.75) * activity;

    score += weights.reproduction * offspring;
    score += weights.clever_turns * sanitize(agent.stats.direction_changes as f32).min(200.0);
    score += weights.variation * sanitize(agent.stats.speed_variation / (distance + 1.0));
    score += weights.exploration * exploration;
    score += weights.food * food;
    score += weights.kills * kills;

    let nav_turns = sanitize(
        (agent.stats.turns_toward_food + agent.stats.turns_away_from_obstacle) as f32,
    );
    score += weights.navigation * nav_turns / (1.0 + distance * 0.01);

    // Agents that both reproduce and eat get a synergy bonus.
    if offspring > 0.0 && food > 0.0 {
        score += weights.synergy * offspring.min(food);
    }

    score += weights.efficiency * sanitize(distance / (1.0 + energy_spent));

    // Sustained same-direction turning reads as circling.
    let circling = sanitize(agent.stats.circling_accum.abs() / age_secs).min(1.0);
    score -= weights.circling_penalty * circling;

    score -= weights.obstacle_collision_penalty * sanitize(agent.stats.obstacle_collisions as f32);
    score -= weights.wall_collision_penalty * sanitize(agent.stats.wall_collisions as f32);

    if agent.stats.frames_since_collision > 1800 {
        score += weights.collision_free_bonus;
    }

    // Long-lived agents that have accomplished nothing lose ground.
    let achievement = food + kills + offspring + exploration * 10.0;
    if age_frames > 2.0 * config::MATURITY_FRAMES as f32 && achievement < 1.0 {
        score -= weights.inactivity_penalty;
    }

    // Additive, capped survival bonus. The earlier multiplicative form
    // rewarded passive longevity and is intentionally gone.
    score += (age_frames * weights.survival_bonus_per_frame).min(weights.survival_bonus_cap);

    sanitize(score).max(0.0)
}

/// Gene-pool qualification: every minimum, or four of the five plus an
/// exceptional fitness bound.
pub fn qualifies(
    agent: &Agent,
    thresholds: &QualificationThresholds,
    world_w: f32,
    world_h: f32,
    frame: u64,
) -> bool {
    let fitness = sanitize(agent.fitness);
    let checks = [
        fitness >= thresholds.min_fitness,
        agent.stats.food_eaten >= thresholds.min_food_eaten,
        agent.age(frame) >= thresholds.min_age_frames,
        sanitize(agent.exploration_fraction(world_w, world_h)) >= thresholds.min_exploration,
        agent.stats.turns_toward_food >= thresholds.min_turns_toward_food,
    ];
    let passed = checks.iter().filter(|&&c| c).count();

    passed == checks.len()
        || (passed >= checks.len() - 1 && fitness >= thresholds.exceptional_fitness)
}
