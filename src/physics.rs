use glam::Vec2;

use crate::agent::Agent;
use crate::brain::ActionVector;
use crate::config;
use crate::environment::Season;
use crate::world::{Obstacle, World};

/// Temperature efficiency is a step function over five bands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TempBand {
    ColdSevere,
    ColdModerate,
    Optimal,
    HeatModerate,
    HeatSevere,
}

impl TempBand {
    pub fn for_temperature(t: f32) -> Self {
        if t < 0.15 {
            TempBand::ColdSevere
        } else if t < 0.35 {
            TempBand::ColdModerate
        } else if t <= 0.65 {
            TempBand::Optimal
        } else if t <= 0.85 {
            TempBand::HeatModerate
        } else {
            TempBand::HeatSevere
        }
    }

    pub fn movement_efficiency(&self) -> f32 {
        match self {
            TempBand::ColdSevere => 0.55,
            TempBand::ColdModerate => 0.8,
            TempBand::Optimal => 1.0,
            TempBand::HeatModerate => 0.85,
            TempBand::HeatSevere => 0.6,
        }
    }

    pub fn reproduction_mult(&self) -> f32 {
        match self {
            TempBand::ColdSevere => 0.0,
            TempBand::ColdModerate => 0.5,
            TempBand::Optimal => 1.0,
            TempBand::HeatModerate => 0.6,
            TempBand::HeatSevere => 0.1,
        }
    }
}

/// What happened to an agent during collision resolution this frame; the
/// orchestrator turns these into visual-effect events.
#[derive(Clone, Copy, Debug, Default)]
pub struct CollisionReport {
    pub hit_wall: bool,
    pub hit_obstacle: bool,
}

/// Map the raw action vector onto the agent's smoothed control state.
pub fn apply_action(agent: &mut Agent, action: &ActionVector, dt: f32) {
    // Thrust to [-1, 1] with a deadzone, scaled by the heritable factor.
    let mut thrust_target = action.thrust * 2.0 - 1.0;
    if thrust_target.abs() < config::THRUST_DEADZONE {
        thrust_target = 0.0;
    }
    thrust_target *= agent.max_thrust_factor;

    // Asymmetric smoothing: braking and danger respond faster than winding up.
    let braking = thrust_target.abs() < agent.current_thrust.abs()
        || thrust_target * agent.current_thrust < 0.0;
    let in_danger = agent.fear > config::DANGER_FEAR_THRESHOLD;
    let rate = if braking || in_danger {
        config::THRUST_DECEL_RATE
    } else {
        config::THRUST_ACCEL_RATE
    };
    agent.current_thrust += (thrust_target - agent.current_thrust) * (rate * dt).min(1.0);

    // Rotation with momentum; turning authority shrinks as speed approaches max.
    let rotation_target = action.rotation * 2.0 - 1.0;
    let previous_rotation = agent.current_rotation;
    agent.current_rotation = agent.current_rotation * config::ROTATION_MOMENTUM
        + rotation_target * (1.0 - config::ROTATION_MOMENTUM);

    let speed_ratio = (agent.velocity.length() / config::MAX_SPEED).clamp(0.0, 1.0);
    let authority = 1.0 - 0.6 * speed_ratio;
    agent.heading += agent.current_rotation * config::ROTATION_RATE * authority * dt;
    agent.heading = agent.heading.rem_euclid(std::f32::consts::TAU);

    // Reactive direction changes and sustained circling feed the fitness terms.
    if previous_rotation * agent.current_rotation < 0.0 && agent.current_rotation.abs() > 0.2 {
        agent.stats.direction_changes += 1;
    }
    agent.stats.circling_accum += agent.current_rotation * dt;

    // Sprint as a continuous intensity above the threshold.
    agent.sprint_intensity = if action.sprint > config::SPRINT_THRESHOLD {
        (action.sprint - config::SPRINT_THRESHOLD) / (1.0 - config::SPRINT_THRESHOLD)
    } else {
        0.0
    };
}

/// Integrate velocity and position: thrust along heading, drag, speed clamp.
pub fn integrate(agent: &mut Agent, season: Season, world: &World, dt: f32) -> CollisionReport {
    let band = TempBand::for_temperature(agent.temperature);
    let efficiency = band.movement_efficiency();

    let dir = Vec2::from_angle(agent.heading);
    agent.velocity += dir * agent.current_thrust * config::THRUST_POWER * efficiency * dt;

    // Stronger braking friction than cruising dampening.
    let braking = agent.current_thrust.abs() < config::THRUST_DEADZONE;
    let drag = if braking {
        config::DRAG_BRAKING
    } else {
        config::DRAG_NORMAL
    };
    agent.velocity *= (1.0 - drag * dt).max(0.0);

    let mut max_speed = config::MAX_SPEED * efficiency;
    max_speed *= 1.0 + (config::SPRINT_SPEED_MULT - 1.0) * agent.sprint_intensity;
    if agent.fear > agent.aggression {
        max_speed *= config::FEAR_SPEED_BONUS;
    }
    let speed = agent.velocity.length();
    if speed > max_speed {
        agent.velocity *= max_speed / speed;
    }

    agent.prev_pos = agent.pos;
    agent.pos += agent.velocity * dt;

    let step = agent.pos.distance(agent.prev_pos);
    agent.stats.distance_travelled += step;
    agent.stats.speed_variation += (speed - agent.mem_speed * config::MAX_SPEED).abs() * dt;
    agent.stats.frames_since_collision += 1;

    let mut report = CollisionReport::default();
    resolve_wall_collision(agent, world, &mut report);

    // Temperature rises with movement intensity and bleeds off with the season.
    let activity = (speed / config::MAX_SPEED).clamp(0.0, 1.0) + agent.sprint_intensity;
    agent.temperature += config::TEMP_RISE_RATE * activity * dt;
    agent.temperature -= config::TEMP_FALL_RATE * season.temperature_decay_mult() * dt;
    agent.temperature = agent.temperature.clamp(0.0, 1.0);

    report
}

fn resolve_wall_collision(agent: &mut Agent, world: &World, report: &mut CollisionReport) {
    let mut bounced = false;
    if agent.pos.x < 0.0 || agent.pos.x > world.width {
        agent.velocity.x = -agent.velocity.x * config::WALL_BOUNCE_DAMPING;
        bounced = true;
    }
    if agent.pos.y < 0.0 || agent.pos.y > world.height {
        agent.velocity.y = -agent.velocity.y * config::WALL_BOUNCE_DAMPING;
        bounced = true;
    }
    if bounced {
        agent.pos = world.clamp(agent.pos);
        agent.energy -= config::WALL_COLLISION_ENERGY_COST;
        agent.stats.wall_collisions += 1;
        agent.stats.frames_since_collision = 0;
        report.hit_wall = true;
    }
}

/// Elastic-style reflection off obstacles plus penetration separation; the
/// obstacle takes a small reactive nudge.
pub fn resolve_obstacle_collisions(
    agent: &mut Agent,
    obstacles: &mut [Obstacle],
    candidates: &[u32],
    report: &mut CollisionReport,
) {
    for &i in candidates {
        let Some(obstacle) = obstacles.get_mut(i as usize) else {
            continue;
        };
        let delta = agent.pos - obstacle.pos;
        let min_dist = agent.size + obstacle.radius;
        let dist_sq = delta.length_squared();
        if dist_sq >= min_dist * min_dist || dist_sq < 1e-6 {
            continue;
        }

        let dist = dist_sq.sqrt();
        let normal = delta / dist;
        let overlap = min_dist - dist;

        // Separate along the penetration normal to prevent sustained overlap.
        agent.pos += normal * overlap;

        let vn = agent.velocity.dot(normal);
        if vn < 0.0 {
            agent.velocity -= normal * vn * (1.0 + config::BODY_BOUNCE_DAMPING);
        }
        obstacle.velocity -= normal * config::OBSTACLE_NUDGE;

        agent.stats.obstacle_collisions += 1;
        agent.stats.frames_since_collision = 0;
        report.hit_obstacle = true;
    }
}

/// Push two overlapping agents apart and damp their closing velocity.
pub fn resolve_agent_pair(a: &mut Agent, b: &mut Agent) {
    let delta = a.pos - b.pos;
    let min_dist = a.size + b.size;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist || dist_sq < 1e-6 {
        return;
    }

    let dist = dist_sq.sqrt();
    let normal = delta / dist;
    let push = normal * ((min_dist - dist) * 0.5);
    a.pos += push;
    b.pos -= push;

    let relative = a.velocity - b.velocity;
    let vn = relative.dot(normal);
    if vn < 0.0 {
        let impulse = normal * vn * (0.5 * (1.0 + config::BODY_BOUNCE_DAMPING));
        a.velocity -= impulse;
        b.velocity += impulse;
    }
}

/// Per-frame energy accounting. Death (energy <= 0) is observed by the
/// lifecycle pass, not here.
pub fn account_energy(agent: &mut Agent, dt: f32) {
    let band = TempBand::for_temperature(agent.temperature);
    let size_factor = agent.size / config::MIN_AGENT_SIZE;
    let mut passive = config::PASSIVE_LOSS_RATE * size_factor / band.movement_efficiency();

    let speed = agent.velocity.length();
    let resting =
        speed < config::RESTING_SPEED && agent.current_thrust.abs() < config::THRUST_DEADZONE;
    if resting {
        passive *= config::RESTING_LOSS_FACTOR;
    }

    let movement = (config::MOVEMENT_LOSS_RATE * speed * speed).min(config::MOVEMENT_LOSS_CAP);
    let rotation = config::ROTATION_LOSS_RATE * agent.current_rotation.abs();
    let sprint = config::SPRINT_LOSS_RATE * agent.sprint_intensity;

    let mut loss = (passive + movement + rotation + sprint) * dt;

    let obesity_line = config::OBESITY_THRESHOLD * config::MAX_ENERGY;
    if agent.energy > obesity_line {
        loss += (agent.energy - obesity_line) * config::OBESITY_TAX_RATE * dt;
    }

    if !agent.energy.is_finite() {
        tracing::error!(genome_id = agent.genome_id, "non-finite energy; resetting to zero");
        agent.energy = 0.0;
    }
    agent.energy = (agent.energy - loss).min(config::MAX_ENERGY);
    agent.stats.energy_spent += loss;
    agent.refresh_size();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{Genome, Specialization};
    use glam::vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_agent(pos: Vec2) -> Agent {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let genome = Genome::random(1, Specialization::Forager, &mut rng);
        Agent::from_genome(&genome, pos, 0)
    }

    #[test]
    fn temperature_bands_step_as_expected() {
        assert_eq!(TempBand::for_temperature(0.05), TempBand::ColdSevere);
        assert_eq!(TempBand::for_temperature(0.25), TempBand::ColdModerate);
        assert_eq!(TempBand::for_temperature(0.5), TempBand::Optimal);
        assert_eq!(TempBand::for_temperature(0.75), TempBand::HeatModerate);
        assert_eq!(TempBand::for_temperature(0.95), TempBand::HeatSevere);
        assert_eq!(TempBand::Optimal.movement_efficiency(), 1.0);
        assert_eq!(TempBand::ColdSevere.reproduction_mult(), 0.0);
    }

    #[test]
    fn thrust_deadzone_zeroes_small_commands() {
        let mut agent = test_agent(vec2(100.0, 100.0));
        let action = ActionVector {
            thrust: 0.52, // maps to 0.04, inside the deadzone
            ..Default::default()
        };
        for _ in 0..60 {
            apply_action(&mut agent, &action, config::FIXED_DT);
        }
        assert!(agent.current_thrust.abs() < 1e-3);
    }

    #[test]
    fn sprint_intensity_is_continuous_above_threshold() {
        let mut agent = test_agent(vec2(0.0, 0.0));
        apply_action(
            &mut agent,
            &ActionVector { sprint: config::SPRINT_THRESHOLD - 0.05, ..Default::default() },
            config::FIXED_DT,
        );
        assert_eq!(agent.sprint_intensity, 0.0);

        apply_action(
            &mut agent,
            &ActionVector { sprint: 1.0, ..Default::default() },
            config::FIXED_DT,
        );
        assert!((agent.sprint_intensity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn wall_bounce_reflects_and_charges_energy() {
        let world = World::new(200.0, 200.0);
        let mut agent = test_agent(vec2(199.0, 100.0));
        agent.velocity = vec2(120.0, 0.0);
        agent.current_thrust = 1.0;
        let energy_before = agent.energy;

        let mut report = CollisionReport::default();
        for _ in 0..10 {
            agent.prev_pos = agent.pos;
            agent.pos += agent.velocity * config::FIXED_DT;
            resolve_wall_collision(&mut agent, &world, &mut report);
        }

        assert!(report.hit_wall);
        assert!(agent.velocity.x <= 0.0);
        assert!(agent.pos.x <= world.width);
        assert!(agent.energy < energy_before);
        assert!(agent.stats.wall_collisions >= 1);
    }

    #[test]
    fn obstacle_collision_separates_and_nudges() {
        let mut agent = test_agent(vec2(100.0, 100.0));
        agent.velocity = vec2(-50.0, 0.0);
        let mut obstacles = vec![Obstacle::new(vec2(90.0, 100.0), 20.0)];

        let mut report = CollisionReport::default();
        resolve_obstacle_collisions(&mut agent, &mut obstacles, &[0], &mut report);

        assert!(report.hit_obstacle);
        let dist = agent.pos.distance(obstacles[0].pos);
        assert!(dist >= agent.size + obstacles[0].radius - 1e-3);
        assert!(obstacles[0].velocity.length() > 0.0);
        assert!(agent.velocity.x > -50.0, "closing velocity should be reflected");
    }

    #[test]
    fn agent_pair_resolution_removes_overlap() {
        let mut a = test_agent(vec2(100.0, 100.0));
        let mut b = test_agent(vec2(102.0, 100.0));
        resolve_agent_pair(&mut a, &mut b);
        assert!(a.pos.distance(b.pos) >= a.size + b.size - 1e-3);
    }

    #[test]
    fn resting_agents_pay_less_than_movers() {
        let mut resting = test_agent(vec2(0.0, 0.0));
        let mut moving = test_agent(vec2(0.0, 0.0));
        moving.velocity = vec2(100.0, 0.0);
        moving.current_thrust = 1.0;

        account_energy(&mut resting, config::FIXED_DT);
        account_energy(&mut moving, config::FIXED_DT);

        assert!(resting.energy > moving.energy);
    }

    #[test]
    fn non_finite_energy_is_sanitized() {
        let mut agent = test_agent(vec2(0.0, 0.0));
        agent.energy = f32::NAN;
        account_energy(&mut agent, config::FIXED_DT);
        assert!(agent.energy <= 0.0);
        assert!(agent.energy.is_finite());
    }

    #[test]
    fn size_tracks_energy_after_accounting() {
        let mut agent = test_agent(vec2(0.0, 0.0));
        let size_before = agent.size;
        agent.velocity = vec2(120.0, 0.0);
        agent.sprint_intensity = 1.0;
        for _ in 0..600 {
            account_energy(&mut agent, config::FIXED_DT);
        }
        assert!(agent.size < size_before);
        assert!(agent.size >= config::MIN_AGENT_SIZE);
    }
}
