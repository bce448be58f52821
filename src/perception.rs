use glam::Vec2;

use crate::agent::{Agent, AgentArena};
use crate::config;
use crate::environment::Environment;
use crate::quadtree::{QuadTree, Rect};
use crate::simulation::ItemRef;
use crate::world::{Food, Obstacle, PheromonePuff, PuffKind, World};

/// What a sensor ray hit, after size classification for agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitKind {
    Nothing,
    Edge,
    Obstacle,
    Food,
    /// An agent at least 10% smaller than the observer.
    AgentPrey,
    /// An agent at least 10% larger than the observer.
    AgentPredator,
    /// An agent within the 10% relative-size band.
    AgentEqual,
}

/// Result of a single raycast.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    pub distance: f32,
    pub kind: HitKind,
    pub agent_index: Option<u32>,
}

impl RayHit {
    fn miss(max_dist: f32) -> Self {
        Self {
            distance: max_dist,
            kind: HitKind::Nothing,
            agent_index: None,
        }
    }
}

/// One agent's perception for one frame: the controller input vector plus
/// the per-ray hit metadata. Either the CPU path here or an accelerator
/// batch produces this same value type.
#[derive(Clone, Debug)]
pub struct PerceptionResult {
    pub inputs: Vec<f32>,
    pub hits: Vec<RayHit>,
}

/// Ray-circle intersection via the standard quadratic: returns the first
/// root past a small positive epsilon, or `None` when the ray misses or the
/// circle lies behind the origin.
pub fn ray_circle_intersection(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let oc = center - origin;
    let b = oc.dot(dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let t1 = b - sqrt_disc;
    let t2 = b + sqrt_disc;
    if t1 > config::RAY_HIT_EPSILON {
        Some(t1)
    } else if t2 > config::RAY_HIT_EPSILON {
        Some(t2)
    } else {
        None
    }
}

/// Compute the full perception for one agent. Obstacle candidates come from
/// a spatial query boxed around each ray segment; agent and food candidates
/// from a single query over the whole perception radius.
#[allow(clippy::too_many_arguments)]
pub fn perceive(
    agent_idx: usize,
    agent: &Agent,
    arena: &AgentArena,
    food: &[Food],
    obstacles: &[Obstacle],
    puffs: &[PheromonePuff],
    index: &QuadTree<ItemRef>,
    world: &World,
    env: &Environment,
    frame: u64,
) -> PerceptionResult {
    let profile = agent.specialization.profile();
    let max_dist = profile.max_ray_dist;
    let total_rays = profile.sensor_rays + profile.alignment_rays;

    let mut inputs = Vec::with_capacity(agent.specialization.input_len());
    let mut hits = Vec::with_capacity(total_rays);

    // One radius query serves every ray for agents and food.
    let mut nearby = Vec::new();
    index.query(&Rect::around_point(agent.pos, max_dist), &mut nearby);
    let mut agent_candidates: Vec<u32> = Vec::new();
    let mut food_candidates: Vec<u32> = Vec::new();
    for item in &nearby {
        match item {
            ItemRef::Agent(i) if *i as usize != agent_idx => agent_candidates.push(*i),
            ItemRef::Food(i) => food_candidates.push(*i),
            _ => {}
        }
    }

    let mut scratch = Vec::new();
    for ray_i in 0..profile.sensor_rays {
        let angle =
            agent.heading + std::f32::consts::TAU * ray_i as f32 / profile.sensor_rays as f32;
        let hit = cast_ray(
            agent,
            Vec2::from_angle(angle),
            max_dist,
            &agent_candidates,
            &food_candidates,
            arena,
            food,
            obstacles,
            index,
            world,
            &mut scratch,
        );

        inputs.push(1.0 - hit.distance.min(max_dist) / max_dist);
        push_hit_one_hot(&mut inputs, hit.kind);
        hits.push(hit);
    }

    // Alignment rays contribute distance only, offset half a step so they
    // interleave with the sensor fan.
    if profile.alignment_rays > 0 {
        let offset = std::f32::consts::TAU / (profile.alignment_rays as f32 * 2.0);
        for ray_i in 0..profile.alignment_rays {
            let angle = agent.heading
                + offset
                + std::f32::consts::TAU * ray_i as f32 / profile.alignment_rays as f32;
            let hit = cast_ray(
                agent,
                Vec2::from_angle(angle),
                max_dist,
                &agent_candidates,
                &food_candidates,
                arena,
                food,
                obstacles,
                index,
                world,
                &mut scratch,
            );
            inputs.push(1.0 - hit.distance.min(max_dist) / max_dist);
            hits.push(hit);
        }
    }

    push_scalar_block(&mut inputs, agent, puffs, index, env, frame);

    debug_assert_eq!(inputs.len(), agent.specialization.input_len());
    PerceptionResult { inputs, hits }
}

#[allow(clippy::too_many_arguments)]
fn cast_ray(
    agent: &Agent,
    dir: Vec2,
    max_dist: f32,
    agent_candidates: &[u32],
    food_candidates: &[u32],
    arena: &AgentArena,
    food: &[Food],
    obstacles: &[Obstacle],
    index: &QuadTree<ItemRef>,
    world: &World,
    scratch: &mut Vec<ItemRef>,
) -> RayHit {
    let origin = agent.pos;
    let mut best = RayHit::miss(max_dist);

    // World boundary.
    if let Some(d) = world.edge_distance(origin, dir) {
        if d < best.distance {
            best = RayHit {
                distance: d,
                kind: HitKind::Edge,
                agent_index: None,
            };
        }
    }

    // Obstacles, restricted to a box around this ray's segment.
    scratch.clear();
    let segment_end = origin + dir * max_dist;
    let margin = config::RAY_QUERY_MARGIN + config::OBSTACLE_MAX_RADIUS;
    index.query(&Rect::around_segment(origin, segment_end, margin), scratch);
    for item in scratch.iter() {
        if let ItemRef::Obstacle(i) = item {
            if let Some(obstacle) = obstacles.get(*i as usize) {
                if let Some(d) = ray_circle_intersection(origin, dir, obstacle.pos, obstacle.radius)
                {
                    if d < best.distance {
                        best = RayHit {
                            distance: d,
                            kind: HitKind::Obstacle,
                            agent_index: None,
                        };
                    }
                }
            }
        }
    }

    for &i in food_candidates {
        if let Some(item) = food.get(i as usize) {
            if let Some(d) =
                ray_circle_intersection(origin, dir, item.pos, config::FOOD_PICKUP_RADIUS)
            {
                if d < best.distance {
                    best = RayHit {
                        distance: d,
                        kind: HitKind::Food,
                        agent_index: None,
                    };
                }
            }
        }
    }

    for &i in agent_candidates {
        if let Some(other) = arena.get_by_index(i as usize) {
            if !other.alive {
                continue;
            }
            if let Some(d) = ray_circle_intersection(origin, dir, other.pos, other.size) {
                if d < best.distance {
                    best = RayHit {
                        distance: d,
                        kind: classify_agent(agent.size, other.size),
                        agent_index: Some(i),
                    };
                }
            }
        }
    }

    best
}

/// Size comparison with a 10% relative threshold: meaningfully smaller
/// agents read as prey, meaningfully larger ones as predators.
pub fn classify_agent(self_size: f32, other_size: f32) -> HitKind {
    let threshold = config::SIZE_CLASS_THRESHOLD;
    if other_size < self_size * (1.0 - threshold) {
        HitKind::AgentPrey
    } else if other_size > self_size * (1.0 + threshold) {
        HitKind::AgentPredator
    } else {
        HitKind::AgentEqual
    }
}

/// 4-channel hit-type encoding: [edge/obstacle, food, prey, predator].
/// Equal-sized agents register distance only.
fn push_hit_one_hot(inputs: &mut Vec<f32>, kind: HitKind) {
    let channels = match kind {
        HitKind::Edge | HitKind::Obstacle => [1.0, 0.0, 0.0, 0.0],
        HitKind::Food => [0.0, 1.0, 0.0, 0.0],
        HitKind::AgentPrey => [0.0, 0.0, 1.0, 0.0],
        HitKind::AgentPredator => [0.0, 0.0, 0.0, 1.0],
        HitKind::Nothing | HitKind::AgentEqual => [0.0, 0.0, 0.0, 0.0],
    };
    inputs.extend_from_slice(&channels);
}

/// Fixed block of scalar state inputs appended after the rays. Order and
/// count must stay in lockstep with `config::SCALAR_INPUT_COUNT`.
fn push_scalar_block(
    inputs: &mut Vec<f32>,
    agent: &Agent,
    puffs: &[PheromonePuff],
    index: &QuadTree<ItemRef>,
    env: &Environment,
    frame: u64,
) {
    let energy_ratio = (agent.energy / config::MAX_ENERGY).clamp(0.0, 1.0);
    let age = agent.age(frame) as f32;
    let speed = agent.velocity.length();
    let speed_ratio = (speed / config::MAX_SPEED).clamp(0.0, 1.0);

    let heading_divergence = if speed > 1.0 {
        let heading = Vec2::from_angle(agent.heading);
        let travel = agent.velocity / speed;
        (1.0 - heading.dot(travel)) * 0.5
    } else {
        0.0
    };

    let (danger_signal, attack_signal) = pheromone_exposure(agent.pos, puffs, index);

    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    let scalars = [
        1.0 - energy_ratio, // hunger
        agent.fear,
        agent.aggression,
        energy_ratio,
        (age / config::AGE_NORM_FRAMES).clamp(0.0, 1.0),
        speed_ratio,
        heading_divergence,
        flag(env.in_shadow(agent.pos)),
        ((0.35 - agent.temperature) / 0.35).clamp(0.0, 1.0), // cold stress
        ((agent.temperature - 0.65) / 0.35).clamp(0.0, 1.0), // heat stress
        env.season_phase(),
        agent.mem_speed,
        agent.mem_energy,
        agent.mem_danger,
        saturating_ratio(agent.stats.food_eaten, 5.0),
        saturating_ratio(agent.stats.kills, 3.0),
        saturating_ratio(agent.stats.offspring, 3.0),
        flag(agent.hit_recently(frame)),
        flag(agent.ate_recently(frame)),
        (agent.current_thrust + 1.0) * 0.5,
        (agent.current_rotation + 1.0) * 0.5,
        danger_signal,
        attack_signal,
    ];
    debug_assert_eq!(scalars.len(), config::SCALAR_INPUT_COUNT);

    // A single corrupted scalar must not poison the whole vector.
    inputs.extend(scalars.iter().map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }));
}

/// Aggregate danger/attack pheromone intensity at a position, gathered via
/// a proximity query over the shared index.
pub fn pheromone_exposure(
    pos: Vec2,
    puffs: &[PheromonePuff],
    index: &QuadTree<ItemRef>,
) -> (f32, f32) {
    let mut nearby = Vec::new();
    index.query(&Rect::around_point(pos, config::PUFF_RADIUS), &mut nearby);

    let mut danger = 0.0f32;
    let mut attack = 0.0f32;
    for item in &nearby {
        if let ItemRef::Puff(i) = item {
            if let Some(puff) = puffs.get(*i as usize) {
                let signal = puff.sample(pos);
                match puff.kind {
                    PuffKind::Danger => danger += signal,
                    PuffKind::Attack => attack += signal,
                }
            }
        }
    }
    (danger.min(1.0), attack.min(1.0))
}

fn saturating_ratio(count: u32, scale: f32) -> f32 {
    let c = count as f32;
    c / (c + scale)
}
