use std::collections::{HashMap, HashSet};

use glam::{vec2, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, error, warn};

use crate::agent::{size_for_energy, Agent, AgentArena, AgentId};
use crate::brain::{ActionVector, ControllerBank};
use crate::config::{self, FitnessWeights, MutationTuning, QualificationThresholds};
use crate::environment::Environment;
use crate::fitness;
use crate::genepool::{GenePoolStore, InMemoryGenePool};
use crate::genome::{Genome, MutationStyle};
use crate::hooks::{ComputeBackend, EffectKind, NoopEffects, VisualEffects};
use crate::lifecycle::{self, Birth};
use crate::perception::{self, HitKind, RayHit};
use crate::physics::{self, TempBand};
use crate::quadtree::{QuadTree, Rect};
use crate::world::{decay_puffs, Food, Obstacle, PheromonePuff, PuffKind, World};

/// Spatial-index payload: everything that participates in proximity queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemRef {
    Agent(u32),
    Food(u32),
    Obstacle(u32),
    Puff(u32),
}

/// One agent's resolved decision for the frame, either from the CPU
/// perception + forward path or consumed from an accelerator batch.
struct Decision {
    idx: usize,
    action: ActionVector,
    hits: Vec<RayHit>,
    danger: f32,
    attack: f32,
}

pub struct Simulation {
    pub arena: AgentArena,
    pub brains: ControllerBank,
    pub genomes: Vec<Option<Genome>>,
    pub world: World,
    pub env: Environment,
    pub food: Vec<Food>,
    pub obstacles: Vec<Obstacle>,
    pub puffs: Vec<PheromonePuff>,
    pub tuning: MutationTuning,
    pub fitness_weights: FitnessWeights,
    pub thresholds: QualificationThresholds,
    pub pool: Box<dyn GenePoolStore>,
    pub effects: Box<dyn VisualEffects>,
    pub backend: Option<Box<dyn ComputeBackend>>,
    pub rng: ChaCha8Rng,
    pub frame_count: u64,
    next_genome_id: u64,
    food_accumulator: f32,
}

impl Simulation {
    pub fn new(seed: u64) -> Self {
        Self::with_store(seed, Box::new(InMemoryGenePool::new(8, seed)))
    }

    pub fn with_store(seed: u64, pool: Box<dyn GenePoolStore>) -> Self {
        let world = World::new(config::WORLD_WIDTH, config::WORLD_HEIGHT);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut obstacles = Vec::with_capacity(config::OBSTACLE_COUNT);
        for _ in 0..config::OBSTACLE_COUNT {
            let pos = vec2(
                rng.gen_range(0.0..world.width),
                rng.gen_range(0.0..world.height),
            );
            let radius = rng.gen_range(config::OBSTACLE_MIN_RADIUS..config::OBSTACLE_MAX_RADIUS);
            obstacles.push(Obstacle::new(pos, radius));
        }

        let mut food = Vec::with_capacity(config::MAX_FOOD_COUNT);
        for _ in 0..config::INITIAL_FOOD_COUNT {
            food.push(Food {
                pos: vec2(
                    rng.gen_range(0.0..world.width),
                    rng.gen_range(0.0..world.height),
                ),
                energy: config::FOOD_ENERGY,
            });
        }

        let mut sim = Self {
            arena: AgentArena::new(config::MAX_AGENT_COUNT),
            brains: ControllerBank::new(config::MAX_AGENT_COUNT),
            genomes: vec![None; config::MAX_AGENT_COUNT],
            world,
            env: Environment::new(Vec::new()),
            food,
            obstacles,
            puffs: Vec::new(),
            tuning: MutationTuning::default(),
            fitness_weights: FitnessWeights::default(),
            thresholds: QualificationThresholds::default(),
            pool,
            effects: Box::new(NoopEffects),
            backend: None,
            rng,
            frame_count: 0,
            next_genome_id: 1,
            food_accumulator: 0.0,
        };

        for _ in 0..config::INITIAL_AGENT_COUNT {
            sim.spawn_genesis_agent();
        }
        sim
    }

    pub fn set_backend(&mut self, backend: Box<dyn ComputeBackend>) {
        self.backend = Some(backend);
    }

    pub fn alive_count(&self) -> usize {
        self.arena.count
    }

    fn fresh_genome_id(&mut self) -> u64 {
        let id = self.next_genome_id;
        self.next_genome_id += 1;
        id
    }

    fn random_position(&mut self) -> Vec2 {
        vec2(
            self.rng.gen_range(40.0..self.world.width - 40.0),
            self.rng.gen_range(40.0..self.world.height - 40.0),
        )
    }

    /// Spawn a brand new agent with random weights.
    pub fn spawn_genesis_agent(&mut self) -> Option<AgentId> {
        let id = self.fresh_genome_id();
        let spec = crate::genome::Specialization::random(&mut self.rng);
        let genome = Genome::random(id, spec, &mut self.rng);
        let pos = self.random_position();
        self.spawn_agent(genome, pos, config::INITIAL_ENERGY, [None, None], 0)
    }

    /// Spawn from a stored genome, mutated exactly once on arrival.
    pub fn spawn_from_stored(&mut self, genome: Genome) -> Option<AgentId> {
        let rate = Genome::adaptive_rate(&self.tuning, 0.5);
        let arrived = genome.mutated(&self.tuning, MutationStyle::Gaussian, rate, &mut self.rng);
        let pos = self.random_position();
        self.spawn_agent(arrived, pos, config::INITIAL_ENERGY, [None, None], 0)
    }

    fn spawn_agent(
        &mut self,
        genome: Genome,
        pos: Vec2,
        energy: f32,
        parent_ids: [Option<u64>; 2],
        generation: u32,
    ) -> Option<AgentId> {
        let mut agent = Agent::from_genome(&genome, self.world.clamp(pos), self.frame_count);
        agent.energy = energy.clamp(0.0, config::MAX_ENERGY);
        agent.refresh_size();
        agent.parent_ids = parent_ids;
        agent.generation = generation;

        let id = self.arena.spawn(agent)?;
        let slot = id.index as usize;
        self.brains.init_from_genome(slot, &genome, &mut self.rng);
        self.genomes[slot] = Some(genome);
        Some(id)
    }

    fn build_index(&self) -> Option<QuadTree<ItemRef>> {
        let boundary = Rect::new(
            self.world.width * 0.5,
            self.world.height * 0.5,
            self.world.width * 0.5,
            self.world.height * 0.5,
        );
        let mut tree = match QuadTree::new(boundary, config::SPATIAL_NODE_CAPACITY) {
            Ok(tree) => tree,
            Err(e) => {
                error!(error = %e, "spatial index construction failed, skipping frame");
                return None;
            }
        };
        for (idx, agent) in self.arena.iter_alive() {
            tree.insert(agent.pos, ItemRef::Agent(idx as u32));
        }
        for (i, f) in self.food.iter().enumerate() {
            tree.insert(f.pos, ItemRef::Food(i as u32));
        }
        for (i, o) in self.obstacles.iter().enumerate() {
            tree.insert(o.pos, ItemRef::Obstacle(i as u32));
        }
        for (i, p) in self.puffs.iter().enumerate() {
            tree.insert(p.pos, ItemRef::Puff(i as u32));
        }
        Some(tree)
    }

    /// Advance the simulation by one fixed-step frame.
    pub fn frame(&mut self) {
        let dt = config::FIXED_DT;
        let frame = self.frame_count;

        // Rebuild the spatial index from all live entities.
        let Some(index) = self.build_index() else {
            return;
        };

        // Perception + controller forward, preferring accelerator results.
        let mut batch = match self.backend.as_mut() {
            Some(backend) => backend.frame_decisions(frame),
            None => HashMap::new(),
        };
        let backend_present = self.backend.is_some();

        let alive: Vec<usize> = self.arena.iter_alive().map(|(i, _)| i).collect();
        let mut decisions: Vec<Decision> = Vec::with_capacity(alive.len());
        let mut backend_misses: Vec<usize> = Vec::new();

        for &idx in &alive {
            let Some(agent) = self.arena.get_by_index(idx) else {
                continue;
            };
            if !self.brains.is_active(idx) {
                continue;
            }

            if let Some(provided) = batch.remove(&idx) {
                self.brains.adopt_hidden(idx, provided.hidden);
                let (danger, attack) =
                    perception::pheromone_exposure(agent.pos, &self.puffs, &index);
                decisions.push(Decision {
                    idx,
                    action: provided.action,
                    hits: Vec::new(),
                    danger,
                    attack,
                });
                continue;
            }

            if backend_present && !agent.backend_miss_logged {
                backend_misses.push(idx);
            }

            let result = perception::perceive(
                idx,
                agent,
                &self.arena,
                &self.food,
                &self.obstacles,
                &self.puffs,
                &index,
                &self.world,
                &self.env,
                frame,
            );
            let (danger, attack) = perception::pheromone_exposure(agent.pos, &self.puffs, &index);
            if let Some(action) = self.brains.forward(idx, &result.inputs) {
                decisions.push(Decision {
                    idx,
                    action,
                    hits: result.hits,
                    danger,
                    attack,
                });
            }
        }

        for idx in backend_misses {
            if let Some(agent) = self.arena.get_mut_by_index(idx) {
                warn!(slot = idx, "accelerator batch missing agent, using cpu path");
                agent.backend_miss_logged = true;
            }
        }

        // Physics, eating, pheromone exposure, behavioral state.
        let season = self.env.season();
        let mut eaten: HashSet<usize> = HashSet::new();
        let mut scratch: Vec<ItemRef> = Vec::new();

        for decision in &decisions {
            let idx = decision.idx;
            let aid = agent_id(idx, &self.arena);
            let Some(agent) = self.arena.get_mut_by_index(idx) else {
                continue;
            };

            let sensor_rays = agent.specialization.profile().sensor_rays;
            let steer = decision.action.rotation * 2.0 - 1.0;
            let (food_ray, obstacle_ray) = nearest_rays(&decision.hits, sensor_rays);

            physics::apply_action(agent, &decision.action, dt);
            let mut report = physics::integrate(agent, season, &self.world, dt);

            scratch.clear();
            index.query(
                &Rect::around_point(agent.pos, agent.size + config::OBSTACLE_MAX_RADIUS),
                &mut scratch,
            );
            let obstacle_candidates: Vec<u32> = scratch
                .iter()
                .filter_map(|item| match item {
                    ItemRef::Obstacle(i) => Some(*i),
                    _ => None,
                })
                .collect();
            physics::resolve_obstacle_collisions(
                agent,
                &mut self.obstacles,
                &obstacle_candidates,
                &mut report,
            );

            // Eating: consume any food within pickup range, first come first
            // served within the frame.
            scratch.clear();
            index.query(
                &Rect::around_point(agent.pos, agent.size + config::FOOD_PICKUP_RADIUS),
                &mut scratch,
            );
            for item in &scratch {
                let ItemRef::Food(fi) = item else { continue };
                let fi = *fi as usize;
                if eaten.contains(&fi) {
                    continue;
                }
                let Some(f) = self.food.get(fi) else { continue };
                if agent.pos.distance(f.pos) <= agent.size + config::FOOD_PICKUP_RADIUS {
                    eaten.insert(fi);
                    agent.energy = (agent.energy + f.energy).min(config::MAX_ENERGY);
                    agent.stats.food_eaten += 1;
                    agent.last_ate_frame = Some(frame);
                    agent.refresh_size();
                    self.effects.add_visual_effect(aid, EffectKind::FoodEaten);
                }
            }

            physics::account_energy(agent, dt);
            agent.record_visit();

            // Reactive-steering counters for the fitness score.
            if let Some(ray) = food_ray {
                if steer * relative_ray_angle(ray, sensor_rays) > 0.05 {
                    agent.stats.turns_toward_food += 1;
                }
            }
            if let Some(ray) = obstacle_ray {
                if steer * relative_ray_angle(ray, sensor_rays) < -0.05 {
                    agent.stats.turns_away_from_obstacle += 1;
                }
            }

            // Pheromone exposure and the slow behavioral memories.
            agent.danger_exposure = decision.danger;
            agent.attack_exposure = decision.attack;
            let fear_target = if agent.hit_recently(frame) {
                1.0
            } else {
                decision.danger
            };
            agent.fear += (fear_target - agent.fear) * config::FEAR_SMOOTHING;
            agent.aggression +=
                (decision.action.attack - agent.aggression) * config::AGGRESSION_SMOOTHING;

            let speed_ratio = (agent.velocity.length() / config::MAX_SPEED).min(1.0);
            agent.mem_speed += (speed_ratio - agent.mem_speed) * config::MEMORY_SMOOTHING;
            agent.mem_energy +=
                (agent.energy / config::MAX_ENERGY - agent.mem_energy) * config::MEMORY_SMOOTHING;
            agent.mem_danger += (decision.danger - agent.mem_danger) * config::MEMORY_SMOOTHING;

            if report.hit_wall {
                agent.last_hit_frame = Some(frame);
                self.effects.add_visual_effect(aid, EffectKind::WallImpact);
            }
            if report.hit_obstacle {
                agent.last_hit_frame = Some(frame);
                self.effects.add_visual_effect(aid, EffectKind::ObstacleImpact);
            }
        }

        if !eaten.is_empty() {
            let mut i = 0usize;
            self.food.retain(|_| {
                let keep = !eaten.contains(&i);
                i += 1;
                keep
            });
        }

        // Agent-agent overlap resolution.
        let mut contact_pairs: Vec<(usize, usize)> = Vec::new();
        for &idx in &alive {
            let Some(agent) = self.arena.get_by_index(idx) else {
                continue;
            };
            scratch.clear();
            // The partner may be as large as energy allows, so the query box
            // must reach agent.size + the maximum possible neighbor size.
            let reach = agent.size + size_for_energy(config::MAX_ENERGY);
            index.query(&Rect::around_point(agent.pos, reach), &mut scratch);
            for item in &scratch {
                if let ItemRef::Agent(j) = item {
                    let j = *j as usize;
                    if j > idx {
                        contact_pairs.push((idx, j));
                    }
                }
            }
        }
        for (i, j) in contact_pairs {
            if let Some((a, b)) = pair_mut(&mut self.arena.agents, i, j) {
                physics::resolve_agent_pair(a, b);
            }
        }

        // Attacks: collect strikes against strictly smaller neighbors, then
        // apply damage and emit pheromones.
        let mut strikes: Vec<(usize, usize)> = Vec::new();
        for decision in &decisions {
            if decision.action.attack < config::ATTACK_THRESHOLD {
                continue;
            }
            let Some(attacker) = self.arena.get_by_index(decision.idx) else {
                continue;
            };
            scratch.clear();
            index.query(
                &Rect::around_point(attacker.pos, attacker.size * 2.0 + config::ATTACK_RANGE_MARGIN),
                &mut scratch,
            );
            let mut best: Option<(usize, f32)> = None;
            for item in &scratch {
                let ItemRef::Agent(j) = item else { continue };
                let j = *j as usize;
                if j == decision.idx {
                    continue;
                }
                let Some(victim) = self.arena.get_by_index(j) else {
                    continue;
                };
                if victim.size * (1.0 + config::SIZE_CLASS_THRESHOLD) >= attacker.size {
                    continue;
                }
                let dist = attacker.pos.distance(victim.pos);
                if dist > attacker.size + victim.size + config::ATTACK_RANGE_MARGIN {
                    continue;
                }
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((j, dist));
                }
            }
            if let Some((victim, _)) = best {
                strikes.push((decision.idx, victim));
            }
        }
        for (ai, vi) in strikes {
            let Some((attacker, victim)) = pair_mut(&mut self.arena.agents, ai, vi) else {
                continue;
            };
            let dealt = config::ATTACK_DAMAGE.min(victim.energy);
            victim.energy -= config::ATTACK_DAMAGE;
            victim.last_hit_frame = Some(frame);
            victim.fear = 1.0;
            attacker.energy =
                (attacker.energy + dealt * config::ATTACK_ENERGY_GAIN_FRACTION)
                    .min(config::MAX_ENERGY);
            attacker.refresh_size();
            if victim.energy <= 0.0 {
                attacker.stats.kills += 1;
            }
            self.puffs.push(PheromonePuff::new(attacker.pos, PuffKind::Attack));
            self.puffs.push(PheromonePuff::new(victim.pos, PuffKind::Danger));
            self.effects
                .add_visual_effect(agent_id(ai, &self.arena), EffectKind::AgentClash);
        }

        // Lifecycle: fitness cadence, mating, births, deaths.
        self.lifecycle_pass(&decisions, &index, frame);

        // Detach the dead from the arena and their controller slots.
        for slot in self.arena.sweep_dead() {
            self.brains.deactivate(slot);
            self.genomes[slot] = None;
        }

        // Keep a minimum population alive, seeded from the pool when it has
        // anything to offer.
        while self.arena.count < config::MIN_POPULATION {
            match self.pool.get_random_agent() {
                Some(genome) => {
                    if self.spawn_from_stored(genome).is_none() {
                        break;
                    }
                }
                None => {
                    if self.spawn_genesis_agent().is_none() {
                        break;
                    }
                }
            }
        }

        // World housekeeping.
        decay_puffs(&mut self.puffs, dt);
        for obstacle in &mut self.obstacles {
            obstacle.step(&self.world, dt);
        }
        self.food_accumulator += config::FOOD_RESPAWN_RATE * dt;
        while self.food_accumulator >= 1.0 {
            self.food_accumulator -= 1.0;
            if self.food.len() >= config::MAX_FOOD_COUNT {
                continue;
            }
            let pos = vec2(
                self.rng.gen_range(0.0..self.world.width),
                self.rng.gen_range(0.0..self.world.height),
            );
            self.food.push(Food {
                pos,
                energy: config::FOOD_ENERGY,
            });
        }

        self.env.tick();
        self.frame_count += 1;
    }

    fn lifecycle_pass(&mut self, decisions: &[Decision], index: &QuadTree<ItemRef>, frame: u64) {
        // Staggered fitness recompute so the cost spreads across frames.
        let alive: Vec<usize> = self.arena.iter_alive().map(|(i, _)| i).collect();
        for &idx in &alive {
            if (frame + idx as u64) % config::FITNESS_RECOMPUTE_INTERVAL != 0 {
                continue;
            }
            if let Some(agent) = self.arena.get_mut_by_index(idx) {
                agent.fitness = fitness::compute_fitness(
                    agent,
                    &self.fitness_weights,
                    self.world.width,
                    self.world.height,
                    frame,
                );
            }
        }

        let fitness_snapshot: Vec<f32> = self
            .arena
            .iter_alive()
            .map(|(_, a)| fitness::sanitize(a.fitness))
            .collect();

        // Mating: willing initiators court their nearest neighbor in range.
        let mut courtships: Vec<(usize, usize, f32)> = Vec::new();
        let mut scratch: Vec<ItemRef> = Vec::new();
        for decision in decisions {
            if decision.action.mate < config::MATING_DESIRE_THRESHOLD {
                continue;
            }
            let Some(initiator) = self.arena.get_by_index(decision.idx) else {
                continue;
            };
            scratch.clear();
            index.query(
                &Rect::around_point(initiator.pos, config::MATING_RANGE),
                &mut scratch,
            );
            let mut best: Option<(usize, f32)> = None;
            for item in &scratch {
                let ItemRef::Agent(j) = item else { continue };
                let j = *j as usize;
                if j == decision.idx {
                    continue;
                }
                let Some(other) = self.arena.get_by_index(j) else {
                    continue;
                };
                let dist = initiator.pos.distance(other.pos);
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((j, dist));
                }
            }
            if let Some((mate, _)) = best {
                courtships.push((decision.idx, mate, decision.action.mate));
            }
        }
        for (initiator_idx, mate_idx, desire) in courtships {
            let Some(mate_genome) = self.genomes.get(mate_idx).and_then(|g| g.clone()) else {
                continue;
            };
            let Some((initiator, mate)) = pair_mut(&mut self.arena.agents, initiator_idx, mate_idx)
            else {
                continue;
            };
            let band = TempBand::for_temperature(initiator.temperature);
            if lifecycle::try_mate(initiator, mate, &mate_genome, desire, band, frame) {
                self.effects
                    .add_visual_effect(agent_id(initiator_idx, &self.arena), EffectKind::MatingStart);
            }
        }

        // Births: due pregnancies first, then asexual splits.
        let mut births: Vec<Birth> = Vec::new();
        for &idx in &alive {
            let Some(own_genome) = self.genomes.get(idx).and_then(|g| g.clone()) else {
                continue;
            };
            let Some(agent) = self.arena.get_mut_by_index(idx) else {
                continue;
            };
            let band = TempBand::for_temperature(agent.temperature);
            let percentile = percentile_of(&fitness_snapshot, fitness::sanitize(agent.fitness));
            let rate = Genome::adaptive_rate(&self.tuning, percentile);
            let style = pick_style(&mut self.rng);

            let child_id = self.next_genome_id;
            if let Some(birth) = lifecycle::resolve_pregnancy(
                agent,
                &own_genome,
                child_id,
                &self.tuning,
                style,
                rate,
                &mut self.rng,
                frame,
            ) {
                self.next_genome_id += 1;
                births.push(birth);
                continue;
            }

            // Splitting is suppressed by hostile climates like mating is.
            if band.reproduction_mult() > 0.0 {
                if let Some(birth) = lifecycle::try_split(
                    agent,
                    &own_genome,
                    &self.tuning,
                    style,
                    rate,
                    &mut self.rng,
                    frame,
                ) {
                    births.push(birth);
                }
            }
        }

        // Deaths: zero energy or a lost controller slot.
        for &idx in &alive {
            let Some(own_genome) = self.genomes.get(idx).and_then(|g| g.clone()) else {
                continue;
            };
            let controller_lost = !self.brains.is_active(idx);
            let Some(agent) = self.arena.get_mut_by_index(idx) else {
                continue;
            };
            if agent.energy > 0.0 && !controller_lost {
                continue;
            }
            if controller_lost {
                debug!(slot = idx, "controller slot lost, retiring agent");
            }
            lifecycle::handle_death(
                agent,
                &own_genome,
                &self.fitness_weights,
                &self.thresholds,
                self.pool.as_mut(),
                &self.world,
                frame,
            );
            self.effects
                .add_visual_effect(agent_id(idx, &self.arena), EffectKind::Death);
        }

        for birth in births {
            let offset = vec2(
                self.rng.gen_range(-20.0..20.0),
                self.rng.gen_range(-20.0..20.0),
            );
            let spawned = self.spawn_agent(
                birth.genome,
                birth.pos + offset,
                birth.energy,
                birth.parent_ids,
                birth.generation,
            );
            match spawned {
                Some(id) => self.effects.add_visual_effect(id, EffectKind::Birth),
                None => debug!("arena full, birth dropped"),
            }
        }
    }
}

fn agent_id(idx: usize, arena: &AgentArena) -> AgentId {
    AgentId {
        index: idx as u32,
        generation: arena.generations.get(idx).copied().unwrap_or(0),
    }
}

/// Two disjoint mutable agents out of the arena's backing storage.
fn pair_mut(
    agents: &mut [Option<Agent>],
    i: usize,
    j: usize,
) -> Option<(&mut Agent, &mut Agent)> {
    if i == j || i >= agents.len() || j >= agents.len() {
        return None;
    }
    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
    let (left, right) = agents.split_at_mut(hi);
    let a = left[lo].as_mut()?;
    let b = right[0].as_mut()?;
    if !a.alive || !b.alive {
        return None;
    }
    if i < j {
        Some((a, b))
    } else {
        Some((b, a))
    }
}

/// Ray indices of the nearest food hit and the nearest obstacle/edge hit
/// within the sensor fan.
fn nearest_rays(hits: &[RayHit], sensor_rays: usize) -> (Option<usize>, Option<usize>) {
    let mut food: Option<(usize, f32)> = None;
    let mut obstacle: Option<(usize, f32)> = None;
    for (i, hit) in hits.iter().take(sensor_rays).enumerate() {
        match hit.kind {
            HitKind::Food => {
                if food.map_or(true, |(_, d)| hit.distance < d) {
                    food = Some((i, hit.distance));
                }
            }
            HitKind::Obstacle | HitKind::Edge => {
                if obstacle.map_or(true, |(_, d)| hit.distance < d) {
                    obstacle = Some((i, hit.distance));
                }
            }
            _ => {}
        }
    }
    (food.map(|(i, _)| i), obstacle.map(|(i, _)| i))
}

/// Signed angle of sensor ray `i` relative to the heading, in [-pi, pi].
fn relative_ray_angle(ray: usize, sensor_rays: usize) -> f32 {
    let mut a = std::f32::consts::TAU * ray as f32 / sensor_rays as f32;
    if a > std::f32::consts::PI {
        a -= std::f32::consts::TAU;
    }
    a
}

/// Fraction of the population scoring at or below `fitness`.
fn percentile_of(snapshot: &[f32], fitness: f32) -> f32 {
    if snapshot.is_empty() {
        return 0.5;
    }
    let below = snapshot.iter().filter(|&&f| f <= fitness).count();
    below as f32 / snapshot.len() as f32
}

fn pick_style(rng: &mut impl Rng) -> MutationStyle {
    let roll: f32 = rng.gen();
    if roll < 0.7 {
        MutationStyle::Gaussian
    } else if roll < 0.9 {
        MutationStyle::Cauchy
    } else {
        MutationStyle::Polynomial
    }
}
