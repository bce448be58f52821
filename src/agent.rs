use std::collections::HashSet;

use glam::Vec2;

use crate::config;
use crate::genome::{Genome, Specialization};

/// Stable handle to an agent. The generation field invalidates stale references.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct AgentId {
    pub index: u32,
    pub generation: u32,
}

/// Reproduction state machine.
#[derive(Clone, Debug, Default)]
pub enum ReproState {
    #[default]
    Idle,
    Pregnant {
        since_frame: u64,
        mate_genome: Box<Genome>,
    },
}

/// Lifetime counters feeding the fitness score.
#[derive(Clone, Debug, Default)]
pub struct LifeStats {
    pub offspring: u32,
    pub kills: u32,
    pub food_eaten: u32,
    pub obstacle_collisions: u32,
    pub wall_collisions: u32,
    pub distance_travelled: f32,
    pub energy_spent: f32,
    pub direction_changes: u32,
    pub turns_toward_food: u32,
    pub turns_away_from_obstacle: u32,
    pub speed_variation: f32,
    pub circling_accum: f32,
    pub frames_since_collision: u64,
}

#[derive(Clone, Debug)]
pub struct Agent {
    pub pos: Vec2,
    pub prev_pos: Vec2,
    pub velocity: Vec2,
    pub heading: f32,
    pub size: f32,
    pub energy: f32,
    pub specialization: Specialization,

    // Genealogy. Identities are plain genome ids, never live backreferences.
    pub genome_id: u64,
    pub parent_ids: [Option<u64>; 2],
    pub generation: u32,
    pub offspring_ids: Vec<u64>,

    // Behavioral scalars.
    pub fear: f32,
    pub aggression: f32,
    pub danger_exposure: f32,
    pub attack_exposure: f32,
    pub temperature: f32,

    // Smoothed control state.
    pub current_thrust: f32,
    pub current_rotation: f32,
    pub sprint_intensity: f32,
    /// Heritable thrust scale derived from the genome.
    pub max_thrust_factor: f32,

    // Short rolling memories (exponential moving averages).
    pub mem_speed: f32,
    pub mem_energy: f32,
    pub mem_danger: f32,

    // Recent-event markers.
    pub last_hit_frame: Option<u64>,
    pub last_ate_frame: Option<u64>,

    // Exploration coverage, by coarse grid cell.
    pub visited: HashSet<(i16, i16)>,

    pub stats: LifeStats,
    pub fitness: f32,
    pub qualifies: bool,

    pub born_frame: u64,
    pub repro_state: ReproState,
    pub cooldown_until: u64,
    pub alive: bool,
    pub cleaned_up: bool,
    pub backend_miss_logged: bool,
}

impl Agent {
    pub fn from_genome(genome: &Genome, pos: Vec2, frame: u64) -> Self {
        let energy = config::INITIAL_ENERGY;
        Self {
            pos,
            prev_pos: pos,
            velocity: Vec2::ZERO,
            heading: 0.0,
            size: size_for_energy(energy),
            energy,
            specialization: genome.specialization,
            genome_id: genome.id,
            parent_ids: [None, None],
            generation: 0,
            offspring_ids: Vec::new(),
            fear: 0.0,
            aggression: 0.0,
            danger_exposure: 0.0,
            attack_exposure: 0.0,
            temperature: config::TEMP_INITIAL,
            current_thrust: 0.0,
            current_rotation: 0.0,
            sprint_intensity: 0.0,
            max_thrust_factor: thrust_factor_for(genome),
            mem_speed: 0.0,
            mem_energy: energy / config::MAX_ENERGY,
            mem_danger: 0.0,
            last_hit_frame: None,
            last_ate_frame: None,
            visited: HashSet::new(),
            stats: LifeStats::default(),
            fitness: 0.0,
            qualifies: false,
            born_frame: frame,
            repro_state: ReproState::Idle,
            cooldown_until: 0,
            alive: true,
            cleaned_up: false,
            backend_miss_logged: false,
        }
    }

    pub fn age(&self, frame: u64) -> u64 {
        frame.saturating_sub(self.born_frame)
    }

    pub fn matured(&self, frame: u64) -> bool {
        self.age(frame) >= config::MATURITY_FRAMES
    }

    pub fn is_pregnant(&self) -> bool {
        matches!(self.repro_state, ReproState::Pregnant { .. })
    }

    pub fn on_cooldown(&self, frame: u64) -> bool {
        frame < self.cooldown_until
    }

    /// Keep size in lockstep with energy.
    pub fn refresh_size(&mut self) {
        self.size = size_for_energy(self.energy);
    }

    pub fn record_offspring(&mut self, child_genome_id: u64) {
        self.stats.offspring += 1;
        if self.offspring_ids.len() < config::MAX_TRACKED_OFFSPRING {
            self.offspring_ids.push(child_genome_id);
        }
    }

    pub fn record_visit(&mut self) {
        let cell = (
            (self.pos.x / config::EXPLORATION_GRID_CELL) as i16,
            (self.pos.y / config::EXPLORATION_GRID_CELL) as i16,
        );
        self.visited.insert(cell);
    }

    /// Fraction of the world's exploration cells this agent has touched.
    pub fn exploration_fraction(&self, world_w: f32, world_h: f32) -> f32 {
        let cols = (world_w / config::EXPLORATION_GRID_CELL).ceil().max(1.0);
        let rows = (world_h / config::EXPLORATION_GRID_CELL).ceil().max(1.0);
        (self.visited.len() as f32 / (cols * rows)).clamp(0.0, 1.0)
    }

    pub fn hit_recently(&self, frame: u64) -> bool {
        self.last_hit_frame
            .map(|f| frame.saturating_sub(f) < config::RECENT_EVENT_FRAMES)
            .unwrap_or(false)
    }

    pub fn ate_recently(&self, frame: u64) -> bool {
        self.last_ate_frame
            .map(|f| frame.saturating_sub(f) < config::RECENT_EVENT_FRAMES)
            .unwrap_or(false)
    }
}

/// Size as a monotone non-decreasing function of energy, clamped below.
pub fn size_for_energy(energy: f32) -> f32 {
    let e = if energy.is_finite() { energy.max(0.0) } else { 0.0 };
    config::MIN_AGENT_SIZE + e * config::SIZE_PER_ENERGY
}

/// Heritable thrust factor in [0.85, 1.15], a pure function of the genome.
fn thrust_factor_for(genome: &Genome) -> f32 {
    let sum: f32 = genome
        .w2
        .first()
        .map(|row| row.iter().copied().sum())
        .unwrap_or(0.0);
    let squash = 1.0 / (1.0 + (-sum).exp());
    0.85 + 0.3 * squash
}

/// Arena-based agent storage with generational indices and a free list.
pub struct AgentArena {
    pub agents: Vec<Option<Agent>>,
    pub generations: Vec<u32>,
    pub free_list: Vec<u32>,
    pub count: usize,
}

impl AgentArena {
    pub fn new(capacity: usize) -> Self {
        Self {
            agents: vec![None; capacity],
            generations: vec![0; capacity],
            free_list: (0..capacity as u32).rev().collect(),
            count: 0,
        }
    }

    /// Place an agent in a free slot. Returns `None` when the arena is full;
    /// slot-parallel storage elsewhere is sized to the same capacity, so the
    /// arena must never grow past it.
    pub fn spawn(&mut self, agent: Agent) -> Option<AgentId> {
        let index = self.free_list.pop()?;
        let idx = index as usize;
        self.agents[idx] = Some(agent);
        self.count += 1;
        Some(AgentId {
            index,
            generation: self.generations[idx],
        })
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        let idx = id.index as usize;
        if idx < self.agents.len() && self.generations[idx] == id.generation {
            self.agents[idx].as_ref()
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let idx = id.index as usize;
        if idx < self.agents.len() && self.generations[idx] == id.generation {
            self.agents[idx].as_mut()
        } else {
            None
        }
    }

    pub fn get_by_index(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index).and_then(|a| a.as_ref())
    }

    pub fn get_mut_by_index(&mut self, index: usize) -> Option<&mut Agent> {
        self.agents.get_mut(index).and_then(|a| a.as_mut())
    }

    /// Remove dead agents and reclaim their slots. Returns freed indices.
    pub fn sweep_dead(&mut self) -> Vec<usize> {
        let mut freed = Vec::new();
        for (idx, slot) in self.agents.iter_mut().enumerate() {
            if let Some(agent) = slot {
                if !agent.alive {
                    freed.push(idx);
                    *slot = None;
                    self.generations[idx] += 1;
                    self.free_list.push(idx as u32);
                    self.count -= 1;
                }
            }
        }
        freed
    }

    /// Iterate over (index, &Agent) for all alive agents.
    pub fn iter_alive(&self) -> impl Iterator<Item = (usize, &Agent)> {
        self.agents.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .and_then(|a| if a.alive { Some((i, a)) } else { None })
        })
    }

    pub fn capacity(&self) -> usize {
        self.agents.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Specialization;
    use glam::vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_agent(pos: Vec2) -> Agent {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let genome = Genome::random(1, Specialization::Forager, &mut rng);
        Agent::from_genome(&genome, pos, 0)
    }

    #[test]
    fn size_is_monotone_in_energy_and_floored() {
        let mut prev = 0.0f32;
        for step in 0..200 {
            let e = step as f32 * 2.0;
            let s = size_for_energy(e);
            assert!(s >= config::MIN_AGENT_SIZE);
            assert!(s >= prev);
            prev = s;
        }
        assert_eq!(size_for_energy(f32::NAN), config::MIN_AGENT_SIZE);
        assert_eq!(size_for_energy(-50.0), config::MIN_AGENT_SIZE);
    }

    #[test]
    fn spawn_fails_when_arena_is_full() {
        let mut arena = AgentArena::new(2);
        assert!(arena.spawn(test_agent(vec2(0.0, 0.0))).is_some());
        assert!(arena.spawn(test_agent(vec2(1.0, 0.0))).is_some());
        assert!(arena.spawn(test_agent(vec2(2.0, 0.0))).is_none());
        assert_eq!(arena.capacity(), 2);
        assert_eq!(arena.count, 2);
    }

    #[test]
    fn generational_handles_invalidate_after_sweep() {
        let mut arena = AgentArena::new(1);
        let id = arena.spawn(test_agent(vec2(0.0, 0.0))).unwrap();
        arena.get_mut(id).unwrap().alive = false;

        let freed = arena.sweep_dead();
        assert_eq!(freed, vec![id.index as usize]);
        assert!(arena.get(id).is_none());

        let id_b = arena.spawn(test_agent(vec2(1.0, 0.0))).unwrap();
        assert_eq!(id.index, id_b.index);
        assert_ne!(id.generation, id_b.generation);
    }

    #[test]
    fn offspring_list_is_bounded() {
        let mut agent = test_agent(vec2(0.0, 0.0));
        for i in 0..(config::MAX_TRACKED_OFFSPRING as u64 + 10) {
            agent.record_offspring(i);
        }
        assert_eq!(agent.offspring_ids.len(), config::MAX_TRACKED_OFFSPRING);
        assert_eq!(
            agent.stats.offspring,
            config::MAX_TRACKED_OFFSPRING as u32 + 10
        );
    }

    #[test]
    fn exploration_fraction_grows_with_distinct_cells() {
        let mut agent = test_agent(vec2(0.0, 0.0));
        agent.record_visit();
        let one = agent.exploration_fraction(config::WORLD_WIDTH, config::WORLD_HEIGHT);
        agent.pos = vec2(500.0, 500.0);
        agent.record_visit();
        let two = agent.exploration_fraction(config::WORLD_WIDTH, config::WORLD_HEIGHT);
        assert!(two > one);
    }
}
