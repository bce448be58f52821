// All tunable simulation constants in one place.

// World
pub const WORLD_WIDTH: f32 = 2400.0;
pub const WORLD_HEIGHT: f32 = 1600.0;

// Agents
pub const INITIAL_AGENT_COUNT: usize = 60;
pub const MAX_AGENT_COUNT: usize = 400;
pub const MIN_POPULATION: usize = 20;
pub const MIN_AGENT_SIZE: f32 = 6.0;
pub const SIZE_PER_ENERGY: f32 = 0.04;
pub const MAX_ENERGY: f32 = 250.0;
pub const INITIAL_ENERGY: f32 = 120.0;
pub const MAX_SPEED: f32 = 140.0;

// Movement
pub const THRUST_DEADZONE: f32 = 0.1;
pub const THRUST_POWER: f32 = 260.0;
pub const THRUST_ACCEL_RATE: f32 = 3.5;
pub const THRUST_DECEL_RATE: f32 = 7.0;
pub const ROTATION_RATE: f32 = 3.2;
pub const ROTATION_MOMENTUM: f32 = 0.82;
pub const DRAG_NORMAL: f32 = 1.4;
pub const DRAG_BRAKING: f32 = 4.0;
pub const SPRINT_THRESHOLD: f32 = 0.6;
pub const SPRINT_SPEED_MULT: f32 = 1.6;
pub const FEAR_SPEED_BONUS: f32 = 1.25;
pub const DANGER_FEAR_THRESHOLD: f32 = 0.5;

// Attacks
pub const ATTACK_THRESHOLD: f32 = 0.7;
pub const ATTACK_RANGE_MARGIN: f32 = 6.0;
pub const ATTACK_DAMAGE: f32 = 28.0;
pub const ATTACK_ENERGY_GAIN_FRACTION: f32 = 0.6;

// Collisions
pub const WALL_BOUNCE_DAMPING: f32 = 0.72;
pub const WALL_COLLISION_ENERGY_COST: f32 = 3.0;
pub const BODY_BOUNCE_DAMPING: f32 = 0.65;
pub const OBSTACLE_NUDGE: f32 = 6.0;
pub const OBSTACLE_MAX_SPEED: f32 = 10.0;
pub const OBSTACLE_VELOCITY_DECAY: f32 = 2.5;

// Energy accounting
pub const PASSIVE_LOSS_RATE: f32 = 0.55;
pub const RESTING_LOSS_FACTOR: f32 = 0.5;
pub const RESTING_SPEED: f32 = 4.0;
pub const MOVEMENT_LOSS_RATE: f32 = 0.009;
pub const MOVEMENT_LOSS_CAP: f32 = 2.5;
pub const ROTATION_LOSS_RATE: f32 = 0.35;
pub const SPRINT_LOSS_RATE: f32 = 1.8;
pub const OBESITY_THRESHOLD: f32 = 0.85;
pub const OBESITY_TAX_RATE: f32 = 0.02;

// Temperature (normalized to [0, 1])
pub const TEMP_INITIAL: f32 = 0.5;
pub const TEMP_RISE_RATE: f32 = 0.06;
pub const TEMP_FALL_RATE: f32 = 0.025;

// Food
pub const INITIAL_FOOD_COUNT: usize = 350;
pub const MAX_FOOD_COUNT: usize = 700;
pub const FOOD_RESPAWN_RATE: f32 = 3.0;
pub const FOOD_ENERGY: f32 = 35.0;
pub const FOOD_PICKUP_RADIUS: f32 = 10.0;

// Obstacles
pub const OBSTACLE_COUNT: usize = 24;
pub const OBSTACLE_MIN_RADIUS: f32 = 18.0;
pub const OBSTACLE_MAX_RADIUS: f32 = 55.0;

// Pheromone puffs
pub const PUFF_RADIUS: f32 = 90.0;
pub const PUFF_INITIAL_INTENSITY: f32 = 1.0;
pub const PUFF_DECAY_RATE: f32 = 0.4;
pub const PUFF_EXPIRY_FLOOR: f32 = 0.02;

// Perception
pub const RAY_QUERY_MARGIN: f32 = 24.0;
pub const RAY_HIT_EPSILON: f32 = 0.001;
pub const SIZE_CLASS_THRESHOLD: f32 = 0.10;
pub const SCALAR_INPUT_COUNT: usize = 23;
pub const AGE_NORM_FRAMES: f32 = 14400.0;
pub const MEMORY_SMOOTHING: f32 = 0.05;
pub const FEAR_SMOOTHING: f32 = 0.12;
pub const AGGRESSION_SMOOTHING: f32 = 0.06;
pub const RECENT_EVENT_FRAMES: u64 = 90;

// Reproduction
pub const MATURITY_FRAMES: u64 = 600;
pub const MATING_MIN_ENERGY: f32 = 90.0;
pub const MATING_ENERGY_COST: f32 = 35.0;
pub const MATING_DESIRE_THRESHOLD: f32 = 0.65;
pub const MATING_RANGE: f32 = 60.0;
pub const PREGNANCY_FRAMES: u64 = 420;
pub const REPRODUCTION_COOLDOWN_FRAMES: u64 = 900;
pub const SPLIT_ENERGY_FRACTION: f32 = 0.88;
pub const RESPEC_PROBABILITY: f32 = 0.03;
pub const MAX_TRACKED_OFFSPRING: usize = 16;

// Fitness cadence
pub const FITNESS_RECOMPUTE_INTERVAL: u64 = 30;
pub const EXPLORATION_GRID_CELL: f32 = 100.0;

// Simulation
pub const FIXED_DT: f32 = 1.0 / 60.0;
pub const SPATIAL_NODE_CAPACITY: usize = 8;

// Season
pub const SEASON_LENGTH_FRAMES: u64 = 7200;

/// Mutation shaping for controller genomes. The raw numbers were tuned
/// iteratively in the field and are kept overridable rather than treated as
/// a single correct set.
#[derive(Clone, Copy, Debug)]
pub struct MutationTuning {
    /// Base per-weight mutation rate blended with the fitness-adapted rate.
    pub base_rate: f32,
    /// Rate used at the worst fitness percentile (maximum exploration).
    pub explore_rate: f32,
    /// Rate used at the best fitness percentile (exploitation).
    pub exploit_rate: f32,
    /// Blend factor between the base rate and the percentile-adapted rate.
    pub adaptive_blend: f32,
    /// Standard deviation of Gaussian noise.
    pub gaussian_sigma: f32,
    /// Scale of Cauchy noise.
    pub cauchy_scale: f32,
    /// Distribution index for bounded polynomial perturbation.
    pub polynomial_eta: f32,
    /// Independent per-weight probability of a macro perturbation.
    pub macro_probability: f32,
    /// Magnitude of macro perturbations.
    pub macro_magnitude: f32,
    /// Symmetric clamp applied to every weight after mutation.
    pub weight_clamp: f32,
}

impl Default for MutationTuning {
    fn default() -> Self {
        Self {
            base_rate: 0.08,
            explore_rate: 0.22,
            exploit_rate: 0.03,
            adaptive_blend: 0.6,
            gaussian_sigma: 0.12,
            cauchy_scale: 0.05,
            polynomial_eta: 20.0,
            macro_probability: 0.01,
            macro_magnitude: 1.5,
            weight_clamp: 4.0,
        }
    }
}

/// Per-term weights for the fitness score.
#[derive(Clone, Copy, Debug)]
pub struct FitnessWeights {
    pub temperature_activity: f32,
    pub reproduction: f32,
    pub clever_turns: f32,
    pub variation: f32,
    pub exploration: f32,
    pub food: f32,
    pub kills: f32,
    pub navigation: f32,
    pub synergy: f32,
    pub efficiency: f32,
    pub circling_penalty: f32,
    pub obstacle_collision_penalty: f32,
    pub wall_collision_penalty: f32,
    pub collision_free_bonus: f32,
    pub inactivity_penalty: f32,
    /// Additive survival bonus, capped. Replaces the old multiplicative
    /// bonus, which rewarded passive long-lived agents.
    pub survival_bonus_per_frame: f32,
    pub survival_bonus_cap: f32,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            temperature_activity: 4.0,
            reproduction: 12.0,
            clever_turns: 0.5,
            variation: 3.0,
            exploration: 25.0,
            food: 6.0,
            kills: 10.0,
            navigation: 2.0,
            synergy: 15.0,
            efficiency: 5.0,
            circling_penalty: 8.0,
            obstacle_collision_penalty: 0.4,
            wall_collision_penalty: 0.25,
            collision_free_bonus: 10.0,
            inactivity_penalty: 12.0,
            survival_bonus_per_frame: 0.002,
            survival_bonus_cap: 20.0,
        }
    }
}

/// Cutoffs for gene-pool qualification.
#[derive(Clone, Copy, Debug)]
pub struct QualificationThresholds {
    pub min_fitness: f32,
    pub min_food_eaten: u32,
    pub min_age_frames: u64,
    pub min_exploration: f32,
    pub min_turns_toward_food: u32,
    /// Fitness bound that lets a genome in on four of the five minimums.
    pub exceptional_fitness: f32,
}

impl Default for QualificationThresholds {
    fn default() -> Self {
        Self {
            min_fitness: 40.0,
            min_food_eaten: 3,
            min_age_frames: 1800,
            min_exploration: 0.06,
            min_turns_toward_food: 5,
            exceptional_fitness: 90.0,
        }
    }
}
