//! Sundew: a 2D evolution sandbox core.
//!
//! Agents carry a single-hidden-layer recurrent controller whose shape is a
//! pure function of their specialization tag. Each fixed-step frame rebuilds
//! a spatial index, casts perception rays through it, runs every controller
//! forward, integrates movement and energy, and advances the reproduction
//! state machines. Dead agents that clear the qualification bar hand their
//! genome to an external gene-pool store for reseeding later populations.
//!
//! Rendering, dashboards, and persistent storage are collaborator traits
//! (`hooks`, `genepool`); the core runs identically with the no-op versions.

pub mod agent;
pub mod brain;
pub mod config;
pub mod environment;
pub mod fitness;
pub mod genepool;
pub mod genome;
pub mod hooks;
pub mod lifecycle;
pub mod perception;
pub mod physics;
pub mod quadtree;
pub mod simulation;
pub mod world;

pub use agent::{Agent, AgentArena, AgentId};
pub use brain::{ActionVector, ControllerBank};
pub use genepool::{GenePoolStore, GenomeMeta, InMemoryGenePool, PoolRecord};
pub use genome::{Genome, MutationStyle, Specialization};
pub use hooks::{ComputeBackend, EffectKind, FrameDecision, NoopEffects, VisualEffects};
pub use perception::{HitKind, PerceptionResult, RayHit};
pub use physics::TempBand;
pub use quadtree::{QuadTree, Rect};
pub use simulation::{ItemRef, Simulation};
pub use world::{Food, Obstacle, PheromonePuff, PuffKind, World};
