use std::collections::HashMap;

use crate::agent::AgentId;
use crate::brain::ActionVector;

/// Event classes a renderer may want to visualize. The core fires these and
/// moves on; nothing downstream feeds back into simulation state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    WallImpact,
    ObstacleImpact,
    AgentClash,
    FoodEaten,
    Birth,
    Death,
    MatingStart,
}

/// Optional renderer hook. Behavior must be identical with the no-op wired in.
pub trait VisualEffects {
    fn add_visual_effect(&mut self, agent: AgentId, kind: EffectKind);
}

pub struct NoopEffects;

impl VisualEffects for NoopEffects {
    fn add_visual_effect(&mut self, _agent: AgentId, _kind: EffectKind) {}
}

/// One agent's decision as produced by an accelerator: the action vector plus
/// the recurrent hidden state to carry into the next frame.
#[derive(Clone, Debug)]
pub struct FrameDecision {
    pub action: ActionVector,
    pub hidden: Vec<f32>,
}

/// Optional batched perception + forward-pass provider. Results are keyed by
/// arena slot; any slot missing from the batch falls back to the CPU path.
pub trait ComputeBackend {
    fn frame_decisions(&mut self, frame: u64) -> HashMap<usize, FrameDecision>;
}
