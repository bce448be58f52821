use glam::Vec2;

use crate::config;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    /// How fast body temperature bleeds off toward ambient.
    pub fn temperature_decay_mult(&self) -> f32 {
        match self {
            Season::Spring => 1.0,
            Season::Summer => 0.6,
            Season::Autumn => 1.1,
            Season::Winter => 1.6,
        }
    }

}

/// Circular region that blocks light; agents inside report a shadow flag.
#[derive(Clone, Debug)]
pub struct ShadowZone {
    pub center: Vec2,
    pub radius: f32,
}

/// Season clock plus static shadow geometry.
pub struct Environment {
    pub frame: u64,
    pub shadows: Vec<ShadowZone>,
}

impl Environment {
    pub fn new(shadows: Vec<ShadowZone>) -> Self {
        Self { frame: 0, shadows }
    }

    pub fn tick(&mut self) {
        self.frame += 1;
    }

    /// Season phase in [0, 1) across the full four-season cycle.
    pub fn season_phase(&self) -> f32 {
        let cycle = config::SEASON_LENGTH_FRAMES * 4;
        (self.frame % cycle) as f32 / cycle as f32
    }

    pub fn season(&self) -> Season {
        match (self.frame / config::SEASON_LENGTH_FRAMES) % 4 {
            0 => Season::Spring,
            1 => Season::Summer,
            2 => Season::Autumn,
            _ => Season::Winter,
        }
    }

    pub fn in_shadow(&self, pos: Vec2) -> bool {
        self.shadows
            .iter()
            .any(|z| pos.distance_squared(z.center) <= z.radius * z.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn season_cycles_through_all_four() {
        let mut env = Environment::new(Vec::new());
        assert_eq!(env.season(), Season::Spring);
        env.frame = config::SEASON_LENGTH_FRAMES;
        assert_eq!(env.season(), Season::Summer);
        env.frame = config::SEASON_LENGTH_FRAMES * 3;
        assert_eq!(env.season(), Season::Winter);
        env.frame = config::SEASON_LENGTH_FRAMES * 4;
        assert_eq!(env.season(), Season::Spring);
    }

    #[test]
    fn shadow_query_respects_radius() {
        let env = Environment::new(vec![ShadowZone {
            center: vec2(100.0, 100.0),
            radius: 30.0,
        }]);
        assert!(env.in_shadow(vec2(110.0, 100.0)));
        assert!(!env.in_shadow(vec2(200.0, 100.0)));
    }
}
