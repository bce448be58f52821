use glam::Vec2;

use crate::config;

/// Bounded rectangular world. Agents reflect off the edges rather than wrap.
pub struct World {
    pub width: f32,
    pub height: f32,
}

impl World {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    /// Clamp a position into world bounds.
    pub fn clamp(&self, mut pos: Vec2) -> Vec2 {
        pos.x = pos.x.clamp(0.0, self.width);
        pos.y = pos.y.clamp(0.0, self.height);
        pos
    }

    /// Distance along a ray from `origin` in unit direction `dir` to the
    /// first world edge, or `None` when the origin is already outside.
    pub fn edge_distance(&self, origin: Vec2, dir: Vec2) -> Option<f32> {
        if !self.contains(origin) {
            return None;
        }
        let mut best = f32::INFINITY;
        if dir.x > 1e-6 {
            best = best.min((self.width - origin.x) / dir.x);
        } else if dir.x < -1e-6 {
            best = best.min(-origin.x / dir.x);
        }
        if dir.y > 1e-6 {
            best = best.min((self.height - origin.y) / dir.y);
        } else if dir.y < -1e-6 {
            best = best.min(-origin.y / dir.y);
        }
        if best.is_finite() {
            Some(best.max(0.0))
        } else {
            None
        }
    }
}

/// Food pellet.
#[derive(Clone, Debug)]
pub struct Food {
    pub pos: Vec2,
    pub energy: f32,
}

/// Circular obstacle. Carries a small reactive velocity from collisions.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub pos: Vec2,
    pub radius: f32,
    pub velocity: Vec2,
}

impl Obstacle {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            velocity: Vec2::ZERO,
        }
    }

    /// Integrate the reactive nudge and bleed it off.
    pub fn step(&mut self, world: &World, dt: f32) {
        if self.velocity.length_squared() > 0.0 {
            let speed = self.velocity.length();
            if speed > config::OBSTACLE_MAX_SPEED {
                self.velocity *= config::OBSTACLE_MAX_SPEED / speed;
            }
            self.pos = world.clamp(self.pos + self.velocity * dt);
            let decay = (1.0 - config::OBSTACLE_VELOCITY_DECAY * dt).max(0.0);
            self.velocity *= decay;
        }
    }
}

/// What a pheromone puff signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PuffKind {
    Danger,
    Attack,
}

/// Transient point entity emitting a decaying proximity signal.
#[derive(Clone, Debug)]
pub struct PheromonePuff {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PuffKind,
    pub intensity: f32,
}

impl PheromonePuff {
    pub fn new(pos: Vec2, kind: PuffKind) -> Self {
        Self {
            pos,
            radius: config::PUFF_RADIUS,
            kind,
            intensity: config::PUFF_INITIAL_INTENSITY,
        }
    }

    /// Signal strength at a point: intensity scaled linearly by proximity.
    pub fn sample(&self, pos: Vec2) -> f32 {
        let dist = self.pos.distance(pos);
        if dist >= self.radius {
            return 0.0;
        }
        self.intensity * (1.0 - dist / self.radius)
    }
}

/// Exponential decay of all puffs; expired puffs are dropped.
pub fn decay_puffs(puffs: &mut Vec<PheromonePuff>, dt: f32) {
    let factor = (1.0 - config::PUFF_DECAY_RATE * dt).max(0.0);
    for puff in puffs.iter_mut() {
        puff.intensity *= factor;
    }
    puffs.retain(|p| p.intensity > config::PUFF_EXPIRY_FLOOR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn edge_distance_straight_at_right_wall() {
        let world = World::new(100.0, 100.0);
        let d = world.edge_distance(vec2(40.0, 50.0), vec2(1.0, 0.0)).unwrap();
        assert!((d - 60.0).abs() < 1e-4);
    }

    #[test]
    fn edge_distance_none_outside_bounds() {
        let world = World::new(100.0, 100.0);
        assert!(world.edge_distance(vec2(-5.0, 50.0), vec2(1.0, 0.0)).is_none());
    }

    #[test]
    fn puff_signal_falls_off_with_distance_and_expires() {
        let puff = PheromonePuff::new(vec2(0.0, 0.0), PuffKind::Danger);
        assert!(puff.sample(vec2(0.0, 0.0)) > puff.sample(vec2(50.0, 0.0)));
        assert_eq!(puff.sample(vec2(config::PUFF_RADIUS + 1.0, 0.0)), 0.0);

        let mut puffs = vec![puff];
        for _ in 0..2000 {
            decay_puffs(&mut puffs, config::FIXED_DT);
        }
        assert!(puffs.is_empty());
    }
}
