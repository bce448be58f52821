use glam::Vec2;
use thiserror::Error;

/// Errors emitted by spatial index construction.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Axis-aligned rectangle described by its center and half extents.
#[derive(Clone, Copy, Debug)]
pub struct Rect {
    pub cx: f32,
    pub cy: f32,
    pub hw: f32,
    pub hh: f32,
}

impl Rect {
    pub fn new(cx: f32, cy: f32, hw: f32, hh: f32) -> Self {
        Self { cx, cy, hw, hh }
    }

    /// Rectangle covering the segment from `a` to `b`, grown by `margin`.
    pub fn around_segment(a: Vec2, b: Vec2, margin: f32) -> Self {
        let min_x = a.x.min(b.x) - margin;
        let max_x = a.x.max(b.x) + margin;
        let min_y = a.y.min(b.y) - margin;
        let max_y = a.y.max(b.y) + margin;
        Self {
            cx: (min_x + max_x) * 0.5,
            cy: (min_y + max_y) * 0.5,
            hw: (max_x - min_x) * 0.5,
            hh: (max_y - min_y) * 0.5,
        }
    }

    /// Square rectangle of half-extent `radius` centered on `pos`.
    pub fn around_point(pos: Vec2, radius: f32) -> Self {
        Self::new(pos.x, pos.y, radius, radius)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.cx - self.hw
            && p.x <= self.cx + self.hw
            && p.y >= self.cy - self.hh
            && p.y <= self.cy + self.hh
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        (self.cx - other.cx).abs() <= self.hw + other.hw
            && (self.cy - other.cy).abs() <= self.hh + other.hh
    }
}

/// Region quadtree over points with copyable payloads. Rebuilt from scratch
/// every frame; there is deliberately no removal operation.
pub struct QuadTree<T: Copy> {
    boundary: Rect,
    capacity: usize,
    points: Vec<(Vec2, T)>,
    children: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T: Copy> QuadTree<T> {
    pub fn new(boundary: Rect, capacity: usize) -> Result<Self, IndexError> {
        if boundary.hw <= 0.0 || boundary.hh <= 0.0 {
            return Err(IndexError::InvalidConfig("boundary extents must be positive"));
        }
        if capacity == 0 {
            return Err(IndexError::InvalidConfig("capacity must be non-zero"));
        }
        Ok(Self {
            boundary,
            capacity,
            points: Vec::with_capacity(capacity),
            children: None,
        })
    }

    /// Insert a point with its payload. Returns false when the point lies
    /// outside this node's boundary; callers must not treat that as fatal.
    pub fn insert(&mut self, point: Vec2, payload: T) -> bool {
        if !self.boundary.contains(point) {
            return false;
        }

        if self.children.is_none() {
            if self.points.len() < self.capacity {
                self.points.push((point, payload));
                return true;
            }
            self.subdivide();
        }

        let children = self.children.as_mut().expect("subdivided above");
        for child in children.iter_mut() {
            if child.insert(point, payload) {
                return true;
            }
        }
        // Boundary-edge points can slip between children due to float
        // comparisons; keep them at this level.
        self.points.push((point, payload));
        true
    }

    fn subdivide(&mut self) {
        let Rect { cx, cy, hw, hh } = self.boundary;
        let hw2 = hw * 0.5;
        let hh2 = hh * 0.5;
        let make = |cx, cy| QuadTree {
            boundary: Rect::new(cx, cy, hw2, hh2),
            capacity: self.capacity,
            points: Vec::with_capacity(self.capacity),
            children: None,
        };
        self.children = Some(Box::new([
            make(cx - hw2, cy - hh2),
            make(cx + hw2, cy - hh2),
            make(cx - hw2, cy + hh2),
            make(cx + hw2, cy + hh2),
        ]));

        let points = std::mem::take(&mut self.points);
        for (point, payload) in points {
            let children = self.children.as_mut().expect("just created");
            let mut placed = false;
            for child in children.iter_mut() {
                if child.insert(point, payload) {
                    placed = true;
                    break;
                }
            }
            if !placed {
                self.points.push((point, payload));
            }
        }
    }

    /// Collect every payload whose point lies inside `range`.
    pub fn query(&self, range: &Rect, out: &mut Vec<T>) {
        if !self.boundary.intersects(range) {
            return;
        }
        for (point, payload) in &self.points {
            if range.contains(*point) {
                out.push(*payload);
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(range, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn tree(capacity: usize) -> QuadTree<u32> {
        QuadTree::new(Rect::new(100.0, 100.0, 100.0, 100.0), capacity).unwrap()
    }

    #[test]
    fn rejects_points_outside_root_boundary() {
        let mut qt = tree(4);
        assert!(!qt.insert(vec2(-10.0, 50.0), 0));
        assert!(qt.insert(vec2(10.0, 50.0), 1));
    }

    #[test]
    fn query_returns_contained_points_and_skips_disjoint_ranges() {
        let mut qt = tree(4);
        assert!(qt.insert(vec2(30.0, 40.0), 7));

        let mut hits = Vec::new();
        qt.query(&Rect::new(30.0, 40.0, 5.0, 5.0), &mut hits);
        assert_eq!(hits, vec![7]);

        hits.clear();
        qt.query(&Rect::new(180.0, 180.0, 5.0, 5.0), &mut hits);
        assert!(hits.is_empty());
    }

    #[test]
    fn overflow_subdivides_and_keeps_every_point_queryable() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut qt = tree(4);
        let mut expected = Vec::new();
        for i in 0..200u32 {
            let p = vec2(rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0));
            assert!(qt.insert(p, i));
            expected.push(i);
        }

        let mut hits = Vec::new();
        qt.query(&Rect::new(100.0, 100.0, 100.0, 100.0), &mut hits);
        hits.sort_unstable();
        assert_eq!(hits, expected);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(QuadTree::<u32>::new(Rect::new(0.0, 0.0, 10.0, 10.0), 0).is_err());
    }
}
