//! Player movement on the pitch.

use footmesh_geometry::Point;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Rectangular playing field with the origin at one corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f64,
    pub height: f64,
}

impl Default for Field {
    fn default() -> Self {
        Self {
            width: 122.0,
            height: 90.0,
        }
    }
}

impl Field {
    pub fn contains(&self, p: Point) -> bool {
        (0.0..=self.width).contains(&p.x) && (0.0..=self.height).contains(&p.y)
    }

    /// Nearest point on the field.
    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(0.0, self.width), p.y.clamp(0.0, self.height))
    }

    /// Uniformly random point on the field.
    pub fn random_point(&self, rng: &mut StdRng) -> Point {
        Point::new(rng.gen_range(0.0..=self.width), rng.gen_range(0.0..=self.height))
    }
}

/// Bounded random walk: each step moves at most `max_step` along each axis
/// and never leaves the field.
#[derive(Debug, Clone, Copy)]
pub struct RandomWalk {
    pub field: Field,
    pub max_step: f64,
}

impl RandomWalk {
    pub fn step(&self, from: Point, rng: &mut StdRng) -> Point {
        // NaN and infinite steps would make the sample range invalid.
        if !(self.max_step > 0.0 && self.max_step.is_finite()) {
            return self.field.clamp(from);
        }
        let dx = rng.gen_range(-self.max_step..=self.max_step);
        let dy = rng.gen_range(-self.max_step..=self.max_step);
        self.field.clamp(Point::new(from.x + dx, from.y + dy))
    }
}
