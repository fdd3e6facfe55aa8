//! World containment applied after integration
//!
//! The policy is fixed per engine instance. Swapping it goes through
//! `Engine::reset_boundary`, which clears the population.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{EngineError, Result};
use crate::core::types::Vec2;
use crate::entity::particle::ParticleStore;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BoundaryShape {
    Circle { center: Vec2, radius: f32 },
    Rect { min: Vec2, max: Vec2 },
}

/// What happens when a particle ends up outside the shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryResponse {
    /// Project back onto the limit (radially for circles, per axis for rectangles)
    ClampRadial,
    /// Project back and mirror the outward velocity component
    Reflect,
    /// Soft re-entry: restoring velocity proportional to the excursion
    Spring,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Boundary {
    pub shape: BoundaryShape,
    pub response: BoundaryResponse,
    /// Weak pull toward the center of circular worlds, grows with distance
    pub center_pull: f32,
    /// Restoring factor per unit of excursion for `Spring`
    pub spring_stiffness: f32,
    /// `ClampRadial` also removes the outward velocity component
    pub bleed_outward: bool,
}

impl Default for Boundary {
    fn default() -> Self {
        Self {
            shape: BoundaryShape::Circle {
                center: Vec2::new(200.0, 200.0),
                radius: 200.0,
            },
            response: BoundaryResponse::ClampRadial,
            center_pull: 0.00003,
            spring_stiffness: 0.05,
            bleed_outward: false,
        }
    }
}

impl Boundary {
    pub fn circle(center: Vec2, radius: f32, response: BoundaryResponse) -> Self {
        Self {
            shape: BoundaryShape::Circle { center, radius },
            response,
            ..Self::default()
        }
    }

    pub fn rect(min: Vec2, max: Vec2, response: BoundaryResponse) -> Self {
        Self {
            shape: BoundaryShape::Rect { min, max },
            response,
            center_pull: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.shape {
            BoundaryShape::Circle { center, radius } => {
                if !center.is_finite() || !radius.is_finite() || radius <= 0.0 {
                    return Err(EngineError::InvalidConfig(format!(
                        "circle boundary needs a finite center and positive radius, got {:?} r={}",
                        center, radius
                    )));
                }
            }
            BoundaryShape::Rect { min, max } => {
                if !min.is_finite() || !max.is_finite() || min.x >= max.x || min.y >= max.y {
                    return Err(EngineError::InvalidConfig(format!(
                        "rect boundary needs min < max on both axes, got {:?}..{:?}",
                        min, max
                    )));
                }
            }
        }
        if self.center_pull < 0.0 || self.spring_stiffness < 0.0 {
            return Err(EngineError::InvalidConfig(
                "boundary center_pull and spring_stiffness must be >= 0".into(),
            ));
        }
        Ok(())
    }

    /// Uniform random point inside the shape
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Vec2 {
        match self.shape {
            BoundaryShape::Circle { center, radius } => {
                let angle = rng.gen_range(0.0..std::f32::consts::TAU);
                let r = radius * rng.gen::<f32>().sqrt();
                center + Vec2::new(angle.cos(), angle.sin()) * r
            }
            BoundaryShape::Rect { min, max } => Vec2::new(
                rng.gen_range(min.x..max.x),
                rng.gen_range(min.y..max.y),
            ),
        }
    }

    /// Contain every living, unpinned particle
    pub fn contain(&self, store: &mut ParticleStore, speed: f32, pinned: &[bool]) {
        for i in 0..store.count() {
            if !store.alive[i] || pinned[i] {
                continue;
            }
            let size = store.sizes[i];
            let (position, velocity) = (&mut store.positions[i], &mut store.velocities[i]);
            self.contain_particle(position, velocity, size, speed);
        }
    }

    pub fn contain_particle(&self, position: &mut Vec2, velocity: &mut Vec2, size: f32, speed: f32) {
        match self.shape {
            BoundaryShape::Circle { center, radius } => {
                self.contain_circle(center, radius, position, velocity, size, speed)
            }
            BoundaryShape::Rect { min, max } => self.contain_rect(min, max, position, velocity),
        }
    }

    fn contain_circle(
        &self,
        center: Vec2,
        radius: f32,
        position: &mut Vec2,
        velocity: &mut Vec2,
        size: f32,
        speed: f32,
    ) {
        let offset = *position - center;
        let distance = offset.length();
        let limit = (radius - size).max(0.0);

        if distance > limit {
            let normal = offset / distance;
            match self.response {
                BoundaryResponse::ClampRadial => {
                    *position = center + normal * limit;
                    if self.bleed_outward {
                        let outward = velocity.dot(normal);
                        if outward > 0.0 {
                            *velocity -= normal * outward;
                        }
                    }
                }
                BoundaryResponse::Reflect => {
                    *position = center + normal * limit;
                    let outward = velocity.dot(normal);
                    if outward > 0.0 {
                        *velocity -= normal * (2.0 * outward);
                    }
                }
                BoundaryResponse::Spring => {
                    *velocity -= normal * ((distance - limit) * self.spring_stiffness);
                }
            }
        }

        if self.center_pull > 0.0 {
            *velocity += (center - *position) * (self.center_pull * distance * speed);
        }
    }

    fn contain_rect(&self, min: Vec2, max: Vec2, position: &mut Vec2, velocity: &mut Vec2) {
        for axis in 0..2 {
            let (lo, hi) = (min[axis], max[axis]);
            let value = position[axis];

            let excess = if value < lo {
                value - lo
            } else if value > hi {
                value - hi
            } else {
                continue;
            };

            match self.response {
                BoundaryResponse::ClampRadial => {
                    position[axis] = value.clamp(lo, hi);
                    if self.bleed_outward && velocity[axis] * excess > 0.0 {
                        velocity[axis] = 0.0;
                    }
                }
                BoundaryResponse::Reflect => {
                    position[axis] = value.clamp(lo, hi);
                    if velocity[axis] * excess > 0.0 {
                        velocity[axis] = -velocity[axis];
                    }
                }
                BoundaryResponse::Spring => {
                    velocity[axis] -= excess * self.spring_stiffness;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_pull(mut boundary: Boundary) -> Boundary {
        boundary.center_pull = 0.0;
        boundary
    }

    #[test]
    fn test_clamp_radial_projects_onto_limit() {
        let boundary = no_pull(Boundary::circle(Vec2::ZERO, 10.0, BoundaryResponse::ClampRadial));
        let mut position = Vec2::new(30.0, 40.0);
        let mut velocity = Vec2::new(1.0, 1.0);

        boundary.contain_particle(&mut position, &mut velocity, 0.5, 1.0);

        assert!((position.length() - 9.5).abs() < 1e-5);
        // Same angle
        assert!((position.y / position.x - 40.0 / 30.0).abs() < 1e-5);
        assert_eq!(velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_clamp_radial_bleeds_outward_velocity() {
        let mut boundary = no_pull(Boundary::circle(Vec2::ZERO, 10.0, BoundaryResponse::ClampRadial));
        boundary.bleed_outward = true;
        let mut position = Vec2::new(20.0, 0.0);
        let mut velocity = Vec2::new(2.0, 1.0);

        boundary.contain_particle(&mut position, &mut velocity, 0.0, 1.0);

        assert_eq!(velocity, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_inside_circle_untouched() {
        let boundary = no_pull(Boundary::circle(Vec2::ZERO, 10.0, BoundaryResponse::ClampRadial));
        let mut position = Vec2::new(1.0, 2.0);
        let mut velocity = Vec2::new(5.0, 0.0);
        boundary.contain_particle(&mut position, &mut velocity, 0.5, 1.0);
        assert_eq!(position, Vec2::new(1.0, 2.0));
        assert_eq!(velocity, Vec2::new(5.0, 0.0));
    }

    #[test]
    fn test_circle_reflect_mirrors_outward_component() {
        let boundary = no_pull(Boundary::circle(Vec2::ZERO, 10.0, BoundaryResponse::Reflect));
        let mut position = Vec2::new(12.0, 0.0);
        let mut velocity = Vec2::new(3.0, 1.0);

        boundary.contain_particle(&mut position, &mut velocity, 0.0, 1.0);

        assert!((position.x - 10.0).abs() < 1e-6);
        assert_eq!(velocity, Vec2::new(-3.0, 1.0));
    }

    #[test]
    fn test_spring_pulls_back_without_clamp() {
        let boundary = no_pull(Boundary::circle(Vec2::ZERO, 10.0, BoundaryResponse::Spring));
        let mut position = Vec2::new(14.0, 0.0);
        let mut velocity = Vec2::ZERO;

        boundary.contain_particle(&mut position, &mut velocity, 0.0, 1.0);

        assert_eq!(position, Vec2::new(14.0, 0.0));
        assert!((velocity.x + 4.0 * 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_rect_reflect_clamps_and_inverts() {
        let boundary = Boundary::rect(Vec2::ZERO, Vec2::new(100.0, 100.0), BoundaryResponse::Reflect);
        let mut position = Vec2::new(-5.0, 120.0);
        let mut velocity = Vec2::new(-2.0, 3.0);

        boundary.contain_particle(&mut position, &mut velocity, 0.5, 1.0);

        assert_eq!(position, Vec2::new(0.0, 100.0));
        assert_eq!(velocity, Vec2::new(2.0, -3.0));
    }

    #[test]
    fn test_rect_reflect_keeps_inward_velocity() {
        let boundary = Boundary::rect(Vec2::ZERO, Vec2::new(100.0, 100.0), BoundaryResponse::Reflect);
        let mut position = Vec2::new(-1.0, 50.0);
        let mut velocity = Vec2::new(4.0, 0.0);

        boundary.contain_particle(&mut position, &mut velocity, 0.5, 1.0);

        assert_eq!(position.x, 0.0);
        assert_eq!(velocity.x, 4.0);
    }

    #[test]
    fn test_rect_spring() {
        let mut boundary = Boundary::rect(Vec2::ZERO, Vec2::new(10.0, 10.0), BoundaryResponse::Spring);
        boundary.spring_stiffness = 0.5;
        let mut position = Vec2::new(12.0, 5.0);
        let mut velocity = Vec2::ZERO;

        boundary.contain_particle(&mut position, &mut velocity, 0.0, 1.0);

        assert_eq!(position, Vec2::new(12.0, 5.0));
        assert_eq!(velocity, Vec2::new(-1.0, 0.0));
    }

    #[test]
    fn test_center_pull_points_inward() {
        let boundary = Boundary::circle(Vec2::ZERO, 100.0, BoundaryResponse::ClampRadial);
        let mut position = Vec2::new(50.0, 0.0);
        let mut velocity = Vec2::ZERO;

        boundary.contain_particle(&mut position, &mut velocity, 0.5, 1.0);

        assert!(velocity.x < 0.0);
        assert_eq!(velocity.y, 0.0);
    }

    #[test]
    fn test_validate_rejects_degenerate_shapes() {
        assert!(Boundary::circle(Vec2::ZERO, 0.0, BoundaryResponse::ClampRadial).validate().is_err());
        assert!(Boundary::rect(Vec2::ONE, Vec2::ONE, BoundaryResponse::Reflect).validate().is_err());
        assert!(Boundary::default().validate().is_ok());
    }

    #[test]
    fn test_random_point_inside() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let boundary = Boundary::circle(Vec2::new(5.0, 5.0), 2.0, BoundaryResponse::ClampRadial);
        for _ in 0..200 {
            let p = boundary.random_point(&mut rng);
            assert!(p.distance(Vec2::new(5.0, 5.0)) <= 2.0 + 1e-5);
        }
    }
}
