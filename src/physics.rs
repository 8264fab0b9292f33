use glam::Vec2;

pub const GRAVITATIONAL_CONSTANT: f32 = 6.67430e-11;

/// Axes that hit the bound box during [`PhysicsBody::clamp_to_bounds`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ClampedAxes {
    pub x: bool,
    pub y: bool,
}

impl ClampedAxes {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

/// A point mass. Only ever mutated by its own integration step or by forces
/// applied to it by its owner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PhysicsBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f32,
}

impl PhysicsBody {
    pub fn new(mass: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mass,
        }
    }

    pub fn at(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            mass,
        }
    }

    pub fn with_velocity(self, velocity: Vec2) -> Self {
        Self { velocity, ..self }
    }

    /// Changes velocity directly, independent of mass.
    pub fn accelerate(&mut self, acceleration: Vec2, dt: f32) {
        self.velocity += acceleration * dt;
    }

    pub fn apply_force(&mut self, force: Vec2, dt: f32) {
        if self.mass > 0.0 {
            self.velocity += force / self.mass * dt;
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        self.position += self.velocity * dt;
    }

    /// Keeps both coordinates within `[-max_bound, max_bound]`, killing the
    /// velocity along every axis that had to be clamped.
    pub fn clamp_to_bounds(&mut self, max_bound: f32) -> ClampedAxes {
        let mut clamped = ClampedAxes::default();

        if self.position.x > max_bound {
            self.position.x = max_bound;
            clamped.x = true;
        } else if self.position.x < -max_bound {
            self.position.x = -max_bound;
            clamped.x = true;
        }

        if self.position.y > max_bound {
            self.position.y = max_bound;
            clamped.y = true;
        } else if self.position.y < -max_bound {
            self.position.y = -max_bound;
            clamped.y = true;
        }

        if clamped.x {
            self.velocity.x = 0.0;
        }
        if clamped.y {
            self.velocity.y = 0.0;
        }
        clamped
    }

    /// Newtonian attraction towards `other`. Coincident bodies are left alone.
    pub fn gravitate_towards(&mut self, other: &PhysicsBody, dt: f32) {
        let diff = other.position - self.position;
        let dist_sq = diff.length_squared();
        if dist_sq <= f32::EPSILON || self.mass <= 0.0 {
            return;
        }
        let force = GRAVITATIONAL_CONSTANT * self.mass * other.mass / dist_sq;
        let direction = diff / dist_sq.sqrt();
        self.apply_force(direction * force, dt);
    }
}

/// Applies pairwise attraction between all bodies, then integrates each one.
/// Forces are computed from the positions at the start of the step.
pub fn step_bodies(bodies: &mut [PhysicsBody], gravitation: bool, dt: f32) {
    if gravitation && bodies.len() > 1 {
        let snapshot = bodies.to_vec();
        for (i, body) in bodies.iter_mut().enumerate() {
            for (j, other) in snapshot.iter().enumerate() {
                if i != j {
                    body.gravitate_towards(other, dt);
                }
            }
        }
    }
    for body in bodies.iter_mut() {
        body.integrate(dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::vec2;

    #[test]
    fn integration_moves_by_velocity() {
        let mut body = PhysicsBody::new(1.0).with_velocity(vec2(2.0, -4.0));
        body.integrate(0.5);
        assert_eq!(body.position, vec2(1.0, -2.0));
    }

    #[test]
    fn clamping_zeroes_only_the_clamped_axis() {
        let mut body = PhysicsBody::at(vec2(499.0, 10.0), 1.0).with_velocity(vec2(600.0, 3.0));
        body.integrate(1.0);
        let clamped = body.clamp_to_bounds(500.0);

        assert_eq!(clamped, ClampedAxes { x: true, y: false });
        assert_eq!(body.position, vec2(500.0, 13.0));
        assert_eq!(body.velocity, vec2(0.0, 3.0));
    }

    #[test]
    fn clamping_respects_bounds_over_many_steps() {
        let mut body = PhysicsBody::new(1.0).with_velocity(vec2(-900.0, 1200.0));
        for _ in 0..120 {
            body.accelerate(vec2(-30.0, 45.0), 1.0 / 60.0);
            body.integrate(1.0 / 60.0);
            let clamped = body.clamp_to_bounds(500.0);
            assert!(body.position.x.abs() <= 500.0);
            assert!(body.position.y.abs() <= 500.0);
            if clamped.x {
                assert_eq!(body.velocity.x, 0.0);
            }
            if clamped.y {
                assert_eq!(body.velocity.y, 0.0);
            }
        }
    }

    #[test]
    fn bodies_attract_each_other() {
        let mut bodies = [
            PhysicsBody::at(vec2(-1.0, 0.0), 1.0e10),
            PhysicsBody::at(vec2(1.0, 0.0), 1.0e10),
        ];
        step_bodies(&mut bodies, true, 1.0);
        assert!(bodies[0].velocity.x > 0.0);
        assert!(bodies[1].velocity.x < 0.0);
        assert_eq!(bodies[0].velocity.y, 0.0);
    }

    #[test]
    fn coincident_bodies_are_skipped() {
        let mut body = PhysicsBody::at(vec2(3.0, 3.0), 5.0);
        let other = body;
        body.gravitate_towards(&other, 1.0);
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
