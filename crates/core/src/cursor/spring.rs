use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::CursorState;

const MAX_SUBSTEP: f32 = 0.001;
const REST_DISTANCE: f32 = 0.01;
const REST_VELOCITY: f32 = 0.01;

/// Physical parameters of a damped spring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
}

impl SpringConfig {
    pub const SNAPPY: Self = Self::new(400.0, 30.0, 1.0);
    pub const BOUNCY: Self = Self::new(300.0, 20.0, 1.0);
    pub const GENTLE: Self = Self::new(100.0, 20.0, 1.0);
    pub const SOFT: Self = Self::new(50.0, 15.0, 1.0);
    pub const MAGNETIC: Self = Self::new(150.0, 15.0, 0.5);
    pub const CURSOR_DOT: Self = Self::new(500.0, 28.0, 1.0);
    pub const CURSOR_GLOW: Self = Self::new(100.0, 30.0, 1.0);

    pub const fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
        }
    }

    /// Ratio of the damping to the critical damping; 1.0 is critical.
    pub fn damping_ratio(&self) -> f32 {
        self.damping / (2.0 * (self.stiffness * self.mass).sqrt())
    }
}

/// One-dimensional spring chasing a target value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
}

impl Spring {
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
        }
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    /// Moves straight to `value` with no residual motion.
    pub fn jump(&mut self, value: f32) {
        self.position = value;
        self.target = value;
        self.velocity = 0.0;
    }

    pub fn is_at_rest(&self) -> bool {
        (self.position - self.target).abs() < REST_DISTANCE && self.velocity.abs() < REST_VELOCITY
    }

    /// Integrates the spring over `dt` with semi-implicit Euler substeps.
    pub fn step(&mut self, dt: Duration) -> f32 {
        let mut remaining = dt.as_secs_f32();
        let mass = self.config.mass.max(f32::EPSILON);

        while remaining > 0.0 && !self.is_at_rest() {
            let h = remaining.min(MAX_SUBSTEP);
            let force = -self.config.stiffness * (self.position - self.target)
                - self.config.damping * self.velocity;
            self.velocity += force / mass * h;
            self.position += self.velocity * h;
            remaining -= h;
        }

        if self.is_at_rest() {
            self.position = self.target;
            self.velocity = 0.0;
        }
        self.position
    }
}

/// Two-dimensional follower that smooths the shared cursor position.
///
/// Each visual consumer owns its own follower so it can pick its own
/// responsiveness. Under reduced motion the follower snaps to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follower {
    x: Spring,
    y: Spring,
    reduced_motion: bool,
}

impl Follower {
    pub fn new(config: SpringConfig) -> Self {
        Self {
            x: Spring::new(config, 0.0),
            y: Spring::new(config, 0.0),
            reduced_motion: false,
        }
    }

    pub fn with_reduced_motion(mut self, reduced: bool) -> Self {
        self.reduced_motion = reduced;
        self
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x.position(), self.y.position())
    }

    pub fn is_at_rest(&self) -> bool {
        self.x.is_at_rest() && self.y.is_at_rest()
    }

    /// Retargets to an arbitrary point and advances by `dt`.
    pub fn follow_point(&mut self, target: (f32, f32), dt: Duration) -> (f32, f32) {
        if self.reduced_motion {
            self.x.jump(target.0);
            self.y.jump(target.1);
        } else {
            self.x.set_target(target.0);
            self.y.set_target(target.1);
            self.x.step(dt);
            self.y.step(dt);
        }
        self.position()
    }

    /// Retargets to the cursor and advances by `dt`. A hidden cursor
    /// leaves the follower where it is.
    pub fn follow(&mut self, cursor: &CursorState, dt: Duration) -> (f32, f32) {
        if !cursor.is_visible {
            return self.position();
        }
        self.follow_point((cursor.x, cursor.y), dt)
    }
}

/// How far an element leans toward a nearby pointer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MagneticField {
    pub strength: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Default for MagneticField {
    fn default() -> Self {
        Self {
            strength: 0.15,
            max_x: 8.0,
            max_y: 4.0,
        }
    }
}

impl MagneticField {
    /// Offset for an element centred at `center` with the pointer at
    /// `pointer`. Zero under reduced motion.
    pub fn offset(&self, pointer: (f32, f32), center: (f32, f32), reduced_motion: bool) -> (f32, f32) {
        if reduced_motion {
            return (0.0, 0.0);
        }
        (
            ((pointer.0 - center.0) * self.strength).clamp(-self.max_x, self.max_x),
            ((pointer.1 - center.1) * self.strength).clamp(-self.max_y, self.max_y),
        )
    }
}
