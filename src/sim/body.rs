//! Free-flying projectile bodies
//!
//! Each body integrates under gravity and quadratic drag while flying, and
//! under reduced gravity with heavy linear drag once sunk. Surface contact is
//! measured from the body's lowest point (`position.y - radius`).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::collision::incidence_angle;
use crate::config::{BodyConfig, SkipConfig, WorldConfig};

/// Lifecycle state of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyState {
    /// In the pool, not simulated
    Inactive,
    /// Airborne or skipping
    Flying,
    /// Below the surface, settling toward the floor. Never returns to `Flying`.
    Sunk,
}

/// Why a body was forced inactive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeactivationReason {
    /// Left the horizontal extents of the water plane
    OutOfBounds,
    /// Flew longer than the configured timeout
    Timeout,
    /// Ended up far below the floor
    BelowFloor,
    /// Position or velocity became non-finite
    Diverged,
}

/// Per-body physical constants, captured at launch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyParams {
    pub radius: f32,
    pub mass: f32,
    pub drag_coefficient: f32,
    pub elasticity: f32,
    pub skips_before_sink: u32,
    pub min_skip_velocity: f32,
    /// Largest incidence angle (radians from the surface plane) that can still skip
    pub skip_angle_threshold: f32,
    pub max_flight_secs: f32,
    pub high_speed_threshold: f32,
    pub max_sub_steps: u32,
}

impl From<&BodyConfig> for BodyParams {
    fn from(config: &BodyConfig) -> Self {
        Self {
            radius: config.radius,
            mass: config.mass,
            drag_coefficient: config.drag_coefficient,
            elasticity: config.elasticity,
            skips_before_sink: config.skips_before_sink,
            min_skip_velocity: config.min_skip_velocity,
            skip_angle_threshold: config.skip_angle_threshold,
            max_flight_secs: config.max_flight_secs,
            high_speed_threshold: config.high_speed_threshold,
            max_sub_steps: config.max_sub_steps,
        }
    }
}

impl Default for BodyParams {
    fn default() -> Self {
        Self::from(&BodyConfig::default())
    }
}

/// A downward pass through the water surface found during integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCrossing {
    pub previous_position: Vec3,
    pub current_position: Vec3,
    pub impact_velocity: Vec3,
    /// Radians from the surface plane (0 = grazing, pi/2 = straight down)
    pub incidence_angle: f32,
    /// Body center interpolated to the moment of contact
    pub collision_point: Vec3,
    /// Water surface height under the collision point
    pub surface_height: f32,
    /// Fraction of the sub-step at which contact happened
    pub fraction: f32,
}

/// Result of advancing one body by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Continue,
    Crossing(SurfaceCrossing),
    Deactivated(DeactivationReason),
}

/// A single thrown body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectileBody {
    pub id: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub orientation: Quat,
    pub params: BodyParams,
    pub skip_count: u32,
    pub state: BodyState,
    /// Seconds since launch
    pub flight_time: f32,
    /// Seconds since the last state change
    pub state_time: f32,
    /// Sunk and resting on the floor
    pub settled: bool,
}

impl ProjectileBody {
    pub fn new(id: u32, params: BodyParams) -> Self {
        Self {
            id,
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            params,
            skip_count: 0,
            state: BodyState::Inactive,
            flight_time: 0.0,
            state_time: 0.0,
            settled: false,
        }
    }

    /// Return to the pool state
    pub fn reset(&mut self) {
        self.position = Vec3::ZERO;
        self.velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.orientation = Quat::IDENTITY;
        self.skip_count = 0;
        self.state = BodyState::Inactive;
        self.flight_time = 0.0;
        self.state_time = 0.0;
        self.settled = false;
    }

    /// Start flying from `position` with `velocity`
    pub fn launch(&mut self, position: Vec3, velocity: Vec3) {
        if self.state != BodyState::Inactive {
            log::debug!("Relaunching body {} from {:?}", self.id, self.state);
        }
        self.reset();
        self.position = position;
        self.velocity = velocity;
        self.state = BodyState::Flying;
    }

    pub fn is_active(&self) -> bool {
        self.state != BodyState::Inactive
    }

    /// Height of the lowest point of the body
    #[inline]
    pub fn contact_height(&self) -> f32 {
        self.position.y - self.params.radius
    }

    /// Move to a new state, restarting the state timer
    pub fn set_state(&mut self, state: BodyState) {
        debug_assert!(
            !(self.state == BodyState::Sunk && state == BodyState::Flying),
            "sunk bodies never fly again"
        );
        self.state = state;
        self.state_time = 0.0;
    }

    /// Force the body inactive, leaving its last kinematic state for inspection
    pub fn deactivate(&mut self, reason: DeactivationReason) -> StepOutcome {
        log::debug!("Body {} deactivated: {:?}", self.id, reason);
        self.set_state(BodyState::Inactive);
        StepOutcome::Deactivated(reason)
    }

    /// Advance by `dt` seconds. `water_height_at` returns the world-space surface
    /// height under a position and must read the same field for the whole tick.
    pub fn step<F>(
        &mut self,
        dt: f32,
        world: &WorldConfig,
        skip: &SkipConfig,
        water_height_at: F,
    ) -> StepOutcome
    where
        F: Fn(Vec3) -> f32,
    {
        if !dt.is_finite() || dt <= 0.0 {
            return StepOutcome::Continue;
        }

        let outcome = match self.state {
            BodyState::Inactive => return StepOutcome::Continue,
            BodyState::Flying => self.step_flying(dt, world, &water_height_at),
            BodyState::Sunk => {
                self.step_sunk(dt, world, skip);
                StepOutcome::Continue
            }
        };

        self.flight_time += dt;
        self.state_time += dt;

        if let StepOutcome::Crossing(_) = outcome {
            return outcome;
        }
        self.check_bounds(world).unwrap_or(outcome)
    }

    /// Number of sub-steps so a fast body cannot skip over the surface in one step
    fn sub_step_count(&self, speed: f32, dt: f32) -> u32 {
        if speed <= self.params.high_speed_threshold {
            return 1;
        }
        let travel = speed * dt / self.params.radius.max(1e-3);
        let max = self.params.max_sub_steps.max(2);
        (travel.ceil() as u32).clamp(2, max)
    }

    fn step_flying<F>(&mut self, dt: f32, world: &WorldConfig, water_height_at: &F) -> StepOutcome
    where
        F: Fn(Vec3) -> f32,
    {
        let sub_steps = self.sub_step_count(self.velocity.length(), dt);
        let h = dt / sub_steps as f32;

        for _ in 0..sub_steps {
            let previous = self.position;
            let previous_water = water_height_at(previous);
            self.integrate_flight(h, world.gravity);

            let current_water = water_height_at(self.position);
            let previous_gap = previous.y - self.params.radius - previous_water;
            let current_gap = self.contact_height() - current_water;

            if previous_gap >= 0.0 && current_gap < 0.0 {
                let fraction = previous_gap / (previous_gap - current_gap);
                return StepOutcome::Crossing(self.crossing(
                    previous,
                    fraction,
                    previous_water + (current_water - previous_water) * fraction,
                ));
            }

            // A swell rose over a descending body: resolve where it is now
            if previous_gap < 0.0 && current_gap < 0.0 && self.velocity.y < 0.0 {
                return StepOutcome::Crossing(self.crossing(previous, 1.0, current_water));
            }
        }

        StepOutcome::Continue
    }

    fn crossing(&self, previous: Vec3, fraction: f32, surface_height: f32) -> SurfaceCrossing {
        SurfaceCrossing {
            previous_position: previous,
            current_position: self.position,
            impact_velocity: self.velocity,
            incidence_angle: incidence_angle(self.velocity),
            collision_point: previous.lerp(self.position, fraction),
            surface_height,
            fraction,
        }
    }

    /// Gravity, quadratic air drag, then explicit Euler for position and orientation
    fn integrate_flight(&mut self, h: f32, gravity: f32) {
        self.velocity.y -= gravity * h;

        let speed = self.velocity.length();
        if speed > 1e-6 && self.params.mass > 0.0 {
            // |a| = c |v|^2 / m, opposing v; capped so drag never reverses motion
            let k = (self.params.drag_coefficient * speed * h / self.params.mass).min(1.0);
            self.velocity -= self.velocity * k;
        }

        self.position += self.velocity * h;
        self.integrate_orientation(h);
    }

    fn step_sunk(&mut self, dt: f32, world: &WorldConfig, skip: &SkipConfig) {
        if self.settled {
            return;
        }

        self.velocity.y -= world.gravity * skip.underwater_gravity_scale * dt;
        let retain = (1.0 - skip.underwater_drag * dt).max(0.0);
        self.velocity *= retain;
        self.angular_velocity *= retain;
        self.position += self.velocity * dt;
        self.integrate_orientation(dt);

        if self.position.y <= world.floor_depth
            && self.position.y >= world.floor_depth - world.below_floor_margin
        {
            self.position.y = world.floor_depth;
            self.velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
            self.settled = true;
            log::debug!("Body {} settled at {:?}", self.id, self.position);
        }
    }

    fn integrate_orientation(&mut self, h: f32) {
        if self.angular_velocity.length_squared() > 0.0 {
            self.orientation =
                (Quat::from_scaled_axis(self.angular_velocity * h) * self.orientation).normalize();
        }
    }

    fn check_bounds(&mut self, world: &WorldConfig) -> Option<StepOutcome> {
        if !self.position.is_finite() || !self.velocity.is_finite() {
            return Some(self.deactivate(DeactivationReason::Diverged));
        }

        let half_w = world.plane_width * 0.5 + world.bounds_margin;
        let half_h = world.plane_height * 0.5 + world.bounds_margin;
        if self.position.x.abs() > half_w || self.position.z.abs() > half_h {
            return Some(self.deactivate(DeactivationReason::OutOfBounds));
        }

        if self.state == BodyState::Sunk
            && self.position.y < world.floor_depth - world.below_floor_margin
        {
            return Some(self.deactivate(DeactivationReason::BelowFloor));
        }

        if self.state == BodyState::Flying && self.flight_time > self.params.max_flight_secs {
            return Some(self.deactivate(DeactivationReason::Timeout));
        }

        None
    }
}
