//! Skip-or-sink resolution for bodies hitting the water surface
//!
//! The tricky part of stone skipping: deciding from the impact angle, speed and
//! skip history whether a body bounces, then feeding the impact back into the
//! wave field as a single disturbance.

use glam::{Vec2, Vec3};
use rand::Rng;

use super::body::{BodyState, ProjectileBody, SurfaceCrossing};
use super::disturbance::{Disturbance, DisturbanceQueue};
use crate::config::{SkipConfig, WorldConfig};
use crate::world_to_uv;

/// What happened at a surface crossing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    Skip,
    Sink,
}

/// Result of resolving one crossing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionOutcome {
    pub kind: CollisionKind,
    /// Skip count after resolution
    pub skip_count: u32,
    pub incidence_angle: f32,
    pub impact_speed: f32,
    /// The disturbance that was queued for the wave field
    pub disturbance: Disturbance,
}

/// Angle between a velocity and the surface plane, in radians.
///
/// 0 is a grazing impact, pi/2 is straight down. Zero velocity reads as grazing.
#[inline]
pub fn incidence_angle(velocity: Vec3) -> f32 {
    let dir = velocity.normalize_or_zero();
    if dir == Vec3::ZERO {
        return 0.0;
    }
    let cos = dir.dot(Vec3::Y).clamp(-1.0, 1.0);
    (std::f32::consts::FRAC_PI_2 - cos.acos()).abs()
}

/// Stateless skip/sink decision and response
///
/// Borrows the tick's configuration snapshot; all mutation goes to the body
/// and queue passed into [`SkipCollisionResolver::resolve`].
#[derive(Debug, Clone, Copy)]
pub struct SkipCollisionResolver<'a> {
    world: &'a WorldConfig,
    skip: &'a SkipConfig,
    reference_mass: f32,
}

impl<'a> SkipCollisionResolver<'a> {
    pub fn new(world: &'a WorldConfig, skip: &'a SkipConfig, reference_mass: f32) -> Self {
        assert!(reference_mass > 0.0, "reference mass must be positive");
        Self {
            world,
            skip,
            reference_mass,
        }
    }

    #[inline]
    fn mass_ratio(&self, body: &ProjectileBody) -> f32 {
        body.params.mass / self.reference_mass
    }

    /// Whether an impact skips. Thresholds are strict: hitting one exactly sinks.
    pub fn can_skip(&self, body: &ProjectileBody, incidence_angle: f32, impact_speed: f32) -> bool {
        let min_speed = body.params.min_skip_velocity * self.mass_ratio(body);
        incidence_angle < body.params.skip_angle_threshold
            && impact_speed > min_speed
            && body.skip_count < body.params.skips_before_sink
    }

    /// Disturbance amount for an impact: grows with speed^2.5 and cross-section
    pub fn disturbance_amount(&self, body: &ProjectileBody, impact_speed: f32) -> f32 {
        let radius = body.params.radius;
        let amount = self.skip.disturbance_scale
            * impact_speed.max(0.0).powf(2.5)
            * radius
            * radius
            * self.mass_ratio(body);
        amount.min(self.skip.max_disturbance)
    }

    /// Simulation UV of a world-space point
    pub fn surface_uv(&self, point: Vec3) -> Vec2 {
        world_to_uv(point, self.world.plane_width, self.world.plane_height)
    }

    /// Resolve a crossing in place and queue exactly one disturbance.
    ///
    /// Panics if the body is not flying: crossings only come from flying bodies.
    pub fn resolve<R: Rng>(
        &self,
        body: &mut ProjectileBody,
        crossing: &SurfaceCrossing,
        queue: &mut DisturbanceQueue,
        rng: &mut R,
    ) -> CollisionOutcome {
        assert_eq!(
            body.state,
            BodyState::Flying,
            "crossing resolved for body {} that is not flying",
            body.id
        );

        let impact_speed = crossing.impact_velocity.length();
        let angle = crossing.incidence_angle;
        let uv = self.surface_uv(crossing.collision_point);

        let (kind, amount) = if self.can_skip(body, angle, impact_speed) {
            (CollisionKind::Skip, self.apply_skip(body, crossing, impact_speed, rng))
        } else {
            (CollisionKind::Sink, self.apply_sink(body, crossing, impact_speed))
        };

        let disturbance = Disturbance::new(uv, amount);
        queue.enqueue(disturbance.uv, disturbance.amount);

        match kind {
            CollisionKind::Skip => log::debug!(
                "Body {} skip #{} at {:?} (angle {:.1} deg, speed {:.2})",
                body.id,
                body.skip_count,
                crossing.collision_point,
                angle.to_degrees(),
                impact_speed
            ),
            CollisionKind::Sink => log::info!(
                "Body {} sank after {} skips at {:?}",
                body.id,
                body.skip_count,
                crossing.collision_point
            ),
        }

        CollisionOutcome {
            kind,
            skip_count: body.skip_count,
            incidence_angle: angle,
            impact_speed,
            disturbance,
        }
    }

    fn apply_skip<R: Rng>(
        &self,
        body: &mut ProjectileBody,
        crossing: &SurfaceCrossing,
        impact_speed: f32,
        rng: &mut R,
    ) -> f32 {
        body.skip_count += 1;
        let progress = body.skip_count as f32 / body.params.skips_before_sink as f32;
        let bounce = body.params.elasticity * (1.0 - progress);

        let v = crossing.impact_velocity;
        let retention = self.skip.horizontal_retention;
        // Always leave upward, even off a rising face the body was climbing
        body.velocity = Vec3::new(v.x * retention, v.y.abs() * bounce, v.z * retention);

        // Lift the contact point back onto the surface so the next downward pass registers
        body.position = crossing.collision_point;
        body.position.y = crossing.surface_height + body.params.radius;

        body.angular_velocity = random_spin(rng, self.skip.spin_range);

        self.disturbance_amount(body, impact_speed)
    }

    fn apply_sink(&self, body: &mut ProjectileBody, crossing: &SurfaceCrossing, impact_speed: f32) -> f32 {
        body.set_state(BodyState::Sunk);
        body.position = crossing.collision_point;

        let mut velocity = crossing.impact_velocity * self.skip.sink_velocity_retention;
        velocity.y = velocity.y.min(-self.skip.sink_min_downward_speed);
        body.velocity = velocity;
        body.angular_velocity *= self.skip.sink_spin_retention;

        let multiplier = self.skip.sink_disturbance_multiplier;
        (self.disturbance_amount(body, impact_speed) * multiplier)
            .min(self.skip.max_disturbance * multiplier)
    }
}

/// Random tumble, mostly about the vertical axis
fn random_spin<R: Rng>(rng: &mut R, range: f32) -> Vec3 {
    if range <= 0.0 || !range.is_finite() {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.random_range(-range..range) * 0.2,
        rng.random_range(-range..range),
        rng.random_range(-range..range) * 0.2,
    )
}
