//! Simulation state and core event types
//!
//! Everything one running session owns: the wave field, pending disturbances,
//! the body pool and the seeded RNG used for randomized responses.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{BodyParams, DeactivationReason};
use super::collision::CollisionKind;
use super::disturbance::DisturbanceQueue;
use super::session::ThrowSession;
use super::wave::WaveField;
use crate::config::{BodyConfig, SimConfig, WorldConfig};
use crate::world_to_uv;

/// Things that happened during a tick, for renderers, audio and UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Launched {
        id: u32,
        origin: Vec3,
        velocity: Vec3,
    },
    Skipped {
        id: u32,
        skip_count: u32,
        point: Vec3,
        incidence_angle: f32,
        amount: f32,
    },
    Sank {
        id: u32,
        skip_count: u32,
        point: Vec3,
        amount: f32,
    },
    Deactivated {
        id: u32,
        reason: DeactivationReason,
    },
    /// Body returned to the pool
    Recycled { id: u32 },
}

impl SimEvent {
    /// Build the event for a resolved collision
    pub fn from_collision(
        id: u32,
        kind: CollisionKind,
        skip_count: u32,
        point: Vec3,
        incidence_angle: f32,
        amount: f32,
    ) -> Self {
        match kind {
            CollisionKind::Skip => SimEvent::Skipped {
                id,
                skip_count,
                point,
                incidence_angle,
                amount,
            },
            CollisionKind::Sink => SimEvent::Sank {
                id,
                skip_count,
                point,
                amount,
            },
        }
    }
}

/// World-space height of the water surface above a point
///
/// Outside the simulated plane the surface is flat at the rest level.
pub fn surface_height(field: &WaveField, world: &WorldConfig, pos: Vec3) -> f32 {
    let half_w = world.plane_width * 0.5;
    let half_h = world.plane_height * 0.5;
    if pos.x.abs() > half_w || pos.z.abs() > half_h {
        return world.water_level;
    }
    let uv = world_to_uv(pos, world.plane_width, world.plane_height);
    world.water_level + world.height_scale * field.sample_height(uv)
}

/// Complete simulation context for one session
#[derive(Debug, Clone)]
pub struct SimState {
    pub seed: u64,
    pub field: WaveField,
    pub queue: DisturbanceQueue,
    pub session: ThrowSession,
    pub rng: Pcg32,
    /// Mass that skip speeds and disturbances are scaled against; last valid value
    pub reference_mass: f32,
    rejected_reference_mass: Option<u32>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated seconds
    pub elapsed: f64,
    /// Events from the most recent tick
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Allocate the field and body pool sized by `config`
    pub fn new(config: &SimConfig) -> Self {
        let seed = config.session.seed;
        let field = WaveField::new(&config.wave, config.world.aspect_ratio());
        let session = ThrowSession::new(&config.session, BodyParams::from(&config.body));

        log::info!(
            "Simulation ready: {}x{} grid, {} bodies pooled, seed {:#x}",
            field.resolution(),
            field.resolution(),
            session.total(),
            seed
        );

        let mut state = Self {
            seed,
            field,
            queue: DisturbanceQueue::new(),
            session,
            rng: Pcg32::seed_from_u64(seed),
            reference_mass: BodyConfig::default().reference_mass,
            rejected_reference_mass: None,
            time_ticks: 0,
            elapsed: 0.0,
            events: Vec::new(),
        };
        state.set_reference_mass(config.body.reference_mass);
        state
    }

    /// Take a new reference mass, keeping the previous one if it is not positive
    pub fn set_reference_mass(&mut self, mass: f32) {
        if mass == self.reference_mass {
            return;
        }
        if mass.is_finite() && mass > 0.0 {
            self.reference_mass = mass;
            self.rejected_reference_mass = None;
        } else if self.rejected_reference_mass != Some(mass.to_bits()) {
            self.rejected_reference_mass = Some(mass.to_bits());
            log::warn!(
                "Ignoring reference mass {}, keeping {}",
                mass,
                self.reference_mass
            );
        }
    }

    /// Calm the water, return all bodies and restart the RNG
    pub fn reset(&mut self) {
        self.field.reset();
        self.queue.clear();
        self.session.reset_all();
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.time_ticks = 0;
        self.elapsed = 0.0;
        self.events.clear();
    }

    /// World-space water height at a point, from the current field
    pub fn water_height_at(&self, world: &WorldConfig, pos: Vec3) -> f32 {
        surface_height(&self.field, world, pos)
    }
}
