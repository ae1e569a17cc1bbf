//! Deterministic simulation module
//!
//! All water and body logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body ID)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod disturbance;
pub mod session;
pub mod state;
pub mod tick;
pub mod wave;

pub use body::{BodyParams, BodyState, DeactivationReason, ProjectileBody, StepOutcome, SurfaceCrossing};
pub use collision::{CollisionKind, CollisionOutcome, SkipCollisionResolver, incidence_angle};
pub use disturbance::{Disturbance, DisturbanceQueue};
pub use session::{LaunchRequest, Launched, ThrowSession, launch_velocity};
pub use state::{SimEvent, SimState, surface_height};
pub use tick::{MAX_BODY_DT, TickInput, tick};
pub use wave::{HeightSnapshot, StepReport, WaveCell, WaveField};
