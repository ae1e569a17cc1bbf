//! Simulation configuration
//!
//! Plain numeric parameters read once at construction. Everything except the
//! grid resolution may be changed between ticks without resetting the simulation.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Grid resolution preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GridPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl GridPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridPreset::Low => "Low",
            GridPreset::Medium => "Medium",
            GridPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(GridPreset::Low),
            "medium" | "med" => Some(GridPreset::Medium),
            "high" => Some(GridPreset::High),
            _ => None,
        }
    }

    /// Cells per side of the height field
    pub fn resolution(&self) -> usize {
        match self {
            GridPreset::Low => 128,
            GridPreset::Medium => 256,
            GridPreset::High => 512,
        }
    }
}

/// Height-field solver parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Cells per side (R x R grid). Fixed after construction.
    pub resolution: usize,
    /// Damping coefficient (0-1)
    pub viscosity: f32,
    /// Largest frame delta fed to the solver, in seconds
    pub max_step: f32,
    /// Simulation-time multiplier applied after clamping to `max_step`
    pub speed_multiplier: f32,
    /// Radius of an injected bump in UV units
    pub disturbance_radius: f32,
    /// Heights beyond this magnitude are clamped after each step
    pub max_abs_height: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            resolution: GridPreset::Medium.resolution(),
            viscosity: 0.02,
            max_step: 1.0 / 60.0,
            speed_multiplier: 30.0,
            disturbance_radius: 0.03,
            max_abs_height: 10.0,
        }
    }
}

/// Scene geometry shared by the field and the bodies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Physical extent of the water plane along X
    pub plane_width: f32,
    /// Physical extent of the water plane along Z
    pub plane_height: f32,
    /// Rest height of the water surface
    pub water_level: f32,
    /// World units per unit of simulated height
    pub height_scale: f32,
    /// Gravity magnitude (acceleration along -Y)
    pub gravity: f32,
    /// Depth at which sunk bodies come to rest
    pub floor_depth: f32,
    /// Horizontal slack beyond the plane before a body is deactivated
    pub bounds_margin: f32,
    /// Distance below the floor that counts as escaped
    pub below_floor_margin: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            plane_width: 20.0,
            plane_height: 20.0,
            water_level: 0.0,
            height_scale: 1.0,
            gravity: 5.0,
            floor_depth: -2.0,
            bounds_margin: 1.0,
            below_floor_margin: 1.0,
        }
    }
}

impl WorldConfig {
    /// Physical width / height of the mapped surface
    pub fn aspect_ratio(&self) -> f32 {
        self.plane_width / self.plane_height
    }
}

/// Default physical constants copied into each body at launch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub radius: f32,
    pub mass: f32,
    /// Mass at which `min_skip_velocity` applies unscaled
    pub reference_mass: f32,
    pub drag_coefficient: f32,
    pub elasticity: f32,
    pub skips_before_sink: u32,
    pub min_skip_velocity: f32,
    pub skip_angle_threshold: f32,
    /// Flight time after which a body is forcibly deactivated
    pub max_flight_secs: f32,
    /// Speed above which the integrator sub-steps
    pub high_speed_threshold: f32,
    pub max_sub_steps: u32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            radius: 0.15,
            mass: 0.2,
            reference_mass: 0.2,
            drag_coefficient: 0.0004,
            elasticity: 0.8,
            skips_before_sink: 5,
            min_skip_velocity: 0.8,
            skip_angle_threshold: 17f32.to_radians(),
            max_flight_secs: 20.0,
            high_speed_threshold: 5.0,
            max_sub_steps: 8,
        }
    }
}

/// Skip/sink response tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Horizontal velocity kept per skip
    pub horizontal_retention: f32,
    /// Max magnitude of each random spin component after a skip (rad/s)
    pub spin_range: f32,
    /// Multiplier on `speed^2.5 * radius^2` for the disturbance amount
    pub disturbance_scale: f32,
    pub max_disturbance: f32,
    pub sink_disturbance_multiplier: f32,
    /// Fraction of velocity kept on sinking
    pub sink_velocity_retention: f32,
    /// Minimum downward speed forced on sinking
    pub sink_min_downward_speed: f32,
    pub sink_spin_retention: f32,
    /// Gravity multiplier while sunk
    pub underwater_gravity_scale: f32,
    /// Linear drag rate while sunk (1/s)
    pub underwater_drag: f32,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            horizontal_retention: 0.95,
            spin_range: 20.0,
            disturbance_scale: 0.01,
            max_disturbance: 0.5,
            sink_disturbance_multiplier: 2.0,
            sink_velocity_retention: 0.3,
            sink_min_downward_speed: 0.5,
            sink_spin_retention: 0.5,
            underwater_gravity_scale: 0.3,
            underwater_drag: 4.0,
        }
    }
}

/// Aim-to-velocity curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub min_speed: f32,
    pub max_speed: f32,
    /// Power distance that maps to `max_speed`
    pub max_power_distance: f32,
    /// Exponent shaping the distance to speed curve
    pub power_curve: f32,
    /// Constant upward velocity added to every throw
    pub upward_bias: f32,
    /// Extra upward velocity per unit of horizontal speed
    pub upward_factor: f32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            min_speed: 4.0,
            max_speed: 16.0,
            max_power_distance: 10.0,
            power_curve: 1.0,
            upward_bias: 0.5,
            upward_factor: 0.05,
        }
    }
}

/// Body pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Bodies created up front
    pub initial_bodies: usize,
    /// Hard cap on bodies ever created
    pub max_bodies: usize,
    /// Seconds a settled sunk body stays visible before recycling
    pub sunk_linger_secs: f32,
    /// RNG seed for spin and other randomized responses
    pub seed: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_bodies: 4,
            max_bodies: 8,
            sunk_linger_secs: 2.0,
            seed: 0x5EED_57_0E,
        }
    }
}

/// Complete simulation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub wave: WaveConfig,
    pub world: WorldConfig,
    pub body: BodyConfig,
    pub skip: SkipConfig,
    pub launch: LaunchConfig,
    pub session: SessionConfig,
}

impl SimConfig {
    /// Create a config with the given grid preset applied
    pub fn from_preset(preset: GridPreset) -> Self {
        let mut config = Self::default();
        config.wave.resolution = preset.resolution();
        config
    }

    /// Parse a (possibly partial) JSON document and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject parameter combinations the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn check(ok: bool, msg: &str) -> Result<(), ConfigError> {
            if ok {
                Ok(())
            } else {
                Err(ConfigError::Invalid(msg.to_string()))
            }
        }

        check(self.wave.resolution >= 4, "wave.resolution must be at least 4")?;
        check(
            (0.0..=1.0).contains(&self.wave.viscosity),
            "wave.viscosity must be within [0, 1]",
        )?;
        check(self.wave.max_step > 0.0, "wave.max_step must be positive")?;
        check(
            self.wave.speed_multiplier > 0.0,
            "wave.speed_multiplier must be positive",
        )?;
        check(
            self.wave.disturbance_radius > 0.0,
            "wave.disturbance_radius must be positive",
        )?;
        check(
            self.world.plane_width > 0.0 && self.world.plane_height > 0.0,
            "world plane size must be positive",
        )?;
        check(
            self.world.floor_depth < self.world.water_level,
            "world.floor_depth must lie below world.water_level",
        )?;
        check(
            self.body.mass > 0.0 && self.body.reference_mass > 0.0,
            "body masses must be positive",
        )?;
        check(self.body.radius > 0.0, "body.radius must be positive")?;
        check(
            self.body.drag_coefficient >= 0.0,
            "body.drag_coefficient must not be negative",
        )?;
        check(
            self.body.skip_angle_threshold > 0.0
                && self.body.skip_angle_threshold < std::f32::consts::FRAC_PI_2,
            "body.skip_angle_threshold must be within (0, pi/2)",
        )?;
        check(self.body.max_sub_steps >= 2, "body.max_sub_steps must be at least 2")?;
        check(
            self.launch.max_speed >= self.launch.min_speed,
            "launch.max_speed must not be below launch.min_speed",
        )?;
        check(
            self.launch.max_power_distance > 0.0,
            "launch.max_power_distance must be positive",
        )?;
        check(self.session.max_bodies > 0, "session.max_bodies must be positive")?;
        check(
            self.session.initial_bodies <= self.session.max_bodies,
            "session.initial_bodies must not exceed session.max_bodies",
        )?;
        Ok(())
    }
}
