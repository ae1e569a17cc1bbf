//! Skipping Stones - headless native driver
//!
//! Runs a scripted throw session through the fixed-timestep loop and logs
//! every skip and sink. Pass a JSON config path as the first argument to
//! override the defaults; `RUST_LOG` controls verbosity.

use glam::Vec3;

use skipping_stones::SimConfig;
use skipping_stones::consts::{MAX_SUBSTEPS, SIM_DT};
use skipping_stones::renderer::{HeightUpload, body_model_matrix, build_surface_mesh, height_texture_descriptor};
use skipping_stones::sim::{LaunchRequest, SimEvent, SimState, TickInput, tick};

/// Simulated frame length of the driver (a 50 Hz display against the 60 Hz tick)
const FRAME_DT: f32 = 0.02;
const RUN_SECS: f32 = 12.0;
const MESH_SEGMENTS: u32 = 64;

/// Scripted throws: (start time, request)
fn script() -> Vec<(f32, LaunchRequest)> {
    let throw = |x: f32, aim_x: f32, power: f32| LaunchRequest {
        origin: Vec3::new(x, 0.5, -5.0),
        aim_direction: Vec3::new(aim_x, 0.0, 1.0),
        power_distance: power,
    };
    vec![
        (0.0, throw(0.0, 0.0, 5.0)),
        (1.5, throw(-2.0, 0.1, 8.0)),
        (3.0, throw(2.0, -0.1, 2.0)),
        (4.0, throw(0.0, 0.0, 10.0)),
    ]
}

/// Fixed-timestep loop around the simulation
struct Driver {
    config: SimConfig,
    state: SimState,
    accumulator: f32,
    input: TickInput,
    skips: u32,
    sinks: u32,
}

impl Driver {
    fn new(config: SimConfig) -> Self {
        let state = SimState::new(&config);
        Self {
            config,
            state,
            accumulator: 0.0,
            input: TickInput::default(),
            skips: 0,
            sinks: 0,
        }
    }

    /// Run simulation ticks
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, &self.config, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // One-shot inputs apply to a single tick
            self.input = TickInput::default();
            self.report_events();
        }
    }

    fn report_events(&mut self) {
        for event in &self.state.events {
            match event {
                SimEvent::Skipped {
                    id,
                    skip_count,
                    incidence_angle,
                    amount,
                    ..
                } => {
                    self.skips += 1;
                    log::info!(
                        "Body {} skip #{} at {:.1} deg (disturbance {:.4})",
                        id,
                        skip_count,
                        incidence_angle.to_degrees(),
                        amount
                    );
                }
                SimEvent::Sank { id, skip_count, .. } => {
                    self.sinks += 1;
                    log::info!("Body {} sank after {} skips", id, skip_count);
                }
                SimEvent::Deactivated { id, reason } => {
                    log::info!("Body {} deactivated: {:?}", id, reason);
                }
                SimEvent::Launched { .. } | SimEvent::Recycled { .. } => {}
            }
        }
    }
}

fn load_config() -> SimConfig {
    match std::env::args().nth(1) {
        Some(path) => match SimConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Falling back to default config: {}", e);
                SimConfig::default()
            }
        },
        None => SimConfig::default(),
    }
}

fn main() {
    env_logger::init();
    log::info!("Skipping Stones (headless) starting...");

    let mut driver = Driver::new(load_config());
    let mut pending = script();
    pending.reverse();

    let mut time = 0.0;
    while time < RUN_SECS {
        while pending.last().is_some_and(|(at, _)| *at <= time) {
            if let Some((_, request)) = pending.pop() {
                driver.input.launches.push(request);
            }
        }
        driver.update(FRAME_DT);
        time += FRAME_DT;
    }

    let state = &driver.state;
    let snapshot = state.field.snapshot();
    let mesh = build_surface_mesh(&snapshot, &driver.config.world, MESH_SEGMENTS);
    let texture = height_texture_descriptor(snapshot.resolution());
    let upload = HeightUpload::new(&snapshot, &driver.config.world, state.elapsed as f32);
    log::debug!(
        "Height texture {}x{} {:?}: {} texel bytes, {} uniform bytes",
        texture.size.width,
        texture.size.height,
        texture.format,
        upload.texel_bytes().len(),
        upload.uniform_bytes().len()
    );
    for body in state.session.active_bodies() {
        let model = body_model_matrix(body);
        log::debug!("Body {} transform {:?}", body.id, model);
    }

    println!(
        "{} ticks, {:.2}s simulated: {} launches, {} skips, {} sinks",
        state.time_ticks,
        state.elapsed,
        state.session.launches(),
        driver.skips,
        driver.sinks
    );
    println!(
        "Wave energy {:.6} (sum h^2 {:.6}), surface mesh {} triangles",
        state.field.energy(state.field.effective_step(SIM_DT)),
        state.field.height_energy(),
        mesh.triangle_count()
    );
}
