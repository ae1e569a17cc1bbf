//! Per-frame simulation tick
//!
//! One tick runs in a fixed order: launch requested bodies, integrate every
//! active body against the same height field, resolve surface crossings, then
//! advance the field once with at most one queued disturbance.

use super::body::StepOutcome;
use super::collision::SkipCollisionResolver;
use super::session::LaunchRequest;
use super::state::{SimEvent, SimState, surface_height};
use crate::config::SimConfig;

/// Longest body step accepted in one tick; longer frames are truncated
pub const MAX_BODY_DT: f32 = 0.1;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Throws to start this tick
    pub launches: Vec<LaunchRequest>,
    /// Calm the water and return every body to the pool before ticking
    pub reset: bool,
}

impl TickInput {
    pub fn launch(request: LaunchRequest) -> Self {
        Self {
            launches: vec![request],
            ..Default::default()
        }
    }
}

/// Advance the simulation by one frame
pub fn tick(state: &mut SimState, input: &TickInput, config: &SimConfig, dt: f32) {
    state.events.clear();

    if input.reset {
        log::info!("Resetting simulation");
        state.reset();
    }

    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_BODY_DT) } else { 0.0 };

    // Live parameter updates, no state reset
    state
        .field
        .apply_config(&config.wave, config.world.aspect_ratio());
    state.session.set_max_bodies(config.session.max_bodies);
    state.set_reference_mass(config.body.reference_mass);

    for request in &input.launches {
        let launched = state.session.launch(request, config);
        if let Some(id) = launched.recycled {
            state.events.push(SimEvent::Recycled { id });
        }
        if let Some(body) = state.session.body(launched.id) {
            state.events.push(SimEvent::Launched {
                id: body.id,
                origin: body.position,
                velocity: body.velocity,
            });
        }
    }

    let SimState {
        field,
        queue,
        session,
        rng,
        events,
        reference_mass,
        ..
    } = &mut *state;
    let world = &config.world;
    let resolver = SkipCollisionResolver::new(world, &config.skip, *reference_mass);

    // The field is read-only until every body has been stepped
    let water_height_at = |pos| surface_height(field, world, pos);
    for body in session.active_bodies_mut() {
        match body.step(dt, world, &config.skip, water_height_at) {
            StepOutcome::Continue => {}
            StepOutcome::Crossing(crossing) => {
                let outcome = resolver.resolve(body, &crossing, queue, rng);
                events.push(SimEvent::from_collision(
                    body.id,
                    outcome.kind,
                    outcome.skip_count,
                    crossing.collision_point,
                    outcome.incidence_angle,
                    outcome.disturbance.amount,
                ));
            }
            StepOutcome::Deactivated(reason) => {
                events.push(SimEvent::Deactivated { id: body.id, reason });
            }
        }
    }

    for id in session.recycle_finished(config.session.sunk_linger_secs) {
        events.push(SimEvent::Recycled { id });
    }

    if queue.len() > 1 {
        log::debug!("{} disturbances waiting for later steps", queue.len() - 1);
    }
    field.advance(dt, queue.dequeue_one());

    state.time_ticks += 1;
    state.elapsed += dt as f64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::body::BodyState;
    use glam::Vec3;

    fn small_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.wave.resolution = 64;
        config
    }

    fn throw() -> LaunchRequest {
        LaunchRequest {
            origin: Vec3::new(0.0, 0.5, -5.0),
            aim_direction: Vec3::Z,
            power_distance: 5.0,
        }
    }

    #[test]
    fn test_tick_launch_emits_event() {
        let config = small_config();
        let mut state = SimState::new(&config);
        tick(&mut state, &TickInput::launch(throw()), &config, SIM_DT);

        assert_eq!(state.session.active_count(), 1);
        assert!(state.events.iter().any(|e| matches!(e, SimEvent::Launched { .. })));
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_throw_eventually_disturbs_field() {
        let config = small_config();
        let mut state = SimState::new(&config);
        tick(&mut state, &TickInput::launch(throw()), &config, SIM_DT);

        let mut skipped = false;
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), &config, SIM_DT);
            skipped |= state.events.iter().any(|e| matches!(e, SimEvent::Skipped { .. }));
        }
        assert!(skipped);
        assert!(state.field.height_energy() > 0.0);
    }

    #[test]
    fn test_sunk_body_never_flies_again() {
        let config = small_config();
        let mut state = SimState::new(&config);
        // Straight down: sinks on first contact
        let request = LaunchRequest {
            origin: Vec3::new(0.0, 2.0, 0.0),
            aim_direction: Vec3::Z,
            power_distance: 0.0,
        };
        tick(&mut state, &TickInput::launch(request), &config, SIM_DT);
        if let Some(body) = state.session.body_mut(0) {
            body.velocity = Vec3::new(0.0, -6.0, 0.0);
        }

        let mut sank = false;
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), &config, SIM_DT);
            let body = state.session.body(0).unwrap();
            if sank && state.session.is_active(0) {
                assert_ne!(body.state, BodyState::Flying);
            }
            sank |= state.events.iter().any(|e| matches!(e, SimEvent::Sank { id: 0, .. }));
        }
        assert!(sank);
    }

    #[test]
    fn test_one_disturbance_per_tick() {
        let config = small_config();
        let mut state = SimState::new(&config);
        for i in 0..3 {
            state.queue.enqueue(glam::Vec2::splat(0.2 + 0.2 * i as f32), 0.1);
        }
        tick(&mut state, &TickInput::default(), &config, SIM_DT);
        assert_eq!(state.queue.len(), 2);
        tick(&mut state, &TickInput::default(), &config, SIM_DT);
        assert_eq!(state.queue.len(), 1);
    }

    #[test]
    fn test_reset_input_clears_everything() {
        let config = small_config();
        let mut state = SimState::new(&config);
        tick(&mut state, &TickInput::launch(throw()), &config, SIM_DT);
        state.queue.enqueue(glam::Vec2::splat(0.5), 0.2);

        let input = TickInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut state, &input, &config, SIM_DT);
        assert_eq!(state.session.active_count(), 0);
        assert!(state.queue.is_empty());
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_determinism() {
        let config = small_config();
        let mut state1 = SimState::new(&config);
        let mut state2 = SimState::new(&config);

        let inputs = [TickInput::launch(throw()), TickInput::default()];
        for _ in 0..120 {
            for input in &inputs {
                tick(&mut state1, input, &config, SIM_DT);
                tick(&mut state2, input, &config, SIM_DT);
            }
        }

        assert_eq!(state1.events, state2.events);
        let a: Vec<Vec3> = state1.session.bodies().iter().map(|b| b.position).collect();
        let b: Vec<Vec3> = state2.session.bodies().iter().map(|b| b.position).collect();
        assert_eq!(a, b);
        assert_eq!(state1.field.snapshot().cells(), state2.field.snapshot().cells());
    }

    #[test]
    fn test_zero_reference_mass_keeps_running() {
        let mut config = small_config();
        let mut state = SimState::new(&config);
        let original = state.reference_mass;
        tick(&mut state, &TickInput::launch(throw()), &config, SIM_DT);

        config.body.reference_mass = 0.0;
        let mut resolved = false;
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), &config, SIM_DT);
            resolved |= state
                .events
                .iter()
                .any(|e| matches!(e, SimEvent::Skipped { .. } | SimEvent::Sank { .. }));
        }
        assert!(resolved);
        assert_eq!(state.reference_mass, original);
    }

    #[test]
    fn test_non_finite_dt_is_ignored() {
        let config = small_config();
        let mut state = SimState::new(&config);
        tick(&mut state, &TickInput::launch(throw()), &config, f32::NAN);
        let body = state.session.body(0).unwrap();
        assert_eq!(body.position, throw().origin);
        assert_eq!(state.elapsed, 0.0);
    }
}
