//! Property-based tests for the wave field and body lifecycle using proptest
//!
//! These tests verify invariants across random inputs:
//! - Damped wave energy never increases without disturbances
//! - A calm field stays calm
//! - Disturbance UVs always land inside the grid
//! - Every body is either free or active, never both
//! - Sunk bodies never fly again

use glam::{Vec2, Vec3};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use skipping_stones::config::{LaunchConfig, SessionConfig, SkipConfig, WaveConfig, WorldConfig};
use skipping_stones::sim::{
    BodyParams, BodyState, Disturbance, DisturbanceQueue, LaunchRequest, ProjectileBody,
    SkipCollisionResolver, SurfaceCrossing, ThrowSession, WaveCell, WaveField, incidence_angle,
};

const GRID: usize = 12;
const DT: f32 = 1.0 / 60.0;
const WAVE_STEPS: usize = 20;

fn wave_config(viscosity: f32) -> WaveConfig {
    WaveConfig {
        resolution: GRID,
        viscosity,
        ..Default::default()
    }
}

/// Strategy for a grid of small random heights and velocities
fn initial_cells() -> impl Strategy<Value = Vec<(f32, f32)>> {
    prop::collection::vec((-1.0f32..1.0, -0.5f32..0.5), GRID * GRID)
}

/// Pool operations applied in sequence
#[derive(Debug, Clone)]
enum PoolOp {
    Launch,
    Deactivate(usize),
    SinkAndSettle(usize),
    Recycle,
    ResetAll,
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        4 => Just(PoolOp::Launch),
        2 => (0usize..16).prop_map(PoolOp::Deactivate),
        2 => (0usize..16).prop_map(PoolOp::SinkAndSettle),
        2 => Just(PoolOp::Recycle),
        1 => Just(PoolOp::ResetAll),
    ]
}

fn request() -> LaunchRequest {
    LaunchRequest {
        origin: Vec3::new(0.0, 1.0, -5.0),
        aim_direction: Vec3::Z,
        power_distance: 5.0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_energy_never_increases(
        cells in initial_cells(),
        viscosity in 0.005f32..0.5,
        aspect in 0.5f32..2.0,
    ) {
        let mut field = WaveField::new(&wave_config(viscosity), aspect);
        for (idx, (height, velocity)) in cells.into_iter().enumerate() {
            field.set_cell(idx % GRID, idx / GRID, WaveCell { height, velocity });
        }
        let dt = field.effective_step(DT);

        let mut previous = field.energy(dt);
        prop_assert!(previous >= 0.0);
        for _ in 0..WAVE_STEPS {
            field.advance(DT, None);
            let current = field.energy(dt);
            prop_assert!(
                current <= previous + 1e-6 * (1.0 + previous),
                "energy rose from {} to {}", previous, current
            );
            previous = current;
        }
    }

    #[test]
    fn prop_rest_is_fixed_point(
        steps in 1usize..200,
        dt in 0.0f32..0.2,
        viscosity in 0.0f32..1.0,
    ) {
        let mut field = WaveField::new(&wave_config(viscosity), 1.0);
        for _ in 0..steps {
            field.advance(dt, None);
        }
        prop_assert!(field.snapshot().cells().iter().all(|c| c.height == 0.0 && c.velocity == 0.0));
    }

    #[test]
    fn prop_disturbance_uv_clamped(
        u in -1.0e6f32..1.0e6,
        v in -1.0e6f32..1.0e6,
        amount in 0.0f32..1.0,
    ) {
        let mut queue = DisturbanceQueue::new();
        queue.enqueue(Vec2::new(u, v), amount);
        let stored = queue.dequeue_one().unwrap();
        prop_assert!((0.0..=1.0).contains(&stored.uv.x));
        prop_assert!((0.0..=1.0).contains(&stored.uv.y));

        let direct = Disturbance::new(Vec2::new(u, v), amount);
        prop_assert_eq!(direct, stored);
    }

    #[test]
    fn prop_pool_conservation(ops in prop::collection::vec(pool_op(), 1..64)) {
        let config = SessionConfig {
            initial_bodies: 2,
            max_bodies: 5,
            ..Default::default()
        };
        let launch = LaunchConfig::default();
        let mut session = ThrowSession::new(&config, BodyParams::default());

        for op in ops {
            match op {
                PoolOp::Launch => {
                    session.launch_with_params(&request(), BodyParams::default(), &launch);
                }
                PoolOp::Deactivate(i) => {
                    let id = (i % session.total()) as u32;
                    if !session.is_active(id) {
                        continue;
                    }
                    if let Some(body) = session.body_mut(id) {
                        if body.state == BodyState::Flying {
                            body.set_state(BodyState::Inactive);
                        }
                    }
                }
                PoolOp::SinkAndSettle(i) => {
                    let id = (i % session.total()) as u32;
                    if !session.is_active(id) {
                        continue;
                    }
                    if let Some(body) = session.body_mut(id) {
                        if body.state == BodyState::Flying {
                            body.set_state(BodyState::Sunk);
                            body.settled = true;
                        }
                    }
                }
                PoolOp::Recycle => {
                    session.recycle_finished(0.0);
                }
                PoolOp::ResetAll => session.reset_all(),
            }

            prop_assert!(session.is_consistent());
            prop_assert_eq!(session.free_count() + session.active_count(), session.total());
            prop_assert!(session.total() <= config.max_bodies);
        }
    }

    #[test]
    fn prop_sunk_body_never_flies(
        vx in -10.0f32..10.0,
        vy in -20.0f32..-2.0,
        vz in -10.0f32..10.0,
        steps in 1usize..400,
    ) {
        let world = WorldConfig::default();
        let skip = SkipConfig::default();
        let params = BodyParams::default();
        let resolver = SkipCollisionResolver::new(&world, &skip, params.mass);
        let mut queue = DisturbanceQueue::new();
        let mut rng = Pcg32::seed_from_u64(1);

        // Steep enough to sink on contact
        let velocity = Vec3::new(vx, vy, vz);
        prop_assume!(incidence_angle(velocity) >= params.skip_angle_threshold);

        let mut body = ProjectileBody::new(0, params);
        body.launch(Vec3::new(0.0, params.radius, 0.0), velocity);
        let crossing = SurfaceCrossing {
            previous_position: body.position,
            current_position: body.position,
            impact_velocity: velocity,
            incidence_angle: incidence_angle(velocity),
            collision_point: body.position,
            surface_height: world.water_level,
            fraction: 1.0,
        };
        resolver.resolve(&mut body, &crossing, &mut queue, &mut rng);
        prop_assert_eq!(body.state, BodyState::Sunk);

        for _ in 0..steps {
            body.step(DT, &world, &skip, |_| world.water_level);
            prop_assert_ne!(body.state, BodyState::Flying);
        }
    }
}
