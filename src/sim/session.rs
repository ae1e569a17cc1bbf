//! Throw session: a small pool of reusable bodies
//!
//! Every body index is in exactly one of the free list or the active list.
//! Launching moves a body free -> active; finishing (inactive, or sunk and
//! settled long enough) resets it and moves it back.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::body::{BodyParams, BodyState, ProjectileBody};
use crate::config::{LaunchConfig, SessionConfig, SimConfig};

/// A throw as produced by the aiming input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub origin: Vec3,
    /// Horizontal aim direction (the Y component is ignored)
    pub aim_direction: Vec3,
    /// How far the player pulled; mapped onto speed by the launch curve
    pub power_distance: f32,
}

/// Result of a successful launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Launched {
    pub id: u32,
    /// Body that was cut short to make room, when the pool was exhausted
    pub recycled: Option<u32>,
}

/// Initial velocity for a launch request
pub fn launch_velocity(request: &LaunchRequest, config: &LaunchConfig) -> Vec3 {
    let mut dir = Vec3::new(request.aim_direction.x, 0.0, request.aim_direction.z).normalize_or_zero();
    if dir == Vec3::ZERO {
        dir = Vec3::Z;
    }

    let t = if request.power_distance.is_finite() {
        (request.power_distance / config.max_power_distance).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let speed = config.min_speed + (config.max_speed - config.min_speed) * t.powf(config.power_curve);

    dir * speed + Vec3::Y * (config.upward_bias + config.upward_factor * speed)
}

/// Pool of bodies and the launch lifecycle
#[derive(Debug, Clone)]
pub struct ThrowSession {
    bodies: Vec<ProjectileBody>,
    /// Free body indices (reused LIFO)
    free: Vec<usize>,
    /// Active body indices in launch order
    active: Vec<usize>,
    max_bodies: usize,
    launches: u64,
}

impl ThrowSession {
    pub fn new(config: &SessionConfig, params: BodyParams) -> Self {
        assert!(config.max_bodies > 0, "session needs room for at least one body");
        let initial = config.initial_bodies.min(config.max_bodies);
        let bodies: Vec<ProjectileBody> = (0..initial)
            .map(|i| ProjectileBody::new(i as u32, params))
            .collect();
        // Pop order hands out the lowest id first
        let free = (0..initial).rev().collect();
        Self {
            bodies,
            free,
            active: Vec::new(),
            max_bodies: config.max_bodies,
            launches: 0,
        }
    }

    /// Pick up a new body cap. Existing bodies are never dropped.
    pub fn set_max_bodies(&mut self, max_bodies: usize) {
        self.max_bodies = max_bodies.max(1);
    }

    /// Launch with the configured default body parameters
    pub fn launch(&mut self, request: &LaunchRequest, config: &SimConfig) -> Launched {
        self.launch_with_params(request, BodyParams::from(&config.body), &config.launch)
    }

    /// Launch with explicit per-body parameters
    pub fn launch_with_params(
        &mut self,
        request: &LaunchRequest,
        params: BodyParams,
        launch: &LaunchConfig,
    ) -> Launched {
        let (index, recycled) = self.acquire();
        let velocity = launch_velocity(request, launch);

        let body = &mut self.bodies[index];
        body.params = params;
        body.launch(request.origin, velocity);
        self.active.push(index);
        self.launches += 1;

        log::info!(
            "Launched body {} from {:?} at {:.2} m/s",
            body.id,
            request.origin,
            velocity.length()
        );

        Launched {
            id: body.id,
            recycled,
        }
    }

    /// Take a free body, grow the pool, or cut short the oldest active body
    fn acquire(&mut self) -> (usize, Option<u32>) {
        if let Some(index) = self.free.pop() {
            return (index, None);
        }
        if self.bodies.len() < self.max_bodies {
            let index = self.bodies.len();
            let params = self.bodies.last().map(|b| b.params).unwrap_or_default();
            self.bodies.push(ProjectileBody::new(index as u32, params));
            return (index, None);
        }

        assert!(!self.active.is_empty(), "pool has no free or active bodies");
        let index = self.active.remove(0);
        let body = &mut self.bodies[index];
        log::debug!("Pool exhausted, recycling body {}", body.id);
        body.reset();
        (index, Some(body.id))
    }

    /// Move finished bodies back to the pool. Returns the recycled ids.
    pub fn recycle_finished(&mut self, sunk_linger_secs: f32) -> Vec<u32> {
        let mut recycled = Vec::new();
        let bodies = &mut self.bodies;
        let free = &mut self.free;

        self.active.retain(|&index| {
            let body = &mut bodies[index];
            let done = match body.state {
                BodyState::Inactive => true,
                BodyState::Sunk => body.settled && body.state_time >= sunk_linger_secs,
                BodyState::Flying => false,
            };
            if done {
                recycled.push(body.id);
                body.reset();
                free.push(index);
            }
            !done
        });

        recycled
    }

    /// Return every body to the pool
    pub fn reset_all(&mut self) {
        for index in self.active.drain(..) {
            self.bodies[index].reset();
            self.free.push(index);
        }
    }

    /// Active bodies, ordered by id
    pub fn active_bodies(&self) -> impl Iterator<Item = &ProjectileBody> {
        let active = &self.active;
        self.bodies
            .iter()
            .filter(move |b| active.contains(&(b.id as usize)))
    }

    /// Mutable active bodies, ordered by id
    pub fn active_bodies_mut(&mut self) -> impl Iterator<Item = &mut ProjectileBody> {
        let active = &self.active;
        self.bodies
            .iter_mut()
            .filter(move |b| active.contains(&(b.id as usize)))
    }

    pub fn body(&self, id: u32) -> Option<&ProjectileBody> {
        self.bodies.get(id as usize)
    }

    pub fn body_mut(&mut self, id: u32) -> Option<&mut ProjectileBody> {
        self.bodies.get_mut(id as usize)
    }

    pub fn bodies(&self) -> &[ProjectileBody] {
        &self.bodies
    }

    pub fn is_active(&self, id: u32) -> bool {
        self.active.contains(&(id as usize))
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Bodies ever created
    pub fn total(&self) -> usize {
        self.bodies.len()
    }

    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Every body is in exactly one of the free or active lists
    pub fn is_consistent(&self) -> bool {
        if self.free.len() + self.active.len() != self.bodies.len() {
            return false;
        }
        let mut seen = vec![false; self.bodies.len()];
        for &index in self.free.iter().chain(self.active.iter()) {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return false,
            }
        }
        self.free.iter().all(|&i| self.bodies[i].state == BodyState::Inactive)
    }
}
