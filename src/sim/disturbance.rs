//! Pending point disturbances for the wave field
//!
//! The solver injects at most one bump per step, so collisions that land in
//! the same tick wait their turn here.

use std::collections::VecDeque;

use glam::Vec2;

/// A localized height impulse at a UV position on the grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Disturbance {
    /// Position in [0, 1]^2
    pub uv: Vec2,
    /// Peak height added at the center of the bump
    pub amount: f32,
}

impl Disturbance {
    /// Create a disturbance, clamping `uv` into the unit square
    pub fn new(uv: Vec2, amount: f32) -> Self {
        Self {
            uv: uv.clamp(Vec2::ZERO, Vec2::ONE),
            amount,
        }
    }
}

/// FIFO of disturbances waiting for the next `WaveField::advance`
#[derive(Debug, Clone, Default)]
pub struct DisturbanceQueue {
    pending: VecDeque<Disturbance>,
}

impl DisturbanceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a disturbance. Out-of-range coordinates are clamped, not rejected.
    pub fn enqueue(&mut self, uv: Vec2, amount: f32) {
        if !uv.is_finite() || !amount.is_finite() {
            log::warn!("Dropping non-finite disturbance uv={uv:?} amount={amount}");
            return;
        }
        self.pending.push_back(Disturbance::new(uv, amount));
    }

    /// Pop the oldest disturbance, if any
    pub fn dequeue_one(&mut self) -> Option<Disturbance> {
        self.pending.pop_front()
    }

    /// Oldest pending disturbance without removing it
    pub fn peek(&self) -> Option<&Disturbance> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
