//! Height-field wave solver
//!
//! A finite-difference wave equation advanced on an R x R grid of
//! (height, velocity) cells. Two buffers alternate roles every step: all cells
//! read the previous buffer and write the other one, so no cell ever sees a
//! half-updated neighbor.
//!
//! Boundary: neighbor reads past the edge return the edge cell itself. This
//! behaves like a zero-gradient wall, which is an approximation rather than a
//! true reflective boundary; waves lose some shape when they hit it.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use super::disturbance::Disturbance;
use crate::config::WaveConfig;
use crate::smoothstep;

/// One grid sample. Layout matches an `Rg32Float` texel.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct WaveCell {
    pub height: f32,
    pub velocity: f32,
}

/// Outcome of a single `advance` call
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepReport {
    /// Step length actually integrated (after clamping and scaling)
    pub dt: f32,
    /// Whether a disturbance was injected this step
    pub disturbed: bool,
    /// Cells reset or clamped by the finite-value guard
    pub repaired: usize,
}

/// Read-only view of the current height buffer
#[derive(Debug, Clone, Copy)]
pub struct HeightSnapshot<'a> {
    cells: &'a [WaveCell],
    resolution: usize,
}

impl<'a> HeightSnapshot<'a> {
    pub fn cells(&self) -> &'a [WaveCell] {
        self.cells
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Height at a grid cell, with edge-replicated lookups outside the grid
    #[inline]
    pub fn height_at(&self, i: isize, j: isize) -> f32 {
        let max = self.resolution as isize - 1;
        let i = i.clamp(0, max) as usize;
        let j = j.clamp(0, max) as usize;
        self.cells[j * self.resolution + i].height
    }

    /// Bilinear height lookup at a UV position (clamped into the unit square)
    pub fn sample(&self, uv: Vec2) -> f32 {
        if !uv.is_finite() {
            return 0.0;
        }
        let uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
        let r = self.resolution as f32;
        // Cell centers sit at (i + 0.5) / r
        let x = (uv.x * r - 0.5).clamp(0.0, r - 1.0);
        let y = (uv.y * r - 0.5).clamp(0.0, r - 1.0);
        let i0 = x.floor() as isize;
        let j0 = y.floor() as isize;
        let fx = x - i0 as f32;
        let fy = y - j0 as f32;

        let h00 = self.height_at(i0, j0);
        let h10 = self.height_at(i0 + 1, j0);
        let h01 = self.height_at(i0, j0 + 1);
        let h11 = self.height_at(i0 + 1, j0 + 1);

        let bottom = h00 + (h10 - h00) * fx;
        let top = h01 + (h11 - h01) * fx;
        bottom + (top - bottom) * fy
    }

    /// World-space surface normal at a UV position via central differences
    pub fn normal_at(&self, uv: Vec2, plane_width: f32, plane_height: f32, height_scale: f32) -> Vec3 {
        let step = 1.0 / self.resolution as f32;
        let du = Vec2::new(step, 0.0);
        let dv = Vec2::new(0.0, step);

        let dh_du = self.sample(uv + du) - self.sample(uv - du);
        let dh_dv = self.sample(uv + dv) - self.sample(uv - dv);

        // World z runs opposite to v
        let dh_dx = dh_du * height_scale / (2.0 * step * plane_width);
        let dh_dz = dh_dv * height_scale / (-2.0 * step * plane_height);

        Vec3::new(-dh_dx, 1.0, -dh_dz).normalize()
    }
}

/// Double-buffered height field
#[derive(Debug, Clone)]
pub struct WaveField {
    resolution: usize,
    aspect_ratio: f32,
    viscosity: f32,
    max_step: f32,
    speed_multiplier: f32,
    disturbance_radius: f32,
    max_abs_height: f32,
    /// Last resolution asked for by a config update, to warn once per change
    requested_resolution: usize,
    buffers: [Vec<WaveCell>; 2],
    /// Index of the buffer holding the latest state
    current: usize,
    steps: u64,
}

impl WaveField {
    /// Allocate a field at rest
    pub fn new(config: &WaveConfig, aspect_ratio: f32) -> Self {
        assert!(config.resolution >= 2, "wave field needs at least 2x2 cells");
        assert!(
            aspect_ratio.is_finite() && aspect_ratio > 0.0,
            "aspect ratio must be positive"
        );

        let cells = config.resolution * config.resolution;
        let mut field = Self {
            resolution: config.resolution,
            aspect_ratio,
            viscosity: 0.0,
            max_step: 0.0,
            speed_multiplier: 0.0,
            disturbance_radius: 0.0,
            max_abs_height: 0.0,
            requested_resolution: config.resolution,
            buffers: [vec![WaveCell::default(); cells], vec![WaveCell::default(); cells]],
            current: 0,
            steps: 0,
        };
        field.apply_config(config, aspect_ratio);
        field
    }

    /// Pick up live parameter changes. Resolution is fixed at construction.
    pub fn apply_config(&mut self, config: &WaveConfig, aspect_ratio: f32) {
        if config.resolution != self.resolution && config.resolution != self.requested_resolution {
            log::warn!(
                "Ignoring resolution change {} -> {} (field is allocated once)",
                self.resolution,
                config.resolution
            );
        }
        self.requested_resolution = config.resolution;
        if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
            self.aspect_ratio = aspect_ratio;
        }
        self.viscosity = config.viscosity.clamp(0.0, 1.0);
        self.max_step = config.max_step.max(0.0);
        self.speed_multiplier = config.speed_multiplier.max(0.0);
        self.disturbance_radius = config.disturbance_radius.max(f32::EPSILON);
        self.max_abs_height = config.max_abs_height.abs();
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn viscosity(&self) -> f32 {
        self.viscosity
    }

    /// Steps advanced since construction or the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Largest step the explicit scheme stays stable at for this aspect ratio
    pub fn stability_limit(&self) -> f32 {
        let inv_aspect_sq = 1.0 / (self.aspect_ratio * self.aspect_ratio);
        0.95 / (inv_aspect_sq + 1.0).sqrt()
    }

    /// Map a frame delta onto the step the solver integrates
    pub fn effective_step(&self, delta_time: f32) -> f32 {
        if !delta_time.is_finite() || delta_time <= 0.0 {
            return 0.0;
        }
        (delta_time.min(self.max_step) * self.speed_multiplier).min(self.stability_limit())
    }

    /// Read-only view of the latest state
    pub fn snapshot(&self) -> HeightSnapshot<'_> {
        HeightSnapshot {
            cells: &self.buffers[self.current],
            resolution: self.resolution,
        }
    }

    /// Height of the latest state at a UV position
    pub fn sample_height(&self, uv: Vec2) -> f32 {
        self.snapshot().sample(uv)
    }

    pub fn cell(&self, i: usize, j: usize) -> WaveCell {
        self.buffers[self.current][j * self.resolution + i]
    }

    /// Overwrite a cell of the current state (initial conditions, tooling)
    pub fn set_cell(&mut self, i: usize, j: usize, cell: WaveCell) {
        let idx = j * self.resolution + i;
        self.buffers[self.current][idx] = cell;
    }

    /// UV coordinate of a cell center
    pub fn cell_uv(&self, i: usize, j: usize) -> Vec2 {
        let r = self.resolution as f32;
        Vec2::new((i as f32 + 0.5) / r, (j as f32 + 0.5) / r)
    }

    /// Return every cell to rest
    pub fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(WaveCell::default());
        }
        self.current = 0;
        self.steps = 0;
    }

    /// Advance the field one step, injecting at most one disturbance
    pub fn advance(&mut self, delta_time: f32, disturbance: Option<Disturbance>) -> StepReport {
        let dt = self.effective_step(delta_time);
        let r = self.resolution;
        let inv_aspect_sq = 1.0 / (self.aspect_ratio * self.aspect_ratio);
        let damping = (1.0 - self.viscosity * dt).max(0.0);
        let bump = disturbance.map(|d| Bump::new(d, self.disturbance_radius, self.aspect_ratio));

        let [a, b] = &mut self.buffers;
        let (src, dst) = if self.current == 0 { (&*a, b) } else { (&*b, a) };

        for j in 0..r {
            let row = j * r;
            let row_down = j.saturating_sub(1) * r;
            let row_up = (j + 1).min(r - 1) * r;
            for i in 0..r {
                let cell = src[row + i];
                let h = cell.height;
                let left = src[row + i.saturating_sub(1)].height;
                let right = src[row + (i + 1).min(r - 1)].height;
                let down = src[row_down + i].height;
                let up = src[row_up + i].height;

                let laplacian = (left + right - 2.0 * h) * inv_aspect_sq + (down + up - 2.0 * h);

                let mut velocity = cell.velocity + laplacian * dt;
                let mut height = h + velocity * dt;
                height *= damping;
                velocity *= damping;

                if let Some(bump) = &bump {
                    height += bump.height_at(i, j, r);
                }

                dst[row + i] = WaveCell { height, velocity };
            }
        }

        let repaired = repair_cells(dst, self.max_abs_height);
        if repaired > 0 {
            log::warn!("Wave step {} repaired {} non-finite or runaway cells", self.steps, repaired);
        }

        self.current ^= 1;
        self.steps += 1;

        StepReport {
            dt,
            disturbed: bump.is_some(),
            repaired,
        }
    }

    /// Sum of squared heights
    pub fn height_energy(&self) -> f64 {
        self.buffers[self.current]
            .iter()
            .map(|c| (c.height as f64) * (c.height as f64))
            .sum()
    }

    /// Discrete wave energy for steps of length `dt`.
    ///
    /// The undamped update conserves `v.v - h.Lh + dt * v.Lh` exactly, so a
    /// damped, undisturbed step scales this value by `(1 - viscosity * dt)^2`.
    pub fn energy(&self, dt: f32) -> f64 {
        let cells = &self.buffers[self.current];
        let r = self.resolution;
        let inv_aspect_sq = 1.0 / (self.aspect_ratio as f64 * self.aspect_ratio as f64);
        let dt = dt as f64;

        let mut kinetic = 0.0;
        let mut potential = 0.0;
        let mut cross = 0.0;
        for j in 0..r {
            for i in 0..r {
                let h = |ii: usize, jj: usize| cells[jj * r + ii].height as f64;
                let c = cells[j * r + i];
                let hc = c.height as f64;
                let v = c.velocity as f64;
                let lap = (h(i.saturating_sub(1), j) + h((i + 1).min(r - 1), j) - 2.0 * hc)
                    * inv_aspect_sq
                    + (h(i, j.saturating_sub(1)) + h(i, (j + 1).min(r - 1)) - 2.0 * hc);
                kinetic += v * v;
                potential -= hc * lap;
                cross += v * lap;
            }
        }
        kinetic + potential + dt * cross
    }
}

/// Precomputed disturbance footprint
#[derive(Debug, Clone, Copy)]
struct Bump {
    center: Vec2,
    radius: f32,
    amount: f32,
    aspect_ratio: f32,
}

impl Bump {
    fn new(disturbance: Disturbance, radius: f32, aspect_ratio: f32) -> Self {
        Self {
            center: disturbance.uv,
            radius,
            amount: disturbance.amount,
            aspect_ratio,
        }
    }

    #[inline]
    fn height_at(&self, i: usize, j: usize, resolution: usize) -> f32 {
        let r = resolution as f32;
        let du = ((i as f32 + 0.5) / r - self.center.x) * self.aspect_ratio;
        let dv = (j as f32 + 0.5) / r - self.center.y;
        if du.abs() >= self.radius || dv.abs() >= self.radius {
            return 0.0;
        }
        let distance = (du * du + dv * dv).sqrt();
        smoothstep(self.radius, 0.0, distance) * self.amount
    }
}

/// Reset non-finite cells and clamp runaway heights. Returns the number touched.
fn repair_cells(cells: &mut [WaveCell], max_abs_height: f32) -> usize {
    let mut repaired = 0;
    for cell in cells.iter_mut() {
        if !cell.height.is_finite() || !cell.velocity.is_finite() {
            *cell = WaveCell::default();
            repaired += 1;
        } else if cell.height.abs() > max_abs_height {
            cell.height = cell.height.clamp(-max_abs_height, max_abs_height);
            repaired += 1;
        }
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(resolution: usize) -> WaveConfig {
        WaveConfig {
            resolution,
            ..Default::default()
        }
    }

    #[test]
    fn test_rest_state_is_fixed_point() {
        let mut field = WaveField::new(&test_config(32), 1.0);
        for _ in 0..50 {
            field.advance(1.0 / 60.0, None);
        }
        assert!(field.snapshot().cells().iter().all(|c| *c == WaveCell::default()));
    }

    #[test]
    fn test_disturbance_bump_is_local() {
        let mut field = WaveField::new(&test_config(64), 1.0);
        let report = field.advance(1.0 / 60.0, Some(Disturbance::new(Vec2::splat(0.5), 0.3)));
        assert!(report.disturbed);

        let center = field.sample_height(Vec2::splat(0.5));
        assert!(center > 0.0);
        assert_eq!(field.cell(0, 0).height, 0.0);
        assert_eq!(field.cell(63, 63).height, 0.0);
    }

    #[test]
    fn test_buffers_swap_without_reallocation() {
        let mut field = WaveField::new(&test_config(16), 1.0);
        let ptrs = [field.buffers[0].as_ptr(), field.buffers[1].as_ptr()];
        field.advance(1.0 / 60.0, None);
        assert_eq!(field.current, 1);
        field.advance(1.0 / 60.0, None);
        assert_eq!(field.current, 0);
        assert_eq!(ptrs, [field.buffers[0].as_ptr(), field.buffers[1].as_ptr()]);
    }

    #[test]
    fn test_energy_scales_by_damping() {
        let mut field = WaveField::new(&test_config(24), 1.0);
        field.advance(1.0 / 60.0, Some(Disturbance::new(Vec2::new(0.4, 0.6), 0.5)));

        let dt = field.effective_step(1.0 / 60.0);
        let damping = (1.0 - field.viscosity() * dt) as f64;
        for _ in 0..40 {
            let before = field.energy(dt);
            field.advance(1.0 / 60.0, None);
            let after = field.energy(dt);
            let expected = before * damping * damping;
            assert!((after - expected).abs() <= 1e-4 * before.max(1e-6));
            assert!(after <= before + 1e-9);
        }
    }

    #[test]
    fn test_effective_step_clamps() {
        let field = WaveField::new(&test_config(16), 1.0);
        assert_eq!(field.effective_step(f32::NAN), 0.0);
        assert_eq!(field.effective_step(-1.0), 0.0);
        // A long frame hits the same step as a max-length frame
        assert_eq!(field.effective_step(1.0), field.effective_step(1.0 / 60.0));
        assert!(field.effective_step(1.0) <= field.stability_limit());
    }

    #[test]
    fn test_non_finite_cells_repaired() {
        let mut field = WaveField::new(&test_config(8), 1.0);
        field.set_cell(3, 3, WaveCell { height: f32::NAN, velocity: 0.0 });
        let report = field.advance(1.0 / 60.0, None);
        assert!(report.repaired > 0);
        assert!(field.snapshot().cells().iter().all(|c| c.height.is_finite() && c.velocity.is_finite()));
    }

    #[test]
    fn test_bilinear_sample_between_cells() {
        let mut field = WaveField::new(&test_config(4), 1.0);
        field.set_cell(1, 1, WaveCell { height: 1.0, velocity: 0.0 });
        // Exactly at the cell center
        assert!((field.sample_height(field.cell_uv(1, 1)) - 1.0).abs() < 1e-6);
        // Halfway toward the next cell in u
        let mid = (field.cell_uv(1, 1) + field.cell_uv(2, 1)) * 0.5;
        assert!((field.sample_height(mid) - 0.5).abs() < 1e-6);
        // Out-of-range UV clamps instead of panicking
        assert_eq!(field.sample_height(Vec2::new(4.0, -2.0)), 0.0);
    }

    #[test]
    fn test_flat_normal_points_up() {
        let field = WaveField::new(&test_config(16), 1.0);
        let n = field.snapshot().normal_at(Vec2::splat(0.5), 20.0, 20.0, 1.0);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_resolution_change_ignored() {
        let mut field = WaveField::new(&test_config(16), 1.0);
        let config = WaveConfig {
            viscosity: 0.5,
            ..test_config(64)
        };
        field.apply_config(&config, 2.0);
        assert_eq!(field.resolution(), 16);
        assert_eq!(field.viscosity(), 0.5);
        assert_eq!(field.aspect_ratio(), 2.0);
    }
}
