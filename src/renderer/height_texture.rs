//! GPU upload of the height field
//!
//! The current wave buffer is copied once per frame into an `Rg32Float`
//! texture (red = height, green = vertical velocity) that downstream shading
//! passes sample for displacement, normals and foam. Everything here is
//! device-free: a renderer feeds these descriptors and bytes to its own
//! `wgpu::Device` and `wgpu::Queue`.

use bytemuck::{Pod, Zeroable};

use crate::config::WorldConfig;
use crate::sim::HeightSnapshot;

pub const HEIGHT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;
const BYTES_PER_TEXEL: u32 = 8;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct WaterUniform {
    plane_size: [f32; 2], // offset 0
    water_level: f32,     // offset 8
    height_scale: f32,    // offset 12
    texel_size: f32,      // offset 16
    time: f32,            // offset 20
    _pad: [u32; 2],       // pad to 32 bytes
}

impl WaterUniform {
    pub fn new(world: &WorldConfig, resolution: usize, time: f32) -> Self {
        Self {
            plane_size: [world.plane_width, world.plane_height],
            water_level: world.water_level,
            height_scale: world.height_scale,
            texel_size: 1.0 / resolution as f32,
            time,
            _pad: [0; 2],
        }
    }
}

/// Interleave heights and velocities into row-major texels
pub fn pack_texels(snapshot: &HeightSnapshot<'_>) -> Vec<[f32; 2]> {
    snapshot
        .cells()
        .iter()
        .map(|cell| [cell.height, cell.velocity])
        .collect()
}

/// Square extent of the height texture for a grid
pub fn texture_extent(resolution: usize) -> wgpu::Extent3d {
    let side = resolution as u32;
    wgpu::Extent3d {
        width: side,
        height: side,
        depth_or_array_layers: 1,
    }
}

/// Descriptor for the per-frame height texture
pub fn height_texture_descriptor(resolution: usize) -> wgpu::TextureDescriptor<'static> {
    assert!(resolution > 0, "height texture needs a non-empty grid");
    wgpu::TextureDescriptor {
        label: Some("height_field"),
        size: texture_extent(resolution),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: HEIGHT_TEXTURE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    }
}

/// Buffer layout for `Queue::write_texture` with tightly packed rows
pub fn texel_copy_layout(resolution: usize) -> wgpu::TexelCopyBufferLayout {
    let side = resolution as u32;
    wgpu::TexelCopyBufferLayout {
        offset: 0,
        bytes_per_row: Some(side * BYTES_PER_TEXEL),
        rows_per_image: Some(side),
    }
}

/// Uniform, height texture and sampler, in binding order
pub fn bind_group_layout_entries() -> [wgpu::BindGroupLayoutEntry; 3] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        // 32-bit float textures are not filterable everywhere; shaders interpolate manually
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 2,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
            count: None,
        },
    ]
}

/// Frame payload for the height texture: packed texels plus the scene uniform
pub struct HeightUpload {
    pub texels: Vec<[f32; 2]>,
    pub uniform: WaterUniform,
    pub layout: wgpu::TexelCopyBufferLayout,
    pub extent: wgpu::Extent3d,
}

impl HeightUpload {
    pub fn new(snapshot: &HeightSnapshot<'_>, world: &WorldConfig, time: f32) -> Self {
        let resolution = snapshot.resolution();
        Self {
            texels: pack_texels(snapshot),
            uniform: WaterUniform::new(world, resolution, time),
            layout: texel_copy_layout(resolution),
            extent: texture_extent(resolution),
        }
    }

    /// Texture bytes for `write_texture`
    pub fn texel_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }

    /// Uniform bytes for `write_buffer`
    pub fn uniform_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.uniform)
    }
}
