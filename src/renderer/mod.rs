//! Renderer-facing surface of the simulation
//!
//! Reads the height field and body transforms; never writes simulation state.

pub mod height_texture;
pub mod surface_mesh;
pub mod vertex;

pub use height_texture::{
    HEIGHT_TEXTURE_FORMAT, HeightUpload, WaterUniform, bind_group_layout_entries, height_texture_descriptor,
    pack_texels, texel_copy_layout, texture_extent,
};
pub use surface_mesh::{STONE_FLATNESS, SurfaceMesh, body_model_matrix, build_surface_mesh};
pub use vertex::SurfaceVertex;
