pub mod buf;
pub mod clip;
pub mod config;
pub mod context;
pub mod lines;
pub mod obj;
pub mod pipeline;
pub mod project;
pub mod raster;
pub mod shaders;
pub mod texture;
pub mod utils;
pub mod vec;
pub mod vertex;

use vec::{Vec3, Vec4};

pub type Pixel = [u8; 4];

/// Three ordered vertices. Winding matters: the face normal is `(p1 - p0) x (p2 - p0)`.
pub type Triangle = [Vec3; 3];

/// Per-vertex `(u, v, w)` parallel to a [`Triangle`]. `w` is scratch space for `1/w` of the projected vertex,
/// rewritten by the projector on every pass.
pub type UvTriangle = [Vec3; 3];

/// Geometry consumed by the pipeline: a triangle list and, for textured meshes, a parallel list of texture
/// coordinates.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    uvs: Option<Vec<UvTriangle>>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Mesh {
            triangles,
            uvs: None,
        }
    }

    pub fn with_uvs(triangles: Vec<Triangle>, uvs: Vec<UvTriangle>) -> Self {
        assert_eq!(
            triangles.len(),
            uvs.len(),
            "uv list must be parallel to the triangle list"
        );
        Mesh {
            triangles,
            uvs: Some(uvs),
        }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Texture coordinates of triangle `i`, or zeros for untextured meshes.
    pub fn uv(&self, i: usize) -> UvTriangle {
        match &self.uvs {
            Some(uvs) => uvs[i],
            None => [Vec3::zero(); 3],
        }
    }
}

/// Converts a linear `[0, 1]` RGBA color into a pixel. Out of range (and NaN) channels saturate.
pub fn color_to_pixel(c: Vec4) -> Pixel {
    c.to_array().map(|chan| (chan.clamp(0., 1.) * 255.).round() as u8)
}

/// `0xRRGGBBAA` into a pixel.
pub fn hex_to_pixel(rgba: u32) -> Pixel {
    rgba.to_be_bytes()
}
