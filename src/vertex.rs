use serde::Deserialize;

use crate::{
    vec::{Mat4x4, Vec3},
    Triangle, UvTriangle,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CullingMode {
    /// Drop triangles whose normal points away from the camera.
    #[default]
    BackFace,
    FrontFace,
    Disabled,
}

impl CullingMode {
    /// `facing` is `dot(normal, v0 - camera)`: negative when the triangle faces the camera.
    #[inline]
    fn rejects(self, facing: f32) -> bool {
        match self {
            CullingMode::BackFace => facing >= 0.,
            CullingMode::FrontFace => facing < 0.,
            CullingMode::Disabled => false,
        }
    }
}

/// Bounds applied to the raw `dot(light, normal)` intensity.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(from = "[f32; 2]")]
pub struct AmbientFloor {
    pub lo: f32,
    pub hi: f32,
}

impl AmbientFloor {
    pub const fn new(lo: f32, hi: f32) -> Self {
        AmbientFloor { lo, hi }
    }

    #[inline]
    pub fn apply(&self, intensity: f32) -> f32 {
        // NaN intensities fall to `lo`
        intensity.max(self.lo).min(self.hi)
    }
}

impl Default for AmbientFloor {
    fn default() -> Self {
        AmbientFloor::new(0.5, 1.0)
    }
}

impl From<[f32; 2]> for AmbientFloor {
    fn from([lo, hi]: [f32; 2]) -> Self {
        AmbientFloor::new(lo, hi)
    }
}

/// A triangle that survived the transform stage, in view space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTriangle {
    pub points: Triangle,
    pub uv: UvTriangle,
    pub lighting: f32,
}

/// Model to view space transform with flat lighting and face culling.
#[derive(Clone, Copy, Debug)]
pub struct TransformStage {
    pub world: Mat4x4,
    pub view: Mat4x4,
    pub camera: Vec3,
    /// Unit length.
    pub light_dir: Vec3,
    pub culling: CullingMode,
    pub ambient: AmbientFloor,
}

impl TransformStage {
    pub fn exec(&self, tri: &Triangle, uv: &UvTriangle) -> Option<ViewTriangle> {
        let world = tri.map(|p| p.transform(self.world).xyz());

        let normal = (world[1] - world[0])
            .cross(world[2] - world[0])
            .normalized();

        if self.culling.rejects(normal.dot(world[0] - self.camera)) {
            return None;
        }

        let lighting = self.ambient.apply(self.light_dir.dot(normal));

        Some(ViewTriangle {
            points: world.map(|p| p.transform(self.view).xyz()),
            uv: *uv,
            lighting,
        })
    }
}
