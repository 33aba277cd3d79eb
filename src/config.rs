use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::{
    clip::ClipPlanes,
    context::{Camera as ViewCamera, Projection, RenderContext},
    hex_to_pixel,
    pipeline::PipelineConfig,
    texture::TextureWrap,
    vec::Vec3,
    vertex::{AmbientFloor, CullingMode},
    Pixel,
};

#[derive(Clone, Debug, Deserialize)]
pub struct Scene {
    pub model: Model,
    #[serde(default)]
    pub camera: Camera,
    #[serde(default)]
    pub scene: SceneConfig,
    pub rendering: RenderingConfig,
}

impl Scene {
    /// Reads and validates a scene. Relative model and texture paths are resolved against the scene's directory.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read file {path:?}"))?;
        let mut scene = Self::from_toml(&contents).with_context(|| format!("invalid scene {path:?}"))?;

        let root = path.parent().unwrap_or(Path::new("."));
        scene.model.path = root.join(&scene.model.path);
        if let Some(texture) = scene.model.texture.as_mut() {
            *texture = root.join(&*texture);
        }
        Ok(scene)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let scene: Scene = toml::from_str(contents)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        let r = &self.rendering;
        if r.width == 0 || r.height == 0 {
            bail!("rendering size must be positive, got {}x{}", r.width, r.height);
        }
        if r.fps == 0 {
            bail!("fps must be positive");
        }
        let c = &self.camera;
        if !(c.near > 0. && c.near < c.far) {
            bail!("expected 0 < near < far, got near = {} and far = {}", c.near, c.far);
        }
        if !(c.fovy > 0. && c.fovy < 180.) {
            bail!("fovy must be in (0, 180) degrees, got {}", c.fovy);
        }
        if !(r.ambient.lo <= r.ambient.hi) {
            bail!("ambient floor must satisfy lo <= hi, got [{}, {}]", r.ambient.lo, r.ambient.hi);
        }
        let light = self.scene.light.mag_sq();
        if !(light.is_finite() && light > 0.) {
            bail!("light direction must be a nonzero vector");
        }
        if (c.target - c.position).mag_sq() == 0. {
            bail!("camera target must differ from its position");
        }
        Ok(())
    }

    pub fn render_context(&self) -> RenderContext {
        let camera = ViewCamera {
            position: self.camera.position,
            target: self.camera.target,
            up: self.camera.up.into_vec(),
        };
        let projection = Projection {
            fovy: self.camera.fovy,
            aspect: self.rendering.width as f32 / self.rendering.height as f32,
            near: self.camera.near,
            far: self.camera.far,
        };
        let mut ctx = RenderContext::new(camera, projection);
        ctx.rotation = self.scene.rotation.map(f32::to_radians);
        ctx.set_light_dir(self.scene.light);
        ctx
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        let r = &self.rendering;
        PipelineConfig {
            culling: r.culling_mode,
            wireframe: r.wireframe,
            clip_planes: r.clip_planes,
            ambient: r.ambient,
            clear_color: r.clear_color,
            parallel: r.parallel,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Model {
    pub path: PathBuf,
    #[serde(default)]
    pub texture: Option<PathBuf>,
    #[serde(default, rename = "texture-wrap")]
    pub texture_wrap: TextureWrap,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct Camera {
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub position: Vec3,
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub target: Vec3,
    pub up: Axis,
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    /// Distance covered by one forward or backward step
    pub speed: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            position: Vec3::zero(),
            target: Vec3::from([0., 0., 1.]),
            up: Axis::Y,
            fovy: 40.,
            near: 0.1,
            far: 500.,
            speed: 8.,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Euler angles measured in degrees
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub rotation: Vec3,
    #[serde(deserialize_with = "detail::deser_vec3")]
    pub light: Vec3,
}

impl Default for SceneConfig {
    fn default() -> Self {
        SceneConfig {
            rotation: Vec3::zero(),
            light: Vec3::from([-1., -1., 0.]),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
pub enum Axis {
    #[serde(rename = "x")]
    X,
    #[serde(rename = "-x")]
    NegativeX,
    #[serde(rename = "y")]
    Y,
    #[serde(rename = "-y")]
    NegativeY,
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "-z")]
    NegativeZ,
}

impl Axis {
    pub fn into_vec(self) -> Vec3 {
        use Axis::*;

        match self {
            X => Vec3::from([1., 0., 0.]),
            NegativeX => Vec3::from([-1., 0., 0.]),
            Y => Vec3::from([0., 1., 0.]),
            NegativeY => Vec3::from([0., -1., 0.]),
            Z => Vec3::from([0., 0., 1.]),
            NegativeZ => Vec3::from([0., 0., -1.]),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RenderingConfig {
    pub width: usize,
    pub height: usize,
    #[serde(default = "RenderingConfig::default_fps")]
    pub fps: u32,
    #[serde(default, rename = "cull-mode")]
    pub culling_mode: CullingMode,
    /// Outline color, no outlines when absent
    #[serde(default, deserialize_with = "RenderingConfig::deserialize_wireframe")]
    pub wireframe: Option<Pixel>,
    #[serde(default)]
    pub clip_planes: ClipPlanes,
    #[serde(default)]
    pub ambient: AmbientFloor,
    #[serde(
        default = "RenderingConfig::default_clear_color",
        deserialize_with = "RenderingConfig::deserialize_clear_color"
    )]
    pub clear_color: Pixel,
    #[serde(default)]
    pub parallel: bool,
}

impl RenderingConfig {
    pub fn default_fps() -> u32 {
        60
    }

    pub fn default_clear_color() -> Pixel {
        hex_to_pixel(0x00_00_00_ff)
    }

    fn deserialize_clear_color<'de, D: serde::Deserializer<'de>>(deser: D) -> Result<Pixel, D::Error> {
        detail::deser_hex_color(deser)
    }

    fn deserialize_wireframe<'de, D: serde::Deserializer<'de>>(deser: D) -> Result<Option<Pixel>, D::Error> {
        detail::deser_hex_color(deser).map(Some)
    }
}

mod detail {
    use serde::de::{Deserialize, Deserializer, Error};

    use crate::{hex_to_pixel, vec::Vec3, Pixel};

    pub fn deser_vec3<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Vec3::from(<[f32; 3] as Deserialize>::deserialize(deserializer)?))
    }

    /// `"#rrggbb"`, fully opaque.
    pub fn deser_hex_color<'de, D>(deserializer: D) -> Result<Pixel, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_color: String = Deserialize::deserialize(deserializer)?;
        let digits = hex_color
            .strip_prefix('#')
            .filter(|d| d.len() == 6)
            .ok_or_else(|| Error::custom(format!("expected a color like \"#rrggbb\", got {hex_color:?}")))?;
        let rgb = u32::from_str_radix(digits, 16).map_err(Error::custom)?;
        Ok(hex_to_pixel((rgb << 8) | 0xff))
    }
}
