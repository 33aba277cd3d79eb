use crate::{
    texture::Sampler,
    vec::{Vec2, Vec2i, Vec4},
};

/// Attributes handed to a fragment shader for one covered pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragAttrs {
    /// Perspective corrected texture coordinates, `None` for untextured meshes.
    pub uv: Option<Vec2>,
    /// Flat lighting of the source triangle, already clamped to the ambient floor.
    pub lighting: f32,
}

pub trait FragmentShader {
    /// Linear RGBA in `[0, 1]`.
    fn exec(&self, pixel: Vec2i, attrs: FragAttrs) -> Vec4;
}

impl<S: FragmentShader + ?Sized> FragmentShader for &S {
    #[inline]
    fn exec(&self, pixel: Vec2i, attrs: FragAttrs) -> Vec4 {
        (**self).exec(pixel, attrs)
    }
}

pub struct FromFn<F> {
    f: F,
}

impl<F> FromFn<F>
where
    F: Fn(Vec2i, FragAttrs) -> Vec4,
{
    pub fn new(f: F) -> Self {
        FromFn { f }
    }
}

impl<F> FragmentShader for FromFn<F>
where
    F: Fn(Vec2i, FragAttrs) -> Vec4,
{
    #[inline]
    fn exec(&self, pixel: Vec2i, attrs: FragAttrs) -> Vec4 {
        (self.f)(pixel, attrs)
    }
}

pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(Vec2i, FragAttrs) -> Vec4,
{
    FromFn::new(f)
}

#[inline]
fn lit(color: Vec4, lighting: f32) -> Vec4 {
    Vec4::from([color.x * lighting, color.y * lighting, color.z * lighting, 1.])
}

/// Texture color scaled by the triangle's lighting. Untextured fragments use `base`.
pub struct TexturedShader<S> {
    pub sampler: S,
    pub base: Vec4,
}

impl<S: Sampler> TexturedShader<S> {
    pub fn new(sampler: S) -> Self {
        TexturedShader {
            sampler,
            base: Vec4::repeat(1.),
        }
    }
}

impl<S: Sampler> FragmentShader for TexturedShader<S> {
    #[inline]
    fn exec(&self, _pixel: Vec2i, attrs: FragAttrs) -> Vec4 {
        let color = match attrs.uv {
            Some(uv) => self.sampler.sample(uv),
            None => self.base,
        };
        lit(color, attrs.lighting)
    }
}

/// Solid color scaled by the triangle's lighting.
pub struct FlatShader {
    pub color: Vec4,
}

impl FragmentShader for FlatShader {
    #[inline]
    fn exec(&self, _pixel: Vec2i, attrs: FragAttrs) -> Vec4 {
        lit(self.color, attrs.lighting)
    }
}
