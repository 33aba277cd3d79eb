use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::{
    vec::{Vec2, Vec4},
    Pixel,
};

/// Color source addressed with normalized uv coordinates, `v` growing towards the top of the image.
pub trait Sampler {
    /// Linear RGBA in `[0, 1]`.
    fn sample(&self, uv: Vec2) -> Vec4;
}

impl<S: Sampler + ?Sized> Sampler for &S {
    fn sample(&self, uv: Vec2) -> Vec4 {
        (**self).sample(uv)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextureWrap {
    #[default]
    Clamp,
    Repeat,
}

#[derive(Clone, Debug)]
pub struct Texture {
    width: usize,
    height: usize,
    texels: Vec<Pixel>,
    pub wrap: TextureWrap,
}

impl Texture {
    pub fn from_pixels(width: usize, height: usize, texels: Vec<Pixel>) -> Self {
        assert!(width > 0 && height > 0, "texture must not be empty");
        assert_eq!(texels.len(), width * height);
        Texture {
            width,
            height,
            texels,
            wrap: TextureWrap::default(),
        }
    }

    pub fn from_image(img: &image::RgbaImage) -> Self {
        let texels = img.pixels().map(|px| px.0).collect();
        Self::from_pixels(img.width() as usize, img.height() as usize, texels)
    }

    /// Decodes any format `image` understands into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("failed to open texture {}", path.display()))?
            .into_rgba8();
        if img.width() == 0 || img.height() == 0 {
            anyhow::bail!("texture {} is empty", path.display());
        }
        log::info!(
            "loaded texture {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(Self::from_image(&img))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Texel coordinates for `uv`. `v = 1` is the top row.
    #[inline]
    pub fn index_uv(&self, uv: Vec2) -> (usize, usize) {
        let [u, v] = uv.to_array();
        let (u, v) = match self.wrap {
            TextureWrap::Clamp => (u, v),
            TextureWrap::Repeat => (u.rem_euclid(1.), v.rem_euclid(1.)),
        };

        let w = self.width as f32;
        let h = self.height as f32;
        // Float to int casts saturate, NaN becomes 0.
        let x = ((u * w).round() as i64).clamp(0, self.width as i64 - 1);
        let y = ((h - (v * h).round()) as i64).clamp(0, self.height as i64 - 1);
        (x as usize, y as usize)
    }
}

impl Sampler for Texture {
    #[inline]
    fn sample(&self, uv: Vec2) -> Vec4 {
        let (x, y) = self.index_uv(uv);
        Vec4::from(self.texels[y * self.width + x].map(|chan| chan as f32 / 255.))
    }
}

/// Procedural `tiles x tiles` checkerboard.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Checkerboard {
    pub tiles: u32,
    pub even: Vec4,
    pub odd: Vec4,
}

impl Default for Checkerboard {
    fn default() -> Self {
        Checkerboard {
            tiles: 8,
            even: Vec4::from([1., 1., 1., 1.]),
            odd: Vec4::from([0.2, 0.2, 0.2, 1.]),
        }
    }
}

impl Sampler for Checkerboard {
    fn sample(&self, uv: Vec2) -> Vec4 {
        let n = self.tiles as f32;
        let cx = (uv.x * n).floor() as i64;
        let cy = (uv.y * n).floor() as i64;
        if (cx + cy).rem_euclid(2) == 0 {
            self.even
        } else {
            self.odd
        }
    }
}
