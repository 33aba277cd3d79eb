use crate::{
    vec::{Mat4x4, Vec2, Vec3},
    Triangle, UvTriangle,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: usize, height: usize) -> Self {
        Viewport {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    /// `ndc` in `[-1, 1]` to pixel coordinates. +y points up in ndc and down on screen.
    #[inline]
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        let half_w = self.width / 2.;
        let half_h = self.height / 2.;
        Vec2::from([
            (ndc.x * half_w + half_w).round(),
            (-ndc.y * half_h + half_h).round(),
        ])
    }
}

/// Screen space triangle ready for [`crate::raster::draw_triangle`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenTriangle {
    /// Pixel `x`, `y` and ndc depth.
    pub points: Triangle,
    /// `(u/w, v/w, 1/w)` per vertex.
    pub uv: UvTriangle,
}

pub fn project(points: &Triangle, uv: &UvTriangle, projection: &Mat4x4, viewport: &Viewport) -> ScreenTriangle {
    let mut out = ScreenTriangle {
        points: *points,
        uv: *uv,
    };

    for i in 0..3 {
        let clip = points[i].transform(*projection);
        let w = clip.w;

        let mut tex = uv[i];
        tex.x /= w;
        tex.y /= w;
        tex.z = 1. / w;
        out.uv[i] = tex;

        let ndc: Vec3 = clip.xyz() / w;
        let screen = viewport.ndc_to_screen(ndc.xy());
        out.points[i] = Vec3::from([screen.x, screen.y, ndc.z]);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn v(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::from([x, y, z])
    }

    #[test]
    fn unit_triangle_lands_in_viewport() {
        let viewport = Viewport::new(200, 100);
        let proj = Mat4x4::perspective(viewport.aspect(), 90., 0.1, 1000.);
        let tri = [v(0., 0., 5.), v(1., 0., 5.), v(0., 1., 5.)];
        let uv = [v(0., 0., 0.), v(1., 0., 0.), v(0., 1., 0.)];
        let out = project(&tri, &uv, &proj, &viewport);

        for p in out.points {
            assert!((0. ..=200.).contains(&p.x), "{p:?}");
            assert!((0. ..=100.).contains(&p.y), "{p:?}");
            assert!((0. ..=1.).contains(&p.z), "{p:?}");
        }
        // Centered origin; +y is up, so the third vertex sits above the first.
        assert_eq!(out.points[0].x, 100.);
        assert_eq!(out.points[0].y, 50.);
        assert!(out.points[2].y < out.points[0].y);

        for i in 0..3 {
            assert_abs_diff_eq!(out.uv[i].z, 0.2);
            assert_abs_diff_eq!(out.uv[i].x, uv[i].x * 0.2);
            assert_abs_diff_eq!(out.uv[i].y, uv[i].y * 0.2);
        }
    }

    #[test]
    fn ndc_corners_map_to_viewport_edges() {
        let viewport = Viewport::new(64, 32);
        assert_eq!(viewport.ndc_to_screen(Vec2::from([-1., 1.])), Vec2::from([0., 0.]));
        assert_eq!(viewport.ndc_to_screen(Vec2::from([1., -1.])), Vec2::from([64., 32.]));
    }
}
