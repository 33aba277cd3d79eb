//! Scanline triangle fill with perspective correct attributes.
//!
//! Rows and columns are sampled at pixel centers and every span is half-open, so two triangles sharing an
//! edge never shade the same pixel twice and never leave a gap between them.

use crate::{buf::MatrixSliceMut, project::ScreenTriangle, vec::Vec3};

#[derive(Clone, Copy, Debug)]
struct Vert {
    x: f32,
    y: f32,
    /// `(u/w, v/w, 1/w)`
    uvw: Vec3,
}

/// An edge walked from top to bottom.
#[derive(Clone, Copy, Debug)]
struct Edge {
    start: Vert,
    dx: f32,
    duvw: Vec3,
}

impl Edge {
    fn new(start: Vert, end: Vert) -> Self {
        let dy = end.y - start.y;
        if dy == 0. {
            return Edge {
                start,
                dx: 0.,
                duvw: Vec3::zero(),
            };
        }
        Edge {
            start,
            dx: (end.x - start.x) / dy,
            duvw: (end.uvw - start.uvw) / dy,
        }
    }

    #[inline]
    fn at(&self, y: f32) -> (f32, Vec3) {
        let step = y - self.start.y;
        (self.start.x + self.dx * step, self.start.uvw + self.duvw * step)
    }
}

/// First pixel whose center lies at or after `coord`.
#[inline]
fn first_center(coord: f32) -> i32 {
    (coord - 0.5).ceil() as i32
}

/// Rasterizes `tri` into the rows covered by `depth`.
///
/// For each covered pixel whose interpolated `1/w` is greater than the stored depth, the depth is overwritten
/// and `frag(x, y, u, v)` is called with perspective corrected texture coordinates. Pixels outside of `depth`
/// are skipped.
pub fn draw_triangle<F>(tri: &ScreenTriangle, depth: &mut MatrixSliceMut<f32>, mut frag: F)
where
    F: FnMut(i32, i32, f32, f32),
{
    let mut v = [0, 1, 2].map(|i| Vert {
        x: tri.points[i].x,
        y: tri.points[i].y,
        uvw: tri.uv[i],
    });
    v.sort_by(|a, b| a.y.total_cmp(&b.y));
    let [top, mid, bot] = v;

    let long = Edge::new(top, bot);
    if mid.y > top.y {
        fill_half(Edge::new(top, mid), long, top.y, mid.y, depth, &mut frag);
    }
    if bot.y > mid.y {
        fill_half(Edge::new(mid, bot), long, mid.y, bot.y, depth, &mut frag);
    }
}

fn fill_half<F>(a: Edge, b: Edge, y_top: f32, y_bot: f32, depth: &mut MatrixSliceMut<f32>, frag: &mut F)
where
    F: FnMut(i32, i32, f32, f32),
{
    let rows = depth.rows();
    let y_start = first_center(y_top).max(rows.start);
    let y_end = first_center(y_bot).min(rows.end);
    let width = depth.width as i32;

    for y in y_start..y_end {
        let yc = y as f32 + 0.5;
        let (mut ax, mut auvw) = a.at(yc);
        let (mut bx, mut buvw) = b.at(yc);
        if ax > bx {
            std::mem::swap(&mut ax, &mut bx);
            std::mem::swap(&mut auvw, &mut buvw);
        }

        let span = bx - ax;
        let x_start = first_center(ax).max(0);
        let x_end = first_center(bx).min(width);

        for x in x_start..x_end {
            let t = if span > 0. {
                (x as f32 + 0.5 - ax) / span
            } else {
                0.
            };
            let uvw = auvw.lerp(buvw, t);
            let w_inv = uvw.z;

            let Some(d) = depth.get_mut(x, y) else {
                continue;
            };
            if w_inv > *d {
                *d = w_inv;
                frag(x, y, uvw.x / w_inv, uvw.y / w_inv);
            }
        }
    }
}
