use serde::Deserialize;

use crate::{
    vec::{Mat4x4, Vec3},
    Triangle, UvTriangle,
};

/// Half-space `dot(normal, p) >= dot(normal, point)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// Normalizes `normal` once, so distances are in view space units.
    pub fn new(point: Vec3, normal: Vec3) -> Self {
        Plane {
            point,
            normal: normal.normalized(),
        }
    }

    #[inline]
    pub fn distance(&self, p: Vec3) -> f32 {
        self.normal.dot(p) - self.normal.dot(self.point)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClipTriangle {
    pub points: Triangle,
    pub uv: UvTriangle,
}

/// Result of clipping one triangle against one plane.
#[derive(Clone, Copy, Debug)]
pub struct Clipped {
    tris: [ClipTriangle; 2],
    len: usize,
}

impl Clipped {
    pub fn as_slice(&self) -> &[ClipTriangle] {
        &self.tris[..self.len]
    }
}

#[derive(Clone, Copy)]
struct Vertex {
    p: Vec3,
    uv: Vec3,
}

impl Vertex {
    fn intersect(self, end: Vertex, d_start: f32, d_end: f32) -> Vertex {
        let t = d_start / (d_start - d_end);
        Vertex {
            p: self.p.lerp(end.p, t),
            uv: self.uv.lerp(end.uv, t),
        }
    }
}

fn tri(a: Vertex, b: Vertex, c: Vertex) -> ClipTriangle {
    ClipTriangle {
        points: [a.p, b.p, c.p],
        uv: [a.uv, b.uv, c.uv],
    }
}

/// Clips `tri` against `plane`. Vertices on the plane count as inside.
///
/// With one vertex inside the result is `(in, i0, i1)`. With two inside it is the fan
/// `(in0, in1, i0)`, `(in1, i0, i1)`, where `iN` is the intersection of the edge from `inN` to the outside
/// vertex.
pub fn clip_triangle(plane: &Plane, input: &ClipTriangle) -> Clipped {
    let mut inside = [(0usize, 0f32); 3];
    let mut outside = [(0usize, 0f32); 3];
    let (mut n_in, mut n_out) = (0, 0);

    for (i, &p) in input.points.iter().enumerate() {
        let d = plane.distance(p);
        if d >= 0. {
            inside[n_in] = (i, d);
            n_in += 1;
        } else {
            outside[n_out] = (i, d);
            n_out += 1;
        }
    }

    let vert = |i: usize| Vertex {
        p: input.points[i],
        uv: input.uv[i],
    };
    let mut out = Clipped {
        tris: [*input; 2],
        len: 0,
    };

    match n_in {
        // NaN distances end up here too: they compare false against zero.
        0 => {}
        3 => out.len = 1,
        1 => {
            let (i, di) = inside[0];
            let (o0, d0) = outside[0];
            let (o1, d1) = outside[1];
            let a = vert(i);
            out.tris[0] = tri(
                a,
                a.intersect(vert(o0), di, d0),
                a.intersect(vert(o1), di, d1),
            );
            out.len = 1;
        }
        _ => {
            let (i0, di0) = inside[0];
            let (i1, di1) = inside[1];
            let (o, d) = outside[0];
            let (a, b, c) = (vert(i0), vert(i1), vert(o));
            let x0 = a.intersect(c, di0, d);
            let x1 = b.intersect(c, di1, d);
            out.tris[0] = tri(a, b, x0);
            out.tris[1] = tri(b, x0, x1);
            out.len = 2;
        }
    }

    out
}

/// Which view space half-spaces triangles are clipped against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClipPlanes {
    /// Near, far, left, right, top and bottom.
    #[default]
    Frustum,
    NearFar,
    Near,
    None,
}

impl ClipPlanes {
    /// Builds the planes for `projection`, a matrix from [`Mat4x4::perspective`].
    pub fn planes(self, projection: &Mat4x4, near: f32, far: f32) -> Vec<Plane> {
        let origin = Vec3::zero();
        let near_plane = Plane::new(Vec3::from([0., 0., near]), Vec3::from([0., 0., 1.]));
        let far_plane = Plane::new(Vec3::from([0., 0., far]), Vec3::from([0., 0., -1.]));
        match self {
            ClipPlanes::None => Vec::new(),
            ClipPlanes::Near => vec![near_plane],
            ClipPlanes::NearFar => vec![near_plane, far_plane],
            ClipPlanes::Frustum => {
                // |x * sx| <= z and |y * sy| <= z
                let sx = projection[(0, 0)];
                let sy = projection[(1, 1)];
                vec![
                    near_plane,
                    far_plane,
                    Plane::new(origin, Vec3::from([sx, 0., 1.])),
                    Plane::new(origin, Vec3::from([-sx, 0., 1.])),
                    Plane::new(origin, Vec3::from([0., -sy, 1.])),
                    Plane::new(origin, Vec3::from([0., sy, 1.])),
                ]
            }
        }
    }
}

/// Scratch buffers for clipping one triangle against a list of planes. Each plane reads from one buffer and
/// writes into the other, so nothing is allocated once the buffers reached their peak size.
#[derive(Debug, Default)]
pub struct ClipArena {
    front: Vec<ClipTriangle>,
    back: Vec<ClipTriangle>,
}

impl ClipArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sized for the worst case of `n_planes` planes.
    pub fn with_planes(n_planes: usize) -> Self {
        let cap = 1 << n_planes.min(8);
        ClipArena {
            front: Vec::with_capacity(cap),
            back: Vec::with_capacity(cap),
        }
    }

    /// Clips `input` against every plane in order and returns the surviving pieces.
    pub fn clip(&mut self, input: ClipTriangle, planes: &[Plane]) -> &[ClipTriangle] {
        self.front.clear();
        self.front.push(input);

        for plane in planes {
            self.back.clear();
            for t in &self.front {
                self.back.extend_from_slice(clip_triangle(plane, t).as_slice());
            }
            std::mem::swap(&mut self.front, &mut self.back);
            if self.front.is_empty() {
                break;
            }
        }

        &self.front
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn v(x: f32, y: f32, z: f32) -> Vec3 {
        Vec3::from([x, y, z])
    }

    fn sample() -> ClipTriangle {
        ClipTriangle {
            points: [v(0., 0., 1.), v(1., 0., 2.), v(0., 1., 3.)],
            uv: [v(0., 0., 1.), v(1., 0., 1.), v(0., 1., 1.)],
        }
    }

    #[test]
    fn triangle_fully_inside_is_unchanged() {
        let plane = Plane::new(v(0., 0., 0.5), v(0., 0., 1.));
        let input = sample();
        assert_eq!(clip_triangle(&plane, &input).as_slice(), &[input]);
    }

    #[test]
    fn triangle_fully_outside_is_discarded() {
        let plane = Plane::new(v(0., 0., 10.), v(0., 0., 1.));
        assert!(clip_triangle(&plane, &sample()).as_slice().is_empty());
    }

    #[test]
    fn vertex_on_plane_counts_as_inside() {
        let plane = Plane::new(v(0., 0., 3.), v(0., 0., 1.));
        let out = clip_triangle(&plane, &sample());
        assert_eq!(out.as_slice().len(), 1);
        // Single inside vertex is the one lying on the plane, the other two collapse onto it.
        for p in out.as_slice()[0].points {
            assert_abs_diff_eq!(p.z, 3., epsilon = 1e-6);
        }
    }

    #[test]
    fn one_inside_interpolates_uv() {
        // Only vertex 2 (z = 3) is inside z >= 2.5.
        let plane = Plane::new(v(0., 0., 2.5), v(0., 0., 1.));
        let out = clip_triangle(&plane, &sample());
        let [t] = out.as_slice() else {
            panic!("expected one triangle, got {:?}", out.as_slice());
        };
        assert_eq!(t.points[0], v(0., 1., 3.));

        // inside -> vertex 0: distances 0.5 and -1.5
        let t0 = 0.5 / (0.5 + 1.5);
        let expect_uv = v(0., 1., 1.).lerp(v(0., 0., 1.), t0);
        assert_abs_diff_eq!(t.points[1].z, 2.5, epsilon = 1e-6);
        assert_abs_diff_eq!(t.uv[1].x, expect_uv.x, epsilon = 1e-6);
        assert_abs_diff_eq!(t.uv[1].y, expect_uv.y, epsilon = 1e-6);

        // inside -> vertex 1: distances 0.5 and -0.5
        assert_abs_diff_eq!(t.uv[2].x, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(t.uv[2].y, 0.5, epsilon = 1e-6);
    }

    #[test]
    fn plane_through_centroid_matches_manual_lerp() {
        let input = sample();
        let centroid = (input.points[0] + input.points[1] + input.points[2]) / 3.;
        let plane = Plane::new(centroid, v(0., 0., 1.));
        let out = clip_triangle(&plane, &input);

        // Vertices 1 and 2 are inside, vertex 0 outside.
        let [a, b] = out.as_slice() else {
            panic!("expected two triangles, got {:?}", out.as_slice());
        };
        let d0 = plane.distance(input.points[0]);
        let d1 = plane.distance(input.points[1]);
        let d2 = plane.distance(input.points[2]);
        let x0 = input.uv[1].lerp(input.uv[0], d1 / (d1 - d0));
        let x1 = input.uv[2].lerp(input.uv[0], d2 / (d2 - d0));

        assert_eq!(a.points[0], input.points[1]);
        assert_eq!(a.points[1], input.points[2]);
        for (got, want) in [(a.uv[2], x0), (b.uv[1], x0), (b.uv[2], x1)] {
            assert_abs_diff_eq!(got.x, want.x, epsilon = 1e-6);
            assert_abs_diff_eq!(got.y, want.y, epsilon = 1e-6);
        }
        assert_eq!(b.points[0], input.points[2]);
        for t in [a, b] {
            for p in t.points {
                assert!(plane.distance(p) >= -1e-5);
            }
        }
    }

    #[test]
    fn arena_chains_planes() {
        let proj = Mat4x4::perspective(1., 90., 0.1, 1000.);
        let planes = ClipPlanes::Frustum.planes(&proj, 0.1, 1000.);
        let mut arena = ClipArena::with_planes(planes.len());

        let behind = ClipTriangle {
            points: [v(0., 0., -1.), v(1., 0., -1.), v(0., 1., -2.)],
            uv: [Vec3::zero(); 3],
        };
        assert!(arena.clip(behind, &planes).is_empty());

        let visible = ClipTriangle {
            points: [v(-0.5, -0.5, 5.), v(0.5, -0.5, 5.), v(0., 0.5, 5.)],
            uv: [Vec3::zero(); 3],
        };
        assert_eq!(arena.clip(visible, &planes), &[visible]);

        // Straddles the left and right planes.
        let wide = ClipTriangle {
            points: [v(-20., 0., 5.), v(20., 0., 5.), v(0., 1., 5.)],
            uv: [Vec3::zero(); 3],
        };
        let pieces = arena.clip(wide, &planes);
        assert!(!pieces.is_empty());
        for t in pieces {
            for p in t.points {
                assert!(p.x.abs() <= p.z + 1e-4);
            }
        }
    }
}
