use crate::{buf::MatrixSliceMut, Pixel};

pub type ScreenPos = (i32, i32);

/// Pixels on the line from `from` up to, but excluding, `to`.
pub struct LineIter {
    x0: i32,
    y0: i32,
    inner: LineToIter,
}

impl LineIter {
    pub fn new((x0, y0): ScreenPos, (x1, y1): ScreenPos) -> Self {
        LineIter {
            x0,
            y0,
            inner: LineToIter::new(x1 - x0, y1 - y0),
        }
    }
}

impl Iterator for LineIter {
    type Item = ScreenPos;

    fn next(&mut self) -> Option<ScreenPos> {
        let (x, y) = self.inner.next()?;
        Some((x + self.x0, y + self.y0))
    }
}

/// Line from (0, 0) to (x, y)
pub struct LineToIter {
    x: i32,
    dx: i32,
    dy: i32,
    // Should swap x and y before yielding
    swap: bool,
}

impl LineToIter {
    pub fn new(x: i32, y: i32) -> Self {
        if x.abs() >= y.abs() {
            // x changes on every step, y only on some of them
            LineToIter {
                x: 0,
                dx: x,
                dy: y,
                swap: false,
            }
        } else {
            LineToIter {
                x: 0,
                dx: y,
                dy: x,
                swap: true,
            }
        }
    }
}

impl Iterator for LineToIter {
    type Item = ScreenPos;

    fn next(&mut self) -> Option<ScreenPos> {
        if self.x == self.dx {
            return None;
        }
        let x = self.x;
        self.x += self.dx.signum();
        let y = (x as i64 * self.dy as i64 / self.dx as i64) as i32;
        if self.swap {
            Some((y, x))
        } else {
            Some((x, y))
        }
    }
}

/// Strokes the closed outline through `points`. Each edge is clipped to `target` before it is walked,
/// and edges with a non-finite end point are skipped.
pub fn draw_outline(target: &mut MatrixSliceMut<Pixel>, points: [(f32, f32); 3], color: Pixel) {
    let rows = target.rows();
    // One pixel of margin, so the excluded end of a clipped edge lands outside the target.
    let bounds = Bounds {
        x0: -1.,
        y0: rows.start as f64 - 1.,
        x1: target.width as f64,
        y1: rows.end as f64,
    };
    for i in 0..3 {
        let Some((from, to)) = bounds.clip(points[i], points[(i + 1) % 3]) else {
            continue;
        };
        for (x, y) in LineIter::new(from, to) {
            if let Some(px) = target.get_mut(x, y) {
                *px = color;
            }
        }
    }
}

struct Bounds {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
}

impl Bounds {
    /// Liang-Barsky: the part of `a -> b` inside the bounds, rounded to pixels.
    fn clip(&self, a: (f32, f32), b: (f32, f32)) -> Option<(ScreenPos, ScreenPos)> {
        if ![a.0, a.1, b.0, b.1].iter().all(|c| c.is_finite()) {
            return None;
        }
        let (ax, ay) = (a.0 as f64, a.1 as f64);
        let (dx, dy) = (b.0 as f64 - ax, b.1 as f64 - ay);
        let (mut t0, mut t1) = (0f64, 1f64);
        for (p, q) in [
            (-dx, ax - self.x0),
            (dx, self.x1 - ax),
            (-dy, ay - self.y0),
            (dy, self.y1 - ay),
        ] {
            if p == 0. {
                if q < 0. {
                    return None;
                }
            } else if p < 0. {
                t0 = t0.max(q / p);
            } else {
                t1 = t1.min(q / p);
            }
        }
        if t0 > t1 {
            return None;
        }
        let at = |t: f64| ((ax + t * dx).round() as i32, (ay + t * dy).round() as i32);
        Some((at(t0), at(t1)))
    }
}
