use crate::Pixel;

pub type FrameBuffer = Buffer<Pixel>;
pub type DepthBuffer = Buffer<f32>;

/// Depth value of a cleared depth buffer. Stored depths are `1/w`, so larger means nearer.
pub const FARTHEST: f32 = 0.0;

/// Owned, row-major `width x height` grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Buffer<E> {
    width: usize,
    height: usize,
    data: Vec<E>,
}

impl<E: Copy> Buffer<E> {
    pub fn new(width: usize, height: usize, fill: E) -> Self {
        Buffer {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn fill(&mut self, value: E) {
        self.data.fill(value);
    }

    pub fn as_slice(&self) -> &[E] {
        &self.data
    }

    pub fn as_slice_mut(&mut self) -> &mut [E] {
        &mut self.data
    }

    pub fn get(&self, x: i32, y: i32) -> Option<E> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// Borrow the whole buffer as a slice starting at row 0.
    pub fn borrow_mut(&mut self) -> MatrixSliceMut<'_, E> {
        MatrixSliceMut::new(&mut self.data, self.width, self.height, 0)
    }

    /// Split into horizontal bands of `band_height` rows. The last band may be shorter.
    pub fn bands_mut(&mut self, band_height: usize) -> impl Iterator<Item = MatrixSliceMut<'_, E>> {
        let width = self.width;
        let band_height = band_height.max(1);
        self.data
            .chunks_mut(width * band_height)
            .enumerate()
            .map(move |(i, rows)| {
                let height = rows.len() / width;
                MatrixSliceMut::new(rows, width, height, i * band_height)
            })
    }
}

/// A mutable band of rows of a [`Buffer`], addressed with the coordinates of the full buffer.
pub struct MatrixSliceMut<'a, E> {
    pub width: usize,
    pub height: usize,
    /// Index of the first row of the band in the full buffer.
    pub row_offset: usize,
    data: &'a mut [E],
}

impl<'a, E> MatrixSliceMut<'a, E> {
    pub fn new(data: &'a mut [E], width: usize, height: usize, row_offset: usize) -> Self {
        assert_eq!(data.len(), width * height);
        MatrixSliceMut {
            width,
            height,
            row_offset,
            data,
        }
    }

    /// Rows covered by this band, in full buffer coordinates.
    pub fn rows(&self) -> std::ops::Range<i32> {
        self.row_offset as i32..(self.row_offset + self.height) as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && (x as usize) < self.width && self.rows().contains(&y)
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<&E> {
        self.index_of(x, y).map(|idx| &self.data[idx])
    }

    #[inline]
    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut E> {
        self.index_of(x, y).map(move |idx| &mut self.data[idx])
    }

    pub fn as_slice_mut(&mut self) -> &mut [E] {
        &mut *self.data
    }

    #[inline]
    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        if !self.contains(x, y) {
            return None;
        }
        Some((y as usize - self.row_offset) * self.width + x as usize)
    }
}

/// Color and depth targets of a single frame.
pub struct Frame {
    pub color: FrameBuffer,
    pub depth: DepthBuffer,
}

impl Frame {
    pub fn new(width: usize, height: usize, clear_color: Pixel) -> Self {
        Frame {
            color: Buffer::new(width, height, clear_color),
            depth: Buffer::new(width, height, FARTHEST),
        }
    }

    pub fn width(&self) -> usize {
        self.color.width()
    }

    pub fn height(&self) -> usize {
        self.color.height()
    }

    /// Prepares the buffers for a new frame: reallocates them if the size changed, clears them otherwise.
    pub fn begin(&mut self, width: usize, height: usize, clear_color: Pixel) {
        if self.width() != width || self.height() != height {
            *self = Frame::new(width, height, clear_color);
        } else {
            self.color.fill(clear_color);
            self.depth.fill(FARTHEST);
        }
    }

    /// Copies the color buffer into a tightly packed RGBA8 byte slice, such as a `pixels` frame.
    pub fn write_rgba(&self, out: &mut [u8]) {
        for (dst, src) in out.chunks_exact_mut(4).zip(self.color.as_slice()) {
            dst.copy_from_slice(src);
        }
    }

    pub fn to_image(&self) -> image::RgbaImage {
        let bytes = self.color.as_slice().iter().flatten().copied().collect();
        image::RgbaImage::from_raw(self.width() as u32, self.height() as u32, bytes)
            .expect("color buffer has width * height pixels")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_every_row_once() {
        let mut buf = Buffer::new(3, 7, 0u8);
        let mut seen = Vec::new();
        for mut band in buf.bands_mut(3) {
            for y in band.rows() {
                seen.push(y);
                *band.get_mut(0, y).unwrap() += 1;
            }
            assert!(band.get_mut(0, band.rows().end).is_none());
        }
        assert_eq!(seen, (0..7).collect::<Vec<_>>());
        assert!((0..7).all(|y| buf.get(0, y) == Some(1)));
    }

    #[test]
    fn out_of_bounds_access_is_none() {
        let mut buf = Buffer::new(4, 4, 0.0f32);
        let mut slice = buf.borrow_mut();
        assert!(slice.get_mut(-1, 0).is_none());
        assert!(slice.get_mut(0, 4).is_none());
        assert!(slice.get_mut(4, 0).is_none());
        assert!(slice.get(3, 3).is_some());
    }

    #[test]
    fn begin_clears_or_reallocates() {
        let mut frame = Frame::new(2, 2, [0, 0, 0, 255]);
        *frame.depth.borrow_mut().get_mut(1, 1).unwrap() = 0.5;
        frame.color.as_slice_mut()[0] = [1, 2, 3, 4];

        frame.begin(2, 2, [9, 9, 9, 255]);
        assert!(frame.color.as_slice().iter().all(|&p| p == [9, 9, 9, 255]));
        assert!(frame.depth.as_slice().iter().all(|&d| d == FARTHEST));

        frame.begin(5, 3, [9, 9, 9, 255]);
        assert_eq!((frame.width(), frame.height()), (5, 3));
        assert_eq!(frame.color.as_slice().len(), 15);
    }
}
