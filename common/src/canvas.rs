use crate::{Color, Error, Paint, Result};

/// Highest compositing layer the display accepts.
pub const MAX_LAYER: i32 = 15;

/// Fails with [`Error::InvalidLayer`] unless `layer` is in `0..=MAX_LAYER`.
pub fn check_layer(layer: i32) -> Result<u8> {
    if (0..=MAX_LAYER).contains(&layer) {
        Ok(layer as u8)
    } else {
        Err(Error::InvalidLayer(layer))
    }
}

/// Where the display composites a canvas.
///
/// Offsets may be negative to push a canvas partly off screen.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Offset {
    pub x: i32,
    pub y: i32,
    pub layer: i32,
}

/// One rectangular frame of pixels plus its compositing offset.
///
/// Pixels are stored row-major. Reads and writes outside the canvas are
/// clipped: writes are dropped and reads return black.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    offset: Offset,
}

impl Canvas {
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimension { width, height });
        }

        let (width, height) = (width as usize, height as usize);
        Ok(Self {
            width,
            height,
            pixels: vec![Color::BLACK; width * height],
            offset: Offset::default(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: Color) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx] = color;
        }
    }

    #[inline]
    pub fn paint(&mut self, x: i32, y: i32, paint: Paint) {
        self.set_pixel(x, y, paint.to_wire());
    }

    pub fn pixel(&self, x: i32, y: i32) -> Color {
        self.index(x, y)
            .map_or(Color::BLACK, |idx| self.pixels[idx])
    }

    pub fn clear(&mut self) {
        self.fill(Color::BLACK);
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    /// Sets the compositing offset used by the next send.
    ///
    /// The layer is stored as given; [`crate::Transport::send`] rejects
    /// layers outside `0..=15`.
    pub fn set_offset(&mut self, x: i32, y: i32, layer: i32) {
        self.offset = Offset { x, y, layer };
    }

    pub fn offset(&self) -> Offset {
        self.offset
    }

    /// Row-major pixel data, `width * height` entries.
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Color]> {
        self.pixels.chunks_exact(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_pixels(canvas: &Canvas) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (w, h) = (canvas.width() as i32, canvas.height() as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }

    #[test]
    fn rejects_non_positive_dimensions() {
        for (w, h) in [(0, 10), (10, 0), (-1, 5), (5, -3), (0, 0)] {
            assert!(matches!(
                Canvas::new(w, h),
                Err(Error::InvalidDimension { width, height }) if width == w && height == h
            ));
        }
    }

    #[test]
    fn clear_resets_every_pixel() {
        for (w, h) in [(1, 1), (5, 4), (45, 35)] {
            let mut canvas = Canvas::new(w, h).unwrap();
            canvas.fill(Color::RED);
            canvas.clear();
            assert!(all_pixels(&canvas).all(|(x, y)| canvas.pixel(x, y) == Color::BLACK));
            assert_eq!(canvas.pixels().len(), (w * h) as usize);
        }
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut canvas = Canvas::new(7, 3).unwrap();
        let coords: Vec<_> = all_pixels(&canvas).collect();
        for (x, y) in coords {
            let color = Color::new(x as u8, y as u8, 42);
            canvas.set_pixel(x, y, color);
            assert_eq!(canvas.pixel(x, y), color);
        }
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas.fill(Color::GREEN);
        for (x, y) in [(-1, 0), (0, -1), (4, 0), (0, 4), (i32::MIN, i32::MAX), (100, 2)] {
            canvas.set_pixel(x, y, Color::RED);
            assert_eq!(canvas.pixel(x, y), Color::BLACK);
        }
        assert!(canvas.pixels().iter().all(|&c| c == Color::GREEN));
    }

    #[test]
    fn fill_covers_everything() {
        let mut canvas = Canvas::new(3, 9).unwrap();
        canvas.fill(Color::BLUE);
        assert!(all_pixels(&canvas).all(|(x, y)| canvas.pixel(x, y) == Color::BLUE));
    }

    #[test]
    fn storage_is_row_major() {
        let mut canvas = Canvas::new(5, 4).unwrap();
        canvas.set_pixel(2, 2, Color::RED);
        assert_eq!(canvas.pixels()[12], Color::RED);
        assert_eq!(canvas.rows().nth(2).unwrap()[2], Color::RED);
        assert_eq!(canvas.rows().count(), 4);
    }

    #[test]
    fn offset_leaves_pixels_alone() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.fill(Color::WHITE);
        canvas.set_offset(3, -2, 16);
        assert_eq!(
            canvas.offset(),
            Offset {
                x: 3,
                y: -2,
                layer: 16
            }
        );
        assert!(canvas.pixels().iter().all(|&c| c == Color::WHITE));
    }

    #[test]
    fn paint_resolves_sentinels() {
        let mut canvas = Canvas::new(2, 1).unwrap();
        canvas.paint(0, 0, Paint::Opaque(Color::BLACK));
        canvas.paint(1, 0, Paint::Transparent);
        assert_eq!(canvas.pixels(), &[Color::BACKGROUND, Color::BLACK]);
    }

    #[test]
    fn layer_bounds() {
        assert_eq!(check_layer(0).unwrap(), 0);
        assert_eq!(check_layer(15).unwrap(), 15);
        assert!(matches!(check_layer(16), Err(Error::InvalidLayer(16))));
        assert!(matches!(check_layer(-1), Err(Error::InvalidLayer(-1))));
    }
}
