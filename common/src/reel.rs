//! Pre-rendered stills, archived with rkyv and replayed frame by frame.

use crate::{Canvas, Color};
use rkyv::{Archive, Deserialize, Serialize, rancor, util::AlignedVec};

#[derive(Archive, Clone, Debug, Deserialize, Serialize)]
pub struct Still {
    pub width: u32,
    pub height: u32,
    // layout: row-major, width * height entries
    pub pixels: Vec<Color>,
}

impl ArchivedStill {
    pub fn width(&self) -> usize {
        self.width.to_native() as usize
    }

    pub fn height(&self) -> usize {
        self.height.to_native() as usize
    }

    /// Copies the still into the top-left corner of `canvas`, clipping
    /// whatever does not fit.
    pub fn paint(&self, canvas: &mut Canvas) {
        let width = self.width();
        if width == 0 {
            return;
        }

        for (y, row) in self.pixels.chunks(width).enumerate().take(canvas.height()) {
            for (x, pixel) in row.iter().enumerate().take(canvas.width()) {
                canvas.set_pixel(x as i32, y as i32, Color::from(pixel));
            }
        }
    }
}

/// Serializes stills into a reel.
// rkyv archives the `Vec` itself, a slice has no sized archived form
#[allow(clippy::ptr_arg)]
pub fn archive(stills: &Vec<Still>) -> Result<AlignedVec, rancor::Error> {
    rkyv::to_bytes::<rancor::Error>(stills)
}
