//! Datagram layout understood by the display.
//!
//! A frame is a binary PPM image followed by an offset footer:
//!
//! ```text
//! P6\n<width> <height>\n255\n<width * height RGB triples>\n<x>\n<y>\n<layer>\n
//! ```

use crate::{Canvas, Color, Error, Offset, Result};

const MAGIC: &[u8] = b"P6";
const MAX_VALUE: u32 = 255;

#[inline]
fn encode_dec(buf: &mut itoa::Buffer, num: impl itoa::Integer) -> &[u8] {
    buf.format(num).as_bytes()
}

/// Serializes `canvas` into `out`, replacing its previous contents.
pub fn encode(canvas: &Canvas, out: &mut Vec<u8>) {
    let mut num_buf = itoa::Buffer::new();
    let offset = canvas.offset();

    out.clear();
    out.reserve(32 + canvas.pixels().len() * 3);

    out.extend_from_slice(MAGIC);
    out.push(b'\n');
    out.extend_from_slice(encode_dec(&mut num_buf, canvas.width()));
    out.push(b' ');
    out.extend_from_slice(encode_dec(&mut num_buf, canvas.height()));
    out.push(b'\n');
    out.extend_from_slice(encode_dec(&mut num_buf, MAX_VALUE));
    out.push(b'\n');

    out.extend(canvas.pixels().iter().flat_map(|pixel| pixel.to_bytes()));

    for value in [offset.x, offset.y, offset.layer] {
        out.push(b'\n');
        out.extend_from_slice(encode_dec(&mut num_buf, value));
    }
    out.push(b'\n');
}

/// A frame read back from the wire.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub offset: Offset,
    pub pixels: Vec<Color>,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn skip_whitespace(&mut self, comments: bool) {
        while let Some(&byte) = self.data.get(self.pos) {
            match byte {
                b'#' if comments => {
                    self.pos = self.data[self.pos..]
                        .iter()
                        .position(|&b| b == b'\n')
                        .map_or(self.data.len(), |end| self.pos + end);
                }
                b if b.is_ascii_whitespace() => self.pos += 1,
                _ => break,
            }
        }
    }

    fn token(&mut self, comments: bool) -> Option<&'a [u8]> {
        self.skip_whitespace(comments);
        let start = self.pos;
        while self
            .data
            .get(self.pos)
            .is_some_and(|b| !b.is_ascii_whitespace())
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.data[start..self.pos])
    }

    fn number<T: std::str::FromStr>(&mut self, what: &'static str) -> Result<T> {
        self.token(true)
            .and_then(|token| std::str::from_utf8(token).ok())
            .and_then(|token| token.parse().ok())
            .ok_or(Error::MalformedFrame(what))
    }
}

impl Frame {
    /// Parses one datagram. A missing footer means offset `(0, 0, 0)`.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut reader = Reader { data, pos: 0 };

        if reader.token(false) != Some(MAGIC) {
            return Err(Error::MalformedFrame("missing P6 magic"));
        }
        let width: usize = reader.number("width")?;
        let height: usize = reader.number("height")?;
        if reader.number::<u32>("max value")? != MAX_VALUE {
            return Err(Error::MalformedFrame("unsupported max value"));
        }
        // exactly one whitespace byte separates the header from the raster
        reader.pos += 1;

        let raster_len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(3))
            .ok_or(Error::MalformedFrame("dimensions overflow"))?;
        let raster = data
            .get(reader.pos..reader.pos + raster_len)
            .ok_or(Error::MalformedFrame("truncated pixel data"))?;
        reader.pos += raster_len;

        let pixels = raster
            .chunks_exact(3)
            .map(|rgb| Color::new(rgb[0], rgb[1], rgb[2]))
            .collect();

        reader.skip_whitespace(false);
        let offset = if reader.pos < data.len() {
            Offset {
                x: reader.number("offset x")?,
                y: reader.number("offset y")?,
                layer: reader.number("layer")?,
            }
        } else {
            Offset::default()
        };

        Ok(Self {
            width,
            height,
            offset,
            pixels,
        })
    }
}
