//! Just enough of the BDF bitmap font format to draw text.

use anyhow::{Context, bail};
use std::{collections::HashMap, fs, path::Path};

struct Glyph {
    advance: i32,
    width: i32,
    height: i32,
    x_offset: i32,
    y_offset: i32,
    // one entry per row, leftmost pixel in the top bit
    rows: Vec<u32>,
}

pub struct Font {
    height: i32,
    baseline: i32,
    glyphs: HashMap<u32, Glyph>,
}

fn numbers<const N: usize>(line: usize, fields: &[&str]) -> anyhow::Result<[i32; N]> {
    let mut values = [0; N];
    if fields.len() < N {
        bail!("line {line}: expected {} numbers", N);
    }
    for (value, field) in values.iter_mut().zip(fields) {
        *value = field
            .parse()
            .with_context(|| format!("line {line}: bad number `{field}`"))?;
    }
    Ok(values)
}

impl Font {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("couldn't load font {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in font {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let mut bounds = None;
        let mut glyphs = HashMap::new();
        let mut encoding: Option<u32> = None;
        let mut glyph: Option<Glyph> = None;
        let mut in_bitmap = false;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let mut fields = line.split_whitespace();
            let Some(keyword) = fields.next() else {
                continue;
            };
            let fields: Vec<&str> = fields.collect();

            if in_bitmap && keyword != "ENDCHAR" {
                let Some(glyph) = glyph.as_mut() else {
                    bail!("line {line_no}: bitmap outside of a character");
                };
                let bits = keyword.len() as u32 * 4;
                if bits > 32 || glyph.width > 32 {
                    bail!("line {line_no}: glyphs wider than 32 pixels are not supported");
                }
                let row = u32::from_str_radix(keyword, 16)
                    .with_context(|| format!("line {line_no}: bad bitmap row `{keyword}`"))?;
                glyph.rows.push(row << (32 - bits));
                continue;
            }

            match keyword {
                "FONTBOUNDINGBOX" => {
                    let [_, height, _, y_offset] = numbers(line_no, &fields)?;
                    bounds = Some((height, height + y_offset));
                }
                "STARTCHAR" => {
                    encoding = None;
                    glyph = Some(Glyph {
                        advance: 0,
                        width: 0,
                        height: 0,
                        x_offset: 0,
                        y_offset: 0,
                        rows: Vec::new(),
                    });
                }
                // -1 marks glyphs outside the standard encoding
                "ENCODING" => encoding = fields.first().and_then(|code| code.parse().ok()),
                "DWIDTH" => {
                    if let Some(glyph) = glyph.as_mut() {
                        [glyph.advance] = numbers(line_no, &fields)?;
                    }
                }
                "BBX" => {
                    if let Some(glyph) = glyph.as_mut() {
                        [glyph.width, glyph.height, glyph.x_offset, glyph.y_offset] =
                            numbers(line_no, &fields)?;
                    }
                }
                "BITMAP" => in_bitmap = true,
                "ENDCHAR" => {
                    in_bitmap = false;
                    if let (Some(code), Some(glyph)) = (encoding.take(), glyph.take()) {
                        glyphs.insert(code, glyph);
                    }
                }
                _ => {}
            }
        }

        let Some((height, baseline)) = bounds else {
            bail!("no FONTBOUNDINGBOX, not a BDF font");
        };
        if glyphs.is_empty() {
            bail!("font has no glyphs");
        }
        debug!(height, glyphs = glyphs.len(), "font loaded");

        Ok(Self {
            height,
            baseline,
            glyphs,
        })
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Unknown characters are drawn as `?`, or skipped if the font has none.
    fn glyph(&self, c: char) -> Option<&Glyph> {
        self.glyphs
            .get(&u32::from(c))
            .or_else(|| self.glyphs.get(&u32::from('?')))
    }

    pub fn text_width(&self, text: &str) -> i32 {
        text.chars()
            .filter_map(|c| self.glyph(c))
            .map(|glyph| glyph.advance)
            .sum()
    }

    /// Calls `put` for every set pixel of `text` with its top left corner at
    /// `(x, top)`. Returns the advance.
    pub fn draw(&self, text: &str, x: i32, top: i32, mut put: impl FnMut(i32, i32)) -> i32 {
        let mut pen = x;
        for glyph in text.chars().filter_map(|c| self.glyph(c)) {
            let glyph_top = top + self.baseline - (glyph.height + glyph.y_offset);
            for (row, bits) in glyph.rows.iter().enumerate() {
                for column in 0..glyph.width {
                    if bits & (0x8000_0000 >> column) != 0 {
                        put(pen + glyph.x_offset + column, glyph_top + row as i32);
                    }
                }
            }
            pen += glyph.advance;
        }
        pen - x
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// A 4x6 font with `I`, `L`, `j` and `?`.
    pub const TINY: &str = "\
STARTFONT 2.1
FONT -tiny-
SIZE 6 75 75
FONTBOUNDINGBOX 4 6 0 -1
STARTPROPERTIES 2
FONT_ASCENT 5
FONT_DESCENT 1
ENDPROPERTIES
CHARS 4
STARTCHAR I
ENCODING 73
SWIDTH 500 0
DWIDTH 4 0
BBX 1 5 1 0
BITMAP
80
80
80
80
80
ENDCHAR
STARTCHAR L
ENCODING 76
DWIDTH 4 0
BBX 3 5 0 0
BITMAP
80
80
80
80
E0
ENDCHAR
STARTCHAR j
ENCODING 106
DWIDTH 3 0
BBX 2 4 0 -1
BITMAP
40
40
40
80
ENDCHAR
STARTCHAR question
ENCODING 63
DWIDTH 4 0
BBX 3 2 0 3
BITMAP
E0
20
ENDCHAR
ENDFONT
";

    fn pixels(font: &Font, text: &str) -> Vec<(i32, i32)> {
        let mut set = Vec::new();
        font.draw(text, 0, 0, |x, y| set.push((x, y)));
        set.sort_by_key(|&(x, y)| (y, x));
        set
    }

    #[test]
    fn reads_bounds_and_glyphs() {
        let font = Font::parse(TINY).unwrap();
        assert_eq!(font.height(), 6);
        assert_eq!(font.baseline, 5);
        assert_eq!(font.glyphs.len(), 4);
        assert_eq!(font.text_width("IL"), 8);
    }

    #[test]
    fn draws_relative_to_the_baseline() {
        let font = Font::parse(TINY).unwrap();
        assert_eq!(
            pixels(&font, "L"),
            [(0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (1, 4), (2, 4)]
        );
        // the descender reaches the last row
        assert_eq!(pixels(&font, "j"), [(1, 2), (1, 3), (1, 4), (0, 5)]);
    }

    #[test]
    fn advances_between_glyphs() {
        let font = Font::parse(TINY).unwrap();
        let mut columns = Vec::new();
        let advance = font.draw("II", 10, 0, |x, _| columns.push(x));
        columns.dedup();
        assert_eq!(columns, [11, 15]);
        assert_eq!(advance, 8);
    }

    #[test]
    fn unknown_characters_fall_back() {
        let font = Font::parse(TINY).unwrap();
        assert_eq!(pixels(&font, "Z"), pixels(&font, "?"));
        assert_eq!(font.text_width("ZZ"), 8);
    }

    #[test]
    fn rejects_non_fonts() {
        assert!(Font::parse("hello world").is_err());
        assert!(Font::parse("FONTBOUNDINGBOX 4 6 0 -1\n").is_err());
        let bad_row = TINY.replace("E0\n20", "E0\nzz");
        assert!(Font::parse(&bad_row).is_err());
    }
}
