use crate::{Canvas, Error, Result};
use std::{fmt, str::FromStr};

/// Canvas size and placement as given on the command line:
/// `<W>x<H>[+<X>+<Y>[+<layer>]]`.
///
/// Offsets and layer are signed, so `45x35-3+2` is valid. Layer validation is
/// left to the caller.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Geometry {
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
    pub layer: Option<i32>,
}

impl Geometry {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            x: 0,
            y: 0,
            layer: None,
        }
    }

    #[must_use]
    pub const fn at(mut self, x: i32, y: i32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn canvas(&self) -> Result<Canvas> {
        Canvas::new(self.width, self.height)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new(45, 35)
    }
}

/// Splits a leading, optionally signed, decimal number off `input`.
fn take_number(input: &str, signed: bool) -> Option<(i32, &str)> {
    let sign_len = usize::from(signed && input.starts_with(['+', '-']));
    let digits = input[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len() - sign_len);
    if digits == 0 {
        return None;
    }

    let (number, rest) = input.split_at(sign_len + digits);
    Some((number.parse().ok()?, rest))
}

impl FromStr for Geometry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidGeometry(s.to_owned());

        let (width, rest) = take_number(s, false).ok_or_else(invalid)?;
        let rest = rest.strip_prefix(['x', 'X']).ok_or_else(invalid)?;
        let (height, mut rest) = take_number(rest, false).ok_or_else(invalid)?;
        if width <= 0 || height <= 0 {
            return Err(invalid());
        }

        let mut extra = Vec::with_capacity(3);
        while !rest.is_empty() {
            if !rest.starts_with(['+', '-']) || extra.len() == 3 {
                return Err(invalid());
            }
            let (value, tail) = take_number(rest, true).ok_or_else(invalid)?;
            extra.push(value);
            rest = tail;
        }

        let geometry = match extra[..] {
            [] => Self::new(width, height),
            [x, y] => Self::new(width, height).at(x, y),
            [x, y, layer] => Self {
                layer: Some(layer),
                ..Self::new(width, height).at(x, y)
            },
            _ => return Err(invalid()),
        };

        Ok(geometry)
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)?;
        if let Some(layer) = self.layer {
            write!(f, "{layer:+}")?;
        }
        Ok(())
    }
}
