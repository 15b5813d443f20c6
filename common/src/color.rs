use crate::Error;
use rkyv::{Archive, Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// 24-bit RGB color as it goes over the wire.
///
/// The display treats pure black as transparent, see [`Paint`].
#[derive(Archive, Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Darkest color the display still draws as opaque.
    pub const BACKGROUND: Self = Self::new(1, 1, 1);
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const RED: Self = Self::new(255, 0, 0);
    pub const GREEN: Self = Self::new(0, 255, 0);
    pub const BLUE: Self = Self::new(0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Multiplies every channel by `factor`, saturating at the channel bounds.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        let channel = |c: u8| (f64::from(c) * factor) as u8;
        Self::new(channel(self.r), channel(self.g), channel(self.b))
    }

    pub const fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<&ArchivedColor> for Color {
    fn from(archived: &ArchivedColor) -> Self {
        Self::new(archived.r, archived.g, archived.b)
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(Error::InvalidColor(s.to_owned()));
        }

        let channel = |range| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| Error::InvalidColor(s.to_owned()))
        };

        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// What a draw call puts on the display.
///
/// Effects pick one of these instead of writing the black/near-black
/// sentinels by hand.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Paint {
    /// Lets lower layers show through.
    Transparent,
    /// Covers lower layers, even when the color is black.
    Opaque(Color),
}

impl Paint {
    /// Color written into the canvas for this paint.
    pub fn to_wire(self) -> Color {
        match self {
            Self::Transparent => Color::BLACK,
            Self::Opaque(Color::BLACK) => Color::BACKGROUND,
            Self::Opaque(color) => color,
        }
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Opaque(color)
    }
}

/// Accepts `RRGGBB` for an opaque color and `0`, `none` or `transparent`
/// for [`Paint::Transparent`].
impl FromStr for Paint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "none" | "transparent" => Ok(Self::Transparent),
            other => other.parse().map(Self::Opaque),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_with_and_without_hash() {
        assert_eq!("ff8000".parse::<Color>().unwrap(), Color::new(255, 128, 0));
        assert_eq!("#0A0b0C".parse::<Color>().unwrap(), Color::new(10, 11, 12));
    }

    #[test]
    fn rejects_malformed_hex() {
        for input in ["", "fff", "ff80001", "gg0000", "ff 000", "ÿÿÿ"] {
            assert!(
                matches!(input.parse::<Color>(), Err(Error::InvalidColor(_))),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Color::new(1, 171, 255).to_string(), "01abff");
    }

    #[test]
    fn scale_truncates() {
        assert_eq!(Color::new(255, 100, 3).scale(0.5), Color::new(127, 50, 1));
        assert_eq!(Color::WHITE.scale(0.0), Color::BLACK);
    }

    #[test]
    fn opaque_black_is_kept_visible() {
        assert_eq!(Paint::Transparent.to_wire(), Color::BLACK);
        assert_eq!(Paint::Opaque(Color::BLACK).to_wire(), Color::BACKGROUND);
        assert_eq!(Paint::Opaque(Color::RED).to_wire(), Color::RED);
    }

    #[test]
    fn paint_from_cli_text() {
        assert_eq!("0".parse::<Paint>().unwrap(), Paint::Transparent);
        assert_eq!("none".parse::<Paint>().unwrap(), Paint::Transparent);
        assert_eq!(
            "000000".parse::<Paint>().unwrap(),
            Paint::Opaque(Color::BLACK)
        );
        assert!("red".parse::<Paint>().is_err());
    }
}
