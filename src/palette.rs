use ft_common::Color;
use std::{ops::Index, str::FromStr};

/// 256-entry lookup table from an 8-bit value to a color.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Palette([Color; 256]);

/// Named gradients selectable with `-p`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Preset {
    #[default]
    Rainbow,
    Rgb,
    Nebula,
    Fire,
    Bluegreen,
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" | "rainbow" => Self::Rainbow,
            "1" | "rgb" => Self::Rgb,
            "2" | "nebula" => Self::Nebula,
            "3" | "fire" => Self::Fire,
            "4" | "bluegreen" => Self::Bluegreen,
            other => return Err(format!("unknown palette `{other}`")),
        })
    }
}

/// Black to white heat ramps, selectable with `words -p`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Glow {
    Nebula,
    Fire,
    Bluegreen,
}

impl FromStr for Glow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "0" | "nebula" => Self::Nebula,
            "1" | "fire" => Self::Fire,
            "2" | "bluegreen" => Self::Bluegreen,
            other => return Err(format!("unknown palette `{other}`")),
        })
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::new(r, g, b)
}

const BLACK: Color = rgb(0, 0, 0);
const WHITE: Color = rgb(255, 255, 255);
const HALF_BLUE: Color = rgb(0, 0, 127);
const MAGENTA: Color = rgb(255, 0, 255);
const BLUE: Color = rgb(0, 0, 255);
const CYAN: Color = rgb(0, 255, 255);
const GREEN: Color = rgb(0, 255, 0);
const YELLOW: Color = rgb(255, 255, 0);
const ORANGE: Color = rgb(255, 127, 0);
const RED: Color = rgb(255, 0, 0);
const TEAL: Color = rgb(0, 127, 255);

impl Palette {
    pub fn new() -> Self {
        Self([Color::BLACK; 256])
    }

    /// Fills `start..=end` with a linear blend from `from` to `to`.
    pub fn gradient(&mut self, start: u8, end: u8, from: Color, to: Color) -> &mut Self {
        let span = f32::from(end - start);
        for i in 0..=(end - start) {
            let k = if span == 0.0 { 0.0 } else { f32::from(i) / span };
            let blend = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * k) as u8;
            self.0[usize::from(start + i)] = rgb(
                blend(from.r, to.r),
                blend(from.g, to.g),
                blend(from.b, to.b),
            );
        }
        self
    }

    /// Builds a palette from consecutive `(end, from, to)` stops starting at 0.
    fn from_stops(stops: &[(u8, Color, Color)]) -> Self {
        let mut palette = Self::new();
        let mut start = 0;
        for &(end, from, to) in stops {
            palette.gradient(start, end, from, to);
            start = end.saturating_add(1);
        }
        palette
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Rainbow => Self::from_stops(&[
                (35, MAGENTA, BLUE),
                (71, BLUE, CYAN),
                (107, CYAN, GREEN),
                (143, GREEN, YELLOW),
                (179, YELLOW, ORANGE),
                (215, ORANGE, RED),
                (255, RED, MAGENTA),
            ]),
            Preset::Rgb => Self::from_stops(&[
                (63, BLACK, RED),
                (127, BLACK, GREEN),
                (191, BLACK, BLUE),
                (255, BLACK, WHITE),
            ]),
            Preset::Nebula => Self::from_stops(&[
                (31, BLACK, HALF_BLUE),
                (95, HALF_BLUE, rgb(127, 0, 255)),
                (159, rgb(127, 0, 255), RED),
                (191, RED, WHITE),
                (255, WHITE, BLACK),
            ]),
            Preset::Fire => Self::from_stops(&[
                (23, BLACK, HALF_BLUE),
                (47, HALF_BLUE, RED),
                (95, RED, YELLOW),
                (127, YELLOW, WHITE),
                (159, WHITE, YELLOW),
                (207, YELLOW, RED),
                (231, RED, HALF_BLUE),
                (255, HALF_BLUE, BLACK),
            ]),
            Preset::Bluegreen => Self::from_stops(&[
                (23, BLACK, HALF_BLUE),
                (47, HALF_BLUE, TEAL),
                (95, TEAL, GREEN),
                (127, GREEN, WHITE),
                (159, WHITE, GREEN),
                (207, GREEN, TEAL),
                (231, TEAL, HALF_BLUE),
                (255, HALF_BLUE, BLACK),
            ]),
        }
    }

    /// Unlike the presets these never wrap, the hottest entry is white.
    pub fn glow(glow: Glow) -> Self {
        let (second, third) = match glow {
            Glow::Nebula => (rgb(127, 0, 255), RED),
            Glow::Fire => (RED, YELLOW),
            Glow::Bluegreen => (TEAL, GREEN),
        };
        Self::from_stops(&[
            (63, BLACK, HALF_BLUE),
            (127, HALF_BLUE, second),
            (191, second, third),
            (255, third, WHITE),
        ])
    }

    /// Eight evenly spaced hues, used by the demos that cycle a single color.
    pub fn spectrum() -> Self {
        Self::from_stops(&[
            (31, MAGENTA, BLUE),
            (63, BLUE, CYAN),
            (95, CYAN, GREEN),
            (127, GREEN, rgb(127, 255, 0)),
            (159, rgb(127, 255, 0), YELLOW),
            (191, YELLOW, ORANGE),
            (223, ORANGE, RED),
            (255, RED, MAGENTA),
        ])
    }

    pub fn set(&mut self, index: u8, color: Color) {
        self.0[usize::from(index)] = color;
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<u8> for Palette {
    type Output = Color;

    fn index(&self, index: u8) -> &Color {
        &self.0[usize::from(index)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_hits_both_anchors() {
        let mut palette = Palette::new();
        palette.gradient(10, 20, rgb(0, 100, 255), rgb(255, 0, 55));
        assert_eq!(palette[10], rgb(0, 100, 255));
        assert_eq!(palette[20], rgb(255, 0, 55));
        assert_eq!(palette[15], rgb(127, 50, 155));
        assert_eq!(palette[9], Color::BLACK);
        assert_eq!(palette[21], Color::BLACK);
    }

    #[test]
    fn single_entry_gradient_uses_start_color() {
        let mut palette = Palette::new();
        palette.gradient(7, 7, RED, BLUE);
        assert_eq!(palette[7], RED);
    }

    #[test]
    fn rainbow_anchors() {
        let palette = Palette::preset(Preset::Rainbow);
        assert_eq!(palette[0], MAGENTA);
        assert_eq!(palette[36], BLUE);
        assert_eq!(palette[72], CYAN);
        assert_eq!(palette[215], RED);
        assert_eq!(palette[255], MAGENTA);
    }

    #[test]
    fn rgb_bands_restart_at_black() {
        let palette = Palette::preset(Preset::Rgb);
        for start in [0, 64, 128, 192] {
            assert_eq!(palette[start], BLACK);
        }
        assert_eq!(palette[63], RED);
        assert_eq!(palette[255], WHITE);
    }

    #[test]
    fn fire_and_bluegreen_wrap_to_black() {
        for preset in [Preset::Fire, Preset::Bluegreen, Preset::Nebula] {
            let palette = Palette::preset(preset);
            assert_eq!(palette[0], BLACK, "{preset:?}");
            assert_eq!(palette[255], BLACK, "{preset:?}");
        }
    }

    #[test]
    fn presets_parse_by_number_or_name() {
        assert_eq!("3".parse::<Preset>().unwrap(), Preset::Fire);
        assert_eq!("bluegreen".parse::<Preset>().unwrap(), Preset::Bluegreen);
        assert!("5".parse::<Preset>().is_err());
    }

    #[test]
    fn glows_ramp_from_black_to_white() {
        for glow in [Glow::Nebula, Glow::Fire, Glow::Bluegreen] {
            let palette = Palette::glow(glow);
            assert_eq!(palette[0], BLACK, "{glow:?}");
            assert_eq!(palette[63], HALF_BLUE, "{glow:?}");
            assert_eq!(palette[255], WHITE, "{glow:?}");
        }
        assert_eq!(Palette::glow(Glow::Fire)[191], YELLOW);
        assert_eq!("fire".parse::<Glow>(), Ok(Glow::Fire));
        assert_eq!("2".parse::<Glow>(), Ok(Glow::Bluegreen));
        assert!("plasma".parse::<Glow>().is_err());
    }

    #[test]
    fn spectrum_starts_and_ends_magenta() {
        let palette = Palette::spectrum();
        assert_eq!(palette[0], MAGENTA);
        assert_eq!(palette[32], BLUE);
        assert_eq!(palette[255], MAGENTA);
    }
}
