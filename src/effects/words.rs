use super::{parse_delay, parse_layer, settings};
use crate::{
    font::Font,
    palette::{Glow, Palette},
    run::{Effect, Outcome, Shutdown, launch},
};
use anyhow::bail;
use ft_common::{Canvas, Color, Geometry, Paint};
use std::path::PathBuf;

/// Brightness lost by every blurred pixel per frame.
const BLUR_DROP: u8 = 32;
/// Seconds per word when no total time is given.
const SECS_PER_WORD: f64 = 2.0;

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "words")]
/// show a text one word at a time
pub struct Args {
    #[argh(positional)]
    /// the text
    text: Vec<String>,

    #[argh(option, short = 'f')]
    /// BDF font file
    font: PathBuf,

    #[argh(option, short = 'g')]
    /// output geometry <W>x<H>[+<X>+<Y>[+<L>]] (default 45x<font height>+0+0)
    geometry: Option<Geometry>,

    #[argh(option, short = 'l', default = "1", from_str_fn(parse_layer))]
    /// layer 0-15 (default 1)
    layer: i32,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "50", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 50)
    delay: u64,

    #[argh(option, short = 'c', default = "Color::WHITE")]
    /// text color as RRGGBB (default FFFFFF)
    color: Color,

    #[argh(option, short = 'b', default = "Paint::Transparent")]
    /// background color as RRGGBB, 0 for transparent (default transparent)
    background: Paint,

    #[argh(option, short = 'p')]
    /// let the words glow and fade through a palette: nebula, fire or bluegreen
    palette: Option<Glow>,

    #[argh(option, short = 't')]
    /// total time in seconds to show all the words (default 2 per word)
    time: Option<f64>,
}

/// Averages every pixel with its right and lower neighbours, dropping a
/// little heat on the way. The last row and column only feed others.
fn blur(width: usize, heat: &mut [u8]) {
    let size = heat.len().saturating_sub(width + 1);
    for i in 0..size {
        let sum = u16::from(heat[i])
            + u16::from(heat[i + 1])
            + u16::from(heat[i + width])
            + u16::from(heat[i + width + 1]);
        heat[i] = ((sum >> 2) as u8).saturating_sub(BLUR_DROP);
    }
}

/// Shows each word centered for a fixed number of frames.
pub struct Words {
    words: Vec<String>,
    font: Font,
    frames_per_word: u64,
    frame: u64,
    color: Color,
    background: Paint,
    glow: Option<(Palette, Vec<u8>)>,
}

impl Words {
    pub fn new(text: &str, font: Font, frames_per_word: u64) -> Self {
        Self {
            words: text.split_whitespace().map(String::from).collect(),
            font,
            frames_per_word: frames_per_word.max(1),
            frame: 0,
            color: Color::WHITE,
            background: Paint::Transparent,
            glow: None,
        }
    }

    pub fn with_colors(mut self, color: Color, background: Paint) -> Self {
        self.color = color;
        self.background = background;
        self
    }

    pub fn with_glow(mut self, glow: Option<Glow>) -> Self {
        self.glow = glow.map(|glow| (Palette::glow(glow), Vec::new()));
        self
    }

    fn current(&self) -> &str {
        let index = (self.frame / self.frames_per_word) as usize % self.words.len().max(1);
        self.words.get(index).map_or("", String::as_str)
    }

    /// Top left corner that centers `word` on the canvas.
    fn origin(&self, word: &str, canvas: &Canvas) -> (i32, i32) {
        (
            (canvas.width() as i32 - self.font.text_width(word)) / 2,
            (canvas.height() as i32 - self.font.height()) / 2,
        )
    }
}

impl Effect for Words {
    fn step(&mut self, canvas: &mut Canvas) {
        let word = self.current().to_owned();
        let (x, top) = self.origin(&word, canvas);
        let (width, height) = (canvas.width(), canvas.height());

        match &mut self.glow {
            None => {
                canvas.fill(self.background.to_wire());
                let color = self.color;
                self.font
                    .draw(&word, x, top, |px, py| canvas.set_pixel(px, py, color));
            }
            Some((palette, heat)) => {
                heat.resize(width * height, 0);
                // words burn for the first half of their time and cool off after
                if self.frame % self.frames_per_word < self.frames_per_word.div_ceil(2) {
                    self.font.draw(&word, x, top, |px, py| {
                        if (0..width as i32).contains(&px) && (0..height as i32).contains(&py) {
                            heat[py as usize * width + px as usize] = u8::MAX;
                        }
                    });
                }
                blur(width, heat);

                for (i, &value) in heat.iter().enumerate() {
                    let paint = match value {
                        0 => self.background,
                        value => Paint::Opaque(palette[value]),
                    };
                    canvas.paint((i % width) as i32, (i / width) as i32, paint);
                }
            }
        }

        self.frame += 1;
    }
}

pub async fn run(args: Args, shutdown: &Shutdown) -> anyhow::Result<Outcome> {
    let text = args.text.join(" ");
    let count = text.split_whitespace().count();
    if count == 0 {
        bail!("this looks like a very empty text");
    }
    let font = Font::load(&args.font)?;

    let geometry = args
        .geometry
        .unwrap_or_else(|| Geometry::new(45, font.height()));
    let total = args.time.unwrap_or(SECS_PER_WORD * count as f64);
    if !(total.is_finite() && total > 0.0) {
        bail!("invalid total time {total}");
    }
    let frames_per_word = (total * 1000.0 / args.delay as f64 / count as f64).round() as u64;

    let settings = settings(args.host, geometry, args.layer, Some(total), args.delay)
        .map_err(anyhow::Error::msg)?;
    let canvas = settings.geometry.canvas()?;
    info!(words = count, frames_per_word, "showing text");

    let words = Words::new(&text, font, frames_per_word)
        .with_colors(args.color, args.background)
        .with_glow(args.palette);

    launch(&settings, shutdown, canvas, words).await
}
