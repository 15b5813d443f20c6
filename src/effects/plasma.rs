use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::{
    palette::{Palette, Preset},
    run::{DAY_SECS, Effect, Outcome, Shutdown, launch},
};
use ft_common::{Canvas, Geometry};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "plasma")]
/// animated plasma
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "3", from_str_fn(parse_layer))]
    /// layer 0-15 (default 3)
    layer: i32,

    #[argh(option, short = 't', default = "DAY_SECS", from_str_fn(parse_timeout))]
    /// exit after this many seconds (default 24hrs)
    timeout: f64,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "10", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 10)
    delay: u64,

    #[argh(option, short = 'p', default = "Preset::Rainbow")]
    /// palette: rainbow, rgb, nebula, fire or bluegreen (default rainbow)
    palette: Preset,
}

const SLOWDOWN: f64 = 3.0;

/// Three windows slide over two precomputed double-size sine fields; their
/// sum indexes the palette.
pub struct Plasma {
    palette: Palette,
    width: usize,
    height: usize,
    radial: Vec<u8>,
    wavy: Vec<u8>,
    count: u32,
}

impl Plasma {
    pub fn new(width: usize, height: usize, palette: Palette) -> Self {
        let (w, h) = (width as f64, height as f64);
        let mut radial = Vec::with_capacity(width * height * 4);
        let mut wavy = Vec::with_capacity(width * height * 4);

        for y in 0..height * 2 {
            let y = y as f64;
            for x in 0..width * 2 {
                let x = x as f64;
                let distance = ((h - y) * (h - y) + (w - x) * (w - x)).sqrt();
                radial.push((64.0 + 63.0 * (distance / 5.0).sin()) as u8);
                wavy.push(
                    (64.0
                        + 63.0
                            * (x / (12.0 + 4.5 * (y / 19.0).cos())).sin()
                            * (y / (10.0 + 3.5 * (x / 14.0).sin())).cos())
                        as u8,
                );
            }
        }

        Self {
            palette,
            width,
            height,
            radial,
            wavy,
            count: 0,
        }
    }

    /// Top-left index of a window into the double-size fields.
    fn window(&self, fx: f64, fy: f64) -> usize {
        let (half_w, half_h) = (self.width / 2, self.height / 2);
        let x = half_w as f64 + (half_w as f64 - 1.0) * fx;
        let y = half_h as f64 + (half_h as f64 - 1.0) * fy;
        // truncate toward zero, then clamp
        let x = (x as i64).clamp(0, self.width as i64) as usize;
        let y = (y as i64).clamp(0, self.height as i64) as usize;
        y * self.width * 2 + x
    }
}

impl Effect for Plasma {
    fn step(&mut self, canvas: &mut Canvas) {
        let t = f64::from(self.count) / SLOWDOWN;
        let mut src1 = self.window((t / 97.0).cos(), (t / 123.0).sin());
        let mut src2 = self.window((-t / 114.0).sin(), (-t / 75.0).cos());
        let mut src3 = self.window((-t / 137.0).sin(), (-t / 108.0).cos());

        for y in 0..self.height {
            for x in 0..self.width {
                let index = self.radial[src1]
                    .wrapping_add(self.wavy[src2])
                    .wrapping_add(self.wavy[src3]);
                canvas.set_pixel(x as i32, y as i32, self.palette[index]);
                src1 += 1;
                src2 += 1;
                src3 += 1;
            }
            src1 += self.width;
            src2 += self.width;
            src3 += self.width;
        }

        self.count = self.count.wrapping_add(1);
    }
}

pub async fn run(args: Args, shutdown: &Shutdown) -> anyhow::Result<Outcome> {
    let settings = settings(
        args.host,
        args.geometry,
        args.layer,
        Some(args.timeout),
        args.delay,
    )
    .map_err(anyhow::Error::msg)?;
    let canvas = settings.geometry.canvas()?;
    let plasma = Plasma::new(canvas.width(), canvas.height(), Palette::preset(args.palette));

    launch(&settings, shutdown, canvas, plasma).await
}
