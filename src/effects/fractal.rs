use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::{
    palette::Palette,
    run::{DAY_SECS, Effect, Outcome, Shutdown, launch},
};
use ft_common::{Canvas, Color, Geometry};
use std::f64::consts::PI;

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "fractal")]
/// endless Mandelbrot zoom
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "1", from_str_fn(parse_layer))]
    /// layer 0-15 (default 1)
    layer: i32,

    #[argh(option, short = 't', default = "DAY_SECS", from_str_fn(parse_timeout))]
    /// exit after this many seconds (default 24hrs)
    timeout: f64,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "20", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 20)
    delay: u64,
}

/// Point of the complex plane the zoom closes in on.
const TARGET_RE: f64 = -0.577816 - 9.31323E-10 - 1.16415E-10;
const TARGET_IM: f64 = -0.631121 - 2.38419E-07 + 1.49012E-08;
/// Views computed before the zoom turns around.
const VIEWS_PER_LEG: u32 = 38;
const MAX_ITERATIONS: u8 = 255;

/// Escape count of `c = re + im*i`, capped at [`MAX_ITERATIONS`].
pub fn escape_time(re: f64, im: f64) -> u8 {
    let (mut zr, mut zi) = (re, im);
    let mut count = 0;
    while zr * zr + zi * zi < 4.0 && count < MAX_ITERATIONS {
        (zr, zi) = (zr * zr - zi * zi + re, 2.0 * zr * zi + im);
        count += 1;
    }
    count
}

/// Incrementally renders the next view into a double-resolution buffer while
/// the previous view is zoomed with bilinear filtering.
pub struct Fractal {
    width: usize,
    height: usize,
    palette: Palette,
    // view being displayed, and the one being computed
    shown: Vec<u8>,
    pending: Vec<u8>,
    pending_len: usize,
    delta: (f64, f64),
    start_re: f64,
    row_im: f64,
    zoom: (f64, f64),
    zoom_in: bool,
    line: u32,
    views: u32,
}

impl Fractal {
    pub fn new(width: usize, height: usize) -> Self {
        let mut fractal = Self {
            width,
            height,
            palette: Palette::new(),
            shown: vec![0; width * height * 4],
            pending: vec![0; width * height * 4],
            pending_len: 0,
            delta: (0.0, 0.0),
            start_re: 0.0,
            row_im: 0.0,
            zoom: (4.0, 4.0),
            zoom_in: true,
            line: 0,
            views: 0,
        };

        debug!("calculating first view");
        fractal.begin_view();
        while fractal.pending_len < fractal.pending.len() {
            fractal.compute_rows();
        }
        fractal.swap_views();
        fractal.update_palette(0);
        fractal.next_view();
        fractal
    }

    fn lines_per_view(&self) -> u32 {
        (self.height * 2) as u32
    }

    fn begin_view(&mut self) {
        let (zx, zy) = self.zoom;
        let (start_re, start_im) = (TARGET_RE - zx, TARGET_IM - zy);
        let (end_re, end_im) = (TARGET_RE + zx, TARGET_IM + zy);
        self.delta = (
            (end_re - start_re) / (self.width as f64 * 2.0),
            (end_im - start_im) / (self.height as f64 * 2.0),
        );
        self.start_re = start_re;
        self.row_im = start_im;
        self.pending_len = 0;
    }

    /// Computes the next two rows of the pending view.
    fn compute_rows(&mut self) {
        let row_len = self.width * 2;
        for _ in 0..2 {
            if self.pending_len + row_len > self.pending.len() {
                return;
            }
            let mut re = self.start_re;
            for value in &mut self.pending[self.pending_len..self.pending_len + row_len] {
                *value = escape_time(re, self.row_im);
                re += self.delta.0;
            }
            self.pending_len += row_len;
            self.row_im += self.delta.1;
        }
    }

    fn swap_views(&mut self) {
        std::mem::swap(&mut self.shown, &mut self.pending);
    }

    fn rescale_zoom(&mut self) {
        let factor = if self.zoom_in { 0.5 } else { 2.0 };
        self.zoom = (self.zoom.0 * factor, self.zoom.1 * factor);
    }

    fn next_view(&mut self) {
        self.rescale_zoom();
        self.begin_view();
        self.line = 0;
    }

    /// Bilinear zoom of the shown view, `z` from 0 (full view) to 1 (half).
    fn sample(&self, z: f64, mut put: impl FnMut(usize, usize, u8)) {
        let (w, h) = (self.width as i64, self.height as i64);
        let span_w = (((w << 17) as f64 / (256.0 * (1.0 + z))) as i64) << 8;
        let span_h = (((h << 17) as f64 / (256.0 * (1.0 + z))) as i64) << 8;
        let (start_x, start_y) = (((w << 17) - span_w) >> 1, ((h << 17) - span_h) >> 1);
        let (step_x, step_y) = (span_w / w, span_h / h);
        let stride = self.width * 2;
        let at = |row: i64, col: i64| -> i64 {
            i64::from(
                self.shown
                    .get(row as usize * stride + col as usize)
                    .copied()
                    .unwrap_or(0),
            )
        };

        let mut py = start_y;
        for y in 0..self.height {
            let mut px = start_x;
            let (row, fy) = (py >> 16, (py >> 8) & 0xff);
            for x in 0..self.width {
                let (col, fx) = (px >> 16, (px >> 8) & 0xff);
                let value = (at(row, col) * (0x100 - fy) * (0x100 - fx)
                    + at(row, col + 1) * (0x100 - fy) * fx
                    + at(row + 1, col) * fy * (0x100 - fx)
                    + at(row + 1, col + 1) * fy * fx)
                    >> 16;
                put(x, y, value as u8);
                px += step_x;
            }
            py += step_y;
        }
    }

    fn update_palette(&mut self, t: u32) {
        let t = f64::from(t);
        for i in 0..=255u8 {
            let wave = |period: f64, speed: f64| {
                (128.0 - 127.0 * (f64::from(i) * PI / period + t * speed).cos()) as u8
            };
            self.palette
                .set(i, Color::new(wave(64.0, 0.0136), 0, wave(128.0, 0.0212)));
        }
    }
}

impl Effect for Fractal {
    fn step(&mut self, canvas: &mut Canvas) {
        let lines = self.lines_per_view();
        self.line += 1;
        self.compute_rows();

        let progress = f64::from(self.line) / f64::from(lines);
        let z = if self.zoom_in { progress } else { 1.0 - progress };
        self.update_palette(self.views * lines + self.line);

        let palette = &self.palette;
        self.sample(z, |x, y, value| {
            canvas.set_pixel(x as i32, y as i32, palette[value]);
        });

        if self.line >= lines {
            self.views += 1;
            if self.views % VIEWS_PER_LEG == 0 {
                debug!(views = self.views, "reversing zoom");
                self.zoom_in = !self.zoom_in;
                self.rescale_zoom();
                // keep showing the same view, heading the other way
            } else {
                self.swap_views();
            }
            self.next_view();
        }
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
    let fractal = Fractal::new(canvas.width(), canvas.height());

    launch(&settings, shutdown, canvas, fractal).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_time_inside_and_outside() {
        assert_eq!(escape_time(0.0, 0.0), MAX_ITERATIONS);
        assert_eq!(escape_time(-1.0, 0.0), MAX_ITERATIONS);
        assert_eq!(escape_time(2.0, 2.0), 0);
        assert_eq!(escape_time(1.0, 0.0), 1);
    }

    #[test]
    fn first_view_is_complete() {
        let fractal = Fractal::new(9, 7);
        assert_eq!(fractal.shown.len(), 9 * 7 * 4);
        assert!(fractal.shown.iter().any(|&v| v > 0));
        assert_eq!(fractal.line, 0);
        assert_eq!(fractal.zoom, (2.0, 2.0));
    }

    #[test]
    fn full_zoom_samples_the_view_corners() {
        let fractal = Fractal::new(4, 3);
        let mut samples = vec![0u8; 12];
        fractal.sample(0.0, |x, y, value| samples[y * 4 + x] = value);
        // without zoom every output pixel lands exactly on an even source pixel
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(samples[y * 4 + x], fractal.shown[y * 2 * 8 + x * 2]);
            }
        }
    }

    #[test]
    fn one_view_per_two_lines_of_height() {
        let (w, h) = (6, 5);
        let mut fractal = Fractal::new(w, h);
        let mut canvas = Canvas::new(w as i32, h as i32).unwrap();
        for _ in 0..h * 2 {
            fractal.step(&mut canvas);
        }
        assert_eq!(fractal.views, 1);
        assert_eq!(fractal.line, 0);
        assert_eq!(fractal.zoom, (1.0, 1.0));
    }

    #[test]
    fn reverses_after_a_leg() {
        let (w, h) = (4, 3);
        let mut fractal = Fractal::new(w, h);
        let mut canvas = Canvas::new(w as i32, h as i32).unwrap();
        for _ in 0..(VIEWS_PER_LEG as usize) * h * 2 {
            fractal.step(&mut canvas);
        }
        assert!(!fractal.zoom_in);
        assert!(canvas.pixels().iter().any(|&c| c != Color::BLACK));
    }
}
