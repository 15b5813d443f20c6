use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::run::{DAY_SECS, Effect, Outcome, Shutdown, launch};
use ft_common::{Canvas, Color, Geometry};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "dots")]
/// scatter random dots of random colors
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
}

pub struct Dots<R> {
    rng: R,
}

impl<R: Rng> Dots<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Effect for Dots<R> {
    fn step(&mut self, canvas: &mut Canvas) {
        let x = self.rng.gen_range(0..canvas.width()) as i32;
        let y = self.rng.gen_range(0..canvas.height()) as i32;
        let mut rgb = [0u8; 3];
        self.rng.fill(&mut rgb);
        canvas.set_pixel(x, y, Color::from(rgb));
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

    launch(&settings, shutdown, canvas, Dots::new(StdRng::from_entropy())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_step_lights_at_most_one_more_pixel() {
        let mut canvas = Canvas::new(8, 8).unwrap();
        let mut dots = Dots::new(StdRng::seed_from_u64(7));

        let mut previous = 0;
        for _ in 0..50 {
            dots.step(&mut canvas);
            let lit = canvas.pixels().iter().filter(|&&c| c != Color::BLACK).count();
            assert!(lit <= previous + 1);
            previous = lit;
        }
        assert!(previous > 10);
    }
}
