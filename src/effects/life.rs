use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::{
    palette::Palette,
    run::{DAY_SECS, Effect, Outcome, Shutdown, launch},
};
use ft_common::{Canvas, Geometry, Paint};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::time::{Duration, Instant};

fn parse_density(value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(n) if n >= 2 => Ok(n),
        _ => Err(format!("invalid number of dots '{value}'")),
    }
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "life")]
/// Conway's Game of Life
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "2", from_str_fn(parse_layer))]
    /// layer 0-15 (default 2)
    layer: i32,

    #[argh(option, short = 't', default = "DAY_SECS", from_str_fn(parse_timeout))]
    /// exit after this many seconds (default 24hrs)
    timeout: f64,

    #[argh(option, short = 'r', from_str_fn(parse_timeout))]
    /// respawn random dots after this many seconds
    respawn: Option<f64>,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "200", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 200)
    delay: u64,

    #[argh(option, short = 'c')]
    /// foreground color as RRGGBB, 0 for transparent (default cycles)
    color: Option<Paint>,

    #[argh(option, short = 'b', default = "Paint::Transparent")]
    /// background color as RRGGBB, 0 for transparent (default transparent)
    background: Paint,

    #[argh(option, short = 'n', default = "6", from_str_fn(parse_density))]
    /// seed with one live cell in every n (default 6)
    density: u32,
}

/// Toroidal Game of Life board.
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<bool>,
    scratch: Vec<bool>,
}

impl Board {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
            scratch: vec![false; width * height],
        }
    }

    /// Replaces the board with random cells, one in `density` alive.
    pub fn seed(&mut self, rng: &mut impl Rng, density: u32) {
        for cell in &mut self.cells {
            *cell = rng.gen_range(0..density) == 0;
        }
    }

    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.cells[y * self.width + x]
    }

    #[cfg(test)]
    pub fn set(&mut self, x: usize, y: usize, alive: bool) {
        self.cells[y * self.width + x] = alive;
    }

    fn neighbours(&self, x: usize, y: usize) -> usize {
        let (w, h) = (self.width, self.height);
        let mut count = 0;
        for dy in [h - 1, 0, 1] {
            for dx in [w - 1, 0, 1] {
                if (dx, dy) != (0, 0) && self.is_alive((x + dx) % w, (y + dy) % h) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn advance(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let n = self.neighbours(x, y);
                self.scratch[y * self.width + x] = n == 3 || (n == 2 && self.is_alive(x, y));
            }
        }
        std::mem::swap(&mut self.cells, &mut self.scratch);
    }
}

pub struct Life<R> {
    board: Board,
    rng: R,
    density: u32,
    respawn: Option<Duration>,
    last_spawn: Instant,
    palette: Palette,
    hue: u8,
    foreground: Option<Paint>,
    background: Paint,
}

impl<R: Rng> Life<R> {
    pub fn new(width: usize, height: usize, density: u32, mut rng: R) -> Self {
        let mut board = Board::new(width, height);
        board.seed(&mut rng, density);

        Self {
            board,
            rng,
            density,
            respawn: None,
            last_spawn: Instant::now(),
            palette: Palette::spectrum(),
            hue: 0,
            foreground: None,
            background: Paint::Transparent,
        }
    }

    /// A fixed foreground; `None` cycles through the spectrum.
    pub fn with_colors(mut self, foreground: Option<Paint>, background: Paint) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_respawn(mut self, respawn: Option<Duration>) -> Self {
        self.respawn = respawn;
        self
    }
}

impl<R: Rng> Effect for Life<R> {
    fn step(&mut self, canvas: &mut Canvas) {
        self.board.advance();

        if let Some(respawn) = self.respawn {
            if self.last_spawn.elapsed() > respawn {
                debug!("respawning");
                self.last_spawn = Instant::now();
                self.board.seed(&mut self.rng, self.density);
            }
        }

        let foreground = self
            .foreground
            .unwrap_or(Paint::Opaque(self.palette[self.hue]));
        for y in 0..self.board.height {
            for x in 0..self.board.width {
                let paint = if self.board.is_alive(x, y) {
                    foreground
                } else {
                    self.background
                };
                canvas.paint(x as i32, y as i32, paint);
            }
        }

        self.hue = self.hue.wrapping_add(1);
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
    let life = Life::new(
        canvas.width(),
        canvas.height(),
        args.density,
        StdRng::from_entropy(),
    )
    .with_colors(args.color, args.background)
    .with_respawn(args.respawn.map(Duration::from_secs_f64));

    launch(&settings, shutdown, canvas, life).await
}
