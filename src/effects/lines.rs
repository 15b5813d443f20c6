use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::run::{Effect, Outcome, Shutdown, launch};
use ft_common::{Canvas, Color, Geometry, Paint};
use rand::{Rng, SeedableRng, rngs::StdRng};

const MAX_LINES: usize = 50;
const SKIP: std::ops::RangeInclusive<i32> = 1..=3;

fn parse_count(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if (1..=MAX_LINES).contains(&n) => Ok(n),
        _ => Err(format!("invalid number '{value}'")),
    }
}

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "lines")]
/// lines bouncing off the walls, fading between colors
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "3", from_str_fn(parse_layer))]
    /// layer 0-15 (default 3)
    layer: i32,

    #[argh(option, short = 't', from_str_fn(parse_timeout))]
    /// exit after this many seconds (default runs forever)
    timeout: Option<f64>,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "50", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 50)
    delay: u64,

    #[argh(switch, short = '4')]
    /// mirror every line four ways
    four: bool,

    #[argh(switch, short = 'a')]
    /// anti-alias the lines
    smooth: bool,

    #[argh(switch)]
    /// only draw the end points
    dots: bool,

    #[argh(option, short = 'n', default = "6", from_str_fn(parse_count))]
    /// number of lines on screen (default 6, max 50)
    count: usize,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Line {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stroke {
    Dots,
    Plain,
    Smooth,
}

/// Sets the two end points only.
pub fn draw_dots(canvas: &mut Canvas, line: Line, color: Color) {
    canvas.set_pixel(line.x1, line.y1, color);
    canvas.set_pixel(line.x2, line.y2, color);
}

/// Bresenham line, end points included.
pub fn draw_line(canvas: &mut Canvas, line: Line, color: Color) {
    let Line { x1, y1, x2, y2 } = line;
    let (dx, dy) = ((x2 - x1).abs(), (y2 - y1).abs());
    let step_x = if x2 >= x1 { 1 } else { -1 };
    let step_y = if y2 >= y1 { 1 } else { -1 };

    // walk the major axis, carry into the minor one
    let (major, minor) = if dx >= dy { (dx, dy) } else { (dy, dx) };
    let mut error = major / 2;
    let (mut x, mut y) = (x1, y1);

    for _ in 0..=major {
        canvas.set_pixel(x, y, color);
        error += minor;
        if error >= major {
            error -= major;
            if dx >= dy {
                y += step_y;
            } else {
                x += step_x;
            }
        }
        if dx >= dy {
            x += step_x;
        } else {
            y += step_y;
        }
    }
}

fn ipart(v: f64) -> i32 {
    v as i32
}

fn fpart(v: f64) -> f64 {
    v - f64::from(ipart(v))
}

fn rfpart(v: f64) -> f64 {
    1.0 - fpart(v)
}

fn round(v: f64) -> i32 {
    (v + 0.5) as i32
}

/// Xiaolin Wu anti-aliased line.
pub fn draw_smooth_line(canvas: &mut Canvas, line: Line, color: Color) {
    let Line {
        mut x1,
        mut y1,
        mut x2,
        mut y2,
    } = line;
    let dx = f64::from(x2 - x1);
    let dy = f64::from(y2 - y1);
    let steep = dx.abs() <= dy.abs();

    // plot along the major axis, `across` is the minor coordinate
    let mut plot = |along: i32, across: i32, brightness: f64| {
        if steep {
            canvas.set_pixel(across, along, color.scale(brightness));
        } else {
            canvas.set_pixel(along, across, color.scale(brightness));
        }
    };

    if steep {
        std::mem::swap(&mut x1, &mut y1);
        std::mem::swap(&mut x2, &mut y2);
    }
    if x2 < x1 {
        std::mem::swap(&mut x1, &mut x2);
        std::mem::swap(&mut y1, &mut y2);
    }

    let (dx, dy) = if steep { (dy, dx) } else { (dx, dy) };
    let gradient = if dx == 0.0 { 0.0 } else { dy / dx };

    let mut end_point = |x: i32, y: i32, gap: f64| {
        let xend = round(f64::from(x));
        let yend = f64::from(y) + gradient * f64::from(xend - x);
        plot(xend, ipart(yend), rfpart(yend) * gap);
        plot(xend, ipart(yend) + 1, fpart(yend) * gap);
        (xend, yend)
    };

    let (xpxl1, yend1) = end_point(x1, y1, rfpart(f64::from(x1) + 0.5));
    let (xpxl2, _) = end_point(x2, y2, fpart(f64::from(x2) + 0.5));

    let mut intery = yend1 + gradient;
    for x in (xpxl1 + 1)..xpxl2 {
        plot(x, ipart(intery), rfpart(intery));
        plot(x, ipart(intery) + 1, fpart(intery));
        intery += gradient;
    }
}

/// Fades between random primary/secondary colors in 16 steps.
struct ColorFade {
    steps_left: i32,
    target: [i32; 3],
    step: [i32; 3],
    current: [i32; 3],
}

impl ColorFade {
    fn new() -> Self {
        Self {
            steps_left: 0,
            target: [0; 3],
            step: [0; 3],
            current: [0; 3],
        }
    }

    fn next(&mut self, rng: &mut impl Rng) -> Color {
        self.steps_left -= 1;
        if self.steps_left < 0 {
            self.steps_left = 15;
            let previous = self.target;
            self.target = loop {
                let candidate: [i32; 3] =
                    std::array::from_fn(|_| if rng.gen_bool(0.5) { 255 } else { 0 });
                if candidate != [0; 3] {
                    break candidate;
                }
            };
            for i in 0..3 {
                self.step[i] = 16 * (self.target[i] - previous[i]).signum();
            }
            self.current = previous;
        }

        for (current, step) in self.current.iter_mut().zip(self.step) {
            *current += step;
        }
        let channel = |v: i32| (v as f32 / 256.0 * 255.0) as u8;
        Color::new(
            channel(self.current[0]),
            channel(self.current[1]),
            channel(self.current[2]),
        )
    }
}

/// Ring of recent line positions; the oldest gets erased as a new one is
/// drawn.
pub struct Lines<R> {
    width: i32,
    height: i32,
    ring: Vec<Line>,
    head: usize,
    skip: Line,
    fade: ColorFade,
    stroke: Stroke,
    four: bool,
    rng: R,
}

impl<R: Rng> Lines<R> {
    pub fn new(width: i32, height: i32, count: usize, mut rng: R) -> Self {
        let mut random_skip = || {
            let skip = rng.gen_range(SKIP);
            if rng.gen_bool(0.5) { skip } else { -skip }
        };
        let skip = Line {
            x1: random_skip(),
            y1: random_skip(),
            x2: random_skip(),
            y2: random_skip(),
        };

        let mut ring = vec![Line::default(); count.clamp(1, MAX_LINES)];
        let head = 1 % ring.len();
        let (max_x, max_y) = ((width - 2).max(1), (height - 2).max(1));
        ring[head] = Line {
            x1: rng.gen_range(1..=max_x),
            y1: rng.gen_range(1..=max_y),
            x2: rng.gen_range(1..=max_x),
            y2: rng.gen_range(1..=max_y),
        };

        let mut fade = ColorFade::new();
        fade.next(&mut rng);

        Self {
            width,
            height,
            ring,
            head,
            skip,
            fade,
            stroke: Stroke::Plain,
            four: false,
            rng,
        }
    }

    pub fn with_stroke(mut self, stroke: Stroke, four: bool) -> Self {
        self.stroke = stroke;
        self.four = four;
        self
    }

    fn oldest(&self) -> Line {
        self.ring[(self.head + 1) % self.ring.len()]
    }

    fn advance(&mut self) -> Line {
        let previous = self.ring[self.head];
        self.head = (self.head + 1) % self.ring.len();

        let line = Line {
            x1: previous.x1 + self.skip.x1,
            y1: previous.y1 + self.skip.y1,
            x2: previous.x2 + self.skip.x2,
            y2: previous.y2 + self.skip.y2,
        };

        // bounce the end points that reached a wall
        let rng = &mut self.rng;
        let mut bounce = |pos: i32, limit: i32, skip: &mut i32| {
            if pos <= 0 {
                *skip = rng.gen_range(SKIP);
            }
            if pos >= limit {
                *skip = -rng.gen_range(SKIP);
            }
        };
        bounce(line.x1, self.width, &mut self.skip.x1);
        bounce(line.y1, self.height, &mut self.skip.y1);
        bounce(line.x2, self.width, &mut self.skip.x2);
        bounce(line.y2, self.height, &mut self.skip.y2);

        self.ring[self.head] = line;
        line
    }

    fn draw(&self, canvas: &mut Canvas, line: Line, color: Color) {
        let draw: fn(&mut Canvas, Line, Color) = match self.stroke {
            Stroke::Dots => draw_dots,
            Stroke::Plain => draw_line,
            Stroke::Smooth => draw_smooth_line,
        };

        draw(canvas, line, color);
        if self.four {
            let (w, h) = (self.width, self.height);
            let Line { x1, y1, x2, y2 } = line;
            draw(canvas, Line { x1: w - x1, y1, x2: w - x2, y2 }, color);
            draw(canvas, Line { x1, y1: h - y1, x2, y2: h - y2 }, color);
            draw(
                canvas,
                Line {
                    x1: w - x1,
                    y1: h - y1,
                    x2: w - x2,
                    y2: h - y2,
                },
                color,
            );
        }
    }
}

impl<R: Rng> Effect for Lines<R> {
    fn step(&mut self, canvas: &mut Canvas) {
        self.draw(canvas, self.oldest(), Paint::Transparent.to_wire());

        let color = self.fade.next(&mut self.rng);
        let line = self.advance();
        self.draw(canvas, line, color);
    }
}

pub async fn run(args: Args, shutdown: &Shutdown) -> anyhow::Result<Outcome> {
    let settings = settings(
        args.host,
        args.geometry,
        args.layer,
        args.timeout,
        args.delay,
    )
    .map_err(anyhow::Error::msg)?;
    let canvas = settings.geometry.canvas()?;

    let stroke = match (args.dots, args.smooth) {
        (true, _) => Stroke::Dots,
        (false, true) => Stroke::Smooth,
        (false, false) => Stroke::Plain,
    };
    let lines = Lines::new(
        settings.geometry.width,
        settings.geometry.height,
        args.count,
        StdRng::from_entropy(),
    )
    .with_stroke(stroke, args.four);

    launch(&settings, shutdown, canvas, lines).await
}
