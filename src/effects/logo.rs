use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::{
    palette::Palette,
    run::{DAY_SECS, Effect, Outcome, Shutdown, launch},
};
use ft_common::{Canvas, Color, Geometry, Paint};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "logo")]
/// Noisebridge logo bouncing around the display
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::new(25, 20)")]
    /// area to bounce in <W>x<H>[+<X>+<Y>] (default 25x20+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "9", from_str_fn(parse_layer))]
    /// layer 0-15 (default 9)
    layer: i32,

    #[argh(option, short = 't', default = "DAY_SECS", from_str_fn(parse_timeout))]
    /// exit after this many seconds (default 24hrs)
    timeout: f64,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "40", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 40)
    delay: u64,
}

// `#` is the logo, `.` its drop shadow
const LOGO: [&str; 15] = [
    "      ##.       ",
    "     #..#.      ",
    "   ###  ###.    ",
    "  #...  ...#.   ",
    "  #.      .#. #.",
    "##.      ..#.##.",
    "..###.   ####.#.",
    "###..    #..#.#.",
    "..###.   #..#.#.",
    "###..    ####.#.",
    "...## .. ..#.##.",
    "  #...##.  #..#.",
    "  #..#..#..#. . ",
    "   ###. ###.    ",
    "   ...  ...     ",
];
const LOGO_WIDTH: i32 = 16;
const LOGO_HEIGHT: i32 = 15;

/// Canvas size that fits the logo plus a one pixel border.
pub const CANVAS_WIDTH: i32 = LOGO_WIDTH + 2;
pub const CANVAS_HEIGHT: i32 = LOGO_HEIGHT + 2;

pub struct Logo {
    palette: Palette,
    hue: u8,
    area: (i32, i32),
    pos: (i32, i32),
    dir: (i32, i32),
}

impl Logo {
    /// Bounces inside an `area_width` x `area_height` region.
    pub fn new(area_width: i32, area_height: i32) -> Self {
        Self {
            palette: Palette::spectrum(),
            hue: 0,
            area: (area_width, area_height),
            pos: (-1, -1),
            dir: (1, 1),
        }
    }

    /// Walks the border of the area clockwise.
    fn advance(&mut self) {
        let (x, y) = &mut self.pos;
        let (sx, sy) = &mut self.dir;
        let (max_x, max_y) = (self.area.0 - LOGO_WIDTH, self.area.1 - LOGO_HEIGHT);

        *x += *sx;
        if *x > max_x {
            *x -= *sx;
            *sy = 1;
            *y += *sy;
        }
        if *y > max_y {
            *y -= *sy;
            *sx = -1;
            *x += *sx;
        }
        if *x < -1 {
            *x -= *sx;
            *sy = -1;
            *y += *sy;
        }
        if *y < -1 {
            *y -= *sy;
            *sx = 1;
            *x += *sx;
        }
    }
}

impl Effect for Logo {
    fn step(&mut self, canvas: &mut Canvas) {
        canvas.clear();
        let ink = Paint::Opaque(self.palette[self.hue]);
        let shadow = Paint::Opaque(Color::BLACK);

        for (y, row) in LOGO.iter().enumerate() {
            for (x, cell) in row.bytes().enumerate() {
                let paint = match cell {
                    b'#' => ink,
                    b'.' => shadow,
                    _ => continue,
                };
                canvas.paint(x as i32 + 1, y as i32 + 1, paint);
            }
        }

        let base = canvas.offset();
        canvas.set_offset(base.x + self.pos.0, base.y + self.pos.1, base.layer);

        if self.hue % 8 == 0 {
            self.advance();
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
    let canvas = Canvas::new(CANVAS_WIDTH, CANVAS_HEIGHT)?;
    let logo = Logo::new(settings.geometry.width, settings.geometry.height);

    launch(&settings, shutdown, canvas, logo).await
}
