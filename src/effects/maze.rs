use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::{
    palette::Palette,
    run::{DAY_SECS, Effect, Outcome, Shutdown, launch},
};
use ft_common::{Canvas, Color, Geometry, Paint};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "maze")]
/// carve a maze by depth-first search, one step per frame
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

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "20", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 20)
    delay: u64,

    #[argh(option, short = 'c', default = "Paint::Opaque(Color::WHITE)")]
    /// color of the path being carved as RRGGBB, 0 for transparent (default FFFFFF)
    color: Paint,

    #[argh(option, short = 'v')]
    /// color of finished paths as RRGGBB, 0 for transparent (default cycles)
    visited: Option<Paint>,

    #[argh(option, short = 'b', default = "Paint::Transparent")]
    /// background color as RRGGBB, 0 for transparent (default transparent)
    background: Paint,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Cell {
    Wall,
    Carving,
    Visited,
}

/// A maze of cells two pixels apart, with the walls in between.
///
/// Cell `(x, y)` sits on pixel `(2x, 2y)`; the pixel between two cells is
/// the passage joining them.
pub struct Maze<R> {
    width: usize,
    height: usize,
    pixels: Vec<Cell>,
    // cells per row and column
    cells: (usize, usize),
    stack: Vec<(usize, usize)>,
    rng: R,
    palette: Palette,
    hue: u8,
    carving: Paint,
    visited: Option<Paint>,
    background: Paint,
}

impl<R: Rng> Maze<R> {
    pub fn new(width: usize, height: usize, mut rng: R) -> Self {
        let cells = (width.div_ceil(2), height.div_ceil(2));
        let start = (rng.gen_range(0..cells.0), rng.gen_range(0..cells.1));

        Self {
            width,
            height,
            pixels: vec![Cell::Wall; width * height],
            cells,
            stack: vec![start],
            rng,
            palette: Palette::spectrum(),
            hue: 0,
            carving: Paint::Opaque(Color::WHITE),
            visited: None,
            background: Paint::Transparent,
        }
    }

    /// `visited` of `None` cycles through the spectrum.
    pub fn with_colors(mut self, carving: Paint, visited: Option<Paint>, background: Paint) -> Self {
        self.carving = carving;
        self.visited = visited;
        self.background = background;
        self
    }

    pub fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    fn pixel_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        &mut self.pixels[y * self.width + x]
    }

    fn cell(&self, (x, y): (usize, usize)) -> Cell {
        self.pixels[2 * y * self.width + 2 * x]
    }

    fn open_neighbours(&self, (x, y): (usize, usize)) -> Vec<(usize, usize)> {
        let (columns, rows) = self.cells;
        let mut open = Vec::with_capacity(4);
        if y > 0 {
            open.push((x, y - 1));
        }
        if y + 1 < rows {
            open.push((x, y + 1));
        }
        if x > 0 {
            open.push((x - 1, y));
        }
        if x + 1 < columns {
            open.push((x + 1, y));
        }
        open.retain(|&cell| self.cell(cell) == Cell::Wall);
        open
    }

    /// Either carves into a random unvisited neighbour or backtracks one cell.
    fn carve(&mut self) {
        let Some(&here) = self.stack.last() else {
            return;
        };
        *self.pixel_mut(2 * here.0, 2 * here.1) = Cell::Carving;

        let open = self.open_neighbours(here);
        if open.is_empty() {
            *self.pixel_mut(2 * here.0, 2 * here.1) = Cell::Visited;
            self.stack.pop();
            if let Some(&back) = self.stack.last() {
                *self.pixel_mut(here.0 + back.0, here.1 + back.1) = Cell::Visited;
            }
            if self.stack.is_empty() {
                debug!("maze complete");
            }
        } else {
            let next = open[self.rng.gen_range(0..open.len())];
            *self.pixel_mut(here.0 + next.0, here.1 + next.1) = Cell::Carving;
            self.stack.push(next);
        }
    }
}

impl<R: Rng> Effect for Maze<R> {
    fn step(&mut self, canvas: &mut Canvas) {
        self.carve();

        let visited = self
            .visited
            .unwrap_or(Paint::Opaque(self.palette[self.hue]));
        for y in 0..self.height {
            for x in 0..self.width {
                let paint = match self.pixels[y * self.width + x] {
                    Cell::Wall => self.background,
                    Cell::Carving => self.carving,
                    Cell::Visited => visited,
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
    let maze = Maze::new(canvas.width(), canvas.height(), StdRng::from_entropy()).with_colors(
        args.color,
        args.visited,
        args.background,
    );

    launch(&settings, shutdown, canvas, maze).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finish(maze: &mut Maze<StdRng>, canvas: &mut Canvas) -> usize {
        let mut steps = 0;
        while !maze.is_done() {
            maze.step(canvas);
            steps += 1;
            assert!(steps < 10_000, "maze never finished");
        }
        steps
    }

    #[test]
    fn every_cell_is_reached() {
        for seed in 0..5 {
            let mut maze = Maze::new(9, 7, StdRng::seed_from_u64(seed));
            let mut canvas = Canvas::new(9, 7).unwrap();
            let steps = finish(&mut maze, &mut canvas);

            // one step into each of the 5x4 cells but the start, one back out of each
            assert_eq!(steps, 2 * 5 * 4 - 1);
            for y in 0..4 {
                for x in 0..5 {
                    assert_eq!(maze.cell((x, y)), Cell::Visited, "cell {x},{y}");
                }
            }
        }
    }

    #[test]
    fn carved_maze_is_a_spanning_tree() {
        let mut maze = Maze::new(11, 11, StdRng::seed_from_u64(42));
        let mut canvas = Canvas::new(11, 11).unwrap();
        finish(&mut maze, &mut canvas);

        let open = maze.pixels.iter().filter(|&&c| c != Cell::Wall).count();
        // 36 cells joined by 35 passages
        assert_eq!(open, 36 + 35);
        // odd rows and columns never hold a cell, so a pixel on both is always a wall
        assert_eq!(maze.pixels[11 + 1], Cell::Wall);
    }

    #[test]
    fn odd_width_keeps_the_last_column() {
        let maze = Maze::new(45, 35, StdRng::seed_from_u64(1));
        assert_eq!(maze.cells, (23, 18));
        let maze = Maze::new(44, 34, StdRng::seed_from_u64(1));
        assert_eq!(maze.cells, (22, 17));
    }

    #[test]
    fn paints_carving_visited_and_background() {
        let mut maze = Maze::new(5, 5, StdRng::seed_from_u64(3)).with_colors(
            Paint::Opaque(Color::RED),
            Some(Paint::Opaque(Color::BLUE)),
            Paint::Opaque(Color::BLACK),
        );
        let mut canvas = Canvas::new(5, 5).unwrap();

        maze.step(&mut canvas);
        let reds = canvas.pixels().iter().filter(|&&c| c == Color::RED).count();
        // the start cell and the passage into its first neighbour
        assert_eq!(reds, 2);
        // background black goes out as the opaque sentinel
        assert_eq!(canvas.pixel(1, 1), Color::BACKGROUND);

        finish(&mut maze, &mut canvas);
        maze.step(&mut canvas);
        assert!(!canvas.pixels().contains(&Color::RED));
        assert!(canvas.pixels().contains(&Color::BLUE));
    }

    #[test]
    fn keeps_showing_the_finished_maze() {
        let mut maze = Maze::new(3, 3, StdRng::seed_from_u64(9));
        let mut canvas = Canvas::new(3, 3).unwrap();
        finish(&mut maze, &mut canvas);

        let done = maze.pixels.clone();
        maze.step(&mut canvas);
        assert_eq!(maze.pixels, done);
    }
}
