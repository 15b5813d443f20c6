#[macro_use]
extern crate tracing;

use self::{
    effects::{black, dots, fractal, life, lines, logo, maze, midi, play, plasma, words},
    run::Shutdown,
};
use std::process::ExitCode;

mod effects;
mod font;
mod palette;
mod run;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(argh::FromArgs)]
/// Flaschen Taschen demos
struct Args {
    #[argh(subcommand)]
    demo: Demo,
}

#[derive(argh::FromArgs)]
#[argh(subcommand)]
enum Demo {
    Black(black::Args),
    Dots(dots::Args),
    Plasma(plasma::Args),
    Life(life::Args),
    Lines(lines::Args),
    Logo(logo::Args),
    Fractal(fractal::Args),
    Maze(maze::Args),
    Words(words::Args),
    Midi(midi::Args),
    Play(play::Args),
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();
    let shutdown = Shutdown::install()?;

    let mut runtime = monoio::RuntimeBuilder::<monoio::FusionDriver>::new()
        .enable_timer()
        .build()?;

    let outcome = runtime.block_on(async move {
        match args.demo {
            Demo::Black(args) => black::run(args).await,
            Demo::Dots(args) => dots::run(args, &shutdown).await,
            Demo::Plasma(args) => plasma::run(args, &shutdown).await,
            Demo::Life(args) => life::run(args, &shutdown).await,
            Demo::Lines(args) => lines::run(args, &shutdown).await,
            Demo::Logo(args) => logo::run(args, &shutdown).await,
            Demo::Fractal(args) => fractal::run(args, &shutdown).await,
            Demo::Maze(args) => maze::run(args, &shutdown).await,
            Demo::Words(args) => words::run(args, &shutdown).await,
            Demo::Midi(args) => midi::run(args, &shutdown).await,
            Demo::Play(args) => play::run(args, &shutdown).await,
        }
    })?;

    if outcome == run::Outcome::Interrupted {
        info!("interrupted");
    }

    Ok(outcome.exit_code())
}
