#[macro_use]
extern crate tracing;

use ft_common::{Color, Geometry, reel::Still};
use image::imageops::FilterType;
use itertools::Itertools;
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(argh::FromArgs)]
/// process a directory of images into a reel for `ft-demos play`
struct Args {
    #[argh(positional)]
    /// path to the directory with image files
    path: PathBuf,

    #[argh(option)]
    /// path to output file
    output: PathBuf,

    #[argh(option)]
    /// resize every image to <W>x<H>
    size: Option<Geometry>,
}

/// Files in `dir`, sorted by name.
fn list_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map_ok(|entry| entry.path())
        .try_collect()?;

    Ok(entries
        .into_iter()
        .filter(|path| path.is_file())
        .sorted()
        .collect())
}

fn read_still(path: &Path, size: Option<Geometry>) -> anyhow::Result<Still> {
    let mut image = image::open(path)?;
    if let Some(size) = size {
        image = image.resize_exact(size.width as u32, size.height as u32, FilterType::Triangle);
    }

    let image = image.to_rgb8();
    let pixels = image.pixels().map(|pixel| Color::from(pixel.0)).collect();

    Ok(Still {
        width: image.width(),
        height: image.height(),
        pixels,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args: Args = argh::from_env();

    let files = list_images(&args.path)?;
    info!(count = files.len(), "reading images..");

    let stills: Vec<Still> = files
        .iter()
        .map(|path| {
            debug!(path = %path.display(), "reading");
            read_still(path, args.size)
        })
        .try_collect()?;
    if stills.is_empty() {
        anyhow::bail!("no images found in {}", args.path.display());
    }

    let bytes = ft_common::reel::archive(&stills)?;

    let file = File::create(&args.output)?;
    let mut file = BufWriter::new(file);
    file.write_all(&bytes)?;
    file.flush()?;

    info!(
        stills = stills.len(),
        bytes = bytes.len(),
        output = %args.output.display(),
        "wrote reel"
    );

    Ok(())
}
