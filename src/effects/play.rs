use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::run::{DAY_SECS, Effect, Outcome, Shutdown, launch, wait_until};
use anyhow::bail;
use ft_common::{Canvas, Geometry, reel::ArchivedStill};
use rkyv::vec::ArchivedVec;
use std::{
    fs::File,
    path::PathBuf,
    time::{Duration, SystemTime},
};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "play")]
/// play a reel written by ft-process
pub struct Args {
    #[argh(positional)]
    /// reel file
    reel: PathBuf,

    #[argh(option, short = 'g')]
    /// output geometry <W>x<H>[+<X>+<Y>] (default: size of the first still)
    geometry: Option<Geometry>,

    #[argh(option, short = 'l', default = "5", from_str_fn(parse_layer))]
    /// layer 0-15 (default 5)
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

    #[argh(option)]
    /// start at the provided unix timestamp
    start_at: Option<u64>,

    #[argh(switch)]
    /// skip the validation of the reel
    ///
    /// speeds up loading large reels, but a corrupt file is undefined behaviour
    skip_checks: bool,
}

/// Loops over the stills of a reel, one per frame.
pub struct Playback<'a> {
    stills: &'a [ArchivedStill],
    next: usize,
}

impl<'a> Playback<'a> {
    pub fn new(stills: &'a [ArchivedStill]) -> Self {
        Self { stills, next: 0 }
    }
}

impl Effect for Playback<'_> {
    fn step(&mut self, canvas: &mut Canvas) {
        let Some(still) = self.stills.get(self.next) else {
            return;
        };
        canvas.clear();
        still.paint(canvas);

        self.next = (self.next + 1) % self.stills.len();
        if self.next == 0 {
            debug!("reel finished, looping");
        }
    }
}

/// Canvas geometry for a reel when none is given on the command line.
fn reel_geometry(first: &ArchivedStill) -> Geometry {
    Geometry::new(first.width() as i32, first.height() as i32)
}

/// Holds playback until the unix `timestamp`.
async fn wait_for_start(timestamp: u64, shutdown: &Shutdown) -> Outcome {
    let start = SystemTime::UNIX_EPOCH + Duration::from_secs(timestamp);
    if start <= SystemTime::now() {
        warn!(timestamp, "start time already passed, starting now");
        return Outcome::Finished;
    }

    info!("waiting until {timestamp}..");
    wait_until(start, shutdown).await
}

pub async fn run(args: Args, shutdown: &Shutdown) -> anyhow::Result<Outcome> {
    info!(reel = %args.reel.display(), "loading reel..");
    let file = File::open(&args.reel)?;
    let data = unsafe { memmap2::Mmap::map(&file)? };

    let stills: &ArchivedVec<ArchivedStill> = if args.skip_checks {
        unsafe { rkyv::access_unchecked(&data) }
    } else {
        rkyv::access::<_, rkyv::rancor::Error>(&data)?
    };
    let Some(first) = stills.first() else {
        bail!("reel {} contains no stills", args.reel.display());
    };
    info!(stills = stills.len(), "loaded reel successfully");

    let geometry = args.geometry.unwrap_or_else(|| reel_geometry(first));
    let settings = settings(
        args.host,
        geometry,
        args.layer,
        Some(args.timeout),
        args.delay,
    )
    .map_err(anyhow::Error::msg)?;
    let canvas = settings.geometry.canvas()?;

    if let Some(timestamp) = args.start_at {
        if wait_for_start(timestamp, shutdown).await == Outcome::Interrupted {
            return Ok(Outcome::Interrupted);
        }
    }

    launch(&settings, shutdown, canvas, Playback::new(stills)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use ft_common::{
        Color,
        reel::{Still, archive},
    };

    fn still(width: u32, height: u32, color: Color) -> Still {
        Still {
            width,
            height,
            pixels: vec![color; (width * height) as usize],
        }
    }

    #[test]
    fn loops_over_stills() {
        let bytes = archive(&vec![still(2, 2, Color::RED), still(2, 2, Color::BLUE)]).unwrap();
        let stills =
            rkyv::access::<ArchivedVec<ArchivedStill>, rkyv::rancor::Error>(&bytes).unwrap();
        let mut playback = Playback::new(stills);
        let mut canvas = Canvas::new(2, 2).unwrap();

        let mut seen = Vec::new();
        for _ in 0..5 {
            playback.step(&mut canvas);
            seen.push(canvas.pixel(1, 1));
        }
        assert_eq!(
            seen,
            [Color::RED, Color::BLUE, Color::RED, Color::BLUE, Color::RED]
        );
    }

    #[test]
    fn smaller_still_leaves_rest_transparent() {
        let bytes = archive(&vec![still(4, 4, Color::RED), still(1, 1, Color::GREEN)]).unwrap();
        let stills =
            rkyv::access::<ArchivedVec<ArchivedStill>, rkyv::rancor::Error>(&bytes).unwrap();
        let mut playback = Playback::new(stills);
        let mut canvas = Canvas::new(4, 4).unwrap();

        playback.step(&mut canvas);
        playback.step(&mut canvas);
        assert_eq!(canvas.pixel(0, 0), Color::GREEN);
        assert_eq!(canvas.pixel(3, 3), Color::BLACK);
    }

    #[test]
    fn geometry_defaults_to_first_still() {
        let bytes = archive(&vec![still(7, 3, Color::WHITE)]).unwrap();
        let stills =
            rkyv::access::<ArchivedVec<ArchivedStill>, rkyv::rancor::Error>(&bytes).unwrap();
        let geometry = reel_geometry(&stills[0]);
        assert_eq!((geometry.width, geometry.height), (7, 3));
    }

    #[test]
    fn start_wait_gives_way_to_shutdown() {
        let shutdown = Shutdown::default();
        shutdown.trigger();
        let far_future = u64::from(u32::MAX);

        let started = std::time::Instant::now();
        let outcome = monoio::RuntimeBuilder::<monoio::LegacyDriver>::new()
            .enable_timer()
            .build()
            .unwrap()
            .block_on(wait_for_start(far_future, &shutdown));
        assert_eq!(outcome, Outcome::Interrupted);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn interrupted_wait_never_opens_display() {
        let reel = std::env::temp_dir().join(format!("ft-play-{}.reel", std::process::id()));
        std::fs::write(&reel, archive(&vec![still(2, 2, Color::RED)]).unwrap()).unwrap();
        let args = Args {
            reel: reel.clone(),
            geometry: None,
            layer: 5,
            timeout: DAY_SECS,
            // opening this would fail
            host: Some("display.invalid:0".into()),
            delay: 40,
            start_at: Some(u64::from(u32::MAX)),
            skip_checks: false,
        };
        let shutdown = Shutdown::default();
        shutdown.trigger();

        let outcome = monoio::RuntimeBuilder::<monoio::LegacyDriver>::new()
            .enable_timer()
            .build()
            .unwrap()
            .block_on(run(args, &shutdown));
        std::fs::remove_file(&reel).unwrap();
        assert_eq!(outcome.unwrap(), Outcome::Interrupted);
    }

    #[test]
    fn empty_reel_is_harmless_to_step() {
        let mut playback = Playback::new(&[]);
        let mut canvas = Canvas::new(1, 1).unwrap();
        playback.step(&mut canvas);
        assert_eq!(canvas.pixel(0, 0), Color::BLACK);
    }
}
