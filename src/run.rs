use ft_common::{Canvas, Geometry, Transport};
use std::{
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant, SystemTime},
};

pub const DAY_SECS: f64 = 60.0 * 60.0 * 24.0;
/// Longest uninterrupted sleep in [`wait_until`].
const WAIT_SLICE: Duration = Duration::from_millis(100);

/// Per-frame pixel computation of one demo.
pub trait Effect {
    /// Advances the animation by one tick and draws it into `canvas`.
    ///
    /// The canvas offset is reset to the configured geometry before every
    /// call, effects may move it from there.
    fn step(&mut self, canvas: &mut Canvas);
}

/// Display settings shared by every demo.
#[derive(Clone, Debug)]
pub struct Settings {
    pub host: Option<String>,
    pub geometry: Geometry,
    pub layer: i32,
    pub timeout: Option<Duration>,
    pub delay: Duration,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Finished,
    Interrupted,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Finished => ExitCode::SUCCESS,
            Self::Interrupted => ExitCode::FAILURE,
        }
    }
}

/// Cooperative cancellation flag, set from SIGINT/SIGTERM.
#[derive(Clone, Debug, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    /// Installs the process-wide signal handler. Call once.
    pub fn install() -> anyhow::Result<Self> {
        let shutdown = Self::default();
        let flag = shutdown.clone();
        ctrlc::set_handler(move || {
            flag.trigger();
        })?;
        Ok(shutdown)
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sleeps until `deadline` in short slices.
///
/// `Finished` once the deadline has passed, `Interrupted` as soon as shutdown
/// is triggered.
pub async fn wait_until(deadline: SystemTime, shutdown: &Shutdown) -> Outcome {
    loop {
        if shutdown.is_triggered() {
            return Outcome::Interrupted;
        }
        match deadline.duration_since(SystemTime::now()) {
            Ok(left) if !left.is_zero() => monoio::time::sleep(left.min(WAIT_SLICE)).await,
            _ => return Outcome::Finished,
        }
    }
}

/// Opens the display and animates `effect` on `canvas` until timeout or
/// shutdown.
pub async fn launch<E: Effect>(
    settings: &Settings,
    shutdown: &Shutdown,
    mut canvas: Canvas,
    mut effect: E,
) -> anyhow::Result<Outcome> {
    let mut transport = Transport::open(settings.host.as_deref()).await?;
    info!(
        display = %transport.peer_addr(),
        geometry = %settings.geometry,
        layer = settings.layer,
        "connected"
    );

    animate(&mut transport, &mut canvas, &mut effect, settings, shutdown).await
}

/// Step, send, sleep. Sends one cleared frame on the way out, also when a
/// frame was refused.
pub async fn animate<E: Effect>(
    transport: &mut Transport,
    canvas: &mut Canvas,
    effect: &mut E,
    settings: &Settings,
    shutdown: &Shutdown,
) -> anyhow::Result<Outcome> {
    let started = Instant::now();
    let mut frames: u64 = 0;

    let result = loop {
        if shutdown.is_triggered() {
            break Ok(Outcome::Interrupted);
        }
        if settings
            .timeout
            .is_some_and(|timeout| started.elapsed() > timeout)
        {
            break Ok(Outcome::Finished);
        }

        canvas.set_offset(settings.geometry.x, settings.geometry.y, settings.layer);
        effect.step(canvas);
        if let Err(error) = transport.send(canvas).await {
            error!(%error, "frame refused");
            break Err(error);
        }
        frames += 1;

        monoio::time::sleep(settings.delay).await;
    };

    info!(frames, ?result, "stopping, clearing display");

    // the effect may have left an unsendable offset behind
    canvas.set_offset(settings.geometry.x, settings.geometry.y, settings.layer);
    canvas.clear();
    if let Err(error) = transport.send(canvas).await {
        warn!(?error, "failed to send clear frame");
    }

    Ok(result?)
}
