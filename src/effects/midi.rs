use super::{parse_delay, parse_layer, parse_timeout, settings};
use crate::run::{DAY_SECS, Effect, Outcome, Shutdown, launch};
use ft_common::{Canvas, Color, Geometry};
use std::{
    fs::File,
    io::{self, Read},
    path::PathBuf,
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

#[derive(argh::FromArgs)]
#[argh(subcommand, name = "midi")]
/// scroll the notes played on a MIDI stream up the display
pub struct Args {
    #[argh(option, short = 'g', default = "Geometry::default()")]
    /// output geometry <W>x<H>[+<X>+<Y>] (default 45x35+0+0)
    geometry: Geometry,

    #[argh(option, short = 'l', default = "5", from_str_fn(parse_layer))]
    /// layer 0-15 (default 5)
    layer: i32,

    #[argh(option, short = 't', default = "DAY_SECS", from_str_fn(parse_timeout))]
    /// exit after this many seconds (default 24hrs)
    timeout: f64,

    #[argh(option, short = 'h')]
    /// display hostname (default $FT_DISPLAY)
    host: Option<String>,

    #[argh(option, short = 'd', default = "50", from_str_fn(parse_delay))]
    /// delay between frames in milliseconds (default 50)
    delay: u64,

    #[argh(option, short = 'i')]
    /// raw MIDI device or file to read (default stdin)
    input: Option<PathBuf>,
}

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const SYSTEM_RESET: u8 = 0xff;
const MIDDLE_C: i32 = 60;
/// Level stored for a sounding note.
const ON: u8 = 127;

/// Which of the 128 notes are sounding, decoded from raw MIDI bytes.
///
/// Bytes may arrive in any chunking; a message split across two reads is
/// completed by the second one. Running status is honoured.
pub struct Keyboard {
    notes: [u8; 128],
    status: Option<u8>,
    data: [u8; 2],
    len: usize,
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            notes: [0; 128],
            status: None,
            data: [0; 2],
            len: 0,
        }
    }

    pub fn level(&self, note: usize) -> u8 {
        self.notes.get(note).copied().unwrap_or(0)
    }

    pub fn feed(&mut self, byte: u8) {
        match byte {
            SYSTEM_RESET => {
                trace!("system reset");
                self.notes = [0; 128];
                self.status = None;
                self.len = 0;
            }
            // real-time messages may sit in the middle of anything
            0xf8..=0xfe => {}
            0xf0..=0xf7 => self.status = None,
            0x80..=0xef => {
                self.status = Some(byte);
                self.len = 0;
            }
            _ => self.data(byte),
        }
    }

    fn data(&mut self, byte: u8) {
        let Some(status) = self.status else {
            return;
        };
        self.data[self.len] = byte;
        self.len += 1;

        let expected = match status & 0xf0 {
            0xc0 | 0xd0 => 1,
            _ => 2,
        };
        if self.len < expected {
            return;
        }
        self.len = 0;

        let [note, velocity] = self.data;
        let note = usize::from(note & 0x7f);
        match status & 0xf0 {
            NOTE_ON if velocity > 0 => self.notes[note] = ON,
            // note on with zero velocity is the usual way to say note off
            NOTE_ON | NOTE_OFF => self.notes[note] = 0,
            _ => {}
        }
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `input` on its own thread, handing over whatever arrives.
fn spawn_reader(mut input: impl Read + Send + 'static) -> io::Result<Receiver<Vec<u8>>> {
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("midi-input".into())
        .spawn(move || {
            let mut buf = [0; 256];
            loop {
                match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if sender.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                    Err(error) => {
                        warn!(?error, "reading MIDI input failed");
                        break;
                    }
                }
            }
            debug!("MIDI input closed");
        })?;

    Ok(receiver)
}

/// A piano roll: the bottom row shows the sounding notes around middle C and
/// everything above it scrolls up one row per frame.
pub struct Midi {
    input: Receiver<Vec<u8>>,
    keyboard: Keyboard,
    closed: bool,
}

impl Midi {
    pub fn new(input: Receiver<Vec<u8>>) -> Self {
        Self {
            input,
            keyboard: Keyboard::new(),
            closed: false,
        }
    }

    /// Takes in everything that arrived since the last frame, never waiting.
    fn drain(&mut self) {
        loop {
            match self.input.try_recv() {
                Ok(bytes) => bytes.into_iter().for_each(|byte| self.keyboard.feed(byte)),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        info!("end of MIDI input, holding the last notes");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
    }
}

fn scroll_up(canvas: &mut Canvas) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    for y in 1..height {
        for x in 0..width {
            canvas.set_pixel(x, y - 1, canvas.pixel(x, y));
        }
    }
}

impl Effect for Midi {
    fn step(&mut self, canvas: &mut Canvas) {
        self.drain();
        scroll_up(canvas);

        let (width, bottom) = (canvas.width() as i32, canvas.height() as i32 - 1);
        let lowest = MIDDLE_C - width / 2;
        for x in 0..width {
            let level = usize::try_from(lowest + x)
                .map(|note| self.keyboard.level(note))
                .unwrap_or(0);
            canvas.set_pixel(x, bottom, Color::new(0, level.saturating_mul(2), 0));
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

    let input = match &args.input {
        Some(path) => {
            info!(input = %path.display(), "reading MIDI");
            spawn_reader(File::open(path)?)?
        }
        None => {
            info!("reading MIDI from stdin");
            spawn_reader(io::stdin())?
        }
    };

    launch(&settings, shutdown, canvas, Midi::new(input)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyboard(bytes: &[u8]) -> Keyboard {
        let mut keyboard = Keyboard::new();
        bytes.iter().for_each(|&byte| keyboard.feed(byte));
        keyboard
    }

    #[test]
    fn note_on_and_off() {
        let mut keys = keyboard(&[0x90, 60, 100, 0x93, 64, 1]);
        assert_eq!(keys.level(60), ON);
        assert_eq!(keys.level(64), ON);

        [0x80, 60, 0].iter().for_each(|&byte| keys.feed(byte));
        assert_eq!(keys.level(60), 0);
        assert_eq!(keys.level(64), ON);
    }

    #[test]
    fn zero_velocity_releases() {
        assert_eq!(keyboard(&[0x90, 60, 100, 0x90, 60, 0]).level(60), 0);
    }

    #[test]
    fn running_status() {
        let keys = keyboard(&[0x90, 60, 100, 62, 100, 64, 100]);
        assert_eq!([keys.level(60), keys.level(62), keys.level(64)], [ON; 3]);
    }

    #[test]
    fn reset_releases_everything() {
        let keys = keyboard(&[0x90, 60, 100, 61, 100, SYSTEM_RESET, 62, 100]);
        assert!((0..128).all(|note| keys.level(note) == 0));
    }

    #[test]
    fn other_messages_are_skipped() {
        // program change carries one data byte, controller change two
        let keys = keyboard(&[0xc0, 5, 0xb0, 7, 100, 0x90, 48, 90, 0xf8, 50, 90]);
        assert_eq!(keys.level(5), 0);
        assert_eq!(keys.level(7), 0);
        assert_eq!(keys.level(48), ON);
        // the clock tick in between does not break running status
        assert_eq!(keys.level(50), ON);
    }

    #[test]
    fn stray_data_bytes_are_ignored() {
        let keys = keyboard(&[60, 100, 0xf0, 61, 100]);
        assert!((0..128).all(|note| keys.level(note) == 0));
    }

    #[test]
    fn message_split_across_frames() {
        let (sender, receiver) = mpsc::channel();
        let mut midi = Midi::new(receiver);
        let mut canvas = Canvas::new(45, 3).unwrap();

        sender.send(vec![0x90, 60]).unwrap();
        midi.step(&mut canvas);
        assert_eq!(canvas.pixel(22, 2), Color::BLACK);

        sender.send(vec![127]).unwrap();
        midi.step(&mut canvas);
        // middle C sits in the middle column
        assert_eq!(canvas.pixel(22, 2), Color::new(0, 254, 0));
        assert_eq!(canvas.pixel(21, 2), Color::BLACK);
    }

    #[test]
    fn notes_scroll_up_and_hold_without_input() {
        let (sender, receiver) = mpsc::channel();
        let mut midi = Midi::new(receiver);
        let mut canvas = Canvas::new(5, 4).unwrap();
        sender.send(vec![0x90, 59, 100]).unwrap();
        drop(sender);

        for _ in 0..3 {
            midi.step(&mut canvas);
        }
        assert!(midi.closed);
        // note 59 is column 1 of a 5 wide roll starting at 58
        for y in 1..4 {
            assert_eq!(canvas.pixel(1, y), Color::new(0, 254, 0), "row {y}");
        }
        assert_eq!(canvas.pixel(1, 0), Color::BLACK);
        assert_eq!(canvas.pixel(2, 3), Color::BLACK);
    }

    #[test]
    fn wide_roll_clips_to_the_keyboard() {
        let (_sender, receiver) = mpsc::channel();
        let mut midi = Midi::new(receiver);
        midi.keyboard = keyboard(&[0x90, 0, 100, 127, 100]);
        let mut canvas = Canvas::new(200, 1).unwrap();

        midi.step(&mut canvas);
        // the roll starts at note -40
        assert_eq!(canvas.pixel(40, 0), Color::new(0, 254, 0));
        assert_eq!(canvas.pixel(167, 0), Color::new(0, 254, 0));
        assert_eq!(canvas.pixel(39, 0), Color::BLACK);
        assert_eq!(canvas.pixel(168, 0), Color::BLACK);
    }

    #[test]
    fn reader_forwards_bytes_until_end() {
        let receiver = spawn_reader(io::Cursor::new(vec![0x90, 60, 100])).unwrap();
        let bytes: Vec<u8> = receiver.iter().flatten().collect();
        assert_eq!(bytes, [0x90, 60, 100]);
    }
}
