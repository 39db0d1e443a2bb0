//! Full-screen mode: wandering streams paint glitch strings in random colors.

use crate::{app::Worker, error::GlitchError, helpers::random_line_up_to};

use rand::Rng;
use ratatui::crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyModifiers},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use std::{
    io::{self, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError},
    },
    time::Duration,
};

const SPAWN_CHANCE: f64 = 0.20;
const TURN_CHANCE: f64 = 0.1;
const MAX_STREAMS: usize = 20;
const STREAM_GLYPHS: usize = 16;
const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const KEY_POLL: Duration = Duration::from_millis(100);
const PAUSED_BANNER: &str = "*PAUSED* (press [SPACE] to resume, [q] to quit)";

#[derive(Clone, Copy, Debug)]
enum Weight {
    Primary(Color, u8),
    Accent(Color, u8),
}

impl Weight {
    fn color(self) -> Color {
        match self {
            Weight::Primary(c, _) | Weight::Accent(c, _) => c,
        }
    }

    fn weight(self) -> u8 {
        match self {
            Weight::Primary(_, w) | Weight::Accent(_, w) => w,
        }
    }
}

const PALETTE: [Weight; 8] = [
    Weight::Accent(Color::AnsiValue(0), 10),
    Weight::Accent(Color::AnsiValue(18), 10),
    Weight::Accent(Color::AnsiValue(29), 10),
    Weight::Accent(Color::AnsiValue(39), 10),
    Weight::Accent(Color::AnsiValue(128), 10),
    Weight::Accent(Color::AnsiValue(199), 10),
    Weight::Accent(Color::AnsiValue(206), 10),
    Weight::Primary(Color::AnsiValue(255), 30),
];

fn random_color<R: Rng>(rng: &mut R) -> Color {
    let total: u8 = PALETTE.iter().map(|w| w.weight()).sum();
    let mut choice = rng.random_range(0..total);

    for entry in PALETTE {
        if choice < entry.weight() {
            return entry.color();
        }
        choice -= entry.weight();
    }

    Color::White
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Heading {
    Left,
    Right,
    Up,
    Down,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Heading {
    const ALL: [Heading; 8] = [
        Heading::Left,
        Heading::Right,
        Heading::Up,
        Heading::Down,
        Heading::UpLeft,
        Heading::UpRight,
        Heading::DownLeft,
        Heading::DownRight,
    ];

    fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    fn offset(self) -> (i32, i32) {
        match self {
            Heading::Left => (-1, 0),
            Heading::Right => (1, 0),
            Heading::Up => (0, -1),
            Heading::Down => (0, 1),
            Heading::UpLeft => (-1, -1),
            Heading::UpRight => (1, -1),
            Heading::DownLeft => (-1, 1),
            Heading::DownRight => (1, 1),
        }
    }
}

#[derive(Debug)]
struct Stream {
    x: u16,
    y: u16,
    heading: Heading,
}

impl Stream {
    fn spawn<R: Rng>(rng: &mut R, width: u16, height: u16) -> Self {
        Self {
            x: rng.random_range(0..width.max(1)),
            y: rng.random_range(0..height.max(1)),
            heading: Heading::random(rng),
        }
    }

    /// Moves one cell, or turns and clamps when the move would leave the
    /// screen horizontally or through the top. The bottom is open so output
    /// scrolls.
    fn advance<R: Rng>(&mut self, rng: &mut R, width: u16) {
        let (dx, dy) = self.heading.offset();
        let next_x = self.x as i32 + dx;
        let next_y = self.y as i32 + dy;
        let right = width as i32 - 2;

        if next_x <= 0 || next_x >= right || next_y <= 0 || rng.random_bool(TURN_CHANCE) {
            self.heading = Heading::random(rng);
            if next_x <= 0 {
                self.x = 1;
            }
            if next_x >= right {
                self.x = width.saturating_sub(2).max(1);
            }
            if next_y <= 0 {
                self.y = 1;
            }
        } else {
            self.x = next_x as u16;
            self.y = next_y as u16;
        }
    }
}

struct Storm<R> {
    rng: R,
    streams: Vec<Stream>,
}

impl<R: Rng> Storm<R> {
    fn new(rng: R) -> Self {
        Self {
            rng,
            streams: Vec::new(),
        }
    }

    fn step(&mut self, width: u16, height: u16) {
        if self.rng.random_bool(SPAWN_CHANCE) {
            self.streams.push(Stream::spawn(&mut self.rng, width, height));
        }

        for stream in &mut self.streams {
            stream.advance(&mut self.rng, width);
        }

        if self.streams.len() > MAX_STREAMS {
            self.streams.remove(0);
        }
    }

    fn draw<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        for stream in &self.streams {
            queue!(
                out,
                MoveTo(stream.x, stream.y),
                SetForegroundColor(random_color(&mut self.rng)),
                Print(random_line_up_to(&mut self.rng, STREAM_GLYPHS))
            )?;
        }

        out.flush()
    }

    /// Advances and paints one frame unless `paused`. Returns whether a frame
    /// was painted.
    fn tick<W: Write>(
        &mut self,
        paused: &AtomicBool,
        width: u16,
        height: u16,
        out: &mut W,
    ) -> io::Result<bool> {
        if paused.load(Ordering::SeqCst) {
            return Ok(false);
        }

        self.step(width, height);
        self.draw(out)?;

        Ok(true)
    }

    fn run(&mut self, paused: &AtomicBool, stop: &Receiver<()>) {
        let mut stdout = io::stdout();

        loop {
            match terminal::size() {
                Ok((width, height)) => {
                    if let Err(err) = self.tick(paused, width, height, &mut stdout) {
                        tracing::debug!(error = %err, "frame write failed");
                    }
                }
                Err(err) => tracing::debug!(error = %err, "terminal size unavailable"),
            }

            match stop.recv_timeout(FRAME_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

/// Runs until `q`, or until `signals` delivers a termination request.
pub fn run<R>(rng: R, signals: &Receiver<()>) -> Result<(), GlitchError>
where
    R: Rng + Send + 'static,
{
    let paused = Arc::new(AtomicBool::new(false));

    enable_raw_mode()?;
    if let Err(err) = execute!(io::stdout(), Hide) {
        let _ = disable_raw_mode();
        return Err(err.into());
    }

    let painter_paused = paused.clone();
    let painter = match Worker::spawn("storm-painter", move |stop| {
        Storm::new(rng).run(&painter_paused, &stop);
    }) {
        Ok(painter) => painter,
        Err(err) => {
            let _ = restore_terminal(true);
            return Err(err.into());
        }
    };

    let result = wait_for_quit(&paused, signals);

    let finished = painter.stop_within(FRAME_INTERVAL * 2);
    if !finished {
        tracing::warn!("storm painter still blocked on stdout, leaving the screen as is");
    }

    // The painter may still hold the stdout lock, so only touch the screen
    // once it is gone.
    restore_terminal(finished)?;

    result
}

/// Leaves raw mode first, then shows the cursor and clears the screen when
/// `redraw` is set. Reports the first error after trying every step.
fn restore_terminal(redraw: bool) -> io::Result<()> {
    let raw = disable_raw_mode();
    if !redraw {
        return raw;
    }

    let screen = execute!(
        io::stdout(),
        Show,
        ResetColor,
        Clear(ClearType::All),
        MoveTo(0, 0)
    );

    raw.and(screen)
}

/// Flips the pause flag. Pausing leaves the banner at the top left.
fn toggle_pause<W: Write>(paused: &AtomicBool, out: &mut W) -> io::Result<()> {
    let was_paused = paused.fetch_xor(true, Ordering::SeqCst);
    if !was_paused {
        execute!(out, MoveTo(0, 0), Print(PAUSED_BANNER))?;
    }

    Ok(())
}

fn wait_for_quit(paused: &AtomicBool, signals: &Receiver<()>) -> Result<(), GlitchError> {
    loop {
        if signals.try_recv().is_ok() {
            tracing::debug!("termination requested");
            return Ok(());
        }

        if !event::poll(KEY_POLL)? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                // raw mode swallows SIGINT
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(());
                }
                KeyCode::Char(' ') => toggle_pause(paused, &mut io::stdout())?,
                _ => {}
            }
        }
    }
}
