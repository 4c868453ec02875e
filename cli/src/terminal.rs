//! The terminal adapters, the screen is drawn with half block characters so that two rows of
//! pixels fit into one line of text.
use std::{
    collections::HashMap,
    io::{self, Stdout, Write},
    time::{Duration, Instant},
};

use chip::{
    definitions::{display, keyboard},
    devices::{AudioOutput, DisplayCommands, KeyboardCommands},
    AudioError,
};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    queue,
    style::Print,
    terminal,
};

/// The keys on the left side of a qwerty keyboard, in the same arrangement
/// as the [`keyboard::LAYOUT`].
const QWERTY_ROWS: [[char; 4]; 4] = [
    ['1', '2', '3', '4'],
    ['q', 'w', 'e', 'r'],
    ['a', 's', 'd', 'f'],
    ['z', 'x', 'c', 'v'],
];

/// Terminals only report presses, so a key counts as held for this long.
const HOLD: Duration = Duration::from_millis(120);

/// Will map the qwerty keys onto the hex keys.
pub fn key_map() -> HashMap<char, usize> {
    QWERTY_ROWS
        .iter()
        .flatten()
        .copied()
        .zip(keyboard::LAYOUT.iter().flatten().copied())
        .collect()
}

/// Will render the framebuffer into lines of half blocks.
pub fn render(pixels: &[bool]) -> Vec<String> {
    pixels
        .chunks(display::WIDTH * 2)
        .map(|rows| {
            let (top, bottom) = rows.split_at(display::WIDTH.min(rows.len()));
            top.iter()
                .enumerate()
                .map(|(x, &upper)| {
                    let lower = bottom.get(x).copied().unwrap_or(false);
                    match (upper, lower) {
                        (true, true) => '█',
                        (true, false) => '▀',
                        (false, true) => '▄',
                        (false, false) => ' ',
                    }
                })
                .collect()
        })
        .collect()
}

/// Puts the terminal into raw mode on an alternate screen as long as it lives.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // nothing sensible can be done if the terminal can't be restored
        let _ = crossterm::execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

pub struct TerminalDisplay {
    out: Stdout,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }

    fn draw(&mut self, pixels: &[bool]) -> io::Result<()> {
        for (y, line) in render(pixels).iter().enumerate() {
            queue!(self.out, cursor::MoveTo(0, y as u16), Print(line))?;
        }
        self.out.flush()
    }
}

impl DisplayCommands for TerminalDisplay {
    fn display(&mut self, pixels: &[bool]) {
        if let Err(err) = self.draw(pixels) {
            log::warn!("unable to draw the screen: {}", err);
        }
    }
}

pub struct TerminalKeyboard {
    map: HashMap<char, usize>,
    pressed_at: [Option<Instant>; keyboard::SIZE],
    quit: bool,
}

impl TerminalKeyboard {
    pub fn new() -> Self {
        Self {
            map: key_map(),
            pressed_at: [None; keyboard::SIZE],
            quit: false,
        }
    }

    /// Reads all the pending terminal events without blocking.
    fn pump(&mut self) -> io::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                self.handle(key, Instant::now());
            }
        }
        Ok(())
    }

    fn handle(&mut self, key: KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        match key.code {
            KeyCode::Esc => self.quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true
            }
            KeyCode::Char(c) => match self.map.get(&c.to_ascii_lowercase()) {
                Some(&hex) => self.pressed_at[hex] = Some(now),
                None => log::debug!("key '{}' is not mapped", c),
            },
            _ => {}
        }
    }

    fn keys_at(&self, now: Instant) -> [bool; keyboard::SIZE] {
        let mut keys = [false; keyboard::SIZE];
        for (key, pressed_at) in keys.iter_mut().zip(self.pressed_at.iter()) {
            *key = matches!(pressed_at, Some(at) if now.duration_since(*at) < HOLD);
        }
        keys
    }
}

impl KeyboardCommands for TerminalKeyboard {
    fn get_keyboard(&mut self) -> [bool; keyboard::SIZE] {
        if let Err(err) = self.pump() {
            log::warn!("unable to read the keyboard: {}", err);
        }
        self.keys_at(Instant::now())
    }

    fn quit_requested(&mut self) -> bool {
        if let Err(err) = self.pump() {
            log::warn!("unable to read the keyboard: {}", err);
        }
        self.quit
    }
}

/// Plays the tone on the pc speaker, or rings the terminal bell if there is no speaker.
pub enum Speaker {
    Beep { pitch: u16 },
    Bell(TerminalBell),
}

impl Speaker {
    /// Will use the pc speaker if it can be silenced, the bell otherwise.
    pub fn open(pitch: u16) -> Self {
        match beep::beep(0) {
            Ok(()) => Speaker::Beep { pitch },
            Err(err) => {
                log::warn!("no pc speaker ({}), using the terminal bell", err);
                Speaker::Bell(TerminalBell::new())
            }
        }
    }
}

fn unavailable<E: std::fmt::Display>(err: E) -> AudioError {
    AudioError::Unavailable(err.to_string())
}

impl AudioOutput for Speaker {
    fn start_tone(&mut self) -> Result<(), AudioError> {
        match self {
            Speaker::Beep { pitch } => beep::beep(*pitch).map_err(unavailable),
            Speaker::Bell(bell) => bell.start_tone(),
        }
    }

    fn stop_tone(&mut self) -> Result<(), AudioError> {
        match self {
            Speaker::Beep { .. } => beep::beep(0).map_err(unavailable),
            Speaker::Bell(bell) => bell.stop_tone(),
        }
    }
}

/// Rings the terminal bell whenever the tone starts, the bell can't be held.
pub struct TerminalBell {
    out: Stdout,
}

impl TerminalBell {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl AudioOutput for TerminalBell {
    fn start_tone(&mut self) -> Result<(), AudioError> {
        self.out
            .write_all(b"\x07")
            .and_then(|_| self.out.flush())
            .map_err(unavailable)
    }

    fn stop_tone(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}
