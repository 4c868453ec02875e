use crate::{
    definitions::{cpu, keyboard},
    AudioError,
};

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all from the pixels, the slice is the row-major framebuffer.
    fn display(&mut self, pixels: &[bool]);
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the keyboard data
pub trait KeyboardCommands {
    /// Returns the current state of all the keys.
    fn get_keyboard(&mut self) -> [bool; keyboard::SIZE];

    /// Returns true once the user asked to stop the emulation.
    fn quit_requested(&mut self) -> bool;
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for the tone played while the sound timer runs.
pub trait AudioOutput {
    /// Starts the tone.
    fn start_tone(&mut self) -> Result<(), AudioError>;
    /// Stops the tone.
    fn stop_tone(&mut self) -> Result<(), AudioError>;
}

#[cfg_attr(test, mockall::automock)]
/// Receives the machine state before every executed step.
pub trait DiagnosticsSink {
    fn trace(&mut self, snapshot: &Snapshot);
}

/// An audio output that never makes a sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mute;

impl AudioOutput for Mute {
    fn start_tone(&mut self) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop_tone(&mut self) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Writes every snapshot to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn trace(&mut self, snapshot: &Snapshot) {
        log::info!("{}", snapshot);
    }
}

/// The machine state as it is seen right before an instruction is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub program_counter: usize,
    pub opcode: u16,
    pub stack_pointer: usize,
    pub registers: [u8; cpu::register::SIZE],
    pub keys: [bool; keyboard::SIZE],
    pub delay_timer: u8,
    pub sound_timer: u8,
}

/// Will store the state of the hex keyboard.
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    pub fn toggle_key(&mut self, key: usize) {
        self.set_key(key, !self.is_pressed(key))
    }

    pub fn set_key(&mut self, key: usize, to: bool) {
        debug_assert!(key < keyboard::SIZE);
        if let Some(entry) = self.keys.get_mut(key) {
            *entry = to;
        }
    }

    pub fn set_mult(&mut self, keys: &[bool; keyboard::SIZE]) {
        self.keys = *keys;
    }

    pub fn get_keys(&self) -> &[bool; keyboard::SIZE] {
        &self.keys
    }

    /// Keys outside of `0-F` are never pressed.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// The lowest key index that is currently pressed.
    pub fn first_pressed(&self) -> Option<usize> {
        self.keys.iter().position(|&pressed| pressed)
    }
}
