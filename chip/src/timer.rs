//! The delay and sound timers. Both count down by one per executed step, the
//! sound timer additionally switches the tone of an [`AudioOutput`] on and off.
use crate::{devices::AudioOutput, AudioError};

pub trait Timed {
    /// Will set the value from which the timer shall count down from.
    fn set_value(&mut self, value: u8);

    /// Will get the value that the counter is currently at.
    fn get_value(&self) -> u8;
}

/// Represents a timer inside of the chip
/// infrastruture, it will count down to
/// zero from what ever number given.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    value: u8,
}

impl Timer {
    /// Will create a new timer with the given value.
    pub fn new(value: u8) -> Self {
        Self { value }
    }

    /// Counts down by one, never below zero.
    pub fn tick(&mut self) {
        self.value = self.value.saturating_sub(1);
    }
}

impl Timed for Timer {
    fn set_value(&mut self, value: u8) {
        self.value = value;
    }

    fn get_value(&self) -> u8 {
        self.value
    }
}

/// The sound timer, it keeps track if the tone is currently playing, so that
/// the tone is only started and stopped on the edges.
#[derive(Debug)]
pub struct SoundTimer<A: AudioOutput> {
    timer: Timer,
    playing: bool,
    output: A,
}

impl<A: AudioOutput> SoundTimer<A> {
    pub fn new(output: A) -> Self {
        Self {
            timer: Timer::default(),
            playing: false,
            output,
        }
    }

    /// Is the tone currently playing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn output(&self) -> &A {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut A {
        &mut self.output
    }

    /// Counts down by one and starts the tone, if the timer was found running
    /// while silent, or stops it, if the timer was found at zero while playing.
    pub fn tick(&mut self) -> Result<(), AudioError> {
        if self.timer.get_value() > 0 {
            if !self.playing {
                log::debug!("starting tone");
                self.output.start_tone()?;
                self.playing = true;
            }
            self.timer.tick();
        } else if self.playing {
            log::debug!("stopping tone");
            self.output.stop_tone()?;
            self.playing = false;
        }
        Ok(())
    }
}

impl<A: AudioOutput> Timed for SoundTimer<A> {
    fn set_value(&mut self, value: u8) {
        self.timer.set_value(value);
    }

    fn get_value(&self) -> u8 {
        self.timer.get_value()
    }
}
