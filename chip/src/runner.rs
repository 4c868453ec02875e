use std::time::{Duration, Instant};

use crate::{
    chip8::ChipSet,
    definitions::cpu,
    devices::{AudioOutput, DisplayCommands, KeyboardCommands, LogDiagnostics},
    opcode::Operation,
    ProcessError,
};

/// How the [`Runner`] drives the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Steps per second, `0` runs as fast as possible.
    pub hertz: u64,
    /// Stop after this many steps.
    pub max_cycles: Option<u64>,
    /// Log a snapshot before every step.
    pub trace: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            hertz: cpu::HERTZ,
            max_cycles: None,
            trace: false,
        }
    }
}

impl RunnerConfig {
    /// The time a single step is given, rates above a billion steps per second
    /// round down to no pause at all.
    pub fn interval(&self) -> Option<Duration> {
        const NANOS_PER_SEC: u64 = 1_000_000_000;
        if self.hertz == 0 {
            None
        } else {
            Some(Duration::from_nanos(NANOS_PER_SEC / self.hertz))
        }
    }
}

/// Runs a chip against a display and a keyboard.
pub struct Runner<D, K>
where
    D: DisplayCommands,
    K: KeyboardCommands,
{
    display: D,
    keyboard: K,
    config: RunnerConfig,
}

impl<D, K> Runner<D, K>
where
    D: DisplayCommands,
    K: KeyboardCommands,
{
    pub fn new(display: D, keyboard: K, config: RunnerConfig) -> Self {
        Self {
            display,
            keyboard,
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    /// Will step the chip until the keyboard asks to quit, the cycle limit
    /// is reached or a step fails. Returns the amount of steps taken.
    ///
    /// The keyboard state is copied into the chip before every step and the
    /// display only receives the framebuffer after it changed.
    pub fn run<A: AudioOutput>(&mut self, chip: &mut ChipSet<A>) -> Result<u64, ProcessError> {
        if self.config.trace {
            chip.set_diagnostics(Some(Box::new(LogDiagnostics)));
        }
        let interval = self.config.interval();
        let mut cycles = 0;

        log::info!(
            "running '{}' at {} Hz",
            chip.get_name(),
            self.config.hertz
        );

        loop {
            if matches!(self.config.max_cycles, Some(max) if cycles >= max) {
                log::info!("stopping after {} cycles", cycles);
                break;
            }
            if self.keyboard.quit_requested() {
                log::info!("quit requested after {} cycles", cycles);
                break;
            }

            let start = Instant::now();

            chip.set_keyboard(&self.keyboard.get_keyboard());
            if let Operation::Draw = chip.next()? {
                self.display.display(chip.get_display());
            }
            cycles += 1;

            if let Some(interval) = interval {
                let elapsed = start.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }

        Ok(cycles)
    }
}
