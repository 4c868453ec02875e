use std::{convert::TryFrom, ops::Range};

use rand::RngCore;
use tinyvec::ArrayVec;

use crate::{
    definitions::{cpu, display, keyboard, memory},
    devices::{AudioOutput, DiagnosticsSink, Keyboard, Snapshot},
    opcode::{self, ChipOpcodes, Instruction, Opcode, Operation, ProgramCounter, ProgramCounterStep},
    resources::Rom,
    timer::{SoundTimer, Timed, Timer},
    ProcessError, StackError,
};

/// The execution state kept between two steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Instructions are fetched and executed.
    Running,
    /// `FX0A` found no pressed key, every step polls the keyboard until a
    /// key is pressed and then stores it in the given register.
    AwaitingKey { register: usize },
}

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet<A: AudioOutput> {
    /// name of the loaded rom
    pub(super) name: String,
    /// all two bytes long and stored big-endian
    pub(super) opcode: Opcode,
    /// - `0x000-0x1FF` - Chip 8 interpreter (contains font set in emu)
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Box<[u8]>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: u16,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: usize,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[usize; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When its value is nonzero, a beeping
    /// sound is made.
    pub(super) sound_timer: SoundTimer<A>,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`, stored row after row.
    pub(super) display: Box<[bool]>,
    /// The hex keyboard.
    pub(super) keyboard: Keyboard,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
    /// Running or stalled on a key press.
    pub(super) state: State,
    /// Receives a snapshot before every step, if set.
    pub(super) diagnostics: Option<Box<dyn DiagnosticsSink + Send>>,
}

impl<A: AudioOutput> ChipSet<A> {
    /// will create a new chipset object, using the operating system as the
    /// source of randomness
    pub fn new(rom: Rom, audio: A) -> Self {
        Self::with_rng(rom, audio, Box::new(rand::rngs::OsRng))
    }

    /// will create a new chipset object with the given random number generator
    pub fn with_rng(rom: Rom, audio: A, rng: Box<dyn RngCore + Send>) -> Self {
        // initialize all the memory with 0
        let mut ram = vec![0; memory::SIZE].into_boxed_slice();

        // load fonts
        ram[display::fontset::LOCATION
            ..(display::fontset::LOCATION + display::fontset::FONTSET.len())]
            .copy_from_slice(&display::fontset::FONTSET);

        // write the rom data into memory, the rom guarantees that it fits
        let data = rom.get_data();
        ram[cpu::PROGRAM_COUNTER..(cpu::PROGRAM_COUNTER + data.len())].copy_from_slice(data);

        Self {
            name: rom.get_name().to_string(),
            opcode: 0,
            memory: ram,
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: cpu::PROGRAM_COUNTER,
            stack: ArrayVec::new(),
            delay_timer: Timer::default(),
            sound_timer: SoundTimer::new(audio),
            display: vec![false; display::RESOLUTION].into_boxed_slice(),
            keyboard: Keyboard::new(),
            rng,
            state: State::Running,
            diagnostics: None,
        }
    }

    /// will get the next opcode from memory
    pub(super) fn set_opcode(&mut self) -> Result<(), ProcessError> {
        // will build the opcode given from the pointer
        self.opcode = opcode::build_opcode(&self.memory, self.program_counter)?;
        Ok(())
    }

    /// will advance the program by a single step
    ///
    /// Unknown opcodes are skipped. While awaiting a key press nothing but the
    /// keyboard is looked at and [`Operation::Wait`] is returned until a key is pressed.
    pub fn next(&mut self) -> Result<Operation, ProcessError> {
        if let State::AwaitingKey { register } = self.state {
            self.trace();
            return self.resolve_key_wait(register);
        }

        self.set_opcode()?;
        self.trace();

        let operation = match Instruction::try_from(self.opcode) {
            Ok(instruction) => {
                log::trace!(
                    "{:#06X}: {:#06X} {:?}",
                    self.program_counter,
                    self.opcode,
                    instruction
                );
                self.calc(&instruction)?
            }
            Err(err) => {
                log::warn!("{} at {:#06X}, skipping it", err, self.program_counter);
                self.step(ProgramCounterStep::Next);
                Operation::None
            }
        };

        // a stalled key wait leaves the whole machine untouched
        if operation != Operation::Wait {
            self.tick_timers()?;
        }
        Ok(operation)
    }

    fn resolve_key_wait(&mut self, register: usize) -> Result<Operation, ProcessError> {
        match self.keyboard.first_pressed() {
            Some(key) => {
                log::debug!("key {:#X} pressed, stored in V{:X}", key, register);
                self.registers[register] = key as u8;
                self.state = State::Running;
                self.step(ProgramCounterStep::Next);
                self.tick_timers()?;
                Ok(Operation::None)
            }
            None => Ok(Operation::Wait),
        }
    }

    /// Counts both timers down, switching the tone on the sound timer edges.
    ///
    /// Runs after the instruction was applied, so an audio error is reported for a
    /// step that already moved the program counter. The sound timer goes first, a
    /// failing output leaves both timers at their previous values.
    pub(super) fn tick_timers(&mut self) -> Result<(), ProcessError> {
        self.sound_timer.tick()?;
        self.delay_timer.tick();
        Ok(())
    }

    fn trace(&mut self) {
        if self.diagnostics.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(sink) = self.diagnostics.as_mut() {
            sink.trace(&snapshot);
        }
    }

    /// The registers, timers, keys and counters as they are right now.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            program_counter: self.program_counter,
            opcode: self.opcode,
            stack_pointer: self.stack.len(),
            registers: self.registers,
            keys: *self.keyboard.get_keys(),
            delay_timer: self.delay_timer.get_value(),
            sound_timer: self.sound_timer.get_value(),
        }
    }

    /// Will set or remove the diagnostics sink.
    pub fn set_diagnostics(&mut self, sink: Option<Box<dyn DiagnosticsSink + Send>>) {
        self.diagnostics = sink;
    }

    /// Will write keyboard data into interncal keyboard representation.
    pub fn set_keyboard(&mut self, keys: &[bool; keyboard::SIZE]) {
        self.keyboard.set_mult(keys);
    }

    /// Will set the value of the given key
    pub fn set_key(&mut self, key: usize, to: bool) {
        self.keyboard.set_key(key, to)
    }

    /// Will toggle the given key
    pub fn toggle_key(&mut self, key: usize) {
        self.keyboard.toggle_key(key)
    }

    /// Will press the given key, so that a pending key wait is resolved by the next step.
    pub fn supply_key(&mut self, key: usize) {
        self.keyboard.set_key(key, true)
    }

    /// Is the machine stalled on a `FX0A` key wait.
    pub fn is_awaiting_input(&self) -> bool {
        matches!(self.state, State::AwaitingKey { .. })
    }

    pub fn get_state(&self) -> State {
        self.state
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool; keyboard::SIZE] {
        self.keyboard.get_keys()
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// Is the tone currently playing
    pub fn is_tone_playing(&self) -> bool {
        self.sound_timer.is_playing()
    }

    /// The audio output the sound timer drives.
    pub fn audio(&self) -> &A {
        self.sound_timer.output()
    }

    pub fn audio_mut(&mut self) -> &mut A {
        self.sound_timer.output_mut()
    }

    /// Will return a immutable slice of the current display configuration, row after row
    pub fn get_display(&self) -> &[bool] {
        &self.display
    }

    pub fn get_registers(&self) -> &[u8; cpu::register::SIZE] {
        &self.registers
    }

    pub fn get_index_register(&self) -> u16 {
        self.index_register
    }

    pub fn get_program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn get_memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Will push the current pointer to the stack
    pub(super) fn push_stack(&mut self, pointer: usize) -> Result<(), StackError> {
        match self.stack.try_push(pointer) {
            None => Ok(()),
            Some(_) => Err(StackError::Full),
        }
    }

    /// Will pop from the stack
    pub(super) fn pop_stack(&mut self) -> Result<usize, StackError> {
        self.stack.pop().ok_or(StackError::Empty)
    }

    /// Will return the memory range `from..from + len`, if it lies
    /// completely inside of the memory.
    pub(super) fn memory_range(&self, from: usize, len: usize) -> Result<Range<usize>, ProcessError> {
        let to = from + len;
        if to <= self.memory.len() {
            Ok(from..to)
        } else {
            Err(ProcessError::Memory {
                address: to.saturating_sub(1).max(from),
                len: self.memory.len(),
            })
        }
    }
}

impl<A: AudioOutput> ProgramCounter for ChipSet<A> {
    fn step(&mut self, step: ProgramCounterStep) {
        self.program_counter = if let ProgramCounterStep::Jump(_) = step {
            step.step()
        } else {
            self.program_counter + step.step()
        }
    }
}
