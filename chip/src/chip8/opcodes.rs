use crate::{
    definitions::{cpu, display},
    devices::AudioOutput,
    opcode::{
        ArithmeticOp, ChipOpcodes, KeyOp, MiscOp, Operation, ProgramCounterStep,
    },
    timer::Timed,
    ProcessError,
};

use super::{ChipSet, State};

/// The width of a sprite row in pixels
const SPRITE_WIDTH: usize = 8;
/// The left most pixel of a sprite row
const SPRITE_MSB: u8 = 0x80;

impl<A: AudioOutput> ChipOpcodes for ChipSet<A> {
    fn clear(&mut self) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        for pixel in self.display.iter_mut() {
            *pixel = false;
        }
        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn ret(&mut self) -> Result<ProgramCounterStep, ProcessError> {
        let pc = self.pop_stack()?;
        log::debug!("return to {:#06X}", pc);
        Ok(ProgramCounterStep::Jump(pc))
    }

    fn jump(&self, nnn: usize) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::Jump(nnn))
    }

    fn call(&mut self, nnn: usize) -> Result<ProgramCounterStep, ProcessError> {
        // the return address is the instruction after the call
        self.push_stack(self.program_counter + ProgramCounterStep::Next.step())?;
        log::debug!("call {:#06X} from {:#06X}", nnn, self.program_counter);
        Ok(ProgramCounterStep::Jump(nnn))
    }

    fn skip_equal_const(&self, x: usize, nn: u8) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(self.registers[x] == nn))
    }

    fn skip_not_equal_const(&self, x: usize, nn: u8) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(self.registers[x] != nn))
    }

    fn skip_equal_register(&self, x: usize, y: usize) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(
            self.registers[x] == self.registers[y],
        ))
    }

    fn set_const(&mut self, x: usize, nn: u8) -> Result<ProgramCounterStep, ProcessError> {
        self.registers[x] = nn;
        Ok(ProgramCounterStep::Next)
    }

    fn add_const(&mut self, x: usize, nn: u8) -> Result<ProgramCounterStep, ProcessError> {
        // let VX overflow, but ignore carry
        self.registers[x] = self.registers[x].wrapping_add(nn);
        Ok(ProgramCounterStep::Next)
    }

    fn arithmetic(
        &mut self,
        op: ArithmeticOp,
        x: usize,
        y: usize,
    ) -> Result<ProgramCounterStep, ProcessError> {
        // both operands are read before anything is written, as
        // VF may be one of them
        let vx = self.registers[x];
        let vy = self.registers[y];

        let (result, flag) = match op {
            ArithmeticOp::Assign => (vy, None),
            ArithmeticOp::Or => (vx | vy, None),
            ArithmeticOp::And => (vx & vy, None),
            ArithmeticOp::Xor => (vx ^ vy, None),
            ArithmeticOp::Add => {
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(carry as u8))
            }
            ArithmeticOp::Sub => (vx.wrapping_sub(vy), Some((vx > vy) as u8)),
            ArithmeticOp::ShiftRight => (vx >> 1, Some(vx & 1)),
            ArithmeticOp::SubReverse => (vy.wrapping_sub(vx), Some((vy > vx) as u8)),
            ArithmeticOp::ShiftLeft => (vx << 1, Some(vx >> 7)),
        };

        // flag first, so that the result wins if VX is VF
        if let Some(flag) = flag {
            self.registers[cpu::register::LAST] = flag;
        }
        self.registers[x] = result;
        Ok(ProgramCounterStep::Next)
    }

    fn skip_not_equal_register(
        &self,
        x: usize,
        y: usize,
    ) -> Result<ProgramCounterStep, ProcessError> {
        Ok(ProgramCounterStep::cond(
            self.registers[x] != self.registers[y],
        ))
    }

    fn set_index(&mut self, nnn: usize) -> Result<ProgramCounterStep, ProcessError> {
        self.index_register = nnn as u16;
        Ok(ProgramCounterStep::Next)
    }

    fn jump_offset(&self, nnn: usize) -> Result<ProgramCounterStep, ProcessError> {
        let v0 = self.registers[0] as usize;
        Ok(ProgramCounterStep::Jump(nnn + v0))
    }

    fn random(&mut self, x: usize, nn: u8) -> Result<ProgramCounterStep, ProcessError> {
        // using a fill bytes call here, as the trait RngCore does not
        // support random u8.
        let mut rand = [0u8; 1];
        self.rng.fill_bytes(&mut rand);
        self.registers[x] = nn & rand[0];
        Ok(ProgramCounterStep::Next)
    }

    fn draw(
        &mut self,
        x: usize,
        y: usize,
        n: u8,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        // see https://tobiasvl.github.io/blog/write-a-chip-8-emulator/
        let rows = self.memory_range(self.index_register as usize, n as usize)?;

        let coorx = self.registers[x] as usize;
        let coory = self.registers[y] as usize;

        self.registers[cpu::register::LAST] = 0;

        for (i, address) in rows.enumerate() {
            let sprite = self.memory[address];
            let py = (coory + i) % display::HEIGHT;

            for j in 0..SPRITE_WIDTH {
                if sprite & (SPRITE_MSB >> j) == 0 {
                    continue;
                }
                // every pixel wraps around on its own
                let px = (coorx + j) % display::WIDTH;
                let pixel = &mut self.display[py * display::WIDTH + px];

                *pixel = !*pixel;
                if !*pixel {
                    self.registers[cpu::register::LAST] = 1;
                }
            }
        }

        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    fn key(&self, op: KeyOp, x: usize) -> Result<ProgramCounterStep, ProcessError> {
        let pressed = self.keyboard.is_pressed(self.registers[x] as usize);
        let step = match op {
            KeyOp::Pressed => ProgramCounterStep::cond(pressed),
            KeyOp::NotPressed => ProgramCounterStep::cond(!pressed),
        };
        Ok(step)
    }

    fn misc(
        &mut self,
        op: MiscOp,
        x: usize,
    ) -> Result<(ProgramCounterStep, Operation), ProcessError> {
        match op {
            MiscOp::GetDelayTimer => {
                self.registers[x] = self.delay_timer.get_value();
            }
            MiscOp::AwaitKeyPress => {
                if let Some(key) = self.keyboard.first_pressed() {
                    self.registers[x] = key as u8;
                } else {
                    log::debug!("waiting for a key press to store in V{:X}", x);
                    self.state = State::AwaitingKey { register: x };
                    // don't change the counter until a key was pressed
                    return Ok((ProgramCounterStep::None, Operation::Wait));
                }
            }
            MiscOp::SetDelayTimer => {
                self.delay_timer.set_value(self.registers[x]);
            }
            MiscOp::SetSoundTimer => {
                self.sound_timer.set_value(self.registers[x]);
            }
            MiscOp::AddToIndex => {
                // VF is not affected
                self.index_register = self.index_register.wrapping_add(self.registers[x] as u16);
            }
            MiscOp::SetIndexToGlyph => {
                let glyph = self.registers[x] as usize;
                self.index_register =
                    (display::fontset::LOCATION + display::fontset::GLYPH_SIZE * glyph) as u16;
            }
            MiscOp::StoreBcd => {
                let range = self.memory_range(self.index_register as usize, 3)?;
                let r = self.registers[x];

                self.memory[range].copy_from_slice(&[
                    r / 100,     // 246u8 / 100 => 2
                    r / 10 % 10, // 246u8 / 10 => 24 % 10 => 4
                    r % 10,      // 246u8 % 10 => 6
                ]);
            }
            MiscOp::StoreRegisters => {
                let range = self.memory_range(self.index_register as usize, x + 1)?;
                self.memory[range].copy_from_slice(&self.registers[..=x]);
            }
            MiscOp::LoadRegisters => {
                let range = self.memory_range(self.index_register as usize, x + 1)?;
                self.registers[..=x].copy_from_slice(&self.memory[range]);
            }
        }
        Ok((ProgramCounterStep::Next, Operation::None))
    }
}
