//! A chip8 interpreter core. The [`ChipSet`](chip8::ChipSet) holds the whole machine and is
//! advanced one instruction at a time, the screen, the keyboard and the tone are provided by
//! the traits in [`devices`].
pub mod chip8;
pub mod definitions;
pub mod devices;
pub mod opcode;
pub mod resources;
pub mod timer;
mod error;
mod runner;

// reexporting for convinience
pub use error::*;
pub use runner::*;
