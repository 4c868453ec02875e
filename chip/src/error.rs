use thiserror::Error;

use crate::opcode::Opcode;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ProcessError {
    #[error("Invalid opcode state '{0}'.")]
    Opcode(#[from] OpcodeError),
    #[error("Invalid stack state '{0}'.")]
    Stack(#[from] StackError),
    #[error("Memory access at {address:#06X} is out of bounds, as the memory len is {len}.")]
    Memory { address: usize, len: usize },
    #[error("Audio output failed '{0}'.")]
    Audio(#[from] AudioError),
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum OpcodeError {
    #[error("An unsupported opcode was used {0:#06X?}.")]
    InvalidOpcode(Opcode),
    #[error("Pointer location invalid there can not be an opcode at {pointer}, if data len is {len}")]
    MemoryInvalid { pointer: usize, len: usize },
}

#[derive(Error, Debug, PartialEq, Clone, Copy)]
pub enum StackError {
    #[error("Stack is full!")]
    Full,
    #[error("Stack is empty!")]
    Empty,
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("The rom is {size} bytes large, but at most {max} bytes fit into memory.")]
    TooLarge { size: usize, max: usize },
    #[error("Unable to read the rom '{0}'.")]
    Io(#[from] std::io::Error),
    #[error("Unable to read the rom archive '{0}'.")]
    Archive(#[from] zip::result::ZipError),
}

#[derive(Error, Debug, PartialEq, Clone)]
pub enum AudioError {
    #[error("The audio device is unavailable: {0}")]
    Unavailable(String),
}
