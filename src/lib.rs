//! # LC-3 Emulator
//!
//! A fetch-decode-execute core for the 16-bit LC-3 instruction set.
//!
//! The core covers memory, registers, instruction decoding and the ADD,
//! AND, NOT, BR and LDI opcodes. Program images are produced by the
//! [`image`] module and placed at 0x3000 before execution starts.

pub mod cpu;
pub mod image;

// Re-export commonly used types
pub use cpu::{Machine, MachineError, MachineSnapshot, MachineState, Memory, Registers, Instruction, Word};
pub use image::{parse_words, load_image_file, ImageError};
