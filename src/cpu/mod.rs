//! CPU emulation for the LC-3.
//!
//! - 65536 sixteen-bit memory cells
//! - 8 general-purpose registers plus PC and COND
//! - ADD, AND, NOT, BR and LDI; every other opcode is a fatal error

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

/// A 16-bit machine word. Arithmetic on words wraps modulo 2^16.
pub type Word = u16;

pub use memory::{Memory, MemoryError};
pub use registers::{CondFlag, Registers, RegisterError, PC_START};
pub use decode::{Instruction, Opcode, Operand, DecodeError};
pub use execute::{Machine, MachineError, MachineSnapshot, MachineState};
