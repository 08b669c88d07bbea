//! LC-3 register file.
//!
//! Ten slots:
//! - R0..R7: general-purpose registers
//! - PC: program counter
//! - COND: condition flags (exactly one of N, Z, P)

use super::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of general-purpose registers.
pub const GENERAL_REGISTERS: usize = 8;

/// Slot index of the program counter.
pub const R_PC: usize = 8;

/// Slot index of the condition register.
pub const R_COND: usize = 9;

/// Total number of register slots.
pub const REGISTER_COUNT: usize = 10;

/// Address the program counter starts at.
pub const PC_START: Word = 0x3000;

/// Condition flag values held in COND.
///
/// The bit layout matches the branch mask (N, Z, P from high to low),
/// so a branch is taken when `mask & cond != 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u16)]
pub enum CondFlag {
    Positive = 1 << 0,
    Zero = 1 << 1,
    Negative = 1 << 2,
}

impl CondFlag {
    /// Flag describing the sign of a word.
    pub fn from_word(value: Word) -> Self {
        if value == 0 {
            CondFlag::Zero
        } else if value & 0x8000 != 0 {
            CondFlag::Negative
        } else {
            CondFlag::Positive
        }
    }

    /// Parse a raw COND value. Only a single flag bit is valid.
    pub fn from_bits(bits: Word) -> Option<Self> {
        match bits {
            1 => Some(CondFlag::Positive),
            2 => Some(CondFlag::Zero),
            4 => Some(CondFlag::Negative),
            _ => None,
        }
    }

    #[inline]
    pub fn bits(self) -> Word {
        self as Word
    }
}

/// The LC-3 register file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registers {
    slots: [Word; REGISTER_COUNT],
}

impl Registers {
    /// Create a register file at power-on state: PC at 0x3000, COND = Z.
    pub fn new() -> Self {
        let mut regs = Self {
            slots: [0; REGISTER_COUNT],
        };
        regs.reset();
        regs
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        self.slots = [0; REGISTER_COUNT];
        self.slots[R_PC] = PC_START;
        self.slots[R_COND] = CondFlag::Zero.bits();
    }

    /// Read any slot (0..10).
    #[inline]
    pub fn read(&self, index: usize) -> Result<Word, RegisterError> {
        self.slots
            .get(index)
            .copied()
            .ok_or(RegisterError::InvalidRegister(index))
    }

    /// Write any slot (0..10).
    ///
    /// COND only accepts a single flag bit.
    #[inline]
    pub fn write(&mut self, index: usize, value: Word) -> Result<(), RegisterError> {
        if index == R_COND && CondFlag::from_bits(value).is_none() {
            return Err(RegisterError::InvalidCond(value));
        }
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(RegisterError::InvalidRegister(index))?;
        *slot = value;
        Ok(())
    }

    /// Validate an operand index against the general-purpose range (0..8).
    #[inline]
    pub fn general(index: usize) -> Result<usize, RegisterError> {
        if index < GENERAL_REGISTERS {
            Ok(index)
        } else {
            Err(RegisterError::InvalidRegister(index))
        }
    }

    /// The program counter.
    #[inline]
    pub fn pc(&self) -> Word {
        self.slots[R_PC]
    }

    pub fn set_pc(&mut self, pc: Word) {
        self.slots[R_PC] = pc;
    }

    /// Increment the program counter by 1 (wrapping).
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> Word {
        let old = self.slots[R_PC];
        self.slots[R_PC] = old.wrapping_add(1);
        old
    }

    /// Raw COND bits.
    #[inline]
    pub fn cond(&self) -> Word {
        self.slots[R_COND]
    }

    pub fn set_cond(&mut self, flag: CondFlag) {
        self.slots[R_COND] = flag.bits();
    }

    /// Recompute COND from general-purpose register `index`.
    ///
    /// PC and COND are in range for the slot array but never have flags
    /// computed for them, so anything outside R0..R7 is rejected.
    pub fn update_flags(&mut self, index: usize) -> Result<CondFlag, RegisterError> {
        if index >= GENERAL_REGISTERS {
            return Err(RegisterError::NotGeneralPurpose(index));
        }
        let flag = CondFlag::from_word(self.slots[index]);
        self.set_cond(flag);
        Ok(flag)
    }

    /// The eight general-purpose registers.
    pub fn general_purpose(&self) -> [Word; GENERAL_REGISTERS] {
        let mut out = [0; GENERAL_REGISTERS];
        out.copy_from_slice(&self.slots[..GENERAL_REGISTERS]);
        out
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during register access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("invalid register index {0}")]
    InvalidRegister(usize),

    /// Internal consistency failure: flags requested for a non-GPR slot.
    #[error("condition flags cannot be computed for register slot {0}")]
    NotGeneralPurpose(usize),

    #[error("{0:#05b} is not a single condition flag")]
    InvalidCond(Word),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_on_state() {
        let regs = Registers::new();
        assert_eq!(regs.pc(), PC_START);
        assert_eq!(regs.cond(), CondFlag::Zero.bits());
        assert_eq!(regs.general_purpose(), [0; 8]);
    }

    #[test]
    fn test_register_bounds() {
        let mut regs = Registers::new();

        assert!(regs.write(9, 1).is_ok());
        assert_eq!(regs.read(10), Err(RegisterError::InvalidRegister(10)));
        assert_eq!(regs.write(10, 1), Err(RegisterError::InvalidRegister(10)));
        assert_eq!(Registers::general(7), Ok(7));
        assert_eq!(Registers::general(8), Err(RegisterError::InvalidRegister(8)));
    }

    #[test]
    fn test_cond_write_requires_single_flag() {
        let mut regs = Registers::new();

        assert_eq!(regs.write(R_COND, 0b111), Err(RegisterError::InvalidCond(0b111)));
        assert_eq!(regs.write(R_COND, 0), Err(RegisterError::InvalidCond(0)));
        assert_eq!(regs.cond(), CondFlag::Zero.bits());

        regs.write(R_COND, CondFlag::Negative.bits()).unwrap();
        assert_eq!(regs.cond(), 0b100);
        assert_eq!(regs.cond().count_ones(), 1);
    }

    #[test]
    fn test_update_flags() {
        let mut regs = Registers::new();

        regs.write(3, 100).unwrap();
        assert_eq!(regs.update_flags(3), Ok(CondFlag::Positive));
        assert_eq!(regs.cond(), 0b001);

        regs.write(3, 0x8000).unwrap();
        assert_eq!(regs.update_flags(3), Ok(CondFlag::Negative));
        assert_eq!(regs.cond(), 0b100);

        regs.write(3, 0).unwrap();
        assert_eq!(regs.update_flags(3), Ok(CondFlag::Zero));
        assert_eq!(regs.cond(), 0b010);
    }

    #[test]
    fn test_update_flags_rejects_special_slots() {
        let mut regs = Registers::new();
        regs.set_cond(CondFlag::Positive);

        assert_eq!(regs.update_flags(R_PC), Err(RegisterError::NotGeneralPurpose(R_PC)));
        assert_eq!(regs.update_flags(R_COND), Err(RegisterError::NotGeneralPurpose(R_COND)));
        assert_eq!(regs.cond(), CondFlag::Positive.bits());
    }

    #[test]
    fn test_advance_pc() {
        let mut regs = Registers::new();

        let old = regs.advance_pc();
        assert_eq!(old, 0x3000);
        assert_eq!(regs.pc(), 0x3001);

        regs.set_pc(0xFFFF);
        regs.advance_pc();
        assert_eq!(regs.pc(), 0);
    }
}
