//! Execution engine for the LC-3.
//!
//! Implements the fetch-decode-execute cycle and the supported instruction
//! behaviors. There is no HALT or TRAP support, so `run` only returns on a
//! fatal error unless the driver halts the machine itself.

use crate::cpu::decode::{self, DecodeError, Instruction, Operand};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::{CondFlag, RegisterError, PC_START};
use crate::cpu::{Memory, Registers, Word};
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    Running,
    /// Terminal. No implemented opcode enters this state.
    Halted,
}

/// An LC-3 machine: memory, registers and run state.
#[derive(Clone, Serialize, Deserialize)]
pub struct Machine {
    pub regs: Registers,
    pub mem: Memory,
    pub state: MachineState,
    /// Instructions executed since construction or reset.
    pub steps: u64,
}

impl Machine {
    /// Create a machine with zeroed memory and PC at 0x3000.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: MachineState::Running,
            steps: 0,
        }
    }

    /// Reset the machine to its constructed state.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = MachineState::Running;
        self.steps = 0;
        log::debug!("machine reset");
    }

    /// Place a program image at 0x3000. PC is left untouched.
    pub fn load_image(&mut self, image: &[Word]) -> Result<(), MemoryError> {
        self.mem.load_image(PC_START, image)?;
        log::debug!("loaded {} words at {:#06x}", image.len(), PC_START);
        Ok(())
    }

    /// Execute a single instruction.
    ///
    /// Returns `Ok(None)` without touching any state once halted.
    pub fn step(&mut self) -> Result<Option<Instruction>, MachineError> {
        if self.state == MachineState::Halted {
            return Ok(None);
        }

        // Fetch, then advance PC before dispatch so offsets are relative to
        // the following instruction.
        let pc = self.regs.pc();
        let raw = self.mem.read(i32::from(pc))?;
        self.regs.advance_pc();

        let instr = decode::decode(raw)?;
        log::trace!("{:#06x}: {:#06x}  {}", pc, raw, instr);

        self.execute(instr)?;
        self.steps += 1;

        Ok(Some(instr))
    }

    /// Run until halted or a fatal error.
    ///
    /// Returns the number of instructions executed.
    pub fn run(&mut self) -> Result<u64, MachineError> {
        let start_steps = self.steps;

        while self.state == MachineState::Running {
            self.step()?;
        }

        Ok(self.steps - start_steps)
    }

    /// Run for at most `max_steps` instructions.
    pub fn run_limited(&mut self, max_steps: u64) -> Result<u64, MachineError> {
        let start_steps = self.steps;
        let limit = self.steps.saturating_add(max_steps);

        while self.state == MachineState::Running && self.steps < limit {
            self.step()?;
        }

        if self.state == MachineState::Running {
            log::warn!("step limit of {} reached at PC={:#06x}", max_steps, self.regs.pc());
        }

        Ok(self.steps - start_steps)
    }

    fn execute(&mut self, instr: Instruction) -> Result<(), MachineError> {
        match instr {
            Instruction::Add { dr, sr1, operand } => {
                self.alu(dr, sr1, operand, Word::wrapping_add)?;
            }

            Instruction::And { dr, sr1, operand } => {
                self.alu(dr, sr1, operand, |a, b| a & b)?;
            }

            Instruction::Not { dr, sr1 } => {
                let dr = Registers::general(dr)?;
                let value = self.regs.read(Registers::general(sr1)?)?;
                self.regs.write(dr, !value)?;
                self.regs.update_flags(dr)?;
            }

            Instruction::Br { mask, offset } => {
                if mask & self.regs.cond() != 0 {
                    let target = self.regs.pc().wrapping_add(offset);
                    self.regs.set_pc(target);
                }
            }

            Instruction::Ldi { dr, offset } => {
                let dr = Registers::general(dr)?;
                let pointer = self.regs.pc().wrapping_add(offset);
                let value = self.mem.read_indirect(i32::from(pointer))?;
                self.regs.write(dr, value)?;
                self.regs.update_flags(dr)?;
            }
        }

        Ok(())
    }

    /// Shared operand resolution for ADD and AND.
    fn alu(
        &mut self,
        dr: usize,
        sr1: usize,
        operand: Operand,
        op: impl Fn(Word, Word) -> Word,
    ) -> Result<(), MachineError> {
        let dr = Registers::general(dr)?;
        let lhs = self.regs.read(Registers::general(sr1)?)?;
        let rhs = match operand {
            Operand::Register(sr2) => self.regs.read(Registers::general(sr2)?)?,
            Operand::Immediate(imm) => imm,
        };

        self.regs.write(dr, op(lhs, rhs))?;
        self.regs.update_flags(dr)?;
        Ok(())
    }

    /// The current condition flag, if COND holds a valid single flag.
    pub fn cond_flag(&self) -> Option<CondFlag> {
        CondFlag::from_bits(self.regs.cond())
    }

    /// Serializable view of the architectural state.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            registers: self.regs.general_purpose(),
            pc: self.regs.pc(),
            cond: self.cond_flag(),
            state: self.state,
            steps: self.steps,
        }
    }

    /// Check if the machine is halted.
    pub fn is_halted(&self) -> bool {
        self.state == MachineState::Halted
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == MachineState::Running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("state", &self.state)
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Architectural state handed to the driver after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub registers: [Word; 8],
    pub pc: Word,
    pub cond: Option<CondFlag>,
    pub state: MachineState,
    pub steps: u64,
}

/// Fatal conditions raised while executing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Register(#[from] RegisterError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
