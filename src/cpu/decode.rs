//! Instruction decoder for the LC-3.
//!
//! Every instruction is one 16-bit word. The opcode lives in bits 15-12;
//! the remaining fields depend on the opcode:
//!
//! ```text
//! ADD/AND  0001/0101 DR SR1 0 00 SR2
//! ADD/AND  0001/0101 DR SR1 1 IMM5
//! NOT      1001      DR SR1 1 11111
//! BR       0000      N Z P  PCOFFSET9
//! LDI      1010      DR     PCOFFSET9
//! ```

use super::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Opcode field: bits 15-12.
#[inline]
pub fn opcode(ins: Word) -> u8 {
    (ins >> 12) as u8
}

/// Destination register: bits 11-9.
#[inline]
pub fn dest_reg(ins: Word) -> usize {
    usize::from((ins >> 9) & 0x7)
}

/// First source register: bits 8-6.
#[inline]
pub fn src_reg1(ins: Word) -> usize {
    usize::from((ins >> 6) & 0x7)
}

/// Bit 5 selects the immediate form of ADD/AND.
#[inline]
pub fn is_immediate_mode(ins: Word) -> bool {
    (ins >> 5) & 0x1 == 1
}

/// Second source register: bits 2-0 (register mode only).
#[inline]
pub fn src_reg2(ins: Word) -> usize {
    usize::from(ins & 0x7)
}

/// Raw 5-bit immediate: bits 4-0.
#[inline]
pub fn immediate5(ins: Word) -> Word {
    ins & 0x1F
}

/// Raw 9-bit PC-relative offset: bits 8-0.
#[inline]
pub fn pc_offset9(ins: Word) -> Word {
    ins & 0x1FF
}

/// Branch condition mask: bits 11-9, ordered N, Z, P.
#[inline]
pub fn branch_cond_mask(ins: Word) -> Word {
    (ins >> 9) & 0x7
}

/// Widen a `bit_width`-bit two's-complement field to 16 bits.
///
/// # Panics
/// Panics unless `bit_width` is in `1..16`.
pub fn sign_extend(value: Word, bit_width: u32) -> Word {
    assert!(
        (1..16).contains(&bit_width),
        "sign_extend width {} out of range (1-15)",
        bit_width
    );
    if (value >> (bit_width - 1)) & 1 == 1 {
        value | (0xFFFF << bit_width)
    } else {
        value
    }
}

/// The sixteen architectural opcodes.
///
/// Only `Br`, `Add`, `And`, `Not` and `Ldi` are executed; the rest exist so
/// the decoder can name what it rejects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    Br = 0,
    Add,
    Ld,
    St,
    Jsr,
    And,
    Ldr,
    Str,
    Rti,
    Not,
    Ldi,
    Sti,
    Jmp,
    Res,
    Lea,
    Trap,
}

impl Opcode {
    const ALL: [Opcode; 16] = [
        Opcode::Br,
        Opcode::Add,
        Opcode::Ld,
        Opcode::St,
        Opcode::Jsr,
        Opcode::And,
        Opcode::Ldr,
        Opcode::Str,
        Opcode::Rti,
        Opcode::Not,
        Opcode::Ldi,
        Opcode::Sti,
        Opcode::Jmp,
        Opcode::Res,
        Opcode::Lea,
        Opcode::Trap,
    ];

    /// Opcode of a raw instruction word.
    pub fn of(ins: Word) -> Self {
        Self::ALL[usize::from(opcode(ins))]
    }
}

/// Second operand of ADD/AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operand {
    /// SR2
    Register(usize),
    /// IM5, already sign-extended to 16 bits.
    Immediate(Word),
}

/// Decoded LC-3 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// DR := SR1 + operand
    Add { dr: usize, sr1: usize, operand: Operand },

    /// DR := SR1 & operand
    And { dr: usize, sr1: usize, operand: Operand },

    /// DR := !SR1
    Not { dr: usize, sr1: usize },

    /// if (mask & COND) != 0 then PC := PC + offset
    Br { mask: Word, offset: Word },

    /// DR := mem[mem[PC + offset]]
    Ldi { dr: usize, offset: Word },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::Add { .. } => Opcode::Add,
            Instruction::And { .. } => Opcode::And,
            Instruction::Not { .. } => Opcode::Not,
            Instruction::Br { .. } => Opcode::Br,
            Instruction::Ldi { .. } => Opcode::Ldi,
        }
    }
}

fn alu_operand(ins: Word) -> Operand {
    if is_immediate_mode(ins) {
        Operand::Immediate(sign_extend(immediate5(ins), 5))
    } else {
        Operand::Register(src_reg2(ins))
    }
}

/// Decode a 16-bit instruction word.
pub fn decode(ins: Word) -> Result<Instruction, DecodeError> {
    let instruction = match Opcode::of(ins) {
        Opcode::Add => Instruction::Add {
            dr: dest_reg(ins),
            sr1: src_reg1(ins),
            operand: alu_operand(ins),
        },
        Opcode::And => Instruction::And {
            dr: dest_reg(ins),
            sr1: src_reg1(ins),
            operand: alu_operand(ins),
        },
        Opcode::Not => Instruction::Not {
            dr: dest_reg(ins),
            sr1: src_reg1(ins),
        },
        Opcode::Br => Instruction::Br {
            mask: branch_cond_mask(ins),
            offset: sign_extend(pc_offset9(ins), 9),
        },
        Opcode::Ldi => Instruction::Ldi {
            dr: dest_reg(ins),
            offset: sign_extend(pc_offset9(ins), 9),
        },
        other => {
            return Err(DecodeError::InvalidOpcode {
                opcode: other,
                instruction: ins,
            })
        }
    };

    Ok(instruction)
}

fn reg_field(index: usize, shift: u32) -> Word {
    ((index as Word) & 0x7) << shift
}

/// Encode an instruction back to a 16-bit word.
pub fn encode(instr: &Instruction) -> Word {
    let op = |o: Opcode| (o as Word) << 12;
    let alu = |dr: usize, sr1: usize, operand: &Operand| {
        let tail = match *operand {
            Operand::Register(sr2) => reg_field(sr2, 0),
            Operand::Immediate(imm) => 0x20 | (imm & 0x1F),
        };
        reg_field(dr, 9) | reg_field(sr1, 6) | tail
    };

    match instr {
        Instruction::Add { dr, sr1, operand } => op(Opcode::Add) | alu(*dr, *sr1, operand),
        Instruction::And { dr, sr1, operand } => op(Opcode::And) | alu(*dr, *sr1, operand),
        Instruction::Not { dr, sr1 } => {
            op(Opcode::Not) | reg_field(*dr, 9) | reg_field(*sr1, 6) | 0x3F
        }
        Instruction::Br { mask, offset } => op(Opcode::Br) | ((*mask & 0x7) << 9) | (*offset & 0x1FF),
        Instruction::Ldi { dr, offset } => op(Opcode::Ldi) | reg_field(*dr, 9) | (*offset & 0x1FF),
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Register(r) => write!(f, "R{}", r),
            Operand::Immediate(imm) => write!(f, "#{}", *imm as i16),
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Add { dr, sr1, operand } => write!(f, "ADD R{}, R{}, {}", dr, sr1, operand),
            Instruction::And { dr, sr1, operand } => write!(f, "AND R{}, R{}, {}", dr, sr1, operand),
            Instruction::Not { dr, sr1 } => write!(f, "NOT R{}, R{}", dr, sr1),
            Instruction::Br { mask, offset } => {
                if *mask == 0 {
                    return write!(f, "NOP");
                }
                write!(f, "BR")?;
                for (bit, name) in [(0b100u16, 'n'), (0b010, 'z'), (0b001, 'p')] {
                    if *mask & bit != 0 {
                        write!(f, "{}", name)?;
                    }
                }
                write!(f, " #{}", *offset as i16)
            }
            Instruction::Ldi { dr, offset } => write!(f, "LDI R{}, #{}", dr, *offset as i16),
        }
    }
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode {opcode:?} in instruction {instruction:#06x}")]
    InvalidOpcode { opcode: Opcode, instruction: Word },
}
