//! End-to-end runs of small programs through the public API.

use lc3::cpu::{CondFlag, DecodeError, MachineError, MemoryError, Opcode};
use lc3::{parse_words, Machine};

fn machine_with(program: &str) -> Machine {
    let mut vm = Machine::new();
    vm.load_image(&parse_words(program).unwrap()).unwrap();
    vm
}

#[test]
fn add_register_mode() {
    // ADD R2, R0, R1
    let mut vm = machine_with("5121");
    vm.regs.write(0, 1).unwrap();
    vm.regs.write(1, 2).unwrap();

    vm.step().unwrap();

    assert_eq!(vm.regs.read(2).unwrap(), 3);
    assert_eq!(vm.cond_flag(), Some(CondFlag::Positive));
    assert_eq!(vm.regs.pc(), 0x3001);
}

#[test]
fn add_immediate_negative() {
    // ADD R2, R0, #-2
    let mut vm = machine_with("5182");
    vm.regs.write(0, 1).unwrap();

    vm.step().unwrap();

    assert_eq!(vm.regs.read(2).unwrap(), 0xFFFF);
    assert_eq!(vm.cond_flag(), Some(CondFlag::Negative));
}

#[test]
fn branch_taken_on_negative() {
    // ADD R2, R0, R1 ; BRn #1
    let mut vm = machine_with("5121 2049");
    vm.regs.write(0, 0xFFFE).unwrap();
    vm.regs.write(1, 1).unwrap();

    vm.run_limited(2).unwrap();

    assert_eq!(vm.regs.pc(), 0x3003);
}

#[test]
fn branch_not_taken_on_positive() {
    // BRn #1 with COND = P
    let mut vm = machine_with("2049");
    vm.regs.set_cond(CondFlag::Positive);

    vm.step().unwrap();

    assert_eq!(vm.regs.pc(), 0x3001);
}

#[test]
fn load_indirect_through_pointer() {
    // LDI R1, #1 ; .FILL 0 ; .FILL x4000
    // The offset is taken from the incremented PC, so the pointer sits at 0x3002.
    let mut vm = machine_with("41473 0 16384");
    vm.mem.write(0x4000, 99).unwrap();

    vm.step().unwrap();

    assert_eq!(vm.regs.read(1).unwrap(), 99);
    assert_eq!(vm.cond_flag(), Some(CondFlag::Positive));
}

#[test]
fn reserved_opcode_aborts_run() {
    let mut vm = machine_with("-1");

    let err = vm.run().unwrap_err();

    assert_eq!(
        err,
        MachineError::Decode(DecodeError::InvalidOpcode {
            opcode: Opcode::Trap,
            instruction: 0xFFFF,
        })
    );
    assert_eq!(vm.regs.general_purpose(), [0; 8]);
    assert_eq!(vm.regs.pc(), 0x3001);
}

#[test]
fn countdown_loop() {
    // R0 := 3 ; loop: ADD R0, R0, #-1 ; BRp loop ; then a TRAP to stop.
    //   ADD R0, R0, #3   = 0x1023
    //   ADD R0, R0, #-1  = 0x103F
    //   BRp #-2          = 0x03FE
    //   TRAP x25         = 0xF025
    let mut vm = machine_with("4131 4159 1022 61477");

    let err = vm.run().unwrap_err();

    assert!(matches!(err, MachineError::Decode(_)));
    assert_eq!(vm.regs.read(0).unwrap(), 0);
    assert_eq!(vm.cond_flag(), Some(CondFlag::Zero));
    assert_eq!(vm.steps, 7);
    assert_eq!(vm.regs.pc(), 0x3004);
}

#[test]
fn load_indirect_pointer_survives_wraparound() {
    // PC-relative effective addresses wrap around the top of memory.
    let mut vm = Machine::new();
    vm.regs.set_pc(0xFFFF);
    vm.mem.write(0xFFFF, 0xA200).unwrap(); // LDI R1, #0 -> pointer at 0x0000
    vm.mem.write(0x0000, 0x0010).unwrap();
    vm.mem.write(0x0010, 0x8000).unwrap();

    vm.step().unwrap();

    assert_eq!(vm.regs.read(1).unwrap(), 0x8000);
    assert_eq!(vm.cond_flag(), Some(CondFlag::Negative));
}

#[test]
fn oversized_image_is_rejected() {
    let mut vm = Machine::new();
    let image = vec![0; 0x10000 - 0x3000 + 1];

    assert_eq!(
        vm.load_image(&image),
        Err(MemoryError::ImageTooLarge { size: image.len(), available: 0xD000 })
    );
}
