use triton_core::cpu::i8080::{Flags, I8080};

mod common;
use common::TestBus;

fn cpu_with(program: &[u8]) -> (I8080, TestBus) {
    let mut bus = TestBus::new();
    bus.load(0, program);
    (I8080::new(), bus)
}

#[test]
fn test_push_pop_round_trip_all_pairs() {
    // (push, pop, set, get)
    type Set = fn(&mut I8080, u16);
    type Get = fn(&I8080) -> u16;
    let pairs: [(u8, u8, Set, Get); 3] = [
        (0xC5, 0xC1, |c, v| c.set_bc(v), |c| c.bc()),
        (0xD5, 0xD1, |c, v| c.set_de(v), |c| c.de()),
        (0xE5, 0xE1, |c, v| c.set_hl(v), |c| c.hl()),
    ];
    for (push, pop, set, get) in pairs {
        for word in [0x0000u16, 0x1234, 0x8001, 0xFFFF] {
            let (mut cpu, mut bus) = cpu_with(&[push, pop]);
            cpu.sp = 0x1600;
            set(&mut cpu, word);
            let cycles = cpu.step(&mut bus);
            assert_eq!(cycles, 11);
            assert_eq!(cpu.sp, 0x15FE);
            set(&mut cpu, 0);
            let cycles = cpu.step(&mut bus);
            assert_eq!(cycles, 10);
            assert_eq!(get(&cpu), word, "push {push:02X} word {word:04X}");
            assert_eq!(cpu.sp, 0x1600);
        }
    }
}

#[test]
fn test_push_psw_layout() {
    // Flag byte layout: S Z 0 AC 0 P 1 CY
    let (mut cpu, mut bus) = cpu_with(&[0xF5]); // PUSH PSW
    cpu.sp = 0x1600;
    cpu.a = 0x9C;
    cpu.flags = Flags {
        z: true,
        s: false,
        p: true,
        cy: true,
        ac: false,
    };
    cpu.step(&mut bus);
    assert_eq!(bus.memory[0x15FF], 0x9C); // accumulator above the flags
    assert_eq!(bus.memory[0x15FE], 0b0100_0111); // Z | P | 1 | CY
}

#[test]
fn test_pop_psw_round_trip() {
    let (mut cpu, mut bus) = cpu_with(&[0xF5, 0xF1]); // PUSH PSW; POP PSW
    cpu.sp = 0x1600;
    cpu.a = 0x42;
    cpu.flags = Flags {
        z: false,
        s: true,
        p: false,
        cy: true,
        ac: true,
    };
    let saved = cpu.flags;
    cpu.step(&mut bus);
    cpu.a = 0;
    cpu.flags = Flags::default();
    cpu.step(&mut bus);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.flags, saved);
    assert_eq!(cpu.sp, 0x1600);
}

#[test]
fn test_call_ret_round_trip() {
    // CALL into a subroutine that returns immediately
    let (mut cpu, mut bus) = cpu_with(&[0xCD, 0x00, 0x0C]); // CALL 0C00H
    bus.memory[0x0C00] = 0xC9; // RET
    cpu.sp = 0x1600;
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0C00);
    cpu.step(&mut bus);
    assert_eq!(cpu.pc, 0x0003); // back after the CALL
    assert_eq!(cpu.sp, 0x1600);
}

#[test]
fn test_xthl_swaps_with_stack_top() {
    let (mut cpu, mut bus) = cpu_with(&[0xE3]); // XTHL
    cpu.sp = 0x1500;
    cpu.set_hl(0x1234);
    bus.memory[0x1500] = 0xCD;
    bus.memory[0x1501] = 0xAB;
    let cycles = cpu.step(&mut bus);
    assert_eq!(cycles, 18);
    assert_eq!(cpu.hl(), 0xABCD);
    assert_eq!(bus.memory[0x1500], 0x34);
    assert_eq!(bus.memory[0x1501], 0x12);
    assert_eq!(cpu.sp, 0x1500);
}

#[test]
fn test_stack_wraps_at_zero() {
    let (mut cpu, mut bus) = cpu_with(&[0xC5]); // PUSH B
    cpu.sp = 0x0001;
    cpu.set_bc(0xAABB);
    cpu.step(&mut bus);
    assert_eq!(cpu.sp, 0xFFFF);
    assert_eq!(bus.memory[0x0000], 0xAA);
    assert_eq!(bus.memory[0xFFFF], 0xBB);
}
