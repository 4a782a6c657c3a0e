//! End-to-end per-cycle scenarios exercised against a flat 64K RAM bus.

use nes6502_bus::{Bus, Device};
use nes6502_cpu::{Cpu, InterruptKind, LatchState};

struct FlatRam(Vec<u8>);

impl Device for FlatRam {
    fn read(&mut self, addr: u32) -> Option<u8> {
        self.0.get(addr as usize).copied()
    }
    fn write(&mut self, addr: u32, value: u8) -> bool {
        if let Some(slot) = self.0.get_mut(addr as usize) {
            *slot = value;
            true
        } else {
            false
        }
    }
}

fn flat_bus() -> Bus {
    let mut bus = Bus::new(16, &[0]);
    bus.set(0, Box::new(FlatRam(vec![0; 0x1_0000])));
    bus
}

fn load(bus: &mut Bus, addr: u16, bytes: &[u8]) {
    for (i, &b) in bytes.iter().enumerate() {
        bus.write(u32::from(addr) + i as u32, b);
    }
}

fn run_instruction(cpu: &mut Cpu, bus: &mut Bus) -> u32 {
    cpu.step(bus)
}

/// Holds RESET asserted for one cycle (COMMITTED and the line still low
/// must hold the CPU at T0 with no bus activity), releases it, then runs
/// the resulting 7-cycle power-on reset sequence to completion.
fn reset(cpu: &mut Cpu, bus: &mut Bus, vector: u16) {
    load(bus, 0xFFFC, &vector.to_le_bytes());
    cpu.cycle(bus); // held: COMMITTED, RESET still asserted
    cpu.set_reset(false);
    for _ in 0..7 {
        cpu.cycle(bus);
    }
    assert_eq!(cpu.pc, vector);
}

#[test]
fn adc_immediate_sets_carry_and_overflow() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.a = 0x7F;
    cpu.pc = 0x8000;
    load(&mut bus, 0x8000, &[0x69, 0x01]); // ADC #$01
    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 2);
    assert_eq!(cpu.a, 0x80);
    assert!(cpu.p.contains(nes6502_cpu::Status::V));
    assert!(cpu.p.contains(nes6502_cpu::Status::N));
    assert!(!cpu.p.contains(nes6502_cpu::Status::C));
}

#[test]
fn brk_sequence_pushes_three_bytes_and_sets_break_bit() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.s = 0xFF;
    cpu.pc = 0x8000;
    load(&mut bus, 0x8000, &[0x00]); // BRK
    load(&mut bus, 0xFFFE, &[0x00, 0x90]); // IRQ/BRK vector -> $9000
    let cycles = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles, 7);
    assert_eq!(cpu.s, 0xFC);
    assert_eq!(cpu.pc, 0x9000);
    let pushed_p = bus.read(0x0100 + u32::from(cpu.s) + 1).unwrap();
    assert_eq!(pushed_p & 0x10, 0x10, "software break sets the pushed B bit");
}

#[test]
fn nmi_hijacks_in_flight_brk_but_leaves_break_bit_set() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.s = 0xFF;
    cpu.pc = 0x8000;
    load(&mut bus, 0x8000, &[0x00]); // BRK
    load(&mut bus, 0xFFFE, &[0x00, 0x90]); // BRK/IRQ vector
    load(&mut bus, 0xFFFA, &[0x00, 0xA0]); // NMI vector

    cpu.cycle(&mut bus); // t0: fetch opcode (sync)
    cpu.cycle(&mut bus); // t1
    cpu.cycle(&mut bus); // t2: push PCH
    cpu.cycle(&mut bus); // t3: push PCL
    cpu.set_nmi(true);
    cpu.cycle(&mut bus); // t4: push P, NMI detected this cycle
    cpu.cycle(&mut bus); // t5: fetch vector low (still BRK/IRQ at this point)
    cpu.cycle(&mut bus); // t6: late poll re-check hijacks to NMI, fetch vector high

    assert_eq!(cpu.pc, 0xA000, "NMI's vector wins the hijack");
    let pushed_p = bus.read(0x0100 + u32::from(cpu.s) + 1).unwrap();
    assert_eq!(pushed_p & 0x10, 0x10, "pushed status retains the software BRK bit");
}

#[test]
fn jam_opcode_spins_with_t_frozen_at_four() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.pc = 0x8000;
    load(&mut bus, 0x8000, &[0x02]); // JAM
    for _ in 0..20 {
        cpu.cycle(&mut bus);
    }
    assert_eq!(cpu.t(), 4);
    assert!(cpu.jammed());
}

#[test]
fn indirect_jmp_reproduces_page_wrap_bug() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.pc = 0x8000;
    load(&mut bus, 0x8000, &[0x6C, 0xFF, 0x30]); // JMP ($30FF)
    load(&mut bus, 0x30FF, &[0x34]);
    load(&mut bus, 0x3000, &[0x12]); // wrapped high byte, not $3100
    load(&mut bus, 0x3100, &[0xFF]);
    run_instruction(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn absolute_indexed_read_costs_extra_cycle_only_on_page_cross() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);

    cpu.pc = 0x8000;
    cpu.x = 0x01;
    load(&mut bus, 0x8000, &[0xBD, 0xFF, 0x20]); // LDA $20FF,X -> no cross
    load(&mut bus, 0x2100, &[0x42]);
    let cycles_no_cross = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles_no_cross, 4);
    assert_eq!(cpu.a, 0x42);

    cpu.pc = 0x9000;
    cpu.x = 0x01;
    load(&mut bus, 0x9000, &[0xBD, 0xFF, 0x21]); // LDA $21FF,X -> crosses
    load(&mut bus, 0x2200, &[0x7E]);
    let cycles_cross = run_instruction(&mut cpu, &mut bus);
    assert_eq!(cycles_cross, 5);
    assert_eq!(cpu.a, 0x7E);
}

#[test]
fn taken_non_crossing_branch_delays_irq_by_one_instruction() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.pc = 0x8000;
    cpu.p.remove(nes6502_cpu::Status::I);
    cpu.p.remove(nes6502_cpu::Status::Z); // BNE taken
    load(&mut bus, 0x8000, &[0xD0, 0x02]); // BNE +2 (same page, no cross)
    load(&mut bus, 0x8004, &[0xEA]); // NOP at the branch target
    load(&mut bus, 0xFFFE, &[0x00, 0x90]);

    cpu.set_irq(true);
    run_instruction(&mut cpu, &mut bus); // branch executes without polling

    run_instruction(&mut cpu, &mut bus); // fetch must be the real NOP, not a hijacked BRK
    assert_eq!(cpu.opcode(), 0xEA, "a suppressed poll must not let IRQ hijack the branch");

    run_instruction(&mut cpu, &mut bus); // next fetch substitutes BRK now that NOP polled
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn peek_is_non_invasive() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.pc = 0x8000;
    cpu.a = 0x10;
    load(&mut bus, 0x8000, &[0x69, 0x05]); // ADC #$05

    let before = cpu.clone();
    let mut backup = cpu.clone();
    cpu.peek_start(&mut backup);
    for _ in 0..2 {
        cpu.peek(&mut bus);
    }
    cpu.peek_end(&backup);

    assert_eq!(cpu.pc, before.pc);
    assert_eq!(cpu.a, before.a);
    assert_eq!(cpu.t(), before.t());
}

#[test]
fn reset_takes_priority_and_clears_latches() {
    let mut bus = flat_bus();
    let mut cpu = Cpu::new();
    reset(&mut cpu, &mut bus, 0x8000);
    cpu.cycle(&mut bus); // flush the Serviced latch, fetch the first real opcode
    load(&mut bus, 0xFFFC, &[0x00, 0xC0]); // second reset vector -> $C000

    cpu.set_nmi(true);
    cpu.set_reset(true);
    cpu.cycle(&mut bus); // RESET edge detected alongside NMI
    cpu.set_reset(false); // release before COMMITTED would hold the CPU frozen

    let mut reached = false;
    for _ in 0..10 {
        cpu.cycle(&mut bus);
        if cpu.pc == 0xC000 {
            reached = true;
            break;
        }
    }
    assert!(reached, "RESET must win over a simultaneous NMI");
}
