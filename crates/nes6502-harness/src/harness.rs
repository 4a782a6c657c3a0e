//! NES-shaped harness wiring CPU, RAM, bus, cartridge, debugger, clock, and
//! tracer together (spec.md §4.8 "added", §5, §6 "Cartridge collaborator").

use std::fs::File;

use nes6502_bus::Bus;
use nes6502_clock::Clock;
use nes6502_cpu::Cpu;
use nes6502_debug::{ClockSample, Debugger};
use nes6502_decode::DECODE;
use nes6502_trace::Tracer;

use crate::devices::{cart_cpu_connect, cart_cpu_disconnect, RamDevice, StubCartDevice};

const RAM_BASE: u32 = 0x0000;
const OPEN_BUS_BASE: u32 = 0x2000;
const CART_BASE: u32 = 0x8000;

struct Sample {
    cycles: u64,
    secs: f64,
}

impl ClockSample for Sample {
    fn runtime_secs(&self) -> f64 {
        self.secs
    }

    fn total_cycles(&self) -> u64 {
        self.cycles
    }
}

/// Owns CPU, RAM, bus, cartridge, debugger, and cycle clock; this is the
/// non-owning-debugger/owning-CPU split spec.md §4 describes for the NES
/// harness, collapsed into one struct since nothing else needs to share
/// the debugger here.
pub struct Harness {
    cpu: Cpu,
    bus: Bus,
    debugger: Debugger,
    clock: Clock,
    tracer: Option<Tracer<File>>,
    total_cycles: u64,
    instr_start_cycle: u64,
}

impl Harness {
    /// Build a harness with `prg` (16 KB or 32 KB) wired in at `$8000` and
    /// 2 KB of mirrored RAM at `$0000-$1FFF`, ticking at `rate` cycles per
    /// second. The CPU is constructed but not yet run through its
    /// power-on reset; call [`Harness::power_on`] before stepping.
    ///
    /// # Panics
    ///
    /// Panics if `prg` is not 16 KB or 32 KB (see [`StubCartDevice::new`]).
    #[must_use]
    pub fn new(prg: Vec<u8>, rate: u32) -> Self {
        let mut bus = Bus::new(16, &[RAM_BASE, OPEN_BUS_BASE, CART_BASE]);
        bus.set(RAM_BASE, Box::new(RamDevice::new()));
        let cart = StubCartDevice::new(prg, CART_BASE);
        cart_cpu_connect(cart, &mut bus, CART_BASE);

        Self {
            cpu: Cpu::new(),
            bus,
            debugger: Debugger::new(),
            clock: Clock::new(rate),
            tracer: None,
            total_cycles: 0,
            instr_start_cycle: 0,
        }
    }

    /// Swap out the installed cartridge for `prg`, reconnecting at the
    /// same base address (spec.md §6 "Cartridge collaborator").
    ///
    /// # Panics
    ///
    /// Panics if `prg` is not 16 KB or 32 KB.
    pub fn load_cart(&mut self, prg: Vec<u8>) {
        cart_cpu_disconnect(&mut self.bus, CART_BASE);
        let cart = StubCartDevice::new(prg, CART_BASE);
        cart_cpu_connect(cart, &mut self.bus, CART_BASE);
    }

    /// Give the harness ownership of a trace file. Every instruction the
    /// harness retires from this point on is appended to it.
    pub fn attach_tracer(&mut self, file: File) {
        self.tracer = Some(Tracer::new(file));
    }

    /// Drop the tracer, if any was attached.
    pub fn detach_tracer(&mut self) {
        self.tracer = None;
    }

    /// Hold RESET asserted for one cycle (the datapath refuses to begin
    /// servicing while the line is still low), release it, then run the
    /// resulting 7-cycle power-on reset sequence to completion.
    pub fn power_on(&mut self) -> u32 {
        self.cpu.set_reset(true);
        let held = u32::from(self.cpu.cycle(&mut self.bus));
        self.total_cycles += u64::from(held);
        self.cpu.set_reset(false);
        held + self.step()
    }

    /// Read-only access to the CPU's register file and datapath state.
    #[must_use]
    pub const fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Mutable access to the bus, e.g. for a snapshot's `dma` reads.
    #[must_use]
    pub fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Read-only access to the debugger's breakpoint collection.
    #[must_use]
    pub const fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Mutable access to the debugger, for adding/removing breakpoints and
    /// vector overrides.
    pub fn debugger_mut(&mut self) -> &mut Debugger {
        &mut self.debugger
    }

    /// Total CPU cycles run since construction.
    #[must_use]
    pub const fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Advance exactly one CPU cycle, checking debugger breakpoints and
    /// emitting a trace line when an instruction commits.
    pub fn cycle(&mut self) -> u8 {
        if self.cpu.sync {
            self.instr_start_cycle = self.total_cycles;
        }
        let consumed = self.cpu.cycle(&mut self.bus);
        self.total_cycles += u64::from(consumed);

        if consumed > 0 {
            let sample = Sample { cycles: self.total_cycles, secs: self.clock.runtime_secs() };
            self.debugger.check(&sample, &mut self.cpu);
        }

        if self.cpu.t() == -1 {
            self.emit_trace();
        }

        consumed
    }

    /// Run cycles until the in-flight instruction commits, returning the
    /// number of cycles consumed.
    pub fn step(&mut self) -> u32 {
        let mut consumed = 0u32;
        loop {
            consumed += u32::from(self.cycle());
            if self.cpu.t() == -1 {
                break;
            }
        }
        consumed
    }

    /// Pace execution against wall-clock time: bank one frame's worth of
    /// elapsed time into a cycle budget, then spend it one `cycle()` at a
    /// time. Returns the number of cycles actually run.
    pub fn run_frame(&mut self) -> u64 {
        self.clock.tick_start(false);
        let mut ran = 0u64;
        while self.clock.consume_cycle() {
            self.cycle();
            ran += 1;
        }
        self.clock.tick_end();
        ran
    }

    fn emit_trace(&mut self) {
        let Some(tracer) = &mut self.tracer else { return };
        let opcode = self.cpu.opcode();
        let len = DECODE[opcode as usize].mode.byte_count() as usize;
        let mut bytes = vec![0u8; len];
        self.bus.dma(u32::from(self.cpu.addrinst), len, &mut bytes);
        let _ = tracer.trace(self.instr_start_cycle, &self.cpu, &bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nop_rom() -> Vec<u8> {
        let mut prg = vec![0xEA; 0x4000]; // all NOP
        // reset vector -> $8000
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        prg
    }

    #[test]
    fn power_on_loads_reset_vector_into_pc() {
        let mut harness = Harness::new(nop_rom(), 1_790_000);
        harness.power_on();
        assert_eq!(harness.cpu().pc, 0x8000);
    }

    #[test]
    fn step_retires_one_nop_per_two_cycles() {
        let mut harness = Harness::new(nop_rom(), 1_790_000);
        harness.power_on();
        let before = harness.total_cycles();
        let consumed = harness.step();
        assert_eq!(consumed, 2);
        assert_eq!(harness.total_cycles(), before + 2);
        assert_eq!(harness.cpu().pc, 0x8001);
    }

    #[test]
    fn address_breakpoint_halts_cpu() {
        let mut harness = Harness::new(nop_rom(), 1_790_000);
        harness.power_on();
        harness.debugger_mut().bp_add(nes6502_debug::HaltExpr::Addr(0x8002));
        // Bounded cycle-by-cycle loop, not step(): once the breakpoint
        // clears RDY the in-flight fetch can never reach t == -1, so
        // looping step() here would spin forever.
        for _ in 0..20 {
            if !harness.cpu().is_ready() {
                break;
            }
            harness.cycle();
        }
        assert!(!harness.cpu().is_ready());
        assert_eq!(harness.cpu().addrinst, 0x8002, "halts on the breakpoint's own fetch, not one instruction early");
        assert_eq!(harness.debugger().halted_at(), Some(0));
    }

    #[test]
    fn tracer_records_retired_instructions() {
        let mut harness = Harness::new(nop_rom(), 1_790_000);
        harness.power_on();
        let tmp = tempfile_vec();
        harness.attach_tracer(tmp);
        harness.step();
        harness.step();
    }

    fn tempfile_vec() -> File {
        let path = std::env::temp_dir().join(format!("nes6502-harness-test-{:?}.trace", std::thread::current().id()));
        File::create(path).unwrap()
    }
}
