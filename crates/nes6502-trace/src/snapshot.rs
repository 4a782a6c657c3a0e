//! Point-in-time, pointer-free state capture (spec.md §6 "Snapshot layout").

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use nes6502_bus::Bus;
use nes6502_cpu::{Cpu, LatchState};
use nes6502_debug::{DebugExpr, Debugger};

const RAM_SIZE: usize = 2048;
const PRG_WINDOW: usize = 6;
const VECTOR_BYTES: usize = 6;
const VECTOR_BASE: u32 = 0xFFFA;

/// Register file, mirrored from `Cpu`'s public fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CpuSnapshot {
    /// Program counter.
    pub pc: u16,
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer.
    pub s: u8,
    /// Status register bits.
    pub status: u8,
}

/// The six lines the CPU exposes to a front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinesSnapshot {
    /// IRQ line asserted.
    pub irq: bool,
    /// NMI line asserted.
    pub nmi: bool,
    /// RESET line asserted.
    pub reset: bool,
    /// RDY line (false freezes the CPU).
    pub ready: bool,
    /// Last cycle's R/W line (true = read).
    pub readwrite: bool,
    /// Whether the last cycle was an opcode fetch.
    pub sync: bool,
}

/// Internal datapath latches, useful for a cycle-level debugger view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DatapathSnapshot {
    /// Last address driven on the address bus.
    pub addressbus: u16,
    /// Last value driven on the data bus.
    pub databus: u8,
    /// Low byte of the effective-address latch.
    pub addrlow_latch: u8,
    /// High byte of the effective-address latch.
    pub addrhigh_latch: u8,
    /// Indexed-addressing carry scratch latch.
    pub addrcarry_latch: u8,
    /// Address the currently executing instruction was fetched from.
    pub current_instruction: u16,
    /// Cycle index within the current instruction (`-1` when idle).
    pub exec_cycle: i8,
    /// Opcode byte of the current instruction.
    pub opcode: u8,
    /// Whether the most recent bus access faulted.
    pub busfault: bool,
    /// Whether the CPU is spinning on a JAM opcode.
    pub jammed: bool,
    /// IRQ line latch state.
    pub irq_state: LatchState,
    /// NMI line latch state.
    pub nmi_state: LatchState,
    /// RESET line latch state.
    pub res_state: LatchState,
}

/// Debugger-visible state: what halted the CPU, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DebuggerSnapshot {
    /// Index of the breakpoint that halted the CPU, if any.
    pub halted_at: Option<usize>,
    /// Active RESET-vector override, if any.
    pub resvector_override: Option<u16>,
    /// Human-readable description of the breakpoint that halted, if any.
    pub break_condition: Option<String>,
}

/// Memory regions of interest, copied out via `Bus::dma`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MemSnapshot {
    /// The 2 KB internal RAM.
    pub ram: Vec<u8>,
    /// Up to 6 bytes of program ROM centered on `cpu.pc`.
    pub currprg: Vec<u8>,
    /// Bytes actually copied into `currprg` (it may run off the end of the
    /// bus near `$FFFF`).
    pub prglength: usize,
    /// `$FFFA..=$FFFF`: NMI, RESET, and IRQ/BRK vectors back to back.
    pub vectors: Vec<u8>,
}

/// A complete, pointer-free copy of one instant of emulation state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    /// Register file.
    pub cpu: CpuSnapshot,
    /// Interrupt/RDY/R-W/sync lines.
    pub lines: LinesSnapshot,
    /// Cycle-level datapath latches.
    pub datapath: DatapathSnapshot,
    /// Debugger halt state.
    pub debugger: DebuggerSnapshot,
    /// Memory regions of interest.
    pub mem: MemSnapshot,
}

impl Snapshot {
    /// Capture the current state of `cpu`, `bus`, and `debugger`. Performs
    /// bulk `dma` reads, never plain `read`s, so nothing with side-effecting
    /// reads is disturbed.
    #[must_use]
    pub fn capture(cpu: &Cpu, bus: &mut Bus, debugger: &Debugger) -> Self {
        let mut ram = vec![0u8; RAM_SIZE];
        bus.dma(0, RAM_SIZE, &mut ram);

        let prg_start = cpu.pc.saturating_sub(3);
        let mut currprg = vec![0u8; PRG_WINDOW];
        let prglength = bus.dma(u32::from(prg_start), PRG_WINDOW, &mut currprg);
        currprg.truncate(prglength);

        let mut vectors = vec![0u8; VECTOR_BYTES];
        bus.dma(VECTOR_BASE, VECTOR_BYTES, &mut vectors);

        let break_condition = debugger
            .halted_at()
            .and_then(|i| debugger.bp_at(i))
            .map(|h| DebugExpr::Halt(h).desc());

        Self {
            cpu: CpuSnapshot {
                pc: cpu.pc,
                a: cpu.a,
                x: cpu.x,
                y: cpu.y,
                s: cpu.s,
                status: cpu.p.bits(),
            },
            lines: LinesSnapshot {
                irq: cpu.irq_asserted(),
                nmi: cpu.nmi_asserted(),
                reset: cpu.reset_asserted(),
                ready: cpu.is_ready(),
                readwrite: cpu.rw,
                sync: cpu.sync,
            },
            datapath: DatapathSnapshot {
                addressbus: cpu.addr_bus,
                databus: cpu.data_bus,
                addrlow_latch: cpu.adl_latch(),
                addrhigh_latch: cpu.adh_latch(),
                addrcarry_latch: cpu.adc_latch(),
                current_instruction: cpu.addrinst,
                exec_cycle: cpu.t(),
                opcode: cpu.opcode(),
                busfault: bus.faulted(),
                jammed: cpu.jammed(),
                irq_state: cpu.lines().irq,
                nmi_state: cpu.lines().nmi,
                res_state: cpu.lines().reset,
            },
            debugger: DebuggerSnapshot {
                halted_at: debugger.halted_at(),
                resvector_override: debugger.vector_override(),
                break_condition,
            },
            mem: MemSnapshot { ram, currprg, prglength, vectors },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nes6502_bus::Device;

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

    #[test]
    fn captures_register_file_and_vectors() {
        let mut bus = Bus::new(16, &[0]);
        bus.set(0, Box::new(FlatRam(vec![0xEE; 0x1_0000])));
        let cpu = Cpu::new();
        let debugger = Debugger::new();
        let snap = Snapshot::capture(&cpu, &mut bus, &debugger);
        assert_eq!(snap.mem.ram.len(), RAM_SIZE);
        assert_eq!(snap.mem.vectors.len(), VECTOR_BYTES);
        assert_eq!(snap.cpu.s, cpu.s);
        assert!(snap.debugger.halted_at.is_none());
    }
}
