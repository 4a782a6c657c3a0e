//! nes6502 - Cycle-accurate MOS 6502 / Ricoh 2A03 CPU core.
//!
//! This crate is a thin facade over the workspace's sibling crates: the
//! bus, decode table, CPU datapath, disassembler, halt-expression
//! debugger, cycle clock, tracer/snapshot, and a small NES-shaped harness
//! that wires them together.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Harness                           │
//! │  ┌──────┐  ┌──────────┐  ┌───────────┐  ┌─────────────┐ │
//! │  │ RAM  │  │ Cpu      │  │ Debugger  │  │ Clock       │ │
//! │  │ 2KB  │  │ (6502)   │  │ (bp/halt) │  │ (pacing)    │ │
//! │  └──────┘  └──────────┘  └───────────┘  └─────────────┘ │
//! │        \________________Bus________________/            │
//! │                  (partitioned devices)                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use nes6502::Harness;
//!
//! let prg = vec![0xEAu8; 0x4000]; // 16KB of NOPs
//! let mut harness = Harness::new(prg, 1_790_000);
//! harness.power_on();
//! harness.step();
//! ```

#![warn(missing_docs)]

pub use nes6502_bus::{Bus, BusError, Device, NullDevice};
pub use nes6502_clock::{Clock, MAX_CPS, MAX_FPS, MIN_CPS, MIN_FPS};
pub use nes6502_cpu::{Cpu, InterruptKind, LatchState, Lines, Status};
pub use nes6502_debug::{describe, parse, parse_halt, ClockSample, DebugExpr, Debugger, HaltExpr, HaltExprError};
pub use nes6502_decode::{AddrMode, DecodedOpcode, Instruction, BRK_OPCODE, DECODE};
pub use nes6502_disasm::{datapath_line, instruction_line, mnemonic_of, peek_line, DisasmError, InterruptPeek};
pub use nes6502_harness::{cart_cpu_connect, cart_cpu_disconnect, Harness, RamDevice, StubCartDevice};
pub use nes6502_trace::{CpuSnapshot, DatapathSnapshot, DebuggerSnapshot, LinesSnapshot, MemSnapshot, Snapshot, Tracer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_runs_an_instruction_end_to_end() {
        let mut prg = vec![0xEAu8; 0x4000];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        let mut harness = Harness::new(prg, 1_790_000);
        harness.power_on();
        assert_eq!(harness.cpu().pc, 0x8000);
        harness.step();
        assert_eq!(harness.cpu().pc, 0x8001);
    }
}
