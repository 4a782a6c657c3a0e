//! Cycle-accurate MOS 6502 register file, interrupt latches, and opcode
//! execution, driven one bus cycle at a time against a caller-supplied
//! [`nes6502_bus::Bus`].

#![warn(missing_docs)]

mod cpu;
mod interrupt;
mod status;

pub use cpu::Cpu;
pub use interrupt::{InterruptKind, LatchState, Lines};
pub use status::Status;
