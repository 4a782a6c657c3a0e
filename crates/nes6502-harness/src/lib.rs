//! NES-shaped harness: wires the CPU core to 2 KB of mirrored RAM, a
//! fixed-mapping cartridge stand-in, the breakpoint debugger, the cycle
//! clock, and an instruction tracer (spec.md §4.8 "added").

#![warn(missing_docs)]

mod devices;
mod harness;

pub use devices::{cart_cpu_connect, cart_cpu_disconnect, RamDevice, StubCartDevice};
pub use harness::Harness;
