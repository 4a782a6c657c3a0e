//! Per-instruction text tracing and point-in-time state snapshots for the
//! nes6502 core (spec.md §4.7, §6).

#![warn(missing_docs)]

mod snapshot;
mod tracer;

pub use snapshot::{CpuSnapshot, DatapathSnapshot, DebuggerSnapshot, LinesSnapshot, MemSnapshot, Snapshot};
pub use tracer::Tracer;
