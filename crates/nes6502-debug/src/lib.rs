//! Halt-expression parser and per-cycle breakpoint debugger for the
//! nes6502 core.

#![warn(missing_docs)]

mod debugger;
mod haltexpr;

pub use debugger::{ClockSample, Debugger};
pub use haltexpr::{describe, parse, parse_halt, DebugExpr, HaltExpr, HaltExprError};
