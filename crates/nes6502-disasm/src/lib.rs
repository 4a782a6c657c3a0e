//! Instruction-line, datapath-line, and peek-line rendering for the 6502
//! decode table (spec.md §4.2). Pure formatting: every function here takes
//! already-fetched bytes or already-resolved addresses and builds text,
//! never touching a bus itself.

#![warn(missing_docs)]

use nes6502_decode::{AddrMode, DecodedOpcode, DECODE};
use thiserror::Error;

/// Errors the disassembler can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisasmError {
    /// Not enough bytes were supplied to cover the decoded instruction's
    /// length.
    #[error("insufficient bytes to disassemble instruction")]
    Eof,
    /// The caller asked for a rendering this addressing mode cannot
    /// produce (e.g. a final push/pull line for a non-push/pull mode).
    #[error("addressing mode invalid for this rendering")]
    InvAddrMode,
}

/// Render the full instruction line: `AAAA: BB BB BB  MNE operand`.
/// Unofficial opcodes get `*MNE` in place of the two leading spaces.
pub fn instruction_line(addr: u16, bytes: &[u8]) -> Result<String, DisasmError> {
    let opcode = *bytes.first().ok_or(DisasmError::Eof)?;
    let entry = DECODE[opcode as usize];
    let len = entry.mode.byte_count() as usize;
    if bytes.len() < len {
        return Err(DisasmError::Eof);
    }

    let mut byte_cols = String::new();
    for i in 0..3 {
        if i > 0 {
            byte_cols.push(' ');
        }
        if i < len {
            byte_cols.push_str(&format!("{:02X}", bytes[i]));
        } else {
            byte_cols.push_str("  ");
        }
    }

    let prefix = if entry.unofficial { " *" } else { "  " };
    let operand = full_operand(entry.mode, addr, &bytes[1..len]);
    Ok(format!(
        "{addr:04X}: {byte_cols}{prefix}{}{}{operand}",
        entry.instruction.mnemonic(),
        if operand.is_empty() { "" } else { " " },
    ))
}

/// Render one cycle's datapath line. `bytes_fetched` is the opcode plus
/// however many operand bytes have been latched so far this instruction.
/// `is_final_cycle` marks the last cycle of a branch/push/pull, which
/// prints just the mnemonic with a trailing space instead of an operand.
pub fn datapath_line(
    entry: DecodedOpcode,
    bytes_fetched: &[u8],
    is_final_cycle: bool,
) -> Result<String, DisasmError> {
    let mnemonic = entry.instruction.mnemonic();
    if bytes_fetched.is_empty() {
        return Err(DisasmError::Eof);
    }
    if bytes_fetched.len() == 1 {
        return Ok(format!("{mnemonic} {}", entry.mode.label()));
    }
    if is_final_cycle {
        return match entry.mode {
            AddrMode::Bch | AddrMode::Psh | AddrMode::Pll => Ok(format!("{mnemonic} ")),
            _ => Err(DisasmError::InvAddrMode),
        };
    }
    let operand = partial_operand(entry.mode, &bytes_fetched[1..]);
    Ok(format!("{mnemonic} {operand}"))
}

/// Which interrupt vector a BRK-shaped sequence's peek line is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptPeek {
    /// Hardware IRQ, vector `$FFFE`.
    Irq,
    /// NMI, vector `$FFFA`.
    Nmi,
    /// RESET, vector `$FFFC`; `overridden` marks an active debugger
    /// vector override (spec.md §4.5), rendered as `!VVVV`.
    Reset {
        /// Whether a debugger vector override is currently active.
        overridden: bool,
    },
}

impl InterruptPeek {
    const fn label(self) -> &'static str {
        match self {
            Self::Irq => "IRQ",
            Self::Nmi => "NMI",
            Self::Reset { .. } => "RES",
        }
    }
}

/// Render the peek line: the effective-address chain a mode resolves to,
/// ending in the memory value it reads (spec.md §4.2).
#[allow(clippy::too_many_arguments)]
pub fn peek_line(
    mode: AddrMode,
    ptr_addr: Option<u16>,
    eff_addr: Option<u16>,
    value: Option<u8>,
    interrupt: Option<(InterruptPeek, u16)>,
) -> Result<String, DisasmError> {
    if let Some((kind, vector)) = interrupt {
        let vector_str = match kind {
            InterruptPeek::Reset { overridden: true } => format!("!{vector:04X}"),
            _ => format!("{vector:04X}"),
        };
        return Ok(format!("{} > {vector_str}", kind.label()));
    }
    match mode {
        AddrMode::Imm => Ok(String::new()),
        AddrMode::Zp => Ok(format!("= {:02X}", value.ok_or(DisasmError::InvAddrMode)?)),
        AddrMode::Zpx | AddrMode::Zpy => Ok(format!(
            "@ {:02X} = {:02X}",
            eff_addr.ok_or(DisasmError::InvAddrMode)? as u8,
            value.ok_or(DisasmError::InvAddrMode)?
        )),
        AddrMode::Indx => Ok(format!(
            "@ {:02X} > {:04X} = {:02X}",
            ptr_addr.ok_or(DisasmError::InvAddrMode)? as u8,
            eff_addr.ok_or(DisasmError::InvAddrMode)?,
            value.ok_or(DisasmError::InvAddrMode)?
        )),
        AddrMode::Indy => Ok(format!(
            "> {:04X} @ {:04X} = {:02X}",
            ptr_addr.ok_or(DisasmError::InvAddrMode)?,
            eff_addr.ok_or(DisasmError::InvAddrMode)?,
            value.ok_or(DisasmError::InvAddrMode)?
        )),
        AddrMode::Absx | AddrMode::Absy => Ok(format!(
            "@ {:04X} = {:02X}",
            eff_addr.ok_or(DisasmError::InvAddrMode)?,
            value.ok_or(DisasmError::InvAddrMode)?
        )),
        AddrMode::Jind => Ok(format!("> {:04X}", eff_addr.ok_or(DisasmError::InvAddrMode)?)),
        AddrMode::Bch => Ok(format!("@ {:04X}", eff_addr.ok_or(DisasmError::InvAddrMode)?)),
        _ => Ok(String::new()),
    }
}

fn full_operand(mode: AddrMode, addr: u16, op: &[u8]) -> String {
    match mode {
        AddrMode::Imp | AddrMode::Psh | AddrMode::Pll | AddrMode::Rts | AddrMode::Brk | AddrMode::Rti | AddrMode::Jam => {
            String::new()
        }
        AddrMode::Imm => format!("#${:02X}", op[0]),
        AddrMode::Zp => format!("${:02X}", op[0]),
        AddrMode::Zpx => format!("${:02X},X", op[0]),
        AddrMode::Zpy => format!("${:02X},Y", op[0]),
        AddrMode::Indx => format!("(${:02X},X)", op[0]),
        AddrMode::Indy => format!("(${:02X}),Y", op[0]),
        AddrMode::Abs | AddrMode::Jsr | AddrMode::Jabs => format!("${:02X}{:02X}", op[1], op[0]),
        AddrMode::Absx => format!("${:02X}{:02X},X", op[1], op[0]),
        AddrMode::Absy => format!("${:02X}{:02X},Y", op[1], op[0]),
        AddrMode::Jind => format!("(${:02X}{:02X})", op[1], op[0]),
        AddrMode::Bch => {
            let offset = op[0] as i8;
            let target = addr.wrapping_add(2).wrapping_add(offset as i16 as u16);
            format!("${target:04X}")
        }
    }
}

fn partial_operand(mode: AddrMode, op: &[u8]) -> String {
    match mode {
        AddrMode::Imp | AddrMode::Psh | AddrMode::Pll | AddrMode::Rts | AddrMode::Brk | AddrMode::Rti | AddrMode::Jam => {
            String::new()
        }
        AddrMode::Imm => format!("#${:02X}", op[0]),
        AddrMode::Zp => format!("${:02X}", op[0]),
        AddrMode::Zpx => format!("${:02X},X", op[0]),
        AddrMode::Zpy => format!("${:02X},Y", op[0]),
        AddrMode::Indx => format!("(${:02X},X)", op[0]),
        AddrMode::Indy => format!("(${:02X}),Y", op[0]),
        AddrMode::Bch => format!("${:02X}", op[0]),
        AddrMode::Abs | AddrMode::Jsr | AddrMode::Jabs if op.len() < 2 => format!("${:02X}", op[0]),
        AddrMode::Abs | AddrMode::Jsr | AddrMode::Jabs => format!("${:02X}{:02X}", op[1], op[0]),
        AddrMode::Absx if op.len() < 2 => format!("${:02X},X", op[0]),
        AddrMode::Absx => format!("${:02X}{:02X},X", op[1], op[0]),
        AddrMode::Absy if op.len() < 2 => format!("${:02X},Y", op[0]),
        AddrMode::Absy => format!("${:02X}{:02X},Y", op[1], op[0]),
        AddrMode::Jind if op.len() < 2 => format!("(${:02X})", op[0]),
        AddrMode::Jind => format!("(${:02X}{:02X})", op[1], op[0]),
    }
}

/// Mnemonic text for a raw opcode byte, without decoding the full entry.
#[must_use]
pub fn mnemonic_of(opcode: u8) -> &'static str {
    DECODE[opcode as usize].instruction.mnemonic()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_line_renders_official_opcode() {
        let line = instruction_line(0x8000, &[0xA9, 0x05]).unwrap();
        assert_eq!(line, "8000: A9 05     LDA #$05");
    }

    #[test]
    fn instruction_line_marks_unofficial_opcode() {
        let line = instruction_line(0x8000, &[0xA3, 0x10]).unwrap();
        assert_eq!(line, "8000: A3 10    *LAX ($10,X)");
    }

    #[test]
    fn instruction_line_reports_eof_on_truncated_operand() {
        assert_eq!(instruction_line(0x8000, &[0xAD, 0x01]), Err(DisasmError::Eof));
    }

    #[test]
    fn branch_operand_computes_target_from_next_instruction() {
        let line = instruction_line(0x8000, &[0xD0, 0x02]).unwrap();
        assert!(line.ends_with("BNE $8004"), "{line}");
    }

    #[test]
    fn datapath_line_cycle_zero_shows_mode_label() {
        let entry = DECODE[0xBD]; // LDA abs,X
        let line = datapath_line(entry, &[0xBD], false).unwrap();
        assert_eq!(line, "LDA abs,X");
    }

    #[test]
    fn datapath_line_elides_high_byte_mid_fetch() {
        let entry = DECODE[0xBD];
        let line = datapath_line(entry, &[0xBD, 0x34], false).unwrap();
        assert_eq!(line, "LDA $34,X");
    }

    #[test]
    fn peek_line_formats_indirect_indexed_chain() {
        let line = peek_line(AddrMode::Indy, Some(0x0020), Some(0x1234), Some(0x42), None).unwrap();
        assert_eq!(line, "> 0020 @ 1234 = 42");
    }

    #[test]
    fn peek_line_formats_reset_override() {
        let line = peek_line(
            AddrMode::Brk,
            None,
            None,
            None,
            Some((InterruptPeek::Reset { overridden: true }, 0x1234)),
        )
        .unwrap();
        assert_eq!(line, "RES > !1234");
    }
}
