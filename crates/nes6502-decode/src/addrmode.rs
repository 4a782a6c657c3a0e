//! Addressing modes and their byte counts / display format strings.

/// Exhaustive list of 6502 addressing modes, per spec.md §4.2. Distinct
/// enum slots for modes that share a byte layout but render differently
/// (e.g. `Jsr`/`Jabs` are both 3-byte absolute, but one is a call and the
/// other a jump) mirror the original `DEC_ADDRMODE_X` table rather than
/// collapsing them, so disassembly and cycle tables can discriminate by
/// mode alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum AddrMode {
    Imp,
    Imm,
    Zp,
    Zpx,
    Zpy,
    Indx,
    Indy,
    Abs,
    Absx,
    Absy,
    /// Stack push (PHA, PHP).
    Psh,
    /// Stack pull (PLA, PLP).
    Pll,
    /// Relative branch.
    Bch,
    Jsr,
    Rts,
    /// Absolute jump (JMP abs).
    Jabs,
    /// Indirect jump (JMP ind), reproduces the page-wrap bug.
    Jind,
    Brk,
    Rti,
    /// JAM/KIL opcodes: fetch then spin.
    Jam,
}

impl AddrMode {
    /// Total instruction length in bytes, including the opcode byte.
    #[must_use]
    pub const fn byte_count(self) -> u8 {
        use AddrMode::{
            Abs, Absx, Absy, Bch, Brk, Imm, Imp, Indx, Indy, Jabs, Jam, Jind, Jsr, Pll, Psh, Rti,
            Rts, Zp, Zpx, Zpy,
        };
        match self {
            Imp | Psh | Pll | Rts | Brk | Rti | Jam => 1,
            Imm | Zp | Zpx | Zpy | Indx | Indy | Bch => 2,
            Abs | Absx | Absy | Jsr | Jabs | Jind => 3,
        }
    }

    /// Short mode label used by the disassembler's "cycle 0" datapath line
    /// (spec.md §4.2), e.g. `"zp,X"`, `"(zp),Y"`, `"imp"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        use AddrMode::{
            Abs, Absx, Absy, Bch, Brk, Imm, Imp, Indx, Indy, Jabs, Jam, Jind, Jsr, Pll, Psh, Rti,
            Rts, Zp, Zpx, Zpy,
        };
        match self {
            Imp | Psh | Pll | Rts | Brk | Rti | Jam => "imp",
            Imm => "imm",
            Zp => "zp",
            Zpx => "zp,X",
            Zpy => "zp,Y",
            Indx => "(zp,X)",
            Indy => "(zp),Y",
            Abs | Jsr | Jabs => "abs",
            Absx => "abs,X",
            Absy => "abs,Y",
            Jind => "(abs)",
            Bch => "rel",
        }
    }
}
