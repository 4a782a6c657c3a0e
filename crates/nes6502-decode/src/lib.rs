//! The constant 256-entry 6502 opcode decode table.
//!
//! `DECODE[opcode as usize]` gives the `{instruction, mode, unofficial}`
//! triple for every opcode byte; the table is total (every byte decodes to
//! something — undefined slots are `Instruction::Udf`, `AddrMode::Imp`).

#![warn(missing_docs)]

mod addrmode;
mod instruction;

pub use addrmode::AddrMode;
pub use instruction::Instruction;

/// One decode-table entry (spec.md §3 "Decoded instruction").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedOpcode {
    /// The opcode byte this entry describes.
    pub opcode: u8,
    /// Decoded instruction mnemonic.
    pub instruction: Instruction,
    /// Decoded addressing mode.
    pub mode: AddrMode,
    /// Whether this is an undocumented/unofficial 6502 opcode.
    pub unofficial: bool,
}

/// Opcode byte used for software `BRK` and for interrupt-substituted
/// opcode fetches (spec.md §4.3 step 6: "substitute opcode `$00`").
pub const BRK_OPCODE: u8 = 0x00;

/// The complete, exhaustive 256-entry decode table.
pub const DECODE: [DecodedOpcode; 256] = build_table();

const fn entry(opcode: u8, instruction: Instruction, mode: AddrMode, unofficial: bool) -> DecodedOpcode {
    DecodedOpcode { opcode, instruction, mode, unofficial }
}

const fn decode_one(opcode: u8) -> DecodedOpcode {
    use AddrMode::{Abs, Absx, Absy, Bch, Brk, Imm, Imp, Indx, Indy, Jabs, Jam, Jind, Jsr, Pll, Psh, Rti, Rts, Zp, Zpx, Zpy};
    use Instruction::{
        Adc, Alr, And, Ane, Anc, Arr, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk as IBrk, Bvc,
        Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Isc,
        Jam as IJam, Jmp, Jsr as IJsr, Las, Lax, Lda, Ldx, Ldy, Lsr, Lxa, Nop, Ora, Pha, Php, Pla,
        Plp, Rla, Rol, Ror, Rra, Rti as IRti, Rts as IRts, Sax, Sbc, Sbx, Sec, Sed, Sei, Sha, Shx,
        Shy, Slo, Sre, Sta, Stx, Sty, Tas, Tax, Tay, Tsx, Txa, Txs, Tya, Udf,
    };
    let (inst, mode, unofficial) = match opcode {
        0x00 => (IBrk, Brk, false),
        0x01 => (Ora, Indx, false),
        0x02 => (IJam, Jam, true),
        0x03 => (Slo, Indx, true),
        0x04 => (Nop, Zp, true),
        0x05 => (Ora, Zp, false),
        0x06 => (Asl, Zp, false),
        0x07 => (Slo, Zp, true),
        0x08 => (Php, Psh, false),
        0x09 => (Ora, Imm, false),
        0x0A => (Asl, Imp, false),
        0x0B => (Anc, Imm, true),
        0x0C => (Nop, Abs, true),
        0x0D => (Ora, Abs, false),
        0x0E => (Asl, Abs, false),
        0x0F => (Slo, Abs, true),

        0x10 => (Bpl, Bch, false),
        0x11 => (Ora, Indy, false),
        0x12 => (IJam, Jam, true),
        0x13 => (Slo, Indy, true),
        0x14 => (Nop, Zpx, true),
        0x15 => (Ora, Zpx, false),
        0x16 => (Asl, Zpx, false),
        0x17 => (Slo, Zpx, true),
        0x18 => (Clc, Imp, false),
        0x19 => (Ora, Absy, false),
        0x1A => (Nop, Imp, true),
        0x1B => (Slo, Absy, true),
        0x1C => (Nop, Absx, true),
        0x1D => (Ora, Absx, false),
        0x1E => (Asl, Absx, false),
        0x1F => (Slo, Absx, true),

        0x20 => (IJsr, Jsr, false),
        0x21 => (And, Indx, false),
        0x22 => (IJam, Jam, true),
        0x23 => (Rla, Indx, true),
        0x24 => (Bit, Zp, false),
        0x25 => (And, Zp, false),
        0x26 => (Rol, Zp, false),
        0x27 => (Rla, Zp, true),
        0x28 => (Plp, Pll, false),
        0x29 => (And, Imm, false),
        0x2A => (Rol, Imp, false),
        0x2B => (Anc, Imm, true),
        0x2C => (Bit, Abs, false),
        0x2D => (And, Abs, false),
        0x2E => (Rol, Abs, false),
        0x2F => (Rla, Abs, true),

        0x30 => (Bmi, Bch, false),
        0x31 => (And, Indy, false),
        0x32 => (IJam, Jam, true),
        0x33 => (Rla, Indy, true),
        0x34 => (Nop, Zpx, true),
        0x35 => (And, Zpx, false),
        0x36 => (Rol, Zpx, false),
        0x37 => (Rla, Zpx, true),
        0x38 => (Sec, Imp, false),
        0x39 => (And, Absy, false),
        0x3A => (Nop, Imp, true),
        0x3B => (Rla, Absy, true),
        0x3C => (Nop, Absx, true),
        0x3D => (And, Absx, false),
        0x3E => (Rol, Absx, false),
        0x3F => (Rla, Absx, true),

        0x40 => (IRti, Rti, false),
        0x41 => (Eor, Indx, false),
        0x42 => (IJam, Jam, true),
        0x43 => (Sre, Indx, true),
        0x44 => (Nop, Zp, true),
        0x45 => (Eor, Zp, false),
        0x46 => (Lsr, Zp, false),
        0x47 => (Sre, Zp, true),
        0x48 => (Pha, Psh, false),
        0x49 => (Eor, Imm, false),
        0x4A => (Lsr, Imp, false),
        0x4B => (Alr, Imm, true),
        0x4C => (Jmp, Jabs, false),
        0x4D => (Eor, Abs, false),
        0x4E => (Lsr, Abs, false),
        0x4F => (Sre, Abs, true),

        0x50 => (Bvc, Bch, false),
        0x51 => (Eor, Indy, false),
        0x52 => (IJam, Jam, true),
        0x53 => (Sre, Indy, true),
        0x54 => (Nop, Zpx, true),
        0x55 => (Eor, Zpx, false),
        0x56 => (Lsr, Zpx, false),
        0x57 => (Sre, Zpx, true),
        0x58 => (Cli, Imp, false),
        0x59 => (Eor, Absy, false),
        0x5A => (Nop, Imp, true),
        0x5B => (Sre, Absy, true),
        0x5C => (Nop, Absx, true),
        0x5D => (Eor, Absx, false),
        0x5E => (Lsr, Absx, false),
        0x5F => (Sre, Absx, true),

        0x60 => (IRts, Rts, false),
        0x61 => (Adc, Indx, false),
        0x62 => (IJam, Jam, true),
        0x63 => (Rra, Indx, true),
        0x64 => (Nop, Zp, true),
        0x65 => (Adc, Zp, false),
        0x66 => (Ror, Zp, false),
        0x67 => (Rra, Zp, true),
        0x68 => (Pla, Pll, false),
        0x69 => (Adc, Imm, false),
        0x6A => (Ror, Imp, false),
        0x6B => (Arr, Imm, true),
        0x6C => (Jmp, Jind, false),
        0x6D => (Adc, Abs, false),
        0x6E => (Ror, Abs, false),
        0x6F => (Rra, Abs, true),

        0x70 => (Bvs, Bch, false),
        0x71 => (Adc, Indy, false),
        0x72 => (IJam, Jam, true),
        0x73 => (Rra, Indy, true),
        0x74 => (Nop, Zpx, true),
        0x75 => (Adc, Zpx, false),
        0x76 => (Ror, Zpx, false),
        0x77 => (Rra, Zpx, true),
        0x78 => (Sei, Imp, false),
        0x79 => (Adc, Absy, false),
        0x7A => (Nop, Imp, true),
        0x7B => (Rra, Absy, true),
        0x7C => (Nop, Absx, true),
        0x7D => (Adc, Absx, false),
        0x7E => (Ror, Absx, false),
        0x7F => (Rra, Absx, true),

        0x80 => (Nop, Imm, true),
        0x81 => (Sta, Indx, false),
        0x82 => (Nop, Imm, true),
        0x83 => (Sax, Indx, true),
        0x84 => (Sty, Zp, false),
        0x85 => (Sta, Zp, false),
        0x86 => (Stx, Zp, false),
        0x87 => (Sax, Zp, true),
        0x88 => (Dey, Imp, false),
        0x89 => (Nop, Imm, true),
        0x8A => (Txa, Imp, false),
        0x8B => (Ane, Imm, true),
        0x8C => (Sty, Abs, false),
        0x8D => (Sta, Abs, false),
        0x8E => (Stx, Abs, false),
        0x8F => (Sax, Abs, true),

        0x90 => (Bcc, Bch, false),
        0x91 => (Sta, Indy, false),
        0x92 => (IJam, Jam, true),
        0x93 => (Sha, Indy, true),
        0x94 => (Sty, Zpx, false),
        0x95 => (Sta, Zpx, false),
        0x96 => (Stx, Zpy, false),
        0x97 => (Sax, Zpy, true),
        0x98 => (Tya, Imp, false),
        0x99 => (Sta, Absy, false),
        0x9A => (Txs, Imp, false),
        0x9B => (Tas, Absy, true),
        0x9C => (Shy, Absx, true),
        0x9D => (Sta, Absx, false),
        0x9E => (Shx, Absy, true),
        0x9F => (Sha, Absy, true),

        0xA0 => (Ldy, Imm, false),
        0xA1 => (Lda, Indx, false),
        0xA2 => (Ldx, Imm, false),
        0xA3 => (Lax, Indx, true),
        0xA4 => (Ldy, Zp, false),
        0xA5 => (Lda, Zp, false),
        0xA6 => (Ldx, Zp, false),
        0xA7 => (Lax, Zp, true),
        0xA8 => (Tay, Imp, false),
        0xA9 => (Lda, Imm, false),
        0xAA => (Tax, Imp, false),
        0xAB => (Lxa, Imm, true),
        0xAC => (Ldy, Abs, false),
        0xAD => (Lda, Abs, false),
        0xAE => (Ldx, Abs, false),
        0xAF => (Lax, Abs, true),

        0xB0 => (Bcs, Bch, false),
        0xB1 => (Lda, Indy, false),
        0xB2 => (IJam, Jam, true),
        0xB3 => (Lax, Indy, true),
        0xB4 => (Ldy, Zpx, false),
        0xB5 => (Lda, Zpx, false),
        0xB6 => (Ldx, Zpy, false),
        0xB7 => (Lax, Zpy, true),
        0xB8 => (Clv, Imp, false),
        0xB9 => (Lda, Absy, false),
        0xBA => (Tsx, Imp, false),
        0xBB => (Las, Absy, true),
        0xBC => (Ldy, Absx, false),
        0xBD => (Lda, Absx, false),
        0xBE => (Ldx, Absy, false),
        0xBF => (Lax, Absy, true),

        0xC0 => (Cpy, Imm, false),
        0xC1 => (Cmp, Indx, false),
        0xC2 => (Nop, Imm, true),
        0xC3 => (Dcp, Indx, true),
        0xC4 => (Cpy, Zp, false),
        0xC5 => (Cmp, Zp, false),
        0xC6 => (Dec, Zp, false),
        0xC7 => (Dcp, Zp, true),
        0xC8 => (Iny, Imp, false),
        0xC9 => (Cmp, Imm, false),
        0xCA => (Dex, Imp, false),
        0xCB => (Sbx, Imm, true),
        0xCC => (Cpy, Abs, false),
        0xCD => (Cmp, Abs, false),
        0xCE => (Dec, Abs, false),
        0xCF => (Dcp, Abs, true),

        0xD0 => (Bne, Bch, false),
        0xD1 => (Cmp, Indy, false),
        0xD2 => (IJam, Jam, true),
        0xD3 => (Dcp, Indy, true),
        0xD4 => (Nop, Zpx, true),
        0xD5 => (Cmp, Zpx, false),
        0xD6 => (Dec, Zpx, false),
        0xD7 => (Dcp, Zpx, true),
        0xD8 => (Cld, Imp, false),
        0xD9 => (Cmp, Absy, false),
        0xDA => (Nop, Imp, true),
        0xDB => (Dcp, Absy, true),
        0xDC => (Nop, Absx, true),
        0xDD => (Cmp, Absx, false),
        0xDE => (Dec, Absx, false),
        0xDF => (Dcp, Absx, true),

        0xE0 => (Cpx, Imm, false),
        0xE1 => (Sbc, Indx, false),
        0xE2 => (Nop, Imm, true),
        0xE3 => (Isc, Indx, true),
        0xE4 => (Cpx, Zp, false),
        0xE5 => (Sbc, Zp, false),
        0xE6 => (Inc, Zp, false),
        0xE7 => (Isc, Zp, true),
        0xE8 => (Inx, Imp, false),
        0xE9 => (Sbc, Imm, false),
        0xEA => (Nop, Imp, false),
        0xEB => (Sbc, Imm, true),
        0xEC => (Cpx, Abs, false),
        0xED => (Sbc, Abs, false),
        0xEE => (Inc, Abs, false),
        0xEF => (Isc, Abs, true),

        0xF0 => (Beq, Bch, false),
        0xF1 => (Sbc, Indy, false),
        0xF2 => (IJam, Jam, true),
        0xF3 => (Isc, Indy, true),
        0xF4 => (Nop, Zpx, true),
        0xF5 => (Sbc, Zpx, false),
        0xF6 => (Inc, Zpx, false),
        0xF7 => (Isc, Zpx, true),
        0xF8 => (Sed, Imp, false),
        0xF9 => (Sbc, Absy, false),
        0xFA => (Nop, Imp, true),
        0xFB => (Isc, Absy, true),
        0xFC => (Nop, Absx, true),
        0xFD => (Sbc, Absx, false),
        0xFE => (Inc, Absx, false),
        0xFF => (Isc, Absx, true),

        _ => (Udf, Imp, true),
    };
    entry(opcode, inst, mode, unofficial)
}

const fn build_table() -> [DecodedOpcode; 256] {
    let mut table = [entry(0, Instruction::Udf, AddrMode::Imp, true); 256];
    let mut i = 0usize;
    while i < 256 {
        table[i] = decode_one(i as u8);
        i += 1;
    }
    table
}

/// The twelve opcodes that JAM (halt) the CPU on execution, per spec.md §8
/// "Decode totality".
pub const JAM_OPCODES: [u8; 12] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_total() {
        // Every opcode decodes to *something* — the array has exactly 256
        // entries indexed by the opcode byte itself.
        for (i, e) in DECODE.iter().enumerate() {
            assert_eq!(e.opcode, i as u8);
        }
    }

    #[test]
    fn jam_set_matches_spec() {
        let jam_opcodes: Vec<u8> = DECODE
            .iter()
            .filter(|e| e.mode == AddrMode::Jam)
            .map(|e| e.opcode)
            .collect();
        let mut expected = JAM_OPCODES.to_vec();
        expected.sort_unstable();
        let mut actual = jam_opcodes;
        actual.sort_unstable();
        assert_eq!(actual, expected);
        for e in DECODE.iter().filter(|e| e.mode == AddrMode::Jam) {
            assert_eq!(e.instruction, Instruction::Jam);
        }
    }

    #[test]
    fn brk_decodes_to_brk() {
        let e = DECODE[BRK_OPCODE as usize];
        assert_eq!(e.instruction, Instruction::Brk);
        assert_eq!(e.mode, AddrMode::Brk);
    }

    #[test]
    fn known_official_opcodes() {
        assert_eq!(DECODE[0xA9].instruction, Instruction::Lda);
        assert_eq!(DECODE[0xA9].mode, AddrMode::Imm);
        assert_eq!(DECODE[0x4C].instruction, Instruction::Jmp);
        assert_eq!(DECODE[0x4C].mode, AddrMode::Jabs);
        assert_eq!(DECODE[0x6C].mode, AddrMode::Jind);
        assert_eq!(DECODE[0x20].mode, AddrMode::Jsr);
        assert_eq!(DECODE[0x60].mode, AddrMode::Rts);
    }

    #[test]
    fn known_unofficial_opcodes() {
        assert!(DECODE[0xA3].unofficial); // LAX (ind,X)
        assert_eq!(DECODE[0xA3].instruction, Instruction::Lax);
        assert!(DECODE[0xEB].unofficial); // USBC
        assert_eq!(DECODE[0xEB].instruction, Instruction::Sbc);
        assert!(!DECODE[0xEA].unofficial); // NOP is official
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// The decode table is total: every byte decodes to an entry whose
        /// `opcode` field matches, and whose addressing mode claims a
        /// length a real instruction fetch can actually produce.
        #[test]
        fn decode_table_is_total_and_self_consistent(opcode: u8) {
            let entry = DECODE[opcode as usize];
            prop_assert_eq!(entry.opcode, opcode);
            prop_assert!((1..=3).contains(&entry.mode.byte_count()));
        }
    }
}
