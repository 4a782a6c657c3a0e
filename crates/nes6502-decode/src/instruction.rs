//! The 6502 instruction mnemonics, official and unofficial.

/// Every 6502 instruction mnemonic the decode table can produce, including
/// the documented unofficial opcodes (spec.md §4.3 "Unofficial opcodes") and
/// the two synthetic slots `Udf` (undefined) and `Jam` (halt-on-execute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)] // mnemonics are self-describing
pub enum Instruction {
    // Undefined / halt
    Udf,
    Jam,
    // Official
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy,
    Dec, Dex, Dey,
    Eor,
    Inc, Inx, Iny,
    Jmp, Jsr,
    Lda, Ldx, Ldy, Lsr,
    Nop,
    Ora,
    Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts,
    Sbc, Sec, Sed, Sei, Sta, Stx, Sty,
    Tax, Tay, Tsx, Txa, Txs, Tya,
    // Unofficial (stable, well-documented)
    Alr, Anc, Ane, Arr, Dcp, Isc, Las, Lax, Lxa,
    Rla, Rra, Sax, Sbx, Sha, Shx, Shy, Slo, Sre, Tas,
}

impl Instruction {
    /// Mnemonic text as it appears in disassembly output.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        use Instruction::{
            Adc, Alr, And, Ane, Anc, Arr, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
            Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dcp, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Isc, Jam,
            Jmp, Jsr, Las, Lax, Lda, Ldx, Ldy, Lsr, Lxa, Nop, Ora, Pha, Php, Pla, Plp, Rla, Rol,
            Ror, Rra, Rti, Rts, Sax, Sbc, Sbx, Sec, Sed, Sei, Sha, Shx, Shy, Slo, Sre, Sta, Stx,
            Sty, Tas, Tax, Tay, Tsx, Txa, Txs, Tya, Udf,
        };
        match self {
            Udf => "UDF",
            Jam => "JAM",
            Adc => "ADC",
            And => "AND",
            Asl => "ASL",
            Bcc => "BCC",
            Bcs => "BCS",
            Beq => "BEQ",
            Bit => "BIT",
            Bmi => "BMI",
            Bne => "BNE",
            Bpl => "BPL",
            Brk => "BRK",
            Bvc => "BVC",
            Bvs => "BVS",
            Clc => "CLC",
            Cld => "CLD",
            Cli => "CLI",
            Clv => "CLV",
            Cmp => "CMP",
            Cpx => "CPX",
            Cpy => "CPY",
            Dec => "DEC",
            Dex => "DEX",
            Dey => "DEY",
            Eor => "EOR",
            Inc => "INC",
            Inx => "INX",
            Iny => "INY",
            Jmp => "JMP",
            Jsr => "JSR",
            Lda => "LDA",
            Ldx => "LDX",
            Ldy => "LDY",
            Lsr => "LSR",
            Nop => "NOP",
            Ora => "ORA",
            Pha => "PHA",
            Php => "PHP",
            Pla => "PLA",
            Plp => "PLP",
            Rol => "ROL",
            Ror => "ROR",
            Rti => "RTI",
            Rts => "RTS",
            Sbc => "SBC",
            Sec => "SEC",
            Sed => "SED",
            Sei => "SEI",
            Sta => "STA",
            Stx => "STX",
            Sty => "STY",
            Tax => "TAX",
            Tay => "TAY",
            Tsx => "TSX",
            Txa => "TXA",
            Txs => "TXS",
            Tya => "TYA",
            Alr => "ALR",
            Anc => "ANC",
            Ane => "ANE",
            Arr => "ARR",
            Dcp => "DCP",
            Isc => "ISC",
            Las => "LAS",
            Lax => "LAX",
            Lxa => "LXA",
            Rla => "RLA",
            Rra => "RRA",
            Sax => "SAX",
            Sbx => "SBX",
            Sha => "SHA",
            Shx => "SHX",
            Shy => "SHY",
            Slo => "SLO",
            Sre => "SRE",
            Tas => "TAS",
        }
    }
}

impl core::fmt::Display for Instruction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
