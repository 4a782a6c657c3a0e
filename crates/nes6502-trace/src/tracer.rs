//! Per-instruction text tracer (spec.md §4.7, trace line format §6).

use std::io::{self, Write};

use nes6502_cpu::Cpu;

/// Writes one line per committed instruction to an arbitrary [`Write`]
/// sink. Line numbers increase monotonically starting at 1; the caller
/// supplies the cycle count as it stood *before* the instruction's fetch
/// cycle, and the raw instruction bytes (opcode plus however many operand
/// bytes the addressing mode needs) for disassembly.
pub struct Tracer<W> {
    writer: W,
    line: u64,
    failed: bool,
}

impl<W: Write> Tracer<W> {
    /// Wrap `writer` in a fresh tracer starting at line 1.
    pub fn new(writer: W) -> Self {
        Self { writer, line: 0, failed: false }
    }

    /// Whether a previous write failed. Once set, tracing has silently
    /// stopped recording (spec.md §7: a tracer I/O failure is a runtime
    /// deviation, not a panic) — the caller decides whether to keep
    /// calling `trace` or to give up.
    #[must_use]
    pub const fn failed(&self) -> bool {
        self.failed
    }

    /// Total lines written so far.
    #[must_use]
    pub const fn line_count(&self) -> u64 {
        self.line
    }

    /// Record one committed instruction.
    ///
    /// `cycles_before_fetch` must be the cycle counter as of the start of
    /// this instruction's fetch cycle (i.e. not yet incremented for it).
    pub fn trace(&mut self, cycles_before_fetch: u64, cpu: &Cpu, instruction_bytes: &[u8]) -> io::Result<()> {
        self.line += 1;
        let asm = nes6502_disasm::instruction_line(cpu.addrinst, instruction_bytes)
            .map_or_else(|e| format!("{:04X}: <{e}>", cpu.addrinst), |s| s);
        let result = writeln!(
            self.writer,
            "{line}: CYC:{cyc}  {asm}   A:{a:02X} X:{x:02X} Y:{y:02X} P:{p:02X} S:{s:02X}",
            line = self.line,
            cyc = cycles_before_fetch,
            a = cpu.a,
            x = cpu.x,
            y = cpu.y,
            p = cpu.p.bits(),
            s = cpu.s,
        );
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_call_with_increasing_numbers() {
        let mut buf = Vec::new();
        let mut tracer = Tracer::new(&mut buf);
        let mut cpu = Cpu::new();
        cpu.addrinst = 0x8000;
        cpu.a = 0x7F;
        tracer.trace(12, &cpu, &[0x69, 0x01]).unwrap();
        cpu.addrinst = 0x8002;
        tracer.trace(14, &cpu, &[0xEA]).unwrap();
        let line_count = tracer.line_count();
        let failed = tracer.failed();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1: CYC:12  8000: 69 01"), "{}", lines[0]);
        assert!(lines[1].starts_with("2: CYC:14  8002: EA"), "{}", lines[1]);
        assert_eq!(line_count, 2);
        assert!(!failed);
    }
}
