//! The per-cycle 6502 core: registers, datapath latches, and the
//! addressing-mode micro-sequences that drive the bus one access at a time.

use nes6502_bus::Bus;
use nes6502_decode::{AddrMode, Instruction, BRK_OPCODE, DECODE};

use crate::interrupt::{InterruptKind, LatchState, Lines};
use crate::status::Status;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How an addressing mode's effective-address cycle is used by a given
/// instruction. Determines the extra read/write cycles the mode's dispatch
/// function inserts (spec.md §4.3 "Addressing-mode sequences").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Rmw,
    /// No memory operand (implied/accumulator/stack/control-flow).
    Implied,
}

fn access_kind(instr: Instruction) -> Access {
    use Instruction::{Dcp, Inc, Isc, Rla, Rra, Sax, Sha, Shx, Shy, Slo, Sre, Sta, Stx, Sty, Tas};
    match instr {
        Sta | Stx | Sty | Sax | Sha | Shx | Shy | Tas => Access::Write,
        Instruction::Asl | Instruction::Lsr | Instruction::Rol | Instruction::Ror | Inc
        | Instruction::Dec | Slo | Rla | Sre | Rra | Dcp | Isc => Access::Rmw,
        _ => Access::Read,
    }
}

/// Cycle-accurate MOS 6502 register file and datapath.
///
/// Holds no reference to a [`Bus`] (spec.md SPEC_FULL OQ-1): every entry
/// point that touches memory takes `&mut Bus` as a parameter.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cpu {
    /// Program counter.
    pub pc: u16,
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (low byte of `$01xx`).
    pub s: u8,
    /// Status flags.
    pub p: Status,

    /// Cycle index within the current instruction; `-1` is the pre-fetch
    /// sentinel driven back to `0` by the next `cycle()` call.
    t: i8,
    /// Currently latched opcode byte.
    opc: u8,
    /// Effective-address low latch.
    adl: u8,
    /// Effective-address high latch.
    adh: u8,
    /// Page-cross carry latch (0 or 1), also reused as a pointer-indexing
    /// scratch byte (`bal`'s sibling) where a mode needs one.
    adc: u8,
    /// Base-address latch used by the indirect addressing modes.
    bal: u8,

    /// Address currently driven on the bus (tracing/snapshot only).
    pub addr_bus: u16,
    /// Data currently driven on the bus (tracing/snapshot only).
    pub data_bus: u8,
    /// Address of the instruction currently executing (latched at fetch).
    pub addrinst: u16,

    /// Input signal levels; `true` means the (active-low) line is asserted.
    irq_line: bool,
    nmi_line: bool,
    reset_line: bool,
    /// Ready: when false, `cycle()` is a no-op.
    rdy: bool,
    /// True for a read cycle, false for a write cycle.
    pub rw: bool,
    /// True during the one cycle an opcode is fetched.
    pub sync: bool,

    lines: Lines,
    /// Which interrupt kind the in-flight BRK-shaped sequence is servicing.
    servicing: Option<InterruptKind>,
    /// True only when `opc == 0x00` was a genuine software BRK, not an
    /// interrupt-substituted fetch — controls the pushed status's B bit.
    software_break: bool,

    /// BCD arithmetic enabled. The Ricoh 2A03 wires this off; kept
    /// configurable so the core also models a stock 6502.
    pub bcd_enabled: bool,
    /// Latched for one cycle after an out-of-range bus access.
    pub bflt: bool,
    /// Peek mode: writes suppressed, interrupts (but RESET) ignored,
    /// branches forced taken.
    pub detached: bool,
    /// Forces the next `cycle()` to restart at `t = 0` (opcode fetch).
    presync: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// A freshly constructed CPU, already mid power-on reset the way real
    /// silicon comes up: `lines.reset` starts `Committed`, so `cycle()`
    /// holds at T0 doing no bus work for as long as [`Cpu::set_reset`]
    /// stays asserted (the default). Releasing the line lets the next
    /// `cycle()` call begin the 7-cycle reset/vector-fetch sequence.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pc: 0,
            a: 0,
            x: 0,
            y: 0,
            s: 0xFF,
            p: Status::POWER_ON,
            t: -1,
            opc: 0,
            adl: 0,
            adh: 0,
            adc: 0,
            bal: 0,
            addr_bus: 0,
            data_bus: 0,
            addrinst: 0,
            irq_line: false,
            nmi_line: false,
            reset_line: true,
            rdy: true,
            rw: true,
            sync: false,
            lines: Lines {
                reset: LatchState::Committed,
                ..Lines::default()
            },
            servicing: None,
            software_break: false,
            bcd_enabled: true,
            bflt: false,
            detached: false,
            presync: false,
        }
    }

    /// Current cycle index within the in-flight instruction (`-1` before
    /// the first fetch).
    #[must_use]
    pub const fn t(&self) -> i8 {
        self.t
    }

    /// Currently latched opcode.
    #[must_use]
    pub const fn opcode(&self) -> u8 {
        self.opc
    }

    /// Whether the CPU is spinning on a JAM opcode.
    #[must_use]
    pub fn jammed(&self) -> bool {
        DECODE[self.opc as usize].mode == AddrMode::Jam && self.t >= 4
    }

    /// Assert or release the RESET line (active-low semantics: `true`
    /// asserts).
    pub fn set_reset(&mut self, asserted: bool) {
        self.reset_line = asserted;
    }

    /// Assert or release the NMI line.
    pub fn set_nmi(&mut self, asserted: bool) {
        self.nmi_line = asserted;
    }

    /// Assert or release the IRQ line.
    pub fn set_irq(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Drive RDY. While low, `cycle()` performs no work and returns 0.
    pub fn set_rdy(&mut self, ready: bool) {
        self.rdy = ready;
    }

    /// Whether RDY is currently asserted.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.rdy
    }

    /// Whether the IRQ line is currently asserted.
    #[must_use]
    pub const fn irq_asserted(&self) -> bool {
        self.irq_line
    }

    /// Whether the NMI line is currently asserted.
    #[must_use]
    pub const fn nmi_asserted(&self) -> bool {
        self.nmi_line
    }

    /// Whether the RESET line is currently asserted.
    #[must_use]
    pub const fn reset_asserted(&self) -> bool {
        self.reset_line
    }

    /// The three interrupt line latch state machines (tracing/snapshot).
    #[must_use]
    pub const fn lines(&self) -> &Lines {
        &self.lines
    }

    /// Effective-address low latch (tracing/snapshot only).
    #[must_use]
    pub const fn adl_latch(&self) -> u8 {
        self.adl
    }

    /// Effective-address high latch (tracing/snapshot only).
    #[must_use]
    pub const fn adh_latch(&self) -> u8 {
        self.adh
    }

    /// Page-cross/scratch carry latch (tracing/snapshot only).
    #[must_use]
    pub const fn adc_latch(&self) -> u8 {
        self.adc
    }

    /// Effective address formed from the `adl`/`adh` latches.
    const fn eff_addr(&self) -> u16 {
        ((self.adh as u16) << 8) | (self.adl as u16)
    }

    fn bus_read(&mut self, bus: &mut Bus, addr: u16) -> u8 {
        self.addr_bus = addr;
        self.rw = true;
        let value = bus.read(u32::from(addr)).unwrap_or(0xFF);
        self.data_bus = value;
        value
    }

    fn bus_write(&mut self, bus: &mut Bus, addr: u16, value: u8) {
        self.addr_bus = addr;
        self.data_bus = value;
        self.rw = false;
        if !self.detached {
            bus.write(u32::from(addr), value);
        }
    }

    fn push(&mut self, bus: &mut Bus, value: u8) {
        self.bus_write(bus, 0x0100 | u16::from(self.s), value);
        self.s = self.s.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut Bus) -> u8 {
        self.s = self.s.wrapping_add(1);
        self.bus_read(bus, 0x0100 | u16::from(self.s))
    }

    /// Mark the current instruction's last cycle. `poll` decides whether
    /// this is the instruction's IRQ/NMI polling point (spec.md §4.3
    /// "Polling point") — false only for a taken, non-page-crossing branch.
    fn finish(&mut self, poll: bool) {
        self.t = -1;
        if poll && !self.detached {
            self.lines.poll(self.p.contains(Status::I));
        }
    }

    /// Advance exactly one clock cycle. Returns 0 only if RDY is low;
    /// returns 1 with no bus activity while RESET is held COMMITTED and
    /// asserted, and 1 for every other cycle (spec.md §4.3 "Per-cycle
    /// algorithm").
    pub fn cycle(&mut self, bus: &mut Bus) -> u8 {
        if !self.rdy {
            return 0;
        }
        if self.lines.reset == LatchState::Committed && self.reset_line {
            return 1;
        }
        if self.presync {
            self.presync = false;
            self.t = -1;
        }
        bus.clear_fault();

        let nmi_low = self.nmi_line && !self.detached;
        let irq_low = self.irq_line && !self.detached;
        self.lines.latch(self.reset_line, nmi_low, irq_low);

        let jam = DECODE[self.opc as usize].mode == AddrMode::Jam;
        if !(jam && self.t >= 4) {
            self.t += 1;
        }

        self.sync = self.t == 0;
        if self.t == 0 {
            self.addrinst = self.pc;
            let opcode = self.bus_read(bus, self.pc);
            if let Some(kind) = self.lines.committed().filter(|_| !self.detached) {
                self.opc = BRK_OPCODE;
                self.servicing = Some(kind);
                self.software_break = false;
            } else {
                self.pc = self.pc.wrapping_add(1);
                self.opc = opcode;
                self.servicing = (opcode == BRK_OPCODE).then_some(InterruptKind::Irq);
                self.software_break = opcode == BRK_OPCODE;
            }
        } else {
            self.dispatch(bus);
        }

        self.bflt = bus.faulted();

        let suppress = self.opc == BRK_OPCODE && self.t == 6;
        self.lines.detect(self.reset_line, self.nmi_line && !self.detached, self.irq_line && !self.detached, suppress);

        1
    }

    /// Run one full instruction (repeated `cycle()` calls) and return the
    /// number of cycles it consumed. A thin convenience over `cycle()`,
    /// matching the teacher's single-step entry point.
    pub fn step(&mut self, bus: &mut Bus) -> u32 {
        let mut consumed = 0u32;
        loop {
            consumed += u32::from(self.cycle(bus));
            if self.t == -1 {
                break;
            }
        }
        consumed
    }

    /// Clone into `backup`, detach, and silence every interrupt line so a
    /// caller can preview reads without perturbing live state (spec.md
    /// §4.3 "Peek mode").
    pub fn peek_start(&mut self, backup: &mut Self) {
        backup.clone_from(self);
        self.detached = true;
        self.lines.clear_all();
        self.presync = true;
    }

    /// Run one preview cycle. Writes are suppressed, non-RESET interrupts
    /// ignored, and branches forced taken for the duration of `detached`.
    pub fn peek(&mut self, bus: &mut Bus) -> u8 {
        self.cycle(bus)
    }

    /// Restore the state saved by `peek_start`, preserving whatever
    /// `detached` was set before the peek session began.
    pub fn peek_end(&mut self, backup: &Self) {
        let was_detached = backup.detached;
        self.clone_from(backup);
        self.detached = was_detached;
    }

    fn dispatch(&mut self, bus: &mut Bus) {
        let entry = DECODE[self.opc as usize];
        let instr = entry.instruction;
        let kind = access_kind(instr);
        match entry.mode {
            AddrMode::Imp => self.step_imp(instr),
            AddrMode::Imm => self.step_imm(bus, instr),
            AddrMode::Zp => self.step_zp(bus, instr, kind),
            AddrMode::Zpx => self.step_zp_indexed(bus, instr, kind, self.x),
            AddrMode::Zpy => self.step_zp_indexed(bus, instr, kind, self.y),
            AddrMode::Abs => self.step_abs(bus, instr, kind),
            AddrMode::Absx => self.step_abs_indexed(bus, instr, kind, self.x),
            AddrMode::Absy => self.step_abs_indexed(bus, instr, kind, self.y),
            AddrMode::Indx => self.step_indx(bus, instr, kind),
            AddrMode::Indy => self.step_indy(bus, instr, kind),
            AddrMode::Bch => self.step_branch(bus, instr),
            AddrMode::Jsr => self.step_jsr(bus),
            AddrMode::Rts => self.step_rts(bus),
            AddrMode::Jabs => self.step_jabs(bus),
            AddrMode::Jind => self.step_jind(bus),
            AddrMode::Psh => self.step_push(bus, instr),
            AddrMode::Pll => self.step_pull(bus, instr),
            AddrMode::Brk => self.step_brk(bus),
            AddrMode::Rti => self.step_rti(bus),
            AddrMode::Jam => self.step_jam(),
        }
    }

    fn step_imp(&mut self, instr: Instruction) {
        use Instruction::{
            Asl, Clc, Cld, Cli, Clv, Dex, Dey, Inx, Iny, Lsr, Nop, Rol, Ror, Sec, Sed, Sei, Tax,
            Tay, Tsx, Txa, Txs, Tya,
        };
        if self.t != 1 {
            return;
        }
        match instr {
            Clc => self.p.remove(Status::C),
            Sec => self.p.insert(Status::C),
            Cli => self.p.remove(Status::I),
            Sei => self.p.insert(Status::I),
            Cld => self.p.remove(Status::D),
            Sed => self.p.insert(Status::D),
            Clv => self.p.remove(Status::V),
            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.p.set_zn(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.p.set_zn(self.y);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.p.set_zn(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.p.set_zn(self.y);
            }
            Tax => {
                self.x = self.a;
                self.p.set_zn(self.x);
            }
            Tay => {
                self.y = self.a;
                self.p.set_zn(self.y);
            }
            Txa => {
                self.a = self.x;
                self.p.set_zn(self.a);
            }
            Tya => {
                self.a = self.y;
                self.p.set_zn(self.a);
            }
            Txs => self.s = self.x,
            Tsx => {
                self.x = self.s;
                self.p.set_zn(self.x);
            }
            Asl | Lsr | Rol | Ror => {
                self.a = self.execute_rmw(instr, self.a);
            }
            Nop => {}
            _ => {}
        }
        self.finish(true);
    }

    fn step_imm(&mut self, bus: &mut Bus, instr: Instruction) {
        if self.t != 1 {
            return;
        }
        let value = self.bus_read(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.execute_read(instr, value);
        self.finish(true);
    }

    fn step_zp(&mut self, bus: &mut Bus, instr: Instruction, kind: Access) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => self.access_stage(bus, instr, kind, self.eff_addr()),
            3 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            4 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_zp_indexed(&mut self, bus: &mut Bus, instr: Instruction, kind: Access, index: u8) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                let _ = self.bus_read(bus, u16::from(self.adl));
                self.adl = self.adl.wrapping_add(index);
            }
            3 => self.access_stage(bus, instr, kind, self.eff_addr()),
            4 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            5 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_abs(&mut self, bus: &mut Bus, instr: Instruction, kind: Access) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                self.adh = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            3 => self.access_stage(bus, instr, kind, self.eff_addr()),
            4 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            5 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    /// Shared tail for the non-indexed modes: at the cycle the effective
    /// address becomes known, read/write/rmw-read/no-op as appropriate.
    fn access_stage(&mut self, bus: &mut Bus, instr: Instruction, kind: Access, addr: u16) {
        match kind {
            Access::Read => {
                let value = self.bus_read(bus, addr);
                self.execute_read(instr, value);
                self.finish(true);
            }
            Access::Write => {
                let value = self.execute_write(instr, addr);
                self.bus_write(bus, addr, value);
                self.finish(true);
            }
            Access::Rmw => {
                self.data_bus = self.bus_read(bus, addr);
            }
            Access::Implied => {}
        }
    }

    fn step_abs_indexed(&mut self, bus: &mut Bus, instr: Instruction, kind: Access, index: u8) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                self.adh = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
                let (lo, carry) = self.adl.overflowing_add(index);
                self.adl = lo;
                self.adc = u8::from(carry);
            }
            3 => {
                let addr = self.eff_addr();
                match kind {
                    Access::Read => {
                        let value = self.bus_read(bus, addr);
                        if self.adc == 0 {
                            self.execute_read(instr, value);
                            self.finish(true);
                        }
                    }
                    Access::Write | Access::Rmw => {
                        let _ = self.bus_read(bus, addr);
                    }
                    Access::Implied => {}
                }
            }
            4 => {
                self.adh = self.adh.wrapping_add(self.adc);
                let addr = self.eff_addr();
                self.access_stage(bus, instr, kind, addr);
            }
            5 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            6 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_indx(&mut self, bus: &mut Bus, instr: Instruction, kind: Access) {
        match self.t {
            1 => {
                self.bal = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                let _ = self.bus_read(bus, u16::from(self.bal));
                self.bal = self.bal.wrapping_add(self.x);
            }
            3 => self.adl = self.bus_read(bus, u16::from(self.bal)),
            4 => self.adh = self.bus_read(bus, u16::from(self.bal.wrapping_add(1))),
            5 => self.access_stage(bus, instr, kind, self.eff_addr()),
            6 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            7 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_indy(&mut self, bus: &mut Bus, instr: Instruction, kind: Access) {
        match self.t {
            1 => {
                self.bal = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => self.adl = self.bus_read(bus, u16::from(self.bal)),
            3 => {
                self.adh = self.bus_read(bus, u16::from(self.bal.wrapping_add(1)));
                let (lo, carry) = self.adl.overflowing_add(self.y);
                self.adl = lo;
                self.adc = u8::from(carry);
            }
            4 => {
                let addr = self.eff_addr();
                match kind {
                    Access::Read => {
                        let value = self.bus_read(bus, addr);
                        if self.adc == 0 {
                            self.execute_read(instr, value);
                            self.finish(true);
                        }
                    }
                    Access::Write | Access::Rmw => {
                        let _ = self.bus_read(bus, addr);
                    }
                    Access::Implied => {}
                }
            }
            5 => {
                self.adh = self.adh.wrapping_add(self.adc);
                let addr = self.eff_addr();
                self.access_stage(bus, instr, kind, addr);
            }
            6 => {
                let addr = self.eff_addr();
                self.bus_write(bus, addr, self.data_bus);
            }
            7 => {
                let addr = self.eff_addr();
                let new_value = self.execute_rmw(instr, self.data_bus);
                self.bus_write(bus, addr, new_value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn branch_taken(p: Status, instr: Instruction) -> bool {
        use Instruction::{Bcc, Bcs, Beq, Bmi, Bne, Bpl, Bvc, Bvs};
        match instr {
            Bcc => !p.contains(Status::C),
            Bcs => p.contains(Status::C),
            Beq => p.contains(Status::Z),
            Bne => !p.contains(Status::Z),
            Bmi => p.contains(Status::N),
            Bpl => !p.contains(Status::N),
            Bvc => !p.contains(Status::V),
            Bvs => p.contains(Status::V),
            _ => false,
        }
    }

    fn step_branch(&mut self, bus: &mut Bus, instr: Instruction) {
        match self.t {
            1 => {
                let offset = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
                let taken = self.detached || Self::branch_taken(self.p, instr);
                if taken {
                    self.data_bus = offset;
                } else {
                    self.finish(true);
                }
            }
            2 => {
                let offset = self.data_bus as i8;
                let old_pc = self.pc;
                let target = old_pc.wrapping_add(offset as i16 as u16);
                let crosses = (old_pc & 0xFF00) != (target & 0xFF00);
                let intermediate = (old_pc & 0xFF00) | (target & 0x00FF);
                let _ = self.bus_read(bus, intermediate);
                self.adl = (target & 0xFF) as u8;
                self.adh = (target >> 8) as u8;
                if crosses {
                    self.adc = 1;
                } else {
                    self.pc = target;
                    self.finish(false);
                }
            }
            3 => {
                self.pc = self.eff_addr();
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_jsr(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                let _ = self.bus_read(bus, 0x0100 | u16::from(self.s));
            }
            3 => {
                let value = (self.pc >> 8) as u8;
                self.push(bus, value);
            }
            4 => {
                let value = (self.pc & 0xFF) as u8;
                self.push(bus, value);
            }
            5 => {
                self.adh = self.bus_read(bus, self.pc);
                self.pc = self.eff_addr();
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_rts(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                let _ = self.bus_read(bus, self.pc);
            }
            2 => {
                let _ = self.bus_read(bus, 0x0100 | u16::from(self.s));
            }
            3 => self.adl = self.pull(bus),
            4 => self.adh = self.pull(bus),
            5 => {
                self.pc = self.eff_addr();
                let _ = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_jabs(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                self.adh = self.bus_read(bus, self.pc);
                self.pc = self.eff_addr();
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_jind(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                self.adl = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            2 => {
                self.adh = self.bus_read(bus, self.pc);
                self.pc = self.pc.wrapping_add(1);
            }
            3 => {
                let ptr = self.eff_addr();
                self.bal = self.bus_read(bus, ptr);
            }
            4 => {
                let ptr = self.eff_addr();
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = self.bus_read(bus, hi_addr);
                self.pc = (u16::from(hi) << 8) | u16::from(self.bal);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_push(&mut self, bus: &mut Bus, instr: Instruction) {
        match self.t {
            1 => {
                let _ = self.bus_read(bus, self.pc);
            }
            2 => {
                let value = match instr {
                    Instruction::Pha => self.a,
                    Instruction::Php => self.p.to_stack_byte(true),
                    _ => 0,
                };
                self.push(bus, value);
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_pull(&mut self, bus: &mut Bus, instr: Instruction) {
        match self.t {
            1 => {
                let _ = self.bus_read(bus, self.pc);
            }
            2 => {
                let _ = self.bus_read(bus, 0x0100 | u16::from(self.s));
            }
            3 => {
                let value = self.pull(bus);
                match instr {
                    Instruction::Pla => {
                        self.a = value;
                        self.p.set_zn(self.a);
                    }
                    Instruction::Plp => self.p = Status::from_stack_byte(value),
                    _ => {}
                }
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_rti(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                let _ = self.bus_read(bus, self.pc);
            }
            2 => {
                let _ = self.bus_read(bus, 0x0100 | u16::from(self.s));
            }
            3 => {
                let value = self.pull(bus);
                self.p = Status::from_stack_byte(value);
            }
            4 => self.adl = self.pull(bus),
            5 => {
                self.adh = self.pull(bus);
                self.pc = self.eff_addr();
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_brk(&mut self, bus: &mut Bus) {
        match self.t {
            1 => {
                let _ = self.bus_read(bus, self.pc);
                if self.software_break {
                    self.pc = self.pc.wrapping_add(1);
                }
            }
            2 => {
                if self.servicing == Some(InterruptKind::Reset) {
                    self.s = self.s.wrapping_sub(1);
                } else {
                    let value = (self.pc >> 8) as u8;
                    self.push(bus, value);
                }
            }
            3 => {
                if self.servicing == Some(InterruptKind::Reset) {
                    self.s = self.s.wrapping_sub(1);
                } else {
                    let value = (self.pc & 0xFF) as u8;
                    self.push(bus, value);
                }
            }
            4 => {
                if self.servicing == Some(InterruptKind::Reset) {
                    self.s = self.s.wrapping_sub(1);
                } else {
                    let value = self.p.to_stack_byte(self.software_break);
                    self.push(bus, value);
                }
                self.p.insert(Status::I);
            }
            5 => {
                let kind = self.servicing.unwrap_or(InterruptKind::Irq);
                self.adl = self.bus_read(bus, kind.vector());
            }
            6 => {
                // Late poll: a pending NMI (or unmasked IRQ) latched while the
                // vector bytes were being fetched still gets to hijack which
                // vector this sequence ultimately reads.
                self.lines.poll(self.p.contains(Status::I));
                if self.lines.reset == LatchState::Committed {
                    self.servicing = Some(InterruptKind::Reset);
                } else if self.lines.nmi == LatchState::Committed
                    && self.servicing != Some(InterruptKind::Reset)
                {
                    self.servicing = Some(InterruptKind::Nmi);
                }
                let kind = self.servicing.unwrap_or(InterruptKind::Irq);
                self.adh = self.bus_read(bus, kind.vector() + 1);
                self.pc = self.eff_addr();
                self.lines.mark_serviced(kind);
                self.servicing = None;
                self.finish(true);
            }
            _ => {}
        }
    }

    fn step_jam(&mut self) {
        if self.t >= 4 {
            self.addr_bus = 0xFFFF;
            self.data_bus = 0xFF;
            self.rw = true;
        }
    }

    fn compare(&mut self, reg: u8, value: u8) {
        let (result, borrow) = reg.overflowing_sub(value);
        self.p.set(Status::C, !borrow);
        self.p.set_zn(result);
    }

    fn adc_core(&mut self, m: u8) -> u8 {
        let a16 = u16::from(self.a);
        let m16 = u16::from(m);
        let c16 = u16::from(self.p.contains(Status::C));
        let sum = a16 + m16 + c16;
        let result = sum as u8;
        let overflow = (!(self.a ^ m) & (self.a ^ result) & 0x80) != 0;
        self.p.set(Status::V, overflow);
        self.p.set(Status::C, sum > 0xFF);
        self.p.set_zn(result);
        result
    }

    fn adc(&mut self, m: u8) {
        let result = self.adc_core(m);
        if self.bcd_enabled && self.p.contains(Status::D) {
            let mut lo = (self.a & 0x0F) + (m & 0x0F) + u8::from(self.p.contains(Status::C));
            let mut hi = (self.a >> 4) + (m >> 4);
            if lo > 9 {
                lo += 6;
                hi += 1;
            }
            let carry = hi > 9;
            if carry {
                hi += 6;
            }
            self.a = (hi << 4) | (lo & 0x0F);
            self.p.set(Status::C, carry);
        } else {
            self.a = result;
        }
    }

    fn sbc(&mut self, m: u8) {
        let result = self.adc_core(!m);
        if self.bcd_enabled && self.p.contains(Status::D) {
            let borrow_in = i16::from(!self.p.contains(Status::C));
            let mut lo = i16::from(self.a & 0x0F) - i16::from(m & 0x0F) - borrow_in;
            let mut hi = i16::from(self.a >> 4) - i16::from(m >> 4);
            if lo < 0 {
                lo += 10;
                hi -= 1;
            }
            if hi < 0 {
                hi += 10;
            }
            self.a = ((hi << 4) as u8 & 0xF0) | (lo as u8 & 0x0F);
        } else {
            self.a = result;
        }
    }

    fn arr(&mut self, m: u8) {
        let t = self.a & m;
        let carry_in = u8::from(self.p.contains(Status::C));
        let result = (t >> 1) | (carry_in << 7);
        self.a = result;
        self.p.set_zn(result);
        self.p.set(Status::C, result & 0x40 != 0);
        self.p.set(Status::V, (result & 0x40 != 0) ^ (result & 0x20 != 0));
    }

    fn sbx(&mut self, m: u8) {
        let and = self.a & self.x;
        let (result, borrow) = and.overflowing_sub(m);
        self.x = result;
        self.p.set(Status::C, !borrow);
        self.p.set_zn(result);
    }

    fn execute_read(&mut self, instr: Instruction, value: u8) {
        use Instruction::{
            Alr, Anc, Ane, Arr, Bit, Cmp, Cpx, Cpy, Eor, Las, Lax, Lda, Ldx, Ldy, Lxa, Nop, Ora,
            Sbc, Sbx, Udf,
        };
        match instr {
            Instruction::Adc => self.adc(value),
            Sbc => self.sbc(value),
            Instruction::And => {
                self.a &= value;
                self.p.set_zn(self.a);
            }
            Ora => {
                self.a |= value;
                self.p.set_zn(self.a);
            }
            Eor => {
                self.a ^= value;
                self.p.set_zn(self.a);
            }
            Lda => {
                self.a = value;
                self.p.set_zn(self.a);
            }
            Ldx => {
                self.x = value;
                self.p.set_zn(self.x);
            }
            Ldy => {
                self.y = value;
                self.p.set_zn(self.y);
            }
            Cmp => self.compare(self.a, value),
            Cpx => self.compare(self.x, value),
            Cpy => self.compare(self.y, value),
            Bit => {
                let masked = self.a & value;
                self.p.set(Status::Z, masked == 0);
                self.p.set(Status::N, value & 0x80 != 0);
                self.p.set(Status::V, value & 0x40 != 0);
            }
            Lax => {
                self.a = value;
                self.x = value;
                self.p.set_zn(value);
            }
            Las => {
                let v = value & self.s;
                self.a = v;
                self.x = v;
                self.s = v;
                self.p.set_zn(v);
            }
            Anc => {
                self.a &= value;
                self.p.set_zn(self.a);
                self.p.set(Status::C, self.a & 0x80 != 0);
            }
            Alr => {
                self.a &= value;
                let carry = self.a & 1 != 0;
                self.a >>= 1;
                self.p.set(Status::C, carry);
                self.p.set_zn(self.a);
            }
            Arr => self.arr(value),
            Ane => {
                self.a = (self.a | 0xEE) & self.x & value;
                self.p.set_zn(self.a);
            }
            Lxa => {
                let v = (self.a | 0xEE) & value;
                self.a = v;
                self.x = v;
                self.p.set_zn(v);
            }
            Sbx => self.sbx(value),
            Nop | Udf => {}
            _ => {}
        }
    }

    fn execute_write(&mut self, instr: Instruction, addr: u16) -> u8 {
        use Instruction::{Sax, Sha, Shx, Shy, Sta, Stx, Sty, Tas};
        match instr {
            Sta => self.a,
            Stx => self.x,
            Sty => self.y,
            Sax => self.a & self.x,
            Sha | Shx | Shy | Tas => {
                let reg = match instr {
                    Sha => self.a & self.x,
                    Shx => self.x,
                    Shy => self.y,
                    Tas => {
                        self.s = self.a & self.x;
                        self.s
                    }
                    _ => unreachable!(),
                };
                let high = (addr >> 8) as u8;
                let value = reg & high.wrapping_add(1);
                if self.adc != 0 {
                    self.adh = value;
                }
                value
            }
            _ => 0,
        }
    }

    fn execute_rmw(&mut self, instr: Instruction, old: u8) -> u8 {
        use Instruction::{Asl, Dcp, Dec, Inc, Isc, Lsr, Rla, Rol, Ror, Rra, Slo, Sre};
        match instr {
            Asl => {
                self.p.set(Status::C, old & 0x80 != 0);
                let r = old << 1;
                self.p.set_zn(r);
                r
            }
            Lsr => {
                self.p.set(Status::C, old & 1 != 0);
                let r = old >> 1;
                self.p.set_zn(r);
                r
            }
            Rol => {
                let carry_in = u8::from(self.p.contains(Status::C));
                self.p.set(Status::C, old & 0x80 != 0);
                let r = (old << 1) | carry_in;
                self.p.set_zn(r);
                r
            }
            Ror => {
                let carry_in = u8::from(self.p.contains(Status::C));
                self.p.set(Status::C, old & 1 != 0);
                let r = (old >> 1) | (carry_in << 7);
                self.p.set_zn(r);
                r
            }
            Inc => {
                let r = old.wrapping_add(1);
                self.p.set_zn(r);
                r
            }
            Dec => {
                let r = old.wrapping_sub(1);
                self.p.set_zn(r);
                r
            }
            Slo => {
                self.p.set(Status::C, old & 0x80 != 0);
                let r = old << 1;
                self.a |= r;
                self.p.set_zn(self.a);
                r
            }
            Rla => {
                let carry_in = u8::from(self.p.contains(Status::C));
                self.p.set(Status::C, old & 0x80 != 0);
                let r = (old << 1) | carry_in;
                self.a &= r;
                self.p.set_zn(self.a);
                r
            }
            Sre => {
                self.p.set(Status::C, old & 1 != 0);
                let r = old >> 1;
                self.a ^= r;
                self.p.set_zn(self.a);
                r
            }
            Rra => {
                let carry_in = u8::from(self.p.contains(Status::C));
                self.p.set(Status::C, old & 1 != 0);
                let r = (old >> 1) | (carry_in << 7);
                self.adc(r);
                r
            }
            Dcp => {
                let r = old.wrapping_sub(1);
                self.compare(self.a, r);
                r
            }
            Isc => {
                let r = old.wrapping_add(1);
                self.sbc(r);
                r
            }
            _ => old,
        }
    }
}
