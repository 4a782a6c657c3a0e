//! Per-line interrupt latch state machines.
//!
//! Modeled as three independent finite state machines rather than bitflags
//! (spec.md §9 "Interrupt latch state"): the RESET/NMI/IRQ lines each latch
//! and clear on different rules, and an enum-per-line keeps each transition
//! exhaustively matched instead of hand-tracking bit combinations.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One interrupt line's latch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LatchState {
    /// No pending service; the line is not (or no longer) asserted.
    #[default]
    Clear,
    /// The line was observed asserted at a poll point.
    Detected,
    /// Latched and waiting for the CPU to reach a servicing opcode fetch.
    Pending,
    /// The CPU has substituted the BRK opcode and is servicing this line.
    Committed,
    /// RESET only: vector has been fetched; waiting for the line to release
    /// before returning to `Clear`.
    Serviced,
}

/// The three interrupt lines the CPU polls every cycle.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Lines {
    /// RESET line state (level-detected, highest priority).
    pub reset: LatchState,
    /// NMI line state (edge-detected).
    pub nmi: LatchState,
    /// IRQ line state (level-detected, maskable by `Status::I`).
    pub irq: LatchState,
}

impl Lines {
    /// ϕ1-equivalent step: advance latch states that depend only on the
    /// line level and the previous latch state, run once per cycle before
    /// the addressing-mode dispatch (spec.md §4.3 step 5).
    ///
    /// RESET's `Pending -> Committed` transition is unconditional (it
    /// overrides whatever instruction is in flight). NMI/IRQ's
    /// `Pending -> Committed` transition is *not* done here — it only
    /// happens at an instruction's poll point, via [`Lines::poll`].
    pub fn latch(&mut self, reset_low: bool, nmi_low: bool, irq_low: bool) {
        self.reset = match self.reset {
            LatchState::Detected => LatchState::Pending,
            LatchState::Pending => LatchState::Committed,
            LatchState::Serviced if !reset_low => LatchState::Clear,
            other => other,
        };
        self.nmi = match self.nmi {
            LatchState::Detected => LatchState::Pending,
            LatchState::Serviced if !nmi_low => LatchState::Clear,
            other => other,
        };
        self.irq = match self.irq {
            LatchState::Detected if irq_low => LatchState::Pending,
            LatchState::Detected | LatchState::Pending if !irq_low => LatchState::Clear,
            other => other,
        };
    }

    /// Instruction poll point (spec.md §4.3 "Polling point"): commit a
    /// `Pending` NMI or IRQ so the *next* opcode fetch substitutes BRK.
    /// Branches call this with `false` on a taken, non-page-crossing cycle
    /// to delay IRQ recognition by one instruction.
    pub fn poll(&mut self, i_flag_set: bool) {
        if self.nmi == LatchState::Pending {
            self.nmi = LatchState::Committed;
        }
        if self.irq == LatchState::Pending && !i_flag_set {
            self.irq = LatchState::Committed;
        }
    }

    /// ϕ2-equivalent step: move `Clear` lines to `Detected` if asserted.
    /// `suppress_nmi_irq` is set during the BRK sequence's cycle 6 (the
    /// one-cycle latch delay that lets a RESET hijack the vector fetch).
    pub fn detect(&mut self, reset_low: bool, nmi_low: bool, irq_low: bool, suppress_nmi_irq: bool) {
        if reset_low && self.reset == LatchState::Clear {
            self.reset = LatchState::Detected;
        }
        if suppress_nmi_irq {
            return;
        }
        if nmi_low && self.nmi == LatchState::Clear {
            self.nmi = LatchState::Detected;
        }
        if irq_low && self.irq == LatchState::Clear {
            self.irq = LatchState::Detected;
        }
    }

    /// Highest-priority line currently `Committed`, if any (RESET > NMI > IRQ).
    #[must_use]
    pub fn committed(&self) -> Option<InterruptKind> {
        if self.reset == LatchState::Committed {
            Some(InterruptKind::Reset)
        } else if self.nmi == LatchState::Committed {
            Some(InterruptKind::Nmi)
        } else if self.irq == LatchState::Committed {
            Some(InterruptKind::Irq)
        } else {
            None
        }
    }

    /// Mark `kind` serviced: RESET moves to `Serviced` (awaiting line
    /// release), NMI moves to `Serviced` (spec.md: "only when the line is
    /// observed inactive again can SERVICED return to CLEAR"), IRQ clears
    /// outright since it is level-triggered and will simply re-detect if
    /// still asserted.
    pub fn mark_serviced(&mut self, kind: InterruptKind) {
        match kind {
            InterruptKind::Reset => self.reset = LatchState::Serviced,
            InterruptKind::Nmi => self.nmi = LatchState::Serviced,
            InterruptKind::Irq => self.irq = LatchState::Clear,
        }
    }

    /// Force every line back to `Clear`. Used by `peek_start` (spec.md
    /// §4.3 "Peek mode").
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }
}

/// Which line is being serviced by the current BRK-shaped sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InterruptKind {
    /// RESET: vector `$FFFC/$FFFD`, highest priority.
    Reset,
    /// NMI: vector `$FFFA/$FFFB`.
    Nmi,
    /// IRQ or software BRK: vector `$FFFE/$FFFF`.
    Irq,
}

impl InterruptKind {
    /// The vector address this kind fetches its handler from.
    #[must_use]
    pub const fn vector(self) -> u16 {
        match self {
            Self::Reset => 0xFFFC,
            Self::Nmi => 0xFFFA,
            Self::Irq => 0xFFFE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nmi_edge_latches_and_survives_line_release() {
        let mut lines = Lines::default();
        lines.detect(false, true, false, false);
        assert_eq!(lines.nmi, LatchState::Detected);
        lines.latch(false, false, false); // line released, already latched
        assert_eq!(lines.nmi, LatchState::Pending);
        lines.poll(false);
        assert_eq!(lines.nmi, LatchState::Committed);
    }

    #[test]
    fn irq_level_clears_if_line_released_before_poll() {
        let mut lines = Lines::default();
        lines.detect(false, false, true, false);
        assert_eq!(lines.irq, LatchState::Detected);
        lines.latch(false, false, false); // line released
        assert_eq!(lines.irq, LatchState::Clear);
    }

    #[test]
    fn irq_masked_by_i_flag_stays_pending_until_poll() {
        let mut lines = Lines::default();
        lines.detect(false, false, true, false);
        lines.latch(false, false, true); // still low: Detected -> Pending
        assert_eq!(lines.irq, LatchState::Pending);
        lines.poll(true); // I set: stays pending, never committed
        assert_eq!(lines.irq, LatchState::Pending);
        lines.poll(false); // I cleared
        assert_eq!(lines.irq, LatchState::Committed);
    }

    #[test]
    fn reset_priority_over_nmi_and_irq() {
        let mut lines = Lines {
            reset: LatchState::Pending,
            nmi: LatchState::Committed,
            irq: LatchState::Committed,
        };
        lines.latch(false, false, false);
        assert_eq!(lines.committed(), Some(InterruptKind::Reset));
    }
}
