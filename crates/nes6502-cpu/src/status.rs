//! CPU status register (`P`) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! ```
//!
//! `B` and `U` (bit 5) are never stored in [`Status`]; they exist only as the
//! two synthesized bits of [`Status::to_stack_byte`] (spec.md §3: "B and
//! bit-5 are synthesized, never stored").

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// The six status flags actually latched in the CPU's `P` register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable (masks IRQ, not NMI).
        const I = 1 << 2;
        /// Decimal mode.
        const D = 1 << 3;
        /// Overflow.
        const V = 1 << 6;
        /// Negative.
        const N = 1 << 7;
    }
}

/// The two bits that exist only when `P` is pushed to the stack.
const BREAK_BIT: u8 = 1 << 4;
const UNUSED_BIT: u8 = 1 << 5;

impl Status {
    /// Power-on / post-RESET value: I set, all else clear.
    pub const POWER_ON: Self = Self::I;

    /// Mask of flags PLP/RTI are allowed to change (all six).
    pub const PLP_MASK: Self = Self::C.union(Self::Z).union(Self::I).union(Self::D).union(Self::V).union(Self::N);

    /// Set or clear Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Render as the byte pushed to the stack by PHP/BRK/IRQ/NMI.
    ///
    /// `software_break` is true for PHP and BRK, false for IRQ/NMI/RESET
    /// (spec.md §4.3 "BRK sequence").
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, software_break: bool) -> u8 {
        let mut value = self.bits() | UNUSED_BIT;
        if software_break {
            value |= BREAK_BIT;
        }
        value
    }

    /// Reconstruct from a byte pulled by PLP/RTI. `B` and bit 5 are discarded
    /// since they are not part of the latched register.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate(value & !(BREAK_BIT | UNUSED_BIT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_sets_only_i() {
        assert_eq!(Status::POWER_ON, Status::I);
    }

    #[test]
    fn set_zn_zero_and_negative() {
        let mut p = Status::empty();
        p.set_zn(0);
        assert!(p.contains(Status::Z) && !p.contains(Status::N));
        p.set_zn(0x80);
        assert!(!p.contains(Status::Z) && p.contains(Status::N));
        p.set_zn(0x42);
        assert!(!p.contains(Status::Z) && !p.contains(Status::N));
    }

    #[test]
    fn stack_byte_round_trip_clears_break_and_unused() {
        let p = Status::C | Status::V;
        let pushed_sw = p.to_stack_byte(true);
        assert_eq!(pushed_sw & BREAK_BIT, BREAK_BIT);
        assert_eq!(pushed_sw & UNUSED_BIT, UNUSED_BIT);
        let pushed_hw = p.to_stack_byte(false);
        assert_eq!(pushed_hw & BREAK_BIT, 0);

        let pulled = Status::from_stack_byte(pushed_sw);
        assert_eq!(pulled, p);
    }

    #[test]
    fn from_stack_byte_all_ones() {
        let p = Status::from_stack_byte(0xFF);
        assert_eq!(p, Status::C | Status::Z | Status::I | Status::D | Status::V | Status::N);
    }
}
