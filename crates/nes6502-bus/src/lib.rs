//! Pluggable multi-device address bus for the nes6502 core.
//!
//! The bus owns an ordered, non-overlapping partition table. Each partition
//! maps to one [`Device`]; lookup is a descending scan for the partition
//! whose start address is the largest one `<= addr`. Partitions are sparse
//! and static (the NES memory map has 2-4 of them), so a linear scan beats
//! the complexity of an interval tree.

#![warn(missing_docs)]

mod bitutil;
mod device;

pub use bitutil::{bytecopy_bank, pack_word, shuffle, unpack_dword, unpack_word, word_bytes};
pub use device::{Device, NullDevice};

/// Errors returned by bus construction and partition mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// Address lies outside `0..=max_addr` for this bus's bit width.
    #[error("address 0x{0:04X} exceeds bus width")]
    OutOfRange(u32),
    /// Partition start addresses were not strictly increasing, or the first
    /// partition did not start at zero.
    #[error("partition table is not well-formed (must start at 0 and be strictly increasing)")]
    BadPartitionTable,
}

/// One partition of the address space, owning a single [`Device`].
struct Partition {
    start: u32,
    device: Box<dyn Device>,
}

/// Multi-device address bus.
///
/// Construction fixes the bit width and the partition boundaries; after
/// that, only the device installed at each partition can change, via
/// [`Bus::set`], [`Bus::swap`], and [`Bus::clear`].
pub struct Bus {
    bitwidth: u8,
    max_addr: u32,
    partitions: Vec<Partition>,
    /// Set for one cycle after an out-of-range read/write; cleared by the
    /// CPU at the start of the next cycle (see `nes6502-cpu`'s `bflt` field).
    fault: bool,
}

impl Bus {
    /// Create a bus with the given bit width (1..=16) and partition starts.
    ///
    /// `partitions` must begin with `0` and be strictly increasing. Every
    /// partition starts out holding a [`NullDevice`] (reads miss, writes are
    /// dropped).
    ///
    /// # Panics
    ///
    /// Panics if `bitwidth` is not in `1..=16` or the partition table is
    /// malformed — these are programmer errors, not runtime conditions.
    #[must_use]
    pub fn new(bitwidth: u8, partitions: &[u32]) -> Self {
        assert!((1..=16).contains(&bitwidth), "bitwidth must be 1..=16");
        assert!(
            Self::well_formed(partitions),
            "partition table must start at 0 and be strictly increasing"
        );
        let max_addr = if bitwidth == 16 {
            0xFFFF
        } else {
            (1u32 << bitwidth) - 1
        };
        let parts = partitions
            .iter()
            .map(|&start| Partition {
                start,
                device: Box::new(NullDevice),
            })
            .collect();
        Self {
            bitwidth,
            max_addr,
            partitions: parts,
            fault: false,
        }
    }

    fn well_formed(partitions: &[u32]) -> bool {
        match partitions.first() {
            Some(0) => {}
            _ => return false,
        }
        partitions.windows(2).all(|w| w[0] < w[1])
    }

    /// Bit width this bus was constructed with.
    #[must_use]
    pub const fn bitwidth(&self) -> u8 {
        self.bitwidth
    }

    /// Largest valid address, `2^bitwidth - 1`.
    #[must_use]
    pub const fn max_addr(&self) -> u32 {
        self.max_addr
    }

    /// Whether the most recently attempted access latched a bus fault.
    ///
    /// The CPU clears this at the start of every cycle (spec.md §4.3 step 4)
    /// before performing that cycle's own access.
    #[must_use]
    pub const fn faulted(&self) -> bool {
        self.fault
    }

    /// Clear the latched bus fault. Called once per CPU cycle.
    pub fn clear_fault(&mut self) {
        self.fault = false;
    }

    /// Index of the partition owning `addr`, if `addr` is in range.
    fn partition_index(&self, addr: u32) -> Option<usize> {
        if addr > self.max_addr {
            return None;
        }
        self.partitions
            .iter()
            .rposition(|p| p.start <= addr)
    }

    /// Install `device` at the partition containing `addr`.
    ///
    /// Returns `false` (and does not modify the bus) if `addr` is out of
    /// range.
    pub fn set(&mut self, addr: u32, device: Box<dyn Device>) -> bool {
        match self.partition_index(addr) {
            Some(i) => {
                self.partitions[i].device = device;
                true
            }
            None => false,
        }
    }

    /// Install `device` at the partition containing `addr`, returning the
    /// device that was previously installed there.
    ///
    /// Used by the debugger's reset-vector decorator (spec.md §4.5) to wrap
    /// and later restore the device backing `$FFFC`/`$FFFD`.
    pub fn swap(&mut self, addr: u32, device: Box<dyn Device>) -> Option<Box<dyn Device>> {
        let i = self.partition_index(addr)?;
        Some(std::mem::replace(&mut self.partitions[i].device, device))
    }

    /// Remove the device installed at the partition containing `addr`,
    /// replacing it with a [`NullDevice`].
    ///
    /// Returns `false` if `addr` is out of range.
    pub fn clear(&mut self, addr: u32) -> bool {
        self.set(addr, Box::new(NullDevice))
    }

    /// Read one byte. Out-of-range addresses latch a bus fault and return
    /// `None`; an in-range address with no responding device also returns
    /// `None` (a device "miss") but does not fault.
    pub fn read(&mut self, addr: u32) -> Option<u8> {
        let Some(i) = self.partition_index(addr) else {
            self.fault = true;
            log::trace!("bus fault: read out of range at {addr:#06X}");
            return None;
        };
        self.partitions[i].device.read(addr)
    }

    /// Write one byte. Returns `false` on out-of-range address (latching a
    /// fault) or if the device declined the write.
    pub fn write(&mut self, addr: u32, value: u8) -> bool {
        let Some(i) = self.partition_index(addr) else {
            self.fault = true;
            log::trace!("bus fault: write out of range at {addr:#06X}");
            return false;
        };
        self.partitions[i].device.write(addr, value)
    }

    /// Bulk, state-preserving copy used by snapshots and the disassembler's
    /// peek engine. Returns the number of bytes actually copied.
    pub fn dma(&mut self, addr: u32, count: usize, dest: &mut [u8]) -> usize {
        let Some(i) = self.partition_index(addr) else {
            return 0;
        };
        self.partitions[i].device.dma(addr, count, dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ram(Vec<u8>);
    impl Device for Ram {
        fn read(&mut self, addr: u32) -> Option<u8> {
            self.0.get(addr as usize).copied()
        }
        fn write(&mut self, addr: u32, value: u8) -> bool {
            if let Some(slot) = self.0.get_mut(addr as usize) {
                *slot = value;
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn dispatches_to_owning_partition() {
        let mut bus = Bus::new(16, &[0, 0x2000, 0x8000]);
        bus.set(0, Box::new(Ram(vec![0; 0x2000])));
        bus.set(0x2000, Box::new(Ram(vec![0; 0x6000])));
        bus.set(0x8000, Box::new(Ram(vec![0xEA; 0x8000])));

        assert!(bus.write(0x10, 0x42));
        assert_eq!(bus.read(0x10), Some(0x42));
        assert_eq!(bus.read(0x8000), Some(0xEA));
        // 0x1FFF is still owned by the first partition, not the second.
        assert!(bus.write(0x1FFF, 7));
        assert_eq!(bus.read(0x1FFF), Some(7));
    }

    #[test]
    fn out_of_range_faults() {
        let mut bus = Bus::new(8, &[0]);
        bus.set(0, Box::new(Ram(vec![0; 256])));
        assert_eq!(bus.read(0x100), None);
        assert!(bus.faulted());
        bus.clear_fault();
        assert!(!bus.faulted());
    }

    #[test]
    fn swap_returns_previous_device() {
        let mut bus = Bus::new(16, &[0]);
        bus.set(0, Box::new(Ram(vec![1; 0x10000])));
        let prev = bus.swap(0, Box::new(NullDevice));
        assert!(prev.is_some());
        assert_eq!(bus.read(0), None);
    }

    #[test]
    fn max_addr_matches_bitwidth() {
        assert_eq!(Bus::new(11, &[0]).max_addr(), 0x7FF);
        assert_eq!(Bus::new(16, &[0]).max_addr(), 0xFFFF);
    }
}
