//! The device contract a bus partition dispatches to.

/// A memory-mapped device pluggable into one [`crate::Bus`] partition.
///
/// All three hooks are optional in spirit (the default `dma` falls back to
/// repeated `read`s) but `read`/`write` must be implemented by any device
/// that wants to respond at all — an uninstalled partition holds a
/// [`NullDevice`], which always misses.
///
/// # Side effects
///
/// `read` may have side effects (e.g. a status register that clears a flag
/// on read). Devices whose reads have side effects must check the CPU's
/// `detached` flag (threaded through by whoever calls the bus on the CPU's
/// behalf) and suppress those side effects while detached, so that the peek
/// engine (spec.md §4.3 "Peek mode") stays non-invasive.
pub trait Device {
    /// Read a byte at `addr`, which is guaranteed to fall within this
    /// device's partition. Returns `None` on a miss (e.g. open PRG-RAM).
    fn read(&mut self, addr: u32) -> Option<u8>;

    /// Write a byte at `addr`. Returns whether the write was accepted.
    fn write(&mut self, addr: u32, value: u8) -> bool;

    /// Bulk read for DMA/snapshot/disassembly use. Must not advance any
    /// internal device state (counters, side-effect flags, etc).
    ///
    /// The default implementation issues `count` plain `read`s, which is
    /// only correct for devices whose `read` is already side-effect free;
    /// devices with side-effecting reads must override this.
    fn dma(&mut self, addr: u32, count: usize, dest: &mut [u8]) -> usize {
        let mut copied = 0;
        for (i, slot) in dest.iter_mut().take(count).enumerate() {
            let Some(byte) = self.read(addr.wrapping_add(i as u32)) else {
                break;
            };
            *slot = byte;
            copied += 1;
        }
        copied
    }
}

/// The device installed in a partition with no caller-supplied backing.
///
/// Reads miss (`None`), writes are refused, and DMA copies nothing. This is
/// never a "dead" state in practice: every partition is assigned a real
/// device at harness construction time, so `NullDevice` only appears
/// transiently (during `Bus::clear`, or before harness wiring completes).
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDevice;

impl Device for NullDevice {
    fn read(&mut self, _addr: u32) -> Option<u8> {
        None
    }

    fn write(&mut self, _addr: u32, _value: u8) -> bool {
        false
    }

    fn dma(&mut self, _addr: u32, _count: usize, _dest: &mut [u8]) -> usize {
        0
    }
}
