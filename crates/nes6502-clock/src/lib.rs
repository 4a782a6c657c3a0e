//! Wall-clock to CPU-cycle budget conversion (spec.md §4.6).
//!
//! A [`Clock`] turns elapsed wall-clock time into a whole number of CPU
//! cycles a harness is allowed to run, banking any fractional remainder
//! for the next tick instead of losing it to rounding.

#![warn(missing_docs)]

use std::time::Instant;

use nes6502_debug::ClockSample;

/// Cycle rate below which real-time playback stops being meaningful.
pub const MIN_CPS: u32 = 1;
/// Cycle rate ceiling; well above any real 6502 part, just a sanity bound.
pub const MAX_CPS: u32 = 100_000_000;
/// Frame-rate floor accepted by callers that scale the budget by frame.
pub const MIN_FPS: u32 = 1;
/// Frame-rate ceiling accepted by callers that scale the budget by frame.
pub const MAX_FPS: u32 = 1000;

const MS_PER_SEC: f64 = 1000.0;

/// Converts elapsed wall-clock time into a cycle budget at a fixed rate.
///
/// `tick_start`/`tick_end` bracket one frame of host time; in between, a
/// harness calls [`Clock::consume_cycle`] once per `Cpu::cycle` it runs,
/// stopping once the budget is exhausted.
pub struct Clock {
    start: Instant,
    previous: Instant,
    current: Instant,
    cycles: u64,
    frames: u64,
    runtime: f64,
    frametime_ms: f64,
    time_budget_ms: f64,
    budget: i64,
    rate: u32,
}

impl Clock {
    /// A clock ticking at `rate` cycles per second, starting now.
    ///
    /// # Panics
    ///
    /// Panics if `rate` is `0`.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        assert!(rate > 0, "clock rate must be nonzero");
        let now = Instant::now();
        Self {
            start: now,
            previous: now,
            current: now,
            cycles: 0,
            frames: 0,
            runtime: 0.0,
            frametime_ms: 0.0,
            time_budget_ms: 0.0,
            budget: 0,
            rate,
        }
    }

    /// Cycles per second this clock converts wall-clock time at.
    #[must_use]
    pub const fn rate(&self) -> u32 {
        self.rate
    }

    /// Change the cycle rate, clamped to `[MIN_CPS, MAX_CPS]`. Does not
    /// touch any already-banked budget or time.
    pub fn set_rate(&mut self, rate: u32) {
        self.rate = rate.clamp(MIN_CPS, MAX_CPS);
    }

    /// Cycles currently banked and not yet consumed.
    #[must_use]
    pub const fn budget(&self) -> i64 {
        self.budget
    }

    /// Most recent frame's wall-clock duration, in milliseconds.
    #[must_use]
    pub const fn frametime_ms(&self) -> f64 {
        self.frametime_ms
    }

    /// Total frames completed (incremented by `tick_end`).
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Sample the wall clock and convert elapsed time into cycle budget.
    ///
    /// `reset_budget` drops any banked time and budget instead of
    /// accumulating it — used when resuming after a pause, so the gap
    /// doesn't turn into a burst of cycles.
    pub fn tick_start(&mut self, reset_budget: bool) {
        self.current = Instant::now();
        self.frametime_ms = self.current.duration_since(self.previous).as_secs_f64() * MS_PER_SEC;
        self.runtime = self.current.duration_since(self.start).as_secs_f64();

        if reset_budget {
            self.time_budget_ms = 0.0;
            self.budget = 0;
            return;
        }

        self.time_budget_ms = (self.time_budget_ms + self.frametime_ms).min(MS_PER_SEC);

        let ms_per_cycle = MS_PER_SEC / f64::from(self.rate);
        let new_cycles = (self.time_budget_ms / ms_per_cycle) as i64;
        self.budget += new_cycles;
        self.time_budget_ms -= new_cycles as f64 * ms_per_cycle;
    }

    /// Roll `current` into `previous` and advance the frame count. Call
    /// once per frame after the budget for that frame has been spent.
    pub fn tick_end(&mut self) {
        self.previous = self.current;
        self.frames += 1;
    }

    /// Spend one cycle of budget, if any remains. Returns whether a cycle
    /// was available; the caller runs `Cpu::cycle` only when this is
    /// `true`.
    pub fn consume_cycle(&mut self) -> bool {
        if self.budget > 0 {
            self.budget -= 1;
            self.cycles += 1;
            true
        } else {
            false
        }
    }
}

impl ClockSample for Clock {
    fn runtime_secs(&self) -> f64 {
        self.runtime
    }

    fn total_cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn accumulates_budget_from_elapsed_time() {
        let mut clock = Clock::new(1000); // 1 cycle/ms
        sleep(Duration::from_millis(10));
        clock.tick_start(false);
        assert!(clock.budget() >= 8, "expected roughly 10 cycles, got {}", clock.budget());
        clock.tick_end();
        assert_eq!(clock.frames(), 1);
    }

    #[test]
    fn reset_budget_drops_banked_time() {
        let mut clock = Clock::new(1000);
        sleep(Duration::from_millis(10));
        clock.tick_start(true);
        assert_eq!(clock.budget(), 0);
    }

    #[test]
    fn consume_cycle_decrements_budget_and_tracks_total() {
        let mut clock = Clock::new(1000);
        sleep(Duration::from_millis(5));
        clock.tick_start(false);
        let available = clock.budget();
        let mut consumed = 0u64;
        while clock.consume_cycle() {
            consumed += 1;
        }
        assert_eq!(consumed, available as u64);
        assert_eq!(clock.total_cycles(), consumed);
        assert_eq!(clock.budget(), 0);
    }
}
