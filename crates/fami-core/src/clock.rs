//! Master clock: a divider-based fan-out scheduler.

use std::time::Duration;

/// Default steps per cooperative batch.
const DEFAULT_YIELD_INTERVAL: u32 = 10_000;

/// Default host yield between batches.
const DEFAULT_YIELD_DELAY: Duration = Duration::from_millis(15);

/// Handle for a registered clock consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(usize);

/// The set of slots that fired on one step, in registration order.
#[derive(Debug, Clone, Copy)]
pub struct Fired(u32);

impl Fired {
    /// Whether the given slot fired this step.
    #[must_use]
    pub fn contains(self, id: SlotId) -> bool {
        self.0 & (1 << id.0) != 0
    }
}

#[derive(Debug, Clone)]
struct Slot {
    divider: u32,
    phase: u32,
    countdown: u32,
}

/// Divider-based scheduler fanning a master clock out to consumers.
///
/// Each registered slot carries a countdown initialized to its one-time
/// phase offset. On a step, a slot whose countdown has reached zero fires
/// and reloads `divider - 1`; otherwise the countdown decrements. A slot
/// with divider 1 fires on every step once its phase has elapsed, so over
/// any window a divider-3 slot fires a third as often as a divider-1 slot.
///
/// Slots fire in registration order. The clock reports which slots fired
/// rather than invoking callbacks, so the system owner keeps sole mutable
/// access to its components while dispatching.
#[derive(Debug, Clone)]
pub struct Clock {
    slots: Vec<Slot>,
    steps: u64,
    yield_interval: u32,
    yield_delay: Duration,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::with_batching(DEFAULT_YIELD_INTERVAL, DEFAULT_YIELD_DELAY)
    }

    /// A clock with explicit cooperative-batch parameters.
    #[must_use]
    pub fn with_batching(yield_interval: u32, yield_delay: Duration) -> Self {
        Self {
            slots: Vec::new(),
            steps: 0,
            yield_interval,
            yield_delay,
        }
    }

    /// Register a consumer at `divider`, delayed by a one-time `phase`.
    pub fn register(&mut self, divider: u32, phase: u32) -> SlotId {
        assert!(divider >= 1, "divider must be at least 1");
        assert!(self.slots.len() < 32, "too many clock slots");
        self.slots.push(Slot {
            divider,
            phase,
            countdown: phase,
        });
        SlotId(self.slots.len() - 1)
    }

    /// One master step. Returns the slots due this step.
    pub fn step(&mut self) -> Fired {
        let mut fired = 0u32;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.countdown == 0 {
                fired |= 1 << i;
                slot.countdown = slot.divider - 1;
            } else {
                slot.countdown -= 1;
            }
        }
        self.steps += 1;
        Fired(fired)
    }

    /// Restore every slot to its initial phase and zero the step counter.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.countdown = slot.phase;
        }
        self.steps = 0;
    }

    /// Master steps executed since construction or the last reset.
    #[must_use]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Steps per cooperative batch.
    #[must_use]
    pub fn yield_interval(&self) -> u32 {
        self.yield_interval
    }

    /// Host yield between batches.
    #[must_use]
    pub fn yield_delay(&self) -> Duration {
        self.yield_delay
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divider_one_fires_every_step() {
        let mut clock = Clock::new();
        let slot = clock.register(1, 0);
        let mut count = 0;
        for _ in 0..100 {
            if clock.step().contains(slot) {
                count += 1;
            }
        }
        assert_eq!(count, 100);
    }

    #[test]
    fn divider_three_fires_a_third_as_often() {
        let mut clock = Clock::new();
        let cpu = clock.register(3, 0);
        let ppu = clock.register(1, 0);
        let mut cpu_ticks = 0u32;
        let mut ppu_ticks = 0u32;
        for _ in 0..3000 {
            let fired = clock.step();
            if fired.contains(cpu) {
                cpu_ticks += 1;
            }
            if fired.contains(ppu) {
                ppu_ticks += 1;
            }
        }
        assert_eq!(cpu_ticks, 1000);
        assert_eq!(ppu_ticks, 3000);
    }

    #[test]
    fn phase_delays_first_fire_only() {
        let mut clock = Clock::new();
        let slot = clock.register(1, 1);
        assert!(!clock.step().contains(slot));
        for _ in 0..10 {
            assert!(clock.step().contains(slot));
        }
    }

    #[test]
    fn ratio_holds_for_any_window() {
        let mut clock = Clock::new();
        let cpu = clock.register(3, 0);
        let ppu = clock.register(1, 1);
        for n in [1u32, 2, 7, 100, 262] {
            clock.reset();
            let mut cpu_ticks = 0i64;
            let mut ppu_ticks = 0i64;
            for _ in 0..n {
                let fired = clock.step();
                cpu_ticks += i64::from(fired.contains(cpu));
                ppu_ticks += i64::from(fired.contains(ppu));
            }
            assert!((cpu_ticks - i64::from(n / 3)).abs() <= 1, "window {n}");
            assert!((ppu_ticks - i64::from(n)).abs() <= 1, "window {n}");
        }
    }

    #[test]
    fn reset_restores_phase() {
        let mut clock = Clock::new();
        let slot = clock.register(1, 1);
        clock.step();
        clock.step();
        clock.reset();
        assert_eq!(clock.steps(), 0);
        assert!(!clock.step().contains(slot));
        assert!(clock.step().contains(slot));
    }
}
