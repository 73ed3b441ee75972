//! Millisecond time sources for timestamp correlation.

/// Monotonic millisecond clock read from interrupt context.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

impl<F> Clock for F
where
    F: Fn() -> u64,
{
    #[inline]
    fn now_ms(&self) -> u64 {
        self()
    }
}

#[cfg(any(
    target_has_atomic = "64",
    feature = "portable-atomic-unsafe-assume-single-core",
    feature = "portable-atomic-critical-section",
))]
pub use tick::TickClock;

#[cfg(any(
    target_has_atomic = "64",
    feature = "portable-atomic-unsafe-assume-single-core",
    feature = "portable-atomic-critical-section",
))]
mod tick {
    use super::Clock;
    use crate::sync::{AtomicU64, Ordering};

    /// Counter advanced by a periodic tick interrupt (SysTick at 1 kHz).
    ///
    /// ```
    /// use ph_serial::{Clock, TickClock};
    ///
    /// static CLOCK: TickClock = TickClock::new();
    ///
    /// CLOCK.tick();
    /// CLOCK.tick();
    /// assert_eq!(CLOCK.now_ms(), 2);
    /// ```
    pub struct TickClock {
        ticks: AtomicU64,
    }

    impl TickClock {
        pub const fn new() -> Self {
            Self {
                ticks: AtomicU64::new(0),
            }
        }

        /// Call from the tick handler.
        #[inline]
        pub fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Default for TickClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for TickClock {
        #[inline]
        fn now_ms(&self) -> u64 {
            self.ticks.load(Ordering::Relaxed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_clocks() {
        let clock = || 1234u64;
        assert_eq!(clock.now_ms(), 1234);
    }

    #[test]
    fn tick_clock_counts_ticks() {
        let clock = TickClock::new();
        for _ in 0..5 {
            clock.tick();
        }
        assert_eq!(clock.now_ms(), 5);
    }
}
