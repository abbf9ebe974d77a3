//! Run-test delays with clocking time compensation.
//!
//! Clocking TCK through GPIO registers is slow enough to matter: thousands of cycles take
//! milliseconds. When an engine asks for a delay that also requires clock cycles, the time
//! spent clocking is subtracted from the delay, otherwise long vector files drift.
use std::time::{Duration, Instant};

use crate::{gpio::RegisterAccess, signals::JtagSignals};

/// Time source and sleep primitive used for delays.
pub trait Clock {
    /// Monotonic time since some fixed origin.
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

/// [`Clock`] backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration)
    }
}

/// Wait `usecs` microseconds, clocking `num_tck` TCK cycles with TMS at `tms` first.
///
/// The time spent clocking is deducted from the wait. Negative delays and cycle counts are
/// treated as zero. Returns the time actually slept.
pub fn compensated_delay<R: RegisterAccess, C: Clock + ?Sized>(
    signals: &JtagSignals<R>,
    clock: &C,
    usecs: i64,
    tms: bool,
    num_tck: i64,
) -> Duration {
    let mut remaining = Duration::from_micros(usecs.max(0) as u64);

    if num_tck > 0 {
        let start = clock.now();
        signals.drive_tms(tms);
        for _ in 0..num_tck {
            signals.cycle_tck();
        }
        let elapsed = clock.now().saturating_sub(start);
        remaining = remaining.saturating_sub(elapsed);
        log::trace!(
            "Clocked {} cycles in {}us, {}us left to wait",
            num_tck,
            elapsed.as_micros(),
            remaining.as_micros()
        );
    }

    if !remaining.is_zero() {
        clock.sleep(remaining);
    }
    remaining
}
