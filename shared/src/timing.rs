pub const POLL_INTERVAL_MS: u32 = 3_000;
pub const COUNTDOWN_TICKS: u32 = 10;
pub const COUNTDOWN_TICK_MS: f64 = 1_000.0;
pub const SPIN_DURATION_MS: f64 = 7_000.0;
pub const MIN_FULL_SPINS: u32 = 12;
pub const MAX_FULL_SPINS: u32 = 16;
pub const REPORT_DELAY_MS: f64 = 1_500.0;
pub const REVEAL_HOLD_MS: f64 = 5_000.0;

/// Millisecond wall clock driving countdowns and spins.
pub trait Clock {
    fn now_ms(&self) -> f64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> f64 {
        (**self).now_ms()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawTimings {
    pub poll_interval_ms: u32,
    pub countdown_ticks: u32,
    pub countdown_tick_ms: f64,
    pub spin_duration_ms: f64,
    pub min_full_spins: u32,
    pub max_full_spins: u32,
    /// Offset into the reveal hold at which the winner is reported.
    pub report_delay_ms: f64,
    pub reveal_hold_ms: f64,
}

impl Default for DrawTimings {
    fn default() -> Self {
        Self {
            poll_interval_ms: POLL_INTERVAL_MS,
            countdown_ticks: COUNTDOWN_TICKS,
            countdown_tick_ms: COUNTDOWN_TICK_MS,
            spin_duration_ms: SPIN_DURATION_MS,
            min_full_spins: MIN_FULL_SPINS,
            max_full_spins: MAX_FULL_SPINS,
            report_delay_ms: REPORT_DELAY_MS,
            reveal_hold_ms: REVEAL_HOLD_MS,
        }
    }
}

impl DrawTimings {
    pub fn countdown_ms(&self) -> f64 {
        self.countdown_ticks as f64 * self.countdown_tick_ms
    }

    /// Time from trigger observation until the cycle is Idle again.
    pub fn cycle_ms(&self) -> f64 {
        self.countdown_ms() + self.spin_duration_ms + self.reveal_hold_ms
    }
}

#[cfg(test)]
pub mod fake {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::Clock;

    #[derive(Clone, Default)]
    pub struct FakeClock {
        now: Rc<Cell<f64>>,
    }

    impl FakeClock {
        pub fn at(now_ms: f64) -> Self {
            Self {
                now: Rc::new(Cell::new(now_ms)),
            }
        }

        pub fn advance(&self, ms: f64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> f64 {
            self.now.get()
        }
    }
}
