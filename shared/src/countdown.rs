/// Discrete pre-roll started on the viewer's own observation of a trigger.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    started_at_ms: f64,
    ticks: u32,
    tick_ms: f64,
}

impl Countdown {
    pub fn new(started_at_ms: f64, ticks: u32, tick_ms: f64) -> Self {
        Self {
            started_at_ms,
            ticks,
            tick_ms: tick_ms.max(0.0),
        }
    }

    pub fn started_at_ms(&self) -> f64 {
        self.started_at_ms
    }

    pub fn ends_at_ms(&self) -> f64 {
        self.started_at_ms + self.ticks as f64 * self.tick_ms
    }

    /// Count shown to the viewer: `ticks` right after start, 0 once finished.
    pub fn remaining(&self, now_ms: f64) -> u32 {
        if self.is_finished(now_ms) {
            return 0;
        }
        let elapsed = (now_ms - self.started_at_ms).max(0.0);
        let done = (elapsed / self.tick_ms).floor() as u32;
        self.ticks.saturating_sub(done)
    }

    pub fn is_finished(&self, now_ms: f64) -> bool {
        now_ms >= self.ends_at_ms()
    }
}
