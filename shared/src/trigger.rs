/// Outcome of comparing a freshly polled marker with the remembered one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerDecision {
    /// No session or no pending marker; the remembered marker was cleared.
    Reset,
    /// A marker this viewer has not started a draw for yet.
    Start(String),
    Unchanged,
}

/// Remembers the last marker a draw cycle was started for.
///
/// `observe` never commits a new marker on its own: the caller commits once the
/// cycle has actually started, so a marker seen while the wheel is busy stays
/// pending and is picked up on a later poll.
#[derive(Clone, Debug, Default)]
pub struct TriggerDetector {
    last_marker: Option<String>,
}

impl TriggerDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_marker(&self) -> Option<&str> {
        self.last_marker.as_deref()
    }

    pub fn observe(&mut self, marker: Option<&str>) -> TriggerDecision {
        match marker {
            None => {
                self.last_marker = None;
                TriggerDecision::Reset
            }
            Some(marker) if self.last_marker.as_deref() == Some(marker) => {
                TriggerDecision::Unchanged
            }
            Some(marker) => TriggerDecision::Start(marker.to_string()),
        }
    }

    pub fn commit(&mut self, marker: String) {
        self.last_marker = Some(marker);
    }

    pub fn reset(&mut self) {
        self.last_marker = None;
    }
}
