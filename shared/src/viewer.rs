use rand::Rng;

use crate::cycle::{CycleEvent, DrawCycle, DrawSnapshot, StartError, WheelFrame};
use crate::resolver::{DrawError, FallbackPolicy};
use crate::timing::{Clock, DrawTimings};
use crate::trigger::{TriggerDecision, TriggerDetector};
use crate::RewardSession;

#[derive(Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// The store has no active session; local state was reset.
    NoSession,
    /// Active session without a draw in flight.
    Waiting,
    Started { marker: String },
    /// Marker already handled by this viewer.
    AlreadySeen,
    /// New marker seen while a cycle is running; retried once Idle.
    Deferred { marker: String },
    /// New marker whose draw cannot run locally, e.g. an empty roster.
    Refused { marker: String, error: DrawError },
}

/// One viewer's local picture of the store plus its draw cycle.
///
/// Several viewers can live in one process; nothing here is global.
pub struct SessionViewer<C> {
    clock: C,
    detector: TriggerDetector,
    cycle: DrawCycle,
    session: Option<RewardSession>,
}

impl<C: Clock> SessionViewer<C> {
    pub fn new(clock: C, timings: DrawTimings, policy: FallbackPolicy) -> Self {
        Self {
            clock,
            detector: TriggerDetector::new(),
            cycle: DrawCycle::new(timings, policy),
            session: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn session(&self) -> Option<&RewardSession> {
        self.session.as_ref()
    }

    pub fn cycle(&self) -> &DrawCycle {
        &self.cycle
    }

    pub fn remembered_marker(&self) -> Option<&str> {
        self.detector.last_marker()
    }

    /// Feeds one successful poll result. Failed polls are simply not applied.
    pub fn apply_poll(&mut self, fetched: Option<RewardSession>) -> PollOutcome {
        let Some(session) = fetched else {
            self.session = None;
            self.detector.reset();
            return PollOutcome::NoSession;
        };
        let decision = self.detector.observe(session.in_flight_marker());
        let outcome = match decision {
            TriggerDecision::Reset => PollOutcome::Waiting,
            TriggerDecision::Unchanged => PollOutcome::AlreadySeen,
            TriggerDecision::Start(marker) => self.start_draw(&session, marker),
        };
        self.session = Some(session);
        outcome
    }

    fn start_draw(&mut self, session: &RewardSession, marker: String) -> PollOutcome {
        let draw = DrawSnapshot::capture(session, marker.clone());
        match self.cycle.start(draw, self.clock.now_ms()) {
            Ok(()) => {
                self.detector.commit(marker.clone());
                PollOutcome::Started { marker }
            }
            Err(StartError::Busy) => PollOutcome::Deferred { marker },
            Err(StartError::Refused(error)) => {
                self.detector.commit(marker.clone());
                PollOutcome::Refused { marker, error }
            }
        }
    }

    /// Advances the draw cycle to the clock's current time.
    pub fn tick<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<CycleEvent> {
        self.cycle.advance(self.clock.now_ms(), rng)
    }

    pub fn frame(&self) -> WheelFrame<'_> {
        self.cycle.frame(self.clock.now_ms())
    }
}
