//! Client-local draw cycle: `Idle → CountdownRunning → Spinning → RevealHeld → Idle`.
//!
//! Every transition is derived from the timestamp passed to [`DrawCycle::advance`],
//! so the same inputs always replay the same cycle.

use rand::Rng;

use crate::countdown::Countdown;
use crate::resolver::{resolve_winner, DrawError, FallbackPolicy, Resolution};
use crate::timing::DrawTimings;
use crate::wheel::SpinPlan;
use crate::{Participant, RecordedWinner, RewardSession, WinnerReport};

/// Roster and commitment captured when the trigger was detected.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawSnapshot {
    pub session_id: String,
    pub marker: String,
    pub roster: Vec<Participant>,
    pub committed_index: Option<usize>,
}

impl DrawSnapshot {
    pub fn capture(session: &RewardSession, marker: String) -> Self {
        Self {
            session_id: session.id.clone(),
            marker,
            roster: session.participants.clone(),
            committed_index: session.committed_index,
        }
    }
}

#[derive(Clone, Debug)]
enum Phase {
    Idle,
    CountdownRunning {
        draw: DrawSnapshot,
        countdown: Countdown,
    },
    Spinning {
        draw: DrawSnapshot,
        resolution: Resolution,
        plan: SpinPlan,
    },
    RevealHeld {
        draw: DrawSnapshot,
        resolution: Resolution,
        plan: SpinPlan,
        since_ms: f64,
        reported: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    CountdownRunning,
    Spinning,
    RevealHeld,
}

#[derive(Clone, Debug, PartialEq)]
pub enum CycleEvent {
    SpinStarted {
        marker: String,
        index: usize,
        full_spins: u32,
    },
    Settled {
        marker: String,
        resolution: Resolution,
    },
    /// Post `report` to the store for `session_id`. Emitted once per cycle.
    ReportDue {
        session_id: String,
        report: WinnerReport,
    },
    Finished {
        marker: String,
    },
    Aborted {
        marker: String,
        error: DrawError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("a draw cycle is already running")]
    Busy,
    #[error(transparent)]
    Refused(#[from] DrawError),
}

/// What the renderer should draw at a given instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum WheelFrame<'a> {
    Idle,
    Countdown {
        remaining: u32,
        roster: &'a [Participant],
    },
    Spinning {
        rotation: f64,
        roster: &'a [Participant],
    },
    Reveal {
        rotation: f64,
        roster: &'a [Participant],
        winner: &'a Resolution,
    },
}

#[derive(Clone, Debug)]
pub struct DrawCycle {
    phase: Phase,
    timings: DrawTimings,
    policy: FallbackPolicy,
}

impl DrawCycle {
    pub fn new(timings: DrawTimings, policy: FallbackPolicy) -> Self {
        Self {
            phase: Phase::Idle,
            timings,
            policy,
        }
    }

    pub fn timings(&self) -> &DrawTimings {
        &self.timings
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn phase(&self) -> CyclePhase {
        match self.phase {
            Phase::Idle => CyclePhase::Idle,
            Phase::CountdownRunning { .. } => CyclePhase::CountdownRunning,
            Phase::Spinning { .. } => CyclePhase::Spinning,
            Phase::RevealHeld { .. } => CyclePhase::RevealHeld,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, Phase::Idle)
    }

    pub fn active_marker(&self) -> Option<&str> {
        match &self.phase {
            Phase::Idle => None,
            Phase::CountdownRunning { draw, .. }
            | Phase::Spinning { draw, .. }
            | Phase::RevealHeld { draw, .. } => Some(&draw.marker),
        }
    }

    /// Begins the countdown for `draw`. Only valid from Idle.
    pub fn start(&mut self, draw: DrawSnapshot, now_ms: f64) -> Result<(), StartError> {
        if !self.is_idle() {
            return Err(StartError::Busy);
        }
        if draw.roster.is_empty() {
            return Err(DrawError::EmptyRoster.into());
        }
        match draw.committed_index {
            Some(index) if index >= draw.roster.len() => {
                return Err(DrawError::CommittedIndexOutOfRange {
                    index,
                    len: draw.roster.len(),
                }
                .into());
            }
            None if self.policy == FallbackPolicy::RequireCommitted => {
                return Err(DrawError::MissingCommittedIndex.into());
            }
            _ => {}
        }
        let countdown = Countdown::new(
            now_ms,
            self.timings.countdown_ticks,
            self.timings.countdown_tick_ms,
        );
        self.phase = Phase::CountdownRunning { draw, countdown };
        Ok(())
    }

    /// Applies every transition due at `now_ms`, in order.
    pub fn advance<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> Vec<CycleEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.step(now_ms, rng) {
            events.push(event);
        }
        events
    }

    fn step<R: Rng + ?Sized>(&mut self, now_ms: f64, rng: &mut R) -> Option<CycleEvent> {
        let phase = std::mem::replace(&mut self.phase, Phase::Idle);
        let (phase, event) = match phase {
            Phase::Idle => (Phase::Idle, None),
            Phase::CountdownRunning { draw, countdown } => {
                if !countdown.is_finished(now_ms) {
                    (Phase::CountdownRunning { draw, countdown }, None)
                } else {
                    self.begin_spin(draw, countdown.ends_at_ms(), rng)
                }
            }
            Phase::Spinning {
                draw,
                resolution,
                plan,
            } => {
                if !plan.is_settled(now_ms) {
                    (
                        Phase::Spinning {
                            draw,
                            resolution,
                            plan,
                        },
                        None,
                    )
                } else {
                    let event = CycleEvent::Settled {
                        marker: draw.marker.clone(),
                        resolution: resolution.clone(),
                    };
                    let since_ms = plan.ends_at_ms();
                    (
                        Phase::RevealHeld {
                            draw,
                            resolution,
                            plan,
                            since_ms,
                            reported: false,
                        },
                        Some(event),
                    )
                }
            }
            Phase::RevealHeld {
                draw,
                resolution,
                plan,
                since_ms,
                reported,
            } => {
                let held = now_ms - since_ms;
                if !reported && held >= self.timings.report_delay_ms {
                    let event = CycleEvent::ReportDue {
                        session_id: draw.session_id.clone(),
                        report: WinnerReport {
                            winner: RecordedWinner::new(&resolution.participant, resolution.index),
                        },
                    };
                    (
                        Phase::RevealHeld {
                            draw,
                            resolution,
                            plan,
                            since_ms,
                            reported: true,
                        },
                        Some(event),
                    )
                } else if reported && held >= self.timings.reveal_hold_ms {
                    (Phase::Idle, Some(CycleEvent::Finished { marker: draw.marker }))
                } else {
                    (
                        Phase::RevealHeld {
                            draw,
                            resolution,
                            plan,
                            since_ms,
                            reported,
                        },
                        None,
                    )
                }
            }
        };
        self.phase = phase;
        event
    }

    fn begin_spin<R: Rng + ?Sized>(
        &self,
        draw: DrawSnapshot,
        started_at_ms: f64,
        rng: &mut R,
    ) -> (Phase, Option<CycleEvent>) {
        let resolved = resolve_winner(&draw.roster, draw.committed_index, self.policy, rng);
        let resolution = match resolved {
            Ok(resolution) => resolution,
            Err(error) => {
                return (
                    Phase::Idle,
                    Some(CycleEvent::Aborted {
                        marker: draw.marker,
                        error,
                    }),
                )
            }
        };
        let min = self.timings.min_full_spins;
        let full_spins = rng.gen_range(min..=self.timings.max_full_spins.max(min));
        let Some(plan) = SpinPlan::new(
            draw.roster.len(),
            resolution.index,
            full_spins,
            started_at_ms,
            self.timings.spin_duration_ms,
        ) else {
            return (
                Phase::Idle,
                Some(CycleEvent::Aborted {
                    marker: draw.marker,
                    error: DrawError::EmptyRoster,
                }),
            );
        };
        let event = CycleEvent::SpinStarted {
            marker: draw.marker.clone(),
            index: resolution.index,
            full_spins,
        };
        (
            Phase::Spinning {
                draw,
                resolution,
                plan,
            },
            Some(event),
        )
    }

    pub fn frame(&self, now_ms: f64) -> WheelFrame<'_> {
        match &self.phase {
            Phase::Idle => WheelFrame::Idle,
            Phase::CountdownRunning { draw, countdown } => WheelFrame::Countdown {
                remaining: countdown.remaining(now_ms),
                roster: &draw.roster,
            },
            Phase::Spinning { draw, plan, .. } => WheelFrame::Spinning {
                rotation: plan.rotation_at(now_ms),
                roster: &draw.roster,
            },
            Phase::RevealHeld {
                draw,
                resolution,
                plan,
                ..
            } => WheelFrame::Reveal {
                rotation: plan.target_rotation(),
                roster: &draw.roster,
                winner: resolution,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::wheel::WheelGeometry;

    fn snapshot(n: usize, committed: Option<usize>) -> DrawSnapshot {
        DrawSnapshot {
            session_id: "session-1".into(),
            marker: "t1".into(),
            roster: (0..n)
                .map(|i| Participant {
                    name: format!("p{i}"),
                    contact: format!("@p{i}"),
                })
                .collect(),
            committed_index: committed,
        }
    }

    #[test]
    fn runs_through_every_phase_in_order() {
        let timings = DrawTimings::default();
        let mut cycle = DrawCycle::new(timings, FallbackPolicy::RequireCommitted);
        let mut rng = StdRng::seed_from_u64(7);
        cycle.start(snapshot(5, Some(2)), 0.0).unwrap();
        assert_eq!(cycle.phase(), CyclePhase::CountdownRunning);

        assert!(cycle.advance(9_999.0, &mut rng).is_empty());
        assert_eq!(
            cycle.frame(9_999.0),
            WheelFrame::Countdown {
                remaining: 1,
                roster: &snapshot(5, Some(2)).roster
            }
        );

        let events = cycle.advance(10_000.0, &mut rng);
        assert!(matches!(
            events.as_slice(),
            [CycleEvent::SpinStarted { index: 2, full_spins, .. }] if (12..=16).contains(full_spins)
        ));
        assert_eq!(cycle.phase(), CyclePhase::Spinning);

        let events = cycle.advance(17_000.0, &mut rng);
        assert!(matches!(events.as_slice(), [CycleEvent::Settled { .. }]));
        let WheelFrame::Reveal { rotation, winner, .. } = cycle.frame(17_000.0) else {
            panic!("expected reveal frame");
        };
        assert_eq!(winner.index, 2);
        assert_eq!(WheelGeometry::new(5).unwrap().sector_at_pointer(rotation), 2);

        let events = cycle.advance(18_500.0, &mut rng);
        assert_eq!(
            events,
            vec![CycleEvent::ReportDue {
                session_id: "session-1".into(),
                report: WinnerReport {
                    winner: RecordedWinner {
                        name: "p2".into(),
                        contact: "@p2".into(),
                        index: 2,
                    },
                },
            }]
        );
        assert!(cycle.advance(20_000.0, &mut rng).is_empty());

        let events = cycle.advance(22_000.0, &mut rng);
        assert_eq!(events, vec![CycleEvent::Finished { marker: "t1".into() }]);
        assert!(cycle.is_idle());
    }

    #[test]
    fn a_late_tick_catches_up_in_one_call() {
        let mut cycle = DrawCycle::new(DrawTimings::default(), FallbackPolicy::RequireCommitted);
        let mut rng = StdRng::seed_from_u64(1);
        cycle.start(snapshot(3, Some(0)), 0.0).unwrap();
        let events = cycle.advance(60_000.0, &mut rng);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[2], CycleEvent::ReportDue { .. }));
        assert!(cycle.is_idle());
    }

    #[test]
    fn second_start_is_refused_while_running() {
        let mut cycle = DrawCycle::new(DrawTimings::default(), FallbackPolicy::RequireCommitted);
        let mut rng = StdRng::seed_from_u64(1);
        cycle.start(snapshot(3, Some(1)), 0.0).unwrap();
        assert_eq!(cycle.start(snapshot(3, Some(2)), 500.0), Err(StartError::Busy));
        cycle.advance(12_000.0, &mut rng);
        assert_eq!(cycle.phase(), CyclePhase::Spinning);
        assert_eq!(cycle.start(snapshot(3, Some(2)), 12_000.0), Err(StartError::Busy));
        assert_eq!(cycle.active_marker(), Some("t1"));
    }

    #[test]
    fn empty_roster_never_leaves_idle() {
        let mut cycle = DrawCycle::new(DrawTimings::default(), FallbackPolicy::AllowLocalRandom);
        assert_eq!(
            cycle.start(snapshot(0, None), 0.0),
            Err(StartError::Refused(DrawError::EmptyRoster))
        );
        assert!(cycle.is_idle());
        assert_eq!(cycle.frame(0.0), WheelFrame::Idle);
    }

    #[test]
    fn missing_commitment_is_refused_before_countdown() {
        let mut cycle = DrawCycle::new(DrawTimings::default(), FallbackPolicy::RequireCommitted);
        assert_eq!(
            cycle.start(snapshot(4, None), 0.0),
            Err(StartError::Refused(DrawError::MissingCommittedIndex))
        );
        assert!(cycle.is_idle());
    }

    #[test]
    fn out_of_range_commitment_is_refused_before_countdown() {
        let mut cycle = DrawCycle::new(DrawTimings::default(), FallbackPolicy::AllowLocalRandom);
        assert_eq!(
            cycle.start(snapshot(4, Some(4)), 0.0),
            Err(StartError::Refused(DrawError::CommittedIndexOutOfRange {
                index: 4,
                len: 4
            }))
        );
        assert!(cycle.is_idle());
    }
}
