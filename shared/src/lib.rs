use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod countdown;
pub mod cycle;
pub mod resolver;
pub mod session_format;
pub mod timing;
pub mod trigger;
pub mod viewer;
pub mod wheel;

pub use countdown::Countdown;
pub use cycle::{CycleEvent, CyclePhase, DrawCycle, DrawSnapshot, StartError, WheelFrame};
pub use resolver::{resolve_winner, DrawError, FallbackPolicy, Resolution, ResolutionSource};
pub use session_format::{
    decode_session_file, encode_session_file, SessionFileData, SessionFileDecodeError,
    SessionFileEncodeError,
};
pub use timing::{Clock, DrawTimings};
pub use trigger::{TriggerDecision, TriggerDetector};
pub use viewer::{PollOutcome, SessionViewer};
pub use wheel::{ease_out_quint, SpinPlan, WheelGeometry};

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub contact: String,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "completed")]
    Completed,
}

/// Winner as persisted on a session and as carried in a winner report.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq)]
pub struct RecordedWinner {
    pub name: String,
    pub contact: String,
    pub index: usize,
}

impl RecordedWinner {
    pub fn new(participant: &Participant, index: usize) -> Self {
        Self {
            name: participant.name.clone(),
            contact: participant.contact.clone(),
            index,
        }
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RewardSession {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub banner: Option<String>,
    pub participants: Vec<Participant>,
    pub status: SessionStatus,
    #[serde(default)]
    pub trigger_marker: Option<String>,
    #[serde(default)]
    pub committed_index: Option<usize>,
    #[serde(default)]
    pub winner: Option<RecordedWinner>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub triggered_at: Option<u64>,
    #[serde(default)]
    pub completed_at: Option<u64>,
}

impl RewardSession {
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// Marker of a draw that has been triggered but has no recorded winner yet.
    pub fn in_flight_marker(&self) -> Option<&str> {
        if self.winner.is_some() || self.is_completed() {
            return None;
        }
        self.trigger_marker.as_deref()
    }

    pub fn history_entry(&self) -> Option<HistoryEntry> {
        if !self.is_completed() {
            return None;
        }
        let winner = self.winner.clone()?;
        Some(HistoryEntry {
            session_id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            participant_count: self.participants.len(),
            winner,
            completed_at: self.completed_at,
        })
    }
}

/// Read-only view of a finished draw.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub session_id: String,
    pub title: String,
    pub description: String,
    pub participant_count: usize,
    pub winner: RecordedWinner,
    pub completed_at: Option<u64>,
}

/// Completed sessions out of a history payload, newest first.
pub fn completed_history(sessions: &[RewardSession]) -> Vec<HistoryEntry> {
    let mut entries = sessions
        .iter()
        .filter_map(RewardSession::history_entry)
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    entries
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WinnerReport {
    pub winner: RecordedWinner,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateSessionRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub banner: Option<String>,
    pub participants: Vec<Participant>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(status: SessionStatus, winner: Option<RecordedWinner>) -> RewardSession {
        RewardSession {
            id: "s1".into(),
            title: "Launch raffle".into(),
            description: String::new(),
            banner: None,
            participants: vec![Participant {
                name: "Ada".into(),
                contact: "ada@example.com".into(),
            }],
            status,
            trigger_marker: Some("t1".into()),
            committed_index: Some(0),
            winner,
            created_at: 1,
            triggered_at: Some(2),
            completed_at: None,
        }
    }

    #[test]
    fn in_flight_only_without_winner() {
        let active = session(SessionStatus::Active, None);
        assert_eq!(active.in_flight_marker(), Some("t1"));

        let winner = RecordedWinner::new(&active.participants[0], 0);
        let done = session(SessionStatus::Completed, Some(winner));
        assert_eq!(done.in_flight_marker(), None);
    }

    #[test]
    fn json_uses_camel_case_and_lowercase_status() {
        let value = serde_json::to_value(session(SessionStatus::Active, None)).unwrap();
        assert_eq!(value["status"], "active");
        assert_eq!(value["triggerMarker"], "t1");
        assert_eq!(value["committedIndex"], 0);
    }

    #[test]
    fn winner_report_body_shape() {
        let body = r#"{"winner":{"name":"Ada","contact":"ada@example.com","index":3}}"#;
        let report: WinnerReport = serde_json::from_str(body).unwrap();
        assert_eq!(report.winner.index, 3);
        assert_eq!(report.winner.name, "Ada");
    }

    #[test]
    fn history_keeps_completed_newest_first() {
        let mut older = session(SessionStatus::Completed, None);
        older.winner = Some(RecordedWinner::new(&older.participants[0], 0));
        older.completed_at = Some(10);
        older.id = "older".into();
        let mut newer = older.clone();
        newer.id = "newer".into();
        newer.completed_at = Some(20);
        let active = session(SessionStatus::Active, None);

        let history = completed_history(&[older, active, newer]);
        let ids = history.iter().map(|e| e.session_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["newer", "older"]);
    }
}
