use std::collections::HashSet;

use prizewheel_shared::{
    CreateSessionRequest, Participant, RecordedWinner, RewardSession, SessionFileData,
    SessionStatus, WinnerReport,
};
use rand::Rng;

use crate::error::StoreError;
use crate::sessions::{new_session_id, new_trigger_marker};

pub const MAX_PARTICIPANTS: usize = 1000;
pub const MAX_HISTORY: usize = 500;
const MAX_FIELD_LEN: usize = 128;
const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug)]
pub enum WinnerOutcome {
    Recorded(RewardSession),
    /// The session already had a winner; the stored one is returned untouched.
    AlreadyRecorded(RewardSession),
}

impl WinnerOutcome {
    pub fn into_session(self) -> RewardSession {
        match self {
            WinnerOutcome::Recorded(session) | WinnerOutcome::AlreadyRecorded(session) => session,
        }
    }
}

/// The single source of truth for reward sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Vec<RewardSession>,
    active_id: Option<String>,
    dirty: bool,
}

impl SessionStore {
    pub fn from_snapshot(data: SessionFileData) -> Self {
        let active_id = data
            .active_id
            .filter(|id| data.sessions.iter().any(|session| &session.id == id));
        Self {
            sessions: data.sessions,
            active_id,
            dirty: false,
        }
    }

    pub fn snapshot(&self) -> SessionFileData {
        SessionFileData {
            sessions: self.sessions.clone(),
            active_id: self.active_id.clone(),
        }
    }

    /// Snapshot to persist if anything changed since the last call.
    pub fn take_dirty(&mut self) -> Option<SessionFileData> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.snapshot())
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn active(&self) -> Option<&RewardSession> {
        let id = self.active_id.as_deref()?;
        self.get(id)
    }

    pub fn get(&self, id: &str) -> Option<&RewardSession> {
        self.sessions.iter().find(|session| session.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut RewardSession, StoreError> {
        self.sessions
            .iter_mut()
            .find(|session| session.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Every known session, newest first.
    pub fn history(&self) -> Vec<RewardSession> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by(|a, b| {
            b.completed_at
                .unwrap_or(b.created_at)
                .cmp(&a.completed_at.unwrap_or(a.created_at))
        });
        sessions
    }

    /// Creates a session and makes it the active one.
    pub fn create(
        &mut self,
        request: CreateSessionRequest,
        now_ms: u64,
    ) -> Result<RewardSession, StoreError> {
        let title = sanitize_text(&request.title, MAX_FIELD_LEN);
        if title.is_empty() {
            return Err(StoreError::Invalid("title must not be empty".into()));
        }
        if request.participants.len() > MAX_PARTICIPANTS {
            return Err(StoreError::Invalid(format!(
                "at most {MAX_PARTICIPANTS} participants are allowed"
            )));
        }
        let session = RewardSession {
            id: new_session_id(),
            title,
            description: sanitize_text(&request.description, MAX_DESCRIPTION_LEN),
            banner: request
                .banner
                .map(|banner| sanitize_text(&banner, MAX_DESCRIPTION_LEN))
                .filter(|banner| !banner.is_empty()),
            participants: sanitize_participants(request.participants),
            status: SessionStatus::Active,
            trigger_marker: None,
            committed_index: None,
            winner: None,
            created_at: now_ms,
            triggered_at: None,
            completed_at: None,
        };
        self.active_id = Some(session.id.clone());
        self.sessions.push(session.clone());
        self.prune();
        self.dirty = true;
        Ok(session)
    }

    /// Starts a draw: fresh marker plus a committed index fixed right now.
    pub fn trigger<R: Rng + ?Sized>(
        &mut self,
        id: &str,
        now_ms: u64,
        rng: &mut R,
    ) -> Result<RewardSession, StoreError> {
        let session = self.get_mut(id)?;
        if session.is_completed() {
            return Err(StoreError::AlreadyCompleted(id.to_string()));
        }
        if session.in_flight_marker().is_some() {
            return Err(StoreError::DrawInFlight(id.to_string()));
        }
        if session.participants.is_empty() {
            return Err(StoreError::EmptyRoster(id.to_string()));
        }
        session.trigger_marker = Some(new_trigger_marker());
        session.committed_index = Some(rng.gen_range(0..session.participants.len()));
        session.triggered_at = Some(now_ms);
        let session = session.clone();
        self.dirty = true;
        Ok(session)
    }

    /// Set-once winner write. Only the first accepted report completes the session.
    pub fn record_winner(
        &mut self,
        id: &str,
        report: WinnerReport,
        now_ms: u64,
    ) -> Result<WinnerOutcome, StoreError> {
        let session = self.get_mut(id)?;
        if session.winner.is_some() || session.is_completed() {
            return Ok(WinnerOutcome::AlreadyRecorded(session.clone()));
        }
        if session.trigger_marker.is_none() {
            return Err(StoreError::NoDrawInFlight(id.to_string()));
        }
        let index = report.winner.index;
        let len = session.participants.len();
        let Some(participant) = session.participants.get(index) else {
            return Err(StoreError::IndexOutOfRange { index, len });
        };
        if let Some(expected) = session.committed_index {
            if expected != index {
                return Err(StoreError::CommitmentMismatch {
                    expected,
                    got: index,
                });
            }
        }
        if participant.name != report.winner.name {
            return Err(StoreError::ParticipantMismatch {
                name: report.winner.name,
                index,
            });
        }
        session.winner = Some(RecordedWinner::new(participant, index));
        session.status = SessionStatus::Completed;
        session.completed_at = Some(now_ms);
        let session = session.clone();
        self.dirty = true;
        Ok(WinnerOutcome::Recorded(session))
    }

    /// Clears the active slot. The session itself stays in history.
    pub fn close_active(&mut self) -> Result<RewardSession, StoreError> {
        let id = self.active_id.take().ok_or(StoreError::NoActiveSession)?;
        self.dirty = true;
        self.get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn prune(&mut self) {
        let overflow = self.sessions.len().saturating_sub(MAX_HISTORY);
        if overflow == 0 {
            return;
        }
        let active_id = self.active_id.clone();
        let mut removable = self
            .sessions
            .iter()
            .filter(|session| Some(&session.id) != active_id.as_ref())
            .map(|session| session.id.clone())
            .take(overflow)
            .collect::<HashSet<_>>();
        self.sessions
            .retain(|session| !removable.remove(&session.id));
    }
}

fn sanitize_text(value: &str, max_len: usize) -> String {
    let mut value = value.trim().to_string();
    if value.len() > max_len {
        let mut end = max_len;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        value.truncate(end);
    }
    value
}

fn sanitize_participants(participants: Vec<Participant>) -> Vec<Participant> {
    participants
        .into_iter()
        .filter_map(|participant| {
            let name = sanitize_text(&participant.name, MAX_FIELD_LEN);
            if name.is_empty() {
                return None;
            }
            Some(Participant {
                name,
                contact: sanitize_text(&participant.contact, MAX_FIELD_LEN),
            })
        })
        .collect()
}
