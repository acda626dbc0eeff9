use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prizewheel_shared::ApiResponse;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("reward session {0} not found")]
    NotFound(String),
    #[error("no active reward session")]
    NoActiveSession,
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("reward session {0} has no participants")]
    EmptyRoster(String),
    #[error("reward session {0} is already completed")]
    AlreadyCompleted(String),
    #[error("reward session {0} already has a draw in flight")]
    DrawInFlight(String),
    #[error("reward session {0} has no draw in flight")]
    NoDrawInFlight(String),
    #[error("winner index {index} is outside a roster of {len}")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("winner index {got} does not match the committed index {expected}")]
    CommitmentMismatch { expected: usize, got: usize },
    #[error("winner {name:?} is not participant {index}")]
    ParticipantMismatch { name: String, index: usize },
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::NotFound(_) | StoreError::NoActiveSession => StatusCode::NOT_FOUND,
            StoreError::Invalid(_)
            | StoreError::EmptyRoster(_)
            | StoreError::IndexOutOfRange { .. }
            | StoreError::CommitmentMismatch { .. }
            | StoreError::ParticipantMismatch { .. } => StatusCode::BAD_REQUEST,
            StoreError::AlreadyCompleted(_)
            | StoreError::DrawInFlight(_)
            | StoreError::NoDrawInFlight(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::CONFLICT {
            log::warn!("request rejected status={} error={self}", status.as_u16());
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}
