use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use prizewheel_shared::{ApiResponse, CreateSessionRequest, RewardSession, WinnerReport};

use crate::error::StoreError;
use crate::sessions::{normalize_session_id, now_ms, save_if_dirty};
use crate::state::AppState;
use crate::store::WinnerOutcome;

type ApiResult<T> = Result<Json<ApiResponse<T>>, StoreError>;

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn active_handler(State(state): State<AppState>) -> ApiResult<RewardSession> {
    let store = state.store.read().await;
    Ok(Json(match store.active() {
        Some(session) => ApiResponse::ok(session.clone()),
        None => ApiResponse::empty(),
    }))
}

pub async fn history_handler(State(state): State<AppState>) -> ApiResult<Vec<RewardSession>> {
    let sessions = state.store.read().await.history();
    Ok(Json(ApiResponse::ok(sessions)))
}

pub async fn create_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, StoreError> {
    let session = state.store.write().await.create(request, now_ms())?;
    log::info!(
        "session created id={} title={:?} participants={}",
        session.id,
        session.title,
        session.participants.len()
    );
    persist_in_background(&state);
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(session))))
}

pub async fn trigger_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<RewardSession> {
    let session_id = parse_session_id(&session_id)?;
    let session = {
        let mut store = state.store.write().await;
        store.trigger(&session_id, now_ms(), &mut rand::thread_rng())?
    };
    log::info!(
        "draw triggered id={} marker={:?} committed_index={:?}",
        session.id,
        session.trigger_marker,
        session.committed_index
    );
    persist_in_background(&state);
    Ok(Json(ApiResponse::ok(session)))
}

pub async fn winner_handler(
    Path(session_id): Path<String>,
    State(state): State<AppState>,
    Json(report): Json<WinnerReport>,
) -> ApiResult<RewardSession> {
    let session_id = parse_session_id(&session_id)?;
    let outcome = state
        .store
        .write()
        .await
        .record_winner(&session_id, report, now_ms())?;
    match &outcome {
        WinnerOutcome::Recorded(session) => {
            log::info!(
                "winner recorded id={} winner={:?}",
                session.id,
                session.winner
            );
            persist_in_background(&state);
        }
        WinnerOutcome::AlreadyRecorded(session) => {
            log::info!("duplicate winner ignored id={}", session.id);
        }
    }
    Ok(Json(ApiResponse::ok(outcome.into_session())))
}

pub async fn close_handler(State(state): State<AppState>) -> ApiResult<RewardSession> {
    let session = state.store.write().await.close_active()?;
    log::info!("active session closed id={}", session.id);
    persist_in_background(&state);
    Ok(Json(ApiResponse::ok(session)))
}

fn parse_session_id(value: &str) -> Result<String, StoreError> {
    normalize_session_id(value).ok_or_else(|| StoreError::NotFound(value.to_string()))
}

fn persist_in_background(state: &AppState) {
    let state = state.clone();
    tokio::spawn(async move {
        save_if_dirty(&state).await;
    });
}
