use gloo_net::http::{Request, Response};
use gloo_timers::callback::Timeout;
use prizewheel_shared::{ApiResponse, RewardSession, WinnerReport};
use serde::de::DeserializeOwned;
use web_sys::AbortController;

const ACTIVE_URL: &str = "/api/rewards/active";
const HISTORY_URL: &str = "/api/rewards/history";

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("request failed: {0}")]
    Http(#[from] gloo_net::Error),
    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("server rejected the request: {0}")]
    Rejected(String),
    #[error("request timeout could not be armed")]
    Deadline,
}

fn winner_url(session_id: &str) -> String {
    format!("/api/rewards/{session_id}/winner")
}

async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<Option<T>, NetError> {
    let status = response.status();
    let envelope = response.json::<ApiResponse<T>>().await;
    match envelope {
        Ok(envelope) if envelope.success => Ok(envelope.data),
        Ok(envelope) => Err(NetError::Rejected(envelope.message.unwrap_or_default())),
        Err(error) if (200..300).contains(&status) => Err(error.into()),
        Err(error) => Err(NetError::Status {
            status,
            message: error.to_string(),
        }),
    }
}

/// Gives up after `timeout_ms`, body included, so a stuck fetch never blocks the next poll.
pub async fn fetch_active_session(timeout_ms: u32) -> Result<Option<RewardSession>, NetError> {
    let controller = AbortController::new().map_err(|_| NetError::Deadline)?;
    let signal = controller.signal();
    let _deadline = Timeout::new(timeout_ms, move || controller.abort());
    let response = Request::get(ACTIVE_URL)
        .abort_signal(Some(&signal))
        .send()
        .await?;
    read_envelope(response).await
}

pub async fn fetch_history() -> Result<Vec<RewardSession>, NetError> {
    let response = Request::get(HISTORY_URL).send().await?;
    Ok(read_envelope(response).await?.unwrap_or_default())
}

/// Safe to repeat: the store keeps the first winner it accepted.
pub async fn report_winner(
    session_id: &str,
    report: &WinnerReport,
) -> Result<RewardSession, NetError> {
    let response = Request::put(&winner_url(session_id))
        .json(report)?
        .send()
        .await?;
    read_envelope(response).await?.ok_or_else(|| NetError::Status {
        status: 200,
        message: "empty winner response".into(),
    })
}
