use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::routing::{get, post, put};
use axum::Router;
use clap::Parser;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

mod error;
mod handlers;
mod sessions;
mod state;
mod storage;
mod store;

use crate::handlers::{
    active_handler, close_handler, create_handler, history_handler, ping_handler,
    trigger_handler, winner_handler,
};
use crate::sessions::{load_store, save_if_dirty};
use crate::state::AppState;
use crate::storage::{FileStorage, Storage};

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Directory holding the reward session snapshot.
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Directory with the viewer page and its wasm bundle.
    #[arg(long)]
    public_dir: Option<PathBuf>,
    /// Listening port; falls back to $PORT, then 3000.
    #[arg(long)]
    port: Option<u16>,
    #[arg(long, default_value_t = 30)]
    save_interval_secs: u64,
}

pub fn build_router(state: AppState, public_dir: PathBuf) -> Router {
    let api = Router::new()
        .route("/rewards", post(create_handler))
        .route("/rewards/active", get(active_handler).delete(close_handler))
        .route("/rewards/history", get(history_handler))
        .route("/rewards/:session_id/trigger", post(trigger_handler))
        .route("/rewards/:session_id/winner", put(winner_handler))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    Router::new()
        .nest("/api", api)
        .route("/ping", get(ping_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data"));
    if let Err(error) = tokio::fs::create_dir_all(&data_dir).await {
        log::error!("failed to create data dir {}: {error}", data_dir.display());
    }
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir));
    let store = load_store(storage.as_ref()).await;
    let state = AppState::new(store, storage);
    let backup_state = state.clone();
    let shutdown_state = state.clone();

    let public_dir = args
        .public_dir
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public"));
    let app = build_router(state, public_dir);

    let save_interval = std::time::Duration::from_secs(args.save_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(save_interval);
        loop {
            interval.tick().await;
            save_if_dirty(&backup_state).await;
        }
    });

    let port: u16 = args
        .port
        .or_else(|| {
            std::env::var("PORT")
                .ok()
                .and_then(|value| value.parse().ok())
        })
        .unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    log::info!("prize wheel running at http://localhost:{port}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await
        .expect("Server crashed");

    save_if_dirty(&shutdown_state).await;
}
