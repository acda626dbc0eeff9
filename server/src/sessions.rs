use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::store::SessionStore;

/// Time-ordered so that ids sort by creation.
pub fn new_session_id() -> String {
    Uuid::now_v7().to_string()
}

pub fn new_trigger_marker() -> String {
    Uuid::new_v4().to_string()
}

pub fn normalize_session_id(value: &str) -> Option<String> {
    let parsed = Uuid::parse_str(value).ok()?;
    Some(parsed.to_string())
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

pub async fn load_store(storage: &dyn Storage) -> SessionStore {
    match storage.load_snapshot().await {
        Ok(data) => {
            log::info!(
                "loaded reward sessions count={} active={:?}",
                data.sessions.len(),
                data.active_id
            );
            SessionStore::from_snapshot(data)
        }
        Err(StorageError::Missing(path)) => {
            log::info!("no snapshot at {}, starting empty", path.display());
            SessionStore::default()
        }
        Err(StorageError::Decode(error)) => {
            match storage.set_aside_snapshot().await {
                Ok(Some(aside)) => log::error!(
                    "unreadable snapshot moved to {}: {error}",
                    aside.display()
                ),
                Ok(None) => log::error!("unreadable snapshot: {error}"),
                Err(move_error) => {
                    log::error!("unreadable snapshot could not be moved aside: {move_error}")
                }
            }
            SessionStore::default()
        }
        Err(error) => {
            log::warn!("starting with an empty store: {error}");
            SessionStore::default()
        }
    }
}

/// Writes the store out if it changed since the last save.
pub async fn save_if_dirty(state: &AppState) {
    let _saving = state.save_lock.lock().await;
    let maybe_data = state.store.write().await.take_dirty();
    let Some(data) = maybe_data else {
        return;
    };
    if let Err(error) = state.storage.save_snapshot(&data).await {
        log::error!("failed to save reward sessions: {error}");
        state.store.write().await.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use prizewheel_shared::{
        CreateSessionRequest, Participant, SessionFileData, SessionFileDecodeError,
    };

    use super::*;

    /// Holds the first write back so a later save can try to overtake it.
    #[derive(Default)]
    struct SlowFirstWrite {
        calls: AtomicUsize,
        written: Mutex<Vec<usize>>,
    }

    #[async_trait]
    impl Storage for SlowFirstWrite {
        async fn load_snapshot(&self) -> Result<SessionFileData, StorageError> {
            Ok(SessionFileData::default())
        }

        async fn save_snapshot(&self, data: &SessionFileData) -> Result<(), StorageError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            self.written.lock().unwrap().push(data.sessions.len());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CorruptSnapshot {
        set_aside: AtomicUsize,
    }

    #[async_trait]
    impl Storage for CorruptSnapshot {
        async fn load_snapshot(&self) -> Result<SessionFileData, StorageError> {
            Err(SessionFileDecodeError::NotASnapshot.into())
        }

        async fn save_snapshot(&self, _data: &SessionFileData) -> Result<(), StorageError> {
            Ok(())
        }

        async fn set_aside_snapshot(&self) -> Result<Option<PathBuf>, StorageError> {
            self.set_aside.fetch_add(1, Ordering::SeqCst);
            Ok(Some(PathBuf::from("rewards.bin.corrupt")))
        }
    }

    fn request(title: &str) -> CreateSessionRequest {
        CreateSessionRequest {
            title: title.into(),
            description: String::new(),
            banner: None,
            participants: vec![Participant {
                name: "Ines".into(),
                contact: "@ines".into(),
            }],
        }
    }

    #[tokio::test]
    async fn overlapping_saves_keep_the_newest_snapshot() {
        let storage = Arc::new(SlowFirstWrite::default());
        let state = AppState::new(SessionStore::default(), storage.clone());
        state.store.write().await.create(request("First"), 1).unwrap();

        let first = {
            let state = state.clone();
            tokio::spawn(async move { save_if_dirty(&state).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        state.store.write().await.create(request("Second"), 2).unwrap();
        save_if_dirty(&state).await;
        first.await.unwrap();

        assert_eq!(storage.written.lock().unwrap().last(), Some(&2));
        assert!(state.store.write().await.take_dirty().is_none());
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_set_aside_on_load() {
        let storage = CorruptSnapshot::default();
        let store = load_store(&storage).await;
        assert!(store.active().is_none());
        assert_eq!(storage.set_aside.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn normalizes_uuid_case() {
        let id = "8F14E45F-CEEA-467F-A8AF-4C9A2E6A7B10";
        assert_eq!(
            normalize_session_id(id).as_deref(),
            Some("8f14e45f-ceea-467f-a8af-4c9a2e6a7b10")
        );
        assert_eq!(normalize_session_id("not-a-session"), None);
    }

    #[test]
    fn markers_are_distinct() {
        assert_ne!(new_trigger_marker(), new_trigger_marker());
    }
}
