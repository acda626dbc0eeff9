use std::path::PathBuf;

use async_trait::async_trait;
use prizewheel_shared::{
    decode_session_file, encode_session_file, SessionFileData, SessionFileDecodeError,
    SessionFileEncodeError,
};

const SNAPSHOT_FILE: &str = "rewards.bin";
const CORRUPT_SUFFIX: &str = "bin.corrupt";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no snapshot at {0}")]
    Missing(PathBuf),
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot decode error: {0}")]
    Decode(#[from] SessionFileDecodeError),
    #[error("snapshot encode error: {0}")]
    Encode(#[from] SessionFileEncodeError),
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_snapshot(&self) -> Result<SessionFileData, StorageError>;
    async fn save_snapshot(&self, data: &SessionFileData) -> Result<(), StorageError>;

    /// Moves an unreadable snapshot out of the way and returns where it went.
    async fn set_aside_snapshot(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(None)
    }
}

pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_snapshot(&self) -> Result<SessionFileData, StorageError> {
        let path = self.snapshot_path();
        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::Missing(path));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(decode_session_file(&payload)?)
    }

    async fn save_snapshot(&self, data: &SessionFileData) -> Result<(), StorageError> {
        let path = self.snapshot_path();
        let temp = path.with_extension("bin.tmp");
        let payload = encode_session_file(data)?;
        tokio::fs::write(&temp, payload).await?;
        tokio::fs::rename(&temp, &path).await?;
        log::debug!(
            "saved reward sessions count={} path={}",
            data.sessions.len(),
            path.display()
        );
        Ok(())
    }

    async fn set_aside_snapshot(&self) -> Result<Option<PathBuf>, StorageError> {
        let path = self.snapshot_path();
        let aside = path.with_extension(CORRUPT_SUFFIX);
        match tokio::fs::rename(&path, &aside).await {
            Ok(()) => Ok(Some(aside)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use prizewheel_shared::{Participant, RewardSession, SessionStatus};

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prizewheel-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn saves_and_loads_snapshot() {
        let dir = temp_dir();
        let storage = FileStorage::new(dir.clone());
        let data = SessionFileData {
            sessions: vec![RewardSession {
                id: "0190a1b2-0000-7000-8000-000000000001".into(),
                title: "Meetup draw".into(),
                description: String::new(),
                banner: None,
                participants: vec![Participant {
                    name: "Lin".into(),
                    contact: "@lin".into(),
                }],
                status: SessionStatus::Active,
                trigger_marker: None,
                committed_index: None,
                winner: None,
                created_at: 5,
                triggered_at: None,
                completed_at: None,
            }],
            active_id: Some("0190a1b2-0000-7000-8000-000000000001".into()),
        };
        storage.save_snapshot(&data).await.unwrap();
        assert_eq!(storage.load_snapshot().await.unwrap(), data);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_snapshot_is_reported() {
        let dir = temp_dir();
        let storage = FileStorage::new(dir.clone());
        assert!(matches!(
            storage.load_snapshot().await,
            Err(StorageError::Missing(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_decode_error() {
        let dir = temp_dir();
        tokio::fs::write(dir.join(SNAPSHOT_FILE), b"garbage!!").await.unwrap();
        let storage = FileStorage::new(dir.clone());
        assert!(matches!(
            storage.load_snapshot().await,
            Err(StorageError::Decode(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn corrupt_snapshot_can_be_set_aside() {
        let dir = temp_dir();
        tokio::fs::write(dir.join(SNAPSHOT_FILE), b"garbage!!").await.unwrap();
        let storage = FileStorage::new(dir.clone());
        let aside = storage.set_aside_snapshot().await.unwrap().unwrap();
        assert_eq!(aside, dir.join("rewards.bin.corrupt"));
        assert_eq!(tokio::fs::read(&aside).await.unwrap(), b"garbage!!");
        assert!(matches!(
            storage.load_snapshot().await,
            Err(StorageError::Missing(_))
        ));
        let _ = std::fs::remove_dir_all(dir);
    }
}
