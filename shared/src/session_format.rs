use bincode::config::Configuration;
use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode};

use crate::RewardSession;

pub const SESSION_FILE_MAGIC: &[u8; 4] = b"PWSS";
pub const SESSION_FILE_VERSION: u32 = 1;

const BODY_CONFIG: Configuration = bincode::config::standard();

/// Everything the session store needs to come back after a restart.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct SessionFileData {
    pub sessions: Vec<RewardSession>,
    pub active_id: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionFileDecodeError {
    #[error("not a reward session snapshot")]
    NotASnapshot,
    #[error("unsupported session file version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid session file body: {0}")]
    InvalidData(#[from] DecodeError),
    #[error("{0} unexpected bytes after the snapshot body")]
    TrailingBytes(usize),
}

#[derive(Debug, thiserror::Error)]
#[error("failed to encode session file: {0}")]
pub struct SessionFileEncodeError(#[from] EncodeError);

/// Magic, little-endian version, then the bincode body.
pub fn encode_session_file(data: &SessionFileData) -> Result<Vec<u8>, SessionFileEncodeError> {
    let mut payload = SESSION_FILE_MAGIC.to_vec();
    payload.extend_from_slice(&SESSION_FILE_VERSION.to_le_bytes());
    payload.extend(bincode::encode_to_vec(data, BODY_CONFIG)?);
    Ok(payload)
}

pub fn decode_session_file(payload: &[u8]) -> Result<SessionFileData, SessionFileDecodeError> {
    let rest = payload
        .strip_prefix(SESSION_FILE_MAGIC.as_slice())
        .ok_or(SessionFileDecodeError::NotASnapshot)?;
    let (version, body) = rest
        .split_first_chunk::<4>()
        .ok_or(SessionFileDecodeError::NotASnapshot)?;
    match u32::from_le_bytes(*version) {
        SESSION_FILE_VERSION => {
            let (data, read) = bincode::decode_from_slice(body, BODY_CONFIG)?;
            if read < body.len() {
                return Err(SessionFileDecodeError::TrailingBytes(body.len() - read));
            }
            Ok(data)
        }
        other => Err(SessionFileDecodeError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Participant, RecordedWinner, SessionStatus};

    fn sample() -> SessionFileData {
        let participants = vec![
            Participant {
                name: "Ada".into(),
                contact: "@ada".into(),
            },
            Participant {
                name: "Grace".into(),
                contact: "@grace".into(),
            },
        ];
        let winner = RecordedWinner::new(&participants[1], 1);
        SessionFileData {
            sessions: vec![RewardSession {
                id: "a8d1".into(),
                title: "Spring giveaway".into(),
                description: "Two seats".into(),
                banner: Some("banner.png".into()),
                participants,
                status: SessionStatus::Completed,
                trigger_marker: Some("m-1".into()),
                committed_index: Some(1),
                winner: Some(winner),
                created_at: 100,
                triggered_at: Some(200),
                completed_at: Some(300),
            }],
            active_id: Some("a8d1".into()),
        }
    }

    #[test]
    fn snapshot_survives_the_file_format() {
        let data = sample();
        let bytes = encode_session_file(&data).unwrap();
        assert!(bytes.starts_with(b"PWSS"));
        let decoded = decode_session_file(&bytes).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut bytes = encode_session_file(&sample()).unwrap();
        bytes[4..8].copy_from_slice(&7u32.to_le_bytes());
        assert!(matches!(
            decode_session_file(&bytes),
            Err(SessionFileDecodeError::UnsupportedVersion(7))
        ));
    }

    #[test]
    fn rejects_foreign_payload() {
        assert!(matches!(
            decode_session_file(b"{\"sessions\":[]}"),
            Err(SessionFileDecodeError::NotASnapshot)
        ));
        assert!(matches!(
            decode_session_file(b"PWSS\x01\x00"),
            Err(SessionFileDecodeError::NotASnapshot)
        ));
    }

    #[test]
    fn rejects_truncated_and_padded_bodies() {
        let bytes = encode_session_file(&sample()).unwrap();
        assert!(matches!(
            decode_session_file(&bytes[..bytes.len() - 3]),
            Err(SessionFileDecodeError::InvalidData(_))
        ));
        let mut padded = bytes.clone();
        padded.extend_from_slice(&[0, 0]);
        assert!(matches!(
            decode_session_file(&padded),
            Err(SessionFileDecodeError::TrailingBytes(2))
        ));
    }
}
