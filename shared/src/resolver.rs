use rand::Rng;

use crate::Participant;

/// What to do when a triggered session carries no committed index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Refuse the draw. Every viewer stays consistent with the store.
    #[default]
    RequireCommitted,
    /// Pick locally at random. Only sound with a single viewer.
    AllowLocalRandom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolutionSource {
    Committed,
    LocalFallback,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub index: usize,
    pub participant: Participant,
    pub source: ResolutionSource,
}

impl Resolution {
    /// Only committed resolutions are guaranteed to match other viewers.
    pub fn is_consistent(&self) -> bool {
        self.source == ResolutionSource::Committed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    #[error("roster is empty")]
    EmptyRoster,
    #[error("committed index {index} is outside a roster of {len}")]
    CommittedIndexOutOfRange { index: usize, len: usize },
    #[error("session has no committed index and local fallback is disabled")]
    MissingCommittedIndex,
}

pub fn resolve_winner<R: Rng + ?Sized>(
    roster: &[Participant],
    committed_index: Option<usize>,
    policy: FallbackPolicy,
    rng: &mut R,
) -> Result<Resolution, DrawError> {
    if roster.is_empty() {
        return Err(DrawError::EmptyRoster);
    }
    let (index, source) = match committed_index {
        Some(index) if index < roster.len() => (index, ResolutionSource::Committed),
        Some(index) => {
            return Err(DrawError::CommittedIndexOutOfRange {
                index,
                len: roster.len(),
            })
        }
        None => match policy {
            FallbackPolicy::RequireCommitted => return Err(DrawError::MissingCommittedIndex),
            FallbackPolicy::AllowLocalRandom => {
                (rng.gen_range(0..roster.len()), ResolutionSource::LocalFallback)
            }
        },
    };
    Ok(Resolution {
        index,
        participant: roster[index].clone(),
        source,
    })
}
