use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Non-fatal playback failures.
///
/// `Load` and `PlaybackRejected` are surfaced to the host as a
/// `playback-error` event. `InvalidSeekTarget` is only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "kebab-case")]
pub enum PlaybackError {
    /// The source failed to load or decode.
    #[error("failed to load media: {0}")]
    Load(String),

    /// The platform refused to start playback (autoplay policy and similar).
    #[error("playback rejected: {0}")]
    PlaybackRejected(String),

    /// Seek requested before the media duration is known.
    #[error("seek target unavailable before duration is known")]
    InvalidSeekTarget,
}

impl PlaybackError {
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, PlaybackError::InvalidSeekTarget)
    }
}

#[cfg(test)]
mod tests {
    use super::PlaybackError;

    #[test]
    fn only_seek_target_is_silent() {
        assert!(!PlaybackError::InvalidSeekTarget.is_surfaced());
        assert!(PlaybackError::Load("404".to_string()).is_surfaced());
        assert!(PlaybackError::PlaybackRejected("policy".to_string()).is_surfaced());
    }

    #[test]
    fn messages_carry_cause() {
        let err = PlaybackError::Load("connection reset".to_string());
        assert_eq!(err.to_string(), "failed to load media: connection reset");
    }
}
