use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque key of a catalog track. Listeners compare it to decide highlight state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolved URL or handle of a media stream. Empty means "nothing loaded".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceLocator(String);

impl SourceLocator {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: Option<u16>,
    pub artwork: Option<SourceLocator>,
}

impl Default for TrackMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            year: None,
            artwork: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    Idle,
    Loading,
    Ready,
}

/// Tag of one load attempt. Callbacks carrying an older tag are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Clamps into `[0, 1]`; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolumeLevel {
    Muted,
    Low,
    High,
}

/// Normalized output volume. Muting remembers the level to restore.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    level: f64,
    restore_to: Option<f64>,
}

impl Volume {
    pub fn new(level: f64) -> Self {
        Self {
            level: clamp_unit(level),
            restore_to: None,
        }
    }

    /// Effective level applied to the output; 0 while muted.
    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn is_muted(&self) -> bool {
        self.restore_to.is_some()
    }

    /// Sets a new level. Any explicit level ends a mute.
    pub fn set(&mut self, level: f64) {
        self.level = clamp_unit(level);
        self.restore_to = None;
    }

    pub fn toggle_mute(&mut self) {
        match self.restore_to.take() {
            Some(previous) => self.level = previous,
            None => {
                self.restore_to = Some(self.level);
                self.level = 0.0;
            }
        }
    }

    pub fn icon_level(&self) -> VolumeLevel {
        if self.is_muted() || self.level == 0.0 {
            VolumeLevel::Muted
        } else if self.level < 0.5 {
            VolumeLevel::Low
        } else {
            VolumeLevel::High
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.75)
    }
}

/// Read-only snapshot of the live session, as seen by rendering code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackSession {
    pub track_id: TrackId,
    pub source: SourceLocator,
    pub metadata: TrackMetadata,
    pub is_playing: bool,
    pub duration: f64,
    pub current_time: f64,
    pub loading_state: LoadingState,
    pub pending_play_intent: bool,
    pub volume: f64,
}

#[cfg(test)]
mod tests {
    use super::{clamp_unit, Generation, SourceLocator, Volume, VolumeLevel};

    #[test]
    fn mute_restores_previous_level() {
        let mut volume = Volume::new(0.4);
        volume.toggle_mute();
        assert!(volume.is_muted());
        assert_eq!(volume.level(), 0.0);
        assert_eq!(volume.icon_level(), VolumeLevel::Muted);

        volume.toggle_mute();
        assert!(!volume.is_muted());
        assert_eq!(volume.level(), 0.4);
        assert_eq!(volume.icon_level(), VolumeLevel::Low);
    }

    #[test]
    fn explicit_level_ends_mute() {
        let mut volume = Volume::new(0.9);
        volume.toggle_mute();
        volume.set(0.6);
        assert!(!volume.is_muted());
        assert_eq!(volume.icon_level(), VolumeLevel::High);

        volume.set(3.0);
        assert_eq!(volume.level(), 1.0);
    }

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(clamp_unit(-0.2), 0.0);
        assert_eq!(clamp_unit(1.7), 1.0);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn whitespace_locator_counts_as_empty() {
        assert!(SourceLocator::new("  ").is_empty());
        assert!(!SourceLocator::new("a.mp3").is_empty());
    }

    #[test]
    fn generations_increase() {
        let first = Generation::default();
        assert!(first.next() > first);
        assert_eq!(first.next().value(), first.value() + 1);
    }
}
