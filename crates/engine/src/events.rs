use muza_core::{PlaybackError, TrackId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceCause {
    /// The user pressed "next".
    Skip,
    /// The track played to its end.
    Finished,
}

/// Intents the player hands to the hosting UI and queue controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum PlayerEvent {
    PreviousTrackRequested,
    NextTrackRequested { cause: AdvanceCause },
    TimeUpdate { current_time: f64 },
    PlaybackError { cause: PlaybackError },
}

/// Receives the identity of the track that just became current.
///
/// Listeners compare it to their own identity to decide whether they are the
/// "now playing" row. The player never looks at the rows itself.
pub trait NowPlayingBroadcaster {
    fn notify(&mut self, track: &TrackId);
}

/// Broadcaster for hosts that have no track list on screen.
#[derive(Debug, Default)]
pub struct NoBroadcast;

impl NowPlayingBroadcaster for NoBroadcast {
    fn notify(&mut self, _track: &TrackId) {}
}
