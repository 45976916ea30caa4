pub mod events;
pub mod seek;
pub mod synchronizer;

pub use events::{AdvanceCause, NoBroadcast, NowPlayingBroadcaster, PlayerEvent};
pub use seek::{SeekGestureTracker, TrackBounds};
pub use synchronizer::{PlaybackPhase, PlaybackSynchronizer, PlayerView};
