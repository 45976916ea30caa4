pub mod config;
pub mod error;
pub mod locator;
pub mod model;
pub mod time;

pub use config::{PlayerConfig, SimulationConfig};
pub use error::PlaybackError;
pub use model::{
    clamp_unit, Generation, LoadingState, PlaybackSession, SourceLocator, TrackId,
    TrackMetadata, Volume, VolumeLevel,
};
