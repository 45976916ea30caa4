use anyhow::{anyhow, Result};
use async_trait::async_trait;
use muza_core::{Generation, PlaybackError, SourceLocator};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub mod sim;

pub use sim::SimulatedAdapter;

/// Lifecycle callback of a media resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ResourceEvent {
    MetadataReady { duration: f64 },
    DataReady,
    TimeUpdate { time: f64 },
    Playing,
    Paused,
    Buffering,
    Ended,
    Error { cause: PlaybackError },
}

/// A callback stamped with the generation of the load that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedEvent {
    pub generation: Generation,
    pub event: ResourceEvent,
}

impl TaggedEvent {
    pub fn new(generation: Generation, event: ResourceEvent) -> Self {
        Self { generation, event }
    }
}

/// Imperative side of a platform media primitive.
///
/// Calls are fire-and-forget. Outcomes (including a rejected `play`) come
/// back as [`TaggedEvent`]s through whatever channel the adapter was built
/// with.
pub trait MediaAdapter {
    fn name(&self) -> &'static str;
    fn load(&mut self, generation: Generation, source: &SourceLocator);
    fn unload(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, seconds: f64);
    fn set_volume(&mut self, volume: f64);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub duration: f64,
}

/// Looks up stream properties before data is buffered.
#[async_trait]
pub trait MediaProbe: Send + Sync {
    async fn probe(&self, source: &SourceLocator) -> Result<MediaInfo>;
}

/// Probe backed by a fixed table, typically built from a playlist.
#[derive(Debug, Default, Clone)]
pub struct StaticProbe {
    durations: HashMap<SourceLocator, f64>,
    failing: HashSet<String>,
}

impl StaticProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: SourceLocator, duration: f64) {
        self.durations.insert(source, duration.max(0.0));
    }

    /// Marks every source whose locator contains `pattern` as undecodable.
    pub fn fail_matching(&mut self, pattern: impl Into<String>) {
        self.failing.insert(pattern.into());
    }
}

#[async_trait]
impl MediaProbe for StaticProbe {
    async fn probe(&self, source: &SourceLocator) -> Result<MediaInfo> {
        if self
            .failing
            .iter()
            .any(|pattern| source.as_str().contains(pattern.as_str()))
        {
            return Err(anyhow!("decoder rejected {source}"));
        }
        self.durations
            .get(source)
            .map(|&duration| MediaInfo { duration })
            .ok_or_else(|| anyhow!("no media at {source}"))
    }
}
