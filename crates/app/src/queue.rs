use anyhow::{Context, Result};
use muza_core::locator::resolve_locator;
use muza_core::{SourceLocator, TrackId, TrackMetadata};
use muza_engine::PlayerEvent;
use muza_media::StaticProbe;
use serde::Deserialize;
use std::path::Path;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistEntry {
    pub id: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub year: Option<u16>,
    pub artwork: Option<String>,
    pub path: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playlist {
    #[serde(default)]
    pub tracks: Vec<PlaylistEntry>,
}

impl Playlist {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&data).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Built-in playlist used when none is configured.
    pub fn demo() -> Self {
        let entry = |id: &str, title: &str, artist: &str, album: &str, year: u16, secs: f64| PlaylistEntry {
            id: id.to_string(),
            title: title.to_string(),
            artist: Some(artist.to_string()),
            album: Some(album.to_string()),
            year: Some(year),
            artwork: Some(format!("art/{id}.jpg")),
            path: format!("{artist}/{title}.mp3"),
            duration_secs: secs,
        };
        Self {
            tracks: vec![
                entry("night-drive", "Night Drive", "Low Tide", "Coastlines", 2019, 12.0),
                entry("paper-moon", "Paper Moon", "Low Tide", "Coastlines", 2019, 8.0),
                entry("glass-house", "Glass House", "Aster & Vale", "Rooms", 2021, 10.0),
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub id: TrackId,
    pub source: SourceLocator,
    pub metadata: TrackMetadata,
    pub duration: f64,
}

/// Linear queue that reacts to the player's navigation requests.
#[derive(Debug, Default)]
pub struct QueueController {
    entries: Vec<QueueEntry>,
    position: Option<usize>,
}

impl QueueController {
    pub fn from_playlist(playlist: &Playlist, base: &Url) -> Result<Self> {
        let mut entries = Vec::with_capacity(playlist.tracks.len());
        for track in &playlist.tracks {
            let source = resolve_locator(base, &track.path)
                .with_context(|| format!("bad media path for track {}", track.id))?;
            let artwork = match &track.artwork {
                Some(path) => Some(
                    resolve_locator(base, path)
                        .with_context(|| format!("bad artwork path for track {}", track.id))?,
                ),
                None => None,
            };
            let defaults = TrackMetadata::default();
            entries.push(QueueEntry {
                id: TrackId::new(track.id.clone()),
                source,
                metadata: TrackMetadata {
                    title: track.title.clone(),
                    artist: track.artist.clone().unwrap_or(defaults.artist),
                    album: track.album.clone().unwrap_or(defaults.album),
                    year: track.year,
                    artwork,
                },
                duration: track.duration_secs,
            });
        }
        Ok(Self {
            entries,
            position: None,
        })
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.position.and_then(|i| self.entries.get(i))
    }

    /// Probe table so the simulated resource knows each track's length.
    pub fn probe(&self) -> StaticProbe {
        let mut probe = StaticProbe::new();
        for entry in &self.entries {
            probe.insert(entry.source.clone(), entry.duration);
        }
        probe
    }

    pub fn start(&mut self) -> Option<QueueEntry> {
        self.jump(0)
    }

    pub fn advance(&mut self) -> Option<QueueEntry> {
        let next = self.position.map_or(0, |i| i + 1);
        self.jump(next)
    }

    pub fn retreat(&mut self) -> Option<QueueEntry> {
        match self.position {
            Some(i) if i > 0 => self.jump(i - 1),
            _ => None,
        }
    }

    /// Track the player should switch to, if the event moves the queue.
    pub fn react(&mut self, event: &PlayerEvent) -> Option<QueueEntry> {
        match event {
            PlayerEvent::NextTrackRequested { .. } => self.advance(),
            PlayerEvent::PreviousTrackRequested => self.retreat(),
            PlayerEvent::TimeUpdate { .. } | PlayerEvent::PlaybackError { .. } => None,
        }
    }

    fn jump(&mut self, index: usize) -> Option<QueueEntry> {
        let entry = self.entries.get(index)?.clone();
        self.position = Some(index);
        Some(entry)
    }
}
