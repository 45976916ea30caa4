use anyhow::{Context, Result};
use muza_core::TrackId;
use muza_engine::{NowPlayingBroadcaster, PlayerEvent};
use serde::Serialize;
use std::io::Write;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Publishes the now-playing identity on a watch channel.
///
/// Each track-list row holds a [`TrackRow`] and decides on its own whether it
/// is highlighted by comparing identities.
pub struct WatchBroadcaster {
    tx: watch::Sender<Option<TrackId>>,
}

impl WatchBroadcaster {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn row(&self, track_id: TrackId) -> TrackRow {
        TrackRow {
            track_id,
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for WatchBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl NowPlayingBroadcaster for WatchBroadcaster {
    fn notify(&mut self, track: &TrackId) {
        self.tx.send_replace(Some(track.clone()));
    }
}

/// One row of a track list listening for now-playing changes.
#[derive(Debug, Clone)]
pub struct TrackRow {
    track_id: TrackId,
    rx: watch::Receiver<Option<TrackId>>,
}

impl TrackRow {
    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn is_now_playing(&self) -> bool {
        self.rx.borrow().as_ref() == Some(&self.track_id)
    }

    /// Waits for the next now-playing change and reports the new highlight
    /// state. Errors once the broadcaster is gone.
    pub async fn changed(&mut self) -> Result<bool> {
        self.rx
            .changed()
            .await
            .context("now-playing broadcaster dropped")?;
        Ok(self.is_now_playing())
    }
}

#[derive(Serialize)]
struct NowPlayingLine<'a> {
    event: &'static str,
    track: &'a TrackId,
}

/// Writes now-playing notifications and player events as JSON lines.
pub struct JsonLines<W: Write> {
    out: W,
}

impl<W: Write> JsonLines<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn write_event(&mut self, event: &PlayerEvent) -> Result<()> {
        self.write_line(event)
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line<T: Serialize>(&mut self, line: &T) -> Result<()> {
        serde_json::to_writer(&mut self.out, line).context("failed to encode event")?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> NowPlayingBroadcaster for JsonLines<W> {
    fn notify(&mut self, track: &TrackId) {
        let line = NowPlayingLine {
            event: "now-playing",
            track,
        };
        if let Err(err) = self.write_line(&line) {
            warn!(error = %err, "failed to write now-playing line");
        }
    }
}

/// Forwards every notification to several broadcasters, in order.
#[derive(Default)]
pub struct Fanout {
    targets: Vec<Box<dyn NowPlayingBroadcaster>>,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, target: impl NowPlayingBroadcaster + 'static) -> Self {
        self.targets.push(Box::new(target));
        self
    }
}

impl NowPlayingBroadcaster for Fanout {
    fn notify(&mut self, track: &TrackId) {
        debug!(%track, listeners = self.targets.len(), "now playing");
        for target in self.targets.iter_mut() {
            target.notify(track);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fanout, JsonLines, WatchBroadcaster};
    use muza_core::{PlaybackError, TrackId};
    use muza_engine::{AdvanceCause, NowPlayingBroadcaster, PlayerEvent};

    #[test]
    fn rows_highlight_only_their_track() {
        let mut broadcaster = WatchBroadcaster::new();
        let a = broadcaster.row(TrackId::new("a"));
        let b = broadcaster.row(TrackId::new("b"));
        assert_eq!(a.track_id().as_str(), "a");
        assert!(!a.is_now_playing());

        broadcaster.notify(&TrackId::new("a"));
        assert!(a.is_now_playing());
        assert!(!b.is_now_playing());

        broadcaster.notify(&TrackId::new("b"));
        assert!(!a.is_now_playing());
        assert!(b.is_now_playing());
    }

    #[tokio::test]
    async fn row_wakes_on_change() {
        let mut broadcaster = WatchBroadcaster::new();
        let mut row = broadcaster.row(TrackId::new("a"));

        broadcaster.notify(&TrackId::new("a"));
        assert!(row.changed().await.unwrap());

        drop(broadcaster);
        assert!(row.changed().await.is_err());
    }

    #[test]
    fn writes_one_json_object_per_line() {
        let mut lines = JsonLines::new(Vec::new());
        lines.notify(&TrackId::new("a"));
        lines
            .write_event(&PlayerEvent::NextTrackRequested {
                cause: AdvanceCause::Finished,
            })
            .unwrap();
        lines
            .write_event(&PlayerEvent::PlaybackError {
                cause: PlaybackError::Load("404".to_string()),
            })
            .unwrap();

        let text = String::from_utf8(lines.into_inner()).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(rows[0]["event"], "now-playing");
        assert_eq!(rows[0]["track"], "a");
        assert_eq!(rows[1]["event"], "next-track-requested");
        assert_eq!(rows[1]["cause"], "finished");
        assert_eq!(rows[2]["event"], "playback-error");
        assert_eq!(rows[2]["cause"]["kind"], "load");
    }

    #[test]
    fn fanout_reaches_every_target() {
        let watch = WatchBroadcaster::new();
        let row = watch.row(TrackId::new("x"));
        let mut fanout = Fanout::new().with(watch).with(JsonLines::new(Vec::new()));

        fanout.notify(&TrackId::new("x"));
        assert!(row.is_now_playing());
    }
}
