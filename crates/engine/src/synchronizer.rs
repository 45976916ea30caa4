use crate::events::{AdvanceCause, NowPlayingBroadcaster, PlayerEvent};
use crate::seek::{SeekGestureTracker, TrackBounds};
use muza_core::time::{format_remaining, format_time, progress_ratio};
use muza_core::{
    clamp_unit, Generation, LoadingState, PlaybackError, PlaybackSession, SourceLocator,
    TrackId, TrackMetadata, Volume, VolumeLevel,
};
use muza_media::{MediaAdapter, ResourceEvent};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Where the current session is in its lifecycle.
///
/// `is_playing`, `loading_state` and `pending_play_intent` of the session are
/// all derived from this, so "playing while loading" cannot be expressed.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackPhase {
    /// No source set.
    Idle,
    /// Waiting for media data, on first load or after a stall.
    Loading {
        /// Play as soon as data is ready.
        pending_play: bool,
        /// The resource was playing when the stall began.
        stalled: bool,
    },
    /// Data is buffered and adapter calls take effect.
    Ready {
        /// Confirmed by the adapter's `playing` / `paused` callbacks.
        playing: bool,
        /// A `play` (true) or `pause` (false) call awaiting confirmation.
        requested: Option<bool>,
    },
    Ended,
    /// Playback failed; recovers on the next `set_track`.
    Error {
        cause: PlaybackError,
        /// How far the media had loaded when the failure arrived.
        loaded: LoadingState,
    },
}

impl PlaybackPhase {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackPhase::Idle => "idle",
            PlaybackPhase::Loading { .. } => "loading",
            PlaybackPhase::Ready { playing: true, .. } => "ready-playing",
            PlaybackPhase::Ready { playing: false, .. } => "ready-paused",
            PlaybackPhase::Ended => "ended",
            PlaybackPhase::Error { .. } => "error",
        }
    }

    fn is_playing(&self) -> bool {
        matches!(self, PlaybackPhase::Ready { playing: true, .. })
    }

    fn ready(playing: bool, requested: Option<bool>) -> Self {
        PlaybackPhase::Ready { playing, requested }
    }
}

/// What the player surface draws. Absent while no source is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerView {
    pub track_id: TrackId,
    pub metadata: TrackMetadata,
    pub state: &'static str,
    pub is_playing: bool,
    /// Show the pause glyph: playback is running or about to.
    pub shows_pause: bool,
    pub loading: bool,
    pub elapsed: String,
    pub remaining: String,
    pub progress: f64,
    pub volume: f64,
    pub volume_level: VolumeLevel,
    pub error: Option<String>,
}

/// Reconciles user intent, media lifecycle callbacks and track changes into
/// one playback state.
///
/// Every adapter call goes out from here, and every adapter callback comes
/// back through [`PlaybackSynchronizer::on_resource_event`] tagged with the
/// generation of the load it belongs to.
pub struct PlaybackSynchronizer<A: MediaAdapter> {
    adapter: A,
    broadcaster: Box<dyn NowPlayingBroadcaster>,
    generation: Generation,
    track_id: TrackId,
    source: SourceLocator,
    metadata: TrackMetadata,
    phase: PlaybackPhase,
    duration: f64,
    current_time: f64,
    volume: Volume,
    seek: SeekGestureTracker,
    outbox: VecDeque<PlayerEvent>,
}

impl<A: MediaAdapter> PlaybackSynchronizer<A> {
    pub fn new(mut adapter: A, broadcaster: Box<dyn NowPlayingBroadcaster>, volume: f64) -> Self {
        let volume = Volume::new(volume);
        adapter.set_volume(volume.level());
        Self {
            adapter,
            broadcaster,
            generation: Generation::default(),
            track_id: TrackId::default(),
            source: SourceLocator::empty(),
            metadata: TrackMetadata::default(),
            phase: PlaybackPhase::Idle,
            duration: 0.0,
            current_time: 0.0,
            volume,
            seek: SeekGestureTracker::new(),
            outbox: VecDeque::new(),
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn phase(&self) -> &PlaybackPhase {
        &self.phase
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn is_dragging(&self) -> bool {
        self.seek.is_dragging()
    }

    pub fn session(&self) -> PlaybackSession {
        PlaybackSession {
            track_id: self.track_id.clone(),
            source: self.source.clone(),
            metadata: self.metadata.clone(),
            is_playing: self.phase.is_playing(),
            duration: self.duration,
            current_time: self.current_time,
            loading_state: self.loading_state(),
            pending_play_intent: matches!(
                self.phase,
                PlaybackPhase::Loading {
                    pending_play: true,
                    ..
                }
            ),
            volume: self.volume.level(),
        }
    }

    pub fn loading_state(&self) -> LoadingState {
        match self.phase {
            PlaybackPhase::Idle => LoadingState::Idle,
            PlaybackPhase::Loading { .. } => LoadingState::Loading,
            PlaybackPhase::Error { loaded, .. } => loaded,
            PlaybackPhase::Ready { .. } | PlaybackPhase::Ended => LoadingState::Ready,
        }
    }

    pub fn view(&self) -> Option<PlayerView> {
        if self.source.is_empty() {
            return None;
        }
        Some(PlayerView {
            track_id: self.track_id.clone(),
            metadata: self.metadata.clone(),
            state: self.phase.label(),
            is_playing: self.phase.is_playing(),
            shows_pause: self.intends_to_play(),
            loading: matches!(self.phase, PlaybackPhase::Loading { .. }),
            elapsed: format_time(self.current_time),
            remaining: format_remaining(self.current_time, self.duration),
            progress: progress_ratio(self.current_time, self.duration),
            volume: self.volume.level(),
            volume_level: self.volume.icon_level(),
            error: match &self.phase {
                PlaybackPhase::Error { cause, .. } => Some(cause.to_string()),
                _ => None,
            },
        })
    }

    /// Outbound events in the order they were raised.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        self.outbox.drain(..).collect()
    }

    pub fn set_track(
        &mut self,
        track_id: TrackId,
        source: SourceLocator,
        metadata: TrackMetadata,
        autoplay: bool,
    ) {
        let same_source = source == self.source;
        let recoverable = matches!(
            self.phase,
            PlaybackPhase::Error {
                loaded: LoadingState::Ready,
                ref cause,
            } if !matches!(cause, PlaybackError::Load(_))
        );
        let reload = !same_source
            || (matches!(self.phase, PlaybackPhase::Error { .. }) && !recoverable);
        self.track_id = track_id;
        self.metadata = metadata;

        if recoverable && same_source {
            // media is still buffered; keep the position
            self.phase = if autoplay {
                self.adapter.play();
                PlaybackPhase::ready(false, Some(true))
            } else {
                PlaybackPhase::ready(false, None)
            };
            info!(track = %self.track_id, autoplay, "recovered from playback error");
        } else if reload {
            self.generation = self.generation.next();
            self.source = source;
            self.current_time = 0.0;
            self.duration = 0.0;
            self.seek.end();

            if self.source.is_empty() {
                self.adapter.unload();
                self.phase = PlaybackPhase::Idle;
            } else {
                self.adapter.load(self.generation, &self.source);
                self.phase = PlaybackPhase::Loading {
                    pending_play: autoplay,
                    stalled: false,
                };
            }
            info!(
                track = %self.track_id,
                source = %self.source,
                generation = %self.generation,
                autoplay,
                "track loaded"
            );
        } else if autoplay != self.intends_to_play() {
            self.request_play_pause();
        }

        self.broadcaster.notify(&self.track_id);
    }

    pub fn request_play_pause(&mut self) {
        match self.phase.clone() {
            PlaybackPhase::Loading {
                pending_play,
                stalled,
            } => {
                self.phase = PlaybackPhase::Loading {
                    pending_play: !pending_play,
                    stalled,
                };
            }
            PlaybackPhase::Ready { playing, requested } => {
                let play = !requested.unwrap_or(playing);
                if play {
                    self.adapter.play();
                } else {
                    self.adapter.pause();
                }
                self.phase = PlaybackPhase::ready(playing, Some(play));
            }
            PlaybackPhase::Ended => {
                self.current_time = 0.0;
                self.adapter.play();
                self.phase = PlaybackPhase::ready(false, Some(true));
            }
            PlaybackPhase::Idle | PlaybackPhase::Error { .. } => {
                debug!(state = self.phase.label(), "play/pause ignored");
            }
        }
    }

    pub fn request_seek(&mut self, position: f64) {
        if self.duration <= 0.0 {
            debug!(error = %PlaybackError::InvalidSeekTarget, "seek ignored");
            return;
        }
        if matches!(self.phase, PlaybackPhase::Idle | PlaybackPhase::Error { .. }) {
            debug!(state = self.phase.label(), "seek ignored");
            return;
        }

        let target = clamp_unit(position) * self.duration;
        self.current_time = target;
        self.adapter.seek(target);
        if self.phase == PlaybackPhase::Ended {
            self.phase = PlaybackPhase::ready(false, None);
        }
        self.outbox.push_back(PlayerEvent::TimeUpdate {
            current_time: target,
        });
    }

    pub fn request_next(&mut self) {
        self.outbox.push_back(PlayerEvent::NextTrackRequested {
            cause: AdvanceCause::Skip,
        });
    }

    pub fn request_previous(&mut self) {
        self.outbox.push_back(PlayerEvent::PreviousTrackRequested);
    }

    pub fn update_volume(&mut self, value: f64) {
        self.volume.set(value);
        self.adapter.set_volume(self.volume.level());
    }

    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.adapter.set_volume(self.volume.level());
    }

    pub fn begin_drag(&mut self, pointer_x: f64, bounds: TrackBounds) {
        let position = self.seek.begin(pointer_x, bounds);
        self.request_seek(position);
    }

    pub fn drag_move(&mut self, pointer_x: f64, bounds: TrackBounds) {
        if let Some(position) = self.seek.drag_to(pointer_x, bounds) {
            self.request_seek(position);
        }
    }

    pub fn end_drag(&mut self) {
        self.seek.end();
    }

    pub fn on_resource_event(&mut self, generation: Generation, event: ResourceEvent) {
        if generation != self.generation {
            debug!(%generation, current = %self.generation, ?event, "dropping stale media event");
            return;
        }

        match event {
            ResourceEvent::MetadataReady { duration } => self.on_metadata(duration),
            ResourceEvent::DataReady => self.on_data_ready(),
            ResourceEvent::TimeUpdate { time } => self.on_time_update(time),
            ResourceEvent::Playing => self.on_playing(),
            ResourceEvent::Paused => self.on_paused(),
            ResourceEvent::Buffering => self.on_buffering(),
            ResourceEvent::Ended => self.on_ended(),
            ResourceEvent::Error { cause } => self.on_error(cause),
        }
    }

    fn intends_to_play(&self) -> bool {
        match self.phase {
            PlaybackPhase::Loading { pending_play, .. } => pending_play,
            PlaybackPhase::Ready { playing, requested } => requested.unwrap_or(playing),
            _ => false,
        }
    }

    fn accepts_media_events(&self) -> bool {
        !matches!(self.phase, PlaybackPhase::Idle | PlaybackPhase::Error { .. })
    }

    fn on_metadata(&mut self, duration: f64) {
        if !self.accepts_media_events() {
            return;
        }
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.current_time = self.current_time.min(self.duration);
    }

    fn on_data_ready(&mut self) {
        let PlaybackPhase::Loading {
            pending_play,
            stalled,
        } = self.phase
        else {
            return;
        };

        self.phase = if pending_play {
            self.adapter.play();
            PlaybackPhase::ready(stalled, Some(true))
        } else if stalled {
            self.adapter.pause();
            PlaybackPhase::ready(true, Some(false))
        } else {
            PlaybackPhase::ready(false, None)
        };
    }

    fn on_time_update(&mut self, time: f64) {
        if self.seek.is_dragging() || !self.accepts_media_events() {
            return;
        }
        let time = time.max(0.0);
        self.current_time = if self.duration > 0.0 {
            time.min(self.duration)
        } else {
            time
        };
    }

    fn on_playing(&mut self) {
        match self.phase {
            PlaybackPhase::Ready { requested, .. } => {
                let requested = requested.filter(|&play| !play);
                self.phase = PlaybackPhase::ready(true, requested);
            }
            PlaybackPhase::Loading { pending_play, .. } => {
                if pending_play {
                    self.phase = PlaybackPhase::ready(true, None);
                } else {
                    self.adapter.pause();
                    self.phase = PlaybackPhase::ready(true, Some(false));
                }
            }
            PlaybackPhase::Ended => self.phase = PlaybackPhase::ready(true, None),
            PlaybackPhase::Idle | PlaybackPhase::Error { .. } => {}
        }
    }

    fn on_paused(&mut self) {
        match self.phase {
            PlaybackPhase::Ready { requested, .. } => {
                let requested = requested.filter(|&play| play);
                self.phase = PlaybackPhase::ready(false, requested);
            }
            PlaybackPhase::Loading { pending_play, .. } => {
                self.phase = PlaybackPhase::Loading {
                    pending_play,
                    stalled: false,
                };
            }
            _ => {}
        }
    }

    fn on_buffering(&mut self) {
        if let PlaybackPhase::Ready { playing, requested } = self.phase {
            self.phase = PlaybackPhase::Loading {
                pending_play: requested.unwrap_or(playing),
                stalled: playing,
            };
        }
    }

    fn on_ended(&mut self) {
        if !matches!(
            self.phase,
            PlaybackPhase::Ready { .. } | PlaybackPhase::Loading { .. }
        ) {
            return;
        }
        self.phase = PlaybackPhase::Ended;
        self.current_time = self.duration;
        info!(track = %self.track_id, "track finished");
        self.outbox.push_back(PlayerEvent::NextTrackRequested {
            cause: AdvanceCause::Finished,
        });
    }

    fn on_error(&mut self, cause: PlaybackError) {
        warn!(track = %self.track_id, error = %cause, "playback error");
        if cause.is_surfaced() {
            self.outbox.push_back(PlayerEvent::PlaybackError {
                cause: cause.clone(),
            });
        }
        let loaded = self.loading_state();
        self.phase = PlaybackPhase::Error { cause, loaded };
    }
}
