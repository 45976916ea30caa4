use crate::{MediaAdapter, MediaProbe, ResourceEvent, TaggedEvent};
use muza_core::{Generation, PlaybackError, SimulationConfig, SourceLocator};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Default)]
struct Playhead {
    generation: Generation,
    position: f64,
    duration: f64,
    ready: bool,
    playing: bool,
}

/// Media resource that fakes streaming with timers.
///
/// Loading resolves through a [`MediaProbe`], then emits `metadata-ready` and
/// `data-ready` after the configured latencies. While playing, a clock task
/// advances the playhead and emits `time-update` until `ended`.
/// Must be driven from inside a tokio runtime.
pub struct SimulatedAdapter {
    cfg: SimulationConfig,
    probe: Arc<dyn MediaProbe>,
    events: mpsc::UnboundedSender<TaggedEvent>,
    playhead: Arc<Mutex<Playhead>>,
    loader: Option<JoinHandle<()>>,
    clock: Option<JoinHandle<()>>,
    volume: f64,
}

impl SimulatedAdapter {
    pub fn new(
        cfg: SimulationConfig,
        probe: Arc<dyn MediaProbe>,
    ) -> (Self, mpsc::UnboundedReceiver<TaggedEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let adapter = Self {
            cfg,
            probe,
            events,
            playhead: Arc::new(Mutex::new(Playhead::default())),
            loader: None,
            clock: None,
            volume: 1.0,
        };
        (adapter, rx)
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    fn lock(&self) -> MutexGuard<'_, Playhead> {
        lock_playhead(&self.playhead)
    }

    fn emit(&self, generation: Generation, event: ResourceEvent) {
        let _ = self.events.send(TaggedEvent::new(generation, event));
    }

    fn stop_tasks(&mut self) {
        if let Some(task) = self.loader.take() {
            task.abort();
        }
        self.stop_clock();
    }

    fn stop_clock(&mut self) {
        if let Some(task) = self.clock.take() {
            task.abort();
        }
    }

    fn start_clock(&mut self, generation: Generation) {
        let tick = Duration::from_millis(self.cfg.time_update_ms.max(10));
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();

        self.clock = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick).await;
                let (position, finished) = {
                    let mut head = lock_playhead(&playhead);
                    if head.generation != generation || !head.playing {
                        return;
                    }
                    head.position = (head.position + tick.as_secs_f64()).min(head.duration);
                    let finished = head.position >= head.duration;
                    if finished {
                        head.playing = false;
                    }
                    (head.position, finished)
                };

                let _ = events.send(TaggedEvent::new(
                    generation,
                    ResourceEvent::TimeUpdate { time: position },
                ));
                if finished {
                    let _ = events.send(TaggedEvent::new(generation, ResourceEvent::Ended));
                    return;
                }
            }
        }));
    }
}

fn lock_playhead(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    playhead.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MediaAdapter for SimulatedAdapter {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn load(&mut self, generation: Generation, source: &SourceLocator) {
        self.stop_tasks();
        *self.lock() = Playhead {
            generation,
            ..Playhead::default()
        };

        let probe = Arc::clone(&self.probe);
        let playhead = Arc::clone(&self.playhead);
        let events = self.events.clone();
        let source = source.clone();
        let metadata_delay = Duration::from_millis(self.cfg.metadata_latency_ms);
        let data_delay = Duration::from_millis(
            self.cfg
                .data_latency_ms
                .saturating_sub(self.cfg.metadata_latency_ms),
        );

        debug!(%generation, %source, "simulated load started");
        self.loader = Some(tokio::spawn(async move {
            let send = |event| {
                let _ = events.send(TaggedEvent::new(generation, event));
            };

            let info = match probe.probe(&source).await {
                Ok(info) => info,
                Err(err) => {
                    send(ResourceEvent::Error {
                        cause: PlaybackError::Load(format!("{err:#}")),
                    });
                    return;
                }
            };

            tokio::time::sleep(metadata_delay).await;
            lock_playhead(&playhead).duration = info.duration;
            send(ResourceEvent::MetadataReady {
                duration: info.duration,
            });

            tokio::time::sleep(data_delay).await;
            lock_playhead(&playhead).ready = true;
            send(ResourceEvent::DataReady);
        }));
    }

    fn unload(&mut self) {
        self.stop_tasks();
        let mut head = self.lock();
        head.ready = false;
        head.playing = false;
        head.position = 0.0;
        head.duration = 0.0;
    }

    fn play(&mut self) {
        let (generation, ready, playing) = {
            let head = self.lock();
            (head.generation, head.ready, head.playing)
        };

        if self.cfg.reject_play {
            self.emit(
                generation,
                ResourceEvent::Error {
                    cause: PlaybackError::PlaybackRejected(
                        "playback blocked by platform policy".to_string(),
                    ),
                },
            );
            return;
        }
        if !ready {
            debug!(%generation, "play() dropped: no media data buffered");
            return;
        }
        if playing {
            return;
        }

        {
            let mut head = self.lock();
            if head.position >= head.duration {
                head.position = 0.0;
            }
            head.playing = true;
        }
        self.emit(generation, ResourceEvent::Playing);
        self.start_clock(generation);
    }

    fn pause(&mut self) {
        self.stop_clock();
        let (generation, was_playing) = {
            let mut head = self.lock();
            let was_playing = head.playing;
            head.playing = false;
            (head.generation, was_playing)
        };
        if was_playing {
            self.emit(generation, ResourceEvent::Paused);
        }
    }

    fn seek(&mut self, seconds: f64) {
        let (generation, position) = {
            let mut head = self.lock();
            head.position = seconds.clamp(0.0, head.duration);
            (head.generation, head.position)
        };
        self.emit(generation, ResourceEvent::TimeUpdate { time: position });
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
        debug!(volume, "simulated volume applied");
    }
}

impl Drop for SimulatedAdapter {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

#[cfg(test)]
mod tests {
    use super::SimulatedAdapter;
    use crate::{MediaAdapter, ResourceEvent, StaticProbe, TaggedEvent};
    use muza_core::{Generation, PlaybackError, SimulationConfig, SourceLocator};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn cfg() -> SimulationConfig {
        SimulationConfig {
            metadata_latency_ms: 1,
            data_latency_ms: 2,
            time_update_ms: 10,
            reject_play: false,
            failing_sources: Vec::new(),
        }
    }

    fn adapter(cfg: SimulationConfig) -> (SimulatedAdapter, UnboundedReceiver<TaggedEvent>) {
        let mut probe = StaticProbe::new();
        probe.insert(SourceLocator::new("a.mp3"), 200.0);
        probe.insert(SourceLocator::new("short.mp3"), 0.025);
        probe.fail_matching("broken");
        SimulatedAdapter::new(cfg, Arc::new(probe))
    }

    async fn next(rx: &mut UnboundedReceiver<TaggedEvent>) -> TaggedEvent {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for adapter event")
            .expect("adapter channel closed")
    }

    #[tokio::test]
    async fn load_reports_metadata_then_data() {
        let (mut adapter, mut rx) = adapter(cfg());
        let generation = Generation::default().next();
        adapter.load(generation, &SourceLocator::new("a.mp3"));

        let first = next(&mut rx).await;
        assert_eq!(first.generation, generation);
        assert_eq!(first.event, ResourceEvent::MetadataReady { duration: 200.0 });
        assert_eq!(next(&mut rx).await.event, ResourceEvent::DataReady);
    }

    #[tokio::test]
    async fn undecodable_source_reports_load_error() {
        let (mut adapter, mut rx) = adapter(cfg());
        adapter.load(Generation::default(), &SourceLocator::new("broken/x.mp3"));

        match next(&mut rx).await.event {
            ResourceEvent::Error {
                cause: PlaybackError::Load(_),
            } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejected_play_surfaces_error() {
        let mut c = cfg();
        c.reject_play = true;
        let (mut adapter, mut rx) = adapter(c);
        adapter.load(Generation::default(), &SourceLocator::new("a.mp3"));
        let _ = next(&mut rx).await;
        let _ = next(&mut rx).await;

        adapter.play();
        match next(&mut rx).await.event {
            ResourceEvent::Error {
                cause: PlaybackError::PlaybackRejected(_),
            } => {}
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn reload_supersedes_previous_loader() {
        let (mut adapter, mut rx) = adapter(cfg());
        let first = Generation::default();
        let second = first.next();
        adapter.load(first, &SourceLocator::new("a.mp3"));
        adapter.load(second, &SourceLocator::new("a.mp3"));

        assert_eq!(next(&mut rx).await.generation, second);
        assert_eq!(next(&mut rx).await.generation, second);
    }

    #[tokio::test]
    async fn plays_to_the_end() {
        let (mut adapter, mut rx) = adapter(cfg());
        adapter.load(Generation::default(), &SourceLocator::new("short.mp3"));
        let _ = next(&mut rx).await;
        let _ = next(&mut rx).await;

        adapter.play();
        assert_eq!(next(&mut rx).await.event, ResourceEvent::Playing);
        loop {
            match next(&mut rx).await.event {
                ResourceEvent::TimeUpdate { time } => assert!(time <= 0.025),
                ResourceEvent::Ended => break,
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn remembers_applied_volume() {
        let (mut adapter, _rx) = adapter(cfg());
        assert_eq!(adapter.volume(), 1.0);
        adapter.set_volume(0.3);
        assert_eq!(adapter.volume(), 0.3);
    }

    #[tokio::test]
    async fn play_before_data_is_dropped() {
        let mut c = cfg();
        c.metadata_latency_ms = 50;
        c.data_latency_ms = 100;
        let (mut adapter, mut rx) = adapter(c);
        adapter.load(Generation::default(), &SourceLocator::new("a.mp3"));
        adapter.play();

        assert!(matches!(
            next(&mut rx).await.event,
            ResourceEvent::MetadataReady { .. }
        ));
    }
}
