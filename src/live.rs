//! Live runtime: timers, stdin controls and fetch tasks feeding the reducer.
//!
//! The loop runs on one task. Fetches run on spawned tasks and post their
//! results back through the channel, so state is only touched here.

use anyhow::Result;
use chrono::Local;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant as StdInstant;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::alert::AudioPlayer;
use crate::chart::text::{TextBackend, TextChart};
use crate::client::{DashboardApi, FetchFailure};
use crate::config::DashConfig;
use crate::engine::{
    boot, reduce, Command, DashboardState, Event, FetchEvent, ReducerConfig, TickSeq, TickStats,
    TimerEvent, UiEvent,
};
use crate::logging::{self, log, obj, v_str, Domain, Level, ProfileScope};
use crate::screen;

/// Map one stdin line to a control event.
pub fn parse_control(line: &str) -> Option<UiEvent> {
    let mut words = line.split_whitespace().map(|w| w.to_ascii_lowercase());
    let head = words.next()?;
    let arg = words.next();
    match (head.as_str(), arg.as_deref()) {
        ("a" | "auto", None) => Some(UiEvent::ToggleAutoRefresh),
        ("a" | "auto", Some("on")) => Some(UiEvent::SetAutoRefresh(true)),
        ("a" | "auto", Some("off")) => Some(UiEvent::SetAutoRefresh(false)),
        ("v" | "voice", None) => Some(UiEvent::VoiceAlert),
        ("r" | "refresh", None) => Some(UiEvent::RefreshNow),
        ("q" | "quit" | "exit", None) => Some(UiEvent::Quit),
        _ => None,
    }
}

fn spawn_ticker(tx: UnboundedSender<Event>, period: Duration, timer: TimerEvent) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.send(Event::Timer(timer)).is_err() {
                break;
            }
        }
    })
}

/// Blocking stdin reads on a plain thread; it dies with the process.
fn spawn_stdin_reader(tx: UnboundedSender<Event>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_control(&line) {
                Some(ui) => {
                    if tx.send(Event::Ui(ui)).is_err() {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => log(
                    Level::Info,
                    Domain::Control,
                    "unknown_control",
                    obj(&[("input", v_str(line.trim()))]),
                ),
            }
        }
    });
}

pub struct LiveLoop {
    cfg: DashConfig,
    reducer_cfg: ReducerConfig,
    state: DashboardState<TextChart>,
    backend: TextBackend,
    api: Arc<dyn DashboardApi>,
    player: Arc<dyn AudioPlayer>,
    tx: UnboundedSender<Event>,
    rx: UnboundedReceiver<Event>,
    refresh_timer: Option<JoinHandle<()>>,
    summary_timer: Option<JoinHandle<()>>,
}

impl LiveLoop {
    pub fn new(cfg: DashConfig, api: Arc<dyn DashboardApi>, player: Arc<dyn AudioPlayer>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            reducer_cfg: ReducerConfig {
                discard_stale: cfg.discard_stale,
            },
            state: DashboardState::new(cfg.history_cap, cfg.auto_refresh),
            backend: TextBackend::new(cfg.chart_width),
            cfg,
            api,
            player,
            tx,
            rx,
            refresh_timer: None,
            summary_timer: None,
        }
    }

    /// Handle for injecting events from outside the loop.
    pub fn sender(&self) -> UnboundedSender<Event> {
        self.tx.clone()
    }

    pub fn state(&self) -> &DashboardState<TextChart> {
        &self.state
    }

    /// Run until a quit control arrives.
    pub async fn drive(mut self) -> Result<TickStats> {
        let started = StdInstant::now();
        self.summary_timer = Some(spawn_ticker(
            self.tx.clone(),
            self.cfg.summary_period(),
            TimerEvent::Summary,
        ));

        let commands = boot(&mut self.state);
        self.execute(commands);

        while !self.state.quit {
            let Some(event) = self.rx.recv().await else {
                break;
            };
            let out = reduce(&mut self.state, &mut self.backend, event, &self.reducer_cfg);
            self.execute(out.commands);
        }

        self.stop_timers();
        let stats = self.state.stats;
        logging::log_session_summary(
            started.elapsed().as_secs(),
            stats.applied,
            stats.failed,
            stats.stale_dropped,
        );
        Ok(stats)
    }

    fn stop_timers(&mut self) {
        for handle in [self.refresh_timer.take(), self.summary_timer.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for cmd in commands {
            match cmd {
                Command::FetchSnapshot { seq } => self.spawn_snapshot_fetch(seq),
                Command::FetchSummary => self.spawn_summary_fetch(),
                Command::RequestVoiceAlert => self.spawn_voice_alert(),
                Command::PlayAudio { path } => self.spawn_playback(path),
                Command::SetRefreshTimer { running } => {
                    if let Some(handle) = self.refresh_timer.take() {
                        handle.abort();
                    }
                    if running {
                        self.refresh_timer = Some(spawn_ticker(
                            self.tx.clone(),
                            self.cfg.refresh_period(),
                            TimerEvent::Refresh,
                        ));
                    }
                }
                Command::Notify { msg } => eprintln!("[NOTICE] {}", msg),
                Command::Render => self.render(),
                Command::Shutdown => self.stop_timers(),
            }
        }
    }

    fn render(&self) {
        let _scope = ProfileScope::new("render_frame");
        let frame = screen::compose(&self.state);
        if let Err(e) = screen::print_frame(&frame, self.cfg.clear_screen) {
            log(
                Level::Warn,
                Domain::Render,
                "frame_write_failed",
                obj(&[("error", v_str(&e.to_string()))]),
            );
        }
    }

    fn spawn_snapshot_fetch(&self, seq: TickSeq) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match api.fetch_snapshot().await {
                Ok(snapshot) => FetchEvent::SnapshotReady {
                    seq,
                    snapshot: Box::new(snapshot),
                    received_at: Local::now(),
                },
                Err(e) => FetchEvent::SnapshotFailed {
                    seq,
                    failure: FetchFailure::from_error(&e),
                },
            };
            // receiver gone means the loop already shut down
            let _ = tx.send(Event::Fetch(event));
        });
    }

    fn spawn_summary_fetch(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match api.fetch_summary().await {
                Ok(summary) => FetchEvent::SummaryLoaded { summary },
                Err(e) => FetchEvent::SummaryFailed {
                    failure: FetchFailure::from_error(&e),
                },
            };
            let _ = tx.send(Event::Fetch(event));
        });
    }

    fn spawn_voice_alert(&self) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match api.request_voice_alert().await {
                Ok(reply) => FetchEvent::VoiceAlertReplied { reply },
                Err(e) => FetchEvent::VoiceAlertFailed {
                    failure: FetchFailure::from_error(&e),
                },
            };
            let _ = tx.send(Event::Fetch(event));
        });
    }

    fn spawn_playback(&self, path: String) {
        let api = Arc::clone(&self.api);
        let player = Arc::clone(&self.player);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let played = match api.fetch_artifact(&path).await {
                Ok(bytes) => player.play(&path, bytes).await,
                Err(e) => Err(e),
            };
            match played {
                Ok(file) => log(
                    Level::Info,
                    Domain::Alert,
                    "audio_played",
                    obj(&[
                        ("path", v_str(&path)),
                        ("file", v_str(&file.to_string_lossy())),
                    ]),
                ),
                Err(e) => {
                    let _ = tx.send(Event::Fetch(FetchEvent::AudioFailed {
                        error: format!("{:#}", e),
                    }));
                }
            }
        });
    }
}

/// Run the live dashboard with stdin controls until the operator quits.
pub async fn run(
    cfg: DashConfig,
    api: Arc<dyn DashboardApi>,
    player: Arc<dyn AudioPlayer>,
) -> Result<TickStats> {
    let live = LiveLoop::new(cfg, api, player);
    spawn_stdin_reader(live.sender());
    live.drive().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::VoiceAlertReply;
    use crate::snapshot::Snapshot;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parses_controls() {
        assert_eq!(parse_control("a"), Some(UiEvent::ToggleAutoRefresh));
        assert_eq!(parse_control("  AUTO  "), Some(UiEvent::ToggleAutoRefresh));
        assert_eq!(parse_control("auto on"), Some(UiEvent::SetAutoRefresh(true)));
        assert_eq!(parse_control("auto off"), Some(UiEvent::SetAutoRefresh(false)));
        assert_eq!(parse_control("v"), Some(UiEvent::VoiceAlert));
        assert_eq!(parse_control("refresh"), Some(UiEvent::RefreshNow));
        assert_eq!(parse_control("q"), Some(UiEvent::Quit));
        assert_eq!(parse_control(""), None);
        assert_eq!(parse_control("auto maybe"), None);
        assert_eq!(parse_control("dance"), None);
    }

    struct FixedApi {
        snapshots: AtomicUsize,
    }

    #[async_trait]
    impl DashboardApi for FixedApi {
        async fn fetch_snapshot(&self) -> Result<Snapshot> {
            self.snapshots.fetch_add(1, Ordering::SeqCst);
            Ok(Snapshot::from_json(r#"{"if": {"scores": [0.5], "labels": [1]}}"#)?)
        }
        async fn fetch_summary(&self) -> Result<Option<String>> {
            Ok(Some("all quiet".into()))
        }
        async fn request_voice_alert(&self) -> Result<VoiceAlertReply> {
            anyhow::bail!("not used")
        }
        async fn fetch_artifact(&self, _path: &str) -> Result<Vec<u8>> {
            anyhow::bail!("not used")
        }
    }

    struct NullPlayer;

    #[async_trait]
    impl AudioPlayer for NullPlayer {
        async fn play(&self, name: &str, _bytes: Vec<u8>) -> Result<PathBuf> {
            Ok(PathBuf::from(name))
        }
    }

    #[tokio::test]
    async fn boot_tick_is_applied_before_quit() {
        let cfg = DashConfig {
            refresh_ms: 60_000,
            summary_ms: 60_000,
            clear_screen: false,
            ..Default::default()
        };
        let api = Arc::new(FixedApi {
            snapshots: AtomicUsize::new(0),
        });
        let live = LiveLoop::new(cfg, api.clone(), Arc::new(NullPlayer));
        let tx = live.sender();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = tx.send(Event::Ui(UiEvent::Quit));
        });

        let stats = live.drive().await.unwrap();
        assert_eq!(stats.issued, 1);
        assert_eq!(stats.applied, 1);
        assert_eq!(api.snapshots.load(Ordering::SeqCst), 1);
    }
}
