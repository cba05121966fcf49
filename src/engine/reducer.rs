//! Reducer: (State, Event) -> Vec<Command>
//!
//! All dashboard state transitions happen here. Network work and drawing to
//! the terminal are requested as commands and carried out by the runtime, so
//! the reducer can be driven directly in tests.

use chrono::{DateTime, Local};
use serde_json::json;

use super::events::*;
use super::state::DashboardState;
use crate::chart::{specs, ChartBackend, ChartSlot, SeriesSpec};
use crate::logging::{self, log, obj, v_str, Domain, Level, ProfileScope};
use crate::snapshot::Snapshot;
use crate::view::{self, SnapshotPanels};

#[derive(Debug, Clone)]
pub struct ReducerConfig {
    /// Drop snapshot responses older than the last applied tick.
    pub discard_stale: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            discard_stale: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct ReducerOutput {
    pub commands: Vec<Command>,
}

/// Commands to run once at startup: timer, first refresh, first summary.
pub fn boot<C>(state: &mut DashboardState<C>) -> Vec<Command> {
    let mut commands = vec![Command::SetRefreshTimer {
        running: state.auto_refresh,
    }];
    issue_tick(state, &mut commands);
    commands.push(Command::FetchSummary);
    commands.push(Command::Render);
    commands
}

pub fn reduce<B: ChartBackend>(
    state: &mut DashboardState<B::Chart>,
    backend: &mut B,
    event: Event,
    cfg: &ReducerConfig,
) -> ReducerOutput {
    let mut commands = Vec::new();

    match event {
        Event::Timer(timer) => handle_timer(state, timer, &mut commands),
        Event::Ui(ui) => handle_ui(state, ui, &mut commands),
        Event::Fetch(fetch) => handle_fetch(state, backend, fetch, cfg, &mut commands),
    }

    ReducerOutput { commands }
}

fn issue_tick<C>(state: &mut DashboardState<C>, commands: &mut Vec<Command>) {
    let seq = state.next_seq;
    state.next_seq += 1;
    state.pending.insert(seq);
    state.stats.issued += 1;
    logging::log_tick_issued(seq, state.pending.len());
    commands.push(Command::FetchSnapshot { seq });
}

fn handle_timer<C>(state: &mut DashboardState<C>, timer: TimerEvent, commands: &mut Vec<Command>) {
    match timer {
        TimerEvent::Refresh => {
            // a tick queued just before auto-refresh was switched off
            if state.auto_refresh {
                issue_tick(state, commands);
            }
        }
        TimerEvent::Summary => commands.push(Command::FetchSummary),
    }
}

fn handle_ui<C>(state: &mut DashboardState<C>, ui: UiEvent, commands: &mut Vec<Command>) {
    match ui {
        UiEvent::SetAutoRefresh(on) => set_auto_refresh(state, on, commands),
        UiEvent::ToggleAutoRefresh => {
            let on = !state.auto_refresh;
            set_auto_refresh(state, on, commands);
        }
        UiEvent::RefreshNow => {
            logging::log_control("refresh", "now");
            issue_tick(state, commands);
        }
        UiEvent::VoiceAlert => {
            logging::log_control("voice_alert", "pressed");
            commands.push(Command::RequestVoiceAlert);
        }
        UiEvent::Quit => {
            logging::log_control("quit", "requested");
            state.quit = true;
            commands.push(Command::Shutdown);
        }
    }
}

fn set_auto_refresh<C>(state: &mut DashboardState<C>, on: bool, commands: &mut Vec<Command>) {
    logging::log_control("auto_refresh", if on { "on" } else { "off" });
    if state.auto_refresh == on {
        return;
    }
    state.auto_refresh = on;
    commands.push(Command::SetRefreshTimer { running: on });
    commands.push(Command::Render);
}

fn handle_fetch<B: ChartBackend>(
    state: &mut DashboardState<B::Chart>,
    backend: &mut B,
    event: FetchEvent,
    cfg: &ReducerConfig,
    commands: &mut Vec<Command>,
) {
    match event {
        FetchEvent::SnapshotReady {
            seq,
            snapshot,
            received_at,
        } => {
            state.pending.remove(&seq);
            match state.last_applied {
                Some(last) if cfg.discard_stale && seq < last => {
                    state.stats.stale_dropped += 1;
                    logging::log_stale_dropped(seq, last);
                }
                _ => {
                    apply_snapshot(state, backend, seq, &snapshot, received_at);
                    commands.push(Command::Render);
                }
            }
        }

        FetchEvent::SnapshotFailed { seq, failure } => {
            // Tick abandoned; the display keeps the last applied snapshot.
            state.pending.remove(&seq);
            state.stats.failed += 1;
            logging::log_fetch_failed(seq, failure.kind.as_str(), &failure.message);
        }

        FetchEvent::SummaryLoaded { summary } => {
            state.summary = view::summary_text(Ok(summary));
            commands.push(Command::Render);
        }

        FetchEvent::SummaryFailed { failure } => {
            log(
                Level::Warn,
                Domain::Summary,
                "summary_failed",
                obj(&[
                    ("kind", v_str(failure.kind.as_str())),
                    ("msg", v_str(&failure.message)),
                ]),
            );
            state.summary = view::summary_text(Err(()));
            commands.push(Command::Render);
        }

        FetchEvent::VoiceAlertReplied { reply } => match (reply.ok, reply.path) {
            (true, Some(path)) => {
                log(
                    Level::Info,
                    Domain::Alert,
                    "voice_alert_ready",
                    obj(&[("path", v_str(&path))]),
                );
                state.notice = None;
                commands.push(Command::PlayAudio { path });
                commands.push(Command::Render);
            }
            (true, None) => notify(state, "Voice alert failed: no audio path returned", commands),
            (false, _) => {
                let reason = reply.error.unwrap_or_else(|| "unknown error".to_string());
                notify(state, &format!("Voice alert failed: {}", reason), commands);
            }
        },

        FetchEvent::VoiceAlertFailed { failure } => {
            notify(state, &format!("Voice alert failed: {}", failure.message), commands);
        }

        FetchEvent::AudioFailed { error } => {
            notify(state, &format!("Voice alert playback failed: {}", error), commands);
        }
    }
}

fn notify<C>(state: &mut DashboardState<C>, msg: &str, commands: &mut Vec<Command>) {
    log(Level::Warn, Domain::Alert, "notice", obj(&[("msg", v_str(msg))]));
    state.notice = Some(msg.to_string());
    commands.push(Command::Notify {
        msg: msg.to_string(),
    });
    commands.push(Command::Render);
}

/// Fan a snapshot out: history, then each chart, then panels, then the clock.
fn apply_snapshot<B: ChartBackend>(
    state: &mut DashboardState<B::Chart>,
    backend: &mut B,
    seq: TickSeq,
    snapshot: &Snapshot,
    received_at: DateTime<Local>,
) {
    let _scope = ProfileScope::with_context("apply_snapshot", &[("tick_seq", json!(seq))]);

    let scores = snapshot.scores();
    state.history.append(scores);
    sync_slot(
        &mut state.charts.score_line,
        backend,
        specs::score_line(&state.history, !scores.is_empty()),
    );

    let slices = view::threat_distribution(&snapshot.categories);
    sync_slot(&mut state.charts.threat_pie, backend, specs::threat_pie(&slices));

    let rates = view::agreement_rates(snapshot);
    sync_slot(&mut state.charts.agreement, backend, specs::agreement(&rates));

    let panels = SnapshotPanels::from_snapshot(snapshot);
    sync_slot(
        &mut state.charts.importance,
        backend,
        specs::importance(&panels.features),
    );
    state.panels = panels;

    state.last_updated = Some(received_at);
    state.last_applied = Some(seq);
    state.stats.applied += 1;

    let digest = snapshot.digest();
    logging::log_tick_applied(
        seq,
        scores.len(),
        snapshot.categories.len(),
        snapshot.intel.len(),
        &digest,
    );
    state.last_digest = Some(digest);
}

fn sync_slot<B: ChartBackend>(slot: &mut ChartSlot<B::Chart>, backend: &mut B, spec: SeriesSpec) {
    let outcome = slot.sync(backend, spec);
    let points = slot.data().map(|d| d.len()).unwrap_or(0);
    logging::log_chart_sync(slot.id().name(), outcome.as_str(), points, slot.generation());
}
