//! Reducer-level dashboard flow against a recording chart backend.

use chrono::Local;
use std::cell::RefCell;
use std::rc::Rc;

use threatboard::chart::{ChartBackend, ChartConfig, ChartData, ChartInstance, SlotId, UpdateMode};
use threatboard::client::{FailureKind, FetchFailure};
use threatboard::engine::{
    boot, reduce, Command, DashboardState, Event, FetchEvent, ReducerConfig, TimerEvent,
};
use threatboard::snapshot::Snapshot;
use threatboard::view::RiskLevel;

#[derive(Debug, Default)]
struct Journal {
    created: Vec<SlotId>,
    destroyed: Vec<SlotId>,
    silent_updates: Vec<SlotId>,
}

#[derive(Debug)]
struct RecordingChart {
    slot: SlotId,
    config: ChartConfig,
    journal: Rc<RefCell<Journal>>,
}

impl ChartInstance for RecordingChart {
    fn config(&self) -> &ChartConfig {
        &self.config
    }

    fn data_mut(&mut self) -> &mut ChartData {
        &mut self.config.data
    }

    fn update(&mut self, mode: UpdateMode) {
        if mode == UpdateMode::Silent {
            self.journal.borrow_mut().silent_updates.push(self.slot);
        }
    }

    fn destroy(self) {
        self.journal.borrow_mut().destroyed.push(self.slot);
    }
}

#[derive(Default)]
struct RecordingBackend {
    journal: Rc<RefCell<Journal>>,
}

impl ChartBackend for RecordingBackend {
    type Chart = RecordingChart;

    fn create(&mut self, slot: SlotId, config: ChartConfig) -> RecordingChart {
        self.journal.borrow_mut().created.push(slot);
        RecordingChart {
            slot,
            config,
            journal: Rc::clone(&self.journal),
        }
    }
}

fn count(slots: &[SlotId], slot: SlotId) -> usize {
    slots.iter().filter(|&&s| s == slot).count()
}

fn snapshot_event(seq: u64, body: &str) -> Event {
    Event::Fetch(FetchEvent::SnapshotReady {
        seq,
        snapshot: Box::new(Snapshot::from_json(body).expect("valid snapshot json")),
        received_at: Local::now(),
    })
}

fn tick_body(score: f64, category: &str) -> String {
    format!(
        r#"{{"if": {{"scores": [{score}], "labels": [1, 0, 1, 1]}},
            "ae": {{"scores": [0.1], "labels": [0, 0]}},
            "categories": [{{"label": "{category}"}}, {{"label": "DDoS"}}, null],
            "features": ["duration", "bytes"],
            "xai_proxy": {{"feature_importances": [0.6]}},
            "intel": [{{"ip": "203.0.113.7", "threat_score": 85}}]}}"#
    )
}

#[test]
fn line_is_built_once_and_categorical_charts_every_tick() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    for seq in 1..=5 {
        let event = snapshot_event(seq, &tick_body(seq as f64 / 10.0, "Port Scan"));
        reduce(&mut state, &mut backend, event, &cfg);
    }

    let journal = backend.journal.borrow();
    assert_eq!(count(&journal.created, SlotId::ScoreLine), 1);
    assert_eq!(count(&journal.destroyed, SlotId::ScoreLine), 0);
    assert_eq!(count(&journal.silent_updates, SlotId::ScoreLine), 4);
    for slot in [SlotId::ThreatPie, SlotId::Agreement, SlotId::Importance] {
        assert_eq!(count(&journal.created, slot), 5, "{:?}", slot);
        assert_eq!(count(&journal.destroyed, slot), 4, "{:?}", slot);
    }
    assert_eq!(state.charts.score_line.generation(), 1);
    assert_eq!(state.charts.threat_pie.generation(), 5);

    let line = state.charts.score_line.data().unwrap();
    assert_eq!(line.values(), &[0.1, 0.2, 0.3, 0.4, 0.5]);
    assert_eq!(line.labels, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn categorical_data_follows_latest_snapshot() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    reduce(&mut state, &mut backend, snapshot_event(1, &tick_body(0.3, "Port Scan")), &cfg);

    let pie = state.charts.threat_pie.data().unwrap();
    assert_eq!(pie.labels, vec!["Port Scan", "DDoS", "Normal"]);
    assert_eq!(pie.values(), &[1.0, 1.0, 1.0]);

    let agreement = state.charts.agreement.data().unwrap();
    assert_eq!(agreement.labels, vec!["AE", "IF"]);
    assert_eq!(agreement.values(), &[0.0, 0.75]);

    let importance = state.charts.importance.data().unwrap();
    assert_eq!(importance.labels, vec!["duration", "bytes"]);
    assert_eq!(importance.values(), &[0.6, 0.0]);

    assert_eq!(state.panels.intel.rows()[0].risk, RiskLevel::High);
}

#[test]
fn failed_fetch_leaves_charts_untouched() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    reduce(&mut state, &mut backend, snapshot_event(1, &tick_body(0.4, "DDoS")), &cfg);
    let before = state.view();
    let created_before = backend.journal.borrow().created.len();

    for kind in [FailureKind::Transport, FailureKind::Status, FailureKind::Decode, FailureKind::Backend] {
        let failed = Event::Fetch(FetchEvent::SnapshotFailed {
            seq: 2,
            failure: FetchFailure {
                kind,
                message: "boom".into(),
            },
        });
        let out = reduce(&mut state, &mut backend, failed, &cfg);
        assert!(out.commands.is_empty());
    }

    let after = state.view();
    assert_eq!(after.charts, before.charts);
    assert_eq!(after.intel, before.intel);
    assert_eq!(after.last_updated, before.last_updated);
    assert_eq!(backend.journal.borrow().created.len(), created_before);
    assert_eq!(state.stats.failed, 4);
}

#[test]
fn out_of_order_response_is_discarded() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    let cmds = boot(&mut state);
    assert!(cmds.contains(&Command::FetchSnapshot { seq: 1 }));
    let out = reduce(&mut state, &mut backend, Event::Timer(TimerEvent::Refresh), &cfg);
    assert_eq!(out.commands, vec![Command::FetchSnapshot { seq: 2 }]);

    // tick 2 resolves first
    reduce(&mut state, &mut backend, snapshot_event(2, &tick_body(0.9, "Botnet")), &cfg);
    let out = reduce(&mut state, &mut backend, snapshot_event(1, &tick_body(0.1, "Worm")), &cfg);

    assert!(out.commands.is_empty());
    assert_eq!(state.last_applied, Some(2));
    assert_eq!(state.stats.stale_dropped, 1);
    assert!(state.pending.is_empty());
    assert_eq!(state.charts.score_line.data().unwrap().values(), &[0.9]);
    assert_eq!(state.charts.threat_pie.data().unwrap().labels[0], "Botnet");
}

#[test]
fn history_stays_bounded_on_chart_and_buffer() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    for seq in 1..=30u64 {
        let scores: Vec<String> = (0..10).map(|i| format!("{}", seq * 10 + i)).collect();
        let body = format!(r#"{{"if": {{"scores": [{}]}}}}"#, scores.join(","));
        reduce(&mut state, &mut backend, snapshot_event(seq, &body), &cfg);
        assert!(state.history.len() <= 200);
        assert!(state.charts.score_line.data().unwrap().len() <= 200);
    }

    assert_eq!(state.history.len(), 200);
    assert_eq!(state.history.latest(), Some(309.0));
    let kept = state.history.to_vec();
    assert_eq!(kept[0], 110.0);
    assert!(kept.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn tick_without_scores_keeps_line_unchanged() {
    let mut state = DashboardState::new(200, true);
    let mut backend = RecordingBackend::default();
    let cfg = ReducerConfig::default();

    reduce(&mut state, &mut backend, snapshot_event(1, r#"{"if": {"scores": [0.5]}}"#), &cfg);
    reduce(&mut state, &mut backend, snapshot_event(2, r#"{"categories": []}"#), &cfg);

    assert_eq!(state.charts.score_line.data().unwrap().values(), &[0.5]);
    assert_eq!(count(&backend.journal.borrow().silent_updates, SlotId::ScoreLine), 0);
    assert_eq!(state.stats.applied, 2);
}
