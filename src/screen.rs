//! Text frame composition for the terminal dashboard.

use std::io::Write;

use crate::chart::text::TextChart;
use crate::chart::SlotId;
use crate::engine::DashboardState;

const RULE_WIDTH: usize = 72;
const WAITING: &str = "(waiting for first snapshot)";
pub const CONTROLS: &str = "[a] auto-refresh  [r] refresh  [v] voice alert  [q] quit";

fn section_title(slot: SlotId) -> &'static str {
    match slot {
        SlotId::ScoreLine => "Anomaly score",
        SlotId::ThreatPie => "Threat distribution",
        SlotId::Agreement => "Model agreement",
        SlotId::Importance => "Feature importance",
    }
}

fn rule(title: &str) -> String {
    let head = format!("── {} ", title);
    let pad = RULE_WIDTH.saturating_sub(head.chars().count());
    format!("{}{}", head, "─".repeat(pad))
}

pub fn compose(state: &DashboardState<TextChart>) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(rule("Threat dashboard"));
    lines.push(format!(
        "auto-refresh: {}   status: {}   {}",
        if state.auto_refresh { "on" } else { "off" },
        state.phase().as_str(),
        state
            .last_updated_text()
            .unwrap_or_else(|| "Last update: never".to_string()),
    ));
    lines.push(format!(
        "ticks: {} issued, {} applied, {} failed, {} stale",
        state.stats.issued, state.stats.applied, state.stats.failed, state.stats.stale_dropped,
    ));

    for id in SlotId::ALL {
        lines.push(String::new());
        lines.push(rule(section_title(id)));
        match state.charts.get(id).chart() {
            Some(chart) => lines.extend(chart.rendered().lines().map(str::to_string)),
            None => lines.push(WAITING.to_string()),
        }
    }

    lines.push(String::new());
    lines.push(rule("Top features"));
    if let Some(method) = &state.panels.xai_method {
        lines.push(format!("method: {}", method));
    }
    if state.panels.features.is_empty() {
        lines.push("(none)".to_string());
    }
    lines.extend(state.panels.features.iter().map(|f| f.display()));

    lines.push(String::new());
    lines.push(rule("Threat intel"));
    lines.extend(state.panels.intel.lines());

    lines.push(String::new());
    lines.push(rule("AI summary"));
    lines.push(state.summary.clone());

    if let Some(notice) = &state.notice {
        lines.push(String::new());
        lines.push(format!("! {}", notice));
    }

    lines.push(String::new());
    lines.push(CONTROLS.to_string());

    let mut frame = lines.join("\n");
    frame.push('\n');
    frame
}

/// Write one frame to stdout, clearing the terminal first when asked.
pub fn print_frame(frame: &str, clear: bool) -> std::io::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if clear {
        out.write_all(b"\x1b[2J\x1b[H")?;
    }
    out.write_all(frame.as_bytes())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::text::TextBackend;
    use crate::engine::{reduce, Event, FetchEvent, ReducerConfig};
    use crate::snapshot::Snapshot;
    use crate::view::NO_INTEL_PLACEHOLDER;

    #[test]
    fn empty_state_shows_placeholders() {
        let state: DashboardState<TextChart> = DashboardState::new(200, true);
        let frame = compose(&state);
        assert_eq!(frame.matches(WAITING).count(), 4);
        assert!(frame.contains("Last update: never"));
        assert!(frame.contains(NO_INTEL_PLACEHOLDER));
        assert!(frame.contains("Loading AI summary..."));
        assert!(frame.ends_with(&format!("{}\n", CONTROLS)));
    }

    #[test]
    fn applied_snapshot_is_rendered() {
        let mut state = DashboardState::new(200, false);
        let mut backend = TextBackend::new(40);
        let snapshot = Snapshot::from_json(
            r#"{"if": {"scores": [0.2, 0.9], "labels": [1, 0]},
                "categories": [{"label": "DDoS"}],
                "features": ["duration"], "xai_proxy": {"feature_importances": [0.42], "method": "shap"},
                "intel": [{"ip": "10.0.0.9", "threat_score": 85}]}"#,
        )
        .unwrap();
        reduce(
            &mut state,
            &mut backend,
            Event::Fetch(FetchEvent::SnapshotReady {
                seq: 1,
                snapshot: Box::new(snapshot),
                received_at: chrono::Local::now(),
            }),
            &ReducerConfig::default(),
        );
        let frame = compose(&state);
        assert!(!frame.contains(WAITING));
        assert!(frame.contains("auto-refresh: off"));
        assert!(frame.contains("duration  0.42"));
        assert!(frame.contains("method: shap"));
        assert!(frame.contains("10.0.0.9  High (85.0%)"));
        assert!(frame.contains("DDoS"));
    }

    #[test]
    fn notice_is_shown() {
        let mut state: DashboardState<TextChart> = DashboardState::new(10, true);
        state.notice = Some("Voice alert failed: tts offline".into());
        assert!(compose(&state).contains("! Voice alert failed: tts offline"));
    }
}
