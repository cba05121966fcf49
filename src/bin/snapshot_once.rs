//! Fetch one snapshot, render it and exit.
//!
//! Usage: snapshot_once [--json]

use anyhow::{Context, Result};
use chrono::Local;

use threatboard::chart::text::TextBackend;
use threatboard::client::{DashboardApi, FetchFailure, HttpApi};
use threatboard::config::DashConfig;
use threatboard::engine::{reduce, DashboardState, Event, FetchEvent, ReducerConfig};
use threatboard::logging::{log, obj, v_str, Domain, Level};
use threatboard::screen;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let as_json = std::env::args().skip(1).any(|a| a == "--json");
    let cfg = DashConfig::from_env();
    cfg.validate().context("invalid dashboard configuration")?;
    let api = HttpApi::new(&cfg)?;

    let mut state = DashboardState::new(cfg.history_cap, false);
    let mut backend = TextBackend::new(cfg.chart_width);
    let reducer_cfg = ReducerConfig::default();

    let snapshot = match api.fetch_snapshot().await {
        Ok(s) => s,
        Err(e) => {
            let failure = FetchFailure::from_error(&e);
            log(
                Level::Error,
                Domain::Fetch,
                "snapshot_once_failed",
                obj(&[
                    ("kind", v_str(failure.kind.as_str())),
                    ("msg", v_str(&failure.message)),
                ]),
            );
            eprintln!("{}", failure);
            std::process::exit(1);
        }
    };

    let summary = match api.fetch_summary().await {
        Ok(summary) => FetchEvent::SummaryLoaded { summary },
        Err(e) => FetchEvent::SummaryFailed {
            failure: FetchFailure::from_error(&e),
        },
    };

    for event in [
        FetchEvent::SnapshotReady {
            seq: 1,
            snapshot: Box::new(snapshot),
            received_at: Local::now(),
        },
        summary,
    ] {
        reduce(&mut state, &mut backend, Event::Fetch(event), &reducer_cfg);
    }

    if as_json {
        let view = serde_json::to_string_pretty(&state.view())?;
        println!("{}", view);
    } else {
        print!("{}", screen::compose(&state));
    }
    Ok(())
}
