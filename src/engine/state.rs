use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeSet;

use super::events::TickSeq;
use crate::chart::{ChartInstance, ChartKind, ChartSlots, SlotId};
use crate::history::RollingHistory;
use crate::view::{FeatureRow, IntelPanel, SnapshotPanels};

pub const SUMMARY_LOADING: &str = "Loading AI summary...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No snapshot request outstanding.
    Idle,
    /// At least one snapshot request outstanding.
    Polling,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Polling => "polling",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickStats {
    pub issued: u64,
    pub applied: u64,
    pub failed: u64,
    pub stale_dropped: u64,
}

/// All mutable dashboard state, owned by the runtime loop.
#[derive(Debug)]
pub struct DashboardState<C> {
    pub auto_refresh: bool,
    pub next_seq: TickSeq,
    pub pending: BTreeSet<TickSeq>,
    pub last_applied: Option<TickSeq>,
    pub history: RollingHistory,
    pub charts: ChartSlots<C>,
    pub panels: SnapshotPanels,
    pub summary: String,
    pub notice: Option<String>,
    pub last_updated: Option<DateTime<Local>>,
    pub last_digest: Option<String>,
    pub stats: TickStats,
    pub quit: bool,
}

impl<C: ChartInstance> DashboardState<C> {
    pub fn new(history_cap: usize, auto_refresh: bool) -> Self {
        let history = RollingHistory::new(history_cap);
        let bound = history.capacity();
        Self {
            auto_refresh,
            next_seq: 1,
            pending: BTreeSet::new(),
            last_applied: None,
            history,
            charts: ChartSlots::new(bound),
            panels: SnapshotPanels::default(),
            summary: SUMMARY_LOADING.to_string(),
            notice: None,
            last_updated: None,
            last_digest: None,
            stats: TickStats::default(),
            quit: false,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_empty() {
            Phase::Idle
        } else {
            Phase::Polling
        }
    }

    pub fn last_updated_text(&self) -> Option<String> {
        self.last_updated
            .map(|t| format!("Last update: {}", t.format("%H:%M:%S")))
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            auto_refresh: self.auto_refresh,
            phase: self.phase(),
            last_updated: self.last_updated_text(),
            history_len: self.history.len(),
            charts: SlotId::ALL
                .iter()
                .filter_map(|&id| {
                    let chart = self.charts.get(id).chart()?;
                    let config = chart.config();
                    Some(ChartView {
                        slot: id,
                        kind: config.kind,
                        labels: config.data.labels.clone(),
                        values: config.data.values().to_vec(),
                        tooltips: config.options.tooltips.clone(),
                    })
                })
                .collect(),
            features: self.panels.features.clone(),
            xai_method: self.panels.xai_method.clone(),
            intel: self.panels.intel.clone(),
            summary: self.summary.clone(),
            notice: self.notice.clone(),
            stats: self.stats,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub slot: SlotId,
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub tooltips: Vec<String>,
}

/// Everything the screen shows, as plain data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub auto_refresh: bool,
    pub phase: Phase,
    pub last_updated: Option<String>,
    pub history_len: usize,
    pub charts: Vec<ChartView>,
    pub features: Vec<FeatureRow>,
    pub xai_method: Option<String>,
    pub intel: IntelPanel,
    pub summary: String,
    pub notice: Option<String>,
    pub stats: TickStats,
}
