//! Chart slots and the create-vs-mutate synchronization rule.
//!
//! A slot owns at most one chart instance produced by a [`ChartBackend`].
//! Time-series slots mutate their instance in place, one point per tick;
//! categorical slots rebuild from scratch because their label set can change
//! shape between snapshots.

use serde::Serialize;

pub mod specs;
pub mod text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotId {
    ScoreLine,
    ThreatPie,
    Agreement,
    Importance,
}

impl SlotId {
    pub const ALL: [SlotId; 4] = [
        SlotId::ScoreLine,
        SlotId::ThreatPie,
        SlotId::Agreement,
        SlotId::Importance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SlotId::ScoreLine => "score_line",
            SlotId::ThreatPie => "threat_pie",
            SlotId::Agreement => "agreement",
            SlotId::Importance => "importance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Doughnut,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Axis labels plus datasets; every dataset stays parallel to `labels`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn single(dataset_label: &str, labels: Vec<String>, data: Vec<f64>) -> Self {
        debug_assert_eq!(labels.len(), data.len());
        Self {
            labels,
            datasets: vec![Dataset {
                label: dataset_label.to_string(),
                data,
            }],
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn is_parallel(&self) -> bool {
        self.datasets.iter().all(|d| d.data.len() == self.labels.len())
    }

    /// First dataset's values, or empty.
    pub fn values(&self) -> &[f64] {
        self.datasets.first().map(|d| d.data.as_slice()).unwrap_or(&[])
    }

    pub fn push_point(&mut self, label: String, value: f64) {
        self.labels.push(label);
        for ds in &mut self.datasets {
            ds.data.push(value);
        }
    }

    pub fn shift(&mut self) {
        if self.labels.is_empty() {
            return;
        }
        self.labels.remove(0);
        for ds in &mut self.datasets {
            if !ds.data.is_empty() {
                ds.data.remove(0);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    None,
    Millis(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartOptions {
    pub title: Option<String>,
    pub y_min: Option<f64>,
    pub y_max: Option<f64>,
    pub begin_at_zero: bool,
    pub animation: Animation,
    /// Per-point tooltip text, parallel to the labels when present.
    pub tooltips: Vec<String>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            title: None,
            y_min: None,
            y_max: None,
            begin_at_zero: false,
            animation: Animation::None,
            tooltips: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartConfig {
    pub kind: ChartKind,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Redraw using the chart's configured animation.
    Default,
    /// Redraw immediately with no animation.
    Silent,
}

/// A live chart owned by one slot.
pub trait ChartInstance {
    fn config(&self) -> &ChartConfig;
    fn data_mut(&mut self) -> &mut ChartData;
    fn update(&mut self, mode: UpdateMode);
    fn destroy(self);
}

/// Constructs chart instances; the rendering library seam.
pub trait ChartBackend {
    type Chart: ChartInstance;

    fn create(&mut self, slot: SlotId, config: ChartConfig) -> Self::Chart;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Push the newest point, shift past `bound`, redraw silently.
    Incremental { bound: usize },
    /// Destroy and rebuild from the full dataset.
    FullReplace,
}

/// Desired chart contents for one tick.
#[derive(Debug, Clone)]
pub struct SeriesSpec {
    pub config: ChartConfig,
    /// Newest point for incremental slots; `None` when the tick carried no sample.
    pub latest: Option<(String, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Appended { shifted: bool },
    Replaced,
    Unchanged,
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Appended { shifted: false } => "appended",
            SyncOutcome::Appended { shifted: true } => "appended_shifted",
            SyncOutcome::Replaced => "replaced",
            SyncOutcome::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug)]
pub struct ChartSlot<C> {
    id: SlotId,
    strategy: SyncStrategy,
    chart: Option<C>,
    generation: u64,
}

impl<C: ChartInstance> ChartSlot<C> {
    pub fn new(id: SlotId, strategy: SyncStrategy) -> Self {
        Self {
            id,
            strategy,
            chart: None,
            generation: 0,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    pub fn chart(&self) -> Option<&C> {
        self.chart.as_ref()
    }

    pub fn data(&self) -> Option<&ChartData> {
        self.chart.as_ref().map(|c| &c.config().data)
    }

    /// Number of instances constructed for this slot so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn sync<B>(&mut self, backend: &mut B, spec: SeriesSpec) -> SyncOutcome
    where
        B: ChartBackend<Chart = C>,
    {
        let outcome = match (self.chart.as_mut(), self.strategy) {
            (None, _) => SyncOutcome::Created,
            (Some(chart), SyncStrategy::Incremental { bound }) => {
                return Self::append(chart, spec.latest, bound);
            }
            (Some(_), SyncStrategy::FullReplace) => SyncOutcome::Replaced,
        };

        if let Some(old) = self.chart.take() {
            old.destroy();
        }
        self.chart = Some(backend.create(self.id, spec.config));
        self.generation += 1;
        outcome
    }

    fn append(chart: &mut C, latest: Option<(String, f64)>, bound: usize) -> SyncOutcome {
        let Some((label, value)) = latest else {
            return SyncOutcome::Unchanged;
        };
        let data = chart.data_mut();
        data.push_point(label, value);
        let mut shifted = false;
        while data.len() > bound {
            data.shift();
            shifted = true;
        }
        chart.update(UpdateMode::Silent);
        SyncOutcome::Appended { shifted }
    }

    pub fn clear(&mut self) {
        if let Some(old) = self.chart.take() {
            old.destroy();
        }
    }
}

/// One slot per chart on the dashboard.
#[derive(Debug)]
pub struct ChartSlots<C> {
    pub score_line: ChartSlot<C>,
    pub threat_pie: ChartSlot<C>,
    pub agreement: ChartSlot<C>,
    pub importance: ChartSlot<C>,
}

impl<C: ChartInstance> ChartSlots<C> {
    pub fn new(history_bound: usize) -> Self {
        Self {
            score_line: ChartSlot::new(
                SlotId::ScoreLine,
                SyncStrategy::Incremental {
                    bound: history_bound,
                },
            ),
            threat_pie: ChartSlot::new(SlotId::ThreatPie, SyncStrategy::FullReplace),
            agreement: ChartSlot::new(SlotId::Agreement, SyncStrategy::FullReplace),
            importance: ChartSlot::new(SlotId::Importance, SyncStrategy::FullReplace),
        }
    }

    pub fn get(&self, id: SlotId) -> &ChartSlot<C> {
        match id {
            SlotId::ScoreLine => &self.score_line,
            SlotId::ThreatPie => &self.threat_pie,
            SlotId::Agreement => &self.agreement,
            SlotId::Importance => &self.importance,
        }
    }

    pub fn get_mut(&mut self, id: SlotId) -> &mut ChartSlot<C> {
        match id {
            SlotId::ScoreLine => &mut self.score_line,
            SlotId::ThreatPie => &mut self.threat_pie,
            SlotId::Agreement => &mut self.agreement,
            SlotId::Importance => &mut self.importance,
        }
    }
}
