//! Series specs for each dashboard chart.

use super::{Animation, ChartConfig, ChartData, ChartKind, ChartOptions, SeriesSpec};
use crate::history::RollingHistory;
use crate::view::{AgreementRate, FeatureRow, Slice};

pub const SCORE_LINE_LABEL: &str = "Anomaly Score (IF)";
pub const THREAT_PIE_TITLE: &str = "Threat Distribution (AI-Detected)";
pub const AGREEMENT_LABEL: &str = "Anomaly Rate";
pub const IMPORTANCE_LABEL: &str = "Feature Importance";

/// Full history for construction; the newest point for in-place updates.
pub fn score_line(history: &RollingHistory, had_new_samples: bool) -> SeriesSpec {
    let labels = history.labels();
    let latest = if had_new_samples {
        match (labels.last(), history.latest()) {
            (Some(label), Some(value)) => Some((label.clone(), value)),
            _ => None,
        }
    } else {
        None
    };

    SeriesSpec {
        config: ChartConfig {
            kind: ChartKind::Line,
            data: ChartData::single(SCORE_LINE_LABEL, labels, history.to_vec()),
            options: ChartOptions {
                begin_at_zero: true,
                animation: Animation::None,
                ..Default::default()
            },
        },
        latest,
    }
}

pub fn threat_pie(slices: &[Slice]) -> SeriesSpec {
    SeriesSpec {
        config: ChartConfig {
            kind: ChartKind::Doughnut,
            data: ChartData::single(
                "",
                slices.iter().map(|s| s.label.clone()).collect(),
                slices.iter().map(|s| s.count as f64).collect(),
            ),
            options: ChartOptions {
                title: Some(THREAT_PIE_TITLE.to_string()),
                animation: Animation::Millis(1200),
                tooltips: slices.iter().map(Slice::tooltip).collect(),
                ..Default::default()
            },
        },
        latest: None,
    }
}

pub fn agreement(rates: &[AgreementRate]) -> SeriesSpec {
    SeriesSpec {
        config: ChartConfig {
            kind: ChartKind::Bar,
            data: ChartData::single(
                AGREEMENT_LABEL,
                rates.iter().map(|r| r.detector.clone()).collect(),
                rates.iter().map(|r| r.rate).collect(),
            ),
            options: ChartOptions {
                y_min: Some(0.0),
                y_max: Some(1.0),
                animation: Animation::Millis(1000),
                ..Default::default()
            },
        },
        latest: None,
    }
}

pub fn importance(rows: &[FeatureRow]) -> SeriesSpec {
    SeriesSpec {
        config: ChartConfig {
            kind: ChartKind::Bar,
            data: ChartData::single(
                IMPORTANCE_LABEL,
                rows.iter().map(|r| r.name.clone()).collect(),
                rows.iter().map(|r| r.importance).collect(),
            ),
            options: ChartOptions {
                begin_at_zero: true,
                animation: Animation::Millis(800),
                ..Default::default()
            },
        },
        latest: None,
    }
}
