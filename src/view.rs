//! Typed view models derived from a snapshot.
//!
//! Everything here is a pure function of its input; the screen and the chart
//! specs are built from these values rather than from raw JSON.

use serde::Serialize;

use crate::snapshot::{Category, IntelRecord, Snapshot, DETECTORS};

pub const NO_INTEL_PLACEHOLDER: &str = "No suspicious IPs detected";
pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary generated.";
pub const SUMMARY_FAILED_PLACEHOLDER: &str = "Failed to load AI summary.";

// =============================================================================
// Threat distribution
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub count: u64,
    /// Unrounded share of the total, 0..=100.
    pub percent: f64,
}

impl Slice {
    pub fn percent_display(&self) -> String {
        format!("{:.1}", self.percent)
    }

    pub fn tooltip(&self) -> String {
        format!("{}: {}% ({})", self.label, self.percent_display(), self.count)
    }
}

/// Count categories by label in first-seen order.
pub fn threat_distribution(categories: &[Option<Category>]) -> Vec<Slice> {
    let mut counts: Vec<(String, u64)> = Vec::new();
    for cat in categories {
        let label = cat
            .as_ref()
            .map(|c| c.display_label())
            .unwrap_or(crate::snapshot::DEFAULT_CATEGORY);
        match counts.iter_mut().find(|(l, _)| l.as_str() == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label.to_string(), 1)),
        }
    }

    let total: u64 = counts.iter().map(|(_, n)| n).sum();
    counts
        .into_iter()
        .map(|(label, count)| Slice {
            label,
            count,
            percent: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

// =============================================================================
// Model agreement
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgreementRate {
    pub detector: String,
    /// Fraction of samples flagged anomalous, in [0, 1].
    pub rate: f64,
}

/// Per-detector anomaly rate. Detectors without labels are omitted.
pub fn agreement_rates(snapshot: &Snapshot) -> Vec<AgreementRate> {
    DETECTORS
        .iter()
        .filter_map(|key| {
            let labels = &snapshot.detector(key)?.labels;
            if labels.is_empty() {
                return None;
            }
            let flagged = labels.iter().filter(|&&l| l == 1).count();
            Some(AgreementRate {
                detector: key.to_uppercase(),
                rate: flagged as f64 / labels.len() as f64,
            })
        })
        .collect()
}

// =============================================================================
// Feature importance
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub name: String,
    pub importance: f64,
}

impl FeatureRow {
    pub fn display(&self) -> String {
        format!("{}  {:.2}", self.name, self.importance)
    }
}

/// One row per feature name; a missing importance reads as zero.
pub fn feature_rows(snapshot: &Snapshot) -> Vec<FeatureRow> {
    let imps = snapshot.importances();
    snapshot
        .features
        .iter()
        .enumerate()
        .map(|(i, name)| FeatureRow {
            name: name.clone(),
            importance: imps.get(i).copied().unwrap_or(0.0),
        })
        .collect()
}

// =============================================================================
// Threat intel
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score > 70.0 {
            RiskLevel::High
        } else if score > 40.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntelRow {
    pub ip: String,
    pub threat_score: f64,
    pub risk: RiskLevel,
    pub virustotal_malicious: Option<f64>,
    pub abuse_confidence: Option<f64>,
}

impl IntelRow {
    pub fn display(&self) -> String {
        let mut line = format!("{}  {} ({:.1}%)", self.ip, self.risk.label(), self.threat_score);
        if let Some(vt) = self.virustotal_malicious {
            line.push_str(&format!("  vt={}", vt));
        }
        if let Some(abuse) = self.abuse_confidence {
            line.push_str(&format!("  abuse={}", abuse));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "rows", rename_all = "snake_case")]
pub enum IntelPanel {
    Empty,
    Rows(Vec<IntelRow>),
}

impl IntelPanel {
    pub fn from_records(records: &[IntelRecord]) -> Self {
        if records.is_empty() {
            return IntelPanel::Empty;
        }
        IntelPanel::Rows(
            records
                .iter()
                .map(|r| IntelRow {
                    ip: r.ip.clone(),
                    threat_score: r.threat_score,
                    risk: RiskLevel::from_score(r.threat_score),
                    virustotal_malicious: r.virustotal_malicious,
                    abuse_confidence: r.abuse_confidence,
                })
                .collect(),
        )
    }

    pub fn rows(&self) -> &[IntelRow] {
        match self {
            IntelPanel::Empty => &[],
            IntelPanel::Rows(rows) => rows,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        match self {
            IntelPanel::Empty => vec![NO_INTEL_PLACEHOLDER.to_string()],
            IntelPanel::Rows(rows) => rows.iter().map(IntelRow::display).collect(),
        }
    }
}

// =============================================================================
// Snapshot-derived panels
// =============================================================================

/// Text panels rebuilt on every applied snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotPanels {
    pub features: Vec<FeatureRow>,
    pub xai_method: Option<String>,
    pub intel: IntelPanel,
}

impl Default for SnapshotPanels {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            xai_method: None,
            intel: IntelPanel::Empty,
        }
    }
}

impl SnapshotPanels {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            features: feature_rows(snapshot),
            xai_method: snapshot.xai_proxy.as_ref().and_then(|x| x.method.clone()),
            intel: IntelPanel::from_records(&snapshot.intel),
        }
    }
}

/// Summary panel text for a loader result.
pub fn summary_text(result: Result<Option<String>, ()>) -> String {
    match result {
        Ok(Some(s)) if !s.trim().is_empty() => s,
        Ok(_) => NO_SUMMARY_PLACEHOLDER.to_string(),
        Err(()) => SUMMARY_FAILED_PLACEHOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DetectorOutput;

    fn cat(label: &str) -> Option<Category> {
        Some(Category {
            label: Some(label.to_string()),
            score: None,
        })
    }

    #[test]
    fn distribution_counts_and_percentages() {
        let slices = threat_distribution(&[cat("DDoS"), cat("DDoS"), cat("Brute Force")]);
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "DDoS");
        assert_eq!(slices[0].count, 2);
        assert_eq!(slices[0].percent_display(), "66.7");
        assert_eq!(slices[1].label, "Brute Force");
        assert_eq!(slices[1].count, 1);
        assert_eq!(slices[1].percent_display(), "33.3");
        // stored value stays unrounded
        assert!((slices[0].percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(slices[0].tooltip(), "DDoS: 66.7% (2)");
    }

    #[test]
    fn unlabeled_categories_count_as_normal() {
        let slices = threat_distribution(&[None, Some(Category::default()), cat("Normal")]);
        assert_eq!(slices.len(), 1);
        assert_eq!(slices[0].label, "Normal");
        assert_eq!(slices[0].count, 3);
        assert_eq!(slices[0].percent_display(), "100.0");
    }

    #[test]
    fn empty_distribution() {
        assert!(threat_distribution(&[]).is_empty());
    }

    #[test]
    fn agreement_fraction() {
        let snap = Snapshot {
            isolation_forest: Some(DetectorOutput {
                scores: vec![],
                labels: vec![1, 0, 1, 1],
            }),
            svm: Some(DetectorOutput {
                scores: vec![],
                labels: vec![0, 0],
            }),
            lof: Some(DetectorOutput::default()),
            ..Default::default()
        };
        let rates = agreement_rates(&snap);
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[0].detector, "IF");
        assert_eq!(rates[0].rate, 0.75);
        assert_eq!(rates[1].detector, "SVM");
        assert_eq!(rates[1].rate, 0.0);
    }

    #[test]
    fn agreement_keeps_detector_order() {
        let flagged = || {
            Some(DetectorOutput {
                scores: vec![],
                labels: vec![1],
            })
        };
        let snap = Snapshot {
            svm: flagged(),
            ae: flagged(),
            isolation_forest: flagged(),
            ..Default::default()
        };
        let names: Vec<_> = agreement_rates(&snap).into_iter().map(|r| r.detector).collect();
        assert_eq!(names, vec!["AE", "IF", "SVM"]);
    }

    #[test]
    fn risk_levels() {
        assert_eq!(RiskLevel::from_score(85.0).label(), "High");
        assert_eq!(RiskLevel::from_score(55.0).label(), "Medium");
        assert_eq!(RiskLevel::from_score(20.0).label(), "Low");
        assert_eq!(RiskLevel::from_score(70.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40.0), RiskLevel::Low);
    }

    #[test]
    fn empty_intel_renders_placeholder_only() {
        let panel = IntelPanel::from_records(&[]);
        assert!(panel.rows().is_empty());
        assert_eq!(panel.lines(), vec![NO_INTEL_PLACEHOLDER.to_string()]);
    }

    #[test]
    fn intel_row_display() {
        let panel = IntelPanel::from_records(&[IntelRecord {
            ip: "192.168.1.7".to_string(),
            threat_score: 85.0,
            ..Default::default()
        }]);
        assert_eq!(panel.lines(), vec!["192.168.1.7  High (85.0%)".to_string()]);
    }

    #[test]
    fn feature_rows_pad_missing_importances() {
        let snap = Snapshot::from_json(
            r#"{"features": ["length", "src_port", "dst_port"], "xai_proxy": {"feature_importances": [0.456, 0.2]}}"#,
        )
        .unwrap();
        let rows = feature_rows(&snap);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].display(), "length  0.46");
        assert_eq!(rows[2].importance, 0.0);
    }

    #[test]
    fn summary_placeholders() {
        assert_eq!(summary_text(Ok(Some("calm".to_string()))), "calm");
        assert_eq!(summary_text(Ok(None)), NO_SUMMARY_PLACEHOLDER);
        assert_eq!(summary_text(Ok(Some("  ".to_string()))), NO_SUMMARY_PLACEHOLDER);
        assert_eq!(summary_text(Err(())), SUMMARY_FAILED_PLACEHOLDER);
    }
}
