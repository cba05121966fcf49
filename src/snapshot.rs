//! Wire types for the backend's detection snapshot.
//!
//! Every field is optional on the wire; absent and `null` both decode to
//! empty so renderers never have to special-case missing data.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};

/// Detector keys in display order.
pub const DETECTORS: [&str; 4] = ["ae", "if", "lof", "svm"];

/// Label used for categories that carry no label.
pub const DEFAULT_CATEGORY: &str = "Normal";

fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectorOutput {
    #[serde(default, deserialize_with = "nullable")]
    pub scores: Vec<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub labels: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

impl Category {
    pub fn display_label(&self) -> &str {
        match self.label.as_deref() {
            Some(l) if !l.is_empty() => l,
            _ => DEFAULT_CATEGORY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XaiProxy {
    #[serde(default, deserialize_with = "nullable")]
    pub feature_importances: Vec<f64>,
    /// "shap", "correlation" or "none" when the backend reports it.
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntelRecord {
    #[serde(default)]
    pub ip: String,
    #[serde(default, deserialize_with = "nullable")]
    pub threat_score: f64,
    #[serde(default)]
    pub virustotal_malicious: Option<f64>,
    #[serde(default)]
    pub abuse_confidence: Option<f64>,
}

/// One complete poll result. Not a delta: applying it fully describes the display.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "if", default)]
    pub isolation_forest: Option<DetectorOutput>,
    #[serde(default)]
    pub ae: Option<DetectorOutput>,
    #[serde(default)]
    pub lof: Option<DetectorOutput>,
    #[serde(default)]
    pub svm: Option<DetectorOutput>,
    #[serde(default, deserialize_with = "nullable")]
    pub categories: Vec<Option<Category>>,
    #[serde(default)]
    pub xai_proxy: Option<XaiProxy>,
    #[serde(default, deserialize_with = "nullable")]
    pub features: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub intel: Vec<IntelRecord>,
    /// Set by the backend when prediction failed server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Snapshot {
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    pub fn detector(&self, key: &str) -> Option<&DetectorOutput> {
        match key {
            "if" => self.isolation_forest.as_ref(),
            "ae" => self.ae.as_ref(),
            "lof" => self.lof.as_ref(),
            "svm" => self.svm.as_ref(),
            _ => None,
        }
    }

    /// Isolation-forest scores feeding the rolling line.
    pub fn scores(&self) -> &[f64] {
        self.isolation_forest
            .as_ref()
            .map(|d| d.scores.as_slice())
            .unwrap_or(&[])
    }

    pub fn importances(&self) -> &[f64] {
        self.xai_proxy
            .as_ref()
            .map(|x| x.feature_importances.as_slice())
            .unwrap_or(&[])
    }

    /// Short content hash for log correlation.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let hash = Sha256::digest(&bytes);
        hex::encode(&hash[..8])
    }
}
