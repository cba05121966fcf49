use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct DashConfig {
    pub base_url: String,
    pub snapshot_path: String,
    pub summary_path: String,
    pub alert_path: String,
    pub refresh_ms: u64,
    pub summary_ms: u64,
    pub history_cap: usize,
    pub http_timeout_secs: u64,
    pub auto_refresh: bool,
    /// Drop responses older than the last applied tick.
    pub discard_stale: bool,
    pub chart_width: usize,
    pub clear_screen: bool,
    pub audio_dir: PathBuf,
    /// External command used to play voice alerts; saved only when unset.
    pub audio_player: Option<String>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            snapshot_path: "/predict-stream".to_string(),
            summary_path: "/ai-summary".to_string(),
            alert_path: "/alert-voice".to_string(),
            refresh_ms: 3_000,
            summary_ms: 15_000,
            history_cap: 200,
            http_timeout_secs: 10,
            auto_refresh: true,
            discard_stale: true,
            chart_width: 60,
            clear_screen: true,
            audio_dir: std::env::temp_dir(),
            audio_player: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key).as_deref() {
        Ok("1") | Ok("true") | Ok("yes") | Ok("on") => true,
        Ok("0") | Ok("false") | Ok("no") | Ok("off") => false,
        _ => default,
    }
}

impl DashConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            base_url: std::env::var("DASH_BASE_URL").unwrap_or(d.base_url),
            snapshot_path: std::env::var("DASH_SNAPSHOT_PATH").unwrap_or(d.snapshot_path),
            summary_path: std::env::var("DASH_SUMMARY_PATH").unwrap_or(d.summary_path),
            alert_path: std::env::var("DASH_ALERT_PATH").unwrap_or(d.alert_path),
            refresh_ms: env_parse("DASH_REFRESH_MS", d.refresh_ms),
            summary_ms: env_parse("DASH_SUMMARY_MS", d.summary_ms),
            history_cap: env_parse("DASH_HISTORY_CAP", d.history_cap),
            http_timeout_secs: env_parse("DASH_HTTP_TIMEOUT_SECS", d.http_timeout_secs),
            auto_refresh: env_flag("DASH_AUTO_REFRESH", d.auto_refresh),
            discard_stale: env_flag("DASH_DISCARD_STALE", d.discard_stale),
            chart_width: env_parse("DASH_CHART_WIDTH", d.chart_width),
            clear_screen: env_flag("DASH_CLEAR_SCREEN", d.clear_screen),
            audio_dir: std::env::var("DASH_AUDIO_DIR").map(PathBuf::from).unwrap_or(d.audio_dir),
            audio_player: std::env::var("DASH_AUDIO_PLAYER").ok().filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_ms == 0 {
            bail!("DASH_REFRESH_MS must be > 0");
        }
        if self.summary_ms == 0 {
            bail!("DASH_SUMMARY_MS must be > 0");
        }
        if self.history_cap == 0 {
            bail!("DASH_HISTORY_CAP must be > 0");
        }
        self.base().map(|_| ())
    }

    pub fn base(&self) -> Result<Url> {
        let mut base = Url::parse(&self.base_url)
            .with_context(|| format!("invalid DASH_BASE_URL {:?}", self.base_url))?;
        if base.cannot_be_a_base() {
            bail!("DASH_BASE_URL {:?} cannot carry paths", self.base_url);
        }
        // a trailing slash keeps any path prefix when joining
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base)
    }

    /// Resolve an endpoint path beneath the base URL, keeping its prefix.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.base()?;
        base.join(path.trim_start_matches('/'))
            .with_context(|| format!("cannot join {:?} onto {}", path, base))
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn summary_period(&self) -> Duration {
        Duration::from_millis(self.summary_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_cadence() {
        let cfg = DashConfig::default();
        assert_eq!(cfg.refresh_period(), Duration::from_secs(3));
        assert_eq!(cfg.summary_period(), Duration::from_secs(15));
        assert_eq!(cfg.history_cap, 200);
        assert!(cfg.auto_refresh);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn endpoint_joins_paths() {
        let cfg = DashConfig {
            base_url: "http://10.0.0.5:8080".to_string(),
            ..Default::default()
        };
        let url = cfg.endpoint(&cfg.snapshot_path).unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.5:8080/predict-stream");
        let audio = cfg.endpoint("static/alert.mp3").unwrap();
        assert_eq!(audio.as_str(), "http://10.0.0.5:8080/static/alert.mp3");
    }

    #[test]
    fn endpoint_keeps_base_prefix() {
        for base_url in ["http://10.0.0.5:8080/ids", "http://10.0.0.5:8080/ids/"] {
            let cfg = DashConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            };
            assert_eq!(cfg.base().unwrap().as_str(), "http://10.0.0.5:8080/ids/");
            assert_eq!(
                cfg.endpoint(&cfg.snapshot_path).unwrap().as_str(),
                "http://10.0.0.5:8080/ids/predict-stream"
            );
            assert_eq!(
                cfg.endpoint(&cfg.alert_path).unwrap().as_str(),
                "http://10.0.0.5:8080/ids/alert-voice"
            );
            assert_eq!(
                cfg.endpoint("/static/a.mp3").unwrap().as_str(),
                "http://10.0.0.5:8080/ids/static/a.mp3"
            );
        }
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero = DashConfig {
            refresh_ms: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let no_cap = DashConfig {
            history_cap: 0,
            ..Default::default()
        };
        assert!(no_cap.validate().is_err());

        let bad_url = DashConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());
    }
}
