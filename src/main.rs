use anyhow::{Context, Result};
use std::sync::Arc;

use threatboard::alert::CommandPlayer;
use threatboard::client::HttpApi;
use threatboard::config::DashConfig;
use threatboard::{live, logging};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = DashConfig::from_env();
    cfg.validate().context("invalid dashboard configuration")?;
    logging::log_startup(&cfg.base_url, cfg.refresh_ms, cfg.summary_ms, cfg.history_cap);

    let api = Arc::new(HttpApi::new(&cfg)?);
    let player = Arc::new(CommandPlayer::new(cfg.audio_dir.clone(), cfg.audio_player.clone()));

    let stats = live::run(cfg, api, player).await?;
    eprintln!(
        "[threatboard] exiting: {} ticks issued, {} applied, {} failed, {} stale",
        stats.issued, stats.applied, stats.failed, stats.stale_dropped
    );
    // the stdin reader thread may still be parked on a read
    std::process::exit(0);
}
