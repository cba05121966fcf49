//! Playback of generated voice-alert audio.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::logging::{log, obj, v_str, Domain, Level};

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Store and play `bytes`; returns where the artifact was written.
    async fn play(&self, name: &str, bytes: Vec<u8>) -> Result<PathBuf>;
}

/// Saves the artifact to a directory and hands it to an external command.
pub struct CommandPlayer {
    dir: PathBuf,
    command: Option<String>,
}

impl CommandPlayer {
    pub fn new(dir: impl Into<PathBuf>, command: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            command,
        }
    }
}

/// Last path segment with anything outside `[A-Za-z0-9._-]` replaced.
pub fn artifact_file_name(path: &str) -> String {
    let last = path
        .rsplit(|c| c == '/' || c == '\\')
        .find(|s| !s.is_empty())
        .unwrap_or("alert");
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match cleaned.trim_start_matches('.') {
        "" => "alert".to_string(),
        s => s.to_string(),
    }
}

async fn run_player(command: &str, file: &Path) -> Result<()> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("empty audio player command");
    };
    let status = tokio::process::Command::new(program)
        .args(parts)
        .arg(file)
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await
        .with_context(|| format!("spawning {}", program))?;
    if !status.success() {
        bail!("{} exited with {}", program, status);
    }
    Ok(())
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, name: &str, bytes: Vec<u8>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let file = self.dir.join(artifact_file_name(name));
        tokio::fs::write(&file, &bytes)
            .await
            .with_context(|| format!("writing {}", file.display()))?;

        match &self.command {
            Some(cmd) => run_player(cmd, &file).await?,
            None => log(
                Level::Info,
                Domain::Alert,
                "audio_saved",
                obj(&[
                    ("file", v_str(&file.to_string_lossy())),
                    ("msg", v_str("no DASH_AUDIO_PLAYER configured")),
                ]),
            ),
        }
        Ok(file)
    }
}
