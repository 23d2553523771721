// yt-dlp lookup: best audio-only stream URL for a track description, no download
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// m4a first so rodio's AAC decoder can take it; anything audio after that.
pub const AUDIO_FORMAT: &str = "bestaudio[ext=m4a]/bestaudio/best";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no results found for '{0}'")]
    NoResultsFound(String),
    #[error("could not run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("yt-dlp exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("yt-dlp took longer than {0:?}")]
    Timeout(Duration),
}

#[allow(async_fn_in_trait)]
pub trait AudioResolve {
    async fn resolve(&self, description: &str) -> Result<String, ResolveError>;
}

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: PathBuf,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn command(&self, description: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--format")
            .arg(AUDIO_FORMAT)
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--get-url")
            .arg(search_target(description))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl AudioResolve for YtDlpResolver {
    async fn resolve(&self, description: &str) -> Result<String, ResolveError> {
        debug!("Resolving audio for '{}'", description);

        let output = tokio::time::timeout(self.timeout, self.command(description).output())
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))?
            .map_err(|source| ResolveError::Spawn {
                binary: self.binary.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ResolveError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let url = first_url(&stdout)
            .ok_or_else(|| ResolveError::NoResultsFound(description.to_string()))?;
        info!("Resolved '{}' to an audio stream", description);
        Ok(url)
    }
}

/// Top hit only.
pub fn search_target(description: &str) -> String {
    format!("ytsearch1:{}", description)
}

fn first_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url_skips_blank_lines() {
        let out = "\n  https://rr3.googlevideo.com/videoplayback?id=1  \nhttps://second\n";
        assert_eq!(
            first_url(out).as_deref(),
            Some("https://rr3.googlevideo.com/videoplayback?id=1")
        );
        assert_eq!(first_url(""), None);
        assert_eq!(first_url("\n   \n"), None);
    }

    #[test]
    fn test_search_target() {
        assert_eq!(
            search_target("After Hours by The Weeknd"),
            "ytsearch1:After Hours by The Weeknd"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let resolver = YtDlpResolver::new("/nonexistent/ethos-yt-dlp", Duration::from_secs(5));
        let err = resolver.resolve("after hours").await.unwrap_err();
        assert!(matches!(err, ResolveError::Spawn { .. }), "got {err:?}");
    }
}
