// Song recognition: grab a few seconds with yt-dlp, fingerprint them with songrec.
// The snippet lives in a scratch TempDir, so it is gone on every exit path.

use super::resolver::search_target;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

pub const SNIPPET_SECONDS: u32 = 5;
const SNIPPET_STEM: &str = "snippet";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizedSong {
    pub title: String,
    pub artist: String,
}

impl fmt::Display for RecognizedSong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.title, self.artist)
    }
}

#[derive(Debug, Error)]
pub enum RecognizeError {
    #[error("could not create snippet scratch space: {0}")]
    Scratch(#[source] std::io::Error),
    #[error("could not run {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{binary} exited with {status}: {stderr}")]
    Failed {
        binary: String,
        status: String,
        stderr: String,
    },
    #[error("{0} took too long")]
    Timeout(String),
    #[error("yt-dlp finished but no snippet was written")]
    SnippetMissing,
    #[error("unexpected songrec output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// `Ok(None)` means the service listened and didn't know the song.
#[allow(async_fn_in_trait)]
pub trait Identify {
    async fn identify(&self, query: &str) -> Result<Option<RecognizedSong>, RecognizeError>;
}

/// Short audio file that removes itself (and its directory) when dropped.
pub struct Snippet {
    dir: TempDir,
}

impl Snippet {
    pub fn create_in(scratch: &Path) -> Result<Self, RecognizeError> {
        let dir = tempfile::Builder::new()
            .prefix("ethos-snippet-")
            .tempdir_in(scratch)
            .map_err(RecognizeError::Scratch)?;
        Ok(Self { dir })
    }

    /// yt-dlp output template; `%(ext)s` becomes mp3 after extraction.
    fn output_template(&self) -> PathBuf {
        self.dir.path().join(format!("{}.%(ext)s", SNIPPET_STEM))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join(format!("{}.mp3", SNIPPET_STEM))
    }
}

#[derive(Debug, Clone)]
pub struct SongRecognizer {
    yt_dlp: PathBuf,
    songrec: PathBuf,
    scratch: PathBuf,
    timeout: Duration,
}

impl SongRecognizer {
    pub fn new(yt_dlp: impl Into<PathBuf>, songrec: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            yt_dlp: yt_dlp.into(),
            songrec: songrec.into(),
            scratch: std::env::temp_dir(),
            timeout,
        }
    }

    pub fn with_scratch_dir(mut self, scratch: impl Into<PathBuf>) -> Self {
        self.scratch = scratch.into();
        self
    }

    async fn download_snippet(&self, snippet: &Snippet, query: &str) -> Result<(), RecognizeError> {
        let mut cmd = Command::new(&self.yt_dlp);
        cmd.arg("--format")
            .arg("bestaudio/best")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--download-sections")
            .arg(format!("*0-{}", SNIPPET_SECONDS))
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg("mp3")
            .arg("--audio-quality")
            .arg("192K")
            .arg("-o")
            .arg(snippet.output_template())
            .arg(search_target(query));

        run(cmd, &self.yt_dlp, self.timeout).await?;

        if !snippet.path().exists() {
            return Err(RecognizeError::SnippetMissing);
        }
        Ok(())
    }

    async fn recognize_file(&self, path: &Path) -> Result<Option<RecognizedSong>, RecognizeError> {
        let mut cmd = Command::new(&self.songrec);
        cmd.arg("audio-file-to-recognized-song").arg(path);

        let output = run(cmd, &self.songrec, self.timeout).await?;
        parse_recognition(&String::from_utf8_lossy(&output.stdout))
    }
}

impl Identify for SongRecognizer {
    async fn identify(&self, query: &str) -> Result<Option<RecognizedSong>, RecognizeError> {
        let snippet = Snippet::create_in(&self.scratch)?;
        debug!("Downloading {}s snippet for '{}'", SNIPPET_SECONDS, query);

        self.download_snippet(&snippet, query).await?;
        let song = self.recognize_file(&snippet.path()).await?;

        info!(
            "Recognition for '{}': {}",
            query,
            song.as_ref().map(ToString::to_string).unwrap_or_else(|| "no match".into())
        );
        Ok(song)
    }
}

async fn run(mut cmd: Command, binary: &Path, timeout: Duration) -> Result<Output, RecognizeError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let name = binary.display().to_string();
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| RecognizeError::Timeout(name.clone()))?
        .map_err(|source| RecognizeError::Spawn {
            binary: name.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(RecognizeError::Failed {
            binary: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(output)
}

#[derive(Debug, Deserialize)]
struct ShazamResponse {
    #[serde(default)]
    matches: Vec<serde_json::Value>,
    track: Option<ShazamTrack>,
}

#[derive(Debug, Deserialize)]
struct ShazamTrack {
    title: String,
    subtitle: String,
}

fn parse_recognition(stdout: &str) -> Result<Option<RecognizedSong>, RecognizeError> {
    let response: ShazamResponse = serde_json::from_str(stdout.trim())?;
    if response.matches.is_empty() {
        return Ok(None);
    }
    Ok(response.track.map(|t| RecognizedSong {
        title: t.title,
        artist: t.subtitle,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_match() {
        let out = r#"{"matches":[{"id":"533592845","offset":12.3}],
            "track":{"key":"533592845","title":"After Hours","subtitle":"The Weeknd"}}"#;
        let song = parse_recognition(out).unwrap().unwrap();
        assert_eq!(song.to_string(), "After Hours - The Weeknd");
    }

    #[test]
    fn test_parse_no_match() {
        let out = r#"{"matches":[],"tagid":"ABC"}"#;
        assert_eq!(parse_recognition(out).unwrap(), None);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_recognition("Error: no audio"),
            Err(RecognizeError::Decode(_))
        ));
    }

    #[test]
    fn test_snippet_removed_on_drop() {
        let scratch = tempfile::tempdir().unwrap();
        let snippet = Snippet::create_in(scratch.path()).unwrap();
        fs::write(snippet.path(), b"ID3").unwrap();
        let dir = snippet.path().parent().unwrap().to_path_buf();
        assert!(dir.exists());

        drop(snippet);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_snippet_removed_when_download_fails() {
        let scratch = tempfile::tempdir().unwrap();
        let recognizer = SongRecognizer::new(
            "/nonexistent/ethos-yt-dlp",
            "/nonexistent/ethos-songrec",
            Duration::from_secs(5),
        )
        .with_scratch_dir(scratch.path());

        let err = recognizer.identify("after hours").await.unwrap_err();
        assert!(matches!(err, RecognizeError::Spawn { .. }), "got {err:?}");
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
