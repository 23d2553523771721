// Local playlists + recents, loaded once at startup and never written
//
//   <data_dir>/playlists/<name>.json   JSON array of {song, artist}
//   <data_dir>/recents.json            same shape, most recent first

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub song: String,
    pub artist: String,
}

impl TrackRecord {
    pub fn display(&self) -> String {
        format!("{} - {}", self.song, self.artist)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// File stem of the playlist file
    pub name: String,
    pub tracks: Vec<TrackRecord>,
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Library {
    pub playlists: Vec<Playlist>,
    pub recents: Vec<TrackRecord>,
}

impl Library {
    /// Never fails: anything unreadable is logged and treated as empty.
    pub fn load(playlists_dir: &Path, recents_path: &Path) -> Self {
        let playlists = load_playlists(playlists_dir).unwrap_or_else(|e| {
            warn!("Playlists unavailable: {}", e);
            Vec::new()
        });
        let recents = load_recents(recents_path).unwrap_or_else(|e| {
            warn!("Recents unavailable: {}", e);
            Vec::new()
        });

        info!(
            "Library loaded: {} playlists, {} recent tracks",
            playlists.len(),
            recents.len()
        );
        Self { playlists, recents }
    }
}

/// Every `*.json` file in `dir`, sorted by name. A missing dir is an empty list;
/// a broken file is skipped with a warning.
pub fn load_playlists(dir: &Path) -> Result<Vec<Playlist>, LibraryError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(LibraryError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut playlists = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| LibraryError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };

        match read_records(&path) {
            Ok(tracks) => playlists.push(Playlist { name, tracks }),
            Err(e) => warn!("Skipping playlist: {}", e),
        }
    }

    playlists.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(playlists)
}

pub fn load_recents(path: &Path) -> Result<Vec<TrackRecord>, LibraryError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    read_records(path)
}

fn read_records(path: &Path) -> Result<Vec<TrackRecord>, LibraryError> {
    let content = fs::read_to_string(path).map_err(|source| LibraryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_HOURS: &str = r#"[{"song": "After Hours", "artist": "The Weeknd"},
                                  {"song": "Take On Me", "artist": "a-ha"}]"#;

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let library =
            Library::load(&dir.path().join("playlists"), &dir.path().join("recents.json"));
        assert!(library.playlists.is_empty());
        assert!(library.recents.is_empty());
    }

    #[test]
    fn test_playlists_named_by_file_stem_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("night drive.json"), AFTER_HOURS).unwrap();
        fs::write(dir.path().join("gym.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a playlist").unwrap();

        let playlists = load_playlists(dir.path()).unwrap();
        let names: Vec<&str> = playlists.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["gym", "night drive"]);
        assert_eq!(playlists[1].tracks.len(), 2);
        assert_eq!(playlists[1].tracks[0].display(), "After Hours - The Weeknd");
    }

    #[test]
    fn test_broken_playlist_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.json"), AFTER_HOURS).unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();

        let playlists = load_playlists(dir.path()).unwrap();
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].name, "good");
    }

    #[test]
    fn test_recents_keep_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        fs::write(&path, AFTER_HOURS).unwrap();

        let recents = load_recents(&path).unwrap();
        assert_eq!(recents[0].song, "After Hours");
        assert_eq!(recents[1].artist, "a-ha");
    }

    #[test]
    fn test_malformed_recents_is_an_error_but_load_tolerates_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recents.json");
        fs::write(&path, r#"[{"song": "missing artist"}]"#).unwrap();

        assert!(matches!(load_recents(&path), Err(LibraryError::Parse { .. })));

        let library = Library::load(&dir.path().join("playlists"), &path);
        assert!(library.recents.is_empty());
    }
}
