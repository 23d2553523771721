// ethos - terminal music player
// Search the catalog, pick a number, stream the audio

pub mod audio; // yt-dlp lookup, playback session, rodio engine, recognition
pub mod command; // parses what gets typed into the input line
pub mod config; // settings and credentials
pub mod input_loop; // glues parser, adapters and session together
pub mod library; // local playlists and recents
pub mod spotify; // track search
pub mod ui; // terminal interface

#[cfg(test)]
mod testing;

pub use audio::{AudioPlayer, PlaybackSession, PlaybackState};
pub use command::Command;
pub use config::Config;
pub use input_loop::InputLoop;
pub use library::Library;
pub use spotify::{SpotifyClient, TrackCandidate};
