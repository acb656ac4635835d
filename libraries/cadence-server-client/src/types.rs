//! Types for Cadence API requests and responses.

use crate::error::ServerClientError;
use cadence_playback::{seconds_to_duration, AudioSource, LyricLine, Track};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Configuration for connecting to a Cadence server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base URL of the server (e.g., "https://music.example.com")
    pub url: String,
    /// Bearer token sent with every request (if signed in)
    pub access_token: Option<String>,
}

impl ServerConfig {
    /// Create a new server config with just the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: None,
        }
    }

    /// Create a config for a signed-in user.
    pub fn with_token(url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            access_token: Some(access_token.into()),
        }
    }
}

// =============================================================================
// Server Info Types
// =============================================================================

/// Information about the Cadence server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// =============================================================================
// Catalog Types
// =============================================================================

/// A song as returned by the server.
///
/// Songs are either uploaded audio files (`audio_url`) or references to a
/// video on the external platform (`video_id`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSong {
    pub id: String,
    pub title: String,
    pub artist_name: Option<String>,
    pub artwork_url: Option<String>,
    pub duration_seconds: Option<f64>,
    pub audio_url: Option<String>,
    pub video_id: Option<String>,
    #[serde(default)]
    pub lyrics: Vec<ServerLyricLine>,
}

/// One time-coded lyric line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerLyricLine {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// A playlist with its songs in play order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerPlaylist {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub songs: Vec<ServerSong>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ServerSong {
    /// Playable source, preferring the uploaded file over the video
    pub fn audio_source(&self) -> Option<AudioSource> {
        non_empty(self.audio_url.clone())
            .map(AudioSource::Direct)
            .or_else(|| non_empty(self.video_id.clone()).map(AudioSource::Embedded))
    }
}

impl TryFrom<ServerSong> for Track {
    type Error = ServerClientError;

    fn try_from(song: ServerSong) -> Result<Self, Self::Error> {
        let Some(source) = song.audio_source() else {
            return Err(ServerClientError::NoPlayableSource(song.id));
        };

        let duration = song
            .duration_seconds
            .and_then(seconds_to_duration)
            .unwrap_or(Duration::ZERO);

        let mut track = Track::new(
            song.id,
            song.title,
            song.artist_name.unwrap_or_else(|| "Unknown Artist".to_string()),
            duration,
            source,
        );
        track.artwork_url = non_empty(song.artwork_url);

        let mut lyrics: Vec<LyricLine> = song
            .lyrics
            .into_iter()
            .filter_map(|line| {
                Some(LyricLine {
                    start: seconds_to_duration(line.start_seconds)?,
                    end: seconds_to_duration(line.end_seconds)?,
                    text: line.text,
                })
            })
            .collect();
        lyrics.sort_by_key(|line| line.start);
        track.lyrics = lyrics;

        Ok(track)
    }
}

impl ServerPlaylist {
    /// Tracks in play order, skipping songs that cannot be played
    pub fn into_tracks(self) -> Vec<Track> {
        let playlist_id = self.id;
        self.songs
            .into_iter()
            .filter_map(|song| match Track::try_from(song) {
                Ok(track) => Some(track),
                Err(e) => {
                    warn!(playlist_id = %playlist_id, error = %e, "Skipping song");
                    None
                }
            })
            .collect()
    }
}
