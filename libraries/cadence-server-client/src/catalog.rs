//! Catalog lookups: songs and playlists.

use crate::client::endpoint;
use crate::error::{Result, ServerClientError};
use crate::types::{ServerPlaylist, ServerSong};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// Catalog client for a Cadence server.
pub struct CatalogClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> CatalogClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Get a single song.
    pub async fn get_song(&self, song_id: &str) -> Result<ServerSong> {
        let url = endpoint(self.base_url, &["api", "songs", song_id])?;
        self.fetch(url, &format!("song {song_id}")).await
    }

    /// Get a playlist with its songs.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<ServerPlaylist> {
        let url = endpoint(self.base_url, &["api", "playlists", playlist_id])?;
        let playlist: ServerPlaylist = self.fetch(url, &format!("playlist {playlist_id}")).await?;

        debug!(
            playlist_id = %playlist.id,
            songs = playlist.songs.len(),
            "Fetched playlist"
        );

        Ok(playlist)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        debug!(url = %url, "Fetching {}", what);

        let mut request = self.http.get(url);
        if let Some(token) = self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ServerClientError::from_send)?;

        if response.status().is_success() {
            response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse {what}: {e}"))
            })
        } else {
            Err(ServerClientError::from_response(response, what).await)
        }
    }
}
