//! Main Cadence server client.

use crate::catalog::CatalogClient;
use crate::error::{Result, ServerClientError};
use crate::streams::StreamsClient;
use crate::types::{ServerConfig, ServerInfo, ServerPlaylist, ServerSong};
use async_trait::async_trait;
use cadence_playback::{BoxError, StreamCounter, Track};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

/// Build `base_url` + percent-encoded path `segments`
pub(crate) fn endpoint(base_url: &str, segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(base_url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| ServerClientError::InvalidUrl(base_url.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Client for a Cadence server.
///
/// Fetches catalog entries as playable [`Track`]s and doubles as the
/// controller's [`StreamCounter`].
///
/// # Example
///
/// ```ignore
/// use cadence_server_client::{CadenceServerClient, ServerConfig};
///
/// let client = CadenceServerClient::new(ServerConfig::new("https://music.example.com"))?;
/// let tracks = client.get_playlist_tracks("road-trip").await?;
/// controller.play_queue(tracks, 0);
/// ```
pub struct CadenceServerClient {
    http: Client,
    config: Arc<RwLock<ServerConfig>>,
}

impl CadenceServerClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ServerConfig) -> Result<Self> {
        if config.url.is_empty() {
            return Err(ServerClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ServerClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }
        Url::parse(&url).map_err(|e| ServerClientError::InvalidUrl(e.to_string()))?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            config: Arc::new(RwLock::new(ServerConfig {
                url,
                access_token: config.access_token,
            })),
        })
    }

    /// Get the server URL.
    pub async fn url(&self) -> String {
        self.config.read().await.url.clone()
    }

    /// Check if the client has an access token.
    pub async fn is_authenticated(&self) -> bool {
        self.config.read().await.access_token.is_some()
    }

    /// Set the bearer token (after the host signed the user in).
    pub async fn set_token(&self, access_token: impl Into<String>) {
        self.config.write().await.access_token = Some(access_token.into());
    }

    /// Forget the bearer token (sign out).
    pub async fn clear_token(&self) {
        self.config.write().await.access_token = None;
        info!("Signed out");
    }

    async fn credentials(&self) -> (String, Option<String>) {
        let config = self.config.read().await;
        (config.url.clone(), config.access_token.clone())
    }

    /// Test the connection to the server.
    pub async fn test_connection(&self) -> Result<ServerInfo> {
        let (base_url, _) = self.credentials().await;
        let url = endpoint(&base_url, &["api", "info"])?;

        debug!(url = %url, "Testing server connection");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ServerClientError::from_send)?;

        if response.status().is_success() {
            let info: ServerInfo = response.json().await.map_err(|e| {
                ServerClientError::ParseError(format!("Failed to parse server info: {}", e))
            })?;

            info!(name = %info.name, version = %info.version, "Connected to server");
            Ok(info)
        } else {
            Err(ServerClientError::from_response(response, "server info").await)
        }
    }

    /// Get a song as returned by the server.
    pub async fn get_song(&self, song_id: &str) -> Result<ServerSong> {
        let (url, token) = self.credentials().await;
        CatalogClient::new(&self.http, &url, token.as_deref())
            .get_song(song_id)
            .await
    }

    /// Get a song ready for the play queue.
    pub async fn get_track(&self, song_id: &str) -> Result<Track> {
        Track::try_from(self.get_song(song_id).await?)
    }

    /// Get a playlist as returned by the server.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<ServerPlaylist> {
        let (url, token) = self.credentials().await;
        CatalogClient::new(&self.http, &url, token.as_deref())
            .get_playlist(playlist_id)
            .await
    }

    /// Get a playlist's playable songs in play order.
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        Ok(self.get_playlist(playlist_id).await?.into_tracks())
    }

    /// Count one stream of `song_id`.
    pub async fn record_stream(&self, song_id: &str) -> Result<()> {
        let (url, token) = self.credentials().await;
        StreamsClient::new(&self.http, &url, token.as_deref())
            .record_stream(song_id)
            .await
    }
}

#[async_trait]
impl StreamCounter for CadenceServerClient {
    async fn record_stream(&self, track_id: &str) -> std::result::Result<(), BoxError> {
        CadenceServerClient::record_stream(self, track_id)
            .await
            .map_err(Into::into)
    }
}
