//! Stream counting.

use crate::client::endpoint;
use crate::error::{Result, ServerClientError};
use reqwest::Client;
use tracing::debug;

/// Client for the "stream started" endpoint.
pub struct StreamsClient<'a> {
    http: &'a Client,
    base_url: &'a str,
    access_token: Option<&'a str>,
}

impl<'a> StreamsClient<'a> {
    pub(crate) fn new(http: &'a Client, base_url: &'a str, access_token: Option<&'a str>) -> Self {
        Self {
            http,
            base_url,
            access_token,
        }
    }

    /// Count one stream of `song_id`.
    ///
    /// Anonymous listeners are counted too; the token only attributes the
    /// stream to a user.
    pub async fn record_stream(&self, song_id: &str) -> Result<()> {
        let url = endpoint(self.base_url, &["api", "songs", song_id, "streams"])?;
        debug!(url = %url, song_id = %song_id, "Recording stream");

        let mut request = self.http.post(url);
        if let Some(token) = self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(ServerClientError::from_send)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ServerClientError::from_response(response, &format!("song {song_id}")).await)
        }
    }
}
