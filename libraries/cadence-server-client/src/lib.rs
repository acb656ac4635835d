//! Cadence Server Client
//!
//! HTTP client for the parts of the Cadence API the player needs.
//!
//! # Features
//!
//! - **Catalog**: fetch songs and playlists, converted to playable
//!   [`cadence_playback::Track`]s
//! - **Stream counting**: `POST /api/songs/{id}/streams`, also available as a
//!   [`cadence_playback::StreamCounter`] for the controller's session tracker
//!
//! # Example
//!
//! ```ignore
//! use cadence_playback::SessionTracker;
//! use cadence_server_client::{CadenceServerClient, ServerConfig};
//! use std::sync::Arc;
//!
//! let client = Arc::new(CadenceServerClient::new(ServerConfig::new(
//!     "https://music.example.com",
//! ))?);
//!
//! let controller = PlaybackController::new(config, backends)
//!     .with_session_tracker(SessionTracker::new(client.clone()));
//!
//! let tracks = client.get_playlist_tracks("favorites").await?;
//! controller.play_queue(tracks, 0);
//! ```

mod catalog;
mod client;
mod error;
mod streams;
mod types;

pub use catalog::CatalogClient;
pub use client::CadenceServerClient;
pub use error::{Result, ServerClientError};
pub use streams::StreamsClient;
pub use types::{ServerConfig, ServerInfo, ServerLyricLine, ServerPlaylist, ServerSong};
