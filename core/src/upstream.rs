/*
    moodmix | Spotify-backed music recommendation proxy for the browser.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

//! Upstream Spotify access.
//!
//! Everything the rest of the crate needs from the Web API goes through the
//! [`MusicApi`] trait. [`SpotifyApi`] is the real implementation on top of
//! `rspotify`; request handlers get one per bearer token from a
//! [`ClientFactory`].

use crate::models::{Album, Track};
use async_trait::async_trait;
use log::debug;
use rspotify::{
    http::HttpError,
    model::{FullTrack, PlayableId, SearchResult, SearchType, TimeRange, TrackId},
    prelude::*,
    AuthCodeSpotify, ClientError, ClientResult, Config, Credentials, OAuth, Token,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Ceiling applied to every upstream call unless configured otherwise.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Spotify API error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("Spotify request failed: {0}")]
    Transport(String),
    #[error("Spotify did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Invalid Spotify track reference: {0}")]
    InvalidId(String),
}

impl UpstreamError {
    /// HTTP status reported by Spotify, if it got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            UpstreamError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text suitable for the end user: Spotify's own message when it sent one.
    pub fn message(&self) -> String {
        match self {
            UpstreamError::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Converts an rspotify error, reading the Spotify error body when there is one.
    pub async fn from_client_error(err: ClientError) -> Self {
        match err {
            ClientError::Http(http) => match *http {
                HttpError::StatusCode(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    let message = spotify_error_message(&body)
                        .unwrap_or_else(|| format!("Spotify returned HTTP {}", status));
                    UpstreamError::Status { status, message }
                }
                other => UpstreamError::Transport(other.to_string()),
            },
            other => UpstreamError::Transport(other.to_string()),
        }
    }
}

/// Pulls `error.message` out of a Spotify error payload.
fn spotify_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    match error {
        serde_json::Value::String(s) => Some(s.clone()),
        _ => error.get("message")?.as_str().map(str::to_string),
    }
}

/// The slice of the Spotify Web API this service relies on.
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Catalog track search.
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, UpstreamError>;

    /// Names of the listener's short-term top artists.
    async fn top_artist_names(&self, limit: u32) -> Result<Vec<String>, UpstreamError>;

    /// Adds a track (bare ID or `spotify:track:` URI) to Liked Songs.
    async fn save_track(&self, track_id: &str) -> Result<(), UpstreamError>;

    /// Starts playing a track on the listener's active device.
    async fn start_playback(&self, track_uri: &str) -> Result<(), UpstreamError>;

    /// Display name of the authenticated user, when they set one.
    async fn current_user_name(&self) -> Result<Option<String>, UpstreamError>;
}

/// Builds a request-scoped [`MusicApi`] from a bearer access token.
pub trait ClientFactory: Send + Sync {
    fn for_token(&self, access_token: &str) -> Arc<dyn MusicApi>;
}

/// Produces [`SpotifyApi`] clients that share one timeout setting.
#[derive(Debug, Clone)]
pub struct SpotifyClientFactory {
    timeout: Duration,
}

impl SpotifyClientFactory {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SpotifyClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_UPSTREAM_TIMEOUT)
    }
}

impl ClientFactory for SpotifyClientFactory {
    fn for_token(&self, access_token: &str) -> Arc<dyn MusicApi> {
        Arc::new(SpotifyApi::from_access_token(access_token, self.timeout))
    }
}

pub struct SpotifyApi {
    spotify: AuthCodeSpotify,
    timeout: Duration,
}

impl SpotifyApi {
    /// Builds a client around an access token the browser sent as a bearer credential.
    ///
    /// This function:
    /// 1. Wraps the raw token in an rspotify `Token` (no refresh token, no scopes;
    ///    Spotify itself decides what the token may do).
    /// 2. Disables token caching and refreshing, since the token belongs to the
    ///    caller and lives only as long as this request.
    /// 3. Remembers `timeout`, which bounds every call made through this client.
    ///
    /// No network traffic happens here; a bad token only shows up as a 401 from
    /// the first API call.
    pub fn from_access_token(access_token: &str, timeout: Duration) -> Self {
        let token = Token {
            access_token: access_token.to_string(),
            ..Default::default()
        };

        let config = Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        };

        // Credentials and OAuth settings are only needed to obtain or refresh
        // tokens, which this client never does, so the defaults are enough.
        let spotify = AuthCodeSpotify::from_token_with_config(
            token,
            Credentials::default(),
            OAuth::default(),
            config,
        );

        Self { spotify, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, UpstreamError>
    where
        F: Future<Output = ClientResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(UpstreamError::from_client_error(e).await),
            Err(_) => Err(UpstreamError::Timeout(self.timeout)),
        }
    }
}

fn parse_track_id(reference: &str) -> Result<TrackId<'_>, UpstreamError> {
    TrackId::from_id_or_uri(reference).map_err(|_| UpstreamError::InvalidId(reference.to_string()))
}

/// Local files have no catalog ID and cannot be liked or played remotely.
fn track_from_full(track: FullTrack) -> Option<Track> {
    let id = track.id?;

    Some(Track {
        id: id.id().to_string(),
        uri: id.uri(),
        title: track.name,
        artists: track.artists.into_iter().map(|a| a.name).collect(),
        album: Some(Album {
            cover_url: track.album.images.first().map(|img| img.url.clone()),
            name: track.album.name,
        }),
        popularity: track.popularity,
    })
}

#[async_trait]
impl MusicApi for SpotifyApi {
    async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<Track>, UpstreamError> {
        let result = self
            .bounded(
                self.spotify
                    .search(query, SearchType::Track, None, None, Some(limit), None),
            )
            .await?;

        let page = match result {
            SearchResult::Tracks(page) => page,
            _ => {
                return Err(UpstreamError::Transport(
                    "Unexpected search result type does not contain tracks".to_string(),
                ))
            }
        };

        let found = page.items.len();
        let tracks: Vec<Track> = page.items.into_iter().filter_map(track_from_full).collect();
        if tracks.len() != found {
            debug!("Skipped {} search results without a catalog ID", found - tracks.len());
        }

        Ok(tracks)
    }

    async fn top_artist_names(&self, limit: u32) -> Result<Vec<String>, UpstreamError> {
        let page = self
            .bounded(self.spotify.current_user_top_artists_manual(
                Some(TimeRange::ShortTerm),
                Some(limit),
                None,
            ))
            .await?;

        Ok(page.items.into_iter().map(|artist| artist.name).collect())
    }

    async fn save_track(&self, track_id: &str) -> Result<(), UpstreamError> {
        let id = parse_track_id(track_id)?;
        self.bounded(self.spotify.current_user_saved_tracks_add([id]))
            .await
    }

    async fn start_playback(&self, track_uri: &str) -> Result<(), UpstreamError> {
        let id = parse_track_id(track_uri)?;
        self.bounded(self.spotify.start_uris_playback(
            [PlayableId::Track(id)],
            None,
            None,
            None,
        ))
        .await
    }

    async fn current_user_name(&self) -> Result<Option<String>, UpstreamError> {
        let user = self.bounded(self.spotify.current_user()).await?;
        Ok(user.display_name)
    }
}
