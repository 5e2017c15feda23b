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

use crate::models::{Recommendation, UserProfile};
use crate::query::{build_query, MAX_ARTIST_TERMS};
use crate::recommend::build_recommendations;
use crate::upstream::{MusicApi, UpstreamError};
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;

/// How many catalog results are fetched before scoring.
pub const SEARCH_LIMIT: u32 = 50;

pub const NO_ACTIVE_DEVICE_MESSAGE: &str =
    "No active device found. Open Spotify on your phone, web player or desktop app.";
pub const PREMIUM_REQUIRED_MESSAGE: &str = "Playback requires a Spotify Premium account.";

#[derive(Error, Debug)]
pub enum RecommendError {
    #[error("Select at least one genre")]
    NoGenres,
}

/// Runs the listener's actions against one request-scoped Spotify client.
pub struct Recommender {
    api: Arc<dyn MusicApi>,
}

impl Recommender {
    pub fn new(api: Arc<dyn MusicApi>) -> Self {
        Self { api }
    }

    /// Builds up to 20 shuffled recommendations for `profile`.
    ///
    /// A failed top-artist lookup only narrows the query to genres. A failed
    /// search yields an empty list instead of an error.
    pub async fn recommend(
        &self,
        profile: &UserProfile,
    ) -> Result<Vec<Recommendation>, RecommendError> {
        if !profile.has_genres() {
            return Err(RecommendError::NoGenres);
        }

        let query = self.query_for(profile).await;
        info!(
            "Search query built: {} (mood: {:?}, energy: {})",
            query, profile.mood, profile.energy
        );

        let tracks = match self.api.search_tracks(&query, SEARCH_LIMIT).await {
            Ok(tracks) => tracks,
            Err(e) => {
                error!("Track search failed: {}", e);
                return Ok(Vec::new());
            }
        };
        info!("Search returned {} tracks", tracks.len());

        let recommendations = build_recommendations(profile, tracks);
        for rec in &recommendations {
            debug!("  {}", rec);
        }
        info!("Returning {} recommendations", recommendations.len());

        Ok(recommendations)
    }

    /// The search query for `profile`, including top artists when they can be fetched.
    pub async fn query_for(&self, profile: &UserProfile) -> String {
        let artists = self.top_artists().await;
        build_query(&profile.genres, &artists)
    }

    async fn top_artists(&self) -> Vec<String> {
        match self.api.top_artist_names(MAX_ARTIST_TERMS as u32).await {
            Ok(names) => names,
            Err(e) => {
                warn!("Could not fetch top artists, continuing with genres only: {}", e);
                Vec::new()
            }
        }
    }

    /// Saves a track to the listener's Liked Songs.
    pub async fn like(&self, track_id: &str) -> Result<(), UpstreamError> {
        self.api.save_track(track_id).await.map_err(|e| {
            error!("Saving track {} failed: {}", track_id, e);
            e
        })
    }

    /// Starts playback of a track on the listener's active device.
    pub async fn play(&self, track_uri: &str) -> Result<(), UpstreamError> {
        self.api.start_playback(track_uri).await.map_err(|e| {
            error!("Starting playback of {} failed: {}", track_uri, e);
            e
        })
    }

    pub async fn current_user_name(&self) -> Result<Option<String>, UpstreamError> {
        self.api.current_user_name().await
    }
}

/// User-facing text for a failed playback request.
pub fn playback_error_message(err: &UpstreamError) -> String {
    match err.status() {
        Some(404) => NO_ACTIVE_DEVICE_MESSAGE.to_string(),
        Some(403) => PREMIUM_REQUIRED_MESSAGE.to_string(),
        _ => err.message(),
    }
}
