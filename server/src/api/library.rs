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

use axum::{Extension, Json};
use log::warn;
use moodmix_core::playback_error_message;
use serde::{Deserialize, Serialize};

use super::{auth::Session, ApiError};

pub const TRACK_SAVED_MESSAGE: &str = "Track saved to your Liked Songs";
pub const PLAYING_MESSAGE: &str = "Playing track";
/// Shown when Spotify has no display name for the account.
pub const DEFAULT_USER_NAME: &str = "User";

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionResponse {
    pub status: String,
    pub message: String,
}

impl ActionResponse {
    fn success(message: &str) -> Json<Self> {
        Json(Self {
            status: "success".to_string(),
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LikeRequest {
    pub track_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayRequest {
    pub track_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub name: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))
}

/// GET /me
///
/// Any failure here means the session is no longer usable, so it is always 401.
pub async fn current_user(
    Extension(session): Extension<Session>,
) -> Result<Json<MeResponse>, ApiError> {
    let name = session
        .recommender()
        .current_user_name()
        .await
        .map_err(|e| {
            warn!("Could not load current user: {}", e);
            ApiError::Unauthorized(e.to_string())
        })?;

    Ok(Json(MeResponse {
        name: name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
    }))
}

/// POST /like
pub async fn like(
    Extension(session): Extension<Session>,
    payload: Option<Json<LikeRequest>>,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let track_id = required(request.track_id, "track_id")?;

    session.recommender().like(&track_id).await?;
    Ok(ActionResponse::success(TRACK_SAVED_MESSAGE))
}

/// POST /play
///
/// 404 and 403 from Spotify get dedicated messages (no active device,
/// Premium required); other failures pass Spotify's message through.
pub async fn play(
    Extension(session): Extension<Session>,
    payload: Option<Json<PlayRequest>>,
) -> Result<Json<ActionResponse>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let track_uri = required(request.track_uri, "track_uri")?;

    session
        .recommender()
        .play(&track_uri)
        .await
        .map_err(|e| ApiError::from_upstream(&e, playback_error_message(&e)))?;

    Ok(ActionResponse::success(PLAYING_MESSAGE))
}
