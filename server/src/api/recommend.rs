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
use log::{info, warn};
use moodmix_core::{Recommendation, UserProfile};

use super::{auth::Session, ApiError};

/// POST /recommend
///
/// A missing or unparseable body is treated the same as an empty genre list.
/// A failed Spotify search answers with an empty array.
pub async fn recommend(
    Extension(session): Extension<Session>,
    payload: Option<Json<UserProfile>>,
) -> Result<Json<Vec<Recommendation>>, ApiError> {
    let profile = payload.map(|Json(profile)| profile).unwrap_or_else(|| {
        warn!("Recommendation request without a usable JSON body");
        UserProfile::new(Vec::new())
    });
    info!("Recommendation request for genres {:?}", profile.genres);

    let recommendations = session
        .recommender()
        .recommend(&profile)
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(recommendations))
}
