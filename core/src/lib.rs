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

pub mod auth;
pub mod models;
pub mod query;
pub mod recommend;
pub mod recommender;
pub mod upstream;

// Re-export key items for convenience
pub use auth::{AuthError, OAuthManager};
pub use models::{Recommendation, Track, UserProfile};
pub use query::build_query;
pub use recommend::build_recommendations;
pub use recommender::{playback_error_message, RecommendError, Recommender};
pub use upstream::{ClientFactory, MusicApi, SpotifyClientFactory, UpstreamError};
