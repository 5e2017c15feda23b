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

//! HTTP surface of moodmix: OAuth redirects plus the bearer-protected
//! recommend, like, play and profile endpoints the browser client calls.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use log::warn;
use moodmix_core::{ClientFactory, OAuthManager};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub mod api;
pub mod config;
pub mod keep_alive;

pub use config::ServerConfig;

/// Read-only state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub oauth: Arc<OAuthManager>,
    pub clients: Arc<dyn ClientFactory>,
    /// Where the browser app lives; OAuth callbacks redirect back here.
    pub frontend_url: String,
}

impl AppState {
    pub fn new(oauth: OAuthManager, clients: Arc<dyn ClientFactory>, frontend_url: &str) -> Self {
        Self {
            oauth: Arc::new(oauth),
            clients,
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Builds the application router.
///
/// `/login`, `/callback` and `/health` are public. Everything else goes through
/// [`api::auth::require_bearer`], which hands the handler a Spotify client
/// scoped to the caller's token.
pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let protected = Router::new()
        .route("/me", get(api::library::current_user))
        .route("/recommend", post(api::recommend::recommend))
        .route("/recomendar", post(api::recommend::recommend))
        .route("/like", post(api::library::like))
        .route("/play", post(api::library::play))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_bearer,
        ));

    let public = Router::new()
        .route("/login", get(api::auth::login))
        .route("/callback", get(api::auth::callback))
        .merge(api::health::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(middleware::from_fn(api::log_request))
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
