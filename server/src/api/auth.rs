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

//! OAuth redirects and the bearer-credential middleware.

use axum::{
    extract::{Query, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{Redirect, Response},
};
use log::{debug, error, info, warn};
use moodmix_core::{MusicApi, Recommender};
use serde::Deserialize;
use std::sync::Arc;

use super::ApiError;
use crate::AppState;

pub const MISSING_HEADER: &str = "Authorization header is missing";
pub const MALFORMED_HEADER: &str =
    "Invalid Authorization header format. Expected 'Bearer <token>'";

/// Spotify client scoped to the caller's bearer token, placed in the request
/// extensions by [`require_bearer`].
#[derive(Clone)]
pub struct Session(pub Arc<dyn MusicApi>);

impl Session {
    pub fn recommender(&self) -> Recommender {
        Recommender::new(self.0.clone())
    }
}

/// Extracts `<token>` from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::Unauthorized(MISSING_HEADER.to_string()))?;

    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized(MALFORMED_HEADER.to_string()))?;
    debug!(
        "Authorization header received, starts with: {}...",
        value.get(..15).unwrap_or(value)
    );

    let parts: Vec<&str> = value.split(' ').collect();
    match parts.as_slice() {
        ["Bearer", token] if !token.is_empty() => Ok(*token),
        _ => Err(ApiError::Unauthorized(MALFORMED_HEADER.to_string())),
    }
}

/// Rejects requests without a usable bearer credential and attaches a
/// [`Session`] for the handler.
pub async fn require_bearer(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match bearer_token(request.headers()) {
        Ok(token) => token.to_string(),
        Err(e) => {
            warn!("Rejected {} {}: {:?}", request.method(), request.uri().path(), e);
            return Err(e);
        }
    };

    let api = state.clients.for_token(&token);
    request.extensions_mut().insert(Session(api));

    Ok(next.run(request).await)
}

/// GET /login
pub async fn login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let url = state.oauth.authorize_url().map_err(|e| {
        error!("Could not build authorize URL: {}", e);
        ApiError::Internal(e.to_string())
    })?;
    Ok(Redirect::to(&url))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /callback
///
/// Sends the browser back to the frontend with `#<access_token>`, or
/// `#error=<description>` when Spotify refused or the exchange failed.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let code = params.code.as_deref().unwrap_or_default();

    match state.oauth.exchange_code(code).await {
        Ok(access_token) => {
            info!("Login completed, handing token to the frontend");
            Redirect::to(&format!("{}/#{}", state.frontend_url, access_token))
        }
        Err(e) => {
            warn!("OAuth callback failed: {}", e);
            let description = params.error.as_deref().unwrap_or("unknown error");
            Redirect::to(&format!(
                "{}/#error={}",
                state.frontend_url,
                urlencoding::encode(description)
            ))
        }
    }
}
