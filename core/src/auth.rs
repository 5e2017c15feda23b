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

use log::{debug, info};
use rspotify::{prelude::*, scopes, AuthCodeSpotify, Config, Credentials, OAuth};
use std::collections::HashSet;
use thiserror::Error;

/// Environment variables read by rspotify's `from_env` helpers.
pub const ENV_CLIENT_ID: &str = "RSPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "RSPOTIFY_CLIENT_SECRET";
pub const ENV_REDIRECT_URI: &str = "RSPOTIFY_REDIRECT_URI";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to initialize Spotify client: {0}")]
    ClientConfig(String),
    #[error("Spotify authentication failed: {0}")]
    Spotify(#[from] rspotify::ClientError),
    #[error("Authorization code is missing from the callback")]
    MissingCode,
    #[error("Spotify did not return an access token")]
    NoToken,
}

/// Scopes the browser client needs for recommendations, likes and playback.
///
/// - user-read-private / user-read-email: To show who is logged in (`/me`).
/// - user-library-read / user-library-modify: To add songs to Liked Songs.
/// - streaming / user-modify-playback-state: To start playback on a device.
/// - user-top-read: To mix the listener's top artists into the search query.
/// - user-follow-read: Requested by the web app alongside the others.
pub fn required_scopes() -> HashSet<String> {
    scopes!(
        "user-read-private",
        "user-read-email",
        "user-library-read",
        "user-library-modify",
        "streaming",
        "user-modify-playback-state",
        "user-top-read",
        "user-follow-read"
    )
}

/// Application-level OAuth2 settings for the Authorization Code Flow.
///
/// Built once at startup and only read afterwards. Each code exchange runs on
/// its own short-lived client, so no user token is ever stored here.
#[derive(Debug, Clone)]
pub struct OAuthManager {
    creds: Credentials,
    oauth: OAuth,
}

impl OAuthManager {
    pub fn new(creds: Credentials, oauth: OAuth) -> Self {
        Self { creds, oauth }
    }

    /// Builds a manager from explicit client settings with the default scopes.
    pub fn from_parts(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        let oauth = OAuth {
            redirect_uri: redirect_uri.to_string(),
            scopes: required_scopes(),
            ..Default::default()
        };
        Self::new(Credentials::new(client_id, client_secret), oauth)
    }

    /// Loads the application's OAuth settings from the environment.
    ///
    /// This function:
    /// 1. Checks that `RSPOTIFY_CLIENT_ID`, `RSPOTIFY_CLIENT_SECRET` and
    ///    `RSPOTIFY_REDIRECT_URI` are all set, reporting every missing one at once.
    /// 2. Reads the credentials with rspotify's `Credentials::from_env`.
    /// 3. Reads the redirect URI with `OAuth::from_env`, attaching [`required_scopes`].
    ///
    /// Unlike a CLI flow, nothing is prompted here: users authorize in the
    /// browser and land on `/callback`, which calls [`OAuthManager::exchange_code`].
    pub fn from_env() -> Result<Self, AuthError> {
        // rspotify only says "missing" without naming the variable, so check first.
        let missing: Vec<&str> = [ENV_CLIENT_ID, ENV_CLIENT_SECRET, ENV_REDIRECT_URI]
            .into_iter()
            .filter(|name| std::env::var_os(name).map_or(true, |v| v.is_empty()))
            .collect();

        if !missing.is_empty() {
            return Err(AuthError::ClientConfig(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        // Load credentials from env. `rspotify` expects RSPOTIFY_CLIENT_ID/SECRET.
        let creds = Credentials::from_env().ok_or_else(|| {
            AuthError::ClientConfig(format!("Missing {} or {}", ENV_CLIENT_ID, ENV_CLIENT_SECRET))
        })?;

        // Load OAuth config (Redirect URI) from env. The `state` value is generated by rspotify.
        let oauth = OAuth::from_env(required_scopes())
            .ok_or_else(|| AuthError::ClientConfig(format!("Missing {}", ENV_REDIRECT_URI)))?;

        info!("OAuth credentials loaded for client {}", creds.id);
        Ok(Self::new(creds, oauth))
    }

    /// Where Spotify sends the browser after consent; must match the app dashboard.
    pub fn redirect_uri(&self) -> &str {
        &self.oauth.redirect_uri
    }

    fn client(&self) -> AuthCodeSpotify {
        // Configure the client.
        // `token_cached: false`: a server must not write users' tokens to
        // .spotify_token_cache.json, and the token goes back to the browser anyway.
        // `token_refreshing: false`: the browser logs in again when the token expires.
        let config = Config {
            token_cached: false,
            token_refreshing: false,
            ..Default::default()
        };
        AuthCodeSpotify::with_config(self.creds.clone(), self.oauth.clone(), config)
    }

    /// Spotify consent page URL. The dialog is always shown so users can switch accounts.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        Ok(self.client().get_authorize_url(true)?)
    }

    /// Exchanges the callback `code` for an access token.
    pub async fn exchange_code(&self, code: &str) -> Result<String, AuthError> {
        if code.trim().is_empty() {
            return Err(AuthError::MissingCode);
        }

        let spotify = self.client();
        spotify.request_token(code).await?;
        debug!("Authorization code exchanged");

        let token = spotify.token.lock().await.map_err(|_| AuthError::NoToken)?;
        token
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or(AuthError::NoToken)
    }
}
