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

//! Router tests against an in-memory Spotify stand-in.
//!
//! Covers:
//! - Bearer middleware (missing / malformed credentials)
//! - Recommendation input validation and failure policies
//! - Like / play status and message forwarding
//! - OAuth redirects, health, CORS preflight

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use moodmix_core::models::{Album, Track};
use moodmix_core::{ClientFactory, MusicApi, OAuthManager, UpstreamError};
use moodmix_server::api::auth::{MALFORMED_HEADER, MISSING_HEADER};
use moodmix_server::{build_router, AppState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt; // for `oneshot` method

const FRONTEND: &str = "http://127.0.0.1:5500";
const TOKEN: &str = "BQD-test-token";

#[derive(Default)]
struct FakeApi {
    tracks: Vec<Track>,
    search_fails: bool,
    top_artists_fail: bool,
    save_status: Option<u16>,
    playback_status: Option<u16>,
    user_fails: bool,
    no_display_name: bool,
    queries: Mutex<Vec<String>>,
    saved: Mutex<Vec<String>>,
    played: Mutex<Vec<String>>,
}

fn status_error(status: u16, message: &str) -> UpstreamError {
    UpstreamError::Status {
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl MusicApi for FakeApi {
    async fn search_tracks(&self, query: &str, _limit: u32) -> Result<Vec<Track>, UpstreamError> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.search_fails {
            return Err(status_error(500, "Server error"));
        }
        Ok(self.tracks.clone())
    }

    async fn top_artist_names(&self, _limit: u32) -> Result<Vec<String>, UpstreamError> {
        if self.top_artists_fail {
            return Err(status_error(403, "Insufficient client scope"));
        }
        Ok(vec!["Radiohead".to_string()])
    }

    async fn save_track(&self, track_id: &str) -> Result<(), UpstreamError> {
        if let Some(status) = self.save_status {
            return Err(status_error(status, "Non existing id: 'spotify:track:zzz'"));
        }
        self.saved.lock().unwrap().push(track_id.to_string());
        Ok(())
    }

    async fn start_playback(&self, track_uri: &str) -> Result<(), UpstreamError> {
        if let Some(status) = self.playback_status {
            return Err(status_error(status, "Player command failed"));
        }
        self.played.lock().unwrap().push(track_uri.to_string());
        Ok(())
    }

    async fn current_user_name(&self) -> Result<Option<String>, UpstreamError> {
        if self.user_fails {
            return Err(status_error(401, "The access token expired"));
        }
        if self.no_display_name {
            return Ok(None);
        }
        Ok(Some("Ada".to_string()))
    }
}

struct FakeFactory {
    api: Arc<FakeApi>,
    tokens: Mutex<Vec<String>>,
}

impl ClientFactory for FakeFactory {
    fn for_token(&self, access_token: &str) -> Arc<dyn MusicApi> {
        self.tokens.lock().unwrap().push(access_token.to_string());
        self.api.clone()
    }
}

/// Test helper: router plus handles to inspect what reached "Spotify"
fn setup_app(api: FakeApi) -> (Router, Arc<FakeApi>, Arc<FakeFactory>) {
    let api = Arc::new(api);
    let factory = Arc::new(FakeFactory {
        api: api.clone(),
        tokens: Mutex::new(Vec::new()),
    });

    let oauth = OAuthManager::from_parts(
        "test-client-id",
        "test-client-secret",
        "http://127.0.0.1:5000/callback",
    );
    let state = AppState::new(oauth, factory.clone(), FRONTEND);
    let origins = vec![FRONTEND.to_string()];

    (build_router(state, &origins), api, factory)
}

fn track(id: &str, popularity: u32, cover: bool) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Song {}", id),
        artists: vec!["The Band".to_string()],
        album: Some(Album {
            name: "LP".to_string(),
            cover_url: cover.then(|| format!("https://i.scdn.co/image/{}", id)),
        }),
        uri: format!("spotify:track:{}", id),
        popularity,
    }
}

fn authed_post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

fn location(response: &axum::response::Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect should carry a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

// =============================================================================
// Public endpoints
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_auth_required() {
    let (app, _, _) = setup_app(FakeApi::default());

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "moodmix-server");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_login_redirects_to_spotify() {
    let (app, _, _) = setup_app(FakeApi::default());

    let response = app.oneshot(get("/login")).await.unwrap();
    assert!(response.status().is_redirection());

    let target = location(&response);
    assert!(target.starts_with("https://accounts.spotify.com/authorize"));
    assert!(target.contains("client_id=test-client-id"));
}

#[tokio::test]
async fn test_callback_error_redirects_to_frontend() {
    let (app, _, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(get("/callback?error=access_denied"))
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(
        location(&response),
        "http://127.0.0.1:5500/#error=access_denied"
    );
}

#[tokio::test]
async fn test_callback_without_anything_uses_generic_error() {
    let (app, _, _) = setup_app(FakeApi::default());

    let response = app.oneshot(get("/callback")).await.unwrap();
    assert_eq!(
        location(&response),
        "http://127.0.0.1:5500/#error=unknown%20error"
    );
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let (app, _, _) = setup_app(FakeApi::default());

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/recommend")
        .header(header::ORIGIN, FRONTEND)
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], FRONTEND);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

// =============================================================================
// Bearer middleware
// =============================================================================

#[tokio::test]
async fn test_missing_authorization_is_401() {
    let (app, api, factory) = setup_app(FakeApi::default());

    let request = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"genres": ["rock"]}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], MISSING_HEADER);
    assert!(factory.tokens.lock().unwrap().is_empty());
    assert!(api.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_authorization_is_401_on_every_route() {
    for (method, uri) in [("GET", "/me"), ("POST", "/like"), ("POST", "/play"), ("POST", "/recommend")] {
        let (app, _, _) = setup_app(FakeApi::default());

        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, "Token abc")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);

        let body = extract_json(response.into_body()).await;
        assert_eq!(body["message"], MALFORMED_HEADER);
    }
}

// =============================================================================
// Recommendations
// =============================================================================

#[tokio::test]
async fn test_empty_genres_rejected_without_upstream_call() {
    let (app, api, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(authed_post("/recommend", json!({"genres": [], "energy": 50})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "Select at least one genre");
    assert!(api.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unparseable_body_is_a_genre_error() {
    let (app, api, _) = setup_app(FakeApi::default());

    let request = Request::builder()
        .method("POST")
        .uri("/recommend")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(api.queries.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_rock_scenario_returns_single_scored_track() {
    let (app, api, factory) = setup_app(FakeApi {
        tracks: vec![track("keep", 50, true), track("nocover", 50, false)],
        top_artists_fail: true,
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post(
            "/recommend",
            json!({"genres": ["rock"], "mood": null, "energy": 50}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let recs = body.as_array().expect("array body");
    assert_eq!(recs.len(), 1);

    let rec = &recs[0];
    assert_eq!(rec["id"], "keep");
    assert_eq!(rec["cover"], "https://i.scdn.co/image/keep");
    assert_eq!(rec["spotify_uri"], "spotify:track:keep");
    assert_eq!(rec["artist"], "The Band");
    assert_eq!(rec["liked"], false);
    let score = rec["score"].as_i64().unwrap();
    assert!((40..=60).contains(&score), "score {}", score);
    assert_eq!(rec["matchPercent"], rec["score"]);

    assert_eq!(api.queries.lock().unwrap().as_slice(), ["genre:\"rock\""]);
    assert_eq!(factory.tokens.lock().unwrap().as_slice(), [TOKEN]);
}

#[tokio::test]
async fn test_top_artists_are_added_to_query() {
    let (app, api, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(authed_post("/recommend", json!({"genres": ["Indie", "Rock"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        api.queries.lock().unwrap().as_slice(),
        ["genre:\"indie\" OR genre:\"rock\" OR artist:\"Radiohead\""]
    );
}

#[tokio::test]
async fn test_fourth_genre_never_reaches_query() {
    let (app, api, _) = setup_app(FakeApi {
        top_artists_fail: true,
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post(
            "/recommend",
            json!({"genres": [" ", "rock", "jazz", "pop"]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(
        api.queries.lock().unwrap().as_slice(),
        ["genre:\"\" OR genre:\"rock\" OR genre:\"jazz\""]
    );
}

#[tokio::test]
async fn test_fractional_energy_does_not_reject_profile() {
    let (app, api, _) = setup_app(FakeApi {
        tracks: vec![track("a", 70, true)],
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post(
            "/recommend",
            json!({"genres": ["rock"], "energy": 55.5}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(api.queries.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_failure_returns_empty_list() {
    let (app, _, _) = setup_app(FakeApi {
        tracks: vec![track("a", 70, true)],
        search_fails: true,
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post("/recommend", json!({"genres": ["jazz"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!([]));
}

#[tokio::test]
async fn test_legacy_route_and_cap_of_twenty() {
    let tracks = (0..45).map(|i| track(&format!("t{}", i), 60, true)).collect();
    let (app, _, _) = setup_app(FakeApi {
        tracks,
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post("/recomendar", json!({"genres": ["pop"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    let recs = body.as_array().unwrap();
    assert_eq!(recs.len(), 20);
    assert!(recs.iter().all(|r| r["score"].as_i64().unwrap() <= 100));
}

// =============================================================================
// Like / play / me
// =============================================================================

#[tokio::test]
async fn test_like_requires_track_id() {
    let (app, api, _) = setup_app(FakeApi::default());

    let response = app.oneshot(authed_post("/like", json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["message"], "track_id is required");
    assert!(api.saved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_like_success() {
    let (app, api, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(authed_post("/like", json!({"track_id": "4uLU6hMCjMI75M1A2tKUQC"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "success");
    assert_eq!(api.saved.lock().unwrap().as_slice(), ["4uLU6hMCjMI75M1A2tKUQC"]);
}

#[tokio::test]
async fn test_like_forwards_upstream_status_and_message() {
    let (app, _, _) = setup_app(FakeApi {
        save_status: Some(400),
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post("/like", json!({"track_id": "zzz"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Non existing id: 'spotify:track:zzz'");
}

#[tokio::test]
async fn test_play_success() {
    let (app, api, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(authed_post("/play", json!({"track_uri": "spotify:track:abc"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(api.played.lock().unwrap().as_slice(), ["spotify:track:abc"]);
}

#[tokio::test]
async fn test_play_without_active_device() {
    let (app, _, _) = setup_app(FakeApi {
        playback_status: Some(404),
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post("/play", json!({"track_uri": "spotify:track:abc"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("No active device"));
}

#[tokio::test]
async fn test_play_requires_premium() {
    let (app, _, _) = setup_app(FakeApi {
        playback_status: Some(403),
        ..Default::default()
    });

    let response = app
        .oneshot(authed_post("/play", json!({"track_uri": "spotify:track:abc"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = extract_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("Premium"));
}

#[tokio::test]
async fn test_play_requires_track_uri() {
    let (app, _, _) = setup_app(FakeApi::default());

    let response = app
        .oneshot(authed_post("/play", json!({"track_uri": ""})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_returns_display_name() {
    let (app, _, _) = setup_app(FakeApi::default());

    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({"name": "Ada"}));
}

#[tokio::test]
async fn test_me_without_display_name_falls_back() {
    let (app, _, _) = setup_app(FakeApi {
        no_display_name: true,
        ..Default::default()
    });

    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response.into_body()).await, json!({"name": "User"}));
}

#[tokio::test]
async fn test_me_failure_is_unauthorized() {
    let (app, _, _) = setup_app(FakeApi {
        user_fails: true,
        ..Default::default()
    });

    let request = Request::builder()
        .uri("/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
