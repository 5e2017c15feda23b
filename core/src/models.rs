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

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Energy level assumed when the client does not send one.
pub const DEFAULT_ENERGY: i32 = 50;

/// What the browser client asks for when requesting recommendations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub mood: Option<String>,
    /// Accepted and echoed in logs only; it does not affect the query or the score.
    #[serde(default = "default_energy", deserialize_with = "energy_or_default")]
    pub energy: i32,
}

fn default_energy() -> i32 {
    DEFAULT_ENERGY
}

// Energy is never validated: `null` (slider never touched), strings and other
// non-numbers fall back to the default, fractional values are rounded.
fn energy_or_default<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(energy_from_value(&value))
}

fn energy_from_value(value: &serde_json::Value) -> i32 {
    if let Some(n) = value.as_i64() {
        return i32::try_from(n).unwrap_or(if n < 0 { i32::MIN } else { i32::MAX });
    }
    match value.as_f64() {
        Some(f) if f.is_finite() => f.round() as i32, // `as` saturates
        _ => DEFAULT_ENERGY,
    }
}

impl UserProfile {
    pub fn new(genres: Vec<String>) -> Self {
        Self {
            genres,
            mood: None,
            energy: DEFAULT_ENERGY,
        }
    }

    /// Only an empty list is rejected; entries are cleaned up by the query builder.
    pub fn has_genres(&self) -> bool {
        !self.genres.is_empty()
    }
}

/// Album data attached to a catalog track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    pub cover_url: Option<String>,
}

/// A song as returned by the upstream catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<Album>,
    pub uri: String,
    pub popularity: u32,
}

impl Track {
    pub fn cover_url(&self) -> Option<&str> {
        self.album.as_ref()?.cover_url.as_deref()
    }

    /// Only tracks with an album and a cover image can be shown as cards.
    pub fn is_displayable(&self) -> bool {
        self.cover_url().is_some()
    }
}

/// A track enriched with a match score, shaped for the browser client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub artist: String, // Comma-joined, what the card subtitle shows
    pub artists: Vec<String>,
    pub album: String,
    pub cover: String,
    pub spotify_uri: String,
    pub popularity: u32,
    pub score: i32,
    #[serde(rename = "matchPercent")]
    pub match_percent: i32,
    pub liked: bool,
}

impl Recommendation {
    /// Returns `None` for tracks lacking album data or a cover image.
    pub fn from_track(track: Track, score: i32) -> Option<Self> {
        let album = track.album?;
        let cover = album.cover_url?;

        Some(Self {
            id: track.id,
            title: track.title,
            artist: track.artists.join(", "),
            artists: track.artists,
            album: album.name,
            cover,
            spotify_uri: track.uri,
            popularity: track.popularity,
            score,
            match_percent: score,
            liked: false,
        })
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} (Album: {}) -> {}% match (popularity {})",
            self.id, self.title, self.artist, self.album, self.score, self.popularity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_track(cover: Option<&str>) -> Track {
        Track {
            id: "4uLU6hMCjMI75M1A2tKUQC".to_string(),
            title: "Never Gonna Give You Up".to_string(),
            artists: vec!["Rick Astley".to_string(), "Guest".to_string()],
            album: Some(Album {
                name: "Whenever You Need Somebody".to_string(),
                cover_url: cover.map(str::to_string),
            }),
            uri: "spotify:track:4uLU6hMCjMI75M1A2tKUQC".to_string(),
            popularity: 77,
        }
    }

    #[test]
    fn test_profile_defaults_energy_when_missing_or_null() {
        let profile: UserProfile = serde_json::from_str(r#"{"genres":["rock"]}"#).unwrap();
        assert_eq!(profile.energy, DEFAULT_ENERGY);
        assert_eq!(profile.mood, None);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"mood":null,"energy":null}"#).unwrap();
        assert_eq!(profile.energy, DEFAULT_ENERGY);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["jazz"],"mood":"Relaxed","energy":80}"#).unwrap();
        assert_eq!(profile.energy, 80);
        assert_eq!(profile.mood.as_deref(), Some("Relaxed"));
    }

    #[test]
    fn test_profile_energy_is_never_rejected() {
        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"energy":55.5}"#).unwrap();
        assert_eq!(profile.energy, 56);
        assert_eq!(profile.genres, vec!["rock"]);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"energy":"loud"}"#).unwrap();
        assert_eq!(profile.energy, DEFAULT_ENERGY);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"energy":[1,2]}"#).unwrap();
        assert_eq!(profile.energy, DEFAULT_ENERGY);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"energy":-20}"#).unwrap();
        assert_eq!(profile.energy, -20);

        let profile: UserProfile =
            serde_json::from_str(r#"{"genres":["rock"],"energy":99999999999}"#).unwrap();
        assert_eq!(profile.energy, i32::MAX);
    }

    #[test]
    fn test_profile_without_genres() {
        let profile: UserProfile = serde_json::from_str(r#"{"mood":"Happy"}"#).unwrap();
        assert!(!profile.has_genres());

        assert!(!UserProfile::new(Vec::new()).has_genres());

        assert!(UserProfile::new(vec!["pop".to_string()]).has_genres());
    }

    #[test]
    fn test_recommendation_requires_cover() {
        assert!(Recommendation::from_track(sample_track(None), 50).is_none());

        let mut no_album = sample_track(Some("https://i.scdn.co/image/a"));
        no_album.album = None;
        assert!(!no_album.is_displayable());
        assert!(Recommendation::from_track(no_album, 50).is_none());
    }

    #[test]
    fn test_recommendation_json_shape() {
        let rec = Recommendation::from_track(sample_track(Some("https://i.scdn.co/image/a")), 81)
            .unwrap();

        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["artist"], "Rick Astley, Guest");
        assert_eq!(json["cover"], "https://i.scdn.co/image/a");
        assert_eq!(json["spotify_uri"], "spotify:track:4uLU6hMCjMI75M1A2tKUQC");
        assert_eq!(json["score"], 81);
        assert_eq!(json["matchPercent"], 81);
        assert_eq!(json["liked"], false);
    }

    #[test]
    fn test_recommendation_display() {
        let rec = Recommendation::from_track(sample_track(Some("https://i.scdn.co/image/a")), 64)
            .unwrap();

        let display = format!("{}", rec);
        assert!(display.contains("Never Gonna Give You Up"));
        assert!(display.contains("64% match"));
    }
}
