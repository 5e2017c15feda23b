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

//! Candidate scoring and selection.

use crate::models::{Recommendation, Track, UserProfile};
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Maximum number of recommendations returned per request.
pub const MAX_RECOMMENDATIONS: usize = 20;
/// Scores never exceed this value. There is deliberately no lower bound.
pub const MAX_SCORE: i32 = 100;
/// Popularity is perturbed by a uniform offset in `-SCORE_JITTER..=SCORE_JITTER`.
pub const SCORE_JITTER: i32 = 10;

/// Scores, selects and shuffles search results using the thread-local RNG.
pub fn build_recommendations(profile: &UserProfile, tracks: Vec<Track>) -> Vec<Recommendation> {
    build_recommendations_with_rng(profile, tracks, &mut rand::thread_rng())
}

/// Same as [`build_recommendations`] with an explicit random source.
///
/// Tracks without album data or a cover are dropped. The rest are scored,
/// sorted by score, cut to [`MAX_RECOMMENDATIONS`] and then shuffled, so the
/// score decides which tracks survive but not the order they are shown in.
pub fn build_recommendations_with_rng<R: Rng + ?Sized>(
    profile: &UserProfile,
    tracks: Vec<Track>,
    rng: &mut R,
) -> Vec<Recommendation> {
    let total = tracks.len();

    let mut scored: Vec<Recommendation> = tracks
        .into_iter()
        .filter(Track::is_displayable)
        .filter_map(|track| {
            let score = score_popularity(track.popularity, rng);
            Recommendation::from_track(track, score)
        })
        .collect();

    debug!(
        "Kept {} of {} tracks with artwork (energy {})",
        scored.len(),
        total,
        profile.energy
    );

    scored.sort_unstable_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_RECOMMENDATIONS);
    scored.shuffle(rng);

    scored
}

/// `min(popularity + U(-10, 10), 100)`.
pub fn score_popularity<R: Rng + ?Sized>(popularity: u32, rng: &mut R) -> i32 {
    let base = i32::try_from(popularity).unwrap_or(i32::MAX);
    let offset = rng.gen_range(-SCORE_JITTER..=SCORE_JITTER);
    base.saturating_add(offset).min(MAX_SCORE)
}
