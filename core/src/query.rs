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

//! Search query construction from a listener profile.

/// At most this many genres make it into a query.
pub const MAX_GENRE_TERMS: usize = 3;
/// At most this many of the listener's top artists are added.
pub const MAX_ARTIST_TERMS: usize = 2;

/// Builds a catalog search query such as `genre:"rock" OR artist:"Muse"`.
///
/// Genres are trimmed and lower-cased; artist names are used verbatim.
/// Callers must reject an empty genre list before getting here.
pub fn build_query<S, A>(genres: &[S], top_artists: &[A]) -> String
where
    S: AsRef<str>,
    A: AsRef<str>,
{
    let genre_terms = genres
        .iter()
        .take(MAX_GENRE_TERMS)
        .map(|g| format!("genre:\"{}\"", g.as_ref().trim().to_lowercase()));

    let artist_terms = top_artists
        .iter()
        .take(MAX_ARTIST_TERMS)
        .map(|a| format!("artist:\"{}\"", a.as_ref()));

    genre_terms
        .chain(artist_terms)
        .collect::<Vec<String>>()
        .join(" OR ")
}
