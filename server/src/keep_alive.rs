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

//! One-shot health ping, meant for cron jobs that keep a sleeping free-tier
//! host awake.

use log::{error, info, warn};
use std::time::Duration;

pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(30);

/// GETs `<base_url>/health` and reports whether it answered 200.
pub async fn ping_service(base_url: &str, timeout: Duration) -> bool {
    let url = format!("{}/health", base_url.trim_end_matches('/'));

    let client = match reqwest::Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Could not build HTTP client: {}", e);
            return false;
        }
    };

    match client.get(&url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            info!("Service is up ({})", response.status());
            true
        }
        Ok(response) => {
            warn!("Unexpected response from {}: {}", url, response.status());
            false
        }
        Err(e) if e.is_timeout() => {
            error!("Timed out after {:?} waiting for {}", timeout, url);
            false
        }
        Err(e) => {
            error!("Ping to {} failed: {}", url, e);
            false
        }
    }
}
