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

use clap::Args;
use std::time::Duration;

/// Options for `moodmix-server serve`. Spotify credentials are read separately
/// from the `RSPOTIFY_*` variables.
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "MOODMIX_BIND", default_value = "127.0.0.1:5000")]
    pub bind: String,

    /// Browser app URL that receives the access token after login
    #[arg(long, env = "MOODMIX_FRONTEND_URL", default_value = "http://127.0.0.1:5500")]
    pub frontend_url: String,

    /// Origins allowed to call the API (repeat or comma-separate)
    #[arg(
        long = "cors-origin",
        env = "MOODMIX_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = ["http://localhost:5500", "http://127.0.0.1:5500"]
    )]
    pub cors_origins: Vec<String>,

    /// Seconds to wait for any single Spotify call
    #[arg(long, env = "MOODMIX_UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,
}

impl ServerConfig {
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}
