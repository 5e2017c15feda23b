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

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, info};
use moodmix_core::{OAuthManager, SpotifyClientFactory};
use moodmix_server::{build_router, keep_alive, AppState, ServerConfig};
use std::process;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "moodmix-server")]
#[command(about = "Spotify-backed recommendation backend for the moodmix web app", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the HTTP API (login, recommend, like, play)
    Serve(ServerConfig),
    /// Pings a running instance's /health endpoint once; exits 1 if it is down
    KeepAlive {
        /// Base URL of the deployed backend
        #[arg(long, env = "MOODMIX_BACKEND_URL")]
        url: String,
        /// Seconds to wait for the response
        #[arg(long, default_value_t = keep_alive::DEFAULT_PING_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if dotenv().is_err() {
        // Silently ignore
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(config) => {
            if let Err(e) = handle_serve(config).await {
                error!("Server stopped: {:#}", e);
                eprintln!("Error: {:#}", e);
                process::exit(1);
            }
        }
        Commands::KeepAlive { url, timeout_secs } => {
            handle_keep_alive(&url, Duration::from_secs(timeout_secs)).await;
        }
    }
}

async fn handle_serve(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        "Starting {} v{}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let oauth = OAuthManager::from_env().context("Spotify OAuth is not configured")?;
    info!("OAuth redirect URI: {}", oauth.redirect_uri());
    let clients = Arc::new(SpotifyClientFactory::new(config.upstream_timeout()));
    let state = AppState::new(oauth, clients, &config.frontend_url);
    let app = build_router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;

    info!("Listening on http://{}", config.bind);
    info!("Frontend: {}", config.frontend_url);
    info!("Allowed origins: {}", config.cors_origins.join(", "));

    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_keep_alive(url: &str, timeout: Duration) {
    info!("Keep-alive ping to {}", url);

    if keep_alive::ping_service(url, timeout).await {
        info!("Keep-alive completed");
    } else {
        eprintln!("Keep-alive failed for {}", url);
        process::exit(1);
    }
}
