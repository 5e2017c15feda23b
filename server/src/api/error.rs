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

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use moodmix_core::UpstreamError;
use serde::Serialize;

/// Body of every error response: `{"status": "error", "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
}

/// Request failures, each mapped to a distinct status code.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed bearer credential, or a rejected session.
    Unauthorized(String),
    /// The client sent something unusable.
    BadRequest(String),
    /// A Spotify call failed; carries the status to forward.
    Upstream { status: StatusCode, message: String },
    Internal(String),
}

impl ApiError {
    /// Forwards Spotify's status and message; failures without one become 502/504.
    pub fn from_upstream(err: &UpstreamError, message: String) -> Self {
        let status = match err {
            UpstreamError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UpstreamError::InvalidId(_) => StatusCode::BAD_REQUEST,
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::Transport(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError::Upstream { status, message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        let message = err.message();
        ApiError::from_upstream(&err, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Unauthorized(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Internal(msg)
            | ApiError::Upstream { message: msg, .. } => msg,
        };

        let body = Json(ErrorBody {
            status: "error",
            message,
        });

        (status, body).into_response()
    }
}
