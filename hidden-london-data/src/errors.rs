// errors.rs
//
// Copyright 2025 Hidden London contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//
// SPDX-License-Identifier: GPL-3.0-or-later

use diesel::r2d2;
use thiserror::Error;

use std::io;

use crate::models::EntityKind;

/// Failures of the local tier, or of the input handed to the store.
///
/// These are the only errors that cross the `ContentStore` boundary.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("SQL Query failed: {0}")]
    DieselResultError(#[from] diesel::result::Error),
    #[error("Database Migration error: {0}")]
    DieselMigrationError(String),
    #[error("R2D2 Pool error: {0}")]
    R2D2PoolError(#[from] r2d2::PoolError),
    #[error("IO Error: {0}")]
    IOError(#[from] io::Error),
    #[error("Failed to encode records for the local cache: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid {kind} record: {reason}")]
    InvalidRecord { kind: EntityKind, reason: String },
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to parse a url: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("Failed to build the http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl DataError {
    pub(crate) fn invalid(kind: EntityKind, reason: impl Into<String>) -> Self {
        DataError::InvalidRecord {
            kind,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug)]
#[error("Request to {url} returned {status_code}. Context: {context}")]
pub struct HttpStatusError {
    url: String,
    status_code: reqwest::StatusCode,
    context: String,
}

impl HttpStatusError {
    pub fn new(url: String, code: reqwest::StatusCode, context: String) -> Self {
        HttpStatusError {
            url,
            status_code: code,
            context,
        }
    }

    pub fn status_code(&self) -> reqwest::StatusCode {
        self.status_code
    }
}

/// Failures of the remote tier.
///
/// `ContentStore` absorbs all of these. They only show up as log lines
/// and in the reason of a "saved locally only" outcome.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("Remote backend is disabled, running local-only.")]
    Disabled,
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Failed to build a url: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("{0}")]
    HttpStatusGeneral(#[from] HttpStatusError),
    #[error("Failed to decode the remote payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unexpected remote payload: {0}")]
    UnexpectedPayload(String),
}

impl RemoteError {
    /// The remote answered, and the answer was 404.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RemoteError::HttpStatusGeneral(e) if e.status_code() == reqwest::StatusCode::NOT_FOUND
        )
    }

    /// True when no request was made because no remote is configured.
    pub fn is_disabled(&self) -> bool {
        matches!(self, RemoteError::Disabled)
    }
}
