// remote/hosted.rs
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

use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use url::Url;

use crate::errors::RemoteError;
use crate::models::EntityKind;
use crate::remote::{with_trailing_slash, Endpoint};

/// Third-party hosted database with a PostgREST style interface.
///
/// Tables live under `{base}/rest/v1/{kind}`. A single record is addressed
/// with an `id=eq.{id}` filter, and reads of it come back as a one element
/// array. A filter that matches nothing is not an error to the remote, so
/// writes ask for the touched rows in the response.
#[derive(Clone)]
pub struct HostedDb {
    base: Url,
    api_key: Option<String>,
}

// Keep the key out of the logs.
impl std::fmt::Debug for HostedDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedDb")
            .field("base", &self.base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HostedDb {
    pub fn new(base: Url, api_key: Option<String>) -> Self {
        HostedDb {
            base: with_trailing_slash(base),
            api_key,
        }
    }
}

impl Endpoint for HostedDb {
    fn collection_url(&self, kind: EntityKind) -> Result<Url, RemoteError> {
        self.base
            .join(&format!("rest/v1/{}", kind.table()))
            .map_err(From::from)
    }

    fn record_url(&self, kind: EntityKind, id: &str) -> Result<Url, RemoteError> {
        let mut url = self.collection_url(kind)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn update_method(&self) -> Method {
        Method::PATCH
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    // Filtered writes answer 2xx even when no row matched, so ask for the
    // touched rows back and look at them.
    fn prepare_write(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("Prefer", "return=representation")
    }

    fn touched_record(&self, body: &str) -> bool {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(rows)) => !rows.is_empty(),
            Ok(Value::Object(_)) => true,
            _ => false,
        }
    }

    fn unwrap_list(&self, body: Value) -> Result<Vec<Value>, RemoteError> {
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Object(mut map) => match map.remove("data") {
                Some(Value::Array(rows)) => Ok(rows),
                _ => Err(RemoteError::UnexpectedPayload(
                    "hosted list has no data array".to_owned(),
                )),
            },
            other => Err(RemoteError::UnexpectedPayload(format!(
                "hosted list is neither an array nor an object: {other}"
            ))),
        }
    }

    fn unwrap_record(&self, body: Value) -> Result<Option<Value>, RemoteError> {
        match body {
            Value::Array(mut rows) => {
                if rows.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(rows.swap_remove(0)))
                }
            }
            record @ Value::Object(_) => Ok(Some(record)),
            other => Err(RemoteError::UnexpectedPayload(format!(
                "hosted record is not an object: {other}"
            ))),
        }
    }
}
