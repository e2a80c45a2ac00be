// remote/table.rs
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

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::errors::RemoteError;
use crate::models::EntityKind;
use crate::remote::{push_segment, with_trailing_slash, Endpoint};

/// List response of the table API.
#[derive(Deserialize, Debug)]
struct ListEnvelope {
    data: Vec<Value>,
}

/// Generic REST table API, tables live under `{base}/tables/{kind}`.
#[derive(Debug, Clone)]
pub struct TableApi {
    base: Url,
}

impl TableApi {
    pub fn new(base: Url) -> Self {
        TableApi {
            base: with_trailing_slash(base),
        }
    }
}

impl Endpoint for TableApi {
    fn collection_url(&self, kind: EntityKind) -> Result<Url, RemoteError> {
        self.base
            .join(&format!("tables/{}", kind.table()))
            .map_err(From::from)
    }

    fn record_url(&self, kind: EntityKind, id: &str) -> Result<Url, RemoteError> {
        push_segment(self.collection_url(kind)?, id)
    }

    fn unwrap_list(&self, body: Value) -> Result<Vec<Value>, RemoteError> {
        if !body.is_object() {
            return Err(RemoteError::UnexpectedPayload(
                "table list is not wrapped in {\"data\": [...]}".to_owned(),
            ));
        }
        let envelope: ListEnvelope = serde_json::from_value(body)?;
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn test_urls() -> Result<()> {
        let api = TableApi::new(Url::parse("https://example.com/api")?);
        assert_eq!(
            "https://example.com/api/tables/episodes",
            api.collection_url(EntityKind::Episode)?.as_str()
        );
        assert_eq!(
            "https://example.com/api/tables/clans/clan_1",
            api.record_url(EntityKind::Clan, "clan_1")?.as_str()
        );
        // ids are a single escaped segment
        assert_eq!(
            "https://example.com/api/tables/locations/a%2Fb",
            api.record_url(EntityKind::Location, "a/b")?.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_unwrap_list() -> Result<()> {
        let api = TableApi::new(Url::parse("http://127.0.0.1/")?);
        let rows = api.unwrap_list(json!({"data": [{"id": "ep_1"}], "total": 1, "page": 1}))?;
        assert_eq!(1, rows.len());
        assert!(api.unwrap_list(json!([{"id": "ep_1"}])).is_err());
        assert!(api.unwrap_list(json!({"rows": []})).is_err());
        Ok(())
    }
}
