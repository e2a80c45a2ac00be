// remote/mod.rs
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

//! The remote tier.
//!
//! Both flavours of remote speak the same REST-ish contract keyed by entity
//! kind: list, get-one, create, update and delete. They only differ in
//! where the tables live, how requests are authorized and how list
//! payloads are wrapped. That difference is the [`Endpoint`] trait.

mod hosted;
mod table;

pub use self::hosted::HostedDb;
pub use self::table::TableApi;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use std::fmt;

use crate::config::{BackendConfig, StoreConfig};
use crate::errors::{DataError, HttpStatusError, RemoteError};
use crate::models::{EntityKind, Record};

/// Where one remote flavour keeps its tables.
pub(crate) trait Endpoint: fmt::Debug + Send + Sync {
    /// `/{kind}`
    fn collection_url(&self, kind: EntityKind) -> Result<Url, RemoteError>;

    /// `/{kind}/{id}`
    fn record_url(&self, kind: EntityKind, id: &str) -> Result<Url, RemoteError>;

    /// PUT or PATCH.
    fn update_method(&self) -> Method {
        Method::PUT
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    /// Headers every create, update and delete carries.
    fn prepare_write(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }

    /// Whether a successful update or delete response actually touched a
    /// record. Remotes that answer a missing id with a 404 never need this.
    fn touched_record(&self, _body: &str) -> bool {
        true
    }

    /// Records out of a list response.
    fn unwrap_list(&self, body: Value) -> Result<Vec<Value>, RemoteError>;

    /// The record out of a get-one response.
    fn unwrap_record(&self, body: Value) -> Result<Option<Value>, RemoteError> {
        Ok(Some(body))
    }
}

#[derive(Debug, Clone)]
enum Adapter {
    Table(TableApi),
    Hosted(HostedDb),
    LocalOnly,
}

/// The configured remote backend.
///
/// Every call is a single attempt. There are no retries and no memory of
/// earlier failures, each call finds out again whether the remote is
/// reachable.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    adapter: Adapter,
}

pub(crate) fn client_builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder().user_agent(crate::USER_AGENT)
}

pub(crate) fn parse_url_without_scheme(s: &str) -> Result<Url, url::ParseError> {
    Url::parse(s).or(Url::parse(&["https://", s].join("")))
}

/// `Url::join` drops the last path segment unless the base ends with a slash.
pub(crate) fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

pub(crate) fn push_segment(mut url: Url, segment: &str) -> Result<Url, RemoteError> {
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .push(segment);
    Ok(url)
}

impl RemoteBackend {
    /// Build the backend selected by `config`.
    pub fn from_config(config: &StoreConfig) -> Result<Self, DataError> {
        let adapter = match &config.backend {
            BackendConfig::Table { base_url } => Adapter::Table(TableApi::new(base_url.clone())),
            BackendConfig::Hosted { base_url, api_key } => {
                Adapter::Hosted(HostedDb::new(base_url.clone(), api_key.clone()))
            }
            BackendConfig::LocalOnly => Adapter::LocalOnly,
        };
        let client = client_builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(DataError::HttpClient)?;

        Ok(RemoteBackend { client, adapter })
    }

    /// A backend that never does any I/O.
    pub fn local_only() -> Self {
        RemoteBackend {
            client: reqwest::Client::new(),
            adapter: Adapter::LocalOnly,
        }
    }

    #[cfg(test)]
    pub(crate) fn table(base: &str, timeout: std::time::Duration) -> Result<Self, DataError> {
        let config = StoreConfig {
            backend: BackendConfig::Table {
                base_url: Url::parse(base)?,
            },
            database_path: Default::default(),
            request_timeout: timeout,
        };
        Self::from_config(&config)
    }

    #[cfg(test)]
    pub(crate) fn hosted(
        base: &str,
        api_key: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, DataError> {
        let config = StoreConfig {
            backend: BackendConfig::Hosted {
                base_url: Url::parse(base)?,
                api_key: Some(api_key.to_owned()),
            },
            database_path: Default::default(),
            request_timeout: timeout,
        };
        Self::from_config(&config)
    }

    pub fn is_local_only(&self) -> bool {
        matches!(self.adapter, Adapter::LocalOnly)
    }

    fn endpoint(&self) -> Result<&dyn Endpoint, RemoteError> {
        match &self.adapter {
            Adapter::Table(t) => Ok(t),
            Adapter::Hosted(h) => Ok(h),
            Adapter::LocalOnly => Err(RemoteError::Disabled),
        }
    }

    /// `GET /{kind}`
    pub async fn list<T: Record>(&self) -> Result<Vec<T>, RemoteError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.collection_url(T::KIND)?;
        debug!("remote: listing {}", url);

        let resp = endpoint
            .authorize(self.client.get(url.clone()))
            .send()
            .await?;
        let body = expect_success(resp, &format!("list {}", T::KIND.table())).await?;
        let body: Value = serde_json::from_str(&body)?;

        endpoint
            .unwrap_list(body)?
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
            .map_err(From::from)
    }

    /// `GET /{kind}/{id}`, `None` on a 404.
    pub async fn fetch<T: Record>(&self, id: &str) -> Result<Option<T>, RemoteError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.record_url(T::KIND, id)?;
        debug!("remote: fetching {}", url);

        let resp = endpoint.authorize(self.client.get(url)).send().await?;
        let body = match expect_success(resp, &format!("fetch {}", id)).await {
            Ok(body) => body,
            Err(err) if err.is_not_found() => return Ok(None),
            Err(err) => return Err(err),
        };
        let body: Value = serde_json::from_str(&body)?;

        match endpoint.unwrap_record(body)? {
            Some(record) => Ok(Some(serde_json::from_value(record)?)),
            None => Ok(None),
        }
    }

    /// `POST /{kind}`
    pub async fn create<T: Record>(&self, record: &T) -> Result<(), RemoteError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.collection_url(T::KIND)?;
        debug!("remote: creating {:?} at {}", record.id(), url);

        let request = endpoint.authorize(self.client.post(url));
        let resp = endpoint
            .prepare_write(request)
            .json(record)
            .send()
            .await?;
        expect_success(resp, &format!("create {}", T::KIND)).await?;
        Ok(())
    }

    /// `PUT /{kind}/{id}` or `PATCH /{kind}/{id}`, full record body either way.
    pub async fn update<T: Record>(&self, id: &str, record: &T) -> Result<(), RemoteError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.record_url(T::KIND, id)?;
        let method = endpoint.update_method();
        debug!("remote: {} {}", method, url);

        let request = endpoint.authorize(self.client.request(method, url.clone()));
        let resp = endpoint
            .prepare_write(request)
            .json(record)
            .send()
            .await?;
        let body = expect_success(resp, &format!("update {}", id)).await?;
        if !endpoint.touched_record(&body) {
            return Err(nothing_touched(&url, &format!("update {}", id)));
        }
        Ok(())
    }

    /// `DELETE /{kind}/{id}`
    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<(), RemoteError> {
        let endpoint = self.endpoint()?;
        let url = endpoint.record_url(kind, id)?;
        debug!("remote: deleting {}", url);

        let request = endpoint.authorize(self.client.delete(url.clone()));
        let resp = endpoint.prepare_write(request).send().await?;
        let body = expect_success(resp, &format!("delete {}", id)).await?;
        if !endpoint.touched_record(&body) {
            return Err(nothing_touched(&url, &format!("delete {}", id)));
        }
        Ok(())
    }
}

/// A 2xx that matched no record is reported the same way as a 404.
fn nothing_touched(url: &Url, context: &str) -> RemoteError {
    debug!("remote: {} matched no record", url);
    HttpStatusError::new(
        url.to_string(),
        StatusCode::NOT_FOUND,
        format!("{context}: no record matched"),
    )
    .into()
}

/// Any 2xx is a success. Returns the body.
async fn expect_success(resp: Response, context: &str) -> Result<String, RemoteError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let text = resp.text().await?;

    if status.is_success() {
        return Ok(text);
    }
    debug!("remote: {} answered {}: {}", url, status, text);
    Err(HttpStatusError::new(url, status, context.to_owned()).into())
}
