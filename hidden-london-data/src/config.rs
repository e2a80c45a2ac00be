// config.rs
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

use url::Url;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::DataError;
use crate::remote::parse_url_without_scheme;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which remote sits in front of the local cache.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    /// Generic REST table API, `{base_url}/tables/{kind}`.
    Table { base_url: Url },
    /// Hosted database, `{base_url}/rest/v1/{kind}`.
    Hosted {
        base_url: Url,
        api_key: Option<String>,
    },
    /// No remote at all.
    LocalOnly,
}

// Never prints the api key.
impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendConfig::Table { base_url } => write!(f, "table api at {base_url}"),
            BackendConfig::Hosted { base_url, .. } => write!(f, "hosted database at {base_url}"),
            BackendConfig::LocalOnly => write!(f, "local only"),
        }
    }
}

/// Everything `ContentStore::init` needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: BackendConfig,
    /// Sqlite file backing the local cache.
    pub database_path: PathBuf,
    pub request_timeout: Duration,
}

impl StoreConfig {
    pub fn local_only(database_path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            backend: BackendConfig::LocalOnly,
            database_path: database_path.into(),
            request_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Load the configuration from environment variables.
    ///
    /// | Env Var                      | Default                             |
    /// |------------------------------|-------------------------------------|
    /// | `HIDDEN_LONDON_BACKEND`      | `local` (`table`, `hosted`, `local`) |
    /// | `HIDDEN_LONDON_REMOTE_URL`   | required unless `local`             |
    /// | `HIDDEN_LONDON_API_KEY`      | none                                |
    /// | `HIDDEN_LONDON_DB_PATH`      | `$XDG_DATA_HOME/hidden-london/content.db` |
    /// | `HIDDEN_LONDON_TIMEOUT_SECS` | `10`                                |
    pub fn from_env() -> Result<Self, DataError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, DataError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend = match var("HIDDEN_LONDON_BACKEND").as_deref().map(str::trim) {
            None | Some("local") => BackendConfig::LocalOnly,
            Some("table") => BackendConfig::Table {
                base_url: remote_url(var("HIDDEN_LONDON_REMOTE_URL"))?,
            },
            Some("hosted") => BackendConfig::Hosted {
                base_url: remote_url(var("HIDDEN_LONDON_REMOTE_URL"))?,
                api_key: var("HIDDEN_LONDON_API_KEY"),
            },
            Some(other) => {
                return Err(DataError::Config(format!(
                    "HIDDEN_LONDON_BACKEND must be one of table, hosted or local, not {other}"
                )))
            }
        };

        let database_path = match var("HIDDEN_LONDON_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => crate::xdg_dirs::default_database_path()?,
        };

        let request_timeout = match var("HIDDEN_LONDON_TIMEOUT_SECS") {
            Some(secs) => secs
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|err| {
                    DataError::Config(format!("HIDDEN_LONDON_TIMEOUT_SECS {secs:?}: {err}"))
                })?,
            None => DEFAULT_TIMEOUT,
        };

        Ok(StoreConfig {
            backend,
            database_path,
            request_timeout,
        })
    }
}

fn remote_url(raw: Option<String>) -> Result<Url, DataError> {
    let raw = raw.ok_or_else(|| {
        DataError::Config("HIDDEN_LONDON_REMOTE_URL is required for a remote backend".to_owned())
    })?;
    parse_url_without_scheme(raw.trim()).map_err(From::from)
}
