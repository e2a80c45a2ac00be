// lib.rs
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

// Enable lint group collections
#![warn(nonstandard_style, unused)]
// standalone lints
#![warn(
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    unconditional_recursion,
    while_true,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts
)]

//! Content layer of "The Hidden World of London".
//!
//! [`ContentStore`] owns the episodes, clans and locations shown on the site.
//! Reads go to the configured remote backend first and fall back to the
//! local cache, then to the built-in seed content. Writes always land in the
//! local cache, whatever happens to the remote leg.

#[macro_use]
extern crate log;

pub mod cache;
pub mod config;
pub mod database;
pub mod errors;
pub mod models;
pub mod notify;
pub mod remote;
mod schema;
pub mod seed;
pub mod store;
pub(crate) mod utils;

#[cfg(test)]
pub(crate) mod test_server;

pub use crate::config::{BackendConfig, StoreConfig};
pub use crate::errors::{DataError, RemoteError};
pub use crate::models::{
    ActiveStatus, Clan, ClanBuilder, EntityKind, Episode, EpisodeBuilder, EpisodeStatus, Location,
    LocationBuilder, Record,
};
pub use crate::notify::{Change, ChangeEvent, ChangeNotifier, ChangeSubscription};
pub use crate::store::{
    BatchOutcome, BatchStatus, ContentStore, SaveOutcome, Snapshot, SyncStatus, WriteIntent,
};

/// The user-agent to be used for all the requests to a remote backend.
pub const USER_AGENT: &str = concat!("hidden-london/", env!("CARGO_PKG_VERSION"));

/// [XDG Base Direcotory](https://specifications.freedesktop.org/basedir-spec/basedir-spec-latest.html) Paths.
pub mod xdg_dirs {
    use std::path::PathBuf;

    use crate::errors::DataError;

    /// Directory prefix under the XDG base directories.
    pub const PREFIX: &str = "hidden-london";

    /// Location of the local cache database, created on demand under `XDG_DATA_HOME`.
    pub fn default_database_path() -> Result<PathBuf, DataError> {
        let dirs = xdg::BaseDirectories::with_prefix(PREFIX)
            .map_err(|err| DataError::Config(format!("No XDG base directories: {err}")))?;
        dirs.place_data_file("content.db").map_err(From::from)
    }
}
