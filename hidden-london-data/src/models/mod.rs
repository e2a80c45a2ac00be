// mod.rs
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

mod clan;
mod episode;
mod location;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::errors::DataError;

pub use self::clan::{Clan, ClanBuilder};
pub use self::episode::{Episode, EpisodeBuilder, EpisodeStatus};
pub use self::location::{Location, LocationBuilder};

/// The three record types managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Episode,
    Clan,
    Location,
}

impl EntityKind {
    /// All kinds, in the order the site loads them.
    pub const ALL: [EntityKind; 3] = [EntityKind::Episode, EntityKind::Clan, EntityKind::Location];

    /// Name of the remote table/collection.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Episode => "episodes",
            EntityKind::Clan => "clans",
            EntityKind::Location => "locations",
        }
    }

    /// Fixed key of the local cache entry holding every record of this kind.
    pub fn cache_key(self) -> &'static str {
        match self {
            EntityKind::Episode => "hidden_london_episodes",
            EntityKind::Clan => "hidden_london_clans",
            EntityKind::Location => "hidden_london_locations",
        }
    }

    pub(crate) fn id_prefix(self) -> &'static str {
        match self {
            EntityKind::Episode => "ep",
            EntityKind::Clan => "clan",
            EntityKind::Location => "loc",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                EntityKind::Episode => "episode",
                EntityKind::Clan => "clan",
                EntityKind::Location => "location",
            }
        )
    }
}

impl FromStr for EntityKind {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "episode" | "episodes" => Ok(EntityKind::Episode),
            "clan" | "clans" => Ok(EntityKind::Clan),
            "location" | "locations" => Ok(EntityKind::Location),
            _ => Err(DataError::UnknownKind(s.to_owned())),
        }
    }
}

/// `active | inactive`, shared by clans and locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveStatus {
    #[default]
    Active,
    Inactive,
}

/// Behaviour every stored record shares.
///
/// Records are flat json objects on every tier. The store only ever talks
/// to them through this trait.
pub trait Record:
    Serialize + DeserializeOwned + Clone + fmt::Debug + Send + Sync + 'static
{
    /// Which kind of record this is.
    const KIND: EntityKind;

    /// `None` until the store assigns one.
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: String);

    /// Title or name, used for logs and listings.
    fn label(&self) -> &str;

    fn created_at(&self) -> Option<DateTime<Utc>>;

    /// Stamp the record as written at `now`.
    ///
    /// `created_at` is only set when missing, `updated_at` always advances.
    fn touch(&mut self, now: DateTime<Utc>);

    /// Reject malformed input before any persistence attempt.
    fn validate(&self) -> Result<(), DataError>;

    /// Built-in content used when no tier has any records.
    fn seed() -> Vec<Self>;

    /// Called once for a record that is about to be created, with the
    /// records already known locally.
    fn prepare_new(&mut self, _existing: &[Self]) -> Result<(), DataError> {
        Ok(())
    }

    /// Display order of a list of records.
    fn sort(_records: &mut [Self]) {}

    fn has_id(&self, id: &str) -> bool {
        self.id() == Some(id)
    }
}
