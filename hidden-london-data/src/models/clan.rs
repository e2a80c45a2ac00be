// clan.rs
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

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::errors::DataError;
use crate::models::{ActiveStatus, EntityKind, Record};
use crate::utils::{is_blank, is_hex_color};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Builder)]
#[serde(default)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
/// One of the hidden clans of London, each bound to a stone.
pub struct Clan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub stone_description: String,
    pub offering: String,
    pub resonance_note: String,
    pub color_primary: String,
    pub color_secondary: String,
    pub emblem_url: Option<String>,
    pub logo_url: Option<String>,
    pub status: ActiveStatus,
    #[serde(with = "crate::utils::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::utils::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for Clan {
    fn default() -> Self {
        Clan {
            id: None,
            name: String::new(),
            stone_description: String::new(),
            offering: String::new(),
            resonance_note: String::new(),
            color_primary: "#2c2416".to_owned(),
            color_secondary: "#c9a96e".to_owned(),
            emblem_url: None,
            logo_url: None,
            status: ActiveStatus::Active,
            created_at: None,
            updated_at: None,
        }
    }
}

impl Record for Clan {
    const KIND: EntityKind = EntityKind::Clan;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }

    fn validate(&self) -> Result<(), DataError> {
        if is_blank(&self.name) {
            return Err(DataError::invalid(Self::KIND, "name is required"));
        }
        for (field, value) in [
            ("color_primary", &self.color_primary),
            ("color_secondary", &self.color_secondary),
        ] {
            if !is_hex_color(value) {
                return Err(DataError::invalid(
                    Self::KIND,
                    format!("{field} is not a hex colour: {value:?}"),
                ));
            }
        }
        Ok(())
    }

    fn seed() -> Vec<Self> {
        crate::seed::clans()
    }

    fn sort(records: &mut [Self]) {
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
}
