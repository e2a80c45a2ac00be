// location.rs
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
use crate::utils::is_blank;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Builder)]
#[serde(default)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
/// A place on the map where the hidden world shows through.
pub struct Location {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    /// Set together with `longitude`, or not at all.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub magical_description: String,
    pub what_to_look_for: String,
    pub image_url: Option<String>,
    pub status: ActiveStatus,
    #[serde(with = "crate::utils::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::utils::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Location {
    /// `(latitude, longitude)` when the location can be put on a map.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

impl Record for Location {
    const KIND: EntityKind = EntityKind::Location;

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
        match (self.latitude, self.longitude) {
            (None, None) => Ok(()),
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    Err(DataError::invalid(
                        Self::KIND,
                        format!("latitude out of range: {lat}"),
                    ))
                } else if !(-180.0..=180.0).contains(&lng) {
                    Err(DataError::invalid(
                        Self::KIND,
                        format!("longitude out of range: {lng}"),
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Err(DataError::invalid(
                Self::KIND,
                "latitude and longitude must be set together",
            )),
        }
    }

    fn seed() -> Vec<Self> {
        crate::seed::locations()
    }

    fn sort(records: &mut [Self]) {
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
}
