// episode.rs
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
use crate::models::{EntityKind, Record};
use crate::utils::is_blank;

/// Publication state of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Builder)]
#[serde(default)]
#[builder(default)]
#[builder(derive(Debug))]
#[builder(setter(into))]
/// A chapter of the story, rendered in `episode_order` on the public site.
pub struct Episode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// Short plain text summary, used for the page meta tags.
    pub meta_description: String,
    /// Rich text body, stored as html.
    pub content: String,
    pub image_url: Option<String>,
    pub status: EpisodeStatus,
    /// Display sort key. `0` means "not placed yet".
    pub episode_order: i32,
    #[serde(with = "crate::utils::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(with = "crate::utils::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Episode {
    /// Whether the public site shows this episode.
    pub fn is_published(&self) -> bool {
        self.status == EpisodeStatus::Published
    }
}

impl Record for Episode {
    const KIND: EntityKind = EntityKind::Episode;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn label(&self) -> &str {
        &self.title
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.created_at.get_or_insert(now);
        self.updated_at = Some(now);
    }

    fn validate(&self) -> Result<(), DataError> {
        if is_blank(&self.title) {
            return Err(DataError::invalid(Self::KIND, "title is required"));
        }
        if self.episode_order < 0 {
            return Err(DataError::invalid(
                Self::KIND,
                format!("episode_order must not be negative, got {}", self.episode_order),
            ));
        }
        Ok(())
    }

    fn seed() -> Vec<Self> {
        crate::seed::episodes()
    }

    // Uniqueness of `episode_order` is not enforced here, a new episode
    // just goes after everything known locally.
    fn prepare_new(&mut self, existing: &[Self]) -> Result<(), DataError> {
        if self.episode_order == 0 {
            let last = existing.iter().map(|e| e.episode_order).max().unwrap_or(0);
            self.episode_order = last.checked_add(1).ok_or_else(|| {
                DataError::invalid(
                    Self::KIND,
                    format!("no episode_order left after {last}, reorder the episodes first"),
                )
            })?;
        }
        Ok(())
    }

    fn sort(records: &mut [Self]) {
        records.sort_by(|a, b| {
            a.episode_order
                .cmp(&b.episode_order)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
    }
}
