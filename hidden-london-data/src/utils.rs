// utils.rs
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

//! Helper utilities for accomplishing various tasks.

use chrono::{DateTime, SubsecRound, Utc};

use std::sync::atomic::{AtomicU32, Ordering};

use crate::models::EntityKind;

static ID_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Current time, truncated to what survives a trip through the cache.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Synthesize a new record id: the kind prefix followed by a time based token.
///
/// The sequence suffix keeps ids distinct when several records are created
/// within the same millisecond.
pub(crate) fn generate_id(kind: EntityKind) -> String {
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed) % 1000;
    format!(
        "{}_{}{:03}",
        kind.id_prefix(),
        Utc::now().timestamp_millis(),
        seq
    )
}

/// `#rgb` or `#rrggbb`.
pub(crate) fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Serde glue for the `created_at`/`updated_at` fields.
///
/// Always writes RFC 3339. Reads RFC 3339, the naive `%Y-%m-%dT%H:%M:%S`
/// form, or epoch milliseconds, which is what the table API hands out.
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::de::{self, Deserializer};
    use serde::ser::Serializer;
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Float(f64),
        Text(String),
    }

    pub(crate) fn serialize<S>(dt: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match dt {
            Some(dt) => serializer.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = match Option::<Raw>::deserialize(deserializer)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match raw {
            Raw::Millis(ms) => DateTime::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Float(ms) => DateTime::from_timestamp_millis(ms as i64)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Text(buf) if buf.is_empty() => Ok(None),
            Raw::Text(buf) => DateTime::parse_from_rfc3339(&buf)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    chrono::NaiveDateTime::parse_from_str(&buf, "%Y-%m-%dT%H:%M:%S")
                        .map(|d| DateTime::from_naive_utc_and_offset(d, Utc))
                })
                .map(Some)
                .map_err(de::Error::custom),
        }
    }
}
