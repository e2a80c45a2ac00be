// cache.rs
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

//! The local tier: a persistent key-value string store.
//!
//! Every entity kind lives under one fixed key, as a json array of records.
//! The raw accessors are glue code for the `cache_entries` table, the typed
//! ones work on whole lists.

use diesel::prelude::*;

use crate::database::Database;
use crate::errors::DataError;
use crate::models::Record;
use crate::schema::cache_entries;

#[derive(Insertable, Queryable, AsChangeset, PartialEq)]
#[diesel(table_name = cache_entries)]
#[diesel(primary_key(key))]
#[derive(Debug, Clone)]
struct CacheEntry {
    key: String,
    value: String,
    /// When the entry was last written. UTC millis.
    updated_at: i64,
}

/// Local cache of every record kind.
#[derive(Debug, Clone)]
pub struct LocalCache {
    db: Database,
}

impl LocalCache {
    pub fn new(db: Database) -> Self {
        LocalCache { db }
    }

    /// Raw value stored under `key`.
    pub fn get_raw(&self, key_: &str) -> Result<Option<String>, DataError> {
        let mut con = self.db.connection()?;
        read_entry(&mut con, key_)
    }

    /// Insert or replace the value stored under `key`.
    pub fn set_raw(&self, key_: &str, value_: &str) -> Result<(), DataError> {
        let mut con = self.db.connection()?;
        write_entry(&mut con, key_, value_)
    }

    /// Returns whether anything was stored under `key`.
    pub fn remove_raw(&self, key_: &str) -> Result<bool, DataError> {
        let mut con = self.db.connection()?;
        delete_entry(&mut con, key_)
    }

    /// Every record of kind `T` held locally.
    ///
    /// An entry that no longer parses is dropped and reported as empty.
    pub fn load<T: Record>(&self) -> Result<Vec<T>, DataError> {
        let mut con = self.db.connection()?;
        load_on(&mut con)
    }

    /// Replace the whole list of kind `T`.
    pub fn store<T: Record>(&self, records: &[T]) -> Result<(), DataError> {
        let mut con = self.db.connection()?;
        store_on(&mut con, records)
    }

    /// Replace the record with the same id, or append it.
    ///
    /// The read and the write share one immediate transaction, so concurrent
    /// upserts of the same kind never drop each other's records.
    pub fn upsert<T: Record>(&self, record: &T) -> Result<(), DataError> {
        let id = record
            .id()
            .ok_or_else(|| DataError::invalid(T::KIND, "cannot cache a record without an id"))?;
        let mut con = self.db.connection()?;

        con.immediate_transaction::<_, DataError, _>(|con| {
            let mut records = load_on::<T>(con)?;
            match records.iter_mut().find(|r| r.has_id(id)) {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
            store_on(con, &records)
        })
    }

    /// Remove the record `id` of kind `T`. Returns whether it was there.
    pub fn remove<T: Record>(&self, id: &str) -> Result<bool, DataError> {
        let mut con = self.db.connection()?;

        con.immediate_transaction::<_, DataError, _>(|con| {
            let mut records = load_on::<T>(con)?;
            let before = records.len();
            records.retain(|r| !r.has_id(id));

            if records.len() == before {
                return Ok(false);
            }
            store_on(con, &records)?;
            Ok(true)
        })
    }

    /// Drop every cached entry.
    pub fn clear(&self) -> Result<(), DataError> {
        use crate::schema::cache_entries::dsl::*;
        let mut con = self.db.connection()?;

        diesel::delete(cache_entries)
            .execute(&mut con)
            .map(|_| ())
            .map_err(From::from)
    }
}

fn read_entry(con: &mut SqliteConnection, key_: &str) -> Result<Option<String>, DataError> {
    use crate::schema::cache_entries::dsl::*;

    cache_entries
        .filter(key.eq(key_))
        .select(value)
        .get_result::<String>(con)
        .optional()
        .map_err(From::from)
}

fn write_entry(con: &mut SqliteConnection, key_: &str, value_: &str) -> Result<(), DataError> {
    use crate::schema::cache_entries::dsl::*;

    let entry = CacheEntry {
        key: key_.to_owned(),
        value: value_.to_owned(),
        updated_at: chrono::Utc::now().timestamp_millis(),
    };

    diesel::insert_into(cache_entries)
        .values(&entry)
        .on_conflict(key)
        .do_update()
        .set(&entry)
        .execute(con)
        .map(|_| ())
        .map_err(From::from)
}

fn delete_entry(con: &mut SqliteConnection, key_: &str) -> Result<bool, DataError> {
    use crate::schema::cache_entries::dsl::*;

    diesel::delete(cache_entries.filter(key.eq(key_)))
        .execute(con)
        .map(|rows| rows > 0)
        .map_err(From::from)
}

fn load_on<T: Record>(con: &mut SqliteConnection) -> Result<Vec<T>, DataError> {
    let cache_key = T::KIND.cache_key();
    let raw = match read_entry(con, cache_key)? {
        Some(raw) => raw,
        None => return Ok(vec![]),
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(records) => Ok(records),
        Err(err) => {
            error!(
                "Local cache entry {} is corrupt, resetting it: {}",
                cache_key, err
            );
            delete_entry(con, cache_key)?;
            Ok(vec![])
        }
    }
}

fn store_on<T: Record>(con: &mut SqliteConnection, records: &[T]) -> Result<(), DataError> {
    let raw = serde_json::to_string(records)?;
    debug!(
        "Caching {} {} records under {}",
        records.len(),
        T::KIND,
        T::KIND.cache_key()
    );
    write_entry(con, T::KIND.cache_key(), &raw)
}
