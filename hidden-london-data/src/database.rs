// database.rs
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

//! Database Setup for the local cache.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, PooledConnection};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use std::path::{Path, PathBuf};

use crate::errors::DataError;

pub(crate) type Pool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/");

/// How long a connection waits for another writer before giving up.
const BUSY_TIMEOUT_MS: u32 = 5000;

/// Settings applied to every pooled connection.
///
/// Clones of the store write from several threads at once. WAL keeps readers
/// off the writers' lock and the busy timeout makes writers queue instead of
/// failing with "database is locked".
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    busy_timeout_ms: u32,
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Handle to the sqlite file backing the local cache.
///
/// Cloning is cheap, every clone shares the same connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    path: PathBuf,
    pool: Pool,
}

impl Database {
    /// Open (or create) the database at `path` and bring its schema up to date.
    pub fn open(path: &Path) -> Result<Self, DataError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_path = path
            .to_str()
            .ok_or_else(|| DataError::Config(format!("Non utf-8 database path: {path:?}")))?;
        let pool = init_pool(db_path)?;

        Ok(Database {
            path: path.to_owned(),
            pool,
        })
    }

    /// Path of the underlying sqlite file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get an r2d2 `SqliteConnection`.
    pub(crate) fn connection(
        &self,
    ) -> Result<PooledConnection<ConnectionManager<SqliteConnection>>, DataError> {
        self.pool.get().map_err(From::from)
    }
}

fn init_pool(db_path: &str) -> Result<Pool, DataError> {
    let manager = ConnectionManager::<SqliteConnection>::new(db_path);
    let pool = r2d2::Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions {
            busy_timeout_ms: BUSY_TIMEOUT_MS,
        }))
        .build(manager)?;

    {
        let mut db = pool.get()?;
        run_migration_on(&mut db)?;
    }
    info!("Database pool initialized.");
    Ok(pool)
}

fn run_migration_on(conn: &mut SqliteConnection) -> Result<(), DataError> {
    info!("Running DB Migrations...");
    conn.run_pending_migrations(MIGRATIONS)
        .map(|_| ())
        .map_err(|err| DataError::DieselMigrationError(err.to_string()))
}

/// Create a fresh database in a temp file.
///
/// Keep the returned `NamedTempFile` alive for as long as the database is used.
#[cfg(test)]
pub(crate) fn temp_db() -> Result<(Database, tempfile::NamedTempFile), DataError> {
    let file = tempfile::Builder::new()
        .suffix("-hidden-london.db")
        .tempfile()?;
    let db = Database::open(file.path())?;
    Ok((db, file))
}
