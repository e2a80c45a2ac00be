// store.rs
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

//! Reads and writes across the remote and local tiers.
//!
//! The remote, when it answers, is the source of truth. The local cache is
//! both the offline fallback and the durable backup, so every write lands
//! there whatever happened remotely. Nothing here retries: each call finds
//! out again whether the remote is reachable.

use serde::Serialize;

use std::fmt;

use crate::cache::LocalCache;
use crate::config::StoreConfig;
use crate::database::Database;
use crate::errors::{DataError, RemoteError};
use crate::models::{Clan, EntityKind, Episode, Location, Record};
use crate::notify::{Change, ChangeEvent, ChangeNotifier, ChangeSubscription};
use crate::remote::RemoteBackend;
use crate::utils;

/// How the caller wants a record persisted remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteIntent {
    /// A new record, `POST /{kind}`.
    Create,
    /// An existing record, `PUT /{kind}/{id}`. The record must carry its id.
    Update,
    /// Update if the remote knows the id, create otherwise.
    #[default]
    Upsert,
}

/// Where a saved record ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// Remote and local cache.
    Everywhere,
    /// Only the local cache. The record will not show up on other devices.
    LocalOnly { reason: String },
}

impl SyncStatus {
    pub fn is_everywhere(&self) -> bool {
        matches!(self, SyncStatus::Everywhere)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Everywhere => write!(f, "saved everywhere"),
            SyncStatus::LocalOnly { reason } => write!(
                f,
                "saved locally only, will not sync across devices: {reason}"
            ),
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone)]
pub struct SaveOutcome<T> {
    /// The record as stored, with its id and timestamps filled in.
    pub record: T,
    pub sync: SyncStatus,
}

/// Summary of a multi-record write. Nothing is rolled back.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub synced: usize,
    pub local_only: usize,
    /// Id (or title, for records without one) and the reason.
    pub failed: Vec<(String, DataError)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every record saved everywhere.
    Complete,
    /// Every record saved, some only locally.
    LocalOnly,
    /// Some records were not saved at all.
    Partial,
    /// No record was saved.
    Failed,
}

impl BatchOutcome {
    pub fn saved(&self) -> usize {
        self.synced + self.local_only
    }

    pub fn status(&self) -> BatchStatus {
        match (self.saved(), self.failed.len(), self.local_only) {
            (_, 0, 0) => BatchStatus::Complete,
            (_, 0, _) => BatchStatus::LocalOnly,
            (0, _, _) => BatchStatus::Failed,
            _ => BatchStatus::Partial,
        }
    }
}

/// Every kind at once, what the public site loads on start.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub episodes: Vec<Episode>,
    pub clans: Vec<Clan>,
    pub locations: Vec<Location>,
}

/// The single owner of all content.
///
/// Cheap to clone, clones share the cache, the http client and the
/// notification channel.
#[derive(Debug, Clone)]
pub struct ContentStore {
    cache: LocalCache,
    remote: RemoteBackend,
    notifier: ChangeNotifier,
}

impl ContentStore {
    /// Open the local cache and connect the configured remote.
    pub fn init(config: &StoreConfig) -> Result<Self, DataError> {
        let db = Database::open(&config.database_path)?;
        let remote = RemoteBackend::from_config(config)?;
        info!(
            "Content store ready, cache at {:?}, remote: {}",
            db.path(),
            config.backend
        );
        Ok(Self::with_parts(
            LocalCache::new(db),
            remote,
            ChangeNotifier::new(),
        ))
    }

    pub fn with_parts(cache: LocalCache, remote: RemoteBackend, notifier: ChangeNotifier) -> Self {
        ContentStore {
            cache,
            remote,
            notifier,
        }
    }

    /// Shut down notifications. Subscribers see the end of their stream.
    pub fn dispose(self) {
        self.notifier.close();
        info!("Content store disposed");
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        self.notifier.subscribe()
    }

    pub fn is_local_only(&self) -> bool {
        self.remote.is_local_only()
    }

    /// All records of kind `T`, in display order.
    ///
    /// Remote first, written through to the cache. Then the cache. Then the
    /// built-in seed. This never fails, it only gets staler.
    ///
    /// A remote that answers with an empty list is authoritative: the cache
    /// is emptied to match and the seed is served.
    pub async fn get<T: Record>(&self) -> Vec<T> {
        let mut records = match self.remote.list::<T>().await {
            Ok(remote) => {
                if let Err(err) = self.cache.store(&remote) {
                    error!("Failed to cache remote {} list: {}", T::KIND, err);
                }
                if remote.is_empty() {
                    info!("Remote has no {} records, using the seed content", T::KIND);
                    T::seed()
                } else {
                    remote
                }
            }
            Err(err) => {
                log_remote_failure(&err, &format!("list {}", T::KIND.table()));
                self.local_or_seed()
            }
        };
        T::sort(&mut records);
        records
    }

    fn local_or_seed<T: Record>(&self) -> Vec<T> {
        match self.cache.load::<T>() {
            Ok(records) if !records.is_empty() => records,
            Ok(_) => {
                info!("No {} records anywhere, using the seed content", T::KIND);
                T::seed()
            }
            Err(err) => {
                error!("Local cache unavailable for {}: {}", T::KIND, err);
                T::seed()
            }
        }
    }

    /// One record by id, remote first then the local cache.
    pub async fn find<T: Record>(&self, id: &str) -> Option<T> {
        match self.remote.fetch::<T>(id).await {
            Ok(Some(record)) => {
                if let Err(err) = self.cache.upsert(&record) {
                    error!("Failed to cache {} {}: {}", T::KIND, id, err);
                }
                return Some(record);
            }
            Ok(None) => debug!("Remote has no {} {}", T::KIND, id),
            Err(err) => log_remote_failure(&err, &format!("fetch {} {}", T::KIND, id)),
        }

        match self.cache.load::<T>() {
            Ok(records) => records.into_iter().find(|r| r.has_id(id)),
            Err(err) => {
                error!("Local cache unavailable for {}: {}", T::KIND, err);
                None
            }
        }
    }

    /// Episodes, clans and locations, loaded concurrently.
    pub async fn snapshot(&self) -> Snapshot {
        let (episodes, clans, locations) = futures::join!(
            self.get::<Episode>(),
            self.get::<Clan>(),
            self.get::<Location>()
        );
        Snapshot {
            episodes,
            clans,
            locations,
        }
    }

    /// Overwrite the cached list of `T` with the remote one.
    ///
    /// An empty remote list clears the cache. `Ok(false)` when the remote
    /// could not be read.
    pub async fn refresh<T: Record>(&self) -> Result<bool, DataError> {
        match self.remote.list::<T>().await {
            Ok(remote) => {
                self.cache.store(&remote)?;
                info!("Refreshed {} {} records", remote.len(), T::KIND);
                self.notifier
                    .publish(ChangeEvent::new(T::KIND, Change::Refreshed));
                Ok(true)
            }
            Err(err) => {
                log_remote_failure(&err, &format!("refresh {}", T::KIND.table()));
                Ok(false)
            }
        }
    }

    /// Persist `record` on every tier.
    ///
    /// Fails only for invalid input or when the local cache could not be
    /// written. A remote failure is reported through [`SyncStatus`].
    pub async fn save<T: Record>(
        &self,
        record: T,
        intent: WriteIntent,
    ) -> Result<SaveOutcome<T>, DataError> {
        let outcome = self.persist(record, intent).await?;
        if let Some(id) = outcome.record.id() {
            let change = Change::Saved {
                id: id.to_owned(),
                record: serde_json::to_value(&outcome.record)?,
            };
            self.notifier.publish(ChangeEvent::new(T::KIND, change));
        }
        Ok(outcome)
    }

    async fn persist<T: Record>(
        &self,
        mut record: T,
        intent: WriteIntent,
    ) -> Result<SaveOutcome<T>, DataError> {
        record.validate()?;

        let existing_id = record
            .id()
            .filter(|id| !utils::is_blank(id))
            .map(str::to_owned);
        let (id, fresh) = match existing_id {
            Some(id) => (id, false),
            None if intent == WriteIntent::Update => {
                return Err(DataError::invalid(
                    T::KIND,
                    "an update needs the id of an existing record",
                ))
            }
            None => {
                let id = utils::generate_id(T::KIND);
                record.set_id(id.clone());
                (id, true)
            }
        };

        if fresh || intent == WriteIntent::Create {
            let known = self.cache.load::<T>()?;
            record.prepare_new(&known)?;
        }
        record.touch(utils::now());

        let sync = match self.push(&record, &id, intent, fresh).await {
            Ok(()) => SyncStatus::Everywhere,
            Err(err) => {
                log_remote_failure(&err, &format!("save {} {}", T::KIND, id));
                SyncStatus::LocalOnly {
                    reason: err.to_string(),
                }
            }
        };

        self.cache.upsert(&record)?;
        debug!("Saved {} {} ({:?}), {}", T::KIND, id, record.label(), sync);
        Ok(SaveOutcome { record, sync })
    }

    async fn push<T: Record>(
        &self,
        record: &T,
        id: &str,
        intent: WriteIntent,
        fresh: bool,
    ) -> Result<(), RemoteError> {
        match intent {
            WriteIntent::Create => self.remote.create(record).await,
            WriteIntent::Update => self.remote.update(id, record).await,
            WriteIntent::Upsert if fresh => self.remote.create(record).await,
            WriteIntent::Upsert => match self.remote.update(id, record).await {
                Err(err) if err.is_not_found() => {
                    debug!("Remote does not know {} {} yet, creating it", T::KIND, id);
                    self.remote.create(record).await
                }
                other => other,
            },
        }
    }

    /// Remove record `id` of kind `T` from every tier.
    ///
    /// Returns whether the local cache held it. Deleting an unknown id is
    /// not an error.
    pub async fn delete<T: Record>(&self, id: &str) -> Result<bool, DataError> {
        if let Err(err) = self.remote.delete(T::KIND, id).await {
            log_remote_failure(&err, &format!("delete {} {}", T::KIND, id));
        }

        let removed = self.cache.remove::<T>(id)?;
        if removed {
            info!("Deleted {} {}", T::KIND, id);
            let change = Change::Deleted { id: id.to_owned() };
            self.notifier.publish(ChangeEvent::new(T::KIND, change));
        }
        Ok(removed)
    }

    /// Save `episodes` with `episode_order` following their position, from 1.
    ///
    /// Each episode is saved on its own, so a failure part way leaves the
    /// earlier ones in their new place.
    pub async fn reorder_episodes(&self, episodes: Vec<Episode>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for (position, mut episode) in (1..).zip(episodes) {
            episode.episode_order = position;
            let name = episode.id.clone().unwrap_or_else(|| episode.title.clone());

            match self.persist(episode, WriteIntent::Upsert).await {
                Ok(SaveOutcome {
                    sync: SyncStatus::Everywhere,
                    ..
                }) => outcome.synced += 1,
                Ok(_) => outcome.local_only += 1,
                Err(err) => {
                    warn!("Failed to reorder episode {}: {}", name, err);
                    outcome.failed.push((name, err));
                }
            }
        }

        let count = outcome.saved();
        self.notifier.publish(ChangeEvent::new(
            EntityKind::Episode,
            Change::Reordered { count },
        ));
        info!("Reordered episodes: {:?}", outcome.status());
        outcome
    }
}

fn log_remote_failure(err: &RemoteError, context: &str) {
    if err.is_disabled() {
        debug!("Remote skipped for {}, local-only", context);
    } else {
        warn!("Remote {} failed, using the local cache: {}", context, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::temp_db;
    use crate::models::{ClanBuilder, EpisodeBuilder, EpisodeStatus};
    use crate::test_server::*;
    use anyhow::Result;
    use http_test_server::http::{Method as MockMethod, Status};
    use http_test_server::TestServer;
    use pretty_assertions::assert_eq;
    use tempfile::NamedTempFile;

    fn store_with(remote: RemoteBackend) -> Result<(ContentStore, NamedTempFile)> {
        let (db, tempfile) = temp_db()?;
        let store = ContentStore::with_parts(LocalCache::new(db), remote, ChangeNotifier::new());
        Ok((store, tempfile))
    }

    fn local_store() -> Result<(ContentStore, NamedTempFile)> {
        store_with(RemoteBackend::local_only())
    }

    fn episode(title: &str) -> Result<Episode> {
        Ok(EpisodeBuilder::default()
            .title(title)
            .meta_description("D")
            .content("<p>X</p>")
            .build()?)
    }

    fn titles(episodes: &[Episode]) -> Vec<&str> {
        episodes.iter().map(|e| e.title.as_str()).collect()
    }

    #[test]
    fn test_get_falls_back_to_seed() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let episodes = rt.block_on(store.get::<Episode>());
        assert_eq!(crate::seed::episodes(), episodes);
        assert_eq!(3, rt.block_on(store.get::<Clan>()).len());
        // the seed is handed out, never cached
        assert!(store.cache.load::<Episode>()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_create_get_delete() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let saved = rt.block_on(store.save(episode("T")?, WriteIntent::Create))?;
        let id = saved.record.id.clone().unwrap_or_default();
        assert!(id.starts_with("ep_"), "{id}");
        assert!(!saved.sync.is_everywhere());
        assert!(saved.record.created_at.is_some());
        assert_eq!(saved.record.created_at, saved.record.updated_at);

        let episodes = rt.block_on(store.get::<Episode>());
        assert_eq!(vec!["T"], titles(&episodes));

        assert!(rt.block_on(store.delete::<Episode>(&id))?);
        let episodes = rt.block_on(store.get::<Episode>());
        assert!(!titles(&episodes).contains(&"T"));
        Ok(())
    }

    #[test]
    fn test_resave_keeps_identity() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let first = rt.block_on(store.save(episode("T")?, WriteIntent::Upsert))?;
        let mut edited = first.record.clone();
        edited.content = "<p>Y</p>".to_owned();
        let second = rt.block_on(store.save(edited, WriteIntent::Upsert))?;

        assert_eq!(first.record.id, second.record.id);
        assert_eq!(first.record.created_at, second.record.created_at);
        assert!(second.record.updated_at >= first.record.updated_at);
        assert_eq!(first.record.episode_order, second.record.episode_order);

        let cached = store.cache.load::<Episode>()?;
        assert_eq!(1, cached.len());
        assert_eq!("<p>Y</p>", cached[0].content);
        Ok(())
    }

    #[test]
    fn test_resave_unchanged_round_trips() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut draft = episode("Round Trip")?;
        draft.image_url = Some("https://img.example.com/crypt.jpg".to_owned());
        draft.status = EpisodeStatus::Published;
        let first = rt.block_on(store.save(draft, WriteIntent::Upsert))?;
        let second = rt.block_on(store.save(first.record.clone(), WriteIntent::Upsert))?;

        // only updated_at may move
        let mut expected = second.record.clone();
        expected.updated_at = first.record.updated_at;
        assert_eq!(first.record, expected);

        assert_eq!(vec![second.record], store.cache.load::<Episode>()?);
        Ok(())
    }

    #[test]
    fn test_invalid_input_is_not_persisted() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;
        let mut sub = store.subscribe();

        let blank = EpisodeBuilder::default().title("  ").build()?;
        match rt.block_on(store.save(blank, WriteIntent::Create)) {
            Err(DataError::InvalidRecord { kind, .. }) => assert_eq!(EntityKind::Episode, kind),
            other => panic!("unexpected {other:?}"),
        }

        // an update has to name what it updates
        let no_id = ClanBuilder::default().name("Nameless").build()?;
        assert!(rt.block_on(store.save(no_id, WriteIntent::Update)).is_err());

        assert!(store.cache.load::<Episode>()?.is_empty());
        assert!(store.cache.load::<Clan>()?.is_empty());
        assert_eq!(None, sub.try_recv());
        Ok(())
    }

    #[test]
    fn test_delete_unknown_id() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(store.save(episode("Kept")?, WriteIntent::Create))?;
        let mut sub = store.subscribe();

        assert!(!rt.block_on(store.delete::<Episode>("ep_missing"))?);
        assert_eq!(1, store.cache.load::<Episode>()?.len());
        assert_eq!(None, sub.try_recv());
        Ok(())
    }

    #[test]
    fn test_new_episode_goes_last() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let a = rt.block_on(store.save(episode("A")?, WriteIntent::Create))?;
        let b = rt.block_on(store.save(episode("B")?, WriteIntent::Create))?;
        assert_eq!(1, a.record.episode_order);
        assert_eq!(2, b.record.episode_order);

        // an explicit order is left alone
        let mut placed = episode("C")?;
        placed.episode_order = 7;
        let c = rt.block_on(store.save(placed, WriteIntent::Create))?;
        assert_eq!(7, c.record.episode_order);
        Ok(())
    }

    #[test]
    fn test_new_episode_after_max_order() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut last = episode("Last")?;
        last.id = Some("ep_last".to_owned());
        last.episode_order = i32::MAX;
        store.cache.store(&[last])?;

        match rt.block_on(store.save(episode("Overflow")?, WriteIntent::Create)) {
            Err(DataError::InvalidRecord { kind, .. }) => assert_eq!(EntityKind::Episode, kind),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(1, store.cache.load::<Episode>()?.len());
        Ok(())
    }

    #[test]
    fn test_concurrent_saves() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(8)
            .enable_all()
            .build()?;

        rt.block_on(async {
            let tasks: Vec<_> = (0..40)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move {
                        let clan = ClanBuilder::default().name(format!("Clan {i}")).build()?;
                        store.save(clan, WriteIntent::Create).await?;
                        Ok::<_, anyhow::Error>(())
                    })
                })
                .collect();
            for task in tasks {
                task.await??;
            }
            Ok::<_, anyhow::Error>(())
        })?;

        assert_eq!(40, store.cache.load::<Clan>()?.len());
        Ok(())
    }

    #[test]
    fn test_failing_remote_reads_cache() -> Result<()> {
        let server = failing_server()?;
        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        // nothing cached yet
        assert_eq!(crate::seed::locations(), rt.block_on(store.get::<Location>()));

        let mut cached = vec![episode("Second")?, episode("First")?];
        cached[0].id = Some("ep_2".to_owned());
        cached[0].episode_order = 2;
        cached[1].id = Some("ep_1".to_owned());
        cached[1].episode_order = 1;
        store.cache.store(&cached)?;

        let episodes = rt.block_on(store.get::<Episode>());
        assert_eq!(vec!["First", "Second"], titles(&episodes));
        Ok(())
    }

    #[test]
    fn test_unreachable_remote_saves_locally() -> Result<()> {
        let remote = RemoteBackend::table(&closed_port_url()?, TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let saved = rt.block_on(store.save(episode("Offline")?, WriteIntent::Upsert))?;
        match &saved.sync {
            SyncStatus::LocalOnly { reason } => assert!(!reason.is_empty()),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(vec!["Offline"], titles(&rt.block_on(store.get::<Episode>())));
        Ok(())
    }

    #[test]
    fn test_server_error_saves_clan_locally() -> Result<()> {
        let server = failing_server()?;
        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let clan = ClanBuilder::default().name("The Lamplighters").build()?;
        let saved = rt.block_on(store.save(clan, WriteIntent::Create))?;
        let id = saved.record.id.clone().unwrap_or_default();
        assert!(id.starts_with("clan_"), "{id}");
        assert!(matches!(saved.sync, SyncStatus::LocalOnly { .. }));

        let clans = rt.block_on(store.get::<Clan>());
        assert_eq!(1, clans.len());
        assert_eq!(Some(id.as_str()), clans[0].id());
        Ok(())
    }

    #[test]
    fn test_remote_read_is_written_through() -> Result<()> {
        let server = TestServer::new()?;
        server
            .create_resource("/tables/episodes")
            .status(Status::OK)
            .header("Content-Type", "application/json")
            .body(TWO_EPISODES);

        let (db, _tempfile) = temp_db()?;
        let online = ContentStore::with_parts(
            LocalCache::new(db.clone()),
            RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?,
            ChangeNotifier::new(),
        );
        let rt = tokio::runtime::Runtime::new()?;
        let first = rt.block_on(online.get::<Episode>());
        assert_eq!(vec!["Remote One", "Remote Two"], titles(&first));

        let offline = ContentStore::with_parts(
            LocalCache::new(db),
            RemoteBackend::table(&closed_port_url()?, TEST_TIMEOUT)?,
            ChangeNotifier::new(),
        );
        assert_eq!(first, rt.block_on(offline.get::<Episode>()));
        Ok(())
    }

    #[test]
    fn test_upsert_creates_when_remote_lacks_id() -> Result<()> {
        let server = TestServer::new()?;
        server
            .create_resource("/tables/episodes")
            .status(Status::Created)
            .method(MockMethod::POST)
            .header("Content-Type", "application/json")
            .body(r#"{"id": "ep_known"}"#);
        server
            .create_resource("/tables/episodes/ep_known")
            .status(Status::NotFound)
            .method(MockMethod::PUT);

        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut record = episode("Imported")?;
        record.id = Some("ep_known".to_owned());
        // PUT /tables/episodes/ep_known is a 404, the POST goes through
        let saved = rt.block_on(store.save(record.clone(), WriteIntent::Upsert))?;
        assert_eq!(SyncStatus::Everywhere, saved.sync);

        // a plain update does not fall back
        let saved = rt.block_on(store.save(record, WriteIntent::Update))?;
        assert!(!saved.sync.is_everywhere());
        assert_eq!(1, store.cache.load::<Episode>()?.len());
        Ok(())
    }

    #[test]
    fn test_hosted_upsert_creates_when_nothing_matched() -> Result<()> {
        let server = TestServer::new()?;
        let requests = server.requests();
        // the filtered PATCH matched no row, which is still a 200
        server
            .create_resource("/rest/v1/episodes")
            .status(Status::OK)
            .method(MockMethod::PATCH)
            .body("");
        server
            .create_resource("/rest/v1/episodes")
            .status(Status::Created)
            .method(MockMethod::POST)
            .header("Content-Type", "application/json")
            .body(r#"[{"id": "ep_offline", "title": "Written offline"}]"#);

        let remote = RemoteBackend::hosted(&mock_url(&server), "anon", TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut record = episode("Written offline")?;
        record.id = Some("ep_offline".to_owned());
        let saved = rt.block_on(store.save(record.clone(), WriteIntent::Upsert))?;
        assert_eq!(SyncStatus::Everywhere, saved.sync);
        assert_eq!("PATCH", requests.recv()?.method);
        assert_eq!("POST", requests.recv()?.method);

        // without the fallback the same answer means the remote was not written
        let saved = rt.block_on(store.save(record, WriteIntent::Update))?;
        assert!(!saved.sync.is_everywhere());
        Ok(())
    }

    #[test]
    fn test_empty_remote_list_clears_cache() -> Result<()> {
        let server = TestServer::new()?;
        server
            .create_resource("/tables/episodes")
            .status(Status::OK)
            .header("Content-Type", "application/json")
            .body(r#"{"data": [], "total": 0}"#);

        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut stale = episode("Deleted elsewhere")?;
        stale.id = Some("ep_stale".to_owned());
        store.cache.store(&[stale.clone()])?;

        assert_eq!(crate::seed::episodes(), rt.block_on(store.get::<Episode>()));
        assert!(store.cache.load::<Episode>()?.is_empty());

        store.cache.store(&[stale])?;
        let mut sub = store.subscribe();
        assert!(rt.block_on(store.refresh::<Episode>())?);
        assert!(store.cache.load::<Episode>()?.is_empty());
        assert_eq!(Some(Change::Refreshed), sub.try_recv().map(|e| e.change));
        Ok(())
    }

    #[test]
    fn test_find() -> Result<()> {
        let server = TestServer::new()?;
        server
            .create_resource("/tables/clans/clan_remote")
            .status(Status::OK)
            .header("Content-Type", "application/json")
            .body(r##"{"id": "clan_remote", "name": "Tidewardens", "color_primary": "#123"}"##);

        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let rt = tokio::runtime::Runtime::new()?;

        let found = rt.block_on(store.find::<Clan>("clan_remote"));
        assert_eq!(Some("Tidewardens".to_owned()), found.map(|c| c.name));
        // and it is now cached
        assert_eq!(1, store.cache.load::<Clan>()?.len());

        let local = ClanBuilder::default()
            .id("clan_local".to_owned())
            .name("Hearthkeepers")
            .build()?;
        store.cache.upsert(&local)?;
        assert_eq!(Some(local), rt.block_on(store.find::<Clan>("clan_local")));
        assert_eq!(None, rt.block_on(store.find::<Clan>("clan_nowhere")));
        Ok(())
    }

    #[test]
    fn test_refresh() -> Result<()> {
        let server = TestServer::new()?;
        server
            .create_resource("/tables/episodes")
            .status(Status::OK)
            .header("Content-Type", "application/json")
            .body(TWO_EPISODES);

        let remote = RemoteBackend::table(&mock_url(&server), TEST_TIMEOUT)?;
        let (store, _tempfile) = store_with(remote)?;
        let mut sub = store.subscribe();
        let rt = tokio::runtime::Runtime::new()?;

        assert!(rt.block_on(store.refresh::<Episode>())?);
        assert_eq!(2, store.cache.load::<Episode>()?.len());
        assert_eq!(Some(Change::Refreshed), sub.try_recv().map(|e| e.change));

        // clans are a 404, the cache is left alone
        assert!(!rt.block_on(store.refresh::<Clan>())?);

        let (local, _tempfile) = local_store()?;
        assert!(!rt.block_on(local.refresh::<Episode>())?);
        Ok(())
    }

    #[test]
    fn test_corrupt_cache_serves_seed() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        store
            .cache
            .set_raw(EntityKind::Clan.cache_key(), "{not json")?;

        let rt = tokio::runtime::Runtime::new()?;
        assert_eq!(crate::seed::clans(), rt.block_on(store.get::<Clan>()));
        Ok(())
    }

    #[test]
    fn test_reorder() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let mut saved = vec![];
        for title in ["A", "B", "C"] {
            saved.push(rt.block_on(store.save(episode(title)?, WriteIntent::Create))?.record);
        }
        let mut sub = store.subscribe();

        let new_order = vec![saved[2].clone(), saved[0].clone(), saved[1].clone()];
        let outcome = rt.block_on(store.reorder_episodes(new_order));
        assert_eq!(BatchStatus::LocalOnly, outcome.status());
        assert_eq!(3, outcome.local_only);

        let episodes = rt.block_on(store.get::<Episode>());
        assert_eq!(vec!["C", "A", "B"], titles(&episodes));
        let orders: Vec<_> = episodes.iter().map(|e| e.episode_order).collect();
        assert_eq!(vec![1, 2, 3], orders);

        // one notification for the whole batch
        assert_eq!(
            Some(Change::Reordered { count: 3 }),
            sub.try_recv().map(|e| e.change)
        );
        assert_eq!(None, sub.try_recv());
        Ok(())
    }

    #[test]
    fn test_reorder_partial_failure() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let rt = tokio::runtime::Runtime::new()?;

        let good = rt.block_on(store.save(episode("Good")?, WriteIntent::Create))?.record;
        let mut broken = good.clone();
        broken.id = Some("ep_broken".to_owned());
        broken.title = String::new();

        let outcome = rt.block_on(store.reorder_episodes(vec![broken.clone(), good]));
        assert_eq!(BatchStatus::Partial, outcome.status());
        assert_eq!(1, outcome.saved());
        assert_eq!("ep_broken", outcome.failed[0].0);

        let outcome = rt.block_on(store.reorder_episodes(vec![broken]));
        assert_eq!(BatchStatus::Failed, outcome.status());
        Ok(())
    }

    #[test]
    fn test_batch_status() {
        let mut outcome = BatchOutcome::default();
        assert_eq!(BatchStatus::Complete, outcome.status());
        outcome.synced = 2;
        assert_eq!(BatchStatus::Complete, outcome.status());
        outcome.local_only = 1;
        assert_eq!(BatchStatus::LocalOnly, outcome.status());
        outcome
            .failed
            .push(("ep_1".to_owned(), DataError::UnknownKind("x".to_owned())));
        assert_eq!(BatchStatus::Partial, outcome.status());

        let failed = BatchOutcome {
            failed: vec![("ep_1".to_owned(), DataError::UnknownKind("x".to_owned()))],
            ..Default::default()
        };
        assert_eq!(BatchStatus::Failed, failed.status());
    }

    #[test]
    fn test_change_notifications() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let mut sub = store.subscribe();
        let rt = tokio::runtime::Runtime::new()?;

        let saved = rt.block_on(store.save(episode("Heard")?, WriteIntent::Create))?;
        let id = saved.record.id.clone().unwrap_or_default();
        let event = sub.try_recv();
        match event.map(|e| (e.kind, e.change)) {
            Some((EntityKind::Episode, Change::Saved { id: saved_id, record })) => {
                assert_eq!(id, saved_id);
                assert_eq!("Heard", record["title"]);
            }
            other => panic!("unexpected {other:?}"),
        }

        rt.block_on(store.delete::<Episode>(&id))?;
        assert_eq!(
            Some(Change::Deleted { id }),
            sub.try_recv().map(|e| e.change)
        );
        Ok(())
    }

    #[test]
    fn test_dispose_ends_subscriptions() -> Result<()> {
        let (store, _tempfile) = local_store()?;
        let mut sub = store.subscribe();
        let rt = tokio::runtime::Runtime::new()?;
        store.dispose();
        assert_eq!(None, rt.block_on(sub.recv()));
        Ok(())
    }

    #[test]
    fn test_snapshot_and_init() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = StoreConfig::local_only(dir.path().join("nested").join("content.db"));
        let store = ContentStore::init(&config)?;
        assert!(store.is_local_only());

        let rt = tokio::runtime::Runtime::new()?;
        let snapshot = rt.block_on(store.snapshot());
        assert_eq!(3, snapshot.episodes.len());
        assert_eq!(3, snapshot.clans.len());
        assert_eq!(3, snapshot.locations.len());
        store.dispose();
        Ok(())
    }
}
