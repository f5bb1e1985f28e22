// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the durable store traits.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use pitwall_config::StorageConfig;
use pitwall_core::{
    AdapterType, HealthStatus, KnowledgeEntry, KnowledgeStore, KnowledgeType, PitwallError,
    PluginAdapter, UsageEvent, UsageStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed durable store.
///
/// The database is opened lazily on first use and then shared by every
/// caller for the life of the process.
pub struct SqliteStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStore {
    /// Create a store for the configured path. Nothing is opened yet.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns the database, opening and migrating it on first call.
    pub async fn db(&self) -> Result<&Database, PitwallError> {
        self.db
            .get_or_try_init(|| async {
                debug!(path = %self.config.database_path, "opening durable store");
                Database::open(&self.config.database_path, self.config.wal_mode).await
            })
            .await
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PitwallError> {
        let db = match self.db().await {
            Ok(db) => db,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PitwallError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl UsageStore for SqliteStore {
    async fn insert_event(&self, event: &UsageEvent) -> Result<(), PitwallError> {
        queries::usage::insert_event(self.db().await?, event).await
    }

    async fn count_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<u64, PitwallError> {
        queries::usage::count_events(self.db().await?, subject_id, action, after_ms, until_ms).await
    }

    async fn list_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<Vec<UsageEvent>, PitwallError> {
        queries::usage::list_events(self.db().await?, subject_id, action, after_ms, until_ms).await
    }
}

#[async_trait]
impl KnowledgeStore for SqliteStore {
    async fn upsert_knowledge(&self, entry: &KnowledgeEntry) -> Result<(), PitwallError> {
        queries::knowledge::upsert_knowledge(self.db().await?, entry).await
    }

    async fn get_knowledge(
        &self,
        kind: KnowledgeType,
        id: &str,
    ) -> Result<Option<KnowledgeEntry>, PitwallError> {
        queries::knowledge::get_knowledge(self.db().await?, kind, id).await
    }

    async fn delete_knowledge(&self, kind: KnowledgeType, id: &str) -> Result<bool, PitwallError> {
        queries::knowledge::delete_knowledge(self.db().await?, kind, id).await
    }

    async fn list_knowledge(&self) -> Result<Vec<KnowledgeEntry>, PitwallError> {
        queries::knowledge::list_knowledge(self.db().await?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn sqlite_store_implements_plugin_adapter() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.name(), "sqlite");
        assert_eq!(store.version(), semver::Version::new(0, 1, 0));
        assert_eq!(store.adapter_type(), AdapterType::Storage);
        assert!(!db_path.exists(), "nothing is opened before first use");
    }

    #[tokio::test]
    async fn first_use_opens_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("lazy.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));

        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        assert!(db_path.exists());
        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn usage_store_through_trait_object() {
        use std::sync::Arc;

        let dir = tempdir().unwrap();
        let db_path = dir.path().join("usage.db");
        let store: Arc<dyn UsageStore> =
            Arc::new(SqliteStore::new(make_config(db_path.to_str().unwrap())));

        store.insert_event(&UsageEvent::new("u1", "GENERATE_ARTICLE", 5_000)).await.unwrap();
        store.insert_event(&UsageEvent::new("u1", "GENERATE_ARTICLE", 6_000)).await.unwrap();
        assert_eq!(
            store.count_events("u1", "GENERATE_ARTICLE", 5_000, 6_000).await.unwrap(),
            1
        );
        assert_eq!(
            store.list_events("u1", "GENERATE_ARTICLE", 0, 10_000).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn unopenable_path_reports_unhealthy() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        // A regular file cannot be a parent directory.
        let db_path = blocker.join("pitwall.db");
        let store = SqliteStore::new(make_config(db_path.to_str().unwrap()));
        assert!(matches!(
            store.health_check().await.unwrap(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
