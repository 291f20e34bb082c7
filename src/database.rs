use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::dota2::MatchRecord;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] clickhouse::error::Error),
}

/// Append-only collection of saved matches.
#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Inserts every record, returning the generated ids in insertion order.
    async fn save_many(&self, records: &[MatchRecord]) -> Result<Vec<Uuid>, StoreError>;

    async fn list_all(&self) -> Result<Vec<MatchRecord>, StoreError>;
}

#[derive(Row, Serialize, Deserialize)]
struct SavedMatch {
    #[serde(with = "clickhouse::serde::uuid")]
    id: Uuid,
    match_id: u64,
    winner: String,
    duration: String,
    lobby_type: String,
    game_mode: String,
}

impl SavedMatch {
    fn new(id: Uuid, record: &MatchRecord) -> Self {
        Self {
            id,
            match_id: record.match_id,
            winner: record.winner.clone(),
            duration: record.duration.clone(),
            lobby_type: record.lobby_type.clone(),
            game_mode: record.game_mode.clone(),
        }
    }
}

pub struct Database {
    table: String,
    client: Client,
}

impl Database {
    pub async fn new(
        server: &str,
        database: &str,
        table: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, StoreError> {
        let table = table.to_string();
        let client = Client::default().with_url(server);

        let client = match user {
            Some(user) => client.with_user(user),
            _ => client,
        };

        let client = match password {
            Some(password) => client.with_password(password),
            _ => client,
        };

        // create database if not exists
        let query = format!("CREATE DATABASE IF NOT EXISTS {};", database);
        client.query(&query).execute().await?;

        let client = client.with_database(database);

        let query = format!(
            "CREATE TABLE IF NOT EXISTS {}.{} (
                    id UUID,
                    match_id UInt64,
                    winner String,
                    duration String,
                    lobby_type String,
                    game_mode String,
                )
                ENGINE = MergeTree()
                ORDER BY id;",
            database, table
        );
        client.query(&query).execute().await?;

        log::info!("using table {}.{}", database, table);
        Ok(Self { table, client })
    }
}

#[async_trait]
impl MatchStore for Database {
    async fn save_many(&self, records: &[MatchRecord]) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::with_capacity(records.len());
        let mut insert = self.client.insert(&self.table)?;
        for record in records {
            let id = Uuid::new_v4();
            insert.write(&SavedMatch::new(id, record)).await?;
            ids.push(id);
        }
        insert.end().await?;
        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let query = format!("SELECT ?fields FROM {}", self.table);
        let matches = self
            .client
            .query(&query)
            .fetch_all::<MatchRecord>()
            .await?;
        Ok(matches)
    }
}

/// In-process store used to exercise the routes without a database.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    rows: std::sync::Mutex<Vec<(Uuid, MatchRecord)>>,
    inserts: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryStore {
    pub fn insert_calls(&self) -> usize {
        self.inserts.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl MatchStore for MemoryStore {
    async fn save_many(&self, records: &[MatchRecord]) -> Result<Vec<Uuid>, StoreError> {
        self.inserts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        let ids: Vec<Uuid> = records.iter().map(|_| Uuid::new_v4()).collect();
        rows.extend(ids.iter().copied().zip(records.iter().cloned()));
        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<MatchRecord>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().map(|(_, record)| record.clone()).collect())
    }
}
