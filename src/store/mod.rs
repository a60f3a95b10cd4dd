//! C1 — the embedded relational store (spec §4.1).
//!
//! A single SQLite database backs episodes, transcripts, summaries,
//! download-success history, and the failure log. The store is the only
//! piece of shared mutable state in the pipeline; every operation is a
//! single statement (or a short transaction) so callers never hold the
//! connection across network I/O.

pub mod episodes;
pub mod failures;
pub mod history;
pub mod models;
pub mod schema;

use std::path::Path;
use std::sync::Arc;

use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::config::Mode;
use crate::podcast::models::Episode;

pub use models::{FailureRecord, StoreError, SummaryRecord, TranscriptRecord, TranscriptSource};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(models::classify_sqlite_error)?;
        schema::create_or_migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(models::classify_sqlite_error)?;
        schema::create_or_migrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn upsert_episode(&self, ep: &Episode) -> Result<i64, StoreError> {
        let conn = self.conn.lock().await;
        episodes::upsert_episode(&conn, ep)
    }

    pub async fn get_transcript(
        &self,
        podcast: &str,
        title: &str,
        published: i64,
        mode: Mode,
    ) -> Result<Option<TranscriptRecord>, StoreError> {
        let conn = self.conn.lock().await;
        episodes::get_transcript(&conn, podcast, title, published, mode)
    }

    pub async fn save_transcript(
        &self,
        podcast: &str,
        title: &str,
        published: i64,
        mode: Mode,
        text: &str,
        source: TranscriptSource,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        episodes::save_transcript(&conn, podcast, title, published, mode, text, source)
    }

    pub async fn get_summary(
        &self,
        podcast: &str,
        title: &str,
        published: i64,
        mode: Mode,
    ) -> Result<SummaryRecord, StoreError> {
        let conn = self.conn.lock().await;
        episodes::get_summary(&conn, podcast, title, published, mode)
    }

    pub async fn save_summary(
        &self,
        podcast: &str,
        title: &str,
        published: i64,
        mode: Mode,
        paragraph: &str,
        long: &str,
    ) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        episodes::save_summary(&conn, podcast, title, published, mode, paragraph, long)
    }

    pub async fn record_download_strategy(&self, podcast: &str, strategy: &str) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        history::record_download_strategy(&conn, podcast, strategy)
    }

    pub async fn load_strategy_history(&self, podcast: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn.lock().await;
        history::load_strategy_history(&conn, podcast)
    }

    pub async fn append_failure(&self, record: &FailureRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        failures::append_failure(&conn, record)
    }
}
