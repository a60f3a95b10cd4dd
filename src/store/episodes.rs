//! Episode, transcript, and summary persistence (spec §4.1 operations table).

use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Mode;
use crate::podcast::models::Episode;

use super::models::{classify_sqlite_error, StoreError, SummaryRecord, TranscriptRecord, TranscriptSource};

/// Insert an episode, or do nothing if its identity triple already exists.
/// Idempotent per spec §4.1: "idempotent on identity triple".
pub fn upsert_episode(conn: &Connection, ep: &Episode) -> Result<i64, StoreError> {
    let now = ep.published;
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM episodes WHERE podcast = ?1 AND title = ?2 AND published = ?3;",
            params![ep.podcast, ep.title, ep.published],
            |row| row.get(0),
        )
        .optional()
        .map_err(classify_sqlite_error)?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let result = conn.execute(
        "INSERT INTO episodes (
            podcast, title, published, audio_url, transcript_url, description,
            link, guid, duration, apple_podcast_id, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11);",
        params![
            ep.podcast,
            ep.title,
            ep.published,
            ep.audio_url,
            ep.transcript_url,
            ep.description,
            ep.link,
            ep.guid,
            ep.duration,
            ep.apple_podcast_id,
            now,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) => {
            let classified = classify_sqlite_error(e);
            if classified.is_unique_violation() {
                // Lost a race with a concurrent insert; treat as present.
                conn.query_row(
                    "SELECT id FROM episodes WHERE podcast = ?1 AND title = ?2 AND published = ?3;",
                    params![ep.podcast, ep.title, ep.published],
                    |row| row.get(0),
                )
                .map_err(classify_sqlite_error)
            } else {
                Err(classified)
            }
        }
    }
}

fn row_id(conn: &Connection, podcast: &str, title: &str, published: i64) -> Result<Option<i64>, StoreError> {
    conn.query_row(
        "SELECT id FROM episodes WHERE podcast = ?1 AND title = ?2 AND published = ?3;",
        params![podcast, title, published],
        |row| row.get(0),
    )
    .optional()
    .map_err(classify_sqlite_error)
}

pub fn get_transcript(
    conn: &Connection,
    podcast: &str,
    title: &str,
    published: i64,
    mode: Mode,
) -> Result<Option<TranscriptRecord>, StoreError> {
    let (text_col, source_col) = transcript_columns(mode);
    let Some(id) = row_id(conn, podcast, title, published)? else {
        return Ok(None);
    };
    let query = format!("SELECT {text_col}, {source_col} FROM episodes WHERE id = ?1;");
    let result: Option<(Option<String>, Option<String>)> = conn
        .query_row(&query, params![id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()
        .map_err(classify_sqlite_error)?;

    Ok(result.and_then(|(text, source)| {
        let text = text?;
        let source = source.as_deref().and_then(TranscriptSource::parse).unwrap_or(TranscriptSource::Generated);
        Some(TranscriptRecord { text, source, mode })
    }))
}

pub fn save_transcript(
    conn: &Connection,
    podcast: &str,
    title: &str,
    published: i64,
    mode: Mode,
    text: &str,
    source: TranscriptSource,
) -> Result<(), StoreError> {
    let (text_col, source_col) = transcript_columns(mode);
    let query =
        format!("UPDATE episodes SET {text_col} = ?1, {source_col} = ?2, updated_at = ?3 WHERE podcast = ?4 AND title = ?5 AND published = ?6;");
    conn.execute(&query, params![text, source.as_str(), published, podcast, title, published])
        .map_err(classify_sqlite_error)?;
    Ok(())
}

pub fn get_summary(
    conn: &Connection,
    podcast: &str,
    title: &str,
    published: i64,
    mode: Mode,
) -> Result<SummaryRecord, StoreError> {
    let (paragraph_col, long_col) = summary_columns(mode);
    let Some(id) = row_id(conn, podcast, title, published)? else {
        return Ok(SummaryRecord::default());
    };
    let query = format!("SELECT {paragraph_col}, {long_col} FROM episodes WHERE id = ?1;");
    let result: Option<(Option<String>, Option<String>)> = conn
        .query_row(&query, params![id], |row| Ok((row.get(0)?, row.get(1)?)))
        .optional()
        .map_err(classify_sqlite_error)?;

    Ok(result
        .map(|(paragraph, long)| SummaryRecord { paragraph, long })
        .unwrap_or_default())
}

/// Both summary fields are written in a single statement, so a reader never
/// observes one without the other (spec §4.1: "written atomically").
pub fn save_summary(
    conn: &Connection,
    podcast: &str,
    title: &str,
    published: i64,
    mode: Mode,
    paragraph: &str,
    long: &str,
) -> Result<(), StoreError> {
    let (paragraph_col, long_col) = summary_columns(mode);
    let query = format!(
        "UPDATE episodes SET {paragraph_col} = ?1, {long_col} = ?2, updated_at = ?3 WHERE podcast = ?4 AND title = ?5 AND published = ?6;"
    );
    conn.execute(&query, params![paragraph, long, published, podcast, title, published])
        .map_err(classify_sqlite_error)?;
    Ok(())
}

fn transcript_columns(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::Test => ("transcript_test", "transcript_source_test"),
        Mode::Full => ("transcript", "transcript_source"),
    }
}

fn summary_columns(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::Test => ("paragraph_summary_test", "summary_test"),
        Mode::Full => ("paragraph_summary", "summary"),
    }
}
