//! Schema creation and migration for the embedded store (spec §4.1).

use rusqlite::Connection;

use super::models::StoreError;

const CURRENT_VERSION: i64 = 1;

pub fn create_or_migrate(conn: &Connection) -> Result<(), StoreError> {
    conn.execute("PRAGMA foreign_keys = ON;", [])
        .map_err(super::models::classify_sqlite_error)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS episodes (
            id INTEGER PRIMARY KEY NOT NULL,
            podcast TEXT NOT NULL,
            title TEXT NOT NULL,
            published INTEGER NOT NULL,
            audio_url TEXT,
            transcript_url TEXT,
            description TEXT,
            link TEXT,
            guid TEXT,
            duration INTEGER,
            apple_podcast_id TEXT,
            transcript TEXT,
            transcript_test TEXT,
            transcript_source TEXT,
            transcript_source_test TEXT,
            summary TEXT,
            summary_test TEXT,
            paragraph_summary TEXT,
            paragraph_summary_test TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(podcast, title, published)
        );",
        [],
    )
    .map_err(super::models::classify_sqlite_error)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS download_history (
            podcast TEXT PRIMARY KEY NOT NULL,
            strategies_json TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );",
        [],
    )
    .map_err(super::models::classify_sqlite_error)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS failures (
            id INTEGER PRIMARY KEY NOT NULL,
            ts INTEGER NOT NULL,
            component TEXT NOT NULL,
            podcast TEXT NOT NULL,
            title TEXT NOT NULL,
            error_kind TEXT NOT NULL,
            error_msg TEXT NOT NULL,
            retries INTEGER NOT NULL,
            mode TEXT NOT NULL
        );",
        [],
    )
    .map_err(super::models::classify_sqlite_error)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY NOT NULL,
            version INTEGER NOT NULL
        );",
        [],
    )
    .map_err(super::models::classify_sqlite_error)?;

    migrate_mode_columns(conn)?;
    record_version(conn)?;
    Ok(())
}

/// If an older database predates the mode-specific columns, add them with
/// `NULL` defaults. Pre-existing non-mode transcripts/summaries are assumed
/// to belong to `full` mode, so no backfill is required beyond the column
/// add (spec §4.1 "Schema migration").
fn migrate_mode_columns(conn: &Connection) -> Result<(), StoreError> {
    let existing: Vec<String> = {
        let mut stmt = conn
            .prepare("PRAGMA table_info(episodes);")
            .map_err(super::models::classify_sqlite_error)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .map_err(super::models::classify_sqlite_error)?;
        rows.filter_map(Result::ok).collect()
    };

    let required = [
        "transcript_test",
        "transcript_source",
        "transcript_source_test",
        "summary_test",
        "paragraph_summary",
        "paragraph_summary_test",
    ];

    for col in required {
        if !existing.iter().any(|c| c == col) {
            conn.execute(
                &format!("ALTER TABLE episodes ADD COLUMN {col} TEXT;"),
                [],
            )
            .map_err(super::models::classify_sqlite_error)?;
        }
    }
    Ok(())
}

fn record_version(conn: &Connection) -> Result<(), StoreError> {
    let stored: Option<i64> = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1;", [], |row| row.get(0))
        .ok();
    match stored {
        Some(v) if v >= CURRENT_VERSION => {}
        Some(_) => {
            conn.execute(
                "UPDATE schema_version SET version = ? WHERE id = 1;",
                [CURRENT_VERSION],
            )
            .map_err(super::models::classify_sqlite_error)?;
        }
        None => {
            conn.execute(
                "INSERT INTO schema_version (id, version) VALUES (1, ?);",
                [CURRENT_VERSION],
            )
            .map_err(super::models::classify_sqlite_error)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_all_tables_and_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_or_migrate(&conn).unwrap();
        create_or_migrate(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='episodes';",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn adds_mode_columns_to_legacy_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute(
            "CREATE TABLE episodes (
                id INTEGER PRIMARY KEY NOT NULL,
                podcast TEXT NOT NULL,
                title TEXT NOT NULL,
                published INTEGER NOT NULL,
                audio_url TEXT,
                transcript_url TEXT,
                description TEXT,
                link TEXT,
                guid TEXT,
                duration INTEGER,
                apple_podcast_id TEXT,
                transcript TEXT,
                summary TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                UNIQUE(podcast, title, published)
            );",
            [],
        )
        .unwrap();

        migrate_mode_columns(&conn).unwrap();

        let mut stmt = conn.prepare("PRAGMA table_info(episodes);").unwrap();
        let cols: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .filter_map(Result::ok)
            .collect();
        assert!(cols.contains(&"transcript_test".to_string()));
        assert!(cols.contains(&"paragraph_summary_test".to_string()));
    }
}
