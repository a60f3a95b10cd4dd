//! Per-podcast download-success history (spec §3 "Download-success
//! history", invariant 5 "Monotonic success history").

use rusqlite::{params, Connection, OptionalExtension};

use super::models::{classify_sqlite_error, StoreError};
use crate::constants::download::SUCCESS_HISTORY_LEN;

/// Record a successful strategy, moving it to the head of the podcast's
/// MRU history and bounding the list to [`SUCCESS_HISTORY_LEN`].
pub fn record_download_strategy(conn: &Connection, podcast: &str, strategy: &str) -> Result<(), StoreError> {
    let mut history = load_strategy_history(conn, podcast)?;
    history.retain(|s| s != strategy);
    history.insert(0, strategy.to_string());
    history.truncate(SUCCESS_HISTORY_LEN);

    let json = serde_json::to_string(&history).map_err(|e| StoreError::Schema(e.to_string()))?;
    conn.execute(
        "INSERT INTO download_history (podcast, strategies_json, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(podcast) DO UPDATE SET strategies_json = excluded.strategies_json, updated_at = excluded.updated_at;",
        params![podcast, json, 0],
    )
    .map_err(classify_sqlite_error)?;
    Ok(())
}

/// Ordered list of strategies that most recently succeeded for `podcast`,
/// most-recent first. Empty if never recorded.
pub fn load_strategy_history(conn: &Connection, podcast: &str) -> Result<Vec<String>, StoreError> {
    let json: Option<String> = conn
        .query_row(
            "SELECT strategies_json FROM download_history WHERE podcast = ?1;",
            params![podcast],
            |row| row.get(0),
        )
        .optional()
        .map_err(classify_sqlite_error)?;

    match json {
        Some(j) => serde_json::from_str(&j).map_err(|e| StoreError::Schema(e.to_string())),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::schema::create_or_migrate;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_or_migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn empty_history_when_never_recorded() {
        let conn = test_conn();
        assert!(load_strategy_history(&conn, "Pod").unwrap().is_empty());
    }

    #[test]
    fn recording_moves_strategy_to_head() {
        let conn = test_conn();
        record_download_strategy(&conn, "Pod", "direct").unwrap();
        record_download_strategy(&conn, "Pod", "youtube").unwrap();
        record_download_strategy(&conn, "Pod", "direct").unwrap();

        let history = load_strategy_history(&conn, "Pod").unwrap();
        assert_eq!(history, vec!["direct".to_string(), "youtube".to_string()]);
    }

    #[test]
    fn history_is_bounded() {
        let conn = test_conn();
        for i in 0..10 {
            record_download_strategy(&conn, "Pod", &format!("strategy-{i}")).unwrap();
        }
        let history = load_strategy_history(&conn, "Pod").unwrap();
        assert_eq!(history.len(), SUCCESS_HISTORY_LEN);
        assert_eq!(history[0], "strategy-9");
    }
}
