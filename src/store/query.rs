//! Watermark-bounded range query over a snapshot.

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OpenFlags, Row};

use super::error::StoreError;
use super::record::HistoryRecord;
use super::timestamp::Ticks;

/// Rows strictly newer than `?1`, oldest first.
pub const VISITS_QUERY: &str = "SELECT id, url, title, last_visit_time FROM urls \
     WHERE last_visit_time > ?1 ORDER BY last_visit_time ASC";

/// Fetch every record with `last_visit > after`, ascending by `last_visit`.
///
/// A fresh read-only connection is opened and closed per call because the
/// snapshot is replaced wholesale every cycle. A store whose schema lacks
/// the `urls` table or one of the selected columns yields an empty result.
/// Text that is not valid UTF-8 is decoded lossily so a single bad row
/// never fails the whole read.
///
/// # Errors
///
/// Returns [`StoreError::Open`] if the file is not a database and
/// [`StoreError::QueryFailed`] for any other `SQLite` failure.
pub async fn query_after(snapshot: &Path, after: Ticks) -> Result<Vec<HistoryRecord>, StoreError> {
    let path = snapshot.to_path_buf();
    tokio::task::spawn_blocking(move || query_blocking(&path, after))
        .await
        .map_err(|_| StoreError::TaskCancelled)?
}

fn query_blocking(path: &Path, after: Ticks) -> Result<Vec<HistoryRecord>, StoreError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|source| StoreError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut stmt = match conn.prepare(VISITS_QUERY) {
        Ok(stmt) => stmt,
        Err(e) if is_schema_mismatch(&e) => {
            tracing::warn!(path = %path.display(), error = %e, "History schema mismatch, no records read");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let rows = stmt.query_map(params![after], |row| {
        Ok(HistoryRecord {
            id: row.get(0)?,
            url: lossy_text(row, 1)?.unwrap_or_default(),
            title: lossy_text(row, 2)?,
            last_visit: row.get(3)?,
        })
    })?;

    let records = rows.collect::<Result<Vec<_>, _>>()?;
    tracing::trace!(count = records.len(), after, "Queried history snapshot");
    Ok(records)
}

fn lossy_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
    })
}

fn is_schema_mismatch(err: &rusqlite::Error) -> bool {
    let msg = err.to_string();
    msg.contains("no such table") || msg.contains("no such column")
}
