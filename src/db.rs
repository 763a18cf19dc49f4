use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::error::{LensError, Result};
use crate::labeler::LabeledColor;

/// One processed upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub original_filename: String,
    /// File name of the colorized PNG inside the results directory
    pub result_file: String,
    /// SHA-256 of the uploaded bytes
    pub source_hash: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub colors: Vec<LabeledColor>,
    pub degenerate: bool,
}

#[derive(Clone)]
pub struct HistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryStore {
    pub fn new(db_path: &Path) -> Result<Self> {
        Self::init(Connection::open(db_path)?)
    }

    /// History that lives only as long as the store
    pub fn in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                original_filename TEXT NOT NULL,
                result_file TEXT NOT NULL,
                source_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                colors TEXT NOT NULL,
                degenerate INTEGER NOT NULL
            )",
            [],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LensError::Processing("history database lock poisoned".to_string()))
    }

    pub fn add_entry(&self, entry: &HistoryEntry) -> Result<()> {
        let colors = serde_json::to_string(&entry.colors)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO history (id, original_filename, result_file, source_hash, created_at, colors, degenerate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id,
                entry.original_filename,
                entry.result_file,
                entry.source_hash,
                entry.created_at,
                colors,
                entry.degenerate,
            ],
        )?;
        Ok(())
    }

    /// All entries, newest first
    pub fn list_entries(&self) -> Result<Vec<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, original_filename, result_file, source_hash, created_at, colors, degenerate
             FROM history ORDER BY seq DESC",
        )?;

        let rows = stmt
            .query_map([], read_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(RawEntry::into_entry).collect()
    }

    pub fn get_entry(&self, id: &str) -> Result<Option<HistoryEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, original_filename, result_file, source_hash, created_at, colors, degenerate
             FROM history WHERE id = ?1",
        )?;

        let mut rows = stmt.query(params![id])?;

        let raw = match rows.next()? {
            Some(row) => Some(read_row(row)?),
            None => None,
        };
        raw.map(RawEntry::into_entry).transpose()
    }

    /// Returns whether an entry was removed
    pub fn remove_entry(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute("DELETE FROM history WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}

/// Row with the color list still in its JSON column form
struct RawEntry {
    id: String,
    original_filename: String,
    result_file: String,
    source_hash: String,
    created_at: String,
    colors: String,
    degenerate: bool,
}

impl RawEntry {
    fn into_entry(self) -> Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: self.id,
            original_filename: self.original_filename,
            result_file: self.result_file,
            source_hash: self.source_hash,
            created_at: self.created_at,
            colors: serde_json::from_str(&self.colors)?,
            degenerate: self.degenerate,
        })
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        original_filename: row.get(1)?,
        result_file: row.get(2)?,
        source_hash: row.get(3)?,
        created_at: row.get(4)?,
        colors: row.get(5)?,
        degenerate: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> HistoryEntry {
        HistoryEntry {
            id: id.to_string(),
            original_filename: format!("{}.jpg", id),
            result_file: format!("{}.png", id),
            source_hash: "abc123".to_string(),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            colors: vec![LabeledColor::new([255, 0, 0]), LabeledColor::new([10, 10, 10])],
            degenerate: false,
        }
    }

    #[test]
    fn test_history_operations() {
        let db = HistoryStore::in_memory().unwrap();

        db.add_entry(&entry("first")).unwrap();
        db.add_entry(&entry("second")).unwrap();

        // Newest first
        let entries = db.list_entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "second");
        assert_eq!(entries[1], entry("first"));

        assert_eq!(db.get_entry("first").unwrap(), Some(entry("first")));
        assert_eq!(db.get_entry("missing").unwrap(), None);

        assert!(db.remove_entry("first").unwrap());
        assert!(!db.remove_entry("first").unwrap());
        assert_eq!(db.list_entries().unwrap().len(), 1);
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let db = HistoryStore::in_memory().unwrap();
        db.add_entry(&entry("same")).unwrap();
        assert!(matches!(db.add_entry(&entry("same")), Err(LensError::Database(_))));
    }

    #[test]
    fn test_file_backed_history_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.db");

        {
            let db = HistoryStore::new(&path).unwrap();
            db.add_entry(&entry("kept")).unwrap();
        }

        let db = HistoryStore::new(&path).unwrap();
        let entries = db.list_entries().unwrap();
        assert_eq!(entries, vec![entry("kept")]);
    }

    #[test]
    fn test_entry_json_is_camel_case() {
        let json = serde_json::to_value(entry("x")).unwrap();
        assert_eq!(json["originalFilename"], "x.jpg");
        assert_eq!(json["resultFile"], "x.png");
        assert_eq!(json["colors"][0]["name"], "Crimson Red");
    }
}
