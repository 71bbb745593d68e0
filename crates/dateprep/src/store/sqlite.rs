use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, params};
use serde_json::{Map, Value};

use super::Store;
use crate::prelude::*;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    database   TEXT NOT NULL,
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (database, collection, id)
)";

const UPSERT: &str = "INSERT INTO documents (database, collection, id, body)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (database, collection, id) DO UPDATE SET body = excluded.body";

/// A document store backed by a single SQLite file. Every logical
/// database of the file shares one table; a document is stored as the
/// JSON object of its fields.
#[derive(Debug)]
pub(crate) struct SqliteStore {
    conn: Connection,
    database: String,
    location: PathBuf,
}

fn unavailable<P: AsRef<Path>, E: ToString>(
    path: P,
    reason: E,
) -> DateprepError {
    DateprepError::StoreUnavailable {
        location: path.as_ref().display().to_string(),
        reason: reason.to_string(),
    }
}

impl SqliteStore {
    /// Opens a store for reading and writing. The store file is
    /// created, if it doesn't exist.
    pub(crate) fn open<P, S>(path: P, database: S) -> DateprepResult<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        let location = path.as_ref().to_path_buf();
        let conn = Connection::open(&location)
            .map_err(|e| unavailable(&location, e))?;
        conn.execute(SCHEMA, [])
            .map_err(|e| unavailable(&location, e))?;

        log::debug!("opened store {}", location.display());

        Ok(Self {
            conn,
            database: database.into(),
            location,
        })
    }

    /// Opens an existing store for reading only.
    pub(crate) fn open_read_only<P, S>(
        path: P,
        database: S,
    ) -> DateprepResult<Self>
    where
        P: AsRef<Path>,
        S: Into<String>,
    {
        let location = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&location, flags)
            .map_err(|e| unavailable(&location, e))?;

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                    WHERE type = 'table' AND name = 'documents'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| unavailable(&location, e))?;

        if tables == 0 {
            return Err(unavailable(&location, "not a document store"));
        }

        log::debug!("opened store {} (read-only)", location.display());

        Ok(Self {
            conn,
            database: database.into(),
            location,
        })
    }

    #[inline]
    pub(crate) fn location(&self) -> &Path {
        &self.location
    }

    fn write(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> DateprepResult<usize> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare_cached(UPSERT)?;
            for doc in docs {
                let body = serde_json::to_string(doc.fields())?;
                stmt.execute(params![
                    self.database,
                    collection,
                    doc.id(),
                    body
                ])?;
            }
        }

        tx.commit()?;
        Ok(docs.len())
    }
}

impl Store for SqliteStore {
    fn database(&self) -> &str {
        &self.database
    }

    fn collection_names(&self) -> DateprepResult<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT DISTINCT collection FROM documents \
                WHERE database = ?1 ORDER BY collection",
        )?;

        let names = stmt
            .query_map(params![self.database], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(names)
    }

    fn count(&self, collection: &str) -> DateprepResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents \
                WHERE database = ?1 AND collection = ?2",
            params![self.database, collection],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn find(&self, collection: &str) -> DateprepResult<Vec<Document>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, body FROM documents \
                WHERE database = ?1 AND collection = ?2 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![self.database, collection], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        log::debug!("retrieved {} documents from '{collection}'", rows.len());

        rows.into_iter()
            .map(|(id, body)| {
                let fields: Map<String, Value> = serde_json::from_str(&body)?;
                Ok::<_, DateprepError>(Document::from_parts(id, fields))
            })
            .collect()
    }

    fn upsert(
        &mut self,
        collection: &str,
        docs: &[Document],
    ) -> DateprepResult<usize> {
        self.write(collection, docs).map_err(|e| {
            DateprepError::Ingestion {
                database: self.database.clone(),
                collection: collection.into(),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn upsert_is_keyed_by_identifier() -> TestResult {
        let dir = tempfile::tempdir()?;
        let mut store = SqliteStore::open(dir.path().join("s.db"), "HTRC")?;

        store.upsert(
            "dv",
            &[
                Document::new("b").with("date", "1850"),
                Document::new("a").with("date", "ERROR: n.d."),
            ],
        )?;
        store.upsert("dv", &[Document::new("b").with("date", "1851")])?;

        assert_eq!(store.count("dv")?, 2);

        let docs = store.find("dv")?;
        assert_eq!(docs[0].id(), "a");
        assert_eq!(docs[1].id(), "b");
        assert_eq!(docs[1].get_str("date"), Some("1851"));

        Ok(())
    }

    #[test]
    fn databases_are_separated() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("s.db");

        let mut store = SqliteStore::open(&path, "HTRC")?;
        store.upsert("date", &[Document::new("a")])?;

        let mut other = SqliteStore::open(&path, "OTHER")?;
        other.upsert("nllr_1", &[Document::new("a")])?;

        assert_eq!(store.collection_names()?, vec!["date"]);
        assert_eq!(other.collection_names()?, vec!["nllr_1"]);
        assert!(!store.has_collection("nllr_1")?);
        assert_eq!(store.count("nllr_1")?, 0);
        assert!(store.find("nllr_1")?.is_empty());

        Ok(())
    }

    #[test]
    fn nested_fields_survive() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("s.db");

        let mut store = SqliteStore::open(&path, "HTRC")?;
        let doc = Document::new("a")
            .with("distribution", json!({"1840-1860": 0.25}))
            .with("firstrange", "pre-1839");
        store.upsert("date", &[doc.clone()])?;
        drop(store);

        let store = SqliteStore::open_read_only(&path, "HTRC")?;
        assert_eq!(store.location(), path.as_path());
        assert_eq!(store.find("date")?, vec![doc]);

        Ok(())
    }

    #[test]
    fn open_read_only_missing_store() -> TestResult {
        let dir = tempfile::tempdir()?;
        let result =
            SqliteStore::open_read_only(dir.path().join("none.db"), "HTRC");

        assert!(matches!(
            result,
            Err(DateprepError::StoreUnavailable { .. })
        ));

        Ok(())
    }

    #[test]
    fn read_only_store_rejects_writes() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("s.db");
        SqliteStore::open(&path, "HTRC")?;

        let mut store = SqliteStore::open_read_only(&path, "HTRC")?;
        let result = store.upsert("dv", &[Document::new("a")]);

        assert!(matches!(result, Err(DateprepError::Ingestion { .. })));
        assert_eq!(store.count("dv")?, 0);

        Ok(())
    }
}
