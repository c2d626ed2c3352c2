//! SQLite-backed vector store
//!
//! Vectors live in a nullable `embedding` BLOB column per collection table.
//! Nearest-neighbour ranking is done in SQL through the `cosine_distance`
//! scalar function registered on every connection, so filtering, ordering
//! and limiting all happen in one statement. Substring matching goes
//! through `fold`, a Unicode lower-casing function, since SQLite's own
//! `LIKE` only folds ASCII.
//!
//! File-backed stores keep one read-only connection per collection next to
//! the writer, so the three per-collection searches of a query run in
//! parallel under WAL. In-memory stores share the single writer.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::{Connection, OpenFlags, Row, params};

use crate::error::{Result, TrendError};
use crate::records::{Collection, Record};
use crate::search::SimilarityResult;
use crate::storage::VectorStore;
use crate::storage::migrations;
use crate::storage::vector::{cosine_distance, decode_vector, encode_vector};

/// Read-only connections opened next to the writer of a file-backed store
pub const READER_CONNECTIONS: usize = Collection::ALL.len();

/// Total and embedded record counts for one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CollectionCounts {
    pub total: usize,
    pub embedded: usize,
}

/// SQLite database wrapper implementing [`VectorStore`].
///
/// Writes go through one connection behind a mutex. Similarity and
/// substring reads take the first free reader. Async callers run their
/// statements on the blocking pool so they never stall the runtime.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    readers: Arc<[Mutex<Connection>]>,
    next_reader: Arc<AtomicUsize>,
    schema_version: u32,
}

impl SqliteStore {
    /// Open database at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::configure_pragmas(&conn)?;
        let mut store = Self::init(conn)?;

        // Readers open after migrations so they see the final schema.
        let readers = (0..READER_CONNECTIONS)
            .map(|_| open_reader(path).map(Mutex::new))
            .collect::<Result<Vec<_>>>()?;
        store.readers = readers.into();
        Ok(store)
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        register_functions(&conn)?;
        let schema_version = migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            readers: Arc::from(Vec::<Mutex<Connection>>::new()),
            next_reader: Arc::new(AtomicUsize::new(0)),
            schema_version,
        })
    }

    /// Number of read-only connections; zero for in-memory stores.
    pub fn reader_count(&self) -> usize {
        self.readers.len()
    }

    /// Current schema version after migrations.
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn configure_pragmas(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA temp_store = MEMORY;
             PRAGMA foreign_keys = ON;",
        )?;
        Ok(())
    }

    /// Insert a record, optionally with its vector.
    pub fn insert(&self, record: &Record, embedding: Option<&[f32]>) -> Result<()> {
        let columns = record.columns();
        if columns.id.trim().is_empty() {
            return Err(TrendError::ValidationFailed("record id is empty".to_string()));
        }
        if columns.display.trim().is_empty() {
            return Err(TrendError::ValidationFailed(format!(
                "{} must not be empty",
                record.collection().display_column()
            )));
        }

        let collection = record.collection();
        let [first, second] = collection.detail_columns();
        let sql = format!(
            "INSERT INTO {table} (id, owner_id, {display}, {first}, {second}, created_at, embedding)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            table = collection.table(),
            display = collection.display_column(),
        );

        let conn = self.conn.lock();
        conn.execute(
            &sql,
            params![
                columns.id,
                columns.owner_id,
                columns.display,
                columns.details[0],
                columns.details[1],
                columns.created_at,
                embedding.map(encode_vector),
            ],
        )?;
        Ok(())
    }

    pub fn counts(&self, collection: Collection) -> Result<CollectionCounts> {
        let sql = format!(
            "SELECT COUNT(*), COUNT(embedding) FROM {}",
            collection.table()
        );
        let conn = self.conn.lock();
        let (total, embedded): (i64, i64) =
            conn.query_row(&sql, [], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(CollectionCounts {
            total: usize::try_from(total).unwrap_or(0),
            embedded: usize::try_from(embedded).unwrap_or(0),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run_blocking<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }

    /// Like [`Self::run_blocking`], on a reader connection when there is one.
    async fn run_read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        if self.readers.is_empty() {
            return self.run_blocking(f).await;
        }

        let readers = Arc::clone(&self.readers);
        let start = self.next_reader.fetch_add(1, Ordering::Relaxed);
        tokio::task::spawn_blocking(move || {
            let count = readers.len();
            for offset in 0..count {
                if let Some(conn) = readers[(start + offset) % count].try_lock() {
                    return f(&conn);
                }
            }
            f(&readers[start % count].lock())
        })
        .await?
    }
}

fn open_reader(path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    register_functions(&conn)?;
    Ok(conn)
}

impl VectorStore for SqliteStore {
    async fn nearest(
        &self,
        collection: Collection,
        query: &[f32],
        limit: usize,
        owner: Option<&str>,
    ) -> Result<Vec<SimilarityResult>> {
        let query = encode_vector(query);
        let owner = owner.map(str::to_owned);
        self.run_read(move |conn| {
            nearest_blocking(conn, collection, query, limit, owner.as_deref())
        })
        .await
    }

    async fn substring(
        &self,
        collection: Collection,
        pattern: &str,
        limit: usize,
        owner: Option<&str>,
    ) -> Result<Vec<Record>> {
        let pattern = pattern.to_string();
        let owner = owner.map(str::to_owned);
        self.run_read(move |conn| {
            substring_blocking(conn, collection, &pattern, limit, owner.as_deref())
        })
        .await
    }

    async fn pending_embeddings(
        &self,
        collection: Collection,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>> {
        let after = after.map(str::to_owned);
        self.run_blocking(move |conn| {
            let sql = format!(
                "SELECT {} FROM {}
                 WHERE embedding IS NULL AND (?1 IS NULL OR id > ?1)
                 ORDER BY id ASC
                 LIMIT ?2",
                select_columns(collection),
                collection.table()
            );
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt.query_map(params![after, sql_limit(limit)], |row| {
                row_to_record(collection, row)
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }

    async fn store_embedding(&self, collection: Collection, id: &str, vector: &[f32]) -> Result<()> {
        let id = id.to_string();
        let blob = encode_vector(vector);
        self.run_blocking(move |conn| {
            let sql = format!("UPDATE {} SET embedding = ?1 WHERE id = ?2", collection.table());
            let changed = conn.execute(&sql, params![blob, id])?;
            if changed == 0 {
                return Err(TrendError::NotFound(format!("{collection} record {id}")));
            }
            Ok(())
        })
        .await
    }
}

fn nearest_blocking(
    conn: &Connection,
    collection: Collection,
    query: Vec<u8>,
    limit: usize,
    owner: Option<&str>,
) -> Result<Vec<SimilarityResult>> {
    // Rows whose distance is undefined (dimension mismatch, zero vector)
    // are dropped rather than sorted first.
    let sql = format!(
        "SELECT * FROM (
             SELECT {columns}, cosine_distance(embedding, ?1) AS distance
             FROM {table}
             WHERE embedding IS NOT NULL AND (?2 IS NULL OR owner_id = ?2)
         )
         WHERE distance IS NOT NULL
         ORDER BY distance ASC, id ASC
         LIMIT ?3",
        columns = select_columns(collection),
        table = collection.table(),
    );

    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![query, owner, sql_limit(limit)], |row| {
        let record = row_to_record(collection, row)?;
        let distance: f64 = row.get(6)?;
        #[allow(clippy::cast_possible_truncation)]
        let similarity = (1.0 - distance) as f32;
        Ok(SimilarityResult { record, similarity })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn substring_blocking(
    conn: &Connection,
    collection: Collection,
    pattern: &str,
    limit: usize,
    owner: Option<&str>,
) -> Result<Vec<Record>> {
    let sql = format!(
        "SELECT {columns} FROM {table}
         WHERE instr(fold({display}), fold(?1)) > 0 AND (?2 IS NULL OR owner_id = ?2)
         LIMIT ?3",
        columns = select_columns(collection),
        table = collection.table(),
        display = collection.display_column(),
    );
    let mut stmt = conn.prepare_cached(&sql)?;
    let rows = stmt.query_map(params![pattern, owner, sql_limit(limit)], |row| {
        row_to_record(collection, row)
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "cosine_distance",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let left: Option<Vec<u8>> = ctx.get(0)?;
            let right: Option<Vec<u8>> = ctx.get(1)?;
            let left = left.as_deref().and_then(decode_vector);
            let right = right.as_deref().and_then(decode_vector);
            Ok(match (left, right) {
                (Some(a), Some(b)) => cosine_distance(&a, &b),
                _ => None,
            })
        },
    )?;
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )?;
    Ok(())
}

fn select_columns(collection: Collection) -> String {
    let [first, second] = collection.detail_columns();
    format!(
        "id, owner_id, {}, {first}, {second}, created_at",
        collection.display_column()
    )
}

fn row_to_record(collection: Collection, row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record::from_parts(
        collection,
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        [row.get(3)?, row.get(4)?],
        row.get(5)?,
    ))
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
