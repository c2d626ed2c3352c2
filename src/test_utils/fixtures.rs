use std::path::PathBuf;

use chrono::Utc;
use tempfile::TempDir;

use crate::records::{Collection, Record};
use crate::storage::SqliteStore;

/// Test fixture providing an isolated data root with an open store.
pub struct StoreFixture {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub store: SqliteStore,
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreFixture {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        let store = SqliteStore::open(root.join("trendlens.db")).expect("Failed to open store");

        println!("[FIXTURE] Created store under: {root:?}");

        Self {
            temp_dir,
            root,
            store,
        }
    }

    /// Insert a record with the given display text and optional vector.
    pub fn insert(
        &self,
        collection: Collection,
        id: &str,
        display: &str,
        owner: Option<&str>,
        vector: Option<&[f32]>,
    ) -> Record {
        let record = Record::from_parts(
            collection,
            id.to_string(),
            owner.map(str::to_string),
            display.to_string(),
            [None, None],
            Utc::now(),
        );
        self.store
            .insert(&record, vector)
            .expect("Failed to insert record");
        println!(
            "[FIXTURE] Inserted {collection} {id} (vector: {})",
            vector.is_some()
        );
        record
    }
}

impl Drop for StoreFixture {
    fn drop(&mut self) {
        println!("[FIXTURE] Cleaning up temp directory: {:?}", self.root);
    }
}

/// Unit vector of `dim` dimensions pointing `angle` radians away from the
/// first axis, in the plane of the first two axes.
#[must_use]
pub fn unit_vector(dim: usize, angle: f32) -> Vec<f32> {
    let mut vector = vec![0.0; dim.max(2)];
    vector[0] = angle.cos();
    vector[1] = angle.sin();
    vector
}
