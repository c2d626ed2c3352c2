//! Deterministic in-process embedding provider for tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::embeddings::EmbeddingProvider;
use crate::error::{Result, TrendError};

/// Records every request and answers with hash-derived vectors.
///
/// Clones share state, so a test can hand one clone to the service and
/// inspect the calls through another.
#[derive(Clone)]
pub struct RecordingProvider {
    dimensions: usize,
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    fixed: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingProvider {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            calls: Arc::new(Mutex::new(Vec::new())),
            fixed: Arc::new(Mutex::new(HashMap::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A provider whose every call fails.
    #[must_use]
    pub fn failing(dimensions: usize) -> Self {
        let provider = Self::new(dimensions);
        provider.set_failing(true);
        provider
    }

    /// Answer `text` with `vector` instead of the hash-derived one.
    #[must_use]
    pub fn with_vector(self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed.lock().insert(text.to_string(), vector);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Inputs of every request so far, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().clear();
    }

    /// The vector this provider returns for `text`.
    #[must_use]
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.fixed.lock().get(text) {
            return vector.clone();
        }
        let digest = Sha256::digest(text.as_bytes());
        (0..self.dimensions)
            .map(|i| f32::from(digest[i % digest.len()]) / 127.5 - 1.0 + (i / digest.len()) as f32 * 1e-3)
            .collect()
    }
}

impl EmbeddingProvider for RecordingProvider {
    fn model(&self) -> &str {
        "recording-test-model"
    }

    async fn embed_many(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.lock().push(inputs.to_vec());
        if self.failing.load(Ordering::SeqCst) {
            return Err(TrendError::Provider("simulated provider outage".to_string()));
        }
        Ok(inputs.iter().map(|text| self.vector_for(text)).collect())
    }
}
