//! Counters describing take execution.
//!
//! A [`MetricsCollector`] is attached to a node through its
//! [`Controller`](crate::transform::Controller). It is cheap to clone; all
//! clones share the same counters, so a collector can be handed to several
//! nodes (or several concurrently running invocations) and read once the
//! query finishes.
//!
//! # Example
//!
//! ```
//! use blocktake::metrics::{MetricsCollector, TAKE_BLOCKS_PROCESSED};
//!
//! let metrics = MetricsCollector::new();
//! metrics.increment_counter(TAKE_BLOCKS_PROCESSED, 2);
//! assert_eq!(metrics.counter(TAKE_BLOCKS_PROCESSED), Some(2));
//! ```

use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::Result;

/// Blocks a take node finished, in either mode.
pub const TAKE_BLOCKS_PROCESSED: &str = "take_blocks_processed";
/// Steps run through a take function.
pub const TAKE_STEPS_PROCESSED: &str = "take_steps_processed";
/// Present values that range-mode truncation turned into NaN.
pub const TAKE_VALUES_DROPPED: &str = "take_values_dropped";

#[derive(Default)]
struct Counter {
    value: u64,
    description: Option<String>,
}

/// Thread-safe set of named counters.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<BTreeMap<String, Counter>>>,
}

impl MetricsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Counter>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `by` to a counter, creating it at zero first if needed.
    pub fn increment_counter(&self, name: &str, by: u64) {
        let mut counters = self.lock();
        counters.entry(name.to_string()).or_default().value += by;
    }

    pub fn set_counter(&self, name: &str, value: u64) {
        let mut counters = self.lock();
        counters.entry(name.to_string()).or_default().value = value;
    }

    /// Attach a human-readable description to a counter.
    pub fn describe(&self, name: &str, description: impl Into<String>) {
        let mut counters = self.lock();
        counters.entry(name.to_string()).or_default().description = Some(description.into());
    }

    pub fn counter(&self, name: &str) -> Option<u64> {
        self.lock().get(name).map(|c| c.value)
    }

    /// Current value of every counter, by name.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.lock().iter().map(|(name, c)| (name.clone(), c.value)).collect()
    }

    /// Every counter as `{"name": {"value": n, "description": ...}}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let counters = self.lock();
        let mut out = serde_json::Map::new();
        for (name, c) in counters.iter() {
            let mut obj = serde_json::Map::new();
            obj.insert("value".to_string(), json!(c.value));
            if let Some(desc) = &c.description {
                obj.insert("description".to_string(), json!(desc));
            }
            out.insert(name.clone(), Value::Object(obj));
        }
        Value::Object(out)
    }

    /// Write [`to_json`](Self::to_json) to a file, pretty-printed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let formatted = serde_json::to_string_pretty(&self.to_json())?;
        let mut file = File::create(path)?;
        file.write_all(formatted.as_bytes())?;
        Ok(())
    }
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.snapshot()).finish()
    }
}
