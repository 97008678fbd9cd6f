//! Seams for external collaborators the pipeline consumes but does not own.
//!
//! The surrounding application supplies the settings store (key-value
//! persistence) and, for the conversational surface, an intent classifier.
//! The pipeline only ever sees these traits.

use std::collections::HashMap;
use std::sync::Mutex;

/// Key-value settings persistence, supplied by the host application.
///
/// Used for exported-topic bookkeeping; values are opaque strings.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// Natural-language intent oracle: free text in, an intent label out.
///
/// The classifier itself lives outside this system; callers must treat the
/// output as opaque.
pub trait IntentClassifier: Send + Sync {
    fn classify(&self, input: &str) -> String;
}

/// In-memory [`SettingsStore`], for tests and non-persistent sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("store poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("store poisoned")
            .insert(key.to_string(), value.to_string());
    }
}

/// Storage key prefix for exported-topic bookkeeping.
const EXPORTED_KEY_PREFIX: &str = "exported.";

/// Record that a source topic has been exported.
pub fn mark_exported(store: &dyn SettingsStore, topic_id: u64) {
    let key = format!("{EXPORTED_KEY_PREFIX}{topic_id}");
    store.set(&key, &chrono::Utc::now().to_rfc3339());
}

/// Whether a source topic was previously exported.
pub fn is_exported(store: &dyn SettingsStore, topic_id: u64) -> bool {
    store.get(&format!("{EXPORTED_KEY_PREFIX}{topic_id}")).is_some()
}
