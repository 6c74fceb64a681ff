//! Nullable document store: records deletions instead of performing them.

use matric_admission::{DocumentError, DocumentStore};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub struct NullDocumentStore {
    deleted: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl NullDocumentStore {
    pub fn new() -> Self {
        Self {
            deleted: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// A store whose every delete fails.
    pub fn failing() -> Self {
        let store = Self::new();
        store.set_failing(true);
        store
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// References passed to successful deletes, in call order.
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

impl Default for NullDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for NullDocumentStore {
    fn delete(&self, reference: &str) -> Result<(), DocumentError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DocumentError::Backend(format!(
                "refusing to delete {reference}"
            )));
        }
        self.deleted.lock().unwrap().push(reference.to_string());
        Ok(())
    }
}
