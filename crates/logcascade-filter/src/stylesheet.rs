use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Handle to the live stylesheet
///
/// The text is only ever replaced wholesale; readers get a snapshot that
/// stays valid after later replacements.
#[derive(Clone, Debug)]
pub struct StylesheetHandle {
    /// Current stylesheet text
    text: Arc<RwLock<Arc<str>>>,

    /// Number of replacements so far
    generation: Arc<AtomicU64>,
}

impl Default for StylesheetHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl StylesheetHandle {
    /// Create a handle holding an empty stylesheet
    pub fn new() -> Self {
        Self {
            text: Arc::new(RwLock::new(Arc::from(""))),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Install new stylesheet text, returning the new generation
    pub fn replace(&self, css: String) -> u64 {
        *self.text.write() = Arc::from(css);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Snapshot of the current text
    pub fn current(&self) -> Arc<str> {
        Arc::clone(&self.text.read())
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.text.read().is_empty()
    }
}
