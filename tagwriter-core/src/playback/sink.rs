use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The host's rendering surface. Receives the whole accumulated text after
/// every step; the core never reads it back.
pub trait DisplaySink: Send + Sync {
    fn set_text(&self, text: &str);
}

impl<F> DisplaySink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn set_text(&self, text: &str) {
        self(text)
    }
}

/// Keeps the latest text in memory. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    text: Arc<Mutex<String>>,
    frames: Arc<AtomicUsize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of `set_text` calls so far.
    pub fn frames(&self) -> usize {
        self.frames.load(Ordering::SeqCst)
    }
}

impl DisplaySink for MemorySink {
    fn set_text(&self, text: &str) {
        let mut slot = self.text.lock().unwrap_or_else(|e| e.into_inner());
        slot.clear();
        slot.push_str(text);
        self.frames.fetch_add(1, Ordering::SeqCst);
    }
}
