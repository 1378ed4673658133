//! Per-session state handed to tag processors.

use std::collections::HashMap;
use std::sync::Arc;

use crate::playback::clock::Clock;

/// How the current pass over the text is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// The timed reveal loop.
    Live,
    /// Final text computed in one go (`skip`, `set_instant`). Processors with
    /// external side effects stay quiet.
    Instant,
}

/// One per session; never shared across sessions.
pub struct ProcessContext {
    pub source: Arc<str>,
    /// Byte offset the loop is currently at.
    pub cursor: usize,
    /// Seconds between revealed characters.
    pub speed: f32,
    /// Saved speeds for nested `speedregion`s.
    pub speed_stack: Vec<f32>,
    /// Free-form state for third-party processors.
    pub extensions: HashMap<String, serde_json::Value>,
    /// Accumulated display text.
    pub buffer: String,
    pub mode: RenderMode,
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("cursor", &self.cursor)
            .field("speed", &self.speed)
            .field("speed_stack", &self.speed_stack)
            .field("buffer", &self.buffer)
            .field("mode", &self.mode)
            .finish()
    }
}

impl ProcessContext {
    pub fn new(source: Arc<str>, speed: f32, mode: RenderMode, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cursor: 0,
            speed,
            speed_stack: Vec::new(),
            extensions: HashMap::new(),
            buffer: String::new(),
            mode,
            clock,
        }
    }
}

/// What a processor did with a tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessResult {
    pub handled: bool,
    /// Source span the effect occupies. Zero means "just the tag".
    pub consumed_length: usize,
    /// No visible content character: no delay, no reveal event.
    pub suppress_reveal: bool,
    /// Appended to the display buffer in place of the tag.
    pub replacement: Option<String>,
}

impl ProcessResult {
    /// Handled, nothing shown.
    pub fn invisible() -> Self {
        Self {
            handled: true,
            suppress_reveal: true,
            ..Self::default()
        }
    }

    /// Handled, `text` appended to the display without charging a delay.
    pub fn replace(text: impl Into<String>) -> Self {
        Self {
            replacement: Some(text.into()),
            ..Self::invisible()
        }
    }

    pub fn unhandled() -> Self {
        Self {
            suppress_reveal: true,
            ..Self::default()
        }
    }
}
