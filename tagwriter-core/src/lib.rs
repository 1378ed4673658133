//! # Tagwriter Core
//!
//! Reveals text one character at a time while interpreting inline bracket
//! tags: `[speed=0.1]`, `[pause=1]`, `[color=red]…[/color]`, `[action=beep]`.
//!
//! Text flows through the [`lexer`] into a tag list, which the [`validator`]
//! can check on demand and the [`playback`] interpreter drives against the
//! [`registry`] of [`processors`].

pub mod config;
pub mod context;
pub mod error;
pub mod lexer;
pub mod playback;
pub mod processors;
pub mod registry;
pub mod validator;

pub use config::{TypewriterConfig, UnknownTagPolicy};
pub use context::{ProcessContext, ProcessResult, RenderMode};
pub use error::{Result, TagwriterError};
pub use lexer::{TagLexer, TagRecord, get_used_tags};
pub use playback::clock::{Clock, TokioClock};
pub use playback::sink::{DisplaySink, MemorySink};
pub use playback::{Completion, PlaybackEvent, PlaybackState, SessionOutcome, Typewriter, TypewriterBuilder};
pub use processors::{AsyncTagProcessor, ProcessorHandle, TagProcessor};
pub use registry::ProcessorRegistry;
pub use validator::{TagIssue, ValidationResult};

/// Validate `text` against the shared default registry.
pub fn validate(text: &str) -> ValidationResult {
    validator::validate(text, &ProcessorRegistry::global())
}
