//! Playback interpreter.
//!
//! A `Typewriter` owns at most one reveal session at a time. Starting a new
//! one cancels the current session and waits for its task to finish before
//! anything else touches the display.
//!
//! - `cancel`: cancellation source/token pair
//! - `clock`: the delay primitive (`TokioClock` by default)
//! - `session`: the reveal loop and the instant renderer
//! - `sink`: where revealed text goes

pub mod cancel;
pub mod clock;
pub mod session;
pub mod sink;

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::TypewriterConfig;
use crate::context::{ProcessContext, RenderMode};
use crate::lexer::{self, TagLexer, TagRecord};
use crate::registry::ProcessorRegistry;
use crate::validator::{self, ValidationResult};

use cancel::CancelSource;
use clock::{Clock, TokioClock};
use session::{CompletionSlot, Session, render_instant};
use sink::DisplaySink;

pub use session::{Completion, SessionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Typing,
    Completed,
    Cancelled,
}

/// Broadcast to `subscribe()` receivers.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Started { session: Uuid },
    /// A visible unit was added to the display.
    Revealed { text: String, offset: usize },
    Completed { session: Uuid },
    /// `skip` forced the final text; a `Completed` follows.
    Skipped { session: Uuid },
    Cancelled { session: Uuid },
}

struct ActiveSession {
    id: Uuid,
    cancel: CancelSource,
    task: JoinHandle<SessionOutcome>,
    completion: CompletionSlot,
    source: Arc<str>,
    tags: Arc<Vec<TagRecord>>,
    speed: f32,
}

pub struct Typewriter {
    registry: Arc<ProcessorRegistry>,
    sink: Arc<dyn DisplaySink>,
    clock: Arc<dyn Clock>,
    config: TypewriterConfig,
    events: broadcast::Sender<PlaybackEvent>,
    state: Arc<watch::Sender<PlaybackState>>,
    active: Option<ActiveSession>,
}

impl std::fmt::Debug for Typewriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typewriter")
            .field("state", &self.state())
            .field("session", &self.active.as_ref().map(|a| a.id))
            .field("config", &self.config)
            .finish()
    }
}

pub struct TypewriterBuilder {
    sink: Arc<dyn DisplaySink>,
    registry: Option<Arc<ProcessorRegistry>>,
    clock: Option<Arc<dyn Clock>>,
    config: TypewriterConfig,
}

impl TypewriterBuilder {
    pub fn registry(mut self, registry: Arc<ProcessorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: TypewriterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Typewriter {
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));
        let (state, _) = watch::channel(PlaybackState::Idle);
        Typewriter {
            registry: self.registry.unwrap_or_else(ProcessorRegistry::global),
            sink: self.sink,
            clock: self.clock.unwrap_or_else(|| Arc::new(TokioClock)),
            config: self.config,
            events,
            state: Arc::new(state),
            active: None,
        }
    }
}

impl Typewriter {
    /// Defaults: the shared registry, real time, default config.
    pub fn new(sink: impl DisplaySink + 'static) -> Self {
        Self::builder(sink).build()
    }

    pub fn builder(sink: impl DisplaySink + 'static) -> TypewriterBuilder {
        TypewriterBuilder {
            sink: Arc::new(sink),
            registry: None,
            clock: None,
            config: TypewriterConfig::default(),
        }
    }

    pub fn registry(&self) -> &Arc<ProcessorRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &TypewriterConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    pub fn watch_state(&self) -> watch::Receiver<PlaybackState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.borrow()
    }

    pub fn is_typing(&self) -> bool {
        self.state() == PlaybackState::Typing
    }

    pub fn is_skippable(&self) -> bool {
        self.is_typing()
    }

    /// Begin revealing `text`. Any running session is cancelled first and its
    /// completion callback will never fire. Must be called inside a tokio
    /// runtime.
    pub async fn start(&mut self, text: &str, speed_override: Option<f32>, on_complete: Option<Completion>) -> Uuid {
        self.halt().await;

        let id = Uuid::new_v4();
        let speed = speed_override.unwrap_or(self.config.default_speed);
        let source: Arc<str> = Arc::from(text);
        let tags = Arc::new(TagLexer::parse(text));

        let cancel = CancelSource::new();
        let completion = CompletionSlot::new(on_complete);
        let session = Session {
            id,
            tags: tags.clone(),
            registry: self.registry.clone(),
            sink: self.sink.clone(),
            events: self.events.clone(),
            state: self.state.clone(),
            completion: completion.clone(),
            cancel: cancel.token(),
            policy: self.config.unknown_tags,
            ctx: ProcessContext::new(source.clone(), speed, RenderMode::Live, self.clock.clone()),
        };

        tracing::info!(session = %id, len = text.len(), speed, "playback started");
        self.sink.set_text("");
        self.state.send_replace(PlaybackState::Typing);
        let _ = self.events.send(PlaybackEvent::Started { session: id });

        let task = tokio::spawn(session.run());
        self.active = Some(ActiveSession {
            id,
            cancel,
            task,
            completion,
            source,
            tags,
            speed,
        });
        id
    }

    /// Jump to the final text and fire completion as if playback had
    /// finished. Returns false if nothing was typing.
    ///
    /// The final text is rendered here, against the registry as it is now.
    pub async fn skip(&mut self) -> bool {
        if !self.is_typing() {
            return false;
        }
        let Some((active, outcome)) = self.halt_session().await else {
            return false;
        };
        if outcome == SessionOutcome::Completed {
            return false;
        }

        let final_text = render_instant(
            &active.source,
            &active.tags,
            &self.registry,
            self.config.unknown_tags,
            self.clock.clone(),
            active.speed,
        );
        tracing::info!(session = %active.id, "playback skipped");
        self.sink.set_text(&final_text);
        self.state.send_replace(PlaybackState::Completed);
        let _ = self.events.send(PlaybackEvent::Skipped { session: active.id });
        let _ = self.events.send(PlaybackEvent::Completed { session: active.id });
        active.completion.fire();
        true
    }

    /// Cancel without forcing final text and without firing completion.
    /// Returns false if nothing was typing.
    pub async fn stop(&mut self) -> bool {
        self.halt().await
    }

    /// Show the final form of `text` immediately, bypassing the reveal loop.
    pub async fn set_instant(&mut self, text: &str) {
        self.halt().await;
        let final_text = self.final_text(text);
        self.sink.set_text(&final_text);
        self.state.send_replace(PlaybackState::Completed);
    }

    /// Wait for the current session to end on its own.
    pub async fn join(&mut self) -> Option<SessionOutcome> {
        let active = self.active.take()?;
        Some(active.task.await.unwrap_or(SessionOutcome::Cancelled))
    }

    /// Final display text for `text` (markup applied, tags removed).
    pub fn final_text(&self, text: &str) -> String {
        let source: Arc<str> = Arc::from(text);
        let tags = TagLexer::parse(text);
        render_instant(
            &source,
            &tags,
            &self.registry,
            self.config.unknown_tags,
            self.clock.clone(),
            self.config.default_speed,
        )
    }

    pub fn strip(&self, text: &str) -> String {
        TagLexer::strip(text, &self.registry)
    }

    pub fn validate(&self, text: &str) -> ValidationResult {
        validator::validate(text, &self.registry)
    }

    pub fn used_tags(&self, text: &str) -> Vec<String> {
        lexer::get_used_tags(text)
    }

    /// Cancel the active session, if any, and record the cancellation.
    async fn halt(&mut self) -> bool {
        let was_typing = self.is_typing();
        match self.halt_session().await {
            Some((active, SessionOutcome::Cancelled)) if was_typing => {
                self.state.send_replace(PlaybackState::Cancelled);
                let _ = self.events.send(PlaybackEvent::Cancelled { session: active.id });
                tracing::info!(session = %active.id, "playback cancelled");
                true
            }
            _ => false,
        }
    }

    async fn halt_session(&mut self) -> Option<(ActiveSession, SessionOutcome)> {
        let mut active = self.active.take()?;
        active.cancel.cancel();
        let outcome = (&mut active.task).await.unwrap_or_else(|err| {
            tracing::warn!(session = %active.id, %err, "session task failed");
            SessionOutcome::Cancelled
        });
        Some((active, outcome))
    }
}
