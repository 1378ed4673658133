//! The reveal loop.
//!
//! A session walks the source one character at a time with a forward-only
//! cursor into the lexed tag list. It suspends in exactly two places:
//!
//! - `CharacterDelay`: the inter-character wait (`speed` seconds)
//! - `TagEffect`: an async processor's opening effect (e.g. `pause`)
//!
//! Both are raced against the cancel token, and the token is checked again on
//! resume before the buffer is touched. A cancelled session exits without
//! pushing text, firing events, or running the completion callback.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, watch};
use tracing::Instrument;
use uuid::Uuid;

use super::cancel::CancelToken;
use super::clock::Clock;
use super::sink::DisplaySink;
use super::{PlaybackEvent, PlaybackState};
use crate::config::UnknownTagPolicy;
use crate::context::{ProcessContext, ProcessResult, RenderMode};
use crate::error::TagwriterError;
use crate::lexer::TagRecord;
use crate::processors::ProcessorHandle;
use crate::registry::ProcessorRegistry;

pub type Completion = Box<dyn FnOnce() + Send + 'static>;

/// Units revealed between forced yields when nothing else suspends the loop.
const YIELD_EVERY: usize = 64;

/// Holds the completion callback until someone fires it. Fires at most once.
#[derive(Clone, Default)]
pub(crate) struct CompletionSlot(Arc<Mutex<Option<Completion>>>);

impl CompletionSlot {
    pub(crate) fn new(callback: Option<Completion>) -> Self {
        Self(Arc::new(Mutex::new(callback)))
    }

    pub(crate) fn fire(&self) -> bool {
        let callback = self.0.lock().unwrap_or_else(|e| e.into_inner()).take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy)]
enum Suspension {
    CharacterDelay,
    TagEffect,
}

/// Cancellation observed at a suspension point.
#[derive(Debug)]
struct Cancelled;

async fn suspend<F: Future>(
    cancel: &CancelToken,
    point: Suspension,
    work: F,
) -> Result<F::Output, Cancelled> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::trace!(?point, "cancelled while suspended");
            Err(Cancelled)
        }
        out = work => {
            if cancel.is_cancelled() {
                tracing::trace!(?point, "cancelled on resume");
                Err(Cancelled)
            } else {
                Ok(out)
            }
        }
    }
}

pub(crate) struct Session {
    pub id: Uuid,
    pub tags: Arc<Vec<TagRecord>>,
    pub registry: Arc<ProcessorRegistry>,
    pub sink: Arc<dyn DisplaySink>,
    pub events: broadcast::Sender<PlaybackEvent>,
    pub state: Arc<watch::Sender<PlaybackState>>,
    pub completion: CompletionSlot,
    pub cancel: CancelToken,
    pub policy: UnknownTagPolicy,
    pub ctx: ProcessContext,
}

impl Session {
    pub async fn run(mut self) -> SessionOutcome {
        let span = tracing::info_span!("session", id = %self.id);
        async move {
            match self.reveal().await {
                Ok(()) => self.complete(),
                Err(Cancelled) => self.abandon(),
            }
        }
        .instrument(span)
        .await
    }

    async fn reveal(&mut self) -> Result<(), Cancelled> {
        let text = self.ctx.source.clone();
        let tags = self.tags.clone();
        let mut next_tag = 0;
        let mut i = 0;
        let mut steps = 0usize;

        tracing::debug!(len = text.len(), tags = tags.len(), "reveal started");

        while i < text.len() {
            if self.cancel.is_cancelled() {
                return Err(Cancelled);
            }
            steps += 1;
            if steps % YIELD_EVERY == 0 && self.ctx.speed <= 0.0 {
                tokio::task::yield_now().await;
                if self.cancel.is_cancelled() {
                    return Err(Cancelled);
                }
            }
            self.ctx.cursor = i;

            while tags.get(next_tag).is_some_and(|t| t.start < i) {
                next_tag += 1;
            }

            if let Some(record) = tags.get(next_tag).filter(|t| t.start == i) {
                next_tag += 1;
                if let Some(handle) = resolve(&self.registry, record, self.policy) {
                    let result = self.run_tag(&handle, record).await?;
                    let visible = result.handled && !result.suppress_reveal;
                    if visible {
                        if let Some(shown) = &result.replacement {
                            let _ = self.events.send(PlaybackEvent::Revealed {
                                text: shown.clone(),
                                offset: i,
                            });
                        }
                    }
                    apply_result(&mut self.ctx.buffer, &result);
                    self.sink.set_text(&self.ctx.buffer);

                    if visible && self.ctx.speed > 0.0 {
                        self.character_delay().await?;
                    }
                    i = advance(&text, record, &result);
                    continue;
                }
                if self.policy == UnknownTagPolicy::Consume {
                    self.sink.set_text(&self.ctx.buffer);
                    i = record.end;
                    continue;
                }
            }

            let Some(ch) = text[i..].chars().next() else {
                break;
            };
            self.ctx.buffer.push(ch);
            let _ = self.events.send(PlaybackEvent::Revealed {
                text: ch.to_string(),
                offset: i,
            });
            self.sink.set_text(&self.ctx.buffer);

            if self.ctx.speed > 0.0 {
                self.character_delay().await?;
            }
            i += ch.len_utf8();
        }

        Ok(())
    }

    async fn character_delay(&mut self) -> Result<(), Cancelled> {
        let speed = self.ctx.speed;
        match suspend(&self.cancel, Suspension::CharacterDelay, self.ctx.clock.delay(speed)).await? {
            Ok(()) => Ok(()),
            Err(err) => {
                tracing::warn!(%err, "clock failed, cancelling session");
                Err(Cancelled)
            }
        }
    }

    async fn run_tag(&mut self, handle: &ProcessorHandle, record: &TagRecord) -> Result<ProcessResult, Cancelled> {
        let outcome = if record.closing && handle.requires_closing() {
            handle.close(&mut self.ctx)
        } else if handle.is_async() {
            suspend(
                &self.cancel,
                Suspension::TagEffect,
                handle.apply_live(&mut self.ctx, &record.parameter),
            )
            .await?
        } else {
            handle.apply(&mut self.ctx, &record.parameter)
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                if let Some(TagwriterError::Clock(_)) = err.downcast_ref::<TagwriterError>() {
                    tracing::warn!(%err, tag = %record.name, "clock failed, cancelling session");
                    return Err(Cancelled);
                }
                tracing::warn!(%err, tag = %record.name, offset = record.start, "processor failed");
                Ok(ProcessResult::unhandled())
            }
        }
    }

    fn complete(self) -> SessionOutcome {
        self.state.send_replace(PlaybackState::Completed);
        let _ = self.events.send(PlaybackEvent::Completed { session: self.id });
        self.completion.fire();
        tracing::debug!("reveal completed");
        SessionOutcome::Completed
    }

    fn abandon(self) -> SessionOutcome {
        // Owner-requested cancels are reported by the owner; anything else
        // (a failing clock) is reported here.
        if !self.cancel.is_cancelled() {
            self.state.send_replace(PlaybackState::Cancelled);
            let _ = self.events.send(PlaybackEvent::Cancelled { session: self.id });
        }
        tracing::debug!("reveal cancelled");
        SessionOutcome::Cancelled
    }
}

/// Look up the processor for `record`. Unknown names are logged and skipped.
fn resolve(registry: &ProcessorRegistry, record: &TagRecord, policy: UnknownTagPolicy) -> Option<ProcessorHandle> {
    let handle = registry.get(&record.name);
    if handle.is_none() {
        tracing::debug!(tag = %record.name, offset = record.start, ?policy, "unknown tag");
    }
    handle
}

fn apply_result(buffer: &mut String, result: &ProcessResult) {
    if !result.handled {
        return;
    }
    if let Some(replacement) = &result.replacement {
        buffer.push_str(replacement);
    }
}

/// Where the loop resumes after a tag: the end of the tag, or further if the
/// processor claimed a longer span.
fn advance(text: &str, record: &TagRecord, result: &ProcessResult) -> usize {
    let mut next = record.end.max(record.start + result.consumed_length).min(text.len());
    while !text.is_char_boundary(next) {
        next += 1;
    }
    next
}

/// Final text for `text` in one synchronous pass: no delays, no suspension,
/// async processors run their synchronous form.
pub(crate) fn render_instant(
    text: &Arc<str>,
    tags: &[TagRecord],
    registry: &ProcessorRegistry,
    policy: UnknownTagPolicy,
    clock: Arc<dyn Clock>,
    speed: f32,
) -> String {
    let mut ctx = ProcessContext::new(text.clone(), speed, RenderMode::Instant, clock);
    let mut next_tag = 0;
    let mut i = 0;

    while i < text.len() {
        ctx.cursor = i;
        while tags.get(next_tag).is_some_and(|t| t.start < i) {
            next_tag += 1;
        }

        if let Some(record) = tags.get(next_tag).filter(|t| t.start == i) {
            next_tag += 1;
            if let Some(handle) = resolve(registry, record, policy) {
                let outcome = if record.closing && handle.requires_closing() {
                    handle.close(&mut ctx)
                } else {
                    handle.apply(&mut ctx, &record.parameter)
                };
                let result = outcome.unwrap_or_else(|err| {
                    tracing::warn!(%err, tag = %record.name, offset = record.start, "processor failed");
                    ProcessResult::unhandled()
                });
                apply_result(&mut ctx.buffer, &result);
                i = advance(text, record, &result);
                continue;
            }
            if policy == UnknownTagPolicy::Consume {
                i = record.end;
                continue;
            }
        }

        let Some(ch) = text[i..].chars().next() else {
            break;
        };
        ctx.buffer.push(ch);
        i += ch.len_utf8();
    }

    ctx.buffer
}
