//! Tag processors: the handlers bound to tag names.
//!
//! - `pacing`: speed, speedregion, pause, clear, br / n
//! - `markup`: color, size, b, i, u rewritten into angle-bracket markup
//! - `action`: fires the action hub

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::context::{ProcessContext, ProcessResult};

pub mod action;
pub mod markup;
pub mod pacing;

pub use action::ActionProcessor;
pub use markup::MarkupProcessor;
pub use pacing::{BreakProcessor, ClearProcessor, PauseProcessor, SpeedProcessor, SpeedRegionProcessor};

/// The synchronous processor contract.
pub trait TagProcessor: Send + Sync {
    fn name(&self) -> &str;

    /// Region tags come in `[name]` … `[/name]` pairs.
    fn requires_closing(&self) -> bool {
        false
    }

    fn apply(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult>;

    fn close(&self, _ctx: &mut ProcessContext) -> Result<ProcessResult> {
        Ok(ProcessResult::invisible())
    }

    /// Whether `strip` drops this tag's span.
    fn should_strip(&self, _text: &str, _start: usize) -> bool {
        true
    }
}

/// A processor whose opening effect suspends the reveal loop.
///
/// The synchronous `apply` is still used when rendering instantly.
#[async_trait]
pub trait AsyncTagProcessor: TagProcessor {
    async fn apply_async(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult>;
}

/// A registered processor, tagged by how it must be driven.
#[derive(Clone)]
pub enum ProcessorHandle {
    Sync(Arc<dyn TagProcessor>),
    Async(Arc<dyn AsyncTagProcessor>),
}

impl std::fmt::Debug for ProcessorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self {
            ProcessorHandle::Sync(_) => "Sync",
            ProcessorHandle::Async(_) => "Async",
        };
        f.debug_struct("ProcessorHandle")
            .field("kind", &kind)
            .field("name", &self.name())
            .finish()
    }
}

impl ProcessorHandle {
    pub fn sync<P: TagProcessor + 'static>(processor: P) -> Self {
        ProcessorHandle::Sync(Arc::new(processor))
    }

    pub fn asynchronous<P: AsyncTagProcessor + 'static>(processor: P) -> Self {
        ProcessorHandle::Async(Arc::new(processor))
    }

    pub fn name(&self) -> &str {
        match self {
            ProcessorHandle::Sync(p) => p.name(),
            ProcessorHandle::Async(p) => p.name(),
        }
    }

    pub fn requires_closing(&self) -> bool {
        match self {
            ProcessorHandle::Sync(p) => p.requires_closing(),
            ProcessorHandle::Async(p) => p.requires_closing(),
        }
    }

    pub fn should_strip(&self, text: &str, start: usize) -> bool {
        match self {
            ProcessorHandle::Sync(p) => p.should_strip(text, start),
            ProcessorHandle::Async(p) => p.should_strip(text, start),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, ProcessorHandle::Async(_))
    }

    /// Synchronous opening effect, for either variant.
    pub fn apply(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        match self {
            ProcessorHandle::Sync(p) => p.apply(ctx, parameter),
            ProcessorHandle::Async(p) => p.apply(ctx, parameter),
        }
    }

    /// Opening effect on the live path: suspends for async processors.
    pub async fn apply_live(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        match self {
            ProcessorHandle::Sync(p) => p.apply(ctx, parameter),
            ProcessorHandle::Async(p) => p.apply_async(ctx, parameter).await,
        }
    }

    pub fn close(&self, ctx: &mut ProcessContext) -> Result<ProcessResult> {
        match self {
            ProcessorHandle::Sync(p) => p.close(ctx),
            ProcessorHandle::Async(p) => p.close(ctx),
        }
    }
}

/// Parse a seconds parameter shared by `speed`, `speedregion` and `pause`.
pub(crate) fn parse_seconds(tag: &str, parameter: &str) -> crate::error::Result<f32> {
    let value = parameter.trim();
    value
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| crate::error::TagwriterError::InvalidParameter {
            tag: tag.to_string(),
            value: parameter.to_string(),
        })
}
