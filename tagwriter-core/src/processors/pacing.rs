//! Playback pacing and buffer control.

use anyhow::Result;
use async_trait::async_trait;

use super::{AsyncTagProcessor, TagProcessor, parse_seconds};
use crate::context::{ProcessContext, ProcessResult};

/// `[speed=0.1]`: seconds per character from here on.
#[derive(Debug, Default)]
pub struct SpeedProcessor;

impl TagProcessor for SpeedProcessor {
    fn name(&self) -> &str {
        "speed"
    }

    fn apply(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        ctx.speed = parse_seconds("speed", parameter)?;
        Ok(ProcessResult::invisible())
    }
}

/// `[speedregion=0.01]` … `[/speedregion]`: temporary speed, restored LIFO.
#[derive(Debug, Default)]
pub struct SpeedRegionProcessor;

impl TagProcessor for SpeedRegionProcessor {
    fn name(&self) -> &str {
        "speedregion"
    }

    fn requires_closing(&self) -> bool {
        true
    }

    fn apply(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        // Push even when the parameter is bad so the matching close pops
        // this region's entry, not the enclosing one.
        ctx.speed_stack.push(ctx.speed);
        ctx.speed = parse_seconds("speedregion", parameter)?;
        Ok(ProcessResult::invisible())
    }

    fn close(&self, ctx: &mut ProcessContext) -> Result<ProcessResult> {
        match ctx.speed_stack.pop() {
            Some(previous) => ctx.speed = previous,
            None => tracing::warn!(cursor = ctx.cursor, "[/speedregion] without an open region"),
        }
        Ok(ProcessResult::invisible())
    }
}

/// `[pause=0.5]`: suspend the reveal loop.
#[derive(Debug, Default)]
pub struct PauseProcessor;

impl TagProcessor for PauseProcessor {
    fn name(&self) -> &str {
        "pause"
    }

    fn apply(&self, _ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        parse_seconds("pause", parameter)?;
        Ok(ProcessResult::invisible())
    }
}

#[async_trait]
impl AsyncTagProcessor for PauseProcessor {
    async fn apply_async(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        let seconds = parse_seconds("pause", parameter)?;
        if seconds > 0.0 {
            ctx.clock.delay(seconds).await?;
        }
        Ok(ProcessResult::invisible())
    }
}

/// `[clear]`: empty the revealed text.
#[derive(Debug, Default)]
pub struct ClearProcessor;

impl TagProcessor for ClearProcessor {
    fn name(&self) -> &str {
        "clear"
    }

    fn apply(&self, ctx: &mut ProcessContext, _parameter: &str) -> Result<ProcessResult> {
        ctx.buffer.clear();
        Ok(ProcessResult::invisible())
    }
}

/// `[br]` / `[n]`: one newline.
#[derive(Debug)]
pub struct BreakProcessor {
    name: &'static str,
}

impl BreakProcessor {
    pub fn br() -> Self {
        Self { name: "br" }
    }

    pub fn n() -> Self {
        Self { name: "n" }
    }
}

impl TagProcessor for BreakProcessor {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, _ctx: &mut ProcessContext, _parameter: &str) -> Result<ProcessResult> {
        Ok(ProcessResult::replace("\n"))
    }
}
