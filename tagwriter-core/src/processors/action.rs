use std::sync::Arc;

use anyhow::Result;
use tagwriter_signal::ActionHub;

use super::TagProcessor;
use crate::context::{ProcessContext, ProcessResult, RenderMode};

/// `[action=payload]`: fire the action hub with the raw parameter.
///
/// Silent when rendering instantly, so `skip` never replays notifications.
#[derive(Debug, Clone)]
pub struct ActionProcessor {
    hub: Arc<ActionHub>,
}

impl ActionProcessor {
    pub fn new(hub: Arc<ActionHub>) -> Self {
        Self { hub }
    }
}

impl Default for ActionProcessor {
    fn default() -> Self {
        Self::new(ActionHub::global())
    }
}

impl TagProcessor for ActionProcessor {
    fn name(&self) -> &str {
        "action"
    }

    fn apply(&self, ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        if ctx.mode == RenderMode::Live {
            let reached = self.hub.emit(parameter);
            tracing::debug!(payload = parameter, reached, "action fired");
        }
        Ok(ProcessResult::invisible())
    }
}
