//! Style tags rewritten into the angle-bracket markup the display consumes.
//!
//! `[color=red]` → `<color=red>`, `[/color]` → `</color>`, `[b]` → `<b>`.

use anyhow::Result;

use super::TagProcessor;
use crate::context::{ProcessContext, ProcessResult};

/// Names shipped as builtins.
pub const STYLE_TAGS: [&str; 5] = ["color", "size", "b", "i", "u"];

#[derive(Debug, Clone)]
pub struct MarkupProcessor {
    name: String,
}

impl MarkupProcessor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
        }
    }

    pub fn opening_markup(&self, parameter: &str) -> String {
        if parameter.is_empty() {
            format!("<{}>", self.name)
        } else {
            format!("<{}={}>", self.name, parameter)
        }
    }

    pub fn closing_markup(&self) -> String {
        format!("</{}>", self.name)
    }
}

impl TagProcessor for MarkupProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires_closing(&self) -> bool {
        true
    }

    fn apply(&self, _ctx: &mut ProcessContext, parameter: &str) -> Result<ProcessResult> {
        Ok(ProcessResult::replace(self.opening_markup(parameter)))
    }

    fn close(&self, _ctx: &mut ProcessContext) -> Result<ProcessResult> {
        Ok(ProcessResult::replace(self.closing_markup()))
    }
}
