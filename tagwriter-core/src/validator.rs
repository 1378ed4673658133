//! Well-formedness checks over lexed tags. Pure: never runs a processor.

use serde::Serialize;
use thiserror::Error;

use crate::lexer::TagLexer;
use crate::registry::ProcessorRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum TagIssue {
    #[error("unknown tag [{name}] at {offset}")]
    UnknownTag { name: String, offset: usize },

    #[error("unclosed tag [{name}] opened at {offset}")]
    UnclosedTag { name: String, offset: usize },

    #[error("mismatched closing tag [/{name}] at {offset} (expected {})", expected_label(.expected))]
    MismatchedClosing {
        name: String,
        expected: Option<String>,
        offset: usize,
    },

    #[error("closing tag [/{name}] at {offset} but [{name}] is not a region tag")]
    ClosingNonRegion { name: String, offset: usize },
}

fn expected_label(expected: &Option<String>) -> String {
    match expected {
        Some(name) => format!("[/{name}]"),
        None => "no closing tag".to_string(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<TagIssue>,
    pub warnings: Vec<TagIssue>,
}

impl ValidationResult {
    /// One line per issue, errors first.
    pub fn report(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("error: {e}"))
            .chain(self.warnings.iter().map(|w| format!("warning: {w}")))
            .collect()
    }
}

pub fn validate(text: &str, registry: &ProcessorRegistry) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut open: Vec<(String, usize)> = Vec::new();

    for record in TagLexer::parse(text) {
        let Some(processor) = registry.get(&record.name) else {
            errors.push(TagIssue::UnknownTag {
                name: record.name,
                offset: record.start,
            });
            continue;
        };

        if !processor.requires_closing() {
            if record.closing {
                warnings.push(TagIssue::ClosingNonRegion {
                    name: record.name,
                    offset: record.start,
                });
            }
            continue;
        }

        if !record.closing {
            open.push((record.name, record.start));
            continue;
        }

        let expected = open.last().map(|(name, _)| name.clone());
        if expected.as_deref() == Some(record.name.as_str()) {
            open.pop();
        } else {
            errors.push(TagIssue::MismatchedClosing {
                name: record.name,
                expected,
                offset: record.start,
            });
        }
    }

    errors.extend(
        open.into_iter()
            .map(|(name, offset)| TagIssue::UnclosedTag { name, offset }),
    );

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}
