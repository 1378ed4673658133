//! Bracket tag lexer.
//!
//! Finds `[name]`, `[name=param]` and `[/name]` spans in source text and
//! reports them as positional records. Executes nothing.
//!
//! Offsets are UTF-8 byte offsets into the original text; `end` is exclusive.
//! The delimiters are ASCII, so every offset lands on a char boundary.

use crate::registry::ProcessorRegistry;

/// One lexed bracket tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    /// Trimmed, lower-cased.
    pub name: String,
    /// Raw text after the first `=`. Empty when absent or on closing tags.
    pub parameter: String,
    /// The verbatim `[...]` span.
    pub full_text: String,
    pub start: usize,
    pub end: usize,
    pub closing: bool,
}

impl TagRecord {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

pub struct TagLexer;

impl TagLexer {
    /// Lex `text` into records ordered by strictly increasing, non-overlapping
    /// `start`. An unmatched `[` is literal text.
    pub fn parse(text: &str) -> Vec<TagRecord> {
        let bytes = text.as_bytes();
        let mut records = Vec::new();
        let mut pos = 0;

        while let Some(rel_open) = bytes[pos..].iter().position(|&b| b == b'[') {
            let open = pos + rel_open;
            let Some(rel_close) = bytes[open + 1..].iter().position(|&b| b == b']') else {
                // No `]` anywhere after this point, so no further tags either.
                break;
            };
            let close = open + 1 + rel_close;
            pos = close + 1;

            if let Some(record) = Self::record(text, open, close) {
                records.push(record);
            }
        }

        records
    }

    fn record(text: &str, open: usize, close: usize) -> Option<TagRecord> {
        let inner = &text[open + 1..close];

        let (name, parameter, closing) = match inner.strip_prefix('/') {
            Some(rest) => (rest, "", true),
            None => match inner.split_once('=') {
                Some((name, param)) => (name, param, false),
                None => (inner, "", false),
            },
        };

        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(TagRecord {
            name: name.to_lowercase(),
            parameter: parameter.to_string(),
            full_text: text[open..=close].to_string(),
            start: open,
            end: close + 1,
            closing,
        })
    }

    /// Remove every tag span whose processor asks to be stripped; everything
    /// else (text, unregistered tags) is copied verbatim.
    pub fn strip(text: &str, registry: &ProcessorRegistry) -> String {
        let records = Self::parse(text);
        Self::strip_records(text, &records, registry)
    }

    /// Same as [`TagLexer::strip`] over an already-lexed record list.
    pub fn strip_records(text: &str, records: &[TagRecord], registry: &ProcessorRegistry) -> String {
        let mut out = String::with_capacity(text.len());
        let mut copied_to = 0;

        for record in records {
            let strip = registry
                .get(&record.name)
                .is_some_and(|p| p.should_strip(text, record.start));
            if strip {
                out.push_str(&text[copied_to..record.start]);
                copied_to = record.end;
            }
        }
        out.push_str(&text[copied_to..]);
        out
    }
}

/// Distinct tag names in order of first appearance, opening or closing.
pub fn get_used_tags(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in TagLexer::parse(text) {
        if !names.contains(&record.name) {
            names.push(record.name);
        }
    }
    names
}
