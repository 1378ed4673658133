//! Playback configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What the reveal loop does with a bracket span whose name is not registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTagPolicy {
    /// Swallow the span; it has no visible effect.
    #[default]
    Consume,
    /// Reveal the span as ordinary text.
    Literal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Seconds between revealed characters when `start` gets no override.
    pub default_speed: f32,
    pub unknown_tags: UnknownTagPolicy,
    /// Capacity of the playback event broadcast channel.
    pub event_capacity: usize,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            default_speed: 0.05,
            unknown_tags: UnknownTagPolicy::Consume,
            event_capacity: 64,
        }
    }
}

impl TypewriterConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
