//! The time base the reveal loop suspends on.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Result, TagwriterError};

/// Host-supplied delay primitive. The caller races it against cancellation,
/// so implementations need not watch for it themselves.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn delay(&self, seconds: f32) -> Result<()>;
}

/// Real time via tokio timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn delay(&self, seconds: f32) -> Result<()> {
        if seconds <= 0.0 {
            return Ok(());
        }
        let duration = Duration::try_from_secs_f32(seconds)
            .map_err(|e| TagwriterError::Clock(format!("{seconds}s: {e}")))?;
        tokio::time::sleep(duration).await;
        Ok(())
    }
}
