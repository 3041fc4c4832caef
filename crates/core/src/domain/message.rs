// Message Domain Model

use crate::domain::error::{DomainError, Result};
use bytes::Bytes;
use std::time::Duration;

/// Message identifier, monotonically increasing within one store
pub type MessageId = i64;

/// Largest body accepted by enqueue (1 MiB)
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// Longest enqueue delay accepted (7 days)
pub const MAX_DELAY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A message held by a queue store.
///
/// Visibility is not stored as a state column: a message is leased exactly
/// while `visible_at` lies in the future, so an expired lease reverts to
/// visible without anything having to rewrite the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub body: Bytes,
    pub created_at: i64, // epoch ms
    pub visible_at: i64, // epoch ms
}

/// Visibility of a message at a given instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    LeasedUntil(i64),
}

impl Message {
    pub fn visibility(&self, now_millis: i64) -> Visibility {
        if self.visible_at <= now_millis {
            Visibility::Visible
        } else {
            Visibility::LeasedUntil(self.visible_at)
        }
    }

    pub fn is_visible(&self, now_millis: i64) -> bool {
        self.visibility(now_millis) == Visibility::Visible
    }
}

pub fn validate_body(body: &[u8]) -> Result<()> {
    if body.len() > MAX_MESSAGE_BYTES {
        return Err(DomainError::MessageTooLarge {
            size: body.len(),
            max: MAX_MESSAGE_BYTES,
        });
    }
    Ok(())
}

pub fn validate_delay(delay: Duration) -> Result<()> {
    if delay > MAX_DELAY {
        return Err(DomainError::DelayTooLong {
            delay_ms: delay.as_millis() as u64,
            max_ms: MAX_DELAY.as_millis() as u64,
        });
    }
    Ok(())
}

/// Duration as epoch-ms offset, saturating instead of wrapping
pub fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}
