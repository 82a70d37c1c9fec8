// ── Runtime sharing configuration ──
//
// Describes *how* a shared stream buffers and when it tears down its
// upstream. Never touches disk: `hotstate-config` builds one of these
// from TOML/env and hands it in.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay between the last unsubscription and upstream teardown.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Per-subscriber buffer before the overflow policy applies.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64;

/// What a slow subscriber sees when it falls behind the upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// Every buffered update is delivered in order; once the buffer is full
    /// the oldest updates are dropped and the subscriber resumes from the
    /// oldest one still buffered.
    #[default]
    DropOldest,
    /// Each receive skips ahead to the newest buffered update.
    Conflate,
}

/// Tuning for a [`SharedStream`](crate::SharedStream) and the cell feeding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharingConfig {
    /// How long the upstream survives with zero subscribers. Zero stops it
    /// as soon as the last subscriber leaves.
    pub grace_period: Duration,
    /// Bounded buffer per subscriber (must be non-zero).
    pub buffer_capacity: usize,
    /// Policy for subscribers that fall behind.
    pub overflow: Overflow,
}

impl SharingConfig {
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn with_buffer_capacity(mut self, buffer_capacity: usize) -> Self {
        self.buffer_capacity = buffer_capacity;
        self
    }

    pub fn with_overflow(mut self, overflow: Overflow) -> Self {
        self.overflow = overflow;
        self
    }

    /// Capacity clamped to what `tokio::sync::broadcast` accepts.
    pub(crate) fn channel_capacity(&self) -> usize {
        self.buffer_capacity.max(1)
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            grace_period: DEFAULT_GRACE_PERIOD,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            overflow: Overflow::default(),
        }
    }
}
