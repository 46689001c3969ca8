//! Batch pacing toward the upstream API
//!
//! Garmin Connect enforces an undocumented rate limit; fetching many days in
//! a tight loop gets the account throttled. Days are processed in fixed-size
//! batches with a mandatory pause between batches.

use std::time::Duration;

/// Days fetched back to back before pausing
pub const DEFAULT_BATCH_SIZE: usize = 7;

/// Pause between batches
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(15);

pub struct BatchPacer {
    batch_size: usize,
    delay: Duration,
    processed: usize,
}

impl Default for BatchPacer {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE, DEFAULT_BATCH_DELAY)
    }
}

impl BatchPacer {
    pub fn new(batch_size: usize, delay: Duration) -> Self {
        Self {
            batch_size: batch_size.max(1),
            delay,
            processed: 0,
        }
    }

    /// Record one finished item; the returned delay, if any, must pass
    /// before the next fetch. The last batch never waits.
    pub fn item_done(&mut self, remaining: usize) -> Option<Duration> {
        self.processed += 1;
        if remaining > 0 && self.processed % self.batch_size == 0 {
            Some(self.delay)
        } else {
            None
        }
    }

    /// Sleep out the inter-batch delay when one is due
    pub fn pause(&mut self, remaining: usize) {
        if let Some(delay) = self.item_done(remaining) {
            tracing::info!("pausing {delay:?} before the next batch");
            std::thread::sleep(delay);
        }
    }
}
