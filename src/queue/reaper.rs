//! Expiry Reaper - periodic TTL sweep
//!
//! Scans the scheduler on a fixed interval and moves every expired message
//! to the dead-letter sink with reason `Expired`. Sweeps take one clock
//! reading for the whole pass and operate bucket-by-bucket, so they are
//! safe alongside concurrent enqueues and drains.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::watch;

use crate::queue::dead_letter::{DeadLetterReason, DeadLetterSink};
use crate::queue::scheduler::PriorityScheduler;

pub struct ExpiryReaper {
    scheduler: Arc<PriorityScheduler>,
    dead_letters: Arc<DeadLetterSink>,
    interval: Duration,
}

impl ExpiryReaper {
    pub fn new(
        scheduler: Arc<PriorityScheduler>,
        dead_letters: Arc<DeadLetterSink>,
        interval: Duration,
    ) -> Self {
        Self {
            scheduler,
            dead_letters,
            interval,
        }
    }

    /// One sweep. Returns the number of messages reaped; repeating a sweep
    /// with no new expirations reaps nothing further.
    pub fn sweep(&self) -> usize {
        let expired = self.scheduler.remove_expired(SystemTime::now());
        let reaped = expired.len();
        for message in expired {
            self.dead_letters.record(message, DeadLetterReason::Expired);
        }
        if reaped > 0 {
            log::info!("Reaped {reaped} expired messages");
        }
        reaped
    }

    /// Periodic sweep loop; exits when the shutdown signal flips.
    pub(crate) async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so a fresh engine
        // doesn't sweep before anything can have expired.
        ticker.tick().await;

        log::debug!("Expiry reaper started (interval: {:?})", self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.changed() => break,
            }
        }
        log::debug!("Expiry reaper stopped");
    }
}
