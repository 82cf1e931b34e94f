//! Download admission control.
//!
//! Two layers guard the image waterfall: a queue-depth counter that
//! rejects work outright when too many requests are in flight, and a
//! counting semaphore that bounds how many downloads execute at once.
//! The counter is adjusted only inside short lock sections; the wait
//! happens on the semaphore, never under the lock.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::ArtworkError;

/// Tuning for the download queue.
#[derive(Debug, Clone)]
pub struct QueueOptions {
    /// Maximum requests admitted (waiting or downloading)
    pub queue_limit: usize,
    /// Maximum downloads executing concurrently
    pub concurrency: usize,
    /// How long to wait for a download slot before giving up
    pub slot_timeout: Duration,
}

/// Shared admission state for image downloads.
pub struct DownloadQueue {
    queue_limit: usize,
    in_flight: Mutex<usize>,
    slots: Arc<Semaphore>,
    slot_timeout: Duration,
}

impl DownloadQueue {
    pub fn new(options: QueueOptions) -> Self {
        Self {
            queue_limit: options.queue_limit.max(1),
            in_flight: Mutex::new(0),
            slots: Arc::new(Semaphore::new(options.concurrency.max(1))),
            slot_timeout: options.slot_timeout,
        }
    }

    /// Atomically claim a queue position, or reject when at capacity.
    ///
    /// The returned [`Admission`] releases the position on drop, so every
    /// exit path - success, timeout, upstream failure - gives it back.
    pub fn admit(&self) -> Result<Admission<'_>, ArtworkError> {
        let mut in_flight = self.in_flight.lock();
        if *in_flight >= self.queue_limit {
            return Err(ArtworkError::QueueFull);
        }
        *in_flight += 1;
        Ok(Admission {
            queue: self,
            position: *in_flight,
        })
    }

    /// Wait for a download slot, up to the configured timeout.
    pub async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, ArtworkError> {
        let slots = Arc::clone(&self.slots);
        match tokio::time::timeout(self.slot_timeout, slots.acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            // The semaphore is never closed; treat it like a timeout anyway.
            Ok(Err(_)) | Err(_) => Err(ArtworkError::QueueBusy),
        }
    }

    /// Requests currently admitted.
    pub fn depth(&self) -> usize {
        *self.in_flight.lock()
    }
}

/// A claimed queue position; dropping it releases the position.
pub struct Admission<'a> {
    queue: &'a DownloadQueue,
    position: usize,
}

impl Admission<'_> {
    /// Number of requests that were ahead at admission time.
    pub fn ahead(&self) -> usize {
        self.position.saturating_sub(1)
    }
}

impl Drop for Admission<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.queue.in_flight.lock();
        *in_flight = in_flight.saturating_sub(1);
    }
}
