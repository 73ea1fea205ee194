//! In-memory capture device backed by a fixed-size overwrite ring

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam::utils::CachePadded;
use ringbuf::traits::{Consumer, Observer, RingBuffer};
use ringbuf::HeapRb;
use tracing::{debug, info};

use crate::capture::frame::CapturedFrame;
use crate::capture::source::{AcquireError, CaptureSource, FrameListener, Lease, SlotReturn};

/// Capture device that buffers delivered frames in a ring of `max_images`
/// slots. When the ring is full the oldest buffered frame is overwritten, so
/// the producer never waits on the consumer.
///
/// At most `max_images` frames may be held by the consumer at once; beyond
/// that acquisition fails the way a hardware reader does when all of its
/// buffers are checked out. Acquired frames carry a [`Lease`], so dropping
/// one gives its slot back just as [`CaptureSource::release`] does.
pub struct RingCapture {
    /// Buffered frames, oldest first
    ring: Mutex<HeapRb<CapturedFrame>>,

    max_images: usize,

    /// Check-out bookkeeping shared with outstanding leases
    slots: Arc<Slots>,

    listener: Option<Arc<dyn FrameListener>>,

    /// Statistics
    stats: CachePadded<Stats>,
}

#[derive(Default)]
struct Stats {
    frames_delivered: AtomicUsize,
    frames_overwritten: AtomicUsize,
}

#[derive(Default)]
struct Slots {
    /// Frames acquired and not yet released
    acquired: CachePadded<AtomicUsize>,
    released: AtomicUsize,
}

impl SlotReturn for Slots {
    fn return_slot(&self) {
        let _ = self
            .acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        self.released.fetch_add(1, Ordering::Relaxed);
    }
}

/// Counters reported by [`RingCapture::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RingStats {
    pub delivered: usize,
    pub overwritten: usize,
    pub released: usize,
}

impl RingCapture {
    pub fn new(max_images: usize) -> Self {
        let max_images = max_images.max(1);
        info!("Creating capture ring with {} images", max_images);

        Self {
            ring: Mutex::new(HeapRb::new(max_images)),
            max_images,
            slots: Arc::new(Slots::default()),
            listener: None,
            stats: CachePadded::new(Stats::default()),
        }
    }

    /// Register the receiver of arrival notifications
    pub fn with_listener(mut self, listener: Arc<dyn FrameListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Frames currently buffered and not yet acquired
    pub fn buffered(&self) -> usize {
        self.lock().occupied_len()
    }

    /// Frames currently checked out by the consumer
    pub fn acquired(&self) -> usize {
        self.slots.acquired.load(Ordering::Acquire)
    }

    /// Producer: store a frame and signal its arrival
    pub fn deliver(&self, frame: CapturedFrame) {
        let sequence = frame.sequence();
        let evicted = self.lock().push_overwrite(frame);

        self.stats.frames_delivered.fetch_add(1, Ordering::Relaxed);
        if let Some(old) = evicted {
            debug!("Frame {} overwritten by {}", old.sequence(), sequence);
            self.stats.frames_overwritten.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(listener) = &self.listener {
            listener.on_frame_arrived();
        }
    }

    pub fn stats(&self) -> RingStats {
        RingStats {
            delivered: self.stats.frames_delivered.load(Ordering::Relaxed),
            overwritten: self.stats.frames_overwritten.load(Ordering::Relaxed),
            released: self.slots.released.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HeapRb<CapturedFrame>> {
        // A panic while holding the lock cannot leave the ring half-written.
        self.ring.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_out(&self) -> Result<(), AcquireError> {
        self.slots
            .acquired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_images).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| {
                AcquireError::Failure(format!(
                    "all {} images already acquired",
                    self.max_images
                ))
            })
    }

    /// Undo a check-out that found nothing to hand over
    fn cancel_check_out(&self) {
        self.slots.acquired.fetch_sub(1, Ordering::AcqRel);
    }

    fn lease(&self) -> Lease {
        Lease::new(self.slots.clone())
    }
}

impl CaptureSource for RingCapture {
    fn acquire_next(&self) -> Result<CapturedFrame, AcquireError> {
        self.check_out()?;

        match self.lock().try_pop() {
            Some(frame) => Ok(frame.with_lease(self.lease())),
            None => {
                self.cancel_check_out();
                Err(AcquireError::NoFrameAvailable)
            }
        }
    }

    fn acquire_latest(&self) -> Result<CapturedFrame, AcquireError> {
        self.check_out()?;

        let mut skipped = 0;
        let latest = {
            let mut ring = self.lock();
            let mut latest = None;
            while let Some(frame) = ring.try_pop() {
                if latest.replace(frame).is_some() {
                    skipped += 1;
                }
            }
            latest
        };

        if skipped > 0 {
            debug!("Skipped {} stale frames", skipped);
            self.slots.released.fetch_add(skipped, Ordering::Relaxed);
        }

        match latest {
            Some(frame) => Ok(frame.with_lease(self.lease())),
            None => {
                self.cancel_check_out();
                Err(AcquireError::NoFrameAvailable)
            }
        }
    }

    fn release(&self, frame: CapturedFrame) {
        debug!("Releasing frame {}", frame.sequence());
        drop(frame);
    }
}
