//! Lock-free admission counter between frame arrival and consumption

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;
use tracing::trace;

use crate::capture::FrameListener;

/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 2;

/// Bounded count of frames that have arrived but not been consumed.
///
/// The producer context calls [`on_frame_arrived`](Self::on_frame_arrived),
/// the consumer context calls [`try_consume_one`](Self::try_consume_one).
/// Both are single atomic read-modify-write operations, so the count stays
/// within `0..=capacity` however the two interleave. Arrivals past capacity
/// are absorbed: the capture device keeps only its newest frames anyway.
pub struct FrameBufferQueue {
    available: CachePadded<AtomicUsize>,
    capacity: usize,

    /// Statistics
    stats: CachePadded<Stats>,
}

#[derive(Default)]
struct Stats {
    frames_arrived: AtomicUsize,
    frames_consumed: AtomicUsize,
    frames_superseded: AtomicUsize,
}

/// Snapshot of queue activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub arrived: usize,
    pub consumed: usize,
    /// Arrivals that found the queue already at capacity
    pub superseded: usize,
}

impl FrameBufferQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            available: CachePadded::new(AtomicUsize::new(0)),
            capacity,
            stats: CachePadded::new(Stats::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.available.load(Ordering::Acquire)
    }

    /// Producer: admit one frame if below capacity, otherwise leave the count
    pub fn on_frame_arrived(&self) {
        self.stats.frames_arrived.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("frames_arrived").increment(1);

        let admitted = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok();

        if !admitted {
            trace!("Queue full, arrival superseded");
            self.stats.frames_superseded.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("frames_superseded").increment(1);
        }
    }

    /// Consumer: take one unit if any are available
    pub fn try_consume_one(&self) -> bool {
        let consumed = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok();

        if consumed {
            self.stats.frames_consumed.fetch_add(1, Ordering::Relaxed);
        }
        consumed
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            arrived: self.stats.frames_arrived.load(Ordering::Relaxed),
            consumed: self.stats.frames_consumed.load(Ordering::Relaxed),
            superseded: self.stats.frames_superseded.load(Ordering::Relaxed),
        }
    }
}

impl Default for FrameBufferQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl FrameListener for FrameBufferQueue {
    fn on_frame_arrived(&self) {
        FrameBufferQueue::on_frame_arrived(self);
    }
}
