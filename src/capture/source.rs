//! Contract between the pipeline and whatever owns the capture buffers

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::frame::CapturedFrame;

/// Which buffered frame to take when acquiring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AcquirePolicy {
    /// Oldest buffered frame, in arrival order, nothing skipped
    Next,
    /// Newest buffered frame; older ones are released unseen
    #[default]
    Latest,
}

/// Outcome of an acquisition that produced no frame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Nothing buffered yet. An idle tick, not a fault.
    #[error("no frame available")]
    NoFrameAvailable,

    /// The device reported a non-success status
    #[error("acquisition failed: {0}")]
    Failure(String),
}

/// Receives the device's "new frame ready" signal. Called from the producer
/// context, never blocks.
pub trait FrameListener: Send + Sync {
    fn on_frame_arrived(&self);
}

/// Device-side bookkeeping for frames that are checked out
pub trait SlotReturn: Send + Sync {
    fn return_slot(&self);
}

/// Claim on one of a device's acquisition slots, carried by an acquired
/// frame. The slot goes back to the device when the lease is dropped, so a
/// frame that is discarded without [`CaptureSource::release`] is still
/// returned.
pub struct Lease(Arc<dyn SlotReturn>);

impl Lease {
    pub fn new(owner: Arc<dyn SlotReturn>) -> Self {
        Self(owner)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.return_slot();
    }
}

impl fmt::Debug for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Lease")
    }
}

/// Capture subsystem as seen from the pipeline.
///
/// Implementations are shared between the producer context (which delivers
/// frames and fires arrival notifications) and the consumer context, so all
/// methods take `&self`.
pub trait CaptureSource: Send + Sync {
    fn acquire_next(&self) -> Result<CapturedFrame, AcquireError>;

    fn acquire_latest(&self) -> Result<CapturedFrame, AcquireError>;

    /// Hand a frame back to the device. Implementations that attach a
    /// [`Lease`] also reclaim frames that are simply dropped.
    fn release(&self, frame: CapturedFrame);

    fn acquire(&self, policy: AcquirePolicy) -> Result<CapturedFrame, AcquireError> {
        match policy {
            AcquirePolicy::Next => self.acquire_next(),
            AcquirePolicy::Latest => self.acquire_latest(),
        }
    }
}
