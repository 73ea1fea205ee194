pub mod frame;
pub mod pattern;
pub mod plane;
pub mod ring;
pub mod source;

pub use frame::{CapturedFrame, CropRect, FrameMetadata, PixelFormat, Plane};
pub use plane::PlaneView;
pub use ring::RingCapture;
pub use source::{AcquireError, AcquirePolicy, CaptureSource, FrameListener, Lease, SlotReturn};
