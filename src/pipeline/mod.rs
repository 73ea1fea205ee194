pub mod color;
pub mod frame_pipeline;
pub mod queue;
pub mod rotation;

pub use color::yuv_to_argb;
pub use frame_pipeline::{convert_frame, FrameExtent, FramePipeline, Tick};
pub use queue::{FrameBufferQueue, QueueStats};
pub use rotation::{Orientation, RotationMapper};
