//! One captured frame in, one rotated ARGB frame out

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use crate::capture::frame::{CapturedFrame, PixelFormat, U_PLANE, V_PLANE, Y_PLANE};
use crate::capture::plane::{PlaneView, Subsampling};
use crate::capture::{AcquireError, AcquirePolicy, CaptureSource};
use crate::display::RgbFrame;
use crate::error::{FormatIssue, PipelineError, Result};
use crate::pipeline::color::yuv_to_argb;
use crate::pipeline::queue::FrameBufferQueue;
use crate::pipeline::rotation::{Orientation, RotationMapper};
use crate::PipelineConfig;

/// Geometry of a frame written to the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameExtent {
    pub sequence: u64,
    /// Destination dimensions after rotation
    pub width: usize,
    pub height: usize,
    pub orientation: Orientation,
}

/// Outcome of one draw tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing to draw; try again next tick
    Idle,
    Presented(FrameExtent),
}

/// Consumer side of the capture pipeline.
///
/// Owns the presentation orientation and acquisition policy; shares the
/// admission queue and capture source with the producer context.
pub struct FramePipeline<S: CaptureSource> {
    source: Arc<S>,
    queue: Arc<FrameBufferQueue>,
    orientation: Orientation,
    policy: AcquirePolicy,
}

impl<S: CaptureSource> FramePipeline<S> {
    pub fn new(source: Arc<S>, queue: Arc<FrameBufferQueue>) -> Self {
        Self {
            source,
            queue,
            orientation: Orientation::default(),
            policy: AcquirePolicy::default(),
        }
    }

    pub fn from_config(source: Arc<S>, queue: Arc<FrameBufferQueue>, config: &PipelineConfig) -> Self {
        info!(
            "Pipeline: capacity {}, policy {:?}, orientation {}",
            queue.capacity(),
            config.policy,
            config.orientation
        );
        Self::new(source, queue)
            .with_policy(config.policy)
            .with_orientation(config.orientation)
    }

    pub fn with_policy(mut self, policy: AcquirePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn queue(&self) -> &Arc<FrameBufferQueue> {
        &self.queue
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn policy(&self) -> AcquirePolicy {
        self.policy
    }

    /// Change the presentation rotation. Anything but 0/90/180/270 is
    /// rejected and the current orientation stays in effect.
    pub fn set_orientation(&mut self, degrees: i32) -> Result<()> {
        let orientation = Orientation::try_from(degrees)?;
        if orientation != self.orientation {
            info!("Orientation {} -> {}", self.orientation, orientation);
        }
        self.orientation = orientation;
        Ok(())
    }

    /// Fetch a frame from the capture source. `None` means nothing to do
    /// this tick, whether the source was empty or reported a failure.
    pub fn acquire_frame(&self, policy: AcquirePolicy) -> Option<CapturedFrame> {
        match self.source.acquire(policy) {
            Ok(frame) => Some(frame),
            Err(AcquireError::NoFrameAvailable) => {
                debug!("No frame available ({:?})", policy);
                None
            }
            Err(AcquireError::Failure(reason)) => {
                warn!("Frame acquisition failed ({:?}): {}", policy, reason);
                metrics::counter!("acquisition_failures").increment(1);
                None
            }
        }
    }

    /// Convert `frame` into `dest` using the current orientation. The frame
    /// goes back to the source whether or not conversion succeeds.
    #[instrument(skip_all, fields(sequence = frame.sequence(), orientation = %self.orientation))]
    pub fn convert(&self, frame: CapturedFrame, dest: &mut RgbFrame) -> Result<FrameExtent> {
        let started = Instant::now();
        metrics::histogram!("frame_latency_ms").record(frame.age().as_millis() as f64);
        let result = convert_frame(&frame, self.orientation, dest);
        self.source.release(frame);

        match &result {
            Ok(extent) => {
                metrics::counter!("frames_converted").increment(1);
                metrics::histogram!("convert_time_us").record(started.elapsed().as_micros() as f64);
                debug!("Converted {}x{}", extent.width, extent.height);
            }
            Err(e) => {
                metrics::counter!("frames_rejected").increment(1);
                warn!("Frame rejected: {}", e);
            }
        }
        result
    }

    /// One non-blocking draw tick: take an admitted unit, acquire per the
    /// configured policy and convert. Returns [`Tick::Idle`] when nothing
    /// was admitted or nothing could be acquired.
    pub fn draw_frame(&self, dest: &mut RgbFrame) -> Result<Tick> {
        if !self.queue.try_consume_one() {
            return Ok(Tick::Idle);
        }

        let Some(frame) = self.acquire_frame(self.policy) else {
            metrics::counter!("frames_skipped").increment(1);
            return Ok(Tick::Idle);
        };

        self.convert(frame, dest).map(Tick::Presented)
    }
}

/// Validate a YUV 4:2:0 frame and write its cropped region, rotated, into
/// `dest`. Does not release the frame.
pub fn convert_frame(
    frame: &CapturedFrame,
    orientation: Orientation,
    dest: &mut RgbFrame,
) -> Result<FrameExtent> {
    let [luma, u, v] = plane_views(frame)?;

    let crop = frame.crop();
    let (width, height) = (crop.width() as usize, crop.height() as usize);
    let mapper = RotationMapper::new(orientation, width, height);
    let (out_width, out_height) = mapper.output_extent();

    let capacity = dest.capacity();
    let out = dest
        .layout_mut(out_width, out_height)
        .ok_or(PipelineError::DestinationTooSmall {
            required: width * height,
            actual: capacity,
        })?;

    for y in 0..height {
        for x in 0..width {
            out[mapper.destination_index(x, y)] =
                yuv_to_argb(luma.sample(x, y), u.sample(x, y), v.sample(x, y));
        }
    }

    Ok(FrameExtent {
        sequence: frame.sequence(),
        width: out_width,
        height: out_height,
        orientation,
    })
}

fn plane_views(frame: &CapturedFrame) -> std::result::Result<[PlaneView<'_>; 3], FormatIssue> {
    if frame.format() != PixelFormat::Yuv420 {
        return Err(FormatIssue::PixelFormat(frame.format()));
    }

    let (Some(y), Some(u), Some(v), 3) = (
        frame.plane(Y_PLANE),
        frame.plane(U_PLANE),
        frame.plane(V_PLANE),
        frame.plane_count(),
    ) else {
        return Err(FormatIssue::PlaneCount(frame.plane_count()));
    };

    let crop = frame.crop();
    if crop.is_empty() {
        return Err(FormatIssue::EmptyCrop {
            left: crop.left,
            top: crop.top,
            right: crop.right,
            bottom: crop.bottom,
        });
    }
    if crop.right > frame.meta.width || crop.bottom > frame.meta.height {
        return Err(FormatIssue::CropOutOfBounds {
            width: frame.meta.width,
            height: frame.meta.height,
        });
    }

    // Chroma planes share one row stride and one pixel stride.
    if u.row_stride != v.row_stride || u.pixel_stride != v.pixel_stride {
        return Err(FormatIssue::ChromaStrideMismatch {
            u_row: u.row_stride,
            u_pixel: u.pixel_stride,
            v_row: v.row_stride,
            v_pixel: v.pixel_stride,
        });
    }

    Ok([
        PlaneView::new(Y_PLANE, y, crop, Subsampling::Full)?,
        PlaneView::new(U_PLANE, u, crop, Subsampling::Half)?,
        PlaneView::new(V_PLANE, v, crop, Subsampling::Half)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::frame::{CropRect, FrameMetadata, Plane};
    use crate::capture::RingCapture;

    /// Planar 4:2:0 frame where luma encodes position and chroma is neutral
    fn gradient_frame(width: u32, height: u32) -> CapturedFrame {
        let (w, h) = (width as usize, height as usize);
        let luma: Vec<u8> = (0..w * h).map(|i| (16 + i * 7 % 200) as u8).collect();
        let chroma = vec![128u8; w.div_ceil(2) * h.div_ceil(2)];
        CapturedFrame::new(
            vec![
                Plane::new(luma, w, 1),
                Plane::new(chroma.clone(), w.div_ceil(2), 1),
                Plane::new(chroma, w.div_ceil(2), 1),
            ],
            FrameMetadata {
                sequence: 1,
                width,
                height,
                crop: CropRect::full(width, height),
                format: PixelFormat::Yuv420,
            },
        )
    }

    fn pipeline() -> FramePipeline<RingCapture> {
        let queue = Arc::new(FrameBufferQueue::default());
        let ring = Arc::new(RingCapture::new(2).with_listener(queue.clone()));
        FramePipeline::new(ring, queue)
    }

    #[test]
    fn set_orientation_rejects_and_keeps_previous() {
        let mut pipeline = pipeline();
        pipeline.set_orientation(90).unwrap();

        let err = pipeline.set_orientation(45).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedRotation(45)));
        assert_eq!(pipeline.orientation(), Orientation::Deg90);
    }

    #[test]
    fn identity_matches_direct_formula() {
        let frame = gradient_frame(6, 4);
        let mut dest = RgbFrame::new(6, 4);
        convert_frame(&frame, Orientation::Deg0, &mut dest).unwrap();

        let luma = &frame.plane(Y_PLANE).unwrap().data;
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(
                    dest.pixel(x, y),
                    Some(yuv_to_argb(luma[y * 6 + x], 128, 128))
                );
            }
        }
    }

    #[test]
    fn rejects_wrong_format() {
        let mut frame = gradient_frame(2, 2);
        Arc::make_mut(&mut frame.meta).format = PixelFormat::Nv12;

        let err = convert_frame(&frame, Orientation::Deg0, &mut RgbFrame::new(2, 2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidFormat(FormatIssue::PixelFormat(PixelFormat::Nv12))
        ));
    }

    #[test]
    fn rejects_small_destination() {
        let frame = gradient_frame(4, 4);
        let err = convert_frame(&frame, Orientation::Deg0, &mut RgbFrame::new(4, 3)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DestinationTooSmall {
                required: 16,
                actual: 12
            }
        ));
    }

    #[test]
    fn rejects_crop_outside_frame() {
        let mut frame = gradient_frame(4, 4);
        Arc::make_mut(&mut frame.meta).crop = CropRect::new(0, 0, 6, 4);

        let err = convert_frame(&frame, Orientation::Deg0, &mut RgbFrame::new(8, 8)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidFormat(FormatIssue::CropOutOfBounds { .. })
        ));
    }

    #[test]
    fn convert_releases_on_failure() {
        let pipeline = pipeline();
        pipeline.source().deliver(gradient_frame(4, 4));

        let frame = pipeline.acquire_frame(AcquirePolicy::Latest).unwrap();
        assert_eq!(pipeline.source().acquired(), 1);

        let result = pipeline.convert(frame, &mut RgbFrame::new(1, 1));
        assert!(result.is_err());
        assert_eq!(pipeline.source().acquired(), 0);
        assert_eq!(pipeline.source().stats().released, 1);
    }

    #[test]
    fn draw_idles_without_arrivals() {
        let pipeline = pipeline();
        let mut dest = RgbFrame::new(4, 4);
        assert_eq!(pipeline.draw_frame(&mut dest).unwrap(), Tick::Idle);
    }

    #[test]
    fn draw_presents_rotated_extent() {
        let mut pipeline = pipeline();
        pipeline.set_orientation(270).unwrap();
        pipeline.source().deliver(gradient_frame(6, 4));

        let mut dest = RgbFrame::new(6, 4);
        let tick = pipeline.draw_frame(&mut dest).unwrap();
        assert_eq!(
            tick,
            Tick::Presented(FrameExtent {
                sequence: 1,
                width: 4,
                height: 6,
                orientation: Orientation::Deg270,
            })
        );
        assert_eq!((dest.width(), dest.height()), (4, 6));
        assert_eq!(pipeline.queue().available(), 0);
    }
}
