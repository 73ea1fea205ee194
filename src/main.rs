//! Framepipe demo: synthetic camera -> YUV conversion -> presenter

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use color_eyre::Result;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framepipe::capture::pattern::{PlaneLayout, TestPattern};
use framepipe::display::Presenter;
use framepipe::{Config, FrameBufferQueue, FramePipeline, RgbFrame, RingCapture, Tick};

/// Logs presentation rate once a second
struct StatsPresenter {
    presented: u64,
    window_start: Instant,
    window_frames: u64,
}

impl StatsPresenter {
    fn new() -> Self {
        Self {
            presented: 0,
            window_start: Instant::now(),
            window_frames: 0,
        }
    }
}

impl Presenter for StatsPresenter {
    fn present(&mut self, frame: &RgbFrame) {
        self.presented += 1;
        self.window_frames += 1;

        let elapsed = self.window_start.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.window_frames as f64 / elapsed.as_secs_f64();
            info!(
                "Presented {} frames ({:.1} fps), {}x{}, first pixel {:#010x}",
                self.presented,
                fps,
                frame.width(),
                frame.height(),
                frame.pixels().first().copied().unwrap_or_default()
            );
            self.window_start = Instant::now();
            self.window_frames = 0;
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("framepipe=info"));

    #[cfg(feature = "profiling")]
    {
        use tracing_subscriber::prelude::*;
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_timer(tracing_subscriber::fmt::time::uptime()))
            .with(tracing_tracy::TracyLayer::default())
            .init();
    }

    #[cfg(not(feature = "profiling"))]
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling and logging
    color_eyre::install()?;
    init_tracing();

    info!("Framepipe launching...");

    // Usage: framepipe [config.toml] [snapshot.png]
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let snapshot_path = args.next().map(PathBuf::from);

    let config = Config::load(config_path.as_deref())?;
    info!("Configuration: {:?}", config);

    let queue = Arc::new(FrameBufferQueue::new(config.pipeline.capacity));
    let camera = Arc::new(RingCapture::new(config.capture.max_images).with_listener(queue.clone()));
    let pipeline = FramePipeline::from_config(camera.clone(), queue, &config.pipeline);

    // Producer: the capture device delivering at its own cadence
    let mut pattern = TestPattern::new(config.capture.width, config.capture.height).with_layout(
        PlaneLayout {
            chroma_pixel_stride: config.capture.chroma_pixel_stride,
            row_padding: config.capture.row_padding,
        },
    );
    let frame_period = Duration::from_secs(1) / config.capture.fps.max(1);
    let producer = {
        let camera = camera.clone();
        tokio::spawn(async move {
            let mut ticker = interval(frame_period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                camera.deliver(pattern.next_frame());
            }
        })
    };

    // Consumer: the draw loop, polling at the display refresh rate
    let mut dest = RgbFrame::new(
        config.display.width as usize,
        config.display.height as usize,
    );
    let mut presenter = StatsPresenter::new();
    let mut ticker = interval(Duration::from_secs(1) / config.display.refresh_hz.max(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Interrupt received");
                break;
            }
            _ = ticker.tick() => {
                match pipeline.draw_frame(&mut dest) {
                    Ok(Tick::Presented(_)) => presenter.present(&dest),
                    Ok(Tick::Idle) => {}
                    Err(e) => error!("Draw failed: {}", e),
                }
            }
        }
    }

    producer.abort();

    let queue_stats = pipeline.queue().stats();
    let ring_stats = camera.stats();
    info!(
        "Arrived {}, consumed {}, superseded {}; device delivered {}, overwritten {}, released {}",
        queue_stats.arrived,
        queue_stats.consumed,
        queue_stats.superseded,
        ring_stats.delivered,
        ring_stats.overwritten,
        ring_stats.released
    );

    if let Some(path) = snapshot_path {
        dest.save_png(&path)?;
    }

    info!("Framepipe shutting down");
    Ok(())
}
