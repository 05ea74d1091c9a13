//! Camera capture loop (producer side of the frame queue)

use crate::frame_queue::BoundedFrameQueue;
use roboguard_core::{FrameSource, SessionParameters, StopSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

const INITIAL_BACKOFF_MS: u64 = 100;
const MAX_BACKOFF_MS: u64 = 5000;

/// Counters reported when capture ends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub capture_failures: u64,
}

/// Pulls frames from a [`FrameSource`] at the configured rate and pushes them
/// into the shared queue. Never blocks on a full queue.
pub struct FrameCapture {
    source: Box<dyn FrameSource>,
    queue: Arc<BoundedFrameQueue>,
    frame_interval: Duration,
    max_failures: u32,
}

impl FrameCapture {
    pub fn new(
        source: Box<dyn FrameSource>,
        queue: Arc<BoundedFrameQueue>,
        params: &SessionParameters,
    ) -> Self {
        Self {
            source,
            queue,
            frame_interval: params.frame_interval(),
            max_failures: params.max_capture_failures,
        }
    }

    /// Run until stopped. Hands the source back so the caller can release the
    /// camera once every activity has quiesced.
    pub async fn run(mut self, mut stop: StopSignal) -> (Box<dyn FrameSource>, CaptureStats) {
        let mut stats = CaptureStats::default();
        let mut consecutive_failures = 0u32;

        info!("Camera capture started ({:?} per frame)", self.frame_interval);

        loop {
            if stop.is_stopped() {
                break;
            }

            let start = Instant::now();

            match self.source.capture().await {
                Ok(frame) => {
                    consecutive_failures = 0;
                    stats.frames_captured += 1;
                    let sequence = frame.sequence();
                    if self.queue.push(frame).is_some() {
                        debug!("Frame {} queued, oldest frame evicted", sequence);
                    }
                }
                Err(e) => {
                    stats.capture_failures += 1;
                    consecutive_failures += 1;
                    if e.is_fatal() {
                        error!("Camera fault: {}, stopping capture", e);
                        break;
                    }
                    if consecutive_failures > self.max_failures {
                        error!(
                            "Too many camera read errors ({}), stopping capture",
                            consecutive_failures
                        );
                        break;
                    }

                    // 100ms, 200ms, 400ms, ... capped at 5s
                    let backoff_ms = (INITIAL_BACKOFF_MS << (consecutive_failures - 1).min(6))
                        .min(MAX_BACKOFF_MS);
                    warn!("Camera read error: {}, retrying in {}ms", e, backoff_ms);
                    if stop.sleep(Duration::from_millis(backoff_ms)).await {
                        break;
                    }
                    continue;
                }
            }

            let elapsed = start.elapsed();
            if elapsed < self.frame_interval && stop.sleep(self.frame_interval - elapsed).await {
                break;
            }
        }

        info!(
            "Camera capture stopped ({} frames, {} failures)",
            stats.frames_captured, stats.capture_failures
        );
        (self.source, stats)
    }
}
