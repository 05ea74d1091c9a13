//! Vision processor (consumer side of the frame queue)
//!
//! Takes the oldest queued frame, runs colour-cluster detection on the
//! blocking pool, and publishes the outcome into the shared detection state.
//! No lock is held while a frame is being processed.

use crate::detection_state::SharedDetection;
use crate::error::VisionError;
use crate::frame_queue::BoundedFrameQueue;
use crate::processing::{BoundingBox, ColorDetector, Detection};
use image::RgbImage;
use roboguard_core::{Frame, StopSignal, VisionParameters};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Latest annotated working frame, for display only
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub frame_sequence: u64,
    pub image: RgbImage,
    pub bbox: Option<BoundingBox>,
    pub distance: f64,
}

/// Counters reported when the processor stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VisionStats {
    pub frames_processed: u64,
    pub frames_discarded: u64,
    pub detections: u64,
}

pub struct VisionProcessor {
    queue: Arc<BoundedFrameQueue>,
    state: SharedDetection,
    detector: Arc<ColorDetector>,
    poll_interval: Duration,
    preview: watch::Sender<Option<Arc<AnnotatedFrame>>>,
}

impl VisionProcessor {
    pub fn new(
        queue: Arc<BoundedFrameQueue>,
        state: SharedDetection,
        params: VisionParameters,
    ) -> Result<Self, VisionError> {
        let poll_interval = params.poll_interval();
        let detector = Arc::new(ColorDetector::new(params)?);
        let (preview, _) = watch::channel(None);
        Ok(Self {
            queue,
            state,
            detector,
            poll_interval,
            preview,
        })
    }

    /// Receive every annotated frame published from now on
    pub fn subscribe_preview(&self) -> watch::Receiver<Option<Arc<AnnotatedFrame>>> {
        self.preview.subscribe()
    }

    /// Detect on one frame and publish the result.
    ///
    /// A frame that cannot be decoded or resized is dropped without touching
    /// the shared state.
    pub fn process_frame(&self, frame: &Frame) -> Result<Detection, VisionError> {
        let detection = self.detector.process(frame)?;
        self.publish(&detection);
        Ok(detection)
    }

    fn publish(&self, detection: &Detection) {
        match detection.distance {
            Some(distance) if detection.detected => {
                self.state.publish_detected(detection.frame_sequence, distance);
                if let Some(image) = detection.annotated.clone() {
                    self.preview.send_replace(Some(Arc::new(AnnotatedFrame {
                        frame_sequence: detection.frame_sequence,
                        image,
                        bbox: detection.bbox,
                        distance,
                    })));
                }
            }
            _ => self.state.publish_clear(detection.frame_sequence),
        }
    }

    /// Poll the queue until stopped
    pub async fn run(self, mut stop: StopSignal) -> VisionStats {
        let mut stats = VisionStats::default();
        info!("Vision processor started");

        loop {
            if stop.is_stopped() {
                break;
            }

            let frame = match self.queue.pop_or_empty() {
                Some(frame) => frame,
                None => {
                    if stop.sleep(self.poll_interval).await {
                        break;
                    }
                    continue;
                }
            };

            let detector = self.detector.clone();
            let sequence = frame.sequence();
            let result = tokio::task::spawn_blocking(move || detector.process(&frame)).await;

            match result {
                Ok(Ok(detection)) => {
                    stats.frames_processed += 1;
                    if detection.detected {
                        stats.detections += 1;
                        debug!(
                            "Frame {}: object detected, estimated distance {:.2}",
                            sequence,
                            detection.distance.unwrap_or_default()
                        );
                    }
                    self.publish(&detection);
                }
                Ok(Err(e)) => {
                    stats.frames_discarded += 1;
                    warn!("Discarding frame {}: {}", sequence, e);
                }
                Err(e) => {
                    stats.frames_discarded += 1;
                    error!("Frame {} processing task failed: {}", sequence, e);
                }
            }
        }

        info!(
            "Vision processor stopped ({} processed, {} discarded, {} detections)",
            stats.frames_processed, stats.frames_discarded, stats.detections
        );
        stats
    }
}
