//! Fixed-capacity frame queue with drop-oldest admission
//!
//! Decouples the capture cadence from the processing cadence. The producer
//! never blocks: when the queue is full the oldest frame is evicted to make
//! room. The consumer never blocks either: an empty queue is reported as
//! `None` and the caller polls again later.

use parking_lot::Mutex;
use roboguard_core::Frame;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

pub struct BoundedFrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl BoundedFrameQueue {
    /// Create a queue holding at most `capacity` frames (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Insert a frame, evicting the oldest one first if the queue is full.
    /// Returns the evicted frame, if any.
    pub fn push(&self, frame: Frame) -> Option<Frame> {
        let evicted = {
            let mut frames = self.frames.lock();
            let evicted = if frames.len() >= self.capacity {
                frames.pop_front()
            } else {
                None
            };
            frames.push_back(frame);
            evicted
        };

        if let Some(ref old) = evicted {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            trace!("Frame queue full, dropped frame {}", old.sequence());
        }
        evicted
    }

    /// Remove and return the oldest frame, or `None` if the queue is empty
    pub fn pop_or_empty(&self) -> Option<Frame> {
        self.frames.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames dropped under backpressure since creation
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    /// Sequence numbers currently queued, oldest first
    pub fn sequences(&self) -> Vec<u64> {
        self.frames.lock().iter().map(Frame::sequence).collect()
    }
}
