//! Audio ingress queue
//!
//! Unbounded single-producer/single-consumer hand-off between the
//! async client receive loop and the blocking transcription worker.
//! `push` never blocks; the consumer blocks (or polls with a timeout)
//! until a frame or the end-of-stream sentinel arrives. Closing the
//! queue enqueues exactly one sentinel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Create a connected ingress queue and its consumer half.
pub fn channel() -> (AudioIngress, FrameSource) {
    let (tx, rx) = mpsc::channel();
    (
        AudioIngress {
            tx,
            closed: AtomicBool::new(false),
        },
        FrameSource { rx, ended: false },
    )
}

/// Producer half, owned by the client receive loop.
pub struct AudioIngress {
    tx: Sender<Option<Vec<u8>>>,
    closed: AtomicBool,
}

impl AudioIngress {
    /// Enqueue one audio frame. Never blocks; frames pushed after the
    /// queue was closed are discarded.
    pub fn push(&self, frame: Vec<u8>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.tx.send(Some(frame));
    }

    /// Enqueue the end-of-stream sentinel. Idempotent.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.tx.send(None);
        }
    }
}

impl Drop for AudioIngress {
    fn drop(&mut self) {
        self.close();
    }
}

/// Result of a bounded wait on the queue.
#[derive(Debug, PartialEq, Eq)]
pub enum FramePoll {
    Frame(Vec<u8>),
    Idle,
    Ended,
}

/// Consumer half, owned by the transcription worker thread.
pub struct FrameSource {
    rx: Receiver<Option<Vec<u8>>>,
    ended: bool,
}

impl FrameSource {
    /// Block until the next frame; `None` once the sentinel has been
    /// observed.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        if self.ended {
            return None;
        }
        match self.rx.recv() {
            Ok(Some(frame)) => Some(frame),
            Ok(None) | Err(_) => {
                self.ended = true;
                None
            }
        }
    }

    /// Wait up to `timeout` for the next frame, so a blocking session
    /// can interleave frame pulls with provider socket reads.
    pub fn poll_frame(&mut self, timeout: Duration) -> FramePoll {
        if self.ended {
            return FramePoll::Ended;
        }
        match self.rx.recv_timeout(timeout) {
            Ok(Some(frame)) => FramePoll::Frame(frame),
            Ok(None) | Err(RecvTimeoutError::Disconnected) => {
                self.ended = true;
                FramePoll::Ended
            }
            Err(RecvTimeoutError::Timeout) => FramePoll::Idle,
        }
    }
}
