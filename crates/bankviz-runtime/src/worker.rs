//! Worker handoff for safety searches.
//!
//! [`spawn_search`] moves a [`SafetyEngine`] onto a Tokio blocking worker
//! and forwards every [`StepEvent`] through a bounded `mpsc` channel.  The
//! consumer side ([`StepStream`]) drains at its own pace, so a slow
//! animation never stalls the caller's runtime and the search never waits
//! on rendering.
//!
//! Dropping the [`StepStream`] closes the channel; the worker notices on its
//! next send and stops the search.

use bankviz_kernel::SafetyEngine;
use bankviz_types::StepEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default channel capacity between the worker and the consumer.
pub const DEFAULT_BUFFER: usize = 16;

/// Receiving half of a search running elsewhere.
pub struct StepStream {
    receiver: mpsc::Receiver<StepEvent>,
    worker: Option<JoinHandle<()>>,
}

impl StepStream {
    /// A stream fed by the returned sender instead of a worker.
    ///
    /// Lets front ends replay recorded events through the same playback
    /// path.
    pub fn channel(buffer: usize) -> (mpsc::Sender<StepEvent>, StepStream) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        (
            sender,
            StepStream {
                receiver,
                worker: None,
            },
        )
    }

    /// Wait for the next event.  `None` once the producer is gone and the
    /// buffer is drained.
    pub async fn recv(&mut self) -> Option<StepEvent> {
        self.receiver.recv().await
    }

    /// `true` when the backing worker has exited (or there is none).
    pub fn worker_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

/// Run `engine`'s search on a blocking worker with the default buffer.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_search(engine: SafetyEngine) -> StepStream {
    spawn_search_with_buffer(engine, DEFAULT_BUFFER)
}

/// Run `engine`'s search on a blocking worker, buffering at most `buffer`
/// events ahead of the consumer.
pub fn spawn_search_with_buffer(engine: SafetyEngine, buffer: usize) -> StepStream {
    let (sender, receiver) = mpsc::channel(buffer.max(1));
    let worker = tokio::task::spawn_blocking(move || {
        for event in engine.steps() {
            if sender.blocking_send(event).is_err() {
                debug!("step consumer went away; abandoning search");
                return;
            }
        }
    });
    StepStream {
        receiver,
        worker: Some(worker),
    }
}
