//! [`Player`] – paced, cancellable playback of a [`StepStream`].
//!
//! The kernel produces events as fast as it can.  Animation timing is a
//! presentation decision, so it lives here: the player hands each event to
//! a sink and then pauses according to [`Pacing`] before pulling the next
//! one.
//!
//! A shared cancel flag (set from a Ctrl-C handler, a button, …) is polled
//! before every event and throughout every pause.  Cancelling simply stops
//! draining; the worker behind the stream is abandoned once the stream is
//! dropped.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::AtomicBool;
//! use bankviz_kernel::{SafetyEngine, SystemState};
//! use bankviz_runtime::player::{Pacing, PlayOutcome, Player};
//! use bankviz_runtime::worker::spawn_search;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let state = SystemState::new(vec![vec![0]], vec![vec![1]], vec![1]).unwrap();
//! let stream = spawn_search(SafetyEngine::new(state));
//!
//! let player = Player::new(Pacing::instant(), Arc::new(AtomicBool::new(false)));
//! let outcome = player.play(stream, |event| println!("{event:?}")).await;
//! assert!(matches!(outcome, PlayOutcome::Completed { .. }));
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bankviz_types::{ProcessId, StepEvent, Verdict};
use tracing::debug;

use crate::worker::StepStream;

/// Granularity at which long pauses re-check the cancel flag.
const CANCEL_POLL: Duration = Duration::from_millis(50);

// ─────────────────────────────────────────────────────────────────────────────
// Pacing
// ─────────────────────────────────────────────────────────────────────────────

/// Delays applied around events during playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause before the first event.
    pub start_delay: Duration,
    /// Pause after an `Evaluating` event.
    pub evaluate_delay: Duration,
    /// Pause after a `Selected` event.
    pub select_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            start_delay: Duration::from_millis(1000),
            evaluate_delay: Duration::from_millis(1500),
            select_delay: Duration::from_millis(1000),
        }
    }
}

impl Pacing {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            start_delay: Duration::ZERO,
            evaluate_delay: Duration::ZERO,
            select_delay: Duration::ZERO,
        }
    }

    /// Pause that follows `event`.  Terminal events end playback, so they
    /// get none.
    pub fn delay_after(&self, event: &StepEvent) -> Duration {
        match event {
            StepEvent::Evaluating { .. } => self.evaluate_delay,
            StepEvent::Selected { .. } => self.select_delay,
            StepEvent::Deadlocked { .. } | StepEvent::SafeComplete { .. } => Duration::ZERO,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PlayOutcome
// ─────────────────────────────────────────────────────────────────────────────

/// How a playback ended.  `delivered` counts events handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The terminal event was delivered.
    Completed {
        verdict: Verdict,
        sequence: Vec<ProcessId>,
        delivered: usize,
    },
    /// The cancel flag was raised.
    Cancelled { delivered: usize },
    /// The stream closed without a terminal event.
    Interrupted { delivered: usize },
}

// ─────────────────────────────────────────────────────────────────────────────
// Player
// ─────────────────────────────────────────────────────────────────────────────

/// Drains a [`StepStream`] at human pace.
pub struct Player {
    pacing: Pacing,
    cancel: Arc<AtomicBool>,
}

impl Player {
    pub fn new(pacing: Pacing, cancel: Arc<AtomicBool>) -> Self {
        Self { pacing, cancel }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Deliver every event of `stream` to `on_event`, pausing between them.
    pub async fn play<F>(&self, mut stream: StepStream, mut on_event: F) -> PlayOutcome
    where
        F: FnMut(&StepEvent),
    {
        let mut delivered = 0;
        if !self.pause(self.pacing.start_delay).await {
            return PlayOutcome::Cancelled { delivered };
        }

        while let Some(event) = stream.recv().await {
            if self.is_cancelled() {
                debug!(delivered, "playback cancelled");
                return PlayOutcome::Cancelled { delivered };
            }
            on_event(&event);
            delivered += 1;

            match event {
                StepEvent::SafeComplete { sequence } => {
                    return PlayOutcome::Completed {
                        verdict: Verdict::Safe,
                        sequence,
                        delivered,
                    };
                }
                StepEvent::Deadlocked { sequence } => {
                    return PlayOutcome::Completed {
                        verdict: Verdict::Unsafe,
                        sequence,
                        delivered,
                    };
                }
                ref step => {
                    if !self.pause(self.pacing.delay_after(step)).await {
                        debug!(delivered, "playback cancelled");
                        return PlayOutcome::Cancelled { delivered };
                    }
                }
            }
        }
        PlayOutcome::Interrupted { delivered }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on cancellation.  Returns `false`
    /// when cancelled.
    async fn pause(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if self.is_cancelled() {
                return false;
            }
            let slice = remaining.min(CANCEL_POLL);
            tokio::time::sleep(slice).await;
            remaining -= slice;
        }
        !self.is_cancelled()
    }
}
