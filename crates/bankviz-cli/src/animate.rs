//! Animated and transcript runs of the safety search.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bankviz_kernel::{SafetyEngine, SystemState};
use bankviz_runtime::{Pacing, PlayOutcome, Player, spawn_search};
use bankviz_types::{RunTranscript, StepEvent};
use tracing::info;

use crate::render::Renderer;

/// Run the search for `state` on a worker and render its events at
/// `pacing`.
///
/// `running` is raised for the duration of the animation so a Ctrl-C
/// handler knows to set `cancel` instead of exiting.  `cancel` is cleared
/// before starting.
pub fn animate(
    state: SystemState,
    pacing: Pacing,
    cancel: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
) -> Result<PlayOutcome, String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|e| format!("Failed to start runtime: {e}"))?;

    cancel.store(false, Ordering::SeqCst);
    running.store(true, Ordering::SeqCst);

    let mut renderer = Renderer::new(state.process_count());
    let player = Player::new(pacing, cancel);
    let outcome = runtime.block_on(async {
        let stream = spawn_search(SafetyEngine::new(state));
        player.play(stream, |event| renderer.on_event(event)).await
    });

    running.store(false, Ordering::SeqCst);
    info!(?outcome, "animated run finished");
    Ok(outcome)
}

/// Run the search to completion without pacing and record it.
pub fn transcript(name: Option<String>, state: &SystemState) -> RunTranscript {
    let engine = SafetyEngine::new(state.clone());
    let mut steps = engine.steps();
    let events: Vec<StepEvent> = steps.by_ref().collect();
    let verdict = steps.report().verdict;
    RunTranscript::new(name, state.need_matrix().to_vec(), events, verdict)
}
