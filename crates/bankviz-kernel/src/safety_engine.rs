//! [`SafetyEngine`] – incremental safe-sequence search.
//!
//! The engine owns one [`SystemState`] and exposes the classical safety
//! algorithm as a lazy iterator of [`StepEvent`]s so that a front end can
//! display every decision as it happens.
//!
//! # Algorithm
//!
//! `work` starts as a copy of `available`.  Each round scans processes in
//! index order and picks the **first** unfinished process whose need fits
//! into `work`.  Its allocation is released back into `work`, it is marked
//! finished and appended to the safe sequence.  The search ends when every
//! process finished (safe) or a full scan picks nothing (not safe).
//!
//! Each selection yields two events: [`StepEvent::Evaluating`] with the work
//! vector *before* the release, then [`StepEvent::Selected`] with the work
//! vector *after* it.  Exactly one terminal event closes the stream.
//!
//! The search is synchronous and side-effect free; pacing belongs to the
//! consumer.  Worst case O(n² · m).

use std::iter::FusedIterator;

use bankviz_types::{ProcessId, ResourceVector, SafetyReport, StepEvent, Verdict};
use tracing::{debug, info};

use crate::system_state::SystemState;

// ────────────────────────────────────────────────────────────────────────────
// SafetyEngine
// ────────────────────────────────────────────────────────────────────────────

/// Runs safety searches over a single [`SystemState`].
///
/// # Example
///
/// ```
/// use bankviz_kernel::{SafetyEngine, SystemState};
/// use bankviz_types::{ProcessId, StepEvent};
///
/// let state = SystemState::new(vec![vec![0]], vec![vec![0]], vec![0]).unwrap();
/// let engine = SafetyEngine::new(state);
///
/// let events: Vec<StepEvent> = engine.steps().collect();
/// assert_eq!(
///     events.last(),
///     Some(&StepEvent::SafeComplete { sequence: vec![ProcessId(0)] })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct SafetyEngine {
    state: SystemState,
}

impl SafetyEngine {
    pub fn new(state: SystemState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &SystemState {
        &self.state
    }

    pub fn into_state(self) -> SystemState {
        self.state
    }

    /// Start a fresh search.  Every call restarts from `available`.
    pub fn steps(&self) -> SafetySteps<'_> {
        SafetySteps::new(&self.state)
    }

    /// Drain a full search and summarise it.
    pub fn run(&self) -> SafetyReport {
        let mut steps = self.steps();
        steps.by_ref().for_each(drop);
        steps.report()
    }

    pub fn is_safe(&self) -> bool {
        self.run().is_safe()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SafetySteps
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Look for the next satisfiable process.
    Scan,
    /// `Evaluating` was emitted for this process; release its allocation next.
    Release(usize),
    Done,
}

/// Lazy event stream of one safety search.
///
/// Finite and non-restartable: after the terminal event it only returns
/// `None`.  Dropping it early is always fine.
#[derive(Debug, Clone)]
pub struct SafetySteps<'a> {
    state: &'a SystemState,
    work: ResourceVector,
    finish: Vec<bool>,
    sequence: Vec<ProcessId>,
    phase: Phase,
}

impl<'a> SafetySteps<'a> {
    fn new(state: &'a SystemState) -> Self {
        Self {
            state,
            work: state.available().clone(),
            finish: vec![false; state.process_count()],
            sequence: Vec::with_capacity(state.process_count()),
            phase: Phase::Scan,
        }
    }

    /// Current working-resource vector.
    pub fn work(&self) -> &ResourceVector {
        &self.work
    }

    /// Processes selected so far, in order.
    pub fn sequence(&self) -> &[ProcessId] {
        &self.sequence
    }

    pub fn is_finished(&self, process: usize) -> bool {
        self.finish.get(process).copied().unwrap_or(false)
    }

    /// Summary of the search in its current position.
    ///
    /// Only meaningful once the terminal event has been yielded.
    pub fn report(&self) -> SafetyReport {
        SafetyReport {
            verdict: if self.sequence.len() == self.state.process_count() {
                Verdict::Safe
            } else {
                Verdict::Unsafe
            },
            sequence: self.sequence.clone(),
            final_work: self.work.clone(),
            finished: self.finish.clone(),
        }
    }

    /// First unfinished process whose need fits into `work`.
    fn next_candidate(&self) -> Option<usize> {
        self.state
            .need
            .iter()
            .enumerate()
            .find(|(i, need)| !self.finish[*i] && self.work.covers(need))
            .map(|(i, _)| i)
    }
}

impl Iterator for SafetySteps<'_> {
    type Item = StepEvent;

    fn next(&mut self) -> Option<StepEvent> {
        match self.phase {
            Phase::Done => None,
            Phase::Scan => {
                if self.sequence.len() == self.state.process_count() {
                    self.phase = Phase::Done;
                    info!(sequence = ?self.sequence, "safe sequence found");
                    return Some(StepEvent::SafeComplete {
                        sequence: self.sequence.clone(),
                    });
                }
                match self.next_candidate() {
                    Some(i) => {
                        self.phase = Phase::Release(i);
                        debug!(process = %ProcessId(i), work = %self.work, "process can execute");
                        Some(StepEvent::Evaluating {
                            process: ProcessId(i),
                            work: self.work.clone(),
                        })
                    }
                    None => {
                        self.phase = Phase::Done;
                        info!(
                            sequence = ?self.sequence,
                            work = %self.work,
                            "no satisfiable process left; state is not safe"
                        );
                        Some(StepEvent::Deadlocked {
                            sequence: self.sequence.clone(),
                        })
                    }
                }
            }
            Phase::Release(i) => {
                self.work = self.work.add(&self.state.allocation[i]);
                self.finish[i] = true;
                self.sequence.push(ProcessId(i));
                self.phase = Phase::Scan;
                debug!(process = %ProcessId(i), work = %self.work, "process released its allocation");
                Some(StepEvent::Selected {
                    process: ProcessId(i),
                    work: self.work.clone(),
                    sequence: self.sequence.clone(),
                })
            }
        }
    }
}

impl FusedIterator for SafetySteps<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use bankviz_types::BankerError;

    // ------------------------------------------------------------------ helpers
    fn textbook(available: Vec<u32>) -> SafetyEngine {
        let state = SystemState::new(
            vec![
                vec![0, 1, 0],
                vec![2, 0, 0],
                vec![3, 0, 2],
                vec![2, 1, 1],
                vec![0, 0, 2],
            ],
            vec![
                vec![7, 5, 3],
                vec![3, 2, 2],
                vec![9, 0, 2],
                vec![2, 2, 2],
                vec![4, 3, 3],
            ],
            available,
        )
        .unwrap();
        SafetyEngine::new(state)
    }

    fn pids(ids: &[usize]) -> Vec<ProcessId> {
        ids.iter().copied().map(ProcessId).collect()
    }

    fn rv(units: &[u32]) -> ResourceVector {
        ResourceVector::new(units.to_vec())
    }

    // ------------------------------------------------------------------ scenarios

    #[test]
    fn textbook_instance_is_safe_with_fixed_order() {
        let engine = textbook(vec![3, 3, 2]);
        let report = engine.run();
        assert_eq!(report.verdict, Verdict::Safe);
        // Every round restarts the scan at P0, so P0 ([7, 4, 3]) is picked as
        // soon as work reaches [7, 4, 3], ahead of P4.
        assert_eq!(report.sequence, pids(&[1, 3, 0, 2, 4]));
        assert_eq!(report.final_work, rv(&[10, 5, 7]));
    }

    #[test]
    fn textbook_instance_event_trace() {
        let engine = textbook(vec![3, 3, 2]);
        let events: Vec<StepEvent> = engine.steps().collect();

        assert_eq!(events.len(), 11);
        assert_eq!(
            events[0],
            StepEvent::Evaluating {
                process: ProcessId(1),
                work: rv(&[3, 3, 2]),
            }
        );
        assert_eq!(
            events[1],
            StepEvent::Selected {
                process: ProcessId(1),
                work: rv(&[5, 3, 2]),
                sequence: pids(&[1]),
            }
        );
        assert_eq!(
            events[2],
            StepEvent::Evaluating {
                process: ProcessId(3),
                work: rv(&[5, 3, 2]),
            }
        );
        assert_eq!(
            events[10],
            StepEvent::SafeComplete {
                sequence: pids(&[1, 3, 0, 2, 4]),
            }
        );
    }

    #[test]
    fn empty_pool_deadlocks_immediately() {
        let engine = textbook(vec![0, 0, 0]);
        let events: Vec<StepEvent> = engine.steps().collect();
        assert_eq!(events, vec![StepEvent::Deadlocked { sequence: vec![] }]);
        assert!(!engine.is_safe());
    }

    #[test]
    fn single_idle_process_is_immediately_safe() {
        let state = SystemState::new(vec![vec![0]], vec![vec![0]], vec![0]).unwrap();
        let engine = SafetyEngine::new(state);
        let events: Vec<StepEvent> = engine.steps().collect();
        assert_eq!(
            events,
            vec![
                StepEvent::Evaluating {
                    process: ProcessId(0),
                    work: rv(&[0]),
                },
                StepEvent::Selected {
                    process: ProcessId(0),
                    work: rv(&[0]),
                    sequence: pids(&[0]),
                },
                StepEvent::SafeComplete {
                    sequence: pids(&[0]),
                },
            ]
        );
    }

    #[test]
    fn ragged_allocation_row_is_rejected_before_search() {
        let result = SystemState::new(
            vec![vec![0, 1], vec![1]],
            vec![vec![1, 1], vec![1, 1]],
            vec![1, 1],
        );
        assert!(matches!(result, Err(BankerError::Dimension { .. })));
    }

    #[test]
    fn maximum_below_allocation_is_rejected_before_search() {
        let result = SystemState::new(vec![vec![2]], vec![vec![1]], vec![5]);
        assert!(matches!(result, Err(BankerError::NegativeNeed { .. })));
    }

    // ------------------------------------------------------------------ behaviour

    #[test]
    fn partial_progress_then_deadlock() {
        // P0 can finish, but releasing its unit is not enough for P1 or P2.
        let state = SystemState::new(
            vec![vec![1], vec![1], vec![1]],
            vec![vec![2], vec![4], vec![4]],
            vec![1],
        )
        .unwrap();
        let engine = SafetyEngine::new(state);
        let events: Vec<StepEvent> = engine.steps().collect();
        assert_eq!(
            events.last(),
            Some(&StepEvent::Deadlocked {
                sequence: pids(&[0]),
            })
        );
        let report = engine.run();
        assert_eq!(report.verdict, Verdict::Unsafe);
        assert_eq!(report.final_work, rv(&[2]));
        assert_eq!(report.finished, vec![true, false, false]);
        assert_eq!(report.stuck().collect::<Vec<_>>(), pids(&[1, 2]));
    }

    #[test]
    fn lowest_index_wins_ties() {
        // Every process is satisfiable from the start.
        let state = SystemState::new(
            vec![vec![1], vec![1], vec![1]],
            vec![vec![1], vec![1], vec![1]],
            vec![0],
        )
        .unwrap();
        let report = SafetyEngine::new(state).run();
        assert_eq!(report.sequence, pids(&[0, 1, 2]));
    }

    #[test]
    fn exactly_one_terminal_event_and_fused_afterwards() {
        let engine = textbook(vec![3, 3, 2]);
        let mut steps = engine.steps();
        let terminals = steps.by_ref().filter(StepEvent::is_terminal).count();
        assert_eq!(terminals, 1);
        assert_eq!(steps.next(), None);
        assert_eq!(steps.next(), None);
    }

    #[test]
    fn repeated_searches_are_identical() {
        let engine = textbook(vec![3, 3, 2]);
        let first: Vec<StepEvent> = engine.steps().collect();
        let second: Vec<StepEvent> = engine.steps().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn search_does_not_touch_available() {
        let engine = textbook(vec![3, 3, 2]);
        let _ = engine.run();
        assert_eq!(engine.state().available(), &rv(&[3, 3, 2]));
    }

    #[test]
    fn abandoned_search_exposes_partial_progress() {
        let engine = textbook(vec![3, 3, 2]);
        let mut steps = engine.steps();
        steps.next();
        steps.next();
        assert_eq!(steps.sequence(), pids(&[1]).as_slice());
        assert_eq!(steps.work(), &rv(&[5, 3, 2]));
        assert!(steps.is_finished(1));
        assert!(!steps.is_finished(0));
    }
}
