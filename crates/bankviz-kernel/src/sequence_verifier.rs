//! [`SequenceVerifier`] – replay a proposed execution order.
//!
//! The safety search only ever reports the order produced by its fixed
//! lowest-index scan.  Other orders may be safe as well; the verifier checks
//! one explicitly by replaying it against `available`:
//!
//! 1. The order must name every process exactly once.
//! 2. At each position the process's need must fit into the current work
//!    vector, after which its allocation is released into work.
//!
//! The first violation is returned as a [`BankerError`].

use std::collections::HashSet;

use bankviz_types::{BankerError, ProcessId, ResourceVector};

use crate::system_state::SystemState;

/// Checks proposed orders against a [`SystemState`].
///
/// # Example
///
/// ```
/// use bankviz_kernel::{SequenceVerifier, SystemState};
/// use bankviz_types::ProcessId;
///
/// let state = SystemState::new(
///     vec![vec![1], vec![0]],
///     vec![vec![1], vec![2]],
///     vec![1],
/// )
/// .unwrap();
/// let verifier = SequenceVerifier::new(&state);
///
/// assert!(verifier.verify(&[ProcessId(0), ProcessId(1)]).is_ok());
/// assert!(verifier.verify(&[ProcessId(1), ProcessId(0)]).is_err());
/// ```
pub struct SequenceVerifier<'a> {
    state: &'a SystemState,
}

impl<'a> SequenceVerifier<'a> {
    pub fn new(state: &'a SystemState) -> Self {
        Self { state }
    }

    /// Replay `order` and return the work vector after each step.
    ///
    /// Fails with [`BankerError::UnknownProcess`] for indices outside `0..n`,
    /// [`BankerError::InvalidSequence`] when the order is not a permutation,
    /// and [`BankerError::SequenceNotSafe`] at the first unsatisfiable step.
    pub fn verify(&self, order: &[ProcessId]) -> Result<Vec<ResourceVector>, BankerError> {
        let n = self.state.process_count();
        let mut seen = HashSet::with_capacity(n);
        for &process in order {
            if process.index() >= n {
                return Err(BankerError::UnknownProcess(process));
            }
            if !seen.insert(process) {
                return Err(BankerError::InvalidSequence(format!(
                    "{process} appears more than once"
                )));
            }
        }
        if order.len() != n {
            return Err(BankerError::InvalidSequence(format!(
                "expected all {n} processes, got {}",
                order.len()
            )));
        }

        let mut work = self.state.available().clone();
        let mut trace = Vec::with_capacity(n);
        for (position, &process) in order.iter().enumerate() {
            let i = process.index();
            let need = &self.state.need[i];
            if !work.covers(need) {
                return Err(BankerError::SequenceNotSafe {
                    position,
                    process,
                    need: need.clone(),
                    work,
                });
            }
            work = work.add(&self.state.allocation[i]);
            trace.push(work.clone());
        }
        Ok(trace)
    }
}
