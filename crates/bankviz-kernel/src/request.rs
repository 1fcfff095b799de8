//! Resource-request evaluation.
//!
//! A process asks for additional units.  The request is granted only when
//! the state that would result from granting it is still safe:
//!
//! 1. The request must not exceed the process's declared need.
//! 2. If it exceeds `available` the process has to wait.
//! 3. Otherwise the allocation is applied to a *copy* of the state and a
//!    safety search decides between grant and denial.
//!
//! The state a request is evaluated against is never modified; a grant
//! returns the successor state.

use bankviz_types::{BankerError, ProcessId, ResourceVector, SafetyReport};
use tracing::info;

use crate::safety_engine::SafetyEngine;
use crate::system_state::SystemState;

/// Result of [`SystemState::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The request keeps the system safe.  `state` has the request applied.
    Granted {
        state: SystemState,
        report: SafetyReport,
    },
    /// Not enough free units right now; nothing was evaluated.
    MustWait {
        resource: usize,
        requested: u32,
        available: u32,
    },
    /// Granting would leave the system unsafe.  `report` describes the
    /// search on the tentative state.
    Denied { report: SafetyReport },
}

impl SystemState {
    /// Evaluate a request of `request` units by `process`.
    ///
    /// Fails with [`BankerError::UnknownProcess`], a
    /// [`BankerError::Dimension`] when `request` has the wrong length, or
    /// [`BankerError::RequestExceedsNeed`].
    pub fn request(
        &self,
        process: ProcessId,
        request: &ResourceVector,
    ) -> Result<RequestOutcome, BankerError> {
        let i = process.index();
        if i >= self.process_count() {
            return Err(BankerError::UnknownProcess(process));
        }
        if request.len() != self.resource_count() {
            return Err(BankerError::Dimension {
                field: "request".to_string(),
                expected: self.resource_count(),
                found: request.len(),
            });
        }
        if let Some(j) = request.first_excess(&self.need[i]) {
            return Err(BankerError::RequestExceedsNeed {
                process,
                resource: j,
                requested: request[j],
                need: self.need[i][j],
            });
        }
        let Some(available) = self.available.checked_sub(request) else {
            let j = request.first_excess(&self.available).unwrap_or_default();
            info!(%process, %request, "request must wait for free units");
            return Ok(RequestOutcome::MustWait {
                resource: j,
                requested: request[j],
                available: self.available[j],
            });
        };
        let mut allocation = self.allocation.clone();
        allocation[i] = allocation[i].add(request);
        let tentative = SystemState::from_parts(allocation, self.maximum.clone(), available)?;

        let engine = SafetyEngine::new(tentative);
        let report = engine.run();
        if report.is_safe() {
            info!(%process, %request, "request granted");
            Ok(RequestOutcome::Granted {
                state: engine.into_state(),
                report,
            })
        } else {
            info!(%process, %request, "request denied; it would leave the system unsafe");
            Ok(RequestOutcome::Denied { report })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankviz_types::Verdict;

    fn textbook() -> SystemState {
        SystemState::new(
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
            vec![3, 3, 2],
        )
        .unwrap()
    }

    fn rv(units: &[u32]) -> ResourceVector {
        ResourceVector::new(units.to_vec())
    }

    #[test]
    fn safe_request_is_granted_with_successor_state() {
        let state = textbook();
        let outcome = state.request(ProcessId(1), &rv(&[1, 0, 2])).unwrap();
        let RequestOutcome::Granted { state: next, report } = outcome else {
            panic!("expected grant");
        };
        assert_eq!(report.verdict, Verdict::Safe);
        assert_eq!(next.available(), &rv(&[2, 3, 0]));
        assert_eq!(next.allocation(1), Some(&rv(&[3, 0, 2])));
        assert_eq!(next.need(1), Some(&rv(&[0, 2, 0])));
        // The evaluated state is untouched.
        assert_eq!(state.available(), &rv(&[3, 3, 2]));
    }

    #[test]
    fn request_leading_to_unsafe_state_is_denied() {
        let state = textbook();
        // Classic follow-up: after P1's grant, P0 asking for (0, 2, 0) is unsafe.
        let RequestOutcome::Granted { state: next, .. } =
            state.request(ProcessId(1), &rv(&[1, 0, 2])).unwrap()
        else {
            panic!("expected grant");
        };
        let outcome = next.request(ProcessId(0), &rv(&[0, 2, 0])).unwrap();
        assert!(matches!(outcome, RequestOutcome::Denied { ref report } if report.verdict == Verdict::Unsafe));
    }

    #[test]
    fn request_over_available_must_wait() {
        let state = textbook();
        let outcome = state.request(ProcessId(0), &rv(&[4, 0, 0])).unwrap();
        assert_eq!(
            outcome,
            RequestOutcome::MustWait {
                resource: 0,
                requested: 4,
                available: 3,
            }
        );
    }

    #[test]
    fn request_over_need_is_an_error() {
        let state = textbook();
        assert_eq!(
            state.request(ProcessId(3), &rv(&[1, 0, 0])),
            Err(BankerError::RequestExceedsNeed {
                process: ProcessId(3),
                resource: 0,
                requested: 1,
                need: 0,
            })
        );
    }

    #[test]
    fn request_validation_errors() {
        let state = textbook();
        assert_eq!(
            state.request(ProcessId(9), &rv(&[0, 0, 0])),
            Err(BankerError::UnknownProcess(ProcessId(9)))
        );
        assert!(matches!(
            state.request(ProcessId(0), &rv(&[0, 0])),
            Err(BankerError::Dimension { .. })
        ));
    }
}
