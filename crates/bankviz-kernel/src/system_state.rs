//! [`SystemState`] – validated allocation / maximum / available snapshot.
//!
//! A state is built once per run from caller-supplied matrices.  Construction
//! validates the shape of every row and derives the need matrix
//! (`need[i][j] = maximum[i][j] - allocation[i][j]`); any inconsistency is
//! reported as a [`BankerError`] before a search can start.
//!
//! The state is immutable afterwards.  Searches and request evaluation work
//! on copies, so the same state can be inspected again after a run.

use bankviz_types::{BankerError, ProcessId, ResourceVector, Scenario};

/// Borrowed view of a single process inside a [`SystemState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessRecord<'a> {
    pub id: ProcessId,
    /// Units currently held.
    pub allocation: &'a ResourceVector,
    /// Units the process may ever hold.
    pub maximum: &'a ResourceVector,
    /// Remaining possible demand.
    pub need: &'a ResourceVector,
}

/// Validated resource state of `n` processes over `m` resource types.
///
/// # Example
///
/// ```
/// use bankviz_kernel::SystemState;
///
/// let state = SystemState::new(
///     vec![vec![0, 1], vec![2, 0]],
///     vec![vec![1, 1], vec![3, 2]],
///     vec![1, 1],
/// )
/// .unwrap();
///
/// assert_eq!(state.process_count(), 2);
/// assert_eq!(state.need(1).unwrap().as_slice(), &[1, 2]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemState {
    pub(crate) allocation: Vec<ResourceVector>,
    pub(crate) maximum: Vec<ResourceVector>,
    pub(crate) need: Vec<ResourceVector>,
    pub(crate) available: ResourceVector,
}

impl SystemState {
    /// Validate the three inputs and derive the need matrix.
    ///
    /// Fails with [`BankerError::EmptyDimension`] when there are no processes
    /// or no resource types, [`BankerError::Dimension`] when a row or the
    /// maximum matrix does not match the inferred n×m shape, and
    /// [`BankerError::NegativeNeed`] when a maximum is below its allocation.
    pub fn new(
        allocation: Vec<Vec<u32>>,
        maximum: Vec<Vec<u32>>,
        available: Vec<u32>,
    ) -> Result<Self, BankerError> {
        let n = allocation.len();
        let m = available.len();
        if n == 0 {
            return Err(BankerError::EmptyDimension {
                what: "process".to_string(),
            });
        }
        if m == 0 {
            return Err(BankerError::EmptyDimension {
                what: "resource type".to_string(),
            });
        }
        if maximum.len() != n {
            return Err(BankerError::Dimension {
                field: "maximum".to_string(),
                expected: n,
                found: maximum.len(),
            });
        }
        check_rows("allocation", &allocation, m)?;
        check_rows("maximum", &maximum, m)?;

        Self::from_parts(
            allocation.into_iter().map(ResourceVector::from).collect(),
            maximum.into_iter().map(ResourceVector::from).collect(),
            ResourceVector::from(available),
        )
    }

    /// Build a state from a [`Scenario`] document.
    ///
    /// Declared `processes` / `resources` counts must agree with the matrix
    /// shape; when absent they are inferred.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, BankerError> {
        if let Some(n) = scenario.processes {
            if n == 0 {
                return Err(BankerError::EmptyDimension {
                    what: "process".to_string(),
                });
            }
            if scenario.allocation.len() != n {
                return Err(BankerError::Dimension {
                    field: "allocation".to_string(),
                    expected: n,
                    found: scenario.allocation.len(),
                });
            }
        }
        if let Some(m) = scenario.resources {
            if m == 0 {
                return Err(BankerError::EmptyDimension {
                    what: "resource type".to_string(),
                });
            }
            if scenario.available.len() != m {
                return Err(BankerError::Dimension {
                    field: "available".to_string(),
                    expected: m,
                    found: scenario.available.len(),
                });
            }
        }
        Self::new(
            scenario.allocation.clone(),
            scenario.maximum.clone(),
            scenario.available.clone(),
        )
    }

    /// Assemble a state from vectors whose lengths are already known to
    /// match, deriving need.
    pub(crate) fn from_parts(
        allocation: Vec<ResourceVector>,
        maximum: Vec<ResourceVector>,
        available: ResourceVector,
    ) -> Result<Self, BankerError> {
        let need = allocation
            .iter()
            .zip(&maximum)
            .enumerate()
            .map(|(i, (held, max))| {
                max.checked_sub(held).ok_or_else(|| {
                    // checked_sub only fails on an underflowing component here.
                    let j = held.first_excess(max).unwrap_or_default();
                    BankerError::NegativeNeed {
                        process: ProcessId(i),
                        resource: j,
                        maximum: max[j],
                        allocation: held[j],
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            allocation,
            maximum,
            need,
            available,
        })
    }

    /// Number of processes (n).
    pub fn process_count(&self) -> usize {
        self.allocation.len()
    }

    /// Number of resource types (m).
    pub fn resource_count(&self) -> usize {
        self.available.len()
    }

    pub fn available(&self) -> &ResourceVector {
        &self.available
    }

    pub fn allocation(&self, process: usize) -> Option<&ResourceVector> {
        self.allocation.get(process)
    }

    pub fn maximum(&self, process: usize) -> Option<&ResourceVector> {
        self.maximum.get(process)
    }

    pub fn need(&self, process: usize) -> Option<&ResourceVector> {
        self.need.get(process)
    }

    /// The full derived need matrix, one row per process.
    pub fn need_matrix(&self) -> &[ResourceVector] {
        &self.need
    }

    pub fn process(&self, process: usize) -> Option<ProcessRecord<'_>> {
        Some(ProcessRecord {
            id: ProcessId(process),
            allocation: self.allocation.get(process)?,
            maximum: self.maximum.get(process)?,
            need: self.need.get(process)?,
        })
    }

    /// Iterate over every process in index order.
    pub fn processes(&self) -> impl Iterator<Item = ProcessRecord<'_>> + '_ {
        (0..self.process_count()).filter_map(|i| self.process(i))
    }
}

fn check_rows(field: &str, rows: &[Vec<u32>], m: usize) -> Result<(), BankerError> {
    for (i, row) in rows.iter().enumerate() {
        if row.len() != m {
            return Err(BankerError::Dimension {
                field: format!("{field}[{i}]"),
                expected: m,
                found: row.len(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook() -> (Vec<Vec<u32>>, Vec<Vec<u32>>, Vec<u32>) {
        (
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
    }

    #[test]
    fn need_is_maximum_minus_allocation() {
        let (alloc, max, avail) = textbook();
        let state = SystemState::new(alloc, max, avail).unwrap();
        let need: Vec<Vec<u32>> = state
            .need_matrix()
            .iter()
            .map(|row| row.as_slice().to_vec())
            .collect();
        assert_eq!(
            need,
            vec![
                vec![7, 4, 3],
                vec![1, 2, 2],
                vec![6, 0, 0],
                vec![0, 1, 1],
                vec![4, 3, 1],
            ]
        );
        assert_eq!(state.process_count(), 5);
        assert_eq!(state.resource_count(), 3);
    }

    #[test]
    fn allocation_row_of_wrong_length_is_a_dimension_error() {
        let (mut alloc, max, avail) = textbook();
        alloc[2] = vec![3, 0];
        let err = SystemState::new(alloc, max, avail).unwrap_err();
        assert_eq!(
            err,
            BankerError::Dimension {
                field: "allocation[2]".to_string(),
                expected: 3,
                found: 2,
            }
        );
    }

    #[test]
    fn maximum_row_count_mismatch_is_a_dimension_error() {
        let (alloc, mut max, avail) = textbook();
        max.pop();
        assert!(matches!(
            SystemState::new(alloc, max, avail),
            Err(BankerError::Dimension { ref field, expected: 5, found: 4 }) if field == "maximum"
        ));
    }

    #[test]
    fn maximum_row_of_wrong_length_is_a_dimension_error() {
        let (alloc, mut max, avail) = textbook();
        max[4] = vec![4, 3, 3, 1];
        assert!(matches!(
            SystemState::new(alloc, max, avail),
            Err(BankerError::Dimension { ref field, .. }) if field == "maximum[4]"
        ));
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            SystemState::new(vec![], vec![], vec![1]),
            Err(BankerError::EmptyDimension { .. })
        ));
        assert!(matches!(
            SystemState::new(vec![vec![]], vec![vec![]], vec![]),
            Err(BankerError::EmptyDimension { .. })
        ));
    }

    #[test]
    fn maximum_below_allocation_is_negative_need() {
        let (alloc, mut max, avail) = textbook();
        max[3] = vec![2, 0, 2];
        let err = SystemState::new(alloc, max, avail).unwrap_err();
        assert_eq!(
            err,
            BankerError::NegativeNeed {
                process: ProcessId(3),
                resource: 1,
                maximum: 0,
                allocation: 1,
            }
        );
    }

    #[test]
    fn scenario_counts_must_match_shape() {
        let (alloc, max, avail) = textbook();
        let mut scenario = Scenario {
            name: None,
            processes: Some(5),
            resources: Some(3),
            allocation: alloc,
            maximum: max,
            available: avail,
        };
        assert!(SystemState::from_scenario(&scenario).is_ok());

        scenario.processes = Some(4);
        assert!(matches!(
            SystemState::from_scenario(&scenario),
            Err(BankerError::Dimension { ref field, .. }) if field == "allocation"
        ));

        scenario.processes = None;
        scenario.resources = Some(2);
        assert!(matches!(
            SystemState::from_scenario(&scenario),
            Err(BankerError::Dimension { ref field, .. }) if field == "available"
        ));
    }

    #[test]
    fn process_records_expose_rows() {
        let (alloc, max, avail) = textbook();
        let state = SystemState::new(alloc, max, avail).unwrap();
        let p1 = state.process(1).unwrap();
        assert_eq!(p1.id, ProcessId(1));
        assert_eq!(p1.allocation.as_slice(), &[2, 0, 0]);
        assert_eq!(p1.maximum.as_slice(), &[3, 2, 2]);
        assert_eq!(p1.need.as_slice(), &[1, 2, 2]);
        assert!(state.process(5).is_none());
        assert_eq!(state.processes().count(), 5);
    }
}
