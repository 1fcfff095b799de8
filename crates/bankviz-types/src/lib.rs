use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Ordered snapshot of resource units, one entry per resource type.
///
/// Used both for the global `available` pool and for the evolving `work`
/// vector of a safety search.  Components are unsigned, so a vector can
/// never hold a negative unit count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector(Vec<u32>);

impl ResourceVector {
    pub fn new(units: Vec<u32>) -> Self {
        Self(units)
    }

    /// A vector of `len` zero components.
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u32> {
        self.0
    }

    /// Returns `true` when every component of `demand` fits into `self`.
    ///
    /// Vectors of different lengths never cover each other.
    pub fn covers(&self, demand: &ResourceVector) -> bool {
        self.len() == demand.len() && self.0.iter().zip(&demand.0).all(|(have, want)| want <= have)
    }

    /// Index of the first component where `self` exceeds `limit`, if any.
    pub fn first_excess(&self, limit: &ResourceVector) -> Option<usize> {
        self.0
            .iter()
            .zip(&limit.0)
            .position(|(value, bound)| value > bound)
    }

    /// Component-wise sum.  Saturates at `u32::MAX` instead of wrapping.
    pub fn add(&self, other: &ResourceVector) -> ResourceVector {
        ResourceVector(
            self.0
                .iter()
                .zip(&other.0)
                .map(|(a, b)| a.saturating_add(*b))
                .collect(),
        )
    }

    /// Component-wise difference, or `None` when any component would drop
    /// below zero or the lengths differ.
    pub fn checked_sub(&self, other: &ResourceVector) -> Option<ResourceVector> {
        if self.len() != other.len() {
            return None;
        }
        self.0
            .iter()
            .zip(&other.0)
            .map(|(a, b)| a.checked_sub(*b))
            .collect::<Option<Vec<u32>>>()
            .map(ResourceVector)
    }
}

impl From<Vec<u32>> for ResourceVector {
    fn from(units: Vec<u32>) -> Self {
        Self(units)
    }
}

impl Index<usize> for ResourceVector {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (j, units) in self.0.iter().enumerate() {
            if j > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{units}")?;
        }
        write!(f, "]")
    }
}

/// Index of a process in `0..n`.  Displayed as `P{index}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub usize);

impl ProcessId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl FromStr for ProcessId {
    type Err = BankerError;

    /// Accepts `P3`, `p3` or a bare `3`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('P')
            .or_else(|| trimmed.strip_prefix('p'))
            .unwrap_or(trimmed);
        digits
            .parse::<usize>()
            .map(ProcessId)
            .map_err(|e| BankerError::Parse {
                field: "process".to_string(),
                value: trimmed.to_string(),
                reason: e.to_string(),
            })
    }
}

/// One observable step of a safety search, in chronological order.
///
/// A search emits any number of `Evaluating`/`Selected` pairs followed by
/// exactly one terminal event (`SafeComplete` or `Deadlocked`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    /// `process` can run with the current `work`; emitted before its
    /// allocation is released back into `work`.
    Evaluating {
        process: ProcessId,
        work: ResourceVector,
    },
    /// `process` finished; `work` already includes its released allocation.
    Selected {
        process: ProcessId,
        work: ResourceVector,
        sequence: Vec<ProcessId>,
    },
    /// No unfinished process can be satisfied.  `sequence` is the order found
    /// before the search stalled.
    Deadlocked { sequence: Vec<ProcessId> },
    /// Every process finished; `sequence` is a full safe order.
    SafeComplete { sequence: Vec<ProcessId> },
}

impl StepEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepEvent::Deadlocked { .. } | StepEvent::SafeComplete { .. }
        )
    }

    /// The process this event is about, for non-terminal events.
    pub fn process(&self) -> Option<ProcessId> {
        match self {
            StepEvent::Evaluating { process, .. } | StepEvent::Selected { process, .. } => {
                Some(*process)
            }
            _ => None,
        }
    }

    /// The verdict carried by a terminal event.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            StepEvent::SafeComplete { .. } => Some(Verdict::Safe),
            StepEvent::Deadlocked { .. } => Some(Verdict::Unsafe),
            _ => None,
        }
    }
}

/// Final outcome of a safety search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Unsafe,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Safe => write!(f, "SAFE"),
            Verdict::Unsafe => write!(f, "NOT SAFE"),
        }
    }
}

/// Summary of a completed safety search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyReport {
    pub verdict: Verdict,
    /// Full safe order when `Safe`, the partial order otherwise.
    pub sequence: Vec<ProcessId>,
    /// `work` at the moment the search stopped.
    pub final_work: ResourceVector,
    /// `finished[i]` is true when process i was selected.
    pub finished: Vec<bool>,
}

impl SafetyReport {
    pub fn is_safe(&self) -> bool {
        self.verdict == Verdict::Safe
    }

    /// Processes that never got to run.
    pub fn stuck(&self) -> impl Iterator<Item = ProcessId> + '_ {
        self.finished
            .iter()
            .enumerate()
            .filter(|(_, done)| !**done)
            .map(|(i, _)| ProcessId(i))
    }
}

/// Scenario document accepted by front ends (TOML or JSON).
///
/// `processes` and `resources` are optional; when present they must agree
/// with the matrix shape, otherwise n and m are inferred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Scenario {
    /// Free-form label shown by front ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Declared number of processes (n).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processes: Option<usize>,
    /// Declared number of resource types (m).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<usize>,
    /// n×m units currently held by each process.
    pub allocation: Vec<Vec<u32>>,
    /// n×m upper bound each process may ever hold.
    pub maximum: Vec<Vec<u32>>,
    /// m units not allocated to any process.
    pub available: Vec<u32>,
}

/// Machine-readable record of one run, for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunTranscript {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    pub need: Vec<ResourceVector>,
    pub events: Vec<StepEvent>,
    pub verdict: Verdict,
}

impl RunTranscript {
    pub fn new(
        scenario: Option<String>,
        need: Vec<ResourceVector>,
        events: Vec<StepEvent>,
        verdict: Verdict,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            scenario,
            need,
            events,
            verdict,
        }
    }
}

/// Every failure the workspace reports: malformed input, bad requests and
/// rejected sequences.  The safety search itself never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BankerError {
    #[error("Dimension mismatch in {field}: expected {expected} entries, found {found}")]
    Dimension {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Dimension error: at least one {what} is required")]
    EmptyDimension { what: String },

    #[error(
        "Negative need for {process}, resource R{resource}: maximum {maximum} is below allocation {allocation}"
    )]
    NegativeNeed {
        process: ProcessId,
        resource: usize,
        maximum: u32,
        allocation: u32,
    },

    #[error("Parse error in {field}: '{value}' ({reason})")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown process {0}")]
    UnknownProcess(ProcessId),

    #[error(
        "{process} requested {requested} units of R{resource} but only declared a need of {need}"
    )]
    RequestExceedsNeed {
        process: ProcessId,
        resource: usize,
        requested: u32,
        need: u32,
    },

    #[error("Invalid sequence: {0}")]
    InvalidSequence(String),

    #[error("Sequence is not safe at step {position}: {process} needs {need} but work is {work}")]
    SequenceNotSafe {
        position: usize,
        process: ProcessId,
        need: ResourceVector,
        work: ResourceVector,
    },
}
