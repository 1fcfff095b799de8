//! `bankviz-kernel` – Deadlock-Avoidance Core
//!
//! The algorithmic heart of Bankviz.  Everything here is pure and
//! synchronous: no I/O, no sleeping, no shared mutable state.  Front ends
//! consume the event stream at whatever pace they like.
//!
//! # Modules
//!
//! - [`system_state`] – [`SystemState`][system_state::SystemState]:
//!   validates allocation / maximum / available input and derives the need
//!   matrix.  Malformed input is rejected before any search runs.
//! - [`safety_engine`] – [`SafetyEngine`][safety_engine::SafetyEngine]:
//!   the safe-sequence search, exposed as a lazy iterator of
//!   [`StepEvent`][bankviz_types::StepEvent]s ending in exactly one verdict.
//! - [`sequence_verifier`] – [`SequenceVerifier`][sequence_verifier::SequenceVerifier]:
//!   replays a caller-proposed order and reports the first unsafe step.
//! - [`request`] – [`RequestOutcome`][request::RequestOutcome]:
//!   grant / wait / deny decisions for additional resource requests.

pub mod request;
pub mod safety_engine;
pub mod sequence_verifier;
pub mod system_state;

pub use request::RequestOutcome;
pub use safety_engine::{SafetyEngine, SafetySteps};
pub use sequence_verifier::SequenceVerifier;
pub use system_state::{ProcessRecord, SystemState};
