//! `bankviz-runtime` – Presentation-side Scheduling
//!
//! Everything that sits between the pure kernel and a front end: where the
//! search runs, how fast its events are shown, and where logs go.
//!
//! # Modules
//!
//! - [`worker`] – [`spawn_search`][worker::spawn_search]:
//!   runs a [`SafetyEngine`][bankviz_kernel::SafetyEngine] on a Tokio
//!   blocking worker and hands its events over a bounded channel as a
//!   [`StepStream`][worker::StepStream].
//! - [`player`] – [`Player`][player::Player]:
//!   drains a stream at a configurable [`Pacing`][player::Pacing], honouring
//!   a shared cancel flag.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]:
//!   initialises the global `tracing` subscriber with an optional OTLP span
//!   exporter.  Set `OTEL_EXPORTER_OTLP_ENDPOINT` to enable trace export.

pub mod player;
pub mod telemetry;
pub mod worker;

pub use player::{Pacing, PlayOutcome, Player};
pub use telemetry::{LogFormat, TracerProviderGuard, init_tracing};
pub use worker::{StepStream, spawn_search, spawn_search_with_buffer};
