//! Log and trace pipeline.
//!
//! [`init_tracing`] installs one global subscriber: an `EnvFilter`, a stderr
//! formatter (compact, or JSON with `BANKVIZ_LOG_FORMAT=json`) and, when
//! `OTEL_EXPORTER_OTLP_ENDPOINT` names a collector, an OpenTelemetry layer
//! exporting spans over OTLP/HTTP.  `RUST_LOG` overrides the caller's
//! default filter.
//!
//! Stdout belongs to the animation; nothing here writes to it.
//!
//! ```rust,no_run
//! let _guard = bankviz_runtime::telemetry::init_tracing("bankviz", "warn");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Shape of log lines on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// `json` selects [`LogFormat::Json`]; anything else, or nothing, is
    /// compact.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }

    fn from_env() -> Self {
        Self::from_setting(std::env::var("BANKVIZ_LOG_FORMAT").ok().as_deref())
    }
}

/// Install the global `tracing` subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset.  When
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set, spans and events from the kernel
/// are also forwarded to the collector.  A second call leaves the first
/// subscriber in place.
///
/// Keep the returned [`TracerProviderGuard`] alive until exit; dropping it
/// flushes pending spans.
pub fn init_tracing(service_name: &str, default_filter: &str) -> TracerProviderGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let provider = build_provider(service_name);
    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(service_name.to_string())));

    let (json, compact) = match LogFormat::from_env() {
        LogFormat::Json => (
            Some(fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Compact => (
            None,
            Some(fmt::layer().compact().with_writer(std::io::stderr)),
        ),
    };

    if tracing_subscriber::registry()
        .with(filter)
        .with(otel)
        .with(json)
        .with(compact)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }

    TracerProviderGuard(provider)
}

/// Shuts the OTel [`SdkTracerProvider`] down when dropped.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[bankviz] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// An OTLP-over-HTTP provider, or `None` without an endpoint or when the
/// exporter fails to build.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[bankviz] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // No Tokio runtime exists yet at startup.
            .with_simple_exporter(exporter)
            .build(),
    )
}
