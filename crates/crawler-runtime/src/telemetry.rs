//! Tracing and OpenTelemetry setup for the `crawler` binary.
//!
//! Call [`init_tracing`] once at process startup. Control loops log at
//! `trace` per tick, at `debug` for per-primitive detail and at `info`/`warn`
//! for outcomes, so `RUST_LOG=crawler_runtime=trace` shows every tick.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `CRAWLER_LOG_FORMAT=json` | Emit newline-delimited JSON logs instead of the compact format. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set, spans are exported over OTLP/HTTP. |
//!
//! # Example
//!
//! ```rust,no_run
//! // Hold the guard for the entire lifetime of the process.
//! let _guard = crawler_runtime::telemetry::init_tracing("crawler");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const TRACER_NAME: &str = "crawler";
const DEFAULT_FILTER: &str = "info";

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Console output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// `"json"` (any case) selects JSON; anything else is compact.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Everything [`init_tracing`] reads from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TelemetrySettings {
    pub filter: Option<String>,
    pub format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl TelemetrySettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            filter: lookup("RUST_LOG").filter(|v| !v.is_empty()),
            format: lookup("CRAWLER_LOG_FORMAT")
                .map(|v| LogFormat::parse(&v))
                .unwrap_or_default(),
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|v| !v.is_empty()),
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let directives = self.filter.as_deref().unwrap_or(DEFAULT_FILTER);
        EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("[crawler] invalid log filter '{directives}': {e}; using '{DEFAULT_FILTER}'");
            EnvFilter::new(DEFAULT_FILTER)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber from [`TelemetrySettings::from_env`].
///
/// Spans created with `#[instrument]` on the motion primitives are forwarded
/// to the OTLP collector when one is configured.
///
/// The returned [`TracerProviderGuard`] **must** be held for the lifetime of
/// the process; dropping it flushes pending spans. Calling this twice keeps
/// the first subscriber and reports the conflict on stderr.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    init_tracing_with(service_name, &TelemetrySettings::from_env())
}

pub fn init_tracing_with(service_name: &str, settings: &TelemetrySettings) -> TracerProviderGuard {
    let provider = settings
        .otlp_endpoint
        .as_deref()
        .and_then(|endpoint| build_provider(service_name, endpoint));

    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(TRACER_NAME)));
    let (json_layer, compact_layer) = match settings.format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Compact => (None, Some(tracing_subscriber::fmt::layer().compact())),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(settings.env_filter())
        .with(otel_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()
    {
        eprintln!("[crawler] tracing subscriber already installed: {e}");
    }

    TracerProviderGuard(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// RAII guard
// ─────────────────────────────────────────────────────────────────────────────

/// Shuts down the OTel [`SdkTracerProvider`] on drop, flushing all pending
/// spans. Hold it in `main`.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// `true` when spans are being exported over OTLP.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[crawler] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Returns `None` (after reporting on stderr) when the exporter cannot be
/// built; the caller then logs to the console only.
fn build_provider(service_name: &str, endpoint: &str) -> Option<SdkTracerProvider> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[crawler] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // The control loops are synchronous; the simple exporter needs no
    // async runtime.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}
