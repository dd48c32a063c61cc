//! Logging and telemetry initialization.
//!
//! Output is chosen by `OTEL_EXPORTER_OTLP_ENDPOINT`:
//! - unset → human-readable events on stderr,
//! - `"stderr"` → JSON events and span closes on stderr,
//! - `"http://..."` → OTLP HTTP export (traces + logs), `otel` feature only.
//!
//! The level filter comes from `LUMINARY_LOG`, then `RUST_LOG`, then the
//! default passed to [`init`] (the CLI maps `-v` flags onto it).

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "LUMINARY_LOG";

/// Opaque guard; dropping it flushes and shuts down the OTLP pipeline.
/// Hold this in `main()` until exit.
pub struct TelemetryGuard {
    #[cfg(feature = "otel")]
    trace_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
    #[cfg(feature = "otel")]
    log_provider: Option<opentelemetry_sdk::logs::SdkLoggerProvider>,
}

impl TelemetryGuard {
    const fn empty() -> Self {
        Self {
            #[cfg(feature = "otel")]
            trace_provider: None,
            #[cfg(feature = "otel")]
            log_provider: None,
        }
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        #[cfg(feature = "otel")]
        {
            if let Some(provider) = self.trace_provider.take()
                && let Err(e) = provider.shutdown()
            {
                eprintln!("otel trace shutdown error: {e}");
            }
            if let Some(provider) = self.log_provider.take()
                && let Err(e) = provider.shutdown()
            {
                eprintln!("otel log shutdown error: {e}");
            }
        }
    }
}

/// Build the level filter: `LUMINARY_LOG`, then `RUST_LOG`, then `default`.
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the global subscriber.
///
/// Returns a guard that must be held until the program exits. Calling this
/// twice is harmless: the second subscriber is rejected and a no-op guard is
/// returned.
#[must_use]
pub fn init(default_level: &str) -> TelemetryGuard {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();

    match endpoint.as_deref() {
        None | Some("") => init_human(default_level),
        Some("stderr") => init_json(default_level),
        #[cfg(feature = "otel")]
        Some(_) => init_otlp(default_level),
        #[cfg(not(feature = "otel"))]
        Some(_) => {
            eprintln!(
                "warning: OTEL_EXPORTER_OTLP_ENDPOINT set but luminary built without 'otel' feature"
            );
            init_human(default_level)
        }
    }
}

fn init_human(default_level: &str) -> TelemetryGuard {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
    TelemetryGuard::empty()
}

fn init_json(default_level: &str) -> TelemetryGuard {
    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
        )
        .try_init();
    TelemetryGuard::empty()
}

/// OTLP HTTP export (traces + logs).
///
/// The SDK reads `OTEL_EXPORTER_OTLP_ENDPOINT` itself and appends
/// `/v1/traces` or `/v1/logs`.
#[cfg(feature = "otel")]
fn init_otlp(default_level: &str) -> TelemetryGuard {
    use opentelemetry::KeyValue;
    use opentelemetry::trace::TracerProvider as _;

    let resource = opentelemetry_sdk::Resource::builder()
        .with_attribute(KeyValue::new("service.name", env!("CARGO_PKG_NAME")))
        .with_attribute(KeyValue::new("service.version", env!("CARGO_PKG_VERSION")))
        .build();

    let span_exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .build()
    {
        Ok(e) => e,
        Err(e) => {
            eprintln!("warning: failed to init OTLP span exporter: {e}");
            return init_human(default_level);
        }
    };
    let trace_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_simple_exporter(span_exporter)
        .with_resource(resource.clone())
        .build();
    let tracer = trace_provider.tracer(env!("CARGO_PKG_NAME"));

    let log_exporter = match opentelemetry_otlp::LogExporter::builder()
        .with_http()
        .build()
    {
        Ok(e) => e,
        Err(e) => {
            eprintln!("warning: failed to init OTLP log exporter: {e}");
            return init_human(default_level);
        }
    };
    let log_provider = opentelemetry_sdk::logs::SdkLoggerProvider::builder()
        .with_simple_exporter(log_exporter)
        .with_resource(resource)
        .build();

    let _ = tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(
            &log_provider,
        ))
        .try_init();

    TelemetryGuard {
        trace_provider: Some(trace_provider),
        log_provider: Some(log_provider),
    }
}
