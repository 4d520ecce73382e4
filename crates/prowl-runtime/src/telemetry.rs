//! Tracing initialisation for prowl.
//!
//! Call [`init_tracing`] once at process startup.  Logs go to stderr so the
//! simulation's own output on stdout stays readable.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `PROWL_LOG_FORMAT` | `compact` (default) or `json` for newline-delimited JSON. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set and not blank, tick spans are exported over OTLP/HTTP, tagged with `service.version` and `prowl.engine`. |
//!
//! # Example
//!
//! ```rust,no_run
//! // Hold the guard for the entire lifetime of the process.
//! let _guard = prowl_runtime::telemetry::init_tracing("prowl");
//! ```

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Env-var selecting the log line format.
pub const LOG_FORMAT_VAR: &str = "PROWL_LOG_FORMAT";

/// Env-var naming the OTLP collector base URL.
pub const OTLP_ENDPOINT_VAR: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// Parse a format name, case-insensitively.  Unknown names yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" => Some(Self::Compact),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Read [`LOG_FORMAT_VAR`], falling back to [`LogFormat::Compact`].
    pub fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_VAR) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|| {
                eprintln!("[prowl] unknown {LOG_FORMAT_VAR}={raw:?}, using compact");
                Self::Compact
            }),
            Err(_) => Self::Compact,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Install the global `tracing` subscriber, with an OTLP exporter when
/// [`OTLP_ENDPOINT_VAR`] is set.
///
/// A second call leaves the first subscriber in place and only reports the
/// fact on stderr.  The returned [`TracerProviderGuard`] must be held for the
/// lifetime of the process.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let provider = build_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("prowl")));

    let (json_layer, compact_layer) = match LogFormat::from_env() {
        LogFormat::Json => (
            Some(fmt::layer().json().with_writer(std::io::stderr)),
            None,
        ),
        LogFormat::Compact => (
            None,
            Some(fmt::layer().compact().with_writer(std::io::stderr)),
        ),
    };

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(otel_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init();
    if let Err(e) = installed {
        eprintln!("[prowl] tracing subscriber already installed: {e}");
    }

    TracerProviderGuard(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// RAII guard
// ─────────────────────────────────────────────────────────────────────────────

/// Shuts down the OTel [`SdkTracerProvider`] on drop, flushing pending spans.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl TracerProviderGuard {
    /// True when spans are being exported.
    pub fn is_exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[prowl] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ─────────────────────────────────────────────────────────────────────────────

/// The collector URL, if one is configured.  Blank values count as unset.
fn otlp_endpoint(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(OTLP_ENDPOINT_VAR)
        .map(|raw| raw.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Describes this process to the collector: the service name, the prowl
/// version, and which engine crate emitted the spans.
fn simulation_resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attributes([
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            KeyValue::new("prowl.engine", env!("CARGO_PKG_NAME")),
        ])
        .build()
}

fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = otlp_endpoint(|key| std::env::var(key).ok())?;
    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint.as_str())
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("[prowl] cannot export tick spans to {endpoint}: {e}");
            return None;
        }
    };

    // Ticks run on one thread without an async runtime, so each span is
    // shipped as soon as it closes.
    let provider = SdkTracerProvider::builder()
        .with_resource(simulation_resource(service_name))
        .with_simple_exporter(exporter)
        .build();
    Some(provider)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_known_names() {
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse(" JSON "), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("text"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("yaml"), None);
        assert_eq!(LogFormat::default(), LogFormat::Compact);
    }

    #[test]
    fn blank_endpoint_disables_export() {
        assert_eq!(otlp_endpoint(|_| None), None);
        assert_eq!(otlp_endpoint(|_| Some("   ".to_string())), None);
        assert_eq!(
            otlp_endpoint(|key: &str| (key == OTLP_ENDPOINT_VAR)
                .then(|| " http://localhost:4318 ".to_string())),
            Some("http://localhost:4318".to_string())
        );
    }

    #[test]
    fn build_provider_returns_none_without_endpoint() {
        // SAFETY: no other test in this crate reads this env-var.
        unsafe { std::env::remove_var(OTLP_ENDPOINT_VAR) };
        assert!(build_provider("prowl-test").is_none());
    }

    #[test]
    fn resource_names_the_service_and_version() {
        let resource = simulation_resource("prowl-test");
        let attr = |name: &str| {
            resource
                .iter()
                .find(|(key, _)| key.as_str() == name)
                .map(|(_, value)| value.to_string())
        };
        assert_eq!(attr("service.name").as_deref(), Some("prowl-test"));
        assert_eq!(attr("service.version").as_deref(), Some(env!("CARGO_PKG_VERSION")));
        assert_eq!(attr("prowl.engine").as_deref(), Some("prowl-runtime"));
    }

    #[test]
    fn guard_without_provider_drops_cleanly() {
        let guard = TracerProviderGuard(None);
        assert!(!guard.is_exporting());
        drop(guard);
    }
}
