//! Logging and trace export.
//!
//! `tracing-subscriber` with an `EnvFilter` (`RUST_LOG` overrides the
//! configured level) and either a compact or a JSON formatter. With the
//! `otlp` feature and an endpoint configured, spans are also exported over
//! OTLP/gRPC.

use crate::config::LogConfig;
use crate::error::{Result, ServerError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

/// Install the global subscriber. Call once at startup.
///
/// Keep the returned guard alive until exit; dropping it flushes pending
/// spans.
pub fn init_tracing(config: &LogConfig) -> Result<TracingGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Telemetry(format!("bad log filter {:?}: {e}", config.level)))?;

    let fmt_layer: BoxedLayer = if config.json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer().with_target(true).compact().boxed()
    };

    let (otel_layer, guard) = otlp_layer(config)?;
    let mut layers = vec![fmt_layer];
    layers.extend(otel_layer);

    tracing_subscriber::registry()
        .with(layers.with_filter(env_filter))
        .try_init()
        .map_err(|e| ServerError::Telemetry(e.to_string()))?;

    if config.otlp_endpoint.is_some() && !guard.exporting() {
        tracing::warn!("OTLP endpoint configured but built without the `otlp` feature");
    }

    Ok(guard)
}

#[cfg(feature = "otlp")]
fn otlp_layer(config: &LogConfig) -> Result<(Option<BoxedLayer>, TracingGuard)> {
    use opentelemetry::trace::TracerProvider as _;

    let Some(endpoint) = &config.otlp_endpoint else {
        return Ok((None, TracingGuard::default()));
    };

    let provider = otlp::provider(&config.service_name, endpoint)?;
    let layer = tracing_opentelemetry::layer()
        .with_tracer(provider.tracer("ladder"))
        .boxed();

    Ok((
        Some(layer),
        TracingGuard {
            provider: Some(provider),
        },
    ))
}

#[cfg(not(feature = "otlp"))]
fn otlp_layer(_config: &LogConfig) -> Result<(Option<BoxedLayer>, TracingGuard)> {
    Ok((None, TracingGuard::default()))
}

#[cfg(feature = "otlp")]
mod otlp {
    use crate::error::{Result, ServerError};
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::{
        runtime,
        trace::{Config, Sampler, TracerProvider},
        Resource,
    };

    pub fn provider(service_name: &str, endpoint: &str) -> Result<TracerProvider> {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint)
            .build_span_exporter()
            .map_err(|e| ServerError::Telemetry(format!("OTLP exporter: {e}")))?;

        let resource = Resource::new(vec![
            KeyValue::new("service.name", service_name.to_string()),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION").to_string()),
        ]);

        Ok(TracerProvider::builder()
            .with_batch_exporter(exporter, runtime::Tokio)
            .with_config(
                Config::default()
                    .with_sampler(Sampler::AlwaysOn)
                    .with_resource(resource),
            )
            .build())
    }
}

/// Shuts the trace exporter down on drop.
#[derive(Default)]
pub struct TracingGuard {
    #[cfg(feature = "otlp")]
    provider: Option<opentelemetry_sdk::trace::TracerProvider>,
}

impl TracingGuard {
    /// Whether spans are being exported.
    pub fn exporting(&self) -> bool {
        #[cfg(feature = "otlp")]
        {
            self.provider.is_some()
        }
        #[cfg(not(feature = "otlp"))]
        {
            false
        }
    }
}

#[cfg(feature = "otlp")]
impl Drop for TracingGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                eprintln!("error shutting down tracer provider: {e:?}");
            }
        }
    }
}
