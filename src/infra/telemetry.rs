use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "tourguard_cache_hit_total",
            Unit::Count,
            "Total number of lookup cache hits, labelled by cache."
        );
        describe_counter!(
            "tourguard_cache_miss_total",
            Unit::Count,
            "Total number of lookup cache misses, labelled by cache."
        );
        describe_counter!(
            "tourguard_cache_expired_total",
            Unit::Count,
            "Total number of entries found past their TTL and removed on read."
        );
        describe_counter!(
            "tourguard_cache_evict_total",
            Unit::Count,
            "Total number of cache evictions due to capacity."
        );
        describe_histogram!(
            "tourguard_upstream_request_ms",
            Unit::Milliseconds,
            "Upstream request latency in milliseconds, labelled by endpoint."
        );
        describe_counter!(
            "tourguard_upstream_failure_total",
            Unit::Count,
            "Total number of failed upstream requests, labelled by endpoint."
        );
        describe_counter!(
            "tourguard_lookup_degraded_total",
            Unit::Count,
            "Total number of lookups answered with a fallback after an upstream failure."
        );
    });
}
