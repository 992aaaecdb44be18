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
            "folio_login_total",
            Unit::Count,
            "Login attempts, labelled by outcome."
        );
        describe_counter!(
            "folio_post_saved_total",
            Unit::Count,
            "Posts inserted or updated, labelled by operation."
        );
        describe_counter!(
            "folio_post_deleted_total",
            Unit::Count,
            "Posts deleted."
        );
        describe_counter!(
            "folio_store_request_total",
            Unit::Count,
            "Requests sent to the hosted store, labelled by operation and outcome."
        );
        describe_histogram!(
            "folio_store_request_ms",
            Unit::Milliseconds,
            "Hosted store request latency in milliseconds."
        );
    });
}
