use tracing_subscriber::{
    fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

const DEFAULT_FILTER: &str = "coursefiles=debug,tower_http=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}

/// Install the global tracing subscriber.
///
/// Production emits one JSON object per event; other environments use the
/// compact console format.
pub fn init_telemetry(production: bool) -> Result<(), Box<dyn std::error::Error>> {
    if production {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        let console_fmt = tracing_subscriber::fmt::layer().event_format(
            Format::default()
                .compact()
                .with_target(false)
                .without_time(),
        );
        tracing_subscriber::registry()
            .with(env_filter())
            .with(console_fmt)
            .try_init()?;
    }

    tracing::info!(production, "Tracing initialized");
    Ok(())
}
