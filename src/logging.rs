use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

pub fn setup_tracing(verbosity_level: u8, json: bool) {
    let filter = match verbosity_level {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(filter.into())
        .from_env_lossy();

    let stdout_layer = if json {
        fmt::layer().json().with_filter(env_filter).boxed()
    } else {
        fmt::layer().with_filter(env_filter).boxed()
    };

    tracing_subscriber::registry().with(stdout_layer).init();
}
