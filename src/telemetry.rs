use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// `RUST_LOG` wins over the configured level when set.
pub fn init_subscriber(log_level: LogLevel) {
    let default_filter = format!("{},reqwest=info,hyper=info", log_level.as_str());

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
