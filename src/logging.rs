// Tracing subscriber setup

use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "HOTEL_BOT_LOG";
pub const DEFAULT_FILTER: &str = "hotel_search_bot=info";

static INIT: Once = Once::new();

// Initializes logging once per process.
//
// `HOTEL_BOT_LOG` wins over the configured filter; an invalid or missing
// filter falls back to `hotel_search_bot=info`.
pub fn init_tracing(configured: Option<&str>) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_line_number(true))
            .with(filter)
            .init();
    });
}
