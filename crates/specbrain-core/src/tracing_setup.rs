//! Tracing initialisation and span definitions for brain operations.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "SPECBRAIN_LOG";

/// Install the global subscriber. Filter comes from `SPECBRAIN_LOG`, defaulting to `info`.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(json: bool) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    }
}

/// Create a learner span.
#[macro_export]
macro_rules! learning_span {
    ($learner:expr, $category:expr) => {
        tracing::info_span!("specbrain.learning", learner = %$learner, category = %$category)
    };
}

/// Create a ranking span.
#[macro_export]
macro_rules! ranking_span {
    ($mode:expr, $batch_size:expr) => {
        tracing::info_span!("specbrain.ranking", mode = %$mode, batch_size = $batch_size)
    };
}

/// Create a persistence span.
#[macro_export]
macro_rules! persist_span {
    ($category:expr, $mode:expr) => {
        tracing::info_span!("specbrain.persist", category = %$category, mode = %$mode)
    };
}

/// Create a load span.
#[macro_export]
macro_rules! load_span {
    ($category:expr) => {
        tracing::info_span!("specbrain.load", category = %$category)
    };
}
