//! Tracing setup

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// Level used until the configuration has been read
pub const DEFAULT_LEVEL: &str = "info";

/// Crates whose debug output drowns ours
const QUIET_TARGETS: &[&str] = &["reqwest=warn", "hyper=warn", "hyper_util=warn", "polars=warn"];

/// Build the filter: `RUST_LOG` wins, otherwise `level` for everything
/// except the HTTP and dataframe stacks which stay at `warn`
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        QUIET_TARGETS
            .iter()
            .fold(EnvFilter::new(level), |filter, directive| match directive.parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            })
    })
}

/// Swaps the installed filter once the configured level is known
#[derive(Clone)]
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    pub fn set_level(&self, level: &str) -> Result<(), reload::Error> {
        self.filter.modify(|filter| *filter = env_filter(level))
    }
}

/// Install the global fmt subscriber at `level`.
///
/// Returns `None` when a global subscriber is already set.
pub fn init(level: &str) -> Option<LogHandle> {
    let (filter, handle) = reload::Layer::<EnvFilter, Registry>::new(env_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .ok()?;

    Some(LogHandle { filter: handle })
}
