use anyhow::Context as _;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::AnyResult;

/// Installs the global subscriber. Filtering is controlled through
/// `RUST_LOG` and defaults to `info`.
///
/// # Errors
///
/// Returns an error if the journal socket cannot be reached or a
/// subscriber is already installed.
pub fn init_logging(journald: bool) -> AnyResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let journald_layer = journald
        .then(tracing_journald::layer)
        .transpose()
        .context("unable to connect to journald")?;

    let fmt_layer = journald_layer
        .is_none()
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(journald_layer)
        .with(fmt_layer)
        .try_init()
        .context("unable to install tracing subscriber")?;

    Ok(())
}
