use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "projector_build=info";
const VERBOSE_FILTER: &str = "projector_build=debug";

/// Logs go to stderr so stdout stays reserved for command output.
///
/// `RUST_LOG` wins over both defaults, e.g. `RUST_LOG=projector_build=trace`.
pub fn init(verbose: bool) -> Result<()> {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init()
        .context("failed to initialize tracing subscriber")?;
    Ok(())
}
