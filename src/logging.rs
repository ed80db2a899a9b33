use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Filter directive for this run: `--verbose` forces debug output for this
/// crate, otherwise the configured level applies.
pub fn filter_directive(configured_level: &str, verbose: bool) -> String {
    if verbose {
        "posguard=debug".to_string()
    } else {
        configured_level.to_string()
    }
}

/// Install the global subscriber. Logs go to stderr so JSON on stdout stays
/// machine-readable. `RUST_LOG` overrides everything except `--verbose`.
pub fn init_logging(configured_level: &str, verbose: bool) -> Result<()> {
    let directive = filter_directive(configured_level, verbose);
    let env_filter = if verbose {
        EnvFilter::try_new(&directive)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directive))
    }
    .with_context(|| format!("Invalid log filter: {}", directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_overrides_configured_level() {
        assert_eq!(filter_directive("warn", true), "posguard=debug");
        assert_eq!(filter_directive("info", false), "info");
    }
}
