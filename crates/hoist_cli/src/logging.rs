//! Subscriber setup for the `hoist` binary.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber.
///
/// `RUST_LOG` takes precedence over `--log-level`, which takes precedence over
/// `[log] level` from `hoist.toml`.
pub fn init(flag: Option<&str>, configured: &str) -> Result<(), Box<dyn std::error::Error>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = EnvFilter::try_new(directive(rust_log.as_deref(), flag, configured))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()?;
    Ok(())
}

fn directive<'a>(rust_log: Option<&'a str>, flag: Option<&'a str>, configured: &'a str) -> &'a str {
    [rust_log, flag]
        .into_iter()
        .flatten()
        .find(|d| !d.trim().is_empty())
        .unwrap_or(if configured.trim().is_empty() { "info" } else { configured })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_wins() {
        assert_eq!(directive(Some("trace"), Some("debug"), "warn"), "trace");
    }

    #[test]
    fn flag_beats_config() {
        assert_eq!(directive(None, Some("debug"), "warn"), "debug");
        assert_eq!(directive(Some(""), Some("debug"), "warn"), "debug");
    }

    #[test]
    fn config_then_info() {
        assert_eq!(directive(None, None, "warn"), "warn");
        assert_eq!(directive(None, None, ""), "info");
    }

    #[test]
    fn directives_parse() {
        assert!(EnvFilter::try_new("info,hoist_sync=debug").is_ok());
    }
}
