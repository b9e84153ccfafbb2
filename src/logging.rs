//! Tracing subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Logs go to stderr so the CLI can stream a calendar on stdout. Calling
/// this twice is harmless: the second call is ignored.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter for the CLI: quiet unless asked.
pub fn cli_filter(verbose: bool) -> &'static str {
    if verbose {
        "edt_ics=debug"
    } else {
        "edt_ics=warn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_filter() {
        assert_eq!(cli_filter(false), "edt_ics=warn");
        assert_eq!(cli_filter(true), "edt_ics=debug");
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init("edt_ics=warn");
        init("edt_ics=debug");
    }
}
