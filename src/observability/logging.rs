//! Logging initialization for `moodharmony`.
//!
//! Logs go to stderr; stdout belongs to the interactive session display.
//! Verbosity raises the level of this crate's own targets only, so the
//! metrics exporter and other dependencies stay at `warn` unless
//! `MOODHARMONY_LOG_LEVEL` says otherwise.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the verbosity-derived filter.
pub const LOG_LEVEL_ENV: &str = "MOODHARMONY_LOG_LEVEL";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact single-line output with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON, event fields flattened into the object.
    Json,
}

/// Maps a `-v` count to a filter directive.
///
/// `-v` shows session lifecycle, `-vv` adds per-tick and tick-source
/// detail, `-vvv` traces this crate and opens dependencies up to `info`.
#[must_use]
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,moodharmony=info",
        2 => "warn,moodharmony=debug",
        _ => "info,moodharmony=trace",
    }
}

fn use_ansi(color: ColorChoice) -> bool {
    match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    }
}

/// Installs the global tracing subscriber.
///
/// `MOODHARMONY_LOG_LEVEL` takes precedence over `verbosity`. A subscriber
/// that is already installed is left in place.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));
    let show_target = verbosity >= 2;

    let installed = match format {
        LogFormat::Human => tracing_subscriber::fmt()
            .compact()
            .with_env_filter(filter)
            .with_ansi(use_ansi(color))
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_env_filter(filter)
            .with_target(show_target)
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_default_is_warn_everywhere() {
        assert_eq!(verbosity_to_directive(0), "warn");
    }

    #[test]
    fn test_verbosity_scopes_to_crate() {
        assert_eq!(verbosity_to_directive(1), "warn,moodharmony=info");
        assert_eq!(verbosity_to_directive(2), "warn,moodharmony=debug");
        assert_eq!(verbosity_to_directive(9), "info,moodharmony=trace");
    }

    #[test]
    fn test_directives_parse() {
        for v in 0..=3 {
            assert!(EnvFilter::try_new(verbosity_to_directive(v)).is_ok());
        }
    }

    #[test]
    fn test_explicit_color_choice() {
        assert!(use_ansi(ColorChoice::Always));
        assert!(!use_ansi(ColorChoice::Never));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(LogFormat::Human, 0, ColorChoice::Never);
        init_logging(LogFormat::Json, 3, ColorChoice::Never);
    }
}
