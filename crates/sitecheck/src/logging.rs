//! Logging setup.
//!
//! `RUST_LOG` wins when set. Otherwise the `-v`/`-q` flags pick the level
//! for the `sitecheck` target.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Startup, record creation and rejected submissions.
    #[default]
    Normal,
    /// Adds storage inserts and schema work.
    Verbose,
    /// Everything, including axum's extractor rejections.
    Trace,
}

impl Verbosity {
    /// Level applied to the `sitecheck` target.
    #[must_use]
    pub fn level(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    #[must_use]
    pub fn directives(&self) -> String {
        let own = format!("sitecheck={}", self.level());
        match self {
            Self::Trace => format!("{own},axum::rejection=trace"),
            _ => own,
        }
    }
}

/// Install the global subscriber.
///
/// A second call is a no-op.
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .try_init();
}

/// Route warnings from the code under test to the test writer.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(Verbosity::Quiet.level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.level(), Level::INFO);
        assert_eq!(Verbosity::Verbose.level(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.level(), Level::TRACE);
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_directives() {
        assert_eq!(Verbosity::Quiet.directives(), "sitecheck=ERROR");
        assert_eq!(Verbosity::Verbose.directives(), "sitecheck=DEBUG");
        assert_eq!(
            Verbosity::Trace.directives(),
            "sitecheck=TRACE,axum::rejection=trace"
        );
        for v in [Verbosity::Quiet, Verbosity::Normal, Verbosity::Trace] {
            assert!(EnvFilter::try_new(v.directives()).is_ok());
        }
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(Verbosity::Normal);
        init_logging(Verbosity::Trace);
        init_test_logging();
    }
}
