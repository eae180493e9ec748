//! log output of the command line tool.
//!
//! the engine reports the selected operating point at info, every
//! optimisation pass and fold at debug and contradictory zero distance
//! neighborhoods at trace. logs go to stderr so the predictions printed on
//! stdout can be piped on unchanged.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// most verbose level shown for the number of `-v` flags given
fn level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// installs the global subscriber. `RUST_LOG` wins over `-v` when set
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rionida={}", level(verbosity))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(level(0), LevelFilter::WARN);
        assert_eq!(level(1), LevelFilter::INFO);
        assert_eq!(level(2), LevelFilter::DEBUG);
        assert_eq!(level(7), LevelFilter::TRACE);
    }
}
