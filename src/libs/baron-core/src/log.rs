//! Logging utilities

pub use ::log::{debug, error, info, trace, warn, LevelFilter};

/// Map a textual level to a filter, defaulting to `Info`
pub fn parse_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence; `level` is the fallback filter.
/// Calling this more than once is harmless.
pub fn log_init(level: &str) {
    let filter = parse_level(level).to_string().to_lowercase();
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp_millis()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), LevelFilter::Debug);
        assert_eq!(parse_level("warn"), LevelFilter::Warn);
        assert_eq!(parse_level("bogus"), LevelFilter::Info);
        assert_eq!(parse_level("off"), LevelFilter::Off);
    }

    #[test]
    fn test_log_init_twice() {
        log_init("debug");
        log_init("info");
        info!("logging initialized");
    }
}
