use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use std::fs::File;
use std::path::Path;

/// Terminal logger plus an optional log file.
///
/// Returns `false` when a logger was already installed (e.g. by an earlier call or a test);
/// the existing logger is kept then.
pub fn init_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<bool, std::io::Error> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        loggers.push(WriteLogger::new(level, Config::default(), File::create(path)?));
    }
    Ok(CombinedLogger::init(loggers).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::info;

    #[test]
    fn test_repeated_init_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("ingest.log");
        let first = init_logging(LevelFilter::Info, Some(&file)).unwrap();
        let second = init_logging(LevelFilter::Info, None).unwrap();
        // only one logger can be installed per process
        assert!(!(first && second));
        info!("logger test");
        assert!(file.exists());
    }
}
