use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use burrow::core::config::{self, CliOverrides};
use burrow::tui;
use clap::Parser;
use simplelog::{ConfigBuilder, WriteLogger};

#[derive(Parser)]
#[command(name = "burrow", about = "Browse and edit nested key/value database files")]
struct Args {
    /// Database files to open, one after another
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// How long to wait for a locked file (e.g. 500ms, 2s, 1m)
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<Duration>,

    /// Open files read-only
    #[arg(short, long = "readonly", visible_alias = "ro")]
    read_only: bool,

    /// Don't show values in the tree
    #[arg(long)]
    no_value: bool,
}

fn parse_timeout(input: &str) -> Result<Duration, String> {
    config::parse_duration(input).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // A broken config file shouldn't stop anyone from opening a database.
    let (file_config, config_error) = match config::load_config() {
        Ok(file_config) => (file_config, None),
        Err(e) => {
            eprintln!("Ignoring config file: {e}");
            (config::BurrowConfig::default(), Some(e))
        }
    };
    let cli = CliOverrides {
        timeout: args.timeout,
        read_only: args.read_only,
        no_value: args.no_value,
    };
    let config = config::resolve(&file_config, &cli);

    // Initialize file logger; the terminal belongs to the TUI
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    if let Ok(log_file) = File::create(&config.log_file) {
        let _ = WriteLogger::init(config.log_level, log_config, log_file);
    }

    log::info!(
        "Burrow starting with {} file(s), read_only={}",
        args.files.len(),
        config.read_only
    );
    if let Some(e) = config_error {
        log::warn!("Config file ignored: {}", e);
    }

    match tui::run(&args.files, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_aliases() {
        let args = Args::try_parse_from(["burrow", "--ro", "--timeout", "250ms", "a.db", "b.db"])
            .unwrap();
        assert!(args.read_only);
        assert_eq!(args.timeout, Some(Duration::from_millis(250)));
        assert_eq!(args.files.len(), 2);

        let args = Args::try_parse_from(["burrow", "-r", "--no-value", "a.db"]).unwrap();
        assert!(args.read_only && args.no_value);
    }

    #[test]
    fn test_args_require_a_file() {
        assert!(Args::try_parse_from(["burrow"]).is_err());
        assert!(Args::try_parse_from(["burrow", "--timeout", "soon", "a.db"]).is_err());
    }
}
