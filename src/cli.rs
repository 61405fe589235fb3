//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Resolve DSpace works into IIIF-ready JSON records.
///
/// Libros reads work handles (or RDF document URIs), resolves each against
/// the repository, and writes one JSON line per resolved work to stdout.
#[derive(Parser, Debug)]
#[command(name = "libros")]
#[command(author, version, about)]
pub struct Args {
    /// Work handles (e.g. 92214) or RDF document URIs; read from stdin when empty
    pub inputs: Vec<String>,

    /// Read handles or URIs from a file, one per line
    #[arg(short = 'i', long, value_name = "PATH")]
    pub input_file: Option<PathBuf>,

    /// Config file (defaults to $XDG_CONFIG_HOME/libros/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Attempts per page image, including the first (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: Option<u32>,

    /// Delay between attempts in seconds (0-300)
    #[arg(long, value_parser = clap::value_parser!(u64).range(0..=300))]
    pub backoff_secs: Option<u64>,

    /// Deadline for each work's page batch in seconds (1-3600)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: Option<u64>,

    /// Maximum concurrent page requests (1-100; unbounded when unset)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=100))]
    pub max_in_flight: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["libros"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(args.inputs.is_empty());
        assert!(args.max_attempts.is_none());
        assert!(args.max_in_flight.is_none());
    }

    #[test]
    fn test_cli_positional_inputs() {
        let args = Args::try_parse_from([
            "libros",
            "92214",
            "https://oaktrust.library.tamu.edu/rdf/handle/1969.1/92215",
        ])
        .unwrap();
        assert_eq!(args.inputs.len(), 2);
        assert_eq!(args.inputs[0], "92214");
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["libros", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["libros", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["libros", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["libros", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["libros", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_max_attempts_range() {
        let args = Args::try_parse_from(["libros", "-r", "5"]).unwrap();
        assert_eq!(args.max_attempts, Some(5));

        let err = Args::try_parse_from(["libros", "-r", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);

        let err = Args::try_parse_from(["libros", "--max-attempts", "11"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_timeouts() {
        let args =
            Args::try_parse_from(["libros", "--backoff-secs", "0", "--timeout-secs", "120"]).unwrap();
        assert_eq!(args.backoff_secs, Some(0));
        assert_eq!(args.timeout_secs, Some(120));

        let err = Args::try_parse_from(["libros", "--timeout-secs", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_max_in_flight_range() {
        let args = Args::try_parse_from(["libros", "--max-in-flight", "4"]).unwrap();
        assert_eq!(args.max_in_flight, Some(4));

        let err = Args::try_parse_from(["libros", "--max-in-flight", "101"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_input_file_and_config() {
        let args =
            Args::try_parse_from(["libros", "-i", "handles.txt", "--config", "libros.toml"]).unwrap();
        assert_eq!(args.input_file, Some(PathBuf::from("handles.txt")));
        assert_eq!(args.config, Some(PathBuf::from("libros.toml")));
    }
}
