//! Command-line interface for locviz.

use std::path::PathBuf;

use clap::Parser;

/// locviz - Plot a location history export on a map
///
/// Reads a location history JSON export and draws every recorded position as
/// a point on a transverse Mercator map centred on the given coordinates.
#[derive(Debug, Parser)]
#[command(name = "locviz")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Location history JSON export to read
    #[arg(long, value_name = "FILE")]
    pub location_history_json: PathBuf,

    /// PNG file to write
    #[arg(long, value_name = "FILE")]
    pub output_png: PathBuf,

    /// Latitude of the map centre in degrees
    #[arg(long, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Longitude of the map centre in degrees
    #[arg(
        long = "longtitude",
        visible_alias = "longitude",
        allow_negative_numbers = true
    )]
    pub longitude: f64,

    /// Path to custom configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use clap::CommandFactory;

    const REQUIRED: [&str; 9] = [
        "locviz",
        "--location-history-json",
        "LocationHistory.json",
        "--output-png",
        "out.png",
        "--latitude",
        "52.2053",
        "--longtitude",
        "0.1218",
    ];

    fn parse(extra: &[&str]) -> Cli {
        let args = REQUIRED.iter().chain(extra.iter());
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "locviz");
    }

    #[test]
    fn test_parse_required_flags() {
        let cli = parse(&[]);
        assert_eq!(cli.location_history_json, PathBuf::from("LocationHistory.json"));
        assert_eq!(cli.output_png, PathBuf::from("out.png"));
        assert!((cli.latitude - 52.2053).abs() < 1e-12);
        assert!((cli.longitude - 0.1218).abs() < 1e-12);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "locviz",
            "--location-history-json",
            "in.json",
            "--output-png",
            "out.png",
            "--latitude",
            "-33.8688",
            "--longitude",
            "-70.6693",
        ])
        .unwrap();
        assert!((cli.latitude + 33.8688).abs() < 1e-12);
        assert!((cli.longitude + 70.6693).abs() < 1e-12);
    }

    #[test]
    fn test_missing_flag_fails() {
        let result = Cli::try_parse_from(["locviz", "--output-png", "out.png"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_numeric_latitude_fails() {
        let mut args = REQUIRED.to_vec();
        args[6] = "north";
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["-c", "/tmp/locviz.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/locviz.toml")));
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&[]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["-v"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["-vv"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["-q", "-v"]).verbosity(), Verbosity::Quiet);
    }
}
