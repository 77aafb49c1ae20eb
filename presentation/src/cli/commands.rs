//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for meeting reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Meeting header, quorum, and every motion with its result trace
    Full,
    /// One line per motion
    Summary,
    /// JSON output
    Json,
}

impl From<OutputFormat> for gavel_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => gavel_domain::OutputFormat::Full,
            OutputFormat::Summary => gavel_domain::OutputFormat::Summary,
            OutputFormat::Json => gavel_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for gavel
#[derive(Parser, Debug)]
#[command(name = "gavel")]
#[command(author, version, about = "Deliberative assembly engine - quorum, proxies and official results")]
#[command(long_about = r#"
Gavel replays a meeting scenario through the governance engine and prints
the resulting meeting report.

The scenario is a TOML file describing the member roll, quorum and vote
policies, attendance, proxies, and every motion with its ballots or manual
tally. Each motion is opened, voted and closed in order; closing a motion
freezes its official result.

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./gavel.toml        Project-level config
3. ~/.config/gavel/config.toml   Global config
GAVEL_* environment variables override every file.

Example:
  gavel agm.toml
  gavel agm.toml --validate --output full
  gavel agm.toml -o json -vv
"#)]
pub struct Cli {
    /// Scenario file to replay
    #[arg(value_name = "SCENARIO", required_unless_present = "show_config")]
    pub scenario: Option<PathBuf>,

    /// Validate the meeting once every motion is closed
    #[arg(long)]
    pub validate: bool,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors and the report
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

impl Cli {
    /// Default log directive for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_full_invocation() {
        let cli = Cli::parse_from([
            "gavel",
            "agm.toml",
            "--validate",
            "-o",
            "full",
            "-vv",
            "--config",
            "custom.toml",
        ]);
        assert_eq!(cli.scenario, Some(PathBuf::from("agm.toml")));
        assert!(cli.validate);
        assert_eq!(cli.output, Some(OutputFormat::Full));
        assert_eq!(cli.log_level(), "debug");
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn test_scenario_required_unless_showing_config() {
        assert!(Cli::try_parse_from(["gavel"]).is_err());
        let cli = Cli::try_parse_from(["gavel", "--show-config"]).unwrap();
        assert!(cli.scenario.is_none());
    }

    #[test]
    fn test_quiet_wins_over_verbose() {
        let cli = Cli::parse_from(["gavel", "agm.toml", "-q", "-vvv"]);
        assert_eq!(cli.log_level(), "error");
    }

    #[test]
    fn test_output_format_maps_to_domain() {
        assert_eq!(
            gavel_domain::OutputFormat::from(OutputFormat::Summary),
            gavel_domain::OutputFormat::Summary
        );
    }
}
