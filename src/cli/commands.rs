use clap::{Parser, Subcommand, Args};
use std::path::PathBuf;
use crate::models::Recommendation;

#[derive(Parser)]
#[command(name = "fixcheck", version, about = "Validate proposed vulnerability fixes in a disposable sandbox")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply fixes in a sandbox, exercise the app and re-scan
    Validate(ValidateArgs),
    /// Compare CVE identifiers between two scan outputs
    Diff(DiffArgs),
    /// Validate a configuration file
    CheckConfig(CheckConfigArgs),
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Repository to validate (never modified)
    #[arg(short, long)]
    pub repo: PathBuf,

    /// Original vulnerability report
    #[arg(long)]
    pub report: PathBuf,

    /// JSON or YAML file with fix descriptors
    #[arg(short, long)]
    pub fixes: Option<PathBuf>,

    /// Dependency bump as name@version (repeatable)
    #[arg(long = "bump", value_name = "NAME@VERSION")]
    pub bumps: Vec<String>,

    /// Manifest section used by --bump
    #[arg(long, default_value = "dependencies")]
    pub section: String,

    /// Upstream recommendation: approve or reject
    #[arg(long)]
    pub recommendation: Option<Recommendation>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Explicit sandbox directory
    #[arg(long)]
    pub sandbox: Option<PathBuf>,

    /// Keep the sandbox after the run
    #[arg(long)]
    pub keep_sandbox: bool,

    /// Write workflow.log and session.json under this directory
    #[arg(long)]
    pub audit_dir: Option<PathBuf>,

    /// Publish the Markdown report to the configured store
    #[arg(long)]
    pub publish: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct DiffArgs {
    /// Original vulnerability report
    pub original: PathBuf,

    /// Output of the new scan
    pub rescan: PathBuf,

    /// Print the comparison as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct CheckConfigArgs {
    /// Config file to validate
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_args_parse() {
        let cli = Cli::try_parse_from([
            "fixcheck", "-vv", "validate",
            "--repo", "/src/shop",
            "--report", "trivy.txt",
            "--bump", "lodash@4.17.21",
            "--bump", "minimist@1.2.8",
            "--recommendation", "APPROVE",
            "--keep-sandbox",
        ]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Validate(args) => {
                assert_eq!(args.bumps.len(), 2);
                assert_eq!(args.section, "dependencies");
                assert_eq!(args.recommendation, Some(Recommendation::Approve));
                assert!(args.keep_sandbox);
                assert!(!args.publish);
            }
            _ => panic!("expected validate"),
        }
    }

    #[test]
    fn test_bad_recommendation_rejected() {
        let parsed = Cli::try_parse_from([
            "fixcheck", "validate", "--repo", ".", "--report", "r.txt", "--recommendation", "maybe",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_diff_args() {
        let cli = Cli::try_parse_from(["fixcheck", "diff", "before.txt", "after.txt", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Diff(DiffArgs { json: true, .. })));
    }
}
