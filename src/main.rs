use clap::Parser;
use fixcheck::cli::{self, Cli, Commands};
use fixcheck::errors::FixcheckError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let result = match cli.command {
        Commands::Validate(args) => cli::validate::handle_validate(args, cli.quiet).await,
        Commands::Diff(args) => cli::diff::handle_diff(args).await,
        Commands::CheckConfig(args) => cli::check_config::handle_check_config(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            FixcheckError::Config(_) | FixcheckError::Yaml(_) => 2,
            FixcheckError::Sandbox(_) => 3,
            FixcheckError::InvalidInput(_) => 4,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}
