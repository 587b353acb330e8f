use crate::cli::commands::CheckConfigArgs;
use crate::config;
use crate::errors::FixcheckError;

pub async fn handle_check_config(args: CheckConfigArgs) -> Result<(), FixcheckError> {
    let config = config::parse_config(&args.config).await?;
    println!("Configuration is valid: {}", args.config.display());
    println!(
        "  sandbox root: {}  install timeout: {}s  scanner: {}  publish: {}",
        config.sandbox.root_dir().display(),
        config.limits.install_timeout_secs,
        config.tools.scanner.join(" "),
        config.publish.backend,
    );
    Ok(())
}
