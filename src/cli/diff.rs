use std::path::Path;
use crate::cli::commands::DiffArgs;
use crate::errors::FixcheckError;
use crate::rescan::IdentifierDiff;

async fn read_input(path: &Path) -> Result<String, FixcheckError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        FixcheckError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })
}

/// Offline comparison of two scan outputs; no process is spawned.
pub async fn handle_diff(args: DiffArgs) -> Result<(), FixcheckError> {
    let original = read_input(&args.original).await?;
    let rescan = read_input(&args.rescan).await?;
    let diff = IdentifierDiff::from_texts(&original, &rescan);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diff)?);
    } else {
        println!("{}", diff.summary());
        if !diff.introduced.is_empty() {
            println!(
                "Introduced: {}",
                crate::utils::format_list(&diff.introduced)
            );
        }
    }
    Ok(())
}
