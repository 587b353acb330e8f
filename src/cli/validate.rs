use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use crate::cli::commands::ValidateArgs;
use crate::cli::progress::{print_verdict, ValidationProgress};
use crate::config;
use crate::errors::FixcheckError;
use crate::exec::SystemRunner;
use crate::fix::{load_fixes, parse_bump, FixDescriptor};
use crate::pipeline::{ValidationOrchestrator, ValidationRequest};
use crate::reporting::{build_store, publish_report};

pub async fn handle_validate(args: ValidateArgs, quiet: bool) -> Result<(), FixcheckError> {
    let config = Arc::new(config::load_or_default(args.config.as_deref()).await?);

    if !args.repo.is_dir() {
        return Err(FixcheckError::InvalidInput(format!(
            "Repository is not a directory: {}",
            args.repo.display()
        )));
    }
    let report = tokio::fs::read_to_string(&args.report).await.map_err(|e| {
        FixcheckError::InvalidInput(format!("Cannot read report {}: {}", args.report.display(), e))
    })?;

    let request = ValidationRequest::new(&args.repo, report)
        .with_fixes(collect_fixes(&args).await?)
        .with_recommendation(args.recommendation)
        .with_sandbox_path(args.sandbox.clone());
    let repo_name = request.repo_name();

    info!(repo = %args.repo.display(), fixes = request.fixes.len(), "Validating fixes");

    let mut orchestrator = ValidationOrchestrator::new(config.clone(), Arc::new(SystemRunner))
        .with_keep_sandbox(args.keep_sandbox);
    if let Some(dir) = &args.audit_dir {
        orchestrator = orchestrator.with_audit_dir(dir);
    }

    let show_progress = !quiet && !args.json;
    let result = if show_progress {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let display = tokio::spawn(async move {
            let mut progress = ValidationProgress::new();
            while let Some(event) = rx.recv().await {
                progress.handle_event(&event);
            }
            progress.finish();
        });
        let result = orchestrator.with_event_channel(tx).run(request).await;
        let _ = display.await;
        result
    } else {
        orchestrator.run(request).await
    };

    if args.publish {
        let evidence = match &result.error {
            Some(error) => format!("Validation error: {}", error),
            None => result.test_results.clone(),
        };
        let store = build_store(&config.publish)?;
        let location = publish_report(store.as_ref(), &config.publish, &repo_name, &evidence).await;
        if !args.json {
            println!("Report: {}", location);
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if !quiet {
        print_verdict(&result);
    }

    if result.is_completed() {
        Ok(())
    } else {
        Err(FixcheckError::Sandbox(
            result.error.unwrap_or_else(|| "validation run failed".to_string()),
        ))
    }
}

async fn collect_fixes(args: &ValidateArgs) -> Result<Vec<FixDescriptor>, FixcheckError> {
    let mut fixes = match &args.fixes {
        Some(path) => load_fixes(path).await?,
        None => Vec::new(),
    };
    for bump in &args.bumps {
        fixes.push(parse_bump(bump, &args.section)?);
    }
    Ok(fixes)
}
