use indicatif::{ProgressBar, ProgressStyle};
use console::style;
use crate::models::{StageOutcome, ValidationResult, Verdict};
use crate::pipeline::{Stage, ValidationEvent};
use crate::pipeline::phase::{definition, STAGES};
use crate::utils::format_duration;

/// Single progress bar that advances once per stage.
pub struct ValidationProgress {
    bar: ProgressBar,
}

impl ValidationProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(STAGES.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  {spinner:.cyan} {bar:30.cyan/dark_gray} {pos}/{len} stages | {msg}")
                .unwrap()
                .progress_chars("█▓░")
        );
        bar.set_message("Preparing sandbox...");
        bar.enable_steady_tick(std::time::Duration::from_millis(120));
        Self { bar }
    }

    pub fn handle_event(&mut self, event: &ValidationEvent) {
        match event {
            ValidationEvent::RunStarted { sandbox_path, .. } => {
                self.bar.println(format!("  {} {}", style("sandbox").dim(), sandbox_path));
            }
            ValidationEvent::StageStarted { stage, display_name } => {
                self.bar.set_message(stage_message(*stage, display_name));
            }
            ValidationEvent::StageCompleted { stage, outcome, duration_ms } => {
                let mark = match outcome {
                    StageOutcome::Succeeded => style("✓").green(),
                    StageOutcome::Skipped => style("-").dim(),
                    StageOutcome::TimedOut => style("⏱").yellow(),
                    StageOutcome::Failed => style("✗").red(),
                };
                self.bar.println(format!(
                    "  {} {} {}",
                    mark,
                    stage.display_name(),
                    style(format!("({}, {})", outcome, format_duration(*duration_ms))).dim()
                ));
                self.bar.inc(1);
            }
            ValidationEvent::RunCompleted { .. } => {
                self.bar.finish_and_clear();
            }
        }
    }

    pub fn finish(self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

fn stage_message(stage: Stage, display_name: &str) -> String {
    format!("{} {}", display_name, style(format!("({})", definition(stage).description)).dim())
}

impl Default for ValidationProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub fn print_verdict(result: &ValidationResult) {
    let label = match result.verdict {
        Verdict::Approve => style(result.verdict.as_str()).green().bold(),
        Verdict::NeedsReview => style(result.verdict.as_str()).yellow().bold(),
        Verdict::Error => style(result.verdict.as_str()).red().bold(),
    };
    println!();
    println!("  Verdict: {}", label);
    if let Some(error) = &result.error {
        println!("  {}", style(error).red());
    }
    println!(
        "  CVEs fixed: {}  remaining: {}",
        style(result.cves_fixed.len()).green(),
        style(result.cves_remaining.len()).yellow()
    );
    if result.sandbox_retained {
        println!("  Sandbox kept at {}", result.sandbox_path.display());
    }
    println!(
        "  {}",
        style(format!(
            "Duration: {}",
            format_duration((result.finished_at - result.started_at).num_milliseconds().max(0) as u64)
        )).dim()
    );
    println!();
    for line in result.test_results.lines() {
        println!("  {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_message_includes_description() {
        console::set_colors_enabled(false);
        assert_eq!(
            stage_message(Stage::Install, "Dependency Installation"),
            "Dependency Installation (Resolve dependencies against the patched manifest)"
        );
    }
}
