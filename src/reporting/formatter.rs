use chrono::{DateTime, Utc};

/// Capitalize the first letter of every alphabetic run and lowercase the rest,
/// so `code_interpreter` becomes `Code_Interpreter`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

fn build_label() -> String {
    format!(
        "fixcheck {} ({})",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    )
}

/// Markdown document published for one run.
pub fn format_report(agent_type: &str, repo_name: &str, evidence: &str, at: DateTime<Utc>) -> String {
    let agent = title_case(agent_type);
    format!(
        "# {agent} Agent Results\n\
         **Date:** {date} UTC\n\
         **Repository**: {repo_name}\n\
         **Agent:** {agent} Agent\n\
         ## Results\n\
         {evidence}\n\
         \n\
         --- End of Report ---\n\
         *Generated by {label}*\n",
        date = at.format("%Y-%m-%dT%H:%M:%S%.6f"),
        label = build_label(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("code_interpreter"), "Code_Interpreter");
        assert_eq!(title_case("SCANNER"), "Scanner");
        assert_eq!(title_case("risk-assessor v2"), "Risk-Assessor V2");
    }

    #[test]
    fn test_report_layout() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let doc = format_report("code_interpreter", "shop", "[Sandbox Provisioning] ok", at);
        let lines: Vec<&str> = doc.lines().collect();
        assert_eq!(lines[0], "# Code_Interpreter Agent Results");
        assert_eq!(lines[1], "**Date:** 2026-03-04T05:06:07.000000 UTC");
        assert_eq!(lines[2], "**Repository**: shop");
        assert_eq!(lines[3], "**Agent:** Code_Interpreter Agent");
        assert_eq!(lines[4], "## Results");
        assert_eq!(lines[5], "[Sandbox Provisioning] ok");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "--- End of Report ---");
        assert!(lines[8].starts_with("*Generated by fixcheck "));
    }
}
