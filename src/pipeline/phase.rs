use super::state::Stage;

pub struct StageDefinition {
    pub stage: Stage,
    pub display_name: &'static str,
    pub description: &'static str,
}

/// Stages in execution order.
pub static STAGES: &[StageDefinition] = &[
    StageDefinition {
        stage: Stage::Provision,
        display_name: "Sandbox Provisioning",
        description: "Copy the repository into a disposable sandbox",
    },
    StageDefinition {
        stage: Stage::Apply,
        display_name: "Fix Application",
        description: "Apply file replacements and manifest bumps inside the sandbox",
    },
    StageDefinition {
        stage: Stage::Install,
        display_name: "Dependency Installation",
        description: "Resolve dependencies against the patched manifest",
    },
    StageDefinition {
        stage: Stage::Probe,
        display_name: "Application Probe",
        description: "Structure, syntax, startup and endpoint checks",
    },
    StageDefinition {
        stage: Stage::Rescan,
        display_name: "Vulnerability Re-Scan",
        description: "Re-run the scanner and compare identifiers with the original report",
    },
];

pub fn definition(stage: Stage) -> &'static StageDefinition {
    match stage {
        Stage::Provision => &STAGES[0],
        Stage::Apply => &STAGES[1],
        Stage::Install => &STAGES[2],
        Stage::Probe => &STAGES[3],
        Stage::Rescan => &STAGES[4],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_definitions_line_up() {
        for def in STAGES {
            assert_eq!(definition(def.stage).stage, def.stage);
        }
    }
}
