use serde::{Deserialize, Serialize};

const APPROVE_TOKEN: &str = "APPROVE";

/// Terminal classification of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Upstream recommended the fix and the run completed.
    Approve,
    /// Anything short of an explicit upstream approval.
    NeedsReview,
    /// The run could not be set up at all.
    Error,
}

impl Verdict {
    /// Derive the verdict of a completed run from the upstream recommendation.
    pub fn from_recommendation(recommendation: Option<Recommendation>) -> Self {
        match recommendation {
            Some(Recommendation::Approve) => Verdict::Approve,
            Some(Recommendation::Reject) | None => Verdict::NeedsReview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::NeedsReview => "NEEDS_REVIEW",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Go/no-go recommendation produced by the upstream reasoning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Reject,
}

impl Recommendation {
    /// Recover a recommendation from free upstream text: approval whenever the literal,
    /// case-sensitive `APPROVE` appears anywhere, including inside longer words.
    ///
    /// This is a compatibility path for collaborators that cannot send a typed field;
    /// any prose that happens to contain the token will be read as approval.
    pub fn from_upstream_text(text: &str) -> Option<Self> {
        text.contains(APPROVE_TOKEN).then_some(Recommendation::Approve)
    }
}

impl std::str::FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Recommendation::Approve),
            "reject" => Ok(Recommendation::Reject),
            other => Err(format!("unknown recommendation '{}', expected approve or reject", other)),
        }
    }
}
