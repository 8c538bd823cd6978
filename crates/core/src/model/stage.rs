use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StageError {
    #[error("unknown stage: {0}")]
    Unknown(String),
}

/// One of the five fixed topical groupings of the question bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageId {
    Basics,
    Management,
    Technology,
    Legal,
    ExamStrategy,
}

impl StageId {
    /// Every stage, in curriculum order.
    pub const ALL: [StageId; 5] = [
        StageId::Basics,
        StageId::Management,
        StageId::Technology,
        StageId::Legal,
        StageId::ExamStrategy,
    ];

    /// Number of stages in the curriculum.
    pub const COUNT: usize = Self::ALL.len();

    /// Stage that review-mode sessions are recorded under.
    pub const CANONICAL_REVIEW: StageId = StageId::Basics;

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Basics => "basics",
            StageId::Management => "management",
            StageId::Technology => "technology",
            StageId::Legal => "legal",
            StageId::ExamStrategy => "exam-strategy",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            StageId::Basics => "Security Fundamentals",
            StageId::Management => "Security Management",
            StageId::Technology => "Security Technology",
            StageId::Legal => "Law & Compliance",
            StageId::ExamStrategy => "Exam Strategy",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            StageId::Basics => "CIA triad, threats, vulnerabilities and risk basics",
            StageId::Management => "ISMS, risk management and security policy",
            StageId::Technology => "Cryptography, authentication, firewalls and malware defence",
            StageId::Legal => "Privacy law, unauthorized access law and intellectual property",
            StageId::ExamStrategy => "Cross-cutting knowledge and exam-style practice",
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| StageError::Unknown(s.to_string()))
    }
}

/// What a quiz session draws from: one stage, or the cross-stage review pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Stage(StageId),
    Review,
}

impl Mode {
    /// Stage a session in this mode is recorded under.
    #[must_use]
    pub fn resolved_stage(self) -> StageId {
        match self {
            Mode::Stage(stage) => stage,
            Mode::Review => StageId::CANONICAL_REVIEW,
        }
    }

    #[must_use]
    pub fn is_review(self) -> bool {
        matches!(self, Mode::Review)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Stage(stage) => write!(f, "{stage}"),
            Mode::Review => f.write_str("review"),
        }
    }
}

impl FromStr for Mode {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "review" {
            return Ok(Mode::Review);
        }
        s.parse().map(Mode::Stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_round_trips_through_str() {
        for stage in StageId::ALL {
            assert_eq!(stage.as_str().parse::<StageId>().unwrap(), stage);
        }
    }

    #[test]
    fn stage_serializes_kebab_case() {
        let json = serde_json::to_string(&StageId::ExamStrategy).unwrap();
        assert_eq!(json, "\"exam-strategy\"");
    }

    #[test]
    fn mode_parses_review_and_stages() {
        assert_eq!("review".parse::<Mode>().unwrap(), Mode::Review);
        assert_eq!(
            "legal".parse::<Mode>().unwrap(),
            Mode::Stage(StageId::Legal)
        );
        assert!(matches!(
            "nope".parse::<Mode>(),
            Err(StageError::Unknown(_))
        ));
    }

    #[test]
    fn review_mode_resolves_to_canonical_stage() {
        assert_eq!(Mode::Review.resolved_stage(), StageId::Basics);
        assert_eq!(
            Mode::Stage(StageId::Technology).resolved_stage(),
            StageId::Technology
        );
    }
}
