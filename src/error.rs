//! Error types with fix suggestions (v0.1)
//!
//! Error code ranges:
//! - CAD-000-009: Task errors
//! - CAD-010-019: Harness input errors
//! - CAD-020-029: Scenario/config errors
//! - CAD-030-039: IO/serialization errors

use thiserror::Error;

use crate::scheduler::TaskFailure;

pub type Result<T> = std::result::Result<T, CadenceError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
#[derive(Error, Debug)]
pub enum CadenceError {
    // ═══════════════════════════════════════════
    // TASK ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[CAD-001] {0}")]
    Task(#[from] TaskFailure),

    // ═══════════════════════════════════════════
    // HARNESS INPUT ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[CAD-010] Unknown tab '{value}'")]
    UnknownTab { value: String },

    #[error("[CAD-011] Unknown strategy '{value}'")]
    UnknownStrategy { value: String },

    // ═══════════════════════════════════════════
    // SCENARIO / CONFIG ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[CAD-020] Invalid scenario: {reason}")]
    InvalidScenario { reason: String },

    #[error("[CAD-021] Config error: {reason}")]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[CAD-030] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("[CAD-031] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("[CAD-032] IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FixSuggestion for CadenceError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            CadenceError::Task(_) => Some("Inspect the trace: the failing task's label is in the message"),
            CadenceError::UnknownTab { .. } => Some("Use one of: one, two, three"),
            CadenceError::UnknownStrategy { .. } => {
                Some("Use one of: untransitioned, transitioned, pending, timeout")
            }
            CadenceError::InvalidScenario { .. } => {
                Some("Each step needs exactly one of: click, wait_ms, type, clear, announce, focus, post, fail, settle")
            }
            CadenceError::ConfigError { .. } => {
                Some("Check CADENCE_* environment variables and --max-entries hold positive integers")
            }
            CadenceError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            CadenceError::Json(_) => None,
            CadenceError::Io(_) => Some("Check file path and permissions"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_codes() {
        let err = CadenceError::UnknownTab {
            value: "four".to_string(),
        };
        assert_eq!(err.to_string(), "[CAD-010] Unknown tab 'four'");
        assert!(err.fix_suggestion().unwrap().contains("three"));
    }

    #[test]
    fn task_failure_converts_into_cadence_error() {
        let failure = TaskFailure::new("switch to two", "render crashed");
        let err: CadenceError = failure.into();
        assert!(err.to_string().starts_with("[CAD-001]"));
        assert!(err.to_string().contains("render crashed"));
    }
}
