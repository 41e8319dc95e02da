//! Code and error analysis pipeline
//!
//! scan → prompt → chat → parse → format → history. Each variant (code,
//! security, performance, error debug, error analysis) is one linear pass.

pub mod format;
pub mod parser;
pub mod prompt;
pub mod secrets;
mod service;

pub use format::{
    CodeAnalysisResult, Complexity, DebugResult, ErrorAnalysisResult, Finding, Fix,
    PerformanceResult, SecurityResult, Severity,
};
pub use parser::{parse_model_output, ParseError};
pub use prompt::Prompt;
pub use secrets::{scan_secrets, SecretFinding};
pub use service::{AnalysisService, Recorded};

use serde::{Deserialize, Serialize};

/// Kind of stored code analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Code,
    Security,
    Performance,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::Code => "code",
            AnalysisKind::Security => "security",
            AnalysisKind::Performance => "performance",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "code" => Some(AnalysisKind::Code),
            "security" => Some(AnalysisKind::Security),
            "performance" => Some(AnalysisKind::Performance),
            _ => None,
        }
    }
}

/// Kind of stored debugging session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugKind {
    /// Full walkthrough: explanation, root cause, steps, fixes
    Debug,
    /// Quick classification of an error message
    Analysis,
}

impl DebugKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebugKind::Debug => "debug",
            DebugKind::Analysis => "analysis",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "debug" => Some(DebugKind::Debug),
            "analysis" => Some(DebugKind::Analysis),
            _ => None,
        }
    }
}

/// Which categories a code analysis should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisFlags {
    #[serde(default = "default_true")]
    pub include_security: bool,
    #[serde(default = "default_true")]
    pub include_performance: bool,
    #[serde(default = "default_true")]
    pub include_bugs: bool,
    #[serde(default = "default_true")]
    pub include_best_practices: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisFlags {
    fn default() -> Self {
        Self {
            include_security: true,
            include_performance: true,
            include_bugs: true,
            include_best_practices: true,
        }
    }
}

/// Body of `POST /analyze/code`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub code: String,
    pub language: String,
    #[serde(flatten)]
    pub flags: AnalysisFlags,
}

/// Body of `POST /analyze/security` and `POST /analyze/performance`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub code: String,
    pub language: String,
}

/// Body of `POST /debug/error`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRequest {
    pub error_message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    pub language: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Body of `POST /debug/analyze`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysisRequest {
    pub error_message: String,
    #[serde(default)]
    pub stack_trace: Option<String>,
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_to_true_when_omitted() {
        let req: AnalysisRequest =
            serde_json::from_str(r#"{"code":"x = 1","language":"python","includeBugs":false}"#)
                .unwrap();
        assert!(req.flags.include_security);
        assert!(req.flags.include_performance);
        assert!(!req.flags.include_bugs);
        assert!(req.flags.include_best_practices);
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [
            AnalysisKind::Code,
            AnalysisKind::Security,
            AnalysisKind::Performance,
        ] {
            assert_eq!(AnalysisKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AnalysisKind::parse("style"), None);
        assert_eq!(DebugKind::parse("analysis"), Some(DebugKind::Analysis));
    }
}
