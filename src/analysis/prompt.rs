//! Prompt assembly for each pipeline variant
//!
//! Deterministic string building. The only branching is on analysis flags
//! and on optional debug fields.

use std::fmt::Write;

use super::{AnalysisRequest, DebugRequest, ErrorAnalysisRequest};

/// System + user instruction pair sent to the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const CODE_REVIEWER: &str = "You are an expert code reviewer. Analyze code thoroughly and \
respond ONLY with valid JSON matching the requested structure. Do not include any text \
outside the JSON.";

const SECURITY_AUDITOR: &str = "You are a senior application security engineer. Identify \
vulnerabilities precisely, cite line numbers where possible, and respond ONLY with valid JSON.";

const PERFORMANCE_ENGINEER: &str = "You are a performance engineering expert. Identify \
bottlenecks and optimization opportunities and respond ONLY with valid JSON.";

const DEBUGGER: &str = "You are an expert debugger. Explain errors clearly, find the root \
cause, and propose concrete fixes. Respond ONLY with valid JSON.";

const CODE_ANALYSIS_SCHEMA: &str = r#"{
  "summary": "Brief overall assessment",
  "overallScore": 85,
  "security": [{"issue": "...", "severity": "high", "line": 12, "recommendation": "..."}],
  "performance": [{"issue": "...", "severity": "medium", "line": 30, "recommendation": "..."}],
  "bugs": [{"issue": "...", "severity": "critical", "line": 7, "recommendation": "..."}],
  "bestPractices": [{"issue": "...", "severity": "low", "line": 3, "recommendation": "..."}],
  "suggestions": ["..."]
}"#;

const SECURITY_SCHEMA: &str = r#"{
  "summary": "Brief security assessment",
  "riskLevel": "low|medium|high|critical",
  "securityScore": 70,
  "vulnerabilities": [{"issue": "SQL injection", "severity": "critical", "line": 14, "recommendation": "Use parameterized queries"}],
  "recommendations": ["..."]
}"#;

const PERFORMANCE_SCHEMA: &str = r#"{
  "summary": "Brief performance assessment",
  "performanceScore": 75,
  "bottlenecks": [{"issue": "...", "severity": "high", "line": 20, "recommendation": "..."}],
  "optimizations": [{"issue": "...", "severity": "medium", "line": 42, "recommendation": "..."}],
  "complexity": {"time": "O(n)", "space": "O(1)"},
  "recommendations": ["..."]
}"#;

const DEBUG_SCHEMA: &str = r#"{
  "explanation": "What the error means",
  "rootCause": "Most likely root cause",
  "severity": "low|medium|high|critical",
  "debuggingSteps": ["..."],
  "fixes": [{"description": "...", "code": "..."}],
  "prevention": ["..."]
}"#;

const ERROR_ANALYSIS_SCHEMA: &str = r#"{
  "errorType": "TypeError",
  "category": "runtime|syntax|network|database|configuration|other",
  "severity": "low|medium|high|critical",
  "likelyCauses": ["..."],
  "quickFixes": ["..."],
  "relatedErrors": ["..."]
}"#;

pub fn code_analysis(request: &AnalysisRequest) -> Prompt {
    let flags = &request.flags;
    let categories: Vec<&str> = [
        (flags.include_security, "Security vulnerabilities"),
        (flags.include_performance, "Performance issues"),
        (flags.include_bugs, "Potential bugs and logic errors"),
        (flags.include_best_practices, "Best practices and code quality"),
    ]
    .into_iter()
    .filter_map(|(enabled, label)| enabled.then_some(label))
    .collect();

    let mut user = format!(
        "Analyze the following {} code.\n\n{}\n\nFocus on:\n",
        request.language,
        fenced(&request.language, &request.code)
    );
    for category in &categories {
        let _ = writeln!(user, "- {}", category);
    }
    if categories.is_empty() {
        user.push_str("- General code quality\n");
    }
    let _ = write!(
        user,
        "\nRespond with JSON in exactly this structure:\n{}",
        CODE_ANALYSIS_SCHEMA
    );

    Prompt {
        system: CODE_REVIEWER.to_string(),
        user,
    }
}

pub fn security_analysis(code: &str, language: &str) -> Prompt {
    let user = format!(
        "Perform a security audit of the following {language} code.\n\n{}\n\n\
         Check for injection flaws, authentication and authorization weaknesses, \
         sensitive data exposure, insecure cryptography, and unsafe input handling.\n\n\
         Respond with JSON in exactly this structure:\n{SECURITY_SCHEMA}",
        fenced(language, code)
    );
    Prompt {
        system: SECURITY_AUDITOR.to_string(),
        user,
    }
}

pub fn performance_analysis(code: &str, language: &str) -> Prompt {
    let user = format!(
        "Analyze the performance of the following {language} code.\n\n{}\n\n\
         Consider algorithmic complexity, memory usage, I/O patterns, and unnecessary work.\n\n\
         Respond with JSON in exactly this structure:\n{PERFORMANCE_SCHEMA}",
        fenced(language, code)
    );
    Prompt {
        system: PERFORMANCE_ENGINEER.to_string(),
        user,
    }
}

pub fn debug_error(request: &DebugRequest) -> Prompt {
    let mut user = format!(
        "Help debug this {} error.\n\nError message:\n{}\n",
        request.language, request.error_message
    );
    if let Some(trace) = non_empty(&request.stack_trace) {
        let _ = write!(user, "\nStack trace:\n{}\n", fenced("", trace));
    }
    if let Some(code) = non_empty(&request.code) {
        let _ = write!(
            user,
            "\nRelevant code:\n{}\n",
            fenced(&request.language, code)
        );
    }
    if let Some(context) = non_empty(&request.context) {
        let _ = write!(user, "\nAdditional context:\n{}\n", context);
    }
    let _ = write!(
        user,
        "\nRespond with JSON in exactly this structure:\n{}",
        DEBUG_SCHEMA
    );

    Prompt {
        system: DEBUGGER.to_string(),
        user,
    }
}

pub fn analyze_error(request: &ErrorAnalysisRequest) -> Prompt {
    let mut user = format!(
        "Classify and analyze this {} error.\n\nError message:\n{}\n",
        request.language, request.error_message
    );
    if let Some(trace) = non_empty(&request.stack_trace) {
        let _ = write!(user, "\nStack trace:\n{}\n", fenced("", trace));
    }
    let _ = write!(
        user,
        "\nRespond with JSON in exactly this structure:\n{}",
        ERROR_ANALYSIS_SCHEMA
    );

    Prompt {
        system: DEBUGGER.to_string(),
        user,
    }
}

fn fenced(language: &str, body: &str) -> String {
    format!("```{}\n{}\n```", language, body)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
