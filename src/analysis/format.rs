//! Canonical result shapes and the defaulting formatters
//!
//! Every `format_*` function is total: any JSON value, including `{}` or a
//! bare string, yields a fully populated result stamped with `generated_at`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SecretFinding;

const DEFAULT_SUMMARY: &str = "Analysis completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

impl Severity {
    /// Lenient: unknown or missing labels become `fallback`.
    fn from_value(value: Option<&Value>, fallback: Severity) -> Severity {
        match value
            .and_then(Value::as_str)
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("critical") => Severity::Critical,
            Some("high") => Severity::High,
            Some("medium") | Some("moderate") => Severity::Medium,
            Some("low") => Severity::Low,
            Some("info") | Some("informational") => Severity::Info,
            _ => fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
            Severity::Info => "info",
        }
    }
}

/// A single flagged issue reported by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub issue: String,
    pub severity: Severity,
    pub line: Option<u64>,
    pub recommendation: String,
}

impl Finding {
    fn from_value(value: &Value) -> Option<Finding> {
        match value {
            Value::String(text) => Some(Finding {
                issue: text.clone(),
                severity: Severity::Medium,
                line: None,
                recommendation: String::new(),
            }),
            Value::Object(_) => Some(Finding {
                issue: first_str(value, &["issue", "description", "title", "message"])
                    .unwrap_or("Unspecified issue")
                    .to_string(),
                severity: Severity::from_value(value.get("severity"), Severity::Medium),
                line: value.get("line").and_then(as_line),
                recommendation: first_str(value, &["recommendation", "fix", "suggestion"])
                    .unwrap_or_default()
                    .to_string(),
            }),
            _ => None,
        }
    }
}

/// Result of `POST /analyze/code`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAnalysisResult {
    pub summary: String,
    pub overall_score: i64,
    pub security: Vec<Finding>,
    pub performance: Vec<Finding>,
    pub bugs: Vec<Finding>,
    pub best_practices: Vec<Finding>,
    pub suggestions: Vec<String>,
    pub generated_at: String,
}

/// Result of `POST /analyze/security`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityResult {
    pub summary: String,
    pub risk_level: Severity,
    pub security_score: i64,
    pub vulnerabilities: Vec<Finding>,
    /// Regex hits, independent of the model
    pub secrets: Vec<SecretFinding>,
    pub recommendations: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
    pub time: String,
    pub space: String,
}

/// Result of `POST /analyze/performance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceResult {
    pub summary: String,
    pub performance_score: i64,
    pub bottlenecks: Vec<Finding>,
    pub optimizations: Vec<Finding>,
    pub complexity: Complexity,
    pub recommendations: Vec<String>,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    pub description: String,
    pub code: Option<String>,
}

impl Fix {
    fn from_value(value: &Value) -> Option<Fix> {
        match value {
            Value::String(text) => Some(Fix {
                description: text.clone(),
                code: None,
            }),
            Value::Object(_) => Some(Fix {
                description: first_str(value, &["description", "fix", "title"])
                    .unwrap_or("Suggested fix")
                    .to_string(),
                code: value.get("code").and_then(Value::as_str).map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// Result of `POST /debug/error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugResult {
    pub explanation: String,
    pub root_cause: String,
    pub severity: Severity,
    pub debugging_steps: Vec<String>,
    pub fixes: Vec<Fix>,
    pub prevention: Vec<String>,
    pub generated_at: String,
}

/// Result of `POST /debug/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorAnalysisResult {
    pub error_type: String,
    pub category: String,
    pub severity: Severity,
    pub likely_causes: Vec<String>,
    pub quick_fixes: Vec<String>,
    pub related_errors: Vec<String>,
    pub generated_at: String,
}

pub fn format_code_analysis(parsed: &Value, now: DateTime<Utc>) -> CodeAnalysisResult {
    CodeAnalysisResult {
        summary: str_or(parsed, "summary", DEFAULT_SUMMARY),
        overall_score: score(parsed, &["overallScore", "score"]),
        security: findings(parsed, "security"),
        performance: findings(parsed, "performance"),
        bugs: findings(parsed, "bugs"),
        best_practices: findings(parsed, "bestPractices"),
        suggestions: strings(parsed, "suggestions"),
        generated_at: timestamp(now),
    }
}

pub fn format_security_analysis(
    parsed: &Value,
    secrets: Vec<SecretFinding>,
    now: DateTime<Utc>,
) -> SecurityResult {
    SecurityResult {
        summary: str_or(parsed, "summary", DEFAULT_SUMMARY),
        risk_level: Severity::from_value(parsed.get("riskLevel"), Severity::Low),
        security_score: score(parsed, &["securityScore", "score"]),
        vulnerabilities: findings(parsed, "vulnerabilities"),
        secrets,
        recommendations: strings(parsed, "recommendations"),
        generated_at: timestamp(now),
    }
}

pub fn format_performance_analysis(parsed: &Value, now: DateTime<Utc>) -> PerformanceResult {
    let complexity = parsed.get("complexity");
    PerformanceResult {
        summary: str_or(parsed, "summary", DEFAULT_SUMMARY),
        performance_score: score(parsed, &["performanceScore", "score"]),
        bottlenecks: findings(parsed, "bottlenecks"),
        optimizations: findings(parsed, "optimizations"),
        complexity: Complexity {
            time: complexity
                .map(|c| str_or(c, "time", "Unknown"))
                .unwrap_or_else(|| "Unknown".to_string()),
            space: complexity
                .map(|c| str_or(c, "space", "Unknown"))
                .unwrap_or_else(|| "Unknown".to_string()),
        },
        recommendations: strings(parsed, "recommendations"),
        generated_at: timestamp(now),
    }
}

pub fn format_debug_result(parsed: &Value, now: DateTime<Utc>) -> DebugResult {
    DebugResult {
        explanation: str_or(parsed, "explanation", "Unable to determine error explanation"),
        root_cause: str_or(parsed, "rootCause", "Unknown"),
        severity: Severity::from_value(parsed.get("severity"), Severity::Medium),
        debugging_steps: strings(parsed, "debuggingSteps"),
        fixes: parsed
            .get("fixes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Fix::from_value).collect())
            .unwrap_or_default(),
        prevention: strings(parsed, "prevention"),
        generated_at: timestamp(now),
    }
}

pub fn format_error_analysis(parsed: &Value, now: DateTime<Utc>) -> ErrorAnalysisResult {
    ErrorAnalysisResult {
        error_type: str_or(parsed, "errorType", "Unknown"),
        category: str_or(parsed, "category", "general"),
        severity: Severity::from_value(parsed.get("severity"), Severity::Medium),
        likely_causes: strings(parsed, "likelyCauses"),
        quick_fixes: strings(parsed, "quickFixes"),
        related_errors: strings(parsed, "relatedErrors"),
        generated_at: timestamp(now),
    }
}

fn timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|k| value.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn str_or(value: &Value, key: &str, default: &str) -> String {
    first_str(value, &[key]).unwrap_or(default).to_string()
}

fn score(value: &Value, keys: &[&str]) -> i64 {
    keys.iter()
        .filter_map(|k| value.get(*k))
        .find_map(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
        .unwrap_or(0)
}

fn as_line(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn findings(value: &Value, key: &str) -> Vec<Finding> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Finding::from_value).collect())
        .unwrap_or_default()
}

/// Arrays of strings; objects contribute their first descriptive field.
fn strings(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.clone()),
                    Value::Object(_) => {
                        first_str(item, &["description", "step", "text", "title"])
                            .map(str::to_string)
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}
