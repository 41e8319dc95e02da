//! Credential-like substring detection
//!
//! Runs independently of the model: findings come only from the regex table
//! below, in table order, then match order within a pattern.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use super::Severity;

/// Characters of surrounding context kept on each side of a match
const SNIPPET_CONTEXT: usize = 50;

/// A compiled secret detection pattern.
pub struct SecretPattern {
    pub name: &'static str,
    pub regex: &'static LazyLock<Regex>,
    pub severity: Severity,
    pub recommendation: &'static str,
}

macro_rules! secret_pattern {
    ($name:ident, $regex_str:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($regex_str).expect("secret pattern compiles"));
    };
}

secret_pattern!(
    RE_API_KEY,
    r#"(?i)api[_-]?key\s*[:=]\s*['"][A-Za-z0-9_\-]{16,}['"]"#
);
secret_pattern!(RE_AWS_ACCESS_KEY, r"AKIA[0-9A-Z]{16}");
secret_pattern!(
    RE_PRIVATE_KEY,
    r"-----BEGIN (?:RSA |EC |DSA |OPENSSH )?PRIVATE KEY-----"
);
secret_pattern!(
    RE_PASSWORD,
    r#"(?i)(?:password|passwd|pwd)\s*[:=]\s*['"][^'"]+['"]"#
);
secret_pattern!(RE_BEARER_TOKEN, r"(?i)bearer\s+[A-Za-z0-9\-._~+/]{16,}=*");
secret_pattern!(
    RE_GENERIC_SECRET,
    r#"(?i)(?:secret|token)\s*[:=]\s*['"][^'"]{8,}['"]"#
);

/// Pattern table. Order is part of the output contract.
pub static SECRET_PATTERNS: &[SecretPattern] = &[
    SecretPattern {
        name: "API Key",
        regex: &RE_API_KEY,
        severity: Severity::High,
        recommendation: "Move API keys to environment variables or a secrets manager",
    },
    SecretPattern {
        name: "AWS Access Key",
        regex: &RE_AWS_ACCESS_KEY,
        severity: Severity::Critical,
        recommendation: "Rotate this AWS key immediately and load credentials from the environment or an IAM role",
    },
    SecretPattern {
        name: "Private Key",
        regex: &RE_PRIVATE_KEY,
        severity: Severity::Critical,
        recommendation: "Never commit private keys; store them in a vault and rotate the exposed key",
    },
    SecretPattern {
        name: "Password",
        regex: &RE_PASSWORD,
        severity: Severity::High,
        recommendation: "Do not hardcode passwords; read them from configuration or a secrets manager",
    },
    SecretPattern {
        name: "Bearer Token",
        regex: &RE_BEARER_TOKEN,
        severity: Severity::High,
        recommendation: "Remove hardcoded bearer tokens and obtain them at runtime",
    },
    SecretPattern {
        name: "Generic Secret",
        regex: &RE_GENERIC_SECRET,
        severity: Severity::Medium,
        recommendation: "Store secrets outside of source code",
    },
];

/// One regex hit in submitted code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretFinding {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    /// 1-based
    pub line: usize,
    pub snippet: String,
    pub recommendation: String,
}

/// Scan `code` against every pattern in [`SECRET_PATTERNS`].
pub fn scan_secrets(code: &str) -> Vec<SecretFinding> {
    let mut findings = Vec::new();

    for pattern in SECRET_PATTERNS {
        for m in pattern.regex.find_iter(code) {
            findings.push(SecretFinding {
                kind: pattern.name.to_string(),
                severity: pattern.severity,
                line: line_of(code, m.start()),
                snippet: snippet_around(code, m.start(), m.end()),
                recommendation: pattern.recommendation.to_string(),
            });
        }
    }

    findings
}

fn line_of(code: &str, offset: usize) -> usize {
    code[..offset].bytes().filter(|b| *b == b'\n').count() + 1
}

/// Up to [`SNIPPET_CONTEXT`] characters either side of `start..end`.
fn snippet_around(code: &str, start: usize, end: usize) -> String {
    let from = code[..start]
        .char_indices()
        .rev()
        .nth(SNIPPET_CONTEXT - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    let to = code[end..]
        .char_indices()
        .nth(SNIPPET_CONTEXT)
        .map(|(i, _)| end + i)
        .unwrap_or(code.len());
    code[from..to].to_string()
}
