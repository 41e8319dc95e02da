//! Scan command implementation

use anyhow::{Context, Result};
use std::path::Path;

use crate::analysis::scan_secrets;

pub fn run(path: &Path) -> Result<()> {
    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let findings = scan_secrets(&code);

    if findings.is_empty() {
        println!("No secrets found in {}.", path.display());
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:<16} {}",
        "Line", "Severity", "Type", "Snippet"
    );
    println!("{}", "-".repeat(100));

    for finding in &findings {
        // Single line, truncated
        let snippet: String = finding
            .snippet
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        let snippet = if snippet.chars().count() > 60 {
            format!("{}...", snippet.chars().take(57).collect::<String>())
        } else {
            snippet
        };

        println!(
            "{:<6} {:<10} {:<16} {}",
            finding.line,
            finding.severity.as_str(),
            finding.kind,
            snippet
        );
    }

    println!("\n{} finding(s) in {}", findings.len(), path.display());
    Ok(())
}
