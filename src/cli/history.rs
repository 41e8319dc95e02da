//! History command implementation

use anyhow::Result;

use crate::analysis::AnalysisKind;
use crate::store::{HistoryStore, ListQuery};

pub fn list(
    store: &HistoryStore,
    user: &str,
    kind: Option<AnalysisKind>,
    language: Option<String>,
    limit: Option<i64>,
    offset: u32,
) -> Result<()> {
    let query = ListQuery {
        limit,
        offset,
        kind,
        language,
    };
    let analyses = store.list_analyses(user, &query)?;

    if analyses.is_empty() {
        println!("No analyses found for user {}.", user);
        return Ok(());
    }

    println!(
        "{:<12} {:<10} {:<12} {:<12} {:<8} {}",
        "Created", "ID", "Type", "Language", "Length", "Summary"
    );
    println!("{}", "-".repeat(100));

    for analysis in analyses {
        // Format timestamp
        let created = if analysis.created_at.len() >= 16 {
            format!(
                "{} {}",
                &analysis.created_at[5..10],
                &analysis.created_at[11..16]
            )
        } else {
            analysis.created_at.clone()
        };

        let summary = analysis
            .result
            .get("summary")
            .and_then(|s| s.as_str())
            .map(|s| {
                let s = s.lines().next().unwrap_or(s);
                if s.chars().count() > 40 {
                    format!("{}...", s.chars().take(37).collect::<String>())
                } else {
                    s.to_string()
                }
            })
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<12} {:<10} {:<12} {:<12} {:<8} {}",
            created,
            &analysis.id[..8],
            analysis.kind.as_str(),
            analysis.language,
            analysis.code_length,
            summary,
        );
    }

    Ok(())
}

pub fn show(store: &HistoryStore, user: &str, id: &str) -> Result<()> {
    if let Some(analysis) = store.get_analysis(id, user)? {
        println!("\n{}", "=".repeat(80));
        println!("Analysis: {} ({})", analysis.id, analysis.kind.as_str());
        println!(
            "Language: {} | Length: {} | Created: {}",
            analysis.language, analysis.code_length, analysis.created_at
        );
        println!("{}", "=".repeat(80));
        println!("{}", serde_json::to_string_pretty(&analysis.result)?);
        return Ok(());
    }

    if let Some(session) = store.get_debug_session(id, user)? {
        println!("\n{}", "=".repeat(80));
        println!(
            "Debugging session: {} ({})",
            session.id,
            session.session_type.as_str()
        );
        println!(
            "Language: {} | Created: {}",
            session.language, session.created_at
        );
        println!("Error: {}", session.error_message);
        println!("{}", "=".repeat(80));
        println!("{}", serde_json::to_string_pretty(&session.result)?);
        return Ok(());
    }

    println!("Record '{}' not found.", id);
    Ok(())
}

pub fn stats(store: &HistoryStore, user: &str) -> Result<()> {
    let stats = store.stats(user)?;
    println!("Code analyses:        {}", stats.code);
    println!("Security analyses:    {}", stats.security);
    println!("Performance analyses: {}", stats.performance);
    println!("Debugging sessions:   {}", stats.debug_sessions);
    println!("{}", "-".repeat(30));
    println!("Total analyses:       {}", stats.total_analyses());
    Ok(())
}
