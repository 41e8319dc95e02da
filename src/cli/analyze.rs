//! Analyze command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::analysis::{
    AnalysisFlags, AnalysisKind, AnalysisRequest, AnalysisService, CodeSubmission,
};
use crate::config::Config;
use crate::llm;
use crate::store::HistoryStore;

pub async fn run(
    config: &Config,
    store: Arc<HistoryStore>,
    path: &Path,
    language: String,
    kind: AnalysisKind,
    user: Uuid,
) -> Result<()> {
    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let service = AnalysisService::new(llm::client_from_config(config)?, store, config);
    let user = user.to_string();

    println!("Analyzing {} ({}, {})...\n", path.display(), language, kind.as_str());

    match kind {
        AnalysisKind::Code => {
            let request = AnalysisRequest {
                code,
                language,
                flags: AnalysisFlags::default(),
            };
            print_json(&service.analyze_code(&user, &request).await?)
        }
        AnalysisKind::Security => {
            let submission = CodeSubmission { code, language };
            print_json(&service.analyze_security(&user, &submission).await?)
        }
        AnalysisKind::Performance => {
            let submission = CodeSubmission { code, language };
            print_json(&service.analyze_performance(&user, &submission).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
