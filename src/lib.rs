pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod store;

#[cfg(test)]
mod testing;

pub use analysis::AnalysisService;
pub use config::Config;
pub use store::HistoryStore;
