//! Analysis history storage with SQLite
//!
//! One connection behind a mutex; the lock is taken per statement and never
//! held across an await point.

mod schema;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::analysis::{AnalysisKind, DebugKind};

pub use schema::SCHEMA;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

pub struct HistoryStore {
    conn: Mutex<Connection>,
}

impl HistoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("history store lock poisoned"))
    }

    // ============================================
    // CODE ANALYSES
    // ============================================

    /// Best-effort write: a failed insert is logged and yields `None`.
    pub fn save_analysis(&self, user_id: &str, data: &NewAnalysis) -> Option<String> {
        match self.insert_analysis(user_id, data) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    kind = data.kind.as_str(),
                    "failed to save analysis history: {:#}",
                    e
                );
                None
            }
        }
    }

    pub fn insert_analysis(&self, user_id: &str, data: &NewAnalysis) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO analysis_history
             (id, user_id, analysis_type, language, code_length, result, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                user_id,
                data.kind.as_str(),
                data.language,
                data.code_length as i64,
                data.result.to_string(),
                now(),
            ],
        )?;
        Ok(id)
    }

    /// Newest first.
    pub fn list_analyses(&self, user_id: &str, query: &ListQuery) -> Result<Vec<AnalysisRecord>> {
        let mut sql = String::from(
            "SELECT id, user_id, analysis_type, language, code_length, result, created_at
             FROM analysis_history
             WHERE user_id = ?",
        );
        let mut args: Vec<SqlValue> = vec![user_id.to_string().into()];

        if let Some(kind) = query.kind {
            sql.push_str(" AND analysis_type = ?");
            args.push(kind.as_str().to_string().into());
        }
        if let Some(language) = &query.language {
            sql.push_str(" AND language = ?");
            args.push(language.clone().into());
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?");
        args.push(query.limit().into());
        args.push(i64::from(query.offset).into());

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), RawAnalysis::from_row)?;

        rows.map(|row| row?.into_record())
            .collect::<Result<Vec<_>>>()
    }

    /// Returns `None` both for unknown ids and for rows owned by someone else.
    pub fn get_analysis(&self, id: &str, user_id: &str) -> Result<Option<AnalysisRecord>> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT id, user_id, analysis_type, language, code_length, result, created_at
             FROM analysis_history
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            RawAnalysis::from_row,
        );

        match row {
            Ok(raw) => raw.into_record().map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============================================
    // DEBUGGING SESSIONS
    // ============================================

    /// Best-effort write, see [`HistoryStore::save_analysis`].
    pub fn save_debug_session(&self, user_id: &str, data: &NewDebugSession) -> Option<String> {
        match self.insert_debug_session(user_id, data) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(
                    user_id,
                    kind = data.kind.as_str(),
                    "failed to save debugging session: {:#}",
                    e
                );
                None
            }
        }
    }

    pub fn insert_debug_session(&self, user_id: &str, data: &NewDebugSession) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.conn()?.execute(
            "INSERT INTO debugging_sessions
             (id, user_id, session_type, error_message, stack_trace, language, result, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                id,
                user_id,
                data.kind.as_str(),
                data.error_message,
                data.stack_trace,
                data.language,
                data.result.to_string(),
                now(),
            ],
        )?;
        Ok(id)
    }

    pub fn list_debug_sessions(
        &self,
        user_id: &str,
        query: &DebugListQuery,
    ) -> Result<Vec<DebugSessionRecord>> {
        let mut sql = String::from(
            "SELECT id, user_id, session_type, error_message, stack_trace, language, result, created_at
             FROM debugging_sessions
             WHERE user_id = ?",
        );
        let mut args: Vec<SqlValue> = vec![user_id.to_string().into()];

        if let Some(kind) = query.kind {
            sql.push_str(" AND session_type = ?");
            args.push(kind.as_str().to_string().into());
        }
        if let Some(language) = &query.language {
            sql.push_str(" AND language = ?");
            args.push(language.clone().into());
        }
        sql.push_str(" ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?");
        args.push(query.limit().into());
        args.push(i64::from(query.offset).into());

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), RawDebugSession::from_row)?;

        rows.map(|row| row?.into_record())
            .collect::<Result<Vec<_>>>()
    }

    pub fn get_debug_session(&self, id: &str, user_id: &str) -> Result<Option<DebugSessionRecord>> {
        let conn = self.conn()?;
        let row = conn.query_row(
            "SELECT id, user_id, session_type, error_message, stack_trace, language, result, created_at
             FROM debugging_sessions
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            RawDebugSession::from_row,
        );

        match row {
            Ok(raw) => raw.into_record().map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ============================================
    // STATS
    // ============================================

    pub fn stats(&self, user_id: &str) -> Result<HistoryStats> {
        let conn = self.conn()?;
        let mut stats = HistoryStats::default();

        let mut stmt = conn.prepare(
            "SELECT analysis_type, COUNT(*) FROM analysis_history
             WHERE user_id = ? GROUP BY analysis_type",
        )?;
        let counts = stmt.query_map(params![user_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for entry in counts {
            let (kind, count) = entry?;
            match AnalysisKind::parse(&kind) {
                Some(AnalysisKind::Code) => stats.code = count,
                Some(AnalysisKind::Security) => stats.security = count,
                Some(AnalysisKind::Performance) => stats.performance = count,
                None => {}
            }
        }

        stats.debug_sessions = conn.query_row(
            "SELECT COUNT(*) FROM debugging_sessions WHERE user_id = ?",
            params![user_id],
            |row| row.get(0),
        )?;

        Ok(stats)
    }
}

#[cfg(test)]
impl HistoryStore {
    /// Drop the tables so every later write fails.
    pub(crate) fn break_for_tests(&self) {
        self.conn()
            .unwrap()
            .execute_batch("DROP TABLE analysis_history; DROP TABLE debugging_sessions;")
            .unwrap();
    }
}

/// Microsecond precision keeps `ORDER BY created_at` stable for bursts.
fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================
// INPUT TYPES
// ============================================

#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub kind: AnalysisKind,
    pub language: String,
    pub code_length: usize,
    pub result: Value,
}

#[derive(Debug, Clone)]
pub struct NewDebugSession {
    pub kind: DebugKind,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub language: String,
    pub result: Value,
}

/// Out-of-range limits are clamped to `1..=MAX_PAGE_SIZE`, never rejected.
fn page_size(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Paging and filters for analysis listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default, rename = "type")]
    pub kind: Option<AnalysisKind>,
    #[serde(default)]
    pub language: Option<String>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        page_size(self.limit)
    }
}

/// Paging and filters for debugging-session listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DebugListQuery {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default, rename = "type")]
    pub kind: Option<DebugKind>,
    #[serde(default)]
    pub language: Option<String>,
}

impl DebugListQuery {
    pub fn limit(&self) -> i64 {
        page_size(self.limit)
    }
}

// ============================================
// ROW TYPES
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: AnalysisKind,
    pub language: String,
    pub code_length: i64,
    pub result: Value,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSessionRecord {
    pub id: String,
    pub user_id: String,
    pub session_type: DebugKind,
    pub error_message: String,
    pub stack_trace: Option<String>,
    pub language: String,
    pub result: Value,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub code: i64,
    pub security: i64,
    pub performance: i64,
    pub debug_sessions: i64,
}

impl HistoryStats {
    pub fn total_analyses(&self) -> i64 {
        self.code + self.security + self.performance
    }
}

/// Column values before enum and JSON decoding
struct RawAnalysis {
    id: String,
    user_id: String,
    kind: String,
    language: String,
    code_length: i64,
    result: String,
    created_at: String,
}

impl RawAnalysis {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            language: row.get(3)?,
            code_length: row.get(4)?,
            result: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<AnalysisRecord> {
        let kind = AnalysisKind::parse(&self.kind)
            .ok_or_else(|| anyhow!("unknown analysis type '{}' in row {}", self.kind, self.id))?;
        let result = serde_json::from_str(&self.result)
            .with_context(|| format!("corrupt result JSON in analysis {}", self.id))?;
        Ok(AnalysisRecord {
            id: self.id,
            user_id: self.user_id,
            kind,
            language: self.language,
            code_length: self.code_length,
            result,
            created_at: self.created_at,
        })
    }
}

struct RawDebugSession {
    id: String,
    user_id: String,
    kind: String,
    error_message: String,
    stack_trace: Option<String>,
    language: String,
    result: String,
    created_at: String,
}

impl RawDebugSession {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            kind: row.get(2)?,
            error_message: row.get(3)?,
            stack_trace: row.get(4)?,
            language: row.get(5)?,
            result: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn into_record(self) -> Result<DebugSessionRecord> {
        let session_type = DebugKind::parse(&self.kind)
            .ok_or_else(|| anyhow!("unknown session type '{}' in row {}", self.kind, self.id))?;
        let result = serde_json::from_str(&self.result)
            .with_context(|| format!("corrupt result JSON in debugging session {}", self.id))?;
        Ok(DebugSessionRecord {
            id: self.id,
            user_id: self.user_id,
            session_type,
            error_message: self.error_message,
            stack_trace: self.stack_trace,
            language: self.language,
            result,
            created_at: self.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ALICE: &str = "6f1c2a3e-0000-4000-8000-000000000001";
    const BOB: &str = "6f1c2a3e-0000-4000-8000-000000000002";

    fn analysis(kind: AnalysisKind, language: &str) -> NewAnalysis {
        NewAnalysis {
            kind,
            language: language.to_string(),
            code_length: 42,
            result: json!({"summary": "ok"}),
        }
    }

    fn debug_session(kind: DebugKind) -> NewDebugSession {
        NewDebugSession {
            kind,
            error_message: "TypeError: boom".to_string(),
            stack_trace: None,
            language: "javascript".to_string(),
            result: json!({"explanation": "boom"}),
        }
    }

    #[test]
    fn test_save_and_get_round_trip() {
        let store = HistoryStore::open_in_memory().unwrap();
        let id = store
            .save_analysis(ALICE, &analysis(AnalysisKind::Security, "rust"))
            .unwrap();

        let record = store.get_analysis(&id, ALICE).unwrap().unwrap();
        assert_eq!(record.kind, AnalysisKind::Security);
        assert_eq!(record.language, "rust");
        assert_eq!(record.code_length, 42);
        assert_eq!(record.result, json!({"summary": "ok"}));
    }

    #[test]
    fn test_get_is_ownership_checked() {
        let store = HistoryStore::open_in_memory().unwrap();
        let id = store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "go"))
            .unwrap();

        assert!(store.get_analysis(&id, BOB).unwrap().is_none());
        assert!(store.get_analysis("no-such-id", ALICE).unwrap().is_none());
        assert!(store.get_analysis(&id, ALICE).unwrap().is_some());
    }

    #[test]
    fn test_list_newest_first_and_scoped_to_user() {
        let store = HistoryStore::open_in_memory().unwrap();
        let first = store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
            .unwrap();
        let second = store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
            .unwrap();
        store
            .save_analysis(BOB, &analysis(AnalysisKind::Code, "rust"))
            .unwrap();

        let rows = store.list_analyses(ALICE, &ListQuery::default()).unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert!(rows.iter().all(|r| r.user_id == ALICE));
    }

    #[test]
    fn test_list_filters_and_paging() {
        let store = HistoryStore::open_in_memory().unwrap();
        for _ in 0..3 {
            store
                .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
                .unwrap();
        }
        store
            .save_analysis(ALICE, &analysis(AnalysisKind::Security, "python"))
            .unwrap();

        let security = store
            .list_analyses(
                ALICE,
                &ListQuery {
                    kind: Some(AnalysisKind::Security),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(security.len(), 1);
        assert_eq!(security[0].language, "python");

        let rust = store
            .list_analyses(
                ALICE,
                &ListQuery {
                    language: Some("rust".to_string()),
                    limit: Some(2),
                    offset: 1,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(rust.len(), 2);
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(ListQuery::default().limit(), DEFAULT_PAGE_SIZE);
        let zero = ListQuery {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.limit(), 1);
        let huge = ListQuery {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(huge.limit(), MAX_PAGE_SIZE);
        let negative = DebugListQuery {
            limit: Some(-5),
            ..Default::default()
        };
        assert_eq!(negative.limit(), 1);
    }

    #[test]
    fn test_failed_save_returns_none() {
        let store = HistoryStore::open_in_memory().unwrap();
        store.break_for_tests();

        assert!(store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
            .is_none());
        assert!(store
            .save_debug_session(ALICE, &debug_session(DebugKind::Debug))
            .is_none());
    }

    #[test]
    fn test_debug_sessions_are_ownership_checked() {
        let store = HistoryStore::open_in_memory().unwrap();
        let id = store
            .save_debug_session(ALICE, &debug_session(DebugKind::Analysis))
            .unwrap();

        let record = store.get_debug_session(&id, ALICE).unwrap().unwrap();
        assert_eq!(record.session_type, DebugKind::Analysis);
        assert_eq!(record.error_message, "TypeError: boom");
        assert!(store.get_debug_session(&id, BOB).unwrap().is_none());

        let listed = store
            .list_debug_sessions(BOB, &DebugListQuery::default())
            .unwrap();
        assert!(listed.is_empty());
    }

    #[test]
    fn test_debug_sessions_filter_by_kind() {
        let store = HistoryStore::open_in_memory().unwrap();
        store
            .save_debug_session(ALICE, &debug_session(DebugKind::Debug))
            .unwrap();
        let analysis_id = store
            .save_debug_session(ALICE, &debug_session(DebugKind::Analysis))
            .unwrap();

        let analyses = store
            .list_debug_sessions(
                ALICE,
                &DebugListQuery {
                    kind: Some(DebugKind::Analysis),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].id, analysis_id);

        let all = store
            .list_debug_sessions(ALICE, &DebugListQuery::default())
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_stats_counts_per_kind() {
        let store = HistoryStore::open_in_memory().unwrap();
        store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
            .unwrap();
        store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "rust"))
            .unwrap();
        store
            .save_analysis(ALICE, &analysis(AnalysisKind::Performance, "rust"))
            .unwrap();
        store
            .save_debug_session(ALICE, &debug_session(DebugKind::Debug))
            .unwrap();
        store
            .save_analysis(BOB, &analysis(AnalysisKind::Security, "rust"))
            .unwrap();

        let stats = store.stats(ALICE).unwrap();
        assert_eq!(stats.code, 2);
        assert_eq!(stats.security, 0);
        assert_eq!(stats.performance, 1);
        assert_eq!(stats.debug_sessions, 1);
        assert_eq!(stats.total_analyses(), 3);
    }

    #[test]
    fn test_open_on_disk_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/history.db");
        let store = HistoryStore::open(&path).unwrap();
        store
            .save_analysis(ALICE, &analysis(AnalysisKind::Code, "c"))
            .unwrap();
        assert!(path.exists());
    }
}
