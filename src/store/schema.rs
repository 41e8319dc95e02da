//! SQLite schema for analysis history
//!
//! Rows are written once and never updated. Every read filters on user_id.

pub const SCHEMA: &str = r#"
-- ============================================
-- CODE ANALYSES
-- ============================================

CREATE TABLE IF NOT EXISTS analysis_history (
    id TEXT PRIMARY KEY,                   -- UUID
    user_id TEXT NOT NULL,                 -- Owner, immutable
    analysis_type TEXT NOT NULL,           -- 'code', 'security', 'performance'
    language TEXT NOT NULL,
    code_length INTEGER NOT NULL,
    result TEXT NOT NULL,                  -- JSON, shape depends on analysis_type
    created_at TEXT NOT NULL               -- RFC 3339
);

-- ============================================
-- DEBUGGING SESSIONS
-- ============================================

CREATE TABLE IF NOT EXISTS debugging_sessions (
    id TEXT PRIMARY KEY,                   -- UUID
    user_id TEXT NOT NULL,
    session_type TEXT NOT NULL DEFAULT 'debug', -- 'debug', 'analysis'
    error_message TEXT NOT NULL,
    stack_trace TEXT,
    language TEXT NOT NULL,
    result TEXT NOT NULL,                  -- JSON
    created_at TEXT NOT NULL
);

-- ============================================
-- INDEXES
-- ============================================

CREATE INDEX IF NOT EXISTS idx_analysis_user_created ON analysis_history(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_analysis_user_type ON analysis_history(user_id, analysis_type);
CREATE INDEX IF NOT EXISTS idx_debug_user_created ON debugging_sessions(user_id, created_at DESC);
"#;
