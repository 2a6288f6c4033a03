// ==========================================
// 跨境包裹申报筛查系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供开箱即用的建表入口（init_schema），测试与嵌入方共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化筛查核心所需的全部表结构（幂等）
///
/// 说明:
/// - 包裹两个子类型共用 parcel 表，以 parcel_kind 区分
/// - 关联表（parcel_word_rule_link / parcel_code_rule_link）为重算表，
///   每次筛查整体替换（先删后插），不做增量修补
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id),
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS parcel (
            id INTEGER PRIMARY KEY,
            register_id INTEGER NOT NULL,
            parcel_kind TEXT NOT NULL,
            status_id INTEGER NOT NULL DEFAULT 0,
            check_status_id INTEGER NOT NULL DEFAULT 0,
            commodity_code TEXT,
            product_name TEXT,
            tracking_code TEXT,
            posting_number TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_parcel_register
          ON parcel(register_id, parcel_kind);

        CREATE INDEX IF NOT EXISTS idx_parcel_check_status
          ON parcel(register_id, check_status_id);

        CREATE TABLE IF NOT EXISTS word_rule (
            id INTEGER PRIMARY KEY,
            word TEXT NOT NULL,
            match_type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS word_rule_code (
            word_rule_id INTEGER NOT NULL REFERENCES word_rule(id) ON DELETE CASCADE,
            code TEXT NOT NULL,
            PRIMARY KEY (word_rule_id, code)
        );

        CREATE TABLE IF NOT EXISTS code_prefix_rule (
            id INTEGER PRIMARY KEY,
            prefix TEXT NOT NULL,
            range_low INTEGER NOT NULL DEFAULT 0,
            range_high INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS code_prefix_exception (
            prefix_rule_id INTEGER NOT NULL REFERENCES code_prefix_rule(id) ON DELETE CASCADE,
            exception_prefix TEXT NOT NULL,
            PRIMARY KEY (prefix_rule_id, exception_prefix)
        );

        CREATE TABLE IF NOT EXISTS code_catalogue (
            code TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS parcel_word_rule_link (
            parcel_id INTEGER NOT NULL REFERENCES parcel(id),
            word_rule_id INTEGER NOT NULL,
            PRIMARY KEY (parcel_id, word_rule_id)
        );

        CREATE TABLE IF NOT EXISTS parcel_code_rule_link (
            parcel_id INTEGER NOT NULL REFERENCES parcel(id),
            prefix_rule_id INTEGER NOT NULL,
            PRIMARY KEY (parcel_id, prefix_rule_id)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
