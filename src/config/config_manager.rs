// ==========================================
// 跨境包裹申报筛查系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 配置键全集
pub mod config_keys {
    /// 是否启用外部形态学匹配（默认 true）
    pub const MORPHOLOGY_ENABLED: &str = "screening/morphology_enabled";
    /// 批量重筛进度日志间隔（每 N 个包裹一条，默认 100）
    pub const PROGRESS_LOG_EVERY: &str = "screening/progress_log_every";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（upsert）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    // ==========================================
    // 类型化配置读取（带默认值）
    // ==========================================

    /// 是否启用外部形态学匹配
    pub fn morphology_enabled(&self) -> Result<bool, Box<dyn Error>> {
        match self.get_config_value(config_keys::MORPHOLOGY_ENABLED)? {
            Some(v) => Ok(v != "false" && v != "0"),
            None => Ok(true),
        }
    }

    /// 批量重筛进度日志间隔
    pub fn progress_log_every(&self) -> Result<u64, Box<dyn Error>> {
        match self.get_config_value(config_keys::PROGRESS_LOG_EVERY)? {
            Some(v) => Ok(v.parse().unwrap_or(100)),
            None => Ok(100),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = setup();
        assert!(config.morphology_enabled().unwrap());
        assert_eq!(config.progress_log_every().unwrap(), 100);
    }

    #[test]
    fn test_set_and_get_round_trip() {
        let config = setup();
        config
            .set_global_config_value(config_keys::MORPHOLOGY_ENABLED, "false")
            .unwrap();
        assert!(!config.morphology_enabled().unwrap());
        assert_eq!(
            config
                .get_global_config_value(config_keys::MORPHOLOGY_ENABLED)
                .unwrap()
                .as_deref(),
            Some("false")
        );

        config
            .set_global_config_value(config_keys::PROGRESS_LOG_EVERY, "25")
            .unwrap();
        assert_eq!(config.progress_log_every().unwrap(), 25);

        // 覆写
        config
            .set_global_config_value(config_keys::PROGRESS_LOG_EVERY, "50")
            .unwrap();
        assert_eq!(config.progress_log_every().unwrap(), 50);
    }
}
