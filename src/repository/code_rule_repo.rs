// ==========================================
// 跨境包裹申报筛查系统 - 编码规则仓储
// ==========================================
// 职责: 管理 code_prefix_rule / code_prefix_exception / code_catalogue 表
// 红线: 不含分类逻辑，只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::code_rule::CodePrefixRule;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

// ==========================================
// CodeRuleRepository - 编码规则仓储
// ==========================================
pub struct CodeRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CodeRuleRepository {
    /// 创建新的 CodeRuleRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 前缀规则
    // ==========================================

    /// 查询全部前缀规则（含例外前缀）
    pub fn list_prefix_rules(&self) -> RepositoryResult<Vec<CodePrefixRule>> {
        let conn = self.get_conn()?;

        // 先取例外，再组装规则，避免逐规则查询
        let mut exc_stmt = conn
            .prepare("SELECT prefix_rule_id, exception_prefix FROM code_prefix_exception")?;
        let exc_rows = exc_stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut exceptions: HashMap<i64, Vec<String>> = HashMap::new();
        for row in exc_rows {
            let (rule_id, prefix) = row?;
            exceptions.entry(rule_id).or_default().push(prefix);
        }

        let mut stmt = conn
            .prepare("SELECT id, prefix, range_low, range_high FROM code_prefix_rule ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (id, prefix, range_low, range_high) = row?;
            // 负数区间经 as u64 会回绕成巨大边界，拒绝而非静默放行
            if range_low < 0 || range_high < 0 {
                return Err(RepositoryError::FieldValueError {
                    field: "code_prefix_rule.range".to_string(),
                    message: format!(
                        "区间边界不得为负: id={}, range_low={}, range_high={}",
                        id, range_low, range_high
                    ),
                });
            }
            rules.push(CodePrefixRule {
                id,
                prefix,
                range_low: range_low as u64,
                range_high: range_high as u64,
                exceptions: exceptions.remove(&id).unwrap_or_default(),
            });
        }
        Ok(rules)
    }

    /// 插入前缀规则（含例外前缀，单事务）
    pub fn insert_prefix_rule(&self, rule: &CodePrefixRule) -> RepositoryResult<()> {
        if !rule.has_usable_prefix() {
            return Err(RepositoryError::FieldValueError {
                field: "code_prefix_rule.prefix".to_string(),
                message: format!("前缀至少 2 位: {:?}", rule.prefix),
            });
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO code_prefix_rule (id, prefix, range_low, range_high) VALUES (?1, ?2, ?3, ?4)",
            params![rule.id, rule.prefix, rule.range_low as i64, rule.range_high as i64],
        )?;
        for exception in &rule.exceptions {
            tx.execute(
                "INSERT OR IGNORE INTO code_prefix_exception (prefix_rule_id, exception_prefix) VALUES (?1, ?2)",
                params![rule.id, exception],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 编码目录
    // ==========================================

    /// 批量插入目录编码
    pub fn insert_catalogue_codes(&self, codes: &[String]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for code in codes {
            count += tx.execute(
                "INSERT OR IGNORE INTO code_catalogue (code) VALUES (?1)",
                params![code],
            )?;
        }
        tx.commit()?;
        Ok(count)
    }

    /// 目录是否包含指定编码
    pub fn catalogue_contains(&self, code: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM code_catalogue WHERE code = ?1",
            params![code],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 批量目录成员过滤: 返回入参中存在于目录的编码子集
    ///
    /// # 说明
    /// matchPriority 排序对每个候选行都要做目录成员判断，
    /// 分块 IN 查询避免候选集上的逐行查询
    pub fn catalogue_filter(&self, codes: &[String]) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let mut present = HashSet::new();

        // SQLite 变量上限 999，留裕量分块
        for chunk in codes.chunks(500) {
            if chunk.is_empty() {
                continue;
            }
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT code FROM code_catalogue WHERE code IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for row in rows {
                present.insert(row?);
            }
        }
        Ok(present)
    }
}
