// ==========================================
// 跨境包裹申报筛查系统 - 词规则仓储
// ==========================================
// 职责: 管理 word_rule / word_rule_code 表的数据访问
// 红线: 不含匹配逻辑，只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::MatchType;
use crate::domain::word_rule::{is_valid_commodity_code, WordRule};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

// ==========================================
// WordRuleRepository - 词规则仓储
// ==========================================
pub struct WordRuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WordRuleRepository {
    /// 创建新的 WordRuleRepository 实例
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

    /// 查询全部词规则
    pub fn list_all(&self) -> RepositoryResult<Vec<WordRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, word, match_type FROM word_rule ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut rules = Vec::new();
        for row in rows {
            let (id, word, match_type_str) = row?;
            let match_type = MatchType::from_str(&match_type_str).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "match_type".to_string(),
                    message: format!("未知匹配类型: {}", match_type_str),
                }
            })?;
            rules.push(WordRule {
                id,
                word,
                match_type,
            });
        }
        Ok(rules)
    }

    /// 插入词规则
    pub fn insert(&self, rule: &WordRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO word_rule (id, word, match_type) VALUES (?1, ?2, ?3)",
            params![rule.id, rule.word, rule.match_type.to_db_str()],
        )?;
        Ok(())
    }

    /// 整体替换词规则的商品编码关联（先删后插）
    ///
    /// # 约束
    /// 每个关联编码必须为 10 位数字，否则整批拒绝
    pub fn set_rule_codes(&self, word_rule_id: i64, codes: &[String]) -> RepositoryResult<()> {
        for code in codes {
            if !is_valid_commodity_code(code) {
                return Err(RepositoryError::FieldValueError {
                    field: "word_rule_code.code".to_string(),
                    message: format!("关联编码必须为 10 位数字: {}", code),
                });
            }
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM word_rule_code WHERE word_rule_id = ?1",
            params![word_rule_id],
        )?;
        for code in codes {
            tx.execute(
                "INSERT OR IGNORE INTO word_rule_code (word_rule_id, code) VALUES (?1, ?2)",
                params![word_rule_id, code],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// 规则集内容指纹
    ///
    /// # 说明
    /// 编译后的匹配器按指纹缓存；库与外部程序共享，规则可能被任何一方改写，
    /// 因此指纹覆盖全部规则行的（id，词，匹配类型）：增删之外，原地改词或
    /// 改匹配类型同样改变指纹并触发重编译
    pub fn rule_set_generation(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, word, match_type FROM word_rule ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut hasher = DefaultHasher::new();
        for row in rows {
            row?.hash(&mut hasher);
        }
        Ok(hasher.finish())
    }
}
