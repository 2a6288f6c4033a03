// ==========================================
// 跨境包裹申报筛查系统 - 包裹仓储
// ==========================================
// 职责: 管理 parcel 表及两张规则关联表的数据访问
// 红线: 不含筛查逻辑，只负责数据访问；所有查询参数化
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::parcel::{Parcel, ParcelFilters, ParcelSubtype};
use crate::domain::types::{
    ParcelKind, CHECK_STATUS_HAS_ISSUES_LOW, CHECK_STATUS_NO_ISSUES,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// parcel 表查询列清单（与 map_parcel_row 的列序一致）
const PARCEL_COLUMNS: &str = "id, register_id, parcel_kind, status_id, check_status_id, \
     commodity_code, product_name, tracking_code, posting_number, created_at, updated_at";

// ==========================================
// ParcelRepository - 包裹仓储
// ==========================================
pub struct ParcelRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ParcelRepository {
    /// 创建新的 ParcelRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 批量插入包裹（登记册导入）
    ///
    /// # 说明
    /// - 使用事务确保原子性
    /// - id 由调用方给定（登记册行号体系），不使用自增
    pub fn batch_insert(&self, parcels: &[Parcel]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for parcel in parcels {
            tx.execute(
                r#"
                INSERT INTO parcel (
                    id, register_id, parcel_kind, status_id, check_status_id,
                    commodity_code, product_name, tracking_code, posting_number,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
                params![
                    parcel.id,
                    parcel.register_id,
                    parcel.kind().to_db_str(),
                    parcel.status_id,
                    parcel.check_status_id,
                    parcel.commodity_code,
                    parcel.product_name,
                    parcel.subtype.tracking_code(),
                    parcel.subtype.posting_number(),
                    parcel.created_at.to_rfc3339(),
                    parcel.updated_at.to_rfc3339(),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 更新包裹查验状态
    pub fn update_check_status(&self, parcel_id: i64, check_status_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE parcel SET check_status_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![check_status_id, Utc::now().to_rfc3339(), parcel_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "parcel".to_string(),
                id: parcel_id.to_string(),
            });
        }
        Ok(())
    }

    /// 落盘一次筛查结果: 替换两张关联表 + 更新查验状态（单事务）
    ///
    /// # 说明
    /// - 关联行整体替换（先删后插），保证关联集始终反映当前规则集；
    ///   不做增量修补
    pub fn apply_screening(
        &self,
        parcel_id: i64,
        check_status_id: i64,
        word_rule_ids: &[i64],
        prefix_rule_ids: &[i64],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM parcel_word_rule_link WHERE parcel_id = ?1",
            params![parcel_id],
        )?;
        tx.execute(
            "DELETE FROM parcel_code_rule_link WHERE parcel_id = ?1",
            params![parcel_id],
        )?;

        for rule_id in word_rule_ids {
            tx.execute(
                "INSERT OR IGNORE INTO parcel_word_rule_link (parcel_id, word_rule_id) VALUES (?1, ?2)",
                params![parcel_id, rule_id],
            )?;
        }
        for rule_id in prefix_rule_ids {
            tx.execute(
                "INSERT OR IGNORE INTO parcel_code_rule_link (parcel_id, prefix_rule_id) VALUES (?1, ?2)",
                params![parcel_id, rule_id],
            )?;
        }

        let affected = tx.execute(
            "UPDATE parcel SET check_status_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![check_status_id, Utc::now().to_rfc3339(), parcel_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "parcel".to_string(),
                id: parcel_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按 id 查询包裹（不施加任何过滤条件，子类型/登记册仍需匹配）
    ///
    /// # 说明
    /// 键集分页的游标行即使被过滤条件排除，仍以其真实排序位置锚定扫描，
    /// 因此游标行查询必须绕过过滤条件
    pub fn find_by_id(
        &self,
        kind: ParcelKind,
        register_id: i64,
        parcel_id: i64,
    ) -> RepositoryResult<Option<Parcel>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM parcel WHERE id = ?1 AND register_id = ?2 AND parcel_kind = ?3",
            PARCEL_COLUMNS
        );
        let result = conn
            .query_row(
                &sql,
                params![parcel_id, register_id, kind.to_db_str()],
                map_parcel_row,
            )
            .optional()?;
        Ok(result)
    }

    /// 按 id 查询包裹（不限子类型，供单包裹筛查/诊断使用）
    pub fn find_by_id_any(&self, parcel_id: i64) -> RepositoryResult<Option<Parcel>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM parcel WHERE id = ?1", PARCEL_COLUMNS);
        let result = conn
            .query_row(&sql, params![parcel_id], map_parcel_row)
            .optional()?;
        Ok(result)
    }

    /// 查询满足过滤条件的候选包裹集（登记册 + 全部生效过滤条件的合取）
    ///
    /// # 说明
    /// 返回顺序不保证；排序/锚定由引擎层负责
    pub fn list_candidates(
        &self,
        kind: ParcelKind,
        register_id: i64,
        filters: &ParcelFilters,
    ) -> RepositoryResult<Vec<Parcel>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM parcel WHERE register_id = ? AND parcel_kind = ?",
            PARCEL_COLUMNS
        );
        let mut bind: Vec<Value> = vec![
            Value::Integer(register_id),
            Value::Text(kind.to_db_str().to_string()),
        ];

        if let Some(status_id) = filters.status_id {
            sql.push_str(" AND status_id = ?");
            bind.push(Value::Integer(status_id));
        }
        if let Some(check_status_id) = filters.check_status_id {
            sql.push_str(" AND check_status_id = ?");
            bind.push(Value::Integer(check_status_id));
        }
        if let Some(ref fragment) = filters.commodity_code_contains {
            // instr 比 LIKE 更直接: 无需处理 % 与 _ 的转义
            sql.push_str(" AND commodity_code IS NOT NULL AND instr(lower(commodity_code), lower(?)) > 0");
            bind.push(Value::Text(fragment.clone()));
        }
        if filters.with_issues {
            sql.push_str(" AND check_status_id >= ? AND check_status_id < ?");
            bind.push(Value::Integer(CHECK_STATUS_HAS_ISSUES_LOW));
            bind.push(Value::Integer(CHECK_STATUS_NO_ISSUES));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), map_parcel_row)?;

        let mut parcels = Vec::new();
        for row in rows {
            parcels.push(row?);
        }
        Ok(parcels)
    }

    /// 查询登记册下全部包裹 id（批量重筛用，不限子类型）
    pub fn list_ids_by_register(&self, register_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id FROM parcel WHERE register_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![register_id], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    // ==========================================
    // 规则关联查询（匹配优先级计算的输入）
    // ==========================================

    /// 查询包裹已命中的词规则 id 集
    pub fn matched_word_rule_ids(&self, parcel_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT word_rule_id FROM parcel_word_rule_link WHERE parcel_id = ?1",
        )?;
        let rows = stmt.query_map(params![parcel_id], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// 查询单个包裹命中词规则所关联的商品编码集
    pub fn linked_codes_for_parcel(&self, parcel_id: i64) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT c.code
            FROM parcel_word_rule_link l
            JOIN word_rule_code c ON c.word_rule_id = l.word_rule_id
            WHERE l.parcel_id = ?1
            "#,
        )?;
        let rows = stmt.query_map(params![parcel_id], |row| row.get::<_, String>(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }

    /// 按登记册批量查询"包裹 -> 命中词规则关联编码"映射
    ///
    /// # 说明
    /// matchPriority 排序需要逐候选行取关联编码；
    /// 一次 JOIN 取回整个登记册，避免候选集上的 N+1 查询
    pub fn linked_codes_by_register(
        &self,
        kind: ParcelKind,
        register_id: i64,
    ) -> RepositoryResult<HashMap<i64, Vec<String>>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT l.parcel_id, c.code
            FROM parcel_word_rule_link l
            JOIN word_rule_code c ON c.word_rule_id = l.word_rule_id
            JOIN parcel p ON p.id = l.parcel_id
            WHERE p.register_id = ?1 AND p.parcel_kind = ?2
            "#,
        )?;
        let rows = stmt.query_map(params![register_id, kind.to_db_str()], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut map: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            let (parcel_id, code) = row?;
            map.entry(parcel_id).or_default().push(code);
        }
        Ok(map)
    }

    /// 查询包裹已命中的编码前缀规则 id 集
    pub fn matched_prefix_rule_ids(&self, parcel_id: i64) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT prefix_rule_id FROM parcel_code_rule_link WHERE parcel_id = ?1",
        )?;
        let rows = stmt.query_map(params![parcel_id], |row| row.get::<_, i64>(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

/// 行映射: parcel 表 -> Parcel 实体
fn map_parcel_row(row: &Row<'_>) -> rusqlite::Result<Parcel> {
    let kind_str: String = row.get(2)?;
    let subtype = match kind_str.as_str() {
        "EXPRESS" => ParcelSubtype::Express {
            tracking_code: row.get(7)?,
        },
        "POSTAL" => ParcelSubtype::Postal {
            posting_number: row.get(8)?,
        },
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("未知包裹子类型: {}", other).into(),
            ))
        }
    };

    Ok(Parcel {
        id: row.get(0)?,
        register_id: row.get(1)?,
        status_id: row.get(3)?,
        check_status_id: row.get(4)?,
        commodity_code: row.get(5)?,
        product_name: row.get(6)?,
        subtype,
        created_at: parse_rfc3339(row, 9)?,
        updated_at: parse_rfc3339(row, 10)?,
    })
}

fn parse_rfc3339(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}
