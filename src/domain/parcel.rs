// ==========================================
// 跨境包裹申报筛查系统 - 包裹实体
// ==========================================
// 职责: 定义包裹实体（两个子类型共用公共字段）与查询过滤条件
// 红线: 实体不含数据访问逻辑，不含筛查规则
// ==========================================

use crate::domain::types::{CheckStatus, ParcelKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ParcelSubtype - 包裹子类型专有字段
// ==========================================
// 以标签联合体显式建模两个子类型，由调用方按变体分派，
// 不采用基类继承式的隐式覆盖
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParcelSubtype {
    /// 快件包裹: 运单追踪号
    Express { tracking_code: Option<String> },
    /// 邮政小包: 邮政交寄号
    Postal { posting_number: Option<String> },
}

impl ParcelSubtype {
    pub fn kind(&self) -> ParcelKind {
        match self {
            ParcelSubtype::Express { .. } => ParcelKind::Express,
            ParcelSubtype::Postal { .. } => ParcelKind::Postal,
        }
    }

    /// 运单追踪号（仅 EXPRESS 有值）
    pub fn tracking_code(&self) -> Option<&str> {
        match self {
            ParcelSubtype::Express { tracking_code } => tracking_code.as_deref(),
            ParcelSubtype::Postal { .. } => None,
        }
    }

    /// 邮政交寄号（仅 POSTAL 有值）
    pub fn posting_number(&self) -> Option<&str> {
        match self {
            ParcelSubtype::Express { .. } => None,
            ParcelSubtype::Postal { posting_number } => posting_number.as_deref(),
        }
    }
}

// ==========================================
// Parcel - 包裹实体
// ==========================================
/// 包裹实体
///
/// 生命周期: 登记册导入时创建，由筛查引擎（查验状态、规则关联）与
/// 人工复核修改；删除由外部模块负责，本核心不删除包裹
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parcel {
    pub id: i64,
    /// 登记册 ID（一次导入批次）
    pub register_id: i64,
    /// 物流状态编号（外部系统维护）
    pub status_id: i64,
    /// 查验状态编号（见 CheckStatus 契约常量）
    pub check_status_id: i64,
    /// 申报商品编码（10 位数字；可能为空或格式非法）
    pub commodity_code: Option<String>,
    /// 申报品名（自由文本，筛查输入）
    pub product_name: Option<String>,
    /// 子类型专有字段
    pub subtype: ParcelSubtype,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Parcel {
    pub fn kind(&self) -> ParcelKind {
        self.subtype.kind()
    }

    /// 查验状态（None 表示库中出现未知编号）
    pub fn check_status(&self) -> Option<CheckStatus> {
        CheckStatus::from_id(self.check_status_id)
    }

    /// 去除首尾空白后的商品编码；空串视为未申报
    pub fn commodity_code_trimmed(&self) -> Option<&str> {
        self.commodity_code
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// ==========================================
// ParcelFilters - 包裹查询过滤条件
// ==========================================
/// 键集分页查询的过滤条件，全部可选，同时生效（合取）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelFilters {
    /// 精确物流状态
    pub status_id: Option<i64>,
    /// 精确查验状态
    pub check_status_id: Option<i64>,
    /// 商品编码子串（不区分大小写的包含）
    pub commodity_code_contains: Option<String>,
    /// 查验状态落在"有问题"区段 [HasIssues, NoIssues)
    pub with_issues: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parcel_with_code(code: Option<&str>) -> Parcel {
        Parcel {
            id: 1,
            register_id: 1,
            status_id: 0,
            check_status_id: 0,
            commodity_code: code.map(|s| s.to_string()),
            product_name: None,
            subtype: ParcelSubtype::Express {
                tracking_code: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_commodity_code_trimmed() {
        assert_eq!(parcel_with_code(None).commodity_code_trimmed(), None);
        assert_eq!(parcel_with_code(Some("")).commodity_code_trimmed(), None);
        assert_eq!(parcel_with_code(Some("   ")).commodity_code_trimmed(), None);
        assert_eq!(
            parcel_with_code(Some(" 8517120000 ")).commodity_code_trimmed(),
            Some("8517120000")
        );
    }

    #[test]
    fn test_subtype_fields_are_exclusive() {
        let express = ParcelSubtype::Express {
            tracking_code: Some("LP123456".to_string()),
        };
        assert_eq!(express.tracking_code(), Some("LP123456"));
        assert_eq!(express.posting_number(), None);

        let postal = ParcelSubtype::Postal {
            posting_number: Some("RR0011".to_string()),
        };
        assert_eq!(postal.tracking_code(), None);
        assert_eq!(postal.posting_number(), Some("RR0011"));
    }
}
