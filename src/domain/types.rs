// ==========================================
// 跨境包裹申报筛查系统 - 领域类型定义
// ==========================================
// 职责: 定义查验状态、匹配类型、排序字段等枚举
// 红线: 查验状态的"有问题"区段必须按半开区间判断，不逐个枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 查验状态 (Check Status)
// ==========================================
// 状态编号为系统级契约，与其他模块共享:
// - 0          未查验
// - [100, 200) "有问题"区段（多个子码，均表示需人工查验）
// - 200        无问题
// - 300        合作方已标记（跳过筛查）
// - 400 / 410  终态（已放行）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    NotChecked,        // 未查验
    HasIssues,         // 命中规则，需人工查验
    InvalidCodeFormat, // 商品编码格式非法
    NoIssues,          // 无问题
    MarkedByPartner,   // 合作方已标记，筛查跳过
    Approved,          // 已放行
    ApprovedManually,  // 人工复核后放行
}

/// "有问题"区段下界（含）
pub const CHECK_STATUS_HAS_ISSUES_LOW: i64 = 100;
/// "有问题"区段上界（不含），即"无问题"状态编号
pub const CHECK_STATUS_NO_ISSUES: i64 = 200;

impl CheckStatus {
    /// 状态编号（数据库存储值）
    pub fn id(&self) -> i64 {
        match self {
            CheckStatus::NotChecked => 0,
            CheckStatus::HasIssues => 100,
            CheckStatus::InvalidCodeFormat => 110,
            CheckStatus::NoIssues => 200,
            CheckStatus::MarkedByPartner => 300,
            CheckStatus::Approved => 400,
            CheckStatus::ApprovedManually => 410,
        }
    }

    /// 从状态编号解析
    ///
    /// # 返回
    /// - Some(CheckStatus): 已知编号
    /// - None: 未知编号（数据来自外部系统时可能出现）
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            0 => Some(CheckStatus::NotChecked),
            100 => Some(CheckStatus::HasIssues),
            110 => Some(CheckStatus::InvalidCodeFormat),
            200 => Some(CheckStatus::NoIssues),
            300 => Some(CheckStatus::MarkedByPartner),
            400 => Some(CheckStatus::Approved),
            410 => Some(CheckStatus::ApprovedManually),
            _ => None,
        }
    }

    /// 判断状态编号是否落在"有问题"区段 [100, 200)
    ///
    /// 红线: withIssues 过滤必须使用本函数，禁止逐个枚举子码
    pub fn is_with_issues(id: i64) -> bool {
        (CHECK_STATUS_HAS_ISSUES_LOW..CHECK_STATUS_NO_ISSUES).contains(&id)
    }

    /// i18n 文案键（供展示层取本地化状态名）
    pub fn description_key(&self) -> &'static str {
        match self {
            CheckStatus::NotChecked => "check_status.not_checked",
            CheckStatus::HasIssues => "check_status.has_issues",
            CheckStatus::InvalidCodeFormat => "check_status.invalid_code_format",
            CheckStatus::NoIssues => "check_status.no_issues",
            CheckStatus::MarkedByPartner => "check_status.marked_by_partner",
            CheckStatus::Approved => "check_status.approved",
            CheckStatus::ApprovedManually => "check_status.approved_manually",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckStatus::NotChecked => write!(f, "NOT_CHECKED"),
            CheckStatus::HasIssues => write!(f, "HAS_ISSUES"),
            CheckStatus::InvalidCodeFormat => write!(f, "INVALID_CODE_FORMAT"),
            CheckStatus::NoIssues => write!(f, "NO_ISSUES"),
            CheckStatus::MarkedByPartner => write!(f, "MARKED_BY_PARTNER"),
            CheckStatus::Approved => write!(f, "APPROVED"),
            CheckStatus::ApprovedManually => write!(f, "APPROVED_MANUALLY"),
        }
    }
}

// ==========================================
// 关键词匹配类型 (Match Type)
// ==========================================
// EXACT_SYMBOLS / EXACT_WORD / PHRASE 由本系统的词规则匹配器处理；
// 两种词形变化类型委托给外部形态学匹配器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchType {
    ExactSymbols,     // 符号级子串包含（不限词边界）
    ExactWord,        // 整词匹配（词边界约束）
    Phrase,           // 词组匹配（按顺序的整词序列）
    WeakMorphology,   // 弱词形变化（外部匹配器）
    StrongMorphology, // 强词形变化（外部匹配器）
}

impl MatchType {
    /// 是否委托给外部形态学匹配器
    pub fn is_morphology(&self) -> bool {
        matches!(self, MatchType::WeakMorphology | MatchType::StrongMorphology)
    }

    /// 从字符串解析匹配类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EXACT_SYMBOLS" => Some(MatchType::ExactSymbols),
            "EXACT_WORD" => Some(MatchType::ExactWord),
            "PHRASE" => Some(MatchType::Phrase),
            "WEAK_MORPHOLOGY" => Some(MatchType::WeakMorphology),
            "STRONG_MORPHOLOGY" => Some(MatchType::StrongMorphology),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MatchType::ExactSymbols => "EXACT_SYMBOLS",
            MatchType::ExactWord => "EXACT_WORD",
            MatchType::Phrase => "PHRASE",
            MatchType::WeakMorphology => "WEAK_MORPHOLOGY",
            MatchType::StrongMorphology => "STRONG_MORPHOLOGY",
        }
    }
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 包裹子类型 (Parcel Kind)
// ==========================================
// 两个具体子类型共用公共字段，仅展示字段不同:
// EXPRESS 带运单追踪号，POSTAL 带邮政交寄号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParcelKind {
    Express, // 快件包裹
    Postal,  // 邮政小包
}

impl ParcelKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "EXPRESS" => Some(ParcelKind::Express),
            "POSTAL" => Some(ParcelKind::Postal),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ParcelKind::Express => "EXPRESS",
            ParcelKind::Postal => "POSTAL",
        }
    }
}

impl fmt::Display for ParcelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 排序字段 (Sort Field)
// ==========================================
// TrackingCode 仅适用于 EXPRESS, PostingNumber 仅适用于 POSTAL;
// MatchPriority 为派生键（由匹配优先级引擎计算，不落库）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    StatusId,
    CheckStatusId,
    CommodityCode,
    TrackingCode,
    PostingNumber,
    MatchPriority,
}

impl SortField {
    /// 从外部传入的字段名解析（camelCase，与接口契约一致）
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "id" => Some(SortField::Id),
            "statusId" => Some(SortField::StatusId),
            "checkStatusId" => Some(SortField::CheckStatusId),
            "commodityCode" => Some(SortField::CommodityCode),
            "trackingCode" => Some(SortField::TrackingCode),
            "postingNumber" => Some(SortField::PostingNumber),
            "matchPriority" => Some(SortField::MatchPriority),
            _ => None,
        }
    }

    /// 字段是否适用于指定包裹子类型
    pub fn applies_to(&self, kind: ParcelKind) -> bool {
        match self {
            SortField::TrackingCode => kind == ParcelKind::Express,
            SortField::PostingNumber => kind == ParcelKind::Postal,
            _ => true,
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SortField::Id => "id",
            SortField::StatusId => "statusId",
            SortField::CheckStatusId => "checkStatusId",
            SortField::CommodityCode => "commodityCode",
            SortField::TrackingCode => "trackingCode",
            SortField::PostingNumber => "postingNumber",
            SortField::MatchPriority => "matchPriority",
        };
        write!(f, "{}", s)
    }
}

// ==========================================
// 排序方向 (Sort Order)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASC" => Some(SortOrder::Asc),
            "DESC" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "ASC"),
            SortOrder::Desc => write!(f, "DESC"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_round_trip() {
        for status in [
            CheckStatus::NotChecked,
            CheckStatus::HasIssues,
            CheckStatus::InvalidCodeFormat,
            CheckStatus::NoIssues,
            CheckStatus::MarkedByPartner,
            CheckStatus::Approved,
            CheckStatus::ApprovedManually,
        ] {
            assert_eq!(CheckStatus::from_id(status.id()), Some(status));
        }
        assert_eq!(CheckStatus::from_id(999), None);
    }

    #[test]
    fn test_with_issues_band_is_half_open() {
        // 下界含，上界不含
        assert!(CheckStatus::is_with_issues(100));
        assert!(CheckStatus::is_with_issues(110));
        assert!(CheckStatus::is_with_issues(199));
        assert!(!CheckStatus::is_with_issues(200));
        assert!(!CheckStatus::is_with_issues(0));
        assert!(!CheckStatus::is_with_issues(300));
    }

    #[test]
    fn test_sort_field_applicability() {
        assert!(SortField::TrackingCode.applies_to(ParcelKind::Express));
        assert!(!SortField::TrackingCode.applies_to(ParcelKind::Postal));
        assert!(!SortField::PostingNumber.applies_to(ParcelKind::Express));
        assert!(SortField::PostingNumber.applies_to(ParcelKind::Postal));
        assert!(SortField::MatchPriority.applies_to(ParcelKind::Express));
        assert!(SortField::MatchPriority.applies_to(ParcelKind::Postal));
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!(SortField::from_str("checkStatusId"), Some(SortField::CheckStatusId));
        assert_eq!(SortField::from_str("matchPriority"), Some(SortField::MatchPriority));
        assert_eq!(SortField::from_str("CheckStatusId"), None);
        assert_eq!(SortField::from_str("weight"), None);
    }

    #[test]
    fn test_db_enum_round_trip() {
        for kind in [ParcelKind::Express, ParcelKind::Postal] {
            assert_eq!(ParcelKind::from_str(kind.to_db_str()), Some(kind));
        }
        assert_eq!(ParcelKind::from_str("PIGEON"), None);

        for mt in [
            MatchType::ExactSymbols,
            MatchType::ExactWord,
            MatchType::Phrase,
            MatchType::WeakMorphology,
            MatchType::StrongMorphology,
        ] {
            assert_eq!(MatchType::from_str(mt.to_db_str()), Some(mt));
        }
    }
}
