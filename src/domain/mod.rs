// ==========================================
// 跨境包裹申报筛查系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与实体级校验
// 红线: 不含数据访问逻辑，不含筛查引擎逻辑
// ==========================================

pub mod code_rule;
pub mod parcel;
pub mod types;
pub mod word_rule;

// 重导出核心类型
pub use code_rule::CodePrefixRule;
pub use parcel::{Parcel, ParcelFilters, ParcelSubtype};
pub use types::{
    CheckStatus, MatchType, ParcelKind, SortField, SortOrder, CHECK_STATUS_HAS_ISSUES_LOW,
    CHECK_STATUS_NO_ISSUES,
};
pub use word_rule::{is_valid_commodity_code, WordRule};
