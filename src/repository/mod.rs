// ==========================================
// 跨境包裹申报筛查系统 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口，屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod code_rule_repo;
pub mod error;
pub mod parcel_repo;
pub mod word_rule_repo;

// 重导出核心仓储
pub use code_rule_repo::CodeRuleRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use parcel_repo::ParcelRepository;
pub use word_rule_repo::WordRuleRepository;
