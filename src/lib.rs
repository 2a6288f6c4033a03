// ==========================================
// 跨境包裹申报筛查系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 申报筛查决策支持（人工最终查验控制权）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 筛查与分页规则
pub mod engine;

// 服务层 - 流程编排与后台任务
pub mod service;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CheckStatus, MatchType, ParcelKind, SortField, SortOrder};

// 领域实体
pub use domain::{CodePrefixRule, Parcel, ParcelFilters, ParcelSubtype, WordRule};

// 引擎
pub use engine::{
    CodeClassifier, CursorResolver, MatchRank, MatchRankCalculator, MatchRankGroup,
    MorphologyContext, MorphologyMatcher, NoOpMorphologyMatcher, ScreeningEngine,
    WordRuleMatcher,
};

// 服务
pub use service::{RescreenJobManager, ScreeningService};

// API
pub use api::{PageRequestValidator, ParcelApi, ScreeningApi};

/// 应用版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用名称
pub const APP_NAME: &str = "跨境包裹申报筛查系统";
