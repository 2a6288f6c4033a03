// ==========================================
// 跨境包裹申报筛查系统 - 引擎层
// ==========================================
// 职责: 实现筛查规则引擎，不拼 SQL
// 红线: Engine 不拼 SQL；引擎为纯函数/只读计算，落盘由服务层负责
// ==========================================

pub mod code_classifier;
pub mod cursor;
pub mod match_rank;
pub mod morphology;
pub mod screening;
pub mod word_matcher;

// 重导出核心引擎
pub use code_classifier::{CodeClassification, CodeClassificationStatus, CodeClassifier};
pub use cursor::{CursorAnchor, CursorResolver, SortKey};
pub use match_rank::{MatchRank, MatchRankCalculator, MatchRankGroup};
pub use morphology::{MorphologyContext, MorphologyMatcher, NoOpMorphologyMatcher};
pub use screening::{ScreeningEngine, ScreeningOutcome};
pub use word_matcher::{MatcherCache, WordRuleMatcher};
