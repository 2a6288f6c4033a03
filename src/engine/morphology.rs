// ==========================================
// 跨境包裹申报筛查系统 - 形态学匹配器接口
// ==========================================
// 职责: 定义外部词形变化匹配器的窄接口
// 红线: 本核心不实现语言学分析；外部匹配器视为不透明的语言学判定器，
//       其结果与词规则匹配器的结果按规则身份合并去重
// ==========================================

use std::collections::HashSet;

// ==========================================
// MorphologyMatcher - 外部形态学匹配器
// ==========================================
/// 外部形态学匹配器
///
/// 两步协议: 先以（规则 id，词）集合初始化上下文，
/// 再对文本批量求命中规则 id 集
pub trait MorphologyMatcher: Send + Sync {
    /// 以词形变化类型的规则初始化匹配上下文
    ///
    /// # 参数
    /// - words: （词规则 id，规则文本）列表
    fn initialize_context(&self, words: &[(i64, String)]) -> Box<dyn MorphologyContext>;
}

/// 已初始化的形态学匹配上下文
pub trait MorphologyContext: Send + Sync {
    /// 对文本求命中的词规则 id 集
    fn check_text(&self, text: &str) -> HashSet<i64>;
}

// ==========================================
// NoOpMorphologyMatcher - 空实现
// ==========================================
/// 空形态学匹配器: 外部匹配器未接入时的缺省实现，永不命中
pub struct NoOpMorphologyMatcher;

impl MorphologyMatcher for NoOpMorphologyMatcher {
    fn initialize_context(&self, _words: &[(i64, String)]) -> Box<dyn MorphologyContext> {
        Box::new(NoOpMorphologyContext)
    }
}

struct NoOpMorphologyContext;

impl MorphologyContext for NoOpMorphologyContext {
    fn check_text(&self, _text: &str) -> HashSet<i64> {
        HashSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_matcher_never_matches() {
        let matcher = NoOpMorphologyMatcher;
        let ctx = matcher.initialize_context(&[(1, "спирт".to_string())]);
        assert!(ctx.check_text("спиртовой раствор").is_empty());
    }
}
