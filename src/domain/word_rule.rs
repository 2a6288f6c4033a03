// ==========================================
// 跨境包裹申报筛查系统 - 词规则实体
// ==========================================
// 职责: 定义关键词/停用词规则及其商品编码关联
// ==========================================

use crate::domain::types::MatchType;
use serde::{Deserialize, Serialize};

// ==========================================
// WordRule - 词规则
// ==========================================
/// 关键词/停用词规则
///
/// 约束: word 为空的规则不会产生可用的匹配器条目（编译时静默跳过）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRule {
    pub id: i64,
    /// 关键词或词组文本
    pub word: String,
    /// 匹配策略
    pub match_type: MatchType,
}

impl WordRule {
    pub fn new(id: i64, word: impl Into<String>, match_type: MatchType) -> Self {
        Self {
            id,
            word: word.into(),
            match_type,
        }
    }

    /// 规则文本是否可用（非空白）
    pub fn has_usable_word(&self) -> bool {
        !self.word.trim().is_empty()
    }
}

/// 校验商品编码是否为 10 位 ASCII 数字
pub fn is_valid_commodity_code(code: &str) -> bool {
    code.len() == 10 && code.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_word() {
        assert!(WordRule::new(1, "酒精", MatchType::ExactWord).has_usable_word());
        assert!(!WordRule::new(2, "", MatchType::ExactWord).has_usable_word());
        assert!(!WordRule::new(3, "   ", MatchType::Phrase).has_usable_word());
    }

    #[test]
    fn test_commodity_code_format() {
        assert!(is_valid_commodity_code("8517120000"));
        assert!(!is_valid_commodity_code("851712000"));   // 9 位
        assert!(!is_valid_commodity_code("85171200001")); // 11 位
        assert!(!is_valid_commodity_code("85171200AB"));  // 含字母
        assert!(!is_valid_commodity_code("8517 20000")); // 含空格
        assert!(!is_valid_commodity_code(""));
    }
}
