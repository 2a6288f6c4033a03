// ==========================================
// 跨境包裹申报筛查系统 - 编码规则实体
// ==========================================
// 职责: 定义商品编码前缀规则（可选数值区间 + 例外前缀）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CodePrefixRule - 商品编码前缀规则
// ==========================================
/// 商品编码前缀分类规则
///
/// 约束:
/// - prefix 至少 2 位数字；候选编码必须与前缀的前 2 位一致才进入后续判断
/// - range_low/range_high 同为 0 时表示"无区间"哨兵，退化为字面前缀比较
/// - exceptions 中任一前缀命中候选编码（starts_with）即否决本规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePrefixRule {
    pub id: i64,
    pub prefix: String,
    /// 区间下界（含）；与上界同为 0 时视为未设置
    pub range_low: u64,
    /// 区间上界（含）
    pub range_high: u64,
    /// 否决例外前缀
    pub exceptions: Vec<String>,
}

impl CodePrefixRule {
    /// 是否设置了数值区间（0/0 为哨兵，表示未设置）
    pub fn has_range(&self) -> bool {
        !(self.range_low == 0 && self.range_high == 0)
    }

    /// 前缀是否可用（至少 2 位）
    pub fn has_usable_prefix(&self) -> bool {
        self.prefix.len() >= 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_sentinel() {
        let mut rule = CodePrefixRule {
            id: 1,
            prefix: "8517".to_string(),
            range_low: 0,
            range_high: 0,
            exceptions: vec![],
        };
        assert!(!rule.has_range());

        rule.range_low = 8517000000;
        rule.range_high = 8517999999;
        assert!(rule.has_range());

        // 单边为 0 不是哨兵
        rule.range_low = 0;
        assert!(rule.has_range());
    }
}
