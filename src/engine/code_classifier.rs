// ==========================================
// 跨境包裹申报筛查系统 - 编码区间分类引擎
// ==========================================
// 职责: 将 10 位商品编码与前缀规则集匹配（数值区间/字面前缀 + 例外否决）
// 规则: 格式非法短路返回，不进入前缀判断；
//       前 2 位一致为候选粗筛，避免全规则集扫描
// ==========================================

use crate::domain::code_rule::CodePrefixRule;
use crate::domain::word_rule::is_valid_commodity_code;

// ==========================================
// 分类状态提示
// ==========================================
/// 分类状态提示
///
/// 仅为建议值；最终查验状态由筛查决策（结合停用词结果）给出
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeClassificationStatus {
    /// 编码非 10 位数字（终态分类结果，不是错误）
    InvalidFormat,
    /// 至少一条前缀规则存活命中
    HasIssues,
    /// 无规则命中
    NoIssues,
}

/// 分类结果
#[derive(Debug, Clone)]
pub struct CodeClassification<'a> {
    pub status: CodeClassificationStatus,
    /// 存活的命中规则（例外否决后）
    pub matched: Vec<&'a CodePrefixRule>,
}

impl CodeClassification<'_> {
    pub fn matched_rule_ids(&self) -> Vec<i64> {
        self.matched.iter().map(|r| r.id).collect()
    }
}

// ==========================================
// CodeClassifier - 编码区间分类引擎
// ==========================================
pub struct CodeClassifier;

impl CodeClassifier {
    /// 对商品编码执行前缀规则分类
    ///
    /// # 匹配顺序
    /// 1. 格式校验: 必须恰为 10 位 ASCII 数字，否则短路返回 InvalidFormat
    /// 2. 候选粗筛: 规则前缀前 2 位 == 编码前 2 位
    /// 3. 设区间规则: 编码整数值落在 [low, high]（双侧含）；
    ///    0/0 哨兵视为未设区间，退化为字面前缀比较
    /// 4. 例外否决: 任一例外前缀是编码的前缀即否决
    pub fn classify<'a>(code: &str, rules: &'a [CodePrefixRule]) -> CodeClassification<'a> {
        let code = code.trim();
        if !is_valid_commodity_code(code) {
            return CodeClassification {
                status: CodeClassificationStatus::InvalidFormat,
                matched: Vec::new(),
            };
        }

        // 格式已校验，10 位数字必可解析
        let value: u64 = match code.parse() {
            Ok(v) => v,
            Err(_) => {
                return CodeClassification {
                    status: CodeClassificationStatus::InvalidFormat,
                    matched: Vec::new(),
                }
            }
        };

        // 按字节比较前 2 位（编码已确认为 ASCII 数字）
        let head = &code.as_bytes()[..2];
        let mut matched = Vec::new();

        for rule in rules {
            if !rule.has_usable_prefix() || &rule.prefix.as_bytes()[..2] != head {
                continue;
            }

            let hit = if rule.has_range() {
                rule.range_low <= value && value <= rule.range_high
            } else {
                code.starts_with(rule.prefix.as_str())
            };
            if !hit {
                continue;
            }

            let vetoed = rule
                .exceptions
                .iter()
                .any(|exception| code.starts_with(exception.as_str()));
            if vetoed {
                continue;
            }

            matched.push(rule);
        }

        let status = if matched.is_empty() {
            CodeClassificationStatus::NoIssues
        } else {
            CodeClassificationStatus::HasIssues
        };

        CodeClassification { status, matched }
    }
}
