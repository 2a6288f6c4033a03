// ==========================================
// 跨境包裹申报筛查系统 - 筛查决策引擎
// ==========================================
// 职责: 合并词规则/形态学/编码分类三路命中，给出查验状态决策
// 规则: 合作方已标记的包裹整体跳过，不做任何改动；
//       编码格式非法短路决定状态（词命中关联仍记录）；
//       否则任一存活命中 => 有问题，无命中 => 无问题
// 红线: 引擎为纯函数，不触达数据库；落盘由服务层负责
// ==========================================

use crate::domain::code_rule::CodePrefixRule;
use crate::domain::parcel::Parcel;
use crate::domain::types::CheckStatus;
use crate::engine::code_classifier::{CodeClassificationStatus, CodeClassifier};
use crate::engine::morphology::MorphologyContext;
use crate::engine::word_matcher::WordRuleMatcher;
use std::collections::HashSet;

/// 一次筛查的完整产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningOutcome {
    /// 决定的查验状态
    pub check_status: CheckStatus,
    /// 命中的词规则 id（词规则匹配器与形态学匹配器的合并，按规则身份去重）
    pub word_rule_ids: Vec<i64>,
    /// 存活命中的编码前缀规则 id
    pub prefix_rule_ids: Vec<i64>,
}

// ==========================================
// ScreeningEngine - 筛查决策引擎
// ==========================================
pub struct ScreeningEngine;

impl ScreeningEngine {
    /// 对单个包裹执行筛查决策
    ///
    /// # 参数
    /// - parcel: 待筛查包裹
    /// - matcher: 编译后的词规则匹配器
    /// - morphology: 已初始化的形态学匹配上下文
    /// - prefix_rules: 编码前缀规则集
    ///
    /// # 返回
    /// - Some(ScreeningOutcome): 筛查产物（状态 + 两组关联）
    /// - None: 合作方已标记，筛查整体跳过，包裹不做任何改动
    pub fn screen(
        parcel: &Parcel,
        matcher: &WordRuleMatcher,
        morphology: &dyn MorphologyContext,
        prefix_rules: &[CodePrefixRule],
    ) -> Option<ScreeningOutcome> {
        if parcel.check_status() == Some(CheckStatus::MarkedByPartner) {
            return None;
        }

        // 词规则 + 形态学: 对品名文本求命中并集（按规则 id 去重）
        let text = parcel.product_name.as_deref().unwrap_or("");
        let mut word_ids: HashSet<i64> = matcher.matching_word_ids(text);
        word_ids.extend(morphology.check_text(text));

        let mut word_rule_ids: Vec<i64> = word_ids.into_iter().collect();
        word_rule_ids.sort();

        // 编码分类
        let code = parcel.commodity_code_trimmed().unwrap_or("");
        let classification = CodeClassifier::classify(code, prefix_rules);

        // 格式非法: 状态短路，编码关联清空，词命中关联保留记录
        if classification.status == CodeClassificationStatus::InvalidFormat {
            return Some(ScreeningOutcome {
                check_status: CheckStatus::InvalidCodeFormat,
                word_rule_ids,
                prefix_rule_ids: Vec::new(),
            });
        }

        let mut prefix_rule_ids = classification.matched_rule_ids();
        prefix_rule_ids.sort();

        let check_status = if !word_rule_ids.is_empty() || !prefix_rule_ids.is_empty() {
            CheckStatus::HasIssues
        } else {
            CheckStatus::NoIssues
        };

        Some(ScreeningOutcome {
            check_status,
            word_rule_ids,
            prefix_rule_ids,
        })
    }
}
