// ==========================================
// 跨境包裹申报筛查系统 - 匹配优先级引擎
// ==========================================
// 职责: 由"命中关键词的编码关联 + 包裹自报编码 + 编码目录成员"
//       计算整数优先级档位（越小匹配越好，"最佳匹配优先"按升序）
// 红线: 8 档与 6 档两种视图必须出自同一次计算，禁止两套代码路径
// ==========================================

use std::collections::HashSet;
use std::fmt;

// ==========================================
// MatchRank - 8 档匹配优先级
// ==========================================
/// 匹配优先级档位（完整 8 档形式）
///
/// 档位 1/2 不按目录成员细分（按现行语义实现；
/// 是否细分属于待与原系统确认的悬而未决项，见 DESIGN.md）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRank {
    /// 1: 关键词关联唯一编码，且等于自报编码
    SingleCodeMatched,
    /// 2: 关键词关联多个编码，自报编码在其中
    MultiCodeMatched,
    /// 3: 关联唯一编码但不等于自报编码，自报编码在目录
    SingleCodeMismatchInCatalogue,
    /// 4: 关联多个编码且自报编码均不在其中，自报编码在目录
    MultiCodeMismatchInCatalogue,
    /// 5: 关联唯一编码但不等于自报编码，自报编码不在目录
    SingleCodeMismatchUnknown,
    /// 6: 关联多个编码且自报编码均不在其中，自报编码不在目录
    MultiCodeMismatchUnknown,
    /// 7: 无关键词编码关联，自报编码在目录
    NoKeywordsInCatalogue,
    /// 8: 无关键词编码关联，自报编码不在目录
    NoKeywordsUnknown,
}

impl MatchRank {
    /// 档位整数值（排序键，升序为"最佳匹配优先"）
    pub fn tier(&self) -> i64 {
        match self {
            MatchRank::SingleCodeMatched => 1,
            MatchRank::MultiCodeMatched => 2,
            MatchRank::SingleCodeMismatchInCatalogue => 3,
            MatchRank::MultiCodeMismatchInCatalogue => 4,
            MatchRank::SingleCodeMismatchUnknown => 5,
            MatchRank::MultiCodeMismatchUnknown => 6,
            MatchRank::NoKeywordsInCatalogue => 7,
            MatchRank::NoKeywordsUnknown => 8,
        }
    }

    /// 6 档展示视图: 合并 {3,5} 与 {4,6}
    ///
    /// 同一次计算的投影，外部"最佳匹配"排序展示用
    pub fn display_group(&self) -> MatchRankGroup {
        match self {
            MatchRank::SingleCodeMatched => MatchRankGroup::SingleCodeMatched,
            MatchRank::MultiCodeMatched => MatchRankGroup::MultiCodeMatched,
            MatchRank::SingleCodeMismatchInCatalogue | MatchRank::SingleCodeMismatchUnknown => {
                MatchRankGroup::SingleCodeMismatch
            }
            MatchRank::MultiCodeMismatchInCatalogue | MatchRank::MultiCodeMismatchUnknown => {
                MatchRankGroup::MultiCodeMismatch
            }
            MatchRank::NoKeywordsInCatalogue => MatchRankGroup::NoKeywordsInCatalogue,
            MatchRank::NoKeywordsUnknown => MatchRankGroup::NoKeywordsUnknown,
        }
    }
}

impl fmt::Display for MatchRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tier())
    }
}

/// 6 档展示分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MatchRankGroup {
    SingleCodeMatched,     // 关键词唯一编码，已对上
    MultiCodeMatched,      // 关键词多编码，已对上
    SingleCodeMismatch,    // 关键词唯一编码，未对上
    MultiCodeMismatch,     // 关键词多编码，未对上
    NoKeywordsInCatalogue, // 无关键词，编码在目录
    NoKeywordsUnknown,     // 无关键词，编码不在目录
}

// ==========================================
// MatchRankCalculator - 匹配优先级引擎
// ==========================================
pub struct MatchRankCalculator;

impl MatchRankCalculator {
    /// 计算包裹的匹配优先级档位
    ///
    /// # 参数
    /// - commodity_code: 包裹自报编码（空白视为未申报）
    /// - linked_codes: 包裹全部命中词规则所关联编码的并集输入
    ///   （无任何关联时为空，落入第 7/8 档）
    /// - in_catalogue: 编码目录成员判断
    ///
    /// # 说明
    /// 未申报编码视为"不在目录"且不等于任何关联编码
    pub fn rank<F>(commodity_code: Option<&str>, linked_codes: &[String], in_catalogue: F) -> MatchRank
    where
        F: Fn(&str) -> bool,
    {
        let own_code = commodity_code.map(str::trim).filter(|s| !s.is_empty());

        let union: HashSet<&str> = linked_codes.iter().map(|s| s.as_str()).collect();
        let own_in_catalogue = own_code.map(&in_catalogue).unwrap_or(false);

        if union.is_empty() {
            return if own_in_catalogue {
                MatchRank::NoKeywordsInCatalogue
            } else {
                MatchRank::NoKeywordsUnknown
            };
        }

        let own_in_union = own_code.map(|c| union.contains(c)).unwrap_or(false);

        if union.len() == 1 {
            if own_in_union {
                MatchRank::SingleCodeMatched
            } else if own_in_catalogue {
                MatchRank::SingleCodeMismatchInCatalogue
            } else {
                MatchRank::SingleCodeMismatchUnknown
            }
        } else if own_in_union {
            MatchRank::MultiCodeMatched
        } else if own_in_catalogue {
            MatchRank::MultiCodeMismatchInCatalogue
        } else {
            MatchRank::MultiCodeMismatchUnknown
        }
    }
}
