// ==========================================
// 跨境包裹申报筛查系统 - 键集游标解析引擎
// ==========================================
// 职责: 在（排序键，id）全序下单趟扫描，返回严格在锚点之后的第一行
// 规则: id 始终为次级键，方向与主键一致；
//       锚点来自"按 id 直查、无视过滤条件"的游标行，
//       被过滤掉的游标行仍以其真实排序位置锚定扫描
// 红线: 引擎不拼 SQL；候选集由仓储层按过滤条件取回
// ==========================================

use crate::domain::parcel::{Parcel, ParcelSubtype};
use crate::domain::types::{SortField, SortOrder};
use std::cmp::Ordering;

// ==========================================
// SortKey - 异构排序键
// ==========================================
/// 排序键值
///
/// 全序: Null < Int < Text（与 SQLite 的 NULL 排序一致，NULL 最小）；
/// 同一排序字段内实际只出现一种非 Null 变体
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Null,
    Int(i64),
    Text(String),
}

impl SortKey {
    fn variant_rank(&self) -> u8 {
        match self {
            SortKey::Null => 0,
            SortKey::Int(_) => 1,
            SortKey::Text(_) => 2,
        }
    }

    pub fn from_opt_text(value: Option<&str>) -> Self {
        match value {
            Some(s) => SortKey::Text(s.to_string()),
            None => SortKey::Null,
        }
    }
}

impl Ord for SortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Int(a), SortKey::Int(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => self.variant_rank().cmp(&other.variant_rank()),
        }
    }
}

impl PartialOrd for SortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ==========================================
// CursorAnchor - 扫描锚点
// ==========================================
/// 扫描锚点: 游标行的（排序键，id）
///
/// None 锚点表示"首行之前"哨兵（游标行不存在时），
/// 此时返回过滤排序后结果集的第一行
#[derive(Debug, Clone)]
pub struct CursorAnchor {
    pub key: SortKey,
    pub id: i64,
}

// ==========================================
// CursorResolver - 键集游标解析引擎
// ==========================================
pub struct CursorResolver;

impl CursorResolver {
    /// 单趟选出 (key, id) 全序下严格在锚点之后的第一行
    ///
    /// # 参数
    /// - candidates: 已过滤候选集的（排序键，行 id，行）三元组，顺序任意
    /// - anchor: 扫描锚点；None 表示"首行之前"
    /// - order: 排序方向（id 次级键同方向）
    ///
    /// # 说明
    /// 不物化整个有序结果集:一次遍历维护当前最优行
    pub fn next_after<T>(
        candidates: impl IntoIterator<Item = (SortKey, i64, T)>,
        anchor: Option<&CursorAnchor>,
        order: SortOrder,
    ) -> Option<T> {
        let mut best: Option<(SortKey, i64, T)> = None;

        for (key, id, row) in candidates {
            let after_anchor = match anchor {
                None => true,
                Some(a) => {
                    let cmp = (key.clone(), id).cmp(&(a.key.clone(), a.id));
                    match order {
                        SortOrder::Asc => cmp == Ordering::Greater,
                        SortOrder::Desc => cmp == Ordering::Less,
                    }
                }
            };
            if !after_anchor {
                continue;
            }

            let better = match &best {
                None => true,
                Some((best_key, best_id, _)) => {
                    let cmp = (&key, id).cmp(&(best_key, *best_id));
                    match order {
                        SortOrder::Asc => cmp == Ordering::Less,
                        SortOrder::Desc => cmp == Ordering::Greater,
                    }
                }
            };
            if better {
                best = Some((key, id, row));
            }
        }

        best.map(|(_, _, row)| row)
    }

    /// 提取存储字段的排序键
    ///
    /// # 返回
    /// - Some(SortKey): 字段适用于该包裹子类型
    /// - None: 子类型专属字段用在了错误的子类型，或为派生字段
    ///   （matchPriority 的键由调用方先行计算，不经本函数）
    pub fn stored_sort_key(parcel: &Parcel, field: SortField) -> Option<SortKey> {
        match field {
            SortField::Id => Some(SortKey::Int(parcel.id)),
            SortField::StatusId => Some(SortKey::Int(parcel.status_id)),
            SortField::CheckStatusId => Some(SortKey::Int(parcel.check_status_id)),
            SortField::CommodityCode => {
                Some(SortKey::from_opt_text(parcel.commodity_code.as_deref()))
            }
            SortField::TrackingCode => match &parcel.subtype {
                ParcelSubtype::Express { tracking_code } => {
                    Some(SortKey::from_opt_text(tracking_code.as_deref()))
                }
                ParcelSubtype::Postal { .. } => None,
            },
            SortField::PostingNumber => match &parcel.subtype {
                ParcelSubtype::Postal { posting_number } => {
                    Some(SortKey::from_opt_text(posting_number.as_deref()))
                }
                ParcelSubtype::Express { .. } => None,
            },
            SortField::MatchPriority => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(key: i64, id: i64) -> (SortKey, i64, i64) {
        (SortKey::Int(key), id, id)
    }

    #[test]
    fn test_sort_key_total_order() {
        assert!(SortKey::Null < SortKey::Int(i64::MIN));
        assert!(SortKey::Int(1) < SortKey::Int(2));
        assert!(SortKey::Text("a".into()) < SortKey::Text("b".into()));
        assert!(SortKey::Int(i64::MAX) < SortKey::Text("".into()));
    }

    #[test]
    fn test_no_anchor_returns_first_row() {
        let rows = vec![row(5, 50), row(1, 10), row(3, 30)];
        assert_eq!(
            CursorResolver::next_after(rows.clone(), None, SortOrder::Asc),
            Some(10)
        );
        assert_eq!(
            CursorResolver::next_after(rows, None, SortOrder::Desc),
            Some(50)
        );
    }

    #[test]
    fn test_strictly_after_anchor() {
        let rows = vec![row(1, 10), row(2, 20), row(3, 30)];
        let anchor = CursorAnchor {
            key: SortKey::Int(2),
            id: 20,
        };
        // 锚点行自身不返回
        assert_eq!(
            CursorResolver::next_after(rows.clone(), Some(&anchor), SortOrder::Asc),
            Some(30)
        );
        assert_eq!(
            CursorResolver::next_after(rows, Some(&anchor), SortOrder::Desc),
            Some(10)
        );
    }

    #[test]
    fn test_id_breaks_ties_in_sort_direction() {
        // 三行同键，按 id 次级排序
        let rows = vec![row(7, 10), row(7, 20), row(7, 30)];
        let anchor = CursorAnchor {
            key: SortKey::Int(7),
            id: 20,
        };
        assert_eq!(
            CursorResolver::next_after(rows.clone(), Some(&anchor), SortOrder::Asc),
            Some(30)
        );
        assert_eq!(
            CursorResolver::next_after(rows, Some(&anchor), SortOrder::Desc),
            Some(10)
        );
    }

    #[test]
    fn test_exhausted_returns_none() {
        let rows = vec![row(1, 10), row(2, 20)];
        let anchor = CursorAnchor {
            key: SortKey::Int(2),
            id: 20,
        };
        assert_eq!(
            CursorResolver::next_after(rows, Some(&anchor), SortOrder::Asc),
            None
        );
    }

    #[test]
    fn test_anchor_outside_candidate_set_still_anchors() {
        // 锚点行不在候选集中（被过滤掉），仍按其键值定位
        let rows = vec![row(1, 10), row(3, 30)];
        let anchor = CursorAnchor {
            key: SortKey::Int(2),
            id: 20,
        };
        assert_eq!(
            CursorResolver::next_after(rows.clone(), Some(&anchor), SortOrder::Asc),
            Some(30)
        );
        assert_eq!(
            CursorResolver::next_after(rows, Some(&anchor), SortOrder::Desc),
            Some(10)
        );
    }

    #[test]
    fn test_null_keys_sort_first_ascending() {
        let rows = vec![
            (SortKey::Null, 10, 10),
            (SortKey::Text("A".into()), 20, 20),
        ];
        assert_eq!(
            CursorResolver::next_after(rows.clone(), None, SortOrder::Asc),
            Some(10)
        );
        let anchor = CursorAnchor {
            key: SortKey::Null,
            id: 10,
        };
        assert_eq!(
            CursorResolver::next_after(rows, Some(&anchor), SortOrder::Asc),
            Some(20)
        );
    }

    #[test]
    fn test_single_pass_enumeration_has_no_gaps_or_duplicates() {
        // 反复以上一次返回行为新锚点，应恰好枚举全集一次后终止
        let rows = vec![row(2, 20), row(1, 10), row(2, 25), row(9, 90)];
        let mut anchor: Option<CursorAnchor> = None;
        let mut seen = Vec::new();
        loop {
            let next = CursorResolver::next_after(rows.clone(), anchor.as_ref(), SortOrder::Asc);
            match next {
                Some(id) => {
                    let key = rows.iter().find(|(_, rid, _)| *rid == id).unwrap().0.clone();
                    anchor = Some(CursorAnchor { key, id });
                    seen.push(id);
                }
                None => break,
            }
        }
        assert_eq!(seen, vec![10, 20, 25, 90]);
    }
}
