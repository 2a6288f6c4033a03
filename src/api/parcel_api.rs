// ==========================================
// 跨境包裹申报筛查系统 - 包裹分页 API
// ==========================================
// 职责: 键集游标分页查询（nextParcel）与匹配优先级诊断（matchPriority）
// 红线: Engine 不拼 SQL: 候选集由仓储层按过滤条件取回，
//       排序与锚定在内存中由 CursorResolver 单趟完成
// 依据: 游标行按 id 直查、无视过滤条件；不适用的排序字段返回 None 而非报错
// ==========================================

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::parcel::{Parcel, ParcelFilters};
use crate::domain::types::{ParcelKind, SortField, SortOrder};
use crate::engine::cursor::{CursorAnchor, CursorResolver, SortKey};
use crate::engine::match_rank::{MatchRank, MatchRankCalculator};
use crate::repository::{CodeRuleRepository, ParcelRepository};

// ==========================================
// MatchPriorityView - 匹配优先级诊断视图
// ==========================================
/// 单包裹匹配优先级的完整视图（8 档 + 6 档展示分组，出自同一次计算）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPriorityView {
    pub parcel_id: i64,
    pub tier: i64,
    pub display_group: String,
}

// ==========================================
// ParcelApi - 包裹分页 API
// ==========================================
pub struct ParcelApi {
    parcel_repo: Arc<ParcelRepository>,
    code_rule_repo: Arc<CodeRuleRepository>,
}

impl ParcelApi {
    pub fn new(parcel_repo: Arc<ParcelRepository>, code_rule_repo: Arc<CodeRuleRepository>) -> Self {
        ParcelApi {
            parcel_repo,
            code_rule_repo,
        }
    }

    /// 键集游标分页: 返回全序中严格在游标之后的下一个合格包裹
    ///
    /// # 参数
    /// - kind: 包裹子类型（快递/邮政）
    /// - register_id: 登记册 id
    /// - filters: 过滤条件（全部可选，合取）
    /// - sort_field: 排序字段；子类型专属字段用于错误子类型时返回 None（非错误）
    /// - order: 排序方向（id 次级键同方向）
    /// - cursor_id: 游标包裹 id；不存在时等价于"首行之前"哨兵
    ///
    /// # 说明
    /// 游标包裹按 id 直查（仅要求子类型与登记册一致，无视过滤条件）:
    /// 被过滤掉的游标行仍以其真实排序位置锚定扫描
    pub fn next_parcel(
        &self,
        kind: ParcelKind,
        register_id: i64,
        filters: &ParcelFilters,
        sort_field: SortField,
        order: SortOrder,
        cursor_id: Option<i64>,
    ) -> ApiResult<Option<Parcel>> {
        if !sort_field.applies_to(kind) {
            debug!(?sort_field, kind = kind.to_db_str(), "排序字段不适用于子类型");
            return Ok(None);
        }

        let cursor_parcel = match cursor_id {
            Some(id) => self.parcel_repo.find_by_id(kind, register_id, id)?,
            None => None,
        };

        let candidates = self.parcel_repo.list_candidates(kind, register_id, filters)?;

        if sort_field == SortField::MatchPriority {
            return self.next_by_match_priority(kind, register_id, cursor_parcel, candidates, order);
        }

        let anchor = match &cursor_parcel {
            Some(p) => match CursorResolver::stored_sort_key(p, sort_field) {
                Some(key) => Some(CursorAnchor { key, id: p.id }),
                None => return Ok(None),
            },
            None => None,
        };

        let rows = candidates
            .into_iter()
            .filter_map(|p| CursorResolver::stored_sort_key(&p, sort_field).map(|key| (key, p.id, p)));

        Ok(CursorResolver::next_after(rows, anchor.as_ref(), order))
    }

    /// matchPriority 排序路径: 先为游标与全部候选物化派生排序键，再单趟选行
    fn next_by_match_priority(
        &self,
        kind: ParcelKind,
        register_id: i64,
        cursor_parcel: Option<Parcel>,
        candidates: Vec<Parcel>,
        order: SortOrder,
    ) -> ApiResult<Option<Parcel>> {
        // 整册命中词规则的编码关联，一次取回（含被过滤掉的游标行）
        let linked = self.parcel_repo.linked_codes_by_register(kind, register_id)?;

        // 目录成员一次性批查: 候选自报编码 + 游标自报编码
        let mut own_codes: Vec<String> = candidates
            .iter()
            .filter_map(|p| p.commodity_code_trimmed())
            .map(str::to_string)
            .collect();
        if let Some(code) = cursor_parcel.as_ref().and_then(|p| p.commodity_code_trimmed()) {
            own_codes.push(code.to_string());
        }
        let catalogue = self.code_rule_repo.catalogue_filter(&own_codes)?;

        let tier_of = |p: &Parcel| -> i64 {
            let codes = linked.get(&p.id).map(Vec::as_slice).unwrap_or(&[]);
            MatchRankCalculator::rank(p.commodity_code_trimmed(), codes, |c| catalogue.contains(c))
                .tier()
        };

        let anchor = cursor_parcel.as_ref().map(|p| CursorAnchor {
            key: SortKey::Int(tier_of(p)),
            id: p.id,
        });

        let rows = candidates.into_iter().map(|p| {
            let tier = tier_of(&p);
            (SortKey::Int(tier), p.id, p)
        });

        Ok(CursorResolver::next_after(rows, anchor.as_ref(), order))
    }

    /// 单包裹匹配优先级（独立暴露，诊断与核对用）
    pub fn match_priority(&self, parcel_id: i64) -> ApiResult<MatchPriorityView> {
        let rank = self.compute_rank(parcel_id)?;
        Ok(MatchPriorityView {
            parcel_id,
            tier: rank.tier(),
            display_group: format!("{:?}", rank.display_group()),
        })
    }

    fn compute_rank(&self, parcel_id: i64) -> ApiResult<MatchRank> {
        let parcel = self
            .parcel_repo
            .find_by_id_any(parcel_id)?
            .ok_or_else(|| ApiError::NotFound(format!("parcel (id={})", parcel_id)))?;

        let linked = self.parcel_repo.linked_codes_for_parcel(parcel_id)?;
        let own_in_catalogue = match parcel.commodity_code_trimmed() {
            Some(code) => self.code_rule_repo.catalogue_contains(code)?,
            None => false,
        };

        Ok(MatchRankCalculator::rank(
            parcel.commodity_code_trimmed(),
            &linked,
            |_| own_in_catalogue,
        ))
    }
}
