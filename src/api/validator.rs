// ==========================================
// 跨境包裹申报筛查系统 - 请求参数校验器
// ==========================================
// 职责: 分页请求参数的前置校验（排序字段/方向/子类型适用性）
// 说明: 解析器对不适用字段返回 None 而非报错；
//       需要区分"无更多行"与"参数错误"的调用方先经本校验器
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::{ParcelKind, SortField, SortOrder};

// ==========================================
// PageRequestValidator - 分页参数校验器
// ==========================================
pub struct PageRequestValidator;

impl PageRequestValidator {
    /// 校验排序字段名并解析
    ///
    /// # 返回
    /// - Ok(SortField): 字段名合法且适用于该包裹子类型
    /// - Err(InvalidSortField): 未知字段名
    /// - Err(SortFieldNotApplicable): 子类型专属字段用在了错误的子类型
    pub fn validate_sort_field(field: &str, kind: ParcelKind) -> ApiResult<SortField> {
        let sort_field = SortField::from_str(field)
            .ok_or_else(|| ApiError::InvalidSortField(field.to_string()))?;
        if !sort_field.applies_to(kind) {
            return Err(ApiError::SortFieldNotApplicable {
                field: field.to_string(),
                kind: kind.to_db_str().to_string(),
            });
        }
        Ok(sort_field)
    }

    /// 校验排序方向并解析
    pub fn validate_sort_order(order: &str) -> ApiResult<SortOrder> {
        SortOrder::from_str(order)
            .ok_or_else(|| ApiError::InvalidInput(format!("无效的排序方向: {}", order)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_field_valid_for_kind() {
        let field = PageRequestValidator::validate_sort_field("trackingCode", ParcelKind::Express);
        assert!(matches!(field, Ok(SortField::TrackingCode)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = PageRequestValidator::validate_sort_field("weight", ParcelKind::Express);
        assert!(matches!(err, Err(ApiError::InvalidSortField(_))));
    }

    #[test]
    fn test_subtype_field_on_wrong_kind_rejected() {
        let err = PageRequestValidator::validate_sort_field("trackingCode", ParcelKind::Postal);
        assert!(matches!(err, Err(ApiError::SortFieldNotApplicable { .. })));
    }

    #[test]
    fn test_sort_order_parse() {
        assert!(matches!(
            PageRequestValidator::validate_sort_order("desc"),
            Ok(SortOrder::Desc)
        ));
        assert!(PageRequestValidator::validate_sort_order("sideways").is_err());
    }
}
