// ==========================================
// 跨境包裹申报筛查系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供外层宿主（HTTP/命令）调用
// ==========================================

pub mod error;
pub mod parcel_api;
pub mod screening_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use parcel_api::{MatchPriorityView, ParcelApi};
pub use screening_api::{ScreenParcelResponse, ScreeningApi, StartRescreenResponse};
pub use validator::PageRequestValidator;
