// ==========================================
// 跨境包裹申报筛查系统 - 服务层
// ==========================================
// 职责: 流程编排（装配 Engine 与 Repository，管理后台任务）
// ==========================================

pub mod rescreen_job;
pub mod screening_service;

pub use rescreen_job::{JobSnapshot, JobStart, RescreenJobManager};
pub use screening_service::{PreparedRules, ScreeningService};
