// ==========================================
// 跨境包裹申报筛查系统 - 筛查 API
// ==========================================
// 职责: 单包裹筛查与整册后台重筛任务的对外接口
// 依据: 同册重复启动返回在途任务句柄；取消为包裹间协同检查
// ==========================================

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::service::rescreen_job::{JobSnapshot, RescreenJobManager};
use crate::service::screening_service::ScreeningService;

// ==========================================
// ScreenParcelResponse - 单包裹筛查结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenParcelResponse {
    pub parcel_id: i64,
    /// false 表示包裹为合作方已标记，筛查整体跳过
    pub screened: bool,
    pub check_status_id: Option<i64>,
    pub matched_word_rule_ids: Vec<i64>,
    pub matched_prefix_rule_ids: Vec<i64>,
}

/// 整册重筛启动结果
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRescreenResponse {
    pub job_id: String,
    /// false 表示同册任务已在途，返回的是既有任务
    pub newly_started: bool,
}

// ==========================================
// ScreeningApi - 筛查 API
// ==========================================
pub struct ScreeningApi {
    service: Arc<ScreeningService>,
    jobs: Arc<RescreenJobManager>,
}

impl ScreeningApi {
    pub fn new(service: Arc<ScreeningService>, jobs: Arc<RescreenJobManager>) -> Self {
        ScreeningApi { service, jobs }
    }

    /// 对单个包裹执行筛查并落库
    pub fn screen_parcel(&self, parcel_id: i64) -> ApiResult<ScreenParcelResponse> {
        match self.service.screen_parcel(parcel_id)? {
            Some(outcome) => Ok(ScreenParcelResponse {
                parcel_id,
                screened: true,
                check_status_id: Some(outcome.check_status.id()),
                matched_word_rule_ids: outcome.word_rule_ids,
                matched_prefix_rule_ids: outcome.prefix_rule_ids,
            }),
            None => Ok(ScreenParcelResponse {
                parcel_id,
                screened: false,
                check_status_id: None,
                matched_word_rule_ids: Vec::new(),
                matched_prefix_rule_ids: Vec::new(),
            }),
        }
    }

    /// 启动（或复用在途的）整册后台重筛任务
    pub fn start_rescreen(&self, register_id: i64) -> ApiResult<StartRescreenResponse> {
        let start = self.jobs.start(register_id)?;
        info!(
            register_id,
            job_id = start.handle.job_id(),
            newly_started = start.newly_started,
            "整册重筛请求受理"
        );
        Ok(StartRescreenResponse {
            job_id: start.handle.job_id().to_string(),
            newly_started: start.newly_started,
        })
    }

    /// 查询登记册最近一次重筛任务的进度
    pub fn rescreen_progress(&self, register_id: i64) -> ApiResult<JobSnapshot> {
        self.jobs
            .progress(register_id)?
            .ok_or_else(|| ApiError::NotFound(format!("rescreen job (register_id={})", register_id)))
    }

    /// 请求取消在途重筛任务
    ///
    /// # 返回
    /// - true: 已置取消标志
    /// - false: 无在途任务
    pub fn cancel_rescreen(&self, register_id: i64) -> ApiResult<bool> {
        Ok(self.jobs.cancel(register_id)?)
    }
}
