// ==========================================
// 跨境包裹申报筛查系统 - 整册重筛任务管理器
// ==========================================
// 职责: 登记册级后台重筛任务的启动、进度跟踪、协同取消
// 红线: 同一登记册同时最多一个在途任务，重复启动返回既有任务句柄
// 依据: 逐包裹顺序处理；首个失败即终止任务并记录错误，已完成的结果保留
// ==========================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::i18n::t_with_args;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::service::screening_service::ScreeningService;

// ==========================================
// JobProgress - 任务进度（线程间共享）
// ==========================================
/// 在途任务的共享进度记录
///
/// 工作线程写、查询方读；计数用原子量，错误文本用互斥锁
pub struct JobProgress {
    job_id: String,
    register_id: i64,
    started_at: String,
    processed: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
    cancelled: AtomicBool,
    error: Mutex<Option<String>>,
}

impl JobProgress {
    fn new(register_id: i64) -> Self {
        JobProgress {
            job_id: Uuid::new_v4().to_string(),
            register_id,
            started_at: Utc::now().to_rfc3339(),
            processed: AtomicU64::new(0),
            total: AtomicU64::new(0),
            finished: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// 当前进度快照（可序列化，供外层查询接口直接返回）
    pub fn snapshot(&self) -> JobSnapshot {
        let error = match self.error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        JobSnapshot {
            job_id: self.job_id.clone(),
            register_id: self.register_id,
            started_at: self.started_at.clone(),
            processed: self.processed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            finished: self.finished.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
            error,
        }
    }

    fn set_error(&self, message: String) {
        match self.error.lock() {
            Ok(mut guard) => *guard = Some(message),
            Err(poisoned) => *poisoned.into_inner() = Some(message),
        }
    }
}

/// 任务进度快照
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub register_id: i64,
    pub started_at: String,
    pub processed: u64,
    pub total: u64,
    pub finished: bool,
    pub cancelled: bool,
    pub error: Option<String>,
}

/// 启动结果: 新任务或在途任务的既有句柄
pub struct JobStart {
    pub handle: Arc<JobProgress>,
    /// false 表示同册任务已在途，返回的是既有句柄
    pub newly_started: bool,
}

// ==========================================
// RescreenJobManager - 重筛任务管理器
// ==========================================
pub struct RescreenJobManager {
    service: Arc<ScreeningService>,
    jobs: Mutex<HashMap<i64, Arc<JobProgress>>>,
    threads: Mutex<HashMap<i64, JoinHandle<()>>>,
}

impl RescreenJobManager {
    pub fn new(service: Arc<ScreeningService>) -> Self {
        RescreenJobManager {
            service,
            jobs: Mutex::new(HashMap::new()),
            threads: Mutex::new(HashMap::new()),
        }
    }

    fn lock_jobs(&self) -> RepositoryResult<std::sync::MutexGuard<'_, HashMap<i64, Arc<JobProgress>>>> {
        self.jobs
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 启动登记册重筛任务
    ///
    /// # 返回
    /// - newly_started=true: 新任务已在后台线程启动
    /// - newly_started=false: 同册任务在途，返回其句柄，不启动新任务
    pub fn start(&self, register_id: i64) -> RepositoryResult<JobStart> {
        let mut jobs = self.lock_jobs()?;
        if let Some(existing) = jobs.get(&register_id) {
            if !existing.is_finished() {
                tracing::info!(
                    register_id,
                    job_id = existing.job_id(),
                    "{}",
                    t_with_args("screening.job_in_flight", &[("register_id", &register_id.to_string())])
                );
                return Ok(JobStart {
                    handle: existing.clone(),
                    newly_started: false,
                });
            }
        }

        let progress = Arc::new(JobProgress::new(register_id));
        jobs.insert(register_id, progress.clone());
        drop(jobs);

        let service = self.service.clone();
        let worker_progress = progress.clone();
        let handle = std::thread::spawn(move || {
            if let Err(e) = Self::run_job(&service, &worker_progress) {
                tracing::error!(
                    register_id = worker_progress.register_id,
                    job_id = worker_progress.job_id(),
                    error = %e,
                    "重筛任务失败"
                );
                worker_progress.set_error(e.to_string());
            }
            worker_progress.finished.store(true, Ordering::SeqCst);
        });

        match self.threads.lock() {
            Ok(mut threads) => {
                // 旧句柄对应的任务必然已结束（在途任务在上方已拦截），
                // 替换前回收旧线程，不让已结束线程悬挂到下次 wait
                if let Some(previous) = threads.insert(register_id, handle) {
                    previous
                        .join()
                        .map_err(|_| RepositoryError::InternalError("重筛线程异常退出".to_string()))?;
                }
            }
            Err(e) => return Err(RepositoryError::LockError(e.to_string())),
        }

        tracing::info!(register_id, job_id = progress.job_id(), "重筛任务已启动");
        Ok(JobStart {
            handle: progress,
            newly_started: true,
        })
    }

    fn run_job(service: &ScreeningService, progress: &JobProgress) -> RepositoryResult<()> {
        let ids = service.register_parcel_ids(progress.register_id)?;
        progress.total.store(ids.len() as u64, Ordering::SeqCst);

        let rules = service.prepare_rules()?;
        let log_every = service.progress_log_cadence().max(1);

        for parcel_id in ids {
            if progress.is_cancelled() {
                tracing::info!(
                    register_id = progress.register_id,
                    job_id = progress.job_id(),
                    processed = progress.processed.load(Ordering::SeqCst),
                    "重筛任务已取消"
                );
                return Ok(());
            }

            service.screen_parcel_with(parcel_id, &rules)?;
            let done = progress.processed.fetch_add(1, Ordering::SeqCst) + 1;
            if done % log_every == 0 {
                tracing::info!(
                    register_id = progress.register_id,
                    processed = done,
                    total = progress.total.load(Ordering::SeqCst),
                    "重筛进度"
                );
            }
        }

        tracing::info!(
            register_id = progress.register_id,
            job_id = progress.job_id(),
            processed = progress.processed.load(Ordering::SeqCst),
            "重筛任务完成"
        );
        Ok(())
    }

    /// 查询登记册最近一次任务的进度快照（含已完成任务）
    pub fn progress(&self, register_id: i64) -> RepositoryResult<Option<JobSnapshot>> {
        let jobs = self.lock_jobs()?;
        Ok(jobs.get(&register_id).map(|p| p.snapshot()))
    }

    /// 请求取消在途任务
    ///
    /// # 返回
    /// - true: 存在在途任务，已置取消标志（工作线程在包裹间检查并退出）
    /// - false: 无在途任务
    pub fn cancel(&self, register_id: i64) -> RepositoryResult<bool> {
        let jobs = self.lock_jobs()?;
        match jobs.get(&register_id) {
            Some(p) if !p.is_finished() => {
                p.cancelled.store(true, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// 等待任务线程结束（测试与优雅退出用）
    pub fn wait(&self, register_id: i64) -> RepositoryResult<()> {
        let handle = match self.threads.lock() {
            Ok(mut threads) => threads.remove(&register_id),
            Err(e) => return Err(RepositoryError::LockError(e.to_string())),
        };
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| RepositoryError::InternalError("重筛线程异常退出".to_string()))?;
        }
        Ok(())
    }
}
