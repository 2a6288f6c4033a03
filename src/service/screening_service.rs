// ==========================================
// 跨境包裹申报筛查系统 - 筛查服务
// ==========================================
// 职责: 组织单包裹筛查全流程（装载规则 -> 编译匹配器 -> 决策 -> 事务落库）
// 红线: 决策逻辑全部在 Engine 层；本层只做装配与持久化编排
// 依据: 命中规则并集按规则身份去重；格式非法时编码关联清空、词命中保留
// ==========================================

use std::sync::Arc;

use crate::config::ConfigManager;
use crate::domain::code_rule::CodePrefixRule;
use crate::engine::morphology::{MorphologyContext, MorphologyMatcher, NoOpMorphologyMatcher};
use crate::engine::screening::{ScreeningEngine, ScreeningOutcome};
use crate::engine::word_matcher::{MatcherCache, WordRuleMatcher};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{CodeRuleRepository, ParcelRepository, WordRuleRepository};

// ==========================================
// PreparedRules - 一次装载的规则快照
// ==========================================
/// 规则快照: 整批筛查前装载一次，批内所有包裹复用
///
/// # 说明
/// 形态学上下文初始化可能昂贵（外部匹配器），因此与编译后的
/// 词规则匹配器、前缀规则集一起按批准备，避免逐包裹重建
pub struct PreparedRules {
    pub matcher: Arc<WordRuleMatcher>,
    pub morphology: Box<dyn MorphologyContext>,
    pub prefix_rules: Vec<CodePrefixRule>,
}

// ==========================================
// ScreeningService - 筛查服务
// ==========================================
pub struct ScreeningService {
    parcel_repo: Arc<ParcelRepository>,
    word_rule_repo: Arc<WordRuleRepository>,
    code_rule_repo: Arc<CodeRuleRepository>,
    config: Arc<ConfigManager>,
    morphology: Arc<dyn MorphologyMatcher>,
    matcher_cache: MatcherCache,
}

impl ScreeningService {
    pub fn new(
        parcel_repo: Arc<ParcelRepository>,
        word_rule_repo: Arc<WordRuleRepository>,
        code_rule_repo: Arc<CodeRuleRepository>,
        config: Arc<ConfigManager>,
        morphology: Arc<dyn MorphologyMatcher>,
    ) -> Self {
        ScreeningService {
            parcel_repo,
            word_rule_repo,
            code_rule_repo,
            config,
            morphology,
            matcher_cache: MatcherCache::new(),
        }
    }

    /// 装载并编译当前规则集
    ///
    /// # 说明
    /// - 词规则匹配器经缓存复用: 规则集内容指纹未变则直接命中缓存
    /// - 形态学开关关闭时以空上下文替代，词形变化规则整体不参与
    pub fn prepare_rules(&self) -> RepositoryResult<PreparedRules> {
        let generation = self.word_rule_repo.rule_set_generation()?;
        let matcher = self
            .matcher_cache
            .get_or_compile(generation, || self.word_rule_repo.list_all())?;

        let morphology_enabled = self
            .config
            .morphology_enabled()
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        let morphology: Box<dyn MorphologyContext> = if morphology_enabled {
            self.morphology.initialize_context(&matcher.morphology_words())
        } else {
            NoOpMorphologyMatcher.initialize_context(&[])
        };

        let prefix_rules = self.code_rule_repo.list_prefix_rules()?;

        Ok(PreparedRules {
            matcher,
            morphology,
            prefix_rules,
        })
    }

    /// 对单个包裹执行筛查并落库
    ///
    /// # 返回
    /// - Some(outcome): 筛查已执行，状态与两组命中关联已在同一事务内替换
    /// - None: 包裹为合作方已标记，整体跳过，未做任何改动
    pub fn screen_parcel(&self, parcel_id: i64) -> RepositoryResult<Option<ScreeningOutcome>> {
        let rules = self.prepare_rules()?;
        self.screen_parcel_with(parcel_id, &rules)
    }

    /// 以既有规则快照对单个包裹执行筛查并落库（批量路径）
    pub fn screen_parcel_with(
        &self,
        parcel_id: i64,
        rules: &PreparedRules,
    ) -> RepositoryResult<Option<ScreeningOutcome>> {
        let parcel = self
            .parcel_repo
            .find_by_id_any(parcel_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "parcel".to_string(),
                id: parcel_id.to_string(),
            })?;

        let outcome = match ScreeningEngine::screen(
            &parcel,
            &rules.matcher,
            rules.morphology.as_ref(),
            &rules.prefix_rules,
        ) {
            Some(o) => o,
            None => {
                tracing::debug!(parcel_id, "合作方已标记,跳过筛查");
                return Ok(None);
            }
        };

        self.parcel_repo.apply_screening(
            parcel_id,
            outcome.check_status.id(),
            &outcome.word_rule_ids,
            &outcome.prefix_rule_ids,
        )?;

        Ok(Some(outcome))
    }

    /// 登记册内全部包裹 id（按 id 升序，供整册重筛遍历）
    pub fn register_parcel_ids(&self, register_id: i64) -> RepositoryResult<Vec<i64>> {
        self.parcel_repo.list_ids_by_register(register_id)
    }

    /// 重筛进度日志的上报间隔（每 N 个包裹记一条）
    pub fn progress_log_cadence(&self) -> u64 {
        self.config.progress_log_every().unwrap_or(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::db;
    use crate::domain::parcel::ParcelSubtype;
    use crate::domain::types::{CheckStatus, MatchType};
    use crate::domain::word_rule::WordRule;
    use rusqlite::Connection;

    fn setup_service() -> (ScreeningService, Arc<ParcelRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let conn = Arc::new(std::sync::Mutex::new(conn));
        let parcel_repo = Arc::new(ParcelRepository::from_connection(conn.clone()));
        let word_repo = Arc::new(WordRuleRepository::from_connection(conn.clone()));
        let code_repo = Arc::new(CodeRuleRepository::from_connection(conn.clone()));
        let config = Arc::new(ConfigManager::from_connection(conn).unwrap());
        let service = ScreeningService::new(
            parcel_repo.clone(),
            word_repo,
            code_repo,
            config,
            Arc::new(NoOpMorphologyMatcher),
        );
        (service, parcel_repo)
    }

    fn insert_parcel(repo: &ParcelRepository, product_name: &str, code: &str) -> i64 {
        let parcels = vec![crate::domain::parcel::Parcel {
            id: 101,
            register_id: 1,
            status_id: 1,
            check_status_id: CheckStatus::NotChecked.id(),
            commodity_code: Some(code.to_string()),
            product_name: Some(product_name.to_string()),
            subtype: ParcelSubtype::Express {
                tracking_code: Some("TRK001".to_string()),
            },
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }];
        repo.batch_insert(&parcels).unwrap();
        repo.list_ids_by_register(1).unwrap()[0]
    }

    #[test]
    fn test_screen_parcel_word_hit_persists_links_and_status() {
        let (service, parcel_repo) = setup_service();
        service
            .word_rule_repo
            .insert(&WordRule {
                id: 1,
                word: "knife".to_string(),
                match_type: MatchType::ExactWord,
            })
            .unwrap();
        let parcel_id = insert_parcel(&parcel_repo, "steel knife set", "1234567890");

        let outcome = service.screen_parcel(parcel_id).unwrap().unwrap();
        assert_eq!(outcome.check_status, CheckStatus::HasIssues);
        assert_eq!(outcome.word_rule_ids.len(), 1);

        let stored = parcel_repo.find_by_id_any(parcel_id).unwrap().unwrap();
        assert_eq!(stored.check_status_id, CheckStatus::HasIssues.id());
        assert_eq!(
            parcel_repo.matched_word_rule_ids(parcel_id).unwrap(),
            outcome.word_rule_ids
        );
    }

    #[test]
    fn test_screen_parcel_invalid_code_clears_prefix_links() {
        let (service, parcel_repo) = setup_service();
        let parcel_id = insert_parcel(&parcel_repo, "plain soap", "12AB");

        let outcome = service.screen_parcel(parcel_id).unwrap().unwrap();
        assert_eq!(outcome.check_status, CheckStatus::InvalidCodeFormat);
        assert!(outcome.prefix_rule_ids.is_empty());
        assert!(parcel_repo
            .matched_prefix_rule_ids(parcel_id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_screen_parcel_marked_by_partner_untouched() {
        let (service, parcel_repo) = setup_service();
        let parcel_id = insert_parcel(&parcel_repo, "anything", "1234567890");
        parcel_repo
            .update_check_status(parcel_id, CheckStatus::MarkedByPartner.id())
            .unwrap();

        assert!(service.screen_parcel(parcel_id).unwrap().is_none());
        let stored = parcel_repo.find_by_id_any(parcel_id).unwrap().unwrap();
        assert_eq!(stored.check_status_id, CheckStatus::MarkedByPartner.id());
    }

    #[test]
    fn test_screen_parcel_missing_is_not_found() {
        let (service, _) = setup_service();
        assert!(matches!(
            service.screen_parcel(9999),
            Err(RepositoryError::NotFound { .. })
        ));
    }
}
