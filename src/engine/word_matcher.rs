// ==========================================
// 跨境包裹申报筛查系统 - 词规则匹配引擎
// ==========================================
// 职责: 将词规则编译为三类匹配器并对自由文本求命中并集
// 规则: EXACT_SYMBOLS 子串包含 / EXACT_WORD 整词 / PHRASE 词组序列；
//       词形变化类型由外部形态学匹配器处理，本引擎跳过
// 红线: 规则文本按字面转义后进入正则，规则内容不得改变匹配语义
// ==========================================

use crate::domain::types::MatchType;
use crate::domain::word_rule::WordRule;
use regex::Regex;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 词边界字符类: 非字母/数字/下划线且非连字符
/// （连字符视为词内字符，"T-34" 是一个词）
const BOUNDARY_CLASS: &str = r"[^\w\-]";

// ==========================================
// WordRuleMatcher - 编译后的词规则匹配器
// ==========================================
/// 编译后的词规则匹配器
///
/// 编译是规则文本的纯函数；同一规则集内容应复用同一实例
/// （见 MatcherCache），禁止逐次文本检查时重编译
pub struct WordRuleMatcher {
    rules: Vec<WordRule>,
    /// 符号级匹配: （规则下标，小写化规则文本）
    exact_symbols: Vec<(usize, String)>,
    /// 整词匹配: （规则下标，边界锚定正则）
    exact_word: Vec<(usize, Regex)>,
    /// 词组匹配: （规则下标，词序正则）
    phrase: Vec<(usize, Regex)>,
}

impl WordRuleMatcher {
    /// 编译词规则列表
    ///
    /// # 说明
    /// - 空白规则文本静默跳过（不可用条目，非错误）
    /// - 词形变化类型静默跳过（外部匹配器负责）
    /// - 词组拆分后无词元的规则静默跳过（畸形规则不使批处理失败）
    pub fn compile(rules: Vec<WordRule>) -> Self {
        let mut exact_symbols = Vec::new();
        let mut exact_word = Vec::new();
        let mut phrase = Vec::new();

        for (idx, rule) in rules.iter().enumerate() {
            if !rule.has_usable_word() {
                continue;
            }
            let word = rule.word.trim();

            match rule.match_type {
                MatchType::ExactSymbols => {
                    exact_symbols.push((idx, word.to_lowercase()));
                }
                MatchType::ExactWord => {
                    if let Some(re) = build_exact_word_pattern(word) {
                        exact_word.push((idx, re));
                    }
                }
                MatchType::Phrase => {
                    if let Some(re) = build_phrase_pattern(word) {
                        phrase.push((idx, re));
                    } else {
                        tracing::debug!("词组规则拆分后无词元,跳过: id={}", rule.id);
                    }
                }
                MatchType::WeakMorphology | MatchType::StrongMorphology => {}
            }
        }

        Self {
            rules,
            exact_symbols,
            exact_word,
            phrase,
        }
    }

    /// 对文本求命中规则集（三类策略的并集，按规则去重）
    pub fn matching_words(&self, text: &str) -> Vec<&WordRule> {
        let lowered = text.to_lowercase();
        let mut matched_idx: HashSet<usize> = HashSet::new();

        for (idx, needle) in &self.exact_symbols {
            if lowered.contains(needle.as_str()) {
                matched_idx.insert(*idx);
            }
        }
        for (idx, re) in &self.exact_word {
            if re.is_match(text) {
                matched_idx.insert(*idx);
            }
        }
        for (idx, re) in &self.phrase {
            if re.is_match(text) {
                matched_idx.insert(*idx);
            }
        }

        let mut matched: Vec<&WordRule> = matched_idx.into_iter().map(|i| &self.rules[i]).collect();
        matched.sort_by_key(|r| r.id);
        matched
    }

    /// 命中规则 id 集（供与形态学匹配结果按规则身份合并去重）
    pub fn matching_word_ids(&self, text: &str) -> HashSet<i64> {
        self.matching_words(text).iter().map(|r| r.id).collect()
    }

    /// 编译进匹配器的规则总数（含未产生条目的规则）
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// 词形变化类型规则的（id，词）列表（供初始化外部形态学上下文）
    pub fn morphology_words(&self) -> Vec<(i64, String)> {
        self.rules
            .iter()
            .filter(|r| r.match_type.is_morphology() && r.has_usable_word())
            .map(|r| (r.id, r.word.clone()))
            .collect()
    }
}

/// 整词匹配正则: 词两侧锚定在文本首尾或边界字符
fn build_exact_word_pattern(word: &str) -> Option<Regex> {
    let pattern = format!(
        r"(?i)(?:^|{b}){w}(?:{b}|$)",
        b = BOUNDARY_CLASS,
        w = regex::escape(word)
    );
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("整词规则编译失败,跳过: word={:?}, error={}", word, e);
            None
        }
    }
}

/// 词组匹配正则: 按边界字符拆词元，重建"词元按序，中间一个或多个边界字符"的模式
fn build_phrase_pattern(text: &str) -> Option<Regex> {
    let splitter = Regex::new(&format!("{}+", BOUNDARY_CLASS)).ok()?;
    let tokens: Vec<&str> = splitter.split(text).filter(|t| !t.is_empty()).collect();
    if tokens.is_empty() {
        return None;
    }

    let body = tokens
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join(&format!("{}+", BOUNDARY_CLASS));
    let pattern = format!(
        r"(?i)(?:^|{b}){body}(?:{b}|$)",
        b = BOUNDARY_CLASS,
        body = body
    );

    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("词组规则编译失败,跳过: text={:?}, error={}", text, e);
            None
        }
    }
}

// ==========================================
// MatcherCache - 按规则集指纹缓存编译结果
// ==========================================
/// 匹配器缓存
///
/// 以规则集内容指纹为键；指纹不变时复用编译结果，
/// 指纹变化时重新加载并编译
pub struct MatcherCache {
    slot: Mutex<Option<(u64, Arc<WordRuleMatcher>)>>,
}

impl MatcherCache {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// 取缓存的匹配器，指纹不匹配时经 load 重新加载并编译
    pub fn get_or_compile<E, F>(
        &self,
        generation: u64,
        load: F,
    ) -> Result<Arc<WordRuleMatcher>, E>
    where
        F: FnOnce() -> Result<Vec<WordRule>, E>,
    {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some((cached_generation, matcher)) = slot.as_ref() {
            if *cached_generation == generation {
                return Ok(Arc::clone(matcher));
            }
        }

        let matcher = Arc::new(WordRuleMatcher::compile(load()?));
        *slot = Some((generation, Arc::clone(&matcher)));
        Ok(matcher)
    }
}

impl Default for MatcherCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: i64, word: &str, match_type: MatchType) -> WordRule {
        WordRule::new(id, word, match_type)
    }

    fn matched_ids(matcher: &WordRuleMatcher, text: &str) -> Vec<i64> {
        let mut ids: Vec<i64> = matcher.matching_words(text).iter().map(|r| r.id).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_exact_symbols_substring_case_insensitive() {
        let matcher = WordRuleMatcher::compile(vec![rule(1, "Cat", MatchType::ExactSymbols)]);
        assert_eq!(matched_ids(&matcher, "CATEGORY list"), vec![1]);
        assert_eq!(matched_ids(&matcher, "education"), vec![1]);
        assert_eq!(matched_ids(&matcher, "dog"), Vec::<i64>::new());
    }

    #[test]
    fn test_exact_word_respects_boundaries() {
        let matcher = WordRuleMatcher::compile(vec![rule(1, "cat", MatchType::ExactWord)]);
        // 严格子串不命中
        assert_eq!(matched_ids(&matcher, "category"), Vec::<i64>::new());
        assert_eq!(matched_ids(&matcher, "bobcat"), Vec::<i64>::new());
        // 文本首尾与标点相邻命中
        assert_eq!(matched_ids(&matcher, "cat"), vec![1]);
        assert_eq!(matched_ids(&matcher, "a cat!"), vec![1]);
        assert_eq!(matched_ids(&matcher, "(CAT)"), vec![1]);
        assert_eq!(matched_ids(&matcher, "my cat sleeps"), vec![1]);
    }

    #[test]
    fn test_exact_word_hyphen_and_underscore_are_word_chars() {
        let matcher = WordRuleMatcher::compile(vec![rule(1, "cat", MatchType::ExactWord)]);
        // 连字符与下划线不是边界
        assert_eq!(matched_ids(&matcher, "cat-flap"), Vec::<i64>::new());
        assert_eq!(matched_ids(&matcher, "cat_flap"), Vec::<i64>::new());
    }

    #[test]
    fn test_exact_word_escapes_regex_metachars() {
        let matcher = WordRuleMatcher::compile(vec![rule(1, "c.t", MatchType::ExactWord)]);
        assert_eq!(matched_ids(&matcher, "a c.t here"), vec![1]);
        // 点是字面量，不是任意字符
        assert_eq!(matched_ids(&matcher, "a cat here"), Vec::<i64>::new());
    }

    #[test]
    fn test_phrase_token_sequence() {
        let matcher =
            WordRuleMatcher::compile(vec![rule(1, "power bank", MatchType::Phrase)]);
        assert_eq!(matched_ids(&matcher, "USB power bank 10Ah"), vec![1]);
        // 词元间允许一个或多个边界字符
        assert_eq!(matched_ids(&matcher, "power,  bank"), vec![1]);
        // 顺序颠倒不命中
        assert_eq!(matched_ids(&matcher, "bank power"), Vec::<i64>::new());
        // 词元作为更大词的子串不命中
        assert_eq!(matched_ids(&matcher, "powerful bank"), Vec::<i64>::new());
        assert_eq!(matched_ids(&matcher, "power banking"), Vec::<i64>::new());
    }

    #[test]
    fn test_phrase_rule_boundary_split_matches_punctuated_rule() {
        // 规则文本自身含标点: 拆为词元后与空格分隔的文本等价
        let matcher =
            WordRuleMatcher::compile(vec![rule(1, "power, bank", MatchType::Phrase)]);
        assert_eq!(matched_ids(&matcher, "power bank"), vec![1]);
    }

    #[test]
    fn test_malformed_rules_are_skipped_silently() {
        let matcher = WordRuleMatcher::compile(vec![
            rule(1, "", MatchType::ExactWord),
            rule(2, "   ", MatchType::ExactSymbols),
            rule(3, "!!! ...", MatchType::Phrase), // 拆分后无词元
            rule(4, "ok", MatchType::ExactWord),
        ]);
        assert_eq!(matched_ids(&matcher, "!!! ... ok"), vec![4]);
    }

    #[test]
    fn test_morphology_types_are_ignored_here() {
        let matcher = WordRuleMatcher::compile(vec![
            rule(1, "cat", MatchType::WeakMorphology),
            rule(2, "cat", MatchType::StrongMorphology),
        ]);
        assert_eq!(matched_ids(&matcher, "cat"), Vec::<i64>::new());
    }

    #[test]
    fn test_union_dedupes_by_rule_identity() {
        // 同一文本命中多个策略，各规则仍只出现一次
        let matcher = WordRuleMatcher::compile(vec![
            rule(1, "cat", MatchType::ExactSymbols),
            rule(2, "cat", MatchType::ExactWord),
            rule(3, "cat toy", MatchType::Phrase),
        ]);
        assert_eq!(matched_ids(&matcher, "cat toy"), vec![1, 2, 3]);
    }

    #[test]
    fn test_unicode_words() {
        let matcher = WordRuleMatcher::compile(vec![
            rule(1, "алкоголь", MatchType::ExactWord),
            rule(2, "酒精", MatchType::ExactSymbols),
        ]);
        assert_eq!(matched_ids(&matcher, "чистый АЛКОГОЛЬ, 95%"), vec![1]);
        assert_eq!(matched_ids(&matcher, "алкогольный"), Vec::<i64>::new());
        assert_eq!(matched_ids(&matcher, "医用酒精棉片"), vec![2]);
    }

    #[test]
    fn test_cache_reuses_until_generation_changes() {
        let cache = MatcherCache::new();
        let m1 = cache
            .get_or_compile(1, || {
                Ok::<_, ()>(vec![rule(10, "cat", MatchType::ExactWord)])
            })
            .unwrap();
        let m2 = cache
            .get_or_compile(1, || -> Result<Vec<WordRule>, ()> {
                panic!("指纹未变不应重新加载")
            })
            .unwrap();
        assert!(Arc::ptr_eq(&m1, &m2));

        let m3 = cache
            .get_or_compile(2, || {
                Ok::<_, ()>(vec![
                    rule(10, "cat", MatchType::ExactWord),
                    rule(11, "dog", MatchType::ExactWord),
                ])
            })
            .unwrap();
        assert!(!Arc::ptr_eq(&m1, &m3));
        assert_eq!(m3.rule_count(), 2);
    }
}
