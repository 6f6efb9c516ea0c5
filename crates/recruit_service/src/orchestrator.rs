//! Search orchestrator (C8, spec.md §4.8).
//!
//! Sequences the constraint expander (C3/C4) → query builder/executor (C5)
//! → record parser (C6) → utility calculator (C7) → constraint advisor
//! (C9, only below `advisorThreshold`), and separately drives the
//! similarity engine (C10) and critique engine (C11) over the same
//! in-memory graph store. One orchestrator instance is the process-wide
//! entry point the `server` crate calls into per request.

use std::sync::Arc;
use std::time::Instant;

use recruit_config::KnowledgeBaseConfig;
use recruit_graph::{EngineerGraphSource, MemoryGraphStore, SimilarityGraphs};
use recruit_types::{
    CritiqueAdjustment, CritiqueApplyResult, CritiqueSuggestion, DomainKind, Engineer, EngineerId,
    EngineerMatch, ExpandedCriteria, QueryMetadata, SearchRequest, SearchResponse, SimilarEngineer,
    SimilarityResponse,
};

use crate::advisor::{self, LlmClient};
use crate::critique;
use crate::error::{Result, ServiceError};
use crate::expander;
use crate::query_builder;
use crate::record_parser::{self, ParsedSkills};
use crate::score::{self, ScoreInputs};
use crate::similarity::{self, SimilarityProfile};

/// Owns the process-wide graph store, knowledge-base configuration, and the
/// cached similarity-graph snapshot; wires them through C3-C11 per request.
pub struct SearchOrchestrator {
    store: MemoryGraphStore,
    config: KnowledgeBaseConfig,
    similarity_graphs: SimilarityGraphs,
    llm: Option<Arc<dyn LlmClient>>,
}

impl SearchOrchestrator {
    pub fn new(store: MemoryGraphStore, config: KnowledgeBaseConfig) -> Self {
        let similarity_graphs = SimilarityGraphs::load(&store, config.similarity.correlation_threshold);
        Self {
            store,
            config,
            similarity_graphs,
            llm: None,
        }
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmClient>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    pub fn store(&self) -> &MemoryGraphStore {
        &self.store
    }

    /// Rebuilds the cached skill/domain correlation snapshot from the
    /// current store (SPEC_FULL.md §9 Open Question #1) — call after
    /// mutating `store()`, e.g. from a webhook or a timer.
    pub fn refresh_similarity_graphs(&self) {
        self.similarity_graphs
            .refresh(&self.store, self.config.similarity.correlation_threshold);
    }

    /// `POST /search/filter` (spec.md §4.8).
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        request.validate().map_err(ServiceError::Validation)?;
        let started = Instant::now();

        let criteria = expander::expand(request, &self.config, &self.store, &self.store).await;
        let plan = query_builder::build_filter_plan(&criteria);
        let (page, total_count) = query_builder::execute(&plan, &self.store).await;

        let mut matches = Vec::with_capacity(page.len());
        for engineer in &page {
            matches.push(self.build_match(&criteria, engineer).await);
        }
        sort_by_utility(&mut matches);

        let (advice, advisor_degraded) = if total_count < self.config.advisor.advisor_threshold {
            let outcome = advisor::advise(
                &criteria,
                total_count,
                &self.config.advisor,
                &self.config.seniority_table,
                &self.store,
                self.llm.as_deref(),
            )
            .await;
            (Some(outcome.advice), outcome.degraded)
        } else {
            (None, false)
        };

        Ok(SearchResponse {
            matches,
            total_count,
            applied_filters: criteria.applied_filters.clone(),
            applied_preferences: criteria.applied_preferences.clone(),
            defaults_applied: criteria.defaults_applied.clone(),
            derived_constraints: criteria.derived_constraints.clone(),
            overridden_rule_ids: criteria.overridden_rule_ids.iter().cloned().collect(),
            query_metadata: QueryMetadata {
                execution_time_ms: started.elapsed().as_millis() as u64,
                candidates_before_diversity: None,
                inference_warning: criteria.inference_warning,
                advisor_degraded,
            },
            advice,
        })
    }

    /// `POST /search/filter-similarity` (spec.md §6): runs the same filter
    /// pipeline as [`search`](Self::search), then re-ranks the *full*
    /// filtered candidate set by similarity to `reference_id` before
    /// paginating, rather than by the default qualifying-skill-count order.
    pub async fn filter_similarity(
        &self,
        request: &SearchRequest,
        reference_id: &EngineerId,
    ) -> Result<SearchResponse> {
        request.validate().map_err(ServiceError::Validation)?;
        let started = Instant::now();

        let reference_engineer = self
            .store
            .get_engineer(reference_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(reference_id.as_str().to_string()))?;

        let criteria = expander::expand(request, &self.config, &self.store, &self.store).await;
        let mut unpaginated_plan = query_builder::build_filter_plan(&criteria);
        unpaginated_plan.limit = u32::MAX;
        unpaginated_plan.offset = 0;
        let (filtered, total_count) = query_builder::execute(&unpaginated_plan, &self.store).await;

        let reference_skills = self.store.skills_for(reference_id).await;
        let reference_business = self.store.business_domains_for(reference_id).await;
        let reference_technical = self.store.technical_domains_for(reference_id).await;
        let reference_profile = SimilarityProfile {
            engineer: &reference_engineer,
            skills: &reference_skills,
            business_domains: &reference_business,
            technical_domains: &reference_technical,
        };
        let graphs = self.similarity_graphs.snapshot();

        let mut scored = Vec::with_capacity(filtered.len());
        for candidate in filtered.iter().filter(|e| &e.id != reference_id) {
            let skills = self.store.skills_for(&candidate.id).await;
            let business = self.store.business_domains_for(&candidate.id).await;
            let technical = self.store.technical_domains_for(&candidate.id).await;
            let profile = SimilarityProfile {
                engineer: candidate,
                skills: &skills,
                business_domains: &business,
                technical_domains: &technical,
            };
            let (similar_engineer, _) =
                similarity::score_candidate(&reference_profile, &profile, &graphs, &self.config.similarity);
            scored.push((similar_engineer, similarity::profile_skill_set(&skills)));
        }
        let candidates_before_diversity = scored.len();

        // Diversify over offset+limit slots, then drop the first `offset` —
        // diversify() alone only ever returns its first `limit` argument's
        // worth of candidates, so pagination has to ask for the whole prefix
        // up front rather than truncate-then-skip.
        let prefix_len = (criteria.offset as usize).saturating_add(criteria.limit as usize);
        let ranked = similarity::diversify(scored, prefix_len, self.config.similarity.diversity_lambda);
        let ranked_ids: Vec<&EngineerId> = ranked.iter().map(|s| &s.engineer).collect();
        let by_id: ahash::AHashMap<&EngineerId, &Engineer> =
            filtered.iter().map(|e| (&e.id, e)).collect();

        let mut matches = Vec::with_capacity(ranked_ids.len());
        for id in ranked_ids.into_iter().skip(criteria.offset as usize) {
            if let Some(engineer) = by_id.get(id).copied() {
                matches.push(self.build_match(&criteria, engineer).await);
            }
        }

        let (advice, advisor_degraded) = if total_count < self.config.advisor.advisor_threshold {
            let outcome = advisor::advise(
                &criteria,
                total_count,
                &self.config.advisor,
                &self.config.seniority_table,
                &self.store,
                self.llm.as_deref(),
            )
            .await;
            (Some(outcome.advice), outcome.degraded)
        } else {
            (None, false)
        };

        Ok(SearchResponse {
            matches,
            total_count,
            applied_filters: criteria.applied_filters.clone(),
            applied_preferences: criteria.applied_preferences.clone(),
            defaults_applied: criteria.defaults_applied.clone(),
            derived_constraints: criteria.derived_constraints.clone(),
            overridden_rule_ids: criteria.overridden_rule_ids.iter().cloned().collect(),
            query_metadata: QueryMetadata {
                execution_time_ms: started.elapsed().as_millis() as u64,
                candidates_before_diversity: Some(candidates_before_diversity),
                inference_warning: criteria.inference_warning,
                advisor_degraded,
            },
            advice,
        })
    }

    /// `GET /engineers/:id/similar` (spec.md §4.10, §6).
    pub async fn similar(&self, reference_id: &EngineerId, limit: usize) -> Result<SimilarityResponse> {
        let started = Instant::now();
        let reference_engineer = self
            .store
            .get_engineer(reference_id)
            .await
            .ok_or_else(|| ServiceError::NotFound(reference_id.as_str().to_string()))?;

        let reference_skills = self.store.skills_for(reference_id).await;
        let reference_business = self.store.business_domains_for(reference_id).await;
        let reference_technical = self.store.technical_domains_for(reference_id).await;
        let reference_profile = SimilarityProfile {
            engineer: &reference_engineer,
            skills: &reference_skills,
            business_domains: &reference_business,
            technical_domains: &reference_technical,
        };

        let pool = self.store.all_engineers().await;
        let candidates = similarity::exclude_reference(&pool, reference_id);
        let graphs = self.similarity_graphs.snapshot();

        let mut scored: Vec<(SimilarEngineer, ahash::AHashSet<String>)> = Vec::with_capacity(candidates.len());
        for candidate in candidates.iter().copied() {
            let skills = self.store.skills_for(&candidate.id).await;
            let business = self.store.business_domains_for(&candidate.id).await;
            let technical = self.store.technical_domains_for(&candidate.id).await;
            let profile = SimilarityProfile {
                engineer: candidate,
                skills: &skills,
                business_domains: &business,
                technical_domains: &technical,
            };
            let (similar_engineer, _) =
                similarity::score_candidate(&reference_profile, &profile, &graphs, &self.config.similarity);
            scored.push((similar_engineer, similarity::profile_skill_set(&skills)));
        }

        let candidates_before_diversity = scored.len();
        let similar = similarity::diversify(scored, limit, self.config.similarity.diversity_lambda);

        Ok(SimilarityResponse {
            target: Some(reference_id.clone()),
            similar,
            query_metadata: QueryMetadata {
                execution_time_ms: started.elapsed().as_millis() as u64,
                candidates_before_diversity: Some(candidates_before_diversity),
                inference_warning: false,
                advisor_degraded: false,
            },
        })
    }

    /// Mines the critique engine's (C11) cross-property suggestions out of
    /// an already-computed result set.
    pub fn suggest_critiques(&self, results: &[EngineerMatch]) -> Vec<CritiqueSuggestion> {
        critique::generate_suggestions(results, &self.config.seniority_table)
    }

    /// Replays a suggestion's adjustments over a base request (C11).
    pub fn apply_critique(&self, base: &SearchRequest, adjustments: &[CritiqueAdjustment]) -> CritiqueApplyResult {
        critique::apply_adjustments(base, adjustments)
    }

    /// Runs C6/C7 for one already-filtered engineer: the shared tail of
    /// [`search`](Self::search) and [`filter_similarity`](Self::filter_similarity).
    async fn build_match(&self, criteria: &ExpandedCriteria, engineer: &Engineer) -> EngineerMatch {
        let skills = self.store.skills_for(&engineer.id).await;
        let business_edges = self.store.business_domains_for(&engineer.id).await;
        let technical_edges = self.store.technical_domains_for(&engineer.id).await;

        let parsed_skills: ParsedSkills =
            record_parser::parse_skills(criteria, &skills, self.config.utility.confidence_min);
        let matched_business_domains = record_parser::parse_domains(
            &criteria.resolved_required_business_domains,
            &criteria.resolved_preferred_business_domains,
            &business_edges,
            &self.store,
            DomainKind::Business,
        )
        .await;
        let matched_technical_domains = record_parser::parse_domains(
            &criteria.resolved_required_technical_domains,
            &criteria.resolved_preferred_technical_domains,
            &technical_edges,
            &self.store,
            DomainKind::Technical,
        )
        .await;

        let score_inputs = ScoreInputs {
            engineer,
            skills: &skills,
            parsed_skills: &parsed_skills,
            matched_business_domains: &matched_business_domains,
            matched_technical_domains: &matched_technical_domains,
        };
        let score_breakdown = score::score_engineer(criteria, &self.config.utility, &self.config.seniority_table, &score_inputs);

        EngineerMatch {
            engineer_id: engineer.id.clone(),
            name: engineer.name.clone(),
            headline: engineer.headline.clone(),
            years_experience: engineer.years_experience,
            timezone: engineer.timezone.clone(),
            salary: engineer.salary,
            start_timeline: engineer.start_timeline,
            matched_skills: parsed_skills.matched,
            unmatched_related_skills: parsed_skills.unmatched_related,
            matched_skill_count: parsed_skills.matched_skill_count,
            avg_confidence: parsed_skills.avg_confidence,
            matched_business_domains,
            matched_technical_domains,
            utility_score: score_breakdown.total,
            score_breakdown,
        }
    }
}

/// Final output order (spec.md §4.7): `utilityScore` descending, ties broken
/// by `yearsExperience` then `name` — distinct from the page's qualifying-
/// skill-count order the query builder uses only to pick *which* engineers
/// make the page (spec.md §4.5 step 5).
fn sort_by_utility(matches: &mut [EngineerMatch]) {
    matches.sort_by(|a, b| {
        b.utility_score
            .partial_cmp(&a.utility_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.years_experience.partial_cmp(&a.years_experience).unwrap_or(std::cmp::Ordering::Equal))
            .then_with(|| a.name.cmp(&b.name))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use recruit_types::{
        DomainId, DomainKind as Kind, DomainNode, Engineer as EngineerEntity, EngineerDomainEdge,
        EngineerSkillEdge, ProficiencyLevel, SkillId, SkillNode, StartTimeline,
    };

    fn engineer(id: &str, years: f64, salary: f64) -> EngineerEntity {
        EngineerEntity {
            id: EngineerId::new(id),
            name: id.to_string(),
            headline: "Backend engineer".to_string(),
            years_experience: years,
            timezone: "America/New_York".to_string(),
            salary,
            start_timeline: StartTimeline::Immediate,
            embedding: None,
        }
    }

    fn seeded_store() -> MemoryGraphStore {
        let mut store = MemoryGraphStore::new();
        store.add_skill(
            SkillNode {
                id: SkillId::new("skill_rust"),
                name: "Rust".to_string(),
                is_category: false,
            },
            None,
        );
        store.add_domain(
            DomainNode {
                id: DomainId::new("fintech"),
                name: "Fintech".to_string(),
                kind: Kind::Business,
            },
            None,
        );
        store.add_engineer(
            engineer("eng_ada", 8.0, 150_000.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_rust"),
                proficiency_level: ProficiencyLevel::Expert,
                confidence_score: 0.9,
                years_used: 5.0,
            }],
            vec![EngineerDomainEdge {
                domain_id: DomainId::new("fintech"),
                years: 4.0,
                source: None,
            }],
            vec![],
        );
        store.add_engineer(
            engineer("eng_grace", 3.0, 110_000.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_rust"),
                proficiency_level: ProficiencyLevel::Learning,
                confidence_score: 0.4,
                years_used: 0.5,
            }],
            vec![],
            vec![],
        );
        store
    }

    #[tokio::test]
    async fn empty_request_browses_every_engineer() {
        let orchestrator = SearchOrchestrator::new(seeded_store(), KnowledgeBaseConfig::default());
        let response = orchestrator.search(&SearchRequest::default()).await.unwrap();
        assert_eq!(response.total_count, 2);
        assert_eq!(response.matches.len(), 2);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_touching_the_graph() {
        let orchestrator = SearchOrchestrator::new(seeded_store(), KnowledgeBaseConfig::default());
        let request = SearchRequest {
            limit: Some(999),
            ..Default::default()
        };
        let err = orchestrator.search(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn low_total_count_triggers_advisor() {
        let mut config = KnowledgeBaseConfig::default();
        config.advisor.advisor_threshold = 10;
        let orchestrator = SearchOrchestrator::new(seeded_store(), config);
        let response = orchestrator.search(&SearchRequest::default()).await.unwrap();
        assert!(response.advice.is_some());
    }

    #[tokio::test]
    async fn similar_excludes_reference_and_respects_limit() {
        let orchestrator = SearchOrchestrator::new(seeded_store(), KnowledgeBaseConfig::default());
        let response = orchestrator
            .similar(&EngineerId::new("eng_ada"), 5)
            .await
            .unwrap();
        assert!(response.similar.iter().all(|s| s.engineer != EngineerId::new("eng_ada")));
    }

    #[tokio::test]
    async fn similar_unknown_engineer_is_not_found() {
        let orchestrator = SearchOrchestrator::new(seeded_store(), KnowledgeBaseConfig::default());
        let err = orchestrator
            .similar(&EngineerId::new("eng_missing"), 5)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn critique_suggestions_are_empty_on_an_empty_result_set() {
        let orchestrator = SearchOrchestrator::new(seeded_store(), KnowledgeBaseConfig::default());
        assert!(orchestrator.suggest_critiques(&[]).is_empty());
    }

    /// Two engineers tie on qualifying-skill count and years (so the page
    /// order the query builder picked is ambiguous between them), but
    /// differ in skill confidence. The response must still rank by
    /// `utilityScore`, not carry over the page's pick order.
    #[tokio::test]
    async fn results_are_ranked_by_utility_not_page_order() {
        let mut store = MemoryGraphStore::new();
        store.add_skill(
            SkillNode {
                id: SkillId::new("skill_rust"),
                name: "Rust".to_string(),
                is_category: false,
            },
            None,
        );
        // Inserted in ascending-confidence order so a carried-over page
        // order would list the low-confidence engineer first.
        store.add_engineer(
            engineer("eng_low_confidence", 5.0, 120_000.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_rust"),
                proficiency_level: ProficiencyLevel::Expert,
                confidence_score: 0.2,
                years_used: 3.0,
            }],
            vec![],
            vec![],
        );
        store.add_engineer(
            engineer("eng_high_confidence", 5.0, 120_000.0),
            vec![EngineerSkillEdge {
                skill_id: SkillId::new("skill_rust"),
                proficiency_level: ProficiencyLevel::Expert,
                confidence_score: 0.95,
                years_used: 3.0,
            }],
            vec![],
            vec![],
        );

        let orchestrator = SearchOrchestrator::new(store, KnowledgeBaseConfig::default());
        let request = SearchRequest {
            required_skills: Some(vec![recruit_types::SkillRequirement {
                skill: "skill_rust".into(),
                min_proficiency: Some(ProficiencyLevel::Learning),
                preferred_min_proficiency: None,
                min_years: None,
            }]),
            ..Default::default()
        };
        let response = orchestrator.search(&request).await.unwrap();
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].engineer_id, EngineerId::new("eng_high_confidence"));
        assert!(response.matches[0].utility_score >= response.matches[1].utility_score);
    }
}
