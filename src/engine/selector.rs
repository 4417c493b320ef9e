// ==========================================
// Mission Match Engine - Candidate Selector
// ==========================================
// Turns the provider pool into a ranked invite list for one wave.
// Pure function of (mission, pool, exclusions): hard filters from
// SelectorCore, score from ScoringEngine, deterministic ordering.
// ==========================================

use crate::domain::mission::Mission;
use crate::domain::provider::ProviderProfile;
use crate::engine::scoring::ScoringEngine;
use crate::engine::selector_core::SelectorCore;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;

/// One entry of the ranked invite list.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidate {
    pub provider_id: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

// ==========================================
// CandidateSelector
// ==========================================
pub struct CandidateSelector {
    scoring: ScoringEngine,
}

impl CandidateSelector {
    pub fn new(scoring: ScoringEngine) -> Self {
        Self { scoring }
    }

    /// Rank the eligible pool for one wave.
    ///
    /// Ordering: score descending, ties by completion_rate descending,
    /// then provider_id ascending. Returns at most `limit` candidates;
    /// fewer than `limit` signals pool exhaustion to the caller.
    pub fn select(
        &self,
        mission: &Mission,
        pool: &[ProviderProfile],
        exclude_provider_ids: &HashSet<String>,
        limit: usize,
    ) -> Vec<RankedCandidate> {
        if limit == 0 {
            return vec![];
        }

        let mut ranked: Vec<(RankedCandidate, f64)> = Vec::new();

        for provider in pool {
            if exclude_provider_ids.contains(&provider.provider_id) {
                tracing::debug!(
                    "selector: provider excluded (prior offer): mission_id={}, provider_id={}",
                    mission.mission_id,
                    provider.provider_id
                );
                continue;
            }

            let (eligible, filter_reasons) = SelectorCore::evaluate(mission, provider);
            if !eligible {
                tracing::debug!(
                    "selector: provider filtered: mission_id={}, provider_id={}, reasons={:?}",
                    mission.mission_id,
                    provider.provider_id,
                    filter_reasons
                );
                continue;
            }

            let (score, reasons) = self.scoring.score(mission, provider);
            ranked.push((
                RankedCandidate {
                    provider_id: provider.provider_id.clone(),
                    score,
                    reasons,
                },
                provider.completion_rate,
            ));
        }

        ranked.sort_by(|a, b| Self::compare(a, b));
        ranked.truncate(limit);

        ranked.into_iter().map(|(candidate, _)| candidate).collect()
    }

    /// Three-key comparator: score desc, completion_rate desc,
    /// provider_id asc.
    fn compare(a: &(RankedCandidate, f64), b: &(RankedCandidate, f64)) -> Ordering {
        match b.0.score.total_cmp(&a.0.score) {
            Ordering::Equal => {}
            other => return other,
        }

        match b.1.total_cmp(&a.1) {
            Ordering::Equal => {}
            other => return other,
        }

        a.0.provider_id.cmp(&b.0.provider_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::WorkMode;
    use crate::engine::scoring::ScoringWeights;

    fn mission() -> Mission {
        Mission::new("req-1", "Translate product site", "EN to DE")
            .with_keywords(vec!["translation".into(), "german".into()])
            .with_budget(Some(500.0), Some(900.0), "EUR")
            .with_work_mode(WorkMode::Remote)
            .with_language("en")
    }

    fn provider(id: &str, skills: Vec<&str>, completion_rate: f64) -> ProviderProfile {
        ProviderProfile::new(id, id)
            .with_skills(skills.into_iter().map(String::from).collect())
            .with_languages(vec!["en".into()])
            .with_work_modes(vec![WorkMode::Remote])
            .with_rates(Some(700.0), Some(500.0))
            .with_timezone_offset(0)
            .with_track_record(completion_rate, 10)
    }

    fn selector() -> CandidateSelector {
        CandidateSelector::new(ScoringEngine::new(ScoringWeights::default()))
    }

    #[test]
    fn test_ranking_is_score_descending() {
        let pool = vec![
            provider("p-low", vec!["translation"], 0.9),
            provider("p-high", vec!["translation", "german"], 0.9),
        ];
        let ranked = selector().select(&mission(), &pool, &HashSet::new(), 10);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].provider_id, "p-high");
        assert!(ranked[0].score > ranked[1].score);
    }

    #[test]
    fn test_tie_broken_by_completion_rate_then_id() {
        let pool = vec![
            provider("p-b", vec!["translation", "german"], 0.8),
            provider("p-a", vec!["translation", "german"], 0.8),
            provider("p-c", vec!["translation", "german"], 0.95),
        ];
        let ranked = selector().select(&mission(), &pool, &HashSet::new(), 10);

        // completion_rate feeds the score through the reliability
        // sub-score, so p-c leads outright; p-a/p-b tie fully and
        // fall back to the id.
        assert_eq!(ranked[0].provider_id, "p-c");
        assert_eq!(ranked[1].provider_id, "p-a");
        assert_eq!(ranked[2].provider_id, "p-b");
    }

    #[test]
    fn test_excluded_providers_are_skipped() {
        let pool = vec![
            provider("p-1", vec!["translation"], 0.9),
            provider("p-2", vec!["translation"], 0.9),
        ];
        let excluded: HashSet<String> = ["p-1".to_string()].into_iter().collect();
        let ranked = selector().select(&mission(), &pool, &excluded, 10);

        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].provider_id, "p-2");
    }

    #[test]
    fn test_ineligible_providers_are_filtered() {
        let mut unavailable = provider("p-off", vec!["translation"], 0.9);
        unavailable.available = false;
        let pool = vec![unavailable, provider("p-on", vec!["translation"], 0.9)];

        let ranked = selector().select(&mission(), &pool, &HashSet::new(), 10);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].provider_id, "p-on");
    }

    #[test]
    fn test_limit_truncates() {
        let pool: Vec<ProviderProfile> = (0..8)
            .map(|i| provider(&format!("p-{}", i), vec!["translation"], 0.9))
            .collect();
        let ranked = selector().select(&mission(), &pool, &HashSet::new(), 3);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_zero_limit_returns_empty() {
        let pool = vec![provider("p-1", vec!["translation"], 0.9)];
        assert!(selector().select(&mission(), &pool, &HashSet::new(), 0).is_empty());
    }

    #[test]
    fn test_short_pool_signals_exhaustion_by_count() {
        let pool = vec![provider("p-1", vec!["translation"], 0.9)];
        let ranked = selector().select(&mission(), &pool, &HashSet::new(), 5);
        assert_eq!(ranked.len(), 1); // fewer than limit, not an error
    }
}
