// ==========================================
// Mission Match Engine - Scoring Engine
// ==========================================
// Match score in [0,1] for a (mission, provider) pair, as a weighted
// sum of four sub-scores. Pure and deterministic: identical inputs
// always produce the identical score. Weights come from configuration
// and are normalized by their sum, so operator-tuned values cannot
// push the total outside [0,1].
// ==========================================

use crate::domain::mission::{Budget, Mission};
use crate::domain::provider::ProviderProfile;
use crate::domain::types::WorkMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// ScoringWeights
// ==========================================
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub skill: f64,
    pub budget: f64,
    pub availability: f64,
    pub reliability: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            skill: 0.4,
            budget: 0.25,
            availability: 0.15,
            reliability: 0.2,
        }
    }
}

impl ScoringWeights {
    /// Scale the weights so they sum to 1.0. Non-finite or non-positive
    /// sums fall back to the defaults.
    pub fn normalized(&self) -> ScoringWeights {
        let sum = self.skill + self.budget + self.availability + self.reliability;
        if !sum.is_finite() || sum <= 0.0 {
            return ScoringWeights::default();
        }
        ScoringWeights {
            skill: self.skill / sum,
            budget: self.budget / sum,
            availability: self.availability / sum,
            reliability: self.reliability / sum,
        }
    }
}

// ==========================================
// ScoringEngine
// ==========================================
pub struct ScoringEngine {
    weights: ScoringWeights,
}

impl ScoringEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self {
            weights: weights.normalized(),
        }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Compute the match score and one reason string per sub-score.
    pub fn score(&self, mission: &Mission, provider: &ProviderProfile) -> (f64, Vec<String>) {
        let (skill, skill_reason) = Self::skill_overlap(&mission.keywords, &provider.skills);
        let (budget, budget_reason) = Self::budget_fit(&mission.budget, provider.typical_rate);
        let (availability, avail_reason) = Self::availability_fit(mission, provider);
        let (reliability, rel_reason) = Self::reliability(provider.completion_rate);

        let w = self.weights;
        let total = w.skill * skill
            + w.budget * budget
            + w.availability * availability
            + w.reliability * reliability;

        (
            total.clamp(0.0, 1.0),
            vec![skill_reason, budget_reason, avail_reason, rel_reason],
        )
    }

    /// Skill overlap: Jaccard index of mission keywords vs provider
    /// skills, case-insensitive. An empty union scores 0.
    pub fn skill_overlap(keywords: &[String], skills: &[String]) -> (f64, String) {
        let kw: HashSet<String> = keywords.iter().map(|s| s.to_lowercase()).collect();
        let sk: HashSet<String> = skills.iter().map(|s| s.to_lowercase()).collect();

        let union = kw.union(&sk).count();
        if union == 0 {
            return (0.0, "SKILL: no keywords or skills to match".to_string());
        }

        let intersection = kw.intersection(&sk).count();
        let jaccard = intersection as f64 / union as f64;

        (
            jaccard,
            format!("SKILL: jaccard={:.2} ({}/{})", jaccard, intersection, union),
        )
    }

    /// Budget fit: 1.0 when the provider's typical rate falls inside
    /// [minimum, maximum], decaying linearly with the relative distance
    /// to the nearer bound outside. 0.5 neutral when either side lacks
    /// the data.
    pub fn budget_fit(budget: &Budget, typical_rate: Option<f64>) -> (f64, String) {
        let rate = match typical_rate {
            Some(r) if r.is_finite() && r >= 0.0 => r,
            _ => return (0.5, "BUDGET: typical_rate unknown".to_string()),
        };

        let decay = |distance: f64, bound: f64| -> f64 {
            if bound <= 0.0 {
                return 0.0;
            }
            (1.0 - distance / bound).max(0.0)
        };

        match (budget.minimum, budget.maximum) {
            (None, None) => (0.5, "BUDGET: mission budget open".to_string()),
            (Some(lo), Some(hi)) => {
                if rate >= lo && rate <= hi {
                    (1.0, format!("BUDGET: rate={} inside [{}, {}]", rate, lo, hi))
                } else if rate < lo {
                    let fit = decay(lo - rate, lo);
                    (fit, format!("BUDGET: rate={} below minimum {}", rate, lo))
                } else {
                    let fit = decay(rate - hi, hi);
                    (fit, format!("BUDGET: rate={} above maximum {}", rate, hi))
                }
            }
            (Some(lo), None) => {
                if rate >= lo {
                    (1.0, format!("BUDGET: rate={} above minimum {}", rate, lo))
                } else {
                    let fit = decay(lo - rate, lo);
                    (fit, format!("BUDGET: rate={} below minimum {}", rate, lo))
                }
            }
            (None, Some(hi)) => {
                if rate <= hi {
                    (1.0, format!("BUDGET: rate={} inside ceiling {}", rate, hi))
                } else {
                    let fit = decay(rate - hi, hi);
                    (fit, format!("BUDGET: rate={} above maximum {}", rate, hi))
                }
            }
        }
    }

    /// Availability/timezone fit.
    ///
    /// Rules:
    /// 1. local or hybrid work scores 1.0 (presence on site makes the
    ///    timezone delta moot; mode compatibility was already filtered)
    /// 2. remote work decays with the provider's offset from the
    ///    platform base (UTC): 1 - min(|tz|, 12) / 12
    /// 3. unknown timezone scores 0.5 neutral
    pub fn availability_fit(mission: &Mission, provider: &ProviderProfile) -> (f64, String) {
        match mission.work_mode {
            WorkMode::Local | WorkMode::Hybrid => {
                (1.0, format!("TZ: on-site work ({})", mission.work_mode))
            }
            WorkMode::Remote => match provider.timezone_offset_hours {
                None => (0.5, "TZ: offset unknown".to_string()),
                Some(tz) => {
                    let delta = (tz.abs().min(12)) as f64;
                    let fit = 1.0 - delta / 12.0;
                    (fit, format!("TZ: remote offset={}h", tz))
                }
            },
        }
    }

    /// Historical reliability: completion rate clamped to [0,1].
    pub fn reliability(completion_rate: f64) -> (f64, String) {
        let rate = if completion_rate.is_finite() {
            completion_rate.clamp(0.0, 1.0)
        } else {
            0.0
        };
        (rate, format!("RELIABILITY: completion_rate={:.2}", rate))
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mission() -> Mission {
        Mission::new("req-1", "Translate product site", "EN to DE")
            .with_keywords(vec!["translation".into(), "german".into(), "legal".into()])
            .with_budget(Some(500.0), Some(900.0), "EUR")
            .with_work_mode(WorkMode::Remote)
    }

    fn provider() -> ProviderProfile {
        ProviderProfile::new("prov-1", "Ada")
            .with_skills(vec!["Translation".into(), "German".into()])
            .with_rates(Some(700.0), Some(600.0))
            .with_timezone_offset(0)
            .with_track_record(0.9, 18)
    }

    // ==========================================
    // Skill overlap
    // ==========================================

    #[test]
    fn test_skill_jaccard_case_insensitive() {
        let (score, _) = ScoringEngine::skill_overlap(
            &["translation".into(), "german".into(), "legal".into()],
            &["Translation".into(), "German".into()],
        );
        // intersection 2, union 3
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_skill_no_overlap() {
        let (score, _) =
            ScoringEngine::skill_overlap(&["rust".into()], &["cooking".into()]);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_skill_empty_sets_score_zero() {
        let (score, reason) = ScoringEngine::skill_overlap(&[], &[]);
        assert_eq!(score, 0.0);
        assert!(reason.starts_with("SKILL"));
    }

    // ==========================================
    // Budget fit
    // ==========================================

    #[test]
    fn test_budget_inside_range() {
        let budget = Budget::new(Some(500.0), Some(900.0), "EUR");
        let (score, _) = ScoringEngine::budget_fit(&budget, Some(700.0));
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_budget_above_max_decays() {
        let budget = Budget::new(Some(500.0), Some(900.0), "EUR");
        // 990 is 10% over the ceiling
        let (score, _) = ScoringEngine::budget_fit(&budget, Some(990.0));
        assert!((score - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_budget_far_above_max_floors_at_zero() {
        let budget = Budget::new(Some(100.0), Some(200.0), "EUR");
        let (score, _) = ScoringEngine::budget_fit(&budget, Some(10_000.0));
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_budget_missing_data_is_neutral() {
        let open = Budget::new(None, None, "EUR");
        assert_eq!(ScoringEngine::budget_fit(&open, Some(700.0)).0, 0.5);

        let bounded = Budget::new(Some(500.0), Some(900.0), "EUR");
        assert_eq!(ScoringEngine::budget_fit(&bounded, None).0, 0.5);
    }

    // ==========================================
    // Availability fit
    // ==========================================

    #[test]
    fn test_onsite_work_scores_full() {
        let m = mission().with_work_mode(WorkMode::Local);
        let (score, _) = ScoringEngine::availability_fit(&m, &provider());
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_remote_decays_with_offset() {
        let p = provider().with_timezone_offset(6);
        let (score, _) = ScoringEngine::availability_fit(&mission(), &p);
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_remote_offset_caps_at_twelve() {
        let p = provider().with_timezone_offset(14);
        let (score, _) = ScoringEngine::availability_fit(&mission(), &p);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_remote_unknown_offset_neutral() {
        let mut p = provider();
        p.timezone_offset_hours = None;
        let (score, _) = ScoringEngine::availability_fit(&mission(), &p);
        assert_eq!(score, 0.5);
    }

    // ==========================================
    // Weights and total
    // ==========================================

    #[test]
    fn test_weights_normalize_to_unit_sum() {
        let w = ScoringWeights {
            skill: 4.0,
            budget: 2.5,
            availability: 1.5,
            reliability: 2.0,
        }
        .normalized();
        let sum = w.skill + w.budget + w.availability + w.reliability;
        assert!((sum - 1.0).abs() < 1e-9);
        assert!((w.skill - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_weights_fall_back_to_default() {
        let w = ScoringWeights {
            skill: 0.0,
            budget: 0.0,
            availability: 0.0,
            reliability: 0.0,
        }
        .normalized();
        assert!((w.skill - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_total_stays_in_unit_interval() {
        let engine = ScoringEngine::default();
        let (score, reasons) = engine.score(&mission(), &provider());
        assert!((0.0..=1.0).contains(&score));
        assert_eq!(reasons.len(), 4);
    }

    #[test]
    fn test_score_is_deterministic() {
        let engine = ScoringEngine::default();
        let (a, _) = engine.score(&mission(), &provider());
        let (b, _) = engine.score(&mission(), &provider());
        assert_eq!(a, b);
    }

    #[test]
    fn test_perfect_candidate_scores_high() {
        let p = ProviderProfile::new("prov-2", "Grace")
            .with_skills(vec!["translation".into(), "german".into(), "legal".into()])
            .with_rates(Some(700.0), Some(500.0))
            .with_timezone_offset(0)
            .with_track_record(1.0, 40);
        let engine = ScoringEngine::default();
        let (score, _) = engine.score(&mission(), &p);
        assert!((score - 1.0).abs() < 1e-9);
    }
}
