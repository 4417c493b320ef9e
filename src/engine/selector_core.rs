// ==========================================
// Mission Match Engine - Selector Core (pure functions)
// ==========================================
// Hard eligibility filters for candidate selection, plus the re-invite
// exclusion rule. Stateless, no side effects, no I/O. Every rejection
// carries a reason string so selection stays explainable.
// ==========================================

use crate::domain::mission::Mission;
use crate::domain::provider::ProviderProfile;
use crate::domain::types::{OfferStatus, WorkMode};
use std::collections::HashSet;

// ==========================================
// SelectorCore - pure filter functions
// ==========================================
pub struct SelectorCore;

impl SelectorCore {
    /// Work-mode compatibility.
    ///
    /// Rules:
    /// - provider must serve the mission's work mode
    /// - hybrid missions accept providers serving either remote or local
    ///
    /// Returns the rejection reason, or None when the provider passes.
    pub fn check_work_mode(mission: &Mission, provider: &ProviderProfile) -> Option<String> {
        let compatible = match mission.work_mode {
            WorkMode::Hybrid => {
                provider.serves_mode(WorkMode::Hybrid)
                    || provider.serves_mode(WorkMode::Remote)
                    || provider.serves_mode(WorkMode::Local)
            }
            mode => provider.serves_mode(mode) || provider.serves_mode(WorkMode::Hybrid),
        };

        if compatible {
            None
        } else {
            Some(format!(
                "WORK_MODE: provider does not serve {}",
                mission.work_mode
            ))
        }
    }

    /// Language overlap. The mission carries a single working language;
    /// comparison is case-insensitive.
    pub fn check_language(mission: &Mission, provider: &ProviderProfile) -> Option<String> {
        if provider.speaks(&mission.language) {
            None
        } else {
            Some(format!("LANGUAGE: '{}' not spoken", mission.language))
        }
    }

    /// Availability flag.
    pub fn check_availability(provider: &ProviderProfile) -> Option<String> {
        if provider.available {
            None
        } else {
            Some("UNAVAILABLE: provider not accepting missions".to_string())
        }
    }

    /// Rate feasibility.
    ///
    /// Rules:
    /// - only enforced when both floor_rate and budget.maximum are present
    /// - floor_rate above the budget ceiling rejects
    pub fn check_rate_feasibility(mission: &Mission, provider: &ProviderProfile) -> Option<String> {
        match (provider.floor_rate, mission.budget.maximum) {
            (Some(floor), Some(max)) if floor > max => Some(format!(
                "RATE: floor_rate={} above budget_max={}",
                floor, max
            )),
            _ => None,
        }
    }

    /// Run all hard filters.
    ///
    /// Returns (eligible, reasons). An eligible provider has no reasons;
    /// a rejected one carries one reason per failed filter.
    pub fn evaluate(mission: &Mission, provider: &ProviderProfile) -> (bool, Vec<String>) {
        let mut reasons = Vec::new();

        if let Some(reason) = Self::check_availability(provider) {
            reasons.push(reason);
        }
        if let Some(reason) = Self::check_work_mode(mission, provider) {
            reasons.push(reason);
        }
        if let Some(reason) = Self::check_language(mission, provider) {
            reasons.push(reason);
        }
        if let Some(reason) = Self::check_rate_feasibility(mission, provider) {
            reasons.push(reason);
        }

        (reasons.is_empty(), reasons)
    }

    /// Providers barred from the next wave.
    ///
    /// Rules:
    /// 1. any offer whose status is not EXPIRED blocks re-invitation
    ///    (pending/accepted still live; rejected/confirmed already spoke)
    /// 2. an expired offer blocks too unless the mission allows expansion
    ///
    /// `prior` is (provider_id, status) for every offer ever issued on
    /// the mission, across all waves.
    pub fn excluded_providers(
        prior: &[(String, OfferStatus)],
        allow_expansion: bool,
    ) -> HashSet<String> {
        let mut excluded = HashSet::new();

        for (provider_id, status) in prior {
            if status.blocks_reinvite() || !allow_expansion {
                excluded.insert(provider_id.clone());
            }
        }

        excluded
    }
}
