use crate::analysis::scoring::ScoreBreakdown;
use std::collections::BTreeMap;

/// Sub-dimension scores below this get a mitigation action
pub const MITIGATION_THRESHOLD: f64 = 55.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    pub fn from_composite(composite: f64) -> Self {
        if composite >= 70.0 {
            ScoreTier::High
        } else if composite >= 50.0 {
            ScoreTier::Medium
        } else {
            ScoreTier::Low
        }
    }
}

const ENTRY_HIGH: &str = "Greenfield investment with localized fulfillment network";
const ENTRY_HIGH_ACQUISITION: &str = "Acquisition of an established local player";
const ENTRY_MEDIUM: &str = "Joint venture with established regional partner";
const ENTRY_LOW: &str = "Lightweight partnership or distributor-led entry";
const ENTRY_LOW_DIGITAL: &str = "Cross-border e-commerce pilot ahead of a local presence";

const TURNAROUND_PLAYBOOK: [(&str, &str); 5] = [
    (
        "risk",
        "Institute robust risk governance and scenario planning to mitigate political shocks.",
    ),
    (
        "cost_efficiency",
        "Prioritize automation and shared-services sourcing to offset higher labor costs.",
    ),
    (
        "growth",
        "Sequence rollout through digitally native customer segments before wider expansion.",
    ),
    (
        "sustainability",
        "Embed sustainability metrics in supplier scorecards and explore renewable PPAs.",
    ),
    (
        "digital",
        "Accelerate digital maturity via strategic alliances with local technology providers.",
    ),
];

/// Entry mode from the composite tier, adjusted by use-case keywords.
pub fn select_entry_mode(composite: f64, use_case: &str) -> String {
    let use_case = use_case.to_lowercase();
    let mode = match ScoreTier::from_composite(composite) {
        ScoreTier::High if use_case.contains("acquisition") || use_case.contains("m&a") => {
            ENTRY_HIGH_ACQUISITION
        }
        ScoreTier::High => ENTRY_HIGH,
        ScoreTier::Medium => ENTRY_MEDIUM,
        ScoreTier::Low
            if ["e-commerce", "ecommerce", "online", "digital"]
                .iter()
                .any(|k| use_case.contains(k)) =>
        {
            ENTRY_LOW_DIGITAL
        }
        ScoreTier::Low => ENTRY_LOW,
    };
    mode.to_string()
}

/// Playbook actions for every known sub-dimension scoring below the threshold.
pub fn build_mitigations(scores: &ScoreBreakdown) -> BTreeMap<String, String> {
    scores
        .dimension_scores
        .iter()
        .filter(|(_, score)| **score < MITIGATION_THRESHOLD)
        .filter_map(|(key, _)| {
            TURNAROUND_PLAYBOOK
                .iter()
                .find(|(k, _)| *k == key.as_str())
                .map(|(k, action)| (k.to_string(), action.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_split_at_seventy_and_fifty() {
        assert_eq!(ScoreTier::from_composite(70.0), ScoreTier::High);
        assert_eq!(ScoreTier::from_composite(69.9), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_composite(50.0), ScoreTier::Medium);
        assert_eq!(ScoreTier::from_composite(49.9), ScoreTier::Low);
    }

    #[test]
    fn entry_mode_follows_tier_and_use_case() {
        assert_eq!(select_entry_mode(82.0, "Market expansion"), ENTRY_HIGH);
        assert_eq!(select_entry_mode(82.0, "Bolt-on acquisition"), ENTRY_HIGH_ACQUISITION);
        assert_eq!(select_entry_mode(60.0, "Bolt-on acquisition"), ENTRY_MEDIUM);
        assert_eq!(select_entry_mode(30.0, "Supplier diversification"), ENTRY_LOW);
        assert_eq!(select_entry_mode(30.0, "Online retail launch"), ENTRY_LOW_DIGITAL);
    }

    #[test]
    fn mitigations_only_for_weak_known_dimensions() {
        let scores = ScoreBreakdown {
            dimension_scores: [
                ("growth".to_string(), 80.0),
                ("risk".to_string(), 40.0),
                ("digital".to_string(), 54.9),
                ("brand".to_string(), 10.0),
            ]
            .into_iter()
            .collect(),
            composite: 60.0,
        };
        let actions = build_mitigations(&scores);
        assert_eq!(actions.keys().collect::<Vec<_>>(), vec!["digital", "risk"]);
        assert!(actions["risk"].contains("risk governance"));
    }
}
