use crate::data::CountryIndicator;
use crate::types::PriorityWeights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sub-dimensions a market is scored on
pub const SCORE_DIMENSIONS: [&str; 5] =
    ["growth", "cost_efficiency", "risk", "sustainability", "digital"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub dimension_scores: BTreeMap<String, f64>,
    pub composite: f64,
}

impl ScoreBreakdown {
    /// Scores with the composite computed from priority weights
    pub fn weighted(dimension_scores: BTreeMap<String, f64>, weights: &PriorityWeights) -> Self {
        let composite = composite_score(&dimension_scores, weights);
        Self {
            dimension_scores,
            composite,
        }
    }

    /// Missing sub-dimensions score 0
    pub fn score(&self, key: &str) -> f64 {
        self.dimension_scores.get(key).copied().unwrap_or(0.0)
    }

    pub fn has_dimensions(&self) -> bool {
        !self.dimension_scores.is_empty()
    }

    /// Recompute the composite from the run's weights. A breakdown with no
    /// sub-dimension matching a weighted priority keeps the composite it was given.
    pub fn reweighted(self, weights: &PriorityWeights) -> Self {
        let covered = weights
            .iter()
            .any(|(key, _)| self.dimension_scores.contains_key(key));
        if covered {
            Self::weighted(self.dimension_scores, weights)
        } else {
            self
        }
    }
}

/// Weighted average of sub-dimension scores over the total priority weight.
/// Unrounded; callers format for display.
pub fn composite_score(scores: &BTreeMap<String, f64>, weights: &PriorityWeights) -> f64 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }
    let weighted: f64 = weights
        .iter()
        .map(|(key, weight)| weight * scores.get(key).copied().unwrap_or(0.0))
        .sum();
    weighted / total
}

/// Scale `value` from [min, max] into [0, 1], clamped.
pub fn normalize_indicator(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Urbanization (40%) blended with closeness of the median age to 40 (60%).
pub fn social_readiness(urbanization: f64, median_age: f64) -> f64 {
    let urban = normalize_indicator(urbanization, 0.0, 100.0);
    let age_closeness = normalize_indicator(40.0 - (40.0 - median_age).abs(), 0.0, 40.0);
    urban * 40.0 + age_closeness * 60.0
}

/// Heuristic 0-100 sub-dimension scores derived from curated indicators.
pub fn indicator_scores(country: &CountryIndicator) -> BTreeMap<String, f64> {
    let ind = |key: &str, default: f64| country.indicator(key, default);

    let growth = normalize_indicator(ind("gdp_growth", 0.0), -2.0, 8.0) * 60.0
        + normalize_indicator(ind("consumer_spending_index", 50.0), 0.0, 100.0) * 40.0;
    let cost_efficiency =
        normalize_indicator(100.0 - ind("labor_cost_index", 60.0), 0.0, 100.0) * 70.0
            + normalize_indicator(ind("ease_of_doing_business", 70.0), 0.0, 100.0) * 30.0;
    let risk = (normalize_indicator(ind("governance_index", 50.0), 0.0, 100.0)
        + normalize_indicator(ind("political_stability", 50.0), 0.0, 100.0))
        * 50.0;
    let sustainability =
        normalize_indicator(ind("renewable_energy_share", 30.0), 0.0, 100.0) * 60.0
            + normalize_indicator(20.0 - ind("co2_per_capita", 8.0), 0.0, 20.0) * 40.0;
    let digital = (normalize_indicator(ind("digital_adoption", 60.0), 0.0, 100.0)
        + normalize_indicator(ind("broadband_penetration", 60.0), 0.0, 100.0))
        * 50.0;

    SCORE_DIMENSIONS
        .iter()
        .zip([growth, cost_efficiency, risk, sustainability, digital])
        .map(|(key, score)| (key.to_string(), round1(score)))
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn composite_is_weighted_average_over_priorities() {
        let weights = PriorityWeights::from_pairs([("growth", 1.0), ("risk", 1.0)]);
        let s = scores(&[
            ("growth", 80.0),
            ("risk", 60.0),
            ("cost_efficiency", 0.0),
            ("sustainability", 0.0),
            ("digital", 0.0),
        ]);
        assert_eq!(composite_score(&s, &weights), 70.0);
    }

    #[test]
    fn missing_dimensions_count_as_zero() {
        let weights = PriorityWeights::from_pairs([("growth", 3.0), ("digital", 1.0)]);
        let s = scores(&[("growth", 80.0)]);
        assert_eq!(composite_score(&s, &weights), 60.0);
    }

    #[test]
    fn zero_total_weight_yields_zero() {
        let weights = PriorityWeights::from_pairs([("growth", 0.0)]);
        assert_eq!(composite_score(&scores(&[("growth", 90.0)]), &weights), 0.0);
    }

    #[test]
    fn reweighting_keeps_bare_composite() {
        let weights = PriorityWeights::default();
        let bare = ScoreBreakdown {
            dimension_scores: BTreeMap::new(),
            composite: 64.0,
        };
        assert_eq!(bare.clone().reweighted(&weights), bare);

        let full = ScoreBreakdown {
            dimension_scores: scores(&[("growth", 50.0), ("risk", 90.0)]),
            composite: 12.0,
        };
        assert_eq!(full.reweighted(&weights).composite, 70.0);
    }

    #[test]
    fn reweighting_keeps_composite_when_no_priority_is_scored() {
        let weights = PriorityWeights::default();
        let unrelated = ScoreBreakdown {
            dimension_scores: scores(&[("brand_equity", 20.0), ("digital", 90.0)]),
            composite: 80.0,
        };
        assert_eq!(unrelated.clone().reweighted(&weights), unrelated);

        let partial = ScoreBreakdown {
            dimension_scores: scores(&[("growth", 90.0), ("digital", 10.0)]),
            composite: 80.0,
        };
        assert_eq!(partial.reweighted(&weights).composite, 45.0);
    }

    #[test]
    fn composite_is_not_rounded() {
        let weights = PriorityWeights::from_pairs([("growth", 1.0), ("risk", 1.0)]);
        let a = composite_score(&scores(&[("growth", 70.0), ("risk", 70.1)]), &weights);
        let b = composite_score(&scores(&[("growth", 70.0), ("risk", 70.08)]), &weights);
        assert!(a > b);
        assert!((a - 70.05).abs() < 1e-9);
    }

    #[test]
    fn normalize_clamps_and_guards_degenerate_range() {
        assert_eq!(normalize_indicator(50.0, 0.0, 100.0), 0.5);
        assert_eq!(normalize_indicator(150.0, 0.0, 100.0), 1.0);
        assert_eq!(normalize_indicator(-5.0, 0.0, 100.0), 0.0);
        assert_eq!(normalize_indicator(5.0, 10.0, 10.0), 0.0);
    }

    #[test]
    fn social_readiness_peaks_at_median_age_forty() {
        assert_eq!(social_readiness(100.0, 40.0), 100.0);
        assert_eq!(social_readiness(50.0, 40.0), 80.0);
        // symmetric around 40
        assert_eq!(social_readiness(50.0, 30.0), social_readiness(50.0, 50.0));
        assert!(social_readiness(50.0, 30.0) < social_readiness(50.0, 35.0));
    }

    #[test]
    fn indicator_scores_cover_every_dimension() {
        let country = CountryIndicator {
            name: "Testland".into(),
            indicators: HashMap::from([
                ("gdp_growth".to_string(), 8.0),
                ("consumer_spending_index".to_string(), 100.0),
                ("governance_index".to_string(), 80.0),
                ("political_stability".to_string(), 60.0),
            ]),
            narratives: HashMap::new(),
            sources: vec![],
        };
        let s = indicator_scores(&country);
        assert_eq!(s.len(), SCORE_DIMENSIONS.len());
        assert_eq!(s["growth"], 100.0);
        assert_eq!(s["risk"], 70.0);
        assert!(s.values().all(|v| (0.0..=100.0).contains(v)));
    }
}
