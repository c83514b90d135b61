use crate::analysis::recommendations::{build_mitigations, select_entry_mode};
use crate::analysis::scoring::{indicator_scores, social_readiness, ScoreBreakdown};
use crate::analysis::types::{MarketAnalysisResult, ResultOrigin};
use crate::data::CountryIndicator;
use crate::types::{EngagementContext, Pestel, PestelDimension};

/// Dimension a top priority pulls to the front of the analysis.
fn priority_dimension(priority: &str) -> Option<(PestelDimension, &'static str)> {
    match priority {
        "growth" => Some((PestelDimension::Economic, "growth potential")),
        "cost_efficiency" => Some((PestelDimension::Economic, "cost efficiency")),
        "risk" => Some((PestelDimension::Political, "risk mitigation")),
        "sustainability" => Some((PestelDimension::Environmental, "sustainability impact")),
        "digital" => Some((PestelDimension::Technological, "digital acceleration")),
        _ => None,
    }
}

/// Templated PESTEL commentary from indicator values plus curated narratives.
pub fn generate_pestel(country: &CountryIndicator, ctx: &EngagementContext) -> Pestel {
    let ind = |key: &str, default: f64| country.indicator(key, default);

    let industry = if ctx.industry.is_empty() {
        "target industry".to_string()
    } else {
        ctx.industry.to_lowercase()
    };
    let use_case = if ctx.use_case.is_empty() {
        "market expansion".to_string()
    } else {
        ctx.use_case.to_lowercase()
    };
    let lead = format!(
        "For {}'s {use_case} agenda in the {industry} space in {}, ",
        ctx.company, country.name
    );

    let urbanization = ind("urbanization_rate", 70.0);
    let median_age = ind("median_age", 35.0);

    let mut pestel = Pestel::default();
    for dimension in PestelDimension::ALL {
        let sentence = match dimension {
            PestelDimension::Political => format!(
                "political institutions score {:.0}/100 with stability at {:.0}, supporting regulatory planning.",
                ind("governance_index", 50.0),
                ind("political_stability", 50.0)
            ),
            PestelDimension::Economic => format!(
                "GDP growth sits at {:.1}% while inflation is {:.1}%, with consumer demand indexed at {:.0}.",
                ind("gdp_growth", 0.0),
                ind("inflation", 2.0),
                ind("consumer_spending_index", 50.0)
            ),
            PestelDimension::Social => format!(
                "urbanization at {urbanization:.0}% and median age {median_age:.1} indicate a social readiness score near {:.0}/100.",
                social_readiness(urbanization, median_age)
            ),
            PestelDimension::Technological => format!(
                "digital adoption is {:.0}/100 with broadband penetration at {:.0}%.",
                ind("digital_adoption", 60.0),
                ind("broadband_penetration", 60.0)
            ),
            PestelDimension::Environmental => format!(
                "CO₂ footprint is {:.1} tons per capita with renewables covering {:.0}% of energy needs.",
                ind("co2_per_capita", 8.0),
                ind("renewable_energy_share", 30.0)
            ),
            PestelDimension::Legal => format!(
                "ease of doing business is {:.0}/100 and regulatory quality hits {:.0}/100.",
                ind("ease_of_doing_business", 70.0),
                ind("regulatory_quality", 65.0)
            ),
        };

        let bullets = pestel.get_mut(dimension);
        bullets.push(format!("{lead}{sentence}"));
        bullets.extend(country.narrative(dimension.key()).iter().cloned());
    }

    if let Some((dimension, focus)) = ctx.priorities.top().and_then(priority_dimension) {
        pestel.get_mut(dimension).insert(
            0,
            format!(
                "Primary client focus on {focus} suggests prioritizing {} signals when shaping the go-to-market plan.",
                dimension.key()
            ),
        );
    }

    pestel
}

/// Heuristic scores weighted by the engagement's priorities
pub fn heuristic_scores(country: &CountryIndicator, ctx: &EngagementContext) -> ScoreBreakdown {
    ScoreBreakdown::weighted(indicator_scores(country), &ctx.priorities)
}

/// Complete market result built only from curated data. Never fails.
pub fn fallback_result(
    country: &CountryIndicator,
    ctx: &EngagementContext,
) -> MarketAnalysisResult {
    let score = heuristic_scores(country, ctx);
    let entry_mode = select_entry_mode(score.composite, &ctx.use_case);
    let turnaround_actions = build_mitigations(&score);

    MarketAnalysisResult {
        country: country.name.clone(),
        summary: format!(
            "{} scores {:.1}/100 on curated indicators for {}'s priorities ({}).",
            country.name,
            score.composite,
            ctx.company,
            ctx.priorities_text()
        ),
        pestel: generate_pestel(country, ctx),
        score,
        news: country.narrative("news").to_vec(),
        entry_mode,
        turnaround_actions,
        recommendations: Vec::new(),
        sources: country.sources.clone(),
        origin: ResultOrigin::Heuristic,
        raw_response: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::IndicatorStore;
    use crate::types::PriorityWeights;

    fn ctx(labels: &[&str]) -> EngagementContext {
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        EngagementContext::new("SampleCo", "Retail", "Market expansion", &labels)
    }

    fn germany() -> CountryIndicator {
        IndicatorStore::bundled().unwrap().get("Germany").unwrap().clone()
    }

    #[test]
    fn every_dimension_gets_templated_sentence_then_narratives() {
        let country = germany();
        let pestel = generate_pestel(&country, &ctx(&["Cost efficiency"]));
        for (dimension, bullets) in pestel.iter() {
            let curated = country.narrative(dimension.key());
            let templated = if dimension == PestelDimension::Economic { 1 } else { 0 };
            let lead = "For SampleCo's market expansion agenda in the retail space in Germany, ";
            assert!(bullets[templated].starts_with(lead));
            assert_eq!(&bullets[templated + 1..], curated);
        }
    }

    #[test]
    fn indicator_values_are_interpolated() {
        let pestel = generate_pestel(&germany(), &ctx(&[]));
        assert!(pestel.political.iter().any(|b| b.contains("score 82/100 with stability at 72")));
        assert!(pestel.economic.iter().any(|b| b.contains("GDP growth sits at 0.3%")));
    }

    #[test]
    fn top_priority_leads_its_dimension() {
        let pestel = generate_pestel(&germany(), &ctx(&["Sustainability"]));
        let lead = "Primary client focus on sustainability impact";
        assert!(pestel.environmental[0].starts_with(lead));
        assert!(!pestel.political[0].starts_with("Primary client focus"));

        let mut context = ctx(&[]);
        context.priorities = PriorityWeights::from_pairs([("growth", 1.0), ("risk", 3.0)]);
        let pestel = generate_pestel(&germany(), &context);
        assert!(pestel.political[0].contains("risk mitigation"));
    }

    #[test]
    fn unknown_top_priority_injects_nothing() {
        let pestel = generate_pestel(&germany(), &ctx(&["Brand awareness"]));
        assert!(pestel.iter().all(|(_, b)| !b[0].starts_with("Primary client focus")));
    }

    #[test]
    fn missing_indicators_use_defaults() {
        let bare = CountryIndicator {
            name: "Nowhere".into(),
            indicators: Default::default(),
            narratives: Default::default(),
            sources: vec![],
        };
        let pestel = generate_pestel(&bare, &ctx(&["Brand awareness"]));
        assert_eq!(pestel.political.len(), 1);
        assert!(pestel.political[0].contains("score 50/100"));
        assert!(pestel.social[0].contains("urbanization at 70%"));
    }

    #[test]
    fn fallback_result_is_deterministic_and_complete() {
        let country = germany();
        let context = ctx(&["Growth potential", "Risk mitigation"]);
        let a = fallback_result(&country, &context);
        let b = fallback_result(&country, &context);
        assert_eq!(a.pestel, b.pestel);
        assert_eq!(a.score, b.score);
        assert_eq!(a.origin, ResultOrigin::Heuristic);
        assert!(!a.entry_mode.is_empty());
        assert!(!a.news.is_empty());
        assert_eq!(a.sources, country.sources);
        assert!(a.score.composite > 0.0 && a.score.composite <= 100.0);
    }
}
