use crate::analysis::heuristics::{fallback_result, generate_pestel, heuristic_scores};
use crate::analysis::normalizer::normalize;
use crate::analysis::prompts::market_snapshot_prompt;
use crate::analysis::recommendations::{build_mitigations, select_entry_mode};
use crate::analysis::types::{CompanyBrief, MarketAnalysisResult, MarketSnapshot, ResultOrigin};
use crate::analyzer::{ChatCompletion, CompletionError};
use crate::data::CountryIndicator;
use crate::types::{EngagementContext, PestelDimension};
use tracing::{debug, info};

/// Ask the model for one market's snapshot and normalize the reply.
/// Returns the snapshot with the raw reply text.
pub async fn request_snapshot(
    client: &dyn ChatCompletion,
    ctx: &EngagementContext,
    country: &str,
    brief: Option<&CompanyBrief>,
) -> Result<(MarketSnapshot, String), CompletionError> {
    let prompt = market_snapshot_prompt(ctx, country, brief);
    let raw = client.complete(&prompt.system, &prompt.user, true).await?;
    let snapshot = normalize(&raw);
    if snapshot.is_empty() {
        let excerpt: String = raw.chars().take(200).collect();
        return Err(CompletionError::MalformedPayload(format!(
            "no usable fields in snapshot reply: {excerpt}"
        )));
    }
    debug!("Snapshot {country}: {} chars", raw.len());
    Ok((snapshot, raw))
}

/// Turn a normalized snapshot into a market result. When curated indicators
/// exist for the country, fields the model left empty are filled from them.
pub fn assemble_result(
    country: &str,
    snapshot: MarketSnapshot,
    raw: String,
    indicators: Option<&CountryIndicator>,
    ctx: &EngagementContext,
) -> MarketAnalysisResult {
    let MarketSnapshot {
        summary,
        mut pestel,
        scores,
        mut recent_signals,
        mut entry_mode,
        mut mitigations,
        recommendations,
        mut sources,
    } = snapshot;

    let mut filled: Vec<&str> = Vec::new();
    let mut score = scores;

    if let Some(indicators) = indicators {
        let heuristic_pestel = generate_pestel(indicators, ctx);
        for dimension in PestelDimension::ALL {
            let bullets = pestel.get_mut(dimension);
            if bullets.is_empty() {
                *bullets = heuristic_pestel.get(dimension).to_vec();
                filled.push(dimension.key());
            }
        }

        if !score.has_dimensions() && score.composite == 0.0 {
            score = heuristic_scores(indicators, ctx);
            filled.push("scores");
        }
        if recent_signals.is_empty() {
            recent_signals = indicators.narrative("news").to_vec();
            if !recent_signals.is_empty() {
                filled.push("signals");
            }
        }
        if sources.is_empty() && !indicators.sources.is_empty() {
            sources = indicators.sources.clone();
            filled.push("sources");
        }
    }

    let score = score.reweighted(&ctx.priorities);

    let has_scores = score.has_dimensions() || score.composite > 0.0;
    if entry_mode.is_empty() && has_scores {
        entry_mode = select_entry_mode(score.composite, &ctx.use_case);
        filled.push("entry_mode");
    }
    if mitigations.is_empty() && score.has_dimensions() {
        mitigations = build_mitigations(&score);
        if !mitigations.is_empty() {
            filled.push("mitigations");
        }
    }

    let origin = if filled.is_empty() {
        ResultOrigin::Model
    } else {
        info!("{country}: filled {} from curated indicators", filled.join(", "));
        ResultOrigin::ModelWithHeuristics
    };

    MarketAnalysisResult {
        country: country.to_string(),
        summary,
        pestel,
        score,
        news: recent_signals,
        entry_mode,
        turnaround_actions: mitigations,
        recommendations,
        sources,
        origin,
        raw_response: raw,
    }
}

/// Heuristic stand-in for a failed market, when the store knows the country.
pub fn heuristic_market(
    indicators: Option<&CountryIndicator>,
    ctx: &EngagementContext,
) -> Option<MarketAnalysisResult> {
    indicators.map(|country| fallback_result(country, ctx))
}
