pub mod brief;
pub mod heuristics;
pub mod normalizer;
pub mod prompts;
pub mod recommendations;
pub mod scoring;
pub mod snapshot;
pub mod types;

pub use brief::{fallback_brief, generate_company_brief};
pub use snapshot::{assemble_result, request_snapshot};
pub use types::{CompanyBrief, ComparativeAnalysis, MarketAnalysisResult, ResultOrigin};

use crate::analyzer::{ChatCompletion, CompletionError};
use crate::config::MarketFailurePolicy;
use crate::data::IndicatorStore;
use crate::types::EngagementContext;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("ChatGPT is not configured; analysis of {market} cannot run")]
    NotConfigured { market: String },
    #[error("failed to generate ChatGPT snapshot for {market}: {source}")]
    Snapshot {
        market: String,
        #[source]
        source: CompletionError,
    },
}

impl AnalysisError {
    pub fn market(&self) -> &str {
        match self {
            AnalysisError::NotConfigured { market }
            | AnalysisError::Snapshot { market, .. } => market,
        }
    }
}

/// Run one engagement: company brief, then every market in order.
/// Markets are analyzed sequentially; blank names are skipped.
pub async fn run_analysis(
    client: &dyn ChatCompletion,
    store: &IndicatorStore,
    policy: MarketFailurePolicy,
    context: EngagementContext,
    markets: &[String],
) -> Result<ComparativeAnalysis, AnalysisError> {
    let markets: Vec<&str> = markets
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .collect();

    info!("═══ PHASE 1: COMPANY BRIEF ═══");
    let brief = generate_company_brief(client, &context).await;

    info!("═══ PHASE 2: MARKET SNAPSHOTS ({}) ═══", markets.len());
    let mut results = Vec::with_capacity(markets.len());
    for (i, market) in markets.iter().enumerate() {
        info!("[{}/{}] {market}", i + 1, markets.len());
        let indicators = store.get(market);

        match request_snapshot(client, &context, market, Some(&brief)).await {
            Ok((snapshot, raw)) => {
                let result = assemble_result(market, snapshot, raw, indicators, &context);
                info!(
                    "{market}: composite {:.1} | {} | {}",
                    result.score.composite, result.entry_mode, result.origin
                );
                results.push(result);
            }
            Err(CompletionError::NotConfigured) => {
                error!("{market}: ChatGPT not configured, aborting run");
                return Err(AnalysisError::NotConfigured {
                    market: market.to_string(),
                });
            }
            Err(e) => {
                let fallback = match policy {
                    MarketFailurePolicy::Fallback => {
                        snapshot::heuristic_market(indicators, &context)
                    }
                    MarketFailurePolicy::Abort => None,
                };
                match fallback {
                    Some(result) => {
                        warn!("{market}: snapshot failed ({e}), using curated indicators");
                        results.push(result);
                    }
                    None => {
                        error!("{market}: snapshot failed: {e}");
                        return Err(AnalysisError::Snapshot {
                            market: market.to_string(),
                            source: e,
                        });
                    }
                }
            }
        }
    }

    let analysis = ComparativeAnalysis::new(context, results, Some(brief));
    info!("═══ PHASE 3: COMPARISON ═══");
    if let Some(best) = analysis.best_market() {
        info!("Recommended market: {} ({:.1})", best.country, best.score.composite);
    }
    Ok(analysis)
}
