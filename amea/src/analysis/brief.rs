use crate::analysis::normalizer::normalize_brief;
use crate::analysis::prompts::company_brief_prompt;
use crate::analysis::types::CompanyBrief;
use crate::analyzer::ChatCompletion;
use crate::types::EngagementContext;
use tracing::{info, warn};

/// Company brief from the model, or the templated brief when the model is
/// unavailable or replies with nothing usable. Never fails.
pub async fn generate_company_brief(
    client: &dyn ChatCompletion,
    ctx: &EngagementContext,
) -> CompanyBrief {
    let prompt = company_brief_prompt(ctx);
    match client.complete(&prompt.system, &prompt.user, true).await {
        Ok(text) => {
            let brief = normalize_brief(&text);
            if brief.is_empty() {
                warn!("Company brief for {} was empty, using template", ctx.company);
                return fallback_brief(ctx);
            }
            info!("Company brief: {} ({} chars)", ctx.company, text.len());
            brief
        }
        Err(e) => {
            warn!("Company brief unavailable for {}: {e}", ctx.company);
            fallback_brief(ctx)
        }
    }
}

/// Deterministic brief built from the engagement inputs alone.
pub fn fallback_brief(ctx: &EngagementContext) -> CompanyBrief {
    let industry = if ctx.industry.is_empty() { "its industry" } else { ctx.industry.as_str() };
    let use_case = if ctx.use_case.is_empty() { "market expansion" } else { ctx.use_case.as_str() };

    CompanyBrief {
        profile_summary: format!(
            "{} operates in {industry} and is evaluating {} as its next step. \
            This brief was generated without model access, so it restates the engagement inputs only.",
            ctx.company,
            use_case.to_lowercase()
        ),
        core_offerings: vec![format!("Current {industry} portfolio of {}", ctx.company)],
        target_customers: vec![
            "Validate priority customer segments per market with local research".into(),
        ],
        competitive_position: vec![format!(
            "Benchmark {} against incumbents in each shortlisted market",
            ctx.company
        )],
        growth_priorities: vec![format!("Client priorities: {}", ctx.priorities_text())],
        entry_considerations: vec![format!("Use case under review: {use_case}")],
        key_risks: vec![
            "Model-generated context unavailable; confirm assumptions with primary sources".into(),
        ],
        fallback: true,
    }
}
