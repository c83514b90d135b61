use crate::analysis::types::CompanyBrief;
use crate::types::EngagementContext;
use std::fmt::Write;

/// System + user instruction pair sent to the model
#[derive(Debug, Clone, PartialEq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

const BRIEF_SYSTEM: &str = r#"You craft precise company briefs for market entry engagements, with no filler.

Output ONLY a JSON object with these exact keys:
{"profile_summary": "3 crisp sentences", "core_offerings": ["..."], "target_customers": ["..."], "competitive_position": ["..."], "growth_priorities": ["..."], "entry_considerations": ["..."], "key_risks": ["..."]}

RULES:
- profile_summary = who they serve, current positioning, and their main strategic lever
- every other key = an array of 2-4 short bullet strings
- If information is sparse, say so explicitly instead of inventing specifics
- Do NOT wrap in markdown code blocks."#;

const SNAPSHOT_SYSTEM: &str = r#"You are a senior strategy consultant producing market entry snapshots. Return compact, relevant analysis and respect the JSON structure exactly.

Output ONLY a JSON object with these exact keys:
{"summary": "2 sentences", "pestel": {"Political": ["..."], "Economic": ["..."], "Social": ["..."], "Technological": ["..."], "Environmental": ["..."], "Legal": ["..."]}, "scores": {"dimensions": {"growth": 0-100, "cost_efficiency": 0-100, "risk": 0-100, "sustainability": 0-100, "digital": 0-100}, "composite": 0-100}, "recent_signals": ["..."], "entry_mode": "one recommended entry mode", "turnaround_actions": {"risk theme": "mitigation"}, "recommendations": ["..."], "sources": ["..."]}

RULES:
- pestel = every one of the six dimensions, each an array of 2-4 short bullets
- scores = numbers only; higher is better (for risk, higher means lower exposure)
- recent_signals = dated news or data points from the last 12 months
- entry_mode = e.g. greenfield, joint venture, acquisition, partnership, distributor
- recommendations = exactly 3 bullets
- sources = publications or datasets backing the signals
- If data is sparse, state that explicitly. Avoid placeholders.
- Do NOT wrap in markdown code blocks."#;

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

pub fn company_brief_prompt(ctx: &EngagementContext) -> PromptPair {
    let user = format!(
        "Write an executive company brief for a market entry engagement:\n\
        Company: {}\n\
        Industry: {}\n\
        Use case: {}\n\
        Client priorities: {}\n\
        \n\
        Cover who they serve, how they are positioned, and what matters when entering new markets.",
        ctx.company,
        or_default(&ctx.industry, "General"),
        or_default(&ctx.use_case, "Market expansion"),
        ctx.priorities_text(),
    );
    PromptPair {
        system: BRIEF_SYSTEM.to_string(),
        user,
    }
}

/// Brief rendered as plain text for injection into later prompts
pub fn brief_context(brief: &CompanyBrief) -> String {
    let mut out = String::new();
    if !brief.profile_summary.is_empty() {
        let _ = writeln!(out, "{}", brief.profile_summary);
    }
    for (title, bullets) in brief.sections() {
        if bullets.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{title}: {}", bullets.join("; "));
    }
    out.trim_end().to_string()
}

pub fn market_snapshot_prompt(
    ctx: &EngagementContext,
    country: &str,
    brief: Option<&CompanyBrief>,
) -> PromptPair {
    let weights = ctx
        .priorities
        .iter()
        .map(|(key, weight)| format!("{key}={weight}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut user = format!(
        "Create a market entry snapshot:\n\
        Company: {}\n\
        Industry: {}\n\
        Use case: {}\n\
        Market: {country}\n\
        Priorities: {}\n\
        Priority weights: {weights}\n",
        ctx.company,
        or_default(&ctx.industry, "General"),
        or_default(&ctx.use_case, "Market expansion"),
        ctx.priorities_text(),
    );

    if let Some(brief) = brief {
        let context = brief_context(brief);
        if !context.is_empty() {
            let _ = write!(user, "\n=== COMPANY BRIEF ===\n{context}\n");
        }
    }

    user.push_str("\nUse realistic, timely signals and score the market for this company.");

    PromptPair {
        system: SNAPSHOT_SYSTEM.to_string(),
        user,
    }
}
