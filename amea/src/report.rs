use crate::analysis::types::{CompanyBrief, ComparativeAnalysis, MarketAnalysisResult};
use crate::analysis::scoring::SCORE_DIMENSIONS;
use serde::Serialize;
use std::fmt::Write;
use std::path::Path;

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn bullets(out: &mut String, items: &[String]) {
    for item in items {
        let _ = writeln!(out, "- {item}");
    }
}

/// Full analysis as a Markdown report.
pub fn render_markdown(analysis: &ComparativeAnalysis) -> String {
    let ctx = &analysis.context;
    let mut out = String::new();

    let _ = writeln!(out, "# Market Entry Analysis: {}\n", ctx.company);
    let _ = writeln!(out, "- **Industry:** {}", or_dash(&ctx.industry));
    let _ = writeln!(out, "- **Use case:** {}", or_dash(&ctx.use_case));
    let _ = writeln!(out, "- **Priorities:** {}", ctx.priorities_text());
    let _ = writeln!(out, "- **Run:** {}", analysis.run_id);
    let generated = analysis.generated_at.format("%Y-%m-%d %H:%M UTC");
    let _ = writeln!(out, "- **Generated:** {generated}");
    match analysis.best_market() {
        Some(best) => {
            let _ = writeln!(
                out,
                "- **Recommended market:** {} ({:.1}/100)",
                best.country, best.score.composite
            );
        }
        None => {
            let _ = writeln!(out, "- **Recommended market:** none analyzed");
        }
    }
    out.push('\n');

    if let Some(brief) = &analysis.company_brief {
        render_brief(&mut out, brief);
    }

    if !analysis.markets.is_empty() {
        render_scorecard(&mut out, analysis);
    }

    for market in &analysis.markets {
        render_market(&mut out, market);
    }

    out
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn render_brief(out: &mut String, brief: &CompanyBrief) {
    out.push_str("## Company Brief\n\n");
    if brief.fallback {
        out.push_str("_Generated from engagement inputs; ChatGPT was unavailable._\n\n");
    }
    if !brief.profile_summary.is_empty() {
        let _ = writeln!(out, "{}\n", brief.profile_summary);
    }
    for (title, items) in brief.sections() {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "**{title}**\n");
        bullets(out, items);
        out.push('\n');
    }
}

fn render_scorecard(out: &mut String, analysis: &ComparativeAnalysis) {
    out.push_str("## Scorecard\n\n");
    let mut header = String::from("| Rank | Market | Composite |");
    let mut rule = String::from("|---|---|---|");
    for key in SCORE_DIMENSIONS {
        let _ = write!(header, " {} |", title_case(key));
        rule.push_str("---|");
    }
    let _ = writeln!(out, "{header} Source |\n{rule}---|");

    for (rank, market) in analysis.ranking().into_iter().enumerate() {
        let _ = write!(
            out,
            "| {} | {} | {:.1} |",
            rank + 1,
            market.country,
            market.score.composite
        );
        for key in SCORE_DIMENSIONS {
            match market.score.dimension_scores.get(key) {
                Some(score) => {
                    let _ = write!(out, " {score:.1} |");
                }
                None => out.push_str(" - |"),
            }
        }
        let _ = writeln!(out, " {} |", market.origin);
    }
    out.push('\n');
}

fn render_market(out: &mut String, market: &MarketAnalysisResult) {
    let _ = writeln!(out, "## {}\n", market.country);
    if !market.summary.is_empty() {
        let _ = writeln!(out, "{}\n", market.summary);
    }
    let _ = writeln!(out, "- **Composite score:** {:.1}/100", market.score.composite);
    let _ = writeln!(out, "- **Entry mode:** {}", or_dash(&market.entry_mode));
    let _ = writeln!(out, "- **Source:** {}\n", market.origin);

    if !market.pestel.is_empty() {
        out.push_str("### PESTEL\n\n");
        for (dimension, items) in market.pestel.iter() {
            if items.is_empty() {
                continue;
            }
            let _ = writeln!(out, "**{dimension}**\n");
            bullets(out, items);
            out.push('\n');
        }
    }

    let lists = [
        ("Recent Signals", &market.news),
        ("Recommendations", &market.recommendations),
    ];
    for (heading, items) in lists {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "### {heading}\n");
        bullets(out, items);
        out.push('\n');
    }

    if !market.turnaround_actions.is_empty() {
        out.push_str("### Risk Mitigations\n\n");
        for (theme, action) in &market.turnaround_actions {
            let _ = writeln!(out, "- **{}:** {action}", title_case(theme));
        }
        out.push('\n');
    }

    if !market.sources.is_empty() {
        out.push_str("### Sources\n\n");
        bullets(out, &market.sources);
        out.push('\n');
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    #[serde(flatten)]
    analysis: &'a ComparativeAnalysis,
    best_market: Option<&'a str>,
}

/// Full analysis as pretty JSON with the derived `best_market`.
pub fn render_json(analysis: &ComparativeAnalysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonExport {
        analysis,
        best_market: analysis.best_market().map(|m| m.country.as_str()),
    })
}

pub fn write_markdown(analysis: &ComparativeAnalysis, path: &Path) -> std::io::Result<()> {
    std::fs::write(path, render_markdown(analysis))
}

pub fn write_json(analysis: &ComparativeAnalysis, path: &Path) -> std::io::Result<()> {
    let json = render_json(analysis).map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::heuristics::fallback_result;
    use crate::analysis::brief::fallback_brief;
    use crate::data::IndicatorStore;
    use crate::types::EngagementContext;

    fn analysis() -> ComparativeAnalysis {
        let store = IndicatorStore::bundled().unwrap();
        let labels = ["Growth potential".to_string()];
        let ctx = EngagementContext::new("SampleCo", "Retail", "Market expansion", &labels);
        let markets = ["Germany", "India"]
            .iter()
            .map(|c| fallback_result(store.get(c).unwrap(), &ctx))
            .collect();
        let brief = fallback_brief(&ctx);
        ComparativeAnalysis::new(ctx, markets, Some(brief))
    }

    #[test]
    fn markdown_has_every_section() {
        let analysis = analysis();
        let md = render_markdown(&analysis);
        assert!(md.starts_with("# Market Entry Analysis: SampleCo"));
        assert!(md.contains(&analysis.run_id.to_string()));
        assert!(md.contains("## Company Brief"));
        assert!(md.contains("| Rank | Market | Composite | Growth | Cost Efficiency |"));
        let headings = [
            "## Germany",
            "## India",
            "### PESTEL",
            "**Political**",
            "### Recent Signals",
            "### Sources",
        ];
        for heading in headings {
            assert!(md.contains(heading), "missing {heading}");
        }
        let best = analysis.best_market().unwrap();
        assert!(md.contains(&format!("**Recommended market:** {}", best.country)));
    }

    #[test]
    fn scorecard_is_ranked() {
        let analysis = analysis();
        let md = render_markdown(&analysis);
        let best = analysis.best_market().unwrap();
        assert!(md.contains(&format!("| 1 | {} |", best.country)));
    }

    #[test]
    fn empty_analysis_still_renders_header() {
        let ctx = EngagementContext::new("SampleCo", "", "", &[]);
        let md = render_markdown(&ComparativeAnalysis::new(ctx, vec![], None));
        assert!(md.contains("none analyzed"));
        assert!(md.contains("**Industry:** -"));
        assert!(!md.contains("## Scorecard"));
    }

    #[test]
    fn json_carries_best_market() {
        let analysis = analysis();
        let json = render_json(&analysis).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["best_market"], analysis.best_market().unwrap().country.as_str());
        assert_eq!(value["markets"].as_array().unwrap().len(), 2);
        assert_eq!(value["run_id"], analysis.run_id.to_string());
        assert_eq!(value["company_brief"]["fallback"], true);
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = analysis();
        let md = dir.path().join("report.md");
        let json = dir.path().join("report.json");
        write_markdown(&analysis, &md).unwrap();
        write_json(&analysis, &json).unwrap();
        assert!(std::fs::read_to_string(md).unwrap().contains("## Scorecard"));
        assert!(std::fs::read_to_string(json).unwrap().contains("\"best_market\""));
    }
}
