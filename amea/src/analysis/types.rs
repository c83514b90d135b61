use crate::analysis::scoring::ScoreBreakdown;
use crate::types::{EngagementContext, Pestel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Best-effort structure recovered from a market snapshot reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub summary: String,
    pub pestel: Pestel,
    pub scores: ScoreBreakdown,
    pub recent_signals: Vec<String>,
    pub entry_mode: String,
    pub mitigations: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    pub sources: Vec<String>,
}

impl MarketSnapshot {
    /// True when nothing usable was recovered (callers fall back)
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Where a market result's content came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    Model,
    ModelWithHeuristics,
    Heuristic,
}

impl fmt::Display for ResultOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultOrigin::Model => write!(f, "ChatGPT"),
            ResultOrigin::ModelWithHeuristics => write!(f, "ChatGPT + curated indicators"),
            ResultOrigin::Heuristic => write!(f, "curated indicators (fallback)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysisResult {
    pub country: String,
    pub summary: String,
    pub pestel: Pestel,
    pub score: ScoreBreakdown,
    pub news: Vec<String>,
    pub entry_mode: String,
    /// Risk theme -> mitigation
    pub turnaround_actions: BTreeMap<String, String>,
    pub recommendations: Vec<String>,
    pub sources: Vec<String>,
    pub origin: ResultOrigin,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_response: String,
}

/// Section keys and report titles of the company brief, in order
pub const BRIEF_SECTIONS: [(&str, &str); 6] = [
    ("core_offerings", "Core offerings"),
    ("target_customers", "Target customers"),
    ("competitive_position", "Competitive position"),
    ("growth_priorities", "Growth priorities"),
    ("entry_considerations", "Entry considerations"),
    ("key_risks", "Key risks"),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyBrief {
    pub profile_summary: String,
    pub core_offerings: Vec<String>,
    pub target_customers: Vec<String>,
    pub competitive_position: Vec<String>,
    pub growth_priorities: Vec<String>,
    pub entry_considerations: Vec<String>,
    pub key_risks: Vec<String>,
    /// Built from the deterministic template rather than the model
    #[serde(default)]
    pub fallback: bool,
}

impl CompanyBrief {
    pub fn section(&self, key: &str) -> &[String] {
        match key {
            "core_offerings" => &self.core_offerings,
            "target_customers" => &self.target_customers,
            "competitive_position" => &self.competitive_position,
            "growth_priorities" => &self.growth_priorities,
            "entry_considerations" => &self.entry_considerations,
            "key_risks" => &self.key_risks,
            _ => &[],
        }
    }

    pub fn section_mut(&mut self, key: &str) -> Option<&mut Vec<String>> {
        match key {
            "core_offerings" => Some(&mut self.core_offerings),
            "target_customers" => Some(&mut self.target_customers),
            "competitive_position" => Some(&mut self.competitive_position),
            "growth_priorities" => Some(&mut self.growth_priorities),
            "entry_considerations" => Some(&mut self.entry_considerations),
            "key_risks" => Some(&mut self.key_risks),
            _ => None,
        }
    }

    /// (title, bullets) for each of the six sections
    pub fn sections(&self) -> impl Iterator<Item = (&'static str, &[String])> + '_ {
        BRIEF_SECTIONS
            .iter()
            .map(move |(key, title)| (*title, self.section(key)))
    }

    pub fn is_empty(&self) -> bool {
        self.profile_summary.is_empty() && self.sections().all(|(_, b)| b.is_empty())
    }
}

/// Full output of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparativeAnalysis {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub context: EngagementContext,
    pub markets: Vec<MarketAnalysisResult>,
    pub company_brief: Option<CompanyBrief>,
}

impl ComparativeAnalysis {
    pub fn new(
        context: EngagementContext,
        markets: Vec<MarketAnalysisResult>,
        company_brief: Option<CompanyBrief>,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            context,
            markets,
            company_brief,
        }
    }

    /// Highest composite score; the earliest market wins ties.
    pub fn best_market(&self) -> Option<&MarketAnalysisResult> {
        let mut best: Option<&MarketAnalysisResult> = None;
        for market in &self.markets {
            if best.map_or(true, |b| market.score.composite > b.score.composite) {
                best = Some(market);
            }
        }
        best
    }

    /// Markets ordered by composite score, descending (stable for ties)
    pub fn ranking(&self) -> Vec<&MarketAnalysisResult> {
        let mut ranked: Vec<_> = self.markets.iter().collect();
        ranked.sort_by(|a, b| b.score.composite.total_cmp(&a.score.composite));
        ranked
    }
}
