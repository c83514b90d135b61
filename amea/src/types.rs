use serde::{Deserialize, Serialize};
use std::fmt;

/// The six fixed PESTEL analysis dimensions, in report order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PestelDimension {
    Political,
    Economic,
    Social,
    Technological,
    Environmental,
    Legal,
}

impl PestelDimension {
    pub const ALL: [PestelDimension; 6] = [
        PestelDimension::Political,
        PestelDimension::Economic,
        PestelDimension::Social,
        PestelDimension::Technological,
        PestelDimension::Environmental,
        PestelDimension::Legal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PestelDimension::Political => "Political",
            PestelDimension::Economic => "Economic",
            PestelDimension::Social => "Social",
            PestelDimension::Technological => "Technological",
            PestelDimension::Environmental => "Environmental",
            PestelDimension::Legal => "Legal",
        }
    }

    /// Lowercase key used by the curated narrative dataset
    pub fn key(self) -> &'static str {
        match self {
            PestelDimension::Political => "political",
            PestelDimension::Economic => "economic",
            PestelDimension::Social => "social",
            PestelDimension::Technological => "technological",
            PestelDimension::Environmental => "environmental",
            PestelDimension::Legal => "legal",
        }
    }
}

impl fmt::Display for PestelDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// PESTEL bullets with all six dimensions always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pestel {
    #[serde(rename = "Political", default)]
    pub political: Vec<String>,
    #[serde(rename = "Economic", default)]
    pub economic: Vec<String>,
    #[serde(rename = "Social", default)]
    pub social: Vec<String>,
    #[serde(rename = "Technological", default)]
    pub technological: Vec<String>,
    #[serde(rename = "Environmental", default)]
    pub environmental: Vec<String>,
    #[serde(rename = "Legal", default)]
    pub legal: Vec<String>,
}

impl Pestel {
    pub fn get(&self, dimension: PestelDimension) -> &[String] {
        match dimension {
            PestelDimension::Political => &self.political,
            PestelDimension::Economic => &self.economic,
            PestelDimension::Social => &self.social,
            PestelDimension::Technological => &self.technological,
            PestelDimension::Environmental => &self.environmental,
            PestelDimension::Legal => &self.legal,
        }
    }

    pub fn get_mut(&mut self, dimension: PestelDimension) -> &mut Vec<String> {
        match dimension {
            PestelDimension::Political => &mut self.political,
            PestelDimension::Economic => &mut self.economic,
            PestelDimension::Social => &mut self.social,
            PestelDimension::Technological => &mut self.technological,
            PestelDimension::Environmental => &mut self.environmental,
            PestelDimension::Legal => &mut self.legal,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (PestelDimension, &[String])> + '_ {
        PestelDimension::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, bullets)| bullets.is_empty())
    }
}

/// Human-readable priority labels offered to users, mapped to score keys.
pub const PRIORITY_LABELS: [(&str, &str); 7] = [
    ("Growth potential", "growth"),
    ("Growth", "growth"),
    ("Cost efficiency", "cost_efficiency"),
    ("Risk mitigation", "risk"),
    ("Sustainability", "sustainability"),
    ("Digital acceleration", "digital"),
    ("Digital", "digital"),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeight {
    pub key: String,
    pub weight: f64,
}

/// Ordered priority key -> weight mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights(Vec<PriorityWeight>);

impl Default for PriorityWeights {
    fn default() -> Self {
        Self(vec![
            PriorityWeight { key: "growth".to_string(), weight: 1.0 },
            PriorityWeight { key: "risk".to_string(), weight: 1.0 },
        ])
    }
}

impl PriorityWeights {
    /// Resolve user-facing labels into weights (1.0 each, first occurrence wins).
    /// Unknown labels pass through as their own key. No labels -> growth + risk.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let mut weights: Vec<PriorityWeight> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            let key = PRIORITY_LABELS
                .iter()
                .find(|(l, k)| l.eq_ignore_ascii_case(label) || k.eq_ignore_ascii_case(label))
                .map(|(_, k)| k.to_string())
                .unwrap_or_else(|| label.to_string());
            if !weights.iter().any(|w| w.key == key) {
                weights.push(PriorityWeight { key, weight: 1.0 });
            }
        }
        if weights.is_empty() {
            return Self::default();
        }
        Self(weights)
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(key, weight)| PriorityWeight { key: key.into(), weight })
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.0.iter().map(|w| (w.key.as_str(), w.weight))
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.iter().find(|w| w.key == key).map(|w| w.weight)
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|w| w.weight).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Highest-weighted priority, first on ties.
    pub fn top(&self) -> Option<&str> {
        let mut best: Option<&PriorityWeight> = None;
        for w in &self.0 {
            if best.map_or(true, |b| w.weight > b.weight) {
                best = Some(w);
            }
        }
        best.map(|w| w.key.as_str())
    }

    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|w| w.key.as_str()).collect()
    }
}

/// Engagement parameters for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngagementContext {
    pub company: String,
    pub industry: String,
    pub use_case: String,
    pub priority_labels: Vec<String>,
    pub priorities: PriorityWeights,
}

impl EngagementContext {
    pub fn new(company: &str, industry: &str, use_case: &str, priority_labels: &[String]) -> Self {
        Self {
            company: company.trim().to_string(),
            industry: industry.trim().to_string(),
            use_case: use_case.trim().to_string(),
            priority_labels: priority_labels.to_vec(),
            priorities: PriorityWeights::from_labels(priority_labels),
        }
    }

    /// Priority labels as prompt text
    pub fn priorities_text(&self) -> String {
        if self.priority_labels.is_empty() {
            self.priorities.keys().join(", ")
        } else {
            self.priority_labels.join(", ")
        }
    }
}
