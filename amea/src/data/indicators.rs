use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Curated dataset compiled into the binary.
const BUNDLED_INDICATORS: &str = include_str!("country_indicators.json");

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("failed to read indicator file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid indicator data in {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Quantitative indicators, curated narratives and citations for one country
#[derive(Debug, Clone, Serialize)]
pub struct CountryIndicator {
    pub name: String,
    pub indicators: HashMap<String, f64>,
    /// Keyed by lowercase PESTEL dimension, plus `news` for curated recent signals
    pub narratives: HashMap<String, Vec<String>>,
    pub sources: Vec<String>,
}

impl CountryIndicator {
    pub fn indicator(&self, key: &str, default: f64) -> f64 {
        self.indicators.get(key).copied().unwrap_or(default)
    }

    pub fn narrative(&self, key: &str) -> &[String] {
        self.narratives.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Deserialize)]
struct RawCountry {
    #[serde(default)]
    indicators: HashMap<String, f64>,
    #[serde(default)]
    narratives: HashMap<String, Vec<String>>,
    #[serde(default)]
    sources: Vec<String>,
}

/// Read-only country -> indicator mapping, loaded once per process.
#[derive(Debug, Clone, Default)]
pub struct IndicatorStore {
    countries: BTreeMap<String, CountryIndicator>,
}

impl IndicatorStore {
    pub fn bundled() -> Result<Self, IndicatorError> {
        Self::from_json(BUNDLED_INDICATORS, "bundled dataset")
    }

    pub fn load(path: &Path) -> Result<Self, IndicatorError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndicatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text, &path.display().to_string())
    }

    pub fn from_json(text: &str, origin: &str) -> Result<Self, IndicatorError> {
        let raw: BTreeMap<String, RawCountry> =
            serde_json::from_str(text).map_err(|source| IndicatorError::Parse {
                origin: origin.to_string(),
                source,
            })?;

        let countries: BTreeMap<_, _> = raw
            .into_iter()
            .map(|(name, payload)| {
                let entry = CountryIndicator {
                    name: name.clone(),
                    indicators: payload.indicators,
                    narratives: payload.narratives,
                    sources: payload.sources,
                };
                (name, entry)
            })
            .collect();

        debug!("Indicator store: {} countries from {origin}", countries.len());
        Ok(Self { countries })
    }

    /// Case-insensitive country lookup
    pub fn get(&self, country: &str) -> Option<&CountryIndicator> {
        let country = country.trim();
        self.countries.get(country).or_else(|| {
            self.countries
                .values()
                .find(|c| c.name.eq_ignore_ascii_case(country))
        })
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> + '_ {
        self.countries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
