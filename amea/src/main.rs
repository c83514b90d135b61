use amea::analysis::run_analysis;
use amea::analyzer::{health_check, OpenAiClient};
use amea::config::{
    is_chatgpt_configured, Config, LayeredSettings, SecretsFile, SessionSettings,
    DEFAULT_SECRETS_PATH, KEY_API_KEY, KEY_BASE_URL, KEY_FAILURE_POLICY, KEY_INDICATORS,
    KEY_MODEL, KEY_TEMPERATURE,
};
use amea::data::IndicatorStore;
use amea::report;
use amea::types::EngagementContext;
use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "amea",
    version,
    about = "Automated market entry analysis with ChatGPT and curated indicators"
)]
struct Cli {
    /// Client company name
    #[arg(long)]
    company: Option<String>,

    #[arg(long, default_value = "")]
    industry: String,

    /// Engagement use case, e.g. "Greenfield expansion"
    #[arg(long, default_value = "")]
    use_case: String,

    /// Comma-separated target markets
    #[arg(long, value_delimiter = ',')]
    markets: Vec<String>,

    /// Client priority label (repeatable), e.g. "Growth potential"
    #[arg(long = "priority")]
    priorities: Vec<String>,

    #[arg(long)]
    api_key: Option<String>,

    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    /// TOML secrets file
    #[arg(long, default_value = DEFAULT_SECRETS_PATH)]
    secrets_file: PathBuf,

    /// Load environment from a specific .env file
    #[arg(long)]
    config_file: Option<String>,

    /// Curated country indicator JSON (defaults to the bundled set)
    #[arg(long)]
    indicators: Option<PathBuf>,

    /// Use curated indicators for a market whose snapshot fails
    #[arg(long)]
    fallback_per_market: bool,

    /// Write the Markdown report here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also write the JSON export
    #[arg(long)]
    json: Option<PathBuf>,

    /// Check ChatGPT connectivity and exit
    #[arg(long)]
    health_check: bool,

    /// List markets with curated indicators and exit
    #[arg(long)]
    list_markets: bool,
}

impl Cli {
    /// Flags that override env and secrets for this session
    fn session(&self) -> SessionSettings {
        let mut session = SessionSettings::new();
        session
            .set(KEY_API_KEY, self.api_key.as_deref())
            .set(KEY_BASE_URL, self.base_url.as_deref())
            .set(KEY_MODEL, self.model.as_deref())
            .set(KEY_TEMPERATURE, self.temperature)
            .set(KEY_INDICATORS, self.indicators.as_ref().map(|p| p.display()))
            .set(KEY_FAILURE_POLICY, self.fallback_per_market.then_some("fallback"));
        session
    }
}

fn load_store(path: Option<&Path>) -> Result<IndicatorStore> {
    let store = match path {
        Some(p) => IndicatorStore::load(p)?,
        None => IndicatorStore::bundled()?,
    };
    info!("Curated indicators: {} markets", store.len());
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    Config::load_env_file(cli.config_file.as_deref());

    let secrets = SecretsFile::load(&cli.secrets_file)?;
    let settings = LayeredSettings::standard(cli.session(), true, secrets);
    let cfg = Config::resolve(&settings).context("invalid configuration")?;

    let store = load_store(cfg.indicators_path.as_deref())?;

    if cli.list_markets {
        for country in store.countries() {
            println!("{country}");
        }
        return Ok(());
    }

    let configured = is_chatgpt_configured(&cfg.chatgpt);
    let client = OpenAiClient::new(cfg.chatgpt.clone()).context("failed to build HTTP client")?;

    if cli.health_check {
        println!("{}", health_check(&client).await);
        return Ok(());
    }

    let Some(company) = cli.company.as_deref().filter(|c| !c.trim().is_empty()) else {
        bail!("--company is required");
    };
    if cli.markets.iter().all(|m| m.trim().is_empty()) {
        bail!("--markets needs at least one market");
    }

    info!("══════════════════════════════════════════════════════");
    info!("  AMEA: {company}");
    info!("  Markets: {}", cli.markets.join(", "));
    info!("  Model: {} | Failure policy: {}", cfg.chatgpt.model, cfg.market_failure_policy);
    info!("══════════════════════════════════════════════════════");
    if !configured {
        warn!(
            "OpenAI API key not set; set OPENAI_API_KEY, pass --api-key, or add it to {}",
            cli.secrets_file.display()
        );
    }

    let context = EngagementContext::new(company, &cli.industry, &cli.use_case, &cli.priorities);
    let analysis = run_analysis(&client, &store, cfg.market_failure_policy, context, &cli.markets)
        .await
        .context("market entry analysis failed")?;
    info!("ChatGPT spend: ${:.4}", client.total_cost());

    match &cli.output {
        Some(path) => {
            report::write_markdown(&analysis, path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Markdown report -> {}", path.display());
        }
        None => print!("{}", report::render_markdown(&analysis)),
    }
    if let Some(path) = &cli.json {
        report::write_json(&analysis, path).with_context(|| format!("writing {}", path.display()))?;
        info!("JSON export -> {}", path.display());
    }

    Ok(())
}
