use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub scan: ScanConfig,
    pub matching: MatchingConfig,
    pub arbitrage: ArbitrageConfig,
    pub stats: StatsConfig,
    #[serde(default)]
    pub manifold: ManifoldConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    pub interval_seconds: u64,
    pub recovery_seconds: u64,
    pub event_limit: usize,
    pub resolution_horizon_days: i64,
    pub debug: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MatchingConfig {
    pub title_similarity_threshold: f64,
    pub date_tolerance_days: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ArbitrageConfig {
    pub min_profit_pct: f64,
    pub alert_cooldown_seconds: u64,
    pub order_size_usd: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StatsConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ManifoldConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::Environment::with_prefix("ARB").separator("__"));

        // Secrets come from their conventional environment variables
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            settings = settings.set_override("telegram.bot_token", token)?;
        }
        if let Ok(chat_id) = std::env::var("TELEGRAM_CHAT_ID") {
            settings = settings.set_override("telegram.chat_id", chat_id)?;
        }
        if let Ok(key) = std::env::var("MANIFOLD_API_KEY") {
            settings = settings.set_override("manifold.api_key", key)?;
        }

        // DEBUG=1/true/yes flips verbose output, matching the usual convention
        if let Ok(debug) = std::env::var("DEBUG") {
            let on = matches!(debug.trim().to_lowercase().as_str(), "1" | "true" | "yes");
            settings = settings.set_override("scan.debug", on)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }
}
