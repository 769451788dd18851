//! Advisor configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/finsight/config/finsight.toml)
//! 2. The embedded defaults compiled into the binary
//!
//! Values missing from an override keep their defaults. The LLM API key is
//! only ever taken from the environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/finsight.toml");

/// Environment variable holding the LLM API key
pub const API_KEY_ENV: &str = "FINSIGHT_LLM_API_KEY";
/// Environment variable overriding the LLM base URL
pub const BASE_URL_ENV: &str = "FINSIGHT_LLM_BASE_URL";
/// Environment variable overriding the LLM model
pub const MODEL_ENV: &str = "FINSIGHT_LLM_MODEL";

/// Key value shipped in sample configs; treated as "no key"
pub const PLACEHOLDER_API_KEY: &str = "your-groq-api-key-here";

/// Numeric thresholds used by insights, recommendations and chat rules
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub budget_near_limit: f64,
    pub budget_over_limit: f64,
    pub low_savings_rate: f64,
    pub target_savings_rate: f64,
    pub investing_savings_rate: f64,
    pub emergency_fund_months: u32,
    pub large_expense_income_share: f64,
    pub high_spending_income_share: f64,
    pub min_trend_transactions: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            budget_near_limit: 80.0,
            budget_over_limit: 100.0,
            low_savings_rate: 10.0,
            target_savings_rate: 20.0,
            investing_savings_rate: 15.0,
            emergency_fund_months: 6,
            large_expense_income_share: 0.3,
            high_spending_income_share: 0.8,
            min_trend_transactions: 10,
        }
    }
}

/// Settings for the chat-completions call
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
    pub system_prompt: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            model: "mixtral-8x7b-32768".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
            system_prompt: "You are a helpful financial advisor AI assistant. \
                Provide practical, actionable financial advice."
                .to_string(),
        }
    }
}

/// Complete advisor configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvisorConfig {
    pub thresholds: Thresholds,
    pub llm: LlmConfig,
}

impl AdvisorConfig {
    /// Load config, preferring `path`, then the data-dir override, then defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path {
            Some(path) => fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", path.display(), e))
            })?,
            None => match default_config_path() {
                Some(default_path) if default_path.exists() => {
                    fs::read_to_string(&default_path).map_err(|e| {
                        Error::Config(format!("Failed to read {}: {}", default_path.display(), e))
                    })?
                }
                _ => DEFAULT_CONFIG.to_string(),
            },
        };

        let mut config = parse_config(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Embedded defaults only
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    fn apply_env(&mut self) {
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            self.llm.base_url = url;
        }
        if let Some(model) = non_empty_env(MODEL_ENV) {
            self.llm.model = model;
        }
    }
}

/// Read the LLM API key, ignoring blanks and the sample placeholder
pub fn api_key_from_env() -> Option<String> {
    non_empty_env(API_KEY_ENV).filter(|key| key != PLACEHOLDER_API_KEY)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsight").join("config").join("finsight.toml"))
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    thresholds: Option<RawThresholds>,
    llm: Option<RawLlm>,
}

#[derive(Debug, Deserialize)]
struct RawThresholds {
    budget_near_limit: Option<f64>,
    budget_over_limit: Option<f64>,
    low_savings_rate: Option<f64>,
    target_savings_rate: Option<f64>,
    investing_savings_rate: Option<f64>,
    emergency_fund_months: Option<u32>,
    large_expense_income_share: Option<f64>,
    high_spending_income_share: Option<f64>,
    min_trend_transactions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct RawLlm {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    timeout_secs: Option<u64>,
    system_prompt: Option<String>,
}

/// Parse config from TOML content, filling gaps with defaults
fn parse_config(content: &str) -> Result<AdvisorConfig> {
    let raw: RawConfig =
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = AdvisorConfig::default();

    if let Some(t) = raw.thresholds {
        let th = &mut config.thresholds;
        if let Some(v) = t.budget_near_limit {
            th.budget_near_limit = v;
        }
        if let Some(v) = t.budget_over_limit {
            th.budget_over_limit = v;
        }
        if let Some(v) = t.low_savings_rate {
            th.low_savings_rate = v;
        }
        if let Some(v) = t.target_savings_rate {
            th.target_savings_rate = v;
        }
        if let Some(v) = t.investing_savings_rate {
            th.investing_savings_rate = v;
        }
        if let Some(v) = t.emergency_fund_months {
            th.emergency_fund_months = v;
        }
        if let Some(v) = t.large_expense_income_share {
            th.large_expense_income_share = v;
        }
        if let Some(v) = t.high_spending_income_share {
            th.high_spending_income_share = v;
        }
        if let Some(v) = t.min_trend_transactions {
            th.min_trend_transactions = v;
        }
    }

    if let Some(l) = raw.llm {
        let llm = &mut config.llm;
        if let Some(v) = l.base_url {
            llm.base_url = v;
        }
        if let Some(v) = l.model {
            llm.model = v;
        }
        if let Some(v) = l.max_tokens {
            llm.max_tokens = v;
        }
        if let Some(v) = l.temperature {
            llm.temperature = v;
        }
        if let Some(v) = l.timeout_secs {
            llm.timeout = Duration::from_secs(v);
        }
        if let Some(v) = l.system_prompt {
            llm.system_prompt = v;
        }
    }

    if config.thresholds.budget_near_limit > config.thresholds.budget_over_limit {
        return Err(Error::Config(
            "budget_near_limit must not exceed budget_over_limit".into(),
        ));
    }

    Ok(config)
}
