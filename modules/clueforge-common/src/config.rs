use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::info;

use crate::error::ClueError;
use crate::types::WordplayMechanism;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Model gateway
    pub gateway_api_key: String,
    pub gateway_base_url: String,

    // Model tiers: logic drafts, solves and judges; surface writes prose.
    pub logic_model_id: String,
    pub surface_model_id: String,

    pub call_timeout: Duration,
    pub temperature: f32,

    // Word supply
    pub word_pools_dir: PathBuf,
    pub dictionary_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ClueError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reading from an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClueError> {
        let shared_model = lookup("MODEL_ID");
        let logic_model_id = lookup("LOGIC_MODEL_ID")
            .or_else(|| shared_model.clone())
            .ok_or_else(|| {
                ClueError::Config("LOGIC_MODEL_ID or MODEL_ID environment variable is required".into())
            })?;
        let surface_model_id = lookup("SURFACE_MODEL_ID")
            .or(shared_model)
            .unwrap_or_else(|| logic_model_id.clone());

        let call_timeout_secs: u64 = parse_or(&lookup, "CALL_TIMEOUT_SECS", 60)?;
        if call_timeout_secs == 0 {
            return Err(ClueError::Config("CALL_TIMEOUT_SECS must be positive".into()));
        }

        Ok(Self {
            gateway_api_key: required(&lookup, "GATEWAY_API_KEY")?,
            gateway_base_url: lookup("GATEWAY_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            logic_model_id,
            surface_model_id,
            call_timeout: Duration::from_secs(call_timeout_secs),
            temperature: parse_or(&lookup, "TEMPERATURE", 0.5)?,
            word_pools_dir: lookup("WORD_POOLS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("word_pools")),
            dictionary_path: lookup("DICTIONARY_PATH").map(PathBuf::from),
        })
    }

    /// Log the loaded configuration without secrets.
    pub fn log_redacted(&self) {
        let key = &self.gateway_api_key;
        let masked = if key.is_ascii() && key.len() > 8 {
            format!("{}...{}", &key[..4], &key[key.len() - 4..])
        } else {
            "****".to_string()
        };
        info!(
            gateway_base_url = %self.gateway_base_url,
            gateway_api_key = %masked,
            logic_model = %self.logic_model_id,
            surface_model = %self.surface_model_id,
            call_timeout_secs = self.call_timeout.as_secs(),
            temperature = self.temperature,
            word_pools_dir = %self.word_pools_dir.display(),
            dictionary = ?self.dictionary_path,
            "Loaded configuration"
        );
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ClueError> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ClueError::Config(format!("{key} environment variable is required")))
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ClueError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ClueError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

// =============================================================================
// Pipeline policy
// =============================================================================

/// How the referee compares a solver's answer with the intended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefereeMode {
    /// Exact match after normalization.
    #[default]
    Strict,
    /// Edit-distance similarity of at least 0.90.
    Lenient,
}

/// Retry limits and timeouts for one candidate's run through the lifecycle.
#[derive(Debug, Clone)]
pub struct PipelinePolicy {
    pub max_mechanical_attempts: u32,
    pub max_regenerations: u32,
    pub referee_mode: RefereeMode,
    pub call_timeout: Duration,
}

impl Default for PipelinePolicy {
    fn default() -> Self {
        Self {
            max_mechanical_attempts: 3,
            max_regenerations: 1,
            referee_mode: RefereeMode::Strict,
            call_timeout: Duration::from_secs(60),
        }
    }
}

// =============================================================================
// Batch plan
// =============================================================================

/// Which mechanisms the scheduler may request from the word supply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MechanismFilter {
    /// Whatever the supply has.
    #[default]
    Any,
    /// Cycle through these, in order, one per drawn word.
    Only(Vec<WordplayMechanism>),
}

impl MechanismFilter {
    /// Parse a comma-separated list such as `anagram,hidden_word`.
    pub fn parse_list(raw: &str) -> Result<Self, ClueError> {
        let mechanisms = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<WordplayMechanism>, _>>()?;
        if mechanisms.is_empty() {
            Ok(Self::Any)
        } else {
            Ok(Self::Only(mechanisms))
        }
    }

    pub fn allows(&self, mechanism: WordplayMechanism) -> bool {
        match self {
            Self::Any => true,
            Self::Only(list) => list.contains(&mechanism),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub target_pass_count: usize,
    pub batch_size: usize,
    pub max_concurrency: usize,
    pub mechanisms: MechanismFilter,
}

impl BatchPlan {
    pub fn new(target_pass_count: usize) -> Self {
        Self {
            target_pass_count,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ClueError> {
        if self.batch_size == 0 {
            return Err(ClueError::Config("batch size must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(ClueError::Config("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

impl Default for BatchPlan {
    fn default() -> Self {
        Self {
            target_pass_count: 10,
            batch_size: 5,
            max_concurrency: 3,
            mechanisms: MechanismFilter::Any,
        }
    }
}
