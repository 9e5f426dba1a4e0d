use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

/// Default Gemini REST endpoint.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for text answers.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Origin of the local chat frontend.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AskConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub gemini: GeminiSettings,
    pub cors: CorsConfig,
    pub provider_error_policy: ProviderErrorPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "test" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("Unknown ENVIRONMENT '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// May be empty; a missing key only fails when a question is asked.
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub timeout_secs: Option<u64>,
}

impl GeminiSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
}

/// How a failed provider call is reported over HTTP. The body is always
/// `{"error": ...}`; only the status differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderErrorPolicy {
    /// 200 for every provider failure.
    #[default]
    AlwaysOk,
    /// A 4xx/5xx status derived from the failure kind.
    UpstreamStatus,
}

impl std::str::FromStr for ProviderErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "always_ok" => Ok(ProviderErrorPolicy::AlwaysOk),
            "upstream_status" => Ok(ProviderErrorPolicy::UpstreamStatus),
            other => Err(format!("Unknown PROVIDER_ERROR_POLICY '{}'", other)),
        }
    }
}

impl AskConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let timeout_secs = match env::var("GEMINI_TIMEOUT_SECS") {
            Ok(raw) => Some(raw.parse().map_err(|e: std::num::ParseIntError| {
                AppError::ConfigError(anyhow::anyhow!("GEMINI_TIMEOUT_SECS: {}", e))
            })?),
            Err(_) => None,
        };

        Ok(AskConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("ask-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            gemini: GeminiSettings {
                // Not validated here: a missing key surfaces on the first call.
                api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
                model: normalize_model(&get_env(
                    "GEMINI_MODEL",
                    Some(DEFAULT_GEMINI_MODEL),
                    is_prod,
                )?),
                api_base: get_env("GEMINI_API_BASE", Some(DEFAULT_GEMINI_API_BASE), is_prod)?,
                timeout_secs,
            },
            cors: CorsConfig {
                allowed_origin: get_env(
                    "CORS_ALLOWED_ORIGIN",
                    Some(DEFAULT_ALLOWED_ORIGIN),
                    is_prod,
                )?,
            },
            provider_error_policy: get_env("PROVIDER_ERROR_POLICY", Some("always_ok"), is_prod)?
                .parse()
                .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
        })
    }

    /// Settings for local runs and tests: defaults everywhere, ephemeral port.
    pub fn local(api_key: &str) -> Self {
        AskConfig {
            common: core_config::Config { port: 0 },
            environment: Environment::Dev,
            service_name: "ask-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            gemini: GeminiSettings {
                api_key: api_key.to_string(),
                model: DEFAULT_GEMINI_MODEL.to_string(),
                api_base: DEFAULT_GEMINI_API_BASE.to_string(),
                timeout_secs: None,
            },
            cors: CorsConfig {
                allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            },
            provider_error_policy: ProviderErrorPolicy::AlwaysOk,
        }
    }
}

/// Accept both `gemini-2.5-flash` and the SDK-style `models/gemini-2.5-flash`.
pub fn normalize_model(model: &str) -> String {
    model.trim().trim_start_matches("models/").to_string()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
