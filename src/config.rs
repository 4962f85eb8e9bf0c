//! Configuration for the gateway, its providers and rate limiting
//!
//! Built once at startup and shared read-only; no other module reads
//! the process environment.

use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::debug;

use crate::error::Error;
use crate::Provider;

/// Fixed bound on every outbound provider call.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

/// Per-provider credentials and endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig
{   /// API key; empty means not configured
    pub api_key: String
  , /// Model identifier sent to the provider
    pub model: String
  , /// API base URL (scheme + host, no trailing slash)
    pub api_base: String
}

impl ProviderConfig
{   /// Public endpoint and default model for `provider`, no key.
    pub fn defaults_for(provider: Provider) -> Self
    {   let (model, api_base) = match provider
        {   Provider::Gemini => (
              "gemini-1.5-flash"
            , "https://generativelanguage.googleapis.com"
            )
          , Provider::OpenAi => (
              "gpt-4o-mini"
            , "https://api.openai.com"
            )
          , Provider::Claude => (
              "claude-haiku-4-5-20251001"
            , "https://api.anthropic.com"
            )
        };
        ProviderConfig
        {   api_key: String::new()
          , model: model.to_string()
          , api_base: api_base.to_string()
        }
    }

    /// A provider is configured iff it has a non-empty key
    pub fn is_configured(&self) -> bool
    {   !self.api_key.is_empty()
    }
}

/// The three provider configurations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig
{   pub gemini: ProviderConfig
  , pub openai: ProviderConfig
  , pub claude: ProviderConfig
}

impl ProvidersConfig
{   pub fn get(&self, provider: Provider) -> &ProviderConfig
    {   match provider
        {   Provider::Gemini => &self.gemini
          , Provider::OpenAi => &self.openai
          , Provider::Claude => &self.claude
        }
    }
}

impl Default for ProvidersConfig
{   fn default() -> Self
    {   ProvidersConfig
        {   gemini: ProviderConfig::defaults_for(Provider::Gemini)
          , openai: ProviderConfig::defaults_for(Provider::OpenAi)
          , claude: ProviderConfig::defaults_for(Provider::Claude)
        }
    }
}

/// Rate limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig
{   /// Window length in milliseconds
    pub window_ms: u64
  , /// Maximum accepted requests per key per window
    pub max_requests: u32
}

impl RateLimitConfig
{   pub fn window(&self) -> Duration
    {   Duration::from_millis(self.window_ms)
    }
}

impl Default for RateLimitConfig
{   fn default() -> Self
    {   RateLimitConfig
        {   window_ms: 60_000
          , max_requests: 30
        }
    }
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig
{   /// Listening port
    pub port: u16
  , /// Deployment environment name, reported by `/health`
    pub env: String
  , /// Shared secret expected in `X-App-Secret`; empty disables the check
    pub app_secret: String
  , pub providers: ProvidersConfig
  , pub rate_limit: RateLimitConfig
}

impl Default for GatewayConfig
{   fn default() -> Self
    {   GatewayConfig
        {   port: 3000
          , env: "development".to_string()
          , app_secret: String::new()
          , providers: ProvidersConfig::default()
          , rate_limit: RateLimitConfig::default()
        }
    }
}

impl GatewayConfig
{   /// Load from the process environment, after reading `.env` if
    /// one exists.
    pub fn from_env() -> Result<Self, Error>
    {   match dotenvy::dotenv()
        {   Ok(path) => debug!("Loaded {}", path.display())
          , Err(e) => debug!("No .env file loaded: {}", e)
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable lookup. Unset or empty variables fall
    /// back to defaults; unparsable numbers are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where F: Fn(&str) -> Option<String>
    {   let var = |name: &str| lookup(name)
          .map(|v| v.trim().to_string())
          .filter(|v| !v.is_empty());

        let mut config = GatewayConfig::default();

        if let Some(port) = var("PORT")
        {   config.port = parse_number("PORT", &port)?;
        }
        if let Some(env) = var("APP_ENV")
        {   config.env = env;
        }
        if let Some(secret) = var("APP_SECRET")
        {   config.app_secret = secret;
        }

        for (provider, prefix) in [
            (Provider::Gemini, "GEMINI")
          , (Provider::OpenAi, "OPENAI")
          , (Provider::Claude, "CLAUDE")
          ]
        {   let mut provider_config
              = ProviderConfig::defaults_for(provider);
            if let Some(key) = var(&format!("{}_API_KEY", prefix))
            {   provider_config.api_key = key;
            }
            if let Some(model) = var(&format!("{}_MODEL", prefix))
            {   provider_config.model = model;
            }
            if let Some(base) = var(&format!("{}_API_BASE", prefix))
            {   provider_config.api_base
                  = base.trim_end_matches('/').to_string();
            }
            match provider
            {   Provider::Gemini => {
                  config.providers.gemini = provider_config
                }
              , Provider::OpenAi => {
                  config.providers.openai = provider_config
                }
              , Provider::Claude => {
                  config.providers.claude = provider_config
                }
            }
        }

        if let Some(window) = var("RATE_LIMIT_WINDOW_MS")
        {   config.rate_limit.window_ms
              = parse_number("RATE_LIMIT_WINDOW_MS", &window)?;
        }
        if let Some(max) = var("RATE_LIMIT_MAX_REQUESTS")
        {   config.rate_limit.max_requests
              = parse_number("RATE_LIMIT_MAX_REQUESTS", &max)?;
        }

        Ok(config)
    }

    /// Development mode bypasses the app secret check
    pub fn is_development(&self) -> bool
    {   self.env == "development"
    }

    /// Whether `/ai/*` requests must present the app secret
    pub fn auth_required(&self) -> bool
    {   !self.app_secret.is_empty() && !self.is_development()
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str)
  -> Result<T, Error>
{   value.parse().map_err(|_| {
      Error::InvalidConfiguration(
        format!("{} must be a number, got '{}'", name, value)
      )
    })
}
