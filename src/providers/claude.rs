use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::{ChatMessage, Provider};

use super::{decode, non_empty, send, ProviderAdapter};

const ANTHROPIC_VERSION: &str = "2023-06-01";

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
struct ClaudeRequest<'a>
{   model: &'a str
  , max_tokens: u32
  , /// Top-level field, never mixed into `messages`
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>
  , messages: Vec<ChatMessage>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClaudeResponse
{   content: Option<Vec<ContentBlock>>
  , stop_reason: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ContentBlock
{   text: Option<String>
}

impl ClaudeResponse
{   fn into_text(self) -> Option<String>
    {   trace!("Claude stop_reason: {:?}", self.stop_reason);
        self.content?.into_iter().next()?.text
    }
}

// ===== Adapter =====

/// Anthropic Messages API
pub struct ClaudeAdapter
{   http: reqwest::Client
  , config: ProviderConfig
}

impl ClaudeAdapter
{   pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self
    {   debug!("Creating ClaudeAdapter for model {}", config.model);
        ClaudeAdapter
        {   http
          , config
        }
    }

    async fn post(
      &self
    , request: ClaudeRequest<'_>
    ) -> Result<Option<String>, Error>
    {   trace!("Claude request: {:?}", request);

        let builder = self.http
          .post(format!("{}/v1/messages", self.config.api_base))
          .header("x-api-key", &self.config.api_key)
          .header("anthropic-version", ANTHROPIC_VERSION)
          .json(&request);

        let Some(body) = send(Provider::Claude, builder).await?
        else
        {   return Ok(None);
        };

        Ok(non_empty(
          decode::<ClaudeResponse>(Provider::Claude, &body)
            .and_then(ClaudeResponse::into_text)
        ))
    }
}

#[async_trait]
impl ProviderAdapter for ClaudeAdapter
{   fn provider(&self) -> Provider
    {   Provider::Claude
    }

    fn is_configured(&self) -> bool
    {   self.config.is_configured()
    }

    async fn generate(
      &self
    , prompt: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!("Claude generate, max_tokens={}", max_tokens);
        self.post(ClaudeRequest
        {   model: &self.config.model
          , max_tokens
          , system: None
          , messages: vec![ChatMessage::user(prompt)]
        }).await
    }

    async fn generate_chat(
      &self
    , messages: &[ChatMessage]
    , system_instructions: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!(
          "Claude generate_chat, {} turns, max_tokens={}",
          messages.len(),
          max_tokens
        );
        self.post(ClaudeRequest
        {   model: &self.config.model
          , max_tokens
          , system: Some(system_instructions)
          , messages: messages.to_vec()
        }).await
    }
}
