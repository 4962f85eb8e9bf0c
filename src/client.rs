use std::sync::Arc;
use log::debug;

use crate::config::GatewayConfig;
use crate::error::Error;
use crate::providers::{
  ClaudeAdapter, GeminiAdapter, OpenAiAdapter, ProviderAdapter
};
use crate::request::GenerationRequest;
use crate::{ChatMessage, Provider};

/// Routes a generation to the adapter of the requested provider.
///
/// Callers never branch on the provider themselves; every tag maps to
/// exactly one adapter.
#[derive(Clone)]
pub struct AiClient
{   gemini: Arc<dyn ProviderAdapter>
  , openai: Arc<dyn ProviderAdapter>
  , claude: Arc<dyn ProviderAdapter>
}

impl AiClient
{   /// Build the real adapters, sharing one HTTP client.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, Error>
    {   debug!("Initializing AiClient");
        let http = crate::providers::http_client()?;
        Ok(AiClient::from_adapters(
          Arc::new(GeminiAdapter::new(
            config.providers.gemini.clone(),
            http.clone()
          )),
          Arc::new(OpenAiAdapter::new(
            config.providers.openai.clone(),
            http.clone()
          )),
          Arc::new(ClaudeAdapter::new(
            config.providers.claude.clone(),
            http
          ))
        ))
    }

    /// Use arbitrary adapters, one per provider slot.
    pub fn from_adapters(
      gemini: Arc<dyn ProviderAdapter>
    , openai: Arc<dyn ProviderAdapter>
    , claude: Arc<dyn ProviderAdapter>
    ) -> Self
    {   AiClient
        {   gemini
          , openai
          , claude
        }
    }

    pub fn adapter(&self, provider: Provider) -> &dyn ProviderAdapter
    {   match provider
        {   Provider::Gemini => self.gemini.as_ref()
          , Provider::OpenAi => self.openai.as_ref()
          , Provider::Claude => self.claude.as_ref()
        }
    }

    pub fn is_configured(&self, provider: Provider) -> bool
    {   self.adapter(provider).is_configured()
    }

    pub async fn generate(
      &self
    , provider: Provider
    , prompt: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!("Routing generate to {}", provider);
        self.adapter(provider).generate(prompt, max_tokens).await
    }

    pub async fn generate_chat(
      &self
    , provider: Provider
    , messages: &[ChatMessage]
    , system_instructions: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!("Routing generate_chat to {}", provider);
        self.adapter(provider)
          .generate_chat(messages, system_instructions, max_tokens)
          .await
    }

    /// Dispatch either kind of request.
    pub async fn execute(
      &self
    , provider: Provider
    , request: &GenerationRequest
    ) -> Result<Option<String>, Error>
    {   match request
        {   GenerationRequest::Prompt { prompt, max_tokens } => {
              self.generate(provider, prompt, *max_tokens).await
            }
          , GenerationRequest::Chat
            {   messages
              , system_instructions
              , max_tokens
            } => {
              self.generate_chat(
                provider,
                messages,
                system_instructions,
                *max_tokens
              ).await
            }
        }
    }
}
