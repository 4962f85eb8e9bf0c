use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::{ChatMessage, Provider, Role};

use super::{decode, non_empty, send, ProviderAdapter, TEMPERATURE};

// ===== Message Types =====

#[derive(Debug, Clone, PartialEq, Serialize)]
struct OpenAiMessage
{   role: &'static str
  , content: String
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiChatRequest
{   model: String
  , messages: Vec<OpenAiMessage>
  , max_tokens: u32
  , temperature: f32
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OpenAiChatResponse
{   choices: Option<Vec<Choice>>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Choice
{   message: Option<ResponseMessage>
  , finish_reason: Option<String>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseMessage
{   content: Option<String>
}

impl OpenAiChatResponse
{   fn into_text(self) -> Option<String>
    {   let choice = self.choices?.into_iter().next()?;
        trace!("OpenAI finish_reason: {:?}", choice.finish_reason);
        choice.message?.content
    }
}

fn role_name(role: Role) -> &'static str
{   match role
    {   Role::User => "user"
      , Role::Assistant => "assistant"
    }
}

/// System instructions are an ordinary leading message.
fn chat_messages(
  messages: &[ChatMessage]
, system_instructions: &str
) -> Vec<OpenAiMessage>
{   std::iter::once(OpenAiMessage
    {   role: "system"
      , content: system_instructions.to_string()
    })
    .chain(messages.iter().map(|m| OpenAiMessage
    {   role: role_name(m.role)
      , content: m.content.clone()
    }))
    .collect()
}

// ===== Adapter =====

/// OpenAI Chat Completions API
pub struct OpenAiAdapter
{   http: reqwest::Client
  , config: ProviderConfig
}

impl OpenAiAdapter
{   pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self
    {   debug!("Creating OpenAiAdapter for model {}", config.model);
        OpenAiAdapter
        {   http
          , config
        }
    }

    async fn post(
      &self
    , messages: Vec<OpenAiMessage>
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   let request = OpenAiChatRequest
        {   model: self.config.model.clone()
          , messages
          , max_tokens
          , temperature: TEMPERATURE
        };
        trace!("OpenAI request: {:?}", request);

        let builder = self.http
          .post(format!("{}/v1/chat/completions", self.config.api_base))
          .bearer_auth(&self.config.api_key)
          .json(&request);

        let Some(body) = send(Provider::OpenAi, builder).await?
        else
        {   return Ok(None);
        };

        Ok(non_empty(
          decode::<OpenAiChatResponse>(Provider::OpenAi, &body)
            .and_then(OpenAiChatResponse::into_text)
        ))
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter
{   fn provider(&self) -> Provider
    {   Provider::OpenAi
    }

    fn is_configured(&self) -> bool
    {   self.config.is_configured()
    }

    async fn generate(
      &self
    , prompt: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!("OpenAI generate, max_tokens={}", max_tokens);
        self.post(
          vec![OpenAiMessage
          {   role: "user"
            , content: prompt.to_string()
          }],
          max_tokens
        ).await
    }

    async fn generate_chat(
      &self
    , messages: &[ChatMessage]
    , system_instructions: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!(
          "OpenAI generate_chat, {} turns, max_tokens={}",
          messages.len(),
          max_tokens
        );
        self.post(
          chat_messages(messages, system_instructions),
          max_tokens
        ).await
    }
}
