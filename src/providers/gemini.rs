use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use log::{debug, trace};

use crate::config::ProviderConfig;
use crate::error::Error;
use crate::{ChatMessage, Provider, Role};

use super::{decode, non_empty, send, ProviderAdapter, TEMPERATURE};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest
{   contents: Vec<GeminiContent>
  , generation_config: GenerationConfig
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct GeminiContent
{   #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>
  , parts: Vec<GeminiPart>
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct GeminiPart
{   text: String
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig
{   temperature: f32
  , max_output_tokens: u32
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiResponse
{   candidates: Option<Vec<Candidate>>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate
{   content: Option<CandidateContent>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent
{   role: Option<String>
  , parts: Option<Vec<CandidatePart>>
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart
{   text: Option<String>
}

impl GeminiResponse
{   fn into_text(self) -> Option<String>
    {   let content = self.candidates?.into_iter().next()?.content?;
        trace!(
          "Gemini candidate role: {:?}",
          content.role.as_deref().and_then(from_gemini_role)
        );
        content.parts?.into_iter().next()?.text
    }
}

// ===== Role mapping =====

/// Gemini calls the assistant side of a conversation `model`.
pub fn to_gemini_role(role: Role) -> &'static str
{   match role
    {   Role::User => "user"
      , Role::Assistant => "model"
    }
}

pub fn from_gemini_role(role: &str) -> Option<Role>
{   match role
    {   "user" => Some(Role::User)
      , "model" => Some(Role::Assistant)
      , _ => None
    }
}

/// Gemini has no system role: the instructions travel inside the
/// first user turn. Every other turn is passed through.
fn chat_contents(
  messages: &[ChatMessage]
, system_instructions: &str
) -> Vec<GeminiContent>
{   let first_user = messages
      .iter()
      .position(|m| m.role == Role::User);

    messages
      .iter()
      .enumerate()
      .map(|(i, m)| {
        let text = if Some(i) == first_user
        {   format!(
              "ISTRUZIONI:\n{}\n\n---\n\nUTENTE: {}",
              system_instructions,
              m.content
            )
        } else
        {   m.content.clone()
        };
        GeminiContent
        {   role: Some(to_gemini_role(m.role))
          , parts: vec![GeminiPart { text }]
        }
      })
      .collect()
}

// ===== Adapter =====

/// Google Generative Language API (`generateContent`)
pub struct GeminiAdapter
{   http: reqwest::Client
  , config: ProviderConfig
}

impl GeminiAdapter
{   pub fn new(config: ProviderConfig, http: reqwest::Client) -> Self
    {   debug!("Creating GeminiAdapter for model {}", config.model);
        GeminiAdapter
        {   http
          , config
        }
    }

    async fn post(
      &self
    , request: GeminiRequest
    ) -> Result<Option<String>, Error>
    {   trace!("Gemini request: {:?}", request);

        let url = format!(
          "{}/v1beta/models/{}:generateContent",
          self.config.api_base,
          self.config.model
        );
        let builder = self.http
          .post(url)
          .query(&[("key", self.config.api_key.as_str())])
          .json(&request);

        let Some(body) = send(Provider::Gemini, builder).await?
        else
        {   return Ok(None);
        };

        Ok(non_empty(
          decode::<GeminiResponse>(Provider::Gemini, &body)
            .and_then(GeminiResponse::into_text)
        ))
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter
{   fn provider(&self) -> Provider
    {   Provider::Gemini
    }

    fn is_configured(&self) -> bool
    {   self.config.is_configured()
    }

    async fn generate(
      &self
    , prompt: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!("Gemini generate, max_tokens={}", max_tokens);
        self.post(GeminiRequest
        {   contents: vec![
              GeminiContent
              {   role: None
                , parts: vec![GeminiPart { text: prompt.to_string() }]
              }
            ]
          , generation_config: GenerationConfig
            {   temperature: TEMPERATURE
              , max_output_tokens: max_tokens
            }
        }).await
    }

    async fn generate_chat(
      &self
    , messages: &[ChatMessage]
    , system_instructions: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>
    {   debug!(
          "Gemini generate_chat, {} turns, max_tokens={}",
          messages.len(),
          max_tokens
        );
        self.post(GeminiRequest
        {   contents: chat_contents(messages, system_instructions)
          , generation_config: GenerationConfig
            {   temperature: TEMPERATURE
              , max_output_tokens: max_tokens
            }
        }).await
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn instructions_go_into_first_user_turn_only()
    {   let messages = vec![
          ChatMessage::user("Sono stanco")
        , ChatMessage::assistant("Cosa ti pesa di più?")
        , ChatMessage::user("Il lavoro")
        ];
        let contents = chat_contents(&messages, "Sii breve");

        assert_eq!(contents.len(), 3);
        assert_eq!(
          contents[0].parts[0].text,
          "ISTRUZIONI:\nSii breve\n\n---\n\nUTENTE: Sono stanco"
        );
        assert_eq!(contents[1].role, Some("model"));
        assert_eq!(contents[1].parts[0].text, "Cosa ti pesa di più?");
        assert_eq!(contents[2].parts[0].text, "Il lavoro");
    }

    #[test]
    fn leading_assistant_turn_is_left_untouched()
    {   let messages = vec![
          ChatMessage::assistant("Ciao!")
        , ChatMessage::user("Ciao")
        ];
        let contents = chat_contents(&messages, "X");
        assert_eq!(contents[0].parts[0].text, "Ciao!");
        assert!(contents[1].parts[0].text.starts_with("ISTRUZIONI:\nX"));
    }

    #[test]
    fn roles_map_both_ways()
    {   for role in [Role::User, Role::Assistant]
        {   assert_eq!(from_gemini_role(to_gemini_role(role)), Some(role));
        }
        assert_eq!(from_gemini_role("system"), None);
    }

    #[test]
    fn envelope_extraction_tolerates_missing_fields()
    {   let full: GeminiResponse = serde_json::from_str(
          r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"ok"}]}}]}"#
        ).unwrap();
        assert_eq!(full.into_text(), Some("ok".to_string()));

        for body in [
            r#"{}"#
          , r#"{"candidates":[]}"#
          , r#"{"candidates":[{}]}"#
          , r#"{"candidates":[{"content":{"parts":[]}}]}"#
          , r#"{"candidates":null}"#
          ]
        {   let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
            assert_eq!(parsed.into_text(), None, "{}", body);
        }
    }
}
