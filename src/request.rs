//! Unified request and response types for the gateway

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::{ChatMessage, Provider};

/// Unit of work handed to the router.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest
{   /// A single user prompt
    Prompt
    {   prompt: String
      , max_tokens: u32
    }
  , /// A conversation plus system instructions
    Chat
    {   messages: Vec<ChatMessage>
      , system_instructions: String
      , max_tokens: u32
    }
}

impl GenerationRequest
{   pub fn max_tokens(&self) -> u32
    {   match self
        {   GenerationRequest::Prompt { max_tokens, .. } => *max_tokens
          , GenerationRequest::Chat { max_tokens, .. } => *max_tokens
        }
    }
}

// ===== Inbound bodies =====
//
// Required fields are optional here so that a missing field becomes a
// validation error with a precise message instead of a generic
// deserialization failure.

/// `POST /ai/coach`
#[derive(Debug, Clone, Deserialize)]
pub struct CoachRequest
{   pub provider: Option<Provider>
  , pub messages: Option<Vec<ChatMessage>>
}

/// `POST /ai/insight`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest
{   pub provider: Option<Provider>
  , pub user_context: Option<String>
}

/// `POST /ai/phrase`
#[derive(Debug, Clone, Deserialize)]
pub struct PhraseRequest
{   pub provider: Option<Provider>
  , pub context: Option<String>
}

// ===== Outbound bodies =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachReply
{   pub reply: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseReply
{   pub phrase: String
}

/// Structured wellbeing insight. Every field is always present; the
/// two tips serialize as `null` when the model gave none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightResult
{   pub insight: String
  , pub suggestion: String
  , pub brainstorm_prompt: String
  , pub motivational_message: String
  , pub routine_tip: Option<String>
  , pub walk_tip: Option<String>
  , pub generated_by: Provider
}

/// `GET /health`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport
{   pub status: String
  , pub version: String
  , pub env: String
  , /// Provider tag -> has a key. Never the key itself.
    pub providers: BTreeMap<String, bool>
}
