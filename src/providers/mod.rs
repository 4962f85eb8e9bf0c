//! Provider adapters, one per backend wire format
//!
//! Each backend places system instructions differently, so every
//! adapter owns its own payload types. Only the transport step
//! (send, status check, body read) is shared.

pub mod claude;
pub mod gemini;
pub mod openai;

use std::time::Duration;
use async_trait::async_trait;
use log::{trace, warn};

use crate::error::Error;
use crate::{ChatMessage, Provider};

// Re-export for convenience
pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiAdapter;

/// Sampling temperature sent wherever the backend accepts one.
pub const TEMPERATURE: f32 = 0.7;

/// Common contract of every backend.
///
/// `Ok(None)` means the backend answered but nothing usable came back
/// (non-success status, unexpected envelope, empty text). `Err` is
/// reserved for calls that could not complete.
#[async_trait]
pub trait ProviderAdapter: Send + Sync
{   fn provider(&self) -> Provider;

    /// True when an API key is available.
    fn is_configured(&self) -> bool;

    /// Single prompt, sent as one user turn.
    async fn generate(
      &self
    , prompt: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>;

    /// Conversation plus system instructions.
    async fn generate_chat(
      &self
    , messages: &[ChatMessage]
    , system_instructions: &str
    , max_tokens: u32
    ) -> Result<Option<String>, Error>;
}

/// Build the HTTP client shared by all adapters.
pub fn http_client() -> Result<reqwest::Client, Error>
{   http_client_with_timeout(crate::config::PROVIDER_TIMEOUT)
}

/// HTTP client whose every call is bounded by `timeout`.
pub fn http_client_with_timeout(timeout: Duration)
  -> Result<reqwest::Client, Error>
{   reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| Error::InvalidConfiguration(e.to_string()))
}

/// Send a prepared request and return the body of a successful
/// response. A non-success status is logged and becomes `None`.
pub(crate) async fn send(
  provider: Provider
, request: reqwest::RequestBuilder
) -> Result<Option<Vec<u8>>, Error>
{   let response = request.send().await?;

    let status = response.status();
    trace!("{} response status: {}", provider, status);

    if !status.is_success()
    {   let error_text = response.text().await
          .unwrap_or_else(|_| "Unknown error".to_string());
        warn!(
          "{} returned {}: {}",
          provider,
          status,
          truncate_for_log(&error_text)
        );
        return Ok(None);
    }

    let body = response.bytes().await?;
    Ok(Some(body.to_vec()))
}

/// Decode an envelope, treating a body of the wrong shape as absent.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(
  provider: Provider
, body: &[u8]
) -> Option<T>
{   match serde_json::from_slice(body)
    {   Ok(envelope) => Some(envelope)
      , Err(e) => {
          warn!("{} response not understood: {}", provider, e);
          None
        }
    }
}

/// Keep only text that carries content.
pub(crate) fn non_empty(text: Option<String>) -> Option<String>
{   text.filter(|t| !t.trim().is_empty())
}

fn truncate_for_log(text: &str) -> String
{   text.chars().take(300).collect()
}
