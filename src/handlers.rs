//! HTTP handlers
//!
//! Every `/ai/*` handler runs the same steps: validate the body, make
//! sure the provider has a key, build the prompt, call the router,
//! shape the output. Each step can end the request with an `ApiError`.

use std::collections::BTreeMap;
use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::{debug, warn};

use crate::error::ApiError;
use crate::prompts;
use crate::request::{
  CoachReply, CoachRequest, GenerationRequest, HealthReport,
  InsightRequest, InsightResult, PhraseReply, PhraseRequest
};
use crate::server::AppState;
use crate::shapers;
use crate::Provider;

/// `POST /ai/coach`
pub async fn coach(
  State(state): State<Arc<AppState>>
, body: Result<Json<CoachRequest>, JsonRejection>
) -> Result<Json<CoachReply>, ApiError>
{   let body = parse_body("coach", body)?;
    let (Some(provider), Some(messages)) = (body.provider, body.messages)
    else
    {   return Err(ApiError::Validation(
          "Missing provider or messages".to_string()
        ));
    };
    if messages.is_empty()
    {   return Err(ApiError::Validation(
          "messages must not be empty".to_string()
        ));
    }
    ensure_configured(&state, provider)?;

    let request = GenerationRequest::Chat
    {   messages
      , system_instructions: prompts::COACH_SYSTEM_PROMPT.to_string()
      , max_tokens: prompts::COACH_MAX_TOKENS
    };
    let raw = generate(&state, "coach", provider, &request).await?;

    Ok(Json(CoachReply
    {   reply: shapers::shape_coach_reply(&raw)
    }))
}

/// `POST /ai/insight`
pub async fn insight(
  State(state): State<Arc<AppState>>
, body: Result<Json<InsightRequest>, JsonRejection>
) -> Result<Json<InsightResult>, ApiError>
{   let body = parse_body("insight", body)?;
    let (Some(provider), Some(user_context))
      = (body.provider, non_blank(body.user_context))
    else
    {   return Err(ApiError::Validation(
          "Missing provider or userContext".to_string()
        ));
    };
    ensure_configured(&state, provider)?;

    let request = GenerationRequest::Prompt
    {   prompt: prompts::build_insight_prompt(&user_context)
      , max_tokens: prompts::INSIGHT_MAX_TOKENS
    };
    let raw = generate(&state, "insight", provider, &request).await?;

    Ok(Json(shapers::shape_insight(&raw, provider)))
}

/// `POST /ai/phrase`
pub async fn phrase(
  State(state): State<Arc<AppState>>
, body: Result<Json<PhraseRequest>, JsonRejection>
) -> Result<Json<PhraseReply>, ApiError>
{   let body = parse_body("phrase", body)?;
    let (Some(provider), Some(context))
      = (body.provider, non_blank(body.context))
    else
    {   return Err(ApiError::Validation(
          "Missing provider or context".to_string()
        ));
    };
    ensure_configured(&state, provider)?;

    let request = GenerationRequest::Prompt
    {   prompt: prompts::build_phrase_prompt(&context)
      , max_tokens: prompts::PHRASE_MAX_TOKENS
    };
    let raw = generate(&state, "phrase", provider, &request).await?;

    Ok(Json(PhraseReply
    {   phrase: shapers::shape_phrase(&raw)
    }))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthReport>
{   let providers: BTreeMap<String, bool> = Provider::ALL
      .iter()
      .map(|p| (p.as_str().to_string(), state.client.is_configured(*p)))
      .collect();

    Json(HealthReport
    {   status: "ok".to_string()
      , version: env!("CARGO_PKG_VERSION").to_string()
      , env: state.config.env.clone()
      , providers
    })
}

/// Any route not registered.
pub async fn not_found() -> ApiError
{   ApiError::NotFound
}

fn parse_body<T>(
  endpoint: &str
, body: Result<Json<T>, JsonRejection>
) -> Result<T, ApiError>
{   match body
    {   Ok(Json(value)) => Ok(value)
      , Err(rejection)
          if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
          warn!("[{}] rejected body over the size limit", endpoint);
          Err(ApiError::PayloadTooLarge)
        }
      , Err(rejection) => {
          warn!("[{}] rejected body: {}", endpoint, rejection.body_text());
          Err(ApiError::Validation("Invalid request body".to_string()))
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String>
{   text.filter(|t| !t.trim().is_empty())
}

fn ensure_configured(state: &AppState, provider: Provider)
  -> Result<(), ApiError>
{   if state.client.is_configured(provider)
    {   Ok(())
    } else
    {   warn!("Provider {} requested but not configured", provider);
        Err(ApiError::ProviderNotConfigured(provider))
    }
}

/// Call the router once. Empty output and transport failures become
/// their own error outcomes; nothing is retried.
async fn generate(
  state: &AppState
, endpoint: &str
, provider: Provider
, request: &GenerationRequest
) -> Result<String, ApiError>
{   debug!(
      "[{}] calling {} with max_tokens={}",
      endpoint,
      provider,
      request.max_tokens()
    );
    match state.client.execute(provider, request).await
    {   Ok(Some(text)) if !text.trim().is_empty() => Ok(text)
      , Ok(_) => {
          warn!("[{}] {} returned no usable content", endpoint, provider);
          Err(ApiError::ProviderEmptyResult)
        }
      , Err(e) => Err(ApiError::Internal(
          format!("[{}] {} call failed: {}", endpoint, provider, e)
        ))
    }
}
