//! Request gates that run before any handler: the app secret check
//! on `/ai/*` and the global rate limiter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::RETRY_AFTER;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use log::{trace, warn};

use crate::error::ApiError;
use crate::rate_limit::RateLimitResult;
use crate::server::AppState;

pub const APP_SECRET_HEADER: &str = "x-app-secret";

const RATELIMIT_LIMIT: HeaderName
  = HeaderName::from_static("ratelimit-limit");
const RATELIMIT_REMAINING: HeaderName
  = HeaderName::from_static("ratelimit-remaining");
const RATELIMIT_RESET: HeaderName
  = HeaderName::from_static("ratelimit-reset");

/// Reject callers that do not present the configured app secret.
/// Bypassed when no secret is set or in development.
pub async fn require_app_secret(
  State(state): State<Arc<AppState>>
, request: Request
, next: Next
) -> Result<Response, ApiError>
{   if !state.config.auth_required()
    {   return Ok(next.run(request).await);
    }

    let provided = request
      .headers()
      .get(APP_SECRET_HEADER)
      .and_then(|v| v.to_str().ok());

    if provided != Some(state.config.app_secret.as_str())
    {   warn!(
          "Rejected {} {}: bad or missing app secret",
          request.method(),
          request.uri().path()
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}

/// Count the request against its caller's window; over the limit the
/// request never reaches a handler.
pub async fn rate_limit(
  State(state): State<Arc<AppState>>
, request: Request
, next: Next
) -> Response
{   let key = client_key(&request);
    let limit = state.limiter.config().max_requests;

    match state.limiter.check_and_increment(&key)
    {   RateLimitResult::Allowed { remaining, resets_in } => {
          trace!("{} allowed, {} remaining", key, remaining);
          let mut response = next.run(request).await;
          set_rate_headers(response.headers_mut(), limit, remaining, resets_in);
          response
        }
      , RateLimitResult::Exceeded { retry_after } => {
          warn!("Rate limit exceeded for {}", key);
          let mut response = ApiError::RateLimited.into_response();
          let headers = response.headers_mut();
          set_rate_headers(headers, limit, 0, retry_after);
          headers.insert(RETRY_AFTER, HeaderValue::from(ceil_secs(retry_after)));
          response
        }
    }
}

/// Caller identity: the peer IP when the server recorded one.
fn client_key(request: &Request) -> String
{   request
      .extensions()
      .get::<ConnectInfo<SocketAddr>>()
      .map(|ConnectInfo(addr)| addr.ip().to_string())
      .unwrap_or_else(|| "unknown".to_string())
}

fn set_rate_headers(
  headers: &mut HeaderMap
, limit: u32
, remaining: u32
, resets_in: Duration
)
{   headers.insert(RATELIMIT_LIMIT, HeaderValue::from(limit));
    headers.insert(RATELIMIT_REMAINING, HeaderValue::from(remaining));
    headers.insert(RATELIMIT_RESET, HeaderValue::from(ceil_secs(resets_in)));
}

fn ceil_secs(duration: Duration) -> u64
{   duration.as_millis().div_ceil(1000) as u64
}
