use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;

/// Errors raised while talking to a provider or building one.
///
/// A non-success HTTP status is NOT an error: adapters report it as
/// an empty result. These variants cover calls that could not
/// complete at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error
{   /// The provider did not answer within the fixed timeout
    #[error("Request timed out")]
    Timeout
  , /// Connection, TLS or body read failure
    #[error("HTTP error: {0}")]
    Http(String)
  , /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String)
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else
        {   Error::Http(e.to_string())
        }
    }
}

/// Failure outcomes of an HTTP request, each mapped to one status
/// code and a `{"error": ...}` body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError
{   /// Missing or malformed request fields
    #[error("{0}")]
    Validation(String)
  , /// Body larger than the accepted limit
    #[error("Request body too large")]
    PayloadTooLarge
  , /// App secret missing or wrong
    #[error("Unauthorized")]
    Unauthorized
  , /// Too many requests in the current window
    #[error("Too many requests, please try again later.")]
    RateLimited
  , /// Requested provider has no API key on this server
    #[error("Provider {0} not configured on server")]
    ProviderNotConfigured(crate::Provider)
  , /// Provider answered but produced nothing usable
    #[error("AI provider returned no response")]
    ProviderEmptyResult
  , /// Anything else; the detail is logged, never returned
    #[error("Internal server error")]
    Internal(String)
  , #[error("Not found")]
    NotFound
}

impl ApiError
{   pub fn status(&self) -> StatusCode
    {   match self
        {   ApiError::Validation(_) => StatusCode::BAD_REQUEST
          , ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE
          , ApiError::Unauthorized => StatusCode::UNAUTHORIZED
          , ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS
          , ApiError::ProviderNotConfigured(_) => {
              StatusCode::SERVICE_UNAVAILABLE
            }
          , ApiError::ProviderEmptyResult => StatusCode::BAD_GATEWAY
          , ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR
          , ApiError::NotFound => StatusCode::NOT_FOUND
        }
    }
}

impl IntoResponse for ApiError
{   fn into_response(self) -> Response
    {   if let ApiError::Internal(detail) = &self
        {   error!("Internal failure: {}", detail);
        }
        let body = json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
