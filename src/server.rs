//! Router assembly and serving

use std::net::SocketAddr;
use std::sync::Arc;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{
  CONTENT_TYPE, REFERRER_POLICY, X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS
};
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use log::{info, warn};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::client::AiClient;
use crate::config::GatewayConfig;
use crate::error::Error;
use crate::middleware::{rate_limit, require_app_secret, APP_SECRET_HEADER};
use crate::rate_limit::RateLimiter;
use crate::{handlers, Provider};

/// Largest accepted request body.
pub const BODY_LIMIT_BYTES: usize = 50 * 1024;

const ALLOWED_ORIGINS: [&str; 3]
  = ["capacitor://localhost", "ionic://localhost", "http://localhost"];

/// Everything a handler or middleware may read. Immutable except for
/// the limiter's counters.
pub struct AppState
{   pub config: Arc<GatewayConfig>
  , pub client: AiClient
  , pub limiter: RateLimiter
}

impl AppState
{   pub fn new(config: GatewayConfig, client: AiClient) -> Self
    {   let limiter = RateLimiter::new(config.rate_limit.clone());
        AppState
        {   config: Arc::new(config)
          , client
          , limiter
        }
    }

    /// Real provider adapters built from `config`.
    pub fn from_config(config: GatewayConfig) -> Result<Self, Error>
    {   let client = AiClient::from_config(&config)?;
        Ok(AppState::new(config, client))
    }
}

pub fn build_router(state: Arc<AppState>) -> Router
{   let ai = Router::new()
      .route("/coach", post(handlers::coach))
      .route("/insight", post(handlers::insight))
      .route("/phrase", post(handlers::phrase))
      .fallback(handlers::not_found)
      .layer(axum::middleware::from_fn_with_state(
        state.clone(),
        require_app_secret
      ));

    let cors = CorsLayer::new()
      .allow_origin(ALLOWED_ORIGINS.map(HeaderValue::from_static))
      .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
      .allow_headers([
        CONTENT_TYPE,
        HeaderName::from_static(APP_SECRET_HEADER)
      ]);

    Router::new()
      .route("/health", get(handlers::health))
      .nest("/ai", ai)
      .fallback(handlers::not_found)
      .layer(
        ServiceBuilder::new()
          .layer(SetResponseHeaderLayer::overriding(
            X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff")
          ))
          .layer(SetResponseHeaderLayer::overriding(
            X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY")
          ))
          .layer(SetResponseHeaderLayer::overriding(
            REFERRER_POLICY,
            HeaderValue::from_static("no-referrer")
          ))
          .layer(cors)
          .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit
          ))
          .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
      )
      .with_state(state)
}

/// Bind, serve and wait for Ctrl+C or SIGTERM.
pub async fn serve(state: AppState) -> std::io::Result<()>
{   let config = state.config.clone();

    let providers: Vec<String> = Provider::ALL
      .iter()
      .map(|p| format!("{}={}", p, state.client.is_configured(*p)))
      .collect();
    if !config.app_secret.is_empty() && config.is_development()
    {   warn!("APP_SECRET is set but ignored in development");
    }
    if config.app_secret.is_empty() && !config.is_development()
    {   warn!("APP_SECRET is empty: /ai endpoints are open to anyone");
    }

    let app = build_router(Arc::new(state));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!("mindstep-gateway listening on {} [{}]", addr, config.env);
    info!("Providers: {}", providers.join(" "));

    axum::serve(
      listener,
      app.into_make_service_with_connect_info::<SocketAddr>()
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("mindstep-gateway shutting down");
    Ok(())
}

async fn shutdown_signal()
{   let ctrl_c = async {
      if let Err(e) = signal::ctrl_c().await
      {   warn!("Failed to listen for Ctrl+C: {}", e);
          std::future::pending::<()>().await;
      }
    };

    #[cfg(unix)]
    let terminate = async {
      match signal::unix::signal(signal::unix::SignalKind::terminate())
      {   Ok(mut sigterm) => {
            sigterm.recv().await;
          }
        , Err(e) => {
            warn!("Failed to listen for SIGTERM: {}", e);
            std::future::pending::<()>().await;
          }
      }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select!
    {   _ = ctrl_c => info!("Received Ctrl+C")
      , _ = terminate => info!("Received SIGTERM")
    }
}
