pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod client;
pub mod prompts;
pub mod shapers;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod server;
use serde::{Deserialize, Serialize};

/*

mindstep-gateway: a small async HTTP service that lets the mobile app
ask an AI provider for text without shipping any provider key on the
device. One request syntax for three provider APIs, each one hidden
behind the same adapter trait.

mindstep-gateway/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Shared domain types (Provider, ChatMessage)
│   ├── main.rs         # Binary entry point
│   ├── error.rs        # Provider errors and HTTP error responses
│   ├── config.rs       # Immutable configuration loaded from env
│   ├── client.rs       # Router: provider tag -> adapter
│   ├── providers/      # One adapter per backend wire format
│   │   ├── mod.rs
│   │   ├── gemini.rs
│   │   ├── openai.rs
│   │   └── claude.rs
│   ├── request.rs      # Request/response bodies
│   ├── prompts.rs      # Per-endpoint prompt templates
│   ├── shapers.rs      # Model output -> typed results
│   ├── handlers.rs     # /ai and /health handlers
│   ├── middleware.rs   # App secret gate, rate limit layer
│   ├── rate_limit.rs   # Fixed-window counters
│   └── server.rs       # Router assembly and serving
└── tests/

*/

/// GATEWAY STRUCTURES:

/// The AI backends the gateway can talk to.
/// The serialized tag is what the mobile client sends as `provider`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Provider
{
  /// Google AI Studio (Gemini models)
  Gemini
  ,
  /// OpenAI (GPT models)
  #[serde(rename = "openai")]
  OpenAi
  ,
  /// Anthropic (Claude models)
  Claude
}

impl Provider
{   /// Every provider, in declaration order.
    pub const ALL: [Provider; 3]
      = [Provider::Gemini, Provider::OpenAi, Provider::Claude];

    /// Wire tag, identical to the serde representation.
    pub fn as_str(&self) -> &'static str
    {   match self
        {   Provider::Gemini => "gemini"
          , Provider::OpenAi => "openai"
          , Provider::Claude => "claude"
        }
    }
}

impl std::fmt::Display for Provider
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// Author of a chat turn, as the mobile client names it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   User
  , Assistant
}

/// One turn of a conversation. Order is significant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatMessage
{   pub role: Role
  , pub content: String
}

impl ChatMessage
{   pub fn user(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: Role::User
          , content: content.into()
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   ChatMessage
        {   role: Role::Assistant
          , content: content.into()
        }
    }
}

pub use client::AiClient;
pub use config::GatewayConfig;
pub use error::{ApiError, Error};
pub use server::{build_router, AppState};
