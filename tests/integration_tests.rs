use std::time::Duration;
use mockito::Matcher;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use mindstep_gateway::config::ProviderConfig;
use mindstep_gateway::providers::{
  ClaudeAdapter, GeminiAdapter, OpenAiAdapter, ProviderAdapter
};
use mindstep_gateway::{ChatMessage, Error, Provider};

/// Provider config pointing at the mock server
fn provider_config(api_base: String, key: &str, model: &str)
  -> ProviderConfig
{   ProviderConfig
    {   api_key: key.to_string()
      , model: model.to_string()
      , api_base
    }
}

fn http() -> reqwest::Client
{   mindstep_gateway::providers::http_client().unwrap()
}

fn conversation() -> Vec<ChatMessage>
{   vec![
      ChatMessage::user("Mi sento bloccato")
    , ChatMessage::assistant("Su cosa, in particolare?")
    , ChatMessage::user("Sul progetto")
    ]
}

// ===== Gemini =====

#[tokio::test]
async fn test_gemini_generate_sends_prompt_and_key()
{   let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", Matcher::Regex(
        r"^/v1beta/models/gemini-test:generateContent".to_string()
      ))
      .match_query(Matcher::UrlEncoded("key".into(), "g-key".into()))
      .match_body(Matcher::PartialJson(json!({
        "contents": [{ "parts": [{ "text": "Dimmi qualcosa" }] }],
        "generationConfig": { "maxOutputTokens": 700 }
      })))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(json!({
        "candidates": [{
          "content": { "role": "model", "parts": [{ "text": "Eccomi" }] }
        }]
      }).to_string())
      .create_async()
      .await;

    let adapter = GeminiAdapter::new(
      provider_config(server.url(), "g-key", "gemini-test"),
      http()
    );
    let result = adapter.generate("Dimmi qualcosa", 700).await;

    assert_eq!(assert_ok!(result), Some("Eccomi".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_chat_inlines_instructions_and_maps_roles()
{   let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", Matcher::Regex(
        r"^/v1beta/models/gemini-test:generateContent".to_string()
      ))
      .match_query(Matcher::Any)
      .match_body(Matcher::PartialJson(json!({
        "contents": [
          { "role": "user", "parts": [{
              "text": "ISTRUZIONI:\nSii breve\n\n---\n\nUTENTE: Mi sento bloccato"
          }] },
          { "role": "model", "parts": [{ "text": "Su cosa, in particolare?" }] },
          { "role": "user", "parts": [{ "text": "Sul progetto" }] }
        ]
      })))
      .with_status(200)
      .with_body(json!({
        "candidates": [{ "content": { "parts": [{ "text": "Qual è il primo passo?" }] } }]
      }).to_string())
      .create_async()
      .await;

    let adapter = GeminiAdapter::new(
      provider_config(server.url(), "g-key", "gemini-test"),
      http()
    );
    let result = adapter.generate_chat(&conversation(), "Sii breve", 300).await;

    assert_eq!(
      assert_ok!(result),
      Some("Qual è il primo passo?".to_string())
    );
    mock.assert_async().await;
}

// ===== OpenAI =====

#[tokio::test]
async fn test_openai_chat_leads_with_system_message()
{   let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v1/chat/completions")
      .match_header("authorization", "Bearer sk-test")
      .match_body(Matcher::PartialJson(json!({
        "model": "gpt-test",
        "max_tokens": 300,
        "messages": [
          { "role": "system", "content": "Sii breve" },
          { "role": "user", "content": "Mi sento bloccato" },
          { "role": "assistant", "content": "Su cosa, in particolare?" },
          { "role": "user", "content": "Sul progetto" }
        ]
      })))
      .with_status(200)
      .with_body(json!({
        "choices": [{
          "message": { "role": "assistant", "content": "Cosa ti blocca?" },
          "finish_reason": "stop"
        }]
      }).to_string())
      .create_async()
      .await;

    let adapter = OpenAiAdapter::new(
      provider_config(server.url(), "sk-test", "gpt-test"),
      http()
    );
    let result = adapter.generate_chat(&conversation(), "Sii breve", 300).await;

    assert_eq!(assert_ok!(result), Some("Cosa ti blocca?".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_non_success_status_is_absent_not_error()
{   let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v1/chat/completions")
      .with_status(429)
      .with_body(r#"{"error":{"message":"rate limited"}}"#)
      .create_async()
      .await;

    let adapter = OpenAiAdapter::new(
      provider_config(server.url(), "sk-test", "gpt-test"),
      http()
    );
    let result = adapter.generate("ciao", 60).await;

    assert_eq!(assert_ok!(result), None);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_openai_unexpected_envelope_is_absent()
{   let mut server = mockito::Server::new_async().await;
    for body in [r#"{"choices":"nope"}"#, "not json at all", r#"{"choices":[]}"#]
    {   let mock = server
          .mock("POST", "/v1/chat/completions")
          .with_status(200)
          .with_body(body)
          .create_async()
          .await;

        let adapter = OpenAiAdapter::new(
          provider_config(server.url(), "sk-test", "gpt-test"),
          http()
        );
        let result = adapter.generate("ciao", 60).await;
        assert_eq!(assert_ok!(result), None, "{}", body);

        mock.remove_async().await;
    }
}

// ===== Claude =====

#[tokio::test]
async fn test_claude_chat_uses_top_level_system()
{   let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("POST", "/v1/messages")
      .match_header("x-api-key", "c-key")
      .match_header("anthropic-version", "2023-06-01")
      .match_body(Matcher::Json(json!({
        "model": "claude-test",
        "max_tokens": 300,
        "system": "Sii breve",
        "messages": [
          { "role": "user", "content": "Mi sento bloccato" },
          { "role": "assistant", "content": "Su cosa, in particolare?" },
          { "role": "user", "content": "Sul progetto" }
        ]
      })))
      .with_status(200)
      .with_body(json!({
        "content": [{ "type": "text", "text": "Respira." }],
        "stop_reason": "end_turn"
      }).to_string())
      .create_async()
      .await;

    let adapter = ClaudeAdapter::new(
      provider_config(server.url(), "c-key", "claude-test"),
      http()
    );
    let result = adapter.generate_chat(&conversation(), "Sii breve", 300).await;

    assert_eq!(assert_ok!(result), Some("Respira.".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_claude_empty_text_is_absent()
{   let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/v1/messages")
      .with_status(200)
      .with_body(r#"{"content":[{"type":"text","text":"   "}]}"#)
      .create_async()
      .await;

    let adapter = ClaudeAdapter::new(
      provider_config(server.url(), "c-key", "claude-test"),
      http()
    );
    assert_eq!(assert_ok!(adapter.generate("x", 60).await), None);
}

// ===== Shared behaviour =====

#[tokio::test]
async fn test_unreachable_backend_is_an_error()
{   let config = provider_config(
      "http://127.0.0.1:1".to_string(),
      "key",
      "model"
    );
    let adapters: Vec<Box<dyn ProviderAdapter>> = vec![
      Box::new(GeminiAdapter::new(config.clone(), http()))
    , Box::new(OpenAiAdapter::new(config.clone(), http()))
    , Box::new(ClaudeAdapter::new(config, http()))
    ];

    for adapter in adapters
    {   let err = assert_err!(adapter.generate("ciao", 60).await);
        assert!(
          matches!(err, Error::Http(_) | Error::Timeout),
          "{}: {:?}",
          adapter.provider(),
          err
        );
    }
}

#[tokio::test]
async fn test_silent_backend_times_out()
{   let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    // Accept connections and never answer.
    tokio::spawn(async move {
      let mut open = Vec::new();
      while let Ok((socket, _)) = listener.accept().await
      {   open.push(socket);
      }
    });

    let http = mindstep_gateway::providers::http_client_with_timeout(
      Duration::from_millis(300)
    ).unwrap();
    let adapter = OpenAiAdapter::new(
      provider_config(format!("http://{}", addr), "sk-test", "gpt-test"),
      http
    );

    let err = assert_err!(adapter.generate("ciao", 60).await);
    assert_eq!(err, Error::Timeout);
}

#[test]
fn test_configured_means_non_empty_key()
{   let configured = GeminiAdapter::new(
      provider_config("http://x".to_string(), "k", "m"),
      reqwest::Client::new()
    );
    let missing = ClaudeAdapter::new(
      provider_config("http://x".to_string(), "", "m"),
      reqwest::Client::new()
    );
    assert!(configured.is_configured());
    assert!(!missing.is_configured());
    assert_eq!(missing.provider(), Provider::Claude);
}
