//! Post-processing of raw model output into response values

use log::warn;
use serde_json::{Map, Value};

use crate::request::InsightResult;
use crate::Provider;

/// Longest raw text kept as the insight of a fallback result.
pub const FALLBACK_INSIGHT_CHARS: usize = 200;

const FALLBACK_SUGGESTION: &str = "Continua con costanza ogni giorno.";
const FALLBACK_BRAINSTORM: &str = "Cosa ti ha fatto sorridere oggi?";
const FALLBACK_MOTIVATION: &str = "Un passo alla volta. Stai crescendo.";

const QUOTES: &[char] = &['"', '\'', '«', '»', '“', '”', '‘', '’'];

/// Remove a markdown code fence wrapped around a JSON answer.
pub fn strip_code_fence(raw: &str) -> &str
{   let text = raw.trim();
    let text = text
      .strip_prefix("```json")
      .or_else(|| text.strip_prefix("```"))
      .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Parse the insight JSON. Never fails: output that is not a JSON
/// object degrades to a fallback built from the raw text.
pub fn shape_insight(raw: &str, provider: Provider) -> InsightResult
{   let cleaned = strip_code_fence(raw);

    match serde_json::from_str::<Map<String, Value>>(cleaned)
    {   Ok(fields) => InsightResult
        {   insight: text_field(&fields, "insight")
          , suggestion: text_field(&fields, "suggestion")
          , brainstorm_prompt: text_field(&fields, "brainstorm_prompt")
          , motivational_message: text_field(
              &fields,
              "motivational_message"
            )
          , routine_tip: optional_field(&fields, "routine_tip")
          , walk_tip: optional_field(&fields, "walk_tip")
          , generated_by: provider
        }
      , Err(e) => {
          warn!("{} insight is not valid JSON ({}), using fallback", provider, e);
          fallback_insight(cleaned, provider)
        }
    }
}

fn fallback_insight(cleaned: &str, provider: Provider) -> InsightResult
{   let insight = if cleaned.chars().count() > FALLBACK_INSIGHT_CHARS
    {   let head: String = cleaned
          .chars()
          .take(FALLBACK_INSIGHT_CHARS)
          .collect();
        format!("{}...", head)
    } else
    {   cleaned.to_string()
    };

    // Tips are not guessed from free text.
    InsightResult
    {   insight
      , suggestion: FALLBACK_SUGGESTION.to_string()
      , brainstorm_prompt: FALLBACK_BRAINSTORM.to_string()
      , motivational_message: FALLBACK_MOTIVATION.to_string()
      , routine_tip: None
      , walk_tip: None
      , generated_by: provider
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> String
{   optional_field(fields, key).unwrap_or_default()
}

fn optional_field(fields: &Map<String, Value>, key: &str)
  -> Option<String>
{   fields
      .get(key)
      .and_then(Value::as_str)
      .map(str::to_string)
}

/// Clean a one-sentence phrase: one layer of quotes, code fences and
/// line breaks go away. Content is never rejected.
pub fn shape_phrase(raw: &str) -> String
{   let text = raw.trim();
    let text = text.strip_prefix(QUOTES).unwrap_or(text);
    let text = text.strip_suffix(QUOTES).unwrap_or(text);
    text
      .replace("```", "")
      .split_whitespace()
      .collect::<Vec<_>>()
      .join(" ")
}

/// Coaching replies are free text.
pub fn shape_coach_reply(raw: &str) -> String
{   raw.trim().to_string()
}
