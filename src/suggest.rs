//! AI-assisted reply suggestion for the admin composer.
//!
//! Wraps a Gemini-style `generateContent` endpoint. Every failure path —
//! missing API key, transport error, rejection, malformed body, empty
//! candidates — falls back to a deterministic templated apology embedding
//! the department name, so suggestion can never fail or block composition.

use crate::config::Config;
use serde::{Deserialize, Serialize};

const SYSTEM_INSTRUCTION: &str = "Bạn là quản lý chất lượng chuyên nghiệp tại Bệnh viện Đa khoa \
  Ninh Thuận. Hãy soạn một văn bản phản hồi cho bệnh nhân. Yêu cầu: Lịch sự, thấu cảm, cam kết \
  kiểm tra và chấn chỉnh. Trả lời bằng tiếng Việt văn minh và chuyên nghiệp.";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
  contents: Vec<Content>,
  system_instruction: Content,
  generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
  parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
  text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
  temperature: f64,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Content,
}

/// Client for the reply-suggestion endpoint.
#[derive(Clone)]
pub struct ReplySuggester {
  http: reqwest::Client,
  model: String,
}

impl ReplySuggester {
  pub fn new(model: String) -> Self {
    Self {
      http: reqwest::Client::new(),
      model,
    }
  }

  /// Propose a reply for the given feedback. Always returns a usable string.
  pub async fn suggest(&self, content: &str, department: &str) -> String {
    let key = match Config::get_suggestion_key() {
      Ok(key) => key,
      Err(e) => {
        tracing::debug!(error = %e, "no suggestion API key, using fallback reply");
        return fallback_reply(department);
      }
    };

    match self.generate(&key, content, department).await {
      Some(text) => text,
      None => fallback_reply(department),
    }
  }

  async fn generate(&self, key: &str, content: &str, department: &str) -> Option<String> {
    let url = format!(
      "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
      self.model, key
    );

    let request = GenerateRequest {
      contents: vec![Content {
        parts: vec![Part {
          text: format!(
            "Khoa: {}. Nội dung phản ánh của bệnh nhân: \"{}\"",
            department, content
          ),
        }],
      }],
      system_instruction: Content {
        parts: vec![Part {
          text: SYSTEM_INSTRUCTION.to_string(),
        }],
      },
      generation_config: GenerationConfig { temperature: 0.7 },
    };

    let response = match self.http.post(&url).json(&request).send().await {
      Ok(r) => r,
      Err(e) => {
        tracing::warn!(error = %e, "suggestion request failed");
        return None;
      }
    };

    let status = response.status();
    if !status.is_success() {
      tracing::warn!(%status, "suggestion endpoint rejected request");
      return None;
    }

    let body: GenerateResponse = match response.json().await {
      Ok(b) => b,
      Err(e) => {
        tracing::warn!(error = %e, "malformed suggestion response");
        return None;
      }
    };

    body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .map(|p| p.text)
      .filter(|t| !t.trim().is_empty())
  }
}

/// The templated apology used whenever no suggestion can be produced.
pub fn fallback_reply(department: &str) -> String {
  format!(
    "Bệnh viện Đa khoa Ninh Thuận chân thành cảm ơn ý kiến của quý khách. \
     Chúng tôi sẽ làm việc với khoa {} để nâng cao chất lượng dịch vụ.",
    department
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fallback_embeds_department() {
    let reply = fallback_reply("Khoa Nội");
    assert!(reply.contains("Khoa Nội"));
    assert!(reply.contains("cảm ơn"));
  }

  #[test]
  fn test_request_wire_shape() {
    let request = GenerateRequest {
      contents: vec![Content {
        parts: vec![Part {
          text: "x".to_string(),
        }],
      }],
      system_instruction: Content {
        parts: vec![Part {
          text: "y".to_string(),
        }],
      },
      generation_config: GenerationConfig { temperature: 0.7 },
    };

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["contents"][0]["parts"][0]["text"], "x");
    assert_eq!(value["systemInstruction"]["parts"][0]["text"], "y");
    assert_eq!(value["generationConfig"]["temperature"], 0.7);
  }

  #[test]
  fn test_response_text_extraction() {
    let json = r#"{"candidates":[{"content":{"parts":[{"text":"Kính gửi quý khách."}]}}]}"#;
    let body: GenerateResponse = serde_json::from_str(json).unwrap();
    let text = body
      .candidates
      .into_iter()
      .next()
      .and_then(|c| c.content.parts.into_iter().next())
      .map(|p| p.text);
    assert_eq!(text.as_deref(), Some("Kính gửi quý khách."));
  }

  #[test]
  fn test_empty_candidates_tolerated() {
    let body: GenerateResponse = serde_json::from_str("{}").unwrap();
    assert!(body.candidates.is_empty());
  }
}
