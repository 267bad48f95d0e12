use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::error;

use crate::prompts::Prompts;
use crate::types::HistoryTurn;

const GENERATE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Turns forwarded per request. Older history is dropped from the front.
const MAX_HISTORY_TURNS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1000,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: SystemInstruction,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Maps conversation history plus the new message into the `contents` array:
/// history turns in order (user/model roles), then the new message as the
/// final user turn.
pub fn build_contents(message: &str, history: &[HistoryTurn]) -> Vec<Content> {
    let start = history.len().saturating_sub(MAX_HISTORY_TURNS);

    let mut contents: Vec<Content> = history[start..]
        .iter()
        .map(|turn| Content {
            role: if turn.is_user { "user" } else { "model" }.to_string(),
            parts: vec![Part {
                text: turn.content.clone(),
            }],
        })
        .collect();

    contents.push(Content {
        role: "user".to_string(),
        parts: vec![Part {
            text: message.to_string(),
        }],
    });

    contents
}

fn extract_text(response: GenerateContentResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| anyhow!("model response contained no text"))
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(GeminiClient {
            http,
            api_key: api_key.to_string(),
        })
    }

    /// Sends the assembled conversation to the generateContent endpoint and
    /// returns the first candidate's text.
    pub async fn generate(&self, contents: Vec<Content>) -> Result<String> {
        let request = GenerateContentRequest {
            contents,
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: Prompts::SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            generation_config: GenerationConfig::default(),
        };

        let response = self
            .http
            .post(GENERATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .context("request to generative language API failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read response body".to_string());
            error!("generative language API error ({}): {}", status, body);
            return Err(anyhow!("generative language API returned {}: {}", status, body));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .context("unexpected response shape from generative language API")?;

        extract_text(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn turn(content: &str, is_user: bool) -> HistoryTurn {
        HistoryTurn {
            content: content.to_string(),
            is_user,
        }
    }

    #[test]
    fn history_maps_roles_and_appends_message_last() {
        let history = vec![turn("need a pipe", true), turn("sure, what pressure?", false)];
        let contents = build_contents("150psi", &history);

        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, "user");
        assert_eq!(contents[0].parts[0].text, "need a pipe");
        assert_eq!(contents[1].role, "model");
        assert_eq!(contents[1].parts[0].text, "sure, what pressure?");
        assert_eq!(contents[2].role, "user");
        assert_eq!(contents[2].parts[0].text, "150psi");
    }

    #[test]
    fn empty_history_yields_single_user_turn() {
        let contents = build_contents("hello", &[]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role, "user");
    }

    #[test]
    fn history_is_truncated_to_the_most_recent_turns() {
        let history: Vec<HistoryTurn> = (0..30)
            .map(|i| turn(&format!("turn {}", i), i % 2 == 0))
            .collect();
        let contents = build_contents("latest", &history);

        assert_eq!(contents.len(), MAX_HISTORY_TURNS + 1);
        // The oldest surviving turn is number 10 of 30.
        assert_eq!(contents[0].parts[0].text, "turn 10");
        assert_eq!(contents.last().unwrap().parts[0].text, "latest");
    }

    #[test]
    fn request_serializes_with_camel_case_keys() {
        let request = GenerateContentRequest {
            contents: build_contents("hi", &[]),
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "persona".to_string(),
                }],
            },
            generation_config: GenerationConfig::default(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("systemInstruction").is_some());
        let config = value.get("generationConfig").unwrap();
        assert_eq!(config["temperature"], json!(0.7));
        assert_eq!(config["topK"], json!(40));
        assert_eq!(config["topP"], json!(0.95));
        assert_eq!(config["maxOutputTokens"], json!(1000));
        assert_eq!(value["contents"][0]["parts"][0]["text"], json!("hi"));
    }

    #[test]
    fn extracts_first_candidate_text() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "Recommended: PVC-U 2\"" }, { "text": "ignored" }]
                    }
                },
                { "content": { "role": "model", "parts": [{ "text": "also ignored" }] } }
            ]
        }))
        .unwrap();

        assert_eq!(extract_text(payload).unwrap(), "Recommended: PVC-U 2\"");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(extract_text(payload).is_err());

        let payload: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{}] })).unwrap();
        assert!(extract_text(payload).is_err());
    }
}
