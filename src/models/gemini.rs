use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::traits::Model;
use super::types::{ChatMessage, GenerationOptions, MessageRole};
use crate::constants::{
    EMPTY_CANDIDATE_REPLY, GEMINI_API_BASE_URL, HISTORY_CONTEXT_MESSAGES,
    HTTP_REQUEST_TIMEOUT_SECS, SYSTEM_PROMPT,
};
use crate::utils::NetChatError;

/// Gemini model backend using the generateContent endpoint
pub struct GeminiModel {
    client: Client,
    base_url: String,
    model_name: String,
    api_key: Option<String>,
    options: GenerationOptions,
}

impl GeminiModel {
    /// Create a new Gemini backend. The key may be absent at startup; requests
    /// are refused until one is set.
    pub fn new(
        base_url: impl Into<String>,
        model_name: impl Into<String>,
        api_key: Option<String>,
        options: GenerationOptions,
    ) -> Result<Self> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
                .build()?,
            base_url: base_url.into(),
            model_name: model_name.into(),
            api_key,
            options,
        })
    }

    /// Create a backend against the public endpoint with default sampling
    pub fn with_defaults(model_name: &str, api_key: Option<String>) -> Result<Self> {
        Self::new(
            GEMINI_API_BASE_URL,
            model_name,
            api_key,
            GenerationOptions::default(),
        )
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model_name
        )
    }
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate(&self, history: &[ChatMessage], prompt: &str) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(NetChatError::MissingCredential)?;

        let request = GenerateContentRequest::new(history, prompt, &self.options);

        let response = self
            .client
            .post(self.endpoint_url())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| NetChatError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(NetChatError::ApiError(format!("{}: {}", status, error_text)).into());
        }

        let response_json: GenerateContentResponse = response.json().await?;
        Ok(extract_reply(response_json))
    }

    fn name(&self) -> &str {
        &self.model_name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn set_api_key(&mut self, key: String) {
        self.api_key = Some(key);
    }
}

/// Pull the first candidate's text out of a response, tolerating any
/// missing level of the shape.
fn extract_reply(response: GenerateContentResponse) -> String {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .find_map(|p| p.text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| EMPTY_CANDIDATE_REPLY.to_string())
}

/// Build the ordered turn list: system instruction first, then the most
/// recent history, then the new prompt. Older history is dropped to keep
/// the payload bounded.
fn build_contents(history: &[ChatMessage], prompt: &str) -> Vec<Content> {
    let recent = &history[history.len().saturating_sub(HISTORY_CONTEXT_MESSAGES)..];

    let mut contents = Vec::with_capacity(recent.len() + 2);
    contents.push(Content {
        role: "user".to_string(),
        parts: vec![Part {
            text: SYSTEM_PROMPT.to_string(),
        }],
    });

    for msg in recent {
        let role = match msg.role {
            MessageRole::User => "user",
            MessageRole::Assistant => "model",
        };
        contents.push(Content {
            role: role.to_string(),
            parts: vec![Part {
                text: msg.content.clone(),
            }],
        });
    }

    contents.push(Content {
        role: "user".to_string(),
        parts: vec![Part {
            text: prompt.to_string(),
        }],
    });

    contents
}

// Request/response structures for the generateContent endpoint

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

impl GenerateContentRequest {
    fn new(history: &[ChatMessage], prompt: &str, options: &GenerationOptions) -> Self {
        Self {
            contents: build_contents(history, prompt),
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_k: options.top_k,
                top_p: options.top_p,
                max_output_tokens: options.max_output_tokens,
            },
            safety_settings: SafetySetting::defaults(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

impl SafetySetting {
    /// The four fixed categories, each blocking medium-probability harm and above
    fn defaults() -> Vec<Self> {
        const CATEGORIES: [&str; 4] = [
            "HARM_CATEGORY_HARASSMENT",
            "HARM_CATEGORY_HATE_SPEECH",
            "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            "HARM_CATEGORY_DANGEROUS_CONTENT",
        ];
        CATEGORIES
            .into_iter()
            .map(|category| Self {
                category,
                threshold: "BLOCK_MEDIUM_AND_ABOVE",
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(len: usize) -> Vec<ChatMessage> {
        (0..len)
            .map(|i| {
                if i % 2 == 0 {
                    ChatMessage::user(format!("question {}", i))
                } else {
                    ChatMessage::assistant(format!("answer {}", i))
                }
            })
            .collect()
    }

    #[test]
    fn test_contents_bounded_by_history_window() {
        let contents = build_contents(&history_of(50), "latest question");
        // system instruction + 10 history turns + new prompt
        assert_eq!(contents.len(), HISTORY_CONTEXT_MESSAGES + 2);
        // the retained history is the most recent tail
        assert_eq!(contents[1].parts[0].text, "question 40");
        assert_eq!(contents.last().unwrap().parts[0].text, "latest question");
    }

    #[test]
    fn test_contents_for_short_history() {
        let contents = build_contents(&history_of(3), "next");
        assert_eq!(contents.len(), 5);
        assert_eq!(contents[0].parts[0].text, SYSTEM_PROMPT);
    }

    #[test]
    fn test_assistant_turns_use_model_role() {
        let contents = build_contents(&history_of(2), "next");
        assert_eq!(contents[1].role, "user");
        assert_eq!(contents[2].role, "model");
        assert_eq!(contents[3].role, "user");
    }

    #[test]
    fn test_request_serializes_camel_case_fields() {
        let request =
            GenerateContentRequest::new(&history_of(1), "hello", &GenerationOptions::default());
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"topK\":40"));
        assert!(json.contains("\"topP\":0.95"));
        assert!(json.contains("\"maxOutputTokens\":2048"));
        assert!(json.contains("\"HARM_CATEGORY_DANGEROUS_CONTENT\""));
        assert!(json.contains("\"BLOCK_MEDIUM_AND_ABOVE\""));
    }

    #[test]
    fn test_extract_reply_from_well_formed_response() {
        let json = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "Firewalls filter traffic."}]}}
            ]
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_reply(response), "Firewalls filter traffic.");
    }

    #[test]
    fn test_extract_reply_defaults_when_candidates_missing() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(extract_reply(response), EMPTY_CANDIDATE_REPLY);

        let response: GenerateContentResponse =
            serde_json::from_str(r#"{"candidates": [{"content": {"parts": []}}]}"#).unwrap();
        assert_eq!(extract_reply(response), EMPTY_CANDIDATE_REPLY);
    }

    #[test]
    fn test_unconfigured_model_reports_it() {
        let model = GeminiModel::with_defaults("gemini-1.5-pro", None).unwrap();
        assert!(!model.is_configured());

        let mut model = model;
        model.set_api_key("test-key".to_string());
        assert!(model.is_configured());
    }
}
