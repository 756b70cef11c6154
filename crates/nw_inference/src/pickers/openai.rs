use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use nw_core::config::PickerConfig;
use nw_core::{Error, HeadlinePicker, Result};

const SYSTEM_PROMPT: &str = "You are a helpful agent that is good at identifying news headlines";

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: String,
}

/// Headline picker backed by an OpenAI-compatible chat completions API.
/// Temperature 0 by default so repeated runs pick the same headline.
pub struct OpenAiPicker {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OpenAiPicker {
    pub fn new(api_key: &str, config: &PickerConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }
}

impl fmt::Debug for OpenAiPicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiPicker")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

fn prepare_prompt(candidates: &[String]) -> String {
    format!(
        "The following is a list of possible news headlines: {candidates:?}. \
         However, there is one and only one suitable headline. \
         The most suitable news headline you choose is:"
    )
}

#[async_trait]
impl HeadlinePicker for OpenAiPicker {
    async fn pick(&self, candidates: &[String], temperature: Option<f32>) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            temperature: temperature.unwrap_or(self.temperature),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prepare_prompt(candidates),
                },
            ],
        };

        debug!(model = %self.model, candidates = candidates.len(), "asking picker");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Picker("completion response had no choices".to_string()))?;

        Ok(choice.message.content)
    }
}
