use super::{ApiKey, NameSuggester, SuggestError};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace};

const PREVIEW_PROMPT_CHARS: usize = 500;
const MAX_TOKENS: u32 = 50;
const TEMPERATURE: f32 = 0.3;

/// Request shape spoken by the service. Chosen once when the suggester is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFlavor {
    /// `POST {base}/chat/completions` with a messages array.
    #[default]
    Chat,
    /// `POST {base}/completions` with a bare prompt. Needs a completions
    /// model such as `gpt-3.5-turbo-instruct` or `davinci-002`; chat models
    /// are refused when the suggester is built.
    Legacy,
}

/// Model families served only by `/chat/completions`.
const CHAT_ONLY_PREFIXES: &[&str] = &[
    "gpt-3.5-turbo",
    "gpt-4",
    "gpt-5",
    "chatgpt",
    "o1",
    "o3",
    "o4",
];

impl ApiFlavor {
    /// Whether `model` can be called through this flavor's endpoint.
    pub fn accepts_model(self, model: &str) -> bool {
        match self {
            ApiFlavor::Chat => true,
            ApiFlavor::Legacy => {
                let model = model.to_lowercase();
                model.contains("instruct")
                    || !CHAT_ONLY_PREFIXES.iter().any(|p| model.starts_with(p))
            }
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

pub struct OpenAiSuggester {
    client: Client,
    api_key: ApiKey,
    api_base: String,
    model: String,
    flavor: ApiFlavor,
}

impl OpenAiSuggester {
    pub fn new(
        api_key: ApiKey,
        api_base: &str,
        model: &str,
        flavor: ApiFlavor,
        timeout: Duration,
    ) -> Result<Self, SuggestError> {
        if !flavor.accepts_model(model) {
            return Err(SuggestError::Model(format!(
                "{} is a chat model and cannot be used with the legacy completions endpoint",
                model
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            flavor,
        })
    }

    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, SuggestError> {
        let (url, body) = match self.flavor {
            ApiFlavor::Chat => (
                format!("{}/chat/completions", self.api_base),
                json!({
                    "model": self.model,
                    "messages": [{"role": "user", "content": prompt}],
                    "max_tokens": max_tokens,
                    "temperature": TEMPERATURE,
                }),
            ),
            ApiFlavor::Legacy => (
                format!("{}/completions", self.api_base),
                json!({
                    "model": self.model,
                    "prompt": prompt,
                    "max_tokens": max_tokens,
                    "temperature": TEMPERATURE,
                }),
            ),
        };

        debug!("POST {} ({:?}, key {})", url, self.flavor, self.api_key.redacted());

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .json(&body)
            .send()
            .map_err(|e| SuggestError::classify(&e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(SuggestError::classify(&format!("{} {}", status, text)));
        }

        let content = match self.flavor {
            ApiFlavor::Chat => response
                .json::<ChatResponse>()
                .map_err(|e| SuggestError::Other(format!("Malformed response: {}", e)))?
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default(),
            ApiFlavor::Legacy => response
                .json::<CompletionResponse>()
                .map_err(|e| SuggestError::Other(format!("Malformed response: {}", e)))?
                .choices
                .into_iter()
                .next()
                .map(|c| c.text)
                .unwrap_or_default(),
        };
        trace!("Raw completion: {:?}", content);

        Ok(content)
    }
}

impl NameSuggester for OpenAiSuggester {
    fn suggest_name(&self, stem: &str, extension: &str, preview: &str) -> Result<String, SuggestError> {
        let prompt = build_prompt(stem, extension, preview);
        let raw = self.complete(&prompt, MAX_TOKENS)?;
        Ok(clean_reply(&raw))
    }

    fn check_connection(&self) -> Result<(), SuggestError> {
        self.complete("test", 1).map(|_| ())
    }
}

pub fn build_prompt(stem: &str, extension: &str, preview: &str) -> String {
    let preview: String = preview.chars().take(PREVIEW_PROMPT_CHARS).collect();
    format!(
        "Analyze this file content and suggest a descriptive filename (without extension).\n\
         Original filename: {stem}\n\
         File type: {extension}\n\
         Content preview: {preview}...\n\n\
         Suggest a clear, descriptive filename that indicates the content.\n\
         Keep it under 50 characters and use underscores instead of spaces.\n\
         Only return the suggested filename, nothing else."
    )
}

/// Models like to wrap the answer in quotes or code ticks.
fn clean_reply(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}
