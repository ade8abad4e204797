//! OpenAI-compatible chat completions classifier

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

use super::{prediction_from_reply, Classifier, Prediction, VisionConfig, VisionError};

const PROMPT: &str = "You are a wardrobe assistant looking at a photo of a single clothing item. \
Describe the main garment and ignore the background. \
Return STRICT JSON with the keys: category, color, season, formality.\n\
Allowed values:\n\
- category: tshirt, shirt, polo, sweater, hoodie, blazer, coat, jacket, dress, skirt, jeans, chinos, trousers, shorts, sneakers, boots, loafers, heels, other\n\
- color: black, white, gray, navy, blue, green, red, yellow, orange, brown, beige, tan, cream, purple, pink, multicolor\n\
- season: spring, summer, fall, winter, spring_summer, fall_winter, all_season\n\
- formality: casual, smart_casual, semi_formal, formal\n\
Example: {\"category\":\"sweater\",\"color\":\"navy\",\"season\":\"winter\",\"formality\":\"casual\"}\n\
Output JSON only, no commentary.";

const FORCE_SUFFIX: &str = "\nIf the item is hard to see, still return your best guess. \
Do NOT leave any field empty.";

const DEFAULT_MIME: &str = "image/jpeg";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct OpenAiClassifier {
    http_client: reqwest::Client,
    config: VisionConfig,
}

impl OpenAiClassifier {
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| VisionError::Network(e.to_string()))?;

        Ok(Self { http_client, config })
    }

    /// One chat completion; returns the trimmed reply text
    async fn complete(
        &self,
        prompt: &str,
        data_url: &str,
        temperature: f32,
    ) -> Result<String, VisionError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = json!({
            "model": self.config.model,
            "temperature": temperature,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": prompt},
                    {"type": "image_url", "image_url": {"url": data_url}},
                ],
            }],
        });

        debug!(url = %url, model = %self.config.model, temperature, "Requesting classification");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| VisionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VisionError::Api(status.as_u16(), error_text));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| VisionError::Parse(e.to_string()))?;

        Ok(reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default())
    }
}

/// Base64 data URL for an image, MIME type sniffed from its bytes
pub fn image_data_url(bytes: &[u8]) -> String {
    let mime = infer::get(bytes)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("image/"))
        .unwrap_or(DEFAULT_MIME);

    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn classify(&self, image_path: &Path) -> Result<Prediction, VisionError> {
        let bytes = tokio::fs::read(image_path).await?;
        let data_url = image_data_url(&bytes);

        let mut reply = self.complete(PROMPT, &data_url, 0.0).await?;
        if reply.is_empty() {
            warn!(path = %image_path.display(), "Empty classification reply, retrying once");
            let forceful = format!("{}{}", PROMPT, FORCE_SUFFIX);
            reply = self.complete(&forceful, &data_url, 0.2).await?;
        }

        let prediction = prediction_from_reply(&reply);
        info!(
            path = %image_path.display(),
            category = %prediction.category,
            outfit_part = %prediction.outfit_part,
            "Classified item"
        );
        Ok(prediction)
    }
}
