//! Garment classification from photos
//!
//! A [`Classifier`] turns an image file into a [`Prediction`] whose fields
//! are always inside the closed vocabularies. Model output is parsed
//! leniently: anything unrecognizable falls back to the defaults.

pub mod openai;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use closet_common::config::VisionSettings;
use closet_common::vocab::{normalize_category, normalize_color, DEFAULT_CATEGORY, DEFAULT_COLOR};
use closet_common::{Formality, OutfitPart, Season};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::items::ItemUpdate;
pub use openai::OpenAiClassifier;

/// Classification errors
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Vision classifier is not configured (no API key)")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Normalized classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub outfit_part: OutfitPart,
    pub category: String,
    pub color: String,
    pub season: Season,
    pub formality: Formality,
}

impl Default for Prediction {
    fn default() -> Self {
        Self {
            outfit_part: OutfitPart::from_category(DEFAULT_CATEGORY),
            category: DEFAULT_CATEGORY.to_string(),
            color: DEFAULT_COLOR.to_string(),
            season: Season::AllSeason,
            formality: Formality::Casual,
        }
    }
}

impl Prediction {
    /// Item fields written by a classification
    pub fn to_update(&self) -> ItemUpdate {
        ItemUpdate {
            outfit_part: Some(self.outfit_part),
            category: Some(self.category.clone()),
            primary_color: Some(self.color.clone()),
            season: Some(self.season),
            formality: Some(self.formality),
            ..Default::default()
        }
    }
}

/// Image classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifier name for logging
    fn name(&self) -> &'static str;

    async fn classify(&self, image_path: &Path) -> Result<Prediction, VisionError>;
}

/// Stand-in used when no API key is available
#[derive(Debug, Default)]
pub struct DisabledClassifier;

#[async_trait]
impl Classifier for DisabledClassifier {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn classify(&self, _image_path: &Path) -> Result<Prediction, VisionError> {
        Err(VisionError::NotConfigured)
    }
}

/// Explicit settings for a remote classifier
#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl VisionConfig {
    pub fn from_settings(settings: &VisionSettings, api_key: String) -> Self {
        Self {
            api_key,
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
        }
    }
}

/// Pick the classifier for the resolved configuration
pub fn build_classifier(settings: &VisionSettings, api_key: Option<String>) -> Arc<dyn Classifier> {
    let Some(api_key) = api_key else {
        warn!("No vision API key configured; classification is disabled");
        return Arc::new(DisabledClassifier);
    };

    let config = VisionConfig::from_settings(settings, api_key);
    match OpenAiClassifier::new(config) {
        Ok(classifier) => {
            info!(model = %settings.model, "Vision classifier enabled");
            Arc::new(classifier)
        }
        Err(e) => {
            warn!("Vision classifier unavailable: {}", e);
            Arc::new(DisabledClassifier)
        }
    }
}

fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| raw.get(*key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

/// Normalize a raw model reply into the closed vocabularies
pub fn postprocess(raw: &Value) -> Prediction {
    let category = field(raw, &["category"])
        .map(normalize_category)
        .unwrap_or(DEFAULT_CATEGORY);
    let color = field(raw, &["color", "primary_color"])
        .map(normalize_color)
        .unwrap_or(DEFAULT_COLOR);
    let season = field(raw, &["season"])
        .map(Season::normalize)
        .unwrap_or(Season::AllSeason);
    let formality = field(raw, &["formality"])
        .map(Formality::normalize)
        .unwrap_or(Formality::Casual);
    let outfit_part = field(raw, &["outfit_part"])
        .and_then(OutfitPart::parse)
        .unwrap_or_else(|| OutfitPart::from_category(category));

    Prediction {
        outfit_part,
        category: category.to_string(),
        color: color.to_string(),
        season,
        formality,
    }
}

/// Pull the JSON object out of free-form model text
///
/// Takes everything from the first `{` to the last `}` and, if that does not
/// parse, tries again without trailing commas.
pub fn extract_json(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    let candidate = &text[start..=end];

    serde_json::from_str(candidate)
        .or_else(|_| serde_json::from_str(&strip_trailing_commas(candidate)))
        .ok()
}

/// Prediction for a model reply, or the defaults when it has no object
/// with a `category`
pub fn prediction_from_reply(text: &str) -> Prediction {
    match extract_json(text) {
        Some(raw) if raw.get("category").is_some() => postprocess(&raw),
        _ => {
            warn!("Model reply held no usable JSON; using default prediction");
            Prediction::default()
        }
    }
}

fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());

    for (i, c) in chars.iter().enumerate() {
        if *c == ',' {
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if matches!(next, Some('}') | Some(']')) {
                continue;
            }
        }
        out.push(*c);
    }
    out
}
