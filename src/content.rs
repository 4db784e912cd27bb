use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Top-level fields every persisted content record must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["grammar_point", "category", "index", "content"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub grammar_point: String,
    pub category: String,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_en: Option<String>,
    pub content: ContentBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentBody {
    pub overview: Overview,
    pub rules: Rules,
    pub examples: Vec<Example>,
    pub exercises: Exercises,
    pub summary: String,
    pub related_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    pub function: String,
    pub usage_scenarios: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rules {
    pub description: String,
    pub key_points: Vec<KeyPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPoint {
    pub point: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Example {
    pub sentence: String,
    pub translation: String,
    pub analysis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercises {
    pub multiple_choice: Vec<MultipleChoice>,
    pub fill_blank: Vec<FillBlank>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultipleChoice {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillBlank {
    pub question: String,
    pub answer: String,
    pub explanation: String,
}

impl GeneratedContent {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read content: {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse content: {}", path.display()))
    }
}

/// Returns the first required top-level field missing from `value`.
pub fn missing_required_field(value: &serde_json::Value) -> Option<&'static str> {
    let Some(object) = value.as_object() else {
        return REQUIRED_FIELDS.first().copied();
    };
    REQUIRED_FIELDS
        .iter()
        .copied()
        .find(|field| !object.contains_key(*field))
}
