//! Content moderation models.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document index holding one [`ModerationRecord`] per content URL.
pub const MODERATION_INDEX: &str = "content_moderation";

/// Modality of the content being moderated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Video,
    Image,
    Text,
    Audio,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Video => "video",
            ContentType::Image => "image",
            ContentType::Text => "text",
            ContentType::Audio => "audio",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to moderate one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationRequest {
    pub content_type: ContentType,
    pub content_url: String,
    pub user_id: String,
}

/// Moderation decision, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationVerdict {
    Allow,
    Review,
    Block,
}

/// Verdict plus per-label scores from the classifiers that ran.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    pub verdict: ModerationVerdict,
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

impl ModerationResult {
    /// Combine results from several classifiers: the most severe verdict
    /// wins and scores are merged under `{source}.{label}`.
    pub fn combine<'a>(parts: impl IntoIterator<Item = (&'a str, ModerationResult)>) -> Self {
        let mut verdict = ModerationVerdict::Allow;
        let mut scores = BTreeMap::new();
        for (source, part) in parts {
            verdict = verdict.max(part.verdict);
            for (label, score) in part.scores {
                scores.insert(format!("{}.{}", source, label), score);
            }
        }
        Self { verdict, scores }
    }
}

/// Durable moderation record, keyed by content URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationRecord {
    pub content_url: String,
    pub user_id: String,
    pub content_type: ContentType,
    pub result: ModerationResult,
    pub moderated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_content_type_is_rejected() {
        let body = serde_json::json!({
            "content_type": "hologram",
            "content_url": "http://x/c",
            "user_id": "u1"
        });
        assert!(serde_json::from_value::<ModerationRequest>(body).is_err());
    }

    #[test]
    fn combine_keeps_most_severe_verdict() {
        let text = ModerationResult {
            verdict: ModerationVerdict::Review,
            scores: BTreeMap::from([("toxic".to_string(), 0.6)]),
        };
        let image = ModerationResult {
            verdict: ModerationVerdict::Allow,
            scores: BTreeMap::from([("violence".to_string(), 0.1)]),
        };

        let combined = ModerationResult::combine([("toxicity", text), ("violence", image)]);
        assert_eq!(combined.verdict, ModerationVerdict::Review);
        assert_eq!(combined.scores.get("toxicity.toxic"), Some(&0.6));
        assert_eq!(combined.scores.get("violence.violence"), Some(&0.1));
    }

    #[test]
    fn combine_of_nothing_allows() {
        let combined = ModerationResult::combine(std::iter::empty());
        assert_eq!(combined.verdict, ModerationVerdict::Allow);
        assert!(combined.scores.is_empty());
    }
}
