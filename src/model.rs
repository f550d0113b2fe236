use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Opaque identifier of a signed-in user.
///
/// The service hands out integers, but nothing here relies on that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(UserId(s)),
            Value::Number(n) => Ok(UserId(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number for user id, got {other}"
            ))),
        }
    }
}

/// Profile of the signed-in user as returned by `GET /users/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Not part of the profile payload; filled from the stored id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    pub username: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skills: Vec<String>,
    #[serde(default)]
    pub email: String,
}

/// Body returned by `POST /login` and `POST /users/`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub username: String,
}

/// Fields accepted by `PUT /users/{id}`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

/// Relevance metrics attached to a recommendation. Missing entries read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    #[serde(default)]
    pub precision: f64,
    #[serde(default)]
    pub recall: f64,
    #[serde(default)]
    pub f1_score: f64,
    #[serde(default)]
    pub cosine_similarity: f64,
    #[serde(default)]
    pub accuracy: f64,
}

/// A list of text values that may arrive either as a JSON array or as a
/// single comma-delimited string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextList {
    Many(Vec<String>),
    Joined(String),
}

impl TextList {
    /// Items of the list; a joined string is split on commas and trimmed
    pub fn items(&self) -> Vec<String> {
        match self {
            TextList::Many(items) => items.clone(),
            TextList::Joined(text) => text
                .split(',')
                .map(|segment| segment.trim().to_string())
                .filter(|segment| !segment.is_empty())
                .collect(),
        }
    }
}

/// One hackathon entry from `GET /recommendations/{id}`.
///
/// The recommender is loose about what it sends, so every field except
/// `title` is optional. Display code should go through
/// [`crate::normalize`] instead of reading these fields directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub match_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub evaluation_metrics: EvaluationMetrics,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub skill_matches: BTreeMap<String, Vec<(String, f64)>>,

    // Embedding aliases, resolved by `normalize::select_embedding`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_embedding: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_embedding: Option<Vec<f64>>,

    #[serde(
        rename = "originalDescription",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub original_description: Option<String>,
    #[serde(rename = "Countdown", default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<TextList>,
    #[serde(rename = "KeywordsFromCSV", default, skip_serializing_if = "Option::is_none")]
    pub keywords_from_csv: Option<Vec<String>>,
}

impl RecommendationRecord {
    pub fn new(title: impl Into<String>) -> Self {
        RecommendationRecord {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Accepts text, numbers (stringified) and null for optional text fields.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

/// Accepts an array of text, a comma-delimited string, or null.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<TextList>::deserialize(deserializer) {
        Ok(Some(list)) => list.items(),
        _ => Vec::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
