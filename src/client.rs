use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::RecsError;
use crate::model::{AuthenticatedUser, ProfileUpdate, RecommendationRecord, UserId, UserProfile};

/// What the session controller needs from the recommendation service
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn fetch_user(&self, id: &UserId) -> Result<UserProfile, RecsError>;

    async fn fetch_recommendations(
        &self,
        id: &UserId,
    ) -> Result<Vec<RecommendationRecord>, RecsError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// HTTP client for the recommendation service
pub struct RecommendationClient {
    client: Client,
    base_url: String,
}

impl RecommendationClient {
    pub fn new(config: &ClientConfig) -> Result<Self, RecsError> {
        Self::with_timeout(config.base_url.clone(), config.timeout())
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RecsError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hackrec/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(RecommendationClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        RecommendationClient {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a success body, or turn a failure status into `ApiError`
    /// carrying the `detail` field when the body has one.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RecsError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail);
        warn!("Request failed with {}: {}", status, body);

        Err(RecsError::ApiError {
            status: status.as_u16(),
            detail,
        })
    }

    /// `POST /login`
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthenticatedUser, RecsError> {
        let response = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `POST /users/`
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        skills: &[String],
    ) -> Result<AuthenticatedUser, RecsError> {
        let response = self
            .client
            .post(self.url("/users/"))
            .json(&json!({
                "username": username,
                "email": email,
                "password": password,
                "skills": skills,
            }))
            .send()
            .await?;
        Self::decode(response).await
    }

    /// `PUT /users/{id}`
    pub async fn update_user(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RecsError> {
        let response = self
            .client
            .put(self.url(&format!("/users/{id}")))
            .json(update)
            .send()
            .await?;
        let mut profile: UserProfile = Self::decode(response).await?;
        profile.id = Some(id.clone());
        Ok(profile)
    }
}

#[async_trait]
impl RecommendationSource for RecommendationClient {
    async fn fetch_user(&self, id: &UserId) -> Result<UserProfile, RecsError> {
        debug!("Fetching profile for user {}", id);
        let response = self.client.get(self.url(&format!("/users/{id}"))).send().await?;
        let mut profile: UserProfile = Self::decode(response).await?;
        if profile.id.is_none() {
            profile.id = Some(id.clone());
        }
        Ok(profile)
    }

    async fn fetch_recommendations(
        &self,
        id: &UserId,
    ) -> Result<Vec<RecommendationRecord>, RecsError> {
        debug!("Fetching recommendations for user {}", id);
        let response = self
            .client
            .get(self.url(&format!("/recommendations/{id}")))
            .send()
            .await?;
        let records: Vec<RecommendationRecord> = Self::decode(response).await?;
        debug!("Received {} recommendations", records.len());
        Ok(records)
    }
}
