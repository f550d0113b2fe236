pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod normalize;
pub mod session;
pub mod store;
pub mod ticker;
pub mod tokens;

use std::path::PathBuf;

use chrono::Local;
use log::info;

pub use client::{RecommendationClient, RecommendationSource};
pub use crate::config::ClientConfig;
pub use error::RecsError;
pub use export::{export_filename, to_csv, write_csv_file};
pub use model::{RecommendationRecord, UserId, UserProfile};
pub use normalize::{normalize_record, NormalizedRecord};
pub use session::{Phase, RefreshOutcome, SessionController, SessionEntry, SessionState, SessionView};
pub use store::LocalStore;
pub use ticker::CountdownTicker;
pub use tokens::estimate_token_count;

/// Enter the recommendations page for whoever is signed in according to the
/// configured store.
pub async fn open_session(
    config: &ClientConfig,
) -> Result<SessionEntry<RecommendationClient>, RecsError> {
    let client = RecommendationClient::new(config)?;
    let store = LocalStore::new(&config.store_path);
    Ok(SessionController::enter(client, store).await)
}

/// Sign in and remember the returned user id
pub async fn sign_in(
    config: &ClientConfig,
    username: &str,
    password: &str,
) -> Result<UserId, RecsError> {
    let client = RecommendationClient::new(config)?;
    let user = client.login(username, password).await?;
    LocalStore::new(&config.store_path)
        .set_user_id(&user.id)
        .await?;
    info!("Signed in as {} ({})", user.username, user.id);
    Ok(user.id)
}

/// Create an account and sign in as it
pub async fn sign_up(
    config: &ClientConfig,
    username: &str,
    email: &str,
    password: &str,
    skills: &[String],
) -> Result<UserId, RecsError> {
    let client = RecommendationClient::new(config)?;
    let user = client.register(username, email, password, skills).await?;
    LocalStore::new(&config.store_path)
        .set_user_id(&user.id)
        .await?;
    info!("Registered {} ({})", user.username, user.id);
    Ok(user.id)
}

pub async fn sign_out(config: &ClientConfig) -> Result<(), RecsError> {
    LocalStore::new(&config.store_path).clear().await
}

/// Export to the configured directory, dated today (local time).
///
/// `Ok(None)` when there was nothing to export.
pub async fn export_recommendations(
    records: &[RecommendationRecord],
    config: &ClientConfig,
) -> Result<Option<PathBuf>, RecsError> {
    write_csv_file(records, &config.export_dir, Local::now().date_naive()).await
}
