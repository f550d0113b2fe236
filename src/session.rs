//! Session state machine for the recommendations page.
//!
//! `Idle → Loading → Ready | Failed`. From `Ready` or `Failed` a refresh sets
//! the `refreshing` overlay while the current list stays visible; the list is
//! only replaced once both fetches have succeeded.

use log::{debug, info, warn};

use crate::client::RecommendationSource;
use crate::error::RecsError;
use crate::model::{RecommendationRecord, UserId, UserProfile};
use crate::store::LocalStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What the page should render for the current state
#[derive(Debug, PartialEq)]
pub enum SessionView<'a> {
    Loading,
    /// Nothing to show but an error and a retry button
    Error(&'a str),
    /// Loaded successfully, but the recommender had nothing for this user
    Empty,
    List(&'a [RecommendationRecord]),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated,
    Failed,
    /// A load or refresh is already running; the request was dropped
    AlreadyInFlight,
    /// Nothing has been loaded yet
    NotLoaded,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub recommendations: Vec<RecommendationRecord>,
    pub profile: Option<UserProfile>,
    pub phase: Phase,
    pub refreshing: bool,
    pub error: Option<String>,
    pub selected: Option<usize>,
}

type FetchResult = Result<(UserProfile, Vec<RecommendationRecord>), RecsError>;

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.phase == Phase::Loading || self.refreshing
    }

    fn begin_load(&mut self) -> bool {
        if self.phase != Phase::Idle {
            return false;
        }
        self.phase = Phase::Loading;
        true
    }

    fn begin_refresh(&mut self) -> Result<(), RefreshOutcome> {
        match self.phase {
            _ if self.in_flight() => Err(RefreshOutcome::AlreadyInFlight),
            Phase::Ready | Phase::Failed => {
                self.refreshing = true;
                Ok(())
            }
            Phase::Idle | Phase::Loading => Err(RefreshOutcome::NotLoaded),
        }
    }

    /// Apply the outcome of a load or refresh
    fn complete(&mut self, result: FetchResult) {
        self.refreshing = false;
        match result {
            Ok((profile, recommendations)) => {
                self.profile = Some(profile);
                self.recommendations = recommendations;
                self.selected = None;
                self.error = None;
                self.phase = Phase::Ready;
            }
            Err(e) => {
                self.error = Some(e.user_message());
                self.phase = Phase::Failed;
            }
        }
    }

    pub fn view(&self) -> SessionView<'_> {
        match self.phase {
            Phase::Idle | Phase::Loading => SessionView::Loading,
            _ if !self.recommendations.is_empty() => SessionView::List(&self.recommendations),
            Phase::Failed => SessionView::Error(self.error.as_deref().unwrap_or_default()),
            Phase::Ready => SessionView::Empty,
        }
    }

    pub fn selected_record(&self) -> Option<&RecommendationRecord> {
        self.selected.and_then(|i| self.recommendations.get(i))
    }
}

/// Result of entering the page
pub enum SessionEntry<S> {
    Active(SessionController<S>),
    /// No stored user id; send the user to the login flow
    RedirectToLogin,
}

pub struct SessionController<S> {
    source: S,
    store: LocalStore,
    user_id: UserId,
    state: SessionState,
}

impl<S: RecommendationSource> SessionController<S> {
    /// Start a session for the user stored in `store`
    pub async fn enter(source: S, store: LocalStore) -> SessionEntry<S> {
        match store.user_id().await {
            Some(user_id) => {
                debug!("Entering session for user {}", user_id);
                SessionEntry::Active(SessionController {
                    source,
                    store,
                    user_id,
                    state: SessionState::new(),
                })
            }
            None => {
                info!("No stored user id, redirecting to login");
                SessionEntry::RedirectToLogin
            }
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Profile first, then recommendations. Never concurrent.
    async fn fetch_all(&self) -> FetchResult {
        let profile = self.source.fetch_user(&self.user_id).await?;
        let recommendations = self.source.fetch_recommendations(&self.user_id).await?;
        Ok((profile, recommendations))
    }

    /// Initial load. Does nothing unless the session is still idle.
    pub async fn load(&mut self) -> Phase {
        if !self.state.begin_load() {
            debug!("Ignoring load in phase {:?}", self.state.phase);
            return self.state.phase;
        }

        match self.fetch_all().await {
            Ok((profile, recommendations)) => {
                info!(
                    "Loaded {} recommendations for user {}",
                    recommendations.len(),
                    self.user_id
                );
                self.state.complete(Ok((profile, recommendations)));
            }
            Err(e) => {
                warn!("Loading recommendations failed: {}", e);
                self.state.complete(Err(e));
            }
        }
        self.state.phase
    }

    /// Re-fetch everything, keeping the current list until the new one arrives
    pub async fn refresh(&mut self) -> RefreshOutcome {
        if let Err(outcome) = self.state.begin_refresh() {
            debug!("Refresh ignored: {:?}", outcome);
            return outcome;
        }

        let result = self.fetch_all().await;
        let outcome = match &result {
            Ok(_) => RefreshOutcome::Updated,
            Err(e) => {
                warn!("Refreshing recommendations failed: {}", e);
                RefreshOutcome::Failed
            }
        };
        self.state.complete(result);
        outcome
    }

    /// Select a record for the detail view and hand the current list over to
    /// it through the `hackathons` store key.
    pub async fn select(&mut self, index: usize) -> Result<Option<&RecommendationRecord>, RecsError> {
        if index >= self.state.recommendations.len() {
            return Ok(None);
        }

        self.store
            .save_hackathons(&self.state.recommendations)
            .await?;
        self.state.selected = Some(index);
        Ok(self.state.selected_record())
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Script {
        calls: Vec<&'static str>,
        fail_user: Option<(u16, Option<String>)>,
        fail_recommendations: Option<(u16, Option<String>)>,
        titles: Vec<&'static str>,
    }

    #[derive(Clone, Default)]
    struct FakeSource(Arc<Mutex<Script>>);

    fn api_error(failure: &(u16, Option<String>)) -> RecsError {
        RecsError::ApiError {
            status: failure.0,
            detail: failure.1.clone(),
        }
    }

    #[async_trait]
    impl RecommendationSource for FakeSource {
        async fn fetch_user(&self, id: &UserId) -> Result<UserProfile, RecsError> {
            let mut script = self.0.lock().unwrap();
            script.calls.push("user");
            if let Some(failure) = &script.fail_user {
                return Err(api_error(failure));
            }
            Ok(UserProfile {
                id: Some(id.clone()),
                username: "ada".to_string(),
                skills: vec!["rust".to_string()],
                email: "ada@example.com".to_string(),
            })
        }

        async fn fetch_recommendations(
            &self,
            _id: &UserId,
        ) -> Result<Vec<RecommendationRecord>, RecsError> {
            let mut script = self.0.lock().unwrap();
            script.calls.push("recommendations");
            if let Some(failure) = &script.fail_recommendations {
                return Err(api_error(failure));
            }
            Ok(script
                .titles
                .iter()
                .map(|t| RecommendationRecord::new(*t))
                .collect())
        }
    }

    async fn signed_in_store(dir: &tempfile::TempDir) -> LocalStore {
        let store = LocalStore::new(dir.path().join("storage.json"));
        store.set_user_id(&UserId::new("3")).await.unwrap();
        store
    }

    async fn active(source: FakeSource, store: LocalStore) -> SessionController<FakeSource> {
        match SessionController::enter(source, store).await {
            SessionEntry::Active(controller) => controller,
            SessionEntry::RedirectToLogin => panic!("Expected an active session"),
        }
    }

    fn titles(state: &SessionState) -> Vec<&str> {
        state.recommendations.iter().map(|r| r.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_missing_user_id_redirects() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("storage.json"));
        let entry = SessionController::enter(FakeSource::default(), store).await;
        assert!(matches!(entry, SessionEntry::RedirectToLogin));
    }

    #[tokio::test]
    async fn test_load_reaches_ready() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().titles = vec!["A", "B"];

        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;
        assert_eq!(controller.state().phase, Phase::Idle);
        assert_eq!(controller.state().view(), SessionView::Loading);

        assert_eq!(controller.load().await, Phase::Ready);
        let state = controller.state();
        assert_eq!(titles(state), vec!["A", "B"]);
        assert_eq!(state.profile.as_ref().unwrap().username, "ada");
        assert!(state.error.is_none());
        assert!(!state.refreshing);
        assert_eq!(source.0.lock().unwrap().calls, vec!["user", "recommendations"]);
    }

    #[tokio::test]
    async fn test_load_only_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;

        controller.load().await;
        controller.load().await;
        assert_eq!(source.0.lock().unwrap().calls.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_list_shows_empty_view() {
        let dir = tempfile::tempdir().unwrap();
        let mut controller = active(FakeSource::default(), signed_in_store(&dir).await).await;

        controller.load().await;
        assert_eq!(controller.state().view(), SessionView::Empty);
    }

    #[tokio::test]
    async fn test_profile_failure_skips_recommendation_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().fail_user = Some((404, Some("User not found.".to_string())));

        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;
        assert_eq!(controller.load().await, Phase::Failed);

        assert_eq!(source.0.lock().unwrap().calls, vec!["user"]);
        assert_eq!(controller.state().error.as_deref(), Some("User not found."));
        assert_eq!(controller.state().view(), SessionView::Error("User not found."));
    }

    #[tokio::test]
    async fn test_failure_without_detail_uses_generic_message() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().fail_recommendations = Some((500, None));

        let mut controller = active(source, signed_in_store(&dir).await).await;
        controller.load().await;

        assert_eq!(
            controller.state().error.as_deref(),
            Some(crate::error::GENERIC_FAILURE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_refresh_replaces_list_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().titles = vec!["Old"];

        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;
        controller.load().await;

        source.0.lock().unwrap().titles = vec!["New 1", "New 2"];
        assert_eq!(controller.refresh().await, RefreshOutcome::Updated);

        let state = controller.state();
        assert_eq!(titles(state), vec!["New 1", "New 2"]);
        assert_eq!(state.phase, Phase::Ready);
        assert!(!state.refreshing);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_old_list() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().titles = vec!["Old"];

        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;
        controller.load().await;

        source.0.lock().unwrap().fail_recommendations =
            Some((503, Some("Model or data not initialized.".to_string())));
        assert_eq!(controller.refresh().await, RefreshOutcome::Failed);

        let state = controller.state();
        assert_eq!(titles(state), vec!["Old"]);
        assert_eq!(state.phase, Phase::Failed);
        assert_eq!(state.error.as_deref(), Some("Model or data not initialized."));
        assert!(matches!(state.view(), SessionView::List(_)));
    }

    #[tokio::test]
    async fn test_refresh_recovers_from_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().fail_user = Some((500, None));

        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;
        assert_eq!(controller.load().await, Phase::Failed);

        {
            let mut script = source.0.lock().unwrap();
            script.fail_user = None;
            script.titles = vec!["Back"];
        }
        assert_eq!(controller.refresh().await, RefreshOutcome::Updated);
        assert_eq!(controller.state().phase, Phase::Ready);
        assert!(controller.state().error.is_none());
    }

    #[tokio::test]
    async fn test_refresh_before_load_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        let mut controller = active(source.clone(), signed_in_store(&dir).await).await;

        assert_eq!(controller.refresh().await, RefreshOutcome::NotLoaded);
        assert!(source.0.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn test_refresh_keeps_list_visible_while_in_flight() {
        let mut state = SessionState::new();
        assert!(state.begin_load());
        state.complete(Ok((
            UserProfile {
                id: None,
                username: "ada".to_string(),
                skills: vec![],
                email: String::new(),
            },
            vec![RecommendationRecord::new("Visible")],
        )));

        assert!(state.begin_refresh().is_ok());
        assert!(state.refreshing);
        assert_eq!(state.phase, Phase::Ready);
        assert!(matches!(state.view(), SessionView::List(list) if list[0].title == "Visible"));

        // A second refresh while the first is running is dropped
        assert_eq!(state.begin_refresh(), Err(RefreshOutcome::AlreadyInFlight));
    }

    #[test]
    fn test_load_while_loading_is_ignored() {
        let mut state = SessionState::new();
        assert!(state.begin_load());
        assert!(!state.begin_load());
        assert_eq!(state.begin_refresh(), Err(RefreshOutcome::AlreadyInFlight));
    }

    #[tokio::test]
    async fn test_select_hands_list_to_detail_view() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::default();
        source.0.lock().unwrap().titles = vec!["A", "B"];
        let store = signed_in_store(&dir).await;

        let mut controller = active(source, store.clone()).await;
        controller.load().await;

        let selected = controller.select(1).await.unwrap().unwrap();
        assert_eq!(selected.title, "B");
        assert_eq!(controller.state().selected, Some(1));

        let handed_off = store.load_hackathons().await.unwrap();
        assert_eq!(handed_off.len(), 2);

        assert!(controller.select(5).await.unwrap().is_none());
        assert_eq!(controller.state().selected, Some(1));

        controller.clear_selection();
        assert!(controller.state().selected_record().is_none());
    }
}
