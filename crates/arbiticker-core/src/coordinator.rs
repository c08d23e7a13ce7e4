//! Top-level facade tying the analysis session to the profile reconciler

use crate::api::HttpBackend;
use crate::config::CoordinatorConfig;
use crate::error::{ErrorNotice, Result, ValidationError};
use crate::model::Profile;
use crate::provider::AnalysisProvider;
use crate::reconciler::ProfileReconciler;
use crate::session::{SessionController, Settlement};
use crate::store::ProfileStore;
use crate::view::{SessionView, WatchlistView};
use serde::Serialize;
use std::sync::Arc;

/// Snapshot of everything a front end renders
///
/// The three sections (analysis, profiles, watchlist) keep independent
/// error state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub session: SessionView,
    pub profiles: Vec<Profile>,
    pub selected_id: Option<String>,
    pub profile_error: Option<ErrorNotice>,
    pub notice: Option<String>,
    pub watchlist: Option<WatchlistView>,
    pub watchlist_error: Option<ErrorNotice>,
    pub checking: bool,
}

impl DashboardView {
    pub fn selected(&self) -> Option<&Profile> {
        let id = self.selected_id.as_deref()?;
        self.profiles.iter().find(|p| p.id == id)
    }
}

pub struct Coordinator {
    session: Arc<SessionController>,
    profiles: ProfileReconciler,
}

impl Coordinator {
    pub fn new(
        provider: Arc<dyn AnalysisProvider>,
        store: Arc<dyn ProfileStore>,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            session: Arc::new(SessionController::new(provider)),
            profiles: ProfileReconciler::with_config(store, config),
        }
    }

    /// Coordinator backed by the REST backend at `config.api_base`
    pub fn connect(config: &CoordinatorConfig) -> Result<Self> {
        config.validate()?;
        let backend = Arc::new(HttpBackend::new(config)?);
        tracing::info!(api_base = %backend.base_url(), "connecting to analysis backend");
        Ok(Self::new(backend.clone(), backend, config))
    }

    /// Shared handle to the session, for spawning overlapping analyses
    pub fn session(&self) -> Arc<SessionController> {
        Arc::clone(&self.session)
    }

    pub fn profiles(&self) -> &ProfileReconciler {
        &self.profiles
    }

    pub fn profiles_mut(&mut self) -> &mut ProfileReconciler {
        &mut self.profiles
    }

    /// Run a single-ticker analysis
    pub async fn analyze(&self, ticker: &str) -> std::result::Result<Settlement, ValidationError> {
        self.session.start_analysis(ticker).await
    }

    /// Analyze a ticker picked from the watchlist
    pub async fn analyze_watchlist_ticker(
        &self,
        ticker: &str,
    ) -> std::result::Result<Settlement, ValidationError> {
        tracing::debug!(%ticker, profile = ?self.profiles.selected_id(), "analyzing watchlist ticker");
        self.session.start_analysis(ticker).await
    }

    pub fn dashboard(&self) -> DashboardView {
        let session = self.session.snapshot();
        let watchlist = self.profiles.watchlist();
        DashboardView {
            session: SessionView::from(&session),
            profiles: self.profiles.profiles().to_vec(),
            selected_id: self.profiles.selected_id().map(ToString::to_string),
            profile_error: self.profiles.error().cloned(),
            notice: self.profiles.notice().map(ToString::to_string),
            watchlist: watchlist.result().map(WatchlistView::from),
            watchlist_error: watchlist.error().cloned(),
            checking: watchlist.is_checking(),
        }
    }
}
