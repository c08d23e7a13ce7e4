//! Profile and watchlist reconciliation
//!
//! [`ProfileReconciler`] caches the profile list, tracks which profile is
//! selected and keeps the batch-check result of the [`WatchlistEvaluator`]
//! consistent with the selected profile's tickers:
//!
//! - the selected id always names a profile in the cached list, or nothing
//!   when the list is empty;
//! - changing the selection discards the previous profile's batch result;
//! - after a ticker mutation the store's canonical profile replaces the
//!   cached one, and batch rows for tickers no longer watched are dropped.
//!
//! Collaborator failures never escape: they are stored as [`ErrorNotice`]s
//! on the reconciler (profile operations) or on the evaluator (ticker and
//! batch operations).

use crate::config::CoordinatorConfig;
use crate::error::{ErrorKind, ErrorNotice, ValidationError};
use crate::model::{Profile, normalize_ticker};
use crate::store::ProfileStore;
use crate::watchlist::WatchlistEvaluator;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Prefix of the message shown when the profile list cannot be loaded
pub const UNREACHABLE_PREFIX: &str = "Backend not reachable. Start the server first.";

#[derive(Debug, Clone)]
struct Notice {
    message: String,
    expires_at: Instant,
}

pub struct ProfileReconciler {
    store: Arc<dyn ProfileStore>,
    profiles: Vec<Profile>,
    selected: Option<Profile>,
    error: Option<ErrorNotice>,
    notice: Option<Notice>,
    creating: bool,
    deleting: bool,
    watchlist: WatchlistEvaluator,
    default_profile_name: String,
    notice_ttl: Duration,
    revision: watch::Sender<u64>,
}

impl ProfileReconciler {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self::with_config(store, &CoordinatorConfig::default())
    }

    pub fn with_config(store: Arc<dyn ProfileStore>, config: &CoordinatorConfig) -> Self {
        Self {
            store,
            profiles: Vec::new(),
            selected: None,
            error: None,
            notice: None,
            creating: false,
            deleting: false,
            watchlist: WatchlistEvaluator::new(),
            default_profile_name: config.default_profile_name.clone(),
            notice_ttl: config.notice_ttl,
            revision: watch::Sender::new(0),
        }
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn selected(&self) -> Option<&Profile> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_ref().map(|p| p.id.as_str())
    }

    /// Last profile-level failure
    pub fn error(&self) -> Option<&ErrorNotice> {
        self.error.as_ref()
    }

    /// Success message, while it has not expired
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| Instant::now() < n.expires_at)
            .map(|n| n.message.as_str())
    }

    pub fn is_creating(&self) -> bool {
        self.creating
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Batch-check state for the selected profile
    pub fn watchlist(&self) -> &WatchlistEvaluator {
        &self.watchlist
    }

    /// Receiver that changes whenever reconciler state changes
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn touch(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn set_notice(&mut self, message: String) {
        self.notice = Some(Notice {
            message,
            expires_at: Instant::now() + self.notice_ttl,
        });
    }

    /// Change the selection; `force` resets the batch result even when the
    /// id stays the same
    fn set_selected(&mut self, profile: Option<Profile>, force: bool) {
        let previous = self.selected_id().map(ToString::to_string);
        let next = profile.as_ref().map(|p| p.id.clone());
        if force || previous != next {
            tracing::debug!(?previous, ?next, "selection changed, clearing watchlist check");
            self.watchlist.reset();
        }
        self.selected = profile;
    }

    /// Replace the cached copy of `profile` (or append it) and refresh the
    /// selection when it is the selected one
    fn upsert(&mut self, profile: &Profile) {
        match self.profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(cached) => cached.clone_from(profile),
            None => self.profiles.push(profile.clone()),
        }
        if self.selected_id() == Some(profile.id.as_str()) {
            self.selected = Some(profile.clone());
        }
    }

    /// Fetch all profiles and repair the selection
    pub async fn load(&mut self) -> bool {
        self.error = None;
        let outcome = self.store.list_profiles().await;
        let ok = match outcome {
            Ok(list) => {
                tracing::info!(count = list.len(), "profiles loaded");
                let keep = self
                    .selected_id()
                    .and_then(|id| list.iter().find(|p| p.id == id))
                    .cloned();
                let next = keep.or_else(|| list.first().cloned());
                self.profiles = list;
                self.set_selected(next, false);
                if let Some(selected) = self.selected.as_ref() {
                    self.watchlist.retain(&selected.tickers);
                }
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not load profiles");
                self.profiles.clear();
                self.set_selected(None, false);
                self.error = Some(ErrorNotice::new(
                    ErrorKind::StoreUnreachable,
                    format!("{UNREACHABLE_PREFIX} {err}"),
                ));
                false
            }
        };
        self.touch();
        ok
    }

    /// Create a profile and select it
    ///
    /// Blank names fall back to the configured default name.
    pub async fn create(&mut self, name: &str) -> Option<Profile> {
        let name = match name.trim() {
            "" => self.default_profile_name.clone(),
            trimmed => trimmed.to_string(),
        };
        self.creating = true;
        self.error = None;
        self.notice = None;
        self.touch();

        let outcome = self.store.create_profile(&name).await;
        self.creating = false;
        let created = match outcome {
            Ok(profile) => {
                tracing::info!(id = %profile.id, name = %profile.name, "profile created");
                self.profiles.push(profile.clone());
                self.set_selected(Some(profile.clone()), false);
                self.set_notice(format!("Profile \"{}\" created.", profile.name));
                Some(profile)
            }
            Err(err) => {
                tracing::warn!(%name, error = %err, "could not create profile");
                self.error = Some(ErrorNotice::from(&err));
                None
            }
        };
        self.touch();
        created
    }

    /// Select a profile by id; an empty id clears the selection
    ///
    /// The canonical profile is fetched from the store. If that fails the
    /// cached copy is used instead, or the selection is cleared when there
    /// is none.
    pub async fn select(&mut self, id: &str) {
        if id.is_empty() {
            self.set_selected(None, true);
            self.touch();
            return;
        }

        match self.store.get_profile(id).await {
            Ok(profile) => {
                self.upsert(&profile);
                self.set_selected(Some(profile), true);
            }
            Err(err) => {
                let cached = self.profiles.iter().find(|p| p.id == id).cloned();
                tracing::warn!(%id, error = %err, cached = cached.is_some(), "falling back to cached profile");
                self.set_selected(cached, true);
            }
        }
        self.touch();
    }

    /// Delete a profile after explicit confirmation
    ///
    /// Returns `false` without contacting the store when `confirmed` is
    /// false. On success the first remaining profile (if any) is selected.
    pub async fn delete(&mut self, id: &str, confirmed: bool) -> bool {
        if id.is_empty() {
            self.error = Some(ValidationError::EmptyProfileId.into());
            self.touch();
            return false;
        }
        if !confirmed {
            tracing::debug!(%id, "delete not confirmed");
            return false;
        }

        self.deleting = true;
        self.error = None;
        self.notice = None;
        self.touch();

        let outcome = self.store.delete_profile(id).await;
        self.deleting = false;
        let ok = match outcome {
            Ok(()) => {
                tracing::info!(%id, "profile deleted");
                self.profiles.retain(|p| p.id != id);
                self.set_selected(self.profiles.first().cloned(), false);
                self.set_notice("Profile deleted.".to_string());
                true
            }
            Err(err) => {
                tracing::warn!(%id, error = %err, "could not delete profile");
                self.error = Some(ErrorNotice::from(&err));
                false
            }
        };
        self.touch();
        ok
    }

    /// Add a ticker to a profile's watchlist
    pub async fn add_ticker(&mut self, profile_id: &str, ticker: &str) -> bool {
        let ticker = match normalize_ticker(ticker) {
            Ok(ticker) => ticker,
            Err(err) => {
                self.watchlist.set_error(err.into());
                self.touch();
                return false;
            }
        };
        self.update_tickers(profile_id, Some(vec![ticker]), None)
            .await
    }

    /// Remove a ticker from a profile's watchlist and from any cached batch
    /// result
    pub async fn remove_ticker(&mut self, profile_id: &str, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            self.watchlist.set_error(ValidationError::EmptyTicker.into());
            self.touch();
            return false;
        }
        let updated = self
            .update_tickers(profile_id, None, Some(vec![ticker.clone()]))
            .await;
        if updated && self.selected_id() == Some(profile_id) {
            self.watchlist.prune(&ticker);
            self.touch();
        }
        updated
    }

    async fn update_tickers(
        &mut self,
        profile_id: &str,
        add: Option<Vec<String>>,
        remove: Option<Vec<String>>,
    ) -> bool {
        if profile_id.is_empty() {
            self.watchlist.set_error(ValidationError::EmptyProfileId.into());
            self.touch();
            return false;
        }

        self.watchlist.clear_error();
        let updated = match self.store.update_tickers(profile_id, add, remove).await {
            Ok(profile) => {
                tracing::info!(id = %profile.id, tickers = ?profile.tickers, "watchlist updated");
                self.upsert(&profile);
                if self.selected_id() == Some(profile.id.as_str()) {
                    self.watchlist.retain(&profile.tickers);
                }
                true
            }
            Err(err) => {
                tracing::warn!(id = %profile_id, error = %err, "watchlist update failed");
                self.watchlist.set_error(ErrorNotice::from(&err));
                false
            }
        };
        self.touch();
        updated
    }

    /// Run the bulk evaluation for `profile_id`
    ///
    /// Results are only kept for the selected profile, so any other id is a
    /// no-op.
    pub async fn check_watchlist_for(&mut self, profile_id: &str) -> bool {
        if self.selected_id() != Some(profile_id) {
            tracing::debug!(%profile_id, selected = ?self.selected_id(), "skipping check for unselected profile");
            return false;
        }
        self.check_watchlist().await
    }

    /// Run the bulk evaluation for the selected profile
    ///
    /// The profile id is implied by the selection. No-op when nothing is
    /// selected.
    pub async fn check_watchlist(&mut self) -> bool {
        let ok = self
            .watchlist
            .check(self.store.as_ref(), self.selected.as_ref())
            .await;
        self.touch();
        ok
    }
}
