//! Analysis session and watchlist coordination
//!
//! Client-side core of a multi-agent stock analysis application. It tracks
//! the single-ticker analysis a user is looking at and keeps a set of named
//! watchlists ("profiles") consistent with the backend that stores and
//! evaluates them.
//!
//! - [`session`]: the one live analysis, with last-start-wins supersession
//! - [`reconciler`]: cached profiles, the selection and ticker mutations
//! - [`watchlist`]: bulk evaluation of the selected profile
//! - [`normalizer`] and [`verdict`]: coercion of loosely typed agent output
//! - [`view`] and [`formatter`]: display models and text rendering
//! - [`api`]: the REST backend client
//!
//! # Example
//!
//! ```rust,ignore
//! use arbiticker_core::{Coordinator, CoordinatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CoordinatorConfig::from_env()?;
//!     let mut coordinator = Coordinator::connect(&config)?;
//!
//!     coordinator.profiles_mut().load().await;
//!     coordinator.analyze("NVDA").await?;
//!
//!     println!("{:#?}", coordinator.dashboard());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod formatter;
pub mod model;
pub mod normalizer;
pub mod provider;
pub mod reconciler;
pub mod session;
pub mod store;
pub mod verdict;
pub mod view;
pub mod watchlist;

pub use api::HttpBackend;
pub use config::{CoordinatorConfig, CoordinatorConfigBuilder};
pub use coordinator::{Coordinator, DashboardView};
pub use error::{Error, ErrorKind, ErrorNotice, ProviderError, Result, StoreError, ValidationError};
pub use formatter::{Formatter, FormatterKind, MarkdownFormatter, PlainFormatter};
pub use model::{AnalysisResult, CheckWatchlistResponse, Profile, QuantData, VerdictData, WatchlistEntry};
pub use provider::AnalysisProvider;
pub use reconciler::ProfileReconciler;
pub use session::{Session, SessionController, SessionStatus, Settlement};
pub use store::{InMemoryProfileStore, ProfileStore};
pub use verdict::Verdict;
pub use view::{AnalysisView, SessionView, WatchlistView};
pub use watchlist::WatchlistEvaluator;
