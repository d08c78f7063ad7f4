//! Version history for sentencify editor fields.
//!
//! Every topic (a named section of a decision, such as the report or the
//! ruling) keeps a short history of its content:
//! - Identical consecutive saves are collapsed
//! - Only the newest versions are retained (10 by default)
//! - Restoring a version first saves what is currently in the editor
//!
//! # Example
//!
//! ```no_run
//! use sentencify_history::{HistoryConfig, VersionStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = VersionStore::open(".sentencify/history", HistoryConfig::default()).await?;
//!
//! store.save_version("DISPOSITIVO", "<p>Julgo procedente.</p>").await;
//!
//! let versions = store.get_versions("DISPOSITIVO").await;
//! if let Some(oldest) = versions.last() {
//!     let restored = store
//!         .restore_version(oldest.id, "<p>Julgo improcedente.</p>", "DISPOSITIVO")
//!         .await;
//!     println!("{restored:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod config;
pub mod diff;
mod error;
mod locks;
pub mod preview;
mod store;

pub use config::{HistoryConfig, DEFAULT_MAX_VERSIONS, DEFAULT_PREVIEW_LENGTH};
pub use error::{HistoryError, HistoryResult};
pub use sentencify_storage::{VersionBackend, VersionId, VersionRecord};
pub use store::VersionStore;
