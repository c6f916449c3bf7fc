use std::path::Path;
use std::sync::Arc;

use lingo_core::content::Curriculum;
use lingo_core::model::UserId;
use storage::repository::Storage;

use crate::error::AppServicesError;
use crate::progress_service::ProgressService;
use crate::progress_session::{ProgressSession, SyncStatus};
use crate::Clock;

/// Sample curriculum shipped with the crate.
pub const BUNDLED_CURRICULUM: &str = include_str!("../data/curriculum.json");

/// Load a curriculum from `path`, or the bundled sample when `None`.
///
/// # Errors
///
/// Returns `AppServicesError::Io` if the file cannot be read and
/// `AppServicesError::Curriculum` if it does not validate.
pub fn load_curriculum(path: Option<&Path>) -> Result<Curriculum, AppServicesError> {
    let curriculum = match path {
        Some(path) => Curriculum::from_json_str(&std::fs::read_to_string(path)?)?,
        None => Curriculum::from_json_str(BUNDLED_CURRICULUM)?,
    };
    Ok(curriculum)
}

/// Assembles app-facing services: the progress engine and the content catalogue.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressService>,
    curriculum: Arc<Curriculum>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        curriculum: Curriculum,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::with_storage(&storage, clock, curriculum))
    }

    #[must_use]
    pub fn in_memory(clock: Clock, curriculum: Curriculum) -> Self {
        Self::with_storage(&Storage::in_memory(), clock, curriculum)
    }

    #[must_use]
    pub fn with_storage(storage: &Storage, clock: Clock, curriculum: Curriculum) -> Self {
        Self {
            progress: Arc::new(ProgressService::from_storage(clock, storage)),
            curriculum: Arc::new(curriculum),
        }
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn curriculum(&self) -> Arc<Curriculum> {
        Arc::clone(&self.curriculum)
    }

    /// Open a session for `user`, or a guest session for `None`.
    pub async fn open_session(&self, user: Option<UserId>) -> (ProgressSession, SyncStatus) {
        match user {
            Some(user) => ProgressSession::signed_in(self.progress(), user).await,
            None => (ProgressSession::guest(self.progress()), SyncStatus::Skipped),
        }
    }
}
