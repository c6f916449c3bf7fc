//! Shared error types for the services crate.

use thiserror::Error;

use lingo_core::content::CurriculumError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("streak record kept changing during update ({attempts} attempts)")]
    StreakContention { attempts: u32 },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Curriculum(#[from] CurriculumError),
    #[error("cannot read curriculum file: {0}")]
    Io(#[from] std::io::Error),
}
