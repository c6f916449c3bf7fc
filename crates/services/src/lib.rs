#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod progress_session;

pub use lingo_core::Clock;

pub use app_services::{AppServices, BUNDLED_CURRICULUM, load_curriculum};
pub use error::{AppServicesError, ProgressServiceError};
pub use progress_service::{LessonCompletion, MAX_STREAK_ATTEMPTS, ProgressService, QuizSubmission};
pub use progress_session::{ProgressSession, SyncStatus};
