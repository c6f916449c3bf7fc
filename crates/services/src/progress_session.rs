use std::sync::Arc;

use tracing::{info, warn};

use lingo_core::model::{LessonId, ProgressSnapshot, QuizScore, UserId};
use lingo_core::streak::StreakRule;

use crate::error::ProgressServiceError;
use crate::progress_service::ProgressService;

/// What happened to the durable side of a session operation.
#[derive(Debug)]
#[must_use]
pub enum SyncStatus {
    Persisted,
    /// Guest session; nothing was sent to storage.
    Skipped,
    /// Storage failed. The local snapshot keeps the optimistic change.
    Failed(ProgressServiceError),
}

impl SyncStatus {
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    #[must_use]
    pub fn error(&self) -> Option<&ProgressServiceError> {
        match self {
            Self::Failed(e) => Some(e),
            Self::Persisted | Self::Skipped => None,
        }
    }
}

/// Progress state for one signed-in (or guest) client session.
///
/// Owns the current identity and the cached snapshot. Mutations are applied to
/// the snapshot first, streak included; storage failures are logged and reported through
/// [`SyncStatus`] but never undo the local change. A later [`refresh`] brings
/// the snapshot back in line with the store.
///
/// [`refresh`]: ProgressSession::refresh
pub struct ProgressSession {
    service: Arc<ProgressService>,
    user: Option<UserId>,
    snapshot: ProgressSnapshot,
}

impl ProgressSession {
    #[must_use]
    pub fn guest(service: Arc<ProgressService>) -> Self {
        Self {
            service,
            user: None,
            snapshot: ProgressSnapshot::guest(),
        }
    }

    /// Start a session for `user` and load their progress.
    pub async fn signed_in(service: Arc<ProgressService>, user: UserId) -> (Self, SyncStatus) {
        let mut session = Self::guest(service);
        let status = session.sign_in(user).await;
        (session, status)
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }

    #[must_use]
    pub fn snapshot(&self) -> &ProgressSnapshot {
        &self.snapshot
    }

    /// Switch to `user` and load their progress.
    ///
    /// If loading fails the session stays signed in with zero-state progress.
    pub async fn sign_in(&mut self, user: UserId) -> SyncStatus {
        info!(user = %user, "progress session signed in");
        self.user = Some(user);
        self.snapshot = ProgressSnapshot::guest();
        self.refresh().await
    }

    /// Drop the identity and every cached value.
    pub fn sign_out(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user = %user, "progress session signed out");
        }
        self.snapshot = ProgressSnapshot::guest();
    }

    /// Reload the snapshot from storage. Keeps the cached one on failure.
    pub async fn refresh(&mut self) -> SyncStatus {
        let Some(user) = self.user.as_ref() else {
            self.snapshot = ProgressSnapshot::guest();
            return SyncStatus::Skipped;
        };
        match self.service.load_progress(Some(user)).await {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                SyncStatus::Persisted
            }
            Err(e) => {
                warn!(user = %user, error = %e, "failed to load progress");
                SyncStatus::Failed(e)
            }
        }
    }

    /// Mark a lesson completed. No-op for guests.
    pub async fn complete_lesson(&mut self, lesson_id: LessonId) -> SyncStatus {
        let Some(user) = self.user.as_ref() else {
            return SyncStatus::Skipped;
        };

        self.snapshot.mark_completed(lesson_id.clone());
        count_today(&self.service, &mut self.snapshot);
        match self.service.complete_lesson(Some(user), &lesson_id).await {
            Ok(Some(done)) => {
                self.snapshot.apply_streak(&done.streak);
                SyncStatus::Persisted
            }
            Ok(None) => SyncStatus::Skipped,
            Err(e) => {
                warn!(user = %user, lesson = %lesson_id, error = %e, "failed to complete lesson");
                SyncStatus::Failed(e)
            }
        }
    }

    /// Log a quiz score. No-op for guests.
    pub async fn record_quiz_score(
        &mut self,
        lesson_id: LessonId,
        score: u32,
        total_questions: u32,
    ) -> SyncStatus {
        let Some(user) = self.user.as_ref() else {
            return SyncStatus::Skipped;
        };

        let entry = QuizScore::new(lesson_id, score, total_questions, self.service.now());
        self.snapshot.push_quiz_score(entry.clone());
        count_today(&self.service, &mut self.snapshot);
        match self.service.submit_quiz_score(Some(user), entry).await {
            Ok(Some(submitted)) => {
                self.snapshot.apply_streak(&submitted.streak);
                SyncStatus::Persisted
            }
            Ok(None) => SyncStatus::Skipped,
            Err(e) => {
                warn!(user = %user, error = %e, "failed to save quiz score");
                SyncStatus::Failed(e)
            }
        }
    }
}

/// Run the streak rule on the cached values. The stored result replaces it
/// once the write succeeds.
fn count_today(service: &ProgressService, snapshot: &mut ProgressSnapshot) {
    let local = StreakRule::apply(service.today(), Some(snapshot.streak_stamp()));
    snapshot.apply_streak(&local);
}
