use std::sync::Arc;

use lingo_core::model::{LessonId, UserId};
use lingo_core::time::fixed_clock;
use services::{Clock, ProgressService, ProgressSession};
use storage::repository::Storage;

fn lesson(id: &str) -> LessonId {
    LessonId::new(id).unwrap()
}

async fn session_on(storage: &Storage, clock: Clock) -> ProgressSession {
    let service = Arc::new(ProgressService::from_storage(clock, storage));
    let (session, status) =
        ProgressSession::signed_in(service, UserId::new("u1").unwrap()).await;
    assert!(status.is_persisted());
    session
}

#[tokio::test]
async fn streak_continues_then_resets_across_days() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_flow?mode=memory&cache=shared")
        .await
        .expect("connect sqlite");
    let day0 = fixed_clock();

    let mut session = session_on(&storage, day0).await;
    assert!(session.complete_lesson(lesson("w1-d1")).await.is_persisted());
    assert_eq!(session.snapshot().streak(), 1);
    assert_eq!(session.snapshot().last_activity_date(), Some(day0.today()));

    let mut session = session_on(&storage, day0.plus_days(1)).await;
    assert!(
        session
            .record_quiz_score(lesson("w1-d1"), 2, 3)
            .await
            .is_persisted()
    );
    assert_eq!(session.snapshot().streak(), 2);
    let scores = session.snapshot().quiz_scores();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].lesson_id, lesson("w1-d1"));
    assert_eq!((scores[0].score, scores[0].total_questions), (2, 3));

    let mut session = session_on(&storage, day0.plus_days(4)).await;
    assert!(session.complete_lesson(lesson("w1-d2")).await.is_persisted());
    assert_eq!(session.snapshot().streak(), 1);

    // a fresh load agrees with the optimistic state
    let reloaded = session_on(&storage, day0.plus_days(4)).await;
    assert_eq!(reloaded.snapshot(), session.snapshot());
    assert_eq!(reloaded.snapshot().completed_lessons().len(), 2);
}

#[tokio::test]
async fn same_day_activity_keeps_the_streak() {
    let storage = Storage::in_memory();
    let day0 = fixed_clock();

    let mut session = session_on(&storage, day0).await;
    let _ = session.complete_lesson(lesson("w1-d1")).await;
    let mut session = session_on(&storage, day0.plus_days(1)).await;
    let _ = session.complete_lesson(lesson("w1-d2")).await;
    assert_eq!(session.snapshot().streak(), 2);

    let _ = session.complete_lesson(lesson("w1-d2")).await;
    let _ = session.record_quiz_score(lesson("w1-d2"), 1, 2).await;
    assert_eq!(session.snapshot().streak(), 2);
    assert_eq!(session.snapshot().completed_lessons().len(), 2);
}

#[tokio::test]
async fn quiz_log_is_newest_first_after_reload() {
    let storage = Storage::in_memory();
    let mut clock = fixed_clock();

    for score in [1, 2, 3] {
        let mut session = session_on(&storage, clock).await;
        let _ = session.record_quiz_score(lesson("w1-d3"), score, 3).await;
        clock.advance(chrono::Duration::seconds(5));
    }

    let session = session_on(&storage, clock).await;
    let scores: Vec<u32> = session
        .snapshot()
        .quiz_scores()
        .iter()
        .map(|s| s.score)
        .collect();
    assert_eq!(scores, vec![3, 2, 1]);
}
