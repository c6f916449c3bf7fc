use anyhow::{Result, bail};
use chrono::NaiveDate;
use lingo_core::content::Curriculum;
use lingo_core::model::LessonId;
use lingo_core::quiz::{QuizAttempt, Verdict};
use lingo_core::streak::{StreakStamp, display_streak};
use lingo_core::translation;
use services::{ProgressSession, SyncStatus};

const RECENT_SCORES: usize = 5;

fn report(session: &ProgressSession, status: &SyncStatus) {
    match status {
        SyncStatus::Persisted => {}
        SyncStatus::Skipped => {
            if session.is_guest() {
                println!("(guest mode: progress is not saved; pass --user to keep it)");
            }
        }
        SyncStatus::Failed(e) => eprintln!("warning: progress was not saved: {e}"),
    }
}

fn verdict_line(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Excellent => "Excellent work!",
        Verdict::Good => "Good job, keep going.",
        Verdict::KeepPracticing => "Keep practicing and try again.",
    }
}

fn require_lesson<'c>(
    curriculum: &'c Curriculum,
    lesson: &LessonId,
) -> Result<&'c lingo_core::content::Lesson> {
    match curriculum.lesson(lesson) {
        Some(found) => Ok(found),
        None => bail!("unknown lesson: {lesson}"),
    }
}

pub fn status(session: &ProgressSession, curriculum: &Curriculum, today: NaiveDate) {
    let snapshot = session.snapshot();
    let stamp = StreakStamp::new(snapshot.streak(), snapshot.last_activity_date());

    match session.user() {
        Some(user) => println!("Learner: {user}"),
        None => println!("Learner: guest"),
    }
    println!("Streak: {} day(s)", display_streak(today, stamp));
    println!(
        "Course: {}% ({} of {} lessons)",
        curriculum.overall_progress(snapshot.completed_lessons()),
        snapshot.completed_lessons().len(),
        curriculum.lesson_count()
    );

    for week in curriculum.weeks() {
        println!(
            "  Week {} {:<28} {:>3}%",
            week.week_number,
            week.title,
            curriculum.week_progress(week.week_number, snapshot.completed_lessons())
        );
    }

    if !snapshot.quiz_scores().is_empty() {
        println!("Recent quizzes:");
        for entry in snapshot.quiz_scores().iter().take(RECENT_SCORES) {
            println!(
                "  {} {}/{} ({}%) {}",
                entry.lesson_id,
                entry.score,
                entry.total_questions,
                entry.percentage(),
                entry.completed_at.format("%Y-%m-%d %H:%M")
            );
        }
    }
}

pub fn lessons(session: &ProgressSession, curriculum: &Curriculum) {
    let snapshot = session.snapshot();
    for week in curriculum.weeks() {
        println!("Week {}: {} ({})", week.week_number, week.title, week.theme);
        for lesson in &week.lessons {
            let mark = if snapshot.is_completed(&lesson.id) { "x" } else { " " };
            let best = snapshot
                .latest_score_for(&lesson.id)
                .map(|s| format!("  last quiz {}/{}", s.score, s.total_questions))
                .unwrap_or_default();
            println!("  [{mark}] {:<8} {}{best}", lesson.id, lesson.title);
        }
    }
}

pub async fn complete(
    session: &mut ProgressSession,
    curriculum: &Curriculum,
    lesson: LessonId,
) -> Result<()> {
    let title = require_lesson(curriculum, &lesson)?.title.clone();
    let already = session.snapshot().is_completed(&lesson);

    let status = session.complete_lesson(lesson).await;
    if already {
        println!("{title} was already completed.");
    } else {
        println!("Completed {title}.");
    }
    if !session.is_guest() {
        println!("Streak: {} day(s)", session.snapshot().streak());
    }
    report(session, &status);
    Ok(())
}

pub async fn quiz(
    session: &mut ProgressSession,
    curriculum: &Curriculum,
    lesson: LessonId,
    answers: &[String],
) -> Result<()> {
    let questions = &require_lesson(curriculum, &lesson)?.quiz;
    if answers.len() != questions.len() {
        bail!(
            "lesson {lesson} has {} questions but {} answers were given",
            questions.len(),
            answers.len()
        );
    }

    let mut attempt = QuizAttempt::new(questions)?;
    for (question, given) in questions.iter().zip(answers) {
        let feedback = attempt.answer(given.as_str())?;
        if feedback.correct {
            println!("ok   {}", question.question);
        } else {
            println!("miss {} (expected: {})", question.question, feedback.expected);
            println!("     {}", feedback.explanation);
        }
    }

    let result = attempt.finish()?;
    println!(
        "Score: {}/{} ({}%). {}",
        result.score,
        result.total_questions,
        result.percentage,
        verdict_line(result.verdict)
    );

    let status = session
        .record_quiz_score(lesson, result.score, result.total_questions)
        .await;
    report(session, &status);
    Ok(())
}

pub async fn score(session: &mut ProgressSession, lesson: LessonId, score: u32, total: u32) {
    let status = session.record_quiz_score(lesson.clone(), score, total).await;
    println!("Recorded {score}/{total} for {lesson}.");
    report(session, &status);
}

pub fn translate(curriculum: &Curriculum, answers: &[String]) {
    let items = curriculum.translations();
    if answers.is_empty() {
        for (n, item) in items.iter().enumerate() {
            println!("{:>2}. {}", n + 1, item.spanish);
        }
        return;
    }

    let checks = translation::check_all(items, answers);
    for check in &checks {
        if check.correct {
            println!("ok   {}", check.item.spanish);
        } else {
            println!("miss {} (expected: {})", check.item.spanish, check.item.english);
        }
        println!("     {}", check.item.structure);
        for tip in &check.item.tips {
            println!("     - {tip}");
        }
    }

    let correct = checks.iter().filter(|c| c.correct).count();
    println!("Translations: {correct}/{} correct.", checks.len());
    if answers.len() > items.len() {
        eprintln!("warning: {} extra answer(s) ignored", answers.len() - items.len());
    }
}

pub fn routine(curriculum: &Curriculum) {
    println!("Daily routine:");
    for step in curriculum.daily_routine() {
        println!(
            "  {:<8} {:<40} {}",
            step.time, step.activity, step.duration
        );
    }
}
