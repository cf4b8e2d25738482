use std::sync::Arc;
use std::time::Duration;

use crate::canvas::{CanvasClient, Course};
use crate::telegram::Notifier;
use crate::tracker::ScoreTracker;

const CHECK_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, PartialEq)]
pub struct ScoreChange {
    pub course_id: i64,
    pub course_code: String,
    pub previous: f64,
    pub score: f64,
}

/// Global hourly loop: fetch all favorited courses with score data, notify
/// on any change, sleep an hour. A failed fetch is logged and the loop
/// still sleeps the full interval.
pub struct GradeWatcher {
    canvas: CanvasClient,
    notifier: Arc<Notifier>,
    tracker: Arc<ScoreTracker>,
}

impl GradeWatcher {
    pub fn new(canvas: CanvasClient, notifier: Arc<Notifier>, tracker: Arc<ScoreTracker>) -> Self {
        Self {
            canvas,
            notifier,
            tracker,
        }
    }

    pub async fn run(self) {
        loop {
            match self.canvas.favorite_courses_with_scores().await {
                Ok(courses) => {
                    for change in scan(&courses, &self.tracker) {
                        tracing::info!(
                            course_id = change.course_id,
                            previous = change.previous,
                            score = change.score,
                            "Course score changed"
                        );
                        let message = format!(
                            "Score change detected for Course: {}. New score: {:.2}",
                            change.course_code, change.score
                        );
                        self.notifier.broadcast(&message).await;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to fetch course scores"),
            }
            tokio::time::sleep(CHECK_INTERVAL).await;
        }
    }
}

/// Compare every enrollment against the tracked baseline, updating it and
/// collecting the changes. Every observed score is logged either way.
pub fn scan(courses: &[Course], tracker: &ScoreTracker) -> Vec<ScoreChange> {
    let mut changes = Vec::new();
    for course in courses {
        for enrollment in &course.enrollments {
            let score = enrollment.current_score();
            tracing::info!(course_id = course.id, course = %course.name, score, "Observed course score");
            if let Some(previous) = tracker.record(course.id, score) {
                changes.push(ScoreChange {
                    course_id: course.id,
                    course_code: course.course_code.clone(),
                    previous,
                    score,
                });
            }
        }
    }
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Enrollment;

    fn course(id: i64, code: &str, score: f64) -> Course {
        Course {
            id,
            name: format!("Course {id}"),
            course_code: code.to_string(),
            enrollments: vec![Enrollment {
                computed_current_score: Some(score),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_scan_first_pass_notifies_all_nonzero_scores() {
        let tracker = ScoreTracker::new();
        let courses = vec![course(1, "CSC 139", 70.0), course(2, "MATH 45", 85.5)];

        let changes = scan(&courses, &tracker);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].previous, 0.0);
        assert_eq!(changes[0].score, 70.0);
        assert_eq!(changes[1].course_code, "MATH 45");
    }

    #[test]
    fn test_scan_unchanged_then_single_change() {
        let tracker = ScoreTracker::new();
        let courses = vec![course(1, "CSC 139", 70.0), course(2, "MATH 45", 85.5)];

        scan(&courses, &tracker);
        assert!(scan(&courses, &tracker).is_empty());

        let updated = vec![course(1, "CSC 139", 72.0), course(2, "MATH 45", 85.5)];
        let changes = scan(&updated, &tracker);
        assert_eq!(
            changes,
            vec![ScoreChange {
                course_id: 1,
                course_code: "CSC 139".to_string(),
                previous: 70.0,
                score: 72.0,
            }]
        );
    }

    #[test]
    fn test_scan_zero_score_first_pass_is_quiet() {
        let tracker = ScoreTracker::new();
        let courses = vec![course(1, "CSC 139", 0.0)];
        assert!(scan(&courses, &tracker).is_empty());
    }

    #[test]
    fn test_scan_course_without_enrollments_is_skipped() {
        let tracker = ScoreTracker::new();
        let courses = vec![Course {
            id: 9,
            name: "Seminar".to_string(),
            course_code: "SEM 1".to_string(),
            enrollments: vec![],
        }];
        assert!(scan(&courses, &tracker).is_empty());
    }
}
