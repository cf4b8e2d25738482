use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::CanvasConfig;
use crate::error::CanvasError;

#[derive(Debug, Clone, Deserialize)]
pub struct Assignment {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    /// Absent or null when the assignment has no due date.
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub has_submitted_submissions: bool,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub course_code: String,
    /// One record per term; all are consulted for score changes.
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Enrollment {
    #[serde(default)]
    pub computed_current_score: Option<f64>,
    #[serde(default)]
    pub computed_current_grade: Option<String>,
    #[serde(default)]
    pub computed_final_score: Option<f64>,
    #[serde(default)]
    pub computed_final_grade: Option<String>,
}

impl Enrollment {
    /// A missing or null score reads as zero, matching the upstream shape
    /// for courses that have not been graded yet.
    pub fn current_score(&self) -> f64 {
        self.computed_current_score.unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
struct CourseRef {
    id: i64,
}

#[derive(Clone)]
pub struct CanvasClient {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl CanvasClient {
    pub fn new(config: &CanvasConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    /// Ids of the caller's favorited courses.
    pub async fn favorite_course_ids(&self) -> Result<Vec<i64>, CanvasError> {
        let courses: Vec<CourseRef> = self.get_json("/api/v1/users/self/favorites/courses").await?;
        Ok(courses.into_iter().map(|course| course.id).collect())
    }

    /// Favorited courses with enrollment score data attached.
    pub async fn favorite_courses_with_scores(&self) -> Result<Vec<Course>, CanvasError> {
        self.get_json("/api/v1/users/self/favorites/courses?include[]=total_scores")
            .await
    }

    pub async fn assignments(&self, course_id: i64) -> Result<Vec<Assignment>, CanvasError> {
        self.get_json(&format!("/api/v1/courses/{course_id}/assignments"))
            .await
    }

    // Single-page reads only: the API paginates via Link headers, but a
    // favorites list stays well under one page.
    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, CanvasError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .http
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .send()
            .await
            .map_err(|source| CanvasError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CanvasError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }

        response.json().await.map_err(|source| CanvasError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
