//! Canvas API client contract tests: request shape (endpoint, bearer
//! auth), response decoding, and error mapping against a mock server.

use kadai::canvas::CanvasClient;
use kadai::config::CanvasConfig;
use kadai::error::CanvasError;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> CanvasClient {
    CanvasClient::new(&CanvasConfig {
        api_token: "test-token".to_string(),
        base_url: server.uri(),
    })
}

#[tokio::test]
async fn test_favorite_course_ids_sends_bearer_and_decodes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self/favorites/courses"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 101, "name": "Operating Systems"},
            {"id": 202, "name": "Linear Algebra"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let ids = client(&server).favorite_course_ids().await.unwrap();
    assert_eq!(ids, vec![101, 202]);
}

#[tokio::test]
async fn test_favorite_courses_with_scores_requests_total_scores() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/self/favorites/courses"))
        .and(query_param("include[]", "total_scores"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 101,
                "name": "Operating Systems",
                "course_code": "CSC 139",
                "enrollments": [{"computed_current_score": 88.4, "computed_current_grade": "B+"}]
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let courses = client(&server).favorite_courses_with_scores().await.unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].course_code, "CSC 139");
    assert_eq!(courses[0].enrollments[0].current_score(), 88.4);
}

#[tokio::test]
async fn test_assignments_decodes_mixed_due_dates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/101/assignments"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Lab 4",
                "due_at": "2026-08-08T06:59:59Z",
                "has_submitted_submissions": false,
                "html_url": "https://canvas.instructure.com/courses/101/assignments/1"
            },
            {"id": 2, "name": "Extra credit", "due_at": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let assignments = client(&server).assignments(101).await.unwrap();
    assert_eq!(assignments.len(), 2);
    assert!(assignments[0].due_at.is_some());
    assert!(assignments[1].due_at.is_none());
}

#[tokio::test]
async fn test_non_success_status_maps_to_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/101/assignments"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid access token"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).assignments(101).await.unwrap_err();
    match err {
        CanvasError::Status { status, body, .. } => {
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, "Invalid access token");
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_maps_to_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/courses/101/assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).assignments(101).await.unwrap_err();
    assert!(matches!(err, CanvasError::Decode { .. }));
}
