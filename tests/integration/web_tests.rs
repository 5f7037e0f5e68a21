use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

const BOUNDARY: &str = "X-RECDUPE-BOUNDARY";

/// Build a multipart/form-data body with one file part plus text fields.
fn multipart_form(file_name: &str, file_content: &str, fields: &[(&str, &str)]) -> String {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {file_content}\r\n"
    );
    for (name, value) in fields {
        body.push_str(&format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
             {value}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    body
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

async fn post_api(payload: serde_json::Value) -> (StatusCode, serde_json::Value) {
    let response = recdupe::web::router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/detect")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    (status, body)
}

#[tokio::test]
async fn test_index_page_serves_upload_form() {
    let response = recdupe::web::router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("name=\"file\""));
    assert!(html.contains("name=\"match_fields\""));
    assert!(html.contains("name=\"master_field\""));
    assert!(html.contains("name=\"strategy\""));
    assert!(!html.contains("class=\"error\""));
}

#[tokio::test]
async fn test_api_detect_finds_duplicates() {
    let (status, body) = post_api(serde_json::json!({
        "records": [
            {"email": "a@x.io", "score": 1},
            {"email": "b@x.io", "score": 5},
            {"email": "a@x.io", "score": 9}
        ],
        "match_fields": ["email"],
        "master_field": "score"
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    let groups = body["duplicates"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["master"]["score"], serde_json::json!(9.0));
    assert_eq!(body["summary"]["exit_code_name"], serde_json::json!("DQ000"));
}

#[tokio::test]
async fn test_api_detect_reports_no_duplicates() {
    let (status, body) = post_api(serde_json::json!({
        "records": [
            {"email": "a@x.io", "score": 1},
            {"email": "b@x.io", "score": 5}
        ],
        "match_fields": ["email"],
        "master_field": "score"
    }))
    .await;

    // Still HTTP 200; the embedded exit code tells the two apart.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duplicates"], serde_json::json!([]));
    assert_eq!(body["summary"]["exit_code"], serde_json::json!(2));
    assert_eq!(body["summary"]["exit_code_name"], serde_json::json!("DQ002"));
}

#[tokio::test]
async fn test_api_detect_honors_lowest_strategy() {
    let (status, body) = post_api(serde_json::json!({
        "records": [
            {"email": "a@x.io", "score": 4},
            {"email": "a@x.io", "score": 2}
        ],
        "match_fields": ["email"],
        "master_field": "score",
        "strategy": "lowest"
    }))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["duplicates"][0]["master"]["score"], serde_json::json!(2.0));
}

#[tokio::test]
async fn test_api_detect_rejects_bad_strategy() {
    let (status, body) = post_api(serde_json::json!({
        "records": [{"email": "a@x.io", "score": 1}],
        "match_fields": ["email"],
        "master_field": "score",
        "strategy": "midmost"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("unknown strategy 'midmost'"));
}

#[tokio::test]
async fn test_api_detect_rejects_nested_values() {
    let (status, body) = post_api(serde_json::json!({
        "records": [{"email": "a@x.io", "tags": ["vip"], "score": 1}],
        "match_fields": ["email"],
        "master_field": "score"
    }))
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("nested array"));
}

#[tokio::test]
async fn test_api_detect_rejects_incomparable_masters() {
    let (status, body) = post_api(serde_json::json!({
        "records": [
            {"email": "a@x.io", "score": 1},
            {"email": "a@x.io", "score": "one"}
        ],
        "match_fields": ["email"],
        "master_field": "score"
    }))
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("not comparable"));
}

#[tokio::test]
async fn test_upload_page_shows_results() {
    let body = multipart_form(
        "accounts.csv",
        "email,score\na@x.io,1\nb@x.io,5\na@x.io,9",
        &[
            ("match_fields", "email"),
            ("master_field", "score"),
            ("strategy", "highest"),
        ],
    );
    let response = recdupe::web::router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Results for accounts.csv"));
    assert!(html.contains("{email: a@x.io, score: 9}"));
    assert!(html.contains("1 duplicate group(s)"));
}

#[tokio::test]
async fn test_upload_page_reports_bad_file_inline() {
    let body = multipart_form(
        "notes.txt",
        "not a table",
        &[("match_fields", "email"), ("master_field", "score")],
    );
    let response = recdupe::web::router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    // Errors render back into the page rather than a bare error status.
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("class=\"error\""));
    assert!(html.contains(".txt"));
}
