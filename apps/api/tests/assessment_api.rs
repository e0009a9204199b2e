//! End-to-end tests for the assessment endpoints with a canned model.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, post_json, post_raw, CannedModel};
use consultant_api::assessment::interpreter::ParseMode;
use serde_json::json;

const SAAS_QUESTIONS: &str = r#"Sure! Here you go:
{"questions": ["Who is your ideal customer?", "How do you price?", "What is your churn?", "How do you acquire users?"]}
Good luck."#;

const SAAS_EVALUATION: &str = r#"```json
{"scores":[7,8,6,9],"feedback":["ok","good","weak","great"],"final_rating":7.5,"roadmap":["Step 1","Step 2","Step 3"]}
```"#;

// ---------------------------------------------------------------------------
// POST /generate-questions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_questions_returns_four_questions() {
    let model = CannedModel::replying(SAAS_QUESTIONS);
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_json(app, "/generate-questions", json!({ "field": "SaaS" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({ "questions": [
            "Who is your ideal customer?",
            "How do you price?",
            "What is your churn?",
            "How do you acquire users?"
        ]})
    );
    assert_eq!(model.calls(), 1);
    assert!(model.last_prompt().unwrap().contains("SaaS"));
}

#[tokio::test]
async fn generate_questions_rejects_blank_field_without_calling_model() {
    let model = CannedModel::replying(SAAS_QUESTIONS);

    for body in [
        json!({ "field": "" }),
        json!({ "field": "   " }),
        json!({ "field": null }),
        json!({}),
    ] {
        let app = build_test_app(model.clone(), ParseMode::Json);
        let response = post_json(app, "/generate-questions", body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["message"], "Business field is required");
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn generate_questions_reply_without_json_is_a_500() {
    let model = CannedModel::replying("I cannot help with that.");
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_json(app, "/generate-questions", json!({ "field": "Retail" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UPSTREAM_FORMAT_ERROR");
    assert_eq!(json["error"]["message"], "Failed to generate questions");
}

#[tokio::test]
async fn generate_questions_line_mode_keeps_json_wire_shape() {
    let model = CannedModel::replying(
        "1. Who buys?\n2. What do they pay?\n\n3. Where do they shop?\n4. Why you?\n5. Extra",
    );
    let app = build_test_app(model, ParseMode::Lines);

    let response = post_json(app, "/generate-questions", json!({ "field": "Retail" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["questions"].as_array().unwrap().len(), 4);
    assert_eq!(json["questions"][0], "Who buys?");
    assert_eq!(json["questions"][3], "Why you?");
}

#[tokio::test]
async fn generate_questions_provider_failure_is_a_500() {
    let model = CannedModel::failing(503);
    let app = build_test_app(model, ParseMode::Json);

    let response = post_json(app, "/generate-questions", json!({ "field": "SaaS" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UPSTREAM_CALL_ERROR");
    assert_eq!(json["error"]["message"], "Failed to generate questions");
}

#[tokio::test]
async fn malformed_body_is_a_400() {
    let model = CannedModel::replying(SAAS_QUESTIONS);
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_raw(app, "/generate-questions", "{not json".to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(model.calls(), 0);
}

// ---------------------------------------------------------------------------
// POST /evaluate-answers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evaluate_answers_saas_scenario() {
    let model = CannedModel::replying(SAAS_EVALUATION);
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_json(
        app,
        "/evaluate-answers",
        json!({ "field": "SaaS", "answers": ["a", "b", "c", "d"] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["scores"], json!([7.0, 8.0, 6.0, 9.0]));
    assert_eq!(json["feedback"], json!(["ok", "good", "weak", "great"]));
    assert_eq!(json["final_rating"], 7.5);
    assert_eq!(json["roadmap"], json!(["Step 1", "Step 2", "Step 3"]));

    let prompt = model.last_prompt().unwrap();
    assert!(prompt.contains("SaaS"));
    assert!(prompt.contains("Q1: a"));
    assert!(prompt.contains("Q4: d"));
}

#[tokio::test]
async fn evaluate_answers_wrong_count_is_rejected_before_model() {
    let model = CannedModel::replying(SAAS_EVALUATION);

    for answers in [json!(["a", "b", "c"]), json!(["a", "b", "c", "d", "e"]), json!("abcd"), json!(null)] {
        let app = build_test_app(model.clone(), ParseMode::Json);
        let response = post_json(
            app,
            "/evaluate-answers",
            json!({ "field": "SaaS", "answers": answers }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["message"], "Exactly 4 answers are required");
    }
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn evaluate_answers_missing_answers_is_rejected() {
    let model = CannedModel::replying(SAAS_EVALUATION);
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_json(app, "/evaluate-answers", json!({ "field": "SaaS" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn evaluate_answers_blank_field_is_rejected() {
    let model = CannedModel::replying(SAAS_EVALUATION);
    let app = build_test_app(model.clone(), ParseMode::Json);

    let response = post_json(
        app,
        "/evaluate-answers",
        json!({ "field": " ", "answers": ["a", "b", "c", "d"] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["message"], "Business field is required");
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn evaluate_answers_reply_with_wrong_shape_is_a_500() {
    let model = CannedModel::replying(r#"{"scores":[7,8],"feedback":["ok","good"],"final_rating":7.5}"#);
    let app = build_test_app(model, ParseMode::Json);

    let response = post_json(
        app,
        "/evaluate-answers",
        json!({ "field": "SaaS", "answers": ["a", "b", "c", "d"] }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "UPSTREAM_FORMAT_ERROR");
    assert_eq!(json["error"]["message"], "Failed to evaluate answers");
}

// ---------------------------------------------------------------------------
// GET /health and general HTTP behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_test_app(CannedModel::replying(""), ParseMode::Json);
    let response = get(app, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "consultant-api");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = build_test_app(CannedModel::replying(""), ParseMode::Json);
    let request = axum::http::Request::builder()
        .method(axum::http::Method::OPTIONS)
        .uri("/generate-questions")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(CannedModel::replying(""), ParseMode::Json);
    let response = get(app, "/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
