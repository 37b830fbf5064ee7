//! Integration tests for dmat-server API endpoints
//!
//! Each test runs the router against a private in-memory database seeded
//! with plain SQL.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use dmat_common::db::init_memory_database;
use dmat_server::import::ImportSources;
use dmat_server::{build_router, AppState};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::path::PathBuf;
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: Empty database plus router; workbooks point nowhere
async fn setup() -> (SqlitePool, Router) {
    let pool = init_memory_database().await.expect("Should open memory database");
    let sources = ImportSources::new(
        PathBuf::from("/nonexistent/CheckSheetData.xlsx"),
        PathBuf::from("/nonexistent/MM_Data.xlsx"),
    );
    let app = build_router(AppState::new(pool.clone(), sources));
    (pool, app)
}

/// Test helper: One area "Press Shop" (target 4) with two dimensions
async fn seed_area(pool: &SqlitePool) -> (i64, i64, i64) {
    let area_id = sqlx::query(
        "INSERT INTO areas (name, description, desired_level) VALUES ('Press Shop', 'Press Shop Digital Maturity Assessment', 4)",
    )
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid();

    let mut dims = Vec::new();
    for (name, current) in [("Quality", 2), ("Maintenance", 4)] {
        let id = sqlx::query(
            "INSERT INTO dimensions (area_id, name, current_level, desired_level) VALUES (?, ?, ?, 4)",
        )
        .bind(area_id)
        .bind(name)
        .bind(current)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();
        dims.push(id);
    }

    (area_id, dims[0], dims[1])
}

/// Test helper: Global criterion at `level`, returns its id
async fn seed_criterion(pool: &SqlitePool, level: i64, code: &str) -> i64 {
    sqlx::query(
        "INSERT INTO maturity_levels (scope_key, level, name, sub_level, description, import_batch) VALUES ('global', ?, ?, ?, ?, 'seed')",
    )
    .bind(level)
    .bind(code)
    .bind(code)
    .bind(format!("Criterion {}", code))
    .execute(pool)
    .await
    .unwrap()
    .last_insert_rowid()
}

/// Test helper: Extra area with the given dimension names, returns (area, dims)
async fn seed_other_area(pool: &SqlitePool, name: &str, dims: &[&str]) -> (i64, Vec<i64>) {
    let area_id = sqlx::query("INSERT INTO areas (name, desired_level) VALUES (?, 3)")
        .bind(name)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

    let mut ids = Vec::new();
    for dim in dims {
        let id = sqlx::query(
            "INSERT INTO dimensions (area_id, name, current_level, desired_level) VALUES (?, ?, 1, 3)",
        )
        .bind(area_id)
        .bind(dim)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();
        ids.push(id);
    }

    (area_id, ids)
}

async fn current_level(pool: &SqlitePool, dimension_id: i64) -> i64 {
    sqlx::query_scalar("SELECT current_level FROM dimensions WHERE id = ?")
        .bind(dimension_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn select_all(app: &Router, assessment_id: i64, criteria: &[i64]) {
    let batch: Vec<Value> = criteria
        .iter()
        .map(|id| json!({ "assessment_id": assessment_id, "maturity_level_id": id, "is_selected": true }))
        .collect();
    let (status, _) = send(app, json_request("POST", "/api/mm/checksheet-selections", Value::Array(batch))).await;
    assert_eq!(status, StatusCode::OK);
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, extract_json(response.into_body()).await)
}

#[tokio::test]
async fn test_health_and_status() {
    let (_pool, app) = setup().await;

    let (status, body) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["module"], "dmat-server");

    let (status, body) = send(&app, test_request("GET", "/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert!(body["endpoints"].is_array());
}

#[tokio::test]
async fn test_unknown_area_is_404() {
    let (_pool, app) = setup().await;

    let (status, body) = send(&app, test_request("GET", "/api/mm/areas/99")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Area not found");
}

#[tokio::test]
async fn test_areas_include_dimensions() {
    let (pool, app) = setup().await;
    let (area_id, _, _) = seed_area(&pool).await;

    let (status, body) = send(&app, test_request("GET", "/api/mm/areas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], area_id);
    assert_eq!(body[0]["dimensions"].as_array().unwrap().len(), 2);

    let (_, body) = send(&app, test_request("GET", "/api/mm/dimensions")).await;
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(body[0]["area_id"], area_id);
}

#[tokio::test]
async fn test_create_assessment_without_areas() {
    let (_pool, app) = setup().await;

    let request = json_request("POST", "/api/mm/assessments", json!({ "plant_name": "Nashik" }));
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "No areas found. Please load data first.");
}

#[tokio::test]
async fn test_update_dimension_validates_levels() {
    let (pool, app) = setup().await;
    let (_, quality, _) = seed_area(&pool).await;
    let uri = format!("/api/mm/dimensions/{}", quality);

    let (status, body) = send(&app, json_request("PUT", &uri, json!({ "current_level": 7 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let request = json_request("PUT", &uri, json!({ "current_level": 3, "desired_level": 5 }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["dimension"]["current_level"], 3);
    assert_eq!(body["dimension"]["desired_level"], 5);

    let request = json_request("PUT", "/api/mm/dimensions/999", json!({ "current_level": 3 }));
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_simulate_update_stays_in_range() {
    let (pool, app) = setup().await;
    let (_, _, maintenance) = seed_area(&pool).await;

    let uri = format!("/api/mm/simulate-update/{}", maintenance);
    let (status, body) = send(&app, test_request("POST", &uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "updated");
    assert_eq!(body["old_level"], 4);
    let new_level = body["new_level"].as_i64().unwrap();
    assert!((3..=5).contains(&new_level));
}

#[tokio::test]
async fn test_selection_and_scoring_flow() {
    let (pool, app) = setup().await;
    let (area_id, quality, maintenance) = seed_area(&pool).await;
    let mut criteria = Vec::new();
    for (level, code) in [(1, "1.1a"), (2, "2.1a"), (4, "4.1a"), (5, "5.1a")] {
        criteria.push(seed_criterion(&pool, level, code).await);
    }

    let request = json_request(
        "POST",
        "/api/mm/assessments",
        json!({ "plant_name": "Nashik", "assessor_name": "QA" }),
    );
    let (status, assessment) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(assessment["area_id"], area_id);
    let assessment_id = assessment["id"].as_i64().unwrap();

    // Nothing selected yet
    let score_uri = format!("/api/mm/calculate-dimension-scores?assessment_id={}", assessment_id);
    let (status, body) = send(&app, test_request("POST", &score_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "info");
    assert_eq!(body["calculated_level"], 0);

    // Levels 1, 2 and 4 ticked; level 5 explicitly unticked
    let selections = json!([
        { "assessment_id": assessment_id, "maturity_level_id": criteria[0], "is_selected": true },
        { "assessment_id": assessment_id, "maturity_level_id": criteria[1], "is_selected": true },
        { "assessment_id": assessment_id, "maturity_level_id": criteria[2], "is_selected": true, "evidence": "MES screenshots" },
        { "assessment_id": assessment_id, "maturity_level_id": criteria[3], "is_selected": false },
    ]);
    let (status, body) = send(&app, json_request("POST", "/api/mm/checksheet-selections", selections)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Saved 4 selections");
    assert_eq!(body["count"], 4);

    let uri = format!("/api/mm/checksheet-selections/{}", assessment_id);
    let (_, body) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(body.as_array().unwrap().len(), 4);

    let (status, body) = send(&app, test_request("POST", &score_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["selected_count"], 3);
    assert_eq!(body["calculated_level"], 4);
    assert_eq!(body["dimensions_updated"], 2);

    for id in [quality, maintenance] {
        let level: i64 = sqlx::query_scalar("SELECT current_level FROM dimensions WHERE id = ?")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(level, 4);
    }

    let uri = format!("/api/mm/assessments/{}", assessment_id);
    let (status, body) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plant_name"], "Nashik");
    assert_eq!(body["dimension_results"].as_array().unwrap().len(), 2);

    // Same selections again change nothing
    let (_, body) = send(&app, test_request("POST", &score_uri)).await;
    assert_eq!(body["dimensions_updated"], 0);
}

#[tokio::test]
async fn test_selections_without_assessment_are_rejected() {
    let (pool, app) = setup().await;
    seed_area(&pool).await;
    let criterion = seed_criterion(&pool, 1, "1.1a").await;

    let request = json_request("POST", "/api/mm/assessments", json!({}));
    let (_, assessment) = send(&app, request).await;
    let assessment_id = assessment["id"].as_i64().unwrap();

    let selections = json!([
        { "assessment_id": assessment_id, "maturity_level_id": criterion, "is_selected": true },
        { "maturity_level_id": criterion, "is_selected": true },
    ]);
    let (status, _) = send(&app, json_request("POST", "/api/mm/checksheet-selections", selections)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // First entry rolled back with the batch
    let (_, body) = send(&app, test_request("GET", "/api/mm/checksheet-selections")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_assessment_update() {
    let (pool, app) = setup().await;
    seed_area(&pool).await;

    let request = json_request(
        "POST",
        "/api/mm/assessments",
        json!({ "plant_name": "Nashik", "notes": "first pass" }),
    );
    let (_, assessment) = send(&app, request).await;
    let uri = format!("/api/mm/assessments/{}", assessment["id"]);

    let request = json_request("PUT", &uri, json!({ "level2_notes": "OEE dashboards", "checked_count": 7 }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plant_name"], "Nashik");
    assert_eq!(body["notes"], "first pass");
    assert_eq!(body["level2_notes"], "OEE dashboards");
    assert_eq!(body["checked_count"], 7);

    let (status, _) = send(&app, json_request("PUT", "/api/mm/assessments/999", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scores_for_unknown_assessment() {
    let (_pool, app) = setup().await;

    let request = test_request("POST", "/api/mm/calculate-dimension-scores?assessment_id=42");
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_reports_summary() {
    let (pool, app) = setup().await;
    seed_area(&pool).await;

    let (status, body) = send(&app, test_request("GET", "/api/mm/reports/summary")).await;
    assert_eq!(status, StatusCode::OK);

    let area = &body[0];
    assert_eq!(area["area_name"], "Press Shop");
    assert_eq!(area["total_dimensions"], 2);
    assert_eq!(area["avg_current_level"], 3.0);
    assert_eq!(area["on_track_count"], 1);
    assert_eq!(area["completed_count"], 1);
    assert_eq!(area["needs_attention"], 1);
}

#[tokio::test]
async fn test_generate_report_is_attachment() {
    let (pool, app) = setup().await;
    seed_area(&pool).await;

    let response = app
        .clone()
        .oneshot(test_request("POST", "/api/mm/generate-report"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=Assessment_Report_"));
    assert!(disposition.ends_with(".html"));

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Press Shop"));
    assert!(html.contains("Below Target"));
}

#[tokio::test]
async fn test_rating_scales_for_unknown_dimension() {
    let (_pool, app) = setup().await;

    let (status, body) = send(&app, test_request("GET", "/api/mm/rating-scales/Quality")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Rating scales not found for this dimension");
}

#[tokio::test]
async fn test_refresh_with_missing_workbook() {
    let (_pool, app) = setup().await;

    let (status, body) = send(&app, test_request("POST", "/api/mm/refresh-reports-data")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "WORKBOOK_NOT_FOUND");

    let (status, body) = send(&app, test_request("POST", "/api/mm/refresh-all-data")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "partial_success");
    assert_eq!(body["errors"].as_array().unwrap().len(), 4);
    assert_eq!(body["results"]["reports"]["status"], "error");
}

#[tokio::test]
async fn test_selections_with_unknown_references_are_rejected() {
    let (pool, app) = setup().await;
    seed_area(&pool).await;
    let criterion = seed_criterion(&pool, 1, "1.1a").await;

    let (_, assessment) = send(&app, json_request("POST", "/api/mm/assessments", json!({}))).await;
    let assessment_id = assessment["id"].as_i64().unwrap();

    let selections = json!([
        { "assessment_id": assessment_id, "maturity_level_id": criterion, "is_selected": true },
        { "assessment_id": assessment_id, "maturity_level_id": 999, "is_selected": true },
    ]);
    let (status, body) = send(&app, json_request("POST", "/api/mm/checksheet-selections", selections)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let selections = json!([
        { "assessment_id": 4242, "maturity_level_id": criterion, "is_selected": true },
    ]);
    let (status, _) = send(&app, json_request("POST", "/api/mm/checksheet-selections", selections)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, test_request("GET", "/api/mm/checksheet-selections")).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_scoring_targets_assessment_dimension_only() {
    let (pool, app) = setup().await;
    let (_, quality, maintenance) = seed_area(&pool).await;
    let criteria = [
        seed_criterion(&pool, 1, "1.1a").await,
        seed_criterion(&pool, 3, "3.1a").await,
    ];

    let request = json_request("POST", "/api/mm/assessments", json!({ "dimension_id": quality }));
    let (status, assessment) = send(&app, request).await;
    assert_eq!(status, StatusCode::CREATED);
    let assessment_id = assessment["id"].as_i64().unwrap();

    select_all(&app, assessment_id, &criteria).await;

    let uri = format!("/api/mm/calculate-dimension-scores?assessment_id={}", assessment_id);
    let (status, body) = send(&app, test_request("POST", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculated_level"], 3);
    assert_eq!(body["dimensions_updated"], 1);

    assert_eq!(current_level(&pool, quality).await, 3);
    assert_eq!(current_level(&pool, maintenance).await, 4);
}

#[tokio::test]
async fn test_scoring_empty_area_updates_every_dimension() {
    let (pool, app) = setup().await;
    let (_, quality, maintenance) = seed_area(&pool).await;
    let (empty_area, _) = seed_other_area(&pool, "Paint Shop", &[]).await;
    let criterion = seed_criterion(&pool, 2, "2.1a").await;

    let assessment_id = sqlx::query("INSERT INTO assessments (area_id) VALUES (?)")
        .bind(empty_area)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

    select_all(&app, assessment_id, &[criterion]).await;

    let uri = format!("/api/mm/calculate-dimension-scores?assessment_id={}", assessment_id);
    let (status, body) = send(&app, test_request("POST", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calculated_level"], 2);
    assert_eq!(body["dimensions_updated"], 2);

    assert_eq!(current_level(&pool, quality).await, 2);
    assert_eq!(current_level(&pool, maintenance).await, 2);
}

#[tokio::test]
async fn test_changing_dimension_moves_assessment_area() {
    let (pool, app) = setup().await;
    let (area_id, quality, _) = seed_area(&pool).await;
    let (weld_area, weld_dims) = seed_other_area(&pool, "Weld Shop", &["Robotics"]).await;

    let request = json_request("POST", "/api/mm/assessments", json!({ "dimension_id": quality }));
    let (_, assessment) = send(&app, request).await;
    assert_eq!(assessment["area_id"], area_id);
    let uri = format!("/api/mm/assessments/{}", assessment["id"]);

    let request = json_request("PUT", &uri, json!({ "dimension_id": weld_dims[0] }));
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dimension_id"], weld_dims[0]);
    assert_eq!(body["area_id"], weld_area);

    // Updates without a dimension leave the area alone
    let (_, body) = send(&app, json_request("PUT", &uri, json!({ "notes": "rechecked" }))).await;
    assert_eq!(body["area_id"], weld_area);
}

#[tokio::test]
async fn test_maturity_levels_carry_kind() {
    let (pool, app) = setup().await;
    seed_criterion(&pool, 1, "1.1").await;
    seed_criterion(&pool, 1, "1.1a").await;

    let (status, body) = send(&app, test_request("GET", "/api/mm/maturity-levels")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["sub_level"], "1.1");
    assert_eq!(body[0]["kind"], "category");
    assert_eq!(body[1]["sub_level"], "1.1a");
    assert_eq!(body[1]["kind"], "leaf");
}
