use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::web::Data;
use actix_web::{App, test};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use uuid::Uuid;

use hrm_leave::auth::jwt::{Claims, TokenType};
use hrm_leave::config::Config;
use hrm_leave::leave::LeaveBackend;
use hrm_leave::leave::memory::MemoryBackend;
use hrm_leave::model::entitlement::EntitlementRecord;
use hrm_leave::model::leave_category::LeaveCategory;
use hrm_leave::routes::{self, Limiters};
use hrm_leave::utils::draft_store::DraftStore;

const SECRET: &str = "test-secret";

fn config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".into()),
        "DATABASE_URL" => Some("mysql://unused".into()),
        "JWT_SECRET" => Some(SECRET.into()),
        _ => None,
    })
    .unwrap()
}

fn backend() -> Arc<MemoryBackend> {
    Arc::new(
        MemoryBackend::new()
            .with_categories(vec![
                LeaveCategory {
                    id: 1,
                    name: "Casual Leave".into(),
                    without_pay: false,
                },
                LeaveCategory {
                    id: 2,
                    name: "Leave Without Pay".into(),
                    without_pay: true,
                },
            ])
            .with_entitlements(vec![EntitlementRecord {
                category_id: 1,
                allocated: 10.0,
                used: 8.0,
            }]),
    )
}

fn token(employee_id: u64) -> String {
    let claims = Claims {
        user_id: employee_id + 500,
        sub: format!("user{employee_id}"),
        role: 3,
        exp: 4_102_444_800, // 2100-01-01
        jti: "jti".into(),
        token_type: TokenType::Access,
        employee_id: Some(employee_id),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn app(
    backend: Arc<MemoryBackend>,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    app_with_store(backend, DraftStore::new(100, Duration::from_secs(60))).await
}

async fn app_with_store(
    backend: Arc<MemoryBackend>,
    store: DraftStore,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    let config = config();
    let limiters = Limiters::from_config(&config).unwrap();
    let backend: Arc<dyn LeaveBackend> = backend;

    test::init_service(
        App::new()
            .app_data(Data::new(config.clone()))
            .app_data(Data::from(backend))
            .app_data(Data::new(store))
            .configure(|cfg| routes::configure(cfg, &config, &limiters)),
    )
    .await
}

fn request(method: &str, uri: &str, employee_id: Option<u64>) -> test::TestRequest {
    let req = match method {
        "GET" => test::TestRequest::get(),
        "PATCH" => test::TestRequest::patch(),
        "DELETE" => test::TestRequest::delete(),
        "PUT" => test::TestRequest::put(),
        _ => test::TestRequest::post(),
    }
    .uri(uri)
    .peer_addr("127.0.0.1:40000".parse().unwrap());

    match employee_id {
        Some(id) => req.insert_header(("Authorization", format!("Bearer {}", token(id)))),
        None => req,
    }
}

async fn open_draft(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    employee_id: u64,
) -> String {
    let resp = test::call_service(app, request("POST", "/api/leave/drafts", Some(employee_id)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    body["id"].as_str().unwrap().to_string()
}

async fn edit(
    app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
    draft: &str,
    edit: Value,
) -> (StatusCode, Value) {
    let resp = test::call_service(
        app,
        request("PATCH", &format!("/api/leave/drafts/{draft}"), Some(1000))
            .set_json(edit)
            .to_request(),
    )
    .await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn draft_lifecycle_through_submit() {
    let backend = backend();
    let app = app(backend.clone()).await;
    let draft = open_draft(&app, 1000).await;

    let (status, view) = edit(&app, &draft, json!({"field": "category", "value": 1})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["balance"]["current_balance"], 2.0);

    edit(&app, &draft, json!({"field": "from_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "approver", "value": 7})).await;
    let (_, view) = edit(&app, &draft, json!({"field": "to_date", "value": "2024-03-13"})).await;
    assert_eq!(view["balance"]["requested_days"], 3.0);
    assert_eq!(view["balance"]["remaining_balance"], -1.0);
    assert_eq!(view["can_submit"], false);

    let submit_uri = format!("/api/leave/drafts/{draft}/submit");
    let resp = test::call_service(&app, request("POST", &submit_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "insufficient_balance");
    assert!(backend.submitted().is_empty());

    let (_, view) = edit(&app, &draft, json!({"field": "half_day", "value": true})).await;
    assert_eq!(view["balance"]["requested_days"], 0.5);
    assert_eq!(view["can_submit"], true);

    let resp = test::call_service(&app, request("POST", &submit_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "pending");

    let submitted = backend.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].employee_id, 1000);
    assert_eq!(submitted[0].from_date, "2024-03-11");
    assert_eq!(submitted[0].is_half_day, 1);

    // submitted drafts are discarded
    let resp = test::call_service(
        &app,
        request("GET", &format!("/api/leave/drafts/{draft}"), Some(1000)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn failed_submit_keeps_the_draft() {
    let backend = backend();
    let app = app(backend.clone()).await;
    let draft = open_draft(&app, 1000).await;

    edit(&app, &draft, json!({"field": "category", "value": 2})).await;
    edit(&app, &draft, json!({"field": "from_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "to_date", "value": "2024-03-20"})).await;
    edit(&app, &draft, json!({"field": "approver", "value": 7})).await;

    backend.fail_submits(true);
    let submit_uri = format!("/api/leave/drafts/{draft}/submit");
    let resp = test::call_service(&app, request("POST", &submit_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let resp = test::call_service(
        &app,
        request("GET", &format!("/api/leave/drafts/{draft}"), Some(1000)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["state"]["state"], "failed");

    backend.fail_submits(false);
    let resp = test::call_service(&app, request("POST", &submit_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn picking_a_value_closes_its_dropdown() {
    let app = app(backend()).await;
    let draft = open_draft(&app, 1000).await;

    let resp = test::call_service(
        &app,
        request("PUT", &format!("/api/leave/drafts/{draft}/dropdown"), Some(1000))
            .set_json(json!({"dropdown": "category"}))
            .to_request(),
    )
    .await;
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["active_dropdown"], "category");

    let (_, view) = edit(&app, &draft, json!({"field": "category", "value": 1})).await;
    assert_eq!(view["active_dropdown"], "none");
}

#[actix_web::test]
async fn unknown_category_is_a_bad_request() {
    let app = app(backend()).await;
    let draft = open_draft(&app, 1000).await;

    let (status, _) = edit(&app, &draft, json!({"field": "category", "value": 99})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn drafts_require_a_token_and_stay_with_their_owner() {
    let app = app(backend()).await;

    let resp = test::call_service(&app, request("POST", "/api/leave/drafts", None).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let draft = open_draft(&app, 1000).await;
    let resp = test::call_service(
        &app,
        request("GET", &format!("/api/leave/drafts/{draft}"), Some(2000)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        request("DELETE", &format!("/api/leave/drafts/{draft}"), Some(1000)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn balances_come_from_the_backend() {
    let app = app(backend()).await;

    let resp = test::call_service(&app, request("GET", "/api/leave/balances", Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body[0]["category_id"], 1);
}

#[actix_web::test]
async fn second_submit_while_in_flight_conflicts() {
    let backend = backend();
    let store = DraftStore::new(100, Duration::from_secs(60));
    let app = app_with_store(backend.clone(), store.clone()).await;
    let draft = open_draft(&app, 1000).await;

    edit(&app, &draft, json!({"field": "category", "value": 1})).await;
    edit(&app, &draft, json!({"field": "from_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "to_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "approver", "value": 7})).await;

    // first submit is still waiting on the backend
    let id = Uuid::parse_str(&draft).unwrap();
    let session = store.get(1000, &id).await.unwrap();
    session.lock().unwrap().gate.begin_submit().unwrap();

    let submit_uri = format!("/api/leave/drafts/{draft}/submit");
    let resp = test::call_service(&app, request("POST", &submit_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let (status, _) = edit(&app, &draft, json!({"field": "reason", "value": "changed"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(backend.submitted().is_empty());

    let resp = test::call_service(
        &app,
        request("GET", &format!("/api/leave/drafts/{draft}"), Some(1000)).to_request(),
    )
    .await;
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["state"]["state"], "submitting");
    assert_eq!(view["can_submit"], false);
}

#[actix_web::test]
async fn refresh_during_outage_marks_draft_stale() {
    let backend = backend();
    let app = app(backend.clone()).await;
    let draft = open_draft(&app, 1000).await;
    edit(&app, &draft, json!({"field": "category", "value": 1})).await;

    backend.fail_fetches(true);
    let resp = test::call_service(
        &app,
        request("POST", &format!("/api/leave/drafts/{draft}/refresh"), Some(1000)).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["stale"], true);
    assert!(view["stale_reason"].as_str().unwrap().contains("unavailable"));
    // last good figures are kept
    assert_eq!(view["balance"]["current_balance"], 2.0);
    assert_eq!(view["categories"].as_array().unwrap().len(), 2);

    backend.fail_fetches(false);
    let resp = test::call_service(
        &app,
        request("POST", &format!("/api/leave/drafts/{draft}/refresh"), Some(1000)).to_request(),
    )
    .await;
    let view: Value = test::read_body_json(resp).await;
    assert_eq!(view["stale"], false);
    assert!(view["stale_reason"].is_null());
}

#[actix_web::test]
async fn validate_reports_first_failing_rule() {
    let app = app(backend()).await;
    let draft = open_draft(&app, 1000).await;
    edit(&app, &draft, json!({"field": "category", "value": 1})).await;

    let validate_uri = format!("/api/leave/drafts/{draft}/validate");
    let resp = test::call_service(&app, request("POST", &validate_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "missing_from_date");
    assert_eq!(body["message"], "Please select a from date");

    edit(&app, &draft, json!({"field": "from_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "to_date", "value": "2024-03-11"})).await;
    edit(&app, &draft, json!({"field": "approver", "value": 7})).await;

    let resp = test::call_service(&app, request("POST", &validate_uri, Some(1000)).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["requested_days"], 1.0);
}
