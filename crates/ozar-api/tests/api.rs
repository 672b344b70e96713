use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use ozar_api::{AppStateInner, router};
use ozar_app::HealthJob;
use ozar_db::Database;
use ozar_gateway::{Backend, BackendConfig, LocalGateway, Storage};

const ADMIN: &str = "admin@ozar.test";

async fn app(require_confirmation: bool) -> (TempDir, Router) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Storage::new(dir.path().join("storage")).await.unwrap();
    let config = BackendConfig {
        require_email_confirmation: require_confirmation,
        admin_emails: vec![ADMIN.into()],
        public_url: "http://localhost:3000".into(),
    };
    let backend = Arc::new(Backend::new(
        Database::open_in_memory().unwrap(),
        storage,
        "test-secret".into(),
        config,
    ));

    let mut state = AppStateInner::new(backend.clone());
    state.chat_delay = Duration::ZERO;
    state.lab_start_delay = Duration::ZERO;
    state.health = Arc::new(
        HealthJob::new(Arc::new(LocalGateway::service(backend))).with_route_delay(Duration::ZERO),
    );
    (dir, router(Arc::new(state)))
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(res: Response) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sign up and return the access token.
async fn sign_up(app: &Router, email: &str) -> String {
    let res = send(
        app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": email, "password": "hunter22", "first_name": "Ada", "last_name": "Lovelace" }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    body["session"]["access_token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn sign_in_flow_and_protected_routes() {
    let (_dir, app) = app(false).await;
    sign_up(&app, "ada@example.com").await;

    let res = send(&app, get("/auth/session", None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        json_request("POST", "/auth/login", None, json!({ "email": "ada@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        json_request("POST", "/auth/login", None, json!({ "email": "ADA@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let token = body_json(res).await["access_token"].as_str().unwrap().to_string();

    let res = send(&app, get("/profile", Some(&token))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let profile = body_json(res).await;
    assert_eq!(profile["role"], "user");
    assert_eq!(profile["first_name"], "Ada");
}

#[tokio::test]
async fn unconfirmed_sign_in_is_forbidden_until_confirmed() {
    let (_dir, app) = app(true).await;
    let res = send(
        &app,
        json_request(
            "POST",
            "/auth/signup",
            None,
            json!({ "email": "ada@example.com", "password": "hunter22", "first_name": "Ada", "last_name": "Lovelace" }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert!(body_json(res).await["session"].is_null());

    let res = send(
        &app,
        json_request("POST", "/auth/login", None, json!({ "email": "ada@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(res).await["message"], "Email not confirmed");

    let res = send(&app, get("/auth/confirm?token=not-a-token", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guard_redirects_by_identity_and_role() {
    let (_dir, app) = app(false).await;

    let res = send(&app, get("/app/profile", None)).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/login");

    let user = sign_up(&app, "ada@example.com").await;
    let res = send(&app, get("/app/admin-dashboard", Some(&user))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/dashboard");

    let admin = sign_up(&app, ADMIN).await;
    let res = send(&app, get("/app/admin-dashboard", Some(&admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["decision"]["decision"], "render");

    let res = send(&app, get("/app", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let res = send(&app, get("/app/no-such-page", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn contact_form_validates_and_stores_one_row() {
    let (_dir, app) = app(false).await;

    let res = send(
        &app,
        json_request("POST", "/contact", None, json!({ "name": "", "email": "nope", "subject": "Hi", "message": "" })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = body_json(res).await;
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"message"));

    let res = send(
        &app,
        json_request(
            "POST",
            "/contact",
            None,
            json!({ "name": "Ada", "email": "ada@example.com", "subject": "Labs", "message": "Do you cover BGP?" }),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let admin = sign_up(&app, ADMIN).await;
    let res = send(&app, get("/admin/contact", Some(&admin))).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn chat_answers_with_first_matching_rule() {
    let (_dir, app) = app(false).await;

    let res = send(&app, json_request("POST", "/chat", None, json!({ "text": "How much is a plan?" }))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["rule"], 0);
    assert_eq!(body["message"]["sender"], "bot");

    let res = send(&app, json_request("POST", "/chat", None, json!({ "text": "   " }))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn services_fall_back_until_admin_creates_one() {
    let (_dir, app) = app(false).await;

    let body = body_json(send(&app, get("/services", None)).await).await;
    assert_eq!(body["source"], "fallback");
    assert_eq!(body["items"].as_array().unwrap().len(), 6);

    let user = sign_up(&app, "ada@example.com").await;
    let service = json!({
        "title": "Audit",
        "short_description": "Network audit",
        "full_description": "A full network security audit",
        "price": "19.99",
    });
    let res = send(&app, json_request("POST", "/admin/services", Some(&user), service.clone())).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let admin = sign_up(&app, ADMIN).await;
    let res = send(&app, json_request("POST", "/admin/services", Some(&admin), service)).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = body_json(send(&app, get("/services", None)).await).await;
    assert_eq!(body["source"], "live");
    assert_eq!(body["items"][0]["price"], 19.99);
}

fn upload(token: &str, content_type: &str, name: &str, data: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!(
            "/admin/files?title=Lab%20guide&description=Printable%20guide%20for%20lab%20one&name={name}&access=premium"
        ))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(data))
        .unwrap()
}

#[tokio::test]
async fn file_upload_serve_and_confirmed_delete() {
    let (_dir, app) = app(false).await;
    let admin = sign_up(&app, ADMIN).await;

    let res = send(&app, upload(&admin, "application/x-msdownload", "setup.exe", b"MZ")).await;
    assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let res = send(&app, upload(&admin, "text/plain", "guide.txt", b"step one")).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let record = body_json(res).await;
    let url = record["file_path"].as_str().unwrap();
    let path = url.strip_prefix("http://localhost:3000").unwrap();

    let res = send(&app, get(path, None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"step one");

    // Premium download needs a signed-in visitor
    let id = record["id"].as_str().unwrap();
    let res = send(&app, get(&format!("/files/{id}/download"), None)).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = send(&app, get(&format!("/files/{id}/download"), Some(&admin))).await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);

    let delete = |confirm: bool| {
        Request::builder()
            .method("DELETE")
            .uri(format!("/admin/files/{id}?confirm={confirm}"))
            .header(header::AUTHORIZATION, format!("Bearer {admin}"))
            .body(Body::empty())
            .unwrap()
    };
    assert_eq!(send(&app, delete(false)).await.status(), StatusCode::PRECONDITION_REQUIRED);
    assert_eq!(send(&app, delete(true)).await.status(), StatusCode::NO_CONTENT);

    assert_eq!(send(&app, get(path, None)).await.status(), StatusCode::NOT_FOUND);
    let files = body_json(send(&app, get("/files", None)).await).await;
    assert!(files.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_accepts_content_type_with_charset() {
    let (_dir, app) = app(false).await;
    let admin = sign_up(&app, ADMIN).await;

    let res = send(&app, upload(&admin, "text/csv; charset=utf-8", "grades.csv", b"lab,score\n1,90\n")).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let record = body_json(res).await;
    assert!(record["file_path"].as_str().unwrap().ends_with(".csv"));
}

#[tokio::test]
async fn admin_user_list_filters_by_role() {
    let (_dir, app) = app(false).await;
    let admin = sign_up(&app, ADMIN).await;
    sign_up(&app, "ada@example.com").await;

    let all = body_json(send(&app, get("/admin/users", Some(&admin))).await).await;
    assert_eq!(all.as_array().unwrap().len(), 2);

    let users = body_json(send(&app, get("/admin/users?role=user", Some(&admin))).await).await;
    assert_eq!(users.as_array().unwrap().len(), 1);

    let res = send(&app, get("/admin/users?role=owner", Some(&admin))).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_trigger_returns_summary() {
    let (_dir, app) = app(false).await;
    let res = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/functions/daily-health-check")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["databaseConnected"], true);
    assert_eq!(body["routeChecks"].as_array().unwrap().len(), 9);
    assert_eq!(body["buttonChecks"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn dashboard_requires_premium_for_premium_labs() {
    let (_dir, app) = app(false).await;
    let user = sign_up(&app, "ada@example.com").await;

    let body = body_json(send(&app, get("/dashboard", Some(&user))).await).await;
    assert_eq!(body["premium"], false);

    let res = send(&app, json_request("POST", "/dashboard/labs/2/launch", Some(&user), json!({}))).await;
    assert_eq!(body_json(res).await["outcome"], "upgrade_required");
    let res = send(&app, json_request("POST", "/dashboard/labs/1/launch", Some(&user), json!({}))).await;
    assert_eq!(body_json(res).await["outcome"], "launched");

    let res = send(&app, json_request("POST", "/labs/lab1/start", None, json!({}))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let res = send(&app, json_request("POST", "/labs/lab1/start", Some(&user), json!({}))).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = send(&app, json_request("POST", "/labs/lab5/start", Some(&user), json!({}))).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}
