use std::{net::SocketAddr, sync::Arc};

use admin_log::{
    admin_log::{AdminLogger, LogKind, MemorySink},
    config::{AdminLogConfig, AppConfig, ArgumentErrorPolicy},
    create_app, AppState,
};
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, StatusCode},
    routing::post,
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app(config: AppConfig) -> (Router, MemorySink) {
    let sink = MemorySink::new();
    let logger = AdminLogger::new(config.admin_log.clone(), Arc::new(sink.clone()));
    (create_app(AppState::new(config, logger)), sink)
}

fn admin_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", "42")
        .header("x-user-email", "a@b.com")
        .header("x-user-role", "ADMIN")
        .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 51000))));

    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint_is_not_logged() {
    let (app, sink) = test_app(AppConfig::default());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "admin-log");
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_change_role_logs_request_and_response() {
    let (app, sink) = test_app(AppConfig::default());

    let response = app
        .oneshot(admin_request(
            Method::PATCH,
            "/admin/users/7/role",
            Some(json!({"role": "admin"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user_id"], 7);
    assert_eq!(body["role"], "ADMIN");

    let entries = sink.entries();
    let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![LogKind::Request, LogKind::RequestBody, LogKind::ResponseBody]
    );

    let request = &entries[0].text;
    assert!(request.contains("URL: /admin/users/7/role"));
    assert!(request.contains("HTTP Method: PATCH"));
    assert!(request.contains("Client IP: 127.0.0.1"));
    assert!(request.contains("UserId: 42"));
    assert!(request.contains("Email: a@b.com"));
    assert!(request.contains("UserRole: ADMIN"));

    assert_eq!(entries[1].text, "7\n{\"role\":\"admin\"}\n");

    // The logged response is what the caller received
    let logged: Value = serde_json::from_str(&entries[2].text).unwrap();
    assert_eq!(logged, body);
}

#[tokio::test]
async fn test_handler_rejection_passes_through() {
    let (app, sink) = test_app(AppConfig::default());

    let response = app
        .oneshot(admin_request(
            Method::PATCH,
            "/admin/users/7/role",
            Some(json!({"role": "superuser"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(sink.of_kind(LogKind::Request).len(), 1);
    assert!(sink.of_kind(LogKind::ResponseBody).is_empty());
}

#[tokio::test]
async fn test_ambient_context_route_logs_caller() {
    let (app, sink) = test_app(AppConfig::default());

    let response = app
        .oneshot(admin_request(Method::DELETE, "/admin/comments/12", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["comment_id"], 12);

    let request = &sink.of_kind(LogKind::Request)[0];
    assert!(request.text.contains("URL: /admin/comments/12"));
    assert!(request.text.contains("HTTP Method: DELETE"));
    assert!(request.text.contains("UserId: 42"));
    assert_eq!(sink.of_kind(LogKind::RequestBody)[0].text, "12\n");
}

#[tokio::test]
async fn test_anonymous_caller_is_logged_as_unknown() {
    let (app, sink) = test_app(AppConfig::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/users?page=3")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["page"], 3);

    let entries = sink.entries();
    assert!(entries.iter().all(|e| e.request_id == "trace-me"));

    let request = &entries[0].text;
    assert!(request.contains("URL: /admin/users,"));
    assert!(request.contains("Client IP: unknown"));
    assert!(request.contains("UserId: unknown"));
    assert!(request.contains("Email: unknown"));
    assert!(request.contains("UserRole: unknown"));
    assert_eq!(entries[1].text, "{\"page\":3}\n");
}

#[tokio::test]
async fn test_disabled_logging_leaves_routes_working() {
    let mut config = AppConfig::default();
    config.admin_log.enabled = false;
    config.admin_log.argument_errors = ArgumentErrorPolicy::Propagate;
    let (app, sink) = test_app(config);

    let response = app
        .oneshot(admin_request(Method::DELETE, "/admin/comments/3", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_unbound_context_returns_logging_error() {
    let sink = MemorySink::new();
    let logger = AdminLogger::new(AdminLogConfig::default(), Arc::new(sink.clone()));

    // No request_context_middleware in front of this route
    let app = Router::new().route(
        "/admin/purge",
        post(move || {
            let logger = logger.clone();
            async move {
                logger
                    .around_current((), |()| async { Ok::<_, StatusCode>("purged".to_string()) })
                    .await
            }
        }),
    );

    let response = app
        .oneshot(admin_request(Method::POST, "/admin/purge", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Request logging failed");
    assert_eq!(
        body["message"],
        "no request context is bound to the current task"
    );
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_host_header_is_part_of_logged_url() {
    let (app, sink) = test_app(AppConfig::default());

    let mut request = admin_request(Method::DELETE, "/admin/comments/5?soft=true", None);
    request
        .headers_mut()
        .insert("host", "admin.internal:3000".parse().unwrap());

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_line = &sink.of_kind(LogKind::Request)[0].text;
    assert!(request_line.starts_with("Request URL: http://admin.internal:3000/admin/comments/5,"));
}
