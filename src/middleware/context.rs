use axum::{extract::Request, middleware::Next, response::Response};

use crate::admin_log::{RequestContext, RequestId};

/// Binds the request's [`RequestContext`] to the task for as long as the
/// inner service runs. Must sit inside (after) `identity_middleware`.
///
/// The request id is stored in the extensions first so a `RequestContext`
/// extracted later by the handler carries the same id.
pub async fn request_context_middleware(mut request: Request, next: Next) -> Response {
    if request.extensions().get::<RequestId>().is_none() {
        let request_id = RequestId::from_headers(request.headers());
        request.extensions_mut().insert(request_id);
    }

    let ctx = RequestContext::from_http(
        request.method(),
        request.uri(),
        request.headers(),
        request.extensions(),
    );
    ctx.scope(next.run(request)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    async fn echo_request_id() -> Result<String, StatusCode> {
        RequestContext::current()
            .map(|ctx| ctx.request_id().to_string())
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    }

    #[tokio::test]
    async fn handler_sees_bound_context() {
        let app = Router::new()
            .route("/", get(echo_request_id))
            .layer(middleware::from_fn(request_context_middleware));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header("x-request-id", "abc-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"abc-1");
    }

    async fn compare_request_ids(extracted: RequestContext) -> Result<String, StatusCode> {
        let bound = RequestContext::current().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        if bound.request_id() != extracted.request_id() {
            return Err(StatusCode::CONFLICT);
        }
        Ok(bound.request_id().to_string())
    }

    #[tokio::test]
    async fn generated_request_id_is_shared_with_extractor() {
        let app = Router::new()
            .route("/", get(compare_request_ids))
            .layer(middleware::from_fn(request_context_middleware));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(uuid::Uuid::parse_str(std::str::from_utf8(&body).unwrap()).is_ok());
    }

    #[tokio::test]
    async fn unbound_handler_sees_nothing() {
        let app = Router::new().route("/", get(echo_request_id));

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
