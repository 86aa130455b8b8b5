// Caller attributes arrive as headers set by the authenticating proxy in front
// of this service. Nothing here verifies them.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::admin_log::{context, RequestAttributes};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

pub async fn identity_middleware(mut request: Request, next: Next) -> Response {
    let attributes = attributes_from_headers(request.headers());
    if !attributes.is_empty() {
        request.extensions_mut().insert(attributes);
    }
    next.run(request).await
}

pub fn attributes_from_headers(headers: &HeaderMap) -> RequestAttributes {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let mut attributes = RequestAttributes::new();

    if let Some(raw) = header(USER_ID_HEADER) {
        match raw.trim().parse::<i64>() {
            Ok(user_id) => attributes.insert(context::USER_ID, user_id),
            Err(_) => warn!(value = raw, "Ignoring non-numeric {} header", USER_ID_HEADER),
        }
    }
    if let Some(email) = header(EMAIL_HEADER) {
        attributes.insert(context::EMAIL, email);
    }
    if let Some(role) = header(USER_ROLE_HEADER) {
        attributes.insert(context::USER_ROLE, role);
    }

    attributes
}
