use crate::{AdminConfig, AppState};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::warn;

/// Decode `Authorization: Basic <base64(user:pass)>`.
pub fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub fn is_authorized(headers: &HeaderMap, admin: &AdminConfig) -> bool {
    basic_credentials(headers).is_some_and(|(user, pass)| {
        constant_time_eq(user.as_bytes(), admin.username.as_bytes())
            & constant_time_eq(pass.as_bytes(), admin.password.as_bytes())
    })
}

pub fn challenge() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"admin\""),
    );
    response
}

pub async fn require_admin(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if is_authorized(request.headers(), &app_state.config.admin) {
        next.run(request).await
    } else {
        if request.headers().contains_key(header::AUTHORIZATION) {
            warn!("Rejected admin credentials for {}", request.uri().path());
        }
        challenge()
    }
}
