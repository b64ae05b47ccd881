use axum::{
    Form, Json,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::convert::Infallible;
use std::net::SocketAddr;

pub fn is_ajax(headers: &HeaderMap) -> bool {
    headers
        .get("x-requested-with")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|h| h.to_str().ok())
}

pub fn user_agent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, header::USER_AGENT).map(str::to_string)
}

pub fn referer(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, header::REFERER)
}

/// The socket peer when the server was started with connect info.
pub struct PeerAddr(pub Option<SocketAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|info| info.0),
        ))
    }
}

/// First `X-Forwarded-For` hop when the proxy is trusted, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded: bool) -> String {
    let forwarded = trust_forwarded
        .then(|| headers.get("x-forwarded-for"))
        .flatten()
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);
    forwarded
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Scheme and host for absolute links: the configured base URL, else the Host header.
pub fn site_origin(base_url: Option<&str>, headers: &HeaderMap) -> String {
    if let Some(base) = base_url.filter(|b| !b.is_empty()) {
        return base.trim_end_matches('/').to_string();
    }
    let host = header_str(headers, header::HOST).unwrap_or("localhost");
    format!("http://{}", host)
}

pub fn absolute_url(base_url: Option<&str>, headers: &HeaderMap, path_and_query: &str) -> String {
    format!("{}{}", site_origin(base_url, headers), path_and_query)
}

/// A body accepted as JSON when the content type says so, else as a urlencoded form.
pub struct JsonOrForm<T>(pub T);

impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + 'static,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

/// A status line carried across a redirect as `?notice=&level=`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Notice {
    pub notice: String,
    pub level: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            notice: message.into(),
            level: "success".to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            notice: message.into(),
            level: "error".to_string(),
        }
    }

    /// `path` with this notice appended as a query string.
    pub fn redirect_target(&self, path: &str) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("notice", &self.notice)
            .append_pair("level", &self.level)
            .finish();
        format!("{}?{}", path, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_trusted_forwarded_for() {
        let mut headers = HeaderMap::new();
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), true), "10.0.0.9");
        assert_eq!(client_ip(&headers, None, true), "unknown");

        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        assert_eq!(client_ip(&headers, Some(peer), true), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_ignores_untrusted_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer), false), "10.0.0.9");
        assert_eq!(client_ip(&headers, None, false), "unknown");
    }

    #[test]
    fn test_site_origin() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("gallery.local:8080"));
        assert_eq!(site_origin(None, &headers), "http://gallery.local:8080");
        assert_eq!(
            absolute_url(Some("https://example.it/"), &headers, "/blog"),
            "https://example.it/blog"
        );
    }

    #[test]
    fn test_notice_redirect() {
        assert_eq!(
            Notice::success("Post added!").redirect_target("/admin"),
            "/admin?notice=Post+added%21&level=success"
        );
    }
}
