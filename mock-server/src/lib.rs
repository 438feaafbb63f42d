use std::collections::BTreeMap;

use axum::{
    body::{Body, Bytes},
    extract::{Path, RawQuery},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "admin";

/// Everything the server saw of a request, returned as the response body.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EchoReply {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    /// Request headers keyed by lowercase name; a repeated name keeps its
    /// last value.
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/redirect/{hops}", get(redirect))
        .route("/protected", any(protected))
        .route("/duplicate-headers", get(duplicate_headers))
        .route("/binary", get(binary))
        .route("/chunked", get(chunked))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn echo(
    method: Method,
    uri: Uri,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Json<EchoReply> {
    tracing::debug!(%method, %uri, "echo");
    Json(EchoReply {
        method: method.to_string(),
        path: uri.path().to_string(),
        query,
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn status(Path(code): Path<u16>) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Redirect `hops` times before landing on `/echo`.
async fn redirect(Path(hops): Path<u32>) -> impl IntoResponse {
    let location = if hops <= 1 {
        "/echo".to_string()
    } else {
        format!("/redirect/{}", hops - 1)
    };
    (StatusCode::FOUND, [(header::LOCATION, location)])
}

async fn protected(headers: HeaderMap) -> Response {
    let expected = format!("Basic {}", STANDARD.encode(format!("{USERNAME}:{PASSWORD}")));
    let authorized = headers
        .get(header::AUTHORIZATION)
        .is_some_and(|value| value.as_bytes() == expected.as_bytes());
    if authorized {
        (StatusCode::OK, "welcome").into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, r#"Basic realm="cmis""#)],
        )
            .into_response()
    }
}

async fn duplicate_headers() -> Response {
    let mut response = "dup".into_response();
    let headers = response.headers_mut();
    headers.append("x-dup", HeaderValue::from_static("first"));
    headers.append("x-dup", HeaderValue::from_static("second"));
    headers.insert("X-Custom", HeaderValue::from_static("v1"));
    response
}

async fn binary() -> impl IntoResponse {
    let bytes: Vec<u8> = (0..=255).collect();
    ([(header::CONTENT_TYPE, "application/octet-stream")], bytes)
}

/// A body of unknown length, which hyper sends chunked.
async fn chunked() -> Response {
    let parts = ["<feed>", "<entry/>", "</feed>"]
        .into_iter()
        .map(|part| Ok::<_, std::io::Error>(Bytes::from_static(part.as_bytes())));
    Response::builder()
        .header(header::CONTENT_TYPE, "application/atom+xml")
        .body(Body::from_stream(futures_util::stream::iter(parts)))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_reply_roundtrips_through_json() {
        let reply = EchoReply {
            method: "POST".to_string(),
            path: "/echo".to_string(),
            query: Some("a=1".to_string()),
            headers: BTreeMap::from([("content-type".to_string(), "text/xml".to_string())]),
            body: "<a/>".to_string(),
        };
        let json = serde_json::to_string(&reply).unwrap();
        let back: EchoReply = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, "POST");
        assert_eq!(back.query.as_deref(), Some("a=1"));
        assert_eq!(back.headers["content-type"], "text/xml");
    }

    #[test]
    fn echo_reply_accepts_missing_query() {
        let back: EchoReply = serde_json::from_str(
            r#"{"method":"GET","path":"/echo","query":null,"headers":{},"body":""}"#,
        )
        .unwrap();
        assert!(back.query.is_none());
        assert!(back.headers.is_empty());
    }
}
