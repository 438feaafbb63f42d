//! The transport capability shared by both backends.
//!
//! # Design
//! A backend implements only `execute`. The four verb methods are provided:
//! each runs the `RequestBuilder` against the backend's user agent and
//! default options, then hands the finished `TransportRequest` over. Every
//! call builds its own request, so one service value can be shared freely
//! between threads.

use crate::error::TransportError;
use crate::http::{Credentials, HttpMethod, TransportRequest};
use crate::options::BackendOptions;
use crate::request::{RequestBuilder, RequestOptions};
use crate::response::NormalizedResponse;

/// The result of one exchange: normalized head plus the raw body bytes.
pub type Exchange = (NormalizedResponse, Vec<u8>);

/// Performs one blocking HTTP exchange per call.
pub trait TransportService: Send + Sync {
    /// Value sent as `User-Agent` on every request.
    fn user_agent(&self) -> &str;

    /// Construction-time backend options; call-time options override them.
    fn default_options(&self) -> &BackendOptions;

    /// Run a fully prepared request.
    fn execute(&self, request: TransportRequest) -> Result<Exchange, TransportError>;

    fn get(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        options: RequestOptions,
    ) -> Result<Exchange, TransportError> {
        dispatch(self, HttpMethod::Get, url, None, None, credentials, options)
    }

    fn delete(
        &self,
        url: &str,
        credentials: Option<&Credentials>,
        options: RequestOptions,
    ) -> Result<Exchange, TransportError> {
        dispatch(self, HttpMethod::Delete, url, None, None, credentials, options)
    }

    /// Send `payload` with `PUT`; `content_type` is sent when non-empty.
    fn put(
        &self,
        url: &str,
        payload: &[u8],
        content_type: Option<&str>,
        credentials: Option<&Credentials>,
        options: RequestOptions,
    ) -> Result<Exchange, TransportError> {
        dispatch(self, HttpMethod::Put, url, Some(payload), content_type, credentials, options)
    }

    /// Send `payload` with `POST`; `content_type` is sent when non-empty.
    fn post(
        &self,
        url: &str,
        payload: &[u8],
        content_type: Option<&str>,
        credentials: Option<&Credentials>,
        options: RequestOptions,
    ) -> Result<Exchange, TransportError> {
        dispatch(self, HttpMethod::Post, url, Some(payload), content_type, credentials, options)
    }
}

fn dispatch<S: TransportService + ?Sized>(
    service: &S,
    method: HttpMethod,
    url: &str,
    payload: Option<&[u8]>,
    content_type: Option<&str>,
    credentials: Option<&Credentials>,
    options: RequestOptions,
) -> Result<Exchange, TransportError> {
    let request = RequestBuilder::new(service.user_agent()).prepare(
        method,
        url,
        payload,
        content_type,
        credentials,
        options,
        service.default_options(),
    )?;
    service.execute(request)
}
