// File: src/request_context.rs
// Purpose: Per-request execution context handed to route handlers

use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use trellis_router::PathParams;

use crate::BoxFuture;

/// Opaque external data access. The pipeline is the only component that
/// performs external I/O, and it does so exclusively through this seam;
/// timeouts are the collaborator's responsibility and surface here as
/// errors, which the pipeline captures as handler faults.
pub trait DataSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        key: &'a str,
        params: &'a PathParams,
    ) -> BoxFuture<'a, anyhow::Result<serde_json::Value>>;
}

/// Mutable response descriptor a handler writes into.
///
/// Status stays unset unless the handler touches it, so the pipeline can
/// tell "handler chose 200" apart from "handler said nothing" when a fault
/// needs a server-error default.
#[derive(Debug, Default)]
pub struct ResponseParts {
    status: Option<StatusCode>,
    headers: HeaderMap,
    redirect: Option<String>,
}

impl ResponseParts {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Adds a response header. Invalid names or values are dropped rather
    /// than failing the request; headers are advisory, the payload is not.
    pub fn header(&mut self, key: &str, value: &str) {
        if let (Ok(name), Ok(val)) = (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, val);
        }
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Redirect to `target`. Rendering is skipped entirely for redirects;
    /// pair with `set_status` for a non-302 redirect class.
    pub fn redirect(&mut self, target: impl Into<String>) {
        self.redirect = Some(target.into());
    }

    pub fn redirect_target(&self) -> Option<&str> {
        self.redirect.as_deref()
    }

    pub(crate) fn take(self) -> (Option<StatusCode>, HeaderMap, Option<String>) {
        (self.status, self.headers, self.redirect)
    }
}

/// Everything a handler sees for one request: method, matched path
/// parameters, the response descriptor, and external data access.
///
/// Created fresh per request and owned by that request's task alone; no
/// context is ever shared across requests.
pub struct RequestContext {
    method: Method,
    path: String,
    params: PathParams,
    response: ResponseParts,
    data_source: Option<Arc<dyn DataSource>>,
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("params", &self.params.len())
            .finish()
    }
}

impl RequestContext {
    pub fn new(
        method: Method,
        path: impl Into<String>,
        params: PathParams,
        data_source: Option<Arc<dyn DataSource>>,
    ) -> Self {
        Self {
            method,
            path: path.into(),
            params,
            response: ResponseParts::default(),
            data_source,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    /// Single-segment path parameter, the common case.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get_str(name)
    }

    pub fn response(&self) -> &ResponseParts {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseParts {
        &mut self.response
    }

    /// Fetches from the external data source, or fails if none was wired
    /// in. Failures become handler faults when propagated with `?`.
    pub async fn fetch(&self, key: &str) -> anyhow::Result<serde_json::Value> {
        match &self.data_source {
            Some(source) => source.fetch(key, &self.params).await,
            None => anyhow::bail!("no data source configured for `{key}`"),
        }
    }

    pub(crate) fn take_response(&mut self) -> ResponseParts {
        std::mem::take(&mut self.response)
    }
}
