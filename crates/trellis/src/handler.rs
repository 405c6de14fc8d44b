// File: src/handler.rs
// Purpose: Method-keyed handler registration and the handler result type

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};

use crate::request_context::RequestContext;
use crate::BoxFuture;

/// The typed payload a handler returns. A sum type on purpose: an explicit
/// `Absent` is still a deliverable value, and the leaf view always
/// receives it. Non-2xx status never suppresses delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Present(serde_json::Value),
    Absent,
}

impl Payload {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Present(value)
    }
}

/// A captured handler execution fault. Renderable state, not a crash: the
/// pipeline forwards it to the leaf view instead of aborting the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
}

impl From<anyhow::Error> for Fault {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: format!("{err:#}"),
        }
    }
}

impl std::fmt::Display for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// A route handler: borrows the request context for the duration of its
/// future, returns a payload or an error that becomes a [`Fault`].
pub type HandlerFn =
    Arc<dyn for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Payload>> + Send + Sync>;

/// Wraps a closure or fn item into a [`HandlerFn`].
pub fn handler_fn<F>(f: F) -> HandlerFn
where
    F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Payload>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// The fixed per-route method mapping, resolved once at registration.
/// Lookup at request time is a single `HashMap` probe plus the
/// method-agnostic fallback, never a chain.
#[derive(Default, Clone)]
struct MethodHandlers {
    by_method: HashMap<Method, HandlerFn>,
    any: Option<HandlerFn>,
}

/// Handler registration: maps opaque handler references (as recorded on
/// compiled route entries) to method-keyed handler functions.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, MethodHandlers>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one method of one route.
    pub fn on<F>(&mut self, handler_ref: impl Into<String>, method: Method, f: F)
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Payload>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers
            .entry(handler_ref.into())
            .or_default()
            .by_method
            .insert(method, Arc::new(f));
    }

    /// Registers a method-agnostic fallback handler for one route.
    pub fn on_any<F>(&mut self, handler_ref: impl Into<String>, f: F)
    where
        F: for<'a> Fn(&'a mut RequestContext) -> BoxFuture<'a, anyhow::Result<Payload>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.entry(handler_ref.into()).or_default().any = Some(Arc::new(f));
    }

    /// Resolves the handler for a route and method: method-specific first,
    /// then the route's fallback.
    pub fn resolve(&self, handler_ref: &str, method: &Method) -> Option<&HandlerFn> {
        let entry = self.handlers.get(handler_ref)?;
        entry.by_method.get(method).or(entry.any.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Outcome of one handler execution, created fresh per request and
/// consumed exactly once by composition (or finalized as a redirect).
#[derive(Debug)]
pub struct HandlerResult {
    pub status: StatusCode,
    pub redirect: Option<String>,
    pub headers: HeaderMap,
    pub data: Payload,
    pub error_kind: Option<Fault>,
}

impl HandlerResult {
    /// Redirect short-circuit is absolute: when this is true, no layout
    /// context is ever built and no payload travels downstream.
    pub fn is_redirect(&self) -> bool {
        self.redirect.is_some()
    }
}
