// File: src/pipeline.rs
// Purpose: Execute the matched route's handler and drive composition

use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use tracing::{debug, warn};
use trellis_router::{CompiledManifest, MatchError, RouteMatch};

use crate::compose::{compose, RenderTree};
use crate::handler::{Fault, HandlerRegistry, HandlerResult, Payload};
use crate::request_context::{DataSource, RequestContext};

/// Errors the pipeline reports to its caller instead of rendering.
///
/// Both are recoverable: `NotFound` drives the caller's fallback route and
/// `MethodNotAllowed` its 405 response. Handler faults are *not* errors at
/// this level; they render.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NotFound(#[from] MatchError),

    #[error("no handler for {method} on `{pattern}`")]
    MethodNotAllowed { pattern: String, method: Method },
}

/// The finalized outcome of one request.
#[derive(Debug)]
pub enum Outcome {
    /// The handler redirected. Composition was skipped entirely: no
    /// partial render, no payload delivered downstream.
    Redirect {
        target: String,
        status: StatusCode,
        headers: HeaderMap,
    },
    /// The composed render tree plus the response headers the handler set.
    Render { headers: HeaderMap, tree: RenderTree },
}

/// Runs the handler for an already-matched route and captures its side
/// effects into a [`HandlerResult`].
///
/// Fault policy: a handler error never crashes the pipeline. It is
/// captured as `error_kind`, the status defaults to 500 *only* when the
/// handler did not set one explicitly, and the result is still forwarded
/// to rendering so the view can show an error state.
pub async fn execute(
    registry: &HandlerRegistry,
    matched: &RouteMatch<'_>,
    ctx: &mut RequestContext,
) -> Result<HandlerResult, DispatchError> {
    let handler = registry
        .resolve(&matched.entry.handler_ref, ctx.method())
        .ok_or_else(|| DispatchError::MethodNotAllowed {
            pattern: matched.entry.pattern.display(),
            method: ctx.method().clone(),
        })?;

    let outcome = handler(ctx).await;
    let (status, headers, redirect) = ctx.take_response().take();

    let result = match outcome {
        Ok(data) => HandlerResult {
            status: status.unwrap_or(StatusCode::OK),
            redirect,
            headers,
            data,
            error_kind: None,
        },
        Err(err) => {
            warn!(
                pattern = %matched.entry.pattern,
                error = %format!("{err:#}"),
                "handler fault, rendering error state"
            );
            HandlerResult {
                status: status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                // A redirect set before the fault still wins.
                redirect,
                headers,
                data: Payload::Absent,
                error_kind: Some(Fault::from(err)),
            }
        }
    };

    Ok(result)
}

/// Full request drive: match, execute, then either finalize a redirect or
/// compose the layout chain around the handler result.
///
/// One cooperative task per request: the only suspension points are the
/// handler's own external-data awaits. Dropping the returned future while
/// the handler is pending discards the in-flight result without invoking
/// composition; no partial layout tree is ever produced.
pub async fn handle_request(
    manifest: &CompiledManifest,
    registry: &HandlerRegistry,
    method: Method,
    path: &str,
    data_source: Option<Arc<dyn DataSource>>,
) -> Result<Outcome, DispatchError> {
    let matched = manifest.match_path(path)?;
    debug!(pattern = %matched.entry.pattern, %method, "dispatching");

    let mut ctx = RequestContext::new(method, path, matched.params.clone(), data_source);
    let mut result = execute(registry, &matched, &mut ctx).await?;

    if let Some(target) = result.redirect.take() {
        let status = if result.status.is_redirection() {
            result.status
        } else {
            StatusCode::FOUND
        };
        return Ok(Outcome::Redirect {
            target,
            status,
            headers: result.headers,
        });
    }

    let headers = std::mem::take(&mut result.headers);
    let chain = manifest.layout_chain(matched.entry);
    let tree = compose(&chain, &matched.entry.handler_ref, result);
    Ok(Outcome::Render { headers, tree })
}
