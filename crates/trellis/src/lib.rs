//! # Trellis
//!
//! Request-time runtime for the Trellis framework: handler execution and
//! layout composition over a [`trellis_router::CompiledManifest`].
//!
//! The flow for one request:
//!
//! 1. [`CompiledManifest::match_path`] selects a route entry (pure read of
//!    the immutable manifest, reentrant across requests).
//! 2. [`pipeline::execute`] runs the method-resolved handler with a fresh
//!    [`RequestContext`]; status, headers, and redirect land in a
//!    [`HandlerResult`], handler faults become renderable state.
//! 3. Unless the handler redirected, [`compose::compose`] wraps the result
//!    in the route's layout chain, ancestor-to-leaf, producing a
//!    [`RenderTree`] for the view layer.
//!
//! [`pipeline::handle_request`] drives all three. There is no background
//! work and no cross-request state beyond the manifest itself; cancelling
//! a request drops its in-flight result without composing anything.
//!
//! ## Example
//!
//! ```
//! use axum::http::Method;
//! use trellis::{handle_request, HandlerRegistry, Outcome, Payload};
//! use trellis::request_context::RequestContext;
//! use trellis::BoxFuture;
//! use trellis_router::segment::{build_tree, DirEntry};
//! use trellis_router::{CompiledManifest, MatchOptions};
//!
//! fn hello(_ctx: &mut RequestContext) -> BoxFuture<'_, anyhow::Result<Payload>> {
//!     Box::pin(async { Ok(Payload::Present(serde_json::json!({"greeting": "hi"}))) })
//! }
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let tree = build_tree(&[DirEntry::leaf("index.rsx")]).unwrap();
//! let manifest = CompiledManifest::compile(&tree, MatchOptions::default()).unwrap();
//!
//! let mut registry = HandlerRegistry::new();
//! registry.on("index.rsx", Method::GET, hello);
//!
//! let outcome = handle_request(&manifest, &registry, Method::GET, "/", None)
//!     .await
//!     .unwrap();
//! assert!(matches!(outcome, Outcome::Render { .. }));
//! # });
//! ```

use std::future::Future;
use std::pin::Pin;

pub mod adapter;
pub mod compose;
pub mod config;
pub mod handler;
pub mod pipeline;
pub mod request_context;

/// Boxed future alias used across handler and data-source seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use adapter::{AdapterInput, DeploymentAdapter, FunctionTriggerAdapter};
pub use compose::{compose, LayoutFrame, LeafContext, RenderNode, RenderTree};
pub use config::{BuildConfig, Config, RoutingConfig};
pub use handler::{handler_fn, Fault, HandlerFn, HandlerRegistry, HandlerResult, Payload};
pub use pipeline::{execute, handle_request, DispatchError, Outcome};
pub use request_context::{DataSource, RequestContext, ResponseParts};
