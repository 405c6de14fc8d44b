// File: src/compose.rs
// Purpose: Build the nested render context chain for a matched route

use axum::http::StatusCode;
use trellis_router::LayoutEntry;

use crate::handler::{Fault, HandlerResult, Payload};

/// One layout wrapping level of a render tree. A frame has exactly one
/// insertion point (its child) and no visibility into sibling layouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutFrame {
    /// Layout name, empty string for a default layout.
    pub name: String,
    /// Opaque reference to the renderable wrapper.
    pub body_ref: String,
}

/// The innermost render context. The leaf view is the only context with
/// direct access to the handler's status, payload, and fault; deciding
/// what a 404 or a fault looks like is the view's job, not this engine's.
#[derive(Debug)]
pub struct LeafContext {
    pub view_ref: String,
    pub status: StatusCode,
    pub data: Payload,
    pub error_kind: Option<Fault>,
}

/// A node of the composed render tree.
#[derive(Debug)]
pub enum RenderNode {
    Layout {
        frame: LayoutFrame,
        child: Box<RenderNode>,
    },
    Leaf(LeafContext),
}

/// The composed render tree: ancestor-to-leaf nesting, built by iteration
/// over the compiled chain rather than recursion, so unbounded layout
/// depth costs stack nothing.
#[derive(Debug)]
pub struct RenderTree {
    root: RenderNode,
}

impl RenderTree {
    pub fn root(&self) -> &RenderNode {
        &self.root
    }

    /// Layout frames in composition order, outermost first.
    pub fn frames(&self) -> Vec<&LayoutFrame> {
        let mut frames = Vec::new();
        let mut node = &self.root;
        while let RenderNode::Layout { frame, child } = node {
            frames.push(frame);
            node = child;
        }
        frames
    }

    /// Number of layout frames wrapping the leaf.
    pub fn depth(&self) -> usize {
        self.frames().len()
    }

    /// The terminal leaf context. Every tree has exactly one.
    pub fn leaf(&self) -> &LeafContext {
        let mut node = &self.root;
        loop {
            match node {
                RenderNode::Layout { child, .. } => node = child,
                RenderNode::Leaf(leaf) => return leaf,
            }
        }
    }
}

/// Composes the render tree for a route from its resolved layout chain
/// (outermost first) and the handler's result.
///
/// The result is consumed exactly once, and only the leaf receives it;
/// layout frames carry no request state. Redirects never reach this
/// function: the pipeline finalizes them before composition.
pub fn compose(chain: &[&LayoutEntry], view_ref: &str, result: HandlerResult) -> RenderTree {
    debug_assert!(result.redirect.is_none(), "redirects bypass composition");

    let mut node = RenderNode::Leaf(LeafContext {
        view_ref: view_ref.to_string(),
        status: result.status,
        data: result.data,
        error_kind: result.error_kind,
    });

    // Wrap innermost-out; the finished tree reads ancestor-to-leaf.
    for layout in chain.iter().rev() {
        node = RenderNode::Layout {
            frame: LayoutFrame {
                name: layout.name.clone(),
                body_ref: layout.body_ref.clone(),
            },
            child: Box::new(node),
        };
    }

    RenderTree { root: node }
}
