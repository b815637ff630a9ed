// Copyright 2026 the Glint Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene and renderer errors.

use core::fmt;

use glint_style::StyleError;

use crate::types::NodeId;

/// Error reported by a [`Renderer`](crate::Renderer).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderError {
    message: String,
}

impl RenderError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "render error: {}", self.message)
    }
}

impl core::error::Error for RenderError {}

/// Error type for scene operations.
#[derive(Clone, Debug, PartialEq)]
pub enum SceneError {
    /// The child is the parent itself or one of its ancestors. Nothing changed.
    CyclicTree {
        /// Requested parent.
        parent: NodeId,
        /// Requested child.
        child: NodeId,
    },
    /// The id refers to a destroyed node (or never existed).
    UseAfterDestroy(NodeId),
    /// `child` is not a child of `parent`.
    NotAChild {
        /// Expected parent.
        parent: NodeId,
        /// Node that was expected to be a child.
        child: NodeId,
    },
    /// The scene root cannot be moved, removed or destroyed.
    RootNode,
    /// A style value failed to parse or resolve. The previous used value was kept.
    Style(StyleError),
    /// The renderer failed. The next frame is a full redraw.
    Render(RenderError),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CyclicTree { parent, child } => {
                write!(f, "appending {child:?} to {parent:?} would create a cycle")
            }
            Self::UseAfterDestroy(id) => write!(f, "{id:?} was destroyed"),
            Self::NotAChild { parent, child } => write!(f, "{child:?} is not a child of {parent:?}"),
            Self::RootNode => f.write_str("the scene root cannot be moved, removed or destroyed"),
            Self::Style(e) => write!(f, "{e}"),
            Self::Render(e) => write!(f, "{e}"),
        }
    }
}

impl core::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Style(e) => Some(e),
            Self::Render(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StyleError> for SceneError {
    fn from(e: StyleError) -> Self {
        Self::Style(e)
    }
}

impl From<RenderError> for SceneError {
    fn from(e: RenderError) -> Self {
        Self::Render(e)
    }
}
