#![forbid(unsafe_code)]

//! Interactive editing on top of the formlay layout model.
//!
//! # Role in formlay
//! `formlay-designer` turns pointer gestures into interval-tree edits. A
//! [`LayoutDesigner`] owns a [`LayoutModel`](formlay_layout::LayoutModel) and
//! a [`GeometryOracle`](formlay_core::GeometryOracle) and runs at most one
//! session (resize, move or add) at a time.
//!
//! # How it fits in the system
//! - [`snap`] finds the positions a dragged edge may snap to.
//! - [`place`] merges a component into a tree and splits gaps around it.
//! - [`optimize`] normalizes a tree on every commit.
//! - [`reconcile`] keeps explicit sizes honest after the host resized
//!   components on its own.

pub mod config;
pub mod designer;
pub mod error;
pub mod optimize;
pub mod place;
pub mod reconcile;
pub mod session;
pub mod snap;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, DEFAULT_SNAP_DISTANCE, DesignerConfig};
pub use designer::LayoutDesigner;
pub use error::DesignerError;
pub use optimize::optimize;
pub use place::placed_bounds;
pub use reconcile::{ReconcileReport, reconcile};
pub use session::{DesignerState, MoveRequest, NewComponent, ResizeEdges, SessionKind};
pub use snap::{SnapCandidate, SnapClass, SnapContext, preferred_size_candidate};
