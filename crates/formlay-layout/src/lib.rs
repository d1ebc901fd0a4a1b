#![forbid(unsafe_code)]

//! Interval trees, the layout model, and the layout solver.
//!
//! # Role in formlay
//! Each layout container owns one tree per axis. Trees are stored in a
//! single arena keyed by [`IntervalId`]; every record keeps an explicit parent
//! id, so there are no reference cycles. The [`LayoutModel`] also keeps the
//! component registry, the per-axis explicit-size flags, and a change log for
//! undo/redo.
//!
//! # Key types
//! - [`LayoutModel`]: the owner of all trees. Mutation goes through
//!   journaled primitives ([`Change`]).
//! - [`IntervalKind`]: single, gap, sequential or parallel.
//! - [`SizeResolver`] and [`solve`]: turn trees into pixel bounds using a
//!   [`GeometryOracle`](formlay_core::GeometryOracle).
//! - [`InvariantReport`]: structural self-check.

pub mod change;
pub mod dump;
pub mod edit;
pub mod error;
pub mod interval;
pub mod model;
pub mod solve;
pub mod validate;

pub use change::{Change, ChangeMark};
pub use edit::RemovalMode;
pub use error::LayoutError;
pub use interval::{
    INFINITE_SIZE, IntervalId, IntervalKind, IntervalRecord, IntervalSizes, SizeDef,
};
pub use model::{LayoutComponent, LayoutModel, ModelSnapshot};
pub use solve::{
    GapNeighbor, PaddingDefaults, ResolvedSize, SizeResolver, SolvedLayout, distribute, solve,
};
pub use validate::{InvariantCode, InvariantIssue, InvariantReport};
