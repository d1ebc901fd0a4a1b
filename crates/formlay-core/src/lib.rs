#![forbid(unsafe_code)]

//! Core vocabulary for the formlay layout engine.
//!
//! # Role in formlay
//! `formlay-core` holds what every other crate shares: signed pixel geometry,
//! axis/edge/alignment/padding enums, component identity, and the
//! [`GeometryOracle`](oracle::GeometryOracle) contract through which the host
//! toolkit answers measurement questions.
//!
//! # How it fits in the system
//! `formlay-layout` builds the interval trees on top of these types,
//! `formlay-designer` drives interactive editing against an oracle, and
//! `formlay-harness` implements a scripted oracle for tests.

pub mod component;
pub mod geometry;
pub mod logging;
pub mod oracle;

pub use component::{Alignment, ComponentId, PaddingType};
pub use geometry::{Axis, Edge, Point, Rect, Size, Span};
pub use oracle::GeometryOracle;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, debug_span, info, info_span, trace, trace_span, warn};
