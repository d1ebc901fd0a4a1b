#![forbid(unsafe_code)]

//! Layout model errors.

use std::fmt;

use formlay_core::{Alignment, Axis, ComponentId};

/// Contract violations reported by the layout model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Unknown component or container id.
    NotFound { component: ComponentId },
    /// Unknown interval id.
    IntervalNotFound { id: u64 },
    /// The component exists but has no interval on the axis yet.
    NotPlaced { component: ComponentId, axis: Axis },
    /// Alignment cannot be applied to the interval's parent.
    InvalidAlignment {
        component: ComponentId,
        axis: Axis,
        alignment: Alignment,
    },
    /// The component is not a layout container.
    NotAContainer { component: ComponentId },
    /// A component with this id is already registered.
    DuplicateComponent { component: ComponentId },
    /// Change marks out of order or beyond the log.
    InvalidChangeMark { from: usize, to: usize, len: usize },
    /// `redo` called with an empty redo stack.
    NothingToRedo,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { component } => write!(f, "component {component} not found"),
            Self::IntervalNotFound { id } => write!(f, "interval {id} not found"),
            Self::NotPlaced { component, axis } => write!(
                f,
                "component {component} has no {} interval",
                axis.as_str()
            ),
            Self::InvalidAlignment {
                component,
                axis,
                alignment,
            } => write!(
                f,
                "cannot align component {component} {alignment} on the {} axis",
                axis.as_str()
            ),
            Self::NotAContainer { component } => {
                write!(f, "component {component} is not a layout container")
            }
            Self::DuplicateComponent { component } => {
                write!(f, "component {component} is already registered")
            }
            Self::InvalidChangeMark { from, to, len } => write!(
                f,
                "invalid change marks {from}..{to} (log holds {len} changes)"
            ),
            Self::NothingToRedo => write!(f, "nothing to redo"),
        }
    }
}

impl std::error::Error for LayoutError {}
