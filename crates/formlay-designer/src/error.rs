#![forbid(unsafe_code)]

//! Designer error type.

use std::fmt;

use formlay_core::{Alignment, Axis, ComponentId};
use formlay_layout::LayoutError;

use crate::config::ConfigError;

/// Errors produced by [`LayoutDesigner`](crate::LayoutDesigner).
///
/// Every variant is a contract violation by the caller. Operations that fail
/// leave the model untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DesignerError {
    NoActiveSession,
    SessionAlreadyActive,
    /// The bounds passed to a session call do not match its components.
    ComponentSetMismatch { expected: usize, got: usize },
    EmptySelection,
    /// The component is not a member of the target container.
    NotInContainer {
        component: ComponentId,
        container: ComponentId,
    },
    UnsupportedAlignment { axis: Axis, alignment: Alignment },
    Config(ConfigError),
    Layout(LayoutError),
}

impl fmt::Display for DesignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoActiveSession => write!(f, "no designer session is active"),
            Self::SessionAlreadyActive => write!(f, "a designer session is already active"),
            Self::ComponentSetMismatch { expected, got } => write!(
                f,
                "session has {expected} components but {got} bounds were given"
            ),
            Self::EmptySelection => write!(f, "no components given"),
            Self::NotInContainer {
                component,
                container,
            } => write!(f, "{component} is not in container {container}"),
            Self::UnsupportedAlignment { axis, alignment } => write!(
                f,
                "cannot align components by {alignment} on the {} axis",
                axis.as_str()
            ),
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Layout(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for DesignerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for DesignerError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<ConfigError> for DesignerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}
