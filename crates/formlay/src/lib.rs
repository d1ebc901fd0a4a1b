#![forbid(unsafe_code)]

//! formlay public facade crate.
//!
//! Re-exports the layout vocabulary, the model and the designer under one
//! roof, plus a prelude for embedding the designer in a form editor.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use formlay_core::{
    Alignment, Axis, ComponentId, Edge, GeometryOracle, PaddingType, Point, Rect, Size, Span,
};

// --- Layout re-exports -----------------------------------------------------

pub use formlay_layout::{
    ChangeMark, IntervalId, IntervalKind, IntervalSizes, InvariantReport, LayoutError,
    LayoutModel, ModelSnapshot, PaddingDefaults, SizeDef, SolvedLayout, solve,
};

// --- Designer re-exports ---------------------------------------------------

pub use formlay_designer::{
    ConfigError, DesignerConfig, DesignerError, DesignerState, LayoutDesigner, NewComponent,
    ReconcileReport, ResizeEdges,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for formlay embedders.
#[derive(Debug)]
pub enum Error {
    Designer(DesignerError),
    /// Configuration text could not be parsed.
    ConfigParse(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Designer(err) => write!(f, "{err}"),
            Self::ConfigParse(err) => write!(f, "invalid designer config: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Designer(err) => Some(err),
            Self::ConfigParse(err) => Some(err),
        }
    }
}

impl From<DesignerError> for Error {
    fn from(err: DesignerError) -> Self {
        Self::Designer(err)
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Self {
        Self::Designer(DesignerError::Layout(err))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Designer(DesignerError::Config(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse(err)
    }
}

/// Standard result type for formlay APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Parse and validate a JSON designer configuration. Missing fields take
/// their defaults.
pub fn config_from_json(text: &str) -> Result<DesignerConfig> {
    let config: DesignerConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
}

/// Open a designer over `model` with a JSON configuration.
pub fn open_designer<O: GeometryOracle>(
    model: LayoutModel,
    oracle: O,
    config_json: &str,
) -> Result<LayoutDesigner<O>> {
    let config = config_from_json(config_json)?;
    Ok(LayoutDesigner::with_model(model, oracle, config)?)
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Alignment, Axis, ComponentId, DesignerConfig, DesignerState, Error, GeometryOracle,
        LayoutDesigner, LayoutModel, PaddingType, Point, Rect, ResizeEdges, Result, Size,
    };

    pub use crate::{core, designer, layout};
}

pub use formlay_core as core;
pub use formlay_designer as designer;
pub use formlay_layout as layout;

#[cfg(feature = "tracing-json")]
pub use formlay_core::logging::init_json_subscriber;
