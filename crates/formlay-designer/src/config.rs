#![forbid(unsafe_code)]

//! Designer configuration.

use std::fmt;

use formlay_layout::PaddingDefaults;
use serde::{Deserialize, Serialize};

/// Tolerance of snapping to a candidate position, in pixels.
pub const DEFAULT_SNAP_DISTANCE: i32 = 8;

/// Tunables passed into [`LayoutDesigner::new`](crate::LayoutDesigner::new).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignerConfig {
    /// Maximum distance between a dragged edge and a candidate for the
    /// candidate to win.
    pub snap_distance: i32,
    /// Maximum difference between an explicit size and its default for the
    /// explicit size to be demoted.
    pub size_tolerance: i32,
    /// Spacing used when the oracle has none.
    pub padding: PaddingDefaults,
}

impl Default for DesignerConfig {
    fn default() -> Self {
        Self {
            snap_distance: DEFAULT_SNAP_DISTANCE,
            size_tolerance: 0,
            padding: PaddingDefaults::default(),
        }
    }
}

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Negative { field: &'static str, value: i32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negative { field, value } => {
                write!(f, "config field {field} must be non-negative (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl DesignerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("snap_distance", self.snap_distance),
            ("size_tolerance", self.size_tolerance),
            ("padding.related", self.padding.related),
            ("padding.unrelated", self.padding.unrelated),
            ("padding.separate", self.padding.separate),
            ("padding.indent", self.padding.indent),
            ("padding.container", self.padding.container),
        ];
        for (field, value) in fields {
            if value < 0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        Ok(())
    }

    #[must_use]
    pub const fn with_snap_distance(mut self, snap_distance: i32) -> Self {
        self.snap_distance = snap_distance;
        self
    }

    #[must_use]
    pub const fn with_size_tolerance(mut self, size_tolerance: i32) -> Self {
        self.size_tolerance = size_tolerance;
        self
    }
}
