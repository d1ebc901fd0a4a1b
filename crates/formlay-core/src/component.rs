#![forbid(unsafe_code)]

//! Component identity and the alignment/padding vocabulary shared by the
//! model and the designer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a component or container, as assigned by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComponentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Alignment of an interval inside its parallel parent.
///
/// `Baseline` is only meaningful on the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Leading,
    Trailing,
    Center,
    Baseline,
    Fill,
}

impl Alignment {
    /// Host-facing ordinal (`LEADING=0`, `TRAILING=1`, `CENTER=2`, `BASELINE=3`).
    #[must_use]
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Leading => 0,
            Self::Trailing => 1,
            Self::Center => 2,
            Self::Baseline => 3,
            Self::Fill => 4,
        }
    }

    #[must_use]
    pub const fn from_ordinal(value: i32) -> Option<Self> {
        match value {
            0 => Some(Self::Leading),
            1 => Some(Self::Trailing),
            2 => Some(Self::Center),
            3 => Some(Self::Baseline),
            4 => Some(Self::Fill),
            _ => None,
        }
    }

    /// Edge alignment corresponding to an edge.
    #[must_use]
    pub const fn from_edge(edge: crate::geometry::Edge) -> Self {
        match edge {
            crate::geometry::Edge::Leading => Self::Leading,
            crate::geometry::Edge::Trailing => Self::Trailing,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leading => "leading",
            Self::Trailing => "trailing",
            Self::Center => "center",
            Self::Baseline => "baseline",
            Self::Fill => "fill",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification used to look up a default gap size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingType {
    #[default]
    Related,
    Unrelated,
    Separate,
    Indent,
}

impl PaddingType {
    pub const ALL: [PaddingType; 4] = [
        PaddingType::Related,
        PaddingType::Unrelated,
        PaddingType::Separate,
        PaddingType::Indent,
    ];

    #[must_use]
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Related => 0,
            Self::Unrelated => 1,
            Self::Separate => 2,
            Self::Indent => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Related => "related",
            Self::Unrelated => "unrelated",
            Self::Separate => "separate",
            Self::Indent => "indent",
        }
    }
}

impl fmt::Display for PaddingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
