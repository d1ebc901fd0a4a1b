#![forbid(unsafe_code)]

//! Interval records: the nodes of the per-container, per-axis layout trees.
//!
//! Records live in an arena owned by [`LayoutModel`](crate::LayoutModel) and
//! refer to each other only by [`IntervalId`]. Every non-root record stores its
//! parent explicitly; groups store their ordered children.

use formlay_core::{Alignment, ComponentId, PaddingType, Span};
use serde::{Deserialize, Serialize};

use crate::error::LayoutError;

/// Size used for "unbounded" maxima. Large enough to dominate any real form,
/// small enough that sums of a few of them cannot overflow `i32`.
pub const INFINITE_SIZE: i32 = 32_767;

/// Stable identifier for an interval record.
///
/// `0` is reserved/invalid so IDs are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervalId(u64);

impl IntervalId {
    /// Lowest valid interval ID.
    pub const MIN: Self = Self(1);

    /// Create a new interval ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, LayoutError> {
        if raw == 0 {
            return Err(LayoutError::IntervalNotFound { id: raw });
        }
        Ok(Self(raw))
    }

    /// Get the raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl Default for IntervalId {
    fn default() -> Self {
        Self::MIN
    }
}

/// One entry of a min/pref/max triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SizeDef {
    /// Computed: from the component, from the padding, or from the other entries.
    #[default]
    NotDefined,
    /// Same as the resolved preferred size (min/max only).
    UsePreferred,
    /// Explicit pixels.
    Px(i32),
    /// Unbounded (max only).
    Infinite,
}

impl SizeDef {
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::NotDefined)
    }

    #[must_use]
    pub const fn px(self) -> Option<i32> {
        match self {
            Self::Px(value) => Some(value),
            _ => None,
        }
    }

    pub(crate) fn token(self) -> String {
        match self {
            Self::NotDefined => "default".to_string(),
            Self::UsePreferred => "preferred".to_string(),
            Self::Px(value) => value.to_string(),
            Self::Infinite => "infinite".to_string(),
        }
    }
}

/// Min/pref/max size definitions of a leaf interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntervalSizes {
    pub min: SizeDef,
    pub pref: SizeDef,
    pub max: SizeDef,
}

impl IntervalSizes {
    /// Fully computed, non-resizing.
    pub const DEFAULT: Self = Self {
        min: SizeDef::NotDefined,
        pref: SizeDef::NotDefined,
        max: SizeDef::NotDefined,
    };

    #[must_use]
    pub const fn new(min: SizeDef, pref: SizeDef, max: SizeDef) -> Self {
        Self { min, pref, max }
    }

    /// Default size that grows to absorb slack.
    #[must_use]
    pub const fn resizing() -> Self {
        Self::new(SizeDef::NotDefined, SizeDef::NotDefined, SizeDef::Infinite)
    }

    /// Fixed explicit size.
    #[must_use]
    pub const fn fixed(px: i32) -> Self {
        Self::new(SizeDef::NotDefined, SizeDef::Px(px), SizeDef::NotDefined)
    }

    /// Whether the interval may grow beyond its preferred size.
    #[must_use]
    pub const fn is_resizing(&self) -> bool {
        matches!(self.max, SizeDef::Infinite)
    }

    /// Same sizes with the resizing flag changed.
    #[must_use]
    pub const fn with_resizing(self, resizing: bool) -> Self {
        Self {
            max: if resizing {
                SizeDef::Infinite
            } else {
                SizeDef::NotDefined
            },
            ..self
        }
    }

    /// Same sizes with a new preferred entry.
    #[must_use]
    pub const fn with_pref(self, pref: SizeDef) -> Self {
        Self { pref, ..self }
    }
}

/// Kind-specific payload of an interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntervalKind {
    /// One component's extent on the axis.
    Single { component: ComponentId },
    /// Empty space. `padding` classifies the default size; `None` means related.
    Gap { padding: Option<PaddingType> },
    /// Children laid end to end, in order.
    Sequential { children: Vec<IntervalId> },
    /// Children overlapping along the axis, each positioned by its alignment.
    Parallel {
        children: Vec<IntervalId>,
        group_alignment: Alignment,
    },
}

impl IntervalKind {
    #[must_use]
    pub const fn parallel() -> Self {
        Self::Parallel {
            children: Vec::new(),
            group_alignment: Alignment::Leading,
        }
    }

    #[must_use]
    pub const fn sequential() -> Self {
        Self::Sequential {
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn gap() -> Self {
        Self::Gap { padding: None }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Single { .. } => "component",
            Self::Gap { .. } => "gap",
            Self::Sequential { .. } => "sequential",
            Self::Parallel { .. } => "parallel",
        }
    }
}

/// One node of an interval tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub id: IntervalId,
    pub parent: Option<IntervalId>,
    /// Alignment inside a parallel parent; ignored elsewhere.
    pub alignment: Alignment,
    pub sizes: IntervalSizes,
    pub kind: IntervalKind,
    /// Last built extent. Visual state only: not dumped, not logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<Span>,
}

impl IntervalRecord {
    pub(crate) fn new(id: IntervalId, kind: IntervalKind, sizes: IntervalSizes) -> Self {
        Self {
            id,
            parent: None,
            alignment: Alignment::Leading,
            sizes,
            kind,
            current: None,
        }
    }

    #[must_use]
    pub fn children(&self) -> &[IntervalId] {
        match &self.kind {
            IntervalKind::Sequential { children } | IntervalKind::Parallel { children, .. } => {
                children
            }
            IntervalKind::Single { .. } | IntervalKind::Gap { .. } => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<IntervalId>> {
        match &mut self.kind {
            IntervalKind::Sequential { children } | IntervalKind::Parallel { children, .. } => {
                Some(children)
            }
            IntervalKind::Single { .. } | IntervalKind::Gap { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_group(&self) -> bool {
        matches!(
            self.kind,
            IntervalKind::Sequential { .. } | IntervalKind::Parallel { .. }
        )
    }

    #[must_use]
    pub const fn is_gap(&self) -> bool {
        matches!(self.kind, IntervalKind::Gap { .. })
    }

    #[must_use]
    pub const fn is_parallel(&self) -> bool {
        matches!(self.kind, IntervalKind::Parallel { .. })
    }

    #[must_use]
    pub const fn is_sequential(&self) -> bool {
        matches!(self.kind, IntervalKind::Sequential { .. })
    }

    #[must_use]
    pub fn component(&self) -> Option<&ComponentId> {
        match &self.kind {
            IntervalKind::Single { component } => Some(component),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_resizing(&self) -> bool {
        self.sizes.is_resizing()
    }

    #[must_use]
    pub const fn group_alignment(&self) -> Option<Alignment> {
        match &self.kind {
            IntervalKind::Parallel {
                group_alignment, ..
            } => Some(*group_alignment),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_id_is_rejected() {
        assert!(IntervalId::new(0).is_err());
        assert_eq!(IntervalId::new(7).map(IntervalId::get), Ok(7));
    }

    #[test]
    fn resizing_is_derived_from_max() {
        assert!(!IntervalSizes::DEFAULT.is_resizing());
        assert!(IntervalSizes::resizing().is_resizing());
        let fixed = IntervalSizes::resizing().with_resizing(false);
        assert_eq!(fixed, IntervalSizes::DEFAULT);
        assert_eq!(IntervalSizes::fixed(20).pref.px(), Some(20));
    }

    #[test]
    fn size_tokens() {
        assert_eq!(SizeDef::NotDefined.token(), "default");
        assert_eq!(SizeDef::UsePreferred.token(), "preferred");
        assert_eq!(SizeDef::Px(11).token(), "11");
        assert_eq!(SizeDef::Infinite.token(), "infinite");
    }
}
