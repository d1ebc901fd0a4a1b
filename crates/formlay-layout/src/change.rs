#![forbid(unsafe_code)]

//! Change log for undo/redo.
//!
//! Every mutation of the model goes through one [`Change`] value. Applying a
//! change forward performs the edit; applying its [`Change::inverse`] reverts
//! it exactly. The log stores changes only while recording is enabled.

use formlay_core::{Alignment, Axis, ComponentId, PaddingType};
use serde::{Deserialize, Serialize};

use crate::interval::{IntervalId, IntervalRecord, IntervalSizes};
use crate::model::LayoutComponent;

/// Opaque position in the change log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeMark(usize);

impl ChangeMark {
    #[must_use]
    pub const fn position(self) -> usize {
        self.0
    }
}

/// One primitive, invertible edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    CreateInterval {
        record: IntervalRecord,
    },
    DestroyInterval {
        record: IntervalRecord,
    },
    Attach {
        child: IntervalId,
        parent: IntervalId,
        index: usize,
    },
    Detach {
        child: IntervalId,
        parent: IntervalId,
        index: usize,
    },
    SetSizes {
        id: IntervalId,
        before: IntervalSizes,
        after: IntervalSizes,
    },
    SetAlignment {
        id: IntervalId,
        before: Alignment,
        after: Alignment,
    },
    SetGroupAlignment {
        id: IntervalId,
        before: Alignment,
        after: Alignment,
    },
    SetGapPadding {
        id: IntervalId,
        before: Option<PaddingType>,
        after: Option<PaddingType>,
    },
    SetExplicitSize {
        component: ComponentId,
        axis: Axis,
        before: bool,
        after: bool,
    },
    SetComponentInterval {
        component: ComponentId,
        axis: Axis,
        before: Option<IntervalId>,
        after: Option<IntervalId>,
    },
    RegisterComponent {
        component: LayoutComponent,
    },
    UnregisterComponent {
        component: LayoutComponent,
    },
    /// Move a component between container member lists.
    SetMembership {
        component: ComponentId,
        before: Option<(ComponentId, usize)>,
        after: Option<(ComponentId, usize)>,
    },
}

impl Change {
    /// The change that exactly reverts this one.
    #[must_use]
    pub fn inverse(&self) -> Change {
        match self.clone() {
            Self::CreateInterval { record } => Self::DestroyInterval { record },
            Self::DestroyInterval { record } => Self::CreateInterval { record },
            Self::Attach {
                child,
                parent,
                index,
            } => Self::Detach {
                child,
                parent,
                index,
            },
            Self::Detach {
                child,
                parent,
                index,
            } => Self::Attach {
                child,
                parent,
                index,
            },
            Self::SetSizes { id, before, after } => Self::SetSizes {
                id,
                before: after,
                after: before,
            },
            Self::SetAlignment { id, before, after } => Self::SetAlignment {
                id,
                before: after,
                after: before,
            },
            Self::SetGroupAlignment { id, before, after } => Self::SetGroupAlignment {
                id,
                before: after,
                after: before,
            },
            Self::SetGapPadding { id, before, after } => Self::SetGapPadding {
                id,
                before: after,
                after: before,
            },
            Self::SetExplicitSize {
                component,
                axis,
                before,
                after,
            } => Self::SetExplicitSize {
                component,
                axis,
                before: after,
                after: before,
            },
            Self::SetComponentInterval {
                component,
                axis,
                before,
                after,
            } => Self::SetComponentInterval {
                component,
                axis,
                before: after,
                after: before,
            },
            Self::RegisterComponent { component } => Self::UnregisterComponent { component },
            Self::UnregisterComponent { component } => Self::RegisterComponent { component },
            Self::SetMembership {
                component,
                before,
                after,
            } => Self::SetMembership {
                component,
                before: after,
                after: before,
            },
        }
    }

    /// Stable short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CreateInterval { .. } => "create_interval",
            Self::DestroyInterval { .. } => "destroy_interval",
            Self::Attach { .. } => "attach",
            Self::Detach { .. } => "detach",
            Self::SetSizes { .. } => "set_sizes",
            Self::SetAlignment { .. } => "set_alignment",
            Self::SetGroupAlignment { .. } => "set_group_alignment",
            Self::SetGapPadding { .. } => "set_gap_padding",
            Self::SetExplicitSize { .. } => "set_explicit_size",
            Self::SetComponentInterval { .. } => "set_component_interval",
            Self::RegisterComponent { .. } => "register_component",
            Self::UnregisterComponent { .. } => "unregister_component",
            Self::SetMembership { .. } => "set_membership",
        }
    }
}

/// Recorded changes plus the redo stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ChangeLog {
    pub(crate) recording: bool,
    pub(crate) entries: Vec<Change>,
    pub(crate) redo: Vec<Vec<Change>>,
}

impl ChangeLog {
    pub(crate) fn mark(&self) -> ChangeMark {
        ChangeMark(self.entries.len())
    }

    pub(crate) fn record(&mut self, change: Change) {
        if self.recording {
            // A fresh edit drops the redo stack.
            self.redo.clear();
            self.entries.push(change);
        }
    }

    /// Split off the trailing entries `[from, to)` for reverting. `to` must
    /// be the end of the log.
    pub(crate) fn take_range(&mut self, from: usize, to: usize) -> Option<Vec<Change>> {
        if from > to || to != self.entries.len() {
            return None;
        }
        Some(self.entries.split_off(from))
    }
}
