#![forbid(unsafe_code)]

//! Structural invariant report over the whole model.

use std::collections::BTreeSet;

use formlay_core::{Axis, ComponentId};
use serde::{Deserialize, Serialize};

use crate::interval::{IntervalId, IntervalKind, IntervalRecord};
use crate::model::LayoutModel;

/// Stable code for invariant findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvariantCode {
    MissingChild,
    ParentMismatch,
    MultipleParents,
    OrphanInterval,
    DegenerateParallel,
    EmptySequence,
    NestedSequence,
    AdjacentGaps,
    DanglingComponentInterval,
    ComponentIntervalMismatch,
    UnknownComponent,
    MembershipMismatch,
}

/// One invariant finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantIssue {
    pub code: InvariantCode,
    pub interval: Option<IntervalId>,
    pub component: Option<ComponentId>,
    pub message: String,
}

/// Result of [`LayoutModel::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvariantReport {
    pub state_hash: u64,
    pub issues: Vec<InvariantIssue>,
}

impl InvariantReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<InvariantCode> {
        self.issues.iter().map(|issue| issue.code).collect()
    }
}

fn push_issue(
    issues: &mut Vec<InvariantIssue>,
    code: InvariantCode,
    interval: Option<IntervalId>,
    component: Option<&ComponentId>,
    message: impl Into<String>,
) {
    issues.push(InvariantIssue {
        code,
        interval,
        component: component.cloned(),
        message: message.into(),
    });
}

impl LayoutModel {
    /// Check parent/child agreement, group shape and the component cross
    /// references. Roots may hold any number of children.
    #[must_use]
    pub fn validate(&self) -> InvariantReport {
        let mut issues = Vec::new();
        let mut claimed: BTreeSet<IntervalId> = BTreeSet::new();

        for record in self.intervals() {
            for child in record.children() {
                match self.get(*child) {
                    None => push_issue(
                        &mut issues,
                        InvariantCode::MissingChild,
                        Some(record.id),
                        None,
                        format!("child {} of {} does not exist", child.get(), record.id.get()),
                    ),
                    Some(child_record) if child_record.parent != Some(record.id) => push_issue(
                        &mut issues,
                        InvariantCode::ParentMismatch,
                        Some(*child),
                        None,
                        format!("{} listed under {} but points elsewhere", child.get(), record.id.get()),
                    ),
                    Some(_) => {}
                }
                if !claimed.insert(*child) {
                    push_issue(
                        &mut issues,
                        InvariantCode::MultipleParents,
                        Some(*child),
                        None,
                        format!("{} has more than one parent", child.get()),
                    );
                }
            }
            if let Some(parent) = record.parent
                && !self.children(parent).contains(&record.id)
            {
                push_issue(
                    &mut issues,
                    InvariantCode::OrphanInterval,
                    Some(record.id),
                    None,
                    format!("{} not listed by its parent {}", record.id.get(), parent.get()),
                );
            }
            let is_root = record.parent.is_none();
            match &record.kind {
                IntervalKind::Parallel { children, .. } if !is_root && children.len() < 2 => {
                    push_issue(
                        &mut issues,
                        InvariantCode::DegenerateParallel,
                        Some(record.id),
                        None,
                        format!("parallel group with {} children", children.len()),
                    );
                }
                IntervalKind::Sequential { children } => {
                    if children.iter().all(|c| self.is_gap(*c)) {
                        push_issue(
                            &mut issues,
                            InvariantCode::EmptySequence,
                            Some(record.id),
                            None,
                            "sequence without content",
                        );
                    }
                    if record
                        .parent
                        .and_then(|p| self.get(p))
                        .is_some_and(IntervalRecord::is_sequential)
                    {
                        push_issue(
                            &mut issues,
                            InvariantCode::NestedSequence,
                            Some(record.id),
                            None,
                            "sequence directly inside a sequence",
                        );
                    }
                    if children.windows(2).any(|w| self.is_gap(w[0]) && self.is_gap(w[1])) {
                        push_issue(
                            &mut issues,
                            InvariantCode::AdjacentGaps,
                            Some(record.id),
                            None,
                            "unmerged adjacent gaps",
                        );
                    }
                }
                _ => {}
            }
            if let IntervalKind::Single { component } = &record.kind {
                let linked = self.layout_component(component).ok().is_some_and(|c| {
                    Axis::ALL
                        .into_iter()
                        .any(|axis| c.interval(axis) == Some(record.id))
                });
                if !linked {
                    push_issue(
                        &mut issues,
                        InvariantCode::ComponentIntervalMismatch,
                        Some(record.id),
                        Some(component),
                        "single interval not linked from its component",
                    );
                }
            }
        }

        for component in self.components() {
            for axis in Axis::ALL {
                let Some(interval) = component.interval(axis) else {
                    continue;
                };
                match self.get(interval).and_then(|r| r.component()) {
                    Some(owner) if *owner == component.id => {}
                    _ => push_issue(
                        &mut issues,
                        InvariantCode::DanglingComponentInterval,
                        Some(interval),
                        Some(&component.id),
                        format!("{} interval does not wrap the component", axis.as_str()),
                    ),
                }
            }
            if let Some(parent) = &component.parent {
                let listed = self
                    .layout_component(parent)
                    .ok()
                    .is_some_and(|p| p.sub_components.contains(&component.id));
                if !listed {
                    push_issue(
                        &mut issues,
                        InvariantCode::MembershipMismatch,
                        None,
                        Some(&component.id),
                        format!("not listed as a member of {parent}"),
                    );
                }
            }
            for member in &component.sub_components {
                if !self.contains_component(member) {
                    push_issue(
                        &mut issues,
                        InvariantCode::UnknownComponent,
                        None,
                        Some(member),
                        format!("member of {} is not registered", component.id),
                    );
                }
            }
        }

        InvariantReport {
            state_hash: self.state_hash(),
            issues,
        }
    }
}
