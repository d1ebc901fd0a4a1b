#![forbid(unsafe_code)]

//! Explicit-size reconciliation after the host changed sizes on its own.
//!
//! A component whose natural size changed must not push its neighbors
//! around. Its growth is taken first from the slack of resizing siblings in
//! the enclosing sequences, then by shrinking those siblings below their
//! default size (which pins them explicit), and only then by growing the
//! container.

use std::collections::BTreeMap;

use formlay_core::{Axis, ComponentId, GeometryOracle, Rect, debug, debug_span};
use formlay_layout::{
    IntervalId, IntervalKind, LayoutError, LayoutModel, SizeDef, SizeResolver,
};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::DesignerConfig;
use crate::optimize::{demote_explicit, subtree};

/// Outcome of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Whether the model changed.
    pub changed: bool,
    /// Siblings pinned to an explicit size to absorb growth.
    pub pinned: Vec<(ComponentId, Axis)>,
    /// Explicit sizes returned to default.
    pub demoted: usize,
    /// Growth that no sibling could absorb.
    pub preferred_size_changed: bool,
}

/// A pending shrink of one resizing sibling.
struct Shrink {
    interval: IntervalId,
    component: Option<ComponentId>,
    size: i32,
}

/// Reconcile one container against the oracle's current geometry.
pub fn reconcile(
    model: &mut LayoutModel,
    oracle: &dyn GeometryOracle,
    config: &DesignerConfig,
    container: &ComponentId,
) -> Result<ReconcileReport, LayoutError> {
    let _span = debug_span!("reconcile", container = %container).entered();
    let start = model.revision();
    sync_from_oracle(model, oracle, container)?;

    let mut report = ReconcileReport::default();
    for axis in Axis::ALL {
        let shrinks = plan_axis(model, oracle, config, container, axis, &mut report)?;
        for shrink in shrinks {
            let sizes = model.interval(shrink.interval)?.sizes;
            model.set_sizes(shrink.interval, sizes.with_pref(SizeDef::Px(shrink.size)))?;
            if let Some(component) = shrink.component {
                model.set_explicit_size(&component, axis, true)?;
                report.pinned.push((component, axis));
            }
        }
    }
    report.demoted = demote_explicit(model, oracle, config, container)?;
    report.changed = model.revision() != start;
    debug!(
        changed = report.changed,
        pinned = report.pinned.len(),
        demoted = report.demoted,
        grow = report.preferred_size_changed,
        "reconciled"
    );
    Ok(report)
}

/// Refresh built spans from the host's bounds.
pub(crate) fn sync_from_oracle(
    model: &mut LayoutModel,
    oracle: &dyn GeometryOracle,
    container: &ComponentId,
) -> Result<(), LayoutError> {
    let members = model.layout_component(container)?.sub_components.clone();
    let bounds: BTreeMap<ComponentId, Rect> = members
        .into_iter()
        .filter_map(|m| oracle.component_bounds(&m).map(|r| (m, r)))
        .collect();
    let interior = oracle
        .container_interior(container)
        .or_else(|| bounds.values().copied().reduce(|a, b| a.union(&b)))
        .unwrap_or_default();
    model.sync_spans(container, interior, &bounds)
}

fn plan_axis(
    model: &LayoutModel,
    oracle: &dyn GeometryOracle,
    config: &DesignerConfig,
    container: &ComponentId,
    axis: Axis,
    report: &mut ReconcileReport,
) -> Result<Vec<Shrink>, LayoutError> {
    let root = model.root(container, axis)?;
    let mut resolver = SizeResolver::new(model, oracle, config.padding, container, axis);
    let mut free: FxHashMap<IntervalId, i32> = FxHashMap::default();
    let mut shrunk: FxHashMap<IntervalId, i32> = FxHashMap::default();
    let mut shrinks = Vec::new();

    for id in subtree(model, root) {
        let Some(record) = model.get(id) else {
            continue;
        };
        let IntervalKind::Single { component } = &record.kind else {
            continue;
        };
        if record.is_resizing() || model.has_explicit_size(component, axis)? {
            continue;
        }
        let (Some(preferred), Some(built)) =
            (resolver.component_preferred(component), model.current(id))
        else {
            continue;
        };
        let mut growth = preferred - built.len();
        if growth <= 0 {
            continue;
        }

        let siblings = resizing_siblings(model, id);
        for sibling in &siblings {
            let slack = match free.get(sibling) {
                Some(slack) => *slack,
                None => {
                    let len = model.current(*sibling).map_or(0, |s| s.len());
                    (len - resolver.resolve(*sibling).pref).max(0)
                }
            };
            let take = slack.min(growth);
            let _ = free.insert(*sibling, slack - take);
            growth -= take;
            if growth == 0 {
                break;
            }
        }

        for sibling in &siblings {
            if growth == 0 {
                break;
            }
            let Some(sibling_record) = model.get(*sibling) else {
                continue;
            };
            if sibling_record.is_group() {
                continue;
            }
            let current = match shrunk.get(sibling) {
                Some(size) => *size,
                None => {
                    let len = model.current(*sibling).map_or(0, |s| s.len());
                    len.min(resolver.resolve(*sibling).pref)
                }
            };
            let floor = sibling_record
                .component()
                .and_then(|c| oracle.component_minimum_size(c))
                .map_or(0, |size| size.along(axis).max(0));
            let take = (current - floor).max(0).min(growth);
            if take == 0 {
                continue;
            }
            growth -= take;
            let _ = shrunk.insert(*sibling, current - take);
        }
        if growth > 0 {
            report.preferred_size_changed = true;
        }
    }

    for (interval, size) in shrunk {
        let component = model.get(interval).and_then(|r| r.component().cloned());
        shrinks.push(Shrink {
            interval,
            component,
            size,
        });
    }
    shrinks.sort_by_key(|s| s.interval);
    Ok(shrinks)
}

/// Resizing intervals sharing an enclosing sequence with `id`, nearest
/// sequence first.
fn resizing_siblings(model: &LayoutModel, id: IntervalId) -> Vec<IntervalId> {
    let mut out = Vec::new();
    let mut cur = id;
    while let Some(parent) = model.parent(cur) {
        if model.get(parent).is_some_and(|r| r.is_sequential()) {
            out.extend(
                model
                    .children(parent)
                    .iter()
                    .copied()
                    .filter(|c| *c != cur && model.contains_resizing(*c)),
            );
        }
        cur = parent;
    }
    out
}

#[cfg(test)]
mod tests {
    use formlay_core::{Alignment, Size};
    use formlay_layout::IntervalSizes;

    use super::*;
    use crate::test_support::StubOracle;

    fn cid(raw: &str) -> ComponentId {
        ComponentId::new(raw)
    }

    /// `[gap, label, gap, field(resizing), gap]` across a 200 px form.
    fn label_and_field() -> (LayoutModel, StubOracle) {
        let mut model = LayoutModel::new();
        let form = cid("Form");
        model.add_container(&form, None).expect("form");
        let root = model.root(&form, Axis::Horizontal).expect("root");
        let seq = model
            .new_group(IntervalKind::sequential(), Alignment::Leading)
            .expect("seq");
        model.attach(seq, root, 0).expect("seq");
        for (index, item) in [None, Some("label"), None, Some("field"), None]
            .into_iter()
            .enumerate()
        {
            let id = match item {
                Some(name) => {
                    model.add_component(&cid(name), &form).expect("register");
                    let sizes = if name == "field" {
                        IntervalSizes::resizing()
                    } else {
                        IntervalSizes::DEFAULT
                    };
                    model
                        .new_single(&cid(name), Axis::Horizontal, sizes, None)
                        .expect("single")
                }
                None => model.new_gap(IntervalSizes::DEFAULT, None, None).expect("gap"),
            };
            model.attach(id, seq, index).expect("attach");
        }
        let mut oracle = StubOracle::default()
            .with_component("label", Rect::new(10, 0, 40, 20))
            .with_component("field", Rect::new(56, 0, 134, 20));
        let _ = oracle.preferred.insert(cid("field"), Size::new(100, 20));
        oracle.interior = Some(Rect::new(0, 0, 200, 40));
        (model, oracle)
    }

    #[test]
    fn growth_within_slack_is_absorbed() {
        let (mut model, mut oracle) = label_and_field();
        let _ = oracle.preferred.insert(cid("label"), Size::new(60, 20));
        let report = reconcile(&mut model, &oracle, &DesignerConfig::default(), &cid("Form"))
            .expect("reconcile");
        assert!(!report.changed);
        assert!(report.pinned.is_empty());
        assert!(!report.preferred_size_changed);
    }

    #[test]
    fn growth_beyond_slack_pins_the_sibling() {
        let (mut model, mut oracle) = label_and_field();
        let _ = oracle.preferred.insert(cid("label"), Size::new(90, 20));
        let config = DesignerConfig::default();
        let report = reconcile(&mut model, &oracle, &config, &cid("Form")).expect("reconcile");
        assert!(report.changed);
        assert_eq!(report.pinned, vec![(cid("field"), Axis::Horizontal)]);
        let field = model
            .component_interval(&cid("field"), Axis::Horizontal)
            .expect("field");
        assert_eq!(model.interval(field).expect("field").sizes.pref, SizeDef::Px(84));
        assert!(model.has_explicit_size(&cid("field"), Axis::Horizontal).expect("field"));

        let again = reconcile(&mut model, &oracle, &config, &cid("Form")).expect("again");
        assert!(!again.changed);
    }

    #[test]
    fn growth_nothing_can_absorb_grows_the_container() {
        let (mut model, mut oracle) = label_and_field();
        let _ = oracle.preferred.insert(cid("label"), Size::new(300, 20));
        let report = reconcile(&mut model, &oracle, &DesignerConfig::default(), &cid("Form"))
            .expect("reconcile");
        assert!(report.preferred_size_changed);
    }
}
