#![forbid(unsafe_code)]

//! Commit-time normalization of a container's trees.
//!
//! Placement leaves explicit pixel gaps, transient single-child groups and
//! competing resizing gaps behind. [`optimize`] repeats its passes until the
//! model stops changing, so running it twice is a no-op.

use formlay_core::{Alignment, Axis, ComponentId, GeometryOracle, debug, debug_span};
use formlay_layout::{
    IntervalId, IntervalKind, IntervalSizes, LayoutError, LayoutModel, SizeDef, SizeResolver,
};

use crate::config::DesignerConfig;

/// Upper bound on normalization rounds.
const MAX_PASSES: usize = 8;

/// Normalize both trees of a container. Returns whether anything changed.
pub fn optimize(
    model: &mut LayoutModel,
    oracle: &dyn GeometryOracle,
    config: &DesignerConfig,
    container: &ComponentId,
) -> Result<bool, LayoutError> {
    let _span = debug_span!("optimize", container = %container).entered();
    let start = model.revision();
    let mut passes = 0;
    while passes < MAX_PASSES {
        passes += 1;
        let before = model.revision();
        for axis in Axis::ALL {
            let root = model.root(container, axis)?;
            normalize_structure(model, root)?;
            normalize_resizing(model, root)?;
        }
        normalize_baselines(model, oracle, config, container)?;
        demote_explicit(model, oracle, config, container)?;
        if model.revision() == before {
            break;
        }
    }
    debug!(passes, changed = model.revision() != start, "optimize done");
    Ok(model.revision() != start)
}

/// Intervals of a subtree in pre-order.
pub(crate) fn subtree(model: &LayoutModel, root: IntervalId) -> Vec<IntervalId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        out.push(id);
        stack.extend(model.children(id).iter().rev());
    }
    out
}

/// Merge gap chains, drop empty fixed gaps and dissolve degenerate groups,
/// bottom-up.
fn normalize_structure(model: &mut LayoutModel, id: IntervalId) -> Result<(), LayoutError> {
    for child in model.children(id).to_vec() {
        if model.get(child).is_some() {
            normalize_structure(model, child)?;
        }
    }
    let Some(record) = model.get(id).cloned() else {
        return Ok(());
    };
    if record.is_sequential() {
        let _ = model.merge_adjacent_gaps(id)?;
        let empty: Vec<IntervalId> = model
            .children(id)
            .iter()
            .copied()
            .filter(|c| {
                model.get(*c).is_some_and(|r| {
                    r.is_gap() && !r.is_resizing() && r.sizes.pref == SizeDef::Px(0)
                })
            })
            .collect();
        for gap in empty {
            model.destroy_subtree(gap)?;
        }
    }
    if record.is_group() {
        let _ = model.dissolve_if_degenerate(id)?;
    }
    Ok(())
}

/// At most one resizing gap per sequence, none when the content resizes.
fn normalize_resizing(model: &mut LayoutModel, id: IntervalId) -> Result<(), LayoutError> {
    for child in model.children(id).to_vec() {
        normalize_resizing(model, child)?;
    }
    if !model.get(id).is_some_and(|r| r.is_sequential()) {
        return Ok(());
    }
    let children = model.children(id).to_vec();
    let content_resizes = children
        .iter()
        .any(|c| !model.is_gap(*c) && model.content_resizing(*c));
    let resizing_gaps: Vec<IntervalId> = children
        .into_iter()
        .filter(|c| model.is_gap(*c) && model.get(*c).is_some_and(|r| r.is_resizing()))
        .collect();
    let keep = if content_resizes {
        None
    } else {
        resizing_gaps.last().copied()
    };
    for gap in resizing_gaps {
        if Some(gap) != keep {
            let sizes = model.interval(gap)?.sizes;
            model.set_sizes(gap, sizes.with_resizing(false))?;
        }
    }
    Ok(())
}

/// Vertical parallel groups align on the baseline exactly when at least two
/// of their baseline-aligned members expose one.
fn normalize_baselines(
    model: &mut LayoutModel,
    oracle: &dyn GeometryOracle,
    config: &DesignerConfig,
    container: &ComponentId,
) -> Result<(), LayoutError> {
    let root = model.root(container, Axis::Vertical)?;
    let mut promote = Vec::new();
    let mut demote = Vec::new();
    {
        let mut resolver =
            SizeResolver::new(model, oracle, config.padding, container, Axis::Vertical);
        for id in subtree(model, root) {
            let Some(record) = model.get(id) else {
                continue;
            };
            let IntervalKind::Parallel {
                group_alignment, ..
            } = &record.kind
            else {
                continue;
            };
            let members = resolver.baseline_members(id);
            if members.is_empty() {
                let stray: Vec<IntervalId> = model
                    .children(id)
                    .iter()
                    .copied()
                    .filter(|c| model.get(*c).is_some_and(|r| r.alignment == Alignment::Baseline))
                    .collect();
                if *group_alignment == Alignment::Baseline || !stray.is_empty() {
                    demote.push((id, stray));
                }
            } else if *group_alignment != Alignment::Baseline {
                promote.push(id);
            }
        }
    }
    for id in promote {
        model.set_group_alignment(id, Alignment::Baseline)?;
    }
    for (id, stray) in demote {
        if model.parent(id).is_some() {
            model.set_group_alignment(id, Alignment::Leading)?;
        }
        for child in stray {
            model.set_alignment(child, Alignment::Leading)?;
        }
    }
    Ok(())
}

/// Return explicit pixel sizes that equal their default to default.
pub(crate) fn demote_explicit(
    model: &mut LayoutModel,
    oracle: &dyn GeometryOracle,
    config: &DesignerConfig,
    container: &ComponentId,
) -> Result<usize, LayoutError> {
    let tolerance = config.size_tolerance;
    let mut demoted = 0;
    for axis in Axis::ALL {
        let root = model.root(container, axis)?;
        let mut gaps = Vec::new();
        let mut components = Vec::new();
        {
            let resolver = SizeResolver::new(model, oracle, config.padding, container, axis);
            for id in subtree(model, root) {
                let Some(record) = model.get(id) else {
                    continue;
                };
                let Some(px) = record.sizes.pref.px() else {
                    continue;
                };
                match &record.kind {
                    IntervalKind::Gap { .. } => {
                        if (px - resolver.default_gap_size(id)).abs() <= tolerance {
                            gaps.push(id);
                        }
                    }
                    IntervalKind::Single { component } => {
                        if resolver
                            .component_preferred(component)
                            .is_some_and(|pref| (px - pref).abs() <= tolerance)
                        {
                            components.push((id, component.clone()));
                        }
                    }
                    _ => {}
                }
            }
        }
        for gap in gaps {
            let sizes = model.interval(gap)?.sizes;
            model.set_sizes(gap, sizes.with_pref(SizeDef::NotDefined))?;
            demoted += 1;
        }
        for (id, component) in components {
            let sizes = model.interval(id)?.sizes;
            model.set_sizes(id, sizes.with_pref(SizeDef::NotDefined))?;
            model.set_explicit_size(&component, axis, false)?;
            demoted += 1;
        }
    }
    Ok(demoted)
}

/// Sizes of a fixed gap with the given pixel size, or of a default gap.
pub(crate) const fn gap_sizes(px: Option<i32>, resizing: bool) -> IntervalSizes {
    let pref = match px {
        Some(px) => SizeDef::Px(px),
        None => SizeDef::NotDefined,
    };
    IntervalSizes::new(SizeDef::NotDefined, pref, SizeDef::NotDefined).with_resizing(resizing)
}
