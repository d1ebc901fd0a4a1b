#![forbid(unsafe_code)]

//! Ready-made forms shared by tests and benches.

use formlay_core::{Alignment, Axis, ComponentId, Edge, PaddingType, Rect, Span};
use formlay_layout::{IntervalId, IntervalKind, IntervalSizes, LayoutError, LayoutModel};

use crate::oracle::{BaselineRule, ScriptedOracle};

pub const FORM: &str = "Form";
pub const TEXT_FIELD: &str = "jTextField1";
pub const LABEL: &str = "jLabel2";

/// Oracle data of the text-field form: a 400x300 form holding a text field
/// with a label below it.
#[must_use]
pub fn text_field_oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .with_container(FORM, Rect::from_size(400, 300))
        .with_component(TEXT_FIELD, Rect::new(48, 11, 59, 20))
        .with_baseline(
            TEXT_FIELD,
            BaselineRule::Centered {
                reference_height: 20,
                baseline: 14,
            },
        )
        .with_component(LABEL, Rect::new(48, 37, 34, 14))
        .with_baseline(LABEL, BaselineRule::Fixed(11))
        .with_uniform_padding_in_parent(FORM, TEXT_FIELD, 11)
        .with_uniform_padding_in_parent(FORM, LABEL, 11)
        .with_padding(TEXT_FIELD, LABEL, Axis::Vertical, Edge::Trailing, PaddingType::Related, 6)
}

/// The text-field form as loaded from a saved layout.
///
/// Horizontally both components share a leading-aligned parallel group
/// behind a 48px gap; vertically they are stacked with default gaps and a
/// resizing gap at the bottom.
pub fn text_field_model() -> Result<LayoutModel, LayoutError> {
    let mut model = LayoutModel::new();
    let form = ComponentId::new(FORM);
    let field = ComponentId::new(TEXT_FIELD);
    let label = ComponentId::new(LABEL);
    model.add_container(&form, None)?;
    model.add_component(&field, &form)?;
    model.add_component(&label, &form)?;

    let seq = sequence_in_root(&mut model, &form, Axis::Horizontal)?;
    let gap = model.new_gap(IntervalSizes::fixed(48), None, Some(Span::new(0, 48)))?;
    model.attach(gap, seq, 0)?;
    let column = model.new_group(IntervalKind::parallel(), Alignment::Leading)?;
    model.attach(column, seq, 1)?;
    for (index, (id, span)) in [(&field, Span::new(48, 107)), (&label, Span::new(48, 82))]
        .into_iter()
        .enumerate()
    {
        let single = model.new_single(id, Axis::Horizontal, IntervalSizes::DEFAULT, Some(span))?;
        model.attach(single, column, index)?;
    }
    let gap = model.new_gap(IntervalSizes::resizing(), None, Some(Span::new(107, 400)))?;
    model.attach(gap, seq, 2)?;

    let seq = sequence_in_root(&mut model, &form, Axis::Vertical)?;
    let items = [
        model.new_gap(IntervalSizes::DEFAULT, None, Some(Span::new(0, 11)))?,
        model.new_single(&field, Axis::Vertical, IntervalSizes::DEFAULT, Some(Span::new(11, 31)))?,
        model.new_gap(IntervalSizes::DEFAULT, None, Some(Span::new(31, 37)))?,
        model.new_single(&label, Axis::Vertical, IntervalSizes::DEFAULT, Some(Span::new(37, 51)))?,
        model.new_gap(IntervalSizes::resizing(), None, Some(Span::new(51, 300)))?,
    ];
    for (index, item) in items.into_iter().enumerate() {
        model.attach(item, seq, index)?;
    }
    Ok(model)
}

fn sequence_in_root(
    model: &mut LayoutModel,
    container: &ComponentId,
    axis: Axis,
) -> Result<IntervalId, LayoutError> {
    let root = model.root(container, axis)?;
    let seq = model.new_group(IntervalKind::sequential(), Alignment::Leading)?;
    model.attach(seq, root, 0)?;
    Ok(seq)
}

/// Component ids `c0..cN` laid out on a grid of `columns`, 60x20 each, for
/// randomized and bench runs.
#[must_use]
pub fn grid_oracle(count: usize, columns: usize) -> (ScriptedOracle, Vec<(ComponentId, Rect)>) {
    let mut oracle = ScriptedOracle::new().with_container(FORM, Rect::from_size(800, 600));
    let mut placed = Vec::with_capacity(count);
    let columns = columns.max(1);
    for index in 0..count {
        let name = format!("c{index}");
        let col = (index % columns) as i32;
        let row = (index / columns) as i32;
        let rect = Rect::new(12 + col * 72, 12 + row * 32, 60, 20);
        oracle = oracle
            .with_component(&name, rect)
            .with_baseline(&name, BaselineRule::Fixed(14));
        placed.push((ComponentId::new(name), rect));
    }
    (oracle, placed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_field_model_is_valid() {
        let model = text_field_model().expect("model");
        assert!(model.validate().is_clean(), "{:?}", model.validate());
        let form = ComponentId::new(FORM);
        let root = model.root(&form, Axis::Vertical).expect("root");
        let seq = model.children(root)[0];
        assert_eq!(model.children(seq).len(), 5);
    }

    #[test]
    fn grid_positions_do_not_overlap() {
        let (_, placed) = grid_oracle(7, 3);
        for (i, (_, a)) in placed.iter().enumerate() {
            for (_, b) in &placed[i + 1..] {
                let h = a.span(Axis::Horizontal).overlap(&b.span(Axis::Horizontal));
                let v = a.span(Axis::Vertical).overlap(&b.span(Axis::Vertical));
                assert!(h <= 0 || v <= 0);
            }
        }
    }
}
