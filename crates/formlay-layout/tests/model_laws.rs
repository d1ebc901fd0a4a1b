//! Model-level laws: solving the text-field form, journaled undo/redo over
//! random edit streams, snapshot round-trips and slack distribution.
//!
//! Run with: `cargo test -p formlay-layout --test model_laws -- --nocapture`

use formlay_core::{Alignment, Axis, ComponentId, Rect};
use formlay_harness::fixtures::{FORM, LABEL, TEXT_FIELD, text_field_model, text_field_oracle};
use formlay_layout::{LayoutModel, PaddingDefaults, ResolvedSize, distribute, solve};
use proptest::prelude::*;

fn cid(raw: &str) -> ComponentId {
    ComponentId::new(raw)
}

fn solved_bounds(model: &LayoutModel, id: &str) -> Rect {
    let oracle = text_field_oracle();
    let solved = solve(model, &oracle, PaddingDefaults::default(), &cid(FORM)).expect("solve");
    solved.bounds[&cid(id)]
}

// ===========================================================================
// Solver
// ===========================================================================

#[test]
fn text_field_form_solves_to_designed_bounds() {
    let model = text_field_model().expect("fixture");
    let oracle = text_field_oracle();
    let solved = solve(&model, &oracle, PaddingDefaults::default(), &cid(FORM)).expect("solve");
    assert_eq!(solved.bounds[&cid(TEXT_FIELD)], Rect::new(48, 11, 59, 20));
    assert_eq!(solved.bounds[&cid(LABEL)], Rect::new(48, 37, 34, 14));
    assert_eq!(solved.interior, Rect::from_size(400, 300));
    assert!(solved.preferred.width >= 107 && solved.preferred.height >= 51);
}

#[test]
fn pinned_height_pushes_the_label_down() {
    let mut model = text_field_model().expect("fixture");
    let field = model
        .component_interval(&cid(TEXT_FIELD), Axis::Vertical)
        .expect("interval");
    model
        .set_user_interval_size(field, Axis::Vertical, Some(55), true)
        .expect("resize");
    assert!(model.has_explicit_size(&cid(TEXT_FIELD), Axis::Vertical).expect("flag"));
    assert_eq!(solved_bounds(&model, TEXT_FIELD), Rect::new(48, 11, 59, 55));
    assert_eq!(solved_bounds(&model, LABEL), Rect::new(48, 72, 34, 14));
    // Built spans follow the new extent without a solve.
    let label = model
        .component_interval(&cid(LABEL), Axis::Vertical)
        .expect("interval");
    assert_eq!(model.current(label).map(|s| s.start), Some(72));

    model
        .set_user_interval_size(field, Axis::Vertical, None, false)
        .expect("reset");
    assert!(!model.has_explicit_size(&cid(TEXT_FIELD), Axis::Vertical).expect("flag"));
    assert_eq!(solved_bounds(&model, LABEL), Rect::new(48, 37, 34, 14));
}

#[test]
fn trailing_alignment_moves_the_label_to_the_column_end() {
    let mut model = text_field_model().expect("fixture");
    model
        .adjust_component_alignment(&cid(LABEL), Axis::Horizontal, Alignment::Trailing)
        .expect("align");
    assert_eq!(solved_bounds(&model, LABEL), Rect::new(73, 37, 34, 14));
    assert!(
        model
            .adjust_component_alignment(&cid(LABEL), Axis::Vertical, Alignment::Center)
            .is_err(),
        "vertical parent is a sequence"
    );
}

// ===========================================================================
// Journal
// ===========================================================================

#[derive(Debug, Clone)]
enum Edit {
    Remove { field: bool, close_gap: bool },
    Resize { field: bool, vertical: bool, size: i32, pin: bool },
    Reset { field: bool, vertical: bool },
    Align { alignment: Alignment },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<bool>(), any::<bool>()).prop_map(|(field, close_gap)| Edit::Remove { field, close_gap }),
        (any::<bool>(), any::<bool>(), 4..90i32, any::<bool>())
            .prop_map(|(field, vertical, size, pin)| Edit::Resize { field, vertical, size, pin }),
        (any::<bool>(), any::<bool>()).prop_map(|(field, vertical)| Edit::Reset { field, vertical }),
        prop_oneof![
            Just(Alignment::Leading),
            Just(Alignment::Trailing),
            Just(Alignment::Center),
        ]
        .prop_map(|alignment| Edit::Align { alignment }),
    ]
}

const fn target(field: bool) -> &'static str {
    if field { TEXT_FIELD } else { LABEL }
}

const fn axis(vertical: bool) -> Axis {
    if vertical { Axis::Vertical } else { Axis::Horizontal }
}

/// Apply an edit, skipping ones whose target is gone. Rejected edits must
/// leave the model untouched, so their errors are ignored.
fn apply_edit(model: &mut LayoutModel, edit: &Edit) {
    match edit {
        Edit::Remove { field, close_gap } => {
            let _ = model.remove_component(&cid(target(*field)), *close_gap);
        }
        Edit::Resize { field, vertical, size, pin } => {
            if let Ok(id) = model.component_interval(&cid(target(*field)), axis(*vertical)) {
                let _ = model.set_user_interval_size(id, axis(*vertical), Some(*size), *pin);
            }
        }
        Edit::Reset { field, vertical } => {
            if let Ok(id) = model.component_interval(&cid(target(*field)), axis(*vertical)) {
                let _ = model.set_user_interval_size(id, axis(*vertical), None, false);
            }
        }
        Edit::Align { alignment } => {
            let _ = model.adjust_component_alignment(&cid(LABEL), Axis::Horizontal, *alignment);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn undo_reverts_any_edit_stream(edits in prop::collection::vec(edit_strategy(), 1..12)) {
        let mut model = text_field_model().expect("fixture");
        model.set_change_recording(true);
        let before = model.dump(None);
        let from = model.change_mark();
        for edit in &edits {
            apply_edit(&mut model, edit);
            prop_assert!(model.validate().is_clean(), "{edit:?}: {:?}", model.validate());
        }
        let after = model.dump(None);
        let to = model.change_mark();

        let reverted = model.undo(from, to).expect("undo");
        prop_assert_eq!(reverted, from != to);
        prop_assert_eq!(model.dump(None), before);
        if reverted {
            model.redo().expect("redo");
            prop_assert_eq!(model.dump(None), after);
        }
    }

    #[test]
    fn snapshot_restore_is_dump_equal(edits in prop::collection::vec(edit_strategy(), 0..8)) {
        let mut model = text_field_model().expect("fixture");
        let snapshot = model.snapshot();
        let before = model.dump(None);
        let hash = model.state_hash();
        for edit in &edits {
            apply_edit(&mut model, edit);
        }
        model.restore(snapshot);
        prop_assert_eq!(model.dump(None), before);
        prop_assert_eq!(model.state_hash(), hash);
    }

    #[test]
    fn distribute_fills_the_total_within_bounds(
        raw in prop::collection::vec((0..40i32, 0..40i32, 0..80i32), 1..8),
        total in 0..600i32,
    ) {
        let sizes: Vec<ResolvedSize> = raw
            .iter()
            .map(|(min, extra, room)| ResolvedSize { min: *min, pref: min + extra, max: min + extra + room })
            .collect();
        let lengths = distribute(&sizes, total);
        prop_assert_eq!(lengths.len(), sizes.len());
        for (len, size) in lengths.iter().zip(&sizes) {
            prop_assert!(size.min <= *len && *len <= size.max, "{len} outside {size:?}");
        }
        let min_sum: i32 = sizes.iter().map(|s| s.min).sum();
        let max_sum: i32 = sizes.iter().map(|s| s.max).sum();
        let sum: i32 = lengths.iter().sum();
        prop_assert_eq!(sum, total.clamp(min_sum, max_sum));
    }
}

#[test]
fn undo_with_unknown_marks_is_rejected() {
    let mut model = text_field_model().expect("fixture");
    model.set_change_recording(true);
    let start = model.change_mark();
    model.remove_component(&cid(LABEL), true).expect("remove");
    let end = model.change_mark();
    assert!(model.undo(end, start).is_err());
    assert!(model.redo().is_err(), "nothing undone yet");
    assert!(model.undo(start, end).expect("undo"));
    assert!(model.contains_component(&cid(LABEL)));
    assert!(!model.undo(start, start).expect("empty range"));
}

#[test]
fn undo_only_unwinds_from_the_newest_change() {
    let mut model = text_field_model().expect("fixture");
    model.set_change_recording(true);
    let field = model
        .component_interval(&cid(TEXT_FIELD), Axis::Vertical)
        .expect("field");
    let label = model
        .component_interval(&cid(LABEL), Axis::Vertical)
        .expect("label");
    let m1 = model.change_mark();
    let initial = model.dump(None);
    model
        .set_user_interval_size(field, Axis::Vertical, Some(55), true)
        .expect("pin field");
    let m2 = model.change_mark();
    let field_pinned = model.dump(None);
    model
        .set_user_interval_size(label, Axis::Vertical, Some(30), true)
        .expect("pin label");
    let m3 = model.change_mark();
    let both_pinned = model.dump(None);

    // An older batch cannot be reverted while a newer one is applied.
    assert!(model.undo(m1, m2).is_err());
    assert_eq!(model.dump(None), both_pinned);
    assert_eq!(model.change_mark(), m3);

    assert!(model.undo(m2, m3).expect("undo label"));
    assert_eq!(model.dump(None), field_pinned);
    assert!(model.undo(m1, m2).expect("undo field"));
    assert_eq!(model.dump(None), initial);
    assert!(!model.has_explicit_size(&cid(LABEL), Axis::Vertical).expect("label"));
}

#[test]
fn recorded_changes_serialize_with_kind_tags() {
    let mut model = text_field_model().expect("fixture");
    model.set_change_recording(true);
    let start = model.change_mark();
    model.remove_component(&cid(LABEL), false).expect("remove");
    let changes = model.changes_since(start).to_vec();
    assert!(!changes.is_empty());

    let json = serde_json::to_string(&changes).expect("serialize");
    assert!(json.contains("\"change\":\"unregister_component\""), "{json}");
    let back: Vec<formlay_layout::Change> = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, changes);
}
