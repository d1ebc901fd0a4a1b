//! Property laws of designer sessions over randomized gesture streams.
//!
//! Gesture streams come from a seeded xorshift generator, so a failure
//! replays with `FORMLAY_TEST_SEED=<seed>`.
//!
//! Run with: `cargo test -p formlay-harness --test designer_laws -- --nocapture`

use formlay_core::{Alignment, Axis, ComponentId, Point, Rect, Span};
use formlay_designer::{DesignerConfig, DesignerState, LayoutDesigner};
use formlay_harness::fixtures::{FORM, grid_oracle};
use formlay_harness::{DeterminismFixture, ScriptedOracle, SimulatedHost, XorShift};
use formlay_layout::{IntervalKind, LayoutModel, SizeResolver, SolvedLayout, solve};
use proptest::prelude::*;

// ============================================================================
// Helpers
// ============================================================================

fn form() -> ComponentId {
    ComponentId::new(FORM)
}

/// A form holding `count` grid components, added one by one.
fn grid_host(count: usize) -> (SimulatedHost, Vec<(ComponentId, Rect)>) {
    let (oracle, placed) = grid_oracle(count, 3);
    let mut host = SimulatedHost::new(oracle, DesignerConfig::default()).expect("host");
    host.run(|d| d.add_container(&form(), None, None))
        .expect("form");
    for (id, rect) in &placed {
        host.run(|d| d.add_component(&form(), id, *rect))
            .expect("add grid component");
    }
    host.designer_mut()
        .model_mut()
        .expect("idle")
        .set_change_recording(true);
    (host, placed)
}

#[derive(Debug, Clone)]
struct Gesture {
    component: ComponentId,
    from: Rect,
    to: Rect,
    auto_positioning: bool,
}

impl Gesture {
    fn random(host: &SimulatedHost, placed: &[(ComponentId, Rect)], rng: &mut XorShift) -> Self {
        let index = rng.range(0, placed.len() as i32) as usize;
        let (component, fallback) = &placed[index];
        let from = host.bounds(component).unwrap_or(*fallback);
        let dx = rng.range(-10, 150);
        let dy = rng.range(-10, 120);
        let to = from.translated(dx, dy);
        let to = Rect::new(to.x.max(0), to.y.max(0), to.width, to.height);
        Self {
            component: component.clone(),
            from,
            to,
            auto_positioning: rng.chance(50),
        }
    }

    fn hotspot(&self) -> Point {
        Point::new(self.from.x + self.from.width / 2, self.from.y + self.from.height / 2)
    }

    fn pointer(&self) -> Point {
        let hotspot = self.hotspot();
        Point::new(
            hotspot.x + self.to.x - self.from.x,
            hotspot.y + self.to.y - self.from.y,
        )
    }

    fn start(&self, host: &mut SimulatedHost) {
        host.run(|d| d.start_moving(&[self.component.clone()], &[self.from], self.hotspot()))
            .expect("start moving");
    }

    /// Drag to the target. Errors leave the session on its base structure.
    fn drag(&self, host: &mut SimulatedHost) {
        let _ = host.run(|d| {
            d.move_to(
                self.pointer(),
                &form(),
                self.auto_positioning,
                false,
                &[self.to],
            )
        });
    }

    fn commit(&self, host: &mut SimulatedHost) {
        self.start(host);
        self.drag(host);
        let _ = host.run(|d| d.end_moving(true));
        assert_eq!(host.designer().state(), DesignerState::Idle);
    }
}

fn dump(host: &SimulatedHost) -> String {
    host.designer().model().dump(None)
}

fn assert_clean(model: &LayoutModel) {
    let report = model.validate();
    assert!(report.is_clean(), "invariant report: {report:?}\n{}", model.dump(None));
}

/// Every baseline-aligned parallel group places each member at
/// `group_baseline - member_baseline` from the group start.
fn assert_baselines_line_up(
    designer: &LayoutDesigner<ScriptedOracle>,
    solved: &SolvedLayout,
) {
    let model = designer.model();
    let Ok(root) = model.root(&form(), Axis::Vertical) else {
        return;
    };
    let mut resolver = SizeResolver::new(
        model,
        designer.oracle(),
        designer.config().padding,
        &form(),
        Axis::Vertical,
    );
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        stack.extend_from_slice(model.children(id));
        if !matches!(model.get(id).map(|r| &r.kind), Some(IntervalKind::Parallel { .. })) {
            continue;
        }
        let members = resolver.baseline_members(id);
        let Some(group_ascent) = members.iter().map(|(_, a)| *a).max() else {
            continue;
        };
        let Some(group_span) = solved.spans[1].get(&id).copied() else {
            continue;
        };
        let group_baseline = group_span.start + group_ascent;
        for (member, ascent) in members {
            let span: Option<Span> = solved.spans[1].get(&member).copied();
            assert_eq!(
                span.map(|s| s.start),
                Some(group_baseline - ascent),
                "baseline member {member:?} off the group baseline"
            );
        }
    }
}

// ============================================================================
// Laws
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn repeated_move_is_idempotent(seed in any::<u64>(), count in 2usize..6) {
        let fixture = DeterminismFixture::new_with("idempotent_move", seed, true);
        let (mut host, placed) = grid_host(count);
        fixture.run("idempotent_move", |rng| {
            let gesture = Gesture::random(&host, &placed, rng);
            gesture.start(&mut host);
            gesture.drag(&mut host);
            let first = dump(&host);
            gesture.drag(&mut host);
            assert_eq!(dump(&host), first, "seed {seed}: {gesture:?}");
        });
    }

    #[test]
    fn cancel_restores_pre_session_tree(seed in any::<u64>(), count in 2usize..6, drags in 1usize..5) {
        let fixture = DeterminismFixture::new_with("cancel", seed, true);
        let (mut host, placed) = grid_host(count);
        let before = dump(&host);
        fixture.run("cancel", |rng| {
            let gesture = Gesture::random(&host, &placed, rng);
            gesture.start(&mut host);
            for _ in 0..drags {
                let step = Gesture {
                    to: gesture.to.translated(rng.range(-6, 6), rng.range(-6, 6)),
                    ..gesture.clone()
                };
                step.drag(&mut host);
            }
            host.run(|d| d.end_moving(false)).expect("cancel");
        });
        assert_eq!(dump(&host), before);
        assert_eq!(host.designer().state(), DesignerState::Idle);
    }

    #[test]
    fn undo_restores_mark_and_redo_replays(seed in any::<u64>(), count in 2usize..6, gestures in 1usize..4) {
        let fixture = DeterminismFixture::new_with("undo", seed, true);
        let (mut host, placed) = grid_host(count);
        let start = host.designer().model().change_mark();
        let before = dump(&host);
        fixture.run("undo", |rng| {
            for _ in 0..gestures {
                Gesture::random(&host, &placed, rng).commit(&mut host);
                assert_clean(host.designer().model());
            }
        });
        let after = dump(&host);
        let end = host.designer().model().change_mark();
        let model = host.designer_mut().model_mut().expect("idle");
        let undone = model.undo(start, end).expect("undo");
        prop_assert_eq!(model.dump(None), before);
        if undone {
            model.redo().expect("redo");
            prop_assert_eq!(model.dump(None), after);
        }
    }

    #[test]
    fn snapshot_restore_round_trips(seed in any::<u64>(), count in 2usize..6) {
        let fixture = DeterminismFixture::new_with("snapshot", seed, true);
        let (mut host, placed) = grid_host(count);
        let snapshot = host.designer().model().snapshot();
        let before = dump(&host);
        fixture.run("snapshot", |rng| {
            Gesture::random(&host, &placed, rng).commit(&mut host);
        });
        let model = host.designer_mut().model_mut().expect("idle");
        model.restore(snapshot);
        prop_assert_eq!(model.dump(None), before);
    }

    #[test]
    fn committed_baseline_groups_line_up(seed in any::<u64>(), count in 2usize..7) {
        let fixture = DeterminismFixture::new_with("baseline", seed, true);
        let (mut host, placed) = grid_host(count);
        fixture.run("baseline", |rng| {
            let a = rng.range(0, placed.len() as i32) as usize;
            let b = (a + 1 + rng.range(0, placed.len() as i32 - 1) as usize) % placed.len();
            let pair = [placed[a].0.clone(), placed[b].0.clone()];
            let _ = host.run(|d| d.align(&pair, Axis::Vertical, Alignment::Baseline));
            Gesture::random(&host, &placed, rng).commit(&mut host);
        });
        assert_clean(host.designer().model());
        let designer = host.designer();
        let solved = solve(
            designer.model(),
            designer.oracle(),
            designer.config().padding,
            &form(),
        )
        .expect("solve");
        assert_baselines_line_up(designer, &solved);
    }
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn aligned_row_shares_one_baseline() {
    let (mut host, placed) = grid_host(3);
    let row: Vec<ComponentId> = placed.iter().map(|(id, _)| id.clone()).collect();
    host.run(|d| d.align(&row, Axis::Vertical, Alignment::Baseline))
        .expect("align");
    assert_clean(host.designer().model());
    let tops: Vec<i32> = row
        .iter()
        .filter_map(|id| host.bounds(id))
        .map(|r| r.y)
        .collect();
    assert_eq!(tops.len(), 3);
    assert!(tops.windows(2).all(|w| w[0] == w[1]), "tops {tops:?}");
}

#[test]
fn horizontal_baseline_alignment_is_rejected() {
    let (mut host, placed) = grid_host(2);
    let pair: Vec<ComponentId> = placed.iter().map(|(id, _)| id.clone()).collect();
    let before = dump(&host);
    let err = host
        .run(|d| d.align(&pair, Axis::Horizontal, Alignment::Baseline))
        .expect_err("baseline on horizontal axis");
    assert!(err.to_string().contains("baseline"));
    assert_eq!(dump(&host), before);
}

#[test]
fn seed_corpus_keeps_trees_valid() {
    for seed in [0_u64, 1, 2, 3, 5, 8, 13, 21, 34, 55, u64::MAX] {
        let fixture = DeterminismFixture::new_with("corpus", seed, true);
        let (mut host, placed) = grid_host(5);
        fixture.run("corpus", |rng| {
            for _ in 0..6 {
                Gesture::random(&host, &placed, rng).commit(&mut host);
                assert_clean(host.designer().model());
            }
        });
    }
}
