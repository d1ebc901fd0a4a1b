//! Structured tracing emitted by designer sessions.
//!
//! Run with: `cargo test -p formlay-designer --test tracing_spans -- --nocapture`

use formlay_core::{ComponentId, Point, Rect};
use formlay_designer::{DesignerConfig, DesignerError, DesignerState, LayoutDesigner, ResizeEdges};
use formlay_harness::fixtures::{FORM, LABEL, TEXT_FIELD, text_field_model, text_field_oracle};

// ===========================================================================
// Span capture
// ===========================================================================

mod span_capture {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::registry::LookupSpan;

    #[derive(Debug, Clone)]
    pub struct CapturedSpan {
        pub name: String,
        pub fields: HashMap<String, String>,
    }

    #[derive(Debug, Clone)]
    pub struct CapturedEvent {
        pub level: tracing::Level,
        pub fields: HashMap<String, String>,
    }

    pub struct SpanCapture {
        spans: Arc<Mutex<Vec<CapturedSpan>>>,
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    pub struct CaptureHandle {
        spans: Arc<Mutex<Vec<CapturedSpan>>>,
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl CaptureHandle {
        pub fn spans(&self) -> Vec<CapturedSpan> {
            self.spans.lock().unwrap().clone()
        }

        pub fn events(&self) -> Vec<CapturedEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    struct FieldVisitor(Vec<(String, String)>);

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            self.0.push((field.name().to_string(), format!("{value:?}")));
        }
        fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
        fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
        fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
            self.0.push((field.name().to_string(), value.to_string()));
        }
    }

    impl<S> tracing_subscriber::Layer<S> for SpanCapture
    where
        S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    {
        fn on_new_span(
            &self,
            attrs: &tracing::span::Attributes<'_>,
            _id: &tracing::span::Id,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor(Vec::new());
            attrs.record(&mut visitor);
            self.spans.lock().unwrap().push(CapturedSpan {
                name: attrs.metadata().name().to_string(),
                fields: visitor.0.into_iter().collect(),
            });
        }

        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor(Vec::new());
            event.record(&mut visitor);
            self.events.lock().unwrap().push(CapturedEvent {
                level: *event.metadata().level(),
                fields: visitor.0.into_iter().collect(),
            });
        }
    }

    pub fn with_captured_tracing<F, R>(f: F) -> (R, CaptureHandle)
    where
        F: FnOnce() -> R,
    {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let handle = CaptureHandle {
            spans: spans.clone(),
            events: events.clone(),
        };
        let layer = SpanCapture { spans, events };
        let subscriber = tracing_subscriber::registry().with(layer);
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, handle)
    }
}

use span_capture::with_captured_tracing;

fn cid(raw: &str) -> ComponentId {
    ComponentId::new(raw)
}

fn designer() -> LayoutDesigner<formlay_harness::ScriptedOracle> {
    LayoutDesigner::with_model(
        text_field_model().expect("fixture"),
        text_field_oracle(),
        DesignerConfig::default(),
    )
    .expect("designer")
}

fn resize_text_field(designer: &mut LayoutDesigner<formlay_harness::ScriptedOracle>, commit: bool) {
    designer
        .start_resizing(
            &[cid(TEXT_FIELD)],
            &[Rect::new(48, 11, 59, 20)],
            Point::new(77, 31),
            ResizeEdges::from_raw([-1, 1]),
            true,
        )
        .expect("start");
    designer
        .move_to(
            Point::new(77, 66),
            &cid(FORM),
            false,
            false,
            &[Rect::new(48, 11, 59, 55)],
        )
        .expect("move");
    designer.end_moving(commit).expect("end");
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn committed_session_emits_start_end_and_optimize_spans() {
    let mut designer = designer();
    let (_, handle) = with_captured_tracing(|| resize_text_field(&mut designer, true));
    let spans = handle.spans();
    let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"start_session"), "spans: {names:?}");
    assert!(names.contains(&"optimize"), "spans: {names:?}");

    let start = spans
        .iter()
        .find(|s| s.name == "start_session")
        .expect("start span");
    assert_eq!(start.fields.get("container").map(String::as_str), Some(FORM));

    let end = spans
        .iter()
        .find(|s| s.name == "end_session")
        .expect("end span");
    assert_eq!(end.fields.get("commit").map(String::as_str), Some("true"));
}

#[test]
fn cancelled_session_reports_cancel_event() {
    let mut designer = designer();
    let (_, handle) = with_captured_tracing(|| resize_text_field(&mut designer, false));
    let events = handle.events();
    assert!(
        events
            .iter()
            .any(|e| e.level == tracing::Level::INFO
                && e.fields.get("message").is_some_and(|m| m == "session cancelled")),
        "events: {events:?}"
    );
    assert!(
        !handle.spans().iter().any(|s| s.name == "optimize"),
        "cancel must not optimize"
    );
}

#[test]
fn removal_span_carries_component_and_mode() {
    let mut designer = designer();
    let (result, handle) =
        with_captured_tracing(|| designer.remove_component(&cid(LABEL), true));
    result.expect("remove");
    let span = handle
        .spans()
        .into_iter()
        .find(|s| s.name == "remove_component")
        .expect("removal span");
    assert_eq!(span.fields.get("component").map(String::as_str), Some(LABEL));
    assert_eq!(span.fields.get("close_gap").map(String::as_str), Some("true"));
}

#[test]
fn move_to_keeps_the_session_open_until_end() {
    let mut designer = designer();
    let bounds = [Rect::new(48, 11, 59, 55)];
    assert!(matches!(
        designer.move_to(Point::new(77, 66), &cid(FORM), false, false, &bounds),
        Err(DesignerError::NoActiveSession)
    ));
    designer
        .start_resizing(
            &[cid(TEXT_FIELD)],
            &[Rect::new(48, 11, 59, 20)],
            Point::new(77, 31),
            ResizeEdges::from_raw([-1, 1]),
            true,
        )
        .expect("start");
    let (moved, handle) = with_captured_tracing(|| {
        designer.move_to(Point::new(77, 66), &cid(FORM), false, false, &bounds)
    });
    assert_eq!(moved, Ok(()));
    assert_eq!(designer.state(), DesignerState::Resizing);
    assert!(
        !handle.spans().iter().any(|s| s.name == "optimize"),
        "a drag must not optimize"
    );
    designer.end_moving(true).expect("end");
    assert_eq!(designer.state(), DesignerState::Idle);
}
