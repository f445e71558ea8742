use editor_gestures::commands::{CommandSink, EditorCommand};
use editor_gestures::engine::{GesturePhase, Point, SurfaceHandle, DEFAULT_THRESHOLD_PX};
use editor_gestures::overlay::GestureOverlay;
use editor_gestures::recognizer::{GestureRecognizer, SurfaceClassifier};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
enum OverlayEvent {
    Show,
    Segment(Point, Point),
    Label(String),
    Present,
    Hide,
    Shutdown,
}

#[derive(Default)]
struct RecordingOverlay {
    events: Arc<Mutex<Vec<OverlayEvent>>>,
}

impl RecordingOverlay {
    fn new() -> (Self, Arc<Mutex<Vec<OverlayEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                events: Arc::clone(&events),
            },
            events,
        )
    }

    fn push(&self, event: OverlayEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl GestureOverlay for RecordingOverlay {
    fn show(&mut self) {
        self.push(OverlayEvent::Show);
    }
    fn draw_segment(&mut self, from: Point, to: Point) {
        self.push(OverlayEvent::Segment(from, to));
    }
    fn draw_label(&mut self, text: &str) {
        self.push(OverlayEvent::Label(text.to_string()));
    }
    fn present(&mut self) {
        self.push(OverlayEvent::Present);
    }
    fn hide(&mut self) {
        self.push(OverlayEvent::Hide);
    }
    fn shutdown(&mut self) {
        self.push(OverlayEvent::Shutdown);
    }
}

#[derive(Default)]
struct RecordingSink {
    commands: Arc<Mutex<Vec<EditorCommand>>>,
}

impl RecordingSink {
    fn new() -> (Self, Arc<Mutex<Vec<EditorCommand>>>) {
        let commands = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                commands: Arc::clone(&commands),
            },
            commands,
        )
    }
}

impl CommandSink for RecordingSink {
    fn execute(&mut self, command: EditorCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

struct FakeSurfaces {
    eligible: HashSet<isize>,
}

impl FakeSurfaces {
    fn accepting(handles: &[isize]) -> Self {
        Self {
            eligible: handles.iter().copied().collect(),
        }
    }
}

impl SurfaceClassifier for FakeSurfaces {
    fn is_text_surface(&self, surface: SurfaceHandle) -> bool {
        self.eligible.contains(&surface.0)
    }
}

fn recognizer_over(
    handles: &[isize],
) -> (
    GestureRecognizer,
    Arc<Mutex<Vec<OverlayEvent>>>,
    Arc<Mutex<Vec<EditorCommand>>>,
) {
    let (overlay, overlay_events) = RecordingOverlay::new();
    let (sink, commands) = RecordingSink::new();
    let recognizer = GestureRecognizer::new(
        DEFAULT_THRESHOLD_PX,
        Box::new(overlay),
        Box::new(sink),
        Box::new(FakeSurfaces::accepting(handles)),
    );
    (recognizer, overlay_events, commands)
}

fn pt(x: f32, y: f32) -> Point {
    Point { x, y }
}

const EDIT_PANE: SurfaceHandle = SurfaceHandle(1);

#[test]
fn down_right_closes_active_document() {
    // Scenario: down at (500,500), drag down then right, release.
    let (mut rec, _, commands) = recognizer_over(&[1]);

    assert!(!rec.pointer_down(pt(500.0, 500.0), EDIT_PANE));
    assert_eq!(rec.session().phase(), GesturePhase::Pending);

    assert!(rec.pointer_move(pt(500.0, 560.0)));
    assert_eq!(rec.session().phase(), GesturePhase::Active);
    assert_eq!(rec.session().tokens_label(), "D");

    assert!(rec.pointer_move(pt(560.0, 560.0)));
    assert_eq!(rec.session().tokens_label(), "DR");

    assert!(rec.pointer_up());
    assert_eq!(rec.session().phase(), GesturePhase::Idle);
    assert_eq!(
        commands.lock().unwrap().as_slice(),
        &[EditorCommand::CloseActiveDocument]
    );
}

#[test]
fn release_without_movement_dispatches_nothing() {
    let (mut rec, overlay, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(100.0, 100.0), EDIT_PANE);
    assert!(!rec.pointer_up());

    assert_eq!(rec.session().phase(), GesturePhase::Idle);
    assert!(rec.session().tokens().is_empty());
    assert!(commands.lock().unwrap().is_empty());
    assert!(overlay.lock().unwrap().is_empty());
}

#[test]
fn jitter_accumulates_from_last_registered_point() {
    // A sub-threshold wiggle must not move the reference: the later move is
    // measured from the original down point and still registers Down.
    let (mut rec, _, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    assert!(!rec.pointer_move(pt(5.0, 5.0)));
    assert_eq!(rec.session().phase(), GesturePhase::Pending);
    assert_eq!(rec.session().reference(), pt(0.0, 0.0));

    assert!(rec.pointer_move(pt(0.0, 60.0)));
    assert_eq!(rec.session().tokens_label(), "D");

    rec.pointer_up();
    assert_eq!(
        commands.lock().unwrap().as_slice(),
        &[EditorCommand::DocumentEnd]
    );
}

#[test]
fn repeated_direction_collapses_to_one_token() {
    let (mut rec, overlay, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(60.0, 0.0));
    rec.pointer_move(pt(120.0, 0.0));
    rec.pointer_move(pt(180.0, 0.0));

    assert_eq!(rec.session().tokens_label(), "R");
    // The raw path is drawn for every qualifying move regardless of dedup.
    let segments = overlay
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, OverlayEvent::Segment(_, _)))
        .count();
    assert_eq!(segments, 3);

    rec.pointer_up();
    assert_eq!(commands.lock().unwrap().as_slice(), &[EditorCommand::NextTab]);
}

#[test]
fn tokens_cap_at_two_but_drawing_continues() {
    let (mut rec, overlay, _) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(60.0, 0.0)); // R
    rec.pointer_move(pt(60.0, 60.0)); // D
    rec.pointer_move(pt(0.0, 60.0)); // L, over the cap

    assert_eq!(rec.session().tokens_label(), "RD");

    let events = overlay.lock().unwrap();
    let segments = events
        .iter()
        .filter(|e| matches!(e, OverlayEvent::Segment(_, _)))
        .count();
    assert_eq!(segments, 3);
    // The label reflects the stored sequence, refreshed on every move.
    assert_eq!(
        events
            .iter()
            .filter_map(|e| match e {
                OverlayEvent::Label(text) => Some(text.as_str()),
                _ => None,
            })
            .last(),
        Some("Gesture: RD")
    );
}

#[test]
fn overlay_events_follow_show_draw_present_hide_order() {
    let (mut rec, overlay, _) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, 60.0));
    rec.pointer_up();

    let events = overlay.lock().unwrap();
    assert_eq!(
        events.as_slice(),
        &[
            OverlayEvent::Show,
            OverlayEvent::Segment(pt(0.0, 0.0), pt(0.0, 60.0)),
            OverlayEvent::Label("Gesture: D".to_string()),
            OverlayEvent::Present,
            OverlayEvent::Hide,
        ]
    );
}

#[test]
fn boundary_delta_is_a_direction() {
    // (10, 0) is not jitter: the filter requires both axes strictly below
    // the threshold.
    let (mut rec, _, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    assert!(rec.pointer_move(pt(10.0, 0.0)));
    assert_eq!(rec.session().tokens_label(), "R");

    rec.pointer_up();
    assert_eq!(commands.lock().unwrap().as_slice(), &[EditorCommand::NextTab]);
}

#[test]
fn ineligible_surface_never_starts_a_session() {
    let (mut rec, overlay, commands) = recognizer_over(&[1]);

    assert!(!rec.pointer_down(pt(0.0, 0.0), SurfaceHandle(99)));
    assert_eq!(rec.session().phase(), GesturePhase::Idle);

    assert!(!rec.pointer_move(pt(100.0, 0.0)));
    assert!(!rec.pointer_up());
    assert!(overlay.lock().unwrap().is_empty());
    assert!(commands.lock().unwrap().is_empty());
}

#[test]
fn second_down_while_live_is_ignored() {
    let (mut rec, _, commands) = recognizer_over(&[1, 2]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, 60.0));
    // A second press cannot interleave a new session.
    assert!(!rec.pointer_down(pt(400.0, 400.0), SurfaceHandle(2)));
    assert_eq!(rec.session().target(), Some(EDIT_PANE));
    assert_eq!(rec.session().tokens_label(), "D");

    rec.pointer_up();
    assert_eq!(
        commands.lock().unwrap().as_slice(),
        &[EditorCommand::DocumentEnd]
    );
}

#[test]
fn unmapped_sequence_is_dropped_silently() {
    let (mut rec, _, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, 60.0)); // D
    rec.pointer_move(pt(0.0, 0.0)); // U — "DU" is not in the table
    assert!(rec.pointer_up());

    assert!(commands.lock().unwrap().is_empty());
    assert_eq!(rec.session().phase(), GesturePhase::Idle);
}

#[test]
fn cancel_aborts_without_dispatch() {
    let (mut rec, overlay, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, 60.0));
    assert!(rec.cancel());

    assert_eq!(rec.session().phase(), GesturePhase::Idle);
    assert!(commands.lock().unwrap().is_empty());
    assert_eq!(overlay.lock().unwrap().last(), Some(&OverlayEvent::Hide));

    // The release after a cancel finds no session.
    assert!(!rec.pointer_up());
    assert!(!rec.cancel());
}

#[test]
fn cancel_of_pending_session_touches_no_overlay() {
    let (mut rec, overlay, _) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    assert!(rec.cancel());
    assert!(overlay.lock().unwrap().is_empty());
}

#[test]
fn consumed_flags_track_active_transitions() {
    let (mut rec, _, _) = recognizer_over(&[1]);

    assert!(!rec.pointer_down(pt(0.0, 0.0), EDIT_PANE));
    // Jitter while pending is not consumed.
    assert!(!rec.pointer_move(pt(3.0, 3.0)));
    // The activating move is.
    assert!(rec.pointer_move(pt(0.0, 60.0)));
    // So is every move while active, qualifying or not.
    assert!(rec.pointer_move(pt(1.0, 61.0)));
    assert!(rec.pointer_up());
    // Idle events are not.
    assert!(!rec.pointer_move(pt(5.0, 5.0)));
    assert!(!rec.pointer_up());
}

#[test]
fn sessions_do_not_leak_state_across_gestures() {
    let (mut rec, _, commands) = recognizer_over(&[1]);

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, 60.0));
    rec.pointer_move(pt(60.0, 60.0));
    rec.pointer_up();

    rec.pointer_down(pt(0.0, 0.0), EDIT_PANE);
    rec.pointer_move(pt(0.0, -60.0));
    rec.pointer_up();

    assert_eq!(
        commands.lock().unwrap().as_slice(),
        &[
            EditorCommand::CloseActiveDocument,
            EditorCommand::DocumentStart
        ]
    );
}
