//! The gesture session state machine.
//!
//! One recognizer instance owns one [`GestureSession`] plus the overlay,
//! command sink, and eligibility predicate it collaborates with. Every
//! pointer event is handled synchronously and returns whether it was
//! consumed (true while a gesture is active or transitioning into one), so
//! the input hook can suppress default handling. Nothing here can fail
//! toward the caller: ineligible or out-of-phase events are absorbed as
//! no-ops.

use crate::commands::{command_for, CommandSink};
use crate::engine::{classify_delta, Direction, GesturePhase, GestureSession, Point, SurfaceHandle};
use crate::overlay::GestureOverlay;

/// Eligibility predicate for gesture starts. Production binds this to a
/// window-class check; tests use a fake.
pub trait SurfaceClassifier: Send {
    fn is_text_surface(&self, surface: SurfaceHandle) -> bool;
}

/// Classifier that accepts every surface; useful for hosts that scope the
/// hook themselves and for tests.
#[derive(Debug, Default)]
pub struct AnySurface;

impl SurfaceClassifier for AnySurface {
    fn is_text_surface(&self, _surface: SurfaceHandle) -> bool {
        true
    }
}

pub struct GestureRecognizer {
    session: GestureSession,
    threshold_px: f32,
    overlay: Box<dyn GestureOverlay>,
    sink: Box<dyn CommandSink>,
    surfaces: Box<dyn SurfaceClassifier>,
}

impl GestureRecognizer {
    pub fn new(
        threshold_px: f32,
        overlay: Box<dyn GestureOverlay>,
        sink: Box<dyn CommandSink>,
        surfaces: Box<dyn SurfaceClassifier>,
    ) -> Self {
        Self {
            session: GestureSession::default(),
            threshold_px,
            overlay,
            sink,
            surfaces,
        }
    }

    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    pub fn set_threshold_px(&mut self, threshold_px: f32) {
        self.threshold_px = threshold_px;
    }

    /// Pointer-down at `point` over `surface`. Starts a pending session when
    /// the surface is eligible and no session is live; never consumes the
    /// event, so the host still sees the press.
    pub fn pointer_down(&mut self, point: Point, surface: SurfaceHandle) -> bool {
        if self.session.is_live() {
            // One gesture at a time; a second press cannot interleave.
            return false;
        }
        if self.surfaces.is_text_surface(surface) {
            self.session.begin(point, surface);
        }
        false
    }

    /// Pointer-move to `point`. The displacement is measured from the last
    /// point that registered a direction, so jitter never advances the
    /// reference and small intentional motion accumulates.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match self.session.phase() {
            GesturePhase::Idle => false,
            GesturePhase::Pending => {
                let Some(dir) = self.classify_from_reference(point) else {
                    return false;
                };
                self.session.activate();
                self.overlay.show();
                self.draw_step(dir, point);
                true
            }
            GesturePhase::Active => {
                if let Some(dir) = self.classify_from_reference(point) {
                    self.draw_step(dir, point);
                }
                true
            }
        }
    }

    /// Pointer-up. An active session dispatches its tokens; a pending one
    /// aborts silently. Either way the session resets to idle.
    pub fn pointer_up(&mut self) -> bool {
        match self.session.phase() {
            GesturePhase::Idle => false,
            GesturePhase::Pending => {
                self.session.reset();
                false
            }
            GesturePhase::Active => {
                self.overlay.hide();
                let tokens: Vec<Direction> = self.session.tokens().to_vec();
                if let Some(command) = command_for(&tokens) {
                    tracing::debug!(
                        ?command,
                        tokens = %self.session.tokens_label(),
                        "gesture dispatched"
                    );
                    self.sink.execute(command);
                }
                self.session.reset();
                true
            }
        }
    }

    /// Abort any live session without dispatching: overlay hidden, session
    /// reset. Returns whether a session was actually aborted. Issued on
    /// Escape while a gesture is held, and available to hosts for focus-loss
    /// recovery.
    pub fn cancel(&mut self) -> bool {
        if !self.session.is_live() {
            return false;
        }
        if self.session.phase() == GesturePhase::Active {
            self.overlay.hide();
        }
        self.session.reset();
        tracing::debug!("gesture cancelled");
        true
    }

    /// Release overlay resources. Called once at plugin teardown.
    pub fn shutdown(&mut self) {
        self.overlay.shutdown();
    }

    fn classify_from_reference(&self, point: Point) -> Option<Direction> {
        let reference = self.session.reference();
        classify_delta(
            point.x - reference.x,
            point.y - reference.y,
            self.threshold_px,
        )
    }

    /// One visible step: stroke the raw segment, store the token (subject to
    /// dedup and the length cap), refresh the label, present the frame, and
    /// advance the reference. The raw path is always drawn even when the
    /// token is not stored.
    fn draw_step(&mut self, dir: Direction, point: Point) {
        let from = self.session.reference();
        self.overlay.draw_segment(from, point);
        self.session.push_token(dir);
        let label = format!("Gesture: {}", self.session.tokens_label());
        self.overlay.draw_label(&label);
        self.overlay.present();
        self.session.advance_reference(point);
    }
}
