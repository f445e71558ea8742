//! Direction classification and the per-gesture session state.
//!
//! Everything in this module is pure data: no rendering, no hooks, no host
//! calls. The [`GestureRecognizer`](crate::recognizer::GestureRecognizer)
//! drives a single [`GestureSession`] through its phase transitions and the
//! overlay/dispatch side effects live there.

/// Minimum per-axis displacement (in screen pixels) required before a move
/// registers as a direction. Smaller deltas are hand tremor and are ignored
/// without advancing the reference point, so intent accumulates across
/// samples.
pub const DEFAULT_THRESHOLD_PX: f32 = 10.0;

/// Stored token cap per gesture. Further directions are still drawn but not
/// recorded.
pub const MAX_GESTURE_TOKENS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl From<(f32, f32)> for Point {
    fn from(value: (f32, f32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

/// Opaque identity of the window/region a gesture started over. Only ever
/// compared and handed to a [`SurfaceClassifier`](crate::recognizer::SurfaceClassifier);
/// the engine never dereferences it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub isize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn token(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Up => 'U',
            Direction::Down => 'D',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Up => "Up",
            Direction::Down => "Down",
        }
    }
}

/// Classify a displacement into one of the four cardinal directions.
///
/// Returns `None` when both axes are below `threshold_px` (jitter). The
/// angle is computed with `dy` negated because screen coordinates grow
/// downward while the sector boundaries are stated in the usual math frame:
/// `[-45, 45]` right, `(45, 135)` up, `[-135, -45]` down, the rest left.
pub fn classify_delta(dx: f32, dy: f32, threshold_px: f32) -> Option<Direction> {
    if dx.abs() < threshold_px && dy.abs() < threshold_px {
        return None;
    }

    let angle = (-dy).atan2(dx).to_degrees();
    if (-45.0..=45.0).contains(&angle) {
        Some(Direction::Right)
    } else if angle > 45.0 && angle < 135.0 {
        Some(Direction::Up)
    } else if (-135.0..=-45.0).contains(&angle) {
        Some(Direction::Down)
    } else {
        Some(Direction::Left)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    /// No button held; the session holds no data.
    Idle,
    /// Button down over an eligible surface, no qualifying movement yet.
    Pending,
    /// At least one direction registered; the overlay is visible.
    Active,
}

/// Value-like state of one in-progress gesture. Reset between gestures,
/// never reallocated.
#[derive(Debug)]
pub struct GestureSession {
    phase: GesturePhase,
    anchor: Point,
    reference: Point,
    tokens: Vec<Direction>,
    target: Option<SurfaceHandle>,
}

impl Default for GestureSession {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Idle,
            anchor: Point { x: 0.0, y: 0.0 },
            reference: Point { x: 0.0, y: 0.0 },
            tokens: Vec::with_capacity(MAX_GESTURE_TOKENS),
            target: None,
        }
    }
}

impl GestureSession {
    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Last point that registered a direction. Jittery moves do not advance
    /// this, so small intentional motion accumulates until it crosses the
    /// threshold.
    pub fn reference(&self) -> Point {
        self.reference
    }

    pub fn tokens(&self) -> &[Direction] {
        &self.tokens
    }

    pub fn target(&self) -> Option<SurfaceHandle> {
        self.target
    }

    pub fn is_live(&self) -> bool {
        self.phase != GesturePhase::Idle
    }

    /// Tokens rendered as the short overlay label, e.g. `"DR"`.
    pub fn tokens_label(&self) -> String {
        self.tokens.iter().map(|dir| dir.token()).collect()
    }

    /// Start a new session at `point` over `target`. Only legal from `Idle`;
    /// callers enforce the one-session-at-a-time rule.
    pub fn begin(&mut self, point: Point, target: SurfaceHandle) {
        debug_assert_eq!(self.phase, GesturePhase::Idle);
        self.phase = GesturePhase::Pending;
        self.anchor = point;
        self.reference = point;
        self.tokens.clear();
        self.target = Some(target);
    }

    /// Pending -> Active, on the first qualifying movement.
    pub fn activate(&mut self) {
        debug_assert_eq!(self.phase, GesturePhase::Pending);
        self.phase = GesturePhase::Active;
    }

    /// Append a direction, collapsing immediate repeats and capping the
    /// stored sequence at [`MAX_GESTURE_TOKENS`]. Returns whether the token
    /// was actually stored.
    pub fn push_token(&mut self, dir: Direction) -> bool {
        if self.tokens.last().copied() == Some(dir) {
            return false;
        }
        if self.tokens.len() >= MAX_GESTURE_TOKENS {
            return false;
        }
        self.tokens.push(dir);
        true
    }

    pub fn advance_reference(&mut self, point: Point) {
        self.reference = point;
    }

    /// Back to `Idle`, dropping all per-gesture data.
    pub fn reset(&mut self) {
        self.phase = GesturePhase::Idle;
        self.tokens.clear();
        self.target = None;
    }
}
