use crate::mouse_gestures::sequence::StrokeSequence;
use serde::{Deserialize, Serialize};

/// Default minimum travel (in pixels) before a stroke is classified.
pub const DELTA_MIN: i32 = 30;

/// `|dx / dy|` above this ratio is horizontal, below its inverse vertical.
const AXIS_RATIO: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stroke {
    None,
    Left,
    Right,
    Up,
    Down,
    DownLeft,
    DownRight,
    UpLeft,
    UpRight,
}

impl Stroke {
    /// One-character code used to build stroke strings.
    ///
    /// Diagonals use the numeric keypad layout (`7 9` above, `1 3` below).
    pub fn token(self) -> char {
        match self {
            Stroke::None => 'N',
            Stroke::Left => 'L',
            Stroke::Right => 'R',
            Stroke::Up => 'U',
            Stroke::Down => 'D',
            Stroke::DownLeft => '1',
            Stroke::DownRight => '3',
            Stroke::UpLeft => '7',
            Stroke::UpRight => '9',
        }
    }

    pub fn from_token(token: char) -> Option<Self> {
        match token {
            'N' => Some(Stroke::None),
            'L' => Some(Stroke::Left),
            'R' => Some(Stroke::Right),
            'U' => Some(Stroke::Up),
            'D' => Some(Stroke::Down),
            '1' => Some(Stroke::DownLeft),
            '3' => Some(Stroke::DownRight),
            '7' => Some(Stroke::UpLeft),
            '9' => Some(Stroke::UpRight),
            _ => None,
        }
    }

    /// The stroke pointing the opposite way.
    pub fn mirror(self) -> Self {
        match self {
            Stroke::None => Stroke::None,
            Stroke::Left => Stroke::Right,
            Stroke::Right => Stroke::Left,
            Stroke::Up => Stroke::Down,
            Stroke::Down => Stroke::Up,
            Stroke::DownLeft => Stroke::UpRight,
            Stroke::UpRight => Stroke::DownLeft,
            Stroke::DownRight => Stroke::UpLeft,
            Stroke::UpLeft => Stroke::DownRight,
        }
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Stroke::DownLeft | Stroke::DownRight | Stroke::UpLeft | Stroke::UpRight
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Axis/diagonal classification, produces the "advanced" string.
    Accurate,
    /// Axis dominance only, produces the "basic" string.
    Fuzzy,
}

impl Algorithm {
    pub fn classify(self, dx: i64, dy: i64, delta_min: i32) -> Stroke {
        match self {
            Algorithm::Accurate => classify_accurate(dx, dy, delta_min),
            Algorithm::Fuzzy => classify_fuzzy(dx, dy, delta_min),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from(value: (i32, i32)) -> Self {
        Self {
            x: value.0,
            y: value.1,
        }
    }
}

fn exceeds_threshold(dx: i64, dy: i64, delta_min: i32) -> bool {
    let min = i128::from(delta_min);
    let (dx, dy) = (i128::from(dx), i128::from(dy));
    (dx * dx).saturating_add(dy * dy) > min * min
}

/// Classify a delta into one of eight directions.
///
/// Returns [`Stroke::None`] while the squared distance stays at or below
/// `delta_min²`. Screen coordinates grow downwards, so a negative `dy` is up.
pub fn classify_accurate(dx: i64, dy: i64, delta_min: i32) -> Stroke {
    if !exceeds_threshold(dx, dy, delta_min) {
        return Stroke::None;
    }

    let abs_x = i128::from(dx).abs();
    let abs_y = i128::from(dy).abs();
    let ratio = i128::from(AXIS_RATIO);

    if abs_y == 0 || abs_x > ratio * abs_y {
        return if dx > 0 { Stroke::Right } else { Stroke::Left };
    }
    if abs_x == 0 || ratio * abs_x < abs_y {
        return if dy > 0 { Stroke::Down } else { Stroke::Up };
    }

    match (dx > 0, dy > 0) {
        (true, true) => Stroke::DownRight,
        (true, false) => Stroke::UpRight,
        (false, true) => Stroke::DownLeft,
        (false, false) => Stroke::UpLeft,
    }
}

/// Classify a delta by its dominant axis. Ties go to the vertical axis.
pub fn classify_fuzzy(dx: i64, dy: i64, delta_min: i32) -> Stroke {
    if !exceeds_threshold(dx, dy, delta_min) {
        return Stroke::None;
    }

    if dx.unsigned_abs() <= dy.unsigned_abs() {
        if dy > 0 {
            Stroke::Down
        } else {
            Stroke::Up
        }
    } else if dx > 0 {
        Stroke::Right
    } else {
        Stroke::Left
    }
}

/// Feeds pointer samples through one classifier into one sequence.
///
/// The anchor only moves when a sample classifies, so jitter below the
/// threshold accumulates against the same reference point.
#[derive(Debug, Clone)]
pub struct StrokeTracker {
    algorithm: Algorithm,
    delta_min: i32,
    anchor: Option<Point>,
    strokes: StrokeSequence,
}

impl StrokeTracker {
    pub fn new(algorithm: Algorithm, delta_min: i32) -> Self {
        Self {
            algorithm,
            delta_min,
            anchor: None,
            strokes: StrokeSequence::new(),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn reset(&mut self, origin: Point) {
        self.strokes.reset();
        self.anchor = Some(origin);
    }

    /// Returns the stroke when one was appended to the sequence.
    pub fn feed_point(&mut self, point: Point) -> Option<Stroke> {
        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => {
                self.anchor = Some(point);
                return None;
            }
        };

        let dx = i64::from(point.x) - i64::from(anchor.x);
        let dy = i64::from(point.y) - i64::from(anchor.y);
        let stroke = self.algorithm.classify(dx, dy, self.delta_min);
        if stroke == Stroke::None {
            return None;
        }

        self.anchor = Some(point);
        if self.strokes.append(stroke) {
            Some(stroke)
        } else {
            None
        }
    }

    pub fn strokes(&self) -> &StrokeSequence {
        &self.strokes
    }

    pub fn tokens_string(&self) -> String {
        self.strokes.to_string()
    }
}
