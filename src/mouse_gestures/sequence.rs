use crate::mouse_gestures::engine::Stroke;
use std::fmt;

/// Longest stroke sequence kept for one gesture.
pub const MAX_STROKES: usize = 63;

/// Bounded stroke list where no two neighbours are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrokeSequence {
    strokes: Vec<Stroke>,
}

impl StrokeSequence {
    pub fn new() -> Self {
        Self {
            strokes: Vec::with_capacity(MAX_STROKES),
        }
    }

    pub fn reset(&mut self) {
        self.strokes.clear();
    }

    /// Append `stroke` unless it repeats the last one or the sequence is full.
    ///
    /// Returns `true` when the stroke was stored. [`Stroke::None`] is never stored.
    pub fn append(&mut self, stroke: Stroke) -> bool {
        if stroke == Stroke::None {
            return false;
        }
        if self.strokes.last() == Some(&stroke) {
            return false;
        }
        if self.strokes.len() >= MAX_STROKES {
            return false;
        }
        self.strokes.push(stroke);
        true
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn last(&self) -> Option<Stroke> {
        self.strokes.last().copied()
    }

    pub fn as_slice(&self) -> &[Stroke] {
        &self.strokes
    }
}

impl fmt::Display for StrokeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stroke in &self.strokes {
            write!(f, "{}", stroke.token())?;
        }
        Ok(())
    }
}
