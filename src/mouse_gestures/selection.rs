use crate::mouse_gestures::capture::CapturedMovement;
use crate::mouse_gestures::db::{Context, ContextId, Gesture, GestureConfig};

/// Which captured string a gesture pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedSequence {
    Advanced,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureMatch {
    pub context: ContextId,
    /// Index into the context's gesture list.
    pub gesture: usize,
    pub via: MatchedSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Matched(GestureMatch),
    /// An abort context claimed the window without a matching gesture.
    Blocked(ContextId),
    NoMatch,
}

impl GestureConfig {
    pub fn gesture(&self, found: GestureMatch) -> Option<&Gesture> {
        self.context(found.context)?.gestures.get(found.gesture)
    }
}

/// Contexts applying to a window in resolution order: contexts with window
/// patterns first, then global ones, each group in declaration order.
pub fn matching_contexts<'a>(
    config: &'a GestureConfig,
    title: &'a str,
    class: &'a str,
) -> impl Iterator<Item = ContextId> + 'a {
    let contexts = config.contexts();
    let specific = contexts
        .iter()
        .enumerate()
        .filter(move |(_, ctx)| !ctx.is_global() && ctx.matches_window(title, class));
    let global = contexts.iter().enumerate().filter(|(_, ctx)| ctx.is_global());
    specific.chain(global).map(|(idx, _)| ContextId(idx))
}

/// First context applying to the window, if any.
pub fn select_context(config: &GestureConfig, title: &str, class: &str) -> Option<ContextId> {
    matching_contexts(config, title, class).next()
}

/// Find the first gesture of `context` whose pattern matches.
///
/// The whole list is tried against the accurate string before any gesture
/// is tried against the fuzzy one. Empty strings are never tested.
pub fn match_gesture(
    context: &Context,
    advanced: &str,
    basic: &str,
) -> Option<(usize, MatchedSequence)> {
    let passes = [
        (advanced, MatchedSequence::Advanced),
        (basic, MatchedSequence::Basic),
    ];
    passes
        .into_iter()
        .filter(|(strokes, _)| !strokes.is_empty())
        .find_map(|(strokes, via)| {
            context
                .gestures
                .iter()
                .position(|gesture| gesture.matches(strokes))
                .map(|idx| (idx, via))
        })
}

/// Resolve a captured movement to at most one gesture.
pub fn resolve(config: &GestureConfig, captured: &CapturedMovement) -> Resolution {
    for id in matching_contexts(config, &captured.window_title, &captured.window_class) {
        let Some(context) = config.context(id) else {
            continue;
        };
        if let Some((gesture, via)) = match_gesture(
            context,
            &captured.advanced_movements,
            &captured.basic_movements,
        ) {
            return Resolution::Matched(GestureMatch {
                context: id,
                gesture,
                via,
            });
        }
        if context.abort {
            tracing::debug!(context = %context.name, "abort context stops gesture lookup");
            return Resolution::Blocked(id);
        }
    }
    Resolution::NoMatch
}
