//! Turns raw pointer samples from the overlay into popup intents.
//!
//! Touch is exclusive: once a pointer goes down on a popup, every sample up
//! to the matching up/cancel belongs to that popup, wherever the pointer
//! wanders. Further downs are ignored until then.

use crate::constants::{
    DISMISS_DISTANCE_FRACTION, EXPAND_DISTANCE, SWIPE_ESCAPE_VELOCITY, TOUCH_SLOP,
};
use cosmic_headsup_util::NotificationIdentity;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
    Cancel,
    /// Pointer went down outside of the overlay
    Outside,
}

impl PointerPhase {
    pub fn from_code(code: u32) -> Option<Self> {
        Some(match code {
            0 => Self::Down,
            1 => Self::Move,
            2 => Self::Up,
            3 => Self::Cancel,
            4 => Self::Outside,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerSample {
    pub phase: PointerPhase,
    /// Popup under the pointer, `None` when outside of every popup
    pub target: Option<NotificationIdentity>,
    pub x: f32,
    pub y: f32,
    /// Width of the target popup
    pub width: f32,
    /// Timestamp from the overlay's input clock
    pub time: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GestureIntent {
    None,
    Dismiss(NotificationIdentity),
    Expand(NotificationIdentity),
    TapThrough(NotificationIdentity),
    TouchOutside,
}

/// Result of one sample: the popup under live touch (its decay must be
/// reset) and what the gesture asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub focus: Option<NotificationIdentity>,
    pub intent: GestureIntent,
}

impl Gesture {
    fn none(focus: Option<NotificationIdentity>) -> Self {
        Self {
            focus,
            intent: GestureIntent::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Undecided,
    Horizontal,
    Vertical,
}

#[derive(Debug)]
struct Tracking {
    target: NotificationIdentity,
    dismissible: bool,
    width: f32,
    origin: (f32, f32),
    prev: (f32, Duration),
    last: (f32, Duration),
    axis: Axis,
    expanded: bool,
}

impl Tracking {
    fn velocity_x(&self) -> f32 {
        let dt = self.last.1.saturating_sub(self.prev.1).as_secs_f32();
        if dt > 0.0 {
            (self.last.0 - self.prev.0) / dt
        } else {
            0.0
        }
    }

    fn advance(&mut self, sample: &PointerSample) {
        self.prev = self.last;
        self.last = (sample.x, sample.time);

        if self.axis == Axis::Undecided {
            let dx = (sample.x - self.origin.0).abs();
            let dy = (sample.y - self.origin.1).abs();
            if dx > TOUCH_SLOP && dx >= dy {
                self.axis = Axis::Horizontal;
            } else if dy > TOUCH_SLOP {
                self.axis = Axis::Vertical;
            }
        }
    }

    fn swiped_far_enough(&self) -> bool {
        (self.last.0 - self.origin.0).abs() > self.width * DISMISS_DISTANCE_FRACTION
    }

    fn swiped_fast_enough(&self) -> bool {
        let velocity = self.velocity_x();
        let travel = self.last.0 - self.origin.0;
        velocity.abs() > SWIPE_ESCAPE_VELOCITY && (velocity > 0.0) == (travel > 0.0)
    }

    fn should_expand(&mut self, y: f32) -> bool {
        if self.axis == Axis::Vertical && !self.expanded && y - self.origin.1 > EXPAND_DISTANCE {
            self.expanded = true;
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Default)]
pub struct GestureInterpreter {
    tracking: Option<Tracking>,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The popup currently receiving live touch input.
    pub fn focused(&self) -> Option<&NotificationIdentity> {
        self.tracking.as_ref().map(|t| &t.target)
    }

    /// Drops an in-progress gesture on a popup that went away.
    pub fn forget(&mut self, identity: &NotificationIdentity) {
        if self.focused() == Some(identity) {
            tracing::debug!(%identity, "abandoning gesture on removed popup");
            self.tracking = None;
        }
    }

    pub fn reset(&mut self) {
        self.tracking = None;
    }

    /// `dismissible` is only read on a down sample and describes its target.
    pub fn feed(&mut self, sample: &PointerSample, dismissible: bool) -> Gesture {
        match sample.phase {
            PointerPhase::Down => {
                if let Some(tracking) = &self.tracking {
                    return Gesture::none(Some(tracking.target.clone()));
                }
                let Some(target) = sample.target.clone() else {
                    return Gesture {
                        focus: None,
                        intent: GestureIntent::TouchOutside,
                    };
                };
                self.tracking = Some(Tracking {
                    target: target.clone(),
                    dismissible,
                    width: sample.width,
                    origin: (sample.x, sample.y),
                    prev: (sample.x, sample.time),
                    last: (sample.x, sample.time),
                    axis: Axis::Undecided,
                    expanded: false,
                });
                Gesture::none(Some(target))
            }
            PointerPhase::Move => {
                let Some(tracking) = self.tracking.as_mut() else {
                    return Gesture::none(None);
                };
                tracking.advance(sample);
                let focus = Some(tracking.target.clone());
                if tracking.should_expand(sample.y) {
                    return Gesture {
                        intent: GestureIntent::Expand(tracking.target.clone()),
                        focus,
                    };
                }
                Gesture::none(focus)
            }
            PointerPhase::Up => {
                let Some(mut tracking) = self.tracking.take() else {
                    return Gesture::none(None);
                };
                tracking.advance(sample);
                let focus = Some(tracking.target.clone());
                let axis = tracking.axis;
                let intent = match axis {
                    Axis::Undecided => GestureIntent::TapThrough(tracking.target.clone()),
                    Axis::Horizontal
                        if tracking.dismissible
                            && (tracking.swiped_far_enough() || tracking.swiped_fast_enough()) =>
                    {
                        GestureIntent::Dismiss(tracking.target.clone())
                    }
                    Axis::Horizontal => {
                        tracing::trace!(popup = %tracking.target, "swipe snapped back");
                        GestureIntent::None
                    }
                    Axis::Vertical if tracking.should_expand(sample.y) => {
                        GestureIntent::Expand(tracking.target.clone())
                    }
                    Axis::Vertical => GestureIntent::None,
                };
                Gesture { focus, intent }
            }
            PointerPhase::Cancel => {
                let focus = self.tracking.take().map(|t| t.target);
                Gesture::none(focus)
            }
            PointerPhase::Outside => {
                if self.tracking.is_some() {
                    return Gesture::none(self.focused().cloned());
                }
                Gesture {
                    focus: None,
                    intent: GestureIntent::TouchOutside,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDTH: f32 = 380.0;

    fn popup(id: u32) -> NotificationIdentity {
        NotificationIdentity::new("mail", id, None)
    }

    fn sample(phase: PointerPhase, target: Option<u32>, x: f32, y: f32, ms: u64) -> PointerSample {
        PointerSample {
            phase,
            target: target.map(popup),
            x,
            y,
            width: WIDTH,
            time: Duration::from_millis(ms),
        }
    }

    fn drag(interpreter: &mut GestureInterpreter, points: &[(f32, f32, u64)], dismissible: bool) -> Vec<Gesture> {
        let mut out = Vec::new();
        let (first, rest) = points.split_first().unwrap();
        out.push(interpreter.feed(
            &sample(PointerPhase::Down, Some(1), first.0, first.1, first.2),
            dismissible,
        ));
        let (last, moves) = rest.split_last().unwrap();
        for p in moves {
            out.push(interpreter.feed(&sample(PointerPhase::Move, Some(1), p.0, p.1, p.2), dismissible));
        }
        out.push(interpreter.feed(&sample(PointerPhase::Up, Some(1), last.0, last.1, last.2), dismissible));
        out
    }

    #[test]
    fn test_tap_without_movement() {
        let mut interpreter = GestureInterpreter::new();
        let gestures = drag(&mut interpreter, &[(10.0, 10.0, 0), (12.0, 11.0, 80)], true);

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::TapThrough(popup(1)));
        assert!(interpreter.focused().is_none());
    }

    #[test]
    fn test_long_horizontal_drag_dismisses() {
        let mut interpreter = GestureInterpreter::new();
        // Slow drag past 40% of the width
        let gestures = drag(
            &mut interpreter,
            &[(0.0, 10.0, 0), (60.0, 10.0, 1000), (120.0, 10.0, 2000), (170.0, 10.0, 3000), (170.0, 10.0, 4000)],
            true,
        );

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::Dismiss(popup(1)));
        assert!(gestures.iter().all(|g| g.focus == Some(popup(1))));
    }

    #[test]
    fn test_fast_fling_dismisses_short_drag() {
        let mut interpreter = GestureInterpreter::new();
        let gestures = drag(&mut interpreter, &[(200.0, 10.0, 0), (170.0, 10.0, 50), (140.0, 10.0, 100)], true);

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::Dismiss(popup(1)));
    }

    #[test]
    fn test_fling_against_travel_snaps_back() {
        let mut interpreter = GestureInterpreter::new();
        // Dragged right, then flicked back left before release
        let gestures = drag(
            &mut interpreter,
            &[(0.0, 10.0, 0), (100.0, 10.0, 500), (60.0, 10.0, 550)],
            true,
        );

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::None);
    }

    #[test]
    fn test_short_slow_drag_snaps_back() {
        let mut interpreter = GestureInterpreter::new();
        let gestures = drag(&mut interpreter, &[(0.0, 10.0, 0), (40.0, 10.0, 1000), (60.0, 10.0, 2000)], true);

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::None);
    }

    #[test]
    fn test_non_dismissible_snaps_back() {
        let mut interpreter = GestureInterpreter::new();
        let gestures = drag(&mut interpreter, &[(0.0, 10.0, 0), (300.0, 10.0, 100), (300.0, 10.0, 200)], false);

        assert_eq!(gestures.last().unwrap().intent, GestureIntent::None);
    }

    #[test]
    fn test_downward_drag_expands_once() {
        let mut interpreter = GestureInterpreter::new();
        let gestures = drag(
            &mut interpreter,
            &[(10.0, 0.0, 0), (10.0, 30.0, 100), (10.0, 60.0, 200), (10.0, 90.0, 300), (10.0, 90.0, 400)],
            true,
        );

        let expands = gestures
            .iter()
            .filter(|g| g.intent == GestureIntent::Expand(popup(1)))
            .count();
        assert_eq!(expands, 1);
        assert_eq!(gestures.last().unwrap().intent, GestureIntent::None);
    }

    #[test]
    fn test_touch_outside() {
        let mut interpreter = GestureInterpreter::new();
        let gesture = interpreter.feed(&sample(PointerPhase::Down, None, 0.0, 500.0, 0), true);
        assert_eq!(gesture.intent, GestureIntent::TouchOutside);
        assert_eq!(gesture.focus, None);

        let gesture = interpreter.feed(&sample(PointerPhase::Outside, None, 0.0, 500.0, 0), true);
        assert_eq!(gesture.intent, GestureIntent::TouchOutside);
    }

    #[test]
    fn test_touch_is_exclusive() {
        let mut interpreter = GestureInterpreter::new();
        interpreter.feed(&sample(PointerPhase::Down, Some(1), 0.0, 0.0, 0), true);

        let second = interpreter.feed(&sample(PointerPhase::Down, Some(2), 0.0, 100.0, 10), true);
        assert_eq!(second.focus, Some(popup(1)));
        assert_eq!(second.intent, GestureIntent::None);

        // Moves over another popup still belong to the first one
        let moved = interpreter.feed(&sample(PointerPhase::Move, Some(2), 0.0, 5.0, 20), true);
        assert_eq!(moved.focus, Some(popup(1)));
    }

    #[test]
    fn test_cancel_and_forget_end_gesture() {
        let mut interpreter = GestureInterpreter::new();
        interpreter.feed(&sample(PointerPhase::Down, Some(1), 0.0, 0.0, 0), true);
        let cancelled = interpreter.feed(&sample(PointerPhase::Cancel, Some(1), 0.0, 0.0, 5), true);
        assert_eq!(cancelled.focus, Some(popup(1)));
        assert!(interpreter.focused().is_none());

        interpreter.feed(&sample(PointerPhase::Down, Some(1), 0.0, 0.0, 10), true);
        interpreter.forget(&popup(2));
        assert_eq!(interpreter.focused(), Some(&popup(1)));
        interpreter.forget(&popup(1));
        assert!(interpreter.focused().is_none());

        let stray = interpreter.feed(&sample(PointerPhase::Up, Some(1), 300.0, 0.0, 20), true);
        assert_eq!(stray, Gesture::none(None));
    }

    #[test]
    fn test_phase_codes() {
        assert_eq!(PointerPhase::from_code(0), Some(PointerPhase::Down));
        assert_eq!(PointerPhase::from_code(4), Some(PointerPhase::Outside));
        assert_eq!(PointerPhase::from_code(9), None);
    }
}
