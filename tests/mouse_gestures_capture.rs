use mygestures::actions::window::WindowId;
use mygestures::mouse_gestures::mock::{NoFocusedWindow, RecordingBackend};
use mygestures::mouse_gestures::{
    CaptureOutcome, CaptureSession, Point, PointerEvent, WindowInfo, DELTA_MIN,
};

fn firefox() -> RecordingBackend {
    RecordingBackend::with_window(WindowInfo {
        id: Some(WindowId(9)),
        title: "Docs - Mozilla Firefox".into(),
        class: "firefox".into(),
    })
}

#[test]
fn other_buttons_are_ignored() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    let outcome = session.handle_event(PointerEvent::Press { x: 0, y: 0, button: 1 }, &windows);
    assert_eq!(outcome, CaptureOutcome::Ignored);
    assert!(!session.is_capturing());
    assert_eq!(
        session.handle_event(PointerEvent::Motion { x: 50, y: 0 }, &windows),
        CaptureOutcome::Ignored
    );
}

#[test]
fn release_without_strokes_passes_the_click_through() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    assert_eq!(session.press(Point::new(10, 10), 3), CaptureOutcome::Started);
    session.motion(Point::new(15, 12));
    let outcome = session.release(Point::new(12, 11), 3, &windows);
    assert_eq!(
        outcome,
        CaptureOutcome::PassThroughClick {
            button: 3,
            at: Point::new(12, 11)
        }
    );
    assert!(!session.is_capturing());
}

#[test]
fn release_point_counts_as_a_sample() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    session.press(Point::new(0, 0), 3);
    let CaptureOutcome::Captured(captured) = session.release(Point::new(100, 0), 3, &windows)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "R");
    assert_eq!(captured.basic_movements, "R");
    assert_eq!(captured.window_class, "firefox");
    assert_eq!(captured.window_id, Some(WindowId(9)));
    assert_eq!(captured.release_point, Point::new(100, 0));
}

#[test]
fn second_press_during_capture_is_ignored() {
    let windows = firefox();
    let mut session = CaptureSession::new(3, DELTA_MIN);
    session.press(Point::new(0, 0), 3);
    session.motion(Point::new(0, 40));
    assert_eq!(session.press(Point::new(0, 40), 3), CaptureOutcome::Ignored);
    // a release of another button leaves the capture running
    assert_eq!(
        session.release(Point::new(0, 40), 1, &windows),
        CaptureOutcome::Ignored
    );
    assert!(session.is_capturing());

    let CaptureOutcome::Captured(captured) = session.release(Point::new(40, 40), 3, &windows)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "DR");
}

#[test]
fn window_lookup_failure_yields_empty_window() {
    let mut session = CaptureSession::default();
    session.press(Point::new(0, 0), 3);
    let CaptureOutcome::Captured(captured) =
        session.release(Point::new(0, -80), 3, &NoFocusedWindow)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "U");
    assert!(captured.window_title.is_empty());
    assert!(captured.window_class.is_empty());
    assert_eq!(captured.window_id, None);
}

#[test]
fn a_new_press_starts_from_scratch() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    session.press(Point::new(0, 0), 3);
    session.release(Point::new(100, 0), 3, &windows);

    session.press(Point::new(100, 0), 3);
    let CaptureOutcome::Captured(captured) = session.release(Point::new(100, 100), 3, &windows)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "D");
}

#[test]
fn straight_line_sampled_every_ten_pixels_is_one_stroke() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    session.press(Point::new(0, 0), 3);
    for x in (10..100).step_by(10) {
        session.motion(Point::new(x, 0));
    }
    let CaptureOutcome::Captured(captured) = session.release(Point::new(100, 0), 3, &windows)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "R");
    assert_eq!(captured.basic_movements, "R");
}

#[test]
fn samples_at_opposite_ends_of_the_coordinate_range() {
    let windows = firefox();
    let mut session = CaptureSession::default();
    session.press(Point::new(i32::MIN, 0), 3);
    session.motion(Point::new(i32::MAX, 0));
    session.motion(Point::new(i32::MAX, i32::MIN));
    let CaptureOutcome::Captured(captured) =
        session.release(Point::new(i32::MIN, i32::MAX), 3, &windows)
    else {
        panic!("expected a captured movement");
    };
    assert_eq!(captured.advanced_movements, "RU1");
    assert_eq!(captured.basic_movements, "RUD");
}
