use mygestures::actions::keys::keysym_from_name;
use mygestures::actions::window::{WindowId, WindowOp};
use mygestures::actions::DispatchReport;
use mygestures::mouse_gestures::db::{load_gestures, shared_config, DEFAULT_GESTURES};
use mygestures::mouse_gestures::mock::{BackendCall, RecordingBackend};
use mygestures::mouse_gestures::replay::{FocusTracker, JsonLinesSource};
use mygestures::mouse_gestures::{
    ConfigReloader, GestureConfig, GestureOutcome, GestureService, MatchedSequence, Point,
    PointerEvent, PointerEventSource, WindowInfo,
};
use mygestures::settings::{Modifier, NoMatchBehavior, Settings};
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const GESTURES: &str = r#"{
    "movements": [{ "name": "Left", "expression": "^L$" }],
    "contexts": [
        { "name": "desktop", "class": "^Desktop$", "abort": true },
        { "name": "browser", "class": "firefox", "gestures": [
            { "name": "back", "movement": "Left", "actions": [{ "kind": "keypress", "value": "Alt+Left" }] }
        ] },
        { "name": "global", "gestures": [
            { "name": "minimize", "pattern": "^D$", "actions": [{ "kind": "iconify" }] },
            { "name": "launch", "pattern": "^U$", "actions": [
                { "kind": "exec", "value": "xterm" },
                { "kind": "keypress", "value": "Control+t" }
            ] },
            { "name": "broken-keys", "pattern": "^R$", "actions": [
                { "kind": "keypress", "value": "Control+t" },
                { "kind": "exec", "value": "xterm" }
            ] },
            { "name": "reload", "pattern": "^79$", "actions": [{ "kind": "reconfigure" }] }
        ] }
    ]
}"#;

fn config_from(dir: &Path, json: &str) -> (std::path::PathBuf, GestureConfig) {
    let path = dir.join("mygestures.json");
    std::fs::write(&path, json).unwrap();
    let report = load_gestures(&path).unwrap();
    assert!(report.errors.is_empty(), "{:?}", report.errors);
    (path, report.config)
}

fn service_with(
    settings: &Settings,
    backend: &RecordingBackend,
) -> (tempfile::TempDir, GestureService) {
    let dir = tempfile::tempdir().unwrap();
    let (path, config) = config_from(dir.path(), GESTURES);
    let shared = shared_config(config);
    let reloader = ConfigReloader::new(path, Arc::clone(&shared));
    let service = GestureService::new(
        settings,
        shared,
        Arc::new(backend.clone()),
        backend.backends(),
    )
    .with_reloader(reloader);
    (dir, service)
}

fn window(class: &str) -> WindowInfo {
    WindowInfo {
        id: Some(WindowId(77)),
        title: "some window".into(),
        class: class.into(),
    }
}

fn draw(service: &mut GestureService, points: &[(i32, i32)]) -> GestureOutcome {
    let (first, rest) = points.split_first().unwrap();
    service.handle_event(PointerEvent::Press { x: first.0, y: first.1, button: 3 });
    let (last, middle) = rest.split_last().unwrap();
    for &(x, y) in middle {
        assert_eq!(service.handle_event(PointerEvent::Motion { x, y }), GestureOutcome::Pending);
    }
    service.handle_event(PointerEvent::Release { x: last.0, y: last.1, button: 3 })
}

#[test]
fn matched_gesture_sends_keys_press_then_release() {
    let backend = RecordingBackend::with_window(window("firefox"));
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(200, 100), (150, 100), (100, 100)]);
    assert_eq!(
        outcome,
        GestureOutcome::Executed {
            context: "browser".into(),
            gesture: "back".into(),
            via: MatchedSequence::Advanced,
            report: DispatchReport {
                executed: 1,
                failed: 0,
                reload_requested: false,
            },
        }
    );

    let alt = keysym_from_name("Alt").unwrap();
    let left = keysym_from_name("Left").unwrap();
    assert_eq!(
        backend.calls(),
        vec![
            BackendCall::KeyDown(alt),
            BackendCall::KeyDown(left),
            BackendCall::KeyUp(alt),
            BackendCall::KeyUp(left),
        ]
    );
}

#[test]
fn window_operations_target_the_captured_window() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    draw(&mut service, &[(0, 0), (0, 80)]);
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Window(WindowOp::Iconify, WindowId(77))]
    );
}

#[test]
fn missing_window_id_is_not_fatal() {
    let backend = RecordingBackend::with_window(WindowInfo::default());
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(0, 0), (0, 80)]);
    let GestureOutcome::Executed { report, .. } = outcome else {
        panic!("expected execution, got {outcome:?}");
    };
    assert_eq!(report.failed, 1);
    assert!(backend.calls().is_empty());
}

#[test]
fn backend_failure_does_not_stop_the_list() {
    let backend = RecordingBackend::with_window(window("xterm"));
    backend.fail_commands(true);
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(0, 100), (0, 0)]);
    let GestureOutcome::Executed { gesture, report, .. } = outcome else {
        panic!("expected execution, got {outcome:?}");
    };
    assert_eq!(gesture, "launch");
    assert_eq!((report.executed, report.failed), (1, 1));
    assert_eq!(backend.calls().len(), 4);
}

#[test]
fn key_lookup_failure_aborts_remaining_actions() {
    let backend = RecordingBackend::with_window(window("xterm"));
    backend.unmap_key(keysym_from_name("t").unwrap());
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(0, 0), (100, 0)]);
    assert!(
        matches!(&outcome, GestureOutcome::Failed { gesture, .. } if gesture == "broken-keys"),
        "{outcome:?}"
    );
    // the modifier already held is let go and the exec never runs
    let ctrl = keysym_from_name("Control").unwrap();
    assert_eq!(
        backend.calls(),
        vec![BackendCall::KeyDown(ctrl), BackendCall::KeyUp(ctrl)]
    );
}

#[test]
fn abort_context_swallows_the_gesture() {
    let backend = RecordingBackend::with_window(window("Desktop"));
    let settings = Settings {
        no_match_behavior: NoMatchBehavior::PassThroughClick,
        ..Settings::default()
    };
    let (_dir, mut service) = service_with(&settings, &backend);

    let outcome = draw(&mut service, &[(0, 0), (0, 80)]);
    assert_eq!(outcome, GestureOutcome::Blocked { context: "desktop".into() });
    assert!(backend.calls().is_empty());
}

#[test]
fn sloppy_diagonal_reaches_the_fuzzy_pass() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(0, 0), (100, 100)]);
    assert!(
        matches!(
            &outcome,
            GestureOutcome::Executed { gesture, via: MatchedSequence::Basic, .. } if gesture == "minimize"
        ),
        "{outcome:?}"
    );
}

#[test]
fn unmatched_movement_follows_no_match_behavior() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let (_dir, mut service) = service_with(&Settings::default(), &backend);
    let outcome = draw(&mut service, &[(0, 0), (-100, 0), (-100, -100)]);
    assert_eq!(
        outcome,
        GestureOutcome::NoMatch {
            advanced: "LU".into(),
            basic: "LU".into(),
        }
    );
    assert!(backend.calls().is_empty());

    let backend = RecordingBackend::with_window(window("xterm"));
    let settings = Settings {
        no_match_behavior: NoMatchBehavior::PassThroughClick,
        ..Settings::default()
    };
    let (_dir, mut service) = service_with(&settings, &backend);
    let outcome = draw(&mut service, &[(0, 0), (-100, 0), (-100, -100)]);
    assert!(matches!(outcome, GestureOutcome::NoMatch { .. }), "{outcome:?}");
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Click {
            button: 3,
            at: Point::new(-100, -100)
        }]
    );
}

#[test]
fn click_without_movement_is_passed_through() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let (_dir, mut service) = service_with(&Settings::default(), &backend);

    let outcome = draw(&mut service, &[(10, 10), (12, 9), (11, 11)]);
    assert_eq!(outcome, GestureOutcome::PassedThrough);
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Click {
            button: 3,
            at: Point::new(11, 11)
        }]
    );
}

#[test]
fn practice_mode_only_reports() {
    let backend = RecordingBackend::with_window(window("firefox"));
    let settings = Settings {
        practice_mode: true,
        ..Settings::default()
    };
    let (_dir, mut service) = service_with(&settings, &backend);

    let outcome = draw(&mut service, &[(100, 0), (0, 0)]);
    assert_eq!(
        outcome,
        GestureOutcome::Practiced {
            context: "browser".into(),
            gesture: "back".into(),
            via: MatchedSequence::Advanced,
        }
    );
    assert!(backend.calls().is_empty());
}

#[test]
fn reconfigure_swaps_in_the_new_file_after_the_list() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let (dir, mut service) = service_with(&Settings::default(), &backend);
    let handle = service.config_handle();
    assert_eq!(handle.load().gesture_count(), 5);

    std::fs::write(dir.path().join("mygestures.json"), DEFAULT_GESTURES).unwrap();
    let outcome = draw(&mut service, &[(0, 0), (-40, -40), (0, -80)]);
    let GestureOutcome::Executed { gesture, report, .. } = outcome else {
        panic!("expected execution, got {outcome:?}");
    };
    assert_eq!(gesture, "reload");
    assert!(report.reload_requested);
    assert!(handle.load().context_by_name("Browsers").is_some());
}

#[test]
fn broken_file_keeps_the_running_config() {
    let backend = RecordingBackend::new();
    let (dir, service) = service_with(&Settings::default(), &backend);
    let handle = service.config_handle();
    let before = Arc::as_ptr(&handle.load_full());

    std::fs::write(dir.path().join("mygestures.json"), "{ not json").unwrap();
    let reloader = ConfigReloader::new(dir.path().join("mygestures.json"), Arc::clone(&handle));
    assert!(reloader.reload().is_err());
    service.reload();
    assert_eq!(Arc::as_ptr(&handle.load_full()), before);
}

#[test]
fn unreadable_file_keeps_the_running_config() {
    let backend = RecordingBackend::new();
    let (dir, service) = service_with(&Settings::default(), &backend);
    let handle = service.config_handle();
    let path = dir.path().join("mygestures.json");
    let reloader = ConfigReloader::new(&path, Arc::clone(&handle));
    let before = handle.load().gesture_count();
    assert!(before > 0);

    std::fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();
    assert!(reloader.reload().is_err());
    assert_eq!(handle.load().gesture_count(), before);

    std::fs::remove_file(&path).unwrap();
    assert!(reloader.reload().is_err());
    assert_eq!(handle.load().gesture_count(), before);
}

#[test]
fn run_consumes_a_replay_stream() {
    let backend = RecordingBackend::new();
    let focus = FocusTracker::new();
    let dir = tempfile::tempdir().unwrap();
    let (_, config) = config_from(dir.path(), GESTURES);
    let mut service = GestureService::new(
        &Settings::default(),
        shared_config(config),
        Arc::new(focus.clone()),
        backend.backends(),
    );

    let input = concat!(
        "{\"type\":\"focus\",\"title\":\"Docs\",\"class\":\"firefox\",\"id\":5}\n",
        "{\"type\":\"press\",\"x\":300,\"y\":300,\"button\":3}\n",
        "{\"type\":\"motion\",\"x\":250,\"y\":300}\n",
        "{\"type\":\"release\",\"x\":200,\"y\":300,\"button\":3}\n",
        "{\"type\":\"focus\",\"title\":\"shell\",\"class\":\"xterm\",\"id\":6}\n",
        "{\"type\":\"press\",\"x\":0,\"y\":0,\"button\":1}\n",
        "{\"type\":\"press\",\"x\":0,\"y\":0,\"button\":3}\n",
        "{\"type\":\"release\",\"x\":0,\"y\":90,\"button\":3}\n",
    );
    let mut source = JsonLinesSource::new(Cursor::new(input), focus);
    assert_eq!(service.run(&mut source), 2);
    assert_eq!(
        backend.calls().last(),
        Some(&BackendCall::Window(WindowOp::Iconify, WindowId(6)))
    );
}

#[test]
fn shutdown_flag_stops_the_loop() {
    let backend = RecordingBackend::new();
    let (_dir, mut service) = service_with(&Settings::default(), &backend);
    service.shutdown_handle().store(true, Ordering::SeqCst);

    let input = "{\"type\":\"press\",\"x\":0,\"y\":0,\"button\":3}\n";
    let mut source = JsonLinesSource::new(Cursor::new(input), FocusTracker::new());
    assert_eq!(service.run(&mut source), 0);
    assert!(!service.session().is_capturing());
}

struct ScriptedSource {
    events: VecDeque<PointerEvent>,
    grabbed: Option<(u8, Modifier)>,
    refuse_grab: bool,
}

impl ScriptedSource {
    fn new(events: impl IntoIterator<Item = PointerEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
            grabbed: None,
            refuse_grab: false,
        }
    }
}

impl PointerEventSource for ScriptedSource {
    fn next_event(&mut self) -> Option<PointerEvent> {
        self.events.pop_front()
    }

    fn grab(&mut self, button: u8, modifier: Modifier) -> anyhow::Result<()> {
        if self.refuse_grab {
            anyhow::bail!("button already grabbed");
        }
        self.grabbed = Some((button, modifier));
        Ok(())
    }
}

fn downward_drag() -> Vec<PointerEvent> {
    vec![
        PointerEvent::Press { x: 0, y: 0, button: 2 },
        PointerEvent::Release { x: 0, y: 90, button: 2 },
    ]
}

#[test]
fn run_grabs_the_configured_button_and_modifier() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let settings = Settings {
        button: 2,
        modifier: "ControlMask".into(),
        ..Settings::default()
    };
    let (_dir, mut service) = service_with(&settings, &backend);
    assert_eq!(service.modifier(), Modifier::Ctrl);

    let mut source = ScriptedSource::new(downward_drag());
    assert_eq!(service.run(&mut source), 1);
    assert_eq!(source.grabbed, Some((2, Modifier::Ctrl)));
    assert_eq!(
        backend.calls(),
        vec![BackendCall::Window(WindowOp::Iconify, WindowId(77))]
    );
}

#[test]
fn refused_grab_handles_no_events() {
    let backend = RecordingBackend::with_window(window("xterm"));
    let settings = Settings {
        button: 2,
        ..Settings::default()
    };
    let (_dir, mut service) = service_with(&settings, &backend);

    let mut source = ScriptedSource::new(downward_drag());
    source.refuse_grab = true;
    assert_eq!(service.run(&mut source), 0);
    assert_eq!(source.events.len(), 2);
    assert!(backend.calls().is_empty());
}

#[test]
fn unknown_modifier_falls_back_to_any() {
    let backend = RecordingBackend::new();
    let settings = Settings {
        modifier: "Hyper".into(),
        ..Settings::default()
    };
    let (_dir, service) = service_with(&settings, &backend);
    assert_eq!(service.modifier(), Modifier::Any);
}
