use std::{
    cell::RefCell,
    rc::Rc,
    time::{Duration, Instant},
};

use cursor_icon::CursorIcon;

use super::*;
use crate::backend::{
    headless::{HeadlessBackend, HeadlessGraphics, HeadlessHandle, HeadlessWindow, JournalEntry},
    input::Axis,
    EventKind,
};

type Manager = WindowManager<HeadlessBackend, HeadlessGraphics>;

fn manager() -> (Manager, HeadlessHandle) {
    manager_with(ManagerConfig::default())
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn manager_with(config: ManagerConfig) -> (Manager, HeadlessHandle) {
    init_logging();
    let (backend, handle) = HeadlessBackend::new();
    let graphics = HeadlessGraphics::new(&handle);
    (WindowManager::new(backend, graphics, config), handle)
}

fn recorder<T>() -> Rc<RefCell<Vec<T>>> {
    Rc::new(RefCell::new(Vec::new()))
}

fn position(journal: &[JournalEntry], entry: &JournalEntry) -> usize {
    journal
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("{:?} missing from {:?}", entry, journal))
}

fn assert_surface_before_window(journal: &[JournalEntry], window: HeadlessWindow) {
    let surface = position(journal, &JournalEntry::SurfaceDestroyed(window));
    let native = position(journal, &JournalEntry::WindowDestroyed(window));
    assert!(surface < native, "surface destroyed after its window: {:?}", journal);
}

fn assert_dense(wm: &Manager) {
    for index in 0..wm.window_count() {
        let id = WindowId::new(index);
        assert!(wm.native_window(id).is_some(), "{} has no window", id);
        assert!(wm.window_get_dimensions(id).is_ok());
    }
    assert!(wm.native_window(WindowId::new(wm.window_count())).is_none());
}

#[test]
fn first_window_creates_context_and_is_made_current() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("first", 640, 480).unwrap();
    assert_eq!(id, WindowId::new(0));

    let window = handle.windows()[0];
    let journal = handle.journal();
    assert_eq!(
        &journal[..3],
        &[
            JournalEntry::WindowCreated(window),
            JournalEntry::ContextCreated,
            JournalEntry::SurfaceCreated(window),
        ]
    );
    assert!(journal.contains(&JournalEntry::WindowShown(window)));
    assert!(journal.contains(&JournalEntry::MadeCurrent(window)));

    let state = handle.window(window).unwrap();
    assert_eq!(state.position, Point::new(10, 10));
    assert_eq!(state.title, "first");

    wm.window_create("second", 320, 240).unwrap();
    let contexts = handle
        .journal()
        .iter()
        .filter(|entry| **entry == JournalEntry::ContextCreated)
        .count();
    assert_eq!(contexts, 1);
}

#[test]
fn two_windows_one_destroyed() {
    let (mut wm, handle) = manager();
    let a = wm.window_create("A", 300, 200).unwrap();
    let b = wm.window_create("B", 400, 300).unwrap();
    assert_eq!(wm.window_get_dimensions(a).unwrap(), Size::new(300, 200));
    assert_eq!(wm.window_get_dimensions(b).unwrap(), Size::new(400, 300));

    wm.window_destroy(a).unwrap();
    assert_eq!(wm.window_count(), 1);
    assert!(!wm.should_close());
    assert_eq!(handle.windows().len(), 1);
    assert_eq!(wm.window_title(WindowId::new(0)), Some("B"));
    assert_eq!(wm.window_get_dimensions(WindowId::new(0)).unwrap(), Size::new(400, 300));
    assert_dense(&wm);
}

#[test]
fn resize_callback_fires_once_with_new_size() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 640, 480).unwrap();
    let id = wm.window_create("b", 320, 240).unwrap();
    let window = handle.windows()[1];

    let calls = recorder();
    let sink = calls.clone();
    wm.set_resize_callback(move |id, size| sink.borrow_mut().push((id, size)));

    handle.resize(window, (800, 600));
    handle.resize(window, (800, 600));
    assert!(!wm.should_close());

    assert_eq!(*calls.borrow(), vec![(id, Size::new(800, 600))]);
    assert_eq!(wm.window_get_dimensions(id).unwrap(), Size::new(800, 600));
}

#[test]
fn empty_registry_does_not_touch_the_backend() {
    let (mut wm, handle) = manager();
    handle.lose_connection();
    assert!(wm.should_close());
    assert!(wm.should_close());
}

#[test]
fn wheel_scrolls_without_clicking() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("a", 100, 100).unwrap();
    let window = handle.windows()[0];

    let scrolls = recorder();
    let clicks = recorder();
    let sink = scrolls.clone();
    wm.set_scroll_callback(move |id, axis| sink.borrow_mut().push((id, axis)));
    let sink = clicks.clone();
    wm.set_mouse_click_callback(move |id, button, state| sink.borrow_mut().push((id, button, state)));

    handle.button(window, 4, true);
    wm.should_close();
    assert_eq!(scrolls.borrow().len(), 1);
    let (scrolled, axis) = scrolls.borrow()[0];
    assert_eq!(scrolled, id);
    assert_eq!(axis.axis, Axis::Vertical);
    assert_eq!(axis.amount, 1.0);
    assert!(clicks.borrow().is_empty());

    handle.button(window, 4, false);
    wm.should_close();
    assert_eq!(scrolls.borrow().len(), 1);
    assert!(clicks.borrow().is_empty());

    handle.button(window, 1, true);
    handle.button(window, 1, false);
    wm.should_close();
    assert_eq!(
        *clicks.borrow(),
        vec![
            (id, MouseButton::Left, ButtonState::Pressed),
            (id, MouseButton::Left, ButtonState::Released)
        ]
    );
}

#[test]
fn close_request_removes_window_after_callback() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 100, 100).unwrap();
    wm.window_create("b", 100, 100).unwrap();
    let windows = handle.windows();

    let closed = recorder();
    let sink = closed.clone();
    wm.set_close_callback(move |id| sink.borrow_mut().push(id));

    handle.close_request(windows[0]);
    assert!(!wm.should_close());
    assert_eq!(*closed.borrow(), vec![WindowId::new(0)]);
    assert_eq!(wm.window_count(), 1);
    assert_eq!(wm.window_id(windows[1]), Some(WindowId::new(0)));
    assert_surface_before_window(&handle.journal(), windows[0]);

    handle.close_request(windows[1]);
    assert!(wm.should_close());
    assert_eq!(*closed.borrow(), vec![WindowId::new(0), WindowId::new(0)]);
}

#[test]
fn window_system_destroy_is_handled_like_close() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 100, 100).unwrap();
    let window = handle.windows()[0];

    let closed = recorder();
    let sink = closed.clone();
    wm.set_close_callback(move |id| sink.borrow_mut().push(id));

    handle.destroy(window);
    assert!(wm.should_close());
    assert_eq!(closed.borrow().len(), 1);

    // the window system already released the native window, only the surface is left to tear down
    let journal = handle.journal();
    let surface = position(&journal, &JournalEntry::SurfaceDestroyed(window));
    assert_eq!(surface, journal.len() - 1, "teardown continued after the surface: {:?}", journal);
    assert!(!journal.contains(&JournalEntry::WindowDestroyed(window)));
}

#[test]
fn remove_native_tears_down_surface_first() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 100, 100).unwrap();
    wm.window_create("b", 100, 100).unwrap();
    let windows = handle.windows();

    wm.remove_native(windows[0]);
    assert_eq!(wm.window_count(), 1);
    assert_eq!(wm.window_id(windows[1]), Some(WindowId::new(0)));
    assert_surface_before_window(&handle.journal(), windows[0]);

    // unknown and already removed handles are ignored
    wm.remove_native(windows[0]);
    wm.destroy();
    wm.remove_native(windows[1]);
    assert_eq!(wm.window_count(), 0);
}

#[test]
fn teardown_order_on_explicit_destroy() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("a", 100, 100).unwrap();
    let window = handle.windows()[0];
    wm.window_destroy(id).unwrap();
    assert_surface_before_window(&handle.journal(), window);
    assert!(matches!(wm.window_destroy(id), Err(WindowError::InvalidId(_))));
}

#[test]
fn destroy_releases_everything_in_order_once() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 100, 100).unwrap();
    wm.window_create("b", 100, 100).unwrap();
    let windows = handle.windows();

    wm.destroy();
    wm.destroy();
    drop(wm);

    let journal = handle.journal();
    for window in windows {
        assert_surface_before_window(&journal, window);
        assert!(
            position(&journal, &JournalEntry::WindowDestroyed(window))
                < position(&journal, &JournalEntry::ContextDestroyed)
        );
    }
    assert_eq!(journal.last(), Some(&JournalEntry::DisplayClosed));
    let closes = journal
        .iter()
        .filter(|entry| **entry == JournalEntry::DisplayClosed)
        .count();
    assert_eq!(closes, 1);
}

#[test]
fn destroyed_manager_rejects_windows() {
    let (mut wm, _handle) = manager();
    wm.destroy();
    assert!(matches!(wm.window_create("late", 1, 1), Err(WindowError::Destroyed)));
    assert!(wm.should_close());
    assert_eq!(wm.platform(), None);
}

#[test]
fn capacity_boundary() {
    let (mut wm, handle) = manager_with(ManagerConfig::builder().max_windows(3).build());
    for index in 0..3 {
        assert_eq!(wm.window_create("w", 10, 10).unwrap(), WindowId::new(index));
    }
    assert!(matches!(
        wm.window_create("w", 10, 10),
        Err(WindowError::CapacityReached(3))
    ));
    assert_eq!(wm.window_count(), 3);
    assert_eq!(handle.windows().len(), 3);

    wm.window_destroy(WindowId::new(1)).unwrap();
    assert_eq!(wm.window_create("w", 10, 10).unwrap(), WindowId::new(2));
}

#[test]
fn ids_shift_down_after_removal() {
    let (mut wm, handle) = manager();
    for _ in 0..4 {
        wm.window_create("w", 10, 10).unwrap();
    }
    let windows = handle.windows();

    wm.window_destroy(WindowId::new(1)).unwrap();
    assert_eq!(wm.window_id(windows[0]), Some(WindowId::new(0)));
    assert_eq!(wm.window_id(windows[1]), None);
    assert_eq!(wm.window_id(windows[2]), Some(WindowId::new(1)));
    assert_eq!(wm.window_id(windows[3]), Some(WindowId::new(2)));
    assert_dense(&wm);

    handle.close_request(windows[3]);
    wm.should_close();
    assert_eq!(wm.window_count(), 2);
    assert_dense(&wm);
}

#[test]
fn surface_failure_rolls_back() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 10, 10).unwrap();
    handle.fail_next_surface();

    assert!(matches!(wm.window_create("b", 10, 10), Err(WindowError::Graphics(_))));
    assert_eq!(wm.window_count(), 1);
    assert_eq!(handle.windows().len(), 1);

    let journal = handle.journal();
    let JournalEntry::WindowCreated(failed) = journal
        .iter()
        .rev()
        .find(|entry| matches!(entry, JournalEntry::WindowCreated(_)))
        .cloned()
        .unwrap()
    else {
        unreachable!()
    };
    assert!(journal.contains(&JournalEntry::WindowDestroyed(failed)));
    assert!(!journal.contains(&JournalEntry::WindowShown(failed)));
}

#[test]
fn native_failure_leaves_no_trace() {
    let (mut wm, handle) = manager();
    handle.fail_next_window();
    assert!(matches!(wm.window_create("a", 10, 10), Err(WindowError::Backend(_))));
    assert_eq!(wm.window_count(), 0);
    assert!(!handle.journal().contains(&JournalEntry::ContextCreated));

    assert_eq!(wm.window_create("a", 10, 10).unwrap(), WindowId::new(0));
}

#[test]
fn dispatch_is_bounded_per_call() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 10, 10).unwrap();
    let window = handle.windows()[0];

    let moves = recorder();
    let sink = moves.clone();
    wm.set_mouse_move_callback(move |_, location| sink.borrow_mut().push(location));

    for x in 0..15 {
        handle.motion(window, (x as f64, 0.0));
    }
    wm.should_close();
    assert_eq!(moves.borrow().len(), EVENTS_PER_CALL);
    assert_eq!(handle.pending_events(), 15 - EVENTS_PER_CALL);

    wm.should_close();
    assert_eq!(moves.borrow().len(), 15);
    assert_eq!(moves.borrow()[14], Point::new(14.0, 0.0));
}

#[test]
fn unknown_windows_are_skipped() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 10, 10).unwrap();
    wm.window_create("b", 10, 10).unwrap();
    let stale = handle.windows()[1];
    wm.window_destroy(WindowId::new(1)).unwrap();

    let closed = recorder();
    let sink = closed.clone();
    wm.set_close_callback(move |id| sink.borrow_mut().push(id));

    handle.close_request(stale);
    assert!(!wm.should_close());
    assert!(closed.borrow().is_empty());
    assert_eq!(wm.window_count(), 1);
}

#[test]
fn input_reaches_callbacks() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("a", 10, 10).unwrap();
    let window = handle.windows()[0];

    let log = recorder::<String>();
    let sink = log.clone();
    wm.set_keyboard_enter_callback(move |id| sink.borrow_mut().push(format!("enter {}", id.index())));
    let sink = log.clone();
    wm.set_keyboard_leave_callback(move |id| sink.borrow_mut().push(format!("leave {}", id.index())));
    let sink = log.clone();
    wm.set_keyboard_callback(move |_, key| {
        sink.borrow_mut()
            .push(format!("key {} {} {}", key.text, key.keycode, key.state.is_pressed()))
    });
    let sink = log.clone();
    wm.set_mouse_enter_callback(move |_, at| sink.borrow_mut().push(format!("in {} {}", at.x, at.y)));
    let sink = log.clone();
    wm.set_mouse_leave_callback(move |_| sink.borrow_mut().push("out".into()));
    let sink = log.clone();
    wm.set_drag_n_drop_callback(move |_, dropped| {
        sink.borrow_mut().push(format!("drop {} {}", dropped.mime, dropped.data))
    });
    let sink = log.clone();
    wm.set_frame_update_callback(move |id| sink.borrow_mut().push(format!("frame {}", id.index())));

    handle.focus(window, true);
    handle.key(window, true, "a", 30);
    handle.key(window, false, "Escape", 1);
    handle.push(window, EventKind::PointerEnter(Point::new(1.0, 2.0)));
    handle.push(window, EventKind::PointerLeave);
    handle.drop_files(window, &["file:///tmp/a"], (0.0, 0.0));
    handle.push(window, EventKind::Exposed);
    handle.focus(window, false);
    wm.should_close();

    assert_eq!(
        *log.borrow(),
        vec![
            format!("enter {}", id.index()),
            "key a 30 true".to_string(),
            "key Escape 1 false".to_string(),
            "in 1 2".to_string(),
            "out".to_string(),
            "drop text/uri-list file:///tmp/a".to_string(),
            "frame 0".to_string(),
            "leave 0".to_string(),
        ]
    );
}

#[test]
fn cursor_is_applied_to_existing_and_new_windows() {
    let (mut wm, handle) = manager();
    wm.window_create("a", 10, 10).unwrap();
    wm.set_cursor(CursorIcon::Pointer);
    wm.window_create("b", 10, 10).unwrap();

    for window in handle.windows() {
        assert_eq!(handle.window(window).unwrap().cursor, CursorIcon::Pointer);
    }
    assert_eq!(wm.cursor(), CursorIcon::Pointer);
}

#[test]
fn swap_presents_surface_or_requests_redraw() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("a", 10, 10).unwrap();
    let window = handle.windows()[0];
    wm.swap_buffers(id).unwrap();
    assert!(handle.journal().contains(&JournalEntry::BuffersSwapped(window)));

    let (backend, handle) = HeadlessBackend::new();
    let mut wm = WindowManager::without_graphics(backend);
    let id = wm.window_create("a", 10, 10).unwrap();
    let window = handle.windows()[0];
    wm.swap_buffers(id).unwrap();
    assert!(handle.journal().contains(&JournalEntry::RedrawRequested(window)));
    assert!(wm.proc_address("glClear").is_null());
}

#[test]
fn window_update_paces_frames() {
    let (mut wm, _handle) = manager_with(ManagerConfig::builder().target_fps(60).build());
    let id = wm.window_create("a", 10, 10).unwrap();

    let frames = recorder();
    let sink = frames.clone();
    wm.set_frame_update_callback(move |id| sink.borrow_mut().push(id));

    let start = Instant::now();
    wm.window_update(id).unwrap();
    wm.window_update(id).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(16));
    assert_eq!(frames.borrow().len(), 2);
    assert!(wm.window_fps(id).unwrap() > 0.0);
    assert!(matches!(
        wm.window_update(WindowId::new(5)),
        Err(WindowError::InvalidId(_))
    ));
}

#[test]
fn attributes_reach_the_backend() {
    let (mut wm, handle) = manager();
    let id = wm.window_create("a", 10, 10).unwrap();
    let window = handle.windows()[0];

    wm.window_is_resizable(id, false).unwrap();
    wm.window_toggle_decorations(id, false).unwrap();
    wm.set_window_opacity(id, 0.5).unwrap();
    wm.set_window_blur(id, true, 12).unwrap();
    wm.set_window_background_transparent(id).unwrap();

    let state = handle.window(window).unwrap();
    assert!(!state.resizable);
    assert!(!state.decorations);
    assert_eq!(state.opacity, 0.5);
    assert_eq!(state.blur, Some(12));
    assert!(state.transparent);

    assert!(matches!(
        wm.set_window_opacity(WindowId::new(3), 1.0),
        Err(WindowError::InvalidId(_))
    ));
}

#[test]
fn clipboard_round_trip() {
    let (mut wm, handle) = manager();
    assert!(wm.get_from_clipboard().is_err());
    wm.attach_to_clipboard("text/plain", "hello").unwrap();
    assert_eq!(wm.get_from_clipboard().unwrap(), "hello");
    assert_eq!(handle.clipboard().as_deref(), Some("hello"));
}

#[test]
fn swap_interval_reaches_the_binder() {
    let (mut wm, _handle) = manager();
    wm.swap_interval(0).unwrap();
    assert_eq!(wm.graphics().swap_interval(), 0);
}
