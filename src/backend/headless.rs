//! Implementation of a backend without a display server.
//!
//! The headless backend keeps its windows in memory. Events are injected through a
//! [`HeadlessHandle`] and come out of [`Backend::poll_event`] in the order they were
//! injected, exactly like a window system would report them.
//!
//! Every request that would reach a real window system or graphics driver is recorded in
//! a journal, which makes the headless backend useful to test code built on top of the
//! window manager:
//!
//! ```
//! use glps::backend::headless::{HeadlessBackend, HeadlessGraphics, JournalEntry};
//! use glps::WindowManager;
//!
//! let (backend, handle) = HeadlessBackend::new();
//! let graphics = HeadlessGraphics::new(&handle);
//! let mut wm = WindowManager::with_graphics(backend, graphics);
//!
//! let id = wm.window_create("headless", 320, 240).unwrap();
//! handle.close_request(handle.windows()[0]);
//! assert!(wm.should_close());
//! assert!(wm.window_count() == 0 && id.index() == 0);
//! assert!(handle.journal().contains(&JournalEntry::ContextCreated));
//! ```

use std::{
    cell::RefCell,
    collections::{BTreeMap, VecDeque},
    fmt,
    rc::Rc,
};

use cursor_icon::CursorIcon;
use tracing::{debug, info, info_span, trace};

use super::{
    graphics::{GraphicsBinder, GraphicsError},
    input::{button_action, ButtonAction, ButtonState, DropEvent, KeyEvent},
    Backend, BackendError, BackendEvent, ClipboardError, EventKind, NativeDisplay, NativeWindow, Platform,
};
use crate::utils::{Point, Size};

/// A window of the headless backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HeadlessWindow(u64);

/// A request recorded by the headless backend or graphics binder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    /// A window was created
    WindowCreated(HeadlessWindow),
    /// A window was shown
    WindowShown(HeadlessWindow),
    /// A window was destroyed
    WindowDestroyed(HeadlessWindow),
    /// The cursor of a window was changed
    CursorSet(HeadlessWindow, CursorIcon),
    /// A repaint was requested for a window
    RedrawRequested(HeadlessWindow),
    /// The shared graphics context was created
    ContextCreated,
    /// A window surface was created
    SurfaceCreated(HeadlessWindow),
    /// A window surface was destroyed
    SurfaceDestroyed(HeadlessWindow),
    /// The context was made current on a window surface
    MadeCurrent(HeadlessWindow),
    /// A window surface was presented
    BuffersSwapped(HeadlessWindow),
    /// The shared graphics context was destroyed
    ContextDestroyed,
    /// The display connection was closed
    DisplayClosed,
}

/// State of a headless window, as seen by the window system
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    /// Window title
    pub title: String,
    /// Current size
    pub size: Size<u32>,
    /// Position the window was created at
    pub position: Point<i32>,
    /// Whether the window was shown
    pub visible: bool,
    /// Whether interactive resizing is allowed
    pub resizable: bool,
    /// Whether decorations are shown
    pub decorations: bool,
    /// Window opacity
    pub opacity: f32,
    /// Blur radius, if blur is enabled
    pub blur: Option<u32>,
    /// Whether the background is transparent
    pub transparent: bool,
    /// Current cursor
    pub cursor: CursorIcon,
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_window: u64,
    windows: BTreeMap<HeadlessWindow, WindowState>,
    queue: VecDeque<BackendEvent<HeadlessWindow>>,
    journal: Vec<JournalEntry>,
    clipboard: Option<String>,
    connection_lost: bool,
    closed: bool,
    fail_next_window: bool,
    fail_next_surface: bool,
    fail_context: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct InjectedFailure(&'static str);

/// Backend keeping its windows in memory
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
    span: tracing::Span,
}

impl fmt::Debug for HeadlessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessBackend")
            .field("windows", &self.state.borrow().windows.len())
            .finish_non_exhaustive()
    }
}

impl HeadlessBackend {
    /// Create a new headless backend, along with the handle used to drive it
    pub fn new() -> (HeadlessBackend, HeadlessHandle) {
        let span = info_span!("backend_headless");
        let _guard = span.enter();
        info!("Creating headless backend");

        let state = Rc::new(RefCell::new(HeadlessState::default()));
        let handle = HeadlessHandle { state: state.clone() };
        drop(_guard);
        (HeadlessBackend { state, span }, handle)
    }

    fn with_window<T>(
        &self,
        window: HeadlessWindow,
        f: impl FnOnce(&mut WindowState) -> T,
    ) -> Result<T, BackendError> {
        let mut state = self.state.borrow_mut();
        let window = state.windows.get_mut(&window).ok_or(BackendError::UnknownWindow)?;
        Ok(f(window))
    }
}

impl Backend for HeadlessBackend {
    type Window = HeadlessWindow;

    fn platform(&self) -> Platform {
        Platform::Headless
    }

    fn native_display(&self) -> NativeDisplay {
        NativeDisplay::Headless
    }

    fn native_window(&self, window: HeadlessWindow) -> NativeWindow {
        NativeWindow::Headless(window.0)
    }

    fn create_window(
        &mut self,
        title: &str,
        position: Point<i32>,
        size: Size<u32>,
    ) -> Result<HeadlessWindow, BackendError> {
        let _guard = self.span.enter();
        let mut state = self.state.borrow_mut();
        if state.closed || state.connection_lost {
            return Err(BackendError::ConnectionLost);
        }
        if std::mem::take(&mut state.fail_next_window) {
            return Err(BackendError::Platform(Box::new(InjectedFailure(
                "window creation failed",
            ))));
        }

        let window = HeadlessWindow(state.next_window);
        state.next_window += 1;
        state.windows.insert(
            window,
            WindowState {
                title: title.to_owned(),
                size,
                position,
                visible: false,
                resizable: true,
                decorations: true,
                opacity: 1.0,
                blur: None,
                transparent: false,
                cursor: CursorIcon::Default,
            },
        );
        state.journal.push(JournalEntry::WindowCreated(window));
        debug!(?window, title, "Created window");
        Ok(window)
    }

    fn show_window(&mut self, window: HeadlessWindow) -> Result<(), BackendError> {
        self.with_window(window, |state| state.visible = true)?;
        self.state.borrow_mut().journal.push(JournalEntry::WindowShown(window));
        Ok(())
    }

    fn destroy_window(&mut self, window: HeadlessWindow) {
        let mut state = self.state.borrow_mut();
        if state.windows.remove(&window).is_some() {
            state.journal.push(JournalEntry::WindowDestroyed(window));
        }
    }

    fn window_size(&self, window: HeadlessWindow) -> Result<Size<u32>, BackendError> {
        self.with_window(window, |state| state.size)
    }

    fn set_resizable(&mut self, window: HeadlessWindow, resizable: bool) -> Result<(), BackendError> {
        self.with_window(window, |state| state.resizable = resizable)
    }

    fn set_decorations(&mut self, window: HeadlessWindow, enabled: bool) -> Result<(), BackendError> {
        self.with_window(window, |state| state.decorations = enabled)
    }

    fn set_opacity(&mut self, window: HeadlessWindow, opacity: f32) -> Result<(), BackendError> {
        self.with_window(window, |state| state.opacity = opacity.clamp(0.0, 1.0))
    }

    fn set_blur(&mut self, window: HeadlessWindow, enabled: bool, radius: u32) -> Result<(), BackendError> {
        self.with_window(window, |state| state.blur = enabled.then_some(radius))
    }

    fn set_background_transparent(&mut self, window: HeadlessWindow) -> Result<(), BackendError> {
        self.with_window(window, |state| state.transparent = true)
    }

    fn set_cursor(&mut self, window: HeadlessWindow, icon: CursorIcon) -> Result<(), BackendError> {
        self.with_window(window, |state| state.cursor = icon)?;
        self.state
            .borrow_mut()
            .journal
            .push(JournalEntry::CursorSet(window, icon));
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<BackendEvent<HeadlessWindow>>, BackendError> {
        let mut state = self.state.borrow_mut();
        if state.connection_lost {
            return Err(BackendError::ConnectionLost);
        }
        let event = state.queue.pop_front();
        if let Some(event) = event.as_ref() {
            trace!(?event, "Polled event");
        }
        Ok(event)
    }

    fn request_redraw(&mut self, window: HeadlessWindow) -> Result<(), BackendError> {
        self.with_window(window, |_| ())?;
        self.state
            .borrow_mut()
            .journal
            .push(JournalEntry::RedrawRequested(window));
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        if self.state.borrow().connection_lost {
            return Err(BackendError::ConnectionLost);
        }
        Ok(())
    }

    fn set_clipboard(&mut self, _mime: &str, data: &str) -> Result<(), ClipboardError> {
        self.state.borrow_mut().clipboard = Some(data.to_owned());
        Ok(())
    }

    fn clipboard(&mut self) -> Result<String, ClipboardError> {
        self.state.borrow().clipboard.clone().ok_or(ClipboardError::Empty)
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        if !state.closed {
            state.closed = true;
            state.journal.push(JournalEntry::DisplayClosed);
        }
    }
}

impl Drop for HeadlessBackend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Handle driving a [`HeadlessBackend`] from the outside
///
/// Cloning the handle is cheap, all clones drive the same backend.
#[derive(Clone)]
pub struct HeadlessHandle {
    state: Rc<RefCell<HeadlessState>>,
}

impl fmt::Debug for HeadlessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHandle").finish_non_exhaustive()
    }
}

impl HeadlessHandle {
    /// Queue an arbitrary event
    pub fn push(&self, window: HeadlessWindow, kind: EventKind) {
        self.state
            .borrow_mut()
            .queue
            .push_back(BackendEvent { window, kind });
    }

    /// The user clicked the close button of a window
    pub fn close_request(&self, window: HeadlessWindow) {
        self.push(window, EventKind::CloseRequested);
    }

    /// The window system destroyed a window on its own
    pub fn destroy(&self, window: HeadlessWindow) {
        self.state.borrow_mut().windows.remove(&window);
        self.push(window, EventKind::Destroyed);
    }

    /// The window system resized a window
    pub fn resize(&self, window: HeadlessWindow, size: impl Into<Size<u32>>) {
        let size = size.into();
        if let Some(state) = self.state.borrow_mut().windows.get_mut(&window) {
            state.size = size;
        }
        self.push(window, EventKind::Resized(size));
    }

    /// The pointer moved inside a window
    pub fn motion(&self, window: HeadlessWindow, location: impl Into<Point<f64>>) {
        self.push(window, EventKind::PointerMotion(location.into()));
    }

    /// A pointer button changed state, using the core X11 button numbering
    ///
    /// Buttons 4 to 7 are scroll wheel clicks and only produce an event when pressed.
    pub fn button(&self, window: HeadlessWindow, index: u8, pressed: bool) {
        match button_action(index) {
            ButtonAction::Button(button) => self.push(
                window,
                EventKind::PointerButton {
                    button,
                    state: ButtonState::from(pressed),
                },
            ),
            ButtonAction::Scroll(axis) if pressed => self.push(window, EventKind::PointerAxis(axis)),
            ButtonAction::Scroll(_) => {}
        }
    }

    /// A key changed state
    pub fn key(&self, window: HeadlessWindow, pressed: bool, text: &str, keycode: u32) {
        self.push(
            window,
            EventKind::Key(KeyEvent {
                state: pressed.into(),
                text: text.to_owned(),
                keycode,
            }),
        );
    }

    /// A window gained or lost keyboard focus
    pub fn focus(&self, window: HeadlessWindow, focused: bool) {
        let kind = if focused {
            EventKind::FocusIn
        } else {
            EventKind::FocusOut
        };
        self.push(window, kind);
    }

    /// Files were dropped onto a window
    pub fn drop_files(&self, window: HeadlessWindow, uris: &[&str], location: impl Into<Point<f64>>) {
        self.push(
            window,
            EventKind::Dropped(DropEvent {
                mime: "text/uri-list".into(),
                data: uris.join("\r\n"),
                location: location.into(),
            }),
        );
    }

    /// Let the next window creation fail
    pub fn fail_next_window(&self) {
        self.state.borrow_mut().fail_next_window = true;
    }

    /// Let the next surface creation of a [`HeadlessGraphics`] fail
    pub fn fail_next_surface(&self) {
        self.state.borrow_mut().fail_next_surface = true;
    }

    /// Let context creation of a [`HeadlessGraphics`] fail
    pub fn fail_context(&self) {
        self.state.borrow_mut().fail_context = true;
    }

    /// Simulate a lost display connection
    pub fn lose_connection(&self) {
        self.state.borrow_mut().connection_lost = true;
    }

    /// Live windows, in creation order
    pub fn windows(&self) -> Vec<HeadlessWindow> {
        self.state.borrow().windows.keys().copied().collect()
    }

    /// State of a live window
    pub fn window(&self, window: HeadlessWindow) -> Option<WindowState> {
        self.state.borrow().windows.get(&window).cloned()
    }

    /// Number of events not yet polled
    pub fn pending_events(&self) -> usize {
        self.state.borrow().queue.len()
    }

    /// Current clipboard content
    pub fn clipboard(&self) -> Option<String> {
        self.state.borrow().clipboard.clone()
    }

    /// Every recorded request, oldest first
    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.borrow().journal.clone()
    }
}

/// Surface of the [`HeadlessGraphics`] binder
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessSurface(HeadlessWindow);

impl HeadlessSurface {
    /// Window this surface belongs to
    pub fn window(&self) -> HeadlessWindow {
        self.0
    }
}

/// Graphics binder recording into the journal of a [`HeadlessBackend`]
pub struct HeadlessGraphics {
    state: Rc<RefCell<HeadlessState>>,
    context: bool,
    swap_interval: u32,
}

impl fmt::Debug for HeadlessGraphics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessGraphics")
            .field("context", &self.context)
            .field("swap_interval", &self.swap_interval)
            .finish()
    }
}

impl HeadlessGraphics {
    /// Create a binder for the backend driven by `handle`
    pub fn new(handle: &HeadlessHandle) -> HeadlessGraphics {
        HeadlessGraphics {
            state: handle.state.clone(),
            context: false,
            swap_interval: 1,
        }
    }

    /// Current swap interval
    pub fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    fn record(&self, entry: JournalEntry) {
        self.state.borrow_mut().journal.push(entry);
    }
}

impl GraphicsBinder for HeadlessGraphics {
    type Surface = HeadlessSurface;

    fn create_context(&mut self, display: &NativeDisplay) -> Result<(), GraphicsError> {
        if self.context {
            return Ok(());
        }
        if *display != NativeDisplay::Headless {
            return Err(GraphicsError::UnsupportedWindow);
        }
        if self.state.borrow().fail_context {
            return Err(GraphicsError::Context(Box::new(InjectedFailure(
                "context creation failed",
            ))));
        }
        self.context = true;
        self.record(JournalEntry::ContextCreated);
        Ok(())
    }

    fn has_context(&self) -> bool {
        self.context
    }

    fn bind_surface(&mut self, window: &NativeWindow) -> Result<Option<HeadlessSurface>, GraphicsError> {
        if !self.context {
            return Err(GraphicsError::NoContext);
        }
        let NativeWindow::Headless(id) = *window else {
            return Err(GraphicsError::UnsupportedWindow);
        };
        if std::mem::take(&mut self.state.borrow_mut().fail_next_surface) {
            return Err(GraphicsError::Surface(Box::new(InjectedFailure(
                "surface creation failed",
            ))));
        }
        let window = HeadlessWindow(id);
        self.record(JournalEntry::SurfaceCreated(window));
        Ok(Some(HeadlessSurface(window)))
    }

    fn destroy_surface(&mut self, surface: HeadlessSurface) {
        self.record(JournalEntry::SurfaceDestroyed(surface.0));
    }

    fn make_current(&mut self, surface: &HeadlessSurface) -> Result<(), GraphicsError> {
        if !self.context {
            return Err(GraphicsError::NoContext);
        }
        self.record(JournalEntry::MadeCurrent(surface.0));
        Ok(())
    }

    fn swap_buffers(&mut self, surface: &HeadlessSurface) -> Result<(), GraphicsError> {
        if !self.context {
            return Err(GraphicsError::NoContext);
        }
        self.record(JournalEntry::BuffersSwapped(surface.0));
        Ok(())
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<(), GraphicsError> {
        self.swap_interval = interval;
        Ok(())
    }

    fn destroy(&mut self) {
        if std::mem::take(&mut self.context) {
            self.record(JournalEntry::ContextDestroyed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::input::{Axis, MouseButton};

    #[test]
    fn events_come_out_in_order() {
        let (mut backend, handle) = HeadlessBackend::new();
        let window = backend
            .create_window("test", Point::new(10, 10), Size::new(64, 64))
            .unwrap();

        handle.motion(window, (1.0, 2.0));
        handle.button(window, 1, true);
        handle.button(window, 5, true);
        handle.button(window, 5, false);

        let kinds: Vec<_> = std::iter::from_fn(|| backend.poll_event().unwrap())
            .map(|event| event.kind)
            .collect();
        assert_eq!(kinds.len(), 3);
        assert_eq!(kinds[0], EventKind::PointerMotion(Point::new(1.0, 2.0)));
        assert_eq!(
            kinds[1],
            EventKind::PointerButton {
                button: MouseButton::Left,
                state: ButtonState::Pressed
            }
        );
        match &kinds[2] {
            EventKind::PointerAxis(axis) => {
                assert_eq!(axis.axis, Axis::Vertical);
                assert_eq!(axis.amount, -1.0);
            }
            other => panic!("expected a scroll, got {:?}", other),
        }
    }

    #[test]
    fn lost_connection_fails_polling() {
        let (mut backend, handle) = HeadlessBackend::new();
        handle.lose_connection();
        assert!(matches!(backend.poll_event(), Err(BackendError::ConnectionLost)));
    }

    #[test]
    fn close_is_idempotent() {
        let (mut backend, handle) = HeadlessBackend::new();
        backend.close();
        backend.close();
        drop(backend);
        assert_eq!(handle.journal(), vec![JournalEntry::DisplayClosed]);
    }

    #[test]
    fn context_is_created_once() {
        let (_backend, handle) = HeadlessBackend::new();
        let mut graphics = HeadlessGraphics::new(&handle);
        graphics.create_context(&NativeDisplay::Headless).unwrap();
        graphics.create_context(&NativeDisplay::Headless).unwrap();
        graphics.destroy();
        graphics.destroy();
        assert_eq!(
            handle.journal(),
            vec![JournalEntry::ContextCreated, JournalEntry::ContextDestroyed]
        );
    }
}
