//! Implementation of the backend types using the Win32 API.
//!
//! All windows share one window class. Its window procedure turns the messages of a window
//! into [`BackendEvent`]s and queues them, [`Backend::poll_event`] pumps the message queue
//! of the calling thread until an event is available.
//!
//! Windows must be used from the thread that created the backend.

mod error;
mod keys;

use std::{
    cell::{Cell, RefCell},
    collections::{HashSet, VecDeque},
    ffi::{c_void, CStr},
    fmt,
    rc::Rc,
};

use cursor_icon::CursorIcon;
use tracing::{debug, info, info_span, trace, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{
            GetLastError, GlobalFree, BOOL, COLORREF, ERROR_CLASS_ALREADY_EXISTS, HANDLE, HGLOBAL, HINSTANCE, HWND,
            LPARAM, LRESULT, POINT, RECT, WPARAM,
        },
        Graphics::{
            Dwm::{DwmEnableBlurBehindWindow, DWM_BB_BLURREGION, DWM_BB_ENABLE, DWM_BLURBEHIND},
            Gdi::{BeginPaint, CreateRectRgn, DeleteObject, EndPaint, InvalidateRect, HRGN, PAINTSTRUCT},
        },
        System::{
            DataExchange::{CloseClipboard, EmptyClipboard, GetClipboardData, OpenClipboard, SetClipboardData},
            LibraryLoader::GetModuleHandleW,
            Memory::{GlobalAlloc, GlobalLock, GlobalUnlock, GMEM_MOVEABLE},
            Ole::CF_TEXT,
        },
        UI::{
            Input::KeyboardAndMouse::{
                GetKeyNameTextW, GetKeyboardState, MapVirtualKeyW, ToUnicode, TrackMouseEvent, MAPVK_VK_TO_VSC,
                TME_LEAVE, TRACKMOUSEEVENT,
            },
            Shell::{DragAcceptFiles, DragFinish, DragQueryFileW, DragQueryPoint, HDROP},
            WindowsAndMessaging::{
                AdjustWindowRectEx, CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetClientRect,
                GetMessageExtraInfo, GetWindowLongPtrW, LoadCursorW, PeekMessageW, RegisterClassW, SetCursor,
                SetLayeredWindowAttributes, SetWindowLongPtrW, SetWindowPos, ShowWindow, TranslateMessage,
                UnregisterClassW, UpdateWindow, CS_HREDRAW, CS_OWNDC, CS_VREDRAW, GWLP_USERDATA, GWL_EXSTYLE,
                GWL_STYLE, HCURSOR, HMENU, HTCLIENT, IDC_ARROW, IDC_CROSS, IDC_HAND, IDC_IBEAM, IDC_NO, IDC_SIZENS,
                IDC_SIZEWE, IDC_WAIT, LWA_ALPHA, MSG, PM_REMOVE, SWP_FRAMECHANGED, SWP_NOMOVE, SWP_NOSIZE,
                SWP_NOZORDER, SW_SHOW, WHEEL_DELTA, WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE, WM_DESTROY,
                WM_DROPFILES, WM_KEYDOWN, WM_KEYUP, WM_KILLFOCUS, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN,
                WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSELEAVE, WM_MOUSEMOVE, WM_MOUSEWHEEL, WM_NCDESTROY, WM_PAINT,
                WM_RBUTTONDOWN, WM_RBUTTONUP, WM_SETCURSOR, WM_SETFOCUS, WM_SIZE, WM_SYSKEYDOWN, WM_SYSKEYUP, WNDCLASSW, WS_CAPTION,
                WS_EX_LAYERED, WS_MAXIMIZEBOX, WS_MINIMIZEBOX, WS_OVERLAPPEDWINDOW, WS_POPUP, WS_SYSMENU,
                WS_THICKFRAME,
            },
        },
    },
};

pub use self::error::WinapiError;
use super::{
    input::{Axis, AxisEvent, AxisSource, ButtonState, DropEvent, KeyEvent, KeyState, MouseButton},
    Backend, BackendError, BackendEvent, ClipboardError, EventKind, NativeDisplay, NativeWindow, Platform,
};
use crate::utils::{Point, Size};

const CLASS_NAME: PCWSTR = w!("glpsWindowClass");

// Set in the lParam of key messages when the key was already down
const KEY_REPEAT_BIT: isize = 1 << 30;

type EventQueue = RefCell<VecDeque<BackendEvent<isize>>>;

/// State shared by the backend and the window procedure
#[derive(Debug)]
struct Shared {
    events: EventQueue,
    cursor: Cell<HCURSOR>,
}

/// Attached to every window through `GWLP_USERDATA`
#[derive(Debug)]
struct WindowData {
    shared: Rc<Shared>,
    pointer_inside: Cell<bool>,
}

/// Win32 windows of the calling thread
pub struct WinapiBackend {
    hinstance: HINSTANCE,
    shared: Rc<Shared>,
    windows: HashSet<isize>,
    closed: bool,
    span: tracing::Span,
}

impl fmt::Debug for WinapiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WinapiBackend")
            .field("hinstance", &self.hinstance.0)
            .field("windows", &self.windows)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

fn hwnd(window: isize) -> HWND {
    HWND(window as *mut c_void)
}

fn low_word(value: isize) -> i32 {
    (value & 0xffff) as i16 as i32
}

fn high_word(value: isize) -> i32 {
    ((value >> 16) & 0xffff) as i16 as i32
}

fn cursor_id(icon: CursorIcon) -> PCWSTR {
    match icon {
        CursorIcon::Text | CursorIcon::VerticalText => IDC_IBEAM,
        CursorIcon::Crosshair | CursorIcon::Cell => IDC_CROSS,
        CursorIcon::Pointer | CursorIcon::Grab | CursorIcon::Grabbing => IDC_HAND,
        CursorIcon::EwResize | CursorIcon::EResize | CursorIcon::WResize | CursorIcon::ColResize => IDC_SIZEWE,
        CursorIcon::NsResize | CursorIcon::NResize | CursorIcon::SResize | CursorIcon::RowResize => IDC_SIZENS,
        CursorIcon::NotAllowed | CursorIcon::NoDrop => IDC_NO,
        CursorIcon::Wait | CursorIcon::Progress => IDC_WAIT,
        _ => IDC_ARROW,
    }
}

impl WinapiBackend {
    /// Register the window class of the backend
    pub fn new() -> Result<WinapiBackend, WinapiError> {
        let span = info_span!("backend_winapi");
        let _guard = span.enter();

        let hinstance: HINSTANCE = unsafe { GetModuleHandleW(PCWSTR::null()) }
            .map_err(|err| WinapiError::os("GetModuleHandleW", err))?
            .into();
        let cursor = unsafe { LoadCursorW(HINSTANCE::default(), IDC_ARROW) }
            .map_err(|err| WinapiError::os("LoadCursorW", err))?;

        let class = WNDCLASSW {
            // EGL needs a private device context per window
            style: CS_HREDRAW | CS_VREDRAW | CS_OWNDC,
            lpfnWndProc: Some(window_proc),
            hInstance: hinstance,
            hCursor: cursor,
            lpszClassName: CLASS_NAME,
            ..Default::default()
        };
        if unsafe { RegisterClassW(&class) } == 0 {
            let err = unsafe { GetLastError() };
            if err != ERROR_CLASS_ALREADY_EXISTS {
                return Err(WinapiError::os("RegisterClassW", err.to_hresult().into()));
            }
            debug!("Window class was already registered");
        }
        info!("Registered the window class");

        drop(_guard);
        Ok(WinapiBackend {
            hinstance,
            shared: Rc::new(Shared {
                events: RefCell::new(VecDeque::new()),
                cursor: Cell::new(cursor),
            }),
            windows: HashSet::new(),
            closed: false,
            span,
        })
    }

    fn window(&self, window: isize) -> Result<HWND, WinapiError> {
        if self.windows.contains(&window) {
            Ok(hwnd(window))
        } else {
            Err(WinapiError::UnknownWindow)
        }
    }

    fn update_style(&self, window: isize, add: WINDOW_STYLE, remove: WINDOW_STYLE) -> Result<(), WinapiError> {
        let hwnd = self.window(window)?;
        unsafe {
            let style = GetWindowLongPtrW(hwnd, GWL_STYLE);
            let style = (style & !(remove.0 as isize)) | add.0 as isize;
            SetWindowLongPtrW(hwnd, GWL_STYLE, style);
            // style changes only apply after the frame was recalculated
            SetWindowPos(
                hwnd,
                HWND::default(),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_FRAMECHANGED,
            )
            .map_err(|err| WinapiError::os("SetWindowPos", err))
        }
    }

    fn blur_behind(&self, window: isize, blur: &DWM_BLURBEHIND) -> Result<(), WinapiError> {
        let hwnd = self.window(window)?;
        unsafe { DwmEnableBlurBehindWindow(hwnd, blur) }
            .map_err(|err| WinapiError::os("DwmEnableBlurBehindWindow", err))
    }

    fn release_window(&mut self, window: isize) {
        let hwnd = hwnd(window);
        unsafe {
            // detach the data first, the window procedure must not report this destruction
            let data = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut WindowData;
            if !data.is_null() {
                drop(Box::from_raw(data));
            }
            DragAcceptFiles(hwnd, BOOL::from(false));
            if let Err(err) = DestroyWindow(hwnd) {
                debug!(window, "DestroyWindow failed: {}", err);
            }
        }
    }
}

impl Backend for WinapiBackend {
    type Window = isize;

    fn platform(&self) -> Platform {
        Platform::Win32
    }

    fn native_display(&self) -> NativeDisplay {
        NativeDisplay::Win32 {
            hinstance: self.hinstance.0 as isize,
        }
    }

    fn native_window(&self, window: isize) -> NativeWindow {
        NativeWindow::Win32 {
            hwnd: window,
            hinstance: self.hinstance.0 as isize,
        }
    }

    fn create_window(&mut self, title: &str, position: Point<i32>, size: Size<u32>) -> Result<isize, BackendError> {
        let _guard = self.span.enter();
        if self.closed {
            return Err(BackendError::ConnectionLost);
        }

        // the requested size is the size of the client area
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: size.w.min(i32::MAX as u32) as i32,
            bottom: size.h.min(i32::MAX as u32) as i32,
        };
        unsafe { AdjustWindowRectEx(&mut rect, WS_OVERLAPPEDWINDOW, BOOL::from(false), WINDOW_EX_STYLE::default()) }
            .map_err(|err| WinapiError::os("AdjustWindowRectEx", err))?;

        let title: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                CLASS_NAME,
                PCWSTR(title.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                position.x,
                position.y,
                rect.right - rect.left,
                rect.bottom - rect.top,
                HWND::default(),
                HMENU::default(),
                self.hinstance,
                None,
            )
        }
        .map_err(|err| WinapiError::os("CreateWindowExW", err))?;

        let data = Box::new(WindowData {
            shared: self.shared.clone(),
            pointer_inside: Cell::new(false),
        });
        unsafe {
            SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(data) as isize);
        }

        let window = hwnd.0 as isize;
        debug!(window, "Created window");
        self.windows.insert(window);
        Ok(window)
    }

    fn show_window(&mut self, window: isize) -> Result<(), BackendError> {
        let hwnd = self.window(window)?;
        unsafe {
            let _ = ShowWindow(hwnd, SW_SHOW);
            let _ = UpdateWindow(hwnd);
            DragAcceptFiles(hwnd, BOOL::from(true));
        }
        Ok(())
    }

    fn destroy_window(&mut self, window: isize) {
        if self.windows.remove(&window) {
            self.release_window(window);
        }
    }

    fn window_size(&self, window: isize) -> Result<Size<u32>, BackendError> {
        let hwnd = self.window(window)?;
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd, &mut rect) }.map_err(|err| WinapiError::os("GetClientRect", err))?;
        Ok(Size::new(
            (rect.right - rect.left).max(0) as u32,
            (rect.bottom - rect.top).max(0) as u32,
        ))
    }

    fn set_resizable(&mut self, window: isize, resizable: bool) -> Result<(), BackendError> {
        let frame = WS_THICKFRAME | WS_MAXIMIZEBOX;
        let (add, remove) = if resizable {
            (frame, WINDOW_STYLE::default())
        } else {
            (WINDOW_STYLE::default(), frame)
        };
        Ok(self.update_style(window, add, remove)?)
    }

    fn set_decorations(&mut self, window: isize, enabled: bool) -> Result<(), BackendError> {
        let decorations = WS_CAPTION | WS_THICKFRAME | WS_SYSMENU | WS_MINIMIZEBOX | WS_MAXIMIZEBOX;
        let (add, remove) = if enabled {
            (decorations, WS_POPUP)
        } else {
            (WS_POPUP, decorations)
        };
        Ok(self.update_style(window, add, remove)?)
    }

    fn set_opacity(&mut self, window: isize, opacity: f32) -> Result<(), BackendError> {
        let hwnd = self.window(window)?;
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe {
            let ex_style = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            SetWindowLongPtrW(hwnd, GWL_EXSTYLE, ex_style | WS_EX_LAYERED.0 as isize);
            SetLayeredWindowAttributes(hwnd, COLORREF(0), alpha, LWA_ALPHA)
                .map_err(|err| WinapiError::os("SetLayeredWindowAttributes", err))?;
        }
        Ok(())
    }

    fn set_blur(&mut self, window: isize, enabled: bool, radius: u32) -> Result<(), BackendError> {
        debug!(window, radius, "Blur radius is chosen by the desktop window manager");
        let blur = DWM_BLURBEHIND {
            dwFlags: DWM_BB_ENABLE,
            fEnable: BOOL::from(enabled),
            hRgnBlur: HRGN::default(),
            fTransitionOnMaximized: BOOL::from(false),
        };
        Ok(self.blur_behind(window, &blur)?)
    }

    fn set_background_transparent(&mut self, window: isize) -> Result<(), BackendError> {
        // an empty blur region makes the desktop window manager compose the alpha channel
        // without blurring anything
        let region = unsafe { CreateRectRgn(0, 0, -1, -1) };
        let blur = DWM_BLURBEHIND {
            dwFlags: DWM_BB_ENABLE | DWM_BB_BLURREGION,
            fEnable: BOOL::from(true),
            hRgnBlur: region,
            fTransitionOnMaximized: BOOL::from(false),
        };
        let result = self.blur_behind(window, &blur);
        unsafe {
            let _ = DeleteObject(region);
        }
        Ok(result?)
    }

    fn set_cursor(&mut self, window: isize, icon: CursorIcon) -> Result<(), BackendError> {
        self.window(window)?;
        let cursor = unsafe { LoadCursorW(HINSTANCE::default(), cursor_id(icon)) }
            .map_err(|err| WinapiError::os("LoadCursorW", err))?;
        // the window procedure applies it whenever the pointer moves over a client area
        self.shared.cursor.set(cursor);
        unsafe {
            SetCursor(cursor);
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Result<Option<BackendEvent<isize>>, BackendError> {
        let _guard = self.span.enter();

        loop {
            // the queue must not stay borrowed while messages are dispatched
            let queued = self.shared.events.borrow_mut().pop_front();
            if let Some(event) = queued {
                if !self.windows.contains(&event.window) {
                    trace!(window = event.window, "Event for a destroyed window");
                    continue;
                }
                if matches!(event.kind, EventKind::Destroyed) {
                    self.windows.remove(&event.window);
                }
                return Ok(Some(event));
            }

            let mut msg = MSG::default();
            if !unsafe { PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE) }.as_bool() {
                return Ok(None);
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }

    fn request_redraw(&mut self, window: isize) -> Result<(), BackendError> {
        let hwnd = self.window(window)?;
        unsafe {
            let _ = InvalidateRect(hwnd, None, BOOL::from(false));
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    fn set_clipboard(&mut self, mime: &str, data: &str) -> Result<(), ClipboardError> {
        if !mime.starts_with("text/") {
            debug!(mime, "Storing clipboard data as text");
        }
        let _clipboard = ClipboardGuard::open()?;
        unsafe { EmptyClipboard() }.map_err(|_| ClipboardError::WriteFailed)?;

        let bytes = data.as_bytes();
        let global = unsafe { GlobalAlloc(GMEM_MOVEABLE, bytes.len() + 1) }.map_err(|_| ClipboardError::WriteFailed)?;
        unsafe {
            let target = GlobalLock(global) as *mut u8;
            if target.is_null() {
                let _ = GlobalFree(global);
                return Err(ClipboardError::WriteFailed);
            }
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), target, bytes.len());
            *target.add(bytes.len()) = 0;
            let _ = GlobalUnlock(global);

            // the clipboard owns the memory once the data was set
            if SetClipboardData(CF_TEXT.0 as u32, HANDLE(global.0)).is_err() {
                let _ = GlobalFree(global);
                return Err(ClipboardError::WriteFailed);
            }
        }
        Ok(())
    }

    fn clipboard(&mut self) -> Result<String, ClipboardError> {
        let _clipboard = ClipboardGuard::open()?;
        let handle = unsafe { GetClipboardData(CF_TEXT.0 as u32) }.map_err(|_| ClipboardError::Empty)?;
        let global = HGLOBAL(handle.0);
        unsafe {
            let text = GlobalLock(global) as *const std::ffi::c_char;
            if text.is_null() {
                return Err(ClipboardError::Empty);
            }
            let data = CStr::from_ptr(text).to_string_lossy().into_owned();
            let _ = GlobalUnlock(global);
            Ok(data)
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        let span = self.span.clone();
        let _guard = span.enter();

        for window in std::mem::take(&mut self.windows) {
            self.release_window(window);
        }
        self.shared.events.borrow_mut().clear();
        if let Err(err) = unsafe { UnregisterClassW(CLASS_NAME, self.hinstance) } {
            debug!("Failed to unregister the window class: {}", err);
        }
        self.closed = true;
        info!("Closed the Win32 backend");
    }
}

impl Drop for WinapiBackend {
    fn drop(&mut self) {
        self.close();
    }
}

/// Open clipboard, closed again on drop
struct ClipboardGuard;

impl ClipboardGuard {
    fn open() -> Result<ClipboardGuard, ClipboardError> {
        unsafe { OpenClipboard(HWND::default()) }
            .map(|_| ClipboardGuard)
            .map_err(|err| {
                warn!("Failed to open the clipboard: {}", err);
                ClipboardError::OpenFailed
            })
    }
}

impl Drop for ClipboardGuard {
    fn drop(&mut self) {
        let _ = unsafe { CloseClipboard() };
    }
}

unsafe extern "system" fn window_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let data = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const WindowData;
    // messages sent during creation arrive before the data is attached
    let Some(data) = data.as_ref() else {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    };
    let window = hwnd.0 as isize;
    let push = |kind: EventKind| data.shared.events.borrow_mut().push_back(BackendEvent { window, kind });

    match msg {
        WM_CLOSE => {
            // destruction is up to the window manager
            push(EventKind::CloseRequested);
            LRESULT(0)
        }
        WM_DESTROY => {
            push(EventKind::Destroyed);
            LRESULT(0)
        }
        WM_NCDESTROY => {
            let data = SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0) as *mut WindowData;
            if !data.is_null() {
                drop(Box::from_raw(data));
            }
            DefWindowProcW(hwnd, msg, wparam, lparam)
        }
        WM_SIZE => {
            let size = Size::new(low_word(lparam.0) as u16 as u32, high_word(lparam.0) as u16 as u32);
            push(EventKind::Resized(size));
            LRESULT(0)
        }
        WM_PAINT => {
            let mut paint = PAINTSTRUCT::default();
            BeginPaint(hwnd, &mut paint);
            push(EventKind::Exposed);
            let _ = EndPaint(hwnd, &paint);
            LRESULT(0)
        }
        WM_SETFOCUS => {
            push(EventKind::FocusIn);
            LRESULT(0)
        }
        WM_KILLFOCUS => {
            push(EventKind::FocusOut);
            LRESULT(0)
        }
        WM_SETCURSOR if low_word(lparam.0) as u32 == HTCLIENT => {
            SetCursor(data.shared.cursor.get());
            LRESULT(1)
        }
        WM_MOUSEMOVE => {
            let location = Point::new(low_word(lparam.0) as f64, high_word(lparam.0) as f64);
            if !data.pointer_inside.replace(true) {
                push(EventKind::PointerEnter(location));
                let mut track = TRACKMOUSEEVENT {
                    cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                let _ = TrackMouseEvent(&mut track);
            }
            push(EventKind::PointerMotion(location));
            LRESULT(0)
        }
        WM_MOUSELEAVE => {
            data.pointer_inside.set(false);
            push(EventKind::PointerLeave);
            LRESULT(0)
        }
        WM_LBUTTONDOWN | WM_LBUTTONUP | WM_MBUTTONDOWN | WM_MBUTTONUP | WM_RBUTTONDOWN | WM_RBUTTONUP => {
            let (button, state) = match msg {
                WM_LBUTTONDOWN => (MouseButton::Left, ButtonState::Pressed),
                WM_LBUTTONUP => (MouseButton::Left, ButtonState::Released),
                WM_MBUTTONDOWN => (MouseButton::Middle, ButtonState::Pressed),
                WM_MBUTTONUP => (MouseButton::Middle, ButtonState::Released),
                WM_RBUTTONDOWN => (MouseButton::Right, ButtonState::Pressed),
                _ => (MouseButton::Right, ButtonState::Released),
            };
            push(EventKind::PointerButton { button, state });
            LRESULT(0)
        }
        WM_MOUSEWHEEL | WM_MOUSEHWHEEL => {
            let axis = if msg == WM_MOUSEWHEEL {
                Axis::Vertical
            } else {
                Axis::Horizontal
            };
            let amount = high_word(wparam.0 as isize) as f64 / WHEEL_DELTA as f64;
            // touchpads tag their messages, plain wheels don't
            let source = if GetMessageExtraInfo().0 == 0 {
                AxisSource::Wheel
            } else {
                AxisSource::Finger
            };
            let discrete = (source == AxisSource::Wheel).then(|| amount.round() as i32);
            push(EventKind::PointerAxis(AxisEvent {
                axis,
                source,
                amount,
                discrete,
            }));
            LRESULT(0)
        }
        WM_KEYDOWN | WM_KEYUP | WM_SYSKEYDOWN | WM_SYSKEYUP => {
            if let Some(state) = key_state(msg, lparam.0) {
                push(EventKind::Key(key_event(wparam, lparam, state)));
            }
            // Alt+F4 and the window menu are handled by the default procedure
            if matches!(msg, WM_SYSKEYDOWN | WM_SYSKEYUP) {
                DefWindowProcW(hwnd, msg, wparam, lparam)
            } else {
                LRESULT(0)
            }
        }
        WM_DROPFILES => {
            let hdrop = HDROP(wparam.0 as *mut c_void);
            push(EventKind::Dropped(dropped_files(hdrop)));
            DragFinish(hdrop);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// State reported for a key message, `None` for auto repeated presses
fn key_state(msg: u32, lparam: isize) -> Option<KeyState> {
    let state = KeyState::from(matches!(msg, WM_KEYDOWN | WM_SYSKEYDOWN));
    (state == KeyState::Released || lparam & KEY_REPEAT_BIT == 0).then_some(state)
}

unsafe fn key_event(wparam: WPARAM, lparam: LPARAM, state: KeyState) -> KeyEvent {
    let vk = wparam.0 as u32;
    let scancode = ((lparam.0 >> 16) & 0xff) as u32;

    let mut keyboard = [0u8; 256];
    let mut translated = [0u16; 8];
    let len = match GetKeyboardState(&mut keyboard) {
        Ok(()) => ToUnicode(vk, scancode, Some(&keyboard), &mut translated, 0),
        Err(_) => 0,
    };
    let translated = &translated[..len.clamp(0, translated.len() as i32) as usize];

    let text = keys::key_text(vk as u16, translated, || {
        let mut name = [0u16; 64];
        let len = GetKeyNameTextW(lparam.0 as i32, &mut name);
        String::from_utf16_lossy(&name[..len.max(0) as usize])
    });

    KeyEvent {
        state,
        text,
        keycode: MapVirtualKeyW(vk, MAPVK_VK_TO_VSC),
    }
}

unsafe fn dropped_files(hdrop: HDROP) -> DropEvent {
    let count = DragQueryFileW(hdrop, u32::MAX, None);
    let mut uris = String::new();
    for index in 0..count {
        let len = DragQueryFileW(hdrop, index, None) as usize;
        let mut path = vec![0u16; len + 1];
        let len = DragQueryFileW(hdrop, index, Some(&mut path)) as usize;
        let path = String::from_utf16_lossy(&path[..len]).replace('\\', "/");
        uris.push_str("file:///");
        uris.push_str(&path);
        uris.push_str("\r\n");
    }

    let mut point = POINT::default();
    DragQueryPoint(hdrop, &mut point);

    DropEvent {
        mime: "text/uri-list".into(),
        data: uris,
        location: Point::new(point.x as f64, point.y as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_keys_are_reported() {
        assert_eq!(key_state(WM_SYSKEYDOWN, 0), Some(KeyState::Pressed));
        assert_eq!(key_state(WM_SYSKEYUP, KEY_REPEAT_BIT), Some(KeyState::Released));
        assert_eq!(key_state(WM_KEYDOWN, 0), Some(KeyState::Pressed));
        assert_eq!(key_state(WM_KEYDOWN, KEY_REPEAT_BIT), None);
        assert_eq!(key_state(WM_SYSKEYDOWN, KEY_REPEAT_BIT), None);
    }

    #[test]
    fn words_are_signed() {
        let lparam = ((-5i16 as u16 as isize) << 16) | 300;
        assert_eq!(low_word(lparam), 300);
        assert_eq!(high_word(lparam), -5);
    }

    #[test]
    fn cursors_map_to_system_cursors() {
        assert_eq!(cursor_id(CursorIcon::Default), IDC_ARROW);
        assert_eq!(cursor_id(CursorIcon::Text), IDC_IBEAM);
        assert_eq!(cursor_id(CursorIcon::EwResize), IDC_SIZEWE);
        assert_eq!(cursor_id(CursorIcon::NotAllowed), IDC_NO);
    }
}
