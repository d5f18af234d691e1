//! The window manager
//!
//! A [`WindowManager`] owns a windowing [`Backend`], a [`GraphicsBinder`] and every open
//! window. It is driven by the application loop:
//!
//! ```no_run
//! use glps::WindowManager;
//!
//! let mut wm = WindowManager::init();
//! let window = wm.window_create("demo", 800, 600).unwrap();
//!
//! wm.set_resize_callback(|id, size| println!("{id} resized to {}x{}", size.w, size.h));
//! wm.set_frame_update_callback(|_id| { /* draw */ });
//!
//! while !wm.should_close() {
//!     if wm.window_count() > 0 {
//!         wm.window_update(window).ok();
//!         wm.swap_buffers(window).ok();
//!     }
//! }
//! wm.destroy();
//! ```
//!
//! Windows are addressed by [`WindowId`]s, which stay dense: closing a window shifts the
//! ids of all later windows down by one.

use std::ffi::c_void;

use cursor_icon::CursorIcon;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use tracing::{debug, error, info, warn};

use crate::{
    backend::{
        graphics::{GraphicsBinder, NoGraphics},
        input::{AxisEvent, ButtonState, DropEvent, KeyEvent, MouseButton},
        Backend, ClipboardError, NativeDisplay, NativeWindow, Platform,
    },
    utils::{fatal, Point, Size},
};

mod callbacks;
mod config;
mod dispatch;
mod error;
mod frame;
mod registry;

#[cfg(test)]
mod tests;

pub use self::config::{ManagerConfig, ManagerConfigBuilder, EVENTS_PER_CALL, MAX_WINDOWS, TARGET_FPS};
pub use self::error::{InitError, WindowError};
pub use self::registry::WindowId;

use self::{
    callbacks::Callbacks,
    dispatch::{teardown, Dispatcher},
    registry::{WindowEntry, WindowRegistry},
};

/// Owner of the display connection, the graphics context and all open windows
#[derive(Debug)]
pub struct WindowManager<B: Backend, G: GraphicsBinder = NoGraphics> {
    backend: Option<B>,
    graphics: G,
    registry: WindowRegistry<B::Window, G::Surface>,
    callbacks: Callbacks,
    config: ManagerConfig,
    cursor: CursorIcon,
}

#[cfg(any(
    all(windows, feature = "backend_winapi"),
    all(not(windows), feature = "backend_x11")
))]
impl WindowManager<crate::backend::DefaultBackend, crate::backend::DefaultGraphics> {
    /// Connect to the native window system of this platform.
    ///
    /// Failing to connect is fatal: the error is logged and the process exits.
    pub fn init() -> Self {
        match Self::try_init() {
            Ok(wm) => wm,
            Err(err) => fatal(format_args!("{}", err)),
        }
    }

    /// Connect to the native window system of this platform, returning failures
    pub fn try_init() -> Result<Self, InitError> {
        let backend =
            crate::backend::DefaultBackend::new().map_err(|err| InitError::Backend(err.into()))?;
        Ok(WindowManager::new(
            backend,
            crate::backend::DefaultGraphics::default(),
            ManagerConfig::default(),
        ))
    }
}

impl<B: Backend> WindowManager<B, NoGraphics> {
    /// Create a window manager without a graphics context
    pub fn without_graphics(backend: B) -> Self {
        WindowManager::new(backend, NoGraphics::default(), ManagerConfig::default())
    }
}

impl<B: Backend, G: GraphicsBinder> WindowManager<B, G> {
    /// Create a window manager on top of an existing backend and graphics binder
    pub fn new(backend: B, graphics: G, config: ManagerConfig) -> Self {
        info!(platform = ?backend.platform(), ?config, "Creating window manager");
        WindowManager {
            backend: Some(backend),
            graphics,
            registry: WindowRegistry::new(config.max_windows),
            callbacks: Callbacks::default(),
            config,
            cursor: CursorIcon::Default,
        }
    }

    /// Create a window manager with the default configuration
    pub fn with_graphics(backend: B, graphics: G) -> Self {
        WindowManager::new(backend, graphics, ManagerConfig::default())
    }

    /// Destroy every window, the graphics context and the display connection.
    ///
    /// Calling this more then once has no effect. Dropping the window manager destroys it as well.
    pub fn destroy(&mut self) {
        let Some(mut backend) = self.backend.take() else {
            return;
        };

        for entry in self.registry.drain() {
            teardown(&mut backend, &mut self.graphics, entry);
        }
        self.graphics.destroy();
        backend.close();
        self.callbacks.clear();
        info!("Window manager destroyed");
    }

    /// The active configuration
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// The window system of the backend, `None` once destroyed
    pub fn platform(&self) -> Option<Platform> {
        self.backend.as_ref().map(Backend::platform)
    }

    /// The graphics binder
    pub fn graphics(&self) -> &G {
        &self.graphics
    }

    /// Number of open windows
    pub fn window_count(&self) -> usize {
        self.registry.len()
    }

    /// Look up the id of a native window
    pub fn window_id(&self, native: B::Window) -> Option<WindowId> {
        self.registry.position(native)
    }

    fn backend_mut(&mut self) -> Result<&mut B, WindowError> {
        self.backend.as_mut().ok_or(WindowError::Destroyed)
    }

    fn native(&self, id: WindowId) -> Result<B::Window, WindowError> {
        self.registry
            .get(id)
            .map(|entry| entry.native)
            .ok_or(WindowError::InvalidId(id))
    }

    /// Open a new window.
    ///
    /// The first window also creates the shared graphics context; failing to do so is fatal.
    /// On any other failure everything allocated for the window is released again.
    pub fn window_create(&mut self, title: &str, width: u32, height: u32) -> Result<WindowId, WindowError> {
        let backend = self.backend.as_mut().ok_or(WindowError::Destroyed)?;
        if self.registry.is_full() {
            warn!(title, "Cannot create window, {} windows are open", self.registry.len());
            return Err(WindowError::CapacityReached(self.registry.capacity()));
        }

        let size = Size::new(width, height);
        let native = backend
            .create_window(title, self.config.initial_position, size)
            .map_err(|err| {
                warn!(title, "Failed to create window: {}", err);
                WindowError::Backend(err)
            })?;

        if !self.graphics.has_context() {
            if let Err(err) = self.graphics.create_context(&backend.native_display()) {
                backend.destroy_window(native);
                fatal(format_args!("Failed to create the graphics context: {}", err));
            }
        }

        let surface = match self.graphics.bind_surface(&backend.native_window(native)) {
            Ok(surface) => surface,
            Err(err) => {
                warn!(title, "Failed to bind a surface to the window: {}", err);
                backend.destroy_window(native);
                return Err(WindowError::Graphics(err));
            }
        };

        if let Err(err) = backend.set_cursor(native, self.cursor) {
            debug!(title, "Failed to set the cursor: {}", err);
        }

        let entry = WindowEntry::new(native, surface, title, size);
        if let Err(err) = backend.show_window(native) {
            warn!(title, "Failed to show window: {}", err);
            teardown(backend, &mut self.graphics, entry);
            return Err(WindowError::Backend(err));
        }

        let id = match self.registry.insert(entry) {
            Ok(id) => id,
            Err(entry) => {
                teardown(backend, &mut self.graphics, entry);
                return Err(WindowError::CapacityReached(self.registry.capacity()));
            }
        };
        info!(%id, title, width, height, "Created window");

        if id.index() == 0 {
            self.set_window_ctx_current(id)?;
        }
        Ok(id)
    }

    /// Close a window, releasing its surface before the native window.
    ///
    /// The close callback is not invoked.
    pub fn window_destroy(&mut self, id: WindowId) -> Result<(), WindowError> {
        let backend = self.backend.as_mut().ok_or(WindowError::Destroyed)?;
        let entry = self.registry.remove(id).ok_or(WindowError::InvalidId(id))?;
        debug!(%id, title = %entry.title, "Destroying window");
        teardown(backend, &mut self.graphics, entry);
        Ok(())
    }

    /// Close the window belonging to a native handle, logging unknown handles
    pub fn remove_native(&mut self, native: B::Window) {
        match self.registry.position(native) {
            Some(id) => {
                if let Err(err) = self.window_destroy(id) {
                    debug!(%id, window = ?native, "Failed to remove window: {}", err);
                }
            }
            None => debug!(window = ?native, "Tried to remove an untracked window"),
        }
    }

    /// Current size of a window, as reported by the window system
    pub fn window_get_dimensions(&self, id: WindowId) -> Result<Size<u32>, WindowError> {
        let native = self.native(id)?;
        let backend = self.backend.as_ref().ok_or(WindowError::Destroyed)?;
        Ok(backend.window_size(native)?)
    }

    /// Title a window was created with
    pub fn window_title(&self, id: WindowId) -> Option<&str> {
        self.registry.get(id).map(|entry| entry.title.as_str())
    }

    /// Allow or forbid resizing a window
    pub fn window_is_resizable(&mut self, id: WindowId, resizable: bool) -> Result<(), WindowError> {
        let native = self.native(id)?;
        Ok(self.backend_mut()?.set_resizable(native, resizable)?)
    }

    /// Show or hide the decorations of a window
    pub fn window_toggle_decorations(&mut self, id: WindowId, enabled: bool) -> Result<(), WindowError> {
        let native = self.native(id)?;
        Ok(self.backend_mut()?.set_decorations(native, enabled)?)
    }

    /// Set the opacity of a window. Ignored if the window system does not support it.
    pub fn set_window_opacity(&mut self, id: WindowId, opacity: f32) -> Result<(), WindowError> {
        let native = self.native(id)?;
        if let Err(err) = self.backend_mut()?.set_opacity(native, opacity) {
            debug!(%id, "Window opacity is not available: {}", err);
        }
        Ok(())
    }

    /// Blur the content behind a window. Ignored if the window system does not support it.
    pub fn set_window_blur(&mut self, id: WindowId, enabled: bool, radius: u32) -> Result<(), WindowError> {
        let native = self.native(id)?;
        if let Err(err) = self.backend_mut()?.set_blur(native, enabled, radius) {
            debug!(%id, "Window blur is not available: {}", err);
        }
        Ok(())
    }

    /// Make the background of a window transparent. Ignored if the window system does not support it.
    pub fn set_window_background_transparent(&mut self, id: WindowId) -> Result<(), WindowError> {
        let native = self.native(id)?;
        if let Err(err) = self.backend_mut()?.set_background_transparent(native) {
            debug!(%id, "Transparent backgrounds are not available: {}", err);
        }
        Ok(())
    }

    /// Set the cursor of every open window and of all windows created later
    pub fn set_cursor(&mut self, icon: CursorIcon) {
        self.cursor = icon;
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        for (id, entry) in self.registry.iter() {
            if let Err(err) = backend.set_cursor(entry.native, icon) {
                debug!(%id, ?icon, "Failed to set the cursor: {}", err);
            }
        }
    }

    /// The cursor windows are currently created with
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// Dispatch pending window events and report whether every window is closed.
    ///
    /// Never blocks. At most [`ManagerConfig::events_per_call`] events are handled per
    /// call, the remaining ones stay queued for the next call.
    pub fn should_close(&mut self) -> bool {
        if self.registry.is_empty() {
            return true;
        }
        let Some(backend) = self.backend.as_mut() else {
            return true;
        };

        let mut dispatcher = Dispatcher {
            backend,
            graphics: &mut self.graphics,
            registry: &mut self.registry,
            callbacks: &mut self.callbacks,
        };
        for _ in 0..self.config.events_per_call {
            match dispatcher.backend.poll_event() {
                Ok(Some(event)) => dispatcher.dispatch(event),
                Ok(None) => break,
                Err(err) => fatal(format_args!("Lost the connection to the display: {}", err)),
            }
            if dispatcher.registry.is_empty() {
                break;
            }
        }
        if let Err(err) = dispatcher.backend.flush() {
            error!("Failed to flush the display connection: {}", err);
        }

        self.registry.is_empty()
    }

    /// Pace a window to the target frame rate and run its frame update callback
    pub fn window_update(&mut self, id: WindowId) -> Result<(), WindowError> {
        let interval = self.config.frame_interval();
        let entry = self.registry.get_mut(id).ok_or(WindowError::InvalidId(id))?;
        entry.pacer.pace(interval);

        if let Some(frame_update) = self.callbacks.frame_update.as_mut() {
            frame_update(id);
        }
        Ok(self.backend_mut()?.flush()?)
    }

    /// Frame rate a window was updated at during its last frame
    pub fn window_fps(&self, id: WindowId) -> Result<f64, WindowError> {
        self.registry
            .get(id)
            .map(|entry| entry.pacer.fps())
            .ok_or(WindowError::InvalidId(id))
    }

    /// Make the shared context current on the surface of a window.
    ///
    /// # Panics
    ///
    /// If the graphics binder fails to make the context current.
    pub fn set_window_ctx_current(&mut self, id: WindowId) -> Result<(), WindowError> {
        let entry = self.registry.get(id).ok_or(WindowError::InvalidId(id))?;
        let Some(surface) = entry.surface.as_ref() else {
            debug!(%id, "Window has no surface to make current");
            return Ok(());
        };
        if let Err(err) = self.graphics.make_current(surface) {
            error!(%id, "Failed to make the context current: {}", err);
            panic!("Failed to make the context current on {}: {}", id, err);
        }
        Ok(())
    }

    /// Present a window.
    ///
    /// Windows without a surface ask the window system for a repaint instead.
    pub fn swap_buffers(&mut self, id: WindowId) -> Result<(), WindowError> {
        let entry = self.registry.get(id).ok_or(WindowError::InvalidId(id))?;
        match entry.surface.as_ref() {
            Some(surface) => self.graphics.swap_buffers(surface).map_err(|err| {
                warn!(%id, "Failed to swap buffers: {}", err);
                WindowError::Graphics(err)
            }),
            None => {
                let native = entry.native;
                Ok(self.backend_mut()?.request_redraw(native)?)
            }
        }
    }

    /// Set the number of vertical blanks each swap waits for
    pub fn swap_interval(&mut self, interval: u32) -> Result<(), WindowError> {
        Ok(self.graphics.set_swap_interval(interval)?)
    }

    /// Look up a function of the client API, null if unknown
    pub fn proc_address(&self, name: &str) -> *const c_void {
        self.graphics.proc_address(name)
    }

    /// Native handle of the display connection
    pub fn native_display(&self) -> Option<NativeDisplay> {
        self.backend.as_ref().map(Backend::native_display)
    }

    /// Native handle of a window
    pub fn native_window(&self, id: WindowId) -> Option<NativeWindow> {
        let native = self.native(id).ok()?;
        self.backend.as_ref().map(|backend| backend.native_window(native))
    }

    /// Raw display handle for graphics APIs
    pub fn raw_display_handle(&self) -> Option<RawDisplayHandle> {
        self.native_display()?.raw_display_handle()
    }

    /// Raw window handle for graphics APIs
    pub fn raw_window_handle(&self, id: WindowId) -> Option<RawWindowHandle> {
        self.native_window(id)?.raw_window_handle()
    }

    /// Instance extensions vulkan needs to present to windows of this backend
    #[cfg(feature = "vulkan")]
    pub fn vulkan_required_extensions(
        &self,
    ) -> Result<&'static [*const std::ffi::c_char], crate::backend::vulkan::VulkanError> {
        let display = self
            .native_display()
            .ok_or(crate::backend::vulkan::VulkanError::NoHandle)?;
        crate::backend::vulkan::required_extensions(&display)
    }

    /// Create a vulkan surface for a window.
    ///
    /// # Safety
    ///
    /// The instance must have been created from `entry` with the extensions returned by
    /// [`WindowManager::vulkan_required_extensions`] enabled, and the surface must be
    /// destroyed before the window.
    #[cfg(feature = "vulkan")]
    pub unsafe fn create_vulkan_surface(
        &self,
        id: WindowId,
        entry: &ash::Entry,
        instance: &ash::Instance,
    ) -> Result<ash::vk::SurfaceKHR, crate::backend::vulkan::VulkanError> {
        use crate::backend::vulkan::{create_surface, VulkanError};

        let display = self.native_display().ok_or(VulkanError::NoHandle)?;
        let window = self.native_window(id).ok_or(VulkanError::NoHandle)?;
        create_surface(entry, instance, &display, &window)
    }

    /// Place text on the clipboard. Failures are logged and returned.
    pub fn attach_to_clipboard(&mut self, mime: &str, data: &str) -> Result<(), ClipboardError> {
        let backend = self.backend.as_mut().ok_or(ClipboardError::OpenFailed)?;
        backend.set_clipboard(mime, data).map_err(|err| {
            warn!(mime, "Failed to write the clipboard: {}", err);
            err
        })
    }

    /// Read text from the clipboard. Failures are logged and returned.
    pub fn get_from_clipboard(&mut self) -> Result<String, ClipboardError> {
        let backend = self.backend.as_mut().ok_or(ClipboardError::OpenFailed)?;
        backend.clipboard().map_err(|err| {
            debug!("Failed to read the clipboard: {}", err);
            err
        })
    }

    /// Set the callback run for every frame of a window, from `window_update` and on expose
    pub fn set_frame_update_callback(&mut self, callback: impl FnMut(WindowId) + 'static) {
        self.callbacks.frame_update = Some(Box::new(callback));
    }

    /// Set the callback run when a window changed its size
    pub fn set_resize_callback(&mut self, callback: impl FnMut(WindowId, Size<u32>) + 'static) {
        self.callbacks.resize = Some(Box::new(callback));
    }

    /// Set the callback run right before a window is closed.
    ///
    /// The id is still valid while the callback runs.
    pub fn set_close_callback(&mut self, callback: impl FnMut(WindowId) + 'static) {
        self.callbacks.close = Some(Box::new(callback));
    }

    /// Set the callback run when a window gains keyboard focus
    pub fn set_keyboard_enter_callback(&mut self, callback: impl FnMut(WindowId) + 'static) {
        self.callbacks.keyboard_enter = Some(Box::new(callback));
    }

    /// Set the callback run when a window loses keyboard focus
    pub fn set_keyboard_leave_callback(&mut self, callback: impl FnMut(WindowId) + 'static) {
        self.callbacks.keyboard_leave = Some(Box::new(callback));
    }

    /// Set the callback run for key presses and releases
    pub fn set_keyboard_callback(&mut self, callback: impl FnMut(WindowId, &KeyEvent) + 'static) {
        self.callbacks.keyboard = Some(Box::new(callback));
    }

    /// Set the callback run when the pointer enters a window
    pub fn set_mouse_enter_callback(&mut self, callback: impl FnMut(WindowId, Point<f64>) + 'static) {
        self.callbacks.mouse_enter = Some(Box::new(callback));
    }

    /// Set the callback run when the pointer leaves a window
    pub fn set_mouse_leave_callback(&mut self, callback: impl FnMut(WindowId) + 'static) {
        self.callbacks.mouse_leave = Some(Box::new(callback));
    }

    /// Set the callback run when the pointer moves inside a window
    pub fn set_mouse_move_callback(&mut self, callback: impl FnMut(WindowId, Point<f64>) + 'static) {
        self.callbacks.mouse_move = Some(Box::new(callback));
    }

    /// Set the callback run for pointer button presses and releases
    pub fn set_mouse_click_callback(
        &mut self,
        callback: impl FnMut(WindowId, MouseButton, ButtonState) + 'static,
    ) {
        self.callbacks.mouse_click = Some(Box::new(callback));
    }

    /// Set the callback run when the user scrolls
    pub fn set_scroll_callback(&mut self, callback: impl FnMut(WindowId, AxisEvent) + 'static) {
        self.callbacks.scroll = Some(Box::new(callback));
    }

    /// Set the callback run when something is dropped onto a window
    pub fn set_drag_n_drop_callback(&mut self, callback: impl FnMut(WindowId, &DropEvent) + 'static) {
        self.callbacks.drag_n_drop = Some(Box::new(callback));
    }
}

impl<B: Backend, G: GraphicsBinder> Drop for WindowManager<B, G> {
    fn drop(&mut self) {
        self.destroy();
    }
}
