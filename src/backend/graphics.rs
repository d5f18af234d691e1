//! Binding of graphics surfaces to native windows
//!
//! A [`GraphicsBinder`] owns one rendering context shared by every window of the window
//! manager. The context is created lazily for the first window and lives until the
//! window manager is destroyed.

use std::{error::Error, ffi::c_void, fmt, ptr};

use super::{NativeDisplay, NativeWindow};

/// Errors of the graphics binders
#[derive(Debug, thiserror::Error)]
pub enum GraphicsError {
    /// No context was created yet
    #[error("No graphics context was created")]
    NoContext,
    /// The binder cannot render to this kind of window
    #[error("The window cannot be used by this graphics binder")]
    UnsupportedWindow,
    /// Creating the shared context failed
    #[error("Failed to create the graphics context: {0}")]
    Context(#[source] Box<dyn Error + Send + Sync>),
    /// Creating a window surface failed
    #[error("Failed to create the window surface: {0}")]
    Surface(#[source] Box<dyn Error + Send + Sync>),
    /// Making a surface current failed
    #[error("Failed to make the surface current: {0}")]
    MakeCurrent(#[source] Box<dyn Error + Send + Sync>),
    /// Presenting a surface failed
    #[error("Failed to swap buffers: {0}")]
    SwapBuffers(#[source] Box<dyn Error + Send + Sync>),
}

/// A rendering context that binds surfaces to native windows
pub trait GraphicsBinder: fmt::Debug {
    /// Per window surface
    type Surface: fmt::Debug;

    /// Create the shared context for the given display.
    ///
    /// Does nothing if the context already exists.
    fn create_context(&mut self, display: &NativeDisplay) -> Result<(), GraphicsError>;

    /// Whether the shared context was created
    fn has_context(&self) -> bool;

    /// Create a surface for a window.
    ///
    /// Returns `None` if this binder does not render through per window surfaces.
    fn bind_surface(&mut self, window: &NativeWindow) -> Result<Option<Self::Surface>, GraphicsError>;

    /// Destroy a surface created by [`GraphicsBinder::bind_surface`]
    fn destroy_surface(&mut self, surface: Self::Surface);

    /// Make the shared context current on a surface
    fn make_current(&mut self, surface: &Self::Surface) -> Result<(), GraphicsError>;

    /// Present the back buffer of a surface
    fn swap_buffers(&mut self, surface: &Self::Surface) -> Result<(), GraphicsError>;

    /// Set the number of vertical blanks to wait for on each swap
    fn set_swap_interval(&mut self, _interval: u32) -> Result<(), GraphicsError> {
        Ok(())
    }

    /// Look up a client API function of the context
    fn proc_address(&self, _name: &str) -> *const c_void {
        ptr::null()
    }

    /// Destroy the shared context. Calling this more then once has no effect.
    fn destroy(&mut self);
}

/// Surface type of [`NoGraphics`], it can never be constructed
#[derive(Debug)]
pub enum NoSurface {}

/// A binder that creates no context, for applications rendering on their own
#[derive(Debug, Default)]
pub struct NoGraphics {
    created: bool,
}

impl GraphicsBinder for NoGraphics {
    type Surface = NoSurface;

    fn create_context(&mut self, _display: &NativeDisplay) -> Result<(), GraphicsError> {
        self.created = true;
        Ok(())
    }

    fn has_context(&self) -> bool {
        self.created
    }

    fn bind_surface(&mut self, _window: &NativeWindow) -> Result<Option<NoSurface>, GraphicsError> {
        Ok(None)
    }

    fn destroy_surface(&mut self, surface: NoSurface) {
        match surface {}
    }

    fn make_current(&mut self, surface: &NoSurface) -> Result<(), GraphicsError> {
        match *surface {}
    }

    fn swap_buffers(&mut self, surface: &NoSurface) -> Result<(), GraphicsError> {
        match *surface {}
    }

    fn destroy(&mut self) {
        self.created = false;
    }
}
