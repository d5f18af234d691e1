//! Common traits and types for egl rendering
//!
//! Large parts of this module are taken from
//! [glutin src/api/egl](https://github.com/tomaka/glutin/tree/044e651edf67a2029eecc650dd42546af1501414/src/api/egl/)
//!
//! It therefore falls under
//! [glutin's Apache 2.0 license](https://github.com/tomaka/glutin/tree/044e651edf67a2029eecc650dd42546af1501414/LICENSE)
//!
//! [`EglGraphics`] is the [`GraphicsBinder`] rendering through EGL. It creates one
//! OpenGL ES context on the display of the backend and a window surface for every window.
//! libEGL is loaded at runtime when the first context is created.

use std::{
    ffi::{c_void, CString},
    ptr,
};

use tracing::debug;

pub mod context;
pub mod display;
mod error;
#[allow(non_camel_case_types, dead_code, unused_mut, non_upper_case_globals)]
pub mod ffi;
pub mod surface;

pub use self::{
    context::{EGLContext, GlAttributes},
    display::EGLDisplay,
    error::*,
    surface::EGLSurface,
};
use super::{
    graphics::{GraphicsBinder, GraphicsError},
    NativeDisplay, NativeWindow,
};

/// Returns the address of an OpenGL function.
///
/// Result is independent of displays and does not guarantee an extension is actually supported at runtime.
///
/// # Safety
///
/// libEGL must be loaded, which is the case once an [`EGLDisplay`] was created.
pub unsafe fn get_proc_address(symbol: &str) -> *const c_void {
    match CString::new(symbol) {
        Ok(addr) => ffi::egl::GetProcAddress(addr.as_ptr()) as *const _,
        Err(_) => ptr::null(),
    }
}

/// Graphics binder sharing one EGL context between all windows
#[derive(Debug)]
pub struct EglGraphics {
    attributes: GlAttributes,
    // the context has to be dropped before the display terminates
    context: Option<EGLContext>,
    display: Option<EGLDisplay>,
    pending_interval: Option<u32>,
}

impl Default for EglGraphics {
    fn default() -> Self {
        EglGraphics::new(GlAttributes::default())
    }
}

impl EglGraphics {
    /// Create a binder that requests contexts with the given attributes
    pub fn new(attributes: GlAttributes) -> EglGraphics {
        EglGraphics {
            attributes,
            context: None,
            display: None,
            pending_interval: Some(attributes.vsync as u32),
        }
    }

    /// Attributes contexts are created with
    pub fn attributes(&self) -> GlAttributes {
        self.attributes
    }

    /// The initialized display, once a context exists
    pub fn display(&self) -> Option<&EGLDisplay> {
        self.display.as_ref()
    }

    /// The shared context
    pub fn context(&self) -> Option<&EGLContext> {
        self.context.as_ref()
    }

    fn apply_swap_interval(display: &EGLDisplay, interval: u32) -> Result<(), Error> {
        wrap_egl_call(|| unsafe { ffi::egl::SwapInterval(**display.display, interval as i32) })
            .map(|_| ())
            .map_err(Error::SwapIntervalFailed)
    }
}

impl GraphicsBinder for EglGraphics {
    type Surface = EGLSurface;

    fn create_context(&mut self, display: &NativeDisplay) -> Result<(), GraphicsError> {
        if self.context.is_some() {
            return Ok(());
        }

        let egl_display = EGLDisplay::new(display).map_err(|err| GraphicsError::Context(Box::new(err)))?;
        let context = EGLContext::new(&egl_display, self.attributes)
            .map_err(|err| GraphicsError::Context(Box::new(err)))?;

        self.display = Some(egl_display);
        self.context = Some(context);
        Ok(())
    }

    fn has_context(&self) -> bool {
        self.context.is_some()
    }

    fn bind_surface(&mut self, window: &NativeWindow) -> Result<Option<EGLSurface>, GraphicsError> {
        let (Some(display), Some(context)) = (self.display.as_ref(), self.context.as_ref()) else {
            return Err(GraphicsError::NoContext);
        };
        if matches!(window, NativeWindow::Headless(_)) {
            return Err(GraphicsError::UnsupportedWindow);
        }

        let surface = EGLSurface::new(display, context.get_config_id(), window)
            .map_err(|err| GraphicsError::Surface(Box::new(err)))?;
        Ok(Some(surface))
    }

    fn destroy_surface(&mut self, surface: EGLSurface) {
        if surface.is_current() {
            if let Some(context) = self.context.as_ref() {
                let _ = context.unbind();
            }
        }
        drop(surface);
    }

    fn make_current(&mut self, surface: &EGLSurface) -> Result<(), GraphicsError> {
        let (Some(display), Some(context)) = (self.display.as_ref(), self.context.as_ref()) else {
            return Err(GraphicsError::NoContext);
        };

        unsafe { context.make_current_with_surface(surface) }
            .map_err(|err| GraphicsError::MakeCurrent(Box::new(Error::MakeCurrentFailed(err))))?;

        // eglSwapInterval applies to the surface bound to the current context
        if let Some(interval) = self.pending_interval.take() {
            if let Err(err) = EglGraphics::apply_swap_interval(display, interval) {
                debug!("Ignoring swap interval {}: {}", interval, err);
            }
        }
        Ok(())
    }

    fn swap_buffers(&mut self, surface: &EGLSurface) -> Result<(), GraphicsError> {
        surface
            .swap_buffers()
            .map_err(|err| GraphicsError::SwapBuffers(Box::new(Error::SwapBuffersFailed(err))))
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<(), GraphicsError> {
        match (self.display.as_ref(), self.context.as_ref()) {
            (Some(display), Some(context)) if context.is_current() => {
                EglGraphics::apply_swap_interval(display, interval)
                    .map_err(|err| GraphicsError::Context(Box::new(err)))
            }
            _ => {
                self.pending_interval = Some(interval);
                Ok(())
            }
        }
    }

    fn proc_address(&self, name: &str) -> *const c_void {
        if self.display.is_none() {
            return ptr::null();
        }
        unsafe { get_proc_address(name) }
    }

    fn destroy(&mut self) {
        self.context = None;
        if self.display.take().is_some() {
            debug!("EGL display terminated");
        }
        self.pending_interval = Some(self.attributes.vsync as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_requests_gles3_with_vsync() {
        let graphics = EglGraphics::default();
        assert_eq!(graphics.attributes().version, (3, 0));
        assert_eq!(graphics.attributes().depth_bits, 16);
        assert_eq!(graphics.attributes().stencil_bits, 8);
        assert_eq!(graphics.pending_interval, Some(1));
        assert!(!graphics.has_context());
    }

    #[test]
    fn headless_display_has_no_egl_context() {
        let mut graphics = EglGraphics::default();
        assert!(graphics.create_context(&NativeDisplay::Headless).is_err());
        assert!(!graphics.has_context());
        assert!(graphics.proc_address("glClear").is_null());
    }

    #[test]
    fn surfaces_need_a_context() {
        let mut graphics = EglGraphics::default();
        let window = NativeWindow::X11 {
            window: 1,
            visual_id: 1,
        };
        assert!(matches!(graphics.bind_surface(&window), Err(GraphicsError::NoContext)));
    }

    #[test]
    fn swap_interval_waits_for_a_current_context() {
        let mut graphics = EglGraphics::default();
        graphics.set_swap_interval(0).unwrap();
        assert_eq!(graphics.pending_interval, Some(0));
        graphics.destroy();
        assert_eq!(graphics.pending_interval, Some(1));
    }
}
