//! EGL surface related structs

use std::{
    os::raw::{c_int, c_ulong},
    sync::Arc,
};

use tracing::trace;

use super::{
    display::{EGLDisplay, EGLDisplayHandle},
    ffi, wrap_egl_call, EGLError, Error,
};
use crate::backend::NativeWindow;

static SURFACE_ATTRIBUTES: [c_int; 3] = [
    ffi::egl::RENDER_BUFFER as c_int,
    ffi::egl::BACK_BUFFER as c_int,
    ffi::egl::NONE as c_int,
];

/// EGL surface of a native window
#[derive(Debug)]
pub struct EGLSurface {
    display: Arc<EGLDisplayHandle>,
    pub(crate) surface: ffi::egl::types::EGLSurface,
    window: NativeWindow,
}

impl EGLSurface {
    /// Create a double buffered window surface
    pub fn new(
        display: &EGLDisplay,
        config: ffi::egl::types::EGLConfig,
        window: &NativeWindow,
    ) -> Result<EGLSurface, Error> {
        let _guard = display.span.enter();
        trace!("Setting RENDER_BUFFER to BACK_BUFFER");

        let surface = match *window {
            NativeWindow::X11 { window: xid, .. } => wrap_egl_call(|| unsafe {
                // the X11 platform expects a pointer to the window id
                let mut id = xid as c_ulong;
                ffi::egl::CreatePlatformWindowSurfaceEXT(
                    **display.display,
                    config,
                    (&mut id) as *mut c_ulong as *mut _,
                    SURFACE_ATTRIBUTES.as_ptr(),
                )
            }),
            NativeWindow::Win32 { hwnd, .. } => wrap_egl_call(|| unsafe {
                ffi::egl::CreateWindowSurface(
                    **display.display,
                    config,
                    hwnd as ffi::egl::types::EGLNativeWindowType,
                    SURFACE_ATTRIBUTES.as_ptr(),
                )
            }),
            NativeWindow::Headless(_) => return Err(Error::SurfaceCreationFailed(EGLError::BadNativeWindow)),
        }
        .map_err(Error::SurfaceCreationFailed)?;

        if surface == ffi::egl::NO_SURFACE {
            return Err(Error::SurfaceCreationFailed(EGLError::BadSurface));
        }

        Ok(EGLSurface {
            display: display.display.clone(),
            surface,
            window: *window,
        })
    }

    /// Swaps buffers at the end of a frame.
    pub fn swap_buffers(&self) -> Result<(), EGLError> {
        wrap_egl_call(|| unsafe { ffi::egl::SwapBuffers(**self.display, self.surface) }).map(|_| ())
    }

    /// Returns true if the OpenGL surface is the current one in the thread.
    pub fn is_current(&self) -> bool {
        unsafe {
            ffi::egl::GetCurrentSurface(ffi::egl::DRAW as _) == self.surface as *const _
                && ffi::egl::GetCurrentSurface(ffi::egl::READ as _) == self.surface as *const _
        }
    }

    /// The window this surface renders to
    pub fn window(&self) -> &NativeWindow {
        &self.window
    }
}

impl Drop for EGLSurface {
    fn drop(&mut self) {
        unsafe {
            ffi::egl::DestroySurface(**self.display, self.surface);
        }
    }
}
