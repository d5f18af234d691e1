//! EGL context related structs

use std::{ptr, sync::Arc};

use tracing::{info, trace};

use super::{
    display::{EGLDisplay, EGLDisplayHandle},
    ffi, wrap_egl_call, EGLError, EGLSurface, Error,
};

/// EGL context for rendering
#[derive(Debug)]
pub struct EGLContext {
    context: ffi::egl::types::EGLContext,
    display: Arc<EGLDisplayHandle>,
    config_id: ffi::egl::types::EGLConfig,
}

impl EGLContext {
    /// Create a new [`EGLContext`] on an initialized [`EGLDisplay`]
    pub fn new(display: &EGLDisplay, attributes: GlAttributes) -> Result<EGLContext, Error> {
        let _guard = display.span.enter();

        let config_id = display.choose_config(&attributes)?;
        let (major, minor) = attributes.version;

        let mut context_attributes = Vec::with_capacity(5);
        if display.egl_version >= (1, 5) || display.has_extension("EGL_KHR_create_context") {
            trace!("Setting CONTEXT_MAJOR_VERSION to {}", major);
            context_attributes.push(ffi::egl::CONTEXT_MAJOR_VERSION as i32);
            context_attributes.push(major as i32);
            trace!("Setting CONTEXT_MINOR_VERSION to {}", minor);
            context_attributes.push(ffi::egl::CONTEXT_MINOR_VERSION as i32);
            context_attributes.push(minor as i32);
        } else {
            trace!("Setting CONTEXT_CLIENT_VERSION to {}", major);
            context_attributes.push(ffi::egl::CONTEXT_CLIENT_VERSION as i32);
            context_attributes.push(major as i32);
        }
        context_attributes.push(ffi::egl::NONE as i32);

        trace!("Creating EGL context...");
        let context = wrap_egl_call(|| unsafe {
            ffi::egl::CreateContext(
                **display.display,
                config_id,
                ptr::null(),
                context_attributes.as_ptr(),
            )
        })
        .map_err(Error::CreationFailed)?;
        if context == ffi::egl::NO_CONTEXT {
            return Err(Error::CreationFailed(EGLError::BadContext));
        }

        info!("EGL context created");

        Ok(EGLContext {
            context,
            display: display.display.clone(),
            config_id,
        })
    }

    /// Makes the OpenGL context the current context in the current thread with a surface to
    /// read/write to.
    ///
    /// # Safety
    ///
    /// This function is marked unsafe, because the context cannot be made current
    /// on multiple threads.
    pub unsafe fn make_current_with_surface(&self, surface: &EGLSurface) -> Result<(), EGLError> {
        let surface_ptr = surface.surface;
        wrap_egl_call(|| ffi::egl::MakeCurrent(**self.display, surface_ptr, surface_ptr, self.context))
            .map(|_| ())
    }

    /// Returns true if the OpenGL context is the current one in the thread.
    pub fn is_current(&self) -> bool {
        unsafe { ffi::egl::GetCurrentContext() == self.context as *const _ }
    }

    /// Returns the egl config for this context
    pub fn get_config_id(&self) -> ffi::egl::types::EGLConfig {
        self.config_id
    }

    /// Unbinds this context from the current thread, if set.
    ///
    /// This does nothing if this context is not the current context
    pub fn unbind(&self) -> Result<(), EGLError> {
        if self.is_current() {
            wrap_egl_call(|| unsafe {
                ffi::egl::MakeCurrent(
                    **self.display,
                    ffi::egl::NO_SURFACE,
                    ffi::egl::NO_SURFACE,
                    ffi::egl::NO_CONTEXT,
                )
            })?;
        }
        Ok(())
    }
}

impl Drop for EGLContext {
    fn drop(&mut self) {
        unsafe {
            // We need to ensure the context is unbound, otherwise it egl stalls the destroy call
            // ignore failures at this point
            let _ = self.unbind();
            ffi::egl::DestroyContext(**self.display, self.context);
        }
    }
}

/// Attributes to use when creating an OpenGL ES context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlAttributes {
    /// OpenGL ES version to request, `(3, 0)` by default
    pub version: (u8, u8),
    /// Minimum number of bits for the depth buffer
    pub depth_bits: u8,
    /// Minimum number of bits for the stencil buffer
    pub stencil_bits: u8,
    /// Whether to use vsync. If vsync is enabled, calling `swap_buffers` will block until the screen refreshes.
    /// This is typically used to prevent screen tearing.
    pub vsync: bool,
}

impl Default for GlAttributes {
    fn default() -> Self {
        GlAttributes {
            version: (3, 0),
            depth_bits: 16,
            stencil_bits: 8,
            vsync: true,
        }
    }
}
