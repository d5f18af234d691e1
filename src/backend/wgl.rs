//! OpenGL through WGL, the OpenGL interface every Windows installation ships.
//!
//! [`WglGraphics`] shares one WGL context between all windows of the window manager. A WGL
//! context can only be created for a device context that already has a pixel format, so the
//! context is created together with the surface of the first window. Every window gets the
//! same pixel format, which lets the context be made current on any of them.

use std::{
    ffi::{c_void, CString},
    mem, ptr,
};

use tracing::{debug, info, info_span};
use windows::{
    core::{s, PCSTR},
    Win32::{
        Foundation::{FreeLibrary, BOOL, HMODULE, HWND},
        Graphics::{
            Gdi::{GetDC, ReleaseDC, HDC},
            OpenGL::{
                wglCreateContext, wglDeleteContext, wglGetCurrentContext, wglGetCurrentDC, wglGetProcAddress,
                wglMakeCurrent, ChoosePixelFormat, GetPixelFormat, SetPixelFormat, SwapBuffers, HGLRC,
                PFD_DOUBLEBUFFER, PFD_DRAW_TO_WINDOW, PFD_SUPPORT_OPENGL, PFD_TYPE_RGBA, PIXELFORMATDESCRIPTOR,
            },
        },
        System::LibraryLoader::{GetProcAddress, LoadLibraryA},
    },
};

use super::{
    graphics::{GraphicsBinder, GraphicsError},
    NativeDisplay, NativeWindow,
};

type SwapIntervalExt = unsafe extern "system" fn(i32) -> BOOL;

/// Error that may occur when using WGL
#[derive(Debug, thiserror::Error)]
pub enum WglError {
    /// opengl32.dll could not be loaded
    #[error("Failed to load opengl32.dll: {0}")]
    Library(#[source] windows::core::Error),
    /// The display is not a Win32 display
    #[error("WGL needs a Win32 display")]
    UnsupportedDisplay,
    /// The window has no device context
    #[error("The window has no device context")]
    NoDeviceContext,
    /// No pixel format matches the requested attributes
    #[error("No pixel format matches the requested attributes")]
    NoPixelFormat,
    /// A WGL or GDI call failed
    #[error("{call} failed: {source}")]
    Os {
        /// The failed call
        call: &'static str,
        /// Error reported by the system
        #[source]
        source: windows::core::Error,
    },
}

/// Attributes of the pixel format every window is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WglAttributes {
    /// Bits of the color buffer, alpha included
    pub color_bits: u8,
    /// Bits of the depth buffer
    pub depth_bits: u8,
    /// Bits of the stencil buffer
    pub stencil_bits: u8,
    /// Whether swaps wait for a vertical blank
    pub vsync: bool,
}

impl Default for WglAttributes {
    fn default() -> Self {
        WglAttributes {
            color_bits: 32,
            depth_bits: 24,
            stencil_bits: 8,
            vsync: true,
        }
    }
}

impl WglAttributes {
    fn pixel_format_descriptor(&self) -> PIXELFORMATDESCRIPTOR {
        PIXELFORMATDESCRIPTOR {
            nSize: mem::size_of::<PIXELFORMATDESCRIPTOR>() as u16,
            nVersion: 1,
            dwFlags: PFD_DRAW_TO_WINDOW | PFD_SUPPORT_OPENGL | PFD_DOUBLEBUFFER,
            iPixelType: PFD_TYPE_RGBA,
            cColorBits: self.color_bits,
            cDepthBits: self.depth_bits,
            cStencilBits: self.stencil_bits,
            ..Default::default()
        }
    }
}

/// Device context of a window, with the pixel format set
#[derive(Debug)]
pub struct WglSurface {
    hwnd: HWND,
    hdc: HDC,
}

impl WglSurface {
    /// The device context rendered to
    pub fn hdc(&self) -> HDC {
        self.hdc
    }
}

/// Graphics binder sharing one WGL context between all windows
#[derive(Debug)]
pub struct WglGraphics {
    attributes: WglAttributes,
    opengl32: Option<HMODULE>,
    context: Option<HGLRC>,
    pending_interval: Option<u32>,
    span: tracing::Span,
}

impl Default for WglGraphics {
    fn default() -> Self {
        WglGraphics::new(WglAttributes::default())
    }
}

impl WglGraphics {
    /// Create a binder giving windows a pixel format with the given attributes
    pub fn new(attributes: WglAttributes) -> WglGraphics {
        WglGraphics {
            attributes,
            opengl32: None,
            context: None,
            pending_interval: Some(attributes.vsync as u32),
            span: info_span!("backend_wgl"),
        }
    }

    /// Attributes of the pixel format
    pub fn attributes(&self) -> WglAttributes {
        self.attributes
    }

    /// The shared context, once the first surface was bound
    pub fn context(&self) -> Option<HGLRC> {
        self.context
    }

    fn set_pixel_format(&self, hdc: HDC) -> Result<(), WglError> {
        // the pixel format of a window can only be set once
        if unsafe { GetPixelFormat(hdc) } != 0 {
            return Ok(());
        }
        let descriptor = self.attributes.pixel_format_descriptor();
        let format = unsafe { ChoosePixelFormat(hdc, &descriptor) };
        if format == 0 {
            return Err(WglError::NoPixelFormat);
        }
        unsafe { SetPixelFormat(hdc, format, &descriptor) }.map_err(|source| WglError::Os {
            call: "SetPixelFormat",
            source,
        })
    }

    fn surface(&mut self, hwnd: HWND) -> Result<WglSurface, WglError> {
        let hdc = unsafe { GetDC(hwnd) };
        if hdc.is_invalid() {
            return Err(WglError::NoDeviceContext);
        }
        if let Err(err) = self.prepare(hdc) {
            unsafe { ReleaseDC(hwnd, hdc) };
            return Err(err);
        }
        Ok(WglSurface { hwnd, hdc })
    }

    fn prepare(&mut self, hdc: HDC) -> Result<(), WglError> {
        self.set_pixel_format(hdc)?;
        if self.context.is_none() {
            let context = unsafe { wglCreateContext(hdc) }.map_err(|source| WglError::Os {
                call: "wglCreateContext",
                source,
            })?;
            info!("WGL context created");
            self.context = Some(context);
        }
        Ok(())
    }

    fn apply_swap_interval(interval: u32) -> bool {
        let Some(function) = (unsafe { wglGetProcAddress(s!("wglSwapIntervalEXT")) }) else {
            return false;
        };
        let swap_interval: SwapIntervalExt = unsafe { mem::transmute(function) };
        unsafe { swap_interval(interval.min(i32::MAX as u32) as i32) }.as_bool()
    }

    fn is_current(&self) -> bool {
        self.context
            .map_or(false, |context| unsafe { wglGetCurrentContext() } == context)
    }
}

impl GraphicsBinder for WglGraphics {
    type Surface = WglSurface;

    fn create_context(&mut self, display: &NativeDisplay) -> Result<(), GraphicsError> {
        if self.opengl32.is_some() {
            return Ok(());
        }
        if !matches!(display, NativeDisplay::Win32 { .. }) {
            return Err(GraphicsError::Context(Box::new(WglError::UnsupportedDisplay)));
        }

        let _guard = self.span.enter();
        let opengl32 = unsafe { LoadLibraryA(s!("opengl32.dll")) }
            .map_err(|err| GraphicsError::Context(Box::new(WglError::Library(err))))?;
        debug!("Loaded opengl32.dll");
        self.opengl32 = Some(opengl32);
        Ok(())
    }

    fn has_context(&self) -> bool {
        self.opengl32.is_some()
    }

    fn bind_surface(&mut self, window: &NativeWindow) -> Result<Option<WglSurface>, GraphicsError> {
        if self.opengl32.is_none() {
            return Err(GraphicsError::NoContext);
        }
        let NativeWindow::Win32 { hwnd, .. } = *window else {
            return Err(GraphicsError::UnsupportedWindow);
        };

        let span = self.span.clone();
        let _guard = span.enter();
        self.surface(HWND(hwnd as *mut c_void))
            .map(Some)
            .map_err(|err| GraphicsError::Surface(Box::new(err)))
    }

    fn destroy_surface(&mut self, surface: WglSurface) {
        unsafe {
            if wglGetCurrentDC() == surface.hdc {
                let _ = wglMakeCurrent(HDC::default(), HGLRC::default());
            }
            ReleaseDC(surface.hwnd, surface.hdc);
        }
    }

    fn make_current(&mut self, surface: &WglSurface) -> Result<(), GraphicsError> {
        let Some(context) = self.context else {
            return Err(GraphicsError::NoContext);
        };
        unsafe { wglMakeCurrent(surface.hdc, context) }.map_err(|source| {
            GraphicsError::MakeCurrent(Box::new(WglError::Os {
                call: "wglMakeCurrent",
                source,
            }))
        })?;

        // wglSwapIntervalEXT is only reachable with a current context
        if let Some(interval) = self.pending_interval.take() {
            if !WglGraphics::apply_swap_interval(interval) {
                debug!("Ignoring swap interval {}", interval);
            }
        }
        Ok(())
    }

    fn swap_buffers(&mut self, surface: &WglSurface) -> Result<(), GraphicsError> {
        unsafe { SwapBuffers(surface.hdc) }.map_err(|source| {
            GraphicsError::SwapBuffers(Box::new(WglError::Os {
                call: "SwapBuffers",
                source,
            }))
        })
    }

    fn set_swap_interval(&mut self, interval: u32) -> Result<(), GraphicsError> {
        if self.is_current() {
            if !WglGraphics::apply_swap_interval(interval) {
                debug!("Ignoring swap interval {}", interval);
            }
        } else {
            self.pending_interval = Some(interval);
        }
        Ok(())
    }

    fn proc_address(&self, name: &str) -> *const c_void {
        let (Some(opengl32), true) = (self.opengl32, self.is_current()) else {
            return ptr::null();
        };
        let Ok(name) = CString::new(name) else {
            return ptr::null();
        };
        let name = PCSTR(name.as_ptr() as *const u8);

        // wglGetProcAddress knows extensions and GL > 1.1, everything older lives in opengl32.dll
        let function = unsafe { wglGetProcAddress(name) }
            .map(|function| function as usize)
            .filter(|address| !matches!(*address, 0 | 1 | 2 | 3 | usize::MAX))
            .or_else(|| unsafe { GetProcAddress(opengl32, name) }.map(|function| function as usize));
        function.map_or(ptr::null(), |address| address as *const c_void)
    }

    fn destroy(&mut self) {
        let _guard = self.span.enter();
        if let Some(context) = self.context.take() {
            unsafe {
                if wglGetCurrentContext() == context {
                    let _ = wglMakeCurrent(HDC::default(), HGLRC::default());
                }
                let _ = wglDeleteContext(context);
            }
            debug!("WGL context deleted");
        }
        if let Some(opengl32) = self.opengl32.take() {
            let _ = unsafe { FreeLibrary(opengl32) };
        }
        self.pending_interval = Some(self.attributes.vsync as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pixel_format() {
        let descriptor = WglAttributes::default().pixel_format_descriptor();
        assert_eq!(descriptor.nSize as usize, mem::size_of::<PIXELFORMATDESCRIPTOR>());
        assert_eq!(descriptor.cColorBits, 32);
        assert_eq!(descriptor.cDepthBits, 24);
        assert_eq!(descriptor.cStencilBits, 8);
        assert_eq!(descriptor.dwFlags & PFD_DOUBLEBUFFER, PFD_DOUBLEBUFFER);
    }

    #[test]
    fn context_needs_a_win32_display() {
        let mut graphics = WglGraphics::default();
        assert!(graphics.create_context(&NativeDisplay::Headless).is_err());
        assert!(!graphics.has_context());
        assert!(graphics.proc_address("glClear").is_null());
    }

    #[test]
    fn opengl32_is_always_available() {
        let mut graphics = WglGraphics::default();
        graphics
            .create_context(&NativeDisplay::Win32 { hinstance: 0 })
            .unwrap();
        assert!(graphics.has_context());
        assert!(matches!(
            graphics.bind_surface(&NativeWindow::Headless(1)),
            Err(GraphicsError::UnsupportedWindow)
        ));
        graphics.destroy();
        assert!(!graphics.has_context());
    }

    #[test]
    fn swap_interval_waits_for_a_current_context() {
        let mut graphics = WglGraphics::default();
        graphics.set_swap_interval(0).unwrap();
        assert_eq!(graphics.pending_interval, Some(0));
        graphics.destroy();
        assert_eq!(graphics.pending_interval, Some(1));
    }
}
