//! Type safe native types for safe egl initialisation

use std::{ffi::CStr, mem::MaybeUninit, ops::Deref, os::raw::c_int, ptr, sync::Arc};

use tracing::{debug, error, info, info_span, trace};

use super::{context::GlAttributes, ffi, wrap_egl_call, EGLError, Error};
use crate::backend::{NativeDisplay, Platform};

/// Wrapper around [`ffi::EGLDisplay`](ffi::egl::types::EGLDisplay) to ensure display is only destroyed
/// once all resources bound to it have been dropped.
#[derive(Debug)]
pub(crate) struct EGLDisplayHandle {
    handle: ffi::egl::types::EGLDisplay,
}

impl Deref for EGLDisplayHandle {
    type Target = ffi::egl::types::EGLDisplay;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl Drop for EGLDisplayHandle {
    fn drop(&mut self) {
        unsafe {
            // ignore errors on drop
            ffi::egl::Terminate(self.handle);
        }
    }
}

/// [`EGLDisplay`] represents an initialised EGL environment
#[derive(Debug)]
pub struct EGLDisplay {
    pub(crate) display: Arc<EGLDisplayHandle>,
    pub(crate) egl_version: (i32, i32),
    pub(crate) extensions: Vec<String>,
    platform: Platform,
    pub(crate) span: tracing::Span,
}

impl EGLDisplay {
    /// Create a new [`EGLDisplay`] for the display of a backend
    pub fn new(native: &NativeDisplay) -> Result<EGLDisplay, Error> {
        let span = info_span!("backend_egl");
        let _guard = span.enter();

        // the first step is to query the list of extensions without any display, if supported
        let dp_extensions = ffi::make_sure_egl_is_loaded()?;

        let (display, platform) = unsafe { get_display(native, &dp_extensions)? };

        let egl_version = {
            let mut major: MaybeUninit<ffi::egl::types::EGLint> = MaybeUninit::uninit();
            let mut minor: MaybeUninit<ffi::egl::types::EGLint> = MaybeUninit::uninit();

            wrap_egl_call(|| unsafe { ffi::egl::Initialize(display, major.as_mut_ptr(), minor.as_mut_ptr()) })
                .map_err(Error::InitFailed)?;

            let major = unsafe { major.assume_init() };
            let minor = unsafe { minor.assume_init() };

            info!("EGL Initialized");
            info!("EGL Version: {:?}", (major, minor));

            (major, minor)
        };
        let display = Arc::new(EGLDisplayHandle { handle: display });

        // the list of extensions supported by the client once initialized is different from the
        // list of extensions obtained earlier
        let extensions = unsafe {
            let p = wrap_egl_call(|| ffi::egl::QueryString(**display, ffi::egl::EXTENSIONS as i32))
                .map_err(Error::InitFailed)?;
            if p.is_null() {
                Vec::new()
            } else {
                ffi::split_extensions(CStr::from_ptr(p))
            }
        };
        info!("EGL Extensions: {:?}", extensions);

        if egl_version < (1, 3) {
            return Err(Error::OpenGlesNotSupported(None));
        }
        wrap_egl_call(|| unsafe { ffi::egl::BindAPI(ffi::egl::OPENGL_ES_API) })
            .map_err(|source| Error::OpenGlesNotSupported(Some(source)))?;

        drop(_guard);
        Ok(EGLDisplay {
            display,
            egl_version,
            extensions,
            platform,
            span,
        })
    }

    /// Finds a compatible [`EGLConfig`](ffi::egl::types::EGLConfig) for a given set of requirements
    pub fn choose_config(&self, attributes: &GlAttributes) -> Result<ffi::egl::types::EGLConfig, Error> {
        let _guard = self.span.enter();

        let renderable = match attributes.version {
            (3, _) => ffi::egl::OPENGL_ES3_BIT,
            (2, _) => ffi::egl::OPENGL_ES2_BIT,
            version => return Err(Error::OpenGlVersionNotSupported(version)),
        };
        if attributes.version.0 == 3 && self.egl_version < (1, 5) && !self.has_extension("EGL_KHR_create_context")
        {
            error!("OpenglES 3.* needs EGL 1.5 or EGL_KHR_create_context");
            return Err(Error::NoAvailablePixelFormat);
        }

        trace!("Setting SURFACE_TYPE to WINDOW");
        let descriptor: [c_int; 19] = [
            ffi::egl::COLOR_BUFFER_TYPE as c_int,
            ffi::egl::RGB_BUFFER as c_int,
            ffi::egl::SURFACE_TYPE as c_int,
            ffi::egl::WINDOW_BIT as c_int,
            ffi::egl::RENDERABLE_TYPE as c_int,
            renderable as c_int,
            ffi::egl::RED_SIZE as c_int,
            8,
            ffi::egl::GREEN_SIZE as c_int,
            8,
            ffi::egl::BLUE_SIZE as c_int,
            8,
            ffi::egl::ALPHA_SIZE as c_int,
            8,
            ffi::egl::DEPTH_SIZE as c_int,
            attributes.depth_bits as c_int,
            ffi::egl::STENCIL_SIZE as c_int,
            attributes.stencil_bits as c_int,
            ffi::egl::NONE as c_int,
        ];

        // the first matching config is the best one according to the EGL sorting rules
        let mut config: ffi::egl::types::EGLConfig = ptr::null();
        let mut num_configs = 0;
        wrap_egl_call(|| unsafe {
            ffi::egl::ChooseConfig(
                **self.display,
                descriptor.as_ptr(),
                &mut config,
                1,
                &mut num_configs,
            )
        })
        .map_err(Error::ConfigFailed)?;
        if num_configs == 0 {
            return Err(Error::NoAvailablePixelFormat);
        }

        debug!("Chose EGL config {:?}", config);
        Ok(config)
    }

    /// Returns the runtime egl version of this display
    pub fn get_egl_version(&self) -> (i32, i32) {
        self.egl_version
    }

    /// Returns the supported extensions of this display
    pub fn get_extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }

    /// Windowing system of the display
    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub(crate) fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|s| s == extension)
    }
}

unsafe fn get_display(
    native: &NativeDisplay,
    dp_extensions: &[String],
) -> Result<(ffi::egl::types::EGLDisplay, Platform), Error> {
    let (display, platform) = match native {
        NativeDisplay::X11 { .. } => {
            const EXTENSIONS: &[&str] = &["EGL_EXT_platform_base", "EGL_EXT_platform_x11"];
            if !EXTENSIONS.iter().all(|ext| dp_extensions.iter().any(|s| s == ext)) {
                return Err(Error::EglExtensionNotSupported(EXTENSIONS));
            }
            // We pass DEFAULT_DISPLAY (null pointer) because the driver should open a connection to the X server.
            let display = wrap_egl_call(|| {
                ffi::egl::GetPlatformDisplayEXT(
                    ffi::egl::PLATFORM_X11_EXT,
                    ffi::egl::DEFAULT_DISPLAY as *mut _,
                    ptr::null(),
                )
            })
            .map_err(Error::DisplayNotSupported)?;
            (display, Platform::X11)
        }
        NativeDisplay::Win32 { .. } => {
            let display = wrap_egl_call(|| ffi::egl::GetDisplay(ffi::egl::DEFAULT_DISPLAY))
                .map_err(Error::DisplayNotSupported)?;
            (display, Platform::Win32)
        }
        NativeDisplay::Headless => return Err(Error::UnsupportedDisplay(Platform::Headless)),
    };

    if display == ffi::egl::NO_DISPLAY {
        return Err(Error::DisplayNotSupported(EGLError::BadDisplay));
    }
    Ok((display, platform))
}
