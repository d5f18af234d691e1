#![allow(missing_docs)]

use std::{
    ffi::{c_void, CStr, CString},
    ptr,
};

use tracing::debug;

use super::Error;

pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
pub type khronos_uint64_t = u64;
pub type khronos_ssize_t = std::os::raw::c_long;
pub type EGLint = i32;
pub type EGLNativeDisplayType = NativeDisplayType;
pub type EGLNativePixmapType = NativePixmapType;
pub type EGLNativeWindowType = NativeWindowType;
pub type NativeDisplayType = *const c_void;
pub type NativePixmapType = *const c_void;
pub type NativeWindowType = *const c_void;

/// Loads libEGL symbols, if not loaded already.
///
/// Returns the client extensions, which are queried without a display.
/// This normally happens automatically during [`EGLDisplay`](super::display::EGLDisplay) initialization.
pub fn make_sure_egl_is_loaded() -> Result<Vec<String>, Error> {
    let lib = egl::LIB.as_ref().map_err(|err| Error::LibraryNotFound(err.to_string()))?;

    egl::LOAD.call_once(|| unsafe {
        egl::load_with(|sym| {
            let Ok(name) = CString::new(sym) else {
                return ptr::null();
            };
            match lib.get::<*mut c_void>(name.as_bytes_with_nul()) {
                Ok(symbol) => *symbol as *const _,
                Err(_) => ptr::null(),
            }
        });
        // extension entry points are only reachable through eglGetProcAddress
        egl::GetPlatformDisplayEXT::load_with(|sym| super::get_proc_address(sym));
        egl::CreatePlatformWindowSurfaceEXT::load_with(|sym| super::get_proc_address(sym));
    });

    // this possibility is available only with EGL 1.5 or EGL_EXT_client_extensions, otherwise
    // `eglQueryString` returns an error
    let extensions = unsafe {
        let p = super::wrap_egl_call(|| egl::QueryString(egl::NO_DISPLAY, egl::EXTENSIONS as i32))
            .map_err(Error::InitFailed)?;
        if p.is_null() {
            Vec::new()
        } else {
            split_extensions(CStr::from_ptr(p))
        }
    };
    debug!("EGL No-Display Extensions: {:?}", extensions);

    Ok(extensions)
}

pub(super) fn split_extensions(list: &CStr) -> Vec<String> {
    list.to_string_lossy()
        .split(' ')
        .filter(|e| !e.is_empty())
        .map(|e| e.to_string())
        .collect()
}

/// Module containing raw egl function bindings
#[allow(clippy::all, missing_debug_implementations)]
pub mod egl {
    use super::*;
    use libloading::Library;
    use once_cell::sync::Lazy;
    use std::sync::Once;

    #[cfg(not(windows))]
    const LIB_NAME: &str = "libEGL.so.1";
    #[cfg(windows)]
    const LIB_NAME: &str = "libEGL.dll";

    pub static LIB: Lazy<Result<Library, libloading::Error>> = Lazy::new(|| unsafe { Library::new(LIB_NAME) });

    pub static LOAD: Once = Once::new();

    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_list_is_split_on_spaces() {
        let list = CStr::from_bytes_with_nul(b"EGL_EXT_platform_base EGL_KHR_platform_x11 \0").unwrap();
        assert_eq!(
            split_extensions(list),
            vec!["EGL_EXT_platform_base".to_string(), "EGL_KHR_platform_x11".to_string()]
        );
    }
}
