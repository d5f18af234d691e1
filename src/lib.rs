#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
// Allow acronyms like EGL
#![allow(clippy::upper_case_acronyms)]

//! # glps: a small multi-window manager
//!
//! This crate opens native windows on X11 and Win32, binds them to one shared OpenGL ES
//! context and reports their input through plain callbacks. It is meant for applications
//! that own their render loop and only need a thin layer between them and the window system.
//!
//! ## Structure of the crate
//!
//! - [`manager`] contains the [`WindowManager`], the registry of open windows and the
//!   event dispatcher driving the user callbacks.
//! - [`backend`] contains the window system connections (x11, winapi and a headless
//!   backend for tests) and the graphics binders (egl, wgl, plus helpers for vulkan).
//!
//! ## General principles
//!
//! The window manager never blocks on the window system. The application calls
//! [`WindowManager::should_close`] once per iteration of its loop, which dispatches a bounded
//! number of pending events and reports whether every window is closed:
//!
//! ```no_run
//! let mut wm = glps::WindowManager::init();
//! let window = wm.window_create("glps", 800, 600).unwrap();
//! wm.set_keyboard_callback(|_, key| println!("{:?} {}", key.state, key.text));
//!
//! while !wm.should_close() {
//!     wm.window_update(window).ok();
//!     wm.swap_buffers(window).ok();
//! }
//! ```
//!
//! Everything is single threaded, the window manager and its backends must stay on the
//! thread that created them.
//!
//! ### Logging
//!
//! glps makes extensive use of [`tracing`] for its internal logging. Each backend logs
//! inside its own span (`backend_x11`, `backend_winapi`, `backend_headless`, `backend_egl`,
//! `backend_wgl`).
//!
//! For release builds it is recommended to limit the log level during compile time.
//! This can be done by adding a dependency to [`tracing`] and enabling the corresponding features.
//! For example to enable `trace` messages for debug builds, but limit release builds to `debug` add
//! the following in your binary crate `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! tracing = { version = "0.1", features = ["max_level_trace", "release_max_level_debug"] }
//! ```

pub mod backend;
pub mod manager;
pub mod reexports;
pub mod utils;

pub use manager::{ManagerConfig, WindowError, WindowId, WindowManager};
