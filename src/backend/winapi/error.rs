use crate::backend::BackendError;

/// An error emitted by the Win32 backend.
#[derive(Debug, thiserror::Error)]
pub enum WinapiError {
    /// A Win32 call failed.
    #[error("{call} failed: {message} ({code:#010x})")]
    Os {
        /// Name of the failed function
        call: &'static str,
        /// The `HRESULT` of the failure
        code: i32,
        /// System message for the failure
        message: String,
    },

    /// The window does not belong to this backend or was already destroyed.
    #[error("The window does not belong to this Win32 backend")]
    UnknownWindow,
}

impl WinapiError {
    pub(crate) fn os(call: &'static str, err: windows::core::Error) -> WinapiError {
        WinapiError::Os {
            call,
            code: err.code().0,
            message: err.message(),
        }
    }
}

impl From<WinapiError> for BackendError {
    fn from(err: WinapiError) -> Self {
        match err {
            WinapiError::UnknownWindow => BackendError::UnknownWindow,
            err => BackendError::Platform(Box::new(err)),
        }
    }
}
