use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures raised by the native call surface.
#[derive(Debug, thiserror::Error)]
pub enum NativeError {
    #[error("failed to load native library {path}: {reason}")]
    LibraryLoad { path: String, reason: String },

    #[error("unable to find symbol: {symbol}")]
    Linkage { symbol: String },

    #[error("{0} returned a null handle")]
    NullHandle(&'static str),

    #[error("cannot marshal {what}: {reason}")]
    Marshal { what: &'static str, reason: String },

    #[error("native fault in {call}: {reason}")]
    Fault { call: &'static str, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{reason} (hint: {hint})")]
    Precondition { reason: String, hint: String },

    #[error("not supported: {0}")]
    NotSupported(String),

    #[error("window operation failed: {0}")]
    WindowOperation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LumenError {
    #[error("linkage error: {0}")]
    Linkage(String),

    #[error("webview creation failed: {0}")]
    CreationFailed(String),

    #[error("platform precondition failed: {reason} (hint: {hint})")]
    PlatformPrecondition { reason: String, hint: String },

    #[error("bound callback '{name}' failed: {message}")]
    CallbackFault { name: String, message: String },

    #[error("native fault: {0}")]
    NativeFault(NativeError),

    #[error("{0} must be called from the thread that owns the webview")]
    WrongThread(&'static str),

    #[error("webview is closed")]
    Closed,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Platform(PlatformError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<NativeError> for LumenError {
    fn from(err: NativeError) -> Self {
        match err {
            NativeError::LibraryLoad { .. } | NativeError::Linkage { .. } => {
                Self::Linkage(err.to_string())
            }
            NativeError::NullHandle(_) => Self::CreationFailed(err.to_string()),
            other => Self::NativeFault(other),
        }
    }
}

impl From<PlatformError> for LumenError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Precondition { reason, hint } => {
                Self::PlatformPrecondition { reason, hint }
            }
            other => Self::Platform(other),
        }
    }
}
