//! Domain error types.
//!
//! Missing market data is NaN, not an error; an untradable security at
//! rebalance time is a silent skip. Errors here are reserved for config,
//! data-file, and programming-contract problems.

/// Top-level error type for quantscreen.
#[derive(Debug, thiserror::Error)]
pub enum QuantscreenError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("pipeline references unknown score column: {name}")]
    UnknownColumn { name: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("window shape mismatch: {reason}")]
    WindowShape { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&QuantscreenError> for std::process::ExitCode {
    fn from(err: &QuantscreenError) -> Self {
        let code: u8 = match err {
            QuantscreenError::Io(_) => 1,
            QuantscreenError::ConfigParse { .. }
            | QuantscreenError::ConfigMissing { .. }
            | QuantscreenError::ConfigInvalid { .. } => 2,
            QuantscreenError::Data { .. } => 3,
            QuantscreenError::UnknownStrategy { .. } | QuantscreenError::UnknownColumn { .. } => 4,
            QuantscreenError::WindowShape { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
