//! Domain error types.

/// Top-level error type for renkotrader.
#[derive(Debug, thiserror::Error)]
pub enum RenkotraderError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("degenerate brick size for {code}: {reason}")]
    DegenerateBrickSize { code: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&RenkotraderError> for std::process::ExitCode {
    fn from(err: &RenkotraderError) -> Self {
        let code: u8 = match err {
            RenkotraderError::Io(_) => 1,
            RenkotraderError::ConfigParse { .. } | RenkotraderError::ConfigInvalid { .. } => 2,
            RenkotraderError::Data { .. } => 3,
            RenkotraderError::NoData { .. }
            | RenkotraderError::InsufficientData { .. }
            | RenkotraderError::DegenerateBrickSize { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
