//! Domain error types.
//!
//! Two families share one enum: configuration errors, raised once before a
//! simulation starts, and data errors, raised by the price provider before the
//! core ever runs. The simulation loop itself has no failure mode.

#[derive(Debug, thiserror::Error)]
pub enum BacktesterError {
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

    #[error("strategy {name} is not supported")]
    UnknownStrategy { name: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("{symbol} is not a valid cryptocurrency symbol")]
    InvalidSymbol { symbol: String },

    #[error("failed to fetch {resource}, status code: {status}")]
    ProviderStatus { resource: String, status: u16 },

    #[error("request error: {reason}")]
    ProviderRequest { reason: String },

    #[error("malformed price data: {reason}")]
    DataFormat { reason: String },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktesterError {
    /// Invalid arguments supplied by the caller ("bad request").
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BacktesterError::ConfigParse { .. }
                | BacktesterError::ConfigMissing { .. }
                | BacktesterError::ConfigInvalid { .. }
                | BacktesterError::UnknownStrategy { .. }
                | BacktesterError::InvalidSeries { .. }
        )
    }

    /// Failures of the remote or on-disk price source ("bad remote state").
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            BacktesterError::InvalidSymbol { .. }
                | BacktesterError::ProviderStatus { .. }
                | BacktesterError::ProviderRequest { .. }
                | BacktesterError::DataFormat { .. }
                | BacktesterError::NoData { .. }
        )
    }

    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        BacktesterError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(section: &str, key: &str) -> Self {
        BacktesterError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    /// Process exit status: 1 I/O, 2 configuration, 4 unknown strategy, 5 data.
    pub fn exit_code(&self) -> u8 {
        match self {
            BacktesterError::Io(_) => 1,
            BacktesterError::ConfigParse { .. }
            | BacktesterError::ConfigMissing { .. }
            | BacktesterError::ConfigInvalid { .. }
            | BacktesterError::InvalidSeries { .. } => 2,
            BacktesterError::UnknownStrategy { .. } => 4,
            BacktesterError::InvalidSymbol { .. }
            | BacktesterError::ProviderStatus { .. }
            | BacktesterError::ProviderRequest { .. }
            | BacktesterError::DataFormat { .. }
            | BacktesterError::NoData { .. } => 5,
        }
    }
}

impl From<&BacktesterError> for std::process::ExitCode {
    fn from(err: &BacktesterError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
