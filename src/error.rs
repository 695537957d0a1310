use crate::chain::ChainReadError;
use crate::config::ConfigError;
use crate::orchestration::RunError;
use crate::pricing::PriceError;
use crate::report::ReportError;
use thiserror::Error;

/// Top-level failure of the binary, mapped to an exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Chain connection error: {0}")]
    Connect(#[from] ChainReadError),
    #[error("Price source error: {0}")]
    Price(#[from] PriceError),
    #[error("Run failed: {0}")]
    Run(#[from] RunError),
    #[error("Report error: {0}")]
    Report(#[from] ReportError),
    /// The report was written but some pools could not be attributed.
    #[error("{failed} pool(s) failed; partial report written")]
    PartialReport { failed: usize },
}

impl AppError {
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Connect(_)
            | AppError::Price(_)
            | AppError::Run(_)
            | AppError::Report(_) => 1,
            AppError::PartialReport { .. } => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let err = AppError::from(ConfigError::MissingEnv("RPC_URL".to_string()));
        assert_eq!(err.exit_code(), 2);
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: RPC_URL"
        );

        let err = AppError::from(ChainReadError::Rpc("refused".to_string()));
        assert_eq!(err.exit_code(), 1);

        let err = AppError::from(PriceError::Client("no TLS backend".to_string()));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.to_string(),
            "Price source error: HTTP client setup failed: no TLS backend"
        );

        assert_eq!(AppError::PartialReport { failed: 2 }.exit_code(), 3);
    }
}
