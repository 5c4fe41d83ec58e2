//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        CliError::Infra(InfraError::from(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Http { .. } | InfraError::HttpStatus { .. } => {
                    crate::exitcode::UNAVAILABLE
                }
                InfraError::Decode { .. } | InfraError::InvalidDataset { .. } => {
                    crate::exitcode::DATAERR
                }
                InfraError::Application(ApplicationError::Config { .. }) => crate::exitcode::CONFIG,
                InfraError::Application(ApplicationError::Domain(d)) if d.is_data_unavailable() => {
                    crate::exitcode::UNAVAILABLE
                }
                InfraError::Application(_) => crate::exitcode::SOFTWARE,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;
    use rstest::rstest;

    #[rstest]
    #[case(CliError::from(DomainError::EmptyDataset), exitcode::UNAVAILABLE)]
    #[case(CliError::from(DomainError::InvalidRange { start: 2, end: 1 }), exitcode::UNAVAILABLE)]
    #[case(
        CliError::from(DomainError::InvalidNode { position: "$".into(), reason: "x".into() }),
        exitcode::SOFTWARE
    )]
    #[case(
        CliError::from(ApplicationError::Config { message: "bad".into() }),
        exitcode::CONFIG
    )]
    #[case(CliError::Usage("nope".into()), exitcode::USAGE)]
    fn given_error_when_mapping_then_exit_code_matches(#[case] err: CliError, #[case] code: i32) {
        assert_eq!(err.exit_code(), code);
    }
}
