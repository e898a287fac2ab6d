//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;

use geoplot::config::ConfigError;
use geoplot::plot::{FetchError, StoreError};

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Configuration rejected
    Config(ConfigError),
    /// Failed to build the HTTP transport
    Transport(FetchError),
    /// Failed to open the plot cache directory
    Store(StoreError),
    /// The session did not settle within the frame limit
    DidNotSettle { frames: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(self.exit_code());
    }

    fn exit_code(&self) -> i32 {
        match self {
            CliError::LoggingInit(_) => 2,
            CliError::Config(_) => 2,
            CliError::Transport(_) => 3,
            CliError::Store(_) => 3,
            CliError::DidNotSettle { .. } => 4,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "invalid configuration: {}", e),
            CliError::Transport(e) => write!(f, "failed to build transport: {}", e),
            CliError::Store(e) => write!(f, "failed to open plot cache: {}", e),
            CliError::DidNotSettle { frames } => {
                write!(f, "session did not settle within {} frames", frames)
            }
        }
    }
}

impl std::error::Error for CliError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = CliError::DidNotSettle { frames: 200 };
        assert!(err.to_string().contains("200 frames"));
    }

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        assert_eq!(CliError::DidNotSettle { frames: 1 }.exit_code(), 4);
        assert_eq!(
            CliError::Config(ConfigError::InvalidSimplify(0)).exit_code(),
            2
        );
    }
}
