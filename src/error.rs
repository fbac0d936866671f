//! Startup failure classes and their process exit codes.

/// Fatal conditions detected before the control loop starts.
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("this program must be run with root permission")]
    InsufficientPrivilege,
}

impl StartupError {
    /// Distinct non-zero status per failure class, taken from errno.
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::InvalidConfig(_) => 22,       // EINVAL
            StartupError::InsufficientPrivilege => 1,   // EPERM
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let config = StartupError::InvalidConfig("bad".to_string());
        let privilege = StartupError::InsufficientPrivilege;
        assert_ne!(config.exit_code(), privilege.exit_code());
        assert_ne!(config.exit_code(), 0);
        assert_ne!(privilege.exit_code(), 0);
    }

    #[test]
    fn test_invalid_config_message() {
        let err = StartupError::InvalidConfig("INTERVAL must be > 0".to_string());
        assert_eq!(err.to_string(), "invalid configuration: INTERVAL must be > 0");
    }
}
