use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RumErrorCode {
    InvalidConfiguration,
    AlreadyInitialized,
    NotInitialized,
    Internal,
}

impl RumErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RumErrorCode::InvalidConfiguration => "rum/invalid-configuration",
            RumErrorCode::AlreadyInitialized => "rum/already-initialized",
            RumErrorCode::NotInitialized => "rum/not-initialized",
            RumErrorCode::Internal => "rum/internal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct RumError {
    pub code: RumErrorCode,
    message: String,
}

impl RumError {
    pub fn new(code: RumErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for RumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for RumError {}

pub type RumResult<T> = Result<T, RumError>;

pub fn invalid_configuration(message: impl Into<String>) -> RumError {
    RumError::new(RumErrorCode::InvalidConfiguration, message)
}

pub fn already_initialized(message: impl Into<String>) -> RumError {
    RumError::new(RumErrorCode::AlreadyInitialized, message)
}

pub fn not_initialized() -> RumError {
    RumError::new(RumErrorCode::NotInitialized, "rum sdk has not been initialized")
}

pub fn internal_error(message: impl Into<String>) -> RumError {
    RumError::new(RumErrorCode::Internal, message)
}
