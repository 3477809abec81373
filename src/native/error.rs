use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NativeErrorCode {
    Unavailable,
    InitializationFailed,
}

impl NativeErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            NativeErrorCode::Unavailable => "native/unavailable",
            NativeErrorCode::InitializationFailed => "native/initialization-failed",
        }
    }
}

#[derive(Clone, Debug)]
pub struct NativeError {
    pub code: NativeErrorCode,
    message: String,
}

impl NativeError {
    pub fn new(code: NativeErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl Display for NativeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for NativeError {}

pub type NativeResult<T> = Result<T, NativeError>;

pub fn unavailable(message: impl Into<String>) -> NativeError {
    NativeError::new(NativeErrorCode::Unavailable, message)
}

pub fn initialization_failed(message: impl Into<String>) -> NativeError {
    NativeError::new(NativeErrorCode::InitializationFailed, message)
}
