use std::io;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationFailed,
    AllocationExhausted,
    ControlNumberMalformed,
    StoreUnavailable,
    StorageLockTimeout,
    SerializationError,
    SchemaMismatch,
    ConfigError,
    IssuanceFailed,
}

#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum IssuanceError {
    /// Caller-correctable input problem; named field is the one that failed.
    #[error("validation failed for field '{field}': {reason}")]
    ValidationFailed { field: &'static str, reason: String },

    #[error("allocation retries exhausted for prefix {prefix} after {attempts} attempts")]
    AllocationExhausted { prefix: String, attempts: u32 },

    #[error("malformed control number '{value}': {reason}")]
    ControlNumberMalformed { value: String, reason: String },

    #[error("store unavailable during {operation}: {details}")]
    StoreUnavailable { operation: String, details: String },

    #[error("storage lock timeout: {operation} (waited {timeout_secs}s)")]
    StorageLockTimeout { operation: String, timeout_secs: u64 },

    #[error("{format} serialization error: {details}")]
    SerializationError { format: String, details: String },

    #[error("schema mismatch: stored={stored} current={current}")]
    SchemaMismatch { stored: u32, current: u32 },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("issuance failed")]
    IssuanceFailed {
        #[source]
        cause: Box<IssuanceError>,
    },
}

pub type Result<T> = std::result::Result<T, IssuanceError>;

impl IssuanceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            IssuanceError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            IssuanceError::AllocationExhausted { .. } => ErrorCode::AllocationExhausted,
            IssuanceError::ControlNumberMalformed { .. } => ErrorCode::ControlNumberMalformed,
            IssuanceError::StoreUnavailable { .. } => ErrorCode::StoreUnavailable,
            IssuanceError::StorageLockTimeout { .. } => ErrorCode::StorageLockTimeout,
            IssuanceError::SerializationError { .. } => ErrorCode::SerializationError,
            IssuanceError::SchemaMismatch { .. } => ErrorCode::SchemaMismatch,
            IssuanceError::ConfigError(_) => ErrorCode::ConfigError,
            IssuanceError::IssuanceFailed { .. } => ErrorCode::IssuanceFailed,
        }
    }

    pub fn context(&self) -> ErrorContext {
        ErrorContext { code: self.code(), message: self.to_string() }
    }

    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        IssuanceError::ValidationFailed { field, reason: reason.into() }
    }

    /// Wrap an allocation or persistence failure as seen by `issue_certificate` callers.
    /// Validation failures stay unwrapped so callers can tell "fix your input"
    /// from "try again later".
    pub fn into_issuance_failure(self) -> Self {
        match self {
            err @ IssuanceError::ValidationFailed { .. } => err,
            err @ IssuanceError::IssuanceFailed { .. } => err,
            other => IssuanceError::IssuanceFailed { cause: Box::new(other) },
        }
    }

    /// True when retrying the whole issuance from the top may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            IssuanceError::AllocationExhausted { .. }
            | IssuanceError::StoreUnavailable { .. }
            | IssuanceError::StorageLockTimeout { .. } => true,
            IssuanceError::IssuanceFailed { cause } => cause.is_transient(),
            _ => false,
        }
    }
}

impl From<io::Error> for IssuanceError {
    fn from(err: io::Error) -> Self {
        IssuanceError::StoreUnavailable { operation: "io".to_string(), details: err.to_string() }
    }
}

impl From<rocksdb::Error> for IssuanceError {
    fn from(err: rocksdb::Error) -> Self {
        IssuanceError::StoreUnavailable { operation: "rocksdb".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for IssuanceError {
    fn from(err: bincode::Error) -> Self {
        IssuanceError::SerializationError { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<serde_json::Error> for IssuanceError {
    fn from(err: serde_json::Error) -> Self {
        IssuanceError::SerializationError { format: "json".to_string(), details: err.to_string() }
    }
}

#[macro_export]
macro_rules! storage_err {
    ($op:expr, $err:expr) => {
        $crate::foundation::IssuanceError::StoreUnavailable { operation: $op.into(), details: $err.to_string() }
    };
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `IssuanceError` variants at the call site to preserve context.
