use thiserror::Error;

/// Closed classification of store failures, decided by the adapter that produced them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Row-level access denied (SQLSTATE 42501)
    InsufficientPrivilege,
    /// The store could not be reached or the connection dropped
    Connection,
    /// A row came back in a shape the client cannot decode
    Decode,
    /// The request itself was malformed (bad table or column name)
    InvalidRequest,
    /// Any other error reported by the backend
    Backend,
}

/// A structured store error: machine-readable code plus the backend's message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct StoreError {
    pub kind: ErrorKind,
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    /// SQLSTATE insufficient_privilege
    pub const INSUFFICIENT_PRIVILEGE: &'static str = "42501";

    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self { Self { kind, code: None, message: message.into() } }

    /// Classify an error by the code the backend reported
    pub fn from_code(code: Option<String>, message: impl Into<String>) -> Self {
        let kind = match code.as_deref() {
            Some(Self::INSUFFICIENT_PRIVILEGE) => ErrorKind::InsufficientPrivilege,
            _ => ErrorKind::Backend,
        };
        Self { kind, code, message: message.into() }
    }

    pub fn insufficient_privilege(message: impl Into<String>) -> Self {
        Self::from_code(Some(Self::INSUFFICIENT_PRIVILEGE.to_owned()), message)
    }

    pub fn connection(message: impl std::fmt::Display) -> Self { Self::new(ErrorKind::Connection, message.to_string()) }

    pub fn decode(message: impl std::fmt::Display) -> Self { Self::new(ErrorKind::Decode, message.to_string()) }

    pub fn invalid_request(message: impl std::fmt::Display) -> Self { Self::new(ErrorKind::InvalidRequest, message.to_string()) }

    pub fn is_insufficient_privilege(&self) -> bool { self.kind == ErrorKind::InsufficientPrivilege }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self { StoreError::decode(err) }
}
