//! Error types for the vSphere client crate.

use std::fmt;

/// Categorised error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VsphereErrorKind {
    /// vSphere endpoint unreachable or session expired
    ConnectionError,
    /// Authentication failed (401)
    AuthenticationError,
    /// Permission denied (403)
    AccessDenied,
    /// Generic HTTP 404 for a path that is not a managed object lookup
    NotFound,
    /// A managed object reference does not resolve to an inventory object
    ManagedObjectNotFound,
    /// No host carries the requested hostname in any datacenter
    HostnameNotFound,
    /// Neither a managed object ID nor a hostname matched
    HostnameOrIdNotFound,
    /// More than one host carries the requested hostname
    AmbiguousHostname,
    /// Endpoint reported an API type this crate cannot drive
    UnsupportedApiType,
    /// Caller supplied an unusable argument
    InvalidArgument,
    /// HTTP / API error with status code
    ApiError(u16),
    /// Timeout
    Timeout,
    /// Task failed on the endpoint
    TaskError,
    /// JSON parse / deserialization error
    ParseError,
    /// Generic
    Other,
}

/// Crate error type carrying a kind + human-readable message.
#[derive(Debug, Clone)]
pub struct VsphereError {
    pub kind: VsphereErrorKind,
    pub message: String,
}

impl VsphereError {
    pub fn new(kind: VsphereErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into() }
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::ConnectionError, msg)
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::AuthenticationError, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::NotFound, msg)
    }

    /// Missing managed object, phrased the way vCenter reports it.
    pub fn managed_object_not_found(mo_type: &str, value: &str) -> Self {
        Self::new(
            VsphereErrorKind::ManagedObjectNotFound,
            format!("The object '{mo_type}:{value}' has already been deleted or has not been completely created"),
        )
    }

    pub fn hostname_not_found(hostname: &str) -> Self {
        Self::new(
            VsphereErrorKind::HostnameNotFound,
            format!("could not find host with hostname '{hostname}'"),
        )
    }

    pub fn hostname_or_id_not_found(raw: &str) -> Self {
        Self::new(
            VsphereErrorKind::HostnameOrIdNotFound,
            format!("could not find host based off of id or hostname '{raw}'"),
        )
    }

    pub fn ambiguous_hostname(hostname: &str) -> Self {
        Self::new(
            VsphereErrorKind::AmbiguousHostname,
            format!("more than one host with hostname '{hostname}' was found"),
        )
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::InvalidArgument, msg)
    }

    pub fn api(status: u16, msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::ApiError(status), msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::ParseError, msg)
    }

    pub fn task(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::TaskError, msg)
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::new(VsphereErrorKind::Timeout, msg)
    }

    pub fn is_managed_object_not_found(&self) -> bool {
        self.kind == VsphereErrorKind::ManagedObjectNotFound
    }

    pub fn is_hostname_not_found(&self) -> bool {
        self.kind == VsphereErrorKind::HostnameNotFound
    }

    /// Any of the "nothing matched" kinds, as opposed to a failed call.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            VsphereErrorKind::NotFound
                | VsphereErrorKind::ManagedObjectNotFound
                | VsphereErrorKind::HostnameNotFound
                | VsphereErrorKind::HostnameOrIdNotFound
        )
    }

    /// Transport failures and transient server-side statuses.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            VsphereErrorKind::ConnectionError | VsphereErrorKind::Timeout => true,
            VsphereErrorKind::ApiError(code) => code == 429 || (500..600).contains(&code),
            _ => false,
        }
    }
}

impl fmt::Display for VsphereError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for VsphereError {}

impl From<VsphereError> for String {
    fn from(e: VsphereError) -> String {
        e.to_string()
    }
}

impl From<reqwest::Error> for VsphereError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("HTTP timeout: {e}"))
        } else if e.is_connect() {
            Self::connection(format!("Connection failed: {e}"))
        } else {
            Self::new(VsphereErrorKind::Other, format!("HTTP error: {e}"))
        }
    }
}

impl From<serde_json::Error> for VsphereError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse(format!("JSON parse error: {e}"))
    }
}

impl From<tokio::time::error::Elapsed> for VsphereError {
    fn from(e: tokio::time::error::Elapsed) -> Self {
        Self::timeout(format!("operation timed out: {e}"))
    }
}

/// Convenience alias.
pub type VsphereResult<T> = Result<T, VsphereError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind() {
        let err = VsphereError::hostname_not_found("esxi-01.lab");
        let s = err.to_string();
        assert!(s.contains("HostnameNotFound"));
        assert!(s.contains("esxi-01.lab"));
    }

    #[test]
    fn not_found_classification() {
        assert!(VsphereError::managed_object_not_found("HostSystem", "host-9").is_not_found());
        assert!(VsphereError::hostname_or_id_not_found("x").is_not_found());
        assert!(!VsphereError::ambiguous_hostname("x").is_not_found());
        assert!(!VsphereError::connection("refused").is_not_found());
    }

    #[test]
    fn managed_object_not_found_is_distinct_from_plain_404() {
        let mo = VsphereError::managed_object_not_found("Datastore", "datastore-1");
        assert!(mo.is_managed_object_not_found());
        assert!(!VsphereError::not_found("no such path").is_managed_object_not_found());
    }

    #[test]
    fn retryable_kinds() {
        assert!(VsphereError::connection("reset").is_retryable());
        assert!(VsphereError::timeout("slow").is_retryable());
        assert!(VsphereError::api(503, "busy").is_retryable());
        assert!(VsphereError::api(429, "slow down").is_retryable());
        assert!(!VsphereError::api(400, "bad").is_retryable());
        assert!(!VsphereError::ambiguous_hostname("h").is_retryable());
    }

    #[test]
    fn into_string() {
        let s: String = VsphereError::task("boom").into();
        assert!(s.contains("boom"));
    }
}
