//! Error types for the provider layer.

use std::fmt;
use tpv_vsphere::{VsphereError, VsphereErrorKind};

/// Categorised error kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Configuration rejected by the schema or a resource
    Validation,
    /// No resource or data source registered under that type name
    UnknownType,
    /// Import ID does not have the expected shape
    ImportFormat,
    /// The remote object a resource points at is gone
    NotFound,
    /// Operation not available for this type or endpoint
    Unsupported,
    /// The vSphere endpoint returned an error
    Api,
}

/// Provider error carrying a kind, a message and the endpoint error, if any.
#[derive(Debug, Clone)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub source: Option<VsphereError>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, msg: impl Into<String>) -> Self {
        Self { kind, message: msg.into(), source: None }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Validation, msg)
    }

    pub fn unknown_type(type_name: &str) -> Self {
        Self::new(ProviderErrorKind::UnknownType, format!("unknown type '{type_name}'"))
    }

    pub fn import_format(msg: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ImportFormat, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Unsupported, msg)
    }

    /// Wrap an endpoint error under a context message.
    pub fn api(context: impl Into<String>, err: VsphereError) -> Self {
        let context = context.into();
        Self {
            kind: ProviderErrorKind::Api,
            message: format!("{context}: {}", err.message),
            source: Some(err),
        }
    }

    /// Kind of the underlying endpoint error.
    pub fn vsphere_kind(&self) -> Option<&VsphereErrorKind> {
        self.source.as_ref().map(|e| &e.kind)
    }

    pub fn is_retryable(&self) -> bool {
        self.source.as_ref().map(VsphereError::is_retryable).unwrap_or(false)
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.vsphere_kind() {
            Some(k) => write!(f, "[{:?}/{:?}] {}", self.kind, k, self.message),
            None => write!(f, "[{:?}] {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<VsphereError> for ProviderError {
    fn from(e: VsphereError) -> Self {
        Self { kind: ProviderErrorKind::Api, message: e.message.clone(), source: Some(e) }
    }
}

impl From<ProviderError> for String {
    fn from(e: ProviderError) -> String {
        e.to_string()
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::validation(format!("JSON error: {e}"))
    }
}

/// Convenience alias.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn api_keeps_endpoint_classification() {
        let err = ProviderError::api(
            "error retrieving host for iscsi",
            VsphereError::ambiguous_hostname("esxi-01.lab"),
        );
        assert_eq!(err.kind, ProviderErrorKind::Api);
        assert_eq!(err.vsphere_kind(), Some(&VsphereErrorKind::AmbiguousHostname));
        assert!(err.message.starts_with("error retrieving host for iscsi: "));
        assert!(err.source().is_some());
    }

    #[test]
    fn display_shows_both_kinds() {
        let err = ProviderError::api("read", VsphereError::timeout("slow"));
        let s = err.to_string();
        assert!(s.contains("Api"));
        assert!(s.contains("Timeout"));
        assert!(err.is_retryable());
    }

    #[test]
    fn plain_errors_have_no_source() {
        let err = ProviderError::import_format("bad id");
        assert!(err.vsphere_kind().is_none());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "[ImportFormat] bad id");
    }
}
