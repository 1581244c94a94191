//! Error types for the settings console
//!
//! One taxonomy shared by every layer:
//! - Network failures (request never completed)
//! - Missing resources (HTTP 404, parent no longer exists)
//! - Server failures (non-2xx, or an envelope with `success: false`)
//! - Client-side validation failures (never reach the network)
//! - Malformed responses and configuration problems

use std::fmt;

/// Main console error type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConsoleError {
    /// Request failed to complete
    #[error("network error: {0}")]
    Network(String),

    /// Resource does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Non-2xx response
    #[error("server error {status}: {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body when present
        message: String,
    },

    /// 2xx response whose envelope reported `success: false`
    #[error("request rejected: {0}")]
    Rejected(String),

    /// Client-side validation failed before any request was made
    #[error("validation failed: {0}")]
    Validation(Violations),

    /// Response body could not be decoded into the expected shape
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network failure
    Network,
    /// Missing resource
    NotFound,
    /// Server-side failure or rejection
    Server,
    /// Client-side validation
    Validation,
    /// Decode failure
    Decode,
    /// Configuration
    Config,
}

impl ConsoleError {
    /// Classify this error
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Server { .. } | Self::Rejected(_) => ErrorKind::Server,
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidResponse(_) => ErrorKind::Decode,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Check if the error was produced before any request was issued
    #[inline]
    #[must_use]
    pub fn is_client_side(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Config(_))
    }

    /// Text suitable for a toast or inline banner
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(_) => "Unable to reach the server. Please try again.".to_string(),
            Self::NotFound(what) => format!("{what} no longer exists"),
            Self::Server { message, .. } | Self::Rejected(message) => message.clone(),
            Self::Validation(violations) => violations
                .first()
                .map(|v| v.message.clone())
                .unwrap_or_else(|| "Invalid input".to_string()),
            Self::InvalidResponse(_) => "Unexpected response from the server".to_string(),
            Self::Config(msg) => msg.clone(),
        }
    }

    /// Build a validation error from a single violation
    #[inline]
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(Violations::single(FieldViolation::new(field, message)))
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

/// One failed field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Form field name (wire name)
    pub field: String,
    /// Human-readable message
    pub message: String,
}

impl FieldViolation {
    /// Create new violation
    #[inline]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found by a validation pass, in check order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Wrap a list of violations
    #[inline]
    #[must_use]
    pub fn new(violations: Vec<FieldViolation>) -> Self {
        Self(violations)
    }

    /// Single violation
    #[inline]
    #[must_use]
    pub fn single(violation: FieldViolation) -> Self {
        Self(vec![violation])
    }

    /// First violation in check order
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&FieldViolation> {
        self.0.first()
    }

    /// Violations for one field
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.0.iter().filter(move |v| v.field == field)
    }

    /// All violations
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[FieldViolation] {
        &self.0
    }

    /// Number of violations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No violations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl IntoIterator for Violations {
    type Item = FieldViolation;
    type IntoIter = std::vec::IntoIter<FieldViolation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Types that can check themselves before being sent anywhere
pub trait Validate {
    /// Collect every violation; empty when valid
    fn violations(&self) -> Vec<FieldViolation>;

    /// Run the validation pass and fold the result into an error
    fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ConsoleError::Validation(Violations::new(violations)))
        }
    }
}

/// Result type for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;
