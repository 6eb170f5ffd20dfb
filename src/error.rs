//! Error types for weaving and intercepted calls.
//!
//! Two families of error live here:
//!
//! - [`Fault`] is raised *by* an intercepted call (the wrapped member, or one
//!   of the hooks around it). It is the value error handlers receive and may
//!   convert into a replacement result.
//! - [`WeaveError`] is raised while *configuring* interception: resolving
//!   member references, weaving and unweaving classes. These fail loudly and
//!   are never routed through error-handling advice.

/// Result type for weave configuration operations.
pub type Result<T> = std::result::Result<T, WeaveError>;

/// A failure raised during an intercepted call.
///
/// `kind` plays the role of the exception type: error handlers and callers
/// match on it to decide how to react, and a re-raised fault keeps it
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    kind: String,
    message: String,
}

impl Fault {
    /// Create a fault of the given kind.
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Fault raised when an attribute does not exist on a class.
    pub fn attribute_error(class: &str, name: &str) -> Self {
        Self::new(
            kinds::ATTRIBUTE_ERROR,
            format!("'{}' has no attribute '{}'", class, name),
        )
    }

    /// Fault raised when a non-callable attribute is invoked.
    pub fn type_error(class: &str, name: &str) -> Self {
        Self::new(
            kinds::TYPE_ERROR,
            format!("'{}.{}' is not callable", class, name),
        )
    }

    /// Fault raised by validation advice.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(kinds::VALIDATION_ERROR, message)
    }

    /// The fault kind (exception type name).
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Human-readable description.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns true if this fault is of the given kind.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Well-known fault kinds raised by the crate itself.
pub mod kinds {
    /// Attribute lookup failed.
    pub const ATTRIBUTE_ERROR: &str = "AttributeError";
    /// A non-callable attribute was called.
    pub const TYPE_ERROR: &str = "TypeError";
    /// Arguments rejected by validation advice.
    pub const VALIDATION_ERROR: &str = "ValidationError";
    /// Failure injected by lossy advice.
    pub const INJECTED_FAULT: &str = "InjectedFault";
}

/// Errors raised while configuring interception.
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    /// The class owning a member reference can no longer be determined.
    #[error("cannot determine owning class of member '{member}'")]
    UnresolvedOwner { member: String },

    /// The class has no attribute with this name.
    #[error("class '{class}' has no member '{member}'")]
    UnknownMember { class: String, member: String },

    /// The attribute exists but cannot be intercepted as a call.
    #[error("'{class}.{member}' is not callable")]
    NotCallable { class: String, member: String },

    /// A lock guarding dispatch state was poisoned by a panicking thread.
    #[error("weave state poisoned: {0}")]
    Poisoned(String),
}

impl WeaveError {
    /// Returns true for errors caused by how advice was composed, as opposed
    /// to runtime state corruption.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, WeaveError::Poisoned(_))
    }
}

impl<T> From<std::sync::PoisonError<T>> for WeaveError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        WeaveError::Poisoned(err.to_string())
    }
}
