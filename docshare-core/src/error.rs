//! Error types for the sharing engine.

use std::fmt;

use thiserror::Error;

/// Result type for sharing operations.
pub type SharingResult<T> = Result<T, SharingError>;

/// Errors that can occur while validating or propagating a sharing.
#[derive(Error, Debug)]
pub enum SharingError {
    /// No sharing document carries this identifier.
    #[error("Sharing does not exist: {sharing_id:?}")]
    SharingDoesNotExist {
        /// Identifier that was looked up.
        sharing_id: String,
    },

    /// More than one sharing document carries this identifier.
    #[error("Sharing ID is not unique: {sharing_id:?} matches {count} documents")]
    SharingIdNotUnique {
        /// Identifier that was looked up.
        sharing_id: String,
        /// Number of matching documents.
        count: usize,
    },

    /// The sharing document does not describe a known sharing type.
    #[error("Sharing document is not legitimate: {sharing_id:?} has type {sharing_type:?}")]
    DocumentNotLegitimate {
        /// Identifier of the offending sharing.
        sharing_id: String,
        /// The stored type, or a description of why it could not be read.
        sharing_type: String,
    },

    /// The document store could not be reached.
    #[error("Document store unavailable: {0}")]
    StoreUnavailable(String),

    /// The document store refused an operation that will not succeed on
    /// retry (missing document, id conflict, bad lookup field).
    #[error("Document store rejected the operation: {0}")]
    StoreRejected(String),

    /// A sharing is being created with an identifier another sharing uses.
    #[error("Sharing ID is already taken: {sharing_id:?}")]
    SharingIdTaken {
        /// Identifier requested by the caller.
        sharing_id: String,
    },

    /// An inbound job payload could not be decoded.
    #[error("Malformed sharing message: {0}")]
    MalformedMessage(String),

    /// A sharing is being created with a type outside the enumeration.
    #[error("Bad sharing type: {0:?}")]
    BadSharingType(String),

    /// A sharing is being created without a usable recipient.
    #[error("Recipient does not exist: {0}")]
    RecipientDoesNotExist(String),

    /// Some recipients could not be reached.
    #[error("{0}")]
    Propagation(PropagationFailures),
}

impl SharingError {
    /// Returns true if re-running the whole job may succeed.
    ///
    /// Validation failures are permanent given the current state; store
    /// outages and transient recipient failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SharingError::StoreUnavailable(_) => true,
            SharingError::Propagation(failures) => failures.any_transient(),
            _ => false,
        }
    }
}

/// Failure to deliver a change to one recipient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PropagationError {
    pub message: String,
    /// Whether a later attempt may succeed.
    pub transient: bool,
}

impl PropagationError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: true,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            transient: false,
        }
    }
}

/// Per-recipient failures collected during a best-effort fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationFailures {
    /// `(recipient label, error)` for every recipient that failed.
    pub failures: Vec<(String, PropagationError)>,
    /// Number of recipients attempted in total.
    pub attempted: usize,
}

impl PropagationFailures {
    pub fn push(&mut self, recipient: impl Into<String>, error: PropagationError) {
        self.failures.push((recipient.into(), error));
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn any_transient(&self) -> bool {
        self.failures.iter().any(|(_, e)| e.transient)
    }

    /// Converts into an error if anything failed.
    pub fn into_result(self) -> SharingResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(SharingError::Propagation(self))
        }
    }
}

impl fmt::Display for PropagationFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Propagation failed for {} of {} recipient(s)",
            self.failures.len(),
            self.attempted
        )?;
        for (i, (recipient, error)) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{}: {}", sep, recipient, error)?;
        }
        Ok(())
    }
}
