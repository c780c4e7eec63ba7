//! Registry and bridge errors

use rill_sdk::ComponentError;
use thiserror::Error;

use crate::category::{Category, Handle};
use crate::dispatch::Capability;

/// Result type for registry operations
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Why a serialized buffer was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// Fewer than four bytes, so no length prefix
    #[error("buffer of {0} bytes has no length prefix")]
    MissingPrefix(usize),

    /// Declared length runs past the end of the buffer
    #[error("declared {declared} payload bytes but only {available} present")]
    Truncated {
        /// Length from the prefix
        declared: usize,
        /// Bytes actually following the prefix
        available: usize,
    },

    /// Payload too short to hold the type discriminant
    #[error("payload of {0} bytes has no type discriminant")]
    MissingTag(usize),

    /// Declared length exceeds the configured frame limit
    #[error("declared length {declared} exceeds limit {max}")]
    FrameTooLarge {
        /// Length from the prefix
        declared: usize,
        /// Configured maximum
        max: usize,
    },

    /// No codec is registered for the discriminant in this category
    #[error("unknown discriminant {tag} for {category}")]
    UnknownTag {
        /// Category the buffer was deserialized into
        category: Category,
        /// Discriminant read from the payload
        tag: u32,
    },
}

/// Registry, dispatch and serialization errors.
///
/// Only [`BridgeError::NotFound`] is recoverable; everything else signals a
/// wiring or contract violation and must abort the current call.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No object under this handle in this category
    #[error("no {category} registered under handle {handle}")]
    NotFound {
        /// Category searched
        category: Category,
        /// Handle presented
        handle: u64,
    },

    /// Object exists but does not play the requested role
    #[error("{category} {handle} ({type_name}) cannot {capability}")]
    CapabilityMismatch {
        /// Category searched
        category: Category,
        /// Handle presented
        handle: Handle,
        /// Role requested
        capability: Capability,
        /// Concrete type found
        type_name: &'static str,
    },

    /// No codec recognizes the object's concrete type
    #[error("no codec for {type_name} in {category}")]
    SerializationGap {
        /// Category of the object
        category: Category,
        /// Concrete type found
        type_name: &'static str,
    },

    /// Serialized buffer rejected
    #[error("malformed buffer: {0}")]
    MalformedBuffer(#[from] MalformedReason),

    /// Serialized output exceeds the configured frame limit
    #[error("serialized {len} bytes exceeds frame limit {max}")]
    FrameTooLarge {
        /// Framed length produced
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// Copy requested without a staged buffer (never staged, or already copied)
    #[error("nothing staged for {category} {handle}")]
    NotStaged {
        /// Category
        category: Category,
        /// Handle
        handle: Handle,
    },

    /// Destination size differs from the staged size
    #[error("destination holds {actual} bytes, staged buffer is {expected}")]
    DestinationSize {
        /// Staged length
        expected: usize,
        /// Destination length
        actual: usize,
    },

    /// Raw category discriminant out of range
    #[error("invalid category {0}")]
    InvalidCategory(u64),

    /// Index past the end of a result or key list
    #[error("index {index} out of range for list of {len}")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// List length
        len: usize,
    },

    /// Typed inspection found a different concrete type
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Requested type
        expected: &'static str,
        /// Concrete type found
        got: &'static str,
    },

    /// A registered codec failed on its own payload
    #[error("codec {tag} for {category} failed: {message}")]
    Codec {
        /// Category
        category: Category,
        /// Discriminant
        tag: u32,
        /// Codec message
        message: String,
    },

    /// Application component failed
    #[error(transparent)]
    Component(#[from] ComponentError),
}

impl BridgeError {
    /// Whether the error is a contract violation rather than a missing handle
    pub fn is_fatal(&self) -> bool {
        !matches!(self, BridgeError::NotFound { .. })
    }

    /// Stable code for the C boundary
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::NotFound { .. } => 1,
            BridgeError::CapabilityMismatch { .. } => 2,
            BridgeError::SerializationGap { .. } => 3,
            BridgeError::MalformedBuffer(_) => 4,
            BridgeError::FrameTooLarge { .. } => 5,
            BridgeError::NotStaged { .. } => 6,
            BridgeError::DestinationSize { .. } => 7,
            BridgeError::InvalidCategory(_) => 8,
            BridgeError::IndexOutOfRange { .. } => 9,
            BridgeError::TypeMismatch { .. } => 10,
            BridgeError::Codec { .. } => 11,
            BridgeError::Component(_) => 12,
        }
    }

    pub(crate) fn not_found(category: Category, handle: Handle) -> Self {
        BridgeError::NotFound {
            category,
            handle: handle.get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_not_found_is_recoverable() {
        let missing = BridgeError::NotFound {
            category: Category::State,
            handle: 3,
        };
        assert!(!missing.is_fatal());
        assert!(BridgeError::InvalidCategory(42).is_fatal());
        assert!(BridgeError::from(MalformedReason::MissingPrefix(2)).is_fatal());
    }

    #[test]
    fn test_messages_name_the_category() {
        let err = BridgeError::NotFound {
            category: Category::StateBuilder,
            handle: 9,
        };
        assert_eq!(err.to_string(), "no state-builder registered under handle 9");
    }
}
