//! Component roles
//!
//! One trait per operation the engine can ask of a component. A component
//! type exposes the roles it plays through the `as_*` queries on
//! [`Component`](crate::Component).

use crate::component::{Component, ComponentBox};
use crate::error::{ComponentError, ComponentResult};
use crate::partition::PartitionKey;

// ============================================================================
// Sources and sinks
// ============================================================================

/// Turns framed inbound bytes into a record.
///
/// The engine first reads `header_length()` bytes, asks for the payload
/// length, then hands the payload to `decode`.
pub trait Decoder: Send + Sync {
    /// Length of the frame header in bytes
    fn header_length(&self) -> usize {
        4
    }

    /// Payload length announced by a header (big-endian u32 by default)
    fn payload_length(&self, header: &[u8]) -> ComponentResult<usize> {
        let prefix: [u8; 4] = header
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| ComponentError::Decode(format!("header too short: {} bytes", header.len())))?;
        Ok(u32::from_be_bytes(prefix) as usize)
    }

    /// Decode one payload into a record
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox>;
}

/// Turns a record into outbound bytes
pub trait Encoder: Send + Sync {
    /// Encode one record
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>>;
}

/// Encoded record with an optional message key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyedRecord {
    /// Message value
    pub value: Vec<u8>,
    /// Message key, if the sink routes by key
    pub key: Option<Vec<u8>>,
}

/// Turns a record into a value and an optional key
pub trait KeyedEncoder: Send + Sync {
    /// Encode one record
    fn encode_keyed(&self, data: &dyn Component) -> ComponentResult<KeyedRecord>;
}

// ============================================================================
// Stateless computations
// ============================================================================

/// Per-record computation producing at most one output
pub trait Computation: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Compute over one record; `None` filters the record out
    fn compute(&self, data: &dyn Component) -> ComponentResult<Option<ComponentBox>>;
}

/// Per-record computation producing zero or more outputs
pub trait ComputationMulti: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Compute over one record
    fn compute_multi(&self, data: &dyn Component) -> ComponentResult<Vec<ComponentBox>>;
}

/// Factory for computation instances (one per worker)
pub trait ComputationBuilder: Send + Sync {
    /// Build a fresh computation
    fn build(&self) -> ComponentBox;
}

// ============================================================================
// State computations
// ============================================================================

/// Output of a state computation together with the state-changed flag.
///
/// When `state_changed` is true the caller must assume the state object was
/// mutated in place.
#[derive(Debug)]
pub struct StateOutput<T> {
    /// Computation output
    pub output: T,
    /// Whether the state may have been mutated
    pub state_changed: bool,
}

impl<T> StateOutput<T> {
    /// Output after mutating the state
    pub fn changed(output: T) -> Self {
        Self {
            output,
            state_changed: true,
        }
    }

    /// Output without touching the state
    pub fn unchanged(output: T) -> Self {
        Self {
            output,
            state_changed: false,
        }
    }
}

/// Per-record computation over a partitioned state, at most one output
pub trait StateComputation: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Compute over one record, mutating `state` in place
    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>>;
}

/// Per-record computation over a partitioned state, zero or more outputs
pub trait StateComputationMulti: Send + Sync {
    /// Display name
    fn name(&self) -> &str;

    /// Compute over one record, mutating `state` in place
    fn compute_multi(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Vec<ComponentBox>>>;
}

/// Factory for the zero state of a never-before-seen partition key.
///
/// `build` must return a fresh, independent state on every call.
pub trait StateBuilder: Send + Sync {
    /// Display name of the state
    fn name(&self) -> &str;

    /// Build a zero state
    fn build(&self) -> ComponentBox;
}

// ============================================================================
// Partitioning
// ============================================================================

/// Maps a record to the key of the state instance that owns it.
///
/// Must be a pure function of the record's value.
pub trait PartitionFunction: Send + Sync {
    /// Partition key for a record
    fn partition(&self, data: &dyn Component) -> ComponentResult<PartitionKey>;
}
