//! Rill Core - component registry and serialization bridge
//!
//! An external engine drives application components through integer
//! handles. This crate owns the pieces that make that work:
//!
//! - [`HandleTable`]: sharded concurrent map from handle to object
//! - [`ComponentRegistry`]: one table per [`Category`], plus capability
//!   dispatch (decode, compute, partition, ...) over the registered objects
//! - the serialization bridge: [`CodecRegistry`] for caller-supplied codecs,
//!   [`frame`] for the wire layout, and the two-phase size/copy protocol
//!
//! # Example
//!
//! ```ignore
//! use rill_core::{Category, ComponentRegistry};
//!
//! let registry = ComponentRegistry::new();
//! let builder = registry.register(Category::StateBuilder, CounterBuilder);
//! let state = registry.build_state(builder)?;
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bridge;
pub mod category;
pub mod codec;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod handle_table;
pub mod options;
pub mod registry;

pub use category::{Category, Handle};
pub use codec::{CodecRegistry, CodecRegistryBuilder};
pub use dispatch::{Capability, MultiResult, ResultList, StateMultiResult, StateResult};
pub use error::{BridgeError, BridgeResult, MalformedReason};
pub use handle_table::HandleTable;
pub use options::{OptionsError, RegistryOptions};
pub use registry::{ComponentRegistry, ComponentRegistryBuilder, SharedComponent};

/// Re-exported so applications only need one dependency
pub use rill_sdk;
