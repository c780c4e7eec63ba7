//! Rill SDK - Lightweight SDK for writing pipeline components
//!
//! This crate provides the traits an application implements so that an
//! external stream-processing engine can drive its decoders, encoders,
//! computations, state builders and partition functions through integer
//! handles, without depending on the registry itself.
//!
//! # Example
//!
//! ```ignore
//! use rill_sdk::{component, Component, ComponentBox, ComponentResult, Computation};
//!
//! struct Celsius(f32);
//! component!(Celsius);
//!
//! struct ToFahrenheit;
//!
//! impl Computation for ToFahrenheit {
//!     fn name(&self) -> &str {
//!         "to fahrenheit"
//!     }
//!
//!     fn compute(&self, data: &dyn Component) -> ComponentResult<Option<ComponentBox>> {
//!         let c = data.expect::<Celsius>()?;
//!         Ok(Some(Box::new(c.0 * 1.8 + 32.0)))
//!     }
//! }
//! component!(ToFahrenheit: Computation);
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod capability;
pub mod component;
pub mod error;
pub mod partition;

pub use capability::{
    Computation, ComputationBuilder, ComputationMulti, Decoder, Encoder, KeyedEncoder,
    KeyedRecord, PartitionFunction, StateBuilder, StateComputation, StateComputationMulti,
    StateOutput,
};
pub use component::{AsAny, Component, ComponentBox};
pub use error::{ComponentError, ComponentResult};
pub use partition::{PartitionKey, PartitionKeys};
