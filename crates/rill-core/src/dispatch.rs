//! Capability dispatch
//!
//! Typed entry points over integer handles. Each call resolves its target
//! under the category that role lives in, asks the component for the role,
//! runs it against the resolved arguments and registers whatever it produces
//! as a new handle.
//!
//! | operation                  | target category     | output category |
//! |----------------------------|---------------------|-----------------|
//! | `decode`                   | `Decoder`           | `Data`          |
//! | `encode`, `encode_keyed`   | `Encoder`           | bytes           |
//! | `compute`, `compute_multi` | `Computation`       | `Data`          |
//! | `build_computation`        | `ComputationBuilder`| `Computation`   |
//! | `compute_with_state*`      | `StateComputation`  | `Data`          |
//! | `build_state`              | `StateBuilder`      | `State`         |
//! | `partition`                | `PartitionFunction` | key             |
//! | `partition_key*`           | `PartitionKeyList`  | key             |
//!
//! Multi-output calls register every output under `Data` and then a
//! [`ResultList`] (also under `Data`) holding their handles in order.

use std::fmt;

use rill_sdk::{Component, ComponentBox, KeyedRecord, PartitionKey, PartitionKeys};
use tracing::debug;

use crate::category::{Category, Handle};
use crate::error::{BridgeError, BridgeResult};
use crate::registry::ComponentRegistry;

/// Role requested from a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Decoder role
    Decode,
    /// Encoder role
    Encode,
    /// Keyed encoder role
    EncodeKeyed,
    /// Computation role
    Compute,
    /// Multi-output computation role
    ComputeMulti,
    /// State computation role
    ComputeWithState,
    /// Multi-output state computation role
    ComputeWithStateMulti,
    /// Computation builder role
    BuildComputation,
    /// State builder role
    BuildState,
    /// Partition function role
    Partition,
    /// Declared key list
    PartitionKeys,
    /// Named component (computations and state builders)
    Name,
    /// Result list produced by a multi-output call
    ResultList,
}

impl Capability {
    /// Verb used in diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Decode => "decode",
            Capability::Encode => "encode",
            Capability::EncodeKeyed => "encode with key",
            Capability::Compute => "compute",
            Capability::ComputeMulti => "compute multiple outputs",
            Capability::ComputeWithState => "compute with state",
            Capability::ComputeWithStateMulti => "compute multiple outputs with state",
            Capability::BuildComputation => "build a computation",
            Capability::BuildState => "build a state",
            Capability::Partition => "partition",
            Capability::PartitionKeys => "list partition keys",
            Capability::Name => "report a name",
            Capability::ResultList => "list results",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered handles of the outputs of one multi-output call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultList(Vec<Handle>);

impl ResultList {
    /// Output handles in production order
    pub fn handles(&self) -> &[Handle] {
        &self.0
    }

    /// Number of outputs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no outputs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Component for ResultList {}

/// Outcome of a multi-output computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiResult {
    /// Result list handle; `None` when nothing was produced
    pub list: Option<Handle>,
    /// Number of outputs
    pub count: usize,
}

/// Outcome of a state computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateResult {
    /// Output handle; `None` when the record was absorbed
    pub output: Option<Handle>,
    /// Whether the state may have been mutated
    pub state_changed: bool,
}

/// Outcome of a multi-output state computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMultiResult {
    /// Result list handle; `None` when nothing was produced
    pub list: Option<Handle>,
    /// Number of outputs
    pub count: usize,
    /// Whether the state may have been mutated
    pub state_changed: bool,
}

/// Ask a component for a role, turning `None` into `CapabilityMismatch`
fn role<'a, R: ?Sized + 'a>(
    component: &'a dyn Component,
    category: Category,
    handle: Handle,
    capability: Capability,
    query: impl FnOnce(&'a dyn Component) -> Option<&'a R>,
) -> BridgeResult<&'a R> {
    query(component).ok_or_else(|| BridgeError::CapabilityMismatch {
        category,
        handle,
        capability,
        type_name: component.type_name(),
    })
}

impl ComponentRegistry {
    // ========================================================================
    // Sources and sinks
    // ========================================================================

    /// Decode a payload into a new `Data` handle
    pub fn decode(&self, decoder: Handle, payload: &[u8]) -> BridgeResult<Handle> {
        let shared = self.resolve(Category::Decoder, decoder)?;
        let guard = shared.read();
        let dec = role(&**guard, Category::Decoder, decoder, Capability::Decode, |c| {
            c.as_decoder()
        })?;
        let record = dec.decode(payload)?;
        Ok(self.register_boxed(Category::Data, record))
    }

    /// Header length a decoder expects
    pub fn decoder_header_length(&self, decoder: Handle) -> BridgeResult<usize> {
        let shared = self.resolve(Category::Decoder, decoder)?;
        let guard = shared.read();
        let dec = role(&**guard, Category::Decoder, decoder, Capability::Decode, |c| {
            c.as_decoder()
        })?;
        Ok(dec.header_length())
    }

    /// Payload length announced by a header
    pub fn decoder_payload_length(&self, decoder: Handle, header: &[u8]) -> BridgeResult<usize> {
        let shared = self.resolve(Category::Decoder, decoder)?;
        let guard = shared.read();
        let dec = role(&**guard, Category::Decoder, decoder, Capability::Decode, |c| {
            c.as_decoder()
        })?;
        Ok(dec.payload_length(header)?)
    }

    /// Encode a `Data` record
    pub fn encode(&self, encoder: Handle, data: Handle) -> BridgeResult<Vec<u8>> {
        let shared = self.resolve(Category::Encoder, encoder)?;
        let record = self.resolve(Category::Data, data)?;
        let guard = shared.read();
        let enc = role(&**guard, Category::Encoder, encoder, Capability::Encode, |c| {
            c.as_encoder()
        })?;
        let record = record.read();
        Ok(enc.encode(&**record)?)
    }

    /// Encode a `Data` record into a value and an optional key
    pub fn encode_keyed(&self, encoder: Handle, data: Handle) -> BridgeResult<KeyedRecord> {
        let shared = self.resolve(Category::Encoder, encoder)?;
        let record = self.resolve(Category::Data, data)?;
        let guard = shared.read();
        let enc = role(
            &**guard,
            Category::Encoder,
            encoder,
            Capability::EncodeKeyed,
            |c| c.as_keyed_encoder(),
        )?;
        let record = record.read();
        Ok(enc.encode_keyed(&**record)?)
    }

    // ========================================================================
    // Stateless computations
    // ========================================================================

    /// Run a computation over a `Data` record.
    ///
    /// Returns `None` when the computation filtered the record out.
    pub fn compute(&self, computation: Handle, data: Handle) -> BridgeResult<Option<Handle>> {
        let shared = self.resolve(Category::Computation, computation)?;
        let record = self.resolve(Category::Data, data)?;
        let guard = shared.read();
        let comp = role(
            &**guard,
            Category::Computation,
            computation,
            Capability::Compute,
            |c| c.as_computation(),
        )?;
        let output = comp.compute(&**record.read())?;
        Ok(output.map(|out| self.register_boxed(Category::Data, out)))
    }

    /// Run a multi-output computation over a `Data` record
    pub fn compute_multi(&self, computation: Handle, data: Handle) -> BridgeResult<MultiResult> {
        let shared = self.resolve(Category::Computation, computation)?;
        let record = self.resolve(Category::Data, data)?;
        let guard = shared.read();
        let comp = role(
            &**guard,
            Category::Computation,
            computation,
            Capability::ComputeMulti,
            |c| c.as_computation_multi(),
        )?;
        let outputs = comp.compute_multi(&**record.read())?;
        Ok(self.register_results(outputs))
    }

    /// Build a fresh computation under `Computation`
    pub fn build_computation(&self, builder: Handle) -> BridgeResult<Handle> {
        let shared = self.resolve(Category::ComputationBuilder, builder)?;
        let guard = shared.read();
        let b = role(
            &**guard,
            Category::ComputationBuilder,
            builder,
            Capability::BuildComputation,
            |c| c.as_computation_builder(),
        )?;
        let built = b.build();
        let handle = self.register_boxed(Category::Computation, built);
        debug!(%builder, %handle, "built computation");
        Ok(handle)
    }

    // ========================================================================
    // State computations
    // ========================================================================

    /// Run a state computation over a `Data` record and a `State` object.
    ///
    /// The state is write-locked for the duration of the call.
    pub fn compute_with_state(
        &self,
        computation: Handle,
        data: Handle,
        state: Handle,
    ) -> BridgeResult<StateResult> {
        let shared = self.resolve(Category::StateComputation, computation)?;
        let record = self.resolve(Category::Data, data)?;
        let state_obj = self.resolve(Category::State, state)?;
        let guard = shared.read();
        let comp = role(
            &**guard,
            Category::StateComputation,
            computation,
            Capability::ComputeWithState,
            |c| c.as_state_computation(),
        )?;
        let record = record.read();
        let mut state_guard = state_obj.write();
        let result = comp.compute(&**record, &mut **state_guard)?;
        Ok(StateResult {
            output: result
                .output
                .map(|out| self.register_boxed(Category::Data, out)),
            state_changed: result.state_changed,
        })
    }

    /// Run a multi-output state computation
    pub fn compute_with_state_multi(
        &self,
        computation: Handle,
        data: Handle,
        state: Handle,
    ) -> BridgeResult<StateMultiResult> {
        let shared = self.resolve(Category::StateComputation, computation)?;
        let record = self.resolve(Category::Data, data)?;
        let state_obj = self.resolve(Category::State, state)?;
        let guard = shared.read();
        let comp = role(
            &**guard,
            Category::StateComputation,
            computation,
            Capability::ComputeWithStateMulti,
            |c| c.as_state_computation_multi(),
        )?;
        let record = record.read();
        let mut state_guard = state_obj.write();
        let result = comp.compute_multi(&**record, &mut **state_guard)?;
        drop(state_guard);
        let MultiResult { list, count } = self.register_results(result.output);
        Ok(StateMultiResult {
            list,
            count,
            state_changed: result.state_changed,
        })
    }

    /// Build a zero state under `State`
    pub fn build_state(&self, builder: Handle) -> BridgeResult<Handle> {
        let shared = self.resolve(Category::StateBuilder, builder)?;
        let guard = shared.read();
        let b = role(
            &**guard,
            Category::StateBuilder,
            builder,
            Capability::BuildState,
            |c| c.as_state_builder(),
        )?;
        let built = b.build();
        let handle = self.register_boxed(Category::State, built);
        debug!(%builder, %handle, state = b.name(), "built state");
        Ok(handle)
    }

    // ========================================================================
    // Result lists
    // ========================================================================

    fn register_results(&self, outputs: Vec<ComponentBox>) -> MultiResult {
        if outputs.is_empty() {
            return MultiResult {
                list: None,
                count: 0,
            };
        }
        let handles: Vec<Handle> = outputs
            .into_iter()
            .map(|out| self.register_boxed(Category::Data, out))
            .collect();
        let count = handles.len();
        let list = self.register(Category::Data, ResultList(handles));
        MultiResult {
            list: Some(list),
            count,
        }
    }

    fn with_result_list<R>(&self, list: Handle, f: impl FnOnce(&ResultList) -> R) -> BridgeResult<R> {
        let shared = self.resolve(Category::Data, list)?;
        let guard = shared.read();
        let results = role(
            &**guard,
            Category::Data,
            list,
            Capability::ResultList,
            |c| c.downcast_ref::<ResultList>(),
        )?;
        Ok(f(results))
    }

    /// Number of outputs in a result list
    pub fn result_count(&self, list: Handle) -> BridgeResult<usize> {
        self.with_result_list(list, ResultList::len)
    }

    /// Output handle at `index` in a result list
    pub fn result_item(&self, list: Handle, index: usize) -> BridgeResult<Handle> {
        self.with_result_list(list, |results| {
            results
                .handles()
                .get(index)
                .copied()
                .ok_or(BridgeError::IndexOutOfRange {
                    index,
                    len: results.len(),
                })
        })?
    }

    // ========================================================================
    // Partitioning
    // ========================================================================

    /// Partition key for a `Data` record
    pub fn partition(&self, function: Handle, data: Handle) -> BridgeResult<PartitionKey> {
        let shared = self.resolve(Category::PartitionFunction, function)?;
        let record = self.resolve(Category::Data, data)?;
        let guard = shared.read();
        let f = role(
            &**guard,
            Category::PartitionFunction,
            function,
            Capability::Partition,
            |c| c.as_partition_function(),
        )?;
        let key = f.partition(&**record.read())?;
        Ok(key)
    }

    fn with_key_list<R>(&self, list: Handle, f: impl FnOnce(&PartitionKeys) -> R) -> BridgeResult<R> {
        let shared = self.resolve(Category::PartitionKeyList, list)?;
        let guard = shared.read();
        let keys = role(
            &**guard,
            Category::PartitionKeyList,
            list,
            Capability::PartitionKeys,
            |c| c.as_partition_keys(),
        )?;
        Ok(f(keys))
    }

    /// Number of keys in a declared key list
    pub fn partition_keys_len(&self, list: Handle) -> BridgeResult<usize> {
        self.with_key_list(list, PartitionKeys::len)
    }

    /// Key at `index` in a declared key list
    pub fn partition_key(&self, list: Handle, index: usize) -> BridgeResult<PartitionKey> {
        self.with_key_list(list, |keys| {
            keys.get(index).ok_or(BridgeError::IndexOutOfRange {
                index,
                len: keys.len(),
            })
        })?
    }

    // ========================================================================
    // Names
    // ========================================================================

    /// Display name of a computation, state computation or state builder.
    ///
    /// Unlike the other entry points this one takes the category, since
    /// several categories carry names.
    pub fn name(&self, category: Category, handle: Handle) -> BridgeResult<String> {
        let shared = self.resolve(category, handle)?;
        let guard = shared.read();
        let component: &dyn Component = &**guard;
        let name = match category {
            Category::Computation => component
                .as_computation()
                .map(|c| c.name())
                .or_else(|| component.as_computation_multi().map(|c| c.name())),
            Category::StateComputation => component
                .as_state_computation()
                .map(|c| c.name())
                .or_else(|| component.as_state_computation_multi().map(|c| c.name())),
            Category::StateBuilder => component.as_state_builder().map(|b| b.name()),
            _ => None,
        };
        name.map(str::to_owned)
            .ok_or_else(|| BridgeError::CapabilityMismatch {
                category,
                handle,
                capability: Capability::Name,
                type_name: component.type_name(),
            })
    }
}
