//! Type-erased components
//!
//! Every object the engine can hold a handle to implements [`Component`].
//! The trait carries one capability query per role; the default for each is
//! `None`, so a plain record type only needs an empty impl while a decoder
//! overrides `as_decoder`. The [`component!`](crate::component) macro writes
//! these impls.

use std::any::Any;

use crate::capability::{
    Computation, ComputationBuilder, ComputationMulti, Decoder, Encoder, KeyedEncoder,
    PartitionFunction, StateBuilder, StateComputation, StateComputationMulti,
};
use crate::error::{ComponentError, ComponentResult};
use crate::partition::PartitionKeys;

/// Owned, type-erased component
pub type ComponentBox = Box<dyn Component>;

/// Access to the concrete type behind a `dyn Component`.
///
/// Implemented for every `'static` type; call it through `&dyn Component`,
/// never through `Box<dyn Component>` directly.
pub trait AsAny: Any {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the concrete type (diagnostics only)
    fn type_name(&self) -> &'static str;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

/// An object that can be registered with the engine.
///
/// Override the `as_*` query for each role the type plays. The registry
/// never inspects a component except through these queries.
pub trait Component: AsAny + Send + Sync + 'static {
    /// Decoder role
    fn as_decoder(&self) -> Option<&dyn Decoder> {
        None
    }

    /// Encoder role
    fn as_encoder(&self) -> Option<&dyn Encoder> {
        None
    }

    /// Keyed encoder role (value plus optional message key)
    fn as_keyed_encoder(&self) -> Option<&dyn KeyedEncoder> {
        None
    }

    /// Single-output computation role
    fn as_computation(&self) -> Option<&dyn Computation> {
        None
    }

    /// Multi-output computation role
    fn as_computation_multi(&self) -> Option<&dyn ComputationMulti> {
        None
    }

    /// Computation builder role
    fn as_computation_builder(&self) -> Option<&dyn ComputationBuilder> {
        None
    }

    /// Single-output state computation role
    fn as_state_computation(&self) -> Option<&dyn StateComputation> {
        None
    }

    /// Multi-output state computation role
    fn as_state_computation_multi(&self) -> Option<&dyn StateComputationMulti> {
        None
    }

    /// State builder role
    fn as_state_builder(&self) -> Option<&dyn StateBuilder> {
        None
    }

    /// Partition function role
    fn as_partition_function(&self) -> Option<&dyn PartitionFunction> {
        None
    }

    /// Declared partition key list role
    fn as_partition_keys(&self) -> Option<&PartitionKeys> {
        None
    }
}

impl dyn Component {
    /// Check whether the concrete type is `T`
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Downcast to `&T`
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcast to `&mut T`
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Downcast to `&T`, reporting a mismatch as a component error.
    ///
    /// This is what computations use to recover their input record.
    pub fn expect<T: Component>(&self) -> ComponentResult<&T> {
        let got = self.type_name();
        self.downcast_ref::<T>()
            .ok_or(ComponentError::UnexpectedInput {
                expected: std::any::type_name::<T>(),
                got,
            })
    }

    /// Downcast to `&mut T`, reporting a mismatch as a component error
    pub fn expect_mut<T: Component>(&mut self) -> ComponentResult<&mut T> {
        // Through the vtable, not the blanket impl on `&mut dyn Component`
        let got = (*self).type_name();
        self.downcast_mut::<T>()
            .ok_or(ComponentError::UnexpectedInput {
                expected: std::any::type_name::<T>(),
                got,
            })
    }
}

impl std::fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Component({})", self.type_name())
    }
}

// ============================================================================
// Primitive records
// ============================================================================

macro_rules! plain_records {
    ($($ty:ty),* $(,)?) => {
        $( impl Component for $ty {} )*
    };
}

plain_records!(bool, u8, u32, u64, i32, i64, f32, f64, String, Vec<u8>);

// ============================================================================
// component! macro
// ============================================================================

/// Implement [`Component`] for a type, wiring the listed roles.
///
/// ```ignore
/// struct Votes { letter: u8, count: u64 }
/// rill_sdk::component!(Votes);
///
/// struct VoteDecoder;
/// impl Decoder for VoteDecoder { /* ... */ }
/// rill_sdk::component!(VoteDecoder: Decoder);
/// ```
///
/// Accepted roles: `Decoder`, `Encoder`, `KeyedEncoder`, `Computation`,
/// `ComputationMulti`, `ComputationBuilder`, `StateComputation`,
/// `StateComputationMulti`, `StateBuilder`, `PartitionFunction`.
#[macro_export]
macro_rules! component {
    ($ty:ty) => {
        impl $crate::Component for $ty {}
    };
    ($ty:ty : $($role:ident),+ $(,)?) => {
        impl $crate::Component for $ty {
            $( $crate::__component_role!($role); )+
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __component_role {
    (Decoder) => {
        fn as_decoder(&self) -> Option<&dyn $crate::Decoder> {
            Some(self)
        }
    };
    (Encoder) => {
        fn as_encoder(&self) -> Option<&dyn $crate::Encoder> {
            Some(self)
        }
    };
    (KeyedEncoder) => {
        fn as_keyed_encoder(&self) -> Option<&dyn $crate::KeyedEncoder> {
            Some(self)
        }
    };
    (Computation) => {
        fn as_computation(&self) -> Option<&dyn $crate::Computation> {
            Some(self)
        }
    };
    (ComputationMulti) => {
        fn as_computation_multi(&self) -> Option<&dyn $crate::ComputationMulti> {
            Some(self)
        }
    };
    (ComputationBuilder) => {
        fn as_computation_builder(&self) -> Option<&dyn $crate::ComputationBuilder> {
            Some(self)
        }
    };
    (StateComputation) => {
        fn as_state_computation(&self) -> Option<&dyn $crate::StateComputation> {
            Some(self)
        }
    };
    (StateComputationMulti) => {
        fn as_state_computation_multi(&self) -> Option<&dyn $crate::StateComputationMulti> {
            Some(self)
        }
    };
    (StateBuilder) => {
        fn as_state_builder(&self) -> Option<&dyn $crate::StateBuilder> {
            Some(self)
        }
    };
    (PartitionFunction) => {
        fn as_partition_function(&self) -> Option<&dyn $crate::PartitionFunction> {
            Some(self)
        }
    };
}
