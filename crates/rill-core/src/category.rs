//! Handle categories and handles

use std::fmt;
use std::num::NonZeroU64;

use crate::error::BridgeError;

/// Closed set of roles partitioning the handle space.
///
/// A handle is only meaningful together with its category: two categories
/// may hand out the same integer for unrelated objects.
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    /// Records flowing through a pipeline, and result lists
    Data = 0,
    /// Built computations
    Computation = 1,
    /// Computation builders
    ComputationBuilder = 2,
    /// State computations
    StateComputation = 3,
    /// Partition functions
    PartitionFunction = 4,
    /// Declared partition key lists
    PartitionKeyList = 5,
    /// Encoders
    Encoder = 6,
    /// Decoders
    Decoder = 7,
    /// Partitioned state instances
    State = 8,
    /// State builders
    StateBuilder = 9,
}

impl Category {
    /// Number of categories
    pub const COUNT: usize = 10;

    /// All categories in discriminant order
    pub const ALL: [Category; Category::COUNT] = [
        Category::Data,
        Category::Computation,
        Category::ComputationBuilder,
        Category::StateComputation,
        Category::PartitionFunction,
        Category::PartitionKeyList,
        Category::Encoder,
        Category::Decoder,
        Category::State,
        Category::StateBuilder,
    ];

    /// Index into per-category tables
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Wire discriminant
    #[inline]
    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// Lowercase name for diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Data => "data",
            Category::Computation => "computation",
            Category::ComputationBuilder => "computation-builder",
            Category::StateComputation => "state-computation",
            Category::PartitionFunction => "partition-function",
            Category::PartitionKeyList => "partition-key-list",
            Category::Encoder => "encoder",
            Category::Decoder => "decoder",
            Category::State => "state",
            Category::StateBuilder => "state-builder",
        }
    }
}

impl TryFrom<u64> for Category {
    type Error = BridgeError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        usize::try_from(raw)
            .ok()
            .and_then(|i| Category::ALL.get(i).copied())
            .ok_or(BridgeError::InvalidCategory(raw))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a registered component, unique within its category.
///
/// Zero is never a valid handle; across the C boundary it means "no result".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(NonZeroU64);

impl Handle {
    /// Wrap a raw value; `None` for zero
    #[inline]
    pub fn new(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Handle)
    }

    /// Raw integer value
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// Raw value of an optional handle, zero for `None`
    #[inline]
    pub fn into_raw(handle: Option<Handle>) -> u64 {
        handle.map_or(0, Handle::get)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
