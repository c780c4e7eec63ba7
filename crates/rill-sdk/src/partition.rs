//! Partition keys and declared key lists

use crate::component::Component;

/// Key routing a record to one logical state instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKey {
    /// Integer key (e.g. a letter code)
    U64(u64),
    /// String key (e.g. a ticker symbol)
    Str(String),
    /// Arbitrary byte-string key
    Bytes(Vec<u8>),
}

impl PartitionKey {
    /// Integer value, if this is an integer key
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PartitionKey::U64(v) => Some(*v),
            _ => None,
        }
    }

    /// Byte form of a string or byte-string key
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            PartitionKey::U64(_) => None,
            PartitionKey::Str(s) => Some(s.as_bytes()),
            PartitionKey::Bytes(b) => Some(b),
        }
    }

    /// Owned bytes for crossing the boundary; integers use big-endian
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PartitionKey::U64(v) => v.to_be_bytes().to_vec(),
            PartitionKey::Str(s) => s.as_bytes().to_vec(),
            PartitionKey::Bytes(b) => b.clone(),
        }
    }
}

impl From<u64> for PartitionKey {
    fn from(v: u64) -> Self {
        PartitionKey::U64(v)
    }
}

impl From<String> for PartitionKey {
    fn from(s: String) -> Self {
        PartitionKey::Str(s)
    }
}

impl From<&str> for PartitionKey {
    fn from(s: &str) -> Self {
        PartitionKey::Str(s.to_string())
    }
}

impl From<Vec<u8>> for PartitionKey {
    fn from(b: Vec<u8>) -> Self {
        PartitionKey::Bytes(b)
    }
}

impl Component for PartitionKey {}

/// Key space declared up front for partition schemes with fixed cardinality.
///
/// Optional metadata: pipelines with open-ended keys simply never register
/// one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionKeys {
    /// Integer keys
    U64(Vec<u64>),
    /// String keys
    Str(Vec<String>),
    /// Byte-string keys
    Bytes(Vec<Vec<u8>>),
}

impl PartitionKeys {
    /// Number of declared keys
    pub fn len(&self) -> usize {
        match self {
            PartitionKeys::U64(v) => v.len(),
            PartitionKeys::Str(v) => v.len(),
            PartitionKeys::Bytes(v) => v.len(),
        }
    }

    /// Check if no keys are declared
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Key at `index`
    pub fn get(&self, index: usize) -> Option<PartitionKey> {
        match self {
            PartitionKeys::U64(v) => v.get(index).copied().map(PartitionKey::U64),
            PartitionKeys::Str(v) => v.get(index).cloned().map(PartitionKey::Str),
            PartitionKeys::Bytes(v) => v.get(index).cloned().map(PartitionKey::Bytes),
        }
    }

    /// Check whether `key` is declared
    pub fn contains(&self, key: &PartitionKey) -> bool {
        match (self, key) {
            (PartitionKeys::U64(v), PartitionKey::U64(k)) => v.contains(k),
            (PartitionKeys::Str(v), PartitionKey::Str(k)) => v.contains(k),
            (PartitionKeys::Bytes(v), PartitionKey::Bytes(k)) => v.contains(k),
            _ => false,
        }
    }

    /// Iterate over the declared keys
    pub fn iter(&self) -> impl Iterator<Item = PartitionKey> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }
}

impl Component for PartitionKeys {
    fn as_partition_keys(&self) -> Option<&PartitionKeys> {
        Some(self)
    }
}
