//! Example Rill applications
//!
//! Each module registers its components with a
//! [`ComponentRegistry`](rill_core::ComponentRegistry) through
//! `components()` and describes how to relocate them through `codecs()`.
//! Tags are unique across the applications so their codecs can share one
//! registry ([`all_codecs`]).

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod alphabet;
pub mod celsius;
pub mod market_spread;
pub mod word_count;

use rill_core::{Category, CodecRegistry, CodecRegistryBuilder};
use rill_sdk::PartitionKeys;
use serde::{Deserialize, Serialize};

/// Tag of the shared partition key list codec
pub const KEY_LIST_TAG: u32 = 1;

/// Serialized form of a declared key list
#[derive(Serialize, Deserialize)]
enum KeyListRepr {
    U64(Vec<u64>),
    Str(Vec<String>),
    Bytes(Vec<Vec<u8>>),
}

/// Register the key list codec shared by every application
pub fn register_key_lists(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder.register::<PartitionKeys, serde_json::Error, _, _>(
        Category::PartitionKeyList,
        KEY_LIST_TAG,
        |keys: &PartitionKeys| {
            let repr = match keys {
                PartitionKeys::U64(v) => KeyListRepr::U64(v.clone()),
                PartitionKeys::Str(v) => KeyListRepr::Str(v.clone()),
                PartitionKeys::Bytes(v) => KeyListRepr::Bytes(v.clone()),
            };
            serde_json::to_vec(&repr)
        },
        |payload: &[u8]| {
            Ok(match serde_json::from_slice(payload)? {
                KeyListRepr::U64(v) => PartitionKeys::U64(v),
                KeyListRepr::Str(v) => PartitionKeys::Str(v),
                KeyListRepr::Bytes(v) => PartitionKeys::Bytes(v),
            })
        },
    )
}

/// Codecs for every application
pub fn all_codecs() -> CodecRegistry {
    let builder = register_key_lists(CodecRegistry::builder());
    let builder = alphabet::register_codecs(builder);
    let builder = celsius::register_codecs(builder);
    let builder = market_spread::register_codecs(builder);
    word_count::register_codecs(builder).build()
}
