//! Caller-registered serialize/deserialize pairs
//!
//! The registry does not know how to serialize anything on its own. The
//! application registers one codec per (category, concrete type) with a
//! discriminant tag; serialization looks codecs up by type, deserialization
//! by tag. A registry without codecs treats every object as unserializable.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use rill_sdk::{Component, ComponentBox};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::category::Category;
use crate::error::{BridgeError, BridgeResult, MalformedReason};

type SerializeFn = dyn Fn(&dyn Component) -> Result<Vec<u8>, String> + Send + Sync;
type DeserializeFn = dyn Fn(&[u8]) -> Result<ComponentBox, String> + Send + Sync;

/// One registered serialize/deserialize pair
struct CodecEntry {
    tag: u32,
    type_name: &'static str,
    serialize: Box<SerializeFn>,
    deserialize: Box<DeserializeFn>,
}

/// Codecs keyed by category and concrete type (serialize) or tag (deserialize)
#[derive(Clone, Default)]
pub struct CodecRegistry {
    by_type: Arc<HashMap<(Category, TypeId), Arc<CodecEntry>>>,
    by_tag: Arc<HashMap<(Category, u32), Arc<CodecEntry>>>,
}

impl CodecRegistry {
    /// Registry with no codecs; every serialization is a gap
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry builder
    pub fn builder() -> CodecRegistryBuilder {
        CodecRegistryBuilder {
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
        }
    }

    /// Serialize a component, returning its tag and payload
    pub fn serialize(
        &self,
        category: Category,
        component: &dyn Component,
    ) -> BridgeResult<(u32, Vec<u8>)> {
        let type_id = component.as_any().type_id();
        let entry = self.by_type.get(&(category, type_id)).ok_or_else(|| {
            BridgeError::SerializationGap {
                category,
                type_name: component.type_name(),
            }
        })?;
        let payload = (entry.serialize)(component).map_err(|message| BridgeError::Codec {
            category,
            tag: entry.tag,
            message,
        })?;
        Ok((entry.tag, payload))
    }

    /// Rebuild a component from its tag and payload
    pub fn deserialize(
        &self,
        category: Category,
        tag: u32,
        payload: &[u8],
    ) -> BridgeResult<ComponentBox> {
        let entry = self
            .by_tag
            .get(&(category, tag))
            .ok_or(MalformedReason::UnknownTag { category, tag })?;
        (entry.deserialize)(payload).map_err(|message| BridgeError::Codec {
            category,
            tag,
            message,
        })
    }

    /// Check whether a concrete type is serializable in a category
    pub fn supports<T: Component>(&self, category: Category) -> bool {
        self.by_type.contains_key(&(category, TypeId::of::<T>()))
    }

    /// Number of registered codecs
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// Check if no codecs are registered
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .by_tag
            .iter()
            .map(|((category, tag), entry)| (category.as_str(), *tag, entry.type_name))
            .collect();
        entries.sort();
        f.debug_struct("CodecRegistry")
            .field("entries", &entries)
            .finish()
    }
}

/// Builder for CodecRegistry
pub struct CodecRegistryBuilder {
    by_type: HashMap<(Category, TypeId), Arc<CodecEntry>>,
    by_tag: HashMap<(Category, u32), Arc<CodecEntry>>,
}

impl CodecRegistryBuilder {
    /// Register a codec for `T` in `category` under `tag`.
    ///
    /// Registering the same type or tag again replaces the earlier codec.
    pub fn register<T, E, S, D>(mut self, category: Category, tag: u32, ser: S, de: D) -> Self
    where
        T: Component,
        E: fmt::Display,
        S: Fn(&T) -> Result<Vec<u8>, E> + Send + Sync + 'static,
        D: Fn(&[u8]) -> Result<T, E> + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let entry = Arc::new(CodecEntry {
            tag,
            type_name,
            serialize: Box::new(move |component: &dyn Component| {
                let value = component
                    .downcast_ref::<T>()
                    .ok_or_else(|| format!("expected {type_name}, got {}", component.type_name()))?;
                ser(value).map_err(|e| e.to_string())
            }),
            deserialize: Box::new(move |payload: &[u8]| {
                de(payload)
                    .map(|value| Box::new(value) as ComponentBox)
                    .map_err(|e| e.to_string())
            }),
        });
        self.by_type
            .insert((category, TypeId::of::<T>()), Arc::clone(&entry));
        self.by_tag.insert((category, tag), entry);
        self
    }

    /// Register `T` with a JSON payload
    pub fn register_serde<T>(self, category: Category, tag: u32) -> Self
    where
        T: Component + Serialize + DeserializeOwned,
    {
        self.register::<T, serde_json::Error, _, _>(
            category,
            tag,
            |value: &T| serde_json::to_vec(value),
            |payload: &[u8]| serde_json::from_slice(payload),
        )
    }

    /// Register a stateless `T` whose payload is empty; the tag alone
    /// identifies it and deserialization yields `T::default()`
    pub fn register_unit<T>(self, category: Category, tag: u32) -> Self
    where
        T: Component + Default,
    {
        self.register::<T, String, _, _>(
            category,
            tag,
            |_: &T| Ok(Vec::new()),
            |_: &[u8]| Ok(T::default()),
        )
    }

    /// Build the registry
    pub fn build(self) -> CodecRegistry {
        CodecRegistry {
            by_type: Arc::new(self.by_type),
            by_tag: Arc::new(self.by_tag),
        }
    }
}
