//! Component registry
//!
//! One [`HandleTable`] per [`Category`], the staging cache used by the
//! serialization bridge, and the codecs supplied at construction. A registry
//! is an ordinary value: the C boundary owns one for the whole process, tests
//! build as many as they like.

use std::sync::Arc;

use parking_lot::RwLock;
use rill_sdk::{Component, ComponentBox};
use tracing::debug;

use crate::bridge::StagingCache;
use crate::category::{Category, Handle};
use crate::codec::CodecRegistry;
use crate::error::{BridgeError, BridgeResult};
use crate::handle_table::HandleTable;
use crate::options::{OptionsError, RegistryOptions};

/// A registered component behind its own reader/writer lock.
///
/// Readers (decode, compute, partition, serialize) share the lock; state
/// computations take it exclusively for the state object only.
pub type SharedComponent = Arc<RwLock<ComponentBox>>;

/// Registry of handle tables, staged buffers and codecs
pub struct ComponentRegistry {
    tables: [HandleTable<SharedComponent>; Category::COUNT],
    pub(crate) staging: StagingCache,
    pub(crate) codecs: CodecRegistry,
    options: RegistryOptions,
}

impl ComponentRegistry {
    /// Create a registry with default options and no codecs
    pub fn new() -> Self {
        Self::from_parts(RegistryOptions::default(), CodecRegistry::empty())
    }

    /// Create a registry builder
    pub fn builder() -> ComponentRegistryBuilder {
        ComponentRegistryBuilder {
            options: RegistryOptions::default(),
            codecs: CodecRegistry::empty(),
        }
    }

    fn from_parts(options: RegistryOptions, codecs: CodecRegistry) -> Self {
        let tables = std::array::from_fn(|_| {
            HandleTable::with_shards(options.shard_count, options.initial_capacity)
        });
        Self {
            tables,
            staging: StagingCache::new(options.shard_count),
            codecs,
            options,
        }
    }

    #[inline]
    fn table(&self, category: Category) -> &HandleTable<SharedComponent> {
        &self.tables[category.index()]
    }

    /// Register a component and return its new handle
    pub fn register<C: Component>(&self, category: Category, component: C) -> Handle {
        self.register_boxed(category, Box::new(component))
    }

    /// Register an already boxed component
    pub fn register_boxed(&self, category: Category, component: ComponentBox) -> Handle {
        let type_name = (*component).type_name();
        let handle = self
            .table(category)
            .insert(Arc::new(RwLock::new(component)));
        debug!(%category, %handle, type_name, "registered component");
        handle
    }

    /// Look up a component; no role checking happens here
    pub fn resolve(&self, category: Category, handle: Handle) -> BridgeResult<SharedComponent> {
        self.table(category)
            .get(handle)
            .ok_or_else(|| BridgeError::not_found(category, handle))
    }

    /// Remove a component and drop any buffer staged for it.
    ///
    /// Removing an unknown handle reports `NotFound`; the staged buffer is
    /// cleared either way.
    pub fn remove(&self, category: Category, handle: Handle) -> BridgeResult<()> {
        let removed = self.table(category).remove(handle);
        self.staging.discard(category, handle);
        match removed {
            Some(_) => {
                debug!(%category, %handle, "removed component");
                Ok(())
            }
            None => Err(BridgeError::not_found(category, handle)),
        }
    }

    /// Check whether a handle is live
    pub fn contains(&self, category: Category, handle: Handle) -> bool {
        self.table(category).contains(handle)
    }

    /// Number of live handles in a category
    pub fn len(&self, category: Category) -> usize {
        self.table(category).len()
    }

    /// Check whether every category is empty
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(HandleTable::is_empty)
    }

    /// Read a component as its concrete type
    pub fn inspect<T, R>(
        &self,
        category: Category,
        handle: Handle,
        f: impl FnOnce(&T) -> R,
    ) -> BridgeResult<R>
    where
        T: Component,
    {
        let shared = self.resolve(category, handle)?;
        let guard = shared.read();
        let component: &dyn Component = &**guard;
        let value = component
            .downcast_ref::<T>()
            .ok_or_else(|| BridgeError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                got: component.type_name(),
            })?;
        Ok(f(value))
    }

    /// Modify a component in place as its concrete type
    pub fn inspect_mut<T, R>(
        &self,
        category: Category,
        handle: Handle,
        f: impl FnOnce(&mut T) -> R,
    ) -> BridgeResult<R>
    where
        T: Component,
    {
        let shared = self.resolve(category, handle)?;
        let mut guard = shared.write();
        let component: &mut dyn Component = &mut **guard;
        let got = component.type_name();
        let value = component
            .downcast_mut::<T>()
            .ok_or(BridgeError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                got,
            })?;
        Ok(f(value))
    }

    /// Options the registry was built with
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Codecs the registry was built with
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for category in Category::ALL {
            map.entry(&category.as_str(), &self.len(category));
        }
        map.finish()
    }
}

/// Builder for ComponentRegistry
pub struct ComponentRegistryBuilder {
    options: RegistryOptions,
    codecs: CodecRegistry,
}

impl ComponentRegistryBuilder {
    /// Use these options
    pub fn options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Use these codecs
    pub fn codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = codecs;
        self
    }

    /// Validate options and build the registry
    pub fn build(self) -> Result<ComponentRegistry, OptionsError> {
        self.options.validate()?;
        Ok(ComponentRegistry::from_parts(self.options, self.codecs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_sdk::component;

    #[derive(Debug, PartialEq)]
    struct Word(String);
    component!(Word);

    #[test]
    fn test_register_resolve() {
        let registry = ComponentRegistry::new();
        let h = registry.register(Category::Data, Word("hello".into()));
        let word = registry
            .inspect(Category::Data, h, |w: &Word| w.0.clone())
            .unwrap();
        assert_eq!(word, "hello");
    }

    #[test]
    fn test_categories_are_independent() {
        let registry = ComponentRegistry::new();
        let data = registry.register(Category::Data, 1u64);
        let state = registry.register(Category::State, 2u64);
        // Same integer, different objects
        assert_eq!(data, state);
        assert_eq!(registry.inspect(Category::Data, data, |v: &u64| *v).unwrap(), 1);
        assert_eq!(registry.inspect(Category::State, state, |v: &u64| *v).unwrap(), 2);
        assert!(!registry.contains(Category::Decoder, data));
    }

    #[test]
    fn test_remove_then_resolve_is_not_found() {
        let registry = ComponentRegistry::new();
        let h = registry.register(Category::State, 0u64);
        registry.remove(Category::State, h).unwrap();
        assert!(matches!(
            registry.resolve(Category::State, h),
            Err(BridgeError::NotFound { category: Category::State, .. })
        ));
        assert!(matches!(
            registry.remove(Category::State, h),
            Err(BridgeError::NotFound { .. })
        ));
    }

    #[test]
    fn test_inspect_wrong_type() {
        let registry = ComponentRegistry::new();
        let h = registry.register(Category::Data, 3u64);
        assert!(matches!(
            registry.inspect(Category::Data, h, |_: &Word| ()),
            Err(BridgeError::TypeMismatch { got: "u64", .. })
        ));
    }

    #[test]
    fn test_inspect_mut_updates_in_place() {
        let registry = ComponentRegistry::new();
        let h = registry.register(Category::State, 10u64);
        registry
            .inspect_mut(Category::State, h, |v: &mut u64| *v += 5)
            .unwrap();
        assert_eq!(registry.inspect(Category::State, h, |v: &u64| *v).unwrap(), 15);
    }

    #[test]
    fn test_builder_validates_options() {
        let result = ComponentRegistry::builder()
            .options(RegistryOptions::default().with_shard_count(3))
            .build();
        assert!(matches!(result, Err(OptionsError::InvalidShardCount(3))));
    }

    #[test]
    fn test_builder_rejects_degenerate_shard_counts() {
        for count in [0, 1] {
            let result = ComponentRegistry::builder()
                .options(RegistryOptions::default().with_shard_count(count))
                .build();
            assert!(matches!(result, Err(OptionsError::InvalidShardCount(c)) if c == count));
        }
        let registry = ComponentRegistry::builder()
            .options(RegistryOptions::default().with_shard_count(2))
            .build()
            .unwrap();
        let h = registry.register(Category::Data, 1u64);
        assert!(registry.contains(Category::Data, h));
    }
}
