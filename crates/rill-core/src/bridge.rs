//! Serialization bridge
//!
//! Two-phase protocol for handing a component's bytes to a caller that owns
//! the destination memory:
//!
//! 1. [`serialize`](ComponentRegistry::serialize) runs the codec, frames the
//!    result and stages it under (category, handle); the caller gets the size.
//! 2. [`copy_into`](ComponentRegistry::copy_into) moves the staged bytes into
//!    a caller buffer of exactly that size and drops the staged copy.
//!
//! A staged buffer is single use. Removing the handle drops it as well.

use dashmap::DashMap;
use tracing::trace;

use crate::category::{Category, Handle};
use crate::error::{BridgeError, BridgeResult};
use crate::frame;
use crate::registry::ComponentRegistry;

/// Framed buffers waiting for their copy
pub(crate) struct StagingCache {
    buffers: DashMap<(Category, Handle), Vec<u8>>,
}

impl StagingCache {
    pub(crate) fn new(shard_count: usize) -> Self {
        Self {
            buffers: DashMap::with_shard_amount(shard_count),
        }
    }

    fn stage(&self, category: Category, handle: Handle, buf: Vec<u8>) {
        self.buffers.insert((category, handle), buf);
    }

    fn take(&self, category: Category, handle: Handle) -> Option<Vec<u8>> {
        self.buffers.remove(&(category, handle)).map(|(_, buf)| buf)
    }

    pub(crate) fn discard(&self, category: Category, handle: Handle) {
        if self.buffers.remove(&(category, handle)).is_some() {
            trace!(%category, %handle, "discarded staged buffer");
        }
    }

    fn len(&self) -> usize {
        self.buffers.len()
    }
}

impl ComponentRegistry {
    /// Serialize a component and stage the framed bytes.
    ///
    /// Returns the framed size the caller must allocate. Serializing again
    /// before copying replaces the staged buffer. If the handle is removed
    /// while the codec runs, nothing stays staged and the call reports
    /// `NotFound`.
    pub fn serialize(&self, category: Category, handle: Handle) -> BridgeResult<usize> {
        let shared = self.resolve(category, handle)?;
        let (tag, payload) = {
            let guard = shared.read();
            self.codecs.serialize(category, &**guard)?
        };
        let buf = frame::encode(tag, &payload, self.options().max_frame_len)?;
        let size = buf.len();
        self.staging.stage(category, handle, buf);
        // `remove` drops the table entry before discarding, so a removal that
        // raced the codec is visible here
        if !self.contains(category, handle) {
            self.staging.discard(category, handle);
            return Err(BridgeError::not_found(category, handle));
        }
        trace!(%category, %handle, tag, size, "staged buffer");
        Ok(size)
    }

    /// Copy a staged buffer into `dest` and drop it.
    ///
    /// `dest` must be exactly the size `serialize` returned. On a size
    /// mismatch the buffer stays staged. If the handle was removed in the
    /// meantime the call fails with `NotFound`.
    pub fn copy_into(&self, category: Category, handle: Handle, dest: &mut [u8]) -> BridgeResult<()> {
        let buf = self.staging.take(category, handle).ok_or_else(|| {
            if self.contains(category, handle) {
                BridgeError::NotStaged { category, handle }
            } else {
                BridgeError::not_found(category, handle)
            }
        })?;
        if !self.contains(category, handle) {
            return Err(BridgeError::not_found(category, handle));
        }
        if buf.len() != dest.len() {
            let expected = buf.len();
            self.staging.stage(category, handle, buf);
            return Err(BridgeError::DestinationSize {
                expected,
                actual: dest.len(),
            });
        }
        dest.copy_from_slice(&buf);
        trace!(%category, %handle, size = buf.len(), "copied staged buffer");
        Ok(())
    }

    /// Rebuild a component from framed bytes and register it under a fresh
    /// handle.
    ///
    /// Bytes past the declared frame length are ignored.
    pub fn deserialize(&self, category: Category, bytes: &[u8]) -> BridgeResult<Handle> {
        let (tag, payload) = frame::decode(bytes, self.options().max_frame_len)?;
        let component = self.codecs.deserialize(category, tag, payload)?;
        let handle = self.register_boxed(category, component);
        trace!(%category, %handle, tag, "deserialized component");
        Ok(handle)
    }

    /// Number of buffers currently staged
    pub fn staged_len(&self) -> usize {
        self.staging.len()
    }
}
