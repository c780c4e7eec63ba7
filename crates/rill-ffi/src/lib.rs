//! C FFI bindings for the Rill component registry
//!
//! This module provides a C-compatible API through which an external engine
//! drives application components by handle. The API follows these
//! principles:
//! - ABI-stable (only fixed-width integers and pointer/length pairs cross)
//! - One process-wide registry, installed from Rust before the engine starts
//! - Error handling via out-parameters
//! - Panics in application code never unwind into the caller
//! - Manual memory management for returned bytes, strings and errors
//!
//! Handle-returning functions return `RILL_ERROR_HANDLE` on failure and 0 for
//! "no result". Status-returning functions return -1 on failure.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use once_cell::sync::OnceCell;
use rill_core::{BridgeError, Category, ComponentRegistry, Handle};
use rill_sdk::PartitionKey;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Process-wide registry
// ============================================================================

static REGISTRY: OnceCell<ComponentRegistry> = OnceCell::new();

/// Sentinel returned by handle-returning functions on failure
pub const RILL_ERROR_HANDLE: u64 = u64::MAX;

/// Install the registry the C boundary operates on.
///
/// Can be called once per process; later calls fail with
/// `AlreadyInstalled` and drop the registry passed in.
pub fn install(registry: ComponentRegistry) -> Result<&'static ComponentRegistry, FfiError> {
    let mut fresh = false;
    let installed = REGISTRY.get_or_init(|| {
        fresh = true;
        registry
    });
    if !fresh {
        return Err(FfiError::AlreadyInstalled);
    }
    info!(options = ?installed.options(), codecs = installed.codecs().len(), "installed registry");
    Ok(installed)
}

/// The installed registry
pub fn registry() -> Result<&'static ComponentRegistry, FfiError> {
    REGISTRY.get().ok_or(FfiError::NotInstalled)
}

// ============================================================================
// Errors
// ============================================================================

/// Failures reported across the C boundary
#[derive(Debug, Error)]
pub enum FfiError {
    /// Registry, dispatch or bridge failure
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Required pointer argument was NULL
    #[error("Invalid arguments (null pointer: {0})")]
    NullPointer(&'static str),

    /// No registry installed yet
    #[error("No registry installed")]
    NotInstalled,

    /// A registry was already installed
    #[error("Registry already installed")]
    AlreadyInstalled,

    /// Application code panicked
    #[error("Component panicked: {0}")]
    Panicked(String),

    /// A returned string contains a NUL byte and cannot cross as a C string
    #[error("Interior NUL byte at position {0}")]
    InteriorNul(usize),
}

impl FfiError {
    /// Stable code reported by `rill_error_code`
    pub fn code(&self) -> c_int {
        match self {
            FfiError::Bridge(e) => e.code(),
            FfiError::NullPointer(_) => 100,
            FfiError::NotInstalled => 101,
            FfiError::AlreadyInstalled => 102,
            FfiError::Panicked(_) => 103,
            FfiError::InteriorNul(_) => 104,
        }
    }

    fn is_fatal(&self) -> bool {
        match self {
            FfiError::Bridge(e) => e.is_fatal(),
            _ => true,
        }
    }
}

/// Error information
#[repr(C)]
pub struct RillError {
    message: *mut c_char,
    code: c_int,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Convert Rust string to C string (caller must free)
unsafe fn rust_to_c_string(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => c_str.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Set error out-parameter
unsafe fn set_error(error_out: *mut *mut RillError, error: FfiError) {
    if error.is_fatal() {
        warn!(code = error.code(), %error, "call failed");
    }
    if !error_out.is_null() {
        let err = Box::new(RillError {
            message: rust_to_c_string(&error.to_string()),
            code: error.code(),
        });
        *error_out = Box::into_raw(err);
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run a call against the installed registry, catching panics and turning
/// failures into the error out-parameter plus `on_error`
unsafe fn call<T>(
    error: *mut *mut RillError,
    on_error: T,
    f: impl FnOnce(&'static ComponentRegistry) -> Result<T, FfiError>,
) -> T {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| f(registry()?)));
    let result = match outcome {
        Ok(result) => result,
        Err(payload) => Err(FfiError::Panicked(panic_message(&*payload))),
    };
    match result {
        Ok(value) => value,
        Err(e) => {
            set_error(error, e);
            on_error
        }
    }
}

fn category(raw: u64) -> Result<Category, FfiError> {
    Ok(Category::try_from(raw)?)
}

fn handle(category: Category, raw: u64) -> Result<Handle, FfiError> {
    Handle::new(raw).ok_or(FfiError::Bridge(BridgeError::NotFound {
        category,
        handle: raw,
    }))
}

/// Borrow a caller buffer; NULL is accepted for an empty one
unsafe fn input<'a>(data: *const u8, len: usize, name: &'static str) -> Result<&'a [u8], FfiError> {
    if data.is_null() {
        if len == 0 {
            return Ok(&[][..]);
        }
        return Err(FfiError::NullPointer(name));
    }
    Ok(std::slice::from_raw_parts(data, len))
}

unsafe fn write_out<T>(out: *mut T, value: T, name: &'static str) -> Result<(), FfiError> {
    if out.is_null() {
        return Err(FfiError::NullPointer(name));
    }
    *out = value;
    Ok(())
}

/// Hand a byte vector to the caller; free with `rill_bytes_free`
unsafe fn write_bytes(
    bytes: Vec<u8>,
    out_data: *mut *mut u8,
    out_len: *mut usize,
) -> Result<(), FfiError> {
    if out_data.is_null() || out_len.is_null() {
        return Err(FfiError::NullPointer("out_data"));
    }
    let boxed = bytes.into_boxed_slice();
    *out_len = boxed.len();
    *out_data = Box::into_raw(boxed) as *mut u8;
    Ok(())
}

fn key_as_u64(key: PartitionKey) -> Result<u64, FfiError> {
    match key {
        PartitionKey::U64(v) => Ok(v),
        PartitionKey::Str(_) => Err(BridgeError::TypeMismatch {
            expected: "u64",
            got: "string",
        }
        .into()),
        PartitionKey::Bytes(_) => Err(BridgeError::TypeMismatch {
            expected: "u64",
            got: "bytes",
        }
        .into()),
    }
}

// ============================================================================
// Component Lifecycle
// ============================================================================

/// Remove a component and any buffer staged for it
///
/// # Returns
/// * 0 on success
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_component_remove(
    category_raw: u64,
    handle_raw: u64,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let category = category(category_raw)?;
        registry.remove(category, handle(category, handle_raw)?)?;
        Ok(0)
    })
}

/// Display name of a computation, state computation or state builder
///
/// # Returns
/// * Null-terminated name; free with `rill_string_free()`
/// * NULL on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_component_name(
    category_raw: u64,
    handle_raw: u64,
    error: *mut *mut RillError,
) -> *mut c_char {
    call(error, ptr::null_mut(), |registry| {
        let category = category(category_raw)?;
        let name = registry.name(category, handle(category, handle_raw)?)?;
        let name = CString::new(name).map_err(|e| FfiError::InteriorNul(e.nul_position()))?;
        Ok(name.into_raw())
    })
}

// ============================================================================
// Decoders and Encoders
// ============================================================================

/// Header length a decoder reads before asking for the payload length
///
/// # Returns
/// * Header length in bytes
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_decoder_header_length(
    decoder: u64,
    error: *mut *mut RillError,
) -> i64 {
    call(error, -1, |registry| {
        let len = registry.decoder_header_length(handle(Category::Decoder, decoder)?)?;
        Ok(len as i64)
    })
}

/// Payload length announced by a header
///
/// # Returns
/// * Payload length in bytes
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `header` must point to `header_len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn rill_decoder_payload_length(
    decoder: u64,
    header: *const u8,
    header_len: usize,
    error: *mut *mut RillError,
) -> i64 {
    call(error, -1, |registry| {
        let header = input(header, header_len, "header")?;
        let len = registry.decoder_payload_length(handle(Category::Decoder, decoder)?, header)?;
        Ok(len as i64)
    })
}

/// Decode a payload into a new `Data` handle
///
/// # Returns
/// * Handle of the decoded record
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn rill_decoder_decode(
    decoder: u64,
    data: *const u8,
    len: usize,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let payload = input(data, len, "data")?;
        let record = registry.decode(handle(Category::Decoder, decoder)?, payload)?;
        Ok(record.get())
    })
}

/// Encode a `Data` record
///
/// # Returns
/// * 0 on success; `*out_data`/`*out_len` receive bytes to free with
///   `rill_bytes_free()`
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `out_data` and `out_len` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_encoder_encode(
    encoder: u64,
    data: u64,
    out_data: *mut *mut u8,
    out_len: *mut usize,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let bytes = registry.encode(
            handle(Category::Encoder, encoder)?,
            handle(Category::Data, data)?,
        )?;
        write_bytes(bytes, out_data, out_len)?;
        Ok(0)
    })
}

/// Encode a `Data` record into a value and an optional key
///
/// # Returns
/// * 1 if a key was produced, 0 if not; both buffers are filled either way
///   (an absent key is an empty buffer) and must be freed with
///   `rill_bytes_free()`
/// * -1 on failure (check error parameter)
///
/// # Safety
/// All out pointers must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_keyed_encoder_encode(
    encoder: u64,
    data: u64,
    value_data: *mut *mut u8,
    value_len: *mut usize,
    key_data: *mut *mut u8,
    key_len: *mut usize,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        if key_data.is_null() || key_len.is_null() {
            return Err(FfiError::NullPointer("key_data"));
        }
        let record = registry.encode_keyed(
            handle(Category::Encoder, encoder)?,
            handle(Category::Data, data)?,
        )?;
        let has_key = record.key.is_some();
        write_bytes(record.value, value_data, value_len)?;
        write_bytes(record.key.unwrap_or_default(), key_data, key_len)?;
        Ok(c_int::from(has_key))
    })
}

// ============================================================================
// Computations
// ============================================================================

/// Run a computation over a `Data` record
///
/// # Returns
/// * Handle of the output record, 0 if the record was filtered out
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_computation_compute(
    computation: u64,
    data: u64,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let output = registry.compute(
            handle(Category::Computation, computation)?,
            handle(Category::Data, data)?,
        )?;
        Ok(Handle::into_raw(output))
    })
}

/// Run a multi-output computation over a `Data` record
///
/// # Returns
/// * Result list handle (0 if nothing was produced); `*count` receives the
///   number of outputs
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `count` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_computation_multi_compute(
    computation: u64,
    data: u64,
    count: *mut usize,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        if count.is_null() {
            return Err(FfiError::NullPointer("count"));
        }
        let result = registry.compute_multi(
            handle(Category::Computation, computation)?,
            handle(Category::Data, data)?,
        )?;
        *count = result.count;
        Ok(Handle::into_raw(result.list))
    })
}

/// Output handle at `index` in a result list
///
/// # Returns
/// * Handle of the output record
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_result_item(
    list: u64,
    index: usize,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let item = registry.result_item(handle(Category::Data, list)?, index)?;
        Ok(item.get())
    })
}

/// Build a fresh computation
///
/// # Returns
/// * Handle of the new computation
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_computation_builder_build(
    builder: u64,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let built = registry.build_computation(handle(Category::ComputationBuilder, builder)?)?;
        Ok(built.get())
    })
}

// ============================================================================
// State Computations
// ============================================================================

/// Run a state computation over a `Data` record and a `State` object
///
/// # Returns
/// * Handle of the output record, 0 if none; `*state_changed` receives 1 if
///   the state may have been mutated
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `state_changed` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_state_computation_compute(
    computation: u64,
    data: u64,
    state: u64,
    state_changed: *mut c_int,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        if state_changed.is_null() {
            return Err(FfiError::NullPointer("state_changed"));
        }
        let result = registry.compute_with_state(
            handle(Category::StateComputation, computation)?,
            handle(Category::Data, data)?,
            handle(Category::State, state)?,
        )?;
        *state_changed = c_int::from(result.state_changed);
        Ok(Handle::into_raw(result.output))
    })
}

/// Run a multi-output state computation
///
/// # Returns
/// * Result list handle (0 if nothing was produced); `*count` and
///   `*state_changed` are filled in
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `count` and `state_changed` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_state_computation_multi_compute(
    computation: u64,
    data: u64,
    state: u64,
    count: *mut usize,
    state_changed: *mut c_int,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        if count.is_null() {
            return Err(FfiError::NullPointer("count"));
        }
        if state_changed.is_null() {
            return Err(FfiError::NullPointer("state_changed"));
        }
        let result = registry.compute_with_state_multi(
            handle(Category::StateComputation, computation)?,
            handle(Category::Data, data)?,
            handle(Category::State, state)?,
        )?;
        *count = result.count;
        *state_changed = c_int::from(result.state_changed);
        Ok(Handle::into_raw(result.list))
    })
}

/// Build a zero state for a new partition key
///
/// # Returns
/// * Handle of the new state
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_state_builder_build(
    builder: u64,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let state = registry.build_state(handle(Category::StateBuilder, builder)?)?;
        Ok(state.get())
    })
}

// ============================================================================
// Partitioning
// ============================================================================

/// Integer partition key for a `Data` record
///
/// # Returns
/// * 0 on success (`*key` receives the key)
/// * -1 on failure, including a non-integer key (check error parameter)
///
/// # Safety
/// `key` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_partition_u64(
    function: u64,
    data: u64,
    key: *mut u64,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let k = registry.partition(
            handle(Category::PartitionFunction, function)?,
            handle(Category::Data, data)?,
        )?;
        write_out(key, key_as_u64(k)?, "key")?;
        Ok(0)
    })
}

/// Partition key for a `Data` record as bytes (integers big-endian)
///
/// # Returns
/// * 0 on success; free the bytes with `rill_bytes_free()`
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `out_data` and `out_len` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_partition_bytes(
    function: u64,
    data: u64,
    out_data: *mut *mut u8,
    out_len: *mut usize,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let k = registry.partition(
            handle(Category::PartitionFunction, function)?,
            handle(Category::Data, data)?,
        )?;
        write_bytes(k.to_bytes(), out_data, out_len)?;
        Ok(0)
    })
}

/// Number of keys in a declared key list
///
/// # Returns
/// * Key count
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
#[no_mangle]
pub unsafe extern "C" fn rill_partition_keys_len(list: u64, error: *mut *mut RillError) -> i64 {
    call(error, -1, |registry| {
        let len = registry.partition_keys_len(handle(Category::PartitionKeyList, list)?)?;
        Ok(len as i64)
    })
}

/// Integer key at `index` in a declared key list
///
/// # Returns
/// * 0 on success (`*key` receives the key)
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `key` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_partition_key_u64(
    list: u64,
    index: usize,
    key: *mut u64,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let k = registry.partition_key(handle(Category::PartitionKeyList, list)?, index)?;
        write_out(key, key_as_u64(k)?, "key")?;
        Ok(0)
    })
}

/// Key at `index` in a declared key list as bytes
///
/// # Returns
/// * 0 on success; free the bytes with `rill_bytes_free()`
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `out_data` and `out_len` must point to writable storage
#[no_mangle]
pub unsafe extern "C" fn rill_partition_key_bytes(
    list: u64,
    index: usize,
    out_data: *mut *mut u8,
    out_len: *mut usize,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        let k = registry.partition_key(handle(Category::PartitionKeyList, list)?, index)?;
        write_bytes(k.to_bytes(), out_data, out_len)?;
        Ok(0)
    })
}

// ============================================================================
// Serialization
// ============================================================================

/// Serialize a component and stage the framed bytes
///
/// # Returns
/// * Size the caller must allocate for `rill_serialize_copy()`
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `error` must be NULL or point to writable storage for a `RillError*`
///
/// # Example (C)
/// ```c
/// RillError* error = NULL;
/// int64_t size = rill_serialize_size(RILL_STATE, state, &error);
/// uint8_t* buf = malloc(size);
/// if (rill_serialize_copy(RILL_STATE, state, buf, size, &error) != 0) {
///     fprintf(stderr, "copy failed: %s\n", rill_error_message(error));
///     rill_error_free(error);
/// }
/// ```
#[no_mangle]
pub unsafe extern "C" fn rill_serialize_size(
    category_raw: u64,
    handle_raw: u64,
    error: *mut *mut RillError,
) -> i64 {
    call(error, -1, |registry| {
        let category = category(category_raw)?;
        let size = registry.serialize(category, handle(category, handle_raw)?)?;
        Ok(size as i64)
    })
}

/// Copy a staged buffer into caller memory; single use
///
/// # Returns
/// * 0 on success
/// * -1 on failure (check error parameter)
///
/// # Safety
/// `dest` must point to `dest_len` writable bytes
#[no_mangle]
pub unsafe extern "C" fn rill_serialize_copy(
    category_raw: u64,
    handle_raw: u64,
    dest: *mut u8,
    dest_len: usize,
    error: *mut *mut RillError,
) -> c_int {
    call(error, -1, |registry| {
        if dest.is_null() {
            return Err(FfiError::NullPointer("dest"));
        }
        let category = category(category_raw)?;
        let dest = std::slice::from_raw_parts_mut(dest, dest_len);
        registry.copy_into(category, handle(category, handle_raw)?, dest)?;
        Ok(0)
    })
}

/// Rebuild a component from framed bytes under a fresh handle
///
/// # Returns
/// * Handle of the rebuilt component
/// * `RILL_ERROR_HANDLE` on failure (check error parameter)
///
/// # Safety
/// `data` must point to `len` readable bytes
#[no_mangle]
pub unsafe extern "C" fn rill_deserialize(
    category_raw: u64,
    data: *const u8,
    len: usize,
    error: *mut *mut RillError,
) -> u64 {
    call(error, RILL_ERROR_HANDLE, |registry| {
        let category = category(category_raw)?;
        let bytes = input(data, len, "data")?;
        Ok(registry.deserialize(category, bytes)?.get())
    })
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free bytes returned by this library
///
/// # Safety
/// `data`/`len` must come from a single call of this library; NULL is ignored
#[no_mangle]
pub unsafe extern "C" fn rill_bytes_free(data: *mut u8, len: usize) {
    if data.is_null() {
        return;
    }

    drop(Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)));
}

/// Free a string returned by this library
///
/// # Safety
/// `s` must come from this library; NULL is ignored
#[no_mangle]
pub unsafe extern "C" fn rill_string_free(s: *mut c_char) {
    if s.is_null() {
        return;
    }

    drop(CString::from_raw(s));
}

// ============================================================================
// Error Handling Functions
// ============================================================================

/// Get the error message
///
/// # Returns
/// * Null-terminated error message string
/// * NULL if error is NULL
///
/// # Safety
/// - Error pointer must be valid
/// - Returned string is valid until `rill_error_free()` is called
/// - Do not free the returned string directly
#[no_mangle]
pub unsafe extern "C" fn rill_error_message(error: *const RillError) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }

    (*error).message
}

/// Get the error code (1 = not found, the only recoverable code)
///
/// # Safety
/// Error pointer must be valid or NULL (returns 0)
#[no_mangle]
pub unsafe extern "C" fn rill_error_code(error: *const RillError) -> c_int {
    if error.is_null() {
        return 0;
    }

    (*error).code
}

/// Free an error
///
/// # Safety
/// - Error pointer must be valid (created by Rill API)
/// - Error must not be used after this call
#[no_mangle]
pub unsafe extern "C" fn rill_error_free(error: *mut RillError) {
    if error.is_null() {
        return;
    }

    if !(*error).message.is_null() {
        drop(CString::from_raw((*error).message));
    }

    drop(Box::from_raw(error));
}

// ============================================================================
// Version and Logging
// ============================================================================

/// Get the Rill version string
///
/// # Safety
/// The returned string is static and must not be freed
#[no_mangle]
pub unsafe extern "C" fn rill_version() -> *const c_char {
    static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

/// Install a log subscriber filtered by `RILL_LOG` (default `warn`)
///
/// # Returns
/// * 0 if installed
/// * 1 if a subscriber was already installed (no-op)
#[no_mangle]
pub extern "C" fn rill_logging_init() -> c_int {
    let filter = EnvFilter::try_from_env("RILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    match tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
    {
        Ok(()) => 0,
        Err(_) => 1,
    }
}

/// Message of an error, for Rust callers and tests
///
/// # Safety
/// Error pointer must be valid or NULL
pub unsafe fn error_message(error: *const RillError) -> Option<String> {
    let message = rill_error_message(error);
    if message.is_null() {
        return None;
    }
    Some(CStr::from_ptr(message).to_string_lossy().into_owned())
}

// ============================================================================
// Tests
// ============================================================================
