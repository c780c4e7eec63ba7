//! The alphabet application driven only through the C API

use std::os::raw::c_int;
use std::ptr;

use rill_apps::alphabet;
use rill_core::{Category, ComponentRegistry};
use rill_ffi::*;

fn setup() -> alphabet::AlphabetPipeline {
    let registry = ComponentRegistry::builder()
        .codecs(alphabet::codecs())
        .build()
        .unwrap();
    let installed = match install(registry) {
        Ok(installed) => installed,
        Err(_) => rill_ffi::registry().unwrap(),
    };
    alphabet::components(installed)
}

unsafe fn encode(encoder: u64, data: u64) -> String {
    let mut error: *mut RillError = ptr::null_mut();
    let (mut out, mut len) = (ptr::null_mut(), 0usize);
    assert_eq!(rill_encoder_encode(encoder, data, &mut out, &mut len, &mut error), 0);
    let s = String::from_utf8(std::slice::from_raw_parts(out, len).to_vec()).unwrap();
    rill_bytes_free(out, len);
    s
}

#[test]
fn test_alphabet_over_c_api() {
    let app = setup();
    rill_logging_init();

    unsafe {
        let mut error: *mut RillError = ptr::null_mut();
        let frame = [0u8, 0, 0, 5, b'm', 0, 0, 0, 9];

        let header_len = rill_decoder_header_length(app.decoder.get(), &mut error) as usize;
        let payload_len =
            rill_decoder_payload_length(app.decoder.get(), frame.as_ptr(), header_len, &mut error)
                as usize;
        assert_eq!(payload_len, 5);
        let payload = &frame[header_len..header_len + payload_len];
        let record = rill_decoder_decode(
            app.decoder.get(),
            payload.as_ptr(),
            payload.len(),
            &mut error,
        );
        assert!(error.is_null());

        let mut key = 0u64;
        assert_eq!(rill_partition_u64(app.partition.get(), record, &mut key, &mut error), 0);
        assert_eq!(key, b'm' as u64);
        assert_eq!(rill_partition_keys_len(app.keys.get(), &mut error), 26);
        let mut first = 0u64;
        rill_partition_key_u64(app.keys.get(), 0, &mut first, &mut error);
        assert_eq!(first, b'a' as u64);

        let state = rill_state_builder_build(app.state_builder.get(), &mut error);
        let mut changed: c_int = 0;
        let mut last = 0;
        for _ in 0..2 {
            last = rill_state_computation_compute(
                app.add_votes.get(),
                record,
                state,
                &mut changed,
                &mut error,
            );
            assert_eq!(changed, 1);
        }
        assert_eq!(encode(app.encoder.get(), last), "m => 18\n");

        // Checkpoint, drop and restore the state
        let state_cat = Category::State.as_u64();
        let size = rill_serialize_size(state_cat, state, &mut error);
        assert!(size > 8);
        let mut buf = vec![0u8; size as usize];
        assert_eq!(
            rill_serialize_copy(state_cat, state, buf.as_mut_ptr(), buf.len(), &mut error),
            0
        );
        assert_eq!(rill_component_remove(state_cat, state, &mut error), 0);
        let restored = rill_deserialize(state_cat, buf.as_ptr(), buf.len(), &mut error);
        assert!(error.is_null());

        let out = rill_state_computation_compute(
            app.add_votes.get(),
            record,
            restored,
            &mut changed,
            &mut error,
        );
        assert_eq!(encode(app.encoder.get(), out), "m => 27\n");

        // The removed handle stays gone
        rill_state_computation_compute(app.add_votes.get(), record, state, &mut changed, &mut error);
        assert!(!error.is_null());
        assert_eq!(rill_error_code(error), 1);
        rill_error_free(error);
    }
}

#[test]
fn test_truncated_buffer_is_rejected() {
    setup();

    unsafe {
        let mut error: *mut RillError = ptr::null_mut();
        let bytes = [0u8, 0, 0, 40, 0, 0];
        let h = rill_deserialize(Category::State.as_u64(), bytes.as_ptr(), bytes.len(), &mut error);
        assert_eq!(h, RILL_ERROR_HANDLE);
        assert_eq!(rill_error_code(error), 4);
        let message = error_message(error).unwrap();
        assert!(message.starts_with("malformed buffer"));
        rill_error_free(error);
    }
}
