//! End-to-end registry behavior over the public API

use std::collections::HashSet;
use std::sync::Arc;

use rill_core::rill_sdk::{
    component, Component, ComponentBox, ComponentResult, Encoder, PartitionFunction,
    PartitionKey, PartitionKeys, StateBuilder, StateComputation, StateOutput,
};
use rill_core::{BridgeError, Capability, Category, CodecRegistry, ComponentRegistry, Handle};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Tally {
    key: String,
    count: u64,
}
component!(Tally);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: u32,
    celsius: f32,
}
component!(Reading);

struct TallyBuilder;

impl StateBuilder for TallyBuilder {
    fn name(&self) -> &str {
        "tally"
    }

    fn build(&self) -> ComponentBox {
        Box::new(Tally {
            key: String::new(),
            count: 0,
        })
    }
}
component!(TallyBuilder: StateBuilder);

struct CountReadings;

impl StateComputation for CountReadings {
    fn name(&self) -> &str {
        "count readings"
    }

    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>> {
        let reading = data.expect::<Reading>()?;
        let tally = state.expect_mut::<Tally>()?;
        tally.key = reading.sensor.to_string();
        tally.count += 1;
        Ok(StateOutput::changed(Some(Box::new(tally.count))))
    }
}
component!(CountReadings: StateComputation);

struct BySensor;

impl PartitionFunction for BySensor {
    fn partition(&self, data: &dyn Component) -> ComponentResult<PartitionKey> {
        Ok(PartitionKey::U64(data.expect::<Reading>()?.sensor as u64))
    }
}
component!(BySensor: PartitionFunction);

struct Sink;

impl Encoder for Sink {
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>> {
        Ok(data.expect::<u64>()?.to_string().into_bytes())
    }
}
component!(Sink: Encoder);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct KeyList(Vec<u64>);

fn registry() -> ComponentRegistry {
    let codecs = CodecRegistry::builder()
        .register_serde::<Tally>(Category::State, 1)
        .register_serde::<Reading>(Category::Data, 2)
        .register::<PartitionKeys, serde_json::Error, _, _>(
            Category::PartitionKeyList,
            3,
            |keys: &PartitionKeys| match keys {
                PartitionKeys::U64(v) => serde_json::to_vec(&KeyList(v.clone())),
                other => serde_json::to_vec(&KeyList(
                    other.iter().filter_map(|k| k.as_u64()).collect(),
                )),
            },
            |payload: &[u8]| serde_json::from_slice::<KeyList>(payload).map(|l| PartitionKeys::U64(l.0)),
        )
        .build();
    ComponentRegistry::builder().codecs(codecs).build().unwrap()
}

fn round_trip(registry: &ComponentRegistry, category: Category, handle: Handle) -> Handle {
    let size = registry.serialize(category, handle).unwrap();
    let mut buf = vec![0u8; size];
    registry.copy_into(category, handle, &mut buf).unwrap();
    registry.deserialize(category, &buf).unwrap()
}

#[test]
fn test_register_then_resolve() {
    let registry = registry();
    let reading = Reading {
        sensor: 4,
        celsius: 21.5,
    };
    let h = registry.register(Category::Data, reading.clone());
    assert!(registry.contains(Category::Data, h));
    let shared = registry.resolve(Category::Data, h).unwrap();
    let guard = shared.read();
    assert_eq!(guard.downcast_ref::<Reading>(), Some(&reading));
}

#[test]
fn test_removed_handle_is_not_found() {
    let registry = registry();
    let h = registry.register(Category::Data, 1u64);
    registry.remove(Category::Data, h).unwrap();
    let err = registry.resolve(Category::Data, h).unwrap_err();
    assert!(matches!(err, BridgeError::NotFound { .. }));
    assert!(!err.is_fatal());
}

#[test]
fn test_state_survives_round_trip() {
    let registry = registry();
    let state = registry.register(
        Category::State,
        Tally {
            key: "k".into(),
            count: 12,
        },
    );
    let copy = round_trip(&registry, Category::State, state);
    let restored = registry
        .inspect(Category::State, copy, |t: &Tally| t.clone())
        .unwrap();
    assert_eq!(
        restored,
        Tally {
            key: "k".into(),
            count: 12
        }
    );
}

#[test]
fn test_record_and_key_list_survive_round_trip() {
    let registry = registry();
    let record = registry.register(
        Category::Data,
        Reading {
            sensor: 2,
            celsius: -3.25,
        },
    );
    let copy = round_trip(&registry, Category::Data, record);
    assert_eq!(
        registry.inspect(Category::Data, copy, |r: &Reading| r.clone()).unwrap(),
        Reading {
            sensor: 2,
            celsius: -3.25
        }
    );

    let keys = registry.register(
        Category::PartitionKeyList,
        PartitionKeys::U64(vec![97, 98, 99]),
    );
    let copy = round_trip(&registry, Category::PartitionKeyList, keys);
    assert_eq!(registry.partition_keys_len(copy).unwrap(), 3);
    assert_eq!(registry.partition_key(copy, 2).unwrap(), PartitionKey::U64(99));
}

#[test]
fn test_second_copy_fails() {
    let registry = registry();
    let state = registry.register(
        Category::State,
        Tally {
            key: String::new(),
            count: 0,
        },
    );
    let size = registry.serialize(Category::State, state).unwrap();
    let mut buf = vec![0u8; size];
    registry.copy_into(Category::State, state, &mut buf).unwrap();
    let err = registry
        .copy_into(Category::State, state, &mut buf)
        .unwrap_err();
    assert!(err.is_fatal());
}

#[test]
fn test_concurrent_registers_are_distinct() {
    let registry = Arc::new(registry());
    let threads = 8;
    let per_thread = 250;

    let seen: Vec<Handle> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..threads)
            .map(|t| {
                let registry = Arc::clone(&registry);
                scope.spawn(move || {
                    (0..per_thread)
                        .map(|i| registry.register(Category::Data, (t * per_thread + i) as u64))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect()
    });

    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(unique.len(), threads * per_thread);
    assert_eq!(registry.len(Category::Data), threads * per_thread);
}

#[test]
fn test_counter_yields_one_two_three() {
    let registry = registry();
    let builder = registry.register(Category::StateBuilder, TallyBuilder);
    let comp = registry.register(Category::StateComputation, CountReadings);
    let sink = registry.register(Category::Encoder, Sink);
    let state = registry.build_state(builder).unwrap();
    let record = registry.register(
        Category::Data,
        Reading {
            sensor: 1,
            celsius: 0.0,
        },
    );

    let mut outputs = Vec::new();
    for _ in 0..3 {
        let result = registry.compute_with_state(comp, record, state).unwrap();
        assert!(result.state_changed);
        outputs.push(registry.encode(sink, result.output.unwrap()).unwrap());
    }
    assert_eq!(outputs, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
}

#[test]
fn test_partition_same_record_same_key() {
    let registry = registry();
    let f = registry.register(Category::PartitionFunction, BySensor);
    let reading = Reading {
        sensor: 17,
        celsius: 4.0,
    };
    let a = registry.register(Category::Data, reading.clone());
    let b = registry.register(Category::Data, reading);
    assert_eq!(registry.partition(f, a).unwrap(), registry.partition(f, b).unwrap());
    assert_eq!(registry.partition(f, a).unwrap(), PartitionKey::U64(17));
}

#[test]
fn test_serialize_remove_copy_fails() {
    let registry = registry();
    let state = registry.register(
        Category::State,
        Tally {
            key: "gone".into(),
            count: 1,
        },
    );
    let size = registry.serialize(Category::State, state).unwrap();
    registry.remove(Category::State, state).unwrap();
    let mut buf = vec![0u8; size];
    assert!(matches!(
        registry.copy_into(Category::State, state, &mut buf),
        Err(BridgeError::NotFound { .. })
    ));
}

#[test]
fn test_decode_against_encoder_is_capability_mismatch() {
    let registry = registry();
    let h = registry.register(Category::Decoder, Sink);
    let err = registry.decode(h, b"1").unwrap_err();
    assert!(matches!(
        err,
        BridgeError::CapabilityMismatch {
            category: Category::Decoder,
            capability: Capability::Decode,
            ..
        }
    ));
    assert!(err.is_fatal());
}

#[test]
fn test_options_from_toml() {
    let options = rill_core::RegistryOptions::from_toml_str(
        "shard_count = 8\nmax_frame_len = 64\n",
    )
    .unwrap();
    let registry = ComponentRegistry::builder()
        .options(options)
        .codecs(CodecRegistry::builder().register_serde::<Tally>(Category::State, 1).build())
        .build()
        .unwrap();
    let big = registry.register(
        Category::State,
        Tally {
            key: "x".repeat(100),
            count: 0,
        },
    );
    assert!(matches!(
        registry.serialize(Category::State, big),
        Err(BridgeError::FrameTooLarge { max: 64, .. })
    ));
}
