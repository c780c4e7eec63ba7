//! Drive each application the way an engine would, through the registry

use std::collections::HashMap;

use rill_apps::alphabet::{self, LetterAndVotes, RunningVoteTotal};
use rill_apps::celsius;
use rill_apps::market_spread::{self, OrderResult, SymbolData};
use rill_apps::word_count::{self, WordTotals};
use rill_core::rill_sdk::PartitionKey;
use rill_core::{Category, ComponentRegistry, Handle};

fn registry() -> ComponentRegistry {
    ComponentRegistry::builder()
        .codecs(rill_apps::all_codecs())
        .build()
        .unwrap()
}

fn relocate(registry: &ComponentRegistry, category: Category, handle: Handle) -> Handle {
    let size = registry.serialize(category, handle).unwrap();
    let mut buf = vec![0u8; size];
    registry.copy_into(category, handle, &mut buf).unwrap();
    registry.remove(category, handle).unwrap();
    registry.deserialize(category, &buf).unwrap()
}

fn vote(letter: u8, votes: u32) -> Vec<u8> {
    let mut payload = vec![letter];
    payload.extend_from_slice(&votes.to_be_bytes());
    payload
}

#[test]
fn test_alphabet_votes_accumulate_per_letter() {
    let registry = registry();
    let app = alphabet::components(&registry);
    let mut states: HashMap<PartitionKey, Handle> = HashMap::new();
    let mut output = Vec::new();

    for (letter, votes) in [(b'a', 2), (b'b', 5), (b'a', 3), (b'b', 1)] {
        let record = registry.decode(app.decoder, &vote(letter, votes)).unwrap();
        let key = registry.partition(app.partition, record).unwrap();
        let state = *states
            .entry(key)
            .or_insert_with(|| registry.build_state(app.state_builder).unwrap());
        let result = registry
            .compute_with_state(app.add_votes, record, state)
            .unwrap();
        assert!(result.state_changed);
        output.extend(registry.encode(app.encoder, result.output.unwrap()).unwrap());
    }

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "a => 2\nb => 5\na => 5\nb => 6\n"
    );
    assert_eq!(states.len(), 2);
    assert_eq!(registry.partition_keys_len(app.keys).unwrap(), 26);
    assert_eq!(
        registry.name(Category::StateBuilder, app.state_builder).unwrap(),
        "running vote totals"
    );
}

#[test]
fn test_alphabet_state_migrates() {
    let registry = registry();
    let app = alphabet::components(&registry);
    let state = registry.build_state(app.state_builder).unwrap();
    let record = registry.decode(app.decoder, &vote(b'x', 40)).unwrap();
    registry
        .compute_with_state(app.add_votes, record, state)
        .unwrap();

    let moved = relocate(&registry, Category::State, state);
    assert!(!registry.contains(Category::State, state));
    assert_eq!(
        registry
            .inspect(Category::State, moved, |t: &RunningVoteTotal| *t)
            .unwrap(),
        RunningVoteTotal {
            letter: b'x',
            votes: 40
        }
    );

    // The computation and record relocate too
    let comp = relocate(&registry, Category::StateComputation, app.add_votes);
    let record = relocate(&registry, Category::Data, record);
    let result = registry.compute_with_state(comp, record, moved).unwrap();
    assert_eq!(
        registry
            .inspect(Category::Data, result.output.unwrap(), |v: &LetterAndVotes| *v)
            .unwrap(),
        LetterAndVotes {
            letter: b'x',
            votes: 80
        }
    );
}

#[test]
fn test_celsius_chain() {
    let registry = registry();
    let app = celsius::components(&registry);
    let multiply = registry.build_computation(app.multiply_builder).unwrap();
    let add = registry.build_computation(app.add_builder).unwrap();
    assert_eq!(
        registry.name(Category::Computation, multiply).unwrap(),
        "multiply by 1.8"
    );

    let record = registry
        .decode(app.decoder, &(-40.0f32).to_be_bytes())
        .unwrap();
    let scaled = registry.compute(multiply, record).unwrap().unwrap();
    let converted = registry.compute(add, scaled).unwrap().unwrap();
    assert_eq!(
        registry.encode(app.encoder, converted).unwrap(),
        b"-40.000000\n".to_vec()
    );

    // Built computations are independent objects
    let again = registry.build_computation(app.multiply_builder).unwrap();
    assert_ne!(again, multiply);
}

#[test]
fn test_word_count_partitioned() {
    let registry = registry();
    let app = word_count::components(&registry);
    let mut states: HashMap<PartitionKey, Handle> = HashMap::new();
    let mut lines = Vec::new();

    for input in ["the cat", "The hat, the bat"] {
        let line = registry.decode(app.decoder, input.as_bytes()).unwrap();
        let split = registry.compute_multi(app.split, line).unwrap();
        let list = split.list.unwrap();
        for i in 0..split.count {
            let word = registry.result_item(list, i).unwrap();
            let key = registry.partition(app.partition, word).unwrap();
            let state = *states
                .entry(key)
                .or_insert_with(|| registry.build_state(app.state_builder).unwrap());
            let result = registry
                .compute_with_state(app.count_word, word, state)
                .unwrap();
            let out = registry.encode(app.encoder, result.output.unwrap()).unwrap();
            lines.push(String::from_utf8(out).unwrap());
        }
    }

    assert_eq!(
        lines,
        [
            "the => 1\n",
            "cat => 1\n",
            "the => 2\n",
            "hat => 1\n",
            "the => 3\n",
            "bat => 1\n"
        ]
    );
    let t = states[&PartitionKey::from("t")];
    assert_eq!(
        registry
            .inspect(Category::State, t, |w: &WordTotals| w.get("the"))
            .unwrap(),
        3
    );
}

#[test]
fn test_word_count_line_at_once() {
    let registry = registry();
    let app = word_count::components(&registry);
    let state = registry.build_state(app.state_builder).unwrap();
    let line = registry
        .decode(app.decoder, b"a rose is a rose")
        .unwrap();

    let result = registry
        .compute_with_state_multi(app.count_line, line, state)
        .unwrap();
    assert!(result.state_changed);
    assert_eq!(result.count, 5);
    let last = registry.result_item(result.list.unwrap(), 4).unwrap();
    assert_eq!(
        registry.encode(app.encoder, last).unwrap(),
        b"rose => 2\n".to_vec()
    );

    let moved = relocate(&registry, Category::State, state);
    let totals = registry
        .inspect(Category::State, moved, |w: &WordTotals| w.clone())
        .unwrap();
    assert_eq!(totals.get("a"), 2);
    assert_eq!(totals.len(), 3);
}

fn order_payload(symbol: &[u8; 4], account: u32, price: f64) -> Vec<u8> {
    let mut payload = vec![market_spread::ORDER_MESSAGE, 1];
    payload.extend_from_slice(&account.to_be_bytes());
    payload.extend_from_slice(b"ord001");
    payload.extend_from_slice(symbol);
    payload.extend_from_slice(&100.0f64.to_be_bytes());
    payload.extend_from_slice(&price.to_be_bytes());
    payload.extend_from_slice(b"20170101-00:00:00.000");
    payload
}

fn market_data_payload(symbol: &[u8; 4], bid: f64, offer: f64) -> Vec<u8> {
    let mut payload = vec![market_spread::MARKET_DATA_MESSAGE];
    payload.extend_from_slice(symbol);
    payload.extend_from_slice(b"20170101-00:00:00.000");
    payload.extend_from_slice(&bid.to_be_bytes());
    payload.extend_from_slice(&offer.to_be_bytes());
    payload
}

#[test]
fn test_market_spread_pipelines_share_symbol_state() {
    let registry = registry();
    let symbols = market_spread::load_symbols("AAPL\nIBM\n");
    let app = market_spread::components(&registry, &symbols);
    let mut states: HashMap<PartitionKey, Handle> = HashMap::new();
    let mut state_for = |record: Handle| {
        let key = registry.partition(app.partition, record).unwrap();
        *states
            .entry(key)
            .or_insert_with(|| registry.build_state(app.state_builder).unwrap())
    };

    // Tight IBM market, wide AAPL market
    for payload in [
        market_data_payload(b" IBM", 100.0, 100.02),
        market_data_payload(b"AAPL", 10.0, 11.0),
    ] {
        let md = registry.decode(app.market_data_decoder, &payload).unwrap();
        let state = state_for(md);
        let result = registry
            .compute_with_state(app.update_market_data, md, state)
            .unwrap();
        assert!(result.state_changed);
        assert_eq!(result.output, None);
    }

    let ibm = registry
        .decode(app.order_decoder, &order_payload(b" IBM", 1, 100.01))
        .unwrap();
    let checked = registry
        .compute_with_state(app.check_order, ibm, state_for(ibm))
        .unwrap();
    assert!(!checked.state_changed);
    assert_eq!(checked.output, None);

    let aapl = registry
        .decode(app.order_decoder, &order_payload(b"AAPL", 2, 10.5))
        .unwrap();
    let checked = registry
        .compute_with_state(app.check_order, aapl, state_for(aapl))
        .unwrap();
    assert!(!checked.state_changed);
    let flagged = checked.output.unwrap();
    let result = registry
        .inspect(Category::Data, flagged, |r: &OrderResult| r.clone())
        .unwrap();
    assert_eq!((result.bid, result.offer), (10.0, 11.0));
    assert_eq!(result.order.symbol, "AAPL");
    assert_eq!(result.order.account, 2);

    let out = registry.encode(app.encoder, flagged).unwrap();
    assert_eq!(out.len(), 4 + market_spread::ORDER_RESULT_LEN);
    assert_eq!(out[..4], 56u32.to_be_bytes());
    assert_eq!(out[4..6], 1u16.to_be_bytes());
    assert_eq!(out[6..10], 2u32.to_be_bytes());
    assert_eq!(&out[10..16], b"ord001");
    assert_eq!(&out[16..20], b"AAPL");
    assert_eq!(out[36..44], 10.0f64.to_be_bytes());
    assert_eq!(out[44..52], 11.0f64.to_be_bytes());
    assert_eq!(out[52..60], result.timestamp.to_be_bytes());

    // One state per symbol, shared by both pipelines
    assert_eq!(states.len(), 2);
    assert_eq!(registry.partition_keys_len(app.keys).unwrap(), 2);
    assert_eq!(
        registry.partition_key(app.keys, 1).unwrap(),
        PartitionKey::from(" IBM")
    );
    assert!(states.contains_key(&PartitionKey::from(" IBM")));
    assert_eq!(
        registry.name(Category::StateBuilder, app.state_builder).unwrap(),
        "symbol-data"
    );
}

#[test]
fn test_market_spread_state_migrates() {
    let registry = registry();
    let app = market_spread::components(&registry, &["IBM"]);
    let state = registry.build_state(app.state_builder).unwrap();
    let md = registry
        .decode(app.market_data_decoder, &market_data_payload(b" IBM", 50.0, 50.5))
        .unwrap();
    registry
        .compute_with_state(app.update_market_data, md, state)
        .unwrap();

    let moved = relocate(&registry, Category::State, state);
    assert_eq!(
        registry
            .inspect(Category::State, moved, |s: &SymbolData| s.clone())
            .unwrap(),
        SymbolData {
            last_bid: 50.0,
            last_offer: 50.5,
            should_reject_trades: true,
        }
    );

    let check = relocate(&registry, Category::StateComputation, app.check_order);
    let order = registry
        .decode(app.order_decoder, &order_payload(b" IBM", 9, 50.2))
        .unwrap();
    let order = relocate(&registry, Category::Data, order);
    let result = registry.compute_with_state(check, order, moved).unwrap();
    let flagged = relocate(&registry, Category::Data, result.output.unwrap());
    assert_eq!(
        registry
            .inspect(Category::Data, flagged, |r: &OrderResult| r.order.account)
            .unwrap(),
        9
    );
}
