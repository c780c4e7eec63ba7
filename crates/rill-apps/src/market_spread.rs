//! Market spread
//!
//! Two pipelines share one `symbol-data` state per ticker symbol. Market
//! data updates the last bid and offer and flags the symbol when the spread
//! is too wide; orders are checked against that state and every order on a
//! flagged symbol is emitted as an [`OrderResult`].
//!
//! Symbols are fixed-width: four bytes, right-justified with spaces. The
//! partition key is that four-byte string, so a symbol routes the same way
//! from either pipeline.

use std::time::{SystemTime, UNIX_EPOCH};

use rill_core::{Category, CodecRegistry, CodecRegistryBuilder, ComponentRegistry, Handle};
use rill_sdk::{
    component, Component, ComponentBox, ComponentError, ComponentResult, Decoder, Encoder,
    PartitionFunction, PartitionKey, PartitionKeys, StateBuilder, StateComputation, StateOutput,
};
use serde::{Deserialize, Serialize};

/// Width of a symbol on the wire and in partition keys
pub const SYMBOL_WIDTH: usize = 4;

/// Message type byte of an order
pub const ORDER_MESSAGE: u8 = 1;

/// Message type byte of a market data update
pub const MARKET_DATA_MESSAGE: u8 = 2;

/// Spread at or above which trading on a symbol is rejected, both as an
/// absolute price difference and relative to the mid price
pub const MAX_SPREAD: f64 = 0.05;

/// Size of an encoded order result, excluding its length prefix
pub const ORDER_RESULT_LEN: usize = 56;

/// Pad or cut a symbol to its fixed width
pub fn fixed_symbol(symbol: &str) -> String {
    format!("{symbol:>width$.width$}", width = SYMBOL_WIDTH)
}

/// Parse a symbol list, one per line; blank lines are skipped
pub fn load_symbols(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Declared keys for a list of symbols
pub fn symbol_keys<S: AsRef<str>>(symbols: &[S]) -> PartitionKeys {
    PartitionKeys::Str(symbols.iter().map(|s| fixed_symbol(s.as_ref())).collect())
}

// ============================================================================
// Records
// ============================================================================

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl Side {
    fn from_wire(byte: u8) -> ComponentResult<Self> {
        match byte {
            1 => Ok(Side::Buy),
            2 => Ok(Side::Sell),
            other => Err(ComponentError::Decode(format!("unknown order side {other}"))),
        }
    }

    fn to_wire(self) -> u16 {
        match self {
            Side::Buy => 1,
            Side::Sell => 2,
        }
    }
}

/// An inbound order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Buy or sell
    pub side: Side,
    /// Client account
    pub account: u32,
    /// Six-character order id
    pub order_id: String,
    /// Ticker symbol, without padding
    pub symbol: String,
    /// Quantity
    pub quantity: f64,
    /// Limit price
    pub price: f64,
    /// Transaction time as sent
    pub transact_time: String,
}
component!(Order);

/// A market data update for one symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketData {
    /// Ticker symbol, without padding
    pub symbol: String,
    /// Transaction time as sent
    pub transact_time: String,
    /// Best bid
    pub bid: f64,
    /// Best offer
    pub offer: f64,
    /// Midpoint of bid and offer
    pub mid: f64,
}
component!(MarketData);

/// An order placed while its symbol was flagged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// The order
    pub order: Order,
    /// Last bid seen for the symbol
    pub bid: f64,
    /// Last offer seen for the symbol
    pub offer: f64,
    /// Microseconds since the Unix epoch when the order was checked
    pub timestamp: u64,
}
component!(OrderResult);

/// Per-symbol state shared by both pipelines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolData {
    /// Last bid
    pub last_bid: f64,
    /// Last offer
    pub last_offer: f64,
    /// Whether orders on this symbol are reported
    pub should_reject_trades: bool,
}
component!(SymbolData);

impl Default for SymbolData {
    /// No market data yet, so every order is reported
    fn default() -> Self {
        Self {
            last_bid: 0.0,
            last_offer: 0.0,
            should_reject_trades: true,
        }
    }
}

impl SymbolData {
    /// Record a market data update and re-evaluate the spread
    pub fn update(&mut self, md: &MarketData) {
        let spread = md.offer - md.bid;
        self.last_bid = md.bid;
        self.last_offer = md.offer;
        self.should_reject_trades = spread >= MAX_SPREAD || spread / md.mid >= MAX_SPREAD;
    }
}

// ============================================================================
// Wire helpers
// ============================================================================

fn field<const N: usize>(payload: &[u8], at: usize) -> ComponentResult<[u8; N]> {
    payload
        .get(at..at + N)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| {
            ComponentError::Decode(format!(
                "message needs {} bytes, got {}",
                at + N,
                payload.len()
            ))
        })
}

fn text<const N: usize>(payload: &[u8], at: usize) -> ComponentResult<String> {
    let bytes = field::<N>(payload, at)?;
    let s = std::str::from_utf8(&bytes).map_err(|e| ComponentError::Decode(e.to_string()))?;
    Ok(s.trim_matches(|c: char| c == ' ' || c == '\0').to_string())
}

fn f64_at(payload: &[u8], at: usize) -> ComponentResult<f64> {
    Ok(f64::from_be_bytes(field::<8>(payload, at)?))
}

fn message_type(payload: &[u8], expected: u8) -> ComponentResult<()> {
    let [kind] = field::<1>(payload, 0)?;
    if kind != expected {
        return Err(ComponentError::Decode(format!(
            "wrong message type {kind}, expected {expected}"
        )));
    }
    Ok(())
}

// ============================================================================
// Components
// ============================================================================

/// Decodes an order.
///
/// Layout: `[type=1][side: u8][account: u32 BE][order id: 6][symbol: 4]
/// [quantity: f64 BE][price: f64 BE][transact time: 21]`.
#[derive(Debug, Default)]
pub struct OrderDecoder;

impl Decoder for OrderDecoder {
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox> {
        message_type(payload, ORDER_MESSAGE)?;
        let [side] = field::<1>(payload, 1)?;
        Ok(Box::new(Order {
            side: Side::from_wire(side)?,
            account: u32::from_be_bytes(field::<4>(payload, 2)?),
            order_id: text::<6>(payload, 6)?,
            symbol: text::<SYMBOL_WIDTH>(payload, 12)?,
            quantity: f64_at(payload, 16)?,
            price: f64_at(payload, 24)?,
            transact_time: text::<21>(payload, 32)?,
        }))
    }
}
component!(OrderDecoder: Decoder);

/// Decodes a market data update.
///
/// Layout: `[type=2][symbol: 4][transact time: 21][bid: f64 BE][offer: f64 BE]`.
#[derive(Debug, Default)]
pub struct MarketDataDecoder;

impl Decoder for MarketDataDecoder {
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox> {
        message_type(payload, MARKET_DATA_MESSAGE)?;
        let bid = f64_at(payload, 26)?;
        let offer = f64_at(payload, 34)?;
        Ok(Box::new(MarketData {
            symbol: text::<SYMBOL_WIDTH>(payload, 1)?,
            transact_time: text::<21>(payload, 5)?,
            bid,
            offer,
            mid: (bid + offer) / 2.0,
        }))
    }
}
component!(MarketDataDecoder: Decoder);

/// Routes orders and market data by fixed-width symbol
#[derive(Debug, Default)]
pub struct SymbolPartition;

impl PartitionFunction for SymbolPartition {
    fn partition(&self, data: &dyn Component) -> ComponentResult<PartitionKey> {
        let symbol = if let Some(order) = data.downcast_ref::<Order>() {
            &order.symbol
        } else {
            &data.expect::<MarketData>()?.symbol
        };
        Ok(PartitionKey::Str(fixed_symbol(symbol)))
    }
}
component!(SymbolPartition: PartitionFunction);

/// Reports orders on flagged symbols; never changes the state
#[derive(Debug, Default)]
pub struct CheckOrder;

impl StateComputation for CheckOrder {
    fn name(&self) -> &str {
        "check order"
    }

    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>> {
        let order = data.expect::<Order>()?;
        let symbol = state.expect_mut::<SymbolData>()?;
        if !symbol.should_reject_trades {
            return Ok(StateOutput::unchanged(None));
        }
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0);
        Ok(StateOutput::unchanged(Some(Box::new(OrderResult {
            order: order.clone(),
            bid: symbol.last_bid,
            offer: symbol.last_offer,
            timestamp,
        }))))
    }
}
component!(CheckOrder: StateComputation);

/// Folds market data into the symbol state; emits nothing
#[derive(Debug, Default)]
pub struct UpdateMarketData;

impl StateComputation for UpdateMarketData {
    fn name(&self) -> &str {
        "update market data"
    }

    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>> {
        let md = data.expect::<MarketData>()?;
        state.expect_mut::<SymbolData>()?.update(md);
        Ok(StateOutput::changed(None))
    }
}
component!(UpdateMarketData: StateComputation);

/// Builds fresh `symbol-data` state
#[derive(Debug, Default)]
pub struct SymbolDataBuilder;

impl StateBuilder for SymbolDataBuilder {
    fn name(&self) -> &str {
        "symbol-data"
    }

    fn build(&self) -> ComponentBox {
        Box::new(SymbolData::default())
    }
}
component!(SymbolDataBuilder: StateBuilder);

/// Encodes an order result as a length-prefixed 56-byte record.
///
/// Body: `[side: u16][account: u32][order id: 6][symbol: 4][quantity: f64]
/// [price: f64][bid: f64][offer: f64][timestamp: u64]`, all big-endian. Short
/// order ids are zero-filled.
#[derive(Debug, Default)]
pub struct OrderResultEncoder;

impl Encoder for OrderResultEncoder {
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>> {
        let result = data.expect::<OrderResult>()?;
        let order = &result.order;

        let mut out = Vec::with_capacity(4 + ORDER_RESULT_LEN);
        out.extend_from_slice(&(ORDER_RESULT_LEN as u32).to_be_bytes());
        out.extend_from_slice(&order.side.to_wire().to_be_bytes());
        out.extend_from_slice(&order.account.to_be_bytes());
        let mut order_id = [0u8; 6];
        let id = order.order_id.as_bytes();
        let n = id.len().min(order_id.len());
        order_id[..n].copy_from_slice(&id[..n]);
        out.extend_from_slice(&order_id);
        out.extend_from_slice(fixed_symbol(&order.symbol).as_bytes());
        for value in [order.quantity, order.price, result.bid, result.offer] {
            out.extend_from_slice(&value.to_be_bytes());
        }
        out.extend_from_slice(&result.timestamp.to_be_bytes());

        if out.len() != 4 + ORDER_RESULT_LEN {
            return Err(ComponentError::Encode(format!(
                "symbol {:?} is not {SYMBOL_WIDTH} bytes wide",
                order.symbol
            )));
        }
        Ok(out)
    }
}
component!(OrderResultEncoder: Encoder);

// ============================================================================
// Registration
// ============================================================================

/// Handles of a registered market spread application
#[derive(Debug, Clone, Copy)]
pub struct MarketSpreadPipeline {
    /// Orders source decoder
    pub order_decoder: Handle,
    /// Market data source decoder
    pub market_data_decoder: Handle,
    /// Order check against symbol state
    pub check_order: Handle,
    /// Market data update of symbol state
    pub update_market_data: Handle,
    /// Builder of the shared `symbol-data` state
    pub state_builder: Handle,
    /// Partition function used by both pipelines
    pub partition: Handle,
    /// Declared symbol keys
    pub keys: Handle,
    /// Orders sink encoder
    pub encoder: Handle,
}

/// Register the market spread components for the given symbols
pub fn components<S: AsRef<str>>(
    registry: &ComponentRegistry,
    symbols: &[S],
) -> MarketSpreadPipeline {
    MarketSpreadPipeline {
        order_decoder: registry.register(Category::Decoder, OrderDecoder),
        market_data_decoder: registry.register(Category::Decoder, MarketDataDecoder),
        check_order: registry.register(Category::StateComputation, CheckOrder),
        update_market_data: registry.register(Category::StateComputation, UpdateMarketData),
        state_builder: registry.register(Category::StateBuilder, SymbolDataBuilder),
        partition: registry.register(Category::PartitionFunction, SymbolPartition),
        keys: registry.register(Category::PartitionKeyList, symbol_keys(symbols)),
        encoder: registry.register(Category::Encoder, OrderResultEncoder),
    }
}

/// Codec tags
pub mod tags {
    /// `Order`
    pub const ORDER: u32 = 0x400;
    /// `MarketData`
    pub const MARKET_DATA: u32 = 0x401;
    /// `OrderResult`
    pub const ORDER_RESULT: u32 = 0x402;
    /// `SymbolData`
    pub const SYMBOL_DATA: u32 = 0x403;
    /// `SymbolPartition`
    pub const SYMBOL_PARTITION: u32 = 0x404;
    /// `OrderDecoder`
    pub const ORDER_DECODER: u32 = 0x405;
    /// `MarketDataDecoder`
    pub const MARKET_DATA_DECODER: u32 = 0x406;
    /// `CheckOrder`
    pub const CHECK_ORDER: u32 = 0x407;
    /// `UpdateMarketData`
    pub const UPDATE_MARKET_DATA: u32 = 0x408;
    /// `SymbolDataBuilder`
    pub const SYMBOL_DATA_BUILDER: u32 = 0x409;
    /// `OrderResultEncoder`
    pub const ENCODER: u32 = 0x40a;
}

/// Add the market spread codecs to a builder
pub fn register_codecs(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        .register_serde::<Order>(Category::Data, tags::ORDER)
        .register_serde::<MarketData>(Category::Data, tags::MARKET_DATA)
        .register_serde::<OrderResult>(Category::Data, tags::ORDER_RESULT)
        .register_serde::<SymbolData>(Category::State, tags::SYMBOL_DATA)
        .register_unit::<SymbolPartition>(Category::PartitionFunction, tags::SYMBOL_PARTITION)
        .register_unit::<OrderDecoder>(Category::Decoder, tags::ORDER_DECODER)
        .register_unit::<MarketDataDecoder>(Category::Decoder, tags::MARKET_DATA_DECODER)
        .register_unit::<CheckOrder>(Category::StateComputation, tags::CHECK_ORDER)
        .register_unit::<UpdateMarketData>(Category::StateComputation, tags::UPDATE_MARKET_DATA)
        .register_unit::<SymbolDataBuilder>(Category::StateBuilder, tags::SYMBOL_DATA_BUILDER)
        .register_unit::<OrderResultEncoder>(Category::Encoder, tags::ENCODER)
}

/// Codecs for the market spread application alone
pub fn codecs() -> CodecRegistry {
    register_codecs(crate::register_key_lists(CodecRegistry::builder())).build()
}
