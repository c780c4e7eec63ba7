//! Celsius to Fahrenheit
//!
//! Two chained stateless computations (multiply by 1.8, then add 32), each
//! produced by its own computation builder. Records are bare `f32` values
//! read as big-endian IEEE 754.

use rill_core::{Category, CodecRegistry, CodecRegistryBuilder, ComponentRegistry, Handle};
use rill_sdk::{
    component, Component, ComponentBox, ComponentError, ComponentResult, Computation,
    ComputationBuilder, Decoder, Encoder,
};

/// Multiplies a reading by 1.8
#[derive(Debug, Default)]
pub struct Multiply;

impl Computation for Multiply {
    fn name(&self) -> &str {
        "multiply by 1.8"
    }

    fn compute(&self, data: &dyn Component) -> ComponentResult<Option<ComponentBox>> {
        Ok(Some(Box::new(*data.expect::<f32>()? * 1.8)))
    }
}
component!(Multiply: Computation);

/// Builds `Multiply`
#[derive(Debug, Default)]
pub struct MultiplyBuilder;

impl ComputationBuilder for MultiplyBuilder {
    fn build(&self) -> ComponentBox {
        Box::new(Multiply)
    }
}
component!(MultiplyBuilder: ComputationBuilder);

/// Adds 32 to a reading
#[derive(Debug, Default)]
pub struct Add;

impl Computation for Add {
    fn name(&self) -> &str {
        "add 32"
    }

    fn compute(&self, data: &dyn Component) -> ComponentResult<Option<ComponentBox>> {
        Ok(Some(Box::new(*data.expect::<f32>()? + 32.0)))
    }
}
component!(Add: Computation);

/// Builds `Add`
#[derive(Debug, Default)]
pub struct AddBuilder;

impl ComputationBuilder for AddBuilder {
    fn build(&self) -> ComponentBox {
        Box::new(Add)
    }
}
component!(AddBuilder: ComputationBuilder);

fn f32_from_be(payload: &[u8]) -> Result<f32, String> {
    let bytes: [u8; 4] = payload
        .get(..4)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| format!("reading needs 4 bytes, got {}", payload.len()))?;
    Ok(f32::from_be_bytes(bytes))
}

/// Decodes a big-endian `f32`
#[derive(Debug, Default)]
pub struct CelsiusDecoder;

impl Decoder for CelsiusDecoder {
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox> {
        let value = f32_from_be(payload).map_err(ComponentError::Decode)?;
        Ok(Box::new(value))
    }
}
component!(CelsiusDecoder: Decoder);

/// Encodes a reading with six decimals and a newline
#[derive(Debug, Default)]
pub struct FahrenheitEncoder;

impl Encoder for FahrenheitEncoder {
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>> {
        Ok(format!("{:.6}\n", data.expect::<f32>()?).into_bytes())
    }
}
component!(FahrenheitEncoder: Encoder);

/// Handles of a registered Celsius pipeline
#[derive(Debug, Clone, Copy)]
pub struct CelsiusPipeline {
    /// Source decoder
    pub decoder: Handle,
    /// Builder for the first step
    pub multiply_builder: Handle,
    /// Builder for the second step
    pub add_builder: Handle,
    /// Sink encoder
    pub encoder: Handle,
}

/// Register the Celsius components
pub fn components(registry: &ComponentRegistry) -> CelsiusPipeline {
    CelsiusPipeline {
        decoder: registry.register(Category::Decoder, CelsiusDecoder),
        multiply_builder: registry.register(Category::ComputationBuilder, MultiplyBuilder),
        add_builder: registry.register(Category::ComputationBuilder, AddBuilder),
        encoder: registry.register(Category::Encoder, FahrenheitEncoder),
    }
}

/// Codec tags
pub mod tags {
    /// `f32` reading
    pub const READING: u32 = 0x200;
    /// `Multiply`
    pub const MULTIPLY: u32 = 0x201;
    /// `MultiplyBuilder`
    pub const MULTIPLY_BUILDER: u32 = 0x202;
    /// `Add`
    pub const ADD: u32 = 0x203;
    /// `AddBuilder`
    pub const ADD_BUILDER: u32 = 0x204;
    /// `CelsiusDecoder`
    pub const DECODER: u32 = 0x205;
    /// `FahrenheitEncoder`
    pub const ENCODER: u32 = 0x206;
}

/// Add the Celsius codecs to a builder
pub fn register_codecs(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        .register::<f32, String, _, _>(
            Category::Data,
            tags::READING,
            |v: &f32| Ok(v.to_be_bytes().to_vec()),
            f32_from_be,
        )
        .register_unit::<Multiply>(Category::Computation, tags::MULTIPLY)
        .register_unit::<MultiplyBuilder>(Category::ComputationBuilder, tags::MULTIPLY_BUILDER)
        .register_unit::<Add>(Category::Computation, tags::ADD)
        .register_unit::<AddBuilder>(Category::ComputationBuilder, tags::ADD_BUILDER)
        .register_unit::<CelsiusDecoder>(Category::Decoder, tags::DECODER)
        .register_unit::<FahrenheitEncoder>(Category::Encoder, tags::ENCODER)
}

/// Codecs for the Celsius application alone
pub fn codecs() -> CodecRegistry {
    register_codecs(CodecRegistry::builder()).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain() {
        let reading: f32 = 100.0;
        let scaled = Multiply.compute(&reading).unwrap().unwrap();
        let out = Add.compute(&*scaled).unwrap().unwrap();
        let f = *out.downcast_ref::<f32>().unwrap();
        assert!((f - 212.0).abs() < 1e-3);
    }

    #[test]
    fn test_decoder_reads_big_endian() {
        let bytes = 36.6f32.to_be_bytes();
        let record = CelsiusDecoder.decode(&bytes).unwrap();
        assert_eq!(record.downcast_ref::<f32>(), Some(&36.6));
        assert!(CelsiusDecoder.decode(&bytes[..3]).is_err());
    }

    #[test]
    fn test_encoder_format() {
        assert_eq!(FahrenheitEncoder.encode(&32.0f32).unwrap(), b"32.000000\n".to_vec());
    }

    #[test]
    fn test_builders_make_fresh_computations() {
        assert!(MultiplyBuilder.build().is::<Multiply>());
        assert!(AddBuilder.build().is::<Add>());
    }
}
