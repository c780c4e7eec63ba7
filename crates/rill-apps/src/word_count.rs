//! Word count
//!
//! Lines are split into lowercase words by a multi-output computation; each
//! word is routed by its first letter to a per-letter table of running
//! counts and emitted as `word => count`. Words that do not start with a
//! letter share the `!` partition.
//!
//! [`CountLine`] counts a whole line against one state in a single call, for
//! pipelines that do not partition.

use std::collections::HashMap;

use rill_core::{Category, CodecRegistry, CodecRegistryBuilder, ComponentRegistry, Handle};
use rill_sdk::{
    component, Component, ComponentBox, ComponentError, ComponentResult, ComputationMulti,
    Decoder, Encoder, PartitionFunction, PartitionKey, PartitionKeys, StateBuilder,
    StateComputation, StateComputationMulti, StateOutput,
};
use serde::{Deserialize, Serialize};

/// Partition for words that do not start with `a`-`z`
pub const OTHER_PARTITION: &str = "!";

/// Count emitted for one word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    /// The word
    pub word: String,
    /// Occurrences so far
    pub count: u64,
}
component!(WordCount);

/// Running counts for one partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordTotals {
    counts: HashMap<String, u64>,
}
component!(WordTotals);

impl WordTotals {
    /// Count one occurrence of `word`
    pub fn update(&mut self, word: &str) -> WordCount {
        let count = self.counts.entry(word.to_string()).or_insert(0);
        *count += 1;
        WordCount {
            word: word.to_string(),
            count: *count,
        }
    }

    /// Occurrences of `word` so far
    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if nothing was counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

fn words(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Decodes a UTF-8 line
#[derive(Debug, Default)]
pub struct LineDecoder;

impl Decoder for LineDecoder {
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox> {
        let line = std::str::from_utf8(payload)
            .map_err(|e| ComponentError::Decode(e.to_string()))?;
        Ok(Box::new(line.to_string()))
    }
}
component!(LineDecoder: Decoder);

/// Splits a line into lowercase words
#[derive(Debug, Default)]
pub struct Split;

impl ComputationMulti for Split {
    fn name(&self) -> &str {
        "split into words"
    }

    fn compute_multi(&self, data: &dyn Component) -> ComponentResult<Vec<ComponentBox>> {
        let line = data.expect::<String>()?;
        Ok(words(line).map(|w| Box::new(w) as ComponentBox).collect())
    }
}
component!(Split: ComputationMulti);

/// Partitions words by first letter
#[derive(Debug, Default)]
pub struct FirstLetter;

impl PartitionFunction for FirstLetter {
    fn partition(&self, data: &dyn Component) -> ComponentResult<PartitionKey> {
        let word = data.expect::<String>()?;
        let key = match word.chars().next() {
            Some(c) if c.is_ascii_lowercase() => c.to_string(),
            _ => OTHER_PARTITION.to_string(),
        };
        Ok(PartitionKey::Str(key))
    }
}
component!(FirstLetter: PartitionFunction);

/// Keys `a` to `z` plus the catch-all partition
pub fn letter_keys() -> PartitionKeys {
    let mut keys: Vec<String> = ('a'..='z').map(String::from).collect();
    keys.push(OTHER_PARTITION.to_string());
    PartitionKeys::Str(keys)
}

/// Counts one word
#[derive(Debug, Default)]
pub struct CountWord;

impl StateComputation for CountWord {
    fn name(&self) -> &str {
        "count word"
    }

    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>> {
        let word = data.expect::<String>()?;
        let totals = state.expect_mut::<WordTotals>()?;
        Ok(StateOutput::changed(Some(Box::new(totals.update(word)))))
    }
}
component!(CountWord: StateComputation);

/// Counts every word of a line
#[derive(Debug, Default)]
pub struct CountLine;

impl StateComputationMulti for CountLine {
    fn name(&self) -> &str {
        "count line"
    }

    fn compute_multi(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Vec<ComponentBox>>> {
        let line = data.expect::<String>()?;
        let totals = state.expect_mut::<WordTotals>()?;
        let counts: Vec<ComponentBox> = words(line)
            .map(|w| Box::new(totals.update(&w)) as ComponentBox)
            .collect();
        if counts.is_empty() {
            return Ok(StateOutput::unchanged(counts));
        }
        Ok(StateOutput::changed(counts))
    }
}
component!(CountLine: StateComputationMulti);

/// Builds an empty count table
#[derive(Debug, Default)]
pub struct WordTotalsBuilder;

impl StateBuilder for WordTotalsBuilder {
    fn name(&self) -> &str {
        "word totals"
    }

    fn build(&self) -> ComponentBox {
        Box::new(WordTotals::default())
    }
}
component!(WordTotalsBuilder: StateBuilder);

/// Encodes `word => count\n`
#[derive(Debug, Default)]
pub struct CountEncoder;

impl Encoder for CountEncoder {
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>> {
        let wc = data.expect::<WordCount>()?;
        Ok(format!("{} => {}\n", wc.word, wc.count).into_bytes())
    }
}
component!(CountEncoder: Encoder);

/// Handles of a registered word count pipeline
#[derive(Debug, Clone, Copy)]
pub struct WordCountPipeline {
    /// Source decoder
    pub decoder: Handle,
    /// Line splitter
    pub split: Handle,
    /// Partition function
    pub partition: Handle,
    /// Declared letter keys
    pub keys: Handle,
    /// Per-word state computation
    pub count_word: Handle,
    /// Per-line state computation
    pub count_line: Handle,
    /// State builder
    pub state_builder: Handle,
    /// Sink encoder
    pub encoder: Handle,
}

/// Register the word count components
pub fn components(registry: &ComponentRegistry) -> WordCountPipeline {
    WordCountPipeline {
        decoder: registry.register(Category::Decoder, LineDecoder),
        split: registry.register(Category::Computation, Split),
        partition: registry.register(Category::PartitionFunction, FirstLetter),
        keys: registry.register(Category::PartitionKeyList, letter_keys()),
        count_word: registry.register(Category::StateComputation, CountWord),
        count_line: registry.register(Category::StateComputation, CountLine),
        state_builder: registry.register(Category::StateBuilder, WordTotalsBuilder),
        encoder: registry.register(Category::Encoder, CountEncoder),
    }
}

/// Codec tags
pub mod tags {
    /// Line or word (`String`)
    pub const TEXT: u32 = 0x300;
    /// `WordCount`
    pub const WORD_COUNT: u32 = 0x301;
    /// `WordTotals`
    pub const WORD_TOTALS: u32 = 0x302;
    /// `Split`
    pub const SPLIT: u32 = 0x303;
    /// `FirstLetter`
    pub const FIRST_LETTER: u32 = 0x304;
    /// `CountWord`
    pub const COUNT_WORD: u32 = 0x305;
    /// `CountLine`
    pub const COUNT_LINE: u32 = 0x306;
    /// `WordTotalsBuilder`
    pub const WORD_TOTALS_BUILDER: u32 = 0x307;
    /// `LineDecoder`
    pub const DECODER: u32 = 0x308;
    /// `CountEncoder`
    pub const ENCODER: u32 = 0x309;
}

/// Add the word count codecs to a builder
pub fn register_codecs(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        .register_serde::<String>(Category::Data, tags::TEXT)
        .register_serde::<WordCount>(Category::Data, tags::WORD_COUNT)
        .register_serde::<WordTotals>(Category::State, tags::WORD_TOTALS)
        .register_unit::<Split>(Category::Computation, tags::SPLIT)
        .register_unit::<FirstLetter>(Category::PartitionFunction, tags::FIRST_LETTER)
        .register_unit::<CountWord>(Category::StateComputation, tags::COUNT_WORD)
        .register_unit::<CountLine>(Category::StateComputation, tags::COUNT_LINE)
        .register_unit::<WordTotalsBuilder>(Category::StateBuilder, tags::WORD_TOTALS_BUILDER)
        .register_unit::<LineDecoder>(Category::Decoder, tags::DECODER)
        .register_unit::<CountEncoder>(Category::Encoder, tags::ENCODER)
}

/// Codecs for the word count application alone
pub fn codecs() -> CodecRegistry {
    register_codecs(crate::register_key_lists(CodecRegistry::builder())).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        let got: Vec<_> = words("It's the end -- of the World, isn't it?").collect();
        assert_eq!(got, ["it's", "the", "end", "of", "the", "world", "isn't", "it"]);
    }

    #[test]
    fn test_first_letter() {
        let key = FirstLetter.partition(&String::from("zebra")).unwrap();
        assert_eq!(key, PartitionKey::from("z"));
        let key = FirstLetter.partition(&String::from("42")).unwrap();
        assert_eq!(key, PartitionKey::from(OTHER_PARTITION));
        assert!(letter_keys().contains(&key));
    }

    #[test]
    fn test_count_line() {
        let mut totals = WordTotals::default();
        let line = String::from("to be or not to be");
        let out = CountLine.compute_multi(&line, &mut totals).unwrap();
        assert!(out.state_changed);
        assert_eq!(out.output.len(), 6);
        assert_eq!(totals.get("to"), 2);
        assert_eq!(totals.len(), 4);

        let blank = String::from("  ");
        assert!(!CountLine.compute_multi(&blank, &mut totals).unwrap().state_changed);
    }
}
