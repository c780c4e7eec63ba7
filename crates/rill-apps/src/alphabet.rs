//! Alphabet vote
//!
//! Inbound frames carry a letter and a vote count; votes are summed per
//! letter in one state instance per letter (`a` to `z`), and each update is
//! emitted as `letter => total`.

use rill_core::{Category, CodecRegistry, CodecRegistryBuilder, ComponentRegistry, Handle};
use rill_sdk::{
    component, Component, ComponentBox, ComponentError, ComponentResult, Decoder, Encoder,
    PartitionFunction, PartitionKey, PartitionKeys, StateBuilder, StateComputation, StateOutput,
};
use serde::{Deserialize, Serialize};

/// Votes for one letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LetterAndVotes {
    /// ASCII letter
    pub letter: u8,
    /// Vote count
    pub votes: u64,
}
component!(LetterAndVotes);

/// Running total for one letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunningVoteTotal {
    /// ASCII letter
    pub letter: u8,
    /// Votes so far
    pub votes: u64,
}
component!(RunningVoteTotal);

impl RunningVoteTotal {
    /// Add a batch of votes
    pub fn update(&mut self, votes: &LetterAndVotes) {
        self.letter = votes.letter;
        self.votes += votes.votes;
    }

    /// Current total as a record
    pub fn votes(&self) -> LetterAndVotes {
        LetterAndVotes {
            letter: self.letter,
            votes: self.votes,
        }
    }
}

/// Decodes `[letter: u8][votes: u32 BE]`
#[derive(Debug, Default)]
pub struct VoteDecoder;

impl Decoder for VoteDecoder {
    fn decode(&self, payload: &[u8]) -> ComponentResult<ComponentBox> {
        match payload {
            [letter, a, b, c, d, ..] => Ok(Box::new(LetterAndVotes {
                letter: *letter,
                votes: u32::from_be_bytes([*a, *b, *c, *d]) as u64,
            })),
            _ => Err(ComponentError::Decode(format!(
                "vote payload needs 5 bytes, got {}",
                payload.len()
            ))),
        }
    }
}
component!(VoteDecoder: Decoder);

/// Encodes `letter => total\n`
#[derive(Debug, Default)]
pub struct VoteEncoder;

impl Encoder for VoteEncoder {
    fn encode(&self, data: &dyn Component) -> ComponentResult<Vec<u8>> {
        let lav = data.expect::<LetterAndVotes>()?;
        Ok(format!("{} => {}\n", lav.letter as char, lav.votes).into_bytes())
    }
}
component!(VoteEncoder: Encoder);

/// Adds inbound votes to the letter's running total
#[derive(Debug, Default)]
pub struct AddVotes;

impl StateComputation for AddVotes {
    fn name(&self) -> &str {
        "add votes"
    }

    fn compute(
        &self,
        data: &dyn Component,
        state: &mut dyn Component,
    ) -> ComponentResult<StateOutput<Option<ComponentBox>>> {
        let lav = data.expect::<LetterAndVotes>()?;
        let total = state.expect_mut::<RunningVoteTotal>()?;
        total.update(lav);
        Ok(StateOutput::changed(Some(Box::new(total.votes()))))
    }
}
component!(AddVotes: StateComputation);

/// Builds an empty running total
#[derive(Debug, Default)]
pub struct RunningVoteTotalBuilder;

impl StateBuilder for RunningVoteTotalBuilder {
    fn name(&self) -> &str {
        "running vote totals"
    }

    fn build(&self) -> ComponentBox {
        Box::new(RunningVoteTotal::default())
    }
}
component!(RunningVoteTotalBuilder: StateBuilder);

/// Partitions by letter
#[derive(Debug, Default)]
pub struct LetterPartition;

impl PartitionFunction for LetterPartition {
    fn partition(&self, data: &dyn Component) -> ComponentResult<PartitionKey> {
        Ok(PartitionKey::U64(data.expect::<LetterAndVotes>()?.letter as u64))
    }
}
component!(LetterPartition: PartitionFunction);

/// Keys `a` to `z`
pub fn letter_keys() -> PartitionKeys {
    PartitionKeys::U64((b'a'..=b'z').map(u64::from).collect())
}

/// Handles of a registered alphabet pipeline
#[derive(Debug, Clone, Copy)]
pub struct AlphabetPipeline {
    /// Source decoder
    pub decoder: Handle,
    /// Sink encoder
    pub encoder: Handle,
    /// State computation
    pub add_votes: Handle,
    /// State builder
    pub state_builder: Handle,
    /// Partition function
    pub partition: Handle,
    /// Declared letter keys
    pub keys: Handle,
}

/// Register the alphabet components
pub fn components(registry: &ComponentRegistry) -> AlphabetPipeline {
    AlphabetPipeline {
        decoder: registry.register(Category::Decoder, VoteDecoder),
        encoder: registry.register(Category::Encoder, VoteEncoder),
        add_votes: registry.register(Category::StateComputation, AddVotes),
        state_builder: registry.register(Category::StateBuilder, RunningVoteTotalBuilder),
        partition: registry.register(Category::PartitionFunction, LetterPartition),
        keys: registry.register(Category::PartitionKeyList, letter_keys()),
    }
}

/// Codec tags
pub mod tags {
    /// `LetterAndVotes`
    pub const LETTER_AND_VOTES: u32 = 0x100;
    /// `RunningVoteTotal`
    pub const RUNNING_VOTE_TOTAL: u32 = 0x101;
    /// `AddVotes`
    pub const ADD_VOTES: u32 = 0x102;
    /// `RunningVoteTotalBuilder`
    pub const RUNNING_VOTE_TOTAL_BUILDER: u32 = 0x103;
    /// `LetterPartition`
    pub const LETTER_PARTITION: u32 = 0x104;
    /// `VoteDecoder`
    pub const DECODER: u32 = 0x105;
    /// `VoteEncoder`
    pub const ENCODER: u32 = 0x106;
}

/// Add the alphabet codecs to a builder
pub fn register_codecs(builder: CodecRegistryBuilder) -> CodecRegistryBuilder {
    builder
        .register_serde::<LetterAndVotes>(Category::Data, tags::LETTER_AND_VOTES)
        .register_serde::<RunningVoteTotal>(Category::State, tags::RUNNING_VOTE_TOTAL)
        .register_unit::<AddVotes>(Category::StateComputation, tags::ADD_VOTES)
        .register_unit::<RunningVoteTotalBuilder>(
            Category::StateBuilder,
            tags::RUNNING_VOTE_TOTAL_BUILDER,
        )
        .register_unit::<LetterPartition>(Category::PartitionFunction, tags::LETTER_PARTITION)
        .register_unit::<VoteDecoder>(Category::Decoder, tags::DECODER)
        .register_unit::<VoteEncoder>(Category::Encoder, tags::ENCODER)
}

/// Codecs for the alphabet application alone
pub fn codecs() -> CodecRegistry {
    register_codecs(crate::register_key_lists(CodecRegistry::builder())).build()
}
