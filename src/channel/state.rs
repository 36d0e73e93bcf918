//! Rust representations of the on-chain Solidity data types of a channel.

use serde::Serialize;

use crate::abiencode::{
    self, as_bytes,
    types::{Address, Destination, Hash, U256},
};

/// `allocationType` of a plain transfer to the destination.
pub const ALLOCATION_TYPE_SIMPLE: u8 = 0;

/// Default challenge duration in seconds.
pub const DEFAULT_CHALLENGE_DURATION: u64 = 60;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub destination: Destination,
    pub amount: U256,
    pub allocation_type: u8,
    #[serde(with = "as_bytes")]
    pub metadata: Vec<u8>,
}

impl Allocation {
    /// A [ALLOCATION_TYPE_SIMPLE] allocation without metadata.
    pub fn simple(destination: Destination, amount: U256) -> Self {
        Allocation {
            destination,
            amount,
            allocation_type: ALLOCATION_TYPE_SIMPLE,
            metadata: Vec::new(),
        }
    }
}

/// Allocations of one asset, allocation `i` belongs to participant `i`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SingleAssetExit {
    pub asset: Address,
    #[serde(with = "as_bytes")]
    pub metadata: Vec<u8>,
    pub allocations: Vec<Allocation>,
}

impl SingleAssetExit {
    pub fn new(asset: Address) -> Self {
        SingleAssetExit {
            asset,
            metadata: Vec::new(),
            allocations: Vec::new(),
        }
    }
}

/// The `Exit` type of the adjudicator: one entry per asset.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Outcome(pub Vec<SingleAssetExit>);

impl Outcome {
    /// `abi.encode(exit)`, the `outcomeBytes` expected by the adjudicator.
    pub fn encode(&self) -> Result<Vec<u8>, abiencode::Error> {
        abiencode::to_vec(self)
    }

    /// `keccak256(outcomeBytes)`, what the adjudicator stores per channel.
    pub fn hash(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_hash(self)
    }

    pub fn exits(&self) -> &[SingleAssetExit] {
        &self.0
    }
}

/// The part of a state that never changes over the lifetime of a channel.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FixedPart {
    pub chain_id: U256,
    pub participants: Vec<Address>,
    pub channel_nonce: U256,
    pub app_definition: Address,
    pub challenge_duration: u64,
}

impl FixedPart {
    /// `keccak256(abi.encode(chainId, participants, channelNonce,
    /// appDefinition, challengeDuration))`
    pub fn channel_id(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_fnargs_hash(self)
    }
}

// What participants sign, in the argument order of the adjudicator.
#[derive(Serialize)]
struct StateHashArgs<'a> {
    channel_id: Hash,
    #[serde(with = "as_bytes")]
    app_data: &'a [u8],
    outcome: &'a Outcome,
    turn_num: u64,
    is_final: bool,
}

/// Complete state of a channel at one turn.
///
/// Fields can only be changed inside the crate, either by the channel or
/// through a [StateProposal][super::StateProposal].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelState {
    pub(crate) chain_id: U256,
    pub(crate) participants: Vec<Address>,
    pub(crate) channel_nonce: U256,
    pub(crate) app_definition: Address,
    pub(crate) challenge_duration: u64,
    pub(crate) app_data: Vec<u8>,
    pub(crate) outcome: Outcome,
    pub(crate) turn_num: u64,
    pub(crate) is_final: bool,
}

impl ChannelState {
    pub fn new(
        fixed: FixedPart,
        app_data: Vec<u8>,
        outcome: Outcome,
        turn_num: u64,
        is_final: bool,
    ) -> Self {
        ChannelState {
            chain_id: fixed.chain_id,
            participants: fixed.participants,
            channel_nonce: fixed.channel_nonce,
            app_definition: fixed.app_definition,
            challenge_duration: fixed.challenge_duration,
            app_data,
            outcome,
            turn_num,
            is_final,
        }
    }

    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }
    pub fn participants(&self) -> &[Address] {
        &self.participants
    }
    pub fn channel_nonce(&self) -> U256 {
        self.channel_nonce
    }
    pub fn app_definition(&self) -> Address {
        self.app_definition
    }
    pub fn challenge_duration(&self) -> u64 {
        self.challenge_duration
    }
    pub fn app_data(&self) -> &[u8] {
        &self.app_data
    }
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }
    pub fn turn_num(&self) -> u64 {
        self.turn_num
    }
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn fixed_part(&self) -> FixedPart {
        FixedPart {
            chain_id: self.chain_id,
            participants: self.participants.clone(),
            channel_nonce: self.channel_nonce,
            app_definition: self.app_definition,
            challenge_duration: self.challenge_duration,
        }
    }

    /// Whether `self` belongs to the channel described by `fixed`.
    pub fn has_fixed_part(&self, fixed: &FixedPart) -> bool {
        self.chain_id == fixed.chain_id
            && self.participants == fixed.participants
            && self.channel_nonce == fixed.channel_nonce
            && self.app_definition == fixed.app_definition
            && self.challenge_duration == fixed.challenge_duration
    }

    pub fn channel_id(&self) -> Result<Hash, abiencode::Error> {
        self.fixed_part().channel_id()
    }

    /// The hash participants sign.
    pub fn hash(&self) -> Result<Hash, abiencode::Error> {
        abiencode::to_fnargs_hash(&StateHashArgs {
            channel_id: self.channel_id()?,
            app_data: &self.app_data,
            outcome: &self.outcome,
            turn_num: self.turn_num,
            is_final: self.is_final,
        })
    }

    /// Index of `addr` in the participant list.
    pub fn participant_index(&self, addr: &Address) -> Option<usize> {
        self.participants.iter().position(|a| a == addr)
    }

    /// Structural checks every state of a channel has to pass.
    pub(crate) fn check_structure(&self) -> Result<(), &'static str> {
        if self.participants.is_empty() {
            return Err("no participants");
        }
        for (i, addr) in self.participants.iter().enumerate() {
            if self.participants[..i].contains(addr) {
                return Err("duplicate participant");
            }
        }
        if self.outcome.0.is_empty() {
            return Err("outcome has no asset exit");
        }
        if self
            .outcome
            .0
            .iter()
            .any(|exit| exit.allocations.len() != self.participants.len())
        {
            return Err("allocations do not match participants");
        }
        Ok(())
    }
}
