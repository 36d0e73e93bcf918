use rand::Rng;

use super::{
    state::{Allocation, ChannelState, FixedPart, Outcome, SingleAssetExit},
    PartIdx, Participant,
};
use crate::{
    abiencode::{
        self,
        types::{Address, Hash, U256},
    },
    config::ChannelConfig,
};

/// Addresses of the on-chain contracts a channel settles on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractRef {
    pub adjudicator: Address,
    /// Asset held by the adjudicator, the zero address for ETH.
    pub asset: Address,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProposalError {
    #[error("participant {0} is already part of the proposal")]
    DuplicateParticipant(Address),
    #[error("participant must have index {expected}, got {got}")]
    UnexpectedIndex { expected: PartIdx, got: PartIdx },
}

/// Everything needed to create a channel: the participants and the pre-fund
/// state built from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitProposal {
    pub(crate) participants: Vec<Participant>,
    pub(crate) contract: ContractRef,
    pub(crate) state: ChannelState,
}

impl InitProposal {
    /// Start a proposal with `initiator` as participant 0.
    pub fn new(
        chain_id: U256,
        contract: ContractRef,
        initiator: Participant,
        channel_nonce: U256,
        config: &ChannelConfig,
    ) -> Result<Self, ProposalError> {
        let fixed = FixedPart {
            chain_id,
            participants: Vec::new(),
            channel_nonce,
            // Ledger channels do not run an app.
            app_definition: Address::default(),
            challenge_duration: config.challenge_duration,
        };
        let outcome = Outcome(vec![SingleAssetExit::new(contract.asset)]);

        let mut proposal = InitProposal {
            participants: Vec::new(),
            contract,
            state: ChannelState::new(fixed, Vec::new(), outcome, 0, false),
        };
        proposal.add_participant(initiator)?;
        Ok(proposal)
    }

    /// A fresh 256 bit channel nonce.
    pub fn random_nonce<R: Rng + ?Sized>(rng: &mut R) -> U256 {
        rng.gen()
    }

    /// Append `p` to the participants and give it the next allocation.
    ///
    /// The participant must carry the index it will have in the channel.
    pub fn add_participant(&mut self, p: Participant) -> Result<(), ProposalError> {
        if self.participants.iter().any(|q| q.address == p.address) {
            return Err(ProposalError::DuplicateParticipant(p.address));
        }
        if p.index != self.participants.len() {
            return Err(ProposalError::UnexpectedIndex {
                expected: self.participants.len(),
                got: p.index,
            });
        }

        self.state.participants.push(p.address);
        for exit in self.state.outcome.0.iter_mut() {
            exit.allocations
                .push(Allocation::simple(p.destination, p.locked_amount));
        }
        self.participants.push(p);
        Ok(())
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    /// The pre-fund state (turn 0).
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn channel_nonce(&self) -> U256 {
        self.state.channel_nonce
    }

    pub fn channel_id(&self) -> Result<Hash, abiencode::Error> {
        self.state.channel_id()
    }
}
