use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{
    signed::SignedState, ChannelState, ContractRef, FixedPart, InitProposal, PartIdx,
    Participant, StateProposal,
};
use crate::{
    abiencode::{
        self,
        types::{Address, Hash, Signature, U256},
    },
    client::{GasParams, KeyedTransactor, SettlementContractClient, TransactOpts},
    config::{ChannelConfig, ProposalPolicy},
    settlement::{SettlementError, SettlementParams},
    sig::{self, Signer},
    wire::DecodeError,
};

const PRE_FUND_TURN: u64 = 0;
const POST_FUND_TURN: u64 = 1;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CreateError {
    #[error("invalid initial state: {0}")]
    InvalidInitialState(&'static str),
    #[error("participant index {0} is out of range")]
    PartIdxOutOfRange(PartIdx),
    #[error(transparent)]
    Encoding(#[from] abiencode::Error),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignError {
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("state does not belong to this channel")]
    WrongChannel,
    #[error("turn {turn} is older than the latest supported turn {latest_supported}")]
    StaleState { turn: u64, latest_supported: u64 },
    #[error("a different state was already signed for turn {0}")]
    ConflictingState(u64),
    #[error("signer {0} is not a participant of the channel")]
    SignatureNotInParticipantList(Address),
    #[error("state already carries every signature")]
    AlreadyComplete,
    #[error(transparent)]
    Signing(#[from] sig::Error),
    #[error(transparent)]
    Encoding(#[from] abiencode::Error),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ProposeError {
    #[error("turn {0} is not signed by every participant yet")]
    PreviousTurnUnsupported(u64),
    #[error("turn number overflow")]
    TurnOverflow,
    #[error("channel already reached its final state")]
    FinalStateReached,
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CheckSignatureError {
    #[error("signer {0} is not a participant of the channel")]
    SignatureNotInParticipantList(Address),
    #[error(transparent)]
    Recovery(#[from] sig::Error),
    #[error(transparent)]
    Encoding(#[from] abiencode::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum FundError<E: std::error::Error + 'static> {
    #[error("pre-fund state is not signed by every participant")]
    IncompleteState,
    #[error("participant {0} is not part of the channel")]
    UnknownParticipant(PartIdx),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("key of {got} cannot deposit for {expected}")]
    KeyMismatch { expected: Address, got: Address },
    #[error("settlement contract: {0}")]
    Contract(E),
}

#[derive(Debug, thiserror::Error)]
pub enum ConcludeError<E: std::error::Error + 'static> {
    #[error("last state is not final")]
    NotFinalState,
    #[error("participant {0} is not part of the channel")]
    UnknownParticipant(PartIdx),
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("key of {got} cannot conclude for {expected}")]
    KeyMismatch { expected: Address, got: Address },
    #[error("channel is already concluded")]
    AlreadyConcluded,
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error("settlement contract: {0}")]
    Contract(E),
}

/// Where a channel is in its lifetime, derived from its signed states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Created,
    PreFundSigning,
    PreFundComplete,
    /// Our deposit was submitted.
    Funding,
    PostFundSigning,
    PostFundComplete,
    Interacting,
    /// The last state is final, the channel can be concluded.
    Finalizing,
    Concluded,
}

/// A channel as seen by participant `part_idx`.
///
/// Holds every state participants signed, keyed by turn. Turn 0 (pre-fund)
/// and turn 1 (post-fund) exist from the start. `last_turn` is the highest
/// turn handed out so far, which can be ahead of `last_state` while drafts are
/// outstanding.
#[derive(Debug)]
pub struct Channel<'cl, C: SettlementContractClient> {
    client: &'cl C,
    part_idx: PartIdx,
    participants: Vec<Participant>,
    contract: ContractRef,
    fixed: FixedPart,
    channel_id: Hash,
    signed: BTreeMap<u64, SignedState>,
    last_state: ChannelState,
    last_turn: u64,
    latest_supported: Option<u64>,
    policy: ProposalPolicy,
    deposit_submitted: bool,
    concluded: bool,
}

impl<'cl, C: SettlementContractClient> Channel<'cl, C> {
    pub fn new(
        client: &'cl C,
        proposal: InitProposal,
        part_idx: PartIdx,
    ) -> Result<Self, CreateError> {
        Self::with_config(client, proposal, part_idx, &ChannelConfig::default())
    }

    /// Create the channel from `proposal`. Only the proposal policy of
    /// `config` is used, the rest is already part of the proposal.
    pub fn with_config(
        client: &'cl C,
        proposal: InitProposal,
        part_idx: PartIdx,
        config: &ChannelConfig,
    ) -> Result<Self, CreateError> {
        let InitProposal {
            participants,
            contract,
            state,
        } = proposal;

        if state.turn_num != PRE_FUND_TURN {
            return Err(CreateError::InvalidInitialState("turn number is not 0"));
        }
        if state.is_final {
            return Err(CreateError::InvalidInitialState("state is final"));
        }
        state
            .check_structure()
            .map_err(CreateError::InvalidInitialState)?;
        if participants.len() != state.participants.len()
            || participants
                .iter()
                .zip(&state.participants)
                .enumerate()
                .any(|(i, (p, addr))| p.index != i || p.address != *addr)
        {
            return Err(CreateError::InvalidInitialState(
                "participants do not match the state",
            ));
        }
        if part_idx >= participants.len() {
            return Err(CreateError::PartIdxOutOfRange(part_idx));
        }

        let fixed = state.fixed_part();
        let channel_id = fixed.channel_id()?;

        let mut post_fund = state.clone();
        post_fund.turn_num = POST_FUND_TURN;

        let mut signed = BTreeMap::new();
        signed.insert(POST_FUND_TURN, SignedState::new(post_fund)?);
        signed.insert(PRE_FUND_TURN, SignedState::new(state.clone())?);

        info!(
            channel = %channel_id,
            part_idx,
            participants = participants.len(),
            "channel created"
        );

        Ok(Channel {
            client,
            part_idx,
            participants,
            contract,
            fixed,
            channel_id,
            signed,
            last_state: state,
            last_turn: PRE_FUND_TURN,
            latest_supported: None,
            policy: config.proposal_policy,
            deposit_submitted: false,
            concluded: false,
        })
    }

    pub fn channel_id(&self) -> Hash {
        self.channel_id
    }

    pub fn part_idx(&self) -> PartIdx {
        self.part_idx
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn contract(&self) -> &ContractRef {
        &self.contract
    }

    pub fn phase(&self) -> Phase {
        let pre_fund = self.seeded(PRE_FUND_TURN);
        let post_fund = self.seeded(POST_FUND_TURN);
        if self.concluded {
            Phase::Concluded
        } else if self.last_state.is_final {
            Phase::Finalizing
        } else if self.last_turn > POST_FUND_TURN
            || self.latest_supported > Some(POST_FUND_TURN)
        {
            Phase::Interacting
        } else if post_fund.is_complete() {
            Phase::PostFundComplete
        } else if post_fund.has_signatures() {
            Phase::PostFundSigning
        } else if self.deposit_submitted {
            Phase::Funding
        } else if pre_fund.is_complete() {
            Phase::PreFundComplete
        } else if pre_fund.has_signatures() {
            Phase::PreFundSigning
        } else {
            Phase::Created
        }
    }

    /// The most recently proposed or signed state, possibly a draft nobody
    /// signed yet.
    pub fn current_state(&self) -> &ChannelState {
        &self.last_state
    }

    pub fn state_is_final(&self) -> bool {
        self.last_state.is_final
    }

    pub fn signed_state(&self, turn: u64) -> Option<&SignedState> {
        self.signed.get(&turn)
    }

    /// Signatures recorded for `turn`, keyed by signer.
    pub fn signatures_for(&self, turn: u64) -> Option<BTreeMap<Address, Signature>> {
        self.signed.get(&turn).map(SignedState::signature_map)
    }

    /// Whether `turn` was signed by every participant.
    pub fn is_supported(&self, turn: u64) -> bool {
        self.signed.get(&turn).map_or(false, SignedState::is_complete)
    }

    pub fn latest_supported_turn(&self) -> Option<u64> {
        self.latest_supported
    }

    pub fn pre_fund_complete(&self) -> bool {
        self.is_supported(PRE_FUND_TURN)
    }

    pub fn post_fund_complete(&self) -> bool {
        self.is_supported(POST_FUND_TURN)
    }

    // Turns 0 and 1 are inserted on creation and never removed.
    fn seeded(&self, turn: u64) -> &SignedState {
        &self.signed[&turn]
    }

    /// Sign the pre-fund state.
    pub fn approve_init(&mut self, key: &[u8]) -> Result<Signature, SignError> {
        let pre_fund = self.seeded(PRE_FUND_TURN);
        if pre_fund.is_complete() {
            return Err(SignError::AlreadyComplete);
        }
        let state = pre_fund.state().clone();
        self.sign(&state, key)
    }

    /// Deposit the locked amount of `participant` into the adjudicator.
    pub fn fund(
        &mut self,
        participant: PartIdx,
        key: &[u8],
        gas: Option<GasParams>,
    ) -> Result<C::Receipt, FundError<C::Error>> {
        if !self.pre_fund_complete() {
            return Err(FundError::IncompleteState);
        }
        let p = self
            .participants
            .get(participant)
            .ok_or(FundError::UnknownParticipant(participant))?;
        let signer = KeyedTransactor::new(self.client.chain_id(), key)
            .map_err(|_| FundError::InvalidPrivateKey)?;
        if signer.address() != p.address {
            return Err(FundError::KeyMismatch {
                expected: p.address,
                got: signer.address(),
            });
        }

        let asset = self.contract.asset;
        let held = self
            .client
            .holdings(asset, self.channel_id)
            .map_err(FundError::Contract)?;
        // Native ETH is sent along with the call, tokens are pulled by the
        // contract.
        let value = if asset == Address::default() {
            p.locked_amount
        } else {
            U256::zero()
        };
        let opts = TransactOpts {
            from: p.address,
            signer,
            value,
            gas,
        };
        let receipt = self
            .client
            .deposit(&opts, asset, self.channel_id, held, p.locked_amount)
            .map_err(FundError::Contract)?;

        info!(
            channel = %self.channel_id,
            participant,
            amount = %p.locked_amount,
            expected_held = %held,
            "deposit submitted"
        );
        self.deposit_submitted = true;
        Ok(receipt)
    }

    /// Sign the post-fund state.
    pub fn approve_funding(&mut self, key: &[u8]) -> Result<Signature, SignError> {
        let post_fund = self.seeded(POST_FUND_TURN);
        if post_fund.is_complete() {
            return Err(SignError::AlreadyComplete);
        }
        let state = post_fund.state().clone();
        let sig = self.sign(&state, key)?;
        self.advance_last_state(state);
        Ok(sig)
    }

    /// Allocate the next turn and return a draft of it.
    ///
    /// The draft starts as a copy of the last state and gets the turn after
    /// the highest one handed out so far. With
    /// [ProposalPolicy::AllowOutstanding] several unsigned drafts can be
    /// outstanding, the one signed last becomes the last state.
    pub fn propose_state(&mut self) -> Result<StateProposal, ProposeError> {
        if self.concluded || self.last_state.is_final {
            return Err(ProposeError::FinalStateReached);
        }
        let turn = self.last_turn;
        if self.policy == ProposalPolicy::RequireSupported && !self.is_supported(turn) {
            return Err(ProposeError::PreviousTurnUnsupported(turn));
        }
        let next = turn.checked_add(1).ok_or(ProposeError::TurnOverflow)?;

        let mut draft = self.last_state.clone();
        draft.turn_num = next;
        let proposal = StateProposal::new(draft)?;
        self.last_state = proposal.state().clone();
        self.last_turn = next;

        debug!(channel = %self.channel_id, turn = next, "state proposed");
        Ok(proposal)
    }

    /// Sign the state of `proposal`.
    pub fn sign_state(
        &mut self,
        proposal: &StateProposal,
        key: &[u8],
    ) -> Result<Signature, SignError> {
        let state = proposal.state();
        let sig = self.sign(state, key)?;
        self.advance_last_state(state.clone());
        Ok(sig)
    }

    /// Settle the final state on chain, sent by `participant`.
    pub fn conclude(
        &mut self,
        participant: PartIdx,
        key: &[u8],
        signatures: &BTreeMap<Address, Signature>,
        gas: Option<GasParams>,
    ) -> Result<C::Receipt, ConcludeError<C::Error>> {
        if self.concluded {
            return Err(ConcludeError::AlreadyConcluded);
        }
        if !self.last_state.is_final {
            return Err(ConcludeError::NotFinalState);
        }
        let p = self
            .participants
            .get(participant)
            .ok_or(ConcludeError::UnknownParticipant(participant))?;
        let signer = KeyedTransactor::new(self.client.chain_id(), key)
            .map_err(|_| ConcludeError::InvalidPrivateKey)?;
        if signer.address() != p.address {
            return Err(ConcludeError::KeyMismatch {
                expected: p.address,
                got: signer.address(),
            });
        }

        let params = SettlementParams::build(&self.last_state, signatures)?;
        let opts = TransactOpts {
            from: p.address,
            signer,
            value: U256::zero(),
            gas,
        };
        let receipt = self
            .client
            .conclude_and_transfer_all_assets(&opts, &params)
            .map_err(ConcludeError::Contract)?;

        info!(
            channel = %self.channel_id,
            turn = params.largest_turn_num,
            participant,
            "channel concluded"
        );
        self.concluded = true;
        Ok(receipt)
    }

    /// Index of the participant that produced `sig` over `state`.
    pub fn check_signature(
        &self,
        sig: Signature,
        state: &ChannelState,
    ) -> Result<PartIdx, CheckSignatureError> {
        let signer = sig::recover_signer(state.hash()?, sig)?;
        self.fixed
            .participants
            .iter()
            .position(|addr| *addr == signer)
            .ok_or(CheckSignatureError::SignatureNotInParticipantList(signer))
    }

    /// Amount the adjudicator holds for this channel.
    pub fn check_holdings(&self) -> Result<U256, C::Error> {
        self.client.holdings(self.contract.asset, self.channel_id)
    }

    fn sign(&mut self, state: &ChannelState, key: &[u8]) -> Result<Signature, SignError> {
        let signer = Signer::from_private_key(key).map_err(|_| SignError::InvalidPrivateKey)?;
        if !state.has_fixed_part(&self.fixed) {
            return Err(SignError::WrongChannel);
        }
        let turn = state.turn_num;
        match self.latest_supported {
            Some(latest_supported) if turn < latest_supported => {
                return Err(SignError::StaleState {
                    turn,
                    latest_supported,
                })
            }
            _ => {}
        }

        let hash = state.hash()?;
        if let Some(existing) = self.signed.get(&turn) {
            if existing.hash() != hash {
                return Err(SignError::ConflictingState(turn));
            }
        }

        let sig = signer.sign_eth(hash)?;
        let addr = sig::recover_signer(hash, sig)?;
        let Some(idx) = state.participant_index(&addr) else {
            return Err(SignError::SignatureNotInParticipantList(addr));
        };

        let entry = self
            .signed
            .entry(turn)
            .or_insert_with(|| SignedState::with_hash(state.clone(), hash));
        entry.add_signature(idx, sig);
        let complete = entry.is_complete();
        if complete && self.latest_supported.map_or(true, |latest| turn > latest) {
            self.latest_supported = Some(turn);
        }

        debug!(
            channel = %self.channel_id,
            turn,
            part_idx = idx,
            complete,
            "state signed"
        );
        Ok(sig)
    }

    // Only called after `sign` succeeded, so the turn is not stale.
    fn advance_last_state(&mut self, state: ChannelState) {
        if state == self.last_state {
            return;
        }
        if state.turn_num < self.last_turn {
            warn!(
                channel = %self.channel_id,
                signed = state.turn_num,
                last_turn = self.last_turn,
                "last state moves back to an earlier turn"
            );
        }
        self.last_turn = self.last_turn.max(state.turn_num);
        self.last_state = state;
    }
}
