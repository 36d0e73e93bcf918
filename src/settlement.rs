//! Parameters of the `concludeAndTransferAllAssets` call that pays out a
//! channel.

use std::collections::BTreeMap;

use tracing::warn;

use crate::{
    abiencode::{
        self,
        types::{Address, Signature},
    },
    channel::{ChannelState, FixedPart, PartIdx},
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettlementError {
    #[error("state of turn {0} is not final")]
    NotFinalState(u64),
    #[error(transparent)]
    Encoding(#[from] abiencode::Error),
}

/// Everything the adjudicator needs to conclude a channel from one final
/// state signed by all participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementParams {
    pub largest_turn_num: u64,
    pub fixed_part: FixedPart,
    pub app_data: Vec<u8>,
    /// `abi.encode` of the outcome.
    pub outcome_bytes: Vec<u8>,
    pub num_states: u8,
    /// For every participant the index of the state it signed.
    pub who_signed_what: Vec<u8>,
    /// One per participant, in participant order.
    pub signatures: Vec<Signature>,
}

impl SettlementParams {
    /// Build the parameters from the final `state` and the signatures over
    /// it. Signatures by addresses outside the participant list are ignored,
    /// missing ones are packed as zero signatures.
    pub fn build(
        state: &ChannelState,
        signatures: &BTreeMap<Address, Signature>,
    ) -> Result<Self, SettlementError> {
        if !state.is_final() {
            return Err(SettlementError::NotFinalState(state.turn_num()));
        }

        let participants = state.participants();
        let packed: Vec<Signature> = participants
            .iter()
            .map(|addr| signatures.get(addr).copied().unwrap_or_default())
            .collect();
        for (idx, addr) in participants.iter().enumerate() {
            if packed[idx].is_zero() {
                warn!(participant = idx, address = %addr, "no signature, packing zero signature");
            }
        }

        Ok(SettlementParams {
            largest_turn_num: state.turn_num(),
            fixed_part: state.fixed_part(),
            app_data: state.app_data().to_vec(),
            outcome_bytes: state.outcome().encode()?,
            num_states: 1,
            who_signed_what: vec![0; participants.len()],
            signatures: packed,
        })
    }

    /// Participants packed with a zero signature.
    pub fn missing_signers(&self) -> Vec<PartIdx> {
        self.signatures
            .iter()
            .enumerate()
            .filter(|(_, sig)| sig.is_zero())
            .map(|(idx, _)| idx)
            .collect()
    }
}
