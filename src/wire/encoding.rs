use std::collections::BTreeMap;

use prost::Message;

use super::{proto, ConversionError, DecodeError};
use crate::{
    abiencode::types::{Address, Destination, U256},
    channel::{
        Allocation, ChannelState, ContractRef, InitProposal, Outcome, PartIdx, Participant,
        SingleAssetExit, StateProposal,
    },
    ledger::{AssetCode, LiabilityLedger, PairLiabilities},
};

fn to_array<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], ConversionError> {
    bytes
        .try_into()
        .map_err(|_| ConversionError::ByteLengthMismatch {
            field,
            expected: N,
            got: bytes.len(),
        })
}

fn to_address(field: &'static str, bytes: &[u8]) -> Result<Address, ConversionError> {
    Ok(Address(to_array(field, bytes)?))
}

fn to_u256(field: &'static str, bytes: &[u8]) -> Result<U256, ConversionError> {
    // from_big_endian panics on more than 32 bytes.
    if bytes.len() > 32 {
        return Err(ConversionError::ByteLengthMismatch {
            field,
            expected: 32,
            got: bytes.len(),
        });
    }
    Ok(U256::from_big_endian(bytes))
}

fn to_index(v: u64) -> Result<PartIdx, ConversionError> {
    PartIdx::try_from(v).map_err(|_| ConversionError::IndexOutOfRange(v))
}

fn from_amounts(map: &BTreeMap<AssetCode, U256>) -> Vec<proto::AssetAmount> {
    map.iter()
        .map(|(asset, amount)| proto::AssetAmount {
            asset: asset.as_str().to_owned(),
            amount: amount.to_bytes32().to_vec(),
        })
        .collect()
}

fn to_amounts(
    amounts: Vec<proto::AssetAmount>,
) -> Result<BTreeMap<AssetCode, U256>, ConversionError> {
    let mut map = BTreeMap::new();
    for a in amounts {
        let amount = to_u256("amount", &a.amount)?;
        // Zero balances are never stored.
        if amount.is_zero() {
            continue;
        }
        if map.insert(AssetCode::from(a.asset.clone()), amount).is_some() {
            return Err(ConversionError::DuplicateAsset(a.asset));
        }
    }
    Ok(map)
}

impl From<&LiabilityLedger> for proto::Ledger {
    fn from(value: &LiabilityLedger) -> Self {
        proto::Ledger {
            liabilities: value
                .pairs
                .iter()
                .map(|(&(from, to), pair)| proto::Liability {
                    from: from as u64,
                    to: to as u64,
                    pending: from_amounts(&pair.pending),
                    executed: from_amounts(&pair.executed),
                })
                .collect(),
        }
    }
}

impl TryFrom<proto::Ledger> for LiabilityLedger {
    type Error = ConversionError;

    fn try_from(value: proto::Ledger) -> Result<Self, Self::Error> {
        let mut ledger = LiabilityLedger::new();
        for l in value.liabilities {
            let key = (to_index(l.from)?, to_index(l.to)?);
            let pair = PairLiabilities {
                pending: to_amounts(l.pending)?,
                executed: to_amounts(l.executed)?,
            };
            if ledger.pairs.insert(key, pair).is_some() {
                return Err(ConversionError::DuplicateLiability {
                    from: key.0,
                    to: key.1,
                });
            }
        }
        Ok(ledger)
    }
}

impl From<&Allocation> for proto::Allocation {
    fn from(value: &Allocation) -> Self {
        proto::Allocation {
            destination: value.destination.0.to_vec(),
            amount: value.amount.to_bytes32().to_vec(),
            allocation_type: value.allocation_type.into(),
            metadata: value.metadata.clone(),
        }
    }
}

impl TryFrom<proto::Allocation> for Allocation {
    type Error = ConversionError;

    fn try_from(value: proto::Allocation) -> Result<Self, Self::Error> {
        Ok(Allocation {
            destination: Destination(to_array("destination", &value.destination)?),
            amount: to_u256("amount", &value.amount)?,
            allocation_type: u8::try_from(value.allocation_type)
                .map_err(|_| ConversionError::AllocationTypeOutOfRange(value.allocation_type))?,
            metadata: value.metadata,
        })
    }
}

impl From<&SingleAssetExit> for proto::SingleAssetExit {
    fn from(value: &SingleAssetExit) -> Self {
        proto::SingleAssetExit {
            asset: value.asset.0.to_vec(),
            metadata: value.metadata.clone(),
            allocations: value.allocations.iter().map(Into::into).collect(),
        }
    }
}

impl TryFrom<proto::SingleAssetExit> for SingleAssetExit {
    type Error = ConversionError;

    fn try_from(value: proto::SingleAssetExit) -> Result<Self, Self::Error> {
        Ok(SingleAssetExit {
            asset: to_address("asset", &value.asset)?,
            metadata: value.metadata,
            allocations: value
                .allocations
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl From<&ChannelState> for proto::State {
    fn from(value: &ChannelState) -> Self {
        proto::State {
            chain_id: value.chain_id.to_bytes32().to_vec(),
            participants: value.participants.iter().map(|a| a.0.to_vec()).collect(),
            channel_nonce: value.channel_nonce.to_bytes32().to_vec(),
            app_definition: value.app_definition.0.to_vec(),
            challenge_duration: value.challenge_duration,
            app_data: value.app_data.clone(),
            outcome: value.outcome.0.iter().map(Into::into).collect(),
            turn_num: value.turn_num,
            is_final: value.is_final,
        }
    }
}

impl TryFrom<proto::State> for ChannelState {
    type Error = ConversionError;

    fn try_from(value: proto::State) -> Result<Self, Self::Error> {
        Ok(ChannelState {
            chain_id: to_u256("chain_id", &value.chain_id)?,
            participants: value
                .participants
                .iter()
                .map(|a| to_address("participants", a))
                .collect::<Result<_, _>>()?,
            channel_nonce: to_u256("channel_nonce", &value.channel_nonce)?,
            app_definition: to_address("app_definition", &value.app_definition)?,
            challenge_duration: value.challenge_duration,
            app_data: value.app_data,
            outcome: Outcome(
                value
                    .outcome
                    .into_iter()
                    .map(TryInto::try_into)
                    .collect::<Result<_, _>>()?,
            ),
            turn_num: value.turn_num,
            is_final: value.is_final,
        })
    }
}

impl From<&Participant> for proto::Participant {
    fn from(value: &Participant) -> Self {
        proto::Participant {
            address: value.address.0.to_vec(),
            destination: value.destination.0.to_vec(),
            locked_amount: value.locked_amount.to_bytes32().to_vec(),
            index: value.index as u64,
        }
    }
}

impl TryFrom<proto::Participant> for Participant {
    type Error = ConversionError;

    fn try_from(value: proto::Participant) -> Result<Self, Self::Error> {
        Ok(Participant {
            address: to_address("address", &value.address)?,
            destination: Destination(to_array("destination", &value.destination)?),
            locked_amount: to_u256("locked_amount", &value.locked_amount)?,
            index: to_index(value.index)?,
        })
    }
}

impl From<&ContractRef> for proto::Contract {
    fn from(value: &ContractRef) -> Self {
        proto::Contract {
            adjudicator: value.adjudicator.0.to_vec(),
            asset: value.asset.0.to_vec(),
        }
    }
}

impl TryFrom<proto::Contract> for ContractRef {
    type Error = ConversionError;

    fn try_from(value: proto::Contract) -> Result<Self, Self::Error> {
        Ok(ContractRef {
            adjudicator: to_address("adjudicator", &value.adjudicator)?,
            asset: to_address("asset", &value.asset)?,
        })
    }
}

impl From<&InitProposal> for proto::InitProposal {
    fn from(value: &InitProposal) -> Self {
        proto::InitProposal {
            participants: value.participants.iter().map(Into::into).collect(),
            contract: Some((&value.contract).into()),
            state: Some((&value.state).into()),
        }
    }
}

impl TryFrom<proto::InitProposal> for InitProposal {
    type Error = ConversionError;

    fn try_from(value: proto::InitProposal) -> Result<Self, Self::Error> {
        let participants: Vec<Participant> = value
            .participants
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;
        let state: ChannelState = value
            .state
            .ok_or(ConversionError::ExpectedSome("state"))?
            .try_into()?;

        let addresses_match = participants.len() == state.participants.len()
            && participants
                .iter()
                .enumerate()
                .all(|(i, p)| p.index == i && state.participants[i] == p.address);
        if !addresses_match {
            return Err(ConversionError::ParticipantMismatch);
        }

        Ok(InitProposal {
            participants,
            contract: value
                .contract
                .ok_or(ConversionError::ExpectedSome("contract"))?
                .try_into()?,
            state,
        })
    }
}

fn decode_non_empty<M: Message + Default>(buf: &[u8]) -> Result<M, DecodeError> {
    if buf.is_empty() {
        return Err(DecodeError::EmptyByteArray);
    }
    Ok(M::decode(buf)?)
}

impl LiabilityLedger {
    /// Deterministic encoding, the empty ledger encodes to no bytes.
    pub fn encode(&self) -> Vec<u8> {
        proto::Ledger::from(self).encode_to_vec()
    }

    /// Inverse of [LiabilityLedger::encode], no bytes decode to the empty
    /// ledger.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Ok(proto::Ledger::decode(buf)?.try_into()?)
    }
}

impl ChannelState {
    pub fn encode(&self) -> Vec<u8> {
        proto::State::from(self).encode_to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Ok(decode_non_empty::<proto::State>(buf)?.try_into()?)
    }
}

impl InitProposal {
    pub fn encode(&self) -> Vec<u8> {
        proto::InitProposal::from(self).encode_to_vec()
    }

    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Ok(decode_non_empty::<proto::InitProposal>(buf)?.try_into()?)
    }
}

impl StateProposal {
    pub fn encode(&self) -> Vec<u8> {
        proto::StateProposal {
            state: Some(self.state().into()),
            ledger: Some(self.ledger().into()),
        }
        .encode_to_vec()
    }

    /// Without a ledger in the message the ledger is read from the app data.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let msg = decode_non_empty::<proto::StateProposal>(buf)?;
        let state: ChannelState = msg
            .state
            .ok_or(ConversionError::ExpectedSome("state"))?
            .try_into()?;
        match msg.ledger {
            Some(ledger) => StateProposal::with_ledger(state, ledger.try_into()?),
            None => StateProposal::new(state),
        }
    }
}
