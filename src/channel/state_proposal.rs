use tracing::debug;

use super::{ChannelState, PartIdx};
use crate::{
    abiencode::types::U256,
    ledger::{AssetCode, LedgerError, LiabilityLedger},
    wire::DecodeError,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum LiabilityError {
    #[error("participant {0} is not part of the channel")]
    UnknownParticipant(PartIdx),
    #[error("participant {0} cannot owe itself")]
    SelfLiability(PartIdx),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Draft of the next state together with its decoded liability ledger.
///
/// Ledger changes only end up in the state (and thus in what is signed) after
/// [StateProposal::approve_liabilities].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateProposal {
    state: ChannelState,
    ledger: LiabilityLedger,
}

impl StateProposal {
    pub fn new(state: ChannelState) -> Result<Self, DecodeError> {
        let ledger = LiabilityLedger::decode(&state.app_data)?;
        Ok(StateProposal { state, ledger })
    }

    /// Draft whose ledger may hold changes not yet written into the app data.
    /// The app data must still be a valid ledger.
    pub(crate) fn with_ledger(
        state: ChannelState,
        ledger: LiabilityLedger,
    ) -> Result<Self, DecodeError> {
        LiabilityLedger::decode(&state.app_data)?;
        Ok(StateProposal { state, ledger })
    }

    pub fn turn_num(&self) -> u64 {
        self.state.turn_num
    }

    pub fn is_final(&self) -> bool {
        self.state.is_final
    }

    /// Mark this as the last state of the channel.
    pub fn set_final(&mut self) {
        self.state.is_final = true;
    }

    pub fn app_data(&self) -> &[u8] {
        &self.state.app_data
    }

    /// Replace the app data, which must be an encoded ledger.
    ///
    /// Discards unapproved ledger changes.
    pub fn set_app_data(&mut self, app_data: Vec<u8>) -> Result<(), DecodeError> {
        self.ledger = LiabilityLedger::decode(&app_data)?;
        self.state.app_data = app_data;
        Ok(())
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn ledger(&self) -> &LiabilityLedger {
        &self.ledger
    }

    fn check_pair(&self, from: PartIdx, to: PartIdx) -> Result<(), LiabilityError> {
        let n = self.state.participants.len();
        if from >= n {
            return Err(LiabilityError::UnknownParticipant(from));
        }
        if to >= n {
            return Err(LiabilityError::UnknownParticipant(to));
        }
        if from == to {
            return Err(LiabilityError::SelfLiability(from));
        }
        Ok(())
    }

    /// `from` asks `to` for `amount` of `asset`.
    pub fn request_liability(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<(), LiabilityError> {
        self.check_pair(from, to)?;
        self.ledger.request(from, to, asset, amount);
        Ok(())
    }

    pub fn acknowledge_liability(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<(), LiabilityError> {
        self.check_pair(from, to)?;
        Ok(self.ledger.acknowledge(from, to, asset, amount)?)
    }

    pub fn revert_liability(
        &mut self,
        from: PartIdx,
        to: PartIdx,
        asset: &AssetCode,
        amount: U256,
    ) -> Result<(), LiabilityError> {
        self.check_pair(from, to)?;
        Ok(self.ledger.revert(from, to, asset, amount)?)
    }

    /// Write the ledger into the app data of the draft state.
    pub fn approve_liabilities(&mut self) {
        self.state.app_data = self.ledger.encode();
        debug!(
            turn = self.state.turn_num,
            app_data_len = self.state.app_data.len(),
            "approved liabilities"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_party_state;

    #[test]
    fn empty_app_data_is_empty_ledger() {
        let p = StateProposal::new(two_party_state()).unwrap();
        assert!(p.ledger().is_empty());
        assert_eq!(p.turn_num(), 0);
        assert!(!p.is_final());
    }

    #[test]
    fn invalid_app_data() {
        let mut state = two_party_state();
        state.app_data = vec![0xff, 0xff, 0xff];
        assert!(matches!(
            StateProposal::new(state),
            Err(DecodeError::Protobuf(_))
        ));
    }

    #[test]
    fn ledger_changes_are_buffered() {
        let mut p = StateProposal::new(two_party_state()).unwrap();
        p.request_liability(0, 1, &"ETH".into(), 12.into()).unwrap();
        assert!(p.app_data().is_empty());

        p.approve_liabilities();
        assert_eq!(p.app_data(), p.ledger().encode().as_slice());

        let again = StateProposal::new(p.state().clone()).unwrap();
        assert_eq!(again.ledger().pending(0, 1, &"ETH".into()), 12.into());
    }

    #[test]
    fn unknown_participants() {
        let mut p = StateProposal::new(two_party_state()).unwrap();
        assert_eq!(
            p.request_liability(0, 2, &"ETH".into(), 1.into()),
            Err(LiabilityError::UnknownParticipant(2))
        );
        assert_eq!(
            p.revert_liability(1, 1, &"ETH".into(), 1.into()),
            Err(LiabilityError::SelfLiability(1))
        );
        assert_eq!(
            p.acknowledge_liability(0, 1, &"ETH".into(), 1.into()),
            Err(LiabilityError::Ledger(LedgerError::NoSuchPair { from: 0, to: 1 }))
        );
        assert!(p.ledger().is_empty());
    }

    #[test]
    fn set_app_data_replaces_ledger() {
        let mut other = LiabilityLedger::new();
        other.request(1, 0, &"BTC".into(), 3.into());

        let mut p = StateProposal::new(two_party_state()).unwrap();
        p.request_liability(0, 1, &"ETH".into(), 12.into()).unwrap();
        p.set_app_data(other.encode()).unwrap();
        assert_eq!(p.ledger(), &other);

        assert!(p.set_app_data(vec![0xff]).is_err());
        assert_eq!(p.ledger(), &other);
    }

    #[test]
    fn set_final() {
        let mut p = StateProposal::new(two_party_state()).unwrap();
        p.set_final();
        assert!(p.is_final());
        assert!(p.state().is_final());
    }
}
