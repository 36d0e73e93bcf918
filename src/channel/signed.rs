use std::collections::BTreeMap;

use super::{ChannelState, PartIdx};
use crate::abiencode::{
    self,
    types::{Address, Hash, Signature},
};

/// A state together with the signatures collected for it, one slot per
/// participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedState {
    state: ChannelState,
    hash: Hash,
    signatures: Vec<Option<Signature>>,
}

impl SignedState {
    pub fn new(state: ChannelState) -> Result<Self, abiencode::Error> {
        let hash = state.hash()?;
        Ok(Self::with_hash(state, hash))
    }

    pub(super) fn with_hash(state: ChannelState, hash: Hash) -> Self {
        let signatures = vec![None; state.participants.len()];
        SignedState {
            state,
            hash,
            signatures,
        }
    }

    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn signatures(&self) -> &[Option<Signature>] {
        &self.signatures
    }

    pub fn signature_of(&self, part_idx: PartIdx) -> Option<Signature> {
        self.signatures.get(part_idx).copied().flatten()
    }

    /// Whether every participant signed.
    pub fn is_complete(&self) -> bool {
        self.signatures.iter().all(Option::is_some)
    }

    pub fn has_signatures(&self) -> bool {
        self.signatures.iter().any(Option::is_some)
    }

    /// The collected signatures keyed by signer.
    pub fn signature_map(&self) -> BTreeMap<Address, Signature> {
        self.state
            .participants
            .iter()
            .zip(&self.signatures)
            .filter_map(|(addr, sig)| sig.map(|s| (*addr, s)))
            .collect()
    }

    /// Store the already verified signature of `part_idx`, replacing an
    /// earlier one.
    pub(super) fn add_signature(&mut self, part_idx: PartIdx, sig: Signature) {
        debug_assert!(part_idx < self.signatures.len());
        self.signatures[part_idx] = Some(sig);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_party_state;

    #[test]
    fn completeness() {
        let mut s = SignedState::new(two_party_state()).unwrap();
        assert_eq!(s.hash(), two_party_state().hash().unwrap());
        assert!(!s.is_complete());
        assert!(!s.has_signatures());

        s.add_signature(1, Signature([1; 65]));
        assert!(s.has_signatures());
        assert!(!s.is_complete());
        assert_eq!(s.signature_of(0), None);
        assert_eq!(s.signature_of(1), Some(Signature([1; 65])));
        assert_eq!(s.signature_of(2), None);

        s.add_signature(0, Signature([2; 65]));
        assert!(s.is_complete());

        let map = s.signature_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&s.state().participants()[0]], Signature([2; 65]));
    }
}
