use crate::abiencode::types::{Address, Destination, U256};

use super::PartIdx;

/// A channel member, fixed once the channel is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: Address,
    /// Receives the funds of this participant when the channel concludes.
    pub destination: Destination,
    /// Amount this participant deposits into the channel.
    pub locked_amount: U256,
    pub index: PartIdx,
}

impl Participant {
    /// Participant whose funds go back to `address`.
    pub fn new(address: Address, index: PartIdx, locked_amount: U256) -> Self {
        Participant {
            address,
            destination: address.into(),
            locked_amount,
            index,
        }
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }
}
