//! Fixtures shared by the unit tests.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::Mutex;

use crate::{
    abiencode::types::{Address, Hash, U256},
    channel::{
        Allocation, ChannelState, ContractRef, FixedPart, InitProposal, Outcome, Participant,
        SingleAssetExit,
    },
    client::{SettlementContractClient, TransactOpts},
    config::ChannelConfig,
    settlement::SettlementParams,
};

pub const CHAIN_ID: u64 = 1337;

/// Hardhat/anvil development accounts 0 and 1.
const ACCOUNTS: [(&str, &str); 2] = [
    (
        "de9be858da4a475276426320d5e9262ecfc3ba460bfac56360bfa6c4c28b4ee0",
        "dd2fd4581271e230360230f9337d5c0430bf44c0",
    ),
    (
        "df57089febbacf7ba0bc227dafbffa9fc08a93fdc68e1e42411a14efcf23656e",
        "8626f6940e2eb28930efb4cef49b2d1f2c9c1199",
    ),
];

pub fn address(byte: u8) -> Address {
    Address([byte; 20])
}

/// Private key and address of development account `i`.
pub fn account(i: usize) -> (Vec<u8>, Address) {
    let (key, addr) = ACCOUNTS[i];
    let key = hex::decode(key).unwrap();
    let addr = Address::try_from(hex::decode(addr).unwrap().as_slice()).unwrap();
    (key, addr)
}

/// Pre-fund state of a channel between `0xaa..` (100) and `0xbb..` (200).
pub fn two_party_state() -> ChannelState {
    let participants = vec![address(0xaa), address(0xbb)];
    let mut exit = SingleAssetExit::new(Address::default());
    exit.allocations = vec![
        Allocation::simple(participants[0].into(), 100.into()),
        Allocation::simple(participants[1].into(), 200.into()),
    ];
    let fixed = FixedPart {
        chain_id: CHAIN_ID.into(),
        participants,
        channel_nonce: 7.into(),
        app_definition: Address::default(),
        challenge_duration: 60,
    };
    ChannelState::new(fixed, Vec::new(), Outcome(vec![exit]), 0, false)
}

pub fn contract() -> ContractRef {
    ContractRef {
        adjudicator: address(0xad),
        asset: Address::default(),
    }
}

/// Proposal between the two development accounts locking 100 and 200 wei,
/// together with their private keys.
pub fn two_party_proposal(config: &ChannelConfig) -> (InitProposal, [Vec<u8>; 2]) {
    let (alice_key, alice) = account(0);
    let (bob_key, bob) = account(1);
    let mut proposal = InitProposal::new(
        CHAIN_ID.into(),
        contract(),
        Participant::new(alice, 0, 100.into()),
        7.into(),
        config,
    )
    .unwrap();
    proposal
        .add_participant(Participant::new(bob, 1, 200.into()))
        .unwrap();
    (proposal, [alice_key, bob_key])
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MockError {
    #[error("holdings are {held}, caller expected {expected}")]
    UnexpectedHoldings { held: U256, expected: U256 },
    #[error("sent {value} wei along with a deposit of {amount}")]
    ValueMismatch { value: U256, amount: U256 },
    #[error("transaction reverted")]
    Reverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockReceipt {
    pub tx_index: usize,
    pub from: Address,
}

/// An in-memory adjudicator.
#[derive(Debug, Default)]
pub struct MockAdjudicator {
    holdings: Mutex<HashMap<(Address, Hash), U256>>,
    concluded: Mutex<Vec<SettlementParams>>,
    tx_count: Mutex<usize>,
    reverting: AtomicBool,
}

impl MockAdjudicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let every following transaction revert.
    pub fn set_reverting(&self, reverting: bool) {
        self.reverting.store(reverting, Ordering::SeqCst);
    }

    pub fn concluded(&self) -> Vec<SettlementParams> {
        self.concluded.lock().clone()
    }

    fn receipt(&self, opts: &TransactOpts) -> Result<MockReceipt, MockError> {
        if self.reverting.load(Ordering::SeqCst) {
            return Err(MockError::Reverted);
        }
        let mut count = self.tx_count.lock();
        *count += 1;
        Ok(MockReceipt {
            tx_index: *count,
            from: opts.from,
        })
    }
}

impl SettlementContractClient for MockAdjudicator {
    type Receipt = MockReceipt;
    type Error = MockError;

    fn chain_id(&self) -> U256 {
        CHAIN_ID.into()
    }

    fn holdings(&self, asset: Address, channel_id: Hash) -> Result<U256, MockError> {
        Ok(self
            .holdings
            .lock()
            .get(&(asset, channel_id))
            .copied()
            .unwrap_or_default())
    }

    fn deposit(
        &self,
        opts: &TransactOpts,
        asset: Address,
        channel_id: Hash,
        expected_held: U256,
        amount: U256,
    ) -> Result<MockReceipt, MockError> {
        if asset == Address::default() && opts.value != amount {
            return Err(MockError::ValueMismatch {
                value: opts.value,
                amount,
            });
        }
        let mut holdings = self.holdings.lock();
        let held = holdings.entry((asset, channel_id)).or_default();
        if *held != expected_held {
            return Err(MockError::UnexpectedHoldings {
                held: *held,
                expected: expected_held,
            });
        }
        let receipt = self.receipt(opts)?;
        *held += amount;
        Ok(receipt)
    }

    fn conclude_and_transfer_all_assets(
        &self,
        opts: &TransactOpts,
        params: &SettlementParams,
    ) -> Result<MockReceipt, MockError> {
        let receipt = self.receipt(opts)?;
        self.concluded.lock().push(params.clone());
        Ok(receipt)
    }
}
