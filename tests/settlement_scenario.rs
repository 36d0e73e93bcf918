use std::collections::HashMap;

use liability_channel::{
    channel::{Channel, ContractRef, InitProposal, LiabilityError, Participant, Phase},
    client::{SettlementContractClient, TransactOpts},
    config::ChannelConfig,
    ledger::{AssetCode, LedgerError},
    settlement::SettlementParams,
    Address, Hash, U256,
};
use parking_lot::Mutex;

const CHAIN_ID: u64 = 1337;

const ALICE_KEY: &str = "de9be858da4a475276426320d5e9262ecfc3ba460bfac56360bfa6c4c28b4ee0";
const BOB_KEY: &str = "df57089febbacf7ba0bc227dafbffa9fc08a93fdc68e1e42411a14efcf23656e";

#[derive(Debug, thiserror::Error)]
#[error("unexpected holdings")]
struct HoldingsMismatch;

#[derive(Debug, Default)]
struct Adjudicator {
    holdings: Mutex<HashMap<Hash, U256>>,
    settled: Mutex<Vec<SettlementParams>>,
}

impl SettlementContractClient for Adjudicator {
    type Receipt = ();
    type Error = HoldingsMismatch;

    fn chain_id(&self) -> U256 {
        CHAIN_ID.into()
    }

    fn holdings(&self, _asset: Address, channel_id: Hash) -> Result<U256, Self::Error> {
        Ok(self
            .holdings
            .lock()
            .get(&channel_id)
            .copied()
            .unwrap_or_default())
    }

    fn deposit(
        &self,
        _opts: &TransactOpts,
        _asset: Address,
        channel_id: Hash,
        expected_held: U256,
        amount: U256,
    ) -> Result<(), Self::Error> {
        let mut holdings = self.holdings.lock();
        let held = holdings.entry(channel_id).or_default();
        if *held != expected_held {
            return Err(HoldingsMismatch);
        }
        *held += amount;
        Ok(())
    }

    fn conclude_and_transfer_all_assets(
        &self,
        _opts: &TransactOpts,
        params: &SettlementParams,
    ) -> Result<(), Self::Error> {
        self.settled.lock().push(params.clone());
        Ok(())
    }
}

fn key(hex_key: &str) -> Vec<u8> {
    hex::decode(hex_key).unwrap()
}

fn address_of(hex_addr: &str) -> Address {
    Address::try_from(hex::decode(hex_addr).unwrap().as_slice()).unwrap()
}

fn open(adj: &Adjudicator) -> Channel<'_, Adjudicator> {
    let alice = address_of("dd2fd4581271e230360230f9337d5c0430bf44c0");
    let bob = address_of("8626f6940e2eb28930efb4cef49b2d1f2c9c1199");
    let contract = ContractRef {
        adjudicator: Address([0xad; 20]),
        asset: Address::default(),
    };
    let mut proposal = InitProposal::new(
        CHAIN_ID.into(),
        contract,
        Participant::new(alice, 0, 100.into()),
        InitProposal::random_nonce(&mut rand::thread_rng()),
        &ChannelConfig::default(),
    )
    .unwrap();
    proposal
        .add_participant(Participant::new(bob, 1, 200.into()))
        .unwrap();
    Channel::new(adj, proposal, 0).unwrap()
}

#[test]
fn two_party_channel_settles() {
    let adj = Adjudicator::default();
    let keys = [key(ALICE_KEY), key(BOB_KEY)];
    let eth = AssetCode::from("ETH");

    let mut ch = open(&adj);
    for k in &keys {
        ch.approve_init(k).unwrap();
    }
    assert!(ch.pre_fund_complete());

    ch.fund(0, &keys[0], None).unwrap();
    ch.fund(1, &keys[1], None).unwrap();
    assert_eq!(ch.check_holdings().unwrap(), 300.into());

    for k in &keys {
        ch.approve_funding(k).unwrap();
    }
    assert_eq!(ch.phase(), Phase::PostFundComplete);

    for turn in 2..=5 {
        let mut proposal = ch.propose_state().unwrap();
        assert_eq!(proposal.turn_num(), turn);
        if turn == 2 {
            proposal.request_liability(0, 1, &eth, 12.into()).unwrap();
        }
        if turn == 3 {
            proposal
                .acknowledge_liability(0, 1, &eth, 12.into())
                .unwrap();
        }
        proposal.approve_liabilities();
        for k in &keys {
            ch.sign_state(&proposal, k).unwrap();
        }
        assert!(ch.is_supported(turn));
    }

    let mut last = ch.propose_state().unwrap();
    assert_eq!(last.turn_num(), 6);
    let ledger = last.ledger().clone();
    assert_eq!(ledger.pending(0, 1, &eth), U256::zero());
    assert_eq!(ledger.executed(0, 1, &eth), 12.into());
    assert!(!ledger.has_pending());

    last.set_final();
    for k in &keys {
        ch.sign_state(&last, k).unwrap();
    }
    assert!(ch.state_is_final());

    let sigs = ch.signatures_for(6).unwrap();
    assert_eq!(sigs.len(), 2);
    ch.conclude(0, &keys[0], &sigs, None).unwrap();
    assert_eq!(ch.phase(), Phase::Concluded);

    let settled = adj.settled.lock();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].largest_turn_num, 6);
    assert_eq!(settled[0].who_signed_what, vec![0, 0]);
    assert!(settled[0].missing_signers().is_empty());
}

#[test]
fn reverting_more_than_pending_fails() {
    let adj = Adjudicator::default();
    let usdt = AssetCode::from("USDT");

    let mut ch = open(&adj);
    let mut proposal = ch.propose_state().unwrap();
    proposal.request_liability(1, 0, &usdt, 10.into()).unwrap();

    let err = proposal
        .revert_liability(1, 0, &usdt, 15.into())
        .unwrap_err();
    assert_eq!(
        err,
        LiabilityError::Ledger(LedgerError::AmountExceedsPending {
            asset: usdt.clone(),
            requested: 15.into(),
            pending: 10.into(),
        })
    );
    assert_eq!(proposal.ledger().pending(1, 0, &usdt), 10.into());
}

#[test]
fn conclude_before_final_state_fails() {
    let adj = Adjudicator::default();
    let mut ch = open(&adj);
    let sigs = ch.signatures_for(0).unwrap();
    assert!(ch.conclude(0, &key(ALICE_KEY), &sigs, None).is_err());
    assert!(adj.settled.lock().is_empty());
}
