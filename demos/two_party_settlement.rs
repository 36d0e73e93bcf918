//! Two participants open a channel, record a liability, agree on a final
//! state and settle it on an in-memory adjudicator.
//!
//! Run with `RUST_LOG=debug` to see every signature being recorded.

use std::{cell::RefCell, collections::HashMap, convert::Infallible};

use liability_channel::{
    channel::{Channel, ContractRef, InitProposal, Participant},
    client::{SettlementContractClient, TransactOpts},
    config::ChannelConfig,
    ledger::AssetCode,
    settlement::SettlementParams,
    sig::Signer,
    Address, Hash, U256,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct InMemoryAdjudicator {
    holdings: RefCell<HashMap<Hash, U256>>,
}

impl SettlementContractClient for InMemoryAdjudicator {
    type Receipt = String;
    type Error = Infallible;

    fn chain_id(&self) -> U256 {
        1337.into()
    }

    fn holdings(&self, _asset: Address, channel_id: Hash) -> Result<U256, Infallible> {
        Ok(self
            .holdings
            .borrow()
            .get(&channel_id)
            .copied()
            .unwrap_or_default())
    }

    fn deposit(
        &self,
        opts: &TransactOpts,
        _asset: Address,
        channel_id: Hash,
        _expected_held: U256,
        amount: U256,
    ) -> Result<String, Infallible> {
        *self.holdings.borrow_mut().entry(channel_id).or_default() += amount;
        Ok(format!("deposit of {} by {}", amount, opts.from))
    }

    fn conclude_and_transfer_all_assets(
        &self,
        opts: &TransactOpts,
        params: &SettlementParams,
    ) -> Result<String, Infallible> {
        self.holdings.borrow_mut().clear();
        Ok(format!(
            "concluded turn {} by {} ({} outcome bytes)",
            params.largest_turn_num,
            opts.from,
            params.outcome_bytes.len()
        ))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut rng = rand::thread_rng();
    let keys: Vec<[u8; 32]> = (0..2).map(|_| rand::Rng::gen(&mut rng)).collect();
    let addresses: Vec<Address> = keys
        .iter()
        .map(|k| Signer::from_private_key(k).map(|s| s.address()))
        .collect::<Result<_, _>>()
        .expect("random key is valid");

    let adj = InMemoryAdjudicator::default();
    let contract = ContractRef {
        adjudicator: Address([0xad; 20]),
        asset: Address::default(),
    };
    let config = ChannelConfig::default();
    let mut proposal = InitProposal::new(
        adj.chain_id(),
        contract,
        Participant::new(addresses[0], 0, 100.into()),
        InitProposal::random_nonce(&mut rng),
        &config,
    )
    .expect("first participant");
    proposal
        .add_participant(Participant::new(addresses[1], 1, 200.into()))
        .expect("second participant");

    let mut channel = Channel::with_config(&adj, proposal, 0, &config).expect("valid proposal");
    println!("Channel {}", channel.channel_id());

    for key in &keys {
        channel.approve_init(key).expect("sign pre-fund state");
    }
    for (idx, key) in keys.iter().enumerate() {
        let receipt = channel.fund(idx, key, None).expect("deposit");
        println!("{}", receipt);
    }
    for key in &keys {
        channel.approve_funding(key).expect("sign post-fund state");
    }
    println!("Holdings: {}", channel.check_holdings().unwrap_or_default());

    let eth = AssetCode::from("ETH");
    let mut update = channel.propose_state().expect("next turn");
    update
        .request_liability(0, 1, &eth, 12.into())
        .expect("request");
    update.approve_liabilities();
    for key in &keys {
        channel.sign_state(&update, key).expect("sign request");
    }

    let mut update = channel.propose_state().expect("next turn");
    update
        .acknowledge_liability(0, 1, &eth, 12.into())
        .expect("acknowledge");
    update.approve_liabilities();
    update.set_final();
    for key in &keys {
        channel.sign_state(&update, key).expect("sign final state");
    }
    println!(
        "Executed: {} ETH from 0 to 1",
        update.ledger().executed(0, 1, &eth)
    );

    let turn = channel.current_state().turn_num();
    let signatures = channel.signatures_for(turn).unwrap_or_default();
    let receipt = channel
        .conclude(0, &keys[0], &signatures, None)
        .expect("conclude");
    println!("{} in phase {:?}", receipt, channel.phase());
}
