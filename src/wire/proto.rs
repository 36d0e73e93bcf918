//! Protobuf messages exchanged between participants.
//!
//! Amounts and other 256 bit integers are big-endian bytes, addresses are 20
//! bytes and hashes/destinations are 32 bytes.

#[derive(Clone, PartialEq, prost::Message)]
pub struct AssetAmount {
    #[prost(string, tag = "1")]
    pub asset: String,
    #[prost(bytes = "vec", tag = "2")]
    pub amount: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Liability {
    #[prost(uint64, tag = "1")]
    pub from: u64,
    #[prost(uint64, tag = "2")]
    pub to: u64,
    #[prost(message, repeated, tag = "3")]
    pub pending: Vec<AssetAmount>,
    #[prost(message, repeated, tag = "4")]
    pub executed: Vec<AssetAmount>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Ledger {
    #[prost(message, repeated, tag = "1")]
    pub liabilities: Vec<Liability>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Allocation {
    #[prost(bytes = "vec", tag = "1")]
    pub destination: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub amount: Vec<u8>,
    #[prost(uint32, tag = "3")]
    pub allocation_type: u32,
    #[prost(bytes = "vec", tag = "4")]
    pub metadata: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SingleAssetExit {
    #[prost(bytes = "vec", tag = "1")]
    pub asset: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub metadata: Vec<u8>,
    #[prost(message, repeated, tag = "3")]
    pub allocations: Vec<Allocation>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct State {
    #[prost(bytes = "vec", tag = "1")]
    pub chain_id: Vec<u8>,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub participants: Vec<Vec<u8>>,
    #[prost(bytes = "vec", tag = "3")]
    pub channel_nonce: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub app_definition: Vec<u8>,
    #[prost(uint64, tag = "5")]
    pub challenge_duration: u64,
    #[prost(bytes = "vec", tag = "6")]
    pub app_data: Vec<u8>,
    #[prost(message, repeated, tag = "7")]
    pub outcome: Vec<SingleAssetExit>,
    #[prost(uint64, tag = "8")]
    pub turn_num: u64,
    #[prost(bool, tag = "9")]
    pub is_final: bool,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Participant {
    #[prost(bytes = "vec", tag = "1")]
    pub address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub destination: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub locked_amount: Vec<u8>,
    #[prost(uint64, tag = "4")]
    pub index: u64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Contract {
    #[prost(bytes = "vec", tag = "1")]
    pub adjudicator: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub asset: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct InitProposal {
    #[prost(message, repeated, tag = "1")]
    pub participants: Vec<Participant>,
    #[prost(message, optional, tag = "2")]
    pub contract: Option<Contract>,
    #[prost(message, optional, tag = "3")]
    pub state: Option<State>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct StateProposal {
    #[prost(message, optional, tag = "1")]
    pub state: Option<State>,
    /// Ledger of the draft including changes not yet approved into the state.
    #[prost(message, optional, tag = "2")]
    pub ledger: Option<Ledger>,
}
