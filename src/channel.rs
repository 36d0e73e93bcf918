mod init_proposal;
mod lifecycle;
mod participant;
mod registry;
mod signed;
mod state;
mod state_proposal;

pub use init_proposal::{ContractRef, InitProposal, ProposalError};
pub use lifecycle::{
    Channel, CheckSignatureError, ConcludeError, CreateError, FundError, Phase, ProposeError,
    SignError,
};
pub use participant::Participant;
pub use registry::{ChannelRegistry, RegistryError, SharedChannel};
pub use signed::SignedState;
pub use state::{
    Allocation, ChannelState, FixedPart, Outcome, SingleAssetExit, ALLOCATION_TYPE_SIMPLE,
    DEFAULT_CHALLENGE_DURATION,
};
pub use state_proposal::{LiabilityError, StateProposal};

/// Index of a participant in the channel.
///
/// `0` is the participant that proposed the channel.
pub type PartIdx = usize;
