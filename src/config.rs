//! Per-channel settings, deserializable from any serde format.

use serde::Deserialize;

use crate::channel::DEFAULT_CHALLENGE_DURATION;

/// What [Channel::propose_state][crate::channel::Channel::propose_state] does
/// while the previous turn is not signed by everyone yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalPolicy {
    /// Allocate the next turn anyway, leaving the previous draft
    /// unsupported. Participants agreeing on a later turn supersede it.
    #[default]
    AllowOutstanding,
    /// Refuse to allocate a turn until the last state carries every
    /// signature.
    RequireSupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Seconds the adjudicator waits for a challenge response.
    pub challenge_duration: u64,
    pub proposal_policy: ProposalPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        ChannelConfig {
            challenge_duration: DEFAULT_CHALLENGE_DURATION,
            proposal_policy: ProposalPolicy::default(),
        }
    }
}
