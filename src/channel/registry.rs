use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use tracing::debug;

use super::Channel;
use crate::{abiencode::types::Hash, client::SettlementContractClient};

pub type SharedChannel<'cl, C> = Arc<RwLock<Channel<'cl, C>>>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("channel {0} is already open")]
    AlreadyOpen(Hash),
}

/// Open channels by id, each behind its own lock.
///
/// Operations changing a channel take its write lock, queries the read lock.
/// Different channels never block each other apart from the short map lookup.
#[derive(Debug)]
pub struct ChannelRegistry<'cl, C: SettlementContractClient> {
    channels: RwLock<HashMap<Hash, SharedChannel<'cl, C>>>,
}

impl<'cl, C: SettlementContractClient> Default for ChannelRegistry<'cl, C> {
    fn default() -> Self {
        ChannelRegistry {
            channels: RwLock::new(HashMap::new()),
        }
    }
}

impl<'cl, C: SettlementContractClient> ChannelRegistry<'cl, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, channel: Channel<'cl, C>) -> Result<SharedChannel<'cl, C>, RegistryError> {
        let id = channel.channel_id();
        let mut channels = self.channels.write();
        if channels.contains_key(&id) {
            return Err(RegistryError::AlreadyOpen(id));
        }
        let shared = Arc::new(RwLock::new(channel));
        channels.insert(id, Arc::clone(&shared));
        debug!(channel = %id, open = channels.len(), "channel registered");
        Ok(shared)
    }

    pub fn get(&self, id: &Hash) -> Option<SharedChannel<'cl, C>> {
        self.channels.read().get(id).cloned()
    }

    pub fn remove(&self, id: &Hash) -> Option<SharedChannel<'cl, C>> {
        self.channels.write().remove(id)
    }

    pub fn ids(&self) -> Vec<Hash> {
        self.channels.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }
}
