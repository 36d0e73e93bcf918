//! Interfaces to the outside world: the on-chain settlement contract and the
//! signing of the transactions sent to it.

use core::fmt::Debug;

use crate::{
    abiencode::types::{Address, Hash, Signature, U256},
    settlement::SettlementParams,
    sig::{self, Signer},
};

/// Gas settings of a transaction. When absent the client estimates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasParams {
    pub gas_price: U256,
    pub gas_limit: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TransactorError {
    #[error("not authorized to sign for {requested}, key belongs to {owner}")]
    NotAuthorized { requested: Address, owner: Address },
    #[error(transparent)]
    Signature(#[from] sig::Error),
}

/// Signs transactions on behalf of an account.
pub trait TransactionSigner: Debug {
    /// Sign the (chain specific) transaction hash `tx_hash` as `from`.
    ///
    /// The signature carries the raw recovery id (0 or 1) in `v`, the
    /// transaction encoding applies its own offset.
    fn sign_transaction(&self, from: Address, tx_hash: Hash) -> Result<Signature, TransactorError>;
}

/// A [TransactionSigner] holding a single private key.
#[derive(Debug)]
pub struct KeyedTransactor {
    chain_id: U256,
    signer: Signer,
}

impl KeyedTransactor {
    pub fn new(chain_id: U256, private_key: &[u8]) -> Result<Self, sig::Error> {
        Ok(KeyedTransactor {
            chain_id,
            signer: Signer::from_private_key(private_key)?,
        })
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    pub fn chain_id(&self) -> U256 {
        self.chain_id
    }
}

impl TransactionSigner for KeyedTransactor {
    fn sign_transaction(&self, from: Address, tx_hash: Hash) -> Result<Signature, TransactorError> {
        if from != self.signer.address() {
            return Err(TransactorError::NotAuthorized {
                requested: from,
                owner: self.signer.address(),
            });
        }
        let mut sig = self.signer.sign_hash(tx_hash)?;
        sig.0[64] -= 27;
        Ok(sig)
    }
}

/// Options of a single transaction.
#[derive(Debug)]
pub struct TransactOpts {
    pub from: Address,
    pub signer: KeyedTransactor,
    /// Wei sent along with the call.
    pub value: U256,
    pub gas: Option<GasParams>,
}

/// The adjudicator contract holding the channel funds.
///
/// Implementations talk to a node (or fake the contract in tests). Calls are
/// blocking. Errors are handed back to the caller untouched.
pub trait SettlementContractClient {
    type Receipt: Debug;
    type Error: std::error::Error + 'static;

    fn chain_id(&self) -> U256;

    /// Amount of `asset` the contract currently holds for `channel_id`.
    fn holdings(&self, asset: Address, channel_id: Hash) -> Result<U256, Self::Error>;

    /// Deposit `amount` of `asset`. The contract rejects the deposit if its
    /// holdings differ from `expected_held`.
    fn deposit(
        &self,
        opts: &TransactOpts,
        asset: Address,
        channel_id: Hash,
        expected_held: U256,
        amount: U256,
    ) -> Result<Self::Receipt, Self::Error>;

    /// Finalize the channel with a single supported state and pay out all
    /// assets.
    fn conclude_and_transfer_all_assets(
        &self,
        opts: &TransactOpts,
        params: &SettlementParams,
    ) -> Result<Self::Receipt, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::account;

    #[test]
    fn transactor_signs_for_own_address() {
        let (key, addr) = account(0);
        let t = KeyedTransactor::new(1337.into(), &key).unwrap();
        assert_eq!(t.address(), addr);
        assert_eq!(t.chain_id(), 1337.into());

        let hash = Hash([0x17; 32]);
        let sig = t.sign_transaction(addr, hash).unwrap();
        assert!(sig.0[64] <= 1);

        // Signing is deterministic, only v differs from the plain signature.
        let mut plain = Signer::from_private_key(&key).unwrap().sign_hash(hash).unwrap();
        plain.0[64] -= 27;
        assert_eq!(sig, plain);
    }

    #[test]
    fn transactor_rejects_other_address() {
        let (key, addr) = account(0);
        let (_, other) = account(1);
        let t = KeyedTransactor::new(1.into(), &key).unwrap();
        assert_eq!(
            t.sign_transaction(other, Hash::default()),
            Err(TransactorError::NotAuthorized {
                requested: other,
                owner: addr
            })
        );
    }

    #[test]
    fn transactor_rejects_invalid_key() {
        assert_eq!(
            KeyedTransactor::new(1.into(), &[0u8; 32]).unwrap_err(),
            sig::Error::InvalidPrivateKey
        );
    }
}
