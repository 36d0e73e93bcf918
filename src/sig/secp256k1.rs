use core::fmt::Debug;

use crate::abiencode::types::{Address, Hash, Signature};
use secp256k1::{
    ecdsa::{RecoverableSignature, RecoveryId},
    All, Message, PublicKey, Secp256k1, SecretKey,
};

use super::{hash_to_eth_signed_msg_hash, recovery_id, Error};

pub struct Signer {
    secp: Secp256k1<All>,
    key: SecretKey,
    addr: Address,
}

impl Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer").field("addr", &self.addr).finish()
    }
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        Self::from_key(SecretKey::new(rng))
    }

    /// Parse a raw 32 byte secp256k1 private key.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, Error> {
        let key = SecretKey::from_slice(bytes).map_err(|_| Error::InvalidPrivateKey)?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let addr = PublicKey::from_secret_key(&secp, &key).into();
        Self { secp, key, addr }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign a hash using a Ethereum 65-byte recoverable signature.
    ///
    /// Note that this differs from transaction signatures, as it does not
    /// include the length.
    pub fn sign_eth(&self, msg: Hash) -> Result<Signature, Error> {
        self.sign_hash(hash_to_eth_signed_msg_hash(msg))
    }

    /// Sign a prehashed message without any prefix (e.g. a transaction).
    pub fn sign_hash(&self, hash: Hash) -> Result<Signature, Error> {
        let msg = Message::from_slice(&hash.0).map_err(|_| Error::SigningFailed)?;

        // We have to use sign_ecdsa_recoverable because the smart contract must
        // be able to recover the address. This gives us the additional
        // information needed for v.
        let sig = self.secp.sign_ecdsa_recoverable(&msg, &self.key);
        let (v, rs) = sig.serialize_compact();

        // [EIP-2](https://eips.ethereum.org/EIPS/eip-2) makes all signatures
        // with a non-canonical solution (s starts with the bit 1) invalid.
        debug_assert!(rs[32] & 0x80 == 0);

        // Ethereum kept the offset of 27 on v, we do not use EIP-155 chain ids
        // in v as OpenZeppelin does not recover those.
        let v: u8 = 27 + v.to_i32() as u8;

        Ok(Signature::new(&rs, v))
    }
}

/// Recover the address that produced `eth_sig` over `msg` with
/// [Signer::sign_eth].
///
/// `msg` should not include the `Ethereum Signed Message` prefix.
pub fn recover_signer(msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
    let secp = Secp256k1::verification_only();
    let hash = hash_to_eth_signed_msg_hash(msg);
    let msg = Message::from_slice(&hash.0).map_err(|_| Error::RecoveryFailed)?;

    let v = recovery_id(eth_sig.0[64])?;
    let recid =
        RecoveryId::from_i32(v.into()).map_err(|_| Error::InvalidRecoveryId(eth_sig.0[64]))?;
    let sig = RecoverableSignature::from_compact(&eth_sig.0[..64], recid)
        .map_err(|_| Error::MalformedSignature)?;

    let pk = secp
        .recover_ecdsa(&msg, &sig)
        .map_err(|_| Error::RecoveryFailed)?;
    Ok(pk.into())
}
