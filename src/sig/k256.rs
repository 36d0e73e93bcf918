//! Signer using the k256 Rust crate (implementation of ecdsa in Rust).

use core::fmt::Debug;

use crate::abiencode::types::{Address, Hash, Signature};
use k256::{
    ecdsa::{
        recoverable,
        signature::{hazmat::PrehashSigner, Signature as k256Signature},
        SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
};
use sha3::{Digest, Keccak256};

use super::{hash_to_eth_signed_msg_hash, recovery_id, Error};

pub struct Signer {
    key: SigningKey,
    addr: Address,
}

impl Debug for Signer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signer").field("addr", &self.addr).finish()
    }
}

fn address_of(key: &VerifyingKey) -> Address {
    // The uncompressed encoding is 0x04 || x || y, the address is the last 20
    // bytes of the hash of x || y.
    let point = key.to_encoded_point(false);
    let hash: [u8; 32] = Keccak256::digest(&point.as_bytes()[1..]).into();

    let mut addr = Address([0; 20]);
    addr.0.copy_from_slice(&hash[32 - 20..]);
    addr
}

impl Signer {
    pub fn new<R: rand::Rng + rand::CryptoRng>(rng: &mut R) -> Self {
        Self::from_key(SigningKey::random(rng))
    }

    /// Parse a raw 32 byte secp256k1 private key.
    pub fn from_private_key(bytes: &[u8]) -> Result<Self, Error> {
        let key = SigningKey::from_bytes(bytes).map_err(|_| Error::InvalidPrivateKey)?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: SigningKey) -> Self {
        let addr = address_of(&key.verifying_key());
        Self { key, addr }
    }

    pub fn address(&self) -> Address {
        self.addr
    }

    /// Sign `msg` in the `"\x19Ethereum Signed Message:\n32"` format.
    pub fn sign_eth(&self, msg: Hash) -> Result<Signature, Error> {
        self.sign_hash(hash_to_eth_signed_msg_hash(msg))
    }

    /// Sign a prehashed message without any prefix (e.g. a transaction).
    pub fn sign_hash(&self, hash: Hash) -> Result<Signature, Error> {
        let sig: recoverable::Signature = self
            .key
            .sign_prehash(&hash.0)
            .map_err(|_| Error::SigningFailed)?;

        // This Signature type already has the format we need: 65 bytes
        // containing r, s and v in this order. We still have to add 27 to v for
        // the signature to be valid in the EVM.
        let mut sig_bytes: [u8; 65] = sig
            .as_bytes()
            .try_into()
            .map_err(|_| Error::SigningFailed)?;
        debug_assert!(sig_bytes[32] & 0x80 == 0);
        sig_bytes[64] += 27;

        Ok(Signature(sig_bytes))
    }
}

/// Recover the address that produced `eth_sig` over `msg` with
/// [Signer::sign_eth].
pub fn recover_signer(msg: Hash, eth_sig: Signature) -> Result<Address, Error> {
    let hash = hash_to_eth_signed_msg_hash(msg);

    let mut sig_bytes: [u8; 65] = eth_sig.0;
    sig_bytes[64] = recovery_id(sig_bytes[64])?;

    let sig = recoverable::Signature::from_bytes(&sig_bytes)
        .map_err(|_| Error::MalformedSignature)?;

    let verifying_key = sig
        .recover_verifying_key_from_digest_bytes(&hash.0.into())
        .map_err(|_| Error::RecoveryFailed)?;
    Ok(address_of(&verifying_key))
}
