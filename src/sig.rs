//! Handles the creation and verification of (Ethereum) Signatures.
//!
//! Two interchangeable backends exist: `k256` (pure Rust, default) and
//! `secp256k1` (bindings to libsecp256k1). If both features are enabled the
//! `secp256k1` backend is used.

use crate::abiencode::{keccak256, types::Hash};

#[cfg(feature = "k256")]
mod k256;
#[cfg(feature = "secp256k1")]
mod secp256k1;

#[cfg(feature = "secp256k1")]
pub use self::secp256k1::{recover_signer, Signer};

#[cfg(all(feature = "k256", not(feature = "secp256k1")))]
pub use self::k256::{recover_signer, Signer};

#[cfg(not(any(feature = "k256", feature = "secp256k1")))]
compile_error!("enable either the `k256` or the `secp256k1` feature");


#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    #[error("invalid private key")]
    InvalidPrivateKey,
    #[error("invalid recovery id (v = {0})")]
    InvalidRecoveryId(u8),
    #[error("malformed signature")]
    MalformedSignature,
    #[error("could not recover public key from signature")]
    RecoveryFailed,
    #[error("signing failed")]
    SigningFailed,
}

/// Add the `\x19Ethereum Signed Message\n<length>` prefix to hash.
///
/// This is the format expected by the Solidity contracts.
fn hash_to_eth_signed_msg_hash(hash: Hash) -> Hash {
    // Packed encoding => We can't use the serializer
    let mut msg = [0u8; 60];
    msg[..28].copy_from_slice(b"\x19Ethereum Signed Message:\n32");
    msg[28..].copy_from_slice(&hash.0);
    keccak256(&msg)
}

/// Undo the +27 offset of `v`.
fn recovery_id(v: u8) -> Result<u8, Error> {
    match v.checked_sub(27) {
        Some(id) if id <= 1 => Ok(id),
        _ => Err(Error::InvalidRecoveryId(v)),
    }
}
