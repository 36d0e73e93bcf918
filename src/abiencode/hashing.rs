use super::{ser::to_fnargs_writer, to_writer, types::Hash, Error, Writer};

use serde::Serialize;
use sha3::{Digest, Keccak256};

/// Feeds the encoded slots into Keccak-256 without buffering them.
#[derive(Default)]
pub struct Keccak256Writer {
    hasher: Keccak256,
}

impl Writer for Keccak256Writer {
    fn write(&mut self, slot: &[u8]) {
        self.hasher.update(slot);
    }
}

impl Keccak256Writer {
    pub fn finalize(self) -> Hash {
        Hash(self.hasher.finalize().into())
    }
}

/// `keccak256(abi.encode(value))`
pub fn to_hash<T>(value: &T) -> Result<Hash, Error>
where
    T: Serialize + ?Sized,
{
    let mut writer = Keccak256Writer::default();
    to_writer(value, &mut writer)?;
    Ok(writer.finalize())
}

/// `keccak256(abi.encode(a, b, ...))` with the fields of `value` as arguments.
pub fn to_fnargs_hash<T>(value: &T) -> Result<Hash, Error>
where
    T: Serialize + ?Sized,
{
    let mut writer = Keccak256Writer::default();
    to_fnargs_writer(value, &mut writer)?;
    Ok(writer.finalize())
}

/// Keccak-256 of raw bytes (packed encoding).
pub fn keccak256(data: &[u8]) -> Hash {
    Hash(Keccak256::digest(data).into())
}
