mod abiencode {
    mod error;
    mod hashing;
    mod ser;

    pub mod as_bytes;
    pub mod types;

    pub use error::{Error, Result};
    pub use hashing::{keccak256, to_fnargs_hash, to_hash};
    pub use ser::{to_fnargs_writer, to_vec, to_writer, Writer};

    #[cfg(test)]
    pub mod tests;
}
pub mod sig;

pub mod channel;
pub mod client;
pub mod config;
pub mod ledger;
pub mod settlement;
pub mod wire;

#[cfg(test)]
mod test_utils;

pub use abiencode::types::{Address, Bytes32, Destination, Hash, Signature, U256};
pub use abiencode::Error as AbiEncodeError;
