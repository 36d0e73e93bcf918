//! Error type and Return values used by the Serialization.

use core::fmt::Display;

use serde::ser;

/// Represents all possible errors that can happen during Serialization.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The struct contains a type that is not directly representable in
    /// Solidity types.
    ///
    /// For example floating point numbers, enums and maps. While we could
    /// default to some enum representation or automatically convert floats to
    /// `fixedNxM` we don't do this, as it could lead to loss of accuracy or
    /// force a specific representation on the Solidity side. Implement a
    /// custom serialize method instead.
    #[error("type is not representable in abi encoding: {0}")]
    TypeNotRepresentable(&'static str),
    /// `serialize_bytes` outside of [as_bytes][super::as_bytes] is a
    /// `bytesN`, which has to fit into a single slot.
    #[error("fixed-size bytes must fit into 32 bytes, got {0}")]
    FixedBytesTooLong(usize),
    /// Raised by a `Serialize` implementation via [ser::Error::custom()].
    #[error("{0}")]
    Custom(String),
}

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::Custom(msg.to_string())
    }
}

/// Alias for `Result` using the [Error] returned by the Serializer.
pub type Result<T> = core::result::Result<T, Error>;
