//! Byte encoding of everything participants exchange.
//!
//! All types implement `From<T> for proto::T` and `TryFrom<proto::T> for T`.
//! The `encode`/`decode` methods on the types themselves wrap those
//! conversions and the protobuf codec.

mod encoding;
pub mod proto;

use crate::channel::PartIdx;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("field `{field}` must be {expected} bytes, got {got}")]
    ByteLengthMismatch {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("field `{0}` is missing")]
    ExpectedSome(&'static str),
    #[error("participant index {0} does not fit into usize")]
    IndexOutOfRange(u64),
    #[error("allocation type {0} does not fit into u8")]
    AllocationTypeOutOfRange(u32),
    #[error("liabilities from {from} to {to} appear more than once")]
    DuplicateLiability { from: PartIdx, to: PartIdx },
    #[error("asset {0} appears more than once in a liability")]
    DuplicateAsset(String),
    #[error("participants of the proposal and its state differ")]
    ParticipantMismatch,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DecodeError {
    #[error("empty byte array")]
    EmptyByteArray,
    #[error("invalid protobuf message: {0}")]
    Protobuf(#[from] prost::DecodeError),
    #[error("invalid message content: {0}")]
    Conversion(#[from] ConversionError),
}
